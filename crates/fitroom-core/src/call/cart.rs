//! Cart event log and shared wardrobe bookkeeping.
//!
//! Participants' add/remove-to-cart actions during a call are recorded in an
//! append-only log on the shared browsing state. Products added to a cart
//! are also shared into the session wardrobe (deduplicated); catalog
//! enrichment and wardrobe persistence happen in the lifecycle layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::event::CartAction;
use super::model::Call;
use crate::error::Result;

/// One recorded cart action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartUpdate {
    pub user_id: String,
    pub product_id: String,
    pub action: CartAction,
    pub at: DateTime<Utc>,
}

/// How a cart action changed the shared wardrobe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WardrobeChange {
    /// The product was newly shared into the wardrobe.
    Added,
    /// The product was removed from the wardrobe.
    Removed,
    /// The wardrobe already reflected this action.
    Unchanged,
}

impl Call {
    /// Appends a cart action to the log and keeps `wardrobe_items` in sync.
    ///
    /// The caller is responsible for resolving the product against the
    /// catalog first; the domain only records ids.
    ///
    /// # Errors
    ///
    /// - `Conflict` if the call has ended
    /// - `Forbidden` if `user_id` is not an active participant
    pub fn record_cart_update(
        &mut self,
        user_id: &str,
        product_id: &str,
        action: CartAction,
    ) -> Result<WardrobeChange> {
        self.ensure_call_active()?;
        self.ensure_active_participant(user_id)?;

        self.session_data.cart_updates.push(CartUpdate {
            user_id: user_id.to_string(),
            product_id: product_id.to_string(),
            action,
            at: Utc::now(),
        });

        let change = match action {
            CartAction::Added => {
                if self.wardrobe_items.iter().any(|p| p == product_id) {
                    WardrobeChange::Unchanged
                } else {
                    self.wardrobe_items.push(product_id.to_string());
                    WardrobeChange::Added
                }
            }
            CartAction::Removed => {
                let before = self.wardrobe_items.len();
                self.wardrobe_items.retain(|p| p != product_id);
                if self.wardrobe_items.len() < before {
                    WardrobeChange::Removed
                } else {
                    WardrobeChange::Unchanged
                }
            }
        };

        Ok(change)
    }
}
