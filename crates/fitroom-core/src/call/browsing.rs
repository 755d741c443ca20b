//! Shared browsing cursor synchronization.
//!
//! Every participant observes the same browsing state: search query, filters,
//! sort, pagination, and the product currently on screen. Any active
//! participant may push an update; by convention the controller drives, but
//! the platform has never enforced that and tightening it here would change
//! observable behavior.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::cart::CartUpdate;
use super::event::CallEvent;
use super::model::Call;
use crate::error::{FitroomError, Result};

/// How many browsing history snapshots are retained.
pub const HISTORY_RETAINED: usize = 10;

/// How many cart log entries read APIs return.
pub const CART_LOG_RETAINED: usize = 50;

/// Sort key for the shared product listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    #[default]
    Relevance,
    Price,
    Newest,
    Popularity,
}

/// Sort direction for the shared product listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// A point-in-time record of the browsing cursor, kept for read APIs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowseSnapshot {
    pub user_id: String,
    pub current_product_id: Option<String>,
    pub search_query: String,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
    pub page: u32,
    pub at: DateTime<Utc>,
}

/// The synchronized browsing state shared by all call participants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowsingState {
    pub current_product_id: Option<String>,
    pub scroll_position: f64,
    pub search_query: String,
    pub active_filters: Map<String, Value>,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
    pub current_page: u32,
    pub total_pages: u32,
    pub total_products: u64,
    /// Participants who have pushed at least one browse update.
    pub active_browsers: Vec<String>,
    /// Append-only cart event log.
    pub cart_updates: Vec<CartUpdate>,
    /// Append-only history of cursor snapshots, bounded to the most recent
    /// [`HISTORY_RETAINED`].
    pub browsing_history: Vec<BrowseSnapshot>,
}

impl Default for BrowsingState {
    fn default() -> Self {
        Self {
            current_product_id: None,
            scroll_position: 0.0,
            search_query: String::new(),
            active_filters: Map::new(),
            sort_by: SortBy::default(),
            sort_order: SortOrder::default(),
            current_page: 1,
            total_pages: 0,
            total_products: 0,
            active_browsers: Vec::new(),
            cart_updates: Vec::new(),
            browsing_history: Vec::new(),
        }
    }
}

impl BrowsingState {
    /// A copy with logs trimmed to their retention windows, for API
    /// responses. Storage keeps the full logs.
    pub fn bounded(&self) -> Self {
        let mut state = self.clone();
        if state.cart_updates.len() > CART_LOG_RETAINED {
            state.cart_updates = state
                .cart_updates
                .split_off(state.cart_updates.len() - CART_LOG_RETAINED);
        }
        state
    }
}

/// A partial browsing update submitted by a participant.
///
/// Omitted `sort_by`, `sort_order`, and `page` reset to their defaults
/// (relevance / descending / first page); every other omitted field keeps
/// its current value.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BrowseUpdate {
    pub product_id: Option<String>,
    pub scroll_position: Option<f64>,
    pub search_query: Option<String>,
    pub filters: Option<Map<String, Value>>,
    pub sort_by: Option<SortBy>,
    pub sort_order: Option<SortOrder>,
    pub page: Option<u32>,
    pub total_pages: Option<u32>,
    pub total_products: Option<u64>,
}

impl Call {
    /// Applies a browsing update from an active participant and records a
    /// history snapshot.
    ///
    /// # Errors
    ///
    /// - `Conflict` if the call has ended
    /// - `Forbidden` if `user_id` is not an active participant
    /// - `Validation` if `page` is zero
    pub fn sync_browse(&mut self, user_id: &str, update: BrowseUpdate) -> Result<CallEvent> {
        self.ensure_call_active()?;
        self.ensure_active_participant(user_id)?;

        if update.page == Some(0) {
            return Err(FitroomError::validation("page must be at least 1"));
        }

        let data = &mut self.session_data;
        if let Some(product_id) = update.product_id {
            data.current_product_id = Some(product_id);
        }
        if let Some(scroll_position) = update.scroll_position {
            data.scroll_position = scroll_position;
        }
        if let Some(search_query) = update.search_query {
            data.search_query = search_query;
        }
        if let Some(filters) = update.filters {
            data.active_filters = filters;
        }
        data.sort_by = update.sort_by.unwrap_or_default();
        data.sort_order = update.sort_order.unwrap_or_default();
        data.current_page = update.page.unwrap_or(1);
        if let Some(total_pages) = update.total_pages {
            data.total_pages = total_pages;
        }
        if let Some(total_products) = update.total_products {
            data.total_products = total_products;
        }

        if !data.active_browsers.iter().any(|u| u == user_id) {
            data.active_browsers.push(user_id.to_string());
        }

        let now = Utc::now();
        data.browsing_history.push(BrowseSnapshot {
            user_id: user_id.to_string(),
            current_product_id: data.current_product_id.clone(),
            search_query: data.search_query.clone(),
            sort_by: data.sort_by,
            sort_order: data.sort_order,
            page: data.current_page,
            at: now,
        });
        if data.browsing_history.len() > HISTORY_RETAINED {
            let excess = data.browsing_history.len() - HISTORY_RETAINED;
            data.browsing_history.drain(..excess);
        }

        Ok(CallEvent::BrowseUpdated {
            call_id: self.id.clone(),
            user_id: user_id.to_string(),
            current_product_id: data.current_product_id.clone(),
            search_query: data.search_query.clone(),
            sort_by: data.sort_by,
            sort_order: data.sort_order,
            page: data.current_page,
            total_pages: data.total_pages,
            total_products: data.total_products,
            scroll_position: data.scroll_position,
            updated_at: now,
        })
    }
}
