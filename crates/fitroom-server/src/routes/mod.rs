//! HTTP routing.
//!
//! The `:id` segment is the room id for `start` and the call id everywhere
//! else, matching the platform's public call API.

pub mod calls;
pub mod events;

use axum::routing::{get, post, put};
use axum::Router;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/calls/:id/start", post(calls::start_call))
        .route("/calls/:id/join", post(calls::join_call))
        .route("/calls/:id/leave", post(calls::leave_call))
        .route("/calls/:id/end", post(calls::end_call))
        .route(
            "/calls/:id/participant/:user_id/status",
            put(calls::update_participant_status),
        )
        .route("/calls/:id/request-control", post(calls::request_control))
        .route("/calls/:id/approve-control", post(calls::approve_control))
        .route("/calls/:id/deny-control", post(calls::deny_control))
        .route("/calls/:id/sync-browse", post(calls::sync_browse))
        .route("/calls/:id/add-to-cart", post(calls::add_to_cart))
        .route("/calls/:id/browsing-state", get(calls::browsing_state))
        .route("/calls/:id/status", get(calls::call_status))
        .route("/calls/:id/events", get(events::call_events))
        .route("/rooms/:room_id/calls", get(calls::room_calls))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use fitroom_application::CallUseCase;
    use fitroom_core::ports::Product;
    use fitroom_infrastructure::{
        BroadcastEventPublisher, MemoryCallRepository, MemoryProductCatalog, MemoryWardrobeStore,
        StaticRoomDirectory, TracingNotificationDispatcher,
    };
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let publisher = Arc::new(BroadcastEventPublisher::default());
        let calls = Arc::new(CallUseCase::new(
            Arc::new(MemoryCallRepository::new()),
            Arc::new(StaticRoomDirectory::new().with_room("r1", ["hanna", "amir", "bea"])),
            Arc::new(TracingNotificationDispatcher::new()),
            Arc::new(MemoryProductCatalog::new().with_product(Product {
                id: "prod-1".to_string(),
                name: "Red Dress".to_string(),
                price: 89.0,
                image_url: None,
            })),
            Arc::new(MemoryWardrobeStore::new()),
            publisher.clone(),
        ));
        AppState {
            calls,
            events: publisher,
        }
    }

    fn request(method: Method, uri: &str, user: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header("x-user-id", user);
        }
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_start_join_status_flow() {
        let app = router(test_state());

        let response = app
            .clone()
            .oneshot(request(Method::POST, "/calls/r1/start", Some("hanna"), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        let call_id = body["callId"].as_str().unwrap().to_string();
        assert_eq!(body["hostId"], "hanna");
        assert_eq!(body["participants"], 1);

        let response = app
            .clone()
            .oneshot(request(
                Method::POST,
                &format!("/calls/{call_id}/join"),
                Some("amir"),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["participantCount"], 2);

        let response = app
            .oneshot(request(
                Method::GET,
                &format!("/calls/{call_id}/status"),
                Some("amir"),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["call"]["host_id"], "hanna");
        assert_eq!(body["call"]["status"], "active");
    }

    #[tokio::test]
    async fn test_second_start_conflicts() {
        let app = router(test_state());
        let response = app
            .clone()
            .oneshot(request(Method::POST, "/calls/r1/start", Some("hanna"), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .oneshot(request(Method::POST, "/calls/r1/start", Some("amir"), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = json_body(response).await;
        assert_eq!(body["error"], "conflict");
    }

    #[tokio::test]
    async fn test_non_member_start_is_forbidden() {
        let app = router(test_state());
        let response = app
            .oneshot(request(
                Method::POST,
                "/calls/r1/start",
                Some("stranger"),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_missing_user_header_is_rejected() {
        let app = router(test_state());
        let response = app
            .oneshot(request(Method::POST, "/calls/r1/start", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_call_is_not_found() {
        let app = router(test_state());
        let response = app
            .oneshot(request(
                Method::GET,
                "/calls/missing/status",
                Some("hanna"),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_sync_browse_and_cart_flow() {
        let app = router(test_state());
        let response = app
            .clone()
            .oneshot(request(Method::POST, "/calls/r1/start", Some("hanna"), None))
            .await
            .unwrap();
        let call_id = json_body(response).await["callId"]
            .as_str()
            .unwrap()
            .to_string();

        let response = app
            .clone()
            .oneshot(request(
                Method::POST,
                &format!("/calls/{call_id}/sync-browse"),
                Some("hanna"),
                Some(json!({"searchQuery": "red dress", "page": 2})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["searchQuery"], "red dress");
        assert_eq!(body["currentPage"], 2);

        // An unsupported sort key is a validation error, not a bare 422.
        let response = app
            .clone()
            .oneshot(request(
                Method::POST,
                &format!("/calls/{call_id}/sync-browse"),
                Some("hanna"),
                Some(json!({"sortBy": "alphabetical"})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"], "validation_error");

        let response = app
            .clone()
            .oneshot(request(
                Method::POST,
                &format!("/calls/{call_id}/add-to-cart"),
                Some("hanna"),
                Some(json!({"productId": "prod-1"})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["product"]["name"], "Red Dress");
        assert_eq!(body["action"], "added");

        let response = app
            .oneshot(request(
                Method::POST,
                &format!("/calls/{call_id}/add-to-cart"),
                Some("hanna"),
                Some(json!({"productId": "missing"})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_room_call_history() {
        let app = router(test_state());
        let response = app
            .clone()
            .oneshot(request(Method::POST, "/calls/r1/start", Some("hanna"), None))
            .await
            .unwrap();
        let call_id = json_body(response).await["callId"]
            .as_str()
            .unwrap()
            .to_string();
        app.clone()
            .oneshot(request(
                Method::POST,
                &format!("/calls/{call_id}/end"),
                Some("hanna"),
                None,
            ))
            .await
            .unwrap();

        let response = app
            .clone()
            .oneshot(request(Method::GET, "/rooms/r1/calls", Some("amir"), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["calls"].as_array().unwrap().len(), 1);
        assert_eq!(body["calls"][0]["status"], "ended");

        let response = app
            .oneshot(request(
                Method::GET,
                "/rooms/r1/calls",
                Some("stranger"),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_control_endpoints() {
        let app = router(test_state());
        let response = app
            .clone()
            .oneshot(request(Method::POST, "/calls/r1/start", Some("hanna"), None))
            .await
            .unwrap();
        let call_id = json_body(response).await["callId"]
            .as_str()
            .unwrap()
            .to_string();

        app.clone()
            .oneshot(request(
                Method::POST,
                &format!("/calls/{call_id}/join"),
                Some("amir"),
                None,
            ))
            .await
            .unwrap();

        let response = app
            .clone()
            .oneshot(request(
                Method::POST,
                &format!("/calls/{call_id}/request-control"),
                Some("amir"),
                Some(json!({"message": "let me drive"})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["pendingRequests"].as_array().unwrap().len(), 1);

        // Only the controller may approve.
        let response = app
            .clone()
            .oneshot(request(
                Method::POST,
                &format!("/calls/{call_id}/approve-control"),
                Some("amir"),
                Some(json!({"requestUserId": "amir"})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app
            .oneshot(request(
                Method::POST,
                &format!("/calls/{call_id}/approve-control"),
                Some("hanna"),
                Some(json!({"requestUserId": "amir"})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["currentController"]["user_id"], "amir");
    }
}
