//! HTTP route handlers for the device node.
//!
//! # Endpoints
//!
//! - `GET /` — small HTML identity page
//! - `GET /actors` — JSON catalog of declared actors
//! - `POST /actors/:name` — submit a state command for one actor;
//!   body `{"value": ...}` of the actor's declared kind

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, Json},
    routing::{get, post},
    Router,
};
use iothub_client::InboundCommand;
use iothub_protocol::ActorCommand;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

use crate::{ActorInfo, AppState};

/// Create the Axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/actors", get(list_actors))
        .route("/actors/:name", post(command_actor))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Handler for `GET /`.
async fn index_handler(State(state): State<AppState>) -> Html<String> {
    Html(format!(
        "<html>\n<head>\n<title>IoT Hub Node</title>\n</head>\n<body>\n\
         <h1>{}</h1>\n<p>{} actor(s) accepting commands.</p>\n</body>\n</html>",
        state.node_name,
        state.actors.len()
    ))
}

/// Handler for `GET /actors`.
async fn list_actors(State(state): State<AppState>) -> Json<Vec<ActorInfo>> {
    Json(state.actors.as_ref().clone())
}

/// Handler for `POST /actors/:name`.
///
/// Accepted commands are queued for the tick loop; the response says the
/// command was taken, not that the actor callback already ran.
async fn command_actor(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(command): Json<ActorCommand>,
) -> StatusCode {
    let Some(actor) = state.actors.iter().find(|a| a.name == name) else {
        warn!(actor = %name, "command for undeclared actor");
        return StatusCode::NOT_FOUND;
    };

    if command.value.kind() != actor.kind {
        warn!(actor = %name, "command kind does not match actor state kind");
        return StatusCode::UNPROCESSABLE_ENTITY;
    }

    let inbound = InboundCommand {
        actor: name,
        value: command.value,
    };
    match state.commands.try_send(inbound) {
        Ok(()) => {
            debug!("command queued for tick loop");
            StatusCode::ACCEPTED
        }
        Err(_) => {
            warn!("command queue full, rejecting");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{command_channel, CommandQueue};
    use axum::body::Body;
    use axum::http::{header, Request};
    use iothub_client::CommandSource;
    use iothub_core::StateKind;
    use iothub_protocol::CommandValue;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_state() -> (AppState, CommandQueue) {
        let (tx, queue) = command_channel(4);
        let state = AppState {
            node_name: "bench-node".to_string(),
            actors: Arc::new(vec![ActorInfo {
                name: "workshop-lamp".to_string(),
                kind: StateKind::Bool,
            }]),
            commands: tx,
        };
        (state, queue)
    }

    fn post_command(name: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(format!("/actors/{}", name))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_command_is_queued_for_tick_loop() {
        let (state, mut queue) = test_state();
        let app = create_router(state);

        let response = app
            .oneshot(post_command("workshop-lamp", r#"{"value":true}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        let command = queue.poll().unwrap();
        assert_eq!(command.actor, "workshop-lamp");
        assert_eq!(command.value, CommandValue::Bool(true));
    }

    #[tokio::test]
    async fn test_unknown_actor_is_404() {
        let (state, mut queue) = test_state();
        let app = create_router(state);

        let response = app
            .oneshot(post_command("nonexistent", r#"{"value":true}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(queue.poll().is_none());
    }

    #[tokio::test]
    async fn test_kind_mismatch_is_rejected() {
        let (state, mut queue) = test_state();
        let app = create_router(state);

        let response = app
            .oneshot(post_command("workshop-lamp", r#"{"value":3.5}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(queue.poll().is_none());
    }

    #[tokio::test]
    async fn test_index_page() {
        let (state, _queue) = test_state();
        let app = create_router(state);

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_actor_catalog() {
        let (state, _queue) = test_state();
        let app = create_router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/actors")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
