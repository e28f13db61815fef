//! The chat endpoint.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use fareflow_core::{FlightCard, StateSummary};

use crate::turn::TurnHandler;

#[derive(Clone)]
pub struct ChatState {
    pub turns: Arc<TurnHandler>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ChatRequest {
    pub session_id: Option<String>,
    pub message: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub session_id: String,
    pub reply: String,
    pub flight_cards: Vec<FlightCard>,
    pub state_summary: StateSummary,
    pub suggested_actions: Vec<String>,
    pub context_chip: String,
}

pub fn router(turns: Arc<TurnHandler>) -> Router {
    Router::new().route("/chat", post(chat)).with_state(ChatState { turns })
}

/// Turn failures surface as the fallback reply inside a 200; the status code
/// stays reserved for malformed requests.
pub async fn chat(
    State(state): State<ChatState>,
    Json(request): Json<ChatRequest>,
) -> (StatusCode, Json<ChatResponse>) {
    let session_id =
        request.session_id.filter(|id| !id.trim().is_empty()).unwrap_or_else(new_session_id);

    info!(
        event_name = "chat.turn_received",
        session_id = %session_id,
        message_chars = request.message.chars().count(),
        "chat turn received"
    );

    let outcome = state.turns.handle_turn(&session_id, &request.message).await;

    let response = ChatResponse {
        session_id,
        reply: outcome.reply,
        flight_cards: outcome.flight_cards,
        state_summary: outcome.state_summary,
        suggested_actions: outcome.suggested_actions,
        context_chip: outcome.context_chip,
    };
    (StatusCode::OK, Json(response))
}

fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    use fareflow_core::{Ranker, Reconciler, SourceReliability};
    use fareflow_db::{InMemorySessionRepository, SessionStore};
    use fareflow_providers::{LoggingNotifier, SourceFanout, UpiPaymentLinks};

    use crate::turn::TurnHandler;

    use super::router;

    fn test_router() -> axum::Router {
        let store = Arc::new(SessionStore::new(Arc::new(InMemorySessionRepository::new()), 3600));
        let turns = Arc::new(TurnHandler::new(
            store,
            SourceFanout::new(Vec::new(), Duration::from_secs(5)),
            Arc::new(Reconciler::new(SourceReliability::default())),
            Ranker::default(),
            Arc::new(UpiPaymentLinks),
            Arc::new(LoggingNotifier),
            7,
        ));
        router(turns)
    }

    async fn post_chat(body: &str) -> (StatusCode, serde_json::Value) {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/chat")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_owned()))
                    .expect("request should build"),
            )
            .await
            .expect("handler should respond");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should collect");
        let value = serde_json::from_slice(&bytes).expect("body should be json");
        (status, value)
    }

    #[tokio::test]
    async fn chat_returns_the_stable_contract_fields() {
        let (status, value) =
            post_chat(r#"{"session_id":"s-1","message":"flight from mumbai to delhi"}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert!(value["reply"].is_string());
        assert!(value["flightCards"].is_array());
        assert!(value["stateSummary"].is_object());
        assert!(value["suggestedActions"].is_array());
        assert_eq!(value["sessionId"], "s-1");
    }

    #[tokio::test]
    async fn chat_generates_a_session_id_when_missing() {
        let (status, value) = post_chat(r#"{"message":"flight to goa"}"#).await;

        assert_eq!(status, StatusCode::OK);
        let session_id = value["sessionId"].as_str().unwrap_or_default();
        assert!(!session_id.is_empty());
    }
}
