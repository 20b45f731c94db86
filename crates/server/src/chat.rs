use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    routing::post,
    Json, Router,
};
use forno_agent::runtime::{AgentError, AgentRuntime};
use forno_agent::session::{SessionStore, DEFAULT_SESSION_ID};
use forno_core::errors::{ApplicationError, DomainError};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct ChatState {
    pub agent_runtime: Arc<AgentRuntime>,
    pub sessions: Arc<SessionStore>,
    pub request_timeout: Duration,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// Optional; the reference client omits it and shares the fixed session.
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Debug, Serialize)]
pub struct ChatErrorBody {
    pub error: String,
    pub correlation_id: String,
}

pub fn router(state: ChatState, cors_allow_origin: Option<&str>) -> Router {
    Router::new().route("/chat", post(chat)).layer(cors_layer(cors_allow_origin)).with_state(state)
}

fn cors_layer(allow_origin: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match allow_origin.map(|origin| origin.parse::<HeaderValue>()) {
        Some(Ok(origin)) => layer.allow_origin(origin),
        Some(Err(_)) => {
            warn!(
                event_name = "system.server.invalid_cors_origin",
                "configured CORS origin is not a valid header value, keeping the endpoint open"
            );
            layer.allow_origin(Any)
        }
        None => layer.allow_origin(Any),
    }
}

async fn chat(
    State(state): State<ChatState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, Json<ChatErrorBody>)> {
    let correlation_id = Uuid::new_v4().to_string();

    if request.message.trim().is_empty() {
        let interface =
            ApplicationError::from(DomainError::EmptyMessage).into_interface(correlation_id.as_str());
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ChatErrorBody {
                error: interface.user_message().to_string(),
                correlation_id,
            }),
        ));
    }

    let session_id = request.session_id.as_deref().unwrap_or(DEFAULT_SESSION_ID).to_string();
    let session = state.sessions.get_or_create(&session_id).await;

    // Holding the session mutex for the whole run serializes concurrent
    // requests for the same session id.
    let mut session_state = session.lock().await;
    let outcome = state
        .agent_runtime
        .run_turn_with_timeout(&mut session_state, &request.message, state.request_timeout)
        .await;
    drop(session_state);

    match outcome {
        Ok(response) => {
            info!(
                event_name = "chat.turn.completed",
                correlation_id = %correlation_id,
                session_id = %session_id,
                "chat turn completed"
            );
            Ok(Json(ChatResponse { response }))
        }
        Err(agent_error) => {
            error!(
                event_name = "chat.turn.failed",
                correlation_id = %correlation_id,
                session_id = %session_id,
                error = %agent_error,
                "chat turn failed, conversation rolled back to the user turn"
            );
            let interface = map_agent_error(agent_error).into_interface(correlation_id.as_str());
            Err((
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ChatErrorBody {
                    error: interface.user_message().to_string(),
                    correlation_id,
                }),
            ))
        }
    }
}

fn map_agent_error(error: AgentError) -> ApplicationError {
    // Internal detail stays in logs; every agent failure class surfaces to the
    // caller as the same unavailable-style apology.
    ApplicationError::Model(error.to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use forno_agent::llm::{ChatModel, ToolSchema};
    use forno_agent::runtime::AgentRuntime;
    use forno_agent::session::SessionStore;
    use forno_core::conversation::{Role, ToolCallRequest, Turn};
    use forno_core::menu::MenuItem;
    use forno_db::repositories::InMemoryMenuRepository;
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    use super::{router, ChatState};

    const SEVEN_PIZZAS: &[(&str, &str, i64)] = &[
        ("Calabresa", "Molho, queijo, calabresa e cebola", 4000),
        ("Mussarela", "Molho, queijo mussarela e orégano", 3500),
        ("Portuguesa", "Molho, queijo, presunto, ovo, cebola e azeitona", 4500),
        ("Quatro Queijos", "Molho, mussarela, provolone, parmesão e gorgonzola", 5000),
        ("Frango com Catupiry", "Molho, frango desfiado e catupiry original", 4200),
        ("Marguerita", "Molho, mussarela, tomate e manjericão fresco", 3800),
        ("Pepperoni", "Molho, mussarela e fatias de pepperoni", 4800),
    ];

    fn seeded_menu() -> Arc<InMemoryMenuRepository> {
        Arc::new(InMemoryMenuRepository::with_items(
            SEVEN_PIZZAS
                .iter()
                .enumerate()
                .map(|(index, (name, ingredients, price_cents))| MenuItem {
                    id: index as i64 + 1,
                    name: name.to_string(),
                    ingredients: ingredients.to_string(),
                    price_cents: *price_cents,
                })
                .collect(),
        ))
    }

    /// Rule-based stand-in for the language model: picks tools from the user
    /// text the way the real model is prompted to, and echoes tool results
    /// back as its answer.
    struct SimulatedPizzeriaModel;

    #[async_trait]
    impl ChatModel for SimulatedPizzeriaModel {
        async fn complete(&self, turns: &[Turn], _tools: &[ToolSchema]) -> Result<Turn> {
            let last = turns.last().ok_or_else(|| anyhow!("empty conversation"))?;

            if last.role == Role::Tool {
                let body = last
                    .content
                    .split_once("\n\n")
                    .map(|(_, rest)| rest)
                    .unwrap_or(&last.content);
                return Ok(Turn::assistant(body.to_string(), Vec::new()));
            }

            let text = last.content.to_lowercase();
            if text.contains("cardápio") || text.contains("cardapio") {
                return Ok(Turn::assistant(
                    "",
                    vec![ToolCallRequest {
                        id: "call-menu".to_string(),
                        name: "list_full_menu".to_string(),
                        arguments: json!({}),
                    }],
                ));
            }
            if text.contains("quanto custa") {
                let name = text
                    .split_whitespace()
                    .last()
                    .unwrap_or_default()
                    .trim_matches(|c: char| !c.is_alphanumeric())
                    .to_string();
                return Ok(Turn::assistant(
                    "",
                    vec![ToolCallRequest {
                        id: "call-price".to_string(),
                        name: "find_price".to_string(),
                        arguments: json!({ "name": name }),
                    }],
                ));
            }
            if text.contains("fechar") || text.contains("pagar") {
                return Ok(Turn::assistant("Dinheiro ou Cartão?", Vec::new()));
            }
            if text.contains("dinheiro") || text.contains("cartão") {
                return Ok(Turn::assistant(
                    "Pedido Confirmado com sucesso, basta efetuar o pagamento e clicar em fechar seu pedido ao lado :) Muito obrigado!",
                    Vec::new(),
                ));
            }
            if text.contains("quero") {
                return Ok(Turn::assistant("Adicionado!", Vec::new()));
            }
            Ok(Turn::assistant("Olá! Como posso ajudar?", Vec::new()))
        }
    }

    struct FailingModel;

    #[async_trait]
    impl ChatModel for FailingModel {
        async fn complete(&self, _turns: &[Turn], _tools: &[ToolSchema]) -> Result<Turn> {
            Err(anyhow!("upstream 500"))
        }
    }

    fn app_with_model(model: Arc<dyn ChatModel>) -> axum::Router {
        let menu = seeded_menu();
        router(
            ChatState {
                agent_runtime: Arc::new(AgentRuntime::for_menu(model, menu)),
                sessions: Arc::new(SessionStore::new()),
                request_timeout: Duration::from_secs(5),
            },
            None,
        )
    }

    async fn post_chat(app: &axum::Router, body: Value) -> (StatusCode, Value) {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/chat")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .expect("request"),
            )
            .await
            .expect("response");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let value = serde_json::from_slice(&bytes).expect("json body");
        (status, value)
    }

    #[tokio::test]
    async fn price_question_answers_with_name_and_price() {
        let app = app_with_model(Arc::new(SimulatedPizzeriaModel));

        let (status, body) = post_chat(&app, json!({"message": "quanto custa a calabresa"})).await;

        assert_eq!(status, StatusCode::OK);
        let response = body["response"].as_str().expect("response text");
        assert!(response.contains("Calabresa"));
        assert!(response.contains("40.00"));
    }

    #[tokio::test]
    async fn menu_request_lists_all_seven_pizzas() {
        let app = app_with_model(Arc::new(SimulatedPizzeriaModel));

        let (status, body) = post_chat(&app, json!({"message": "me mostra o cardápio"})).await;

        assert_eq!(status, StatusCode::OK);
        let response = body["response"].as_str().expect("response text");
        for (name, _, _) in SEVEN_PIZZAS {
            assert!(response.contains(name), "listing must include {name}");
        }
    }

    #[tokio::test]
    async fn ordering_then_closing_asks_for_payment_method() {
        let app = app_with_model(Arc::new(SimulatedPizzeriaModel));

        let (status, body) = post_chat(&app, json!({"message": "quero uma calabresa"})).await;
        assert_eq!(status, StatusCode::OK);
        let first = body["response"].as_str().expect("response text");
        assert!(first.contains(":::ADD:Calabresa|40.00:::"));
        assert!(!first.to_lowercase().contains("confirmado"));

        let (status, body) = post_chat(&app, json!({"message": "fechar"})).await;
        assert_eq!(status, StatusCode::OK);
        let second = body["response"].as_str().expect("response text");
        assert!(second.contains("Dinheiro"));
        assert!(second.contains("Cartão"));
        assert!(!second.to_lowercase().contains("confirmado"));
    }

    #[tokio::test]
    async fn sessions_with_distinct_ids_do_not_share_history() {
        let app = app_with_model(Arc::new(SimulatedPizzeriaModel));

        let (_, _) =
            post_chat(&app, json!({"message": "quero uma calabresa", "session_id": "mesa-1"})).await;
        let (status, body) =
            post_chat(&app, json!({"message": "fechar", "session_id": "mesa-2"})).await;

        // mesa-2 never ordered; the reply still asks about payment because the
        // simulated model is stateless, but its cart stayed empty, so no tag
        // was ever emitted for it.
        assert_eq!(status, StatusCode::OK);
        assert!(!body["response"].as_str().expect("text").contains(":::ADD:"));
    }

    #[tokio::test]
    async fn empty_message_is_rejected_with_bad_request() {
        let app = app_with_model(Arc::new(SimulatedPizzeriaModel));

        let (status, body) = post_chat(&app, json!({"message": "   "})).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().is_some());
    }

    #[tokio::test]
    async fn model_failure_yields_generic_unavailable_body() {
        let app = app_with_model(Arc::new(FailingModel));

        let (status, body) = post_chat(&app, json!({"message": "oi"})).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        let error = body["error"].as_str().expect("error text");
        assert!(!error.contains("upstream 500"), "internal detail must not leak");
        assert!(body["correlation_id"].as_str().is_some());
    }
}
