use std::sync::Arc;
use std::time::Duration;

use forno_core::conversation::Turn;
use forno_db::MenuRepository;
use thiserror::Error;
use tracing::debug;

use crate::guardrails::ReplyGuardrails;
use crate::llm::ChatModel;
use crate::session::SessionState;
use crate::tools::{menu_registry, ToolRegistry, LIST_FULL_MENU};

/// Hard cap on respond/invoke-tools cycles per request. A cooperative model
/// needs at most two; anything past the cap is a degenerate response pattern.
pub const MAX_TOOL_ROUNDS: usize = 4;

/// Fixed policy prompt, inserted once as the first turn of every conversation.
const SYSTEM_PROMPT: &str = "\
VOCÊ É O PIZZA BOT DA FORNO.
SUA MISSÃO: vender pizzas e anotar pedidos.

REGRAS DE VISUALIZAÇÃO (PRIORIDADE MÁXIMA):
1. Se a ferramenta `list_full_menu` for chamada, a sua resposta DEVE conter a lista de pizzas que ela retornou.
2. É PROIBIDO resumir. É PROIBIDO dizer apenas 'Aqui está'. Mostre a lista completa.

REGRAS DO CARRINHO:
1. Se o cliente pedir uma pizza, acrescente a tag oculta no final: `:::ADD:Nome|Preco:::`.
2. Exemplo: 'Adicionado! :::ADD:Calabresa|40.00:::'

REGRAS DE PAGAMENTO:
1. Se o cliente falar 'fechar' ou 'pagar': pergunte 'Dinheiro ou Cartão?'.
2. Só depois da resposta, diga 'Pedido Confirmado com sucesso, basta efetuar o pagamento e clicar em fechar seu pedido ao lado :) Muito obrigado!'.";

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("model call failed")]
    Model(#[source] anyhow::Error),
    #[error("model requested unknown tool `{name}`")]
    UnknownTool { name: String },
    #[error("tool `{name}` failed")]
    ToolFailed {
        name: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("tool-invocation loop exceeded {rounds} rounds")]
    LoopLimitExceeded { rounds: usize },
    #[error("agent run exceeded the {limit:?} request budget")]
    Timeout { limit: Duration },
}

/// Drives one user utterance through the respond/invoke-tools cycle until the
/// model produces a plain answer, then runs the reply guardrails.
pub struct AgentRuntime {
    model: Arc<dyn ChatModel>,
    tools: ToolRegistry,
    guardrails: ReplyGuardrails,
}

impl AgentRuntime {
    pub fn new(model: Arc<dyn ChatModel>, tools: ToolRegistry, guardrails: ReplyGuardrails) -> Self {
        Self { model, tools, guardrails }
    }

    /// Runtime with both menu tools and guardrails wired to `menu`.
    pub fn for_menu(model: Arc<dyn ChatModel>, menu: Arc<dyn MenuRepository>) -> Self {
        Self::new(model, menu_registry(menu.clone()), ReplyGuardrails::new(menu))
    }

    /// Appends the user turn and loops to completion. On any failure the
    /// conversation is rolled back so that only the user turn of this round
    /// remains recorded, leaving the session clean for a retry.
    pub async fn run_turn(
        &self,
        state: &mut SessionState,
        user_message: &str,
    ) -> Result<String, AgentError> {
        self.run_turn_bounded(state, user_message, None).await
    }

    /// Like [`run_turn`](Self::run_turn) but fails closed once `limit` elapses
    /// instead of hanging on a stuck model or store.
    pub async fn run_turn_with_timeout(
        &self,
        state: &mut SessionState,
        user_message: &str,
        limit: Duration,
    ) -> Result<String, AgentError> {
        self.run_turn_bounded(state, user_message, Some(limit)).await
    }

    async fn run_turn_bounded(
        &self,
        state: &mut SessionState,
        user_message: &str,
        limit: Option<Duration>,
    ) -> Result<String, AgentError> {
        state.conversation.ensure_system_turn(SYSTEM_PROMPT);
        state.conversation.push(Turn::user(user_message));
        let checkpoint = state.conversation.len();

        let outcome = match limit {
            Some(limit) => match tokio::time::timeout(limit, self.drive(state, user_message)).await
            {
                Ok(outcome) => outcome,
                Err(_) => Err(AgentError::Timeout { limit }),
            },
            None => self.drive(state, user_message).await,
        };

        match outcome {
            Ok(reply) => Ok(reply),
            Err(error) => {
                state.conversation.truncate(checkpoint);
                Err(error)
            }
        }
    }

    async fn drive(
        &self,
        state: &mut SessionState,
        user_message: &str,
    ) -> Result<String, AgentError> {
        let schemas = self.tools.schemas();
        let mut listing_shown = false;

        for round in 0..MAX_TOOL_ROUNDS {
            let turn = self
                .model
                .complete(state.conversation.turns(), &schemas)
                .await
                .map_err(AgentError::Model)?;

            if !turn.has_tool_calls() {
                let reply = self
                    .guardrails
                    .finalize(user_message, turn.content, listing_shown, &mut state.cart)
                    .await;
                state.conversation.push(Turn::assistant(reply.clone(), Vec::new()));
                return Ok(reply);
            }

            let calls = turn.tool_calls.clone();
            state.conversation.push(turn);

            for call in calls {
                let tool = self
                    .tools
                    .get(&call.name)
                    .ok_or_else(|| AgentError::UnknownTool { name: call.name.clone() })?;
                if call.name == LIST_FULL_MENU {
                    listing_shown = true;
                }

                let output = tool.execute(call.arguments.clone()).await.map_err(|source| {
                    AgentError::ToolFailed { name: call.name.clone(), source }
                })?;
                debug!(
                    event_name = "agent.tool.executed",
                    tool = %call.name,
                    round,
                    "tool call resolved"
                );
                state.conversation.push(Turn::tool_result(call.id, output));
            }
        }

        Err(AgentError::LoopLimitExceeded { rounds: MAX_TOOL_ROUNDS })
    }
}
