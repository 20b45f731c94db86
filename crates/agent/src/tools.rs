use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;
use forno_core::menu::{format_price, MenuItem};
use forno_db::MenuRepository;
use serde_json::{json, Value};
use tracing::warn;

use crate::llm::ToolSchema;

pub const LIST_FULL_MENU: &str = "list_full_menu";
pub const FIND_PRICE: &str = "find_price";

pub const EMPTY_MENU_MESSAGE: &str = "O cardápio está vazio.";
pub const NOT_FOUND_MESSAGE: &str = "Desculpe, não encontrei essa pizza.";

/// Directive prepended to the listing so the model reproduces it instead of
/// summarizing. The guardrail layer enforces the same post-condition
/// mechanically; this line just raises the odds the model cooperates on the
/// first pass.
const VERBATIM_DIRECTIVE: &str = "INSTRUCAO_INTERNA: o cliente não vê esta mensagem, \
mas PRECISA ver o cardápio abaixo. Copie o texto abaixo na íntegra para a resposta:";

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn parameters(&self) -> Value;
    async fn execute(&self, input: Value) -> Result<String>;
}

#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn register<T>(&mut self, tool: T)
    where
        T: Tool + 'static,
    {
        self.tools.insert(tool.name().to_string(), Arc::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn schemas(&self) -> Vec<ToolSchema> {
        let mut schemas: Vec<ToolSchema> = self
            .tools
            .values()
            .map(|tool| ToolSchema {
                name: tool.name(),
                description: tool.description(),
                parameters: tool.parameters(),
            })
            .collect();
        schemas.sort_by_key(|schema| schema.name);
        schemas
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Registry with both menu tools wired to the given repository.
pub fn menu_registry(menu: Arc<dyn MenuRepository>) -> ToolRegistry {
    let mut registry = ToolRegistry::default();
    registry.register(ListFullMenuTool { menu: menu.clone() });
    registry.register(FindPriceTool { menu });
    registry
}

pub fn render_listing(items: &[MenuItem]) -> String {
    let mut text = String::from("🍕 CARDÁPIO COMPLETO:\n");
    for item in items {
        text.push_str(&format!(
            "- {} — R$ {}, {}\n",
            item.name,
            format_price(item.price_cents),
            item.ingredients
        ));
    }
    text
}

pub struct ListFullMenuTool {
    menu: Arc<dyn MenuRepository>,
}

#[async_trait]
impl Tool for ListFullMenuTool {
    fn name(&self) -> &'static str {
        LIST_FULL_MENU
    }

    fn description(&self) -> &'static str {
        "Retorna o cardápio completo da pizzaria."
    }

    fn parameters(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _input: Value) -> Result<String> {
        let items = match self.menu.list_all().await {
            Ok(items) => items,
            Err(error) => {
                warn!(
                    event_name = "agent.tool.store_unavailable",
                    tool = LIST_FULL_MENU,
                    error = %error,
                    "menu store unreachable, degrading to empty menu"
                );
                return Ok(EMPTY_MENU_MESSAGE.to_string());
            }
        };

        if items.is_empty() {
            return Ok(EMPTY_MENU_MESSAGE.to_string());
        }

        Ok(format!("{VERBATIM_DIRECTIVE}\n\n{}", render_listing(&items)))
    }
}

pub struct FindPriceTool {
    menu: Arc<dyn MenuRepository>,
}

#[async_trait]
impl Tool for FindPriceTool {
    fn name(&self) -> &'static str {
        FIND_PRICE
    }

    fn description(&self) -> &'static str {
        "Consulta o preço de uma pizza pelo nome."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": { "type": "string", "description": "Nome (ou parte do nome) da pizza." }
            },
            "required": ["name"],
        })
    }

    async fn execute(&self, input: Value) -> Result<String> {
        let Some(name) = input.get("name").and_then(Value::as_str) else {
            bail!("find_price requires a string `name` argument");
        };

        let matches = match self.menu.find_by_name(name).await {
            Ok(matches) => matches,
            Err(error) => {
                warn!(
                    event_name = "agent.tool.store_unavailable",
                    tool = FIND_PRICE,
                    error = %error,
                    "menu store unreachable, degrading to not-found"
                );
                return Ok(NOT_FOUND_MESSAGE.to_string());
            }
        };

        if matches.is_empty() {
            return Ok(NOT_FOUND_MESSAGE.to_string());
        }

        // Substring queries can match several pizzas; every match is rendered
        // rather than guessing a best one.
        let mut reply = String::new();
        for item in &matches {
            reply.push_str(&format!(
                "{} — R$ {} ({})\n",
                item.name,
                format_price(item.price_cents),
                item.ingredients
            ));
        }
        Ok(reply)
    }
}
