use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use forno_core::config::LlmConfig;
use forno_core::conversation::{Role, ToolCallRequest, Turn};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Function schema advertised to the model alongside the turn history.
#[derive(Clone, Debug, Serialize)]
pub struct ToolSchema {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

/// Black-box inference boundary: ordered turns in, one assistant turn out,
/// possibly carrying tool-call requests.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, turns: &[Turn], tools: &[ToolSchema]) -> Result<Turn>;
}

/// Client for OpenAI-compatible chat-completions APIs (Groq, Ollama, ...).
/// Temperature is pinned to zero so the policy prompt is obeyed as literally
/// as the model allows.
pub struct OpenAiChatModel {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
    model: String,
}

impl OpenAiChatModel {
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("building llm http client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    async fn complete(&self, turns: &[Turn], tools: &[ToolSchema]) -> Result<Turn> {
        let payload = build_request(&self.model, turns, tools);

        let mut request = self.client.post(self.endpoint()).json(&payload);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key.expose_secret());
        }

        let response = request.send().await.context("chat completion request failed")?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("chat completion returned status {status}"));
        }

        let body: WireResponse =
            response.json().await.context("decoding chat completion response")?;
        parse_response(body)
    }
}

pub(crate) fn build_request(model: &str, turns: &[Turn], tools: &[ToolSchema]) -> WireRequest {
    WireRequest {
        model: model.to_string(),
        temperature: 0.0,
        messages: turns.iter().map(turn_to_wire).collect(),
        tools: tools
            .iter()
            .map(|schema| WireTool { kind: "function".to_string(), function: schema.clone() })
            .collect(),
    }
}

fn turn_to_wire(turn: &Turn) -> WireMessage {
    let role = match turn.role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    };

    WireMessage {
        role: role.to_string(),
        content: if turn.content.is_empty() && turn.has_tool_calls() {
            None
        } else {
            Some(turn.content.clone())
        },
        tool_calls: turn
            .tool_calls
            .iter()
            .map(|call| WireToolCall {
                id: call.id.clone(),
                kind: "function".to_string(),
                function: WireFunctionCall {
                    name: call.name.clone(),
                    arguments: call.arguments.to_string(),
                },
            })
            .collect(),
        tool_call_id: turn.tool_call_id.clone(),
    }
}

pub(crate) fn parse_response(body: WireResponse) -> Result<Turn> {
    let choice = body.choices.into_iter().next().ok_or_else(|| anyhow!("model returned no choices"))?;

    let tool_calls = choice
        .message
        .tool_calls
        .into_iter()
        .map(|call| {
            let arguments = serde_json::from_str(&call.function.arguments)
                .unwrap_or(Value::Object(serde_json::Map::new()));
            ToolCallRequest { id: call.id, name: call.function.name, arguments }
        })
        .collect();

    Ok(Turn::assistant(choice.message.content.unwrap_or_default(), tool_calls))
}

#[derive(Debug, Serialize)]
pub(crate) struct WireRequest {
    model: String,
    temperature: f32,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<WireToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    function: WireFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    kind: String,
    function: ToolSchema,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireResponse {
    choices: Vec<WireChoice>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireResponseMessage,
}

#[derive(Debug, Deserialize)]
struct WireResponseMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<WireToolCall>,
}

#[cfg(test)]
mod tests {
    use forno_core::conversation::{ToolCallRequest, Turn};
    use serde_json::json;

    use super::{build_request, parse_response, ToolSchema, WireResponse};

    fn schema_fixture() -> ToolSchema {
        ToolSchema {
            name: "find_price",
            description: "Consulta o preço de uma pizza pelo nome.",
            parameters: json!({
                "type": "object",
                "properties": { "name": { "type": "string" } },
                "required": ["name"],
            }),
        }
    }

    #[test]
    fn request_payload_matches_chat_completions_shape() {
        let turns = vec![
            Turn::system("policy"),
            Turn::user("quanto custa a calabresa"),
            Turn::assistant(
                "",
                vec![ToolCallRequest {
                    id: "call-1".to_string(),
                    name: "find_price".to_string(),
                    arguments: json!({"name": "calabresa"}),
                }],
            ),
            Turn::tool_result("call-1", "Calabresa — R$ 40.00"),
        ];

        let payload = serde_json::to_value(build_request("test-model", &turns, &[schema_fixture()]))
            .expect("serialize");

        assert_eq!(payload["model"], "test-model");
        assert_eq!(payload["temperature"], 0.0);
        assert_eq!(payload["messages"][0]["role"], "system");
        assert_eq!(payload["messages"][2]["tool_calls"][0]["type"], "function");
        assert_eq!(
            payload["messages"][2]["tool_calls"][0]["function"]["arguments"],
            "{\"name\":\"calabresa\"}"
        );
        // Assistant turn carrying only tool calls serializes without content.
        assert!(payload["messages"][2].get("content").is_none());
        assert_eq!(payload["messages"][3]["role"], "tool");
        assert_eq!(payload["messages"][3]["tool_call_id"], "call-1");
        assert_eq!(payload["tools"][0]["function"]["name"], "find_price");
    }

    #[test]
    fn response_with_tool_calls_parses_into_assistant_turn() {
        let body: WireResponse = serde_json::from_value(json!({
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [{
                        "id": "call-7",
                        "type": "function",
                        "function": {
                            "name": "list_full_menu",
                            "arguments": "{}"
                        }
                    }]
                }
            }]
        }))
        .expect("deserialize");

        let turn = parse_response(body).expect("parse");
        assert!(turn.has_tool_calls());
        assert_eq!(turn.tool_calls[0].name, "list_full_menu");
        assert_eq!(turn.tool_calls[0].id, "call-7");
        assert!(turn.content.is_empty());
    }

    #[test]
    fn response_without_choices_is_an_error() {
        let body: WireResponse = serde_json::from_value(json!({"choices": []})).expect("deserialize");
        assert!(parse_response(body).is_err());
    }

    #[test]
    fn malformed_tool_arguments_degrade_to_empty_object() {
        let body: WireResponse = serde_json::from_value(json!({
            "choices": [{
                "message": {
                    "content": "",
                    "tool_calls": [{
                        "id": "call-8",
                        "type": "function",
                        "function": { "name": "find_price", "arguments": "not-json" }
                    }]
                }
            }]
        }))
        .expect("deserialize");

        let turn = parse_response(body).expect("parse");
        assert_eq!(turn.tool_calls[0].arguments, serde_json::json!({}));
    }
}
