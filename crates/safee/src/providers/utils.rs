use regex::Regex;
use serde_json::{json, Value};

use super::base::{Completion, ProviderError, Usage};
use crate::models::message::Message;
use crate::models::role::Role;
use crate::models::tool::{Tool, ToolCall};

/// Convert the internal message list to OpenAI's API message specification.
pub fn messages_to_openai_spec(messages: &[Message]) -> Vec<Value> {
    let mut messages_spec = Vec::new();

    for message in messages {
        let mut converted = json!({
            "role": message.role,
            "content": message.content,
        });

        if message.role == Role::Tool {
            if let Some(id) = &message.tool_call_id {
                converted["tool_call_id"] = json!(id);
            }
        }

        if !message.tool_calls.is_empty() {
            let calls: Vec<Value> = message
                .tool_calls
                .iter()
                .map(|call| {
                    json!({
                        "id": call.id,
                        "type": "function",
                        "function": {
                            "name": sanitize_function_name(&call.name),
                            "arguments": call.arguments,
                        }
                    })
                })
                .collect();
            converted["tool_calls"] = json!(calls);
        }

        messages_spec.push(converted);
    }

    messages_spec
}

/// Convert internal tool descriptors to OpenAI's API tool specification.
pub fn tools_to_openai_spec(tools: &[Tool]) -> Result<Vec<Value>, ProviderError> {
    let mut tool_names = std::collections::HashSet::new();
    let mut result = Vec::new();

    for tool in tools {
        if !tool_names.insert(&tool.name) {
            return Err(ProviderError::InvalidTool(format!(
                "duplicate tool name: {}",
                tool.name
            )));
        }

        result.push(json!({
            "type": "function",
            "function": {
                "name": tool.name,
                "description": tool.description,
                "parameters": tool.parameters,
            }
        }));
    }

    Ok(result)
}

/// Convert an OpenAI chat-completions response body to a [`Completion`].
pub fn openai_response_to_completion(response: Value) -> Result<Completion, ProviderError> {
    let choice = response
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .ok_or_else(|| ProviderError::Parse("response has no choices".to_string()))?;
    let original = &choice["message"];

    let content = original
        .get("content")
        .and_then(|c| c.as_str())
        .unwrap_or("")
        .to_string();

    let mut tool_calls = Vec::new();
    if let Some(calls) = original.get("tool_calls").and_then(|c| c.as_array()) {
        for call in calls {
            let id = call["id"].as_str().unwrap_or_default().to_string();
            let name = call["function"]["name"]
                .as_str()
                .unwrap_or_default()
                .to_string();
            let arguments = call["function"]["arguments"]
                .as_str()
                .unwrap_or_default()
                .to_string();

            if !is_valid_function_name(&name) {
                // Still dispatched; the registry renders a not-found result
                // that the model can read.
                tracing::warn!("model requested malformed tool name: {name}");
            }
            tool_calls.push(ToolCall::new(id, name, arguments));
        }
    }

    let message = Message::assistant(content).with_tool_calls(tool_calls);
    Ok(Completion {
        message,
        usage: usage_from_response(&response),
    })
}

fn usage_from_response(response: &Value) -> Usage {
    let usage = match response.get("usage") {
        Some(usage) => usage,
        None => return Usage::default(),
    };

    let input_tokens = usage
        .get("prompt_tokens")
        .and_then(|v| v.as_i64())
        .map(|v| v as i32);
    let output_tokens = usage
        .get("completion_tokens")
        .and_then(|v| v.as_i64())
        .map(|v| v as i32);
    let total_tokens = usage
        .get("total_tokens")
        .and_then(|v| v.as_i64())
        .map(|v| v as i32)
        .or_else(|| match (input_tokens, output_tokens) {
            (Some(input), Some(output)) => Some(input + output),
            _ => None,
        });

    Usage::new(input_tokens, output_tokens, total_tokens)
}

/// Extract the text delta, if any, from one streaming chunk body.
pub fn delta_from_chunk(chunk: &Value) -> Option<&str> {
    chunk
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|choice| choice.get("delta"))
        .and_then(|delta| delta.get("content"))
        .and_then(|content| content.as_str())
}

pub fn sanitize_function_name(name: &str) -> String {
    let re = Regex::new(r"[^a-zA-Z0-9_-]").unwrap();
    re.replace_all(name, "_").to_string()
}

pub fn is_valid_function_name(name: &str) -> bool {
    let re = Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap();
    re.is_match(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TOOL_USE_RESPONSE: &str = r#"{
        "choices": [{
            "message": {
                "content": null,
                "tool_calls": [{
                    "id": "call_1",
                    "type": "function",
                    "function": {
                        "name": "nano",
                        "arguments": "{\"gender\":\"male\",\"age\":35,\"business_sector\":\"tech\",\"region\":\"california\"}"
                    }
                }]
            },
            "finish_reason": "tool_calls"
        }],
        "usage": {
            "prompt_tokens": 20,
            "completion_tokens": 15,
            "total_tokens": 35
        }
    }"#;

    #[test]
    fn test_messages_to_openai_spec() {
        let spec = messages_to_openai_spec(&[Message::user("Hello")]);
        assert_eq!(spec.len(), 1);
        assert_eq!(spec[0]["role"], "user");
        assert_eq!(spec[0]["content"], "Hello");
    }

    #[test]
    fn test_messages_to_openai_spec_tool_round() {
        let messages = vec![
            Message::user("score me"),
            Message::assistant("").with_tool_calls(vec![ToolCall::new(
                "call_1",
                "nano",
                r#"{"gender":"male"}"#,
            )]),
            Message::tool_result("call_1", "{\"score\":480}"),
        ];

        let spec = messages_to_openai_spec(&messages);
        assert_eq!(spec.len(), 3);
        assert_eq!(spec[1]["role"], "assistant");
        assert_eq!(spec[1]["tool_calls"][0]["function"]["name"], "nano");
        assert_eq!(
            spec[1]["tool_calls"][0]["function"]["arguments"],
            r#"{"gender":"male"}"#
        );
        assert_eq!(spec[2]["role"], "tool");
        assert_eq!(spec[2]["tool_call_id"], "call_1");
    }

    #[test]
    fn test_tools_to_openai_spec() {
        let tool = Tool::new(
            "greet",
            "Greet a person by name",
            json!({
                "type": "object",
                "properties": {
                    "name": {"type": "string", "description": "Person's name"}
                },
                "required": ["name"]
            }),
        );

        let spec = tools_to_openai_spec(&[tool]).unwrap();
        assert_eq!(spec.len(), 1);
        assert_eq!(spec[0]["type"], "function");
        assert_eq!(spec[0]["function"]["name"], "greet");
    }

    #[test]
    fn test_tools_to_openai_spec_duplicate() {
        let tool = Tool::new("greet", "Greet", json!({"type": "object"}));
        let result = tools_to_openai_spec(&[tool.clone(), tool]);
        assert!(matches!(result, Err(ProviderError::InvalidTool(_))));
    }

    #[test]
    fn test_response_to_completion_text() {
        let response = json!({
            "choices": [{
                "message": {"content": "Hello there!"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        });

        let completion = openai_response_to_completion(response).unwrap();
        assert_eq!(completion.message.content, "Hello there!");
        assert!(!completion.message.requests_tools());
        assert_eq!(completion.usage.total_tokens, Some(15));
    }

    #[test]
    fn test_response_to_completion_tool_calls() {
        let response: Value = serde_json::from_str(TOOL_USE_RESPONSE).unwrap();
        let completion = openai_response_to_completion(response).unwrap();

        assert!(completion.message.requests_tools());
        let call = &completion.message.tool_calls[0];
        assert_eq!(call.id, "call_1");
        assert_eq!(call.name, "nano");
        let args: Value = serde_json::from_str(&call.arguments).unwrap();
        assert_eq!(args["age"], 35);
    }

    #[test]
    fn test_response_without_choices() {
        let result = openai_response_to_completion(json!({"error": "nope"}));
        assert!(matches!(result, Err(ProviderError::Parse(_))));
    }

    #[test]
    fn test_delta_from_chunk() {
        let chunk = json!({"choices": [{"delta": {"content": "Hel"}}]});
        assert_eq!(delta_from_chunk(&chunk), Some("Hel"));

        let done = json!({"choices": [{"delta": {}, "finish_reason": "stop"}]});
        assert_eq!(delta_from_chunk(&done), None);
    }

    #[test]
    fn test_sanitize_function_name() {
        assert_eq!(sanitize_function_name("hello-world"), "hello-world");
        assert_eq!(sanitize_function_name("hello world"), "hello_world");
    }

    #[test]
    fn test_is_valid_function_name() {
        assert!(is_valid_function_name("agtech"));
        assert!(!is_valid_function_name("ag tech"));
    }
}
