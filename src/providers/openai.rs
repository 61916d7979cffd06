//! OpenAI Responses API Provider
use crate::error::ProviderError;
use crate::models::{ModelDescriptor, Turn};
use crate::providers::{COURSE_SYSTEM_PROMPT, FALLBACK_ANSWER};
use reqwest::Client;
use serde_json::json;

const OPENAI_BASE_URL: &str = "https://api.openai.com";

pub struct OpenAiProvider {
    pub client: Client,
    pub api_key: Option<String>,
    pub base_url: String,
}

impl OpenAiProvider {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: OPENAI_BASE_URL.to_string(),
        }
    }

    /// 单次调用 Responses API
    ///
    /// 消息顺序固定为 [系统提示, ...历史, 提问]。描述符带
    /// reasoning_effort 时才附加 reasoning 参数。
    pub async fn ask(
        &self,
        descriptor: &ModelDescriptor,
        question: &str,
        history: &[Turn],
    ) -> Result<String, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingCredential("OPENAI_API_KEY"))?;

        let mut input = vec![json!({"role": "system", "content": COURSE_SYSTEM_PROMPT})];
        for turn in history {
            input.push(json!({"role": turn.role, "content": turn.content}));
        }
        input.push(json!({"role": "user", "content": question}));

        let mut body = json!({
            "model": descriptor.upstream_model,
            "input": input,
        });
        if let Some(effort) = descriptor.reasoning_effort {
            body["reasoning"] = json!({"effort": effort});
        }

        let url = format!("{}/v1/responses", self.base_url);
        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::Upstream { status, body });
        }

        let data: serde_json::Value = resp.json().await?;
        Ok(extract_answer(&data))
    }
}

/// 提取回答文本
///
/// 优先使用 output_text 字段；缺失时扫描结构化 output 中
/// message 条目的 output_text 块。两者都拿不到时退回占位回答。
fn extract_answer(data: &serde_json::Value) -> String {
    if let Some(text) = data["output_text"].as_str() {
        let text = text.trim();
        if !text.is_empty() {
            return text.to_string();
        }
    }

    let mut parts: Vec<&str> = Vec::new();
    if let Some(output) = data["output"].as_array() {
        for item in output {
            if item["type"].as_str() != Some("message") {
                continue;
            }
            if let Some(content) = item["content"].as_array() {
                for block in content {
                    if block["type"].as_str() == Some("output_text") {
                        if let Some(text) = block["text"].as_str() {
                            parts.push(text);
                        }
                    }
                }
            }
        }
    }

    let joined = parts.join("\n");
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        FALLBACK_ANSWER.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resolve_model;
    use serde_json::json;

    #[tokio::test]
    async fn test_missing_credential_fails_fast() {
        let provider = OpenAiProvider::new(None);
        let descriptor = resolve_model("gpt-5.2").unwrap();
        let err = provider.ask(&descriptor, "hola", &[]).await.unwrap_err();
        assert!(matches!(err, ProviderError::MissingCredential("OPENAI_API_KEY")));
    }

    #[test]
    fn test_extract_answer_primary_field() {
        let data = json!({"output_text": "  Claro, aquí tienes.  "});
        assert_eq!(extract_answer(&data), "Claro, aquí tienes.");
    }

    #[test]
    fn test_extract_answer_scans_structured_output() {
        let data = json!({
            "output": [
                {"type": "reasoning", "summary": []},
                {"type": "message", "content": [
                    {"type": "output_text", "text": "Primera parte."},
                    {"type": "output_text", "text": "Segunda parte."}
                ]}
            ]
        });
        assert_eq!(extract_answer(&data), "Primera parte.\nSegunda parte.");
    }

    #[test]
    fn test_extract_answer_malformed_payload_degrades() {
        assert_eq!(extract_answer(&json!({})), FALLBACK_ANSWER);
        assert_eq!(extract_answer(&json!({"output": "no es un array"})), FALLBACK_ANSWER);
        assert_eq!(extract_answer(&json!({"output_text": "   "})), FALLBACK_ANSWER);
    }
}
