//! Gemini generateContent Provider
//!
//! 实现候选链回退：先试请求的模型，404 时降级到基线模型。
//! 404 以外的失败立即中断，不继续尝试 —— 回退只覆盖
//! "请求的变体不存在" 这一种情况，不是通用重试。

use crate::error::ProviderError;
use crate::models::{ModelDescriptor, Turn};
use crate::providers::{COURSE_SYSTEM_PROMPT, FALLBACK_ANSWER};
use reqwest::{Client, StatusCode};
use serde_json::json;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// 请求的模型不存在时回退到的基线模型
const GEMINI_FALLBACK_MODEL: &str = "gemini-1.5-flash";

pub struct GeminiProvider {
    pub client: Client,
    pub api_key: Option<String>,
    pub base_url: String,
}

impl GeminiProvider {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: GEMINI_BASE_URL.to_string(),
        }
    }

    pub async fn ask(
        &self,
        descriptor: &ModelDescriptor,
        question: &str,
        history: &[Turn],
    ) -> Result<String, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingCredential("GEMINI_API_KEY"))?;

        // Gemini 没有 assistant 角色，映射为 model
        let mut contents: Vec<serde_json::Value> = history
            .iter()
            .map(|turn| {
                let role = if turn.role == "assistant" { "model" } else { "user" };
                json!({"role": role, "parts": [{"text": turn.content}]})
            })
            .collect();
        contents.push(json!({"role": "user", "parts": [{"text": question}]}));

        let body = json!({
            "system_instruction": {"parts": [{"text": COURSE_SYSTEM_PROMPT}]},
            "contents": contents,
            "generationConfig": {"temperature": 0.4},
        });

        // 候选链：请求的模型 + 基线，相邻重复去重
        let mut candidates = vec![descriptor.upstream_model];
        if candidates.last() != Some(&GEMINI_FALLBACK_MODEL) {
            candidates.push(GEMINI_FALLBACK_MODEL);
        }

        let mut not_found: Option<ProviderError> = None;
        for model in &candidates {
            let url = format!(
                "{}/v1beta/models/{}:generateContent?key={}",
                self.base_url, model, api_key
            );
            let resp = self.client.post(&url).json(&body).send().await?;
            let status = resp.status();

            if status.is_success() {
                let data: serde_json::Value = resp.json().await?;
                return Ok(extract_answer(&data));
            }

            let text = resp.text().await.unwrap_or_default();
            if status == StatusCode::NOT_FOUND {
                tracing::warn!("[GEMINI] modelo {} no disponible (404), probando siguiente candidato", model);
                not_found = Some(ProviderError::Upstream { status, body: text });
                continue;
            }
            return Err(ProviderError::Upstream { status, body: text });
        }

        Err(not_found.unwrap_or_else(|| ProviderError::Upstream {
            status: StatusCode::NOT_FOUND,
            body: "todos los candidatos agotados".to_string(),
        }))
    }
}

/// 提取回答文本：candidates[0] 的 parts 按行拼接，
/// 形状异常时退回占位回答
fn extract_answer(data: &serde_json::Value) -> String {
    let text = data["candidates"][0]["content"]["parts"]
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part["text"].as_str())
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default();

    let trimmed = text.trim();
    if trimmed.is_empty() {
        FALLBACK_ANSWER.to_string()
    } else {
        trimmed.to_string()
    }
}
