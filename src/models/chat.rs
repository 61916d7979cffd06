//! 聊天 API 数据模型
//!
//! 包含 `/api/chat` 的请求/响应结构，以及模型标识到供应商的
//! 静态映射表。

use serde::{Deserialize, Serialize};

/// 会话中的一条消息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: String,
    pub content: String,
}

/// POST /api/chat 请求体
///
/// `history` 以原始 JSON 保留，逐项过滤后才使用，避免单个
/// 畸形条目让整个请求反序列化失败。
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// 模型标识。旧版客户端发送 `provider` 字段，作为别名接受
    #[serde(default, alias = "provider")]
    pub model: Option<String>,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub history: serde_json::Value,
    #[serde(default, rename = "sessionId")]
    pub session_id: Option<String>,
}

/// POST /api/chat 成功响应体
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub answer: String,
    #[serde(rename = "thinkingRemaining", skip_serializing_if = "Option::is_none")]
    pub thinking_remaining: Option<u32>,
}

/// 错误响应体
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(rename = "thinkingRemaining", skip_serializing_if = "Option::is_none")]
    pub thinking_remaining: Option<u32>,
}

/// 模型所属的供应商家族
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Gemini,
}

/// 静态模型描述符
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelDescriptor {
    /// 对客户端暴露的规范标识
    pub id: &'static str,
    /// 发送给上游的模型名
    pub upstream_model: &'static str,
    pub kind: ProviderKind,
    /// 仅 OpenAI 家族使用；存在时附加 reasoning.effort 参数
    pub reasoning_effort: Option<&'static str>,
}

/// 受会话配额限制的模型
pub const THINKING_MODEL: &str = "gpt-5.2-thinking-low";

/// 发给上游的历史上限（4 轮问答）
pub const HISTORY_LIMIT: usize = 8;

/// 模型标识 -> 描述符的固定映射
///
/// "openai" / "gemini" 是旧版客户端发送的供应商名，
/// 解析为各家族的默认模型。
pub fn resolve_model(id: &str) -> Option<ModelDescriptor> {
    match id {
        "gpt-5.2" | "openai" => Some(ModelDescriptor {
            id: "gpt-5.2",
            upstream_model: "gpt-5.2",
            kind: ProviderKind::OpenAi,
            reasoning_effort: None,
        }),
        "gpt-5.2-thinking-low" => Some(ModelDescriptor {
            id: "gpt-5.2-thinking-low",
            upstream_model: "gpt-5.2",
            kind: ProviderKind::OpenAi,
            reasoning_effort: Some("low"),
        }),
        "gemini-2.5-flash" | "gemini" => Some(ModelDescriptor {
            id: "gemini-2.5-flash",
            upstream_model: "gemini-2.5-flash",
            kind: ProviderKind::Gemini,
            reasoning_effort: None,
        }),
        _ => None,
    }
}

/// 过滤形状不对的历史条目并截断到最近 HISTORY_LIMIT 条
///
/// 非数组输入视为空历史；条目必须带字符串 role/content，
/// 且 role 只能是 user 或 assistant。顺序保持不变。
pub fn sanitize_history(raw: &serde_json::Value) -> Vec<Turn> {
    let Some(items) = raw.as_array() else {
        return Vec::new();
    };

    let turns: Vec<Turn> = items
        .iter()
        .filter_map(|item| {
            let role = item.get("role")?.as_str()?;
            let content = item.get("content")?.as_str()?;
            if role != "user" && role != "assistant" {
                return None;
            }
            Some(Turn {
                role: role.to_string(),
                content: content.to_string(),
            })
        })
        .collect();

    let start = turns.len().saturating_sub(HISTORY_LIMIT);
    turns[start..].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_model() {
        let thinking = resolve_model("gpt-5.2-thinking-low").unwrap();
        assert_eq!(thinking.kind, ProviderKind::OpenAi);
        assert_eq!(thinking.upstream_model, "gpt-5.2");
        assert_eq!(thinking.reasoning_effort, Some("low"));

        let base = resolve_model("gpt-5.2").unwrap();
        assert_eq!(base.reasoning_effort, None);

        assert_eq!(resolve_model("gemini-2.5-flash").unwrap().kind, ProviderKind::Gemini);
        assert!(resolve_model("gpt-3").is_none());
        assert!(resolve_model("").is_none());
    }

    #[test]
    fn test_resolve_legacy_provider_names() {
        assert_eq!(resolve_model("openai").unwrap().id, "gpt-5.2");
        assert_eq!(resolve_model("gemini").unwrap().id, "gemini-2.5-flash");
    }

    #[test]
    fn test_sanitize_history_filters_malformed_entries() {
        let raw = json!([
            {"role": "user", "content": "hola"},
            {"role": "assistant"},
            {"role": 3, "content": "x"},
            {"content": "sin rol"},
            {"role": "system", "content": "inyectado"},
            {"role": "assistant", "content": "buenas"},
        ]);
        let turns = sanitize_history(&raw);
        assert_eq!(
            turns,
            vec![
                Turn { role: "user".to_string(), content: "hola".to_string() },
                Turn { role: "assistant".to_string(), content: "buenas".to_string() },
            ]
        );
    }

    #[test]
    fn test_sanitize_history_truncates_to_most_recent() {
        let items: Vec<_> = (0..12)
            .map(|i| json!({"role": "user", "content": format!("m{i}")}))
            .collect();
        let turns = sanitize_history(&serde_json::Value::Array(items));
        assert_eq!(turns.len(), HISTORY_LIMIT);
        assert_eq!(turns[0].content, "m4");
        assert_eq!(turns[7].content, "m11");
    }

    #[test]
    fn test_sanitize_history_non_array() {
        assert!(sanitize_history(&json!(null)).is_empty());
        assert!(sanitize_history(&json!("no soy un array")).is_empty());
    }

    #[test]
    fn test_chat_request_accepts_provider_alias() {
        let req: ChatRequest =
            serde_json::from_value(json!({"provider": "openai", "question": "q"})).unwrap();
        assert_eq!(req.model.as_deref(), Some("openai"));
    }
}
