//! HTTP API 服务器
//!
//! 请求处理状态机：校验 → 配额门 → 清洗历史 → 分发上游 →
//! 提交配额 → 组装响应。除配额表外每个请求相互独立。

use crate::config::Config;
use crate::models::{
    resolve_model, sanitize_history, ChatRequest, ChatResponse, ErrorResponse, THINKING_MODEL,
};
use crate::providers::Providers;
use crate::session::{QuotaDecision, ThinkingQuota};
use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tower_http::services::ServeDir;

/// 请求体上限 1MB，与原接口一致
const BODY_LIMIT: usize = 1024 * 1024;

const INVALID_MODEL_ERROR: &str =
    "Modelo no válido. Usa \"gpt-5.2\", \"gpt-5.2-thinking-low\" o \"gemini-2.5-flash\".";
const EMPTY_QUESTION_ERROR: &str = "La pregunta es obligatoria.";
const MISSING_SESSION_ERROR: &str =
    "Falta el identificador de sesión para el modelo de razonamiento.";
const QUOTA_EXCEEDED_ERROR: &str =
    "Has alcanzado el límite de 2 prompts para GPT 5.2 Thinking (low) en esta sesión.";
const UPSTREAM_ERROR: &str =
    "No se pudo obtener respuesta del modelo. Revisa tus claves API y la configuración del proveedor.";

#[derive(Clone)]
pub struct AppState {
    pub providers: Arc<Providers>,
    pub quota: Arc<ThinkingQuota>,
}

/// 构建应用路由
pub fn build_router(state: AppState, static_dir: &Path) -> Router {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/health", get(health))
        .fallback_service(ServeDir::new(static_dir))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .with_state(state)
}

/// 启动服务器，Ctrl-C 时优雅关闭
pub async fn run(config: Config) -> anyhow::Result<()> {
    let state = AppState {
        providers: Arc::new(Providers::new(
            config.openai_api_key.clone(),
            config.gemini_api_key.clone(),
        )),
        quota: Arc::new(ThinkingQuota::default()),
    };
    let app = build_router(state, &config.static_dir);

    let addr: std::net::SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}

async fn health() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

async fn chat(State(state): State<AppState>, Json(req): Json<ChatRequest>) -> Response {
    // 1. 校验：模型必须在映射表里，问题非空
    let Some(descriptor) = req.model.as_deref().and_then(resolve_model) else {
        return reject(StatusCode::BAD_REQUEST, INVALID_MODEL_ERROR, None);
    };
    let question = req.question.as_deref().map(str::trim).unwrap_or("");
    if question.is_empty() {
        return reject(StatusCode::BAD_REQUEST, EMPTY_QUESTION_ERROR, None);
    }

    // 2. 配额门，只针对思考模型
    let gated = descriptor.id == THINKING_MODEL;
    let session_id = req
        .session_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    if gated {
        let Some(session_id) = session_id else {
            return reject(StatusCode::BAD_REQUEST, MISSING_SESSION_ERROR, None);
        };
        if state.quota.check_and_reserve(session_id) == QuotaDecision::Denied {
            tracing::info!("[QUOTA] sesión {} agotó el cupo de {}", session_id, descriptor.id);
            return reject(StatusCode::TOO_MANY_REQUESTS, QUOTA_EXCEEDED_ERROR, Some(0));
        }
    }

    // 3. 清洗并截断历史
    let history = sanitize_history(&req.history);

    // 4. 分发到上游
    match state.providers.dispatch(&descriptor, question, &history).await {
        Ok(answer) => {
            // 5. 成功后读取剩余额度
            let thinking_remaining = match (gated, session_id) {
                (true, Some(session_id)) => Some(state.quota.commit(session_id)),
                _ => None,
            };
            (StatusCode::OK, Json(ChatResponse { answer, thinking_remaining })).into_response()
        }
        Err(err) => {
            // 失败的请求归还占用，不消耗配额
            if gated {
                if let Some(session_id) = session_id {
                    state.quota.release(session_id);
                }
            }
            tracing::error!("[CHAT] fallo upstream model={}: {}", descriptor.id, err);
            reject(StatusCode::INTERNAL_SERVER_ERROR, UPSTREAM_ERROR, None)
        }
    }
}

fn reject(status: StatusCode, message: &str, thinking_remaining: Option<u32>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
            thinking_remaining,
        }),
    )
        .into_response()
}
