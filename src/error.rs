//! 错误类型定义
use thiserror::Error;

/// 上游调用失败的分类
///
/// 所有变体在请求处理边界统一转换为对客户端不泄露细节的 500 响应，
/// 完整信息只写入服务端日志。
#[derive(Debug, Error)]
pub enum ProviderError {
    /// 环境变量中缺少 API 凭证（配置错误，调用时才暴露）
    #[error("missing credential: {0} is not set")]
    MissingCredential(&'static str),

    /// 上游返回非 2xx 状态码
    #[error("upstream error: {status} - {body}")]
    Upstream {
        status: reqwest::StatusCode,
        body: String,
    },

    /// 网络传输失败
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}
