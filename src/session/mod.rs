pub mod quota;

pub use quota::{QuotaDecision, ThinkingQuota, THINKING_LIMIT};
