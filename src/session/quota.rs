//! 思考模型的会话配额追踪
//!
//! 配额只约束一个模型档位，按客户端自带的 sessionId 计数。
//! 该标识未经认证、可伪造，这里提供的只是建议性的、
//! 依赖客户端配合的限额。

use indexmap::IndexMap;
use parking_lot::Mutex;

/// 每会话允许的思考模型调用次数
pub const THINKING_LIMIT: u32 = 2;

/// 配额表容量上限，超出时按 LRU 淘汰最久未触达的会话
const QUOTA_CAPACITY: usize = 4096;

/// 配额检查结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaDecision {
    Allowed,
    Denied,
}

/// 按会话追踪思考模型用量
///
/// `check_and_reserve` 在单把锁内完成检查与占用，同一会话的
/// 并发请求无法把用量推过上限。上游调用失败时用 `release`
/// 归还占用，失败的请求不消耗配额。
#[derive(Debug)]
pub struct ThinkingQuota {
    usage: Mutex<IndexMap<String, u32>>,
    limit: u32,
    capacity: usize,
}

impl Default for ThinkingQuota {
    fn default() -> Self {
        Self::new(THINKING_LIMIT, QUOTA_CAPACITY)
    }
}

impl ThinkingQuota {
    pub fn new(limit: u32, capacity: usize) -> Self {
        Self {
            usage: Mutex::new(IndexMap::new()),
            limit,
            capacity,
        }
    }

    /// 原子地检查并占用一次调用额度
    ///
    /// 触达的会话移到表尾，表满时从表头淘汰。
    pub fn check_and_reserve(&self, session_id: &str) -> QuotaDecision {
        let mut usage = self.usage.lock();

        let count = usage.shift_remove(session_id).unwrap_or(0);
        if count >= self.limit {
            usage.insert(session_id.to_string(), count);
            return QuotaDecision::Denied;
        }

        usage.insert(session_id.to_string(), count + 1);
        while usage.len() > self.capacity {
            if let Some((evicted, _)) = usage.shift_remove_index(0) {
                tracing::debug!("[QUOTA] capacidad superada, sesión {} descartada", evicted);
            }
        }

        QuotaDecision::Allowed
    }

    /// 上游成功后读取剩余额度
    pub fn commit(&self, session_id: &str) -> u32 {
        let usage = self.usage.lock();
        let count = usage.get(session_id).copied().unwrap_or(0);
        self.limit.saturating_sub(count)
    }

    /// 上游失败后归还 `check_and_reserve` 占用的额度
    pub fn release(&self, session_id: &str) {
        let mut usage = self.usage.lock();
        if let Some(count) = usage.get_mut(session_id) {
            *count = count.saturating_sub(1);
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.usage.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_limit() {
        let quota = ThinkingQuota::default();

        assert_eq!(quota.check_and_reserve("s1"), QuotaDecision::Allowed);
        assert_eq!(quota.commit("s1"), 1);
        assert_eq!(quota.check_and_reserve("s1"), QuotaDecision::Allowed);
        assert_eq!(quota.commit("s1"), 0);

        // 第三次必须被拒绝，且用量不再增长
        assert_eq!(quota.check_and_reserve("s1"), QuotaDecision::Denied);
        assert_eq!(quota.check_and_reserve("s1"), QuotaDecision::Denied);
        assert_eq!(quota.commit("s1"), 0);
    }

    #[test]
    fn test_sessions_are_independent() {
        let quota = ThinkingQuota::default();
        assert_eq!(quota.check_and_reserve("s1"), QuotaDecision::Allowed);
        assert_eq!(quota.check_and_reserve("s2"), QuotaDecision::Allowed);
        assert_eq!(quota.commit("s2"), 1);
    }

    #[test]
    fn test_release_returns_reservation() {
        let quota = ThinkingQuota::new(1, 16);

        assert_eq!(quota.check_and_reserve("s1"), QuotaDecision::Allowed);
        quota.release("s1");

        // 失败的调用不消耗配额
        assert_eq!(quota.check_and_reserve("s1"), QuotaDecision::Allowed);
        assert_eq!(quota.commit("s1"), 0);
    }

    #[test]
    fn test_release_unknown_session_is_noop() {
        let quota = ThinkingQuota::default();
        quota.release("nunca-vista");
        assert_eq!(quota.commit("nunca-vista"), THINKING_LIMIT);
    }

    #[test]
    fn test_lru_eviction_bounds_the_map() {
        let quota = ThinkingQuota::new(2, 2);

        quota.check_and_reserve("s1");
        quota.check_and_reserve("s2");
        // s1 重新触达，s2 变为最旧
        quota.check_and_reserve("s1");
        quota.check_and_reserve("s3");

        assert_eq!(quota.len(), 2);
        // s2 被淘汰后从零开始计数
        assert_eq!(quota.commit("s2"), 2);
        // s1 保留了两次占用
        assert_eq!(quota.check_and_reserve("s1"), QuotaDecision::Denied);
    }
}
