use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// 单个客户端在当前时间窗口内的请求配额
#[derive(Debug, Clone)]
pub struct ClientQuota {
    /// 当前时间窗口内的请求数量
    pub request_count: u32,
    /// 当前时间窗口的开始时间
    pub window_start: Instant,
}

impl Default for ClientQuota {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientQuota {
    pub fn new() -> Self {
        Self {
            request_count: 0,
            window_start: Instant::now(),
        }
    }

    /// 重置时间窗口
    pub fn reset_window(&mut self) {
        self.request_count = 0;
        self.window_start = Instant::now();
    }

    /// 检查是否超过限制
    pub fn is_over_limit(&self, max_requests: u32) -> bool {
        self.request_count >= max_requests
    }

    /// 增加请求计数
    pub fn increment(&mut self) {
        self.request_count += 1;
    }
}

/// 限流错误类型
#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("Rate limit exceeded: {current}/{max} requests per window")]
    LimitExceeded { current: u32, max: u32 },

    #[error("rate limiter internal error: {message}")]
    Internal { message: String },
}

/// 请求限流器
///
/// 固定时间窗口，按客户端标识（IP 或代理转发地址）计数。
/// 状态仅在本进程内存中，重启即清零，多实例部署时各自独立。
pub struct RequestRateLimiter {
    /// 每个窗口允许的最大请求数
    max_requests: u32,
    /// 时间窗口长度
    window_duration: Duration,
    /// 客户端配额存储
    quotas: RwLock<HashMap<String, ClientQuota>>,
}

impl RequestRateLimiter {
    pub fn new(max_requests: u32, window_duration: Duration) -> Self {
        Self {
            max_requests,
            window_duration,
            quotas: RwLock::new(HashMap::new()),
        }
    }

    /// 判定一个请求是否放行
    ///
    /// 同一个 key 的读取和写入在写锁内完成，对该 key 而言是原子的。
    pub fn admit(&self, client_key: &str) -> Result<(), RateLimitError> {
        let mut quotas = self.quotas.write().map_err(|_| RateLimitError::Internal {
            message: "quota map lock poisoned".to_string(),
        })?;

        let quota = quotas
            .entry(client_key.to_string())
            .or_insert_with(ClientQuota::new);
        let now = Instant::now();

        // 窗口已经过去，开启新窗口
        if now.duration_since(quota.window_start) >= self.window_duration {
            quota.reset_window();
        }

        if quota.is_over_limit(self.max_requests) {
            return Err(RateLimitError::LimitExceeded {
                current: quota.request_count,
                max: self.max_requests,
            });
        }

        quota.increment();
        Ok(())
    }

    /// 清理已过期的配额记录（防止内存无限增长）
    pub fn cleanup_expired(&self) {
        if let Ok(mut quotas) = self.quotas.write() {
            let now = Instant::now();
            let window_duration = self.window_duration;

            quotas.retain(|_, quota| now.duration_since(quota.window_start) < window_duration * 2);
        }
    }
}
