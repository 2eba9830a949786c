//! 重试与扫描节奏参数。

use std::time::Duration;

/// 忙状态码默认值。
pub const DEFAULT_BUSY_CODE: u8 = 72;

/// 忙重试策略。
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 最大尝试次数（每次忙应答计一次）
    pub max_attempts: u32,
    /// 忙应答后的等待时长
    pub retry_delay: Duration,
    /// 视为"服务端忙"的状态码
    pub busy_code: u8,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay: Duration::from_secs(5),
            busy_code: DEFAULT_BUSY_CODE,
        }
    }
}

/// 扫描节奏与请求形态。
#[derive(Debug, Clone)]
pub struct ScanPolicy {
    /// 每个地址读取的寄存器数量
    pub quantity: u16,
    /// 相邻地址之间的固定等待
    pub address_delay: Duration,
    pub retry: RetryPolicy,
}

impl Default for ScanPolicy {
    fn default() -> Self {
        Self {
            quantity: 100,
            address_delay: Duration::from_secs(3),
            retry: RetryPolicy::default(),
        }
    }
}
