//! 协议错误类型定义

use std::io;

/// 建立连接失败，对整个扫描是致命的。
#[derive(Debug, thiserror::Error)]
pub enum ConnectionFailure {
    /// 连接被拒绝
    #[error("connection to {endpoint} refused")]
    Refused {
        endpoint: String,
        #[source]
        source: io::Error,
    },

    /// 连接超时
    #[error("connection to {endpoint} timed out after {timeout_ms}ms")]
    TimedOut { endpoint: String, timeout_ms: u64 },

    /// 其他传输层故障（不可达、解析失败等）
    #[error("connection to {endpoint} failed: {source}")]
    Other {
        endpoint: String,
        #[source]
        source: io::Error,
    },
}

/// 在途交换中的传输错误，仅影响当前地址。
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// IO 错误
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// 等待应答超时
    #[error("timeout: no reply within {0}ms")]
    TimedOut(u64),

    /// 对端关闭连接
    #[error("connection closed by peer")]
    Closed,

    /// MBAP 长度字段非法
    #[error("invalid frame length: {0}")]
    FrameLength(usize),
}
