pub mod data;
pub mod policy;

pub use data::{ReadOutcome, ReadRequest, Register, RequestError, ScanRecord, ValueFormat};
pub use policy::{RetryPolicy, ScanPolicy};

use std::fmt;

/// 从站（单元）标识。
pub type UnitId = u8;

/// 单次读请求允许的最大寄存器数量。
///
/// 协议本身允许 125，扫描只按 100 一组读取。
pub const MAX_READ_QUANTITY: u16 = 100;

/// 服务端地址：主机 + 端口，扫描会话期间不可变。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
