use crate::{MAX_READ_QUANTITY, UnitId};
use serde::Serialize;
use std::fmt;

/// 读请求参数错误。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("quantity must be within 1..={max}, got {0}", max = MAX_READ_QUANTITY)]
    Quantity(u16),
    #[error("address {address} + quantity {quantity} exceeds the register space")]
    AddressOverflow { address: u16, quantity: u16 },
}

/// 读保持寄存器请求（每个地址构造一次）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadRequest {
    unit_id: UnitId,
    address: u16,
    quantity: u16,
}

impl ReadRequest {
    /// 构造请求；数量必须在 1..=100 且不能越过 65535 号寄存器。
    pub fn new(unit_id: UnitId, address: u16, quantity: u16) -> Result<Self, RequestError> {
        if quantity == 0 || quantity > MAX_READ_QUANTITY {
            return Err(RequestError::Quantity(quantity));
        }
        if u32::from(address) + u32::from(quantity) > u32::from(u16::MAX) + 1 {
            return Err(RequestError::AddressOverflow { address, quantity });
        }
        Ok(Self {
            unit_id,
            address,
            quantity,
        })
    }

    pub fn unit_id(&self) -> UnitId {
        self.unit_id
    }

    pub fn address(&self) -> u16 {
        self.address
    }

    pub fn quantity(&self) -> u16 {
        self.quantity
    }
}

/// 寄存器取值解释方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueFormat {
    /// 16 位有符号整数
    #[default]
    Signed,
    /// 16 位无符号整数
    Unsigned,
}

impl ValueFormat {
    /// 将原始寄存器字解释为整数值。
    pub fn interpret(self, raw: u16) -> i32 {
        match self {
            ValueFormat::Signed => i32::from(raw as i16),
            ValueFormat::Unsigned => i32::from(raw),
        }
    }
}

/// 单个保持寄存器。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Register {
    pub address: u16,
    pub value: i32,
}

/// 一次交换的终态结果，下游必须逐一匹配。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// 读取成功的寄存器值（保持原始顺序）
    Values(Vec<i32>),
    /// 服务端忙
    ServerBusy,
    /// 非忙的错误码
    ProtocolError(u8),
    /// 交换过程中的传输故障
    TransportError(String),
    /// 无法识别的应答形态
    Unrecognized(String),
    /// 忙重试次数耗尽
    Exhausted { attempts: u32 },
}

impl ReadOutcome {
    pub fn is_values(&self) -> bool {
        matches!(self, ReadOutcome::Values(_))
    }

    /// 日志用的简短分类名。
    pub fn kind(&self) -> &'static str {
        match self {
            ReadOutcome::Values(_) => "values",
            ReadOutcome::ServerBusy => "server_busy",
            ReadOutcome::ProtocolError(_) => "protocol_error",
            ReadOutcome::TransportError(_) => "transport_error",
            ReadOutcome::Unrecognized(_) => "unrecognized",
            ReadOutcome::Exhausted { .. } => "exhausted",
        }
    }
}

/// 写入输出端的扫描记录。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanRecord {
    pub unit_id: UnitId,
    pub address: u16,
    pub values: Vec<i32>,
}

impl fmt::Display for ScanRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Values at address {} (Slave ID {}): {:?}",
            self.address, self.unit_id, self.values
        )
    }
}
