//! 扫描运行配置加载。

use domain::{Endpoint, MAX_READ_QUANTITY, RetryPolicy, ScanPolicy, UnitId, ValueFormat};
use std::env;
use std::ops::Range;
use std::path::PathBuf;
use std::time::Duration;

/// 配置加载错误。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env: {0}")]
    Missing(String),
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
}

/// 输出格式。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// 每条记录一行文本
    Text,
    /// 每条记录一行 JSON
    JsonLines,
}

/// 扫描运行配置。
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub host: String,
    pub port: u16,
    pub unit_id: UnitId,
    pub address_start: u16,
    /// 结束地址（不含），最大 65536
    pub address_end: u32,
    pub quantity: u16,
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
    pub scan_delay_ms: u64,
    pub busy_code: u8,
    pub signed_values: bool,
    pub connect_timeout_ms: u64,
    pub read_timeout_ms: u64,
    pub output_path: PathBuf,
    pub output_format: OutputFormat,
}

impl ScanConfig {
    /// 从环境变量读取配置。
    pub fn from_env() -> Result<Self, ConfigError> {
        let host =
            env::var("REGSCAN_HOST").map_err(|_| ConfigError::Missing("REGSCAN_HOST".to_string()))?;
        let port = read_u16_with_default("REGSCAN_PORT", 502)?;
        let unit_id = read_u8_with_default("REGSCAN_UNIT_ID", 52)?;
        let address_start = read_u16_with_default("REGSCAN_ADDRESS_START", 0)?;
        let address_end = read_u32_with_default("REGSCAN_ADDRESS_END", 300)?;
        if address_end > u32::from(u16::MAX) + 1 || address_end < u32::from(address_start) {
            return Err(ConfigError::Invalid(
                "REGSCAN_ADDRESS_END".to_string(),
                address_end.to_string(),
            ));
        }
        let quantity = read_u16_with_default("REGSCAN_QUANTITY", 100)?;
        if quantity == 0 || quantity > MAX_READ_QUANTITY {
            return Err(ConfigError::Invalid(
                "REGSCAN_QUANTITY".to_string(),
                quantity.to_string(),
            ));
        }
        let max_attempts = read_u32_with_default("REGSCAN_MAX_ATTEMPTS", 3)?;
        let retry_delay_ms = read_u64_with_default("REGSCAN_RETRY_DELAY_MS", 5000)?;
        let scan_delay_ms = read_u64_with_default("REGSCAN_SCAN_DELAY_MS", 3000)?;
        let busy_code = read_u8_with_default("REGSCAN_BUSY_CODE", 72)?;
        let signed_values = read_bool_with_default("REGSCAN_SIGNED_VALUES", true)?;
        let connect_timeout_ms = read_u64_with_default("REGSCAN_CONNECT_TIMEOUT_MS", 5000)?;
        let read_timeout_ms = read_u64_with_default("REGSCAN_READ_TIMEOUT_MS", 3000)?;
        let output_path = read_optional("REGSCAN_OUTPUT_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(format!("output_slave_{}.txt", unit_id)));
        let output_format = match read_optional("REGSCAN_OUTPUT_FORMAT") {
            None => OutputFormat::Text,
            Some(value) => match value.to_ascii_lowercase().as_str() {
                "text" | "txt" => OutputFormat::Text,
                "jsonl" | "json" => OutputFormat::JsonLines,
                _ => {
                    return Err(ConfigError::Invalid(
                        "REGSCAN_OUTPUT_FORMAT".to_string(),
                        value,
                    ));
                }
            },
        };

        Ok(Self {
            host,
            port,
            unit_id,
            address_start,
            address_end,
            quantity,
            max_attempts,
            retry_delay_ms,
            scan_delay_ms,
            busy_code,
            signed_values,
            connect_timeout_ms,
            read_timeout_ms,
            output_path,
            output_format,
        })
    }

    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.host.clone(), self.port)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            busy_code: self.busy_code,
        }
    }

    pub fn scan_policy(&self) -> ScanPolicy {
        ScanPolicy {
            quantity: self.quantity,
            address_delay: Duration::from_millis(self.scan_delay_ms),
            retry: self.retry_policy(),
        }
    }

    pub fn value_format(&self) -> ValueFormat {
        if self.signed_values {
            ValueFormat::Signed
        } else {
            ValueFormat::Unsigned
        }
    }

    /// 待扫描地址（升序，不含结束地址）。
    pub fn addresses(&self) -> impl Iterator<Item = u16> + use<> {
        let range: Range<u32> = u32::from(self.address_start)..self.address_end;
        range.map(|address| address as u16)
    }
}

fn read_u8_with_default(key: &str, default: u8) -> Result<u8, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u8>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_u16_with_default(key: &str, default: u16) -> Result<u16, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u16>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_u32_with_default(key: &str, default: u32) -> Result<u32, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u32>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_u64_with_default(key: &str, default: u64) -> Result<u64, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u64>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_optional(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.is_empty() => Some(value),
        _ => None,
    }
}

fn read_bool_with_default(key: &str, default: bool) -> Result<bool, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" => Ok(true),
        "0" | "false" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid(key.to_string(), value)),
    }
}
