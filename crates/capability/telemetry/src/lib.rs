//! 追踪初始化、扫描 ID 与扫描计数指标。

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{EnvFilter, fmt};

/// 扫描指标快照。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub addresses_scanned: u64,
    pub records_written: u64,
    pub busy_retries: u64,
    pub busy_exhausted: u64,
    pub protocol_errors: u64,
    pub transport_errors: u64,
    pub unrecognized: u64,
    pub sink_failures: u64,
}

/// 进程级扫描计数。
pub struct TelemetryMetrics {
    addresses_scanned: AtomicU64,
    records_written: AtomicU64,
    busy_retries: AtomicU64,
    busy_exhausted: AtomicU64,
    protocol_errors: AtomicU64,
    transport_errors: AtomicU64,
    unrecognized: AtomicU64,
    sink_failures: AtomicU64,
}

impl TelemetryMetrics {
    pub fn new() -> Self {
        Self {
            addresses_scanned: AtomicU64::new(0),
            records_written: AtomicU64::new(0),
            busy_retries: AtomicU64::new(0),
            busy_exhausted: AtomicU64::new(0),
            protocol_errors: AtomicU64::new(0),
            transport_errors: AtomicU64::new(0),
            unrecognized: AtomicU64::new(0),
            sink_failures: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            addresses_scanned: self.addresses_scanned.load(Ordering::Relaxed),
            records_written: self.records_written.load(Ordering::Relaxed),
            busy_retries: self.busy_retries.load(Ordering::Relaxed),
            busy_exhausted: self.busy_exhausted.load(Ordering::Relaxed),
            protocol_errors: self.protocol_errors.load(Ordering::Relaxed),
            transport_errors: self.transport_errors.load(Ordering::Relaxed),
            unrecognized: self.unrecognized.load(Ordering::Relaxed),
            sink_failures: self.sink_failures.load(Ordering::Relaxed),
        }
    }
}

impl Default for TelemetryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

static METRICS: OnceLock<TelemetryMetrics> = OnceLock::new();

/// 获取全局指标实例。
pub fn metrics() -> &'static TelemetryMetrics {
    METRICS.get_or_init(TelemetryMetrics::new)
}

/// 初始化 tracing（默认 info）。
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// 生成新的 scan_id，用于关联一次扫描的全部日志。
pub fn new_scan_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// 记录已扫描地址数。
pub fn record_address_scanned() {
    metrics().addresses_scanned.fetch_add(1, Ordering::Relaxed);
}

/// 记录写入输出端的记录数。
pub fn record_record_written() {
    metrics().records_written.fetch_add(1, Ordering::Relaxed);
}

/// 记录忙重试次数。
pub fn record_busy_retry() {
    metrics().busy_retries.fetch_add(1, Ordering::Relaxed);
}

/// 记录忙重试耗尽次数。
pub fn record_exhausted() {
    metrics().busy_exhausted.fetch_add(1, Ordering::Relaxed);
}

/// 记录非忙错误码次数。
pub fn record_protocol_error() {
    metrics().protocol_errors.fetch_add(1, Ordering::Relaxed);
}

/// 记录传输错误次数。
pub fn record_transport_error() {
    metrics().transport_errors.fetch_add(1, Ordering::Relaxed);
}

/// 记录无法识别的应答次数。
pub fn record_unrecognized() {
    metrics().unrecognized.fetch_add(1, Ordering::Relaxed);
}

/// 记录输出端写入失败次数。
pub fn record_sink_failure() {
    metrics().sink_failures.fetch_add(1, Ordering::Relaxed);
}
