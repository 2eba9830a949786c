use crate::retry::read_with_retry;
use domain::{ReadOutcome, ReadRequest, ScanPolicy, ScanRecord, UnitId, ValueFormat};
use regscan_protocol::Exchange;
use regscan_storage::RecordSink;
use regscan_telemetry::{
    record_address_scanned, record_exhausted, record_protocol_error, record_record_written,
    record_sink_failure, record_unrecognized,
};
use tracing::{debug, info, warn};

/// 扫描统计。被跳过的地址不写入输出端，只在此计数。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub scanned: u64,
    pub recorded: u64,
    pub exhausted: u64,
    pub protocol_errors: u64,
    pub transport_errors: u64,
    pub unrecognized: u64,
    pub rejected: u64,
    pub sink_failures: u64,
}

impl ScanSummary {
    /// 未产生记录的地址数。
    pub fn skipped(&self) -> u64 {
        self.scanned - self.recorded
    }
}

/// 按顺序扫描地址，成功读取的结果写入 `sink`。
///
/// 每个地址处理完（无论结果）都固定等待 `address_delay`。
/// 永不返回错误：扫描完成即视为成功，逐地址结果体现在 [`ScanSummary`] 中。
pub async fn scan<E, S, I>(
    exchange: &mut E,
    addresses: I,
    policy: &ScanPolicy,
    format: ValueFormat,
    sink: &S,
) -> ScanSummary
where
    E: Exchange + ?Sized,
    S: RecordSink + ?Sized,
    I: IntoIterator<Item = u16>,
{
    let unit_id = exchange.unit_id();
    let mut summary = ScanSummary::default();

    for address in addresses {
        debug!(address, unit_id, "checking address");
        summary.scanned += 1;
        record_address_scanned();

        // 靠近 65535 时收缩数量，避免越过寄存器空间
        let remaining = u32::from(u16::MAX) - u32::from(address) + 1;
        let quantity = u32::from(policy.quantity).min(remaining) as u16;

        match ReadRequest::new(unit_id, address, quantity) {
            Ok(request) => {
                let outcome = read_with_retry(exchange, &request, &policy.retry, format).await;
                handle_outcome(&mut summary, unit_id, address, outcome, sink).await;
            }
            Err(e) => {
                summary.rejected += 1;
                warn!(address, unit_id, error = %e, "skipping invalid read request");
            }
        }

        tokio::time::sleep(policy.address_delay).await;
    }

    info!(
        unit_id,
        scanned = summary.scanned,
        recorded = summary.recorded,
        skipped = summary.skipped(),
        "scan finished"
    );
    summary
}

async fn handle_outcome<S>(
    summary: &mut ScanSummary,
    unit_id: UnitId,
    address: u16,
    outcome: ReadOutcome,
    sink: &S,
) where
    S: RecordSink + ?Sized,
{
    match outcome {
        ReadOutcome::Values(values) => {
            let record = ScanRecord {
                unit_id,
                address,
                values,
            };
            match sink.append(&record).await {
                Ok(()) => {
                    summary.recorded += 1;
                    record_record_written();
                }
                Err(e) => {
                    summary.sink_failures += 1;
                    record_sink_failure();
                    warn!(address, unit_id, error = %e, "failed to write scan record");
                }
            }
        }
        ReadOutcome::ServerBusy | ReadOutcome::Exhausted { .. } => {
            summary.exhausted += 1;
            record_exhausted();
        }
        ReadOutcome::ProtocolError(_) => {
            summary.protocol_errors += 1;
            record_protocol_error();
        }
        ReadOutcome::TransportError(_) => {
            summary.transport_errors += 1;
        }
        ReadOutcome::Unrecognized(_) => {
            summary.unrecognized += 1;
            record_unrecognized();
        }
    }
}
