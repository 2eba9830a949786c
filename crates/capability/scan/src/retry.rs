use domain::{ReadOutcome, ReadRequest, RetryPolicy, ValueFormat};
use regscan_normalize::normalize;
use regscan_protocol::{Exchange, decode_reply, encode_read_request};
use regscan_telemetry::{record_busy_retry, record_transport_error};
use tracing::{debug, info, warn};

/// 带忙重试的单地址读取。
///
/// 只有 `ServerBusy` 会触发重试：每次忙应答后等待 `retry_delay` 并计一次尝试，
/// 满 `max_attempts` 次后返回 `Exhausted`。协议错误、传输错误与无法识别的应答
/// 立即返回，不重试。
pub async fn read_with_retry<E>(
    exchange: &mut E,
    request: &ReadRequest,
    policy: &RetryPolicy,
    format: ValueFormat,
) -> ReadOutcome
where
    E: Exchange + ?Sized,
{
    let address = request.address();
    let unit_id = request.unit_id();
    let mut attempts = 0u32;

    while attempts < policy.max_attempts {
        debug!(address, unit_id, "sending read holding registers request");

        let transaction_id = exchange.next_transaction_id();
        let frame = encode_read_request(transaction_id, request);
        let reply = match exchange.send_and_receive(&frame).await {
            Ok(reply) => reply,
            Err(e) => {
                record_transport_error();
                warn!(address, unit_id, error = %e, "transport error while reading registers");
                return ReadOutcome::TransportError(e.to_string());
            }
        };

        let outcome = normalize(
            decode_reply(&reply, transaction_id, request, format),
            policy.busy_code,
        );

        match &outcome {
            ReadOutcome::ServerBusy => {
                info!(
                    address,
                    unit_id,
                    delay_ms = policy.retry_delay.as_millis() as u64,
                    "server is busy, retrying after delay"
                );
                tokio::time::sleep(policy.retry_delay).await;
                attempts += 1;
                record_busy_retry();
                info!(
                    address,
                    attempt = attempts,
                    max_attempts = policy.max_attempts,
                    "retry attempt"
                );
                continue;
            }
            ReadOutcome::Values(values) => {
                info!(address, unit_id, values = ?values, "values read");
            }
            ReadOutcome::ProtocolError(code) => {
                warn!(address, unit_id, code, "server returned error code");
            }
            ReadOutcome::Unrecognized(reason) => {
                warn!(address, unit_id, reason = %reason, "unknown response format");
            }
            ReadOutcome::TransportError(_) | ReadOutcome::Exhausted { .. } => {}
        }

        return outcome;
    }

    warn!(
        address,
        unit_id,
        attempts,
        "unable to read registers, server stayed busy"
    );
    ReadOutcome::Exhausted { attempts }
}
