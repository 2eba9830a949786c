//! 保持寄存器扫描入口：加载配置 → 建立会话 → 顺序扫描 → 写出结果。

use regscan_config::{OutputFormat, ScanConfig};
use regscan_protocol::{Session, TransportOptions};
use regscan_scan::{ScanSummary, scan};
use regscan_storage::{JsonLinesSink, RecordSink, StorageError, TextFileSink};
use regscan_telemetry::{init_tracing, metrics, new_scan_id};
use std::time::Duration;
use tracing::{Instrument, error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载本地 .env（如存在），便于直接 cargo run 启动
    dotenvy::dotenv().ok();
    // 从环境变量加载扫描配置
    let config = ScanConfig::from_env()?;
    // 初始化结构化日志
    init_tracing();

    let scan_id = new_scan_id();
    let span = tracing::info_span!(
        "scan",
        scan_id = %scan_id,
        endpoint = %config.endpoint(),
        unit_id = config.unit_id
    );
    run(&config).instrument(span).await?;

    let snapshot = metrics().snapshot();
    info!(
        addresses_scanned = snapshot.addresses_scanned,
        records_written = snapshot.records_written,
        busy_retries = snapshot.busy_retries,
        busy_exhausted = snapshot.busy_exhausted,
        protocol_errors = snapshot.protocol_errors,
        transport_errors = snapshot.transport_errors,
        unrecognized = snapshot.unrecognized,
        sink_failures = snapshot.sink_failures,
        "scan metrics"
    );
    Ok(())
}

async fn run(config: &ScanConfig) -> Result<ScanSummary, Box<dyn std::error::Error>> {
    let endpoint = config.endpoint();
    let options = TransportOptions {
        connect_timeout: Duration::from_millis(config.connect_timeout_ms),
        read_timeout: Duration::from_millis(config.read_timeout_ms),
    };

    // 连接失败对整个扫描是致命的：不打开输出文件，不进入扫描
    let mut session = match Session::connect(&endpoint, config.unit_id, &options).await {
        Ok(session) => session,
        Err(e) => {
            error!(error = %e, "connection failed, exiting");
            return Err(e.into());
        }
    };

    let sink = match open_sink(config).await {
        Ok(sink) => sink,
        Err(e) => {
            session.close().await;
            return Err(e.into());
        }
    };
    info!(path = %config.output_path.display(), "saving scan results");

    let summary = scan(
        &mut session,
        config.addresses(),
        &config.scan_policy(),
        config.value_format(),
        sink.as_ref(),
    )
    .await;
    session.close().await;

    info!(
        path = %config.output_path.display(),
        recorded = summary.recorded,
        skipped = summary.skipped(),
        "scan results saved"
    );
    Ok(summary)
}

async fn open_sink(config: &ScanConfig) -> Result<Box<dyn RecordSink>, StorageError> {
    let sink: Box<dyn RecordSink> = match config.output_format {
        OutputFormat::Text => Box::new(TextFileSink::create(&config.output_path).await?),
        OutputFormat::JsonLines => Box::new(JsonLinesSink::create(&config.output_path).await?),
    };
    Ok(sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn config(port: u16, output_path: PathBuf) -> ScanConfig {
        ScanConfig {
            host: "127.0.0.1".to_string(),
            port,
            unit_id: 52,
            address_start: 5,
            address_end: 8,
            quantity: 2,
            max_attempts: 3,
            retry_delay_ms: 0,
            scan_delay_ms: 0,
            busy_code: 72,
            signed_values: true,
            connect_timeout_ms: 2000,
            read_timeout_ms: 2000,
            output_path,
            output_format: OutputFormat::Text,
        }
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("regscan-app-{}-{}", std::process::id(), name))
    }

    #[tokio::test]
    async fn scan_against_mock_server_writes_records() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("addr").port();

        // 地址 6 返回错误码，其余地址返回 [address, address + 1]
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let mut request = [0u8; 12];
            while socket.read_exact(&mut request).await.is_ok() {
                let address = u16::from_be_bytes([request[8], request[9]]);
                let pdu = if address == 6 {
                    vec![0x83, 0x02]
                } else {
                    let mut pdu = vec![0x03, 4];
                    pdu.extend_from_slice(&address.to_be_bytes());
                    pdu.extend_from_slice(&(address + 1).to_be_bytes());
                    pdu
                };
                let mut reply = vec![request[0], request[1], 0, 0];
                reply.extend_from_slice(&((pdu.len() + 1) as u16).to_be_bytes());
                reply.push(request[6]);
                reply.extend_from_slice(&pdu);
                if socket.write_all(&reply).await.is_err() {
                    break;
                }
            }
        });

        let path = temp_path("mock.txt");
        let summary = run(&config(port, path.clone())).await.expect("run");
        assert_eq!(summary.scanned, 3);
        assert_eq!(summary.recorded, 2);
        assert_eq!(summary.protocol_errors, 1);

        let content = std::fs::read_to_string(&path).expect("read");
        assert_eq!(
            content,
            "Values at address 5 (Slave ID 52): [5, 6]\nValues at address 7 (Slave ID 52): [7, 8]\n"
        );
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn refused_connection_never_scans() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("addr").port();
        drop(listener);

        let path = temp_path("refused.txt");
        let _ = std::fs::remove_file(&path);

        let result = run(&config(port, path.clone())).await;
        assert!(result.is_err());
        assert!(!path.exists());
    }
}
