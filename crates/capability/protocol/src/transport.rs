//! TCP 会话实现
//!
//! 每个会话只持有一条连接、绑定一个单元 ID，请求/应答严格串行，不做流水线。
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! let endpoint = Endpoint::new("10.0.0.5", 502);
//! let mut session = Session::connect(&endpoint, 52, &TransportOptions::default()).await?;
//! let reply = session.send_and_receive(&frame).await?;
//! session.close().await;
//! ```

use crate::codec::{MAX_MBAP_LENGTH, MBAP_HEADER_LEN};
use crate::error::{ConnectionFailure, TransportError};
use async_trait::async_trait;
use domain::{Endpoint, UnitId};
use std::collections::VecDeque;
use std::io;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{Instant, timeout, timeout_at};
use tracing::{debug, error, info};

/// 传输参数
#[derive(Debug, Clone)]
pub struct TransportOptions {
    /// 连接超时（只尝试一次）
    pub connect_timeout: Duration,
    /// 单次应答读取超时
    pub read_timeout: Duration,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_millis(5000),
            read_timeout: Duration::from_millis(3000),
        }
    }
}

/// 单次请求/应答交换抽象（重试与扫描只依赖该接口）
#[async_trait]
pub trait Exchange: Send {
    /// 会话绑定的单元 ID
    fn unit_id(&self) -> UnitId;

    /// 分配下一个事务 ID
    fn next_transaction_id(&mut self) -> u16;

    /// 发送完整请求帧（前两个字节为事务 ID）并等待该请求的应答
    async fn send_and_receive(&mut self, frame: &[u8]) -> Result<Vec<u8>, TransportError>;
}

/// 超时请求的事务 ID 最多记住的个数
const ABANDONED_CAPACITY: usize = 16;

/// Modbus TCP 会话
///
/// 读取的字节先进入会话缓冲区，再按 MBAP 长度切帧；读取超时不会丢弃
/// 已收到的半帧。超时请求的事务 ID 会被记下，其迟到的应答在后续交换中
/// 被识别并丢弃，不会错配给后面的请求。
pub struct Session {
    endpoint: Endpoint,
    unit_id: UnitId,
    stream: TcpStream,
    transaction_id: u16,
    read_timeout: Duration,
    buffer: Vec<u8>,
    abandoned: VecDeque<u16>,
}

impl Session {
    /// 建立连接，只尝试一次；失败时不会遗留半开的 socket。
    pub async fn connect(
        endpoint: &Endpoint,
        unit_id: UnitId,
        options: &TransportOptions,
    ) -> Result<Self, ConnectionFailure> {
        info!(
            endpoint = %endpoint,
            unit_id,
            "attempting to connect to modbus server"
        );

        let connect = TcpStream::connect((endpoint.host.as_str(), endpoint.port));
        let stream = match timeout(options.connect_timeout, connect).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) if e.kind() == io::ErrorKind::ConnectionRefused => {
                error!(endpoint = %endpoint, unit_id, "connection refused");
                return Err(ConnectionFailure::Refused {
                    endpoint: endpoint.to_string(),
                    source: e,
                });
            }
            Ok(Err(e)) => {
                error!(endpoint = %endpoint, unit_id, error = %e, "connection failed");
                return Err(ConnectionFailure::Other {
                    endpoint: endpoint.to_string(),
                    source: e,
                });
            }
            Err(_) => {
                error!(endpoint = %endpoint, unit_id, "connection timed out");
                return Err(ConnectionFailure::TimedOut {
                    endpoint: endpoint.to_string(),
                    timeout_ms: options.connect_timeout.as_millis() as u64,
                });
            }
        };

        if let Err(e) = stream.set_nodelay(true) {
            debug!("TCP_NODELAY: {}", e);
        }

        info!(endpoint = %endpoint, unit_id, "connected to modbus server");

        Ok(Self {
            endpoint: endpoint.clone(),
            unit_id,
            stream,
            transaction_id: 0,
            read_timeout: options.read_timeout,
            buffer: Vec::with_capacity(MBAP_HEADER_LEN + MAX_MBAP_LENGTH),
            abandoned: VecDeque::with_capacity(ABANDONED_CAPACITY),
        })
    }

    /// 关闭连接
    pub async fn close(mut self) {
        if let Err(e) = self.stream.shutdown().await {
            debug!(endpoint = %self.endpoint, error = %e, "shutdown failed");
        }
        info!(endpoint = %self.endpoint, "connection closed");
    }

    /// 读取下一帧完整应答，截止时间内未凑齐则超时。
    async fn read_frame(&mut self, deadline: Instant) -> Result<Vec<u8>, TransportError> {
        let mut chunk = [0u8; 512];
        loop {
            if let Some(frame) = self.take_frame()? {
                return Ok(frame);
            }

            match timeout_at(deadline, self.stream.read(&mut chunk)).await {
                Ok(Ok(0)) => return Err(TransportError::Closed),
                Ok(Ok(n)) => self.buffer.extend_from_slice(&chunk[..n]),
                Ok(Err(e)) => return Err(TransportError::Io(e)),
                Err(_) => {
                    return Err(TransportError::TimedOut(
                        self.read_timeout.as_millis() as u64
                    ));
                }
            }
        }
    }

    /// 从缓冲区切出一帧；数据不足时返回 `None`。
    fn take_frame(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        if self.buffer.len() < MBAP_HEADER_LEN {
            return Ok(None);
        }

        let length = usize::from(u16::from_be_bytes([self.buffer[4], self.buffer[5]]));
        if length == 0 || length > MAX_MBAP_LENGTH {
            // 帧边界已丢失，缓冲区内容不可再用
            self.buffer.clear();
            return Err(TransportError::FrameLength(length));
        }

        let total = MBAP_HEADER_LEN - 1 + length;
        if self.buffer.len() < total {
            return Ok(None);
        }
        Ok(Some(self.buffer.drain(..total).collect()))
    }

    fn abandon(&mut self, transaction_id: u16) {
        if self.abandoned.len() == ABANDONED_CAPACITY {
            self.abandoned.pop_front();
        }
        self.abandoned.push_back(transaction_id);
    }

    /// 应答属于之前超时的请求时返回 true，并把该事务 ID 移出记录。
    fn is_stale(&mut self, expected: u16, reply_transaction: u16) -> bool {
        if reply_transaction == expected {
            return false;
        }
        match self.abandoned.iter().position(|&id| id == reply_transaction) {
            Some(index) => {
                self.abandoned.remove(index);
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl Exchange for Session {
    fn unit_id(&self) -> UnitId {
        self.unit_id
    }

    fn next_transaction_id(&mut self) -> u16 {
        self.transaction_id = self.transaction_id.wrapping_add(1);
        self.transaction_id
    }

    async fn send_and_receive(&mut self, frame: &[u8]) -> Result<Vec<u8>, TransportError> {
        let expected = match frame {
            [high, low, ..] => u16::from_be_bytes([*high, *low]),
            _ => return Err(TransportError::FrameLength(frame.len())),
        };

        self.stream.write_all(frame).await?;
        self.stream.flush().await?;
        debug!(bytes = frame.len(), transaction_id = expected, "modbus tx");

        // 整个交换（含丢弃迟到应答）共用一个读取截止时间
        let deadline = Instant::now() + self.read_timeout;
        loop {
            let reply = match self.read_frame(deadline).await {
                Ok(reply) => reply,
                Err(e) => {
                    if matches!(e, TransportError::TimedOut(_)) {
                        self.abandon(expected);
                    }
                    return Err(e);
                }
            };

            let reply_transaction = u16::from_be_bytes([reply[0], reply[1]]);
            if self.is_stale(expected, reply_transaction) {
                debug!(
                    transaction_id = reply_transaction,
                    expected, "discarding late reply to timed out request"
                );
                continue;
            }

            debug!(bytes = reply.len(), transaction_id = reply_transaction, "modbus rx");
            return Ok(reply);
        }
    }
}
