//! 脚本化的内存交换端，按预设应答逐个回复。

use async_trait::async_trait;
use regscan_protocol::{Exchange, TransportError};
use std::collections::VecDeque;

/// 预设应答
#[derive(Debug, Clone)]
pub enum Reply {
    /// 聚合寄存器应答
    Values(Vec<u16>),
    /// 异常应答（状态码）
    Code(u8),
    /// 原始 PDU（功能码起）
    RawPdu(Vec<u8>),
    /// 传输故障
    Fail,
}

pub struct ScriptedExchange {
    unit_id: u8,
    transaction_id: u16,
    script: VecDeque<Reply>,
    fallback: Reply,
    /// 收到的请求：(起始地址, 数量)
    pub requests: Vec<(u16, u16)>,
}

impl ScriptedExchange {
    pub fn new(unit_id: u8, script: Vec<Reply>, fallback: Reply) -> Self {
        Self {
            unit_id,
            transaction_id: 0,
            script: script.into(),
            fallback,
            requests: Vec::new(),
        }
    }

    pub fn always(unit_id: u8, reply: Reply) -> Self {
        Self::new(unit_id, Vec::new(), reply)
    }
}

fn reply_frame(request: &[u8], pdu: &[u8]) -> Vec<u8> {
    let mut frame = vec![request[0], request[1], 0, 0];
    frame.extend_from_slice(&((pdu.len() + 1) as u16).to_be_bytes());
    frame.push(request[6]);
    frame.extend_from_slice(pdu);
    frame
}

#[async_trait]
impl Exchange for ScriptedExchange {
    fn unit_id(&self) -> u8 {
        self.unit_id
    }

    fn next_transaction_id(&mut self) -> u16 {
        self.transaction_id = self.transaction_id.wrapping_add(1);
        self.transaction_id
    }

    async fn send_and_receive(&mut self, frame: &[u8]) -> Result<Vec<u8>, TransportError> {
        let address = u16::from_be_bytes([frame[8], frame[9]]);
        let quantity = u16::from_be_bytes([frame[10], frame[11]]);
        self.requests.push((address, quantity));

        let reply = self.script.pop_front().unwrap_or_else(|| self.fallback.clone());
        let pdu = match reply {
            Reply::Values(values) => {
                let mut pdu = vec![0x03, (values.len() * 2) as u8];
                for value in values {
                    pdu.extend_from_slice(&value.to_be_bytes());
                }
                pdu
            }
            Reply::Code(code) => vec![0x83, code],
            Reply::RawPdu(pdu) => pdu,
            Reply::Fail => return Err(TransportError::Closed),
        };
        Ok(reply_frame(frame, &pdu))
    }
}
