//! 读保持寄存器请求编码与应答分类

use domain::{ReadRequest, Register, ValueFormat};
use tracing::debug;

/// MBAP 头长度（事务 ID + 协议 ID + 长度 + 单元 ID）
pub const MBAP_HEADER_LEN: usize = 7;
/// MBAP 长度字段上限：1（单元 ID）+ 253（PDU）
pub const MAX_MBAP_LENGTH: usize = 254;
/// 读保持寄存器功能码
pub const FUNCTION_READ_HOLDING_REGISTERS: u8 = 0x03;
/// 异常应答标志位
pub const EXCEPTION_FLAG: u8 = 0x80;

const PROTOCOL_ID: u16 = 0x0000;

/// 应答形态分类，每个应答恰好归入一种。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedShape {
    /// 裸状态/错误码（异常应答）
    Code(u8),
    /// 聚合寄存器：字节数与数据一致的多个寄存器
    Registers(Vec<Register>),
    /// 单寄存器
    Register(Register),
    /// 原始整数序列（缺少字节数前缀）
    Integers(Vec<i32>),
    /// 原始寄存器序列（字节数与实际数据不符，按实际收到的数据解析）
    RegisterList(Vec<Register>),
    /// 无法识别
    Unrecognized(String),
}

/// 构造读保持寄存器请求帧（12 字节）。
pub fn encode_read_request(transaction_id: u16, request: &ReadRequest) -> Vec<u8> {
    let mut frame = Vec::with_capacity(MBAP_HEADER_LEN + 5);
    frame.extend_from_slice(&transaction_id.to_be_bytes());
    frame.extend_from_slice(&PROTOCOL_ID.to_be_bytes());
    // 长度 = 单元 ID + PDU(5)
    frame.extend_from_slice(&6u16.to_be_bytes());
    frame.push(request.unit_id());
    frame.push(FUNCTION_READ_HOLDING_REGISTERS);
    frame.extend_from_slice(&request.address().to_be_bytes());
    frame.extend_from_slice(&request.quantity().to_be_bytes());
    frame
}

/// 把完整应答帧归类为 [`DecodedShape`]。
///
/// 总是返回一个分类结果，不会 panic。只有 MBAP 长度与帧长不符时帧头才导致
/// `Unrecognized`；迟到应答由会话层在交换时丢弃。
pub fn decode_reply(
    reply: &[u8],
    transaction_id: u16,
    request: &ReadRequest,
    format: ValueFormat,
) -> DecodedShape {
    if reply.len() <= MBAP_HEADER_LEN {
        return DecodedShape::Unrecognized(format!("frame too short ({} bytes)", reply.len()));
    }

    let reply_transaction = u16::from_be_bytes([reply[0], reply[1]]);
    let protocol_id = u16::from_be_bytes([reply[2], reply[3]]);
    let length = usize::from(u16::from_be_bytes([reply[4], reply[5]]));
    let unit_id = reply[6];

    if length != reply.len() - (MBAP_HEADER_LEN - 1) {
        return DecodedShape::Unrecognized(format!(
            "mbap length {} does not match frame of {} bytes",
            length,
            reply.len()
        ));
    }

    // 非规范服务端常见：协议 ID、事务 ID、单元 ID 不符时仍按 PDU 分类
    if protocol_id != PROTOCOL_ID {
        debug!(protocol_id, "reply carries non-zero protocol id");
    }
    if reply_transaction != transaction_id {
        debug!(
            expected = transaction_id,
            actual = reply_transaction,
            "reply transaction id differs from request"
        );
    }
    if unit_id != request.unit_id() {
        debug!(
            expected = request.unit_id(),
            actual = unit_id,
            "reply unit id differs from request"
        );
    }

    classify_pdu(&reply[MBAP_HEADER_LEN..], request.address(), format)
}

fn classify_pdu(pdu: &[u8], start: u16, format: ValueFormat) -> DecodedShape {
    let Some((&function, body)) = pdu.split_first() else {
        return DecodedShape::Unrecognized("empty pdu".to_string());
    };

    if function == FUNCTION_READ_HOLDING_REGISTERS | EXCEPTION_FLAG {
        return match body {
            [code] => DecodedShape::Code(*code),
            _ => DecodedShape::Unrecognized(format!(
                "exception reply with {} payload bytes",
                body.len()
            )),
        };
    }

    if function != FUNCTION_READ_HOLDING_REGISTERS {
        return DecodedShape::Unrecognized(format!("unexpected function code 0x{function:02X}"));
    }

    if body.is_empty() {
        return DecodedShape::Unrecognized("empty register payload".to_string());
    }

    // 偶数字节：没有字节数前缀，整段按寄存器字解析
    if body.len() % 2 == 0 {
        return DecodedShape::Integers(words(body).map(|raw| format.interpret(raw)).collect());
    }

    let (&byte_count, data) = match body.split_first() {
        Some(split) => split,
        None => return DecodedShape::Unrecognized("empty register payload".to_string()),
    };
    if data.is_empty() {
        return DecodedShape::Unrecognized("byte count without register data".to_string());
    }

    let registers: Vec<Register> = words(data)
        .enumerate()
        .map(|(index, raw)| Register {
            address: start.wrapping_add(index as u16),
            value: format.interpret(raw),
        })
        .collect();

    if usize::from(byte_count) != data.len() {
        return DecodedShape::RegisterList(registers);
    }

    match registers.as_slice() {
        [single] => DecodedShape::Register(*single),
        _ => DecodedShape::Registers(registers),
    }
}

fn words(data: &[u8]) -> impl Iterator<Item = u16> + '_ {
    data.chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(address: u16, quantity: u16) -> ReadRequest {
        ReadRequest::new(52, address, quantity).unwrap()
    }

    fn frame(transaction_id: u16, unit_id: u8, pdu: &[u8]) -> Vec<u8> {
        let mut frame = Vec::new();
        frame.extend_from_slice(&transaction_id.to_be_bytes());
        frame.extend_from_slice(&[0, 0]);
        frame.extend_from_slice(&((pdu.len() + 1) as u16).to_be_bytes());
        frame.push(unit_id);
        frame.extend_from_slice(pdu);
        frame
    }

    #[test]
    fn test_encode_read_request() {
        let bytes = encode_read_request(0x0102, &request(7, 3));
        assert_eq!(
            bytes,
            vec![0x01, 0x02, 0x00, 0x00, 0x00, 0x06, 52, 0x03, 0x00, 0x07, 0x00, 0x03]
        );
    }

    #[test]
    fn test_decode_aggregate_registers() {
        let reply = frame(1, 52, &[0x03, 6, 0, 10, 0, 20, 0, 30]);
        let shape = decode_reply(&reply, 1, &request(7, 3), ValueFormat::Signed);
        assert_eq!(
            shape,
            DecodedShape::Registers(vec![
                Register { address: 7, value: 10 },
                Register { address: 8, value: 20 },
                Register { address: 9, value: 30 },
            ])
        );
    }

    #[test]
    fn test_decode_single_register() {
        let reply = frame(9, 52, &[0x03, 2, 0xFF, 0xFE]);
        let shape = decode_reply(&reply, 9, &request(40, 1), ValueFormat::Signed);
        assert_eq!(
            shape,
            DecodedShape::Register(Register {
                address: 40,
                value: -2
            })
        );

        let shape = decode_reply(&reply, 9, &request(40, 1), ValueFormat::Unsigned);
        assert_eq!(
            shape,
            DecodedShape::Register(Register {
                address: 40,
                value: 65534
            })
        );
    }

    #[test]
    fn test_decode_exception_code() {
        let reply = frame(3, 52, &[0x83, 72]);
        let shape = decode_reply(&reply, 3, &request(0, 1), ValueFormat::Signed);
        assert_eq!(shape, DecodedShape::Code(72));

        let reply = frame(3, 52, &[0x83, 2]);
        let shape = decode_reply(&reply, 3, &request(0, 1), ValueFormat::Signed);
        assert_eq!(shape, DecodedShape::Code(2));
    }

    #[test]
    fn test_decode_missing_byte_count_as_integers() {
        let reply = frame(4, 52, &[0x03, 0, 1, 0, 2]);
        let shape = decode_reply(&reply, 4, &request(0, 2), ValueFormat::Signed);
        assert_eq!(shape, DecodedShape::Integers(vec![1, 2]));
    }

    #[test]
    fn test_decode_byte_count_mismatch_as_register_list() {
        // 声明 6 字节，实际只有 4 字节
        let reply = frame(5, 52, &[0x03, 6, 0, 1, 0, 2]);
        let shape = decode_reply(&reply, 5, &request(100, 3), ValueFormat::Signed);
        assert_eq!(
            shape,
            DecodedShape::RegisterList(vec![
                Register { address: 100, value: 1 },
                Register { address: 101, value: 2 },
            ])
        );
    }

    #[test]
    fn test_decode_unrecognized_frames() {
        let req = request(0, 1);

        assert!(matches!(
            decode_reply(&[0, 1, 0], 1, &req, ValueFormat::Signed),
            DecodedShape::Unrecognized(_)
        ));

        // 其他功能码
        let reply = frame(1, 52, &[0x04, 2, 0, 1]);
        assert!(matches!(
            decode_reply(&reply, 1, &req, ValueFormat::Signed),
            DecodedShape::Unrecognized(_)
        ));

        // 仅有字节数
        let reply = frame(1, 52, &[0x03, 0]);
        assert!(matches!(
            decode_reply(&reply, 1, &req, ValueFormat::Signed),
            DecodedShape::Unrecognized(_)
        ));

        // 异常应答多带字节
        let reply = frame(1, 52, &[0x83, 6, 0]);
        assert!(matches!(
            decode_reply(&reply, 1, &req, ValueFormat::Signed),
            DecodedShape::Unrecognized(_)
        ));
    }

    #[test]
    fn test_decode_tolerates_header_id_mismatch() {
        let req = request(3, 1);
        let expected = DecodedShape::Register(Register { address: 3, value: 1 });

        // 服务端总回显事务 ID 0
        let reply = frame(0, 52, &[0x03, 2, 0, 1]);
        assert_eq!(decode_reply(&reply, 7, &req, ValueFormat::Signed), expected);

        // 协议 ID 非 0
        let mut reply = frame(7, 52, &[0x03, 2, 0, 1]);
        reply[3] = 1;
        assert_eq!(decode_reply(&reply, 7, &req, ValueFormat::Signed), expected);

        // 单元 ID 不同
        let reply = frame(7, 1, &[0x03, 2, 0, 1]);
        assert_eq!(decode_reply(&reply, 7, &req, ValueFormat::Signed), expected);
    }

    #[test]
    fn test_decode_mbap_length_mismatch() {
        let mut reply = frame(1, 52, &[0x03, 2, 0, 1]);
        reply.push(0);
        assert!(matches!(
            decode_reply(&reply, 1, &request(0, 1), ValueFormat::Signed),
            DecodedShape::Unrecognized(_)
        ));
    }
}
