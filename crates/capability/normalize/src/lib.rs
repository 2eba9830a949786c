//! 应答形态 → 统一读取结果。

use domain::ReadOutcome;
use regscan_protocol::DecodedShape;

/// 把任意应答形态转换为 [`ReadOutcome`]。
///
/// 规则按优先级依次匹配，每次调用恰好产生一个结果，无副作用：
/// 1. 状态码等于 `busy_code` → `ServerBusy`
/// 2. 其他状态码 → `ProtocolError(code)`
/// 3. 聚合寄存器 → 各寄存器值
/// 4. 单寄存器 → 单值
/// 5. 原始整数序列 → 原样返回
/// 6. 原始寄存器序列 → 各寄存器值
/// 7. 其他 → `Unrecognized`
pub fn normalize(shape: DecodedShape, busy_code: u8) -> ReadOutcome {
    match shape {
        DecodedShape::Code(code) if code == busy_code => ReadOutcome::ServerBusy,
        DecodedShape::Code(code) => ReadOutcome::ProtocolError(code),
        DecodedShape::Registers(registers) => {
            ReadOutcome::Values(registers.iter().map(|register| register.value).collect())
        }
        DecodedShape::Register(register) => ReadOutcome::Values(vec![register.value]),
        DecodedShape::Integers(values) => ReadOutcome::Values(values),
        DecodedShape::RegisterList(registers) => {
            ReadOutcome::Values(registers.iter().map(|register| register.value).collect())
        }
        DecodedShape::Unrecognized(reason) => ReadOutcome::Unrecognized(reason),
    }
}
