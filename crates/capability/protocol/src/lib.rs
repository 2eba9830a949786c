//! # 协议通信能力模块
//!
//! 面向单个 Modbus TCP 服务端的读保持寄存器（功能码 0x03）通信：
//! - **Session**：持有唯一的 TCP 连接，一次只允许一个在途请求
//! - **Codec**：构造 MBAP 请求帧，并把应答帧归类为若干应答形态
//!
//! ## 架构设计
//!
//! ```text
//! ReadRequest
//!       │
//!       ▼
//! encode_read_request ──► Session::send_and_receive ──► decode_reply
//!                                                          │
//!                                                          ▼
//!                                                    DecodedShape
//! ```
//!
//! 真实设备与测试服务端的应答格式并不一致，`decode_reply` 先分类、
//! 再交由 normalize 模块解释，不假设唯一的规范形态。
//!
//! ## 帧格式
//!
//! ```text
//! 请求: [事务ID u16][协议ID 0x0000][长度 0x0006][单元ID] [0x03][起始地址 u16][数量 u16]
//! 应答: [事务ID u16][协议ID 0x0000][长度 u16][单元ID] [功能码][...]
//! ```

mod codec;
mod error;
mod transport;

pub use codec::{
    DecodedShape, EXCEPTION_FLAG, FUNCTION_READ_HOLDING_REGISTERS, MAX_MBAP_LENGTH,
    MBAP_HEADER_LEN, decode_reply, encode_read_request,
};
pub use error::{ConnectionFailure, TransportError};
pub use transport::{Exchange, Session, TransportOptions};
