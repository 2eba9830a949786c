//! # 扫描能力模块
//!
//! ```text
//! scan ──► read_with_retry ──► encode → Exchange → decode → normalize
//!   │                                   (忙应答：等待后重试，最多 max_attempts 次)
//!   ▼
//! RecordSink
//! ```
//!
//! 单会话、严格串行：同一时刻只有一个在途请求，地址按给定顺序逐个处理。
//! 单个地址失败不会中止扫描。

mod driver;
mod retry;

pub use driver::{ScanSummary, scan};
pub use retry::read_with_retry;
