//! # Regscan Storage 模块
//!
//! 扫描结果输出端抽象：扫描驱动只把成功读取的 `ScanRecord` 按扫描顺序
//! 追加到 [`RecordSink`]，具体落地格式由实现决定。
//!
//! ## 模块说明
//!
//! - [`traits`]：输出端接口定义
//! - [`error`]：存储错误类型定义
//! - [`file`]：文件输出实现
//!   - `TextFileSink`：每条记录一行文本，便于离线查看
//!   - `JsonLinesSink`：每条记录一行 JSON，便于后续脚本处理
//! - [`in_memory`]：内存实现（用于测试）
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! use regscan_storage::{RecordSink, TextFileSink};
//!
//! let sink = TextFileSink::create("output_slave_52.txt").await?;
//! sink.append(&record).await?;
//! ```
//!
//! ## 设计约束
//!
//! - **只追加**：记录按写入顺序落地，不支持修改与删除
//! - **逐条刷新**：文件实现每条记录后 flush，扫描中断时已写入的记录保留

pub mod error;
pub mod file;
pub mod in_memory;
pub mod traits;

pub use error::StorageError;
pub use file::{JsonLinesSink, TextFileSink};
pub use in_memory::InMemoryRecordSink;
pub use traits::RecordSink;
