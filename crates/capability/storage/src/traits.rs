//! 输出端接口定义

use crate::error::StorageError;
use domain::ScanRecord;

/// 扫描记录输出端（只追加）。
#[async_trait::async_trait]
pub trait RecordSink: Send + Sync {
    /// 追加一条记录
    async fn append(&self, record: &ScanRecord) -> Result<(), StorageError>;
}
