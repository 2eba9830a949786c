//! 扫描记录内存实现
//!
//! 仅用于本地测试。

use crate::error::StorageError;
use crate::traits::RecordSink;
use domain::ScanRecord;
use std::sync::RwLock;

/// 内存输出端
pub struct InMemoryRecordSink {
    records: RwLock<Vec<ScanRecord>>,
}

impl InMemoryRecordSink {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }

    /// 当前累计的记录（按写入顺序）
    pub fn records(&self) -> Vec<ScanRecord> {
        self.records.read().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryRecordSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl RecordSink for InMemoryRecordSink {
    async fn append(&self, record: &ScanRecord) -> Result<(), StorageError> {
        let mut records = self
            .records
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        records.push(record.clone());
        Ok(())
    }
}
