//! 文件输出实现

use crate::error::StorageError;
use crate::traits::RecordSink;
use domain::ScanRecord;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::Mutex;

/// 逐行写入的文件，创建时截断已有内容。
struct LineFile {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl LineFile {
    async fn create(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)
            .await
            .map_err(|e| StorageError::new(format!("create {}: {}", path.display(), e)))?;
        Ok(Self {
            path,
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    async fn write_line(&self, line: &str) -> Result<(), StorageError> {
        let mut writer = self.writer.lock().await;
        writer.write_all(line.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
        Ok(())
    }
}

/// 文本输出：`Values at address {address} (Slave ID {unit}): [v1, v2, ...]`
pub struct TextFileSink {
    file: LineFile,
}

impl TextFileSink {
    pub async fn create(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        Ok(Self {
            file: LineFile::create(path).await?,
        })
    }

    pub fn path(&self) -> &Path {
        &self.file.path
    }
}

#[async_trait::async_trait]
impl RecordSink for TextFileSink {
    async fn append(&self, record: &ScanRecord) -> Result<(), StorageError> {
        self.file.write_line(&record.to_string()).await
    }
}

/// JSON Lines 输出：每行一个 `{"unit_id":..,"address":..,"values":[..]}`
pub struct JsonLinesSink {
    file: LineFile,
}

impl JsonLinesSink {
    pub async fn create(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        Ok(Self {
            file: LineFile::create(path).await?,
        })
    }

    pub fn path(&self) -> &Path {
        &self.file.path
    }
}

#[async_trait::async_trait]
impl RecordSink for JsonLinesSink {
    async fn append(&self, record: &ScanRecord) -> Result<(), StorageError> {
        let line = serde_json::to_string(record)?;
        self.file.write_line(&line).await
    }
}
