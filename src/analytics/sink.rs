use super::ClickRecord;

/// 点击归因 Sink
///
/// 批量接收缓冲的归因记录并持久化。失败返回 Err，
/// 由 ClickRecorder 负责把记录放回缓冲区重试。
#[async_trait::async_trait]
pub trait ClickSink: Send + Sync {
    async fn flush_records(&self, records: Vec<ClickRecord>) -> anyhow::Result<()>;
}

pub struct StdoutSink;

#[async_trait::async_trait]
impl ClickSink for StdoutSink {
    async fn flush_records(&self, records: Vec<ClickRecord>) -> anyhow::Result<()> {
        println!("Flushing click records: {} entries", records.len());
        for record in &records {
            println!("  - {:?}", record);
        }
        Ok(())
    }
}
