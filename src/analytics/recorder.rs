//! 点击归因记录器
//!
//! 负责缓冲和刷盘归因记录，支持：
//! - 高并发写入（DashMap 缓冲，记录路径无锁、不落盘）
//! - 定时刷盘到存储后端
//! - 阈值触发刷盘
//! - 刷盘失败时恢复缓冲（at-least-once）
//!
//! 记录失败只影响报表，绝不影响访客跳转：record() 是同步内存写，
//! 持久化全部发生在后台任务里。

use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU64, Ordering},
};

use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::time::{Duration, sleep};
use tracing::{debug, trace, warn};

use crate::analytics::{ClickRecord, ClickSink};

/// 归因缓冲区，封装所有可变状态
struct RecordBuffer {
    /// 缓冲的记录，key 为单调递增序号
    data: DashMap<u64, ClickRecord>,
    /// 下一个序号
    next_seq: AtomicU64,
    /// 刷盘锁，防止并发刷盘
    flush_lock: Mutex<()>,
    /// 是否有 flush 任务待处理（防止重复 spawn）
    flush_pending: AtomicBool,
}

impl RecordBuffer {
    fn new() -> Self {
        Self {
            data: DashMap::new(),
            next_seq: AtomicU64::new(0),
            flush_lock: Mutex::new(()),
            flush_pending: AtomicBool::new(false),
        }
    }

    fn push(&self, record: ClickRecord) -> usize {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.data.insert(seq, record);
        self.data.len()
    }

    /// 收集所有记录并清空缓冲区（逐个 remove 避免竞态）
    fn drain(&self) -> Vec<ClickRecord> {
        let keys: Vec<u64> = self.data.iter().map(|r| *r.key()).collect();
        let mut records = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some((_, record)) = self.data.remove(&key) {
                records.push(record);
            }
        }
        records
    }

    /// 恢复数据到缓冲区（用于刷盘失败时的恢复）
    fn restore(&self, records: Vec<ClickRecord>) {
        for record in records {
            self.push(record);
        }
    }

    fn len(&self) -> usize {
        self.data.len()
    }
}

/// 点击归因记录器
///
/// 状态完全封装在结构体内部，便于测试和多实例使用。
#[derive(Clone)]
pub struct ClickRecorder {
    buffer: Arc<RecordBuffer>,
    sink: Arc<dyn ClickSink>,
    /// 定时刷盘间隔
    flush_interval: Duration,
    /// 触发刷盘的缓冲记录数阈值
    max_records_before_flush: usize,
}

impl ClickRecorder {
    pub fn new(
        sink: Arc<dyn ClickSink>,
        flush_interval: Duration,
        max_records_before_flush: usize,
    ) -> Self {
        Self {
            buffer: Arc::new(RecordBuffer::new()),
            sink,
            flush_interval,
            max_records_before_flush,
        }
    }

    /// 记录一次分发决策（线程安全，不阻塞）
    pub fn record(&self, record: ClickRecord) {
        let current_size = self.buffer.push(record);
        trace!("ClickRecorder: buffer size {}", current_size);

        // 检查是否达到阈值，尝试触发刷盘
        if current_size >= self.max_records_before_flush {
            // compare_exchange 防止任务风暴：
            // 只有成功将 flush_pending 从 false 设为 true 的线程才 spawn
            if self
                .buffer
                .flush_pending
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::Relaxed)
                .is_ok()
            {
                let buffer = Arc::clone(&self.buffer);
                let sink = Arc::clone(&self.sink);
                tokio::spawn(async move {
                    if let Ok(_guard) = buffer.flush_lock.try_lock() {
                        Self::flush_buffer(&buffer, &sink).await;
                    } else {
                        trace!("ClickRecorder: flush already in progress, skipping");
                    }
                    // 无论成功与否都重置标志，允许下次触发
                    buffer.flush_pending.store(false, Ordering::Release);
                });
            }
        }
    }

    /// 启动后台刷盘任务（作为异步方法运行）
    pub async fn start_background_task(&self) {
        loop {
            sleep(self.flush_interval).await;

            debug!("ClickRecorder: triggering scheduled flush");
            if let Ok(_guard) = self.buffer.flush_lock.try_lock() {
                Self::flush_buffer(&self.buffer, &self.sink).await;
            } else {
                trace!("ClickRecorder: flush already in progress, skipping scheduled flush");
            }
        }
    }

    /// 手动触发刷盘（阻塞直到完成）
    pub async fn flush(&self) {
        debug!("ClickRecorder: manual flush triggered");
        let _guard = self.buffer.flush_lock.lock().await;
        Self::flush_buffer(&self.buffer, &self.sink).await;
    }

    /// 执行实际的刷盘操作
    async fn flush_buffer(buffer: &RecordBuffer, sink: &Arc<dyn ClickSink>) {
        let records = buffer.drain();

        if records.is_empty() {
            trace!("ClickRecorder: no records to flush");
            return;
        }

        let count = records.len();
        match sink.flush_records(records.clone()).await {
            Ok(_) => {
                debug!("ClickRecorder: flushed {} records", count);
            }
            Err(e) => {
                // 刷盘失败，恢复数据到 buffer，下个周期重试
                buffer.restore(records);
                warn!(
                    "ClickRecorder: flush_records failed: {}, {} records restored to buffer",
                    e, count
                );
            }
        }
    }

    /// 获取当前缓冲区大小（用于监控和测试）
    pub fn buffer_size(&self) -> usize {
        self.buffer.len()
    }
}
