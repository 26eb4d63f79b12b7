//! 号码轮换
//!
//! `NumberPool` 是选号的唯一入口：`reserve_next` 在一次调用里完成
//! 「挑出闲置最久的活跃号码」和「推进它的 last_used_at 游标」。
//! 数据库实现（SeaOrmStorage）用条件更新认领；`MemoryPool` 是
//! 互斥锁保护的内存实现，用于无持久层场景和测试。

mod memory;

pub use memory::MemoryPool;

use uuid::Uuid;

use crate::errors::Result;
use crate::storage::models::WhatsappNumber;

/// 软轮转号码池
///
/// 公平性是近似的：按「闲置最久优先」排序（从未使用的排最前），
/// 并发认领可能落在同一候选上，由实现各自解决或接受。
#[async_trait::async_trait]
pub trait NumberPool: Send + Sync {
    /// 认领组内下一个号码；`None` 表示组内没有活跃号码
    async fn reserve_next(&self, group_id: Uuid) -> Result<Option<WhatsappNumber>>;
}
