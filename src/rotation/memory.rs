//! 内存号码池
//!
//! 互斥锁保护的 Vec，选号和游标推进在同一临界区内完成，
//! 不存在数据库实现的认领竞态。用于测试和无持久层的嵌入场景。

use chrono::Utc;
use parking_lot::Mutex;
use uuid::Uuid;

use super::NumberPool;
use crate::errors::Result;
use crate::storage::models::WhatsappNumber;

#[derive(Default)]
pub struct MemoryPool {
    numbers: Mutex<Vec<WhatsappNumber>>,
}

impl MemoryPool {
    pub fn new(numbers: Vec<WhatsappNumber>) -> Self {
        Self {
            numbers: Mutex::new(numbers),
        }
    }

    pub fn push(&self, number: WhatsappNumber) {
        self.numbers.lock().push(number);
    }

    /// 读取某个号码当前的游标（测试用）
    pub fn last_used_at(&self, id: Uuid) -> Option<chrono::DateTime<Utc>> {
        self.numbers
            .lock()
            .iter()
            .find(|n| n.id == id)
            .and_then(|n| n.last_used_at)
    }
}

#[async_trait::async_trait]
impl NumberPool for MemoryPool {
    async fn reserve_next(&self, group_id: Uuid) -> Result<Option<WhatsappNumber>> {
        let mut numbers = self.numbers.lock();

        // 闲置最久优先，None（从未使用）排最前
        let selected = numbers
            .iter_mut()
            .filter(|n| n.group_id == group_id && n.is_active)
            .min_by_key(|n| n.last_used_at);

        match selected {
            Some(number) => {
                number.last_used_at = Some(Utc::now());
                Ok(Some(number.clone()))
            }
            None => Ok(None),
        }
    }
}
