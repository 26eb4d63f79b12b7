//! slug → 组 的查找缓存
//!
//! 公共跳转路径的每次访问都要按 slug 找组；组数据变更频率远低于
//! 访问频率，用带 TTL 的 moka 缓存挡掉绝大多数查库。未命中的 slug
//! 也缓存（负缓存），避免打爆数据库的扫描型流量。
//!
//! 租户侧的组变更必须调用 invalidate，否则只能等 TTL 过期。

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::debug;

use crate::errors::{LinkFlowError, Result};
use crate::storage::{Group, SeaOrmStorage};

pub struct SlugCache {
    cache: Cache<String, Option<Group>>,
}

impl SlugCache {
    pub fn new(ttl_secs: u64, capacity: u64) -> Self {
        Self {
            cache: Cache::builder()
                .time_to_live(Duration::from_secs(ttl_secs))
                .max_capacity(capacity)
                .build(),
        }
    }

    /// 查缓存，未命中则查库并回填（包括未命中的 None）
    pub async fn get_or_load(
        &self,
        slug: &str,
        storage: &Arc<SeaOrmStorage>,
    ) -> Result<Option<Group>> {
        let storage = Arc::clone(storage);
        let slug_owned = slug.to_string();

        self.cache
            .try_get_with(slug.to_string(), async move {
                debug!("Slug cache miss: {}", slug_owned);
                storage.get_group_by_slug(&slug_owned).await
            })
            .await
            .map_err(|e: Arc<LinkFlowError>| (*e).clone())
    }

    /// 组变更后使对应 slug 失效（改 slug 时新旧都要失效）
    pub async fn invalidate(&self, slug: &str) {
        self.cache.invalidate(slug).await;
    }

    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }
}
