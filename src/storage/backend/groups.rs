//! 组（分发渠道）的读写操作

use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use tracing::{debug, info};
use uuid::Uuid;

use migration::entities::{wa_group, whatsapp_number};

use super::SeaOrmStorage;
use super::converters::model_to_group;
use super::retry::with_retry;
use crate::errors::{LinkFlowError, Result};
use crate::storage::models::{Group, GroupUpdate, NewGroup};
use crate::utils::is_valid_slug;

impl SeaOrmStorage {
    /// 按 slug 查找组（公共跳转路径的入口查询）
    pub async fn get_group_by_slug(&self, slug: &str) -> Result<Option<Group>> {
        let db = &self.db;
        let slug_owned = slug.to_string();

        let model = with_retry(
            &format!("get_group_by_slug({})", slug),
            self.retry_config,
            || async {
                wa_group::Entity::find()
                    .filter(wa_group::Column::Slug.eq(&slug_owned))
                    .one(db)
                    .await
            },
        )
        .await?;

        Ok(model.map(model_to_group))
    }

    pub async fn get_group(&self, id: Uuid) -> Result<Option<Group>> {
        let db = &self.db;

        let model = with_retry("get_group", self.retry_config, || async {
            wa_group::Entity::find_by_id(id).one(db).await
        })
        .await?;

        Ok(model.map(model_to_group))
    }

    /// 列出租户的所有组
    pub async fn list_groups(&self, company_id: Uuid) -> Result<Vec<Group>> {
        let db = &self.db;

        let models = with_retry("list_groups", self.retry_config, || async {
            wa_group::Entity::find()
                .filter(wa_group::Column::CompanyId.eq(company_id))
                .order_by_desc(wa_group::Column::CreatedAt)
                .all(db)
                .await
        })
        .await?;

        Ok(models.into_iter().map(model_to_group).collect())
    }

    pub async fn insert_group(&self, input: NewGroup) -> Result<Group> {
        if !is_valid_slug(&input.slug) {
            return Err(LinkFlowError::validation(format!(
                "slug 非法: '{}'",
                input.slug
            )));
        }
        if input.name.trim().is_empty() {
            return Err(LinkFlowError::validation("组名不能为空"));
        }

        // slug 全局唯一（跨租户），先查再插，唯一索引兜底
        if self.get_group_by_slug(&input.slug).await?.is_some() {
            return Err(LinkFlowError::slug_conflict(format!(
                "slug '{}' 已被占用",
                input.slug
            )));
        }

        let now = Utc::now();
        let model = wa_group::ActiveModel {
            id: Set(Uuid::new_v4()),
            company_id: Set(input.company_id),
            name: Set(input.name),
            slug: Set(input.slug),
            default_message: Set(input.default_message.filter(|m| !m.is_empty())),
            is_active: Set(input.is_active),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let inserted = model.insert(&self.db).await.map_err(|e| {
            if e.to_string().to_lowercase().contains("unique") {
                LinkFlowError::slug_conflict("slug 已被占用")
            } else {
                LinkFlowError::from(e)
            }
        })?;

        info!("Group created: {} ({})", inserted.slug, inserted.id);
        Ok(model_to_group(inserted))
    }

    pub async fn update_group(&self, id: Uuid, update: GroupUpdate) -> Result<Group> {
        let existing = wa_group::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| LinkFlowError::not_found(format!("组不存在: {}", id)))?;

        if let Some(ref slug) = update.slug {
            if !is_valid_slug(slug) {
                return Err(LinkFlowError::validation(format!("slug 非法: '{}'", slug)));
            }
            if *slug != existing.slug && self.get_group_by_slug(slug).await?.is_some() {
                return Err(LinkFlowError::slug_conflict(format!(
                    "slug '{}' 已被占用",
                    slug
                )));
            }
        }

        let mut model: wa_group::ActiveModel = existing.into();
        if let Some(name) = update.name {
            if name.trim().is_empty() {
                return Err(LinkFlowError::validation("组名不能为空"));
            }
            model.name = Set(name);
        }
        if let Some(slug) = update.slug {
            model.slug = Set(slug);
        }
        if let Some(message) = update.default_message {
            // 空字符串表示清空默认消息
            model.default_message = Set(Some(message).filter(|m| !m.is_empty()));
        }
        if let Some(is_active) = update.is_active {
            model.is_active = Set(is_active);
        }
        model.updated_at = Set(Utc::now());

        // 预检查之后 slug 仍可能被并发请求抢走，唯一索引兜底
        let updated = model.update(&self.db).await.map_err(|e| {
            if e.to_string().to_lowercase().contains("unique") {
                LinkFlowError::slug_conflict("slug 已被占用")
            } else {
                LinkFlowError::from(e)
            }
        })?;
        debug!("Group updated: {}", updated.id);
        Ok(model_to_group(updated))
    }

    /// 删除组；名下还有号码时拒绝（先删号码或软停用组）
    pub async fn delete_group(&self, id: Uuid) -> Result<()> {
        let number_count = whatsapp_number::Entity::find()
            .filter(whatsapp_number::Column::GroupId.eq(id))
            .count(&self.db)
            .await?;

        if number_count > 0 {
            return Err(LinkFlowError::validation(format!(
                "组下还有 {} 个号码，不能删除",
                number_count
            )));
        }

        let result = wa_group::Entity::delete_by_id(id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(LinkFlowError::not_found(format!("组不存在: {}", id)));
        }

        info!("Group deleted: {}", id);
        Ok(())
    }
}
