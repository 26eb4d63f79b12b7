//! 号码池的读写操作，以及数据库侧的轮换认领
//!
//! reserve_next 用条件 UPDATE 把「选号」和「推进 last_used_at 游标」
//! 合并为一次读-改-写：并发请求观察到同一候选时，只有一个条件更新
//! 能命中，落选方顺延到下一个候选。

use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::{Expr, NullOrdering};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, Order, QueryFilter, QueryOrder,
    QuerySelect,
};
use tracing::{debug, info, trace};
use uuid::Uuid;

use migration::entities::whatsapp_number;

use super::SeaOrmStorage;
use super::converters::model_to_number;
use super::retry::with_retry;
use crate::errors::{LinkFlowError, Result};
use crate::rotation::NumberPool;
use crate::storage::models::{NewNumber, NumberUpdate, WhatsappNumber};
use crate::utils::phone::normalize_phone;

/// 一次认领尝试读取的候选数量
const CLAIM_CANDIDATES: u64 = 4;

impl SeaOrmStorage {
    pub async fn get_number(&self, id: Uuid) -> Result<Option<WhatsappNumber>> {
        let db = &self.db;

        let model = with_retry("get_number", self.retry_config, || async {
            whatsapp_number::Entity::find_by_id(id).one(db).await
        })
        .await?;

        Ok(model.map(model_to_number))
    }

    /// 列出租户号码，可按组过滤
    pub async fn list_numbers(
        &self,
        company_id: Uuid,
        group_id: Option<Uuid>,
    ) -> Result<Vec<WhatsappNumber>> {
        let db = &self.db;

        let mut condition =
            Condition::all().add(whatsapp_number::Column::CompanyId.eq(company_id));
        if let Some(group_id) = group_id {
            condition = condition.add(whatsapp_number::Column::GroupId.eq(group_id));
        }

        let models = with_retry("list_numbers", self.retry_config, || async {
            whatsapp_number::Entity::find()
                .filter(condition.clone())
                .order_by_desc(whatsapp_number::Column::CreatedAt)
                .all(db)
                .await
        })
        .await?;

        Ok(models.into_iter().map(model_to_number).collect())
    }

    pub async fn insert_number(&self, input: NewNumber) -> Result<WhatsappNumber> {
        let phone = normalize_phone(&input.phone).ok_or_else(|| {
            LinkFlowError::validation(format!("电话号码非法: '{}'", input.phone))
        })?;

        // 号码只能属于一个存在的组
        self.get_group(input.group_id)
            .await?
            .ok_or_else(|| LinkFlowError::not_found(format!("组不存在: {}", input.group_id)))?;

        let now = Utc::now();
        let model = whatsapp_number::ActiveModel {
            id: Set(Uuid::new_v4()),
            company_id: Set(input.company_id),
            group_id: Set(input.group_id),
            phone: Set(phone),
            name: Set(input.name.filter(|n| !n.is_empty())),
            custom_message: Set(input.custom_message.filter(|m| !m.is_empty())),
            is_active: Set(input.is_active),
            last_used_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let inserted = model.insert(&self.db).await?;
        info!("Number created: {} ({})", inserted.phone, inserted.id);
        Ok(model_to_number(inserted))
    }

    pub async fn update_number(&self, id: Uuid, update: NumberUpdate) -> Result<WhatsappNumber> {
        let existing = whatsapp_number::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| LinkFlowError::not_found(format!("号码不存在: {}", id)))?;

        let mut model: whatsapp_number::ActiveModel = existing.into();
        if let Some(phone) = update.phone {
            let normalized = normalize_phone(&phone)
                .ok_or_else(|| LinkFlowError::validation(format!("电话号码非法: '{}'", phone)))?;
            model.phone = Set(normalized);
        }
        if let Some(name) = update.name {
            model.name = Set(Some(name).filter(|n| !n.is_empty()));
        }
        if let Some(message) = update.custom_message {
            // 空字符串表示清空自定义消息
            model.custom_message = Set(Some(message).filter(|m| !m.is_empty()));
        }
        if let Some(is_active) = update.is_active {
            model.is_active = Set(is_active);
        }
        model.updated_at = Set(Utc::now());

        let updated = model.update(&self.db).await?;
        debug!("Number updated: {}", updated.id);
        Ok(model_to_number(updated))
    }

    pub async fn delete_number(&self, id: Uuid) -> Result<()> {
        let result = whatsapp_number::Entity::delete_by_id(id)
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(LinkFlowError::not_found(format!("号码不存在: {}", id)));
        }

        info!("Number deleted: {}", id);
        Ok(())
    }

    /// 读取一组里最久未使用的活跃号码候选
    async fn idle_candidates(&self, group_id: Uuid) -> Result<Vec<whatsapp_number::Model>> {
        let db = &self.db;

        let models = with_retry("idle_candidates", self.retry_config, || async {
            whatsapp_number::Entity::find()
                .filter(whatsapp_number::Column::GroupId.eq(group_id))
                .filter(whatsapp_number::Column::IsActive.eq(true))
                // 从未使用的号码（NULL 游标）排最前
                .order_by_with_nulls(
                    whatsapp_number::Column::LastUsedAt,
                    Order::Asc,
                    NullOrdering::First,
                )
                .limit(CLAIM_CANDIDATES)
                .all(db)
                .await
        })
        .await?;

        Ok(models)
    }

    /// 条件更新认领：只有 last_used_at 仍是观察值时才推进游标
    async fn try_claim(
        &self,
        candidate: &whatsapp_number::Model,
        claimed_at: chrono::DateTime<Utc>,
    ) -> Result<bool> {
        let mut condition = Condition::all()
            .add(whatsapp_number::Column::Id.eq(candidate.id))
            .add(whatsapp_number::Column::IsActive.eq(true));
        condition = match candidate.last_used_at {
            None => condition.add(whatsapp_number::Column::LastUsedAt.is_null()),
            Some(observed) => condition.add(whatsapp_number::Column::LastUsedAt.eq(observed)),
        };

        let db = &self.db;
        let result = with_retry("claim_number", self.retry_config, || async {
            whatsapp_number::Entity::update_many()
                .col_expr(
                    whatsapp_number::Column::LastUsedAt,
                    Expr::value(claimed_at),
                )
                .filter(condition.clone())
                .exec(db)
                .await
        })
        .await?;

        Ok(result.rows_affected == 1)
    }
}

#[async_trait::async_trait]
impl NumberPool for SeaOrmStorage {
    async fn reserve_next(&self, group_id: Uuid) -> Result<Option<WhatsappNumber>> {
        let candidates = self.idle_candidates(group_id).await?;
        if candidates.is_empty() {
            return Ok(None);
        }

        let claimed_at = Utc::now();
        for candidate in &candidates {
            if self.try_claim(candidate, claimed_at).await? {
                trace!("Claimed number {} for group {}", candidate.id, group_id);
                let mut number = model_to_number(candidate.clone());
                number.last_used_at = Some(claimed_at);
                return Ok(Some(number));
            }
            trace!(
                "Claim race on number {} for group {}, trying next candidate",
                candidate.id, group_id
            );
        }

        // 所有候选都被并发请求抢走：无条件认领队头。
        // 近似公平即可，这里保证活性而不是严格轮转。
        let head = &candidates[0];
        let db = &self.db;
        with_retry("claim_number_fallback", self.retry_config, || async {
            whatsapp_number::Entity::update_many()
                .col_expr(
                    whatsapp_number::Column::LastUsedAt,
                    Expr::value(claimed_at),
                )
                .filter(whatsapp_number::Column::Id.eq(head.id))
                .exec(db)
                .await
        })
        .await?;

        debug!(
            "All claim candidates raced for group {}, falling back to head {}",
            group_id, head.id
        );
        let mut number = model_to_number(head.clone());
        number.last_used_at = Some(claimed_at);
        Ok(Some(number))
    }
}
