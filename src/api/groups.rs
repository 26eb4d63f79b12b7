//! 租户组 CRUD
//!
//! 所有写操作在落库成功后使 slug 缓存失效，公共跳转路径最多滞后
//! 一次缓存 TTL。

use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::{error_response, ok_json};
use crate::services::SlugCache;
use crate::storage::{GroupUpdate, NewGroup, SeaOrmStorage};

#[derive(Debug, Deserialize)]
pub struct ListGroupsQuery {
    pub company_id: Uuid,
}

pub struct GroupService;

impl GroupService {
    /// GET /api/groups?company_id=
    pub async fn list(
        query: web::Query<ListGroupsQuery>,
        storage: web::Data<Arc<SeaOrmStorage>>,
    ) -> impl Responder {
        match storage.list_groups(query.company_id).await {
            Ok(groups) => {
                info!(
                    "Tenant API: listed {} groups for company {}",
                    groups.len(),
                    query.company_id
                );
                ok_json(groups)
            }
            Err(e) => error_response(&e),
        }
    }

    /// POST /api/groups
    pub async fn create(
        payload: web::Json<NewGroup>,
        storage: web::Data<Arc<SeaOrmStorage>>,
        cache: web::Data<Arc<SlugCache>>,
    ) -> impl Responder {
        let input = payload.into_inner();
        match storage.insert_group(input).await {
            Ok(group) => {
                info!("Tenant API: created group '{}' ({})", group.slug, group.id);
                // 负缓存可能已经记住了这个 slug 不存在
                cache.invalidate(&group.slug).await;
                ok_json(group)
            }
            Err(e) => error_response(&e),
        }
    }

    /// GET /api/groups/{id}
    pub async fn get(
        path: web::Path<Uuid>,
        storage: web::Data<Arc<SeaOrmStorage>>,
    ) -> impl Responder {
        let id = path.into_inner();
        match storage.get_group(id).await {
            Ok(Some(group)) => ok_json(group),
            Ok(None) => HttpResponse::NotFound()
                .append_header(("Content-Type", "application/json; charset=utf-8"))
                .json(serde_json::json!({
                    "code": 404,
                    "data": { "error": format!("Group not found: {}", id) }
                })),
            Err(e) => error_response(&e),
        }
    }

    /// PUT /api/groups/{id}
    pub async fn update(
        path: web::Path<Uuid>,
        payload: web::Json<GroupUpdate>,
        storage: web::Data<Arc<SeaOrmStorage>>,
        cache: web::Data<Arc<SlugCache>>,
    ) -> impl Responder {
        let id = path.into_inner();

        // 改 slug 时旧 slug 也要失效，先取改前状态
        let old_slug = match storage.get_group(id).await {
            Ok(Some(group)) => Some(group.slug),
            Ok(None) => None,
            Err(e) => return error_response(&e),
        };

        match storage.update_group(id, payload.into_inner()).await {
            Ok(group) => {
                info!("Tenant API: updated group '{}' ({})", group.slug, group.id);
                if let Some(old_slug) = old_slug {
                    if old_slug != group.slug {
                        cache.invalidate(&old_slug).await;
                    }
                }
                cache.invalidate(&group.slug).await;
                ok_json(group)
            }
            Err(e) => error_response(&e),
        }
    }

    /// DELETE /api/groups/{id}
    pub async fn delete(
        path: web::Path<Uuid>,
        storage: web::Data<Arc<SeaOrmStorage>>,
        cache: web::Data<Arc<SlugCache>>,
    ) -> impl Responder {
        let id = path.into_inner();

        let slug = match storage.get_group(id).await {
            Ok(Some(group)) => Some(group.slug),
            Ok(None) => None,
            Err(e) => return error_response(&e),
        };

        match storage.delete_group(id).await {
            Ok(()) => {
                info!("Tenant API: deleted group {}", id);
                if let Some(slug) = slug {
                    cache.invalidate(&slug).await;
                }
                ok_json(serde_json::json!({ "deleted": id }))
            }
            Err(e) => error_response(&e),
        }
    }
}
