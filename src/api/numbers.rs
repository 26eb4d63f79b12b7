//! 租户号码 CRUD 与轮换预览
//!
//! /api/numbers/next 是唯一不鉴权的入口：它执行与公共跳转完全相同的
//! 选号 + 归因（同样消耗轮换槽位），只是以 JSON 返回结果。

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::redirect::outcome_to_json;
use super::{error_response, ok_json};
use crate::services::{RedirectFlow, RequestMeta};
use crate::storage::{NewNumber, NumberUpdate, SeaOrmStorage};

#[derive(Debug, Deserialize)]
pub struct ListNumbersQuery {
    pub company_id: Uuid,
    pub group_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextNumberQuery {
    pub group_slug: Option<String>,
}

pub struct NumberService;

impl NumberService {
    /// GET /api/numbers?company_id=&group_id=
    pub async fn list(
        query: web::Query<ListNumbersQuery>,
        storage: web::Data<Arc<SeaOrmStorage>>,
    ) -> impl Responder {
        match storage.list_numbers(query.company_id, query.group_id).await {
            Ok(numbers) => {
                info!(
                    "Tenant API: listed {} numbers for company {}",
                    numbers.len(),
                    query.company_id
                );
                ok_json(numbers)
            }
            Err(e) => error_response(&e),
        }
    }

    /// POST /api/numbers
    pub async fn create(
        payload: web::Json<NewNumber>,
        storage: web::Data<Arc<SeaOrmStorage>>,
    ) -> impl Responder {
        match storage.insert_number(payload.into_inner()).await {
            Ok(number) => {
                info!(
                    "Tenant API: created number '{}' in group {}",
                    number.phone, number.group_id
                );
                ok_json(number)
            }
            Err(e) => error_response(&e),
        }
    }

    /// GET /api/numbers/{id}
    pub async fn get(
        path: web::Path<Uuid>,
        storage: web::Data<Arc<SeaOrmStorage>>,
    ) -> impl Responder {
        let id = path.into_inner();
        match storage.get_number(id).await {
            Ok(Some(number)) => ok_json(number),
            Ok(None) => HttpResponse::NotFound()
                .append_header(("Content-Type", "application/json; charset=utf-8"))
                .json(serde_json::json!({
                    "code": 404,
                    "data": { "error": format!("Number not found: {}", id) }
                })),
            Err(e) => error_response(&e),
        }
    }

    /// PUT /api/numbers/{id}
    pub async fn update(
        path: web::Path<Uuid>,
        payload: web::Json<NumberUpdate>,
        storage: web::Data<Arc<SeaOrmStorage>>,
    ) -> impl Responder {
        let id = path.into_inner();
        match storage.update_number(id, payload.into_inner()).await {
            Ok(number) => {
                info!("Tenant API: updated number {}", id);
                ok_json(number)
            }
            Err(e) => error_response(&e),
        }
    }

    /// DELETE /api/numbers/{id}
    pub async fn delete(
        path: web::Path<Uuid>,
        storage: web::Data<Arc<SeaOrmStorage>>,
    ) -> impl Responder {
        let id = path.into_inner();
        match storage.delete_number(id).await {
            Ok(()) => {
                info!("Tenant API: deleted number {}", id);
                ok_json(serde_json::json!({ "deleted": id }))
            }
            Err(e) => error_response(&e),
        }
    }

    /// GET /api/numbers/next?groupSlug=
    ///
    /// 轮换预览：和公共跳转走同一条选号 + 归因路径，返回 info JSON。
    pub async fn next(
        query: web::Query<NextNumberQuery>,
        req: HttpRequest,
        flow: web::Data<Arc<RedirectFlow>>,
    ) -> impl Responder {
        let slug = match query.group_slug.as_deref().map(str::trim) {
            Some(slug) if !slug.is_empty() => slug.to_string(),
            _ => {
                return HttpResponse::build(StatusCode::BAD_REQUEST)
                    .insert_header(("Cache-Control", "no-store, no-cache, must-revalidate"))
                    .append_header(("Content-Type", "application/json; charset=utf-8"))
                    .json(serde_json::json!({
                        "success": false,
                        "error": "missing-slug",
                        "errorMessage": "Query parameter 'groupSlug' is required",
                    }));
            }
        };

        let meta = RequestMeta::from_request(&req);
        outcome_to_json(flow.resolve(&slug, &meta).await)
    }
}
