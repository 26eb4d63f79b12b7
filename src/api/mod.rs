//! HTTP 传输层
//!
//! 路由全貌：
//! - `GET /l/{slug}`                      公共页面跳转（302 → wa.me 或终点页面）
//! - `GET /api/redirect/{slug}`           公共跳转 API（302，同上）
//! - `GET /api/redirect/{slug}/info`      公共 JSON info
//! - `GET /api/numbers/next?groupSlug=`   轮换预览（不鉴权）
//! - `/api/groups*`、`/api/numbers*`      租户 CRUD（Bearer token）
//! - `/health`、`/health/ready`、`/health/live`
//!
//! 路由装配放在这里，main 和集成测试共用同一份。

pub mod auth;
pub mod groups;
pub mod health;
pub mod numbers;
pub mod redirect;

pub use auth::AuthMiddleware;
pub use health::{AppStartTime, HealthService};

use actix_web::middleware::from_fn;
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};

use crate::errors::LinkFlowError;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub data: T,
}

/// 租户 API 的成功响应封装
pub(crate) fn ok_json<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok()
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(ApiResponse { code: 0, data })
}

/// 租户 API 的错误响应（错误码与 HTTP 状态一致）
pub(crate) fn error_response(e: &LinkFlowError) -> HttpResponse {
    let status = match e {
        LinkFlowError::Validation(_) => actix_web::http::StatusCode::BAD_REQUEST,
        LinkFlowError::SlugConflict(_) => actix_web::http::StatusCode::CONFLICT,
        LinkFlowError::NotFound(_) => actix_web::http::StatusCode::NOT_FOUND,
        _ => actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
    };

    HttpResponse::build(status)
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(serde_json::json!({
            "code": status.as_u16(),
            "data": { "error": e.to_string() }
        }))
}

/// 装配全部路由（main 与集成测试共用）
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    use groups::GroupService;
    use numbers::NumberService;
    use redirect::RedirectService;

    cfg.service(
        web::scope("/api")
            // 公共端点先注册，避免落进鉴权 scope
            .route(
                "/redirect/{slug}/info",
                web::get().to(RedirectService::link_info),
            )
            .route(
                "/redirect/{slug}",
                web::get().to(RedirectService::handle_redirect),
            )
            .route("/numbers/next", web::get().to(NumberService::next))
            .service(
                web::scope("")
                    .wrap(from_fn(AuthMiddleware::tenant_auth))
                    .route("/groups", web::get().to(GroupService::list))
                    .route("/groups", web::post().to(GroupService::create))
                    .route("/groups/{id}", web::get().to(GroupService::get))
                    .route("/groups/{id}", web::put().to(GroupService::update))
                    .route("/groups/{id}", web::delete().to(GroupService::delete))
                    .route("/numbers", web::get().to(NumberService::list))
                    .route("/numbers", web::post().to(NumberService::create))
                    .route("/numbers/{id}", web::get().to(NumberService::get))
                    .route("/numbers/{id}", web::put().to(NumberService::update))
                    .route("/numbers/{id}", web::delete().to(NumberService::delete)),
            ),
    )
    .service(
        web::scope("/health")
            .route("", web::get().to(HealthService::health_check))
            .route("/ready", web::get().to(HealthService::readiness_check))
            .route("/live", web::get().to(HealthService::liveness_check)),
    )
    .route("/l/{slug}", web::get().to(RedirectService::handle_redirect))
    .route("/not-found", web::get().to(RedirectService::not_found_page))
    .route(
        "/group-inactive",
        web::get().to(RedirectService::group_inactive_page),
    )
    .route(
        "/no-numbers",
        web::get().to(RedirectService::no_numbers_page),
    )
    .route("/error", web::get().to(RedirectService::error_page));
}
