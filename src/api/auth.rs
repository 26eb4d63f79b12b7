//! 租户 API 鉴权中间件
//!
//! 单部署单 token：redirect.api_token 为空时整个租户 API 对外表现为
//! 不存在（404），避免探测。公共跳转路径和轮换预览端点不经过这里。

use actix_web::middleware::Next;
use actix_web::{
    Error, HttpResponse,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
};
use tracing::{debug, info};

use crate::config::get_config;

pub struct AuthMiddleware;

impl AuthMiddleware {
    /// 租户 API 身份验证中间件
    pub async fn tenant_auth(
        req: ServiceRequest,
        next: Next<BoxBody>,
    ) -> Result<ServiceResponse<BoxBody>, Error> {
        if req.method() == actix_web::http::Method::OPTIONS {
            // 对于 OPTIONS 请求，直接返回 204 No Content
            return Ok(req.into_response(HttpResponse::NoContent().finish()));
        }

        let api_token = get_config().redirect.api_token.clone();

        // token 为空视为租户 API 被禁用
        if api_token.is_empty() {
            return Ok(req.into_response(
                HttpResponse::NotFound()
                    .insert_header(("Content-Type", "text/html; charset=utf-8"))
                    .body("Not Found"),
            ));
        }

        if let Some(auth_header) = req.headers().get("Authorization") {
            if let Some(auth_bytes) = auth_header.as_bytes().strip_prefix(b"Bearer ") {
                if auth_bytes == api_token.as_bytes() {
                    debug!("Tenant API authentication succeeded");
                    return next.call(req).await;
                }
            }
        }

        info!("Tenant API authentication failed: token mismatch or missing Authorization header");
        Ok(req.into_response(
            HttpResponse::Unauthorized()
                .append_header(("Content-Type", "application/json; charset=utf-8"))
                .json(serde_json::json!({
                    "code": 401,
                    "data": { "error": "Unauthorized: Invalid or missing token" }
                })),
        ))
    }
}
