//! 公共跳转端点
//!
//! 三个入口共享同一个 RedirectFlow：页面跳转（/l/{slug}）、纯跳转
//! API（/api/redirect/{slug}）和 JSON info（/api/redirect/{slug}/info）。
//! handler 只做 Outcome → 响应编码，业务语义全部在 services::redirect。
//!
//! 每次成功响应都消耗一个轮换槽位并记录一次点击，所以所有选号入口
//! 一律带禁缓存头。

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use serde_json::json;
use std::sync::Arc;
use tracing::instrument;

use crate::errors::LinkFlowError;
use crate::services::{Outcome, RedirectFlow, RequestMeta};

const NO_STORE: (&str, &str) = ("Cache-Control", "no-store, no-cache, must-revalidate");

pub struct RedirectService;

impl RedirectService {
    /// GET /l/{slug} 和 GET /api/redirect/{slug}
    ///
    /// 成功时 302 到 wa.me 深链；业务失败 302 到各自的终点页面，
    /// 让运营能从落地页区分「链接不存在」和「暂时没有号码」。
    #[instrument(skip(req, flow), fields(slug = %path))]
    pub async fn handle_redirect(
        path: web::Path<String>,
        req: HttpRequest,
        flow: web::Data<Arc<RedirectFlow>>,
    ) -> impl Responder {
        let slug = path.into_inner();
        let meta = RequestMeta::from_request(&req);

        let location = match flow.resolve(&slug, &meta).await {
            Outcome::Selected(selection) => selection.whatsapp_url,
            Outcome::GroupNotFound => "/not-found".to_string(),
            Outcome::GroupInactive => "/group-inactive".to_string(),
            Outcome::NoNumbers => "/no-numbers".to_string(),
            Outcome::Unexpected(_) => "/error".to_string(),
        };

        HttpResponse::Found()
            .insert_header(("Location", location))
            .insert_header(NO_STORE)
            .finish()
    }

    /// GET /api/redirect/{slug}/info
    ///
    /// 与跳转端点执行完全相同的选号 + 归因，但以 JSON 返回，供客户端
    /// 先播放过场动画再自行跳转。
    #[instrument(skip(req, flow), fields(slug = %path))]
    pub async fn link_info(
        path: web::Path<String>,
        req: HttpRequest,
        flow: web::Data<Arc<RedirectFlow>>,
    ) -> impl Responder {
        let slug = path.into_inner();

        // 空段不进路由，但 %20 这类解码后纯空白的段会走到这里
        if slug.trim().is_empty() {
            return error_json(
                StatusCode::BAD_REQUEST,
                "missing-slug",
                "Group slug is required",
            );
        }

        let meta = RequestMeta::from_request(&req);
        outcome_to_json(flow.resolve(&slug, &meta).await)
    }

    pub async fn not_found_page() -> impl Responder {
        destination_page(StatusCode::NOT_FOUND, "Link not found")
    }

    pub async fn group_inactive_page() -> impl Responder {
        destination_page(StatusCode::NOT_FOUND, "This link is currently disabled")
    }

    pub async fn no_numbers_page() -> impl Responder {
        destination_page(
            StatusCode::NOT_FOUND,
            "No numbers are available right now, please try again later",
        )
    }

    pub async fn error_page() -> impl Responder {
        destination_page(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Something went wrong, please try again later",
        )
    }
}

/// Outcome → info JSON（/api/redirect/{slug}/info 与 /api/numbers/next 共用）
pub(crate) fn outcome_to_json(outcome: Outcome) -> HttpResponse {
    match outcome {
        Outcome::Selected(selection) => HttpResponse::Ok()
            .insert_header(NO_STORE)
            .append_header(("Content-Type", "application/json; charset=utf-8"))
            .json(json!({
                "success": true,
                "group": {
                    "id": selection.group.id,
                    "name": selection.group.name,
                },
                "number": {
                    "id": selection.number.id,
                    "phone": selection.number.phone,
                    "phoneFormatted": selection.phone_formatted(),
                    "name": selection.number.name,
                },
                "whatsappUrl": selection.whatsapp_url,
            })),
        Outcome::GroupNotFound => error_json(
            StatusCode::NOT_FOUND,
            "group-not-found",
            "No group exists for this slug",
        ),
        Outcome::GroupInactive => error_json(
            StatusCode::NOT_FOUND,
            "group-inactive",
            "This group is currently disabled",
        ),
        Outcome::NoNumbers => error_json(
            StatusCode::NOT_FOUND,
            "no-numbers",
            "No active numbers are available for this group",
        ),
        // 内部细节不下发，只给稳定的错误码
        Outcome::Unexpected(e) => {
            let code = match e {
                LinkFlowError::DatabaseConfig(_) => "config-error",
                _ => "unexpected",
            };
            error_json(
                StatusCode::INTERNAL_SERVER_ERROR,
                code,
                "An unexpected error occurred",
            )
        }
    }
}

fn error_json(status: StatusCode, error: &str, message: &str) -> HttpResponse {
    HttpResponse::build(status)
        .insert_header(NO_STORE)
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(json!({
            "success": false,
            "error": error,
            "errorMessage": message,
        }))
}

fn destination_page(status: StatusCode, message: &str) -> HttpResponse {
    HttpResponse::build(status)
        .insert_header(("Content-Type", "text/html; charset=utf-8"))
        .body(format!(
            "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>LinkFlow</title></head>\
             <body><p>{}</p></body></html>",
            message
        ))
}
