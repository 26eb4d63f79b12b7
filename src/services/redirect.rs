//! 跳转分发服务
//!
//! 所有入口（页面跳转、API 跳转、JSON info、轮换预览）共用这一个
//! 服务：resolve 完成 slug 校验 → 组查找 → 活跃检查 → 认领号码 →
//! 归因记录 → 消息合成 → 深链构建，各 transport handler 只负责把
//! Outcome 编码成自己的响应形式。
//!
//! 归因记录是尽力而为的：record_click 只做同步内存写，失败或落库
//! 延迟都不会阻塞访客跳转。

use std::borrow::Cow;
use std::sync::Arc;

use actix_web::HttpRequest;
use tracing::error;

use crate::analytics::ua::UserAgentInfo;
use crate::analytics::{ClickRecord, ClickRecorder};
use crate::config::get_config;
use crate::errors::LinkFlowError;
use crate::rotation::NumberPool;
use crate::services::SlugCache;
use crate::storage::{Group, SeaOrmStorage, WhatsappNumber};
use crate::utils::ip::extract_client_ip;
use crate::utils::is_valid_slug;
use crate::utils::phone::format_phone_display;

/// 一次访问携带的请求元数据
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
}

impl RequestMeta {
    /// 从 HTTP 请求提取元数据（只取原始字符串，解析推迟到记录时）
    pub fn from_request(req: &HttpRequest) -> Self {
        let query = req.uri().query();

        Self {
            ip_address: extract_client_ip(req),
            user_agent: header_str(req, "user-agent"),
            referrer: header_str(req, "referer"),
            utm_source: query.and_then(|q| extract_query_param(q, "utm_source")),
            utm_medium: query.and_then(|q| extract_query_param(q, "utm_medium")),
            utm_campaign: query.and_then(|q| extract_query_param(q, "utm_campaign")),
        }
    }
}

fn header_str(req: &HttpRequest, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(String::from)
}

/// 从 query string 提取指定参数值（URL 解码后原样透传）
fn extract_query_param(query: &str, key: &str) -> Option<String> {
    for part in query.split('&') {
        if let Some(value) = part.strip_prefix(key).and_then(|s| s.strip_prefix('=')) {
            return urlencoding::decode(value).ok().map(Cow::into_owned);
        }
    }
    None
}

/// 成功选号的结果
#[derive(Debug, Clone)]
pub struct Selection {
    pub group: Group,
    pub number: WhatsappNumber,
    pub message: String,
    pub whatsapp_url: String,
}

impl Selection {
    pub fn phone_formatted(&self) -> String {
        format_phone_display(&self.number.phone)
    }
}

/// 分发结果
///
/// 前三个失败态是正常的业务结局，不是错误；只有 Unexpected 代表
/// 真正的故障，并且对公共客户端永远不泄露内部细节。
#[derive(Debug)]
pub enum Outcome {
    Selected(Box<Selection>),
    GroupNotFound,
    GroupInactive,
    NoNumbers,
    Unexpected(LinkFlowError),
}

/// 合成最终的出站消息：组默认消息在前，号码自定义消息在后，
/// 单空格连接，缺失的部分跳过。纯函数。
pub fn compose_message(group: &Group, number: &WhatsappNumber) -> String {
    let parts: Vec<&str> = [
        group.default_message.as_deref(),
        number.custom_message.as_deref(),
    ]
    .into_iter()
    .flatten()
    .filter(|s| !s.is_empty())
    .collect();

    parts.join(" ")
}

/// 构建 wa.me 深链；消息为空时不带 text 参数
pub fn build_whatsapp_url(phone: &str, message: &str) -> String {
    if message.is_empty() {
        format!("https://wa.me/{}", phone)
    } else {
        format!("https://wa.me/{}?text={}", phone, urlencoding::encode(message))
    }
}

pub struct RedirectFlow {
    storage: Arc<SeaOrmStorage>,
    cache: Arc<SlugCache>,
    recorder: ClickRecorder,
}

impl RedirectFlow {
    pub fn new(storage: Arc<SeaOrmStorage>, cache: Arc<SlugCache>, recorder: ClickRecorder) -> Self {
        Self {
            storage,
            cache,
            recorder,
        }
    }

    /// 解析一次访问并产出分发结果
    ///
    /// 每次调用恰好执行一次选号 + 归因（成功路径），重复调用会继续
    /// 消耗轮换槽位，所以响应必须带禁缓存头。
    pub async fn resolve(&self, slug: &str, meta: &RequestMeta) -> Outcome {
        // 非法 slug 等价于不存在，不进缓存
        if !is_valid_slug(slug) {
            return Outcome::GroupNotFound;
        }

        let group = match self.cache.get_or_load(slug, &self.storage).await {
            Ok(Some(group)) => group,
            Ok(None) => return Outcome::GroupNotFound,
            Err(e) => {
                error!("Group lookup failed for slug '{}': {}", slug, e);
                return Outcome::Unexpected(e);
            }
        };

        // 停用的组永远是 GroupInactive，即使号码池也是空的
        if !group.is_active {
            return Outcome::GroupInactive;
        }

        let number = match self.storage.reserve_next(group.id).await {
            Ok(Some(number)) => number,
            Ok(None) => return Outcome::NoNumbers,
            Err(e) => {
                error!("Number reservation failed for group {}: {}", group.id, e);
                return Outcome::Unexpected(e);
            }
        };

        self.record_click(&group, &number, meta);

        let message = compose_message(&group, &number);
        let whatsapp_url = build_whatsapp_url(&number.phone, &message);

        Outcome::Selected(Box::new(Selection {
            group,
            number,
            message,
            whatsapp_url,
        }))
    }

    /// 记录归因（同步内存写，不等待落库）
    fn record_click(&self, group: &Group, number: &WhatsappNumber, meta: &RequestMeta) {
        let ua_info = UserAgentInfo::parse(meta.user_agent.as_deref());
        let enable_ip_logging = get_config().analytics.enable_ip_logging;

        let mut record = ClickRecord::new(group.company_id, group.id, number.id);
        record.ip_address = if enable_ip_logging {
            meta.ip_address.clone()
        } else {
            None
        };
        record.user_agent = meta.user_agent.clone();
        record.device_type = ua_info.device_type;
        record.browser = ua_info.browser;
        record.os = ua_info.os;
        record.referrer = meta.referrer.clone();
        record.utm_source = meta.utm_source.clone();
        record.utm_medium = meta.utm_medium.clone();
        record.utm_campaign = meta.utm_campaign.clone();

        self.recorder.record(record);
    }

    pub fn recorder(&self) -> &ClickRecorder {
        &self.recorder
    }

    pub fn cache(&self) -> &Arc<SlugCache> {
        &self.cache
    }

    pub fn storage(&self) -> &Arc<SeaOrmStorage> {
        &self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;
    use chrono::Utc;
    use uuid::Uuid;

    fn group_with_message(message: Option<&str>) -> Group {
        let now = Utc::now();
        Group {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            name: "Sales".to_string(),
            slug: "sales".to_string(),
            default_message: message.map(String::from),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn number_with_message(message: Option<&str>) -> WhatsappNumber {
        let now = Utc::now();
        WhatsappNumber {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            group_id: Uuid::new_v4(),
            phone: "5511999990000".to_string(),
            name: None,
            custom_message: message.map(String::from),
            is_active: true,
            last_used_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_compose_both_parts() {
        let group = group_with_message(Some("Hi"));
        let number = number_with_message(Some("re: promo"));
        assert_eq!(compose_message(&group, &number), "Hi re: promo");
    }

    #[test]
    fn test_compose_group_only() {
        let group = group_with_message(Some("Hi"));
        let number = number_with_message(None);
        assert_eq!(compose_message(&group, &number), "Hi");
    }

    #[test]
    fn test_compose_number_only() {
        let group = group_with_message(None);
        let number = number_with_message(Some("re: promo"));
        assert_eq!(compose_message(&group, &number), "re: promo");
    }

    #[test]
    fn test_compose_neither() {
        let group = group_with_message(None);
        let number = number_with_message(None);
        assert_eq!(compose_message(&group, &number), "");
    }

    #[test]
    fn test_whatsapp_url_with_message() {
        assert_eq!(
            build_whatsapp_url("5511999990000", "Hello"),
            "https://wa.me/5511999990000?text=Hello"
        );
    }

    #[test]
    fn test_whatsapp_url_encodes_message() {
        assert_eq!(
            build_whatsapp_url("5511999990000", "Olá, tudo bem?"),
            "https://wa.me/5511999990000?text=Ol%C3%A1%2C%20tudo%20bem%3F"
        );
    }

    #[test]
    fn test_whatsapp_url_without_message() {
        assert_eq!(
            build_whatsapp_url("5511999990000", ""),
            "https://wa.me/5511999990000"
        );
    }

    #[test]
    fn test_request_meta_extracts_utm_params() {
        let req = TestRequest::with_uri(
            "/l/sales?utm_source=instagram&utm_medium=bio&utm_campaign=spring%20sale",
        )
        .insert_header(("User-Agent", "test-agent"))
        .insert_header(("Referer", "https://instagram.com/"))
        .to_http_request();

        let meta = RequestMeta::from_request(&req);
        assert_eq!(meta.utm_source.as_deref(), Some("instagram"));
        assert_eq!(meta.utm_medium.as_deref(), Some("bio"));
        assert_eq!(meta.utm_campaign.as_deref(), Some("spring sale"));
        assert_eq!(meta.user_agent.as_deref(), Some("test-agent"));
        assert_eq!(meta.referrer.as_deref(), Some("https://instagram.com/"));
    }

    #[test]
    fn test_request_meta_missing_utm_params() {
        let req = TestRequest::with_uri("/l/sales").to_http_request();
        let meta = RequestMeta::from_request(&req);
        assert_eq!(meta.utm_source, None);
        assert_eq!(meta.utm_medium, None);
        assert_eq!(meta.utm_campaign, None);
    }
}
