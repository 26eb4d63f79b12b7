pub mod recorder;
pub mod sink;
pub mod ua;

pub use recorder::ClickRecorder;
pub use sink::{ClickSink, StdoutSink};
pub use ua::{DeviceType, UserAgentInfo};

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// 一次分发决策的归因记录
///
/// 选号成功后构建，进入 ClickRecorder 缓冲，批量落库为 click_events 行。
#[derive(Debug, Clone)]
pub struct ClickRecord {
    pub company_id: Uuid,
    pub group_id: Uuid,
    pub number_id: Uuid,
    /// 客户端 IP（受 analytics.enable_ip_logging 控制）
    pub ip_address: Option<String>,
    /// 原始 User-Agent
    pub user_agent: Option<String>,
    pub device_type: DeviceType,
    pub browser: Option<String>,
    pub os: Option<String>,
    /// 来源页面 (Referer header)
    pub referrer: Option<String>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ClickRecord {
    /// 创建只含标识符的记录，元数据字段后续填充
    pub fn new(company_id: Uuid, group_id: Uuid, number_id: Uuid) -> Self {
        Self {
            company_id,
            group_id,
            number_id,
            ip_address: None,
            user_agent: None,
            device_type: DeviceType::Desktop,
            browser: None,
            os: None,
            referrer: None,
            utm_source: None,
            utm_medium: None,
            utm_campaign: None,
            created_at: Utc::now(),
        }
    }
}
