use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 分发渠道（组）
///
/// slug 是全局唯一的公共查找键；组只会被软停用（is_active = false），
/// 名下还有号码时不做物理删除。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub slug: String,
    pub default_message: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 组下的 WhatsApp 号码
///
/// phone 为纯数字、带国家码前缀；last_used_at 是核心唯一会修改的字段，
/// 兼作轮换游标（NULL = 从未使用，选号时优先）。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatsappNumber {
    pub id: Uuid,
    pub company_id: Uuid,
    pub group_id: Uuid,
    pub phone: String,
    pub name: Option<String>,
    pub custom_message: Option<String>,
    pub is_active: bool,
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 新建组的输入
#[derive(Debug, Clone, Deserialize)]
pub struct NewGroup {
    pub company_id: Uuid,
    pub name: String,
    pub slug: String,
    pub default_message: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// 组更新（None = 不变；default_message 传空字符串清空）
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroupUpdate {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub default_message: Option<String>,
    pub is_active: Option<bool>,
}

/// 新建号码的输入
#[derive(Debug, Clone, Deserialize)]
pub struct NewNumber {
    pub company_id: Uuid,
    pub group_id: Uuid,
    pub phone: String,
    pub name: Option<String>,
    pub custom_message: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// 号码更新（None = 不变；custom_message 传空字符串清空）
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NumberUpdate {
    pub phone: Option<String>,
    pub name: Option<String>,
    pub custom_message: Option<String>,
    pub is_active: Option<bool>,
}

fn default_true() -> bool {
    true
}
