//! 实体模型与领域模型的转换

use sea_orm::ActiveValue::Set;

use migration::entities::{click_event, wa_group, whatsapp_number};

use crate::analytics::ClickRecord;
use crate::storage::models::{Group, WhatsappNumber};

pub fn model_to_group(model: wa_group::Model) -> Group {
    Group {
        id: model.id,
        company_id: model.company_id,
        name: model.name,
        slug: model.slug,
        default_message: model.default_message,
        is_active: model.is_active,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

pub fn model_to_number(model: whatsapp_number::Model) -> WhatsappNumber {
    WhatsappNumber {
        id: model.id,
        company_id: model.company_id,
        group_id: model.group_id,
        phone: model.phone,
        name: model.name,
        custom_message: model.custom_message,
        is_active: model.is_active,
        last_used_at: model.last_used_at,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

pub fn record_to_active_model(record: ClickRecord) -> click_event::ActiveModel {
    click_event::ActiveModel {
        id: Default::default(),
        company_id: Set(record.company_id),
        group_id: Set(record.group_id),
        number_id: Set(record.number_id),
        ip_address: Set(record.ip_address),
        user_agent: Set(record.user_agent),
        device_type: Set(record.device_type.as_str().to_string()),
        browser: Set(record.browser),
        os: Set(record.os),
        referrer: Set(record.referrer),
        utm_source: Set(record.utm_source),
        utm_medium: Set(record.utm_medium),
        utm_campaign: Set(record.utm_campaign),
        created_at: Set(record.created_at),
    }
}
