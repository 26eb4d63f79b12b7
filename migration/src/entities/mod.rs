pub mod click_event;
pub mod wa_group;
pub mod whatsapp_number;

pub use click_event::Entity as ClickEventEntity;
pub use wa_group::Entity as WaGroupEntity;
pub use whatsapp_number::Entity as WhatsappNumberEntity;
