//! 把 SeaOrmStorage 作为归因 Sink：批量落库 click_events

use sea_orm::EntityTrait;

use migration::entities::click_event;

use super::SeaOrmStorage;
use super::converters::record_to_active_model;
use crate::analytics::{ClickRecord, ClickSink};

#[async_trait::async_trait]
impl ClickSink for SeaOrmStorage {
    async fn flush_records(&self, records: Vec<ClickRecord>) -> anyhow::Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let models: Vec<click_event::ActiveModel> =
            records.into_iter().map(record_to_active_model).collect();

        click_event::Entity::insert_many(models)
            .exec(&self.db)
            .await?;

        Ok(())
    }
}
