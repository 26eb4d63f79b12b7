//! Storage backend tests
//!
//! Exercises group/number CRUD and the rotation claim path against a
//! real SQLite database, plus the batched click sink.

use std::sync::Arc;
use std::sync::Once;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, ActiveValue::Set, EntityTrait};
use tempfile::TempDir;
use uuid::Uuid;

use linkflow::analytics::{ClickRecord, ClickRecorder, DeviceType};
use linkflow::config::init_config;
use linkflow::errors::LinkFlowError;
use linkflow::rotation::NumberPool;
use linkflow::storage::backend::SeaOrmStorage;
use linkflow::storage::{GroupUpdate, NewGroup, NewNumber};

use migration::entities::{click_event, whatsapp_number};

static INIT: Once = Once::new();

async fn setup_storage() -> (TempDir, Arc<SeaOrmStorage>) {
    INIT.call_once(init_config);

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("storage_test.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let storage = Arc::new(
        SeaOrmStorage::new(&db_url, "sqlite")
            .await
            .expect("Failed to create storage"),
    );
    (temp_dir, storage)
}

fn new_group(company_id: Uuid, slug: &str) -> NewGroup {
    NewGroup {
        company_id,
        name: format!("Group {}", slug),
        slug: slug.to_string(),
        default_message: Some("Hello".to_string()),
        is_active: true,
    }
}

fn new_number(company_id: Uuid, group_id: Uuid, phone: &str) -> NewNumber {
    NewNumber {
        company_id,
        group_id,
        phone: phone.to_string(),
        name: None,
        custom_message: None,
        is_active: true,
    }
}

/// 把号码的轮换游标拨回 `minutes` 分钟前
async fn backdate_number(storage: &SeaOrmStorage, id: Uuid, minutes: i64) {
    let model = whatsapp_number::ActiveModel {
        id: Set(id),
        last_used_at: Set(Some(Utc::now() - Duration::minutes(minutes))),
        ..Default::default()
    };
    model
        .update(storage.get_db())
        .await
        .expect("Failed to backdate number");
}

// =============================================================================
// Group CRUD
// =============================================================================

#[tokio::test]
async fn test_group_crud_roundtrip() {
    let (_dir, storage) = setup_storage().await;
    let company_id = Uuid::new_v4();

    let group = storage
        .insert_group(new_group(company_id, "sales"))
        .await
        .unwrap();
    assert_eq!(group.slug, "sales");
    assert!(group.is_active);

    let found = storage.get_group_by_slug("sales").await.unwrap().unwrap();
    assert_eq!(found.id, group.id);

    let updated = storage
        .update_group(
            group.id,
            GroupUpdate {
                slug: Some("vendas".to_string()),
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.slug, "vendas");
    assert!(!updated.is_active);

    assert!(storage.get_group_by_slug("sales").await.unwrap().is_none());

    storage.delete_group(group.id).await.unwrap();
    assert!(storage.get_group(group.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_duplicate_slug_rejected() {
    let (_dir, storage) = setup_storage().await;
    let company_id = Uuid::new_v4();

    storage
        .insert_group(new_group(company_id, "promo"))
        .await
        .unwrap();

    // 跨租户 slug 也必须唯一，它是全局公共查找键
    let err = storage
        .insert_group(new_group(Uuid::new_v4(), "promo"))
        .await
        .unwrap_err();
    assert!(matches!(err, LinkFlowError::SlugConflict(_)));
}

#[tokio::test]
async fn test_update_to_taken_slug_rejected() {
    let (_dir, storage) = setup_storage().await;
    let company_id = Uuid::new_v4();

    storage
        .insert_group(new_group(company_id, "taken"))
        .await
        .unwrap();
    let other = storage
        .insert_group(new_group(company_id, "free"))
        .await
        .unwrap();

    // 改名撞上已存在的 slug 必须报 SlugConflict，而不是数据库错误
    let err = storage
        .update_group(
            other.id,
            GroupUpdate {
                slug: Some("taken".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LinkFlowError::SlugConflict(_)));

    // 改成自己当前的 slug 不算冲突
    let unchanged = storage
        .update_group(
            other.id,
            GroupUpdate {
                slug: Some("free".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(unchanged.slug, "free");
}

#[tokio::test]
async fn test_invalid_slug_rejected() {
    let (_dir, storage) = setup_storage().await;

    let err = storage
        .insert_group(new_group(Uuid::new_v4(), "has space"))
        .await
        .unwrap_err();
    assert!(matches!(err, LinkFlowError::Validation(_)));
}

#[tokio::test]
async fn test_delete_group_with_numbers_refused() {
    let (_dir, storage) = setup_storage().await;
    let company_id = Uuid::new_v4();

    let group = storage
        .insert_group(new_group(company_id, "support"))
        .await
        .unwrap();
    storage
        .insert_number(new_number(company_id, group.id, "5511999990000"))
        .await
        .unwrap();

    let err = storage.delete_group(group.id).await.unwrap_err();
    assert!(matches!(err, LinkFlowError::Validation(_)));
}

// =============================================================================
// Number CRUD
// =============================================================================

#[tokio::test]
async fn test_number_phone_normalized_on_insert() {
    let (_dir, storage) = setup_storage().await;
    let company_id = Uuid::new_v4();

    let group = storage
        .insert_group(new_group(company_id, "intl"))
        .await
        .unwrap();

    let number = storage
        .insert_number(new_number(company_id, group.id, "+55 (11) 99999-0000"))
        .await
        .unwrap();
    assert_eq!(number.phone, "5511999990000");
    assert!(number.last_used_at.is_none());
}

#[tokio::test]
async fn test_number_requires_existing_group() {
    let (_dir, storage) = setup_storage().await;

    let err = storage
        .insert_number(new_number(Uuid::new_v4(), Uuid::new_v4(), "5511999990000"))
        .await
        .unwrap_err();
    assert!(matches!(err, LinkFlowError::NotFound(_)));
}

#[tokio::test]
async fn test_list_numbers_filtered_by_group() {
    let (_dir, storage) = setup_storage().await;
    let company_id = Uuid::new_v4();

    let group_a = storage
        .insert_group(new_group(company_id, "list-a"))
        .await
        .unwrap();
    let group_b = storage
        .insert_group(new_group(company_id, "list-b"))
        .await
        .unwrap();

    storage
        .insert_number(new_number(company_id, group_a.id, "5511999990001"))
        .await
        .unwrap();
    storage
        .insert_number(new_number(company_id, group_a.id, "5511999990002"))
        .await
        .unwrap();
    storage
        .insert_number(new_number(company_id, group_b.id, "5511999990003"))
        .await
        .unwrap();

    let all = storage.list_numbers(company_id, None).await.unwrap();
    assert_eq!(all.len(), 3);

    let only_a = storage
        .list_numbers(company_id, Some(group_a.id))
        .await
        .unwrap();
    assert_eq!(only_a.len(), 2);
}

// =============================================================================
// Rotation (reserve_next)
// =============================================================================

#[tokio::test]
async fn test_rotation_prefers_never_used_then_least_recent() {
    let (_dir, storage) = setup_storage().await;
    let company_id = Uuid::new_v4();

    let group = storage
        .insert_group(new_group(company_id, "rotation"))
        .await
        .unwrap();

    let a = storage
        .insert_number(new_number(company_id, group.id, "5511999990001"))
        .await
        .unwrap();
    let b = storage
        .insert_number(new_number(company_id, group.id, "5511999990002"))
        .await
        .unwrap();
    let c = storage
        .insert_number(new_number(company_id, group.id, "5511999990003"))
        .await
        .unwrap();

    // A 用过 10 分钟前，B 从未用过，C 用过 5 分钟前
    backdate_number(&storage, a.id, 10).await;
    backdate_number(&storage, c.id, 5).await;

    let first = storage.reserve_next(group.id).await.unwrap().unwrap();
    assert_eq!(first.id, b.id);

    // B 刚被认领，下一个是闲置最久的 A，然后是 C
    backdate_number(&storage, b.id, 1).await;
    let second = storage.reserve_next(group.id).await.unwrap().unwrap();
    assert_eq!(second.id, a.id);

    backdate_number(&storage, a.id, 0).await;
    let third = storage.reserve_next(group.id).await.unwrap().unwrap();
    assert_eq!(third.id, c.id);
}

#[tokio::test]
async fn test_rotation_skips_inactive_numbers() {
    let (_dir, storage) = setup_storage().await;
    let company_id = Uuid::new_v4();

    let group = storage
        .insert_group(new_group(company_id, "skip-inactive"))
        .await
        .unwrap();

    let inactive = storage
        .insert_number(NewNumber {
            is_active: false,
            ..new_number(company_id, group.id, "5511999990001")
        })
        .await
        .unwrap();
    let active = storage
        .insert_number(new_number(company_id, group.id, "5511999990002"))
        .await
        .unwrap();

    // 停用号码即使从未使用也不参与轮换
    for _ in 0..3 {
        let picked = storage.reserve_next(group.id).await.unwrap().unwrap();
        assert_eq!(picked.id, active.id);
        assert_ne!(picked.id, inactive.id);
    }
}

#[tokio::test]
async fn test_rotation_empty_pool_returns_none() {
    let (_dir, storage) = setup_storage().await;
    let company_id = Uuid::new_v4();

    let group = storage
        .insert_group(new_group(company_id, "empty"))
        .await
        .unwrap();

    assert!(storage.reserve_next(group.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_reserve_advances_cursor_atomically() {
    let (_dir, storage) = setup_storage().await;
    let company_id = Uuid::new_v4();

    let group = storage
        .insert_group(new_group(company_id, "cursor"))
        .await
        .unwrap();
    let number = storage
        .insert_number(new_number(company_id, group.id, "5511999990000"))
        .await
        .unwrap();
    assert!(number.last_used_at.is_none());

    let before = Utc::now();
    let claimed = storage.reserve_next(group.id).await.unwrap().unwrap();
    assert_eq!(claimed.id, number.id);

    // 认领即推进游标，选号和标记是同一次条件更新
    let reloaded = storage.get_number(number.id).await.unwrap().unwrap();
    let cursor = reloaded.last_used_at.expect("cursor should be set");
    assert!(cursor >= before - Duration::seconds(1));
}

#[tokio::test]
async fn test_concurrent_reservations_spread_across_pool() {
    let (_dir, storage) = setup_storage().await;
    let company_id = Uuid::new_v4();

    let group = storage
        .insert_group(new_group(company_id, "concurrent"))
        .await
        .unwrap();
    for i in 0..4 {
        storage
            .insert_number(new_number(
                company_id,
                group.id,
                &format!("551199999000{}", i),
            ))
            .await
            .unwrap();
    }

    let mut handles = Vec::new();
    for _ in 0..8 {
        let storage = Arc::clone(&storage);
        let group_id = group.id;
        handles.push(tokio::spawn(async move {
            storage.reserve_next(group_id).await
        }));
    }

    // 近似公平即可，但每次认领都必须成功返回一个号码
    for handle in handles {
        let number = handle.await.unwrap().unwrap();
        assert!(number.is_some());
    }
}

// =============================================================================
// Click sink
// =============================================================================

#[tokio::test]
async fn test_click_sink_batch_insert() {
    let (_dir, storage) = setup_storage().await;
    let company_id = Uuid::new_v4();
    let group_id = Uuid::new_v4();
    let number_id = Uuid::new_v4();

    let recorder = ClickRecorder::new(
        storage.as_click_sink(),
        StdDuration::from_secs(3600),
        1000,
    );

    for i in 0..5 {
        let mut record = ClickRecord::new(company_id, group_id, number_id);
        record.device_type = DeviceType::Mobile;
        record.utm_source = Some(format!("source-{}", i));
        recorder.record(record);
    }
    assert_eq!(recorder.buffer_size(), 5);

    recorder.flush().await;
    assert_eq!(recorder.buffer_size(), 0);

    let rows = click_event::Entity::find()
        .all(storage.get_db())
        .await
        .unwrap();
    assert_eq!(rows.len(), 5);
    assert!(rows.iter().all(|r| r.company_id == company_id));
    assert!(rows.iter().all(|r| r.device_type == "mobile"));
}
