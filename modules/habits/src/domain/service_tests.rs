use std::sync::Arc;

use query_core::{OrderBy, OrderKey, PageRequest};

use super::*;
use crate::contract::model::{Frequency, FrequencyType, HabitType, Target};
use crate::infra::storage::InMemoryStore;

fn service() -> Service {
    let store = Arc::new(InMemoryStore::new());
    Service::new(store.clone(), store, ServiceConfig::default())
}

fn new_habit(name: &str) -> NewHabit {
    NewHabit {
        name: name.into(),
        description: Some("desc".into()),
        habit_type: HabitType::Binary,
        frequency: Frequency {
            frequency_type: FrequencyType::Daily,
            times_per_period: 1,
        },
        target: Target {
            value: 1,
            unit: "times".into(),
        },
        end_date: None,
        milestone: None,
    }
}

fn new_tag(name: &str) -> NewTag {
    NewTag {
        name: name.into(),
        description: None,
    }
}

#[tokio::test]
async fn create_assigns_prefixed_v7_ids_and_ongoing_status() {
    let svc = service();
    let habit = svc.create_habit(new_habit("Read")).await.unwrap();
    assert!(habit.id.starts_with("h_"));
    assert!(Uuid::parse_str(&habit.id[2..]).is_ok());
    assert_eq!(habit.status, HabitStatus::Ongoing);
    assert!(habit.updated_at_utc.is_none());

    let tag = svc.create_tag(new_tag("health")).await.unwrap();
    assert!(tag.id.starts_with("t_"));
}

#[tokio::test]
async fn name_rules_are_enforced() {
    let svc = service();
    let err = svc.create_habit(new_habit("   ")).await.unwrap_err();
    assert!(matches!(err, DomainError::Validation { ref field, .. } if field == "name"));

    let err = svc.create_habit(new_habit(&"x".repeat(101))).await.unwrap_err();
    assert!(matches!(err, DomainError::Validation { .. }));

    let mut h = new_habit("Read");
    h.target.unit = String::new();
    assert!(svc.create_habit(h).await.is_err());
}

#[tokio::test]
async fn pages_are_counted_and_sliced() {
    let svc = service();
    for i in 0..23 {
        svc.create_habit(new_habit(&format!("habit {i:02}"))).await.unwrap();
    }
    let order = OrderBy(vec![OrderKey::asc("name")]);
    let page = svc
        .list_habits_page(&HabitFilter::default(), &order, PageRequest::new(2, 10))
        .await
        .unwrap();
    assert_eq!(page.items().len(), 10);
    assert_eq!(page.total_count(), 23);
    assert!(page.has_next_page());
    assert!(page.has_previous_page());
    assert_eq!(page.items()[0].name, "habit 10");

    let last = svc
        .list_habits_page(&HabitFilter::default(), &order, PageRequest::new(3, 10))
        .await
        .unwrap();
    assert_eq!(last.items().len(), 3);
    assert!(!last.has_next_page());
}

#[tokio::test]
async fn storage_errors_surface_as_storage() {
    let svc = service();
    svc.create_habit(new_habit("Read")).await.unwrap();
    let err = svc
        .list_habits_page(
            &HabitFilter::default(),
            &OrderBy(vec![OrderKey::asc("nope")]),
            PageRequest::new(1, 10),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Storage { .. }));
}

#[tokio::test]
async fn patch_touches_only_name_and_description() {
    let svc = service();
    let habit = svc.create_habit(new_habit("Read")).await.unwrap();

    svc.patch_habit(
        &habit.id,
        HabitPatch {
            name: None,
            description: Some(None),
        },
    )
    .await
    .unwrap();

    let patched = svc.get_habit(&habit.id).await.unwrap();
    assert_eq!(patched.name, "Read");
    assert!(patched.description.is_none());
    assert!(patched.updated_at_utc.is_some());
    assert_eq!(patched.target, habit.target);
}

#[tokio::test]
async fn missing_habits_are_not_found() {
    let svc = service();
    assert!(matches!(
        svc.get_habit("h_missing").await,
        Err(DomainError::HabitNotFound { .. })
    ));
    assert!(matches!(
        svc.update_habit("h_missing", new_habit("x")).await,
        Err(DomainError::HabitNotFound { .. })
    ));
    assert!(matches!(
        svc.delete_habit("h_missing").await,
        Err(DomainError::HabitNotFound { .. })
    ));
}

#[tokio::test]
async fn tag_names_are_unique() {
    let svc = service();
    let health = svc.create_tag(new_tag("health")).await.unwrap();
    let work = svc.create_tag(new_tag("work")).await.unwrap();

    assert!(matches!(
        svc.create_tag(new_tag("health")).await,
        Err(DomainError::TagNameConflict { .. })
    ));
    assert!(matches!(
        svc.update_tag(&work.id, new_tag("health")).await,
        Err(DomainError::TagNameConflict { .. })
    ));
    // Renaming to its own name is fine.
    svc.update_tag(&health.id, new_tag("health")).await.unwrap();
}

#[tokio::test]
async fn habit_tags_are_replaced_and_resolved_to_names() {
    let svc = service();
    let habit = svc.create_habit(new_habit("Run")).await.unwrap();
    let health = svc.create_tag(new_tag("health")).await.unwrap();
    let outdoor = svc.create_tag(new_tag("outdoor")).await.unwrap();

    svc.upsert_habit_tags(
        &habit.id,
        vec![outdoor.id.clone(), health.id.clone(), outdoor.id.clone()],
    )
    .await
    .unwrap();
    let with_tags = svc.get_habit_with_tags(&habit.id).await.unwrap();
    assert_eq!(with_tags.tags, ["outdoor", "health"]);

    let err = svc
        .upsert_habit_tags(&habit.id, vec![health.id.clone(), "t_nope".into()])
        .await
        .unwrap_err();
    assert_eq!(
        err,
        DomainError::UnknownTags {
            ids: vec!["t_nope".into()]
        }
    );

    svc.delete_tag(&health.id).await.unwrap();
    let with_tags = svc.get_habit_with_tags(&habit.id).await.unwrap();
    assert_eq!(with_tags.tags, ["outdoor"]);
}
