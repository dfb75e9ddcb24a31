use bms_storage::{
    ChillerStore, ChillerUpdate, InMemoryStore, NewChiller, NewTimer, TimerStore, UserRecord,
    UserStore,
};
use chrono::{Duration, Utc};
use domain::{PowerAction, Role};

fn new_timer(ip: &str, minutes: i64) -> NewTimer {
    NewTimer {
        chiller_name: "CH-1".to_string(),
        chiller_ip: ip.to_string(),
        mode: PowerAction::On,
        hours: 1.0,
        target_at: Utc::now() + Duration::minutes(minutes),
    }
}

#[tokio::test]
async fn soft_deleted_chiller_stays_queryable() {
    let store = InMemoryStore::new();
    let chiller = store
        .create_chiller(NewChiller {
            name: "CH-1".to_string(),
            ip: "10.0.0.5".to_string(),
            active: true,
        })
        .await
        .expect("create");

    let removed = store
        .deactivate_chiller(&chiller.id)
        .await
        .expect("deactivate")
        .expect("exists");
    assert!(!removed.active);

    assert!(store.list_chillers(false).await.expect("list").is_empty());
    assert_eq!(store.list_chillers(true).await.expect("list").len(), 1);
    let found = store
        .find_chiller(&chiller.id)
        .await
        .expect("find")
        .expect("still there");
    assert_eq!(found.name, "CH-1");
}

#[tokio::test]
async fn partial_update_keeps_other_fields() {
    let store = InMemoryStore::new();
    let chiller = store
        .create_chiller(NewChiller {
            name: "CH-1".to_string(),
            ip: "10.0.0.5".to_string(),
            active: true,
        })
        .await
        .expect("create");

    let updated = store
        .update_chiller(
            &chiller.id,
            ChillerUpdate {
                ip: Some("10.0.0.9".to_string()),
                ..ChillerUpdate::default()
            },
        )
        .await
        .expect("update")
        .expect("exists");
    assert_eq!(updated.name, "CH-1");
    assert_eq!(updated.ip, "10.0.0.9");

    let missing = store
        .update_chiller("nope", ChillerUpdate::default())
        .await
        .expect("update");
    assert!(missing.is_none());
}

#[tokio::test]
async fn latest_active_timer_wins() {
    let store = InMemoryStore::new();
    store.create_timer(new_timer("10.0.0.5", 10)).await.expect("first");
    let second = store.create_timer(new_timer("10.0.0.5", 20)).await.expect("second");
    store.create_timer(new_timer("10.0.0.6", 5)).await.expect("other ip");

    let active = store
        .find_active_timer("10.0.0.5")
        .await
        .expect("find")
        .expect("active");
    assert_eq!(active.id, second.id);

    let cancelled = store
        .deactivate_timers_for_ip("10.0.0.5")
        .await
        .expect("cancel");
    assert_eq!(cancelled, 2);
    assert!(store.find_active_timer("10.0.0.5").await.expect("find").is_none());
    assert!(store.find_active_timer("10.0.0.6").await.expect("find").is_some());
}

#[tokio::test]
async fn due_timers_only_include_past_targets() {
    let store = InMemoryStore::new();
    let due = store.create_timer(new_timer("10.0.0.5", -1)).await.expect("due");
    store.create_timer(new_timer("10.0.0.6", 30)).await.expect("future");

    let items = store.list_due_timers(Utc::now()).await.expect("due");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, due.id);

    assert!(store.claim_timer(&due.id).await.expect("claim"));
    assert!(!store.claim_timer(&due.id).await.expect("claim again"));
}

#[tokio::test]
async fn user_password_hash_is_replaced() {
    let store = InMemoryStore::new();
    store
        .upsert_user(UserRecord {
            username: "ops".to_string(),
            password_hash: "legacy".to_string(),
            role: Role::Manager,
        })
        .await
        .expect("upsert");

    assert!(store.update_password_hash("ops", "$argon2id$new").await.expect("update"));
    assert!(!store.update_password_hash("ghost", "x").await.expect("update"));

    let user = store
        .find_by_username("ops")
        .await
        .expect("find")
        .expect("user");
    assert_eq!(user.password_hash, "$argon2id$new");
    assert_eq!(user.role, Role::Manager);
}
