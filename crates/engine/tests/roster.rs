use sea_orm::{Database, DatabaseConnection};

use engine::{Candidate, ChangeKind, Engine, FeedRow};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

fn row(username: &str, user_id: i64, active: bool) -> FeedRow {
    FeedRow {
        username: username.to_string(),
        user_id,
        active,
    }
}

#[tokio::test]
async fn first_sight_inserts_and_becomes_candidate() {
    let (engine, _db) = engine_with_db().await;

    let (candidates, changes) = engine.synchronize(&[row("Alice", 1001, true)]).await.unwrap();

    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].user_id, 1001);
    assert_eq!(changes[0].kind, ChangeKind::Inserted);
    assert_eq!(
        candidates,
        vec![Candidate {
            username: "Alice".to_string(),
            user_id: 1001,
        }]
    );

    let entry = engine.entry(1001).await.unwrap().unwrap();
    assert_eq!(entry.username, "Alice");
    assert_eq!(entry.channel_id, None);
    assert!(!entry.open);
    assert!(entry.active);
}

#[tokio::test]
async fn replaying_the_same_feed_is_idempotent() {
    let (engine, _db) = engine_with_db().await;
    let feed = [row("Alice", 1001, true), row("Bob", 2002, false)];

    let (_, first) = engine.synchronize(&feed).await.unwrap();
    assert_eq!(first.len(), 2);

    let before = engine.entry(1001).await.unwrap();
    let (candidates, second) = engine.synchronize(&feed).await.unwrap();

    assert!(second.is_empty());
    assert_eq!(engine.entry(1001).await.unwrap(), before);
    // Bob is inactive, so Alice is still the only candidate.
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].user_id, 1001);
}

#[tokio::test]
async fn update_touches_only_username_and_active() {
    let (engine, _db) = engine_with_db().await;

    engine.synchronize(&[row("Bob", 2002, true)]).await.unwrap();
    engine.link_channel(2002, 55).await.unwrap();

    let (candidates, changes) = engine.synchronize(&[row("Bob", 2002, false)]).await.unwrap();

    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].kind, ChangeKind::Updated);

    let entry = engine.entry(2002).await.unwrap().unwrap();
    assert_eq!(entry.channel_id, Some(55));
    assert!(!entry.open);
    assert!(!entry.active);
    // Channel already present, so Bob never re-enters the candidate set.
    assert!(candidates.is_empty());
}

#[tokio::test]
async fn candidates_cover_the_full_table_not_just_the_batch() {
    let (engine, _db) = engine_with_db().await;

    engine.synchronize(&[row("Alice", 1001, true)]).await.unwrap();

    // A later batch that never mentions Alice still reports her.
    let (candidates, changes) = engine.synchronize(&[row("Carol", 3003, true)]).await.unwrap();

    assert_eq!(changes.len(), 1);
    let ids: Vec<i64> = candidates.iter().map(|c| c.user_id).collect();
    assert!(ids.contains(&1001));
    assert!(ids.contains(&3003));
}

#[tokio::test]
async fn linkage_survives_every_later_synchronization() {
    let (engine, _db) = engine_with_db().await;

    engine.synchronize(&[row("Alice", 1001, true)]).await.unwrap();
    engine.link_channel(1001, 77).await.unwrap();

    engine.synchronize(&[row("Alice2", 1001, false)]).await.unwrap();
    engine.synchronize(&[row("Alice2", 1001, true)]).await.unwrap();

    let entry = engine.entry(1001).await.unwrap().unwrap();
    assert_eq!(entry.channel_id, Some(77));
    assert_eq!(entry.username, "Alice2");
}

#[tokio::test]
async fn duplicate_ids_in_one_batch_keep_user_id_unique() {
    let (engine, _db) = engine_with_db().await;

    let (_, changes) = engine
        .synchronize(&[row("Alice", 1001, true), row("Alice A.", 1001, true)])
        .await
        .unwrap();

    assert_eq!(changes.len(), 2);
    assert_eq!(changes[0].kind, ChangeKind::Inserted);
    assert_eq!(changes[1].kind, ChangeKind::Updated);

    let entry = engine.entry(1001).await.unwrap().unwrap();
    assert_eq!(entry.username, "Alice A.");
}

#[tokio::test]
async fn open_flag_flips_without_touching_the_rest() {
    let (engine, _db) = engine_with_db().await;

    engine.synchronize(&[row("Alice", 1001, true)]).await.unwrap();
    engine.link_channel(1001, 77).await.unwrap();

    engine.set_open(1001, true).await.unwrap();
    let entry = engine.entry(1001).await.unwrap().unwrap();
    assert!(entry.open);
    assert_eq!(entry.channel_id, Some(77));

    engine.set_open(1001, false).await.unwrap();
    assert!(!engine.entry(1001).await.unwrap().unwrap().open);
}

#[tokio::test]
async fn lookups_work_in_both_directions() {
    let (engine, _db) = engine_with_db().await;

    engine.synchronize(&[row("Alice", 1001, true)]).await.unwrap();
    engine.link_channel(1001, 77).await.unwrap();

    assert_eq!(engine.channel_for(1001).await.unwrap(), Some(77));
    assert_eq!(engine.channel_for(9999).await.unwrap(), None);

    let owner: engine::RosterEntry = engine.entry_by_channel(77).await.unwrap().unwrap();
    assert_eq!(owner.user_id, 1001);
    assert!(engine.entry_by_channel(78).await.unwrap().is_none());

    let linked = engine.linked_entries().await.unwrap();
    assert_eq!(linked.len(), 1);
    assert_eq!(linked[0].user_id, 1001);
}

#[tokio::test]
async fn linking_an_unknown_identity_fails() {
    let (engine, _db) = engine_with_db().await;

    let err = engine.link_channel(4242, 1).await.unwrap_err();
    assert_eq!(err, engine::EngineError::KeyNotFound("user 4242".to_string()));
}
