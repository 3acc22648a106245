//! Session ↔ repository round trips against the in-memory backend.

use pretty_assertions::assert_eq;
use std::time::Duration;
use tf_core::{
    CanvasConfig, Entity, EntityDraft, EntityId, EntityPatch, EntityStore, EntityType, GapKind,
    ZoneId,
};
use tf_editor::persistence::{
    EntityRepository, IdMap, Latency, MockBackend, PersistenceError, TipRepository, flush_writes,
    load_session,
};
use tf_editor::CanvasSession;
use tf_editor::{Level, TipTrigger};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn seeded_backend() -> MockBackend {
    init_logger();
    let entities: Vec<Entity> =
        serde_json::from_str(include_str!("fixtures/structure.json")).unwrap();
    let store = EntityStore::from_entities(entities).unwrap();
    MockBackend::seeded(store, Vec::new()).with_latency(Latency::ZERO)
}

#[tokio::test]
async fn load_falls_back_to_builtin_tips() {
    let repo = seeded_backend();
    let session = load_session(&repo, CanvasConfig::default()).await.unwrap();
    assert_eq!(session.store().len(), 2);
    assert!(
        session
            .tips()
            .first_for(TipTrigger::Zone(ZoneId::Foundation))
            .is_some()
    );
}

#[tokio::test]
async fn flushed_writes_reach_the_backend_in_order() {
    let repo = seeded_backend();
    let mut session = load_session(&repo, CanvasConfig::default()).await.unwrap();

    let trust = session.create_from_template("revocable-living-trust").unwrap();
    assert!(session.connect(trust.id, EntityId(2)));
    session.tick(Duration::from_secs(2));
    assert!(session.gaps().is_empty());

    let failures = flush_writes(&repo, &mut IdMap::new(), session.take_writes()).await;
    assert!(failures.is_empty());

    let stored = repo.get_by_id(EntityId(3)).await.unwrap();
    assert_eq!(stored.name, "Revocable Living Trust");
    assert_eq!(stored.connections.to_vec(), vec![EntityId(2)]);
}

#[tokio::test]
async fn gap_findings_are_recorded_as_tips() {
    let repo = seeded_backend();
    let mut session = load_session(&repo, CanvasConfig::default()).await.unwrap();
    session.tick(Duration::from_secs(1));
    assert_eq!(session.gaps()[0].kind, GapKind::ExposedAsset);

    let failures = flush_writes(&repo, &mut IdMap::new(), session.take_writes()).await;
    assert!(failures.is_empty());
    let recorded = repo
        .get_tips_by_trigger(TipTrigger::Gap(GapKind::ExposedAsset))
        .await
        .unwrap();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].message, session.gaps()[0].message);
}

#[tokio::test]
async fn offline_flush_notifies_without_rollback() {
    let repo = seeded_backend();
    let mut session = load_session(&repo, CanvasConfig::default()).await.unwrap();
    session.take_notifications();

    let patch = EntityPatch {
        name: Some("Renamed Holdings".into()),
        ..EntityPatch::default()
    };
    assert!(session.update_entity(EntityId(2), patch).is_some());
    repo.set_offline(true);
    let failures = flush_writes(&repo, &mut IdMap::new(), session.take_writes()).await;
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].level, Level::Error);
    assert!(
        failures[0]
            .message
            .contains(&PersistenceError::Unavailable.to_string())
    );

    // The local edit stands; the backend never saw it.
    assert_eq!(
        session.store().get(EntityId(2)).unwrap().name,
        "Renamed Holdings"
    );
    repo.set_offline(false);
    assert_eq!(
        repo.get_by_id(EntityId(2)).await.unwrap().name,
        "Holdings LLC"
    );
}

#[tokio::test]
async fn failed_load_can_be_retried() {
    let repo = seeded_backend();
    repo.set_offline(true);
    let err = load_session(&repo, CanvasConfig::default())
        .await
        .err()
        .unwrap();
    assert!(matches!(err, PersistenceError::LoadFailure(_)));

    repo.set_offline(false);
    let session = load_session(&repo, CanvasConfig::default()).await.unwrap();
    assert_eq!(session.store().len(), 2);
}

#[tokio::test]
async fn deleting_a_missing_record_is_reported() {
    let repo = seeded_backend();
    repo.delete(EntityId(1)).await.unwrap();
    let mut session = load_session(&repo, CanvasConfig::default()).await.unwrap();
    assert_eq!(session.store().len(), 1);

    // A second client already removed the LLC.
    repo.delete(EntityId(2)).await.unwrap();
    assert!(session.request_delete(EntityId(2)));
    session.confirm_delete().unwrap();
    let failures = flush_writes(&repo, &mut IdMap::new(), session.take_writes()).await;
    assert_eq!(failures.len(), 1);
    assert!(repo.get_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn edits_to_an_unsaved_entity_never_reach_another_record() {
    let repo = seeded_backend();
    let mut session = load_session(&repo, CanvasConfig::default()).await.unwrap();
    let mut ids = IdMap::new();

    let trust = session.create_from_template("revocable-living-trust").unwrap();
    assert_eq!(trust.id, EntityId(3));
    repo.set_offline(true);
    let failures = flush_writes(&repo, &mut ids, session.take_writes()).await;
    assert_eq!(failures.len(), 1);
    repo.set_offline(false);

    // The backend hands #3 to the LLC, which is #4 locally.
    let llc = session
        .create_entity(EntityDraft::new("Rental LLC", EntityType::Llc))
        .unwrap();
    let rename = EntityPatch {
        name: Some("Family Trust".into()),
        ..EntityPatch::default()
    };
    assert!(session.update_entity(trust.id, rename).is_some());
    let failures = flush_writes(&repo, &mut ids, session.take_writes()).await;

    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].level, Level::Error);
    assert!(failures[0].message.contains(&trust.id.to_string()));
    assert_eq!(ids.resolve(llc.id), Some(EntityId(3)));
    assert_eq!(ids.resolve(trust.id), None);
    assert_eq!(repo.get_by_id(EntityId(3)).await.unwrap().name, "Rental LLC");
    assert_eq!(repo.get_all().await.unwrap().len(), 3);
}

#[tokio::test]
async fn connections_follow_backend_assigned_ids() {
    init_logger();
    let repo = MockBackend::new().with_latency(Latency::ZERO);
    repo.create(EntityDraft::new("Elsewhere LLC", EntityType::Llc))
        .await
        .unwrap();

    let mut session = CanvasSession::new(CanvasConfig::default());
    let trust = session
        .create_entity(EntityDraft::new("Family Trust", EntityType::Trust))
        .unwrap();
    let llc = session
        .create_entity(EntityDraft::new("Rental LLC", EntityType::Llc))
        .unwrap();
    assert!(session.connect(trust.id, llc.id));

    let mut ids = IdMap::new();
    let failures = flush_writes(&repo, &mut ids, session.take_writes()).await;
    assert!(failures.is_empty());

    let stored_trust = repo.get_by_id(EntityId(2)).await.unwrap();
    assert_eq!(stored_trust.name, "Family Trust");
    assert_eq!(stored_trust.connections.to_vec(), vec![EntityId(3)]);
    assert_eq!(repo.get_by_id(EntityId(3)).await.unwrap().name, "Rental LLC");
}
