//! Postgres store checks. Need a database:
//!
//! `TEST_DATABASE_URL=postgres://... cargo test --test pg_store_test -- --ignored`

use chrono::Utc;
use portal_service::{
    config::DatabaseConfig,
    db,
    models::{ActionKind, AuditLogEntry, Corporation, Identity, IdentityStatus, PermissionFlags},
    services::{
        store::{AuditLogQuery, Mutation},
        PgStore, PortalStore,
    },
};
use serde_json::json;
use service_core::error::AppError;
use uuid::Uuid;

async fn store() -> PgStore {
    let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set");
    let pool = db::create_pool(&DatabaseConfig {
        url,
        max_connections: 5,
        min_connections: 1,
    })
    .await
    .expect("Failed to connect");
    db::run_migrations(&pool).await.expect("Failed to migrate");
    PgStore::new(pool)
}

fn unique(prefix: &str) -> String {
    format!("{}{}", prefix, &Uuid::new_v4().simple().to_string()[..8])
}

fn audit(kind: ActionKind, marker: &str) -> AuditLogEntry {
    AuditLogEntry::new(
        Uuid::new_v4(),
        "Pg Test",
        &kind,
        json!({ "marker": marker }),
        "127.0.0.1",
    )
}

#[tokio::test]
#[ignore]
async fn commit_writes_mutation_and_audit_entry() {
    let store = store().await;
    let sigla = unique("T");
    let corporation = Corporation::new(sigla.clone(), "Teste".into(), PermissionFlags::new());

    store
        .commit(
            Mutation::InsertCorporation(corporation),
            audit(ActionKind::CreateCorporation, &sigla),
        )
        .await
        .unwrap();

    assert!(store.find_corporation_by_sigla(&sigla).await.unwrap().is_some());
    let page = store
        .query_audit_logs(&AuditLogQuery {
            page: 1,
            limit: 10,
            text: Some(sigla.clone()),
            action: Some("Create Corporation".into()),
            date: None,
        })
        .await
        .unwrap();
    assert_eq!(page.total, 1);
}

#[tokio::test]
#[ignore]
async fn failed_mutation_leaves_no_audit_entry() {
    let store = store().await;
    let sigla = unique("D");
    store
        .commit(
            Mutation::InsertCorporation(Corporation::new(
                sigla.clone(),
                "Primeira".into(),
                PermissionFlags::new(),
            )),
            audit(ActionKind::CreateCorporation, "first"),
        )
        .await
        .unwrap();

    let marker = unique("dup");
    let err = store
        .commit(
            Mutation::InsertCorporation(Corporation::new(
                sigla,
                "Duplicada".into(),
                PermissionFlags::new(),
            )),
            audit(ActionKind::CreateCorporation, &marker),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Conflict(_)));
    let page = store
        .query_audit_logs(&AuditLogQuery {
            page: 1,
            limit: 10,
            text: Some(marker),
            action: None,
            date: None,
        })
        .await
        .unwrap();
    assert_eq!(page.total, 0);
}

#[tokio::test]
#[ignore]
async fn stale_identity_update_is_a_conflict() {
    let store = store().await;
    let sigla = unique("S");
    store
        .commit(
            Mutation::InsertCorporation(Corporation::new(
                sigla.clone(),
                "Stale".into(),
                PermissionFlags::new(),
            )),
            audit(ActionKind::CreateCorporation, &sigla),
        )
        .await
        .unwrap();

    let recruit = Identity::new_recruit(
        "Recruta".into(),
        format!("{}@example.com", unique("r")),
        unique("P"),
        "hash".into(),
        sigla,
    );
    store.insert_identity(&recruit).await.unwrap();
    // Postgres keeps microseconds; compare against the stored row
    let recruit = store
        .find_identity_by_id(recruit.identity_id)
        .await
        .unwrap()
        .unwrap();

    let mut approved = recruit.clone();
    approved.set_status(IdentityStatus::Aprovado);
    approved.updated_utc = Utc::now();
    store
        .commit(
            Mutation::UpdateIdentity {
                previous_updated_utc: recruit.updated_utc,
                identity: approved.clone(),
            },
            audit(ActionKind::ApproveRecruit, "approve"),
        )
        .await
        .unwrap();

    let mut rejected = recruit.clone();
    rejected.set_status(IdentityStatus::Reprovado);
    let err = store
        .commit(
            Mutation::UpdateIdentity {
                previous_updated_utc: recruit.updated_utc,
                identity: rejected,
            },
            audit(ActionKind::RejectRecruit, "reject"),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Conflict(_)));
    let stored = store
        .find_identity_by_id(recruit.identity_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status(), IdentityStatus::Aprovado);
}
