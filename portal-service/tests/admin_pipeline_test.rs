//! RH and staff actions over HTTP: each committed change writes one audit entry.

mod common;

use axum::http::{Method, StatusCode};
use common::{TestApp, TEST_ADMIN_API_KEY};
use portal_service::models::{Capability, IdentityStatus};
use serde_json::json;

#[tokio::test]
async fn approving_a_recruit_assigns_rank_and_division() {
    let app = TestApp::spawn().await;
    app.seed_corporation_with_ranks("PM");
    let chefe = app.seed_officer("Chefe", "PM", Some("Sargento"), &[Capability::IsRh]);
    let novato = app.seed_recruit("Novato", "PM");
    let token = app.token_for(&chefe);

    let (status, body) = app
        .put(
            &format!("/api/admin/recrutas/{}", novato.identity_id),
            Some(&token),
            json!({ "novoStatus": "aprovado", "patente": "Soldado", "divisao": "Patrulha" }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "aprovado");
    assert_eq!(body["patente"], "Soldado");
    assert_eq!(body["divisao"], "Patrulha");

    let entries = app.store.audit_entries().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, "Approve Recruit");
    assert_eq!(entries[0].actor_id, chefe.identity_id);
    assert_eq!(entries[0].source_ip, "203.0.113.7");
}

#[tokio::test]
async fn unknown_rank_rejects_the_approval() {
    let app = TestApp::spawn().await;
    app.seed_corporation_with_ranks("PM");
    let chefe = app.seed_officer("Chefe", "PM", Some("Sargento"), &[Capability::IsRh]);
    let novato = app.seed_recruit("Novato", "PM");

    let (status, _) = app
        .put(
            &format!("/api/admin/recrutas/{}", novato.identity_id),
            Some(&app.token_for(&chefe)),
            json!({ "novoStatus": "aprovado", "patente": "Coronel" }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.audit_count(), 0);
    let stored = app.stored_identity(novato.identity_id).await;
    assert_eq!(stored.status(), IdentityStatus::Pendente);
}

#[tokio::test]
async fn repeated_rejection_is_a_no_op() {
    let app = TestApp::spawn().await;
    app.seed_corporation_with_ranks("PM");
    let chefe = app.seed_officer("Chefe", "PM", Some("Sargento"), &[Capability::IsRh]);
    let novato = app.seed_recruit("Novato", "PM");
    let token = app.token_for(&chefe);
    let uri = format!("/api/admin/recrutas/{}", novato.identity_id);

    let (status, _) = app
        .put(&uri, Some(&token), json!({ "novoStatus": "reprovado" }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .put(&uri, Some(&token), json!({ "novoStatus": "reprovado" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "reprovado");
    assert_eq!(app.audit_count(), 1);

    // A rejected recruit is final
    let (status, _) = app
        .put(&uri, Some(&token), json!({ "novoStatus": "aprovado" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn promotion_and_demotion_follow_rank_levels() {
    let app = TestApp::spawn().await;
    app.seed_corporation_with_ranks("PM");
    let chefe = app.seed_officer("Chefe", "PM", Some("Sargento"), &[Capability::IsRh]);
    let silva = app.seed_officer("Silva", "PM", Some("Soldado"), &[]);
    let token = app.token_for(&chefe);

    let (status, body) = app
        .put(
            "/api/admin/gerenciar-policial",
            Some(&token),
            json!({ "policialId": silva.identity_id, "acao": "promover", "novaPatente": "Cabo" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["patente"], "Cabo");

    let (status, _) = app
        .put(
            "/api/admin/gerenciar-policial",
            Some(&token),
            json!({ "policialId": silva.identity_id, "acao": "rebaixar", "novaPatente": "Sargento" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .put(
            "/api/admin/gerenciar-policial",
            Some(&token),
            json!({ "policialId": silva.identity_id, "acao": "rebaixar", "novaPatente": "Soldado" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["patente"], "Soldado");
    assert_eq!(app.audit_count(), 2);
}

#[tokio::test]
async fn unknown_career_action_is_a_bad_request() {
    let app = TestApp::spawn().await;
    app.seed_corporation_with_ranks("PM");
    let chefe = app.seed_officer("Chefe", "PM", Some("Sargento"), &[Capability::IsRh]);
    let silva = app.seed_officer("Silva", "PM", Some("Soldado"), &[]);

    let (status, _) = app
        .put(
            "/api/admin/gerenciar-policial",
            Some(&app.token_for(&chefe)),
            json!({ "policialId": silva.identity_id, "acao": "exonerar" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.audit_count(), 0);
}

#[tokio::test]
async fn rh_cannot_manage_a_staff_officer_of_its_own_corporation() {
    let app = TestApp::spawn().await;
    app.seed_corporation_with_ranks("PM");
    let chefe = app.seed_officer("Chefe", "PM", Some("Sargento"), &[Capability::IsRh]);
    let dev = app.seed_officer("Dev", "PM", Some("Cabo"), &[Capability::IsDev]);
    let dismiss = json!({ "policialId": dev.identity_id, "acao": "demitir" });
    let demote = json!({
        "policialId": dev.identity_id,
        "acao": "rebaixar",
        "novaPatente": "Soldado"
    });

    for body in [dismiss.clone(), demote] {
        let (status, _) = app
            .put("/api/admin/gerenciar-policial", Some(&app.token_for(&chefe)), body)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
    assert_eq!(app.audit_count(), 0);
    assert_eq!(
        app.stored_identity(dev.identity_id).await.status(),
        IdentityStatus::Aprovado
    );

    let staff = app.seed_staff("Admin");
    let (status, body) = app
        .put("/api/admin/gerenciar-policial", Some(&app.token_for(&staff)), dismiss)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "reprovado");
    assert_eq!(app.audit_count(), 1);
}

#[tokio::test]
async fn dismissal_is_terminal_and_repeat_dismissal_is_a_no_op() {
    let app = TestApp::spawn().await;
    app.seed_corporation_with_ranks("PM");
    let chefe = app.seed_officer("Chefe", "PM", Some("Sargento"), &[Capability::IsRh]);
    let silva = app.seed_officer("Silva", "PM", Some("Soldado"), &[]);
    let token = app.token_for(&chefe);
    let dismiss = json!({ "policialId": silva.identity_id, "acao": "demitir" });

    let (status, body) = app
        .put("/api/admin/gerenciar-policial", Some(&token), dismiss.clone())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "reprovado");

    let (status, _) = app
        .put("/api/admin/gerenciar-policial", Some(&token), dismiss)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.audit_count(), 1);

    let (status, _) = app
        .put(
            "/api/admin/gerenciar-policial",
            Some(&token),
            json!({ "policialId": silva.identity_id, "acao": "promover", "novaPatente": "Cabo" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Dismissed officers drop out of the personnel list
    let (_, body) = app.get("/api/admin/policiais", Some(&token)).await;
    assert!(body
        .as_array()
        .unwrap()
        .iter()
        .all(|p| p["nome"] != "Silva"));
}

#[tokio::test]
async fn rh_cannot_manage_own_career() {
    let app = TestApp::spawn().await;
    app.seed_corporation_with_ranks("PM");
    let chefe = app.seed_officer("Chefe", "PM", Some("Cabo"), &[Capability::IsRh]);

    let (status, _) = app
        .put(
            "/api/admin/gerenciar-policial",
            Some(&app.token_for(&chefe)),
            json!({ "policialId": chefe.identity_id, "acao": "promover", "novaPatente": "Sargento" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn transfer_requires_global_scope() {
    let app = TestApp::spawn().await;
    app.seed_corporation_with_ranks("PM");
    app.seed_corporation_with_ranks("PC");
    let chefe = app.seed_officer("Chefe", "PM", Some("Sargento"), &[Capability::IsRh]);
    let staff = app.seed_staff("Admin");
    let silva = app.seed_officer("Silva", "PM", Some("Cabo"), &[]);
    let transfer = json!({
        "policialId": silva.identity_id,
        "acao": "transferir",
        "novaPatente": "Soldado",
        "novaCorporacao": "PC"
    });

    let (status, _) = app
        .put(
            "/api/admin/gerenciar-policial",
            Some(&app.token_for(&chefe)),
            transfer.clone(),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .put(
            "/api/admin/gerenciar-policial",
            Some(&app.token_for(&staff)),
            transfer,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["corporacao"], "PC");
    assert_eq!(body["patente"], "Soldado");
}

#[tokio::test]
async fn concurso_lifecycle() {
    let app = TestApp::spawn().await;
    app.seed_corporation_with_ranks("PM");
    let chefe = app.seed_officer("Chefe", "PM", Some("Sargento"), &[Capability::IsRh]);
    let token = app.token_for(&chefe);

    let (status, body) = app
        .post(
            "/api/admin/concursos",
            Some(&token),
            json!({ "titulo": "Soldado 2026", "descricao": "Vagas abertas", "corporacao": "PM", "vagas": 10 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["concurso_id"].as_str().unwrap().to_string();

    let (_, open) = app.get("/api/concursos", None).await;
    assert_eq!(open.as_array().unwrap().len(), 1);

    let (status, body) = app
        .put(
            &format!("/api/admin/concursos/{}", id),
            Some(&token),
            json!({ "aberto": false }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["concurso_id"], id);

    let (_, open) = app.get("/api/concursos", None).await;
    assert!(open.as_array().unwrap().is_empty());

    let (status, _) = app
        .request(
            Method::DELETE,
            &format!("/api/admin/concursos/{}", id),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .request(
            Method::DELETE,
            &format!("/api/admin/concursos/{}", id),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(app.audit_count(), 3);
}

#[tokio::test]
async fn rh_cannot_publish_for_another_corporation() {
    let app = TestApp::spawn().await;
    app.seed_corporation_with_ranks("PM");
    app.seed_corporation_with_ranks("PC");
    let chefe = app.seed_officer("Chefe", "PM", Some("Sargento"), &[Capability::IsRh]);
    let token = app.token_for(&chefe);

    let (status, _) = app
        .post(
            "/api/admin/anuncios",
            Some(&token),
            json!({ "titulo": "Aviso", "conteudo": "Texto", "corporacao": "PC" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .post(
            "/api/admin/anuncios",
            Some(&token),
            json!({ "titulo": "Aviso", "conteudo": "Texto", "corporacao": "PM" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, listed) = app.get("/api/policia/anuncios", Some(&token)).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let outsider = app.seed_officer("Outro", "PC", Some("Sargento"), &[]);
    let (_, listed) = app
        .get("/api/policia/anuncios", Some(&app.token_for(&outsider)))
        .await;
    assert!(listed.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn anonymous_listing_only_shows_general_announcements() {
    let app = TestApp::spawn().await;
    app.seed_corporation_with_ranks("PM");
    let staff = app.seed_staff("Admin");
    let token = app.token_for(&staff);

    for corporacao in [json!(null), json!("PM")] {
        let (status, _) = app
            .post(
                "/api/admin/anuncios",
                Some(&token),
                json!({ "titulo": "Aviso", "conteudo": "Texto", "corporacao": corporacao }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, listed) = app.get("/api/anuncios", None).await;
    assert_eq!(status, StatusCode::OK);
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert!(listed[0]["corporation"].is_null());

    let (status, _) = app.get("/api/policia/anuncios", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, listed) = app.get("/api/policia/anuncios", Some(&token)).await;
    assert_eq!(listed.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn staff_builds_a_corporation_hierarchy() {
    let app = TestApp::spawn().await;
    let staff = app.seed_staff("Admin");
    let token = app.token_for(&staff);

    let (status, body) = app
        .post(
            "/api/staff/corporacoes",
            Some(&token),
            json!({ "sigla": "PRF", "nome": "Polícia Rodoviária Federal" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["id"].as_str().unwrap().to_string();

    let (status, _) = app
        .post(
            "/api/staff/corporacoes",
            Some(&token),
            json!({ "sigla": "PRF", "nome": "Duplicada" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .post(
            &format!("/api/staff/corporacoes/{}/patentes", id),
            Some(&token),
            json!({ "nome": "Agente", "nivel": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .post(
            &format!("/api/staff/corporacoes/{}/divisoes", id),
            Some(&token),
            json!({ "nome": "Motopatrulha" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .put(
            &format!("/api/staff/corporacoes/{}/permissions", id),
            Some(&token),
            json!({ "permissoes": { "podeAssumirBO": true } }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["permissoes"]["podeAssumirBO"], true);
    assert_eq!(body["patentes"][0]["name"], "Agente");

    let (status, body) = app.get("/api/staff/corporacoes", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(app.audit_count(), 4);
}

#[tokio::test]
async fn boletim_is_filed_then_assumed_once() {
    let app = TestApp::spawn().await;
    app.seed_corporation_with_ranks("PM");
    let maria = app.seed_civil("Maria");
    let silva = app.seed_officer("Silva", "PM", Some("Soldado"), &[Capability::PodeAssumirBo]);
    let souza = app.seed_officer("Souza", "PM", Some("Soldado"), &[Capability::PodeAssumirBo]);

    let (status, body) = app
        .post(
            "/api/boletins",
            Some(&app.token_for(&maria)),
            json!({ "tipo": "Furto", "descricao": "Celular levado", "local": "Praça da Sé" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["boletim_id"].as_str().unwrap().to_string();
    let uri = format!("/api/policia/boletins/{}/assumir", id);

    // Citizens cannot see the queue
    let (status, _) = app
        .get("/api/policia/boletins", Some(&app.token_for(&maria)))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .get("/api/policia/boletins?status=aberto", Some(&app.token_for(&silva)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = app
        .request(Method::PUT, &uri, Some(&app.token_for(&silva)), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status_code"], "em_investigacao");
    assert_eq!(body["assigned_to"], silva.identity_id.to_string());

    let (status, _) = app
        .request(Method::PUT, &uri, Some(&app.token_for(&souza)), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(app.audit_count(), 1);
}

#[tokio::test]
async fn operator_route_grants_staff_rights() {
    let app = TestApp::spawn().await;
    let maria = app.seed_civil("Maria");
    let uri = format!("/api/internal/identities/{}/permissions", maria.identity_id);
    let body = json!({ "permissoes": { "is_staff": true } });

    let (status, _) = app.put(&uri, None, body.clone()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = axum::http::Request::builder()
        .method(Method::PUT)
        .uri(&uri)
        .header("content-type", "application/json")
        .header("x-admin-api-key", TEST_ADMIN_API_KEY)
        .body(axum::body::Body::from(body.to_string()))
        .unwrap();
    let response = tower::util::ServiceExt::oneshot(app.router.clone(), request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (status, _) = app
        .get("/api/staff/corporacoes", Some(&app.token_for(&maria)))
        .await;
    assert_eq!(status, StatusCode::OK);

    let entries = app.store.audit_entries().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].actor_name, "System");
}
