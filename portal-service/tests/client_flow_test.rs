//! The typed client against a live server bound to a loopback port.

mod common;

use common::{email_of, TestApp, TEST_PASSWORD};
use portal_service::{
    client::{ClientError, CredentialStore, MemoryCredentialStore, PortalClient},
    models::{Capability, IdentityStatus},
};
use std::net::SocketAddr;
use std::sync::Arc;

async fn serve(app: &TestApp) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = app.router.clone();
    tokio::spawn(async move {
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });
    format!("http://{}", addr)
}

fn client(base_url: &str) -> PortalClient {
    PortalClient::new(base_url, Arc::new(MemoryCredentialStore::new())).unwrap()
}

#[tokio::test]
async fn login_keeps_the_session_for_later_calls() {
    let app = TestApp::spawn().await;
    app.seed_civil("Maria");
    let client = client(&serve(&app).await);

    assert!(!client.is_authenticated());
    let usuario = client.login(&email_of("Maria"), TEST_PASSWORD).await.unwrap();
    assert_eq!(usuario.nome, "Maria");
    assert!(client.is_authenticated());

    let me = client.me().await.unwrap();
    assert_eq!(me.email, email_of("Maria"));

    let boletim = client
        .file_boletim("Furto", "Levaram a bicicleta", "Centro")
        .await
        .unwrap();
    assert_eq!(boletim.author_id, me.id);
}

#[tokio::test]
async fn permission_denied_keeps_credentials() {
    let app = TestApp::spawn().await;
    app.seed_civil("Maria");
    let client = client(&serve(&app).await);
    client.login(&email_of("Maria"), TEST_PASSWORD).await.unwrap();

    let err = client.list_recruits().await.unwrap_err();

    assert!(matches!(err, ClientError::PermissionDenied(_)));
    assert_eq!(err.status(), Some(403));
    assert!(client.is_authenticated());
}

#[tokio::test]
async fn rejected_session_clears_credentials() {
    let app = TestApp::spawn().await;
    let maria = app.seed_civil("Maria");
    let credentials = Arc::new(MemoryCredentialStore::new());
    credentials.set(app.token_for(&maria));
    let client = PortalClient::new(serve(&app).await, credentials.clone()).unwrap();

    client.logout().await.unwrap();
    assert!(credentials.get().is_none());

    credentials.set("revoked.or.garbage".to_string());
    let err = client.me().await.unwrap_err();
    assert!(matches!(err, ClientError::Unauthorized(_)));
    assert!(credentials.get().is_none());
}

#[tokio::test]
async fn api_errors_carry_the_server_message() {
    let app = TestApp::spawn().await;
    app.seed_civil("Maria");
    let client = client(&serve(&app).await);

    let err = client
        .register("Outra", &email_of("Maria"), TEST_PASSWORD)
        .await
        .unwrap_err();

    match err {
        ClientError::Api { status, message } => {
            assert_eq!(status, 409);
            assert!(!message.is_empty());
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn recovery_flow_walks_every_step() {
    let app = TestApp::spawn().await;
    app.seed_civil("Maria");
    let client = client(&serve(&app).await);

    let requested = client.start_recovery(&email_of("Maria")).await.unwrap();
    assert_eq!(requested.email(), email_of("Maria"));

    let err = requested.verify("000000x").await.err().unwrap();
    assert_eq!(err.status(), Some(400));

    let code = app.email.last_code_for(&email_of("Maria")).unwrap();
    let verified = requested.verify(&code).await.unwrap();

    let err = verified.reset("newpassword1", "newpassword2").await.unwrap_err();
    assert!(matches!(err, ClientError::PasswordMismatch));

    let completed = verified.reset("newpassword1", "newpassword1").await.unwrap();
    assert_eq!(completed.email, email_of("Maria"));

    client.login(&email_of("Maria"), "newpassword1").await.unwrap();
    let err = client.login(&email_of("Maria"), TEST_PASSWORD).await.unwrap_err();
    assert!(matches!(err, ClientError::Unauthorized(_)));
}

#[tokio::test]
async fn unregistered_email_cannot_start_recovery() {
    let app = TestApp::spawn().await;
    let client = client(&serve(&app).await);

    let err = client.start_recovery("ghost@example.com").await.err().unwrap();

    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn rh_reviews_a_recruit_through_the_client() {
    let app = TestApp::spawn().await;
    app.seed_corporation_with_ranks("PM");
    app.seed_officer("Chefe", "PM", Some("Sargento"), &[Capability::IsRh]);
    let base_url = serve(&app).await;

    let rh = client(&base_url);
    rh.police_login("P-Chefe", TEST_PASSWORD, "captcha").await.unwrap();
    let issued = rh.generate_token(1, 24, None).await.unwrap();
    assert_eq!(issued.corporacao, "PM");

    let recruit = app
        .post(
            "/api/policia/register",
            None,
            serde_json::json!({
                "token": issued.token,
                "nome": "Lima",
                "email": "lima@example.com",
                "passaporte": "777",
                "senha": TEST_PASSWORD
            }),
        )
        .await
        .1;
    let recruit_id = recruit["id"].as_str().unwrap().parse().unwrap();

    let pending = rh.list_recruits().await.unwrap();
    assert_eq!(pending.len(), 1);

    let approved = rh
        .review_recruit(recruit_id, IdentityStatus::Aprovado, Some("Soldado"), Some("Patrulha"))
        .await
        .unwrap();
    assert_eq!(approved.status, IdentityStatus::Aprovado);
    assert_eq!(approved.divisao.as_deref(), Some("Patrulha"));
    assert!(rh.list_recruits().await.unwrap().is_empty());
}
