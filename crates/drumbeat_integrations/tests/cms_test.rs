//! CMS client error mapping and the unpublish-as-draft rollback path.

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};
use drumbeat_core::CmsCredentials;
use drumbeat_error::{DrumbeatErrorKind, IntegrationErrorKind};
use drumbeat_integrations::{CmsClient, CmsPostStatus, NewCmsPost};
use serde_json::{Value as JsonValue, json};

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub listener");
    let addr = listener.local_addr().expect("stub addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub server");
    });
    format!("http://{addr}")
}

fn credentials(site_url: String) -> CmsCredentials {
    CmsCredentials {
        site_url,
        username: "publisher".to_string(),
        app_password: "abcd efgh ijkl".to_string(),
    }
}

fn new_post() -> NewCmsPost {
    NewCmsPost {
        title: "Five Signs You Need a Dental Checkup".to_string(),
        content: "<p>Body</p>".to_string(),
        status: CmsPostStatus::Publish,
        slug: None,
        excerpt: None,
        meta: None,
    }
}

fn integration_kind(err: &drumbeat_error::DrumbeatError) -> &IntegrationErrorKind {
    match err.kind() {
        DrumbeatErrorKind::Integration(i) => &i.kind,
        other => panic!("expected integration error, got {other}"),
    }
}

#[tokio::test]
async fn rejected_credentials_map_to_credentials_invalid() {
    let app = Router::new().route(
        "/wp-json/wp/v2/posts",
        post(|| async { StatusCode::UNAUTHORIZED }),
    );
    let base = serve(app).await;

    let client = CmsClient::new(&credentials(base));
    let err = client.create_post(&new_post()).await.expect_err("401");
    assert_eq!(integration_kind(&err), &IntegrationErrorKind::CredentialsInvalid);
}

#[tokio::test]
async fn missing_capability_maps_to_insufficient_permission() {
    let app = Router::new().route(
        "/wp-json/wp/v2/posts",
        post(|| async { StatusCode::FORBIDDEN }),
    );
    let base = serve(app).await;

    let client = CmsClient::new(&credentials(base));
    let err = client.create_post(&new_post()).await.expect_err("403");
    assert!(matches!(
        integration_kind(&err),
        IntegrationErrorKind::InsufficientPermission(_)
    ));
}

#[tokio::test]
async fn disabled_rest_endpoint_maps_to_endpoint_not_found() {
    let app = Router::new().route("/wp-json", get(|| async { StatusCode::NOT_FOUND }));
    let base = serve(app).await;

    let client = CmsClient::new(&credentials(base));
    let err = client.probe().await.expect_err("404");
    assert!(matches!(
        integration_kind(&err),
        IntegrationErrorKind::EndpointNotFound(_)
    ));
}

#[tokio::test]
async fn unreachable_site_maps_to_unreachable() {
    // Nothing is listening here.
    let client = CmsClient::new(&credentials("http://127.0.0.1:9".to_string()));
    let err = client.probe().await.expect_err("connection refused");
    assert!(matches!(
        integration_kind(&err),
        IntegrationErrorKind::Unreachable(_)
    ));
}

#[tokio::test]
async fn create_post_sends_basic_auth_and_parses_response() {
    let app = Router::new().route(
        "/wp-json/wp/v2/posts",
        post(
            |headers: axum::http::HeaderMap, axum::Json(body): axum::Json<JsonValue>| async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default();
                assert!(auth.starts_with("Basic "), "expected Basic auth, got {auth}");
                assert_eq!(body["status"], "publish");
                axum::Json(json!({
                    "id": 991,
                    "link": "https://example-dental.com/five-signs",
                    "status": "publish",
                    "title": body["title"],
                    "content": body["content"]
                }))
            },
        ),
    );
    let base = serve(app).await;

    let client = CmsClient::new(&credentials(base));
    let created = client.create_post(&new_post()).await.expect("create");
    assert_eq!(created.id, 991);
    assert_eq!(created.status, CmsPostStatus::Publish);
}

#[tokio::test]
async fn unpublish_transitions_the_post_to_draft() {
    let app = Router::new().route(
        "/wp-json/wp/v2/posts/{id}",
        post(
            |axum::extract::Path(id): axum::extract::Path<u64>,
             axum::Json(body): axum::Json<JsonValue>| async move {
                assert_eq!(body["status"], "draft");
                assert!(body.get("title").is_none(), "rollback must not touch the title");
                axum::Json(json!({
                    "id": id,
                    "link": "https://example-dental.com/five-signs",
                    "status": "draft",
                    "title": "Five Signs You Need a Dental Checkup",
                    "content": "<p>Body</p>"
                }))
            },
        ),
    );
    let base = serve(app).await;

    let client = CmsClient::new(&credentials(base));
    let rolled_back = client.unpublish_post(991).await.expect("unpublish");
    assert_eq!(rolled_back.status, CmsPostStatus::Draft);
}
