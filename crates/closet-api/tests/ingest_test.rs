//! End-to-end tests for the image ingestion endpoint.
//!
//! The server runs the real router and pipeline against stub collaborators;
//! the call log asserts which side effects ran and in what order.

mod helpers;

use axum_test::multipart::{MultipartForm, Part};
use helpers::{fixtures, setup_test_app, TestApp, TestAppConfig};
use serde_json::{json, Value as JsonValue};

fn upload_form() -> MultipartForm {
    upload_form_for_owner("user-1")
}

fn upload_form_for_owner(owner_id: &str) -> MultipartForm {
    let part = Part::bytes(bytes::Bytes::from(fixtures::create_minimal_png()))
        .file_name("shirt.png")
        .mime_type("image/png");
    MultipartForm::new()
        .add_part("file", part)
        .add_text("ownerId", owner_id)
}

async fn process_image(app: &TestApp, token: Option<&str>, form: MultipartForm) -> (u16, JsonValue) {
    let mut request = app.server.post("/api/v0/wardrobe/process-image");
    if let Some(token) = token {
        request = request.add_header("Authorization", format!("Bearer {}", token));
    }
    let response = request.multipart(form).await;
    let status = response.status_code().as_u16();
    (status, response.json())
}

#[tokio::test]
async fn test_missing_credential_is_rejected_with_no_side_effects() {
    let app = setup_test_app(TestAppConfig::default());

    let (status, body) = process_image(&app, None, upload_form()).await;

    assert_eq!(status, 401);
    assert_eq!(body.get("success").unwrap(), &json!(false));
    assert!(body.get("error").unwrap().as_str().is_some());
    assert!(app.log.calls().is_empty());
    assert!(app.wardrobe.items().is_empty());
}

#[tokio::test]
async fn test_invalid_token_is_rejected_before_upload() {
    let app = setup_test_app(TestAppConfig::default());

    let (status, _) = process_image(&app, Some("not-a-real-token"), upload_form()).await;

    assert_eq!(status, 401);
    assert_eq!(app.log.calls(), vec!["auth.verify"]);
    assert!(app.wardrobe.items().is_empty());
}

#[tokio::test]
async fn test_owner_mismatch_is_unauthorized() {
    let app = setup_test_app(TestAppConfig::default());

    let (status, body) =
        process_image(&app, Some("token-user-1"), upload_form_for_owner("user-2")).await;

    assert_eq!(status, 401);
    assert_eq!(body.get("error").unwrap(), &json!("Owner ID mismatch"));
    assert_eq!(app.log.calls(), vec!["auth.verify"]);
}

#[tokio::test]
async fn test_missing_file_is_bad_request() {
    let app = setup_test_app(TestAppConfig::default());

    let form = MultipartForm::new().add_text("ownerId", "user-1");
    let (status, body) = process_image(&app, Some("token-user-1"), form).await;

    assert_eq!(status, 400);
    assert_eq!(body.get("error").unwrap(), &json!("No file provided"));
    assert_eq!(app.log.calls(), vec!["auth.verify"]);
}

#[tokio::test]
async fn test_missing_owner_id_is_bad_request() {
    let app = setup_test_app(TestAppConfig::default());

    let part = Part::bytes(bytes::Bytes::from(fixtures::create_minimal_png()))
        .file_name("shirt.png")
        .mime_type("image/png");
    let form = MultipartForm::new().add_part("file", part);
    let (status, body) = process_image(&app, Some("token-user-1"), form).await;

    assert_eq!(status, 400);
    assert_eq!(body.get("error").unwrap(), &json!("No owner ID provided"));
    assert_eq!(app.log.calls(), vec!["auth.verify"]);
}

#[tokio::test]
async fn test_credential_is_checked_before_request_shape() {
    // A request that is both unauthenticated and malformed gets 401, not 400.
    let app = setup_test_app(TestAppConfig::default());

    let form = MultipartForm::new().add_text("ownerId", "user-1");
    let (status, _) = process_image(&app, None, form).await;

    assert_eq!(status, 401);
    assert!(app.log.calls().is_empty());
}

#[tokio::test]
async fn test_storage_failure_stops_the_pipeline() {
    let app = setup_test_app(TestAppConfig {
        storage_fails: true,
        ..TestAppConfig::default()
    });

    let (status, body) = process_image(&app, Some("token-user-1"), upload_form()).await;

    assert_eq!(status, 500);
    assert_eq!(body.get("error").unwrap(), &json!("Failed to store image"));
    assert_eq!(app.log.calls(), vec!["auth.verify", "storage.upload"]);
    assert!(app.wardrobe.items().is_empty());
}

#[tokio::test]
async fn test_analysis_failure_persists_nothing() {
    let app = setup_test_app(TestAppConfig {
        analysis: None,
        ..TestAppConfig::default()
    });

    let (status, body) = process_image(&app, Some("token-user-1"), upload_form()).await;

    assert_eq!(status, 500);
    assert_eq!(body.get("success").unwrap(), &json!(false));
    assert_eq!(
        app.log.calls(),
        vec!["auth.verify", "storage.upload", "analyzer.analyze"]
    );
    // The stored image is not cleaned up; only the record is withheld.
    assert!(app.wardrobe.items().is_empty());
}

#[tokio::test]
async fn test_embedding_failure_degrades_to_success_without_vector() {
    let app = setup_test_app(TestAppConfig {
        embedder_fails: true,
        ..TestAppConfig::default()
    });

    let (status, body) = process_image(&app, Some("token-user-1"), upload_form()).await;

    assert_eq!(status, 200);
    assert_eq!(body.get("success").unwrap(), &json!(true));
    let data = body.get("data").unwrap();
    assert!(data.get("embedding").is_none());
    assert_eq!(
        app.log.calls(),
        vec![
            "auth.verify",
            "storage.upload",
            "analyzer.analyze",
            "embedder.embed",
            "wardrobe.insert"
        ]
    );
}

#[tokio::test]
async fn test_persistence_failure_is_server_error() {
    let app = setup_test_app(TestAppConfig {
        store_fails: true,
        ..TestAppConfig::default()
    });

    let (status, body) = process_image(&app, Some("token-user-1"), upload_form()).await;

    assert_eq!(status, 500);
    assert_eq!(body.get("success").unwrap(), &json!(false));
    assert_eq!(
        app.log.calls(),
        vec![
            "auth.verify",
            "storage.upload",
            "analyzer.analyze",
            "embedder.embed",
            "wardrobe.insert"
        ]
    );
}

#[tokio::test]
async fn test_successful_ingest_returns_complete_record() {
    let app = setup_test_app(TestAppConfig {
        analysis: Some(json!({
            "type": "shirt",
            "subType": "t-shirt",
            "color": "blue",
            "season": ["summer"],
            "style": ["casual"],
            "material": "cotton"
        })),
        ..TestAppConfig::default()
    });

    let (status, body) = process_image(&app, Some("token-user-1"), upload_form()).await;

    assert_eq!(status, 200);
    assert_eq!(body.get("success").unwrap(), &json!(true));
    let data = body.get("data").unwrap();
    assert!(data.get("id").unwrap().as_str().is_some());
    assert_eq!(data.get("type").unwrap(), &json!("shirt"));
    assert_eq!(data.get("subType").unwrap(), &json!("t-shirt"));
    assert_eq!(data.get("color").unwrap(), &json!("blue"));
    assert_eq!(data.get("ownerId").unwrap(), &json!("user-1"));
    assert_eq!(data.get("backgroundRemoved").unwrap(), &json!(true));
    assert_eq!(data.get("favorite").unwrap(), &json!(false));
    assert_eq!(data.get("wearCount").unwrap(), &json!(0));
    assert_eq!(
        data.get("embedding").unwrap().as_array().unwrap().len(),
        512
    );
    assert_eq!(data.get("createdAt").unwrap(), data.get("updatedAt").unwrap());
    assert!(data
        .get("imageUrl")
        .unwrap()
        .as_str()
        .unwrap()
        .starts_with("http://files.test/wardrobe/user-1/"));

    let stored = app.wardrobe.items();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id.to_string(), data.get("id").unwrap().as_str().unwrap());
}

#[tokio::test]
async fn test_structured_gps_metadata_is_stringified() {
    let app = setup_test_app(TestAppConfig {
        analysis: Some(json!({
            "type": "jacket",
            "color": "green",
            "metadata": {"gps": {"lat": 48.85, "lng": 2.35}, "camera": "iPhone"}
        })),
        ..TestAppConfig::default()
    });

    let (status, body) = process_image(&app, Some("token-user-1"), upload_form()).await;

    assert_eq!(status, 200);
    let metadata = body.get("data").unwrap().get("metadata").unwrap();
    let gps = metadata.get("gps").unwrap().as_str().unwrap();
    let parsed: JsonValue = serde_json::from_str(gps).unwrap();
    assert_eq!(parsed, json!({"lat": 48.85, "lng": 2.35}));
    assert_eq!(metadata.get("camera").unwrap(), &json!("iPhone"));
}

#[tokio::test]
async fn test_string_gps_metadata_passes_through() {
    let app = setup_test_app(TestAppConfig {
        analysis: Some(json!({
            "type": "jacket",
            "color": "green",
            "metadata": {"gps": "48.85,2.35"}
        })),
        ..TestAppConfig::default()
    });

    let (status, body) = process_image(&app, Some("token-user-1"), upload_form()).await;

    assert_eq!(status, 200);
    let metadata = body.get("data").unwrap().get("metadata").unwrap();
    assert_eq!(metadata.get("gps").unwrap(), &json!("48.85,2.35"));
}

#[tokio::test]
async fn test_absent_gps_metadata_is_null() {
    let app = setup_test_app(TestAppConfig::default());

    let (status, body) = process_image(&app, Some("token-user-1"), upload_form()).await;

    assert_eq!(status, 200);
    let metadata = body.get("data").unwrap().get("metadata").unwrap();
    assert!(metadata.get("gps").unwrap().is_null());
}

#[tokio::test]
async fn test_repeated_identical_uploads_create_distinct_items() {
    let app = setup_test_app(TestAppConfig::default());

    let (status_a, body_a) = process_image(&app, Some("token-user-1"), upload_form()).await;
    let (status_b, body_b) = process_image(&app, Some("token-user-1"), upload_form()).await;

    assert_eq!(status_a, 200);
    assert_eq!(status_b, 200);
    let id_a = body_a.get("data").unwrap().get("id").unwrap().as_str().unwrap();
    let id_b = body_b.get("data").unwrap().get("id").unwrap().as_str().unwrap();
    assert_ne!(id_a, id_b);
    assert_eq!(app.wardrobe.items().len(), 2);
}

#[tokio::test]
async fn test_unknown_multipart_fields_are_ignored() {
    let app = setup_test_app(TestAppConfig::default());

    let form = upload_form().add_text("note", "from my phone");
    let (status, body) = process_image(&app, Some("token-user-1"), form).await;

    assert_eq!(status, 200);
    assert_eq!(body.get("success").unwrap(), &json!(true));
}

#[tokio::test]
async fn test_health_endpoint_needs_no_credential() {
    let app = setup_test_app(TestAppConfig::default());

    let response = app.server.get("/health").await;
    assert_eq!(response.status_code().as_u16(), 200);
    let body: JsonValue = response.json();
    assert_eq!(body.get("status").unwrap(), &json!("ok"));
}
