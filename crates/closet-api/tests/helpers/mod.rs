//! Test helpers: stub collaborators behind the pipeline's trait seams.
//!
//! Every stub records its invocation in a shared call log so tests can
//! assert which side effects happened and in what order.

#![allow(dead_code)]

pub mod fixtures;

use async_trait::async_trait;
use axum_test::TestServer;
use bytes::Bytes;
use closet_api::{setup::routes::setup_routes, AppState};
use closet_core::{AppError, ClothingAnalysis, Config, StorageBackend, WardrobeItem};
use closet_db::WardrobeStore;
use closet_services::{ClothingAnalyzer, Embedder, EmbeddingError, IdentityVerifier};
use closet_storage::{Storage, StorageError, StorageResult, StoredImage};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Shared record of collaborator invocations, in call order.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn record(&self, call: &str) {
        self.0.lock().unwrap().push(call.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Verifier stub: a fixed token → subject table.
pub struct StubVerifier {
    subjects: HashMap<String, String>,
    log: CallLog,
}

#[async_trait]
impl IdentityVerifier for StubVerifier {
    async fn verify(&self, token: &str) -> Result<String, AppError> {
        self.log.record("auth.verify");
        self.subjects
            .get(token)
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Invalid token".to_string()))
    }
}

/// Storage stub: in-memory upload that can be told to fail.
pub struct StubStorage {
    fail: bool,
    log: CallLog,
}

#[async_trait]
impl Storage for StubStorage {
    async fn upload(
        &self,
        owner_id: &str,
        _filename: &str,
        _content_type: &str,
        _data: Vec<u8>,
    ) -> StorageResult<StoredImage> {
        self.log.record("storage.upload");
        if self.fail {
            return Err(StorageError::UploadFailed("stub storage down".to_string()));
        }
        let key = format!("wardrobe/{}/{}.png", owner_id, Uuid::new_v4());
        let url = format!("http://files.test/{}", key);
        Ok(StoredImage { key, url })
    }

    async fn delete(&self, _storage_key: &str) -> StorageResult<()> {
        self.log.record("storage.delete");
        Ok(())
    }

    async fn exists(&self, _storage_key: &str) -> StorageResult<bool> {
        Ok(true)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

/// Analyzer stub: returns a canned analysis body, or an analysis failure.
pub struct StubAnalyzer {
    body: Option<JsonValue>,
    log: CallLog,
}

#[async_trait]
impl ClothingAnalyzer for StubAnalyzer {
    async fn analyze(&self, _image_url: &str) -> Result<ClothingAnalysis, AppError> {
        self.log.record("analyzer.analyze");
        match &self.body {
            Some(body) => serde_json::from_value(body.clone())
                .map_err(|e| AppError::Analysis(format!("bad stub analysis: {}", e))),
            None => Err(AppError::Analysis("Failed to analyze image".to_string())),
        }
    }
}

/// Embedder stub: a fixed-dimension vector, or unavailable.
pub struct StubEmbedder {
    fail: bool,
    log: CallLog,
}

#[async_trait]
impl Embedder for StubEmbedder {
    async fn embed(&self, _image: Bytes, _item_id: Uuid) -> Result<Vec<f32>, EmbeddingError> {
        self.log.record("embedder.embed");
        if self.fail {
            return Err(EmbeddingError("stub embedder timed out".to_string()));
        }
        Ok(vec![0.25; 512])
    }
}

/// In-memory wardrobe store.
#[derive(Clone, Default)]
pub struct MemoryWardrobe {
    items: Arc<Mutex<Vec<WardrobeItem>>>,
    fail: bool,
    log: CallLog,
}

impl MemoryWardrobe {
    pub fn items(&self) -> Vec<WardrobeItem> {
        self.items.lock().unwrap().clone()
    }
}

#[async_trait]
impl WardrobeStore for MemoryWardrobe {
    async fn insert(
        &self,
        draft: closet_core::WardrobeItemDraft,
    ) -> Result<WardrobeItem, AppError> {
        self.log.record("wardrobe.insert");
        if self.fail {
            return Err(AppError::Persistence("stub store down".to_string()));
        }
        let item = WardrobeItem::from_draft(Uuid::new_v4(), draft);
        self.items.lock().unwrap().push(item.clone());
        Ok(item)
    }
}

/// Knobs for one test app.
pub struct TestAppConfig {
    /// token → subject
    pub subjects: Vec<(&'static str, &'static str)>,
    pub storage_fails: bool,
    /// `None` means the analyzer fails; `Some(body)` is deserialized as the analysis.
    pub analysis: Option<JsonValue>,
    pub embedder_fails: bool,
    pub store_fails: bool,
}

impl Default for TestAppConfig {
    fn default() -> Self {
        Self {
            subjects: vec![("token-user-1", "user-1")],
            storage_fails: false,
            analysis: Some(serde_json::json!({"type": "shirt", "color": "blue"})),
            embedder_fails: false,
            store_fails: false,
        }
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub log: CallLog,
    pub wardrobe: MemoryWardrobe,
}

/// Build a TestServer over the real router with stub collaborators.
pub fn setup_test_app(cfg: TestAppConfig) -> TestApp {
    let log = CallLog::default();
    let wardrobe = MemoryWardrobe {
        items: Arc::new(Mutex::new(Vec::new())),
        fail: cfg.store_fails,
        log: log.clone(),
    };

    let state = Arc::new(AppState {
        config: test_config(),
        verifier: Arc::new(StubVerifier {
            subjects: cfg
                .subjects
                .into_iter()
                .map(|(t, s)| (t.to_string(), s.to_string()))
                .collect(),
            log: log.clone(),
        }),
        storage: Arc::new(StubStorage {
            fail: cfg.storage_fails,
            log: log.clone(),
        }),
        analyzer: Arc::new(StubAnalyzer {
            body: cfg.analysis,
            log: log.clone(),
        }),
        embedder: Arc::new(StubEmbedder {
            fail: cfg.embedder_fails,
            log: log.clone(),
        }),
        wardrobe: Arc::new(wardrobe.clone()),
    });

    let router = setup_routes(&state.config, state.clone()).expect("router setup");
    let server = TestServer::new(router).expect("test server");

    TestApp {
        server,
        log,
        wardrobe,
    }
}

pub fn test_config() -> Config {
    Config {
        server_port: 0,
        cors_origins: vec!["*".to_string()],
        environment: "test".to_string(),
        database_url: "postgres://localhost/closet_test".to_string(),
        db_max_connections: 5,
        db_timeout_seconds: 5,
        storage_backend: StorageBackend::Local,
        local_storage_path: "/tmp/closet-test".to_string(),
        local_storage_base_url: "http://localhost:3000/files".to_string(),
        s3_bucket: None,
        s3_region: None,
        s3_endpoint: None,
        s3_public_base_url: None,
        max_file_size_bytes: 10 * 1024 * 1024,
        jwks_url: "http://localhost:1/jwks.json".to_string(),
        jwt_issuer: None,
        jwt_audience: None,
        jwks_cache_ttl_seconds: 60,
        auth_timeout_seconds: 1,
        vision_api_base: "http://localhost:1".to_string(),
        vision_api_key: "test-key".to_string(),
        vision_model: "gpt-4o".to_string(),
        vision_timeout_seconds: 1,
        embedding_service_url: "http://localhost:1/embed".to_string(),
        embedding_dimension: 512,
        embedding_timeout_seconds: 1,
    }
}
