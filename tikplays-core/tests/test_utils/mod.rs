// File: tikplays-core/tests/test_utils/mod.rs
#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use tempfile::TempDir;
use tokio::sync::mpsc;

use tikplays_common::models::OverlayEvent;
use tikplays_common::traits::ProfileStore;
use tikplays_core::http::{HttpClient, HttpResponse};
use tikplays_core::persistence::save_document;
use tikplays_core::profiles::FsProfileStore;
use tikplays_core::services::ActionServices;
use tikplays_core::services::dispatch::{KeyPresser, KeyToken};
use tikplays_core::{Engine, EngineConfig, Error, EventBus};

#[derive(Debug, Clone, PartialEq)]
pub enum HttpCall {
    Json { url: String, body: Value },
    Form { url: String, form: Vec<(String, String)> },
}

/// Records every request and answers with a fixed status. URLs containing
/// `fail_marker` fail at the transport level.
pub struct RecordingHttp {
    pub calls: Mutex<Vec<HttpCall>>,
    pub status: u16,
    pub fail_marker: Option<String>,
}

impl RecordingHttp {
    pub fn ok() -> Arc<Self> {
        Self::with_status(200)
    }

    pub fn with_status(status: u16) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            status,
            fail_marker: None,
        })
    }

    pub fn failing_on(marker: &str) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            status: 200,
            fail_marker: Some(marker.to_string()),
        })
    }

    pub fn calls(&self) -> Vec<HttpCall> {
        self.calls.lock().clone()
    }

    fn answer(&self, url: &str) -> Result<HttpResponse, Error> {
        if let Some(marker) = &self.fail_marker {
            if url.contains(marker.as_str()) {
                return Err(Error::Webhook(format!("connection refused: {}", url)));
            }
        }
        Ok(HttpResponse {
            status: self.status,
            body: if self.status >= 400 { "Unknown command".into() } else { String::new() },
        })
    }
}

#[async_trait]
impl HttpClient for RecordingHttp {
    async fn post_json(&self, url: &str, body: &Value) -> Result<HttpResponse, Error> {
        self.calls.lock().push(HttpCall::Json {
            url: url.to_string(),
            body: body.clone(),
        });
        self.answer(url)
    }

    async fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<HttpResponse, Error> {
        self.calls.lock().push(HttpCall::Form {
            url: url.to_string(),
            form: form.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        });
        self.answer(url)
    }
}

/// Never answers. Used to prove dispatch does not wait on side effects.
pub struct HangingHttp;

#[async_trait]
impl HttpClient for HangingHttp {
    async fn post_json(&self, _url: &str, _body: &Value) -> Result<HttpResponse, Error> {
        std::future::pending().await
    }

    async fn post_form(&self, _url: &str, _form: &[(&str, &str)]) -> Result<HttpResponse, Error> {
        std::future::pending().await
    }
}

#[derive(Default)]
pub struct RecordingKeys {
    pub pressed: Mutex<Vec<KeyToken>>,
}

impl RecordingKeys {
    pub fn pressed(&self) -> Vec<KeyToken> {
        self.pressed.lock().clone()
    }
}

#[async_trait]
impl KeyPresser for RecordingKeys {
    async fn tap(&self, key: KeyToken) -> Result<(), Error> {
        self.pressed.lock().push(key);
        Ok(())
    }
}

pub fn services(bus: &EventBus, http: Arc<dyn HttpClient>, keys: Arc<dyn KeyPresser>) -> ActionServices {
    ActionServices {
        http,
        keys,
        broadcaster: Arc::new(bus.clone()),
    }
}

/// Writes a document into the store's active profile.
pub fn seed<T: Serialize>(store: &FsProfileStore, file: &str, doc: &T) {
    save_document(&store.resolve_path(file), doc);
}

pub fn drain(rx: &mut mpsc::Receiver<OverlayEvent>) -> Vec<OverlayEvent> {
    let mut out = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        out.push(ev);
    }
    out
}

pub fn channels(events: &[OverlayEvent]) -> Vec<&'static str> {
    events.iter().map(|e| e.channel()).collect()
}

pub struct TestRig {
    pub dir: TempDir,
    pub store: Arc<FsProfileStore>,
    pub bus: EventBus,
    pub events: mpsc::Receiver<OverlayEvent>,
    pub http: Arc<RecordingHttp>,
    pub keys: Arc<RecordingKeys>,
}

impl TestRig {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let store = Arc::new(FsProfileStore::open(dir.path()).expect("profile store"));
        let bus = EventBus::new();
        let events = bus.subscribe(None);
        Self {
            dir,
            store,
            bus,
            events,
            http: RecordingHttp::ok(),
            keys: Arc::new(RecordingKeys::default()),
        }
    }

    pub fn engine(&self) -> Engine {
        self.engine_with(EngineConfig::default())
    }

    pub fn engine_with(&self, config: EngineConfig) -> Engine {
        Engine::new(
            self.store.clone(),
            services(&self.bus, self.http.clone(), self.keys.clone()),
            config,
        )
    }

    pub fn drain(&mut self) -> Vec<OverlayEvent> {
        drain(&mut self.events)
    }
}
