//! API state management for the REST server.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::api::{EntityApi, SubmissionDispatcher};
use crate::config::Config;
use crate::drafts::{DraftStore, JsonFileDraftStore};
use crate::wizard::{Composer, WizardKind};

/// A running wizard behind its own lock
pub type SharedComposer = Arc<Mutex<Composer>>;

/// One draft store per wizard kind, shared by every session of that kind so
/// their writes to the namespace file are serialized
#[derive(Clone)]
struct DraftStores {
    project: Arc<dyn DraftStore>,
    organization: Arc<dyn DraftStore>,
}

impl DraftStores {
    fn open(dir: &Path) -> Self {
        let store = |kind: WizardKind| -> Arc<dyn DraftStore> {
            Arc::new(JsonFileDraftStore::new(dir, kind.slug()))
        };
        Self {
            project: store(WizardKind::Project),
            organization: store(WizardKind::Organization),
        }
    }

    fn get(&self, kind: WizardKind) -> &Arc<dyn DraftStore> {
        match kind {
            WizardKind::Project => &self.project,
            WizardKind::Organization => &self.organization,
        }
    }
}

/// Shared state for the REST API
#[derive(Clone)]
pub struct ApiState {
    /// Application configuration
    pub config: Arc<Config>,
    /// Remote entity API used for final submissions
    pub api: Arc<dyn EntityApi>,
    /// Directory holding one draft file per wizard kind
    pub drafts_dir: PathBuf,
    drafts: DraftStores,
    /// Live wizard sessions by id
    sessions: Arc<RwLock<HashMap<Uuid, SharedComposer>>>,
}

impl ApiState {
    /// Create new API state from config
    pub fn new(config: Config, api: Arc<dyn EntityApi>) -> Self {
        let drafts_dir = config.drafts_path();
        Self::with_drafts_dir(config, api, drafts_dir)
    }

    pub fn with_drafts_dir(config: Config, api: Arc<dyn EntityApi>, drafts_dir: PathBuf) -> Self {
        Self {
            config: Arc::new(config),
            api,
            drafts: DraftStores::open(&drafts_dir),
            drafts_dir,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn draft_store(&self, kind: WizardKind) -> Arc<dyn DraftStore> {
        self.drafts.get(kind).clone()
    }

    pub fn dispatcher(&self, kind: WizardKind) -> SubmissionDispatcher {
        SubmissionDispatcher::new(kind, self.api.clone())
    }

    pub async fn insert_session(&self, id: Uuid, composer: Composer) {
        self.sessions
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(composer)));
    }

    pub async fn session(&self, id: Uuid) -> Option<SharedComposer> {
        self.sessions.read().await.get(&id).cloned()
    }

    pub async fn remove_session(&self, id: Uuid) -> Option<SharedComposer> {
        self.sessions.write().await.remove(&id)
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
