use std::sync::Arc;

use routine_core::{PermissionGate, PermissionResolver};
use storage::repository::Storage;

use crate::Clock;
use crate::assignment_scheduler::AssignmentScheduler;
use crate::catalog_service::CatalogService;
use crate::error::AppServicesError;
use crate::training::TrainingSessionManager;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    clock: Clock,
    storage: Storage,
    session_key: String,
    gate: PermissionGate,
    catalog: Arc<CatalogService>,
    scheduler: Arc<AssignmentScheduler>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        session_key: impl Into<String>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(storage, clock, session_key))
    }

    /// Build services over an already-constructed storage.
    #[must_use]
    pub fn from_storage(storage: Storage, clock: Clock, session_key: impl Into<String>) -> Self {
        let catalog = Arc::new(CatalogService::new(
            Arc::clone(&storage.kids),
            Arc::clone(&storage.routines),
            Arc::clone(&storage.assignments),
        ));
        let scheduler = Arc::new(AssignmentScheduler::new(
            Arc::clone(&storage.kids),
            Arc::clone(&storage.routines),
            Arc::clone(&storage.assignments),
        ));
        Self {
            clock,
            storage,
            session_key: session_key.into(),
            gate: PermissionGate::new(PermissionResolver::new()),
            catalog,
            scheduler,
        }
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    #[must_use]
    pub fn gate(&self) -> &PermissionGate {
        &self.gate
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<CatalogService> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn scheduler(&self) -> Arc<AssignmentScheduler> {
        Arc::clone(&self.scheduler)
    }

    /// A session manager over the shared scheduler and session store.
    ///
    /// The manager starts empty; call `recover` to pick up a persisted session.
    #[must_use]
    pub fn training(&self) -> TrainingSessionManager {
        TrainingSessionManager::new(
            self.clock,
            Arc::clone(&self.scheduler),
            Arc::clone(&self.storage.sessions),
            self.session_key.clone(),
        )
    }
}
