use std::sync::Arc;
use std::time::Duration;

use storage::repository::Storage;

use crate::Clock;
use crate::catalog_service::CatalogService;
use crate::error::AppServicesError;
use crate::progress::{
    Autosaver, DEFAULT_AUTOSAVE_DELAY, DEFAULT_PLAN_LIMIT_MAX, JournalService, ProgressService,
};

/// Tunables passed down from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceOptions {
    pub autosave_delay: Duration,
    pub plan_limit_max: u32,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            autosave_delay: DEFAULT_AUTOSAVE_DELAY,
            plan_limit_max: DEFAULT_PLAN_LIMIT_MAX,
        }
    }
}

/// Assembles the catalog and learner services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    catalog: Arc<CatalogService>,
    progress: Arc<ProgressService>,
    journal: Arc<JournalService>,
    autosaver: Autosaver,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the pool or the migrations fail.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        options: ServiceOptions,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock, options))
    }

    #[must_use]
    pub fn in_memory(clock: Clock, options: ServiceOptions) -> Self {
        Self::from_storage(&Storage::in_memory(), clock, options)
    }

    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock, options: ServiceOptions) -> Self {
        let catalog = Arc::new(CatalogService::new(
            clock,
            Arc::clone(&storage.programs),
            Arc::clone(&storage.units),
        ));
        let progress = Arc::new(
            ProgressService::new(
                clock,
                Arc::clone(&storage.programs),
                Arc::clone(&storage.units),
                Arc::clone(&storage.enrollments),
                Arc::clone(&storage.day_states),
                Arc::clone(&storage.progress),
            )
            .with_plan_limit_max(options.plan_limit_max),
        );
        let journal = Arc::new(JournalService::new(
            clock,
            Arc::clone(&storage.programs),
            Arc::clone(&storage.units),
            Arc::clone(&storage.enrollments),
            Arc::clone(&storage.day_states),
            Arc::clone(&storage.progress),
        ));
        let autosaver = Autosaver::new(Arc::clone(&journal), options.autosave_delay);

        Self {
            catalog,
            progress,
            journal,
            autosaver,
        }
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<CatalogService> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn journal(&self) -> Arc<JournalService> {
        Arc::clone(&self.journal)
    }

    #[must_use]
    pub fn autosaver(&self) -> Autosaver {
        self.autosaver.clone()
    }
}
