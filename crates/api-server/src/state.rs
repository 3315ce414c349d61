//! Application state

use std::sync::Arc;

use pm_core::daily::DailyEntryStore;
use pm_core::project::ProjectStore;
use pm_core::share::ShareTokenIssuer;
use pm_core::status::StatusStore;
use pm_core::task::TaskStore;
use pm_core::timesheet::TimesheetStore;
use pm_core::user::UserStore;
use pm_core::Database;

use crate::config::ServerConfig;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    user_store: UserStore,
    project_store: ProjectStore,
    status_store: StatusStore,
    task_store: TaskStore,
    daily_entry_store: DailyEntryStore,
    timesheet_store: TimesheetStore,
    share_issuer: ShareTokenIssuer,
}

impl AppState {
    /// Open the database named by `config` and build the stores on it
    pub async fn new(config: ServerConfig) -> pm_core::Result<Self> {
        let db = Database::open(config.database_path()).await?;
        Ok(Self::with_database(db, config))
    }

    pub fn with_database(db: Database, config: ServerConfig) -> Self {
        let share_issuer = ShareTokenIssuer::new(db.clone(), config.public_base_url.clone());
        Self {
            inner: Arc::new(AppStateInner {
                user_store: UserStore::new(db.clone()),
                project_store: ProjectStore::new(db.clone()),
                status_store: StatusStore::new(db.clone()),
                task_store: TaskStore::new(db.clone()),
                daily_entry_store: DailyEntryStore::new(db.clone()),
                timesheet_store: TimesheetStore::new(db),
                share_issuer,
                config,
            }),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    pub fn user_store(&self) -> &UserStore {
        &self.inner.user_store
    }

    pub fn project_store(&self) -> &ProjectStore {
        &self.inner.project_store
    }

    pub fn status_store(&self) -> &StatusStore {
        &self.inner.status_store
    }

    pub fn task_store(&self) -> &TaskStore {
        &self.inner.task_store
    }

    pub fn daily_entry_store(&self) -> &DailyEntryStore {
        &self.inner.daily_entry_store
    }

    pub fn timesheet_store(&self) -> &TimesheetStore {
        &self.inner.timesheet_store
    }

    pub fn share_issuer(&self) -> &ShareTokenIssuer {
        &self.inner.share_issuer
    }
}
