use std::sync::Arc;

use anyhow::Context;
use tk_config::TraceKitConfig;
use tk_core::identity::RequestContext;
use tk_db::TraceDb;
use tk_db::locks::LeaseLockService;
use tk_engine::{EngineOptions, TraceService};

use crate::cli::GlobalFlags;

/// Shared application resources initialized once at startup.
pub struct AppContext {
    pub service: TraceService,
    pub request: RequestContext,
}

impl AppContext {
    /// Open the configured database and wire the engine on top of it.
    pub async fn init(config: &TraceKitConfig, flags: &GlobalFlags) -> anyhow::Result<Self> {
        if config.database.is_in_memory() {
            tracing::warn!("database.path is :memory:; nothing will persist after this command");
        }

        let db = Arc::new(
            TraceDb::open_local(&config.database.path)
                .await
                .with_context(|| format!("failed to open trace database at {}", config.database.path))?,
        );
        let locks = LeaseLockService::from_config(db.clone(), &config.lock);
        let service = TraceService::new(
            db.clone(),
            db,
            Arc::new(locks),
            EngineOptions::from(&config.general),
        );

        Ok(Self {
            service,
            request: RequestContext::new(
                flags.workspace.as_str(),
                flags.workspace.as_str(),
                flags.user.as_str(),
            ),
        })
    }
}
