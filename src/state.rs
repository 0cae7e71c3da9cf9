use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::auth::session::{PgRoleDirectory, Role, RoleDirectory, Roles, StaticRoleDirectory};
use crate::clock::SystemClock;
use crate::config::AppConfig;
use crate::db;
use crate::engine::DecisionEngine;
use crate::errors::AppError;
use crate::models::evaluator::{Evaluator, PgDirectory, StaticDirectory};
use crate::models::proposal::{MemoryRegistry, PgRegistry};
use crate::notify::{LogSink, NotificationSink, PgOutbox, QueueDispatcher, spawn_delivery_worker};

const DIRECTORY_SEED: &str = include_str!("../data/seed/directory.json");

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub engine: DecisionEngine,
    pub roles: Arc<dyn RoleDirectory>,
}

#[derive(Debug, Deserialize)]
struct DirectorySeed {
    evaluators: Vec<Evaluator>,
    actors: HashMap<String, Vec<Role>>,
}

fn load_seed() -> Result<DirectorySeed, AppError> {
    Ok(serde_json::from_str(DIRECTORY_SEED)?)
}

impl AppState {
    /// Wire the collaborators for `config`: Postgres when a database URL is
    /// configured, otherwise in-memory with the seeded directory.
    ///
    /// Spawns the notification delivery worker, so this must run inside a
    /// tokio runtime.
    pub async fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let (dispatcher, rx) = QueueDispatcher::new();

        let state = match &config.database_url {
            Some(url) => {
                let pool = db::init_pool(url, config.db_max_connections).await?;
                db::run_migrations(&pool).await?;
                let sink: Arc<dyn NotificationSink> = Arc::new(PgOutbox::new(pool.clone()));
                spawn_delivery_worker(rx, sink, config.notify);
                AppState {
                    engine: DecisionEngine::new(
                        Arc::new(PgRegistry::new(pool.clone())),
                        Arc::new(PgDirectory::new(pool.clone())),
                        Arc::new(dispatcher),
                        Arc::new(SystemClock),
                    ),
                    roles: Arc::new(PgRoleDirectory::new(pool)),
                }
            }
            None => {
                log::warn!("No DATABASE_URL set, using the in-memory registry (data lost on restart)");
                let seed = load_seed()?;
                log::info!(
                    "Seeded {} evaluators and {} actors",
                    seed.evaluators.len(),
                    seed.actors.len()
                );
                let roles: HashMap<String, Roles> = seed
                    .actors
                    .into_iter()
                    .map(|(id, roles)| (id, roles.into_iter().collect()))
                    .collect();
                spawn_delivery_worker(rx, Arc::new(LogSink), config.notify);
                AppState {
                    engine: DecisionEngine::new(
                        Arc::new(MemoryRegistry::new()),
                        Arc::new(StaticDirectory::new(seed.evaluators)),
                        Arc::new(dispatcher),
                        Arc::new(SystemClock),
                    ),
                    roles: Arc::new(StaticRoleDirectory::new(roles)),
                }
            }
        };
        Ok(state)
    }
}
