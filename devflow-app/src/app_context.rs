use crate::application::{
    Accounts, AnswerLifecycle, CollectionToggle, InteractionRecorder, InteractionScheduler,
    InteractionWorker, Ledger, QuestionLifecycle, VoteEngine,
};
use crate::config::AppConfig;
use crate::infrastructure::cache::StaleRoutes;
use crate::infrastructure::db::{create_connection, map_db_err, run_migrations};
use devflow_errors::AppError;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppContext {
    pub votes: Arc<VoteEngine>,
    pub answers: Arc<AnswerLifecycle>,
    pub questions: Arc<QuestionLifecycle>,
    pub collections: Arc<CollectionToggle>,
    pub accounts: Arc<Accounts>,
    pub interaction_recorder: InteractionRecorder,
    pub interactions: InteractionScheduler,
    pub stale_routes: StaleRoutes,
    pub config: AppConfig,
    pub(crate) db: DatabaseConnection,
}

impl AppContext {
    /// Connects, brings the schema up to date and starts the interaction
    /// worker. Must be called from inside a tokio runtime.
    pub async fn connect(config: &AppConfig) -> Result<Self, AppError> {
        let db = create_connection(&config.database_url, config.db_max_connections)
            .await
            .map_err(map_db_err)?;
        run_migrations(&db).await.map_err(map_db_err)?;
        tracing::info!(max_connections = config.db_max_connections, "Database connected");

        Ok(Self::from_connection(db, config.clone()))
    }

    pub fn from_connection(db: DatabaseConnection, config: AppConfig) -> Self {
        let retry = config.retry_policy();
        let interaction_recorder = InteractionRecorder::new(db.clone(), retry);
        let (interactions, _worker) = InteractionWorker::spawn(
            interaction_recorder.clone(),
            config.interaction_queue_capacity,
            config.interaction_max_attempts,
            config.txn_retry_base,
        );
        let stale_routes = StaleRoutes::new();

        let ledger = Ledger {
            db: db.clone(),
            retry,
            interactions: interactions.clone(),
            revalidator: Arc::new(stale_routes.clone()),
        };

        Self {
            votes: Arc::new(VoteEngine::new(ledger.clone())),
            answers: Arc::new(AnswerLifecycle::new(ledger.clone())),
            questions: Arc::new(QuestionLifecycle::new(ledger.clone())),
            collections: Arc::new(CollectionToggle::new(ledger.clone())),
            accounts: Arc::new(Accounts::new(ledger)),
            interaction_recorder,
            interactions,
            stale_routes,
            config,
            db,
        }
    }

    /// Waits for queued interactions to be recorded.
    pub async fn shutdown(&self) {
        self.interactions.flush().await;
        tracing::info!("Interaction queue drained");
    }
}
