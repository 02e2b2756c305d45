use devflow_errors::AppError;
use tower_sessions::Session;
use uuid::Uuid;

/// Written by the sign-in layer in front of this service.
pub const USER_ID_KEY: &str = "user_id";

/// The signed-in user, if any.
pub async fn actor_id(session: &Session) -> Result<Option<Uuid>, AppError> {
    session.get::<Uuid>(USER_ID_KEY).await.map_err(|e| {
        tracing::error!("Session lookup failed: {}", e);
        AppError::Persistence("session store unavailable".to_string())
    })
}
