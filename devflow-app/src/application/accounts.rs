use super::Ledger;
use crate::domain::{NewUser, UserProfile};
use crate::infrastructure::db::{map_db_err, Transactional, TxnError, UserRepository};
use crate::infrastructure::security::InputValidator;
use devflow_errors::AppError;
use sea_orm::DatabaseTransaction;
use uuid::Uuid;

pub struct Accounts {
    ledger: Ledger,
}

impl Accounts {
    pub(crate) fn new(ledger: Ledger) -> Self {
        Self { ledger }
    }

    /// New users start with zero reputation. Email and username are unique.
    pub async fn register_user(&self, new_user: NewUser) -> Result<UserProfile, AppError> {
        let new_user = InputValidator::new_user(&new_user)?;
        let profile = self.ledger.transact(&RegisterUser { new_user }).await?;

        tracing::info!(user_id = %profile.id, username = %profile.username, "User registered");
        Ok(profile)
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<UserProfile, AppError> {
        UserRepository::find_by_id(&self.ledger.db, user_id)
            .await
            .map_err(map_db_err)?
            .map(UserProfile::from)
            .ok_or_else(|| AppError::not_found("User"))
    }
}

struct RegisterUser {
    new_user: NewUser,
}

impl Transactional for RegisterUser {
    type Output = UserProfile;

    fn name(&self) -> &'static str {
        "register_user"
    }

    async fn run(&self, txn: &DatabaseTransaction) -> Result<UserProfile, TxnError> {
        let new_user = &self.new_user;
        if UserRepository::find_by_email_or_username(txn, &new_user.email, &new_user.username)
            .await?
            .is_some()
        {
            return Err(AppError::Forbidden("User already exists".to_string()).into());
        }

        let created = UserRepository::create(txn, new_user).await?;
        Ok(UserProfile::from(created))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestApp;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            name: "Ada Lovelace".to_string(),
            username: username.to_string(),
            email: email.to_string(),
            image: Some("  ".to_string()),
        }
    }

    #[tokio::test]
    async fn test_register_and_fetch() {
        let app = TestApp::new().await;

        let profile = app
            .ctx
            .accounts
            .register_user(new_user("ada", "Ada@Example.com"))
            .await
            .unwrap();
        assert_eq!(profile.reputation, 0);
        assert_eq!(profile.email, "ada@example.com");
        assert_eq!(profile.image, None);

        let fetched = app.ctx.accounts.get_user(profile.id).await.unwrap();
        assert_eq!(fetched.id, profile.id);
        assert_eq!(fetched.username, "ada");
    }

    #[tokio::test]
    async fn test_duplicate_username_or_email_is_forbidden() {
        let app = TestApp::new().await;
        let accounts = &app.ctx.accounts;
        accounts.register_user(new_user("ada", "ada@example.com")).await.unwrap();

        assert!(matches!(
            accounts.register_user(new_user("ada", "other@example.com")).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            accounts.register_user(new_user("countess", "ADA@example.com")).await,
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_register_validation_and_missing_user() {
        let app = TestApp::new().await;

        assert!(matches!(
            app.ctx.accounts.register_user(new_user("a!", "not-an-email")).await,
            Err(AppError::Validation { .. })
        ));
        assert_eq!(
            app.ctx.accounts.get_user(Uuid::new_v4()).await.unwrap_err(),
            AppError::NotFound("User".to_string())
        );
    }
}
