//! Credential store adapter contract and its PostgreSQL implementation.
//!
//! The trait is the seam between the session service and persistence, so
//! the service can run against PostgreSQL in production and against the
//! in-memory store in tests.

use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

use super::errors::{StoreError, StoreResult};
use crate::auth::{Account, AccountId, NewAccount, ProfileUpdate, Role};

/// Durable mapping from email to credential hash and profile fields
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Find account by normalized email
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>>;

    /// Find account by ID
    async fn find_by_id(&self, account_id: AccountId) -> StoreResult<Option<Account>>;

    /// Insert a new account, assigning its ID and creation time
    ///
    /// Fails with `StoreError::DuplicateEmail` without writing anything if
    /// the email is taken.
    async fn insert(&self, account: NewAccount) -> StoreResult<Account>;

    /// Merge mutable profile fields, returning the updated account or
    /// `None` if no account has that ID
    async fn update_profile(
        &self,
        account_id: AccountId,
        update: &ProfileUpdate,
    ) -> StoreResult<Option<Account>>;

    /// Cheap liveness check
    async fn ping(&self) -> StoreResult<()>;
}

const ACCOUNT_COLUMNS: &str =
    "id, email, credential_hash, role, display_name, active, created_at";

/// Default PostgreSQL implementation of `CredentialStore`
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the `accounts` table and its email uniqueness constraint if missing
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS accounts (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                email TEXT NOT NULL,
                credential_hash TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'customer',
                display_name TEXT NOT NULL,
                active BOOLEAN NOT NULL DEFAULT TRUE,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                CONSTRAINT accounts_email_key UNIQUE (email)
            )",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn account_from_row(row: &PgRow) -> StoreResult<Account> {
    let role: String = row.try_get("role")?;
    Ok(Account {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        credential_hash: row.try_get("credential_hash")?,
        role: role.parse::<Role>().map_err(StoreError::Backend)?,
        display_name: row.try_get("display_name")?,
        active: row.try_get("active")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        let row = sqlx::query(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(account_from_row).transpose()
    }

    async fn find_by_id(&self, account_id: AccountId) -> StoreResult<Option<Account>> {
        let row = sqlx::query(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1"
        ))
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(account_from_row).transpose()
    }

    async fn insert(&self, account: NewAccount) -> StoreResult<Account> {
        let row = sqlx::query(&format!(
            "INSERT INTO accounts (email, credential_hash, role, display_name, active)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(&account.email)
        .bind(&account.credential_hash)
        .bind(account.role.as_str())
        .bind(&account.display_name)
        .bind(account.active)
        .fetch_one(&self.pool)
        .await?;

        account_from_row(&row)
    }

    async fn update_profile(
        &self,
        account_id: AccountId,
        update: &ProfileUpdate,
    ) -> StoreResult<Option<Account>> {
        let row = sqlx::query(&format!(
            "UPDATE accounts SET display_name = COALESCE($2, display_name)
             WHERE id = $1
             RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(account_id)
        .bind(update.name.as_deref())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(account_from_row).transpose()
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, DatabaseConfig};

    async fn pg_store() -> PgCredentialStore {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| DatabaseConfig::development().database_url);
        let config = DatabaseConfig {
            database_url,
            max_connections: 5,
            min_connections: 1,
            ..DatabaseConfig::development()
        };
        let db = Database::new(&config)
            .await
            .expect("Failed to connect to database");
        let store = PgCredentialStore::new(db.pool().clone());
        store.ensure_schema().await.expect("Failed to ensure schema");
        store
    }

    fn new_account(email: &str) -> NewAccount {
        NewAccount {
            email: email.to_string(),
            credential_hash: "$argon2id$v=19$m=8,t=1,p=1$c2FsdA$aGFzaA".to_string(),
            role: Role::Customer,
            display_name: "Ann".to_string(),
            active: true,
        }
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL"]
    async fn test_pg_insert_find_update() {
        let store = pg_store().await;
        let email = format!("{}@example.com", uuid::Uuid::new_v4());

        let account = store.insert(new_account(&email)).await.unwrap();
        assert_eq!(account.email, email);
        assert_eq!(account.role, Role::Customer);
        assert!(account.active);

        let found = store.find_by_email(&email).await.unwrap().unwrap();
        assert_eq!(found.id, account.id);

        let update = ProfileUpdate {
            name: Some("Annie".to_string()),
        };
        let updated = store
            .update_profile(account.id, &update)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.display_name, "Annie");
        assert_eq!(updated.created_at, account.created_at);
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL"]
    async fn test_pg_duplicate_email() {
        let store = pg_store().await;
        let email = format!("{}@example.com", uuid::Uuid::new_v4());

        store.insert(new_account(&email)).await.unwrap();
        let result = store.insert(new_account(&email)).await;
        assert!(matches!(result, Err(StoreError::DuplicateEmail)));
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL"]
    async fn test_pg_missing_account() {
        let store = pg_store().await;
        let id = uuid::Uuid::new_v4();
        assert!(store.find_by_id(id).await.unwrap().is_none());
        assert!(
            store
                .update_profile(id, &ProfileUpdate::default())
                .await
                .unwrap()
                .is_none()
        );
        store.ping().await.unwrap();
    }
}
