//! User repository for database operations

use super::{map_write_error, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use docvault_shared::{Role, UserProfile};
use sqlx::PgPool;
use uuid::Uuid;

/// User record as stored, password hash included
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: Uuid,
    pub fullname: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    /// Identity without the password hash
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            fullname: self.fullname.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

/// Input for creating a user. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub fullname: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// Credential store
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Case-insensitive match
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Fails with `StoreError::AlreadyExists` when the email is taken
    async fn create(&self, user: NewUser) -> Result<UserRecord, StoreError>;
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    fullname: String,
    email: String,
    password_hash: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for UserRecord {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse::<Role>()
            .map_err(|e| StoreError::Other(anyhow::anyhow!(e)))?;
        Ok(UserRecord {
            id: row.id,
            fullname: row.fullname,
            email: row.email,
            password_hash: row.password_hash,
            role,
            created_at: row.created_at,
        })
    }
}

/// PostgreSQL-backed credential store
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, fullname, email, password_hash, role::text AS role, created_at
            FROM users
            WHERE lower(email) = lower($1)
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserRecord::try_from).transpose()
    }

    async fn create(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, fullname, email, password_hash, role)
            VALUES ($1, $2, $3, $4, $5::user_role)
            RETURNING id, fullname, email, password_hash, role::text AS role, created_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(&user.fullname)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;

        row.try_into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(role: &str) -> UserRow {
        UserRow {
            id: Uuid::now_v7(),
            fullname: "Ada".to_string(),
            email: "ada@x.com".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            role: role.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_row_conversion_parses_role() {
        let record = UserRecord::try_from(row("superadmin")).unwrap();
        assert_eq!(record.role, Role::Superadmin);
    }

    #[test]
    fn test_row_conversion_rejects_unknown_role() {
        assert!(matches!(
            UserRecord::try_from(row("root")),
            Err(StoreError::Other(_))
        ));
    }

    #[test]
    fn test_profile_drops_password_hash() {
        let record = UserRecord::try_from(row("user")).unwrap();
        let json = serde_json::to_value(record.profile()).unwrap();
        assert!(!json.to_string().contains("argon2"));
        assert_eq!(json["role"], "user");
    }
}
