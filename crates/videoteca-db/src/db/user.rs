use sqlx::{PgPool, Postgres};
use uuid::Uuid;
use validator::Validate;
use videoteca_core::models::{hash_password, verify_password, NewUser, User};
use videoteca_core::AppError;

use super::errors::{DbOperation, ResultExt};

const ENTITY: &str = "User";

/// Repository for video authors
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Register an author; the password is stored as an argon2 hash
    #[tracing::instrument(skip(self, password), fields(db.table = "users", db.operation = "insert"))]
    pub async fn create_user(&self, username: &str, password: &str) -> Result<User, AppError> {
        let new_user = NewUser::new(username, password);
        new_user.validate()?;

        let password_hash = hash_password(&new_user.password)?;

        let user = sqlx::query_as::<Postgres, User>(
            r#"
            INSERT INTO users (username, password_hash)
            VALUES ($1, $2)
            RETURNING id, username, password_hash, created_at
            "#,
        )
        .bind(&new_user.username)
        .bind(&password_hash)
        .fetch_one(&self.pool)
        .await
        .map_db_err(ENTITY, DbOperation::Insert)?;

        tracing::info!(user_id = %user.id, "User created");
        Ok(user)
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "select", db.record_id = %id))]
    pub async fn get(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<Postgres, User>(
            "SELECT id, username, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "select"))]
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<Postgres, User>(
            "SELECT id, username, password_hash, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "count"))]
    pub async fn count(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Delete an author. Fails with `Protected` while any video references them.
    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "delete", db.record_id = %id))]
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_db_err(ENTITY, DbOperation::Delete)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("{} not found", ENTITY)));
        }

        tracing::info!(user_id = %id, "User deleted");
        Ok(())
    }

    /// Return the user when the username exists and the password matches
    #[tracing::instrument(skip(self, password), fields(db.table = "users", db.operation = "select"))]
    pub async fn verify_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<User>, AppError> {
        let Some(user) = self.get_by_username(username).await? else {
            return Ok(None);
        };

        if verify_password(password, &user.password_hash)? {
            Ok(Some(user))
        } else {
            tracing::debug!(username = %username, "Password mismatch");
            Ok(None)
        }
    }
}
