use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{
    AdminsRepo, CreateAdminSessionParams, CreateOtpParams, RepoError,
};
use crate::domain::entities::{AdminRecord, AdminSessionRecord, OtpRecord};
use crate::domain::types::OtpPurpose;

use super::util::map_sqlx_error;
use super::PostgresRepositories;

#[derive(sqlx::FromRow)]
struct AdminRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: Vec<u8>,
    password_salt: String,
    is_verified: bool,
    created_at: OffsetDateTime,
}

impl From<AdminRow> for AdminRecord {
    fn from(row: AdminRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            password_salt: row.password_salt,
            is_verified: row.is_verified,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AdminSessionRow {
    id: Uuid,
    admin_id: Uuid,
    token_prefix: String,
    hashed_secret: Vec<u8>,
    expires_at: OffsetDateTime,
    created_at: OffsetDateTime,
}

impl From<AdminSessionRow> for AdminSessionRecord {
    fn from(row: AdminSessionRow) -> Self {
        Self {
            id: row.id,
            admin_id: row.admin_id,
            token_prefix: row.token_prefix,
            hashed_secret: row.hashed_secret,
            expires_at: row.expires_at,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct OtpRow {
    id: Uuid,
    email: String,
    code: String,
    purpose: OtpPurpose,
    expires_at: OffsetDateTime,
    created_at: OffsetDateTime,
}

impl From<OtpRow> for OtpRecord {
    fn from(row: OtpRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            code: row.code,
            purpose: row.purpose,
            expires_at: row.expires_at,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl AdminsRepo for PostgresRepositories {
    async fn find_by_email(&self, email: &str) -> Result<Option<AdminRecord>, RepoError> {
        let row = sqlx::query_as::<_, AdminRow>(
            r#"
            SELECT id, name, email, password_hash, password_salt, is_verified, created_at
            FROM admins
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(AdminRecord::from))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<AdminRecord>, RepoError> {
        let row = sqlx::query_as::<_, AdminRow>(
            r#"
            SELECT id, name, email, password_hash, password_salt, is_verified, created_at
            FROM admins
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(AdminRecord::from))
    }

    async fn update_password(
        &self,
        email: &str,
        password_hash: Vec<u8>,
        password_salt: String,
    ) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            UPDATE admins
            SET password_hash = $2, password_salt = $3
            WHERE email = $1
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .bind(password_salt)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn mark_verified(&self, email: &str) -> Result<(), RepoError> {
        sqlx::query("UPDATE admins SET is_verified = TRUE WHERE email = $1")
            .bind(email)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn create_session(
        &self,
        params: CreateAdminSessionParams,
    ) -> Result<AdminSessionRecord, RepoError> {
        let row = sqlx::query_as::<_, AdminSessionRow>(
            r#"
            INSERT INTO admin_sessions (id, admin_id, token_prefix, hashed_secret, expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5, now())
            RETURNING id, admin_id, token_prefix, hashed_secret, expires_at, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(params.admin_id)
        .bind(params.token_prefix)
        .bind(params.hashed_secret)
        .bind(params.expires_at)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(AdminSessionRecord::from(row))
    }

    async fn find_session_by_prefix(
        &self,
        token_prefix: &str,
    ) -> Result<Option<AdminSessionRecord>, RepoError> {
        let row = sqlx::query_as::<_, AdminSessionRow>(
            r#"
            SELECT id, admin_id, token_prefix, hashed_secret, expires_at, created_at
            FROM admin_sessions
            WHERE token_prefix = $1
            "#,
        )
        .bind(token_prefix)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(AdminSessionRecord::from))
    }

    async fn create_otp(&self, params: CreateOtpParams) -> Result<OtpRecord, RepoError> {
        let row = sqlx::query_as::<_, OtpRow>(
            r#"
            INSERT INTO otps (id, email, code, purpose, expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5, now())
            RETURNING id, email, code, purpose, expires_at, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(params.email)
        .bind(params.code)
        .bind(params.purpose)
        .bind(params.expires_at)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(OtpRecord::from(row))
    }

    async fn find_latest_otp(
        &self,
        email: &str,
        purpose: OtpPurpose,
    ) -> Result<Option<OtpRecord>, RepoError> {
        let row = sqlx::query_as::<_, OtpRow>(
            r#"
            SELECT id, email, code, purpose, expires_at, created_at
            FROM otps
            WHERE email = $1 AND purpose = $2
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(email)
        .bind(purpose)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(OtpRecord::from))
    }

    async fn delete_otp(&self, id: Uuid) -> Result<(), RepoError> {
        sqlx::query("DELETE FROM otps WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn purge_stale_otps(
        &self,
        email: &str,
        purpose: OtpPurpose,
        now: OffsetDateTime,
    ) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            DELETE FROM otps
            WHERE expires_at < $3 OR (email = $1 AND purpose = $2)
            "#,
        )
        .bind(email)
        .bind(purpose)
        .bind(now)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }
}
