//! Admin authentication: password login, bearer sessions, one-time codes.
//!
//! Session tokens follow the `atn_{prefix}_{secret}` shape; only the
//! SHA-256 of the secret is persisted and comparison is constant-time.
//! One-time codes are cleaned up lazily: issuing a new code purges expired
//! codes and prior codes for the same address and purpose.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::error::{AppError, FieldError};
use crate::application::repos::{AdminsRepo, CreateAdminSessionParams, CreateOtpParams};
use crate::domain::entities::AdminRecord;
use crate::domain::types::OtpPurpose;
use crate::infra::mail::{MailMessage, Mailer};

const TOKEN_PREFIX: &str = "atn";
const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Clone)]
pub struct AuthOptions {
    pub session_ttl: Duration,
    pub otp_length: usize,
    pub otp_expiry: Duration,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub is_verified: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<AdminRecord> for AdminProfile {
    fn from(record: AdminRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            email: record.email,
            is_verified: record.is_verified,
            created_at: record.created_at,
        }
    }
}

/// Authenticated admin attached to the request by the session middleware.
#[derive(Debug, Clone)]
pub struct AdminPrincipal {
    pub admin_id: Uuid,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionIssued {
    pub token: String,
    pub admin: AdminProfile,
}

#[derive(Clone)]
pub struct AuthService {
    repo: Arc<dyn AdminsRepo>,
    mailer: Arc<dyn Mailer>,
    options: AuthOptions,
}

impl AuthService {
    pub fn new(repo: Arc<dyn AdminsRepo>, mailer: Arc<dyn Mailer>, options: AuthOptions) -> Self {
        Self {
            repo,
            mailer,
            options,
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<SessionIssued, AppError> {
        let admin = self
            .repo
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::unauthorized("invalid credentials"))?;

        if !admin.is_verified {
            return Err(AppError::unauthorized(
                "email not verified; verify your email first",
            ));
        }

        let hashed_input = hash_password(&admin.password_salt, password);
        if admin.password_hash.ct_eq(&hashed_input).unwrap_u8() == 0 {
            return Err(AppError::unauthorized("invalid credentials"));
        }

        let prefix = generate_prefix();
        let secret = generate_secret();
        let token = format!("{TOKEN_PREFIX}_{prefix}_{secret}");
        let expires_at = OffsetDateTime::now_utc() + self.options.session_ttl;

        self.repo
            .create_session(CreateAdminSessionParams {
                admin_id: admin.id,
                token_prefix: prefix,
                hashed_secret: hash_secret(&secret),
                expires_at,
            })
            .await?;

        Ok(SessionIssued {
            token,
            admin: AdminProfile::from(admin),
        })
    }

    pub async fn authenticate(&self, token: &str) -> Result<AdminPrincipal, AppError> {
        let parsed =
            parse_token(token).ok_or_else(|| AppError::unauthorized("invalid session token"))?;

        let session = self
            .repo
            .find_session_by_prefix(&parsed.prefix)
            .await?
            .ok_or_else(|| AppError::unauthorized("invalid session token"))?;

        if session.expires_at <= OffsetDateTime::now_utc() {
            return Err(AppError::unauthorized("session expired"));
        }

        let hashed_input = hash_secret(&parsed.secret);
        if session.hashed_secret.ct_eq(&hashed_input).unwrap_u8() == 0 {
            return Err(AppError::unauthorized("invalid session token"));
        }

        let admin = self
            .repo
            .find_by_id(session.admin_id)
            .await?
            .ok_or_else(|| AppError::unauthorized("invalid session token"))?;

        Ok(AdminPrincipal {
            admin_id: admin.id,
            email: admin.email,
            name: admin.name,
        })
    }

    pub async fn forgot_password(&self, email: &str) -> Result<(), AppError> {
        self.repo
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::not_found("admin"))?;

        let code = self.issue_otp(email, OtpPurpose::ForgotPassword).await?;
        self.send_code_mail(
            email,
            "Your password reset code",
            &code,
        )
        .await
    }

    pub async fn send_verification_otp(&self, email: &str) -> Result<(), AppError> {
        let admin = self
            .repo
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::not_found("admin"))?;

        if admin.is_verified {
            return Err(AppError::validation("email already verified"));
        }

        let code = self.issue_otp(email, OtpPurpose::VerifyEmail).await?;
        self.send_code_mail(
            email,
            "Your email verification code",
            &code,
        )
        .await
    }

    pub async fn verify_otp(
        &self,
        email: &str,
        code: &str,
        purpose: OtpPurpose,
    ) -> Result<(), AppError> {
        let record = self
            .repo
            .find_latest_otp(email, purpose)
            .await?
            .ok_or_else(|| AppError::not_found("one-time code"))?;

        if record.expires_at <= OffsetDateTime::now_utc() {
            self.repo.delete_otp(record.id).await?;
            return Err(AppError::validation("one-time code has expired"));
        }

        if record.code.as_bytes().ct_eq(code.as_bytes()).unwrap_u8() == 0 {
            return Err(AppError::validation("invalid one-time code"));
        }

        // A code is single-use regardless of purpose.
        self.repo.delete_otp(record.id).await?;

        if purpose == OtpPurpose::VerifyEmail {
            self.repo.mark_verified(email).await?;
        }

        Ok(())
    }

    pub async fn reset_password(&self, email: &str, new_password: &str) -> Result<(), AppError> {
        if new_password.trim().is_empty() {
            return Err(AppError::validation_fields(
                "Validation failed",
                vec![FieldError::new("newPassword", "newPassword is required")],
            ));
        }

        self.repo
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::not_found("admin"))?;

        let salt = generate_salt();
        let hash = hash_password(&salt, new_password);
        self.repo.update_password(email, hash, salt).await?;
        Ok(())
    }

    pub async fn profile(&self, admin_id: Uuid) -> Result<AdminProfile, AppError> {
        let admin = self
            .repo
            .find_by_id(admin_id)
            .await?
            .ok_or_else(|| AppError::not_found("admin"))?;
        Ok(AdminProfile::from(admin))
    }

    async fn issue_otp(&self, email: &str, purpose: OtpPurpose) -> Result<String, AppError> {
        let now = OffsetDateTime::now_utc();
        self.repo.purge_stale_otps(email, purpose, now).await?;

        let code = generate_code(self.options.otp_length);
        self.repo
            .create_otp(CreateOtpParams {
                email: email.to_string(),
                code: code.clone(),
                purpose,
                expires_at: now + self.options.otp_expiry,
            })
            .await?;
        Ok(code)
    }

    async fn send_code_mail(
        &self,
        email: &str,
        subject: &str,
        code: &str,
    ) -> Result<(), AppError> {
        let minutes = self.options.otp_expiry.as_secs() / 60;
        let message = MailMessage {
            to: email.to_string(),
            subject: subject.to_string(),
            body: format!("Your one-time code is {code}. It expires in {minutes} minutes."),
        };

        // Mail is the sole delivery path for codes, so failures surface
        // instead of degrading.
        self.mailer
            .send(message)
            .await
            .map_err(|error| AppError::upstream(error.to_string()))
    }
}

pub fn hash_password(salt: &str, password: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hasher.finalize().to_vec()
}

pub fn generate_salt() -> String {
    Uuid::new_v4().simple().to_string()
}

fn hash_secret(secret: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.finalize().to_vec()
}

fn generate_prefix() -> String {
    Uuid::new_v4().simple().to_string()[..12].to_string()
}

fn generate_secret() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

fn generate_code(length: usize) -> String {
    let mut digits = String::with_capacity(length);
    while digits.len() < length {
        for byte in Uuid::new_v4().as_bytes() {
            if digits.len() == length {
                break;
            }
            digits.push(char::from(b'0' + (byte % 10)));
        }
    }
    digits
}

struct ParsedToken {
    prefix: String,
    secret: String,
}

fn parse_token(token: &str) -> Option<ParsedToken> {
    let mut parts = token.splitn(3, '_');
    let prefix_tag = parts.next()?;
    if prefix_tag != TOKEN_PREFIX {
        return None;
    }
    let prefix = parts.next()?;
    let secret = parts.next()?;
    if secret.len() < MIN_SECRET_LEN || prefix.is_empty() {
        return None;
    }
    Some(ParsedToken {
        prefix: prefix.to_string(),
        secret: secret.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::application::repos::RepoError;
    use crate::domain::entities::{AdminSessionRecord, OtpRecord};
    use crate::infra::mail::MailError;

    #[derive(Default)]
    struct FakeAdminsRepo {
        admin: Mutex<Option<AdminRecord>>,
        sessions: Mutex<Vec<AdminSessionRecord>>,
        otps: Mutex<Vec<OtpRecord>>,
    }

    impl FakeAdminsRepo {
        fn with_admin(password: &str, is_verified: bool) -> Self {
            let salt = generate_salt();
            let repo = Self::default();
            *repo.admin.lock().unwrap() = Some(AdminRecord {
                id: Uuid::new_v4(),
                name: "Admin".to_string(),
                email: "admin@example.edu".to_string(),
                password_hash: hash_password(&salt, password),
                password_salt: salt,
                is_verified,
                created_at: OffsetDateTime::now_utc(),
            });
            repo
        }
    }

    #[async_trait]
    impl AdminsRepo for FakeAdminsRepo {
        async fn find_by_email(&self, email: &str) -> Result<Option<AdminRecord>, RepoError> {
            Ok(self
                .admin
                .lock()
                .unwrap()
                .clone()
                .filter(|admin| admin.email == email))
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<AdminRecord>, RepoError> {
            Ok(self
                .admin
                .lock()
                .unwrap()
                .clone()
                .filter(|admin| admin.id == id))
        }

        async fn update_password(
            &self,
            _email: &str,
            password_hash: Vec<u8>,
            password_salt: String,
        ) -> Result<(), RepoError> {
            let mut admin = self.admin.lock().unwrap();
            if let Some(admin) = admin.as_mut() {
                admin.password_hash = password_hash;
                admin.password_salt = password_salt;
            }
            Ok(())
        }

        async fn mark_verified(&self, _email: &str) -> Result<(), RepoError> {
            let mut admin = self.admin.lock().unwrap();
            if let Some(admin) = admin.as_mut() {
                admin.is_verified = true;
            }
            Ok(())
        }

        async fn create_session(
            &self,
            params: CreateAdminSessionParams,
        ) -> Result<AdminSessionRecord, RepoError> {
            let record = AdminSessionRecord {
                id: Uuid::new_v4(),
                admin_id: params.admin_id,
                token_prefix: params.token_prefix,
                hashed_secret: params.hashed_secret,
                expires_at: params.expires_at,
                created_at: OffsetDateTime::now_utc(),
            };
            self.sessions.lock().unwrap().push(record.clone());
            Ok(record)
        }

        async fn find_session_by_prefix(
            &self,
            token_prefix: &str,
        ) -> Result<Option<AdminSessionRecord>, RepoError> {
            Ok(self
                .sessions
                .lock()
                .unwrap()
                .iter()
                .find(|session| session.token_prefix == token_prefix)
                .cloned())
        }

        async fn create_otp(&self, params: CreateOtpParams) -> Result<OtpRecord, RepoError> {
            let record = OtpRecord {
                id: Uuid::new_v4(),
                email: params.email,
                code: params.code,
                purpose: params.purpose,
                expires_at: params.expires_at,
                created_at: OffsetDateTime::now_utc(),
            };
            self.otps.lock().unwrap().push(record.clone());
            Ok(record)
        }

        async fn find_latest_otp(
            &self,
            email: &str,
            purpose: OtpPurpose,
        ) -> Result<Option<OtpRecord>, RepoError> {
            Ok(self
                .otps
                .lock()
                .unwrap()
                .iter()
                .filter(|otp| otp.email == email && otp.purpose == purpose)
                .max_by_key(|otp| otp.created_at)
                .cloned())
        }

        async fn delete_otp(&self, id: Uuid) -> Result<(), RepoError> {
            self.otps.lock().unwrap().retain(|otp| otp.id != id);
            Ok(())
        }

        async fn purge_stale_otps(
            &self,
            email: &str,
            purpose: OtpPurpose,
            now: OffsetDateTime,
        ) -> Result<(), RepoError> {
            self.otps.lock().unwrap().retain(|otp| {
                otp.expires_at > now && !(otp.email == email && otp.purpose == purpose)
            });
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<MailMessage>>,
        fail: bool,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, message: MailMessage) -> Result<(), MailError> {
            if self.fail {
                return Err(MailError::Delivery("smtp relay refused".to_string()));
            }
            self.sent.lock().unwrap().push(message);
            Ok(())
        }
    }

    fn options() -> AuthOptions {
        AuthOptions {
            session_ttl: Duration::from_secs(3600),
            otp_length: 6,
            otp_expiry: Duration::from_secs(600),
        }
    }

    #[tokio::test]
    async fn login_roundtrip_authenticates() {
        let repo = Arc::new(FakeAdminsRepo::with_admin("hunter2hunter2", true));
        let service = AuthService::new(repo, Arc::new(RecordingMailer::default()), options());

        let issued = service
            .login("admin@example.edu", "hunter2hunter2")
            .await
            .expect("login");
        assert!(issued.token.starts_with("atn_"));

        let principal = service
            .authenticate(&issued.token)
            .await
            .expect("token authenticates");
        assert_eq!(principal.email, "admin@example.edu");
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let repo = Arc::new(FakeAdminsRepo::with_admin("correct-password", true));
        let service = AuthService::new(repo, Arc::new(RecordingMailer::default()), options());

        let result = service.login("admin@example.edu", "wrong-password").await;
        assert!(matches!(result, Err(AppError::Unauthorized { .. })));
    }

    #[tokio::test]
    async fn unverified_admin_cannot_login() {
        let repo = Arc::new(FakeAdminsRepo::with_admin("hunter2hunter2", false));
        let service = AuthService::new(repo, Arc::new(RecordingMailer::default()), options());

        let result = service.login("admin@example.edu", "hunter2hunter2").await;
        assert!(matches!(result, Err(AppError::Unauthorized { .. })));
    }

    #[tokio::test]
    async fn tampered_token_is_rejected() {
        let repo = Arc::new(FakeAdminsRepo::with_admin("hunter2hunter2", true));
        let service = AuthService::new(repo, Arc::new(RecordingMailer::default()), options());

        let issued = service
            .login("admin@example.edu", "hunter2hunter2")
            .await
            .expect("login");

        let mut tampered = issued.token.clone();
        tampered.pop();
        tampered.push('x');

        let result = service.authenticate(&tampered).await;
        assert!(matches!(result, Err(AppError::Unauthorized { .. })));
    }

    #[tokio::test]
    async fn otp_verification_consumes_code_and_marks_verified() {
        let repo = Arc::new(FakeAdminsRepo::with_admin("hunter2hunter2", false));
        let mailer = Arc::new(RecordingMailer::default());
        let service = AuthService::new(repo.clone(), mailer.clone(), options());

        service
            .send_verification_otp("admin@example.edu")
            .await
            .expect("otp issued");

        let code = {
            let otps = repo.otps.lock().unwrap();
            otps.last().expect("stored otp").code.clone()
        };
        assert_eq!(code.len(), 6);
        assert_eq!(mailer.sent.lock().unwrap().len(), 1);

        service
            .verify_otp("admin@example.edu", &code, OtpPurpose::VerifyEmail)
            .await
            .expect("verify");

        assert!(repo.admin.lock().unwrap().as_ref().unwrap().is_verified);
        // The code is single-use.
        let result = service
            .verify_otp("admin@example.edu", &code, OtpPurpose::VerifyEmail)
            .await;
        assert!(matches!(result, Err(AppError::NotFound { .. })));
    }

    #[tokio::test]
    async fn expired_otp_is_rejected_and_deleted() {
        let repo = Arc::new(FakeAdminsRepo::with_admin("hunter2hunter2", true));
        let service = AuthService::new(
            repo.clone(),
            Arc::new(RecordingMailer::default()),
            AuthOptions {
                otp_expiry: Duration::ZERO,
                ..options()
            },
        );

        service
            .forgot_password("admin@example.edu")
            .await
            .expect("otp issued");
        let code = {
            let otps = repo.otps.lock().unwrap();
            otps.last().expect("stored otp").code.clone()
        };

        let result = service
            .verify_otp("admin@example.edu", &code, OtpPurpose::ForgotPassword)
            .await;
        assert!(matches!(result, Err(AppError::Validation { .. })));
        assert!(repo.otps.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn mail_failure_surfaces_as_upstream() {
        let repo = Arc::new(FakeAdminsRepo::with_admin("hunter2hunter2", true));
        let mailer = Arc::new(RecordingMailer {
            fail: true,
            ..RecordingMailer::default()
        });
        let service = AuthService::new(repo, mailer, options());

        let result = service.forgot_password("admin@example.edu").await;
        assert!(matches!(result, Err(AppError::Upstream { .. })));
    }

    #[tokio::test]
    async fn reset_password_takes_effect() {
        let repo = Arc::new(FakeAdminsRepo::with_admin("old-password-123", true));
        let service = AuthService::new(repo, Arc::new(RecordingMailer::default()), options());

        service
            .reset_password("admin@example.edu", "new-password-456")
            .await
            .expect("reset");

        assert!(service
            .login("admin@example.edu", "old-password-123")
            .await
            .is_err());
        service
            .login("admin@example.edu", "new-password-456")
            .await
            .expect("login with new password");
    }
}
