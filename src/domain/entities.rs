//! Domain entities mirrored from persistent storage.
//!
//! Records derive `Deserialize` as well as `Serialize` because cached read
//! models round-trip through the cache store as JSON.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::types::{OtpPurpose, SchemeType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniversityRecord {
    pub id: Uuid,
    pub name: String,
    pub code: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseRecord {
    pub id: Uuid,
    pub university_id: Uuid,
    pub name: String,
    pub code: String,
    pub scheme_type: SchemeType,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermRecord {
    pub id: Uuid,
    pub course_id: Uuid,
    pub term_type: SchemeType,
    pub value: i32,
    pub label: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectRecord {
    pub id: Uuid,
    pub term_id: Uuid,
    pub name: String,
    pub code: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// At most one syllabus exists per subject; uploads replace in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyllabusRecord {
    pub id: Uuid,
    pub subject_id: Uuid,
    pub file_path: String,
    pub year: Option<i32>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionPaperRecord {
    pub id: Uuid,
    pub subject_id: Uuid,
    pub file_path: String,
    pub year: i32,
    pub month: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotesRecord {
    pub id: Uuid,
    pub subject_id: Uuid,
    pub file_path: String,
    pub unit: i32,
    pub title: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: Vec<u8>,
    #[serde(skip_serializing)]
    pub password_salt: String,
    pub is_verified: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdminSessionRecord {
    pub id: Uuid,
    pub admin_id: Uuid,
    pub token_prefix: String,
    pub hashed_secret: Vec<u8>,
    pub expires_at: OffsetDateTime,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OtpRecord {
    pub id: Uuid,
    pub email: String,
    pub code: String,
    pub purpose: OtpPurpose,
    pub expires_at: OffsetDateTime,
    pub created_at: OffsetDateTime,
}
