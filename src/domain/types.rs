//! Shared domain enumerations aligned with persisted database enums.

use serde::{Deserialize, Serialize};

/// Term-numbering scheme of a course (mirrors Postgres enum `scheme_type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "scheme_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SchemeType {
    Semester,
    Year,
}

impl SchemeType {
    pub fn as_str(self) -> &'static str {
        match self {
            SchemeType::Semester => "SEMESTER",
            SchemeType::Year => "YEAR",
        }
    }

    /// Human label used when a term is created without an explicit label.
    pub fn term_label(self, value: i32) -> String {
        match self {
            SchemeType::Semester => format!("Semester {value}"),
            SchemeType::Year => format!("Year {value}"),
        }
    }
}

/// Purpose attached to a one-time code (mirrors Postgres enum `otp_purpose`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "otp_purpose", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OtpPurpose {
    ForgotPassword,
    VerifyEmail,
}

/// The three kinds of uploaded PDF artifacts a subject can hold.
///
/// Passed explicitly from the route definition to the storage resolver so
/// the stored subdirectory never depends on inspecting the request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Syllabus,
    QuestionPaper,
    Notes,
}

impl ArtifactKind {
    /// Subdirectory under the upload root where files of this kind live.
    pub fn directory(self) -> &'static str {
        match self {
            ArtifactKind::Syllabus => "syllabus",
            ArtifactKind::QuestionPaper => "question-papers",
            ArtifactKind::Notes => "notes",
        }
    }
}
