//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::entities::{
    AdminRecord, AdminSessionRecord, CourseRecord, NotesRecord, OtpRecord, QuestionPaperRecord,
    SubjectRecord, SyllabusRecord, TermRecord, UniversityRecord,
};
use crate::domain::types::{OtpPurpose, SchemeType};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

// ============================================================================
// Read models
// ============================================================================
//
// Composite views are the unit of caching, so unlike bare records they
// round-trip through serde in both directions.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniversitySummary {
    #[serde(flatten)]
    pub university: UniversityRecord,
    pub course_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniversityDetail {
    #[serde(flatten)]
    pub university: UniversityRecord,
    pub courses: Vec<CourseRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseSummary {
    #[serde(flatten)]
    pub course: CourseRecord,
    pub university: UniversityRecord,
    pub term_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermWithSubjects {
    #[serde(flatten)]
    pub term: TermRecord,
    pub subjects: Vec<SubjectRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseDetail {
    #[serde(flatten)]
    pub course: CourseRecord,
    pub university: UniversityRecord,
    pub terms: Vec<TermWithSubjects>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermDetail {
    #[serde(flatten)]
    pub term: TermRecord,
    pub course: CourseRecord,
    pub subjects: Vec<SubjectRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArtifactCounts {
    pub syllabus: i64,
    pub question_papers: i64,
    pub notes: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectSummary {
    #[serde(flatten)]
    pub subject: SubjectRecord,
    pub counts: ArtifactCounts,
}

/// Ancestor chain of a subject, materialized for the detail view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectLineage {
    pub term: TermRecord,
    pub course: CourseRecord,
    pub university: UniversityRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectDetail {
    #[serde(flatten)]
    pub subject: SubjectRecord,
    pub lineage: SubjectLineage,
    pub syllabus: Option<SyllabusRecord>,
    pub question_papers: Vec<QuestionPaperRecord>,
    pub notes: Vec<NotesRecord>,
}

/// Descendant rows removed by a cascading delete, collected before the
/// delete runs: ids feed the invalidation closure, file paths feed storage
/// cleanup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CascadeIds {
    pub course_ids: Vec<Uuid>,
    pub term_ids: Vec<Uuid>,
    pub subject_ids: Vec<Uuid>,
    pub file_paths: Vec<String>,
}

// ============================================================================
// Write parameters
// ============================================================================

#[derive(Debug, Clone)]
pub struct CreateUniversityParams {
    pub name: String,
    pub code: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpdateUniversityParams {
    pub id: Uuid,
    pub name: String,
    pub code: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateCourseParams {
    pub university_id: Uuid,
    pub name: String,
    pub code: String,
    pub scheme_type: SchemeType,
}

#[derive(Debug, Clone)]
pub struct UpdateCourseParams {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub scheme_type: SchemeType,
}

#[derive(Debug, Clone)]
pub struct CreateTermParams {
    pub course_id: Uuid,
    pub term_type: SchemeType,
    pub value: i32,
    pub label: String,
}

#[derive(Debug, Clone)]
pub struct UpdateTermParams {
    pub id: Uuid,
    pub value: i32,
    pub label: String,
}

#[derive(Debug, Clone)]
pub struct CreateSubjectParams {
    pub term_id: Uuid,
    pub name: String,
    pub code: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpdateSubjectParams {
    pub id: Uuid,
    pub name: String,
    pub code: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpsertSyllabusParams {
    pub subject_id: Uuid,
    pub file_path: String,
    pub year: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct CreateQuestionPaperParams {
    pub subject_id: Uuid,
    pub file_path: String,
    pub year: i32,
    pub month: String,
}

#[derive(Debug, Clone)]
pub struct UpdateQuestionPaperParams {
    pub id: Uuid,
    pub file_path: String,
    pub year: i32,
    pub month: String,
}

#[derive(Debug, Clone)]
pub struct CreateNotesParams {
    pub subject_id: Uuid,
    pub file_path: String,
    pub unit: i32,
    pub title: String,
}

#[derive(Debug, Clone)]
pub struct CreateAdminSessionParams {
    pub admin_id: Uuid,
    pub token_prefix: String,
    pub hashed_secret: Vec<u8>,
    pub expires_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct CreateOtpParams {
    pub email: String,
    pub code: String,
    pub purpose: OtpPurpose,
    pub expires_at: OffsetDateTime,
}

// ============================================================================
// Traits
// ============================================================================

#[async_trait]
pub trait UniversitiesRepo: Send + Sync {
    async fn list_with_counts(&self) -> Result<Vec<UniversitySummary>, RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UniversityRecord>, RepoError>;

    /// Courses owned by one university, for the detail view.
    async fn list_courses(&self, id: Uuid) -> Result<Vec<CourseRecord>, RepoError>;

    async fn create(&self, params: CreateUniversityParams) -> Result<UniversityRecord, RepoError>;

    async fn update(&self, params: UpdateUniversityParams) -> Result<UniversityRecord, RepoError>;

    async fn delete(&self, id: Uuid) -> Result<(), RepoError>;

    /// Ids and file paths of every descendant row the cascade will remove.
    async fn collect_descendants(&self, id: Uuid) -> Result<CascadeIds, RepoError>;
}

#[async_trait]
pub trait CoursesRepo: Send + Sync {
    async fn list(&self, university_id: Option<Uuid>) -> Result<Vec<CourseSummary>, RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<CourseRecord>, RepoError>;

    async fn term_count(&self, id: Uuid) -> Result<u64, RepoError>;

    async fn create(&self, params: CreateCourseParams) -> Result<CourseRecord, RepoError>;

    async fn update(&self, params: UpdateCourseParams) -> Result<CourseRecord, RepoError>;

    async fn delete(&self, id: Uuid) -> Result<(), RepoError>;

    async fn collect_descendants(&self, id: Uuid) -> Result<CascadeIds, RepoError>;
}

#[async_trait]
pub trait TermsRepo: Send + Sync {
    async fn list_by_course(&self, course_id: Uuid) -> Result<Vec<TermRecord>, RepoError>;

    async fn list_with_subjects(
        &self,
        course_id: Uuid,
    ) -> Result<Vec<TermWithSubjects>, RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<TermRecord>, RepoError>;

    async fn create(&self, params: CreateTermParams) -> Result<TermRecord, RepoError>;

    async fn update(&self, params: UpdateTermParams) -> Result<TermRecord, RepoError>;

    async fn delete(&self, id: Uuid) -> Result<(), RepoError>;

    async fn collect_descendants(&self, id: Uuid) -> Result<CascadeIds, RepoError>;
}

#[async_trait]
pub trait SubjectsRepo: Send + Sync {
    async fn list_by_term(&self, term_id: Uuid) -> Result<Vec<SubjectSummary>, RepoError>;

    /// Flattened view across all terms of a course, kept for the legacy
    /// course-scoped listing.
    async fn list_by_course(&self, course_id: Uuid) -> Result<Vec<SubjectSummary>, RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<SubjectRecord>, RepoError>;

    async fn lineage(&self, term_id: Uuid) -> Result<Option<SubjectLineage>, RepoError>;

    async fn create(&self, params: CreateSubjectParams) -> Result<SubjectRecord, RepoError>;

    async fn update(&self, params: UpdateSubjectParams) -> Result<SubjectRecord, RepoError>;

    async fn delete(&self, id: Uuid) -> Result<(), RepoError>;

    /// File paths of every artifact owned by the subject.
    async fn artifact_paths(&self, id: Uuid) -> Result<Vec<String>, RepoError>;
}

#[async_trait]
pub trait ArtifactsRepo: Send + Sync {
    async fn syllabus_for_subject(
        &self,
        subject_id: Uuid,
    ) -> Result<Option<SyllabusRecord>, RepoError>;

    async fn find_syllabus(&self, id: Uuid) -> Result<Option<SyllabusRecord>, RepoError>;

    async fn upsert_syllabus(
        &self,
        params: UpsertSyllabusParams,
    ) -> Result<SyllabusRecord, RepoError>;

    async fn delete_syllabus(&self, id: Uuid) -> Result<(), RepoError>;

    async fn question_papers_for_subject(
        &self,
        subject_id: Uuid,
    ) -> Result<Vec<QuestionPaperRecord>, RepoError>;

    async fn find_question_paper(
        &self,
        id: Uuid,
    ) -> Result<Option<QuestionPaperRecord>, RepoError>;

    async fn create_question_paper(
        &self,
        params: CreateQuestionPaperParams,
    ) -> Result<QuestionPaperRecord, RepoError>;

    async fn update_question_paper(
        &self,
        params: UpdateQuestionPaperParams,
    ) -> Result<QuestionPaperRecord, RepoError>;

    async fn delete_question_paper(&self, id: Uuid) -> Result<(), RepoError>;

    async fn notes_for_subject(&self, subject_id: Uuid) -> Result<Vec<NotesRecord>, RepoError>;

    async fn find_notes(&self, id: Uuid) -> Result<Option<NotesRecord>, RepoError>;

    async fn create_notes(&self, params: CreateNotesParams) -> Result<NotesRecord, RepoError>;

    async fn delete_notes(&self, id: Uuid) -> Result<(), RepoError>;
}

#[async_trait]
pub trait AdminsRepo: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<AdminRecord>, RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<AdminRecord>, RepoError>;

    async fn update_password(
        &self,
        email: &str,
        password_hash: Vec<u8>,
        password_salt: String,
    ) -> Result<(), RepoError>;

    async fn mark_verified(&self, email: &str) -> Result<(), RepoError>;

    async fn create_session(
        &self,
        params: CreateAdminSessionParams,
    ) -> Result<AdminSessionRecord, RepoError>;

    async fn find_session_by_prefix(
        &self,
        token_prefix: &str,
    ) -> Result<Option<AdminSessionRecord>, RepoError>;

    async fn create_otp(&self, params: CreateOtpParams) -> Result<OtpRecord, RepoError>;

    async fn find_latest_otp(
        &self,
        email: &str,
        purpose: OtpPurpose,
    ) -> Result<Option<OtpRecord>, RepoError>;

    async fn delete_otp(&self, id: Uuid) -> Result<(), RepoError>;

    /// Lazy cleanup: purge expired codes and any prior codes issued for the
    /// same address and purpose.
    async fn purge_stale_otps(
        &self,
        email: &str,
        purpose: OtpPurpose,
        now: OffsetDateTime,
    ) -> Result<(), RepoError>;
}
