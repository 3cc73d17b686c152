use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{
    ArtifactsRepo, CreateNotesParams, CreateQuestionPaperParams, RepoError,
    UpdateQuestionPaperParams, UpsertSyllabusParams,
};
use crate::domain::entities::{NotesRecord, QuestionPaperRecord, SyllabusRecord};

use super::util::map_sqlx_error;
use super::PostgresRepositories;

#[derive(sqlx::FromRow)]
struct SyllabusRow {
    id: Uuid,
    subject_id: Uuid,
    file_path: String,
    year: Option<i32>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<SyllabusRow> for SyllabusRecord {
    fn from(row: SyllabusRow) -> Self {
        Self {
            id: row.id,
            subject_id: row.subject_id,
            file_path: row.file_path,
            year: row.year,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct QuestionPaperRow {
    id: Uuid,
    subject_id: Uuid,
    file_path: String,
    year: i32,
    month: String,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<QuestionPaperRow> for QuestionPaperRecord {
    fn from(row: QuestionPaperRow) -> Self {
        Self {
            id: row.id,
            subject_id: row.subject_id,
            file_path: row.file_path,
            year: row.year,
            month: row.month,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct NotesRow {
    id: Uuid,
    subject_id: Uuid,
    file_path: String,
    unit: i32,
    title: String,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<NotesRow> for NotesRecord {
    fn from(row: NotesRow) -> Self {
        Self {
            id: row.id,
            subject_id: row.subject_id,
            file_path: row.file_path,
            unit: row.unit,
            title: row.title,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl ArtifactsRepo for PostgresRepositories {
    async fn syllabus_for_subject(
        &self,
        subject_id: Uuid,
    ) -> Result<Option<SyllabusRecord>, RepoError> {
        let row = sqlx::query_as::<_, SyllabusRow>(
            r#"
            SELECT id, subject_id, file_path, year, created_at, updated_at
            FROM syllabus
            WHERE subject_id = $1
            "#,
        )
        .bind(subject_id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(SyllabusRecord::from))
    }

    async fn find_syllabus(&self, id: Uuid) -> Result<Option<SyllabusRecord>, RepoError> {
        let row = sqlx::query_as::<_, SyllabusRow>(
            r#"
            SELECT id, subject_id, file_path, year, created_at, updated_at
            FROM syllabus
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(SyllabusRecord::from))
    }

    async fn upsert_syllabus(
        &self,
        params: UpsertSyllabusParams,
    ) -> Result<SyllabusRecord, RepoError> {
        let row = sqlx::query_as::<_, SyllabusRow>(
            r#"
            INSERT INTO syllabus (id, subject_id, file_path, year, created_at, updated_at)
            VALUES ($1, $2, $3, $4, now(), now())
            ON CONFLICT (subject_id) DO UPDATE
            SET file_path = EXCLUDED.file_path,
                year = EXCLUDED.year,
                updated_at = now()
            RETURNING id, subject_id, file_path, year, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(params.subject_id)
        .bind(params.file_path)
        .bind(params.year)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(SyllabusRecord::from(row))
    }

    async fn delete_syllabus(&self, id: Uuid) -> Result<(), RepoError> {
        sqlx::query("DELETE FROM syllabus WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn question_papers_for_subject(
        &self,
        subject_id: Uuid,
    ) -> Result<Vec<QuestionPaperRecord>, RepoError> {
        let rows = sqlx::query_as::<_, QuestionPaperRow>(
            r#"
            SELECT id, subject_id, file_path, year, month, created_at, updated_at
            FROM question_papers
            WHERE subject_id = $1
            ORDER BY year DESC, month ASC
            "#,
        )
        .bind(subject_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(QuestionPaperRecord::from).collect())
    }

    async fn find_question_paper(
        &self,
        id: Uuid,
    ) -> Result<Option<QuestionPaperRecord>, RepoError> {
        let row = sqlx::query_as::<_, QuestionPaperRow>(
            r#"
            SELECT id, subject_id, file_path, year, month, created_at, updated_at
            FROM question_papers
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(QuestionPaperRecord::from))
    }

    async fn create_question_paper(
        &self,
        params: CreateQuestionPaperParams,
    ) -> Result<QuestionPaperRecord, RepoError> {
        let row = sqlx::query_as::<_, QuestionPaperRow>(
            r#"
            INSERT INTO question_papers (id, subject_id, file_path, year, month, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, now(), now())
            RETURNING id, subject_id, file_path, year, month, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(params.subject_id)
        .bind(params.file_path)
        .bind(params.year)
        .bind(params.month)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(QuestionPaperRecord::from(row))
    }

    async fn update_question_paper(
        &self,
        params: UpdateQuestionPaperParams,
    ) -> Result<QuestionPaperRecord, RepoError> {
        let row = sqlx::query_as::<_, QuestionPaperRow>(
            r#"
            UPDATE question_papers
            SET file_path = $2, year = $3, month = $4, updated_at = now()
            WHERE id = $1
            RETURNING id, subject_id, file_path, year, month, created_at, updated_at
            "#,
        )
        .bind(params.id)
        .bind(params.file_path)
        .bind(params.year)
        .bind(params.month)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(QuestionPaperRecord::from(row))
    }

    async fn delete_question_paper(&self, id: Uuid) -> Result<(), RepoError> {
        sqlx::query("DELETE FROM question_papers WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn notes_for_subject(&self, subject_id: Uuid) -> Result<Vec<NotesRecord>, RepoError> {
        let rows = sqlx::query_as::<_, NotesRow>(
            r#"
            SELECT id, subject_id, file_path, unit, title, created_at, updated_at
            FROM notes
            WHERE subject_id = $1
            ORDER BY unit ASC
            "#,
        )
        .bind(subject_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(NotesRecord::from).collect())
    }

    async fn find_notes(&self, id: Uuid) -> Result<Option<NotesRecord>, RepoError> {
        let row = sqlx::query_as::<_, NotesRow>(
            r#"
            SELECT id, subject_id, file_path, unit, title, created_at, updated_at
            FROM notes
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(NotesRecord::from))
    }

    async fn create_notes(&self, params: CreateNotesParams) -> Result<NotesRecord, RepoError> {
        let row = sqlx::query_as::<_, NotesRow>(
            r#"
            INSERT INTO notes (id, subject_id, file_path, unit, title, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, now(), now())
            RETURNING id, subject_id, file_path, unit, title, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(params.subject_id)
        .bind(params.file_path)
        .bind(params.unit)
        .bind(params.title)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(NotesRecord::from(row))
    }

    async fn delete_notes(&self, id: Uuid) -> Result<(), RepoError> {
        sqlx::query("DELETE FROM notes WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }
}
