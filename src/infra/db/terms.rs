use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{
    CascadeIds, CreateTermParams, RepoError, TermWithSubjects, TermsRepo, UpdateTermParams,
};
use crate::domain::entities::{SubjectRecord, TermRecord};
use crate::domain::types::SchemeType;

use super::subjects::SubjectRow;
use super::util::map_sqlx_error;
use super::PostgresRepositories;

#[derive(sqlx::FromRow)]
pub(crate) struct TermRow {
    pub id: Uuid,
    pub course_id: Uuid,
    pub term_type: SchemeType,
    pub value: i32,
    pub label: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<TermRow> for TermRecord {
    fn from(row: TermRow) -> Self {
        Self {
            id: row.id,
            course_id: row.course_id,
            term_type: row.term_type,
            value: row.value,
            label: row.label,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl TermsRepo for PostgresRepositories {
    async fn list_by_course(&self, course_id: Uuid) -> Result<Vec<TermRecord>, RepoError> {
        let rows = sqlx::query_as::<_, TermRow>(
            r#"
            SELECT id, course_id, term_type, value, label, created_at, updated_at
            FROM terms
            WHERE course_id = $1
            ORDER BY value ASC
            "#,
        )
        .bind(course_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(TermRecord::from).collect())
    }

    async fn list_with_subjects(
        &self,
        course_id: Uuid,
    ) -> Result<Vec<TermWithSubjects>, RepoError> {
        let terms = self.list_by_course(course_id).await?;

        let subject_rows = sqlx::query_as::<_, SubjectRow>(
            r#"
            SELECT s.id, s.term_id, s.name, s.code, s.created_at, s.updated_at
            FROM subjects s
            INNER JOIN terms t ON t.id = s.term_id
            WHERE t.course_id = $1
            ORDER BY s.name ASC
            "#,
        )
        .bind(course_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        let mut grouped: Vec<TermWithSubjects> = terms
            .into_iter()
            .map(|term| TermWithSubjects {
                term,
                subjects: Vec::new(),
            })
            .collect();

        for row in subject_rows {
            let subject = SubjectRecord::from(row);
            if let Some(slot) = grouped
                .iter_mut()
                .find(|entry| entry.term.id == subject.term_id)
            {
                slot.subjects.push(subject);
            }
        }

        Ok(grouped)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<TermRecord>, RepoError> {
        let row = sqlx::query_as::<_, TermRow>(
            r#"
            SELECT id, course_id, term_type, value, label, created_at, updated_at
            FROM terms
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(TermRecord::from))
    }

    async fn create(&self, params: CreateTermParams) -> Result<TermRecord, RepoError> {
        let row = sqlx::query_as::<_, TermRow>(
            r#"
            INSERT INTO terms (id, course_id, term_type, value, label, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, now(), now())
            RETURNING id, course_id, term_type, value, label, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(params.course_id)
        .bind(params.term_type)
        .bind(params.value)
        .bind(params.label)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(TermRecord::from(row))
    }

    async fn update(&self, params: UpdateTermParams) -> Result<TermRecord, RepoError> {
        let row = sqlx::query_as::<_, TermRow>(
            r#"
            UPDATE terms
            SET value = $2, label = $3, updated_at = now()
            WHERE id = $1
            RETURNING id, course_id, term_type, value, label, created_at, updated_at
            "#,
        )
        .bind(params.id)
        .bind(params.value)
        .bind(params.label)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(TermRecord::from(row))
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        sqlx::query("DELETE FROM terms WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn collect_descendants(&self, id: Uuid) -> Result<CascadeIds, RepoError> {
        let subject_ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM subjects WHERE term_id = $1",
        )
        .bind(id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        let file_paths = sqlx::query_scalar::<_, String>(
            r#"
            SELECT a.file_path FROM (
                SELECT sy.file_path, sy.subject_id FROM syllabus sy
                UNION ALL
                SELECT qp.file_path, qp.subject_id FROM question_papers qp
                UNION ALL
                SELECT n.file_path, n.subject_id FROM notes n
            ) a
            INNER JOIN subjects s ON s.id = a.subject_id
            WHERE s.term_id = $1
            "#,
        )
        .bind(id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(CascadeIds {
            course_ids: Vec::new(),
            term_ids: Vec::new(),
            subject_ids,
            file_paths,
        })
    }
}
