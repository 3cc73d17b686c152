use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{
    CascadeIds, CreateUniversityParams, RepoError, UniversitiesRepo, UniversitySummary,
    UpdateUniversityParams,
};
use crate::domain::entities::{CourseRecord, UniversityRecord};

use super::courses::CourseRow;
use super::util::map_sqlx_error;
use super::PostgresRepositories;

#[derive(sqlx::FromRow)]
pub(crate) struct UniversityRow {
    pub id: Uuid,
    pub name: String,
    pub code: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<UniversityRow> for UniversityRecord {
    fn from(row: UniversityRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            code: row.code,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct UniversitySummaryRow {
    id: Uuid,
    name: String,
    code: Option<String>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
    course_count: i64,
}

#[async_trait]
impl UniversitiesRepo for PostgresRepositories {
    async fn list_with_counts(&self) -> Result<Vec<UniversitySummary>, RepoError> {
        let rows = sqlx::query_as::<_, UniversitySummaryRow>(
            r#"
            SELECT u.id, u.name, u.code, u.created_at, u.updated_at,
                   COUNT(c.id) AS course_count
            FROM universities u
            LEFT JOIN courses c ON c.university_id = u.id
            GROUP BY u.id
            ORDER BY u.name ASC
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|row| UniversitySummary {
                university: UniversityRecord {
                    id: row.id,
                    name: row.name,
                    code: row.code,
                    created_at: row.created_at,
                    updated_at: row.updated_at,
                },
                course_count: row.course_count,
            })
            .collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UniversityRecord>, RepoError> {
        let row = sqlx::query_as::<_, UniversityRow>(
            r#"
            SELECT id, name, code, created_at, updated_at
            FROM universities
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(UniversityRecord::from))
    }

    async fn list_courses(&self, id: Uuid) -> Result<Vec<CourseRecord>, RepoError> {
        let rows = sqlx::query_as::<_, CourseRow>(
            r#"
            SELECT id, university_id, name, code, scheme_type, created_at, updated_at
            FROM courses
            WHERE university_id = $1
            ORDER BY name ASC
            "#,
        )
        .bind(id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(CourseRecord::from).collect())
    }

    async fn create(&self, params: CreateUniversityParams) -> Result<UniversityRecord, RepoError> {
        let row = sqlx::query_as::<_, UniversityRow>(
            r#"
            INSERT INTO universities (id, name, code, created_at, updated_at)
            VALUES ($1, $2, $3, now(), now())
            RETURNING id, name, code, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(params.name)
        .bind(params.code)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(UniversityRecord::from(row))
    }

    async fn update(&self, params: UpdateUniversityParams) -> Result<UniversityRecord, RepoError> {
        let row = sqlx::query_as::<_, UniversityRow>(
            r#"
            UPDATE universities
            SET name = $2, code = $3, updated_at = now()
            WHERE id = $1
            RETURNING id, name, code, created_at, updated_at
            "#,
        )
        .bind(params.id)
        .bind(params.name)
        .bind(params.code)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(UniversityRecord::from(row))
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        sqlx::query("DELETE FROM universities WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn collect_descendants(&self, id: Uuid) -> Result<CascadeIds, RepoError> {
        let course_ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM courses WHERE university_id = $1",
        )
        .bind(id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        let term_ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT t.id
            FROM terms t
            INNER JOIN courses c ON c.id = t.course_id
            WHERE c.university_id = $1
            "#,
        )
        .bind(id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        let subject_ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT s.id
            FROM subjects s
            INNER JOIN terms t ON t.id = s.term_id
            INNER JOIN courses c ON c.id = t.course_id
            WHERE c.university_id = $1
            "#,
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
            INNER JOIN terms t ON t.id = s.term_id
            INNER JOIN courses c ON c.id = t.course_id
            WHERE c.university_id = $1
            "#,
        )
        .bind(id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(CascadeIds {
            course_ids,
            term_ids,
            subject_ids,
            file_paths,
        })
    }
}
