use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{
    CascadeIds, CourseSummary, CoursesRepo, CreateCourseParams, RepoError, UpdateCourseParams,
};
use crate::domain::entities::{CourseRecord, UniversityRecord};
use crate::domain::types::SchemeType;

use super::util::map_sqlx_error;
use super::PostgresRepositories;

#[derive(sqlx::FromRow)]
pub(crate) struct CourseRow {
    pub id: Uuid,
    pub university_id: Uuid,
    pub name: String,
    pub code: String,
    pub scheme_type: SchemeType,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<CourseRow> for CourseRecord {
    fn from(row: CourseRow) -> Self {
        Self {
            id: row.id,
            university_id: row.university_id,
            name: row.name,
            code: row.code,
            scheme_type: row.scheme_type,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CourseSummaryRow {
    id: Uuid,
    university_id: Uuid,
    name: String,
    code: String,
    scheme_type: SchemeType,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
    u_name: String,
    u_code: Option<String>,
    u_created_at: OffsetDateTime,
    u_updated_at: OffsetDateTime,
    term_count: i64,
}

impl From<CourseSummaryRow> for CourseSummary {
    fn from(row: CourseSummaryRow) -> Self {
        Self {
            course: CourseRecord {
                id: row.id,
                university_id: row.university_id,
                name: row.name,
                code: row.code,
                scheme_type: row.scheme_type,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            university: UniversityRecord {
                id: row.university_id,
                name: row.u_name,
                code: row.u_code,
                created_at: row.u_created_at,
                updated_at: row.u_updated_at,
            },
            term_count: row.term_count,
        }
    }
}

const COURSE_SUMMARY_SELECT: &str = r#"
    SELECT c.id, c.university_id, c.name, c.code, c.scheme_type, c.created_at, c.updated_at,
           u.name AS u_name, u.code AS u_code, u.created_at AS u_created_at,
           u.updated_at AS u_updated_at,
           (SELECT COUNT(*) FROM terms t WHERE t.course_id = c.id) AS term_count
    FROM courses c
    INNER JOIN universities u ON u.id = c.university_id
"#;

#[async_trait]
impl CoursesRepo for PostgresRepositories {
    async fn list(&self, university_id: Option<Uuid>) -> Result<Vec<CourseSummary>, RepoError> {
        let rows = match university_id {
            Some(university_id) => {
                let sql = format!(
                    "{COURSE_SUMMARY_SELECT} WHERE c.university_id = $1 ORDER BY c.name ASC"
                );
                sqlx::query_as::<_, CourseSummaryRow>(&sql)
                    .bind(university_id)
                    .fetch_all(self.pool())
                    .await
            }
            None => {
                let sql = format!("{COURSE_SUMMARY_SELECT} ORDER BY c.name ASC");
                sqlx::query_as::<_, CourseSummaryRow>(&sql)
                    .fetch_all(self.pool())
                    .await
            }
        }
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(CourseSummary::from).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<CourseRecord>, RepoError> {
        let row = sqlx::query_as::<_, CourseRow>(
            r#"
            SELECT id, university_id, name, code, scheme_type, created_at, updated_at
            FROM courses
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(CourseRecord::from))
    }

    async fn term_count(&self, id: Uuid) -> Result<u64, RepoError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM terms WHERE course_id = $1",
        )
        .bind(id)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn create(&self, params: CreateCourseParams) -> Result<CourseRecord, RepoError> {
        let row = sqlx::query_as::<_, CourseRow>(
            r#"
            INSERT INTO courses (id, university_id, name, code, scheme_type, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, now(), now())
            RETURNING id, university_id, name, code, scheme_type, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(params.university_id)
        .bind(params.name)
        .bind(params.code)
        .bind(params.scheme_type)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(CourseRecord::from(row))
    }

    async fn update(&self, params: UpdateCourseParams) -> Result<CourseRecord, RepoError> {
        let row = sqlx::query_as::<_, CourseRow>(
            r#"
            UPDATE courses
            SET name = $2, code = $3, scheme_type = $4, updated_at = now()
            WHERE id = $1
            RETURNING id, university_id, name, code, scheme_type, created_at, updated_at
            "#,
        )
        .bind(params.id)
        .bind(params.name)
        .bind(params.code)
        .bind(params.scheme_type)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(CourseRecord::from(row))
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn collect_descendants(&self, id: Uuid) -> Result<CascadeIds, RepoError> {
        let term_ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM terms WHERE course_id = $1",
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
            WHERE t.course_id = $1
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
            WHERE t.course_id = $1
            "#,
        )
        .bind(id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(CascadeIds {
            course_ids: Vec::new(),
            term_ids,
            subject_ids,
            file_paths,
        })
    }
}
