use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{
    ArtifactCounts, CreateSubjectParams, RepoError, SubjectLineage, SubjectSummary, SubjectsRepo,
    UpdateSubjectParams,
};
use crate::domain::entities::{CourseRecord, SubjectRecord, TermRecord, UniversityRecord};
use crate::domain::types::SchemeType;

use super::util::map_sqlx_error;
use super::PostgresRepositories;

#[derive(sqlx::FromRow)]
pub(crate) struct SubjectRow {
    pub id: Uuid,
    pub term_id: Uuid,
    pub name: String,
    pub code: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<SubjectRow> for SubjectRecord {
    fn from(row: SubjectRow) -> Self {
        Self {
            id: row.id,
            term_id: row.term_id,
            name: row.name,
            code: row.code,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SubjectSummaryRow {
    id: Uuid,
    term_id: Uuid,
    name: String,
    code: Option<String>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
    syllabus_count: i64,
    question_paper_count: i64,
    notes_count: i64,
}

impl From<SubjectSummaryRow> for SubjectSummary {
    fn from(row: SubjectSummaryRow) -> Self {
        Self {
            subject: SubjectRecord {
                id: row.id,
                term_id: row.term_id,
                name: row.name,
                code: row.code,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            counts: ArtifactCounts {
                syllabus: row.syllabus_count,
                question_papers: row.question_paper_count,
                notes: row.notes_count,
            },
        }
    }
}

const SUBJECT_SUMMARY_SELECT: &str = r#"
    SELECT s.id, s.term_id, s.name, s.code, s.created_at, s.updated_at,
           (SELECT COUNT(*) FROM syllabus sy WHERE sy.subject_id = s.id) AS syllabus_count,
           (SELECT COUNT(*) FROM question_papers qp WHERE qp.subject_id = s.id) AS question_paper_count,
           (SELECT COUNT(*) FROM notes n WHERE n.subject_id = s.id) AS notes_count
    FROM subjects s
"#;

#[derive(sqlx::FromRow)]
struct LineageRow {
    t_id: Uuid,
    t_course_id: Uuid,
    t_term_type: SchemeType,
    t_value: i32,
    t_label: String,
    t_created_at: OffsetDateTime,
    t_updated_at: OffsetDateTime,
    c_university_id: Uuid,
    c_name: String,
    c_code: String,
    c_scheme_type: SchemeType,
    c_created_at: OffsetDateTime,
    c_updated_at: OffsetDateTime,
    u_name: String,
    u_code: Option<String>,
    u_created_at: OffsetDateTime,
    u_updated_at: OffsetDateTime,
}

impl From<LineageRow> for SubjectLineage {
    fn from(row: LineageRow) -> Self {
        Self {
            term: TermRecord {
                id: row.t_id,
                course_id: row.t_course_id,
                term_type: row.t_term_type,
                value: row.t_value,
                label: row.t_label,
                created_at: row.t_created_at,
                updated_at: row.t_updated_at,
            },
            course: CourseRecord {
                id: row.t_course_id,
                university_id: row.c_university_id,
                name: row.c_name,
                code: row.c_code,
                scheme_type: row.c_scheme_type,
                created_at: row.c_created_at,
                updated_at: row.c_updated_at,
            },
            university: UniversityRecord {
                id: row.c_university_id,
                name: row.u_name,
                code: row.u_code,
                created_at: row.u_created_at,
                updated_at: row.u_updated_at,
            },
        }
    }
}

#[async_trait]
impl SubjectsRepo for PostgresRepositories {
    async fn list_by_term(&self, term_id: Uuid) -> Result<Vec<SubjectSummary>, RepoError> {
        let sql = format!("{SUBJECT_SUMMARY_SELECT} WHERE s.term_id = $1 ORDER BY s.name ASC");
        let rows = sqlx::query_as::<_, SubjectSummaryRow>(&sql)
            .bind(term_id)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(SubjectSummary::from).collect())
    }

    async fn list_by_course(&self, course_id: Uuid) -> Result<Vec<SubjectSummary>, RepoError> {
        let sql = format!(
            "{SUBJECT_SUMMARY_SELECT} \
             INNER JOIN terms t ON t.id = s.term_id \
             WHERE t.course_id = $1 ORDER BY s.name ASC"
        );
        let rows = sqlx::query_as::<_, SubjectSummaryRow>(&sql)
            .bind(course_id)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(SubjectSummary::from).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<SubjectRecord>, RepoError> {
        let row = sqlx::query_as::<_, SubjectRow>(
            r#"
            SELECT id, term_id, name, code, created_at, updated_at
            FROM subjects
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(SubjectRecord::from))
    }

    async fn lineage(&self, term_id: Uuid) -> Result<Option<SubjectLineage>, RepoError> {
        let row = sqlx::query_as::<_, LineageRow>(
            r#"
            SELECT t.id AS t_id, t.course_id AS t_course_id, t.term_type AS t_term_type,
                   t.value AS t_value, t.label AS t_label,
                   t.created_at AS t_created_at, t.updated_at AS t_updated_at,
                   c.university_id AS c_university_id, c.name AS c_name, c.code AS c_code,
                   c.scheme_type AS c_scheme_type,
                   c.created_at AS c_created_at, c.updated_at AS c_updated_at,
                   u.name AS u_name, u.code AS u_code,
                   u.created_at AS u_created_at, u.updated_at AS u_updated_at
            FROM terms t
            INNER JOIN courses c ON c.id = t.course_id
            INNER JOIN universities u ON u.id = c.university_id
            WHERE t.id = $1
            "#,
        )
        .bind(term_id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(SubjectLineage::from))
    }

    async fn create(&self, params: CreateSubjectParams) -> Result<SubjectRecord, RepoError> {
        let row = sqlx::query_as::<_, SubjectRow>(
            r#"
            INSERT INTO subjects (id, term_id, name, code, created_at, updated_at)
            VALUES ($1, $2, $3, $4, now(), now())
            RETURNING id, term_id, name, code, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(params.term_id)
        .bind(params.name)
        .bind(params.code)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(SubjectRecord::from(row))
    }

    async fn update(&self, params: UpdateSubjectParams) -> Result<SubjectRecord, RepoError> {
        let row = sqlx::query_as::<_, SubjectRow>(
            r#"
            UPDATE subjects
            SET name = $2, code = $3, updated_at = now()
            WHERE id = $1
            RETURNING id, term_id, name, code, created_at, updated_at
            "#,
        )
        .bind(params.id)
        .bind(params.name)
        .bind(params.code)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(SubjectRecord::from(row))
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        sqlx::query("DELETE FROM subjects WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn artifact_paths(&self, id: Uuid) -> Result<Vec<String>, RepoError> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT file_path FROM syllabus WHERE subject_id = $1
            UNION ALL
            SELECT file_path FROM question_papers WHERE subject_id = $1
            UNION ALL
            SELECT file_path FROM notes WHERE subject_id = $1
            "#,
        )
        .bind(id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)
    }
}
