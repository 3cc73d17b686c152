use std::sync::Arc;

use uuid::Uuid;

use crate::application::error::AppError;
use crate::application::repos::{
    ArtifactsRepo, CreateSubjectParams, SubjectDetail, SubjectSummary, SubjectsRepo, TermsRepo,
    UpdateSubjectParams,
};
use crate::application::universities::{normalize_optional, require_trimmed};
use crate::cache::{CacheKey, InvalidationEngine, Mutation, ReadThrough};
use crate::domain::entities::SubjectRecord;
use crate::infra::uploads::UploadStorage;

#[derive(Debug, Clone)]
pub struct CreateSubjectCommand {
    pub term_id: Uuid,
    pub name: String,
    pub code: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpdateSubjectCommand {
    pub name: Option<String>,
    pub code: Option<String>,
}

#[derive(Clone)]
pub struct SubjectsService {
    repo: Arc<dyn SubjectsRepo>,
    terms: Arc<dyn TermsRepo>,
    artifacts: Arc<dyn ArtifactsRepo>,
    storage: Arc<UploadStorage>,
    cache: ReadThrough,
    invalidation: InvalidationEngine,
}

impl SubjectsService {
    pub fn new(
        repo: Arc<dyn SubjectsRepo>,
        terms: Arc<dyn TermsRepo>,
        artifacts: Arc<dyn ArtifactsRepo>,
        storage: Arc<UploadStorage>,
        cache: ReadThrough,
        invalidation: InvalidationEngine,
    ) -> Self {
        Self {
            repo,
            terms,
            artifacts,
            storage,
            cache,
            invalidation,
        }
    }

    pub async fn list_by_term(&self, term_id: Uuid) -> Result<Vec<SubjectSummary>, AppError> {
        let repo = self.repo.clone();
        self.cache
            .get_or_load(&CacheKey::SubjectsByTerm(term_id), || async move {
                repo.list_by_term(term_id).await.map_err(AppError::from)
            })
            .await
    }

    /// Legacy flattened listing across every term of a course.
    pub async fn list_by_course(&self, course_id: Uuid) -> Result<Vec<SubjectSummary>, AppError> {
        let repo = self.repo.clone();
        self.cache
            .get_or_load(&CacheKey::SubjectsByCourse(course_id), || async move {
                repo.list_by_course(course_id).await.map_err(AppError::from)
            })
            .await
    }

    pub async fn get(&self, id: Uuid) -> Result<SubjectDetail, AppError> {
        let repo = self.repo.clone();
        let artifacts = self.artifacts.clone();
        self.cache
            .get_or_load(&CacheKey::Subject(id), || async move {
                let subject = repo
                    .find_by_id(id)
                    .await?
                    .ok_or_else(|| AppError::not_found("subject"))?;
                let lineage = repo
                    .lineage(subject.term_id)
                    .await?
                    .ok_or_else(|| AppError::not_found("term"))?;
                let syllabus = artifacts.syllabus_for_subject(id).await?;
                let question_papers = artifacts.question_papers_for_subject(id).await?;
                let notes = artifacts.notes_for_subject(id).await?;
                Ok(SubjectDetail {
                    subject,
                    lineage,
                    syllabus,
                    question_papers,
                    notes,
                })
            })
            .await
    }

    pub async fn create(&self, command: CreateSubjectCommand) -> Result<SubjectRecord, AppError> {
        let name = require_trimmed(&command.name, "name")?;
        let code = normalize_optional(command.code);

        let term = self
            .terms
            .find_by_id(command.term_id)
            .await?
            .ok_or_else(|| AppError::not_found("term"))?;

        let record = self
            .repo
            .create(CreateSubjectParams {
                term_id: command.term_id,
                name,
                code,
            })
            .await?;

        self.invalidation
            .on_mutate(Mutation::SubjectCreated {
                term_id: term.id,
                course_id: term.course_id,
            })
            .await;
        Ok(record)
    }

    pub async fn update(
        &self,
        id: Uuid,
        command: UpdateSubjectCommand,
    ) -> Result<SubjectRecord, AppError> {
        let existing = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("subject"))?;
        let term = self
            .terms
            .find_by_id(existing.term_id)
            .await?
            .ok_or_else(|| AppError::not_found("term"))?;

        let name = match command.name {
            Some(name) => require_trimmed(&name, "name")?,
            None => existing.name.clone(),
        };
        let code = match command.code {
            Some(code) => normalize_optional(Some(code)),
            None => existing.code.clone(),
        };

        let record = self.repo.update(UpdateSubjectParams { id, name, code }).await?;

        self.invalidation
            .on_mutate(Mutation::SubjectUpdated {
                id,
                term_id: term.id,
                course_id: term.course_id,
            })
            .await;
        Ok(record)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let existing = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("subject"))?;
        let term = self
            .terms
            .find_by_id(existing.term_id)
            .await?
            .ok_or_else(|| AppError::not_found("term"))?;

        let file_paths = self.repo.artifact_paths(id).await?;
        self.repo.delete(id).await?;
        self.storage.delete_many(&file_paths).await;

        self.invalidation
            .on_mutate(Mutation::SubjectDeleted {
                id,
                term_id: term.id,
                course_id: term.course_id,
            })
            .await;
        Ok(())
    }
}
