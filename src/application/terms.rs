use std::sync::Arc;

use uuid::Uuid;

use crate::application::error::{AppError, FieldError};
use crate::application::repos::{
    CoursesRepo, CreateTermParams, SubjectsRepo, TermDetail, TermsRepo, UpdateTermParams,
};
use crate::cache::{CacheKey, InvalidationEngine, Mutation, ReadThrough};
use crate::domain::entities::TermRecord;
use crate::domain::scheme::ensure_term_matches_scheme;
use crate::domain::types::SchemeType;
use crate::infra::uploads::UploadStorage;

#[derive(Debug, Clone)]
pub struct CreateTermCommand {
    pub course_id: Uuid,
    pub term_type: SchemeType,
    pub value: i32,
    pub label: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpdateTermCommand {
    pub value: Option<i32>,
    pub label: Option<String>,
}

#[derive(Clone)]
pub struct TermsService {
    repo: Arc<dyn TermsRepo>,
    courses: Arc<dyn CoursesRepo>,
    subjects: Arc<dyn SubjectsRepo>,
    storage: Arc<UploadStorage>,
    cache: ReadThrough,
    invalidation: InvalidationEngine,
}

impl TermsService {
    pub fn new(
        repo: Arc<dyn TermsRepo>,
        courses: Arc<dyn CoursesRepo>,
        subjects: Arc<dyn SubjectsRepo>,
        storage: Arc<UploadStorage>,
        cache: ReadThrough,
        invalidation: InvalidationEngine,
    ) -> Self {
        Self {
            repo,
            courses,
            subjects,
            storage,
            cache,
            invalidation,
        }
    }

    pub async fn list_by_course(&self, course_id: Uuid) -> Result<Vec<TermRecord>, AppError> {
        let repo = self.repo.clone();
        self.cache
            .get_or_load(&CacheKey::TermsByCourse(course_id), || async move {
                repo.list_by_course(course_id).await.map_err(AppError::from)
            })
            .await
    }

    pub async fn get(&self, id: Uuid) -> Result<TermDetail, AppError> {
        let repo = self.repo.clone();
        let courses = self.courses.clone();
        let subjects = self.subjects.clone();
        self.cache
            .get_or_load(&CacheKey::Term(id), || async move {
                let term = repo
                    .find_by_id(id)
                    .await?
                    .ok_or_else(|| AppError::not_found("term"))?;
                let course = courses
                    .find_by_id(term.course_id)
                    .await?
                    .ok_or_else(|| AppError::not_found("course"))?;
                let subjects = subjects
                    .list_by_term(id)
                    .await?
                    .into_iter()
                    .map(|summary| summary.subject)
                    .collect();
                Ok(TermDetail {
                    term,
                    course,
                    subjects,
                })
            })
            .await
    }

    pub async fn create(&self, command: CreateTermCommand) -> Result<TermRecord, AppError> {
        if command.value <= 0 {
            return Err(AppError::validation_fields(
                "Validation failed",
                vec![FieldError::new("value", "value must be a positive integer")],
            ));
        }

        let course = self
            .courses
            .find_by_id(command.course_id)
            .await?
            .ok_or_else(|| AppError::not_found("course"))?;

        ensure_term_matches_scheme(course.scheme_type, command.term_type)?;

        let label = match command.label {
            Some(label) if !label.trim().is_empty() => label.trim().to_string(),
            _ => command.term_type.term_label(command.value),
        };

        let record = self
            .repo
            .create(CreateTermParams {
                course_id: command.course_id,
                term_type: command.term_type,
                value: command.value,
                label,
            })
            .await?;

        self.invalidation
            .on_mutate(Mutation::TermCreated {
                course_id: command.course_id,
            })
            .await;
        Ok(record)
    }

    pub async fn update(&self, id: Uuid, command: UpdateTermCommand) -> Result<TermRecord, AppError> {
        let existing = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("term"))?;

        let value = match command.value {
            Some(value) if value <= 0 => {
                return Err(AppError::validation_fields(
                    "Validation failed",
                    vec![FieldError::new("value", "value must be a positive integer")],
                ));
            }
            Some(value) => value,
            None => existing.value,
        };
        let label = match command.label {
            Some(label) if !label.trim().is_empty() => label.trim().to_string(),
            Some(_) => existing.term_type.term_label(value),
            None => existing.label.clone(),
        };

        let record = self.repo.update(UpdateTermParams { id, value, label }).await?;

        self.invalidation
            .on_mutate(Mutation::TermUpdated {
                id,
                course_id: existing.course_id,
            })
            .await;
        Ok(record)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let existing = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("term"))?;

        let cascade = self.repo.collect_descendants(id).await?;
        self.repo.delete(id).await?;
        self.storage.delete_many(&cascade.file_paths).await;

        self.invalidation
            .on_mutate(Mutation::TermDeleted {
                id,
                course_id: existing.course_id,
                subject_ids: cascade.subject_ids,
            })
            .await;
        Ok(())
    }
}
