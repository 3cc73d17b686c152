use std::sync::Arc;

use uuid::Uuid;

use crate::application::error::{AppError, FieldError};
use crate::application::repos::{
    CreateUniversityParams, UniversitiesRepo, UniversityDetail, UniversitySummary,
    UpdateUniversityParams,
};
use crate::cache::{CacheKey, InvalidationEngine, Mutation, ReadThrough};
use crate::domain::entities::UniversityRecord;
use crate::infra::uploads::UploadStorage;

#[derive(Debug, Clone)]
pub struct CreateUniversityCommand {
    pub name: String,
    pub code: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpdateUniversityCommand {
    pub name: String,
    pub code: Option<String>,
}

#[derive(Clone)]
pub struct UniversitiesService {
    repo: Arc<dyn UniversitiesRepo>,
    storage: Arc<UploadStorage>,
    cache: ReadThrough,
    invalidation: InvalidationEngine,
}

impl UniversitiesService {
    pub fn new(
        repo: Arc<dyn UniversitiesRepo>,
        storage: Arc<UploadStorage>,
        cache: ReadThrough,
        invalidation: InvalidationEngine,
    ) -> Self {
        Self {
            repo,
            storage,
            cache,
            invalidation,
        }
    }

    pub async fn list(&self) -> Result<Vec<UniversitySummary>, AppError> {
        let repo = self.repo.clone();
        self.cache
            .get_or_load(&CacheKey::Universities, || async move {
                repo.list_with_counts().await.map_err(AppError::from)
            })
            .await
    }

    pub async fn get(&self, id: Uuid) -> Result<UniversityDetail, AppError> {
        let repo = self.repo.clone();
        self.cache
            .get_or_load(&CacheKey::University(id), || async move {
                let university = repo
                    .find_by_id(id)
                    .await?
                    .ok_or_else(|| AppError::not_found("university"))?;
                let courses = repo.list_courses(id).await?;
                Ok(UniversityDetail {
                    university,
                    courses,
                })
            })
            .await
    }

    pub async fn create(
        &self,
        command: CreateUniversityCommand,
    ) -> Result<UniversityRecord, AppError> {
        let name = require_trimmed(&command.name, "name")?;
        let code = normalize_optional(command.code);

        let record = self
            .repo
            .create(CreateUniversityParams { name, code })
            .await?;

        self.invalidation.on_mutate(Mutation::UniversityCreated).await;
        Ok(record)
    }

    pub async fn update(
        &self,
        id: Uuid,
        command: UpdateUniversityCommand,
    ) -> Result<UniversityRecord, AppError> {
        let name = require_trimmed(&command.name, "name")?;
        let code = normalize_optional(command.code);

        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("university"))?;

        let record = self
            .repo
            .update(UpdateUniversityParams { id, name, code })
            .await?;

        self.invalidation
            .on_mutate(Mutation::UniversityUpdated { id })
            .await;
        Ok(record)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("university"))?;

        let cascade = self.repo.collect_descendants(id).await?;
        self.repo.delete(id).await?;
        self.storage.delete_many(&cascade.file_paths).await;

        self.invalidation
            .on_mutate(Mutation::UniversityDeleted {
                id,
                course_ids: cascade.course_ids,
                term_ids: cascade.term_ids,
                subject_ids: cascade.subject_ids,
            })
            .await;
        Ok(())
    }
}

pub(crate) fn require_trimmed(value: &str, field: &'static str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation_fields(
            "Validation failed",
            vec![FieldError::new(field, format!("{field} is required"))],
        ));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn normalize_optional(value: Option<String>) -> Option<String> {
    value.and_then(|raw| {
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}
