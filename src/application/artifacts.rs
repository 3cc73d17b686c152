//! Artifact services: syllabus, question papers, notes.
//!
//! Upload flows keep the stored file and the database row consistent: the
//! row is written only after the file lands on disk, a failed row write
//! removes the just-stored file, and replacing or deleting a row removes
//! the file it referenced. Cleanup failures are logged and never override
//! the error reported to the client.

use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use crate::application::error::AppError;
use crate::application::repos::{
    ArtifactsRepo, CreateNotesParams, CreateQuestionPaperParams, SubjectsRepo,
    UpdateQuestionPaperParams, UpsertSyllabusParams,
};
use crate::application::universities::require_trimmed;
use crate::cache::{CacheKey, InvalidationEngine, Mutation, ReadThrough};
use crate::domain::entities::{NotesRecord, QuestionPaperRecord, SyllabusRecord};
use crate::domain::types::ArtifactKind;
use crate::infra::uploads::{StoredUpload, UploadStorage, UploadedFile};

#[derive(Debug, Clone)]
pub struct UploadSyllabusCommand {
    pub subject_id: Uuid,
    pub year: Option<i32>,
    pub file: UploadedFile,
}

#[derive(Debug, Clone)]
pub struct UploadQuestionPaperCommand {
    pub subject_id: Uuid,
    pub year: i32,
    pub month: String,
    pub file: UploadedFile,
}

#[derive(Debug, Clone)]
pub struct UpdateQuestionPaperCommand {
    pub year: Option<i32>,
    pub month: Option<String>,
    pub file: Option<UploadedFile>,
}

#[derive(Debug, Clone)]
pub struct UploadNotesCommand {
    pub subject_id: Uuid,
    pub unit: i32,
    pub title: String,
    pub file: UploadedFile,
}

#[derive(Clone)]
pub struct ArtifactsService {
    repo: Arc<dyn ArtifactsRepo>,
    subjects: Arc<dyn SubjectsRepo>,
    storage: Arc<UploadStorage>,
    cache: ReadThrough,
    invalidation: InvalidationEngine,
}

impl ArtifactsService {
    pub fn new(
        repo: Arc<dyn ArtifactsRepo>,
        subjects: Arc<dyn SubjectsRepo>,
        storage: Arc<UploadStorage>,
        cache: ReadThrough,
        invalidation: InvalidationEngine,
    ) -> Self {
        Self {
            repo,
            subjects,
            storage,
            cache,
            invalidation,
        }
    }

    // ========================================================================
    // Syllabus
    // ========================================================================

    pub async fn upload_syllabus(
        &self,
        command: UploadSyllabusCommand,
    ) -> Result<SyllabusRecord, AppError> {
        self.ensure_subject(command.subject_id).await?;

        let previous = self.repo.syllabus_for_subject(command.subject_id).await?;
        let stored = self
            .store_file(ArtifactKind::Syllabus, &command.file)
            .await?;

        let record = match self
            .repo
            .upsert_syllabus(UpsertSyllabusParams {
                subject_id: command.subject_id,
                file_path: stored.stored_path.clone(),
                year: command.year,
            })
            .await
        {
            Ok(record) => record,
            Err(error) => {
                self.discard(&stored.stored_path).await;
                return Err(error.into());
            }
        };

        if let Some(previous) = previous {
            self.discard(&previous.file_path).await;
        }

        self.invalidation
            .on_mutate(Mutation::SyllabusWritten {
                subject_id: command.subject_id,
            })
            .await;
        Ok(record)
    }

    pub async fn syllabus_for_subject(
        &self,
        subject_id: Uuid,
    ) -> Result<Vec<SyllabusRecord>, AppError> {
        let repo = self.repo.clone();
        self.cache
            .get_or_load(&CacheKey::SyllabusBySubject(subject_id), || async move {
                let syllabus = repo.syllabus_for_subject(subject_id).await?;
                Ok::<_, AppError>(syllabus.into_iter().collect())
            })
            .await
    }

    pub async fn delete_syllabus(&self, id: Uuid) -> Result<(), AppError> {
        let record = self
            .repo
            .find_syllabus(id)
            .await?
            .ok_or_else(|| AppError::not_found("syllabus"))?;

        self.repo.delete_syllabus(id).await?;
        self.discard(&record.file_path).await;

        self.invalidation
            .on_mutate(Mutation::SyllabusWritten {
                subject_id: record.subject_id,
            })
            .await;
        Ok(())
    }

    // ========================================================================
    // Question papers
    // ========================================================================

    pub async fn upload_question_paper(
        &self,
        command: UploadQuestionPaperCommand,
    ) -> Result<QuestionPaperRecord, AppError> {
        let month = require_trimmed(&command.month, "month")?;
        self.ensure_subject(command.subject_id).await?;

        let stored = self
            .store_file(ArtifactKind::QuestionPaper, &command.file)
            .await?;

        let record = match self
            .repo
            .create_question_paper(CreateQuestionPaperParams {
                subject_id: command.subject_id,
                file_path: stored.stored_path.clone(),
                year: command.year,
                month,
            })
            .await
        {
            Ok(record) => record,
            Err(error) => {
                self.discard(&stored.stored_path).await;
                return Err(error.into());
            }
        };

        self.invalidation
            .on_mutate(Mutation::QuestionPaperWritten {
                subject_id: command.subject_id,
            })
            .await;
        Ok(record)
    }

    pub async fn question_papers_for_subject(
        &self,
        subject_id: Uuid,
    ) -> Result<Vec<QuestionPaperRecord>, AppError> {
        let repo = self.repo.clone();
        self.cache
            .get_or_load(
                &CacheKey::QuestionPapersBySubject(subject_id),
                || async move {
                    repo.question_papers_for_subject(subject_id)
                        .await
                        .map_err(AppError::from)
                },
            )
            .await
    }

    pub async fn get_question_paper(&self, id: Uuid) -> Result<QuestionPaperRecord, AppError> {
        self.repo
            .find_question_paper(id)
            .await?
            .ok_or_else(|| AppError::not_found("question paper"))
    }

    pub async fn update_question_paper(
        &self,
        id: Uuid,
        command: UpdateQuestionPaperCommand,
    ) -> Result<QuestionPaperRecord, AppError> {
        let existing = self
            .repo
            .find_question_paper(id)
            .await?
            .ok_or_else(|| AppError::not_found("question paper"))?;

        let year = command.year.unwrap_or(existing.year);
        let month = match command.month {
            Some(month) => require_trimmed(&month, "month")?,
            None => existing.month.clone(),
        };

        let replacement = match &command.file {
            Some(file) => Some(self.store_file(ArtifactKind::QuestionPaper, file).await?),
            None => None,
        };
        let file_path = replacement
            .as_ref()
            .map(|stored| stored.stored_path.clone())
            .unwrap_or_else(|| existing.file_path.clone());

        let record = match self
            .repo
            .update_question_paper(UpdateQuestionPaperParams {
                id,
                file_path,
                year,
                month,
            })
            .await
        {
            Ok(record) => record,
            Err(error) => {
                if let Some(stored) = replacement {
                    self.discard(&stored.stored_path).await;
                }
                return Err(error.into());
            }
        };

        if replacement.is_some() {
            self.discard(&existing.file_path).await;
        }

        self.invalidation
            .on_mutate(Mutation::QuestionPaperWritten {
                subject_id: record.subject_id,
            })
            .await;
        Ok(record)
    }

    pub async fn delete_question_paper(&self, id: Uuid) -> Result<(), AppError> {
        let record = self
            .repo
            .find_question_paper(id)
            .await?
            .ok_or_else(|| AppError::not_found("question paper"))?;

        self.repo.delete_question_paper(id).await?;
        self.discard(&record.file_path).await;

        self.invalidation
            .on_mutate(Mutation::QuestionPaperWritten {
                subject_id: record.subject_id,
            })
            .await;
        Ok(())
    }

    // ========================================================================
    // Notes
    // ========================================================================

    pub async fn upload_notes(&self, command: UploadNotesCommand) -> Result<NotesRecord, AppError> {
        let title = require_trimmed(&command.title, "title")?;
        self.ensure_subject(command.subject_id).await?;

        let stored = self.store_file(ArtifactKind::Notes, &command.file).await?;

        let record = match self
            .repo
            .create_notes(CreateNotesParams {
                subject_id: command.subject_id,
                file_path: stored.stored_path.clone(),
                unit: command.unit,
                title,
            })
            .await
        {
            Ok(record) => record,
            Err(error) => {
                self.discard(&stored.stored_path).await;
                return Err(error.into());
            }
        };

        self.invalidation
            .on_mutate(Mutation::NotesWritten {
                subject_id: command.subject_id,
            })
            .await;
        Ok(record)
    }

    pub async fn notes_for_subject(&self, subject_id: Uuid) -> Result<Vec<NotesRecord>, AppError> {
        let repo = self.repo.clone();
        self.cache
            .get_or_load(&CacheKey::NotesBySubject(subject_id), || async move {
                repo.notes_for_subject(subject_id)
                    .await
                    .map_err(AppError::from)
            })
            .await
    }

    pub async fn get_notes(&self, id: Uuid) -> Result<NotesRecord, AppError> {
        self.repo
            .find_notes(id)
            .await?
            .ok_or_else(|| AppError::not_found("notes"))
    }

    pub async fn delete_notes(&self, id: Uuid) -> Result<(), AppError> {
        let record = self
            .repo
            .find_notes(id)
            .await?
            .ok_or_else(|| AppError::not_found("notes"))?;

        self.repo.delete_notes(id).await?;
        self.discard(&record.file_path).await;

        self.invalidation
            .on_mutate(Mutation::NotesWritten {
                subject_id: record.subject_id,
            })
            .await;
        Ok(())
    }

    // ========================================================================
    // Shared helpers
    // ========================================================================

    async fn ensure_subject(&self, subject_id: Uuid) -> Result<(), AppError> {
        self.subjects
            .find_by_id(subject_id)
            .await?
            .ok_or_else(|| AppError::not_found("subject"))?;
        Ok(())
    }

    async fn store_file(
        &self,
        kind: ArtifactKind,
        file: &UploadedFile,
    ) -> Result<StoredUpload, AppError> {
        self.storage
            .store(kind, &file.original_name, file.bytes.clone())
            .await
            .map_err(|error| AppError::Infra(error.into()))
    }

    async fn discard(&self, stored_path: &str) {
        if let Err(error) = self.storage.delete(stored_path).await {
            warn!(path = %stored_path, %error, "failed to remove stored artifact file");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use bytes::Bytes;
    use time::OffsetDateTime;

    use super::*;
    use crate::application::repos::{
        CreateSubjectParams, RepoError, SubjectLineage, SubjectSummary, UpdateSubjectParams,
    };
    use crate::cache::{CacheConfig, MemoryStore};
    use crate::domain::entities::SubjectRecord;

    struct StubSubjectsRepo {
        subject_id: Uuid,
    }

    #[async_trait]
    impl SubjectsRepo for StubSubjectsRepo {
        async fn list_by_term(&self, _term_id: Uuid) -> Result<Vec<SubjectSummary>, RepoError> {
            Ok(Vec::new())
        }

        async fn list_by_course(&self, _course_id: Uuid) -> Result<Vec<SubjectSummary>, RepoError> {
            Ok(Vec::new())
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<SubjectRecord>, RepoError> {
            if id != self.subject_id {
                return Ok(None);
            }
            Ok(Some(SubjectRecord {
                id,
                term_id: Uuid::new_v4(),
                name: "Operating Systems".to_string(),
                code: None,
                created_at: OffsetDateTime::now_utc(),
                updated_at: OffsetDateTime::now_utc(),
            }))
        }

        async fn lineage(&self, _term_id: Uuid) -> Result<Option<SubjectLineage>, RepoError> {
            Ok(None)
        }

        async fn create(&self, _params: CreateSubjectParams) -> Result<SubjectRecord, RepoError> {
            unreachable!("not used in these tests")
        }

        async fn update(&self, _params: UpdateSubjectParams) -> Result<SubjectRecord, RepoError> {
            unreachable!("not used in these tests")
        }

        async fn delete(&self, _id: Uuid) -> Result<(), RepoError> {
            unreachable!("not used in these tests")
        }

        async fn artifact_paths(&self, _id: Uuid) -> Result<Vec<String>, RepoError> {
            Ok(Vec::new())
        }
    }

    /// In-memory artifacts repo with upsert semantics for the syllabus.
    #[derive(Default)]
    struct FakeArtifactsRepo {
        syllabus: Mutex<Option<SyllabusRecord>>,
    }

    #[async_trait]
    impl ArtifactsRepo for FakeArtifactsRepo {
        async fn syllabus_for_subject(
            &self,
            subject_id: Uuid,
        ) -> Result<Option<SyllabusRecord>, RepoError> {
            Ok(self
                .syllabus
                .lock()
                .unwrap()
                .clone()
                .filter(|record| record.subject_id == subject_id))
        }

        async fn find_syllabus(&self, id: Uuid) -> Result<Option<SyllabusRecord>, RepoError> {
            Ok(self
                .syllabus
                .lock()
                .unwrap()
                .clone()
                .filter(|record| record.id == id))
        }

        async fn upsert_syllabus(
            &self,
            params: UpsertSyllabusParams,
        ) -> Result<SyllabusRecord, RepoError> {
            let mut slot = self.syllabus.lock().unwrap();
            let record = match slot.take() {
                Some(existing) if existing.subject_id == params.subject_id => SyllabusRecord {
                    file_path: params.file_path,
                    year: params.year,
                    updated_at: OffsetDateTime::now_utc(),
                    ..existing
                },
                _ => SyllabusRecord {
                    id: Uuid::new_v4(),
                    subject_id: params.subject_id,
                    file_path: params.file_path,
                    year: params.year,
                    created_at: OffsetDateTime::now_utc(),
                    updated_at: OffsetDateTime::now_utc(),
                },
            };
            *slot = Some(record.clone());
            Ok(record)
        }

        async fn delete_syllabus(&self, _id: Uuid) -> Result<(), RepoError> {
            self.syllabus.lock().unwrap().take();
            Ok(())
        }

        async fn question_papers_for_subject(
            &self,
            _subject_id: Uuid,
        ) -> Result<Vec<QuestionPaperRecord>, RepoError> {
            Ok(Vec::new())
        }

        async fn find_question_paper(
            &self,
            _id: Uuid,
        ) -> Result<Option<QuestionPaperRecord>, RepoError> {
            Ok(None)
        }

        async fn create_question_paper(
            &self,
            _params: CreateQuestionPaperParams,
        ) -> Result<QuestionPaperRecord, RepoError> {
            unreachable!("not used in these tests")
        }

        async fn update_question_paper(
            &self,
            _params: UpdateQuestionPaperParams,
        ) -> Result<QuestionPaperRecord, RepoError> {
            unreachable!("not used in these tests")
        }

        async fn delete_question_paper(&self, _id: Uuid) -> Result<(), RepoError> {
            unreachable!("not used in these tests")
        }

        async fn notes_for_subject(&self, _subject_id: Uuid) -> Result<Vec<NotesRecord>, RepoError> {
            Ok(Vec::new())
        }

        async fn find_notes(&self, _id: Uuid) -> Result<Option<NotesRecord>, RepoError> {
            Ok(None)
        }

        async fn create_notes(&self, _params: CreateNotesParams) -> Result<NotesRecord, RepoError> {
            unreachable!("not used in these tests")
        }

        async fn delete_notes(&self, _id: Uuid) -> Result<(), RepoError> {
            unreachable!("not used in these tests")
        }
    }

    fn pdf(name: &str) -> UploadedFile {
        UploadedFile {
            original_name: name.to_string(),
            content_type: Some("application/pdf".to_string()),
            bytes: Bytes::from_static(b"%PDF-1.7 test"),
        }
    }

    fn service(subject_id: Uuid) -> (ArtifactsService, Arc<UploadStorage>) {
        let store = Arc::new(MemoryStore::new());
        let config = CacheConfig {
            enabled: true,
            url: None,
            ttl_seconds: 60,
        };
        let root = std::env::temp_dir().join(format!("ateneo-test-{}", Uuid::new_v4()));
        let storage = Arc::new(UploadStorage::new(root).expect("storage root"));
        let service = ArtifactsService::new(
            Arc::new(FakeArtifactsRepo::default()),
            Arc::new(StubSubjectsRepo { subject_id }),
            storage.clone(),
            ReadThrough::new(store.clone(), &config),
            InvalidationEngine::new(store, &config),
        );
        (service, storage)
    }

    #[tokio::test]
    async fn second_syllabus_upload_replaces_row_and_file() {
        let subject_id = Uuid::new_v4();
        let (service, storage) = service(subject_id);

        let first = service
            .upload_syllabus(UploadSyllabusCommand {
                subject_id,
                year: Some(2023),
                file: pdf("syllabus-2023.pdf"),
            })
            .await
            .expect("first upload");
        assert!(storage.exists(&first.file_path).await);

        let second = service
            .upload_syllabus(UploadSyllabusCommand {
                subject_id,
                year: Some(2024),
                file: pdf("syllabus-2024.pdf"),
            })
            .await
            .expect("second upload");

        // Same row, new file; the prior file is gone from storage.
        assert_eq!(first.id, second.id);
        assert_ne!(first.file_path, second.file_path);
        assert!(!storage.exists(&first.file_path).await);
        assert!(storage.exists(&second.file_path).await);

        let current = service
            .syllabus_for_subject(subject_id)
            .await
            .expect("fetch");
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].year, Some(2024));
    }

    #[tokio::test]
    async fn upload_for_missing_subject_stores_nothing() {
        let (service, storage) = service(Uuid::new_v4());

        let result = service
            .upload_syllabus(UploadSyllabusCommand {
                subject_id: Uuid::new_v4(),
                year: None,
                file: pdf("syllabus.pdf"),
            })
            .await;

        assert!(matches!(result, Err(AppError::NotFound { .. })));
        assert!(storage.is_empty().await);
    }

    #[tokio::test]
    async fn delete_syllabus_removes_file() {
        let subject_id = Uuid::new_v4();
        let (service, storage) = service(subject_id);

        let record = service
            .upload_syllabus(UploadSyllabusCommand {
                subject_id,
                year: None,
                file: pdf("syllabus.pdf"),
            })
            .await
            .expect("upload");

        service
            .delete_syllabus(record.id)
            .await
            .expect("delete syllabus");
        assert!(!storage.exists(&record.file_path).await);
    }
}
