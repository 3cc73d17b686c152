use std::sync::Arc;

use uuid::Uuid;

use crate::application::error::AppError;
use crate::application::repos::{
    CourseDetail, CourseSummary, CoursesRepo, CreateCourseParams, TermsRepo, UniversitiesRepo,
    UpdateCourseParams,
};
use crate::application::universities::require_trimmed;
use crate::cache::{CacheKey, InvalidationEngine, Mutation, ReadThrough};
use crate::domain::entities::CourseRecord;
use crate::domain::scheme::SchemeLock;
use crate::domain::types::SchemeType;
use crate::infra::uploads::UploadStorage;

#[derive(Debug, Clone)]
pub struct CreateCourseCommand {
    pub university_id: Uuid,
    pub name: String,
    pub code: String,
    pub scheme_type: Option<SchemeType>,
}

/// Fields left as `None` keep their current value; a requested scheme
/// change is validated against the scheme lock.
#[derive(Debug, Clone)]
pub struct UpdateCourseCommand {
    pub name: Option<String>,
    pub code: Option<String>,
    pub scheme_type: Option<SchemeType>,
}

#[derive(Clone)]
pub struct CoursesService {
    repo: Arc<dyn CoursesRepo>,
    universities: Arc<dyn UniversitiesRepo>,
    terms: Arc<dyn TermsRepo>,
    storage: Arc<UploadStorage>,
    cache: ReadThrough,
    invalidation: InvalidationEngine,
}

impl CoursesService {
    pub fn new(
        repo: Arc<dyn CoursesRepo>,
        universities: Arc<dyn UniversitiesRepo>,
        terms: Arc<dyn TermsRepo>,
        storage: Arc<UploadStorage>,
        cache: ReadThrough,
        invalidation: InvalidationEngine,
    ) -> Self {
        Self {
            repo,
            universities,
            terms,
            storage,
            cache,
            invalidation,
        }
    }

    pub async fn list(
        &self,
        university_id: Option<Uuid>,
    ) -> Result<Vec<CourseSummary>, AppError> {
        let key = match university_id {
            Some(id) => CacheKey::CoursesByUniversity(id),
            None => CacheKey::CoursesAll,
        };
        let repo = self.repo.clone();
        self.cache
            .get_or_load(&key, || async move {
                repo.list(university_id).await.map_err(AppError::from)
            })
            .await
    }

    pub async fn get(&self, id: Uuid) -> Result<CourseDetail, AppError> {
        let repo = self.repo.clone();
        let universities = self.universities.clone();
        let terms = self.terms.clone();
        self.cache
            .get_or_load(&CacheKey::Course(id), || async move {
                let course = repo
                    .find_by_id(id)
                    .await?
                    .ok_or_else(|| AppError::not_found("course"))?;
                let university = universities
                    .find_by_id(course.university_id)
                    .await?
                    .ok_or_else(|| AppError::not_found("university"))?;
                let terms = terms.list_with_subjects(id).await?;
                Ok(CourseDetail {
                    course,
                    university,
                    terms,
                })
            })
            .await
    }

    pub async fn create(&self, command: CreateCourseCommand) -> Result<CourseRecord, AppError> {
        let name = require_trimmed(&command.name, "name")?;
        let code = require_trimmed(&command.code, "code")?;
        let scheme_type = command.scheme_type.unwrap_or(SchemeType::Semester);

        let university_id = command.university_id;
        self.universities
            .find_by_id(university_id)
            .await?
            .ok_or_else(|| AppError::not_found("university"))?;

        let record = self
            .repo
            .create(CreateCourseParams {
                university_id,
                name,
                code,
                scheme_type,
            })
            .await?;

        self.invalidation
            .on_mutate(Mutation::CourseCreated { university_id })
            .await;
        Ok(record)
    }

    pub async fn update(
        &self,
        id: Uuid,
        command: UpdateCourseCommand,
    ) -> Result<CourseRecord, AppError> {
        let existing = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("course"))?;

        let scheme_type = match command.scheme_type {
            Some(requested) if requested != existing.scheme_type => {
                let term_count = self.repo.term_count(id).await?;
                SchemeLock::for_term_count(term_count)
                    .ensure_change_allowed(existing.scheme_type, requested)?;
                requested
            }
            Some(requested) => requested,
            None => existing.scheme_type,
        };

        let name = match command.name {
            Some(name) => require_trimmed(&name, "name")?,
            None => existing.name.clone(),
        };
        let code = match command.code {
            Some(code) => require_trimmed(&code, "code")?,
            None => existing.code.clone(),
        };

        let record = self
            .repo
            .update(UpdateCourseParams {
                id,
                name,
                code,
                scheme_type,
            })
            .await?;

        self.invalidation
            .on_mutate(Mutation::CourseUpdated {
                id,
                university_id: record.university_id,
            })
            .await;
        Ok(record)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let existing = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("course"))?;

        let cascade = self.repo.collect_descendants(id).await?;
        self.repo.delete(id).await?;
        self.storage.delete_many(&cascade.file_paths).await;

        self.invalidation
            .on_mutate(Mutation::CourseDeleted {
                id,
                university_id: existing.university_id,
                term_ids: cascade.term_ids,
                subject_ids: cascade.subject_ids,
            })
            .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use time::OffsetDateTime;

    use super::*;
    use crate::application::repos::{
        CascadeIds, CreateTermParams, RepoError, TermWithSubjects, UpdateTermParams,
        UpdateUniversityParams,
    };
    use crate::application::repos::{CreateUniversityParams, UniversitySummary};
    use crate::cache::{CacheConfig, MemoryStore};
    use crate::domain::entities::{TermRecord, UniversityRecord};

    fn sample_course(id: Uuid, scheme_type: SchemeType) -> CourseRecord {
        CourseRecord {
            id,
            university_id: Uuid::new_v4(),
            name: "Computer Science".to_string(),
            code: "CS".to_string(),
            scheme_type,
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    #[derive(Default)]
    struct StubCoursesRepo {
        record: Option<CourseRecord>,
        term_count: u64,
        updated: Mutex<Vec<UpdateCourseParams>>,
    }

    #[async_trait]
    impl CoursesRepo for StubCoursesRepo {
        async fn list(
            &self,
            _university_id: Option<Uuid>,
        ) -> Result<Vec<CourseSummary>, RepoError> {
            Ok(Vec::new())
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<CourseRecord>, RepoError> {
            Ok(self.record.clone().filter(|record| record.id == id))
        }

        async fn term_count(&self, _id: Uuid) -> Result<u64, RepoError> {
            Ok(self.term_count)
        }

        async fn create(&self, params: CreateCourseParams) -> Result<CourseRecord, RepoError> {
            Ok(CourseRecord {
                id: Uuid::new_v4(),
                university_id: params.university_id,
                name: params.name,
                code: params.code,
                scheme_type: params.scheme_type,
                created_at: OffsetDateTime::now_utc(),
                updated_at: OffsetDateTime::now_utc(),
            })
        }

        async fn update(&self, params: UpdateCourseParams) -> Result<CourseRecord, RepoError> {
            self.updated.lock().unwrap().push(params.clone());
            let existing = self.record.clone().expect("stub record");
            Ok(CourseRecord {
                name: params.name,
                code: params.code,
                scheme_type: params.scheme_type,
                ..existing
            })
        }

        async fn delete(&self, _id: Uuid) -> Result<(), RepoError> {
            Ok(())
        }

        async fn collect_descendants(&self, _id: Uuid) -> Result<CascadeIds, RepoError> {
            Ok(CascadeIds::default())
        }
    }

    struct StubUniversitiesRepo;

    #[async_trait]
    impl UniversitiesRepo for StubUniversitiesRepo {
        async fn list_with_counts(&self) -> Result<Vec<UniversitySummary>, RepoError> {
            Ok(Vec::new())
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<UniversityRecord>, RepoError> {
            Ok(Some(UniversityRecord {
                id,
                name: "State University".to_string(),
                code: None,
                created_at: OffsetDateTime::now_utc(),
                updated_at: OffsetDateTime::now_utc(),
            }))
        }

        async fn list_courses(&self, _id: Uuid) -> Result<Vec<CourseRecord>, RepoError> {
            Ok(Vec::new())
        }

        async fn create(
            &self,
            _params: CreateUniversityParams,
        ) -> Result<UniversityRecord, RepoError> {
            unreachable!("not used in these tests")
        }

        async fn update(
            &self,
            _params: UpdateUniversityParams,
        ) -> Result<UniversityRecord, RepoError> {
            unreachable!("not used in these tests")
        }

        async fn delete(&self, _id: Uuid) -> Result<(), RepoError> {
            unreachable!("not used in these tests")
        }

        async fn collect_descendants(&self, _id: Uuid) -> Result<CascadeIds, RepoError> {
            unreachable!("not used in these tests")
        }
    }

    struct StubTermsRepo;

    #[async_trait]
    impl TermsRepo for StubTermsRepo {
        async fn list_by_course(&self, _course_id: Uuid) -> Result<Vec<TermRecord>, RepoError> {
            Ok(Vec::new())
        }

        async fn list_with_subjects(
            &self,
            _course_id: Uuid,
        ) -> Result<Vec<TermWithSubjects>, RepoError> {
            Ok(Vec::new())
        }

        async fn find_by_id(&self, _id: Uuid) -> Result<Option<TermRecord>, RepoError> {
            Ok(None)
        }

        async fn create(&self, _params: CreateTermParams) -> Result<TermRecord, RepoError> {
            unreachable!("not used in these tests")
        }

        async fn update(&self, _params: UpdateTermParams) -> Result<TermRecord, RepoError> {
            unreachable!("not used in these tests")
        }

        async fn delete(&self, _id: Uuid) -> Result<(), RepoError> {
            unreachable!("not used in these tests")
        }

        async fn collect_descendants(&self, _id: Uuid) -> Result<CascadeIds, RepoError> {
            unreachable!("not used in these tests")
        }
    }

    fn service_with(repo: StubCoursesRepo) -> CoursesService {
        let store = Arc::new(MemoryStore::new());
        let config = CacheConfig {
            enabled: true,
            url: None,
            ttl_seconds: 60,
        };
        let root = std::env::temp_dir().join(format!("ateneo-test-{}", Uuid::new_v4()));
        CoursesService::new(
            Arc::new(repo),
            Arc::new(StubUniversitiesRepo),
            Arc::new(StubTermsRepo),
            Arc::new(UploadStorage::new(root).expect("storage root")),
            ReadThrough::new(store.clone(), &config),
            InvalidationEngine::new(store, &config),
        )
    }

    #[tokio::test]
    async fn scheme_change_rejected_once_terms_exist() {
        let id = Uuid::new_v4();
        let service = service_with(StubCoursesRepo {
            record: Some(sample_course(id, SchemeType::Semester)),
            term_count: 2,
            ..StubCoursesRepo::default()
        });

        let result = service
            .update(
                id,
                UpdateCourseCommand {
                    name: None,
                    code: None,
                    scheme_type: Some(SchemeType::Year),
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Conflict { .. })));
    }

    #[tokio::test]
    async fn scheme_change_allowed_before_first_term() {
        let id = Uuid::new_v4();
        let service = service_with(StubCoursesRepo {
            record: Some(sample_course(id, SchemeType::Semester)),
            term_count: 0,
            ..StubCoursesRepo::default()
        });

        let record = service
            .update(
                id,
                UpdateCourseCommand {
                    name: None,
                    code: None,
                    scheme_type: Some(SchemeType::Year),
                },
            )
            .await
            .expect("unlocked course may change scheme");

        assert_eq!(record.scheme_type, SchemeType::Year);
    }

    #[tokio::test]
    async fn name_stays_updatable_while_scheme_locked() {
        let id = Uuid::new_v4();
        let service = service_with(StubCoursesRepo {
            record: Some(sample_course(id, SchemeType::Semester)),
            term_count: 3,
            ..StubCoursesRepo::default()
        });

        let record = service
            .update(
                id,
                UpdateCourseCommand {
                    name: Some("Applied Computer Science".to_string()),
                    code: None,
                    scheme_type: None,
                },
            )
            .await
            .expect("name update is independent of the scheme lock");

        assert_eq!(record.name, "Applied Computer Science");
        assert_eq!(record.scheme_type, SchemeType::Semester);
    }

    #[tokio::test]
    async fn restating_current_scheme_is_not_a_change() {
        let id = Uuid::new_v4();
        let service = service_with(StubCoursesRepo {
            record: Some(sample_course(id, SchemeType::Year)),
            term_count: 5,
            ..StubCoursesRepo::default()
        });

        service
            .update(
                id,
                UpdateCourseCommand {
                    name: None,
                    code: None,
                    scheme_type: Some(SchemeType::Year),
                },
            )
            .await
            .expect("identity scheme update accepted while locked");
    }
}
