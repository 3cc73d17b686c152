//! Invalidation engine.
//!
//! Each entity write is described as a [`Mutation`] carrying the ids of the
//! written row, its ancestor scopes, and — for cascading deletes — the
//! descendant rows that disappear with it. [`Mutation::closure`] is a pure
//! function from that description to the full set of cache entries that
//! could now be stale: the entity's own key, the collection keys of its
//! ancestors, the legacy course-scoped subject aggregate, and every
//! descendant key. The engine executes the closure against the store.
//!
//! Handlers never spell out cache keys themselves; adding an entity kind
//! means adding one `Mutation` variant and its closure here.

use std::sync::Arc;

use metrics::counter;
use tracing::{debug, warn};
use uuid::Uuid;

use super::config::CacheConfig;
use super::keys::{CacheKey, COURSES_PATTERN, UNIVERSITIES_PATTERN};
use super::store::CacheStore;

/// One cache entry (or namespace of entries) to remove.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InvalidationTarget {
    Key(CacheKey),
    Pattern(&'static str),
}

/// A successful entity write, described for the invalidation engine.
///
/// Delete variants carry descendant ids collected before the cascade ran,
/// so the closure can purge keys for rows that no longer exist.
#[derive(Debug, Clone)]
pub enum Mutation {
    UniversityCreated,
    UniversityUpdated {
        id: Uuid,
    },
    UniversityDeleted {
        id: Uuid,
        course_ids: Vec<Uuid>,
        term_ids: Vec<Uuid>,
        subject_ids: Vec<Uuid>,
    },
    CourseCreated {
        university_id: Uuid,
    },
    CourseUpdated {
        id: Uuid,
        university_id: Uuid,
    },
    CourseDeleted {
        id: Uuid,
        university_id: Uuid,
        term_ids: Vec<Uuid>,
        subject_ids: Vec<Uuid>,
    },
    TermCreated {
        course_id: Uuid,
    },
    TermUpdated {
        id: Uuid,
        course_id: Uuid,
    },
    TermDeleted {
        id: Uuid,
        course_id: Uuid,
        subject_ids: Vec<Uuid>,
    },
    SubjectCreated {
        term_id: Uuid,
        course_id: Uuid,
    },
    SubjectUpdated {
        id: Uuid,
        term_id: Uuid,
        course_id: Uuid,
    },
    SubjectDeleted {
        id: Uuid,
        term_id: Uuid,
        course_id: Uuid,
    },
    SyllabusWritten {
        subject_id: Uuid,
    },
    QuestionPaperWritten {
        subject_id: Uuid,
    },
    NotesWritten {
        subject_id: Uuid,
    },
}

impl Mutation {
    /// The invalidation closure: every cache entry that could serve stale
    /// data after this mutation.
    pub fn closure(&self) -> Vec<InvalidationTarget> {
        use InvalidationTarget::{Key, Pattern};

        let mut targets = Vec::new();

        match self {
            Mutation::UniversityCreated => {
                targets.push(Pattern(UNIVERSITIES_PATTERN));
            }
            Mutation::UniversityUpdated { id } => {
                targets.push(Key(CacheKey::University(*id)));
                targets.push(Pattern(UNIVERSITIES_PATTERN));
            }
            Mutation::UniversityDeleted {
                id,
                course_ids,
                term_ids,
                subject_ids,
            } => {
                targets.push(Key(CacheKey::University(*id)));
                targets.push(Pattern(UNIVERSITIES_PATTERN));
                targets.push(Pattern(COURSES_PATTERN));
                for course_id in course_ids {
                    targets.push(Key(CacheKey::Course(*course_id)));
                    targets.push(Key(CacheKey::TermsByCourse(*course_id)));
                    targets.push(Key(CacheKey::SubjectsByCourse(*course_id)));
                }
                push_term_descendants(&mut targets, term_ids);
                push_subject_descendants(&mut targets, subject_ids);
            }
            Mutation::CourseCreated { university_id } => {
                targets.push(Key(CacheKey::CoursesByUniversity(*university_id)));
                targets.push(Key(CacheKey::CoursesAll));
                targets.push(Key(CacheKey::University(*university_id)));
            }
            Mutation::CourseUpdated { id, university_id } => {
                targets.push(Key(CacheKey::Course(*id)));
                targets.push(Key(CacheKey::CoursesByUniversity(*university_id)));
                targets.push(Key(CacheKey::CoursesAll));
                // The university detail embeds its course list.
                targets.push(Key(CacheKey::University(*university_id)));
            }
            Mutation::CourseDeleted {
                id,
                university_id,
                term_ids,
                subject_ids,
            } => {
                targets.push(Key(CacheKey::Course(*id)));
                targets.push(Key(CacheKey::CoursesByUniversity(*university_id)));
                targets.push(Key(CacheKey::CoursesAll));
                targets.push(Key(CacheKey::University(*university_id)));
                targets.push(Key(CacheKey::TermsByCourse(*id)));
                targets.push(Key(CacheKey::SubjectsByCourse(*id)));
                push_term_descendants(&mut targets, term_ids);
                push_subject_descendants(&mut targets, subject_ids);
            }
            Mutation::TermCreated { course_id } => {
                targets.push(Key(CacheKey::TermsByCourse(*course_id)));
                targets.push(Key(CacheKey::Course(*course_id)));
            }
            Mutation::TermUpdated { id, course_id } => {
                targets.push(Key(CacheKey::Term(*id)));
                targets.push(Key(CacheKey::TermsByCourse(*course_id)));
                targets.push(Key(CacheKey::Course(*course_id)));
            }
            Mutation::TermDeleted {
                id,
                course_id,
                subject_ids,
            } => {
                targets.push(Key(CacheKey::Term(*id)));
                targets.push(Key(CacheKey::TermsByCourse(*course_id)));
                targets.push(Key(CacheKey::Course(*course_id)));
                targets.push(Key(CacheKey::SubjectsByTerm(*id)));
                targets.push(Key(CacheKey::SubjectsByCourse(*course_id)));
                push_subject_descendants(&mut targets, subject_ids);
            }
            Mutation::SubjectCreated { term_id, course_id } => {
                targets.push(Key(CacheKey::SubjectsByTerm(*term_id)));
                targets.push(Key(CacheKey::SubjectsByCourse(*course_id)));
                targets.push(Key(CacheKey::Term(*term_id)));
                targets.push(Key(CacheKey::Course(*course_id)));
            }
            Mutation::SubjectUpdated {
                id,
                term_id,
                course_id,
            } => {
                targets.push(Key(CacheKey::Subject(*id)));
                targets.push(Key(CacheKey::SubjectsByTerm(*term_id)));
                targets.push(Key(CacheKey::SubjectsByCourse(*course_id)));
                targets.push(Key(CacheKey::Term(*term_id)));
                targets.push(Key(CacheKey::Course(*course_id)));
            }
            Mutation::SubjectDeleted {
                id,
                term_id,
                course_id,
            } => {
                targets.push(Key(CacheKey::SubjectsByTerm(*term_id)));
                targets.push(Key(CacheKey::SubjectsByCourse(*course_id)));
                targets.push(Key(CacheKey::Term(*term_id)));
                targets.push(Key(CacheKey::Course(*course_id)));
                // Covers the subject's own key plus its artifact collections.
                push_subject_descendants(&mut targets, std::slice::from_ref(id));
            }
            Mutation::SyllabusWritten { subject_id } => {
                targets.push(Key(CacheKey::SyllabusBySubject(*subject_id)));
                targets.push(Key(CacheKey::Subject(*subject_id)));
            }
            Mutation::QuestionPaperWritten { subject_id } => {
                targets.push(Key(CacheKey::QuestionPapersBySubject(*subject_id)));
                targets.push(Key(CacheKey::Subject(*subject_id)));
            }
            Mutation::NotesWritten { subject_id } => {
                targets.push(Key(CacheKey::NotesBySubject(*subject_id)));
                targets.push(Key(CacheKey::Subject(*subject_id)));
            }
        }

        targets
    }
}

fn push_term_descendants(targets: &mut Vec<InvalidationTarget>, term_ids: &[Uuid]) {
    for term_id in term_ids {
        targets.push(InvalidationTarget::Key(CacheKey::Term(*term_id)));
        targets.push(InvalidationTarget::Key(CacheKey::SubjectsByTerm(*term_id)));
    }
}

fn push_subject_descendants(targets: &mut Vec<InvalidationTarget>, subject_ids: &[Uuid]) {
    for subject_id in subject_ids {
        targets.push(InvalidationTarget::Key(CacheKey::Subject(*subject_id)));
        targets.push(InvalidationTarget::Key(CacheKey::SyllabusBySubject(
            *subject_id,
        )));
        targets.push(InvalidationTarget::Key(CacheKey::QuestionPapersBySubject(
            *subject_id,
        )));
        targets.push(InvalidationTarget::Key(CacheKey::NotesBySubject(
            *subject_id,
        )));
    }
}

/// Executes invalidation closures against the cache store.
///
/// Runs synchronously after the write it follows is acknowledged and before
/// the HTTP response is sent, so the issuing client reads its own write.
/// Store errors are logged and absorbed; deleting an absent key is a no-op.
#[derive(Clone)]
pub struct InvalidationEngine {
    store: Arc<dyn CacheStore>,
    enabled: bool,
}

impl InvalidationEngine {
    pub fn new(store: Arc<dyn CacheStore>, config: &CacheConfig) -> Self {
        Self {
            store,
            enabled: config.enabled,
        }
    }

    pub async fn on_mutate(&self, mutation: Mutation) {
        if !self.enabled {
            return;
        }

        let targets = mutation.closure();
        debug!(?mutation, targets = targets.len(), "invalidating cache closure");

        for target in targets {
            let result = match &target {
                InvalidationTarget::Key(key) => self.store.delete(&key.render()).await.map(|_| ()),
                InvalidationTarget::Pattern(pattern) => {
                    self.store.delete_by_pattern(pattern).await.map(|_| ())
                }
            };

            match result {
                Ok(()) => counter!("ateneo_cache_invalidation_total").increment(1),
                Err(error) => {
                    warn!(?target, %error, "cache invalidation failed, entry expires by TTL");
                    counter!("ateneo_cache_error_total").increment(1);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::cache::store::MemoryStore;

    fn contains_key(targets: &[InvalidationTarget], key: CacheKey) -> bool {
        targets.contains(&InvalidationTarget::Key(key))
    }

    #[test]
    fn subject_update_invalidates_own_parent_and_legacy_scope() {
        let (subject, term, course) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let targets = Mutation::SubjectUpdated {
            id: subject,
            term_id: term,
            course_id: course,
        }
        .closure();

        assert!(contains_key(&targets, CacheKey::Subject(subject)));
        assert!(contains_key(&targets, CacheKey::SubjectsByTerm(term)));
        assert!(contains_key(&targets, CacheKey::SubjectsByCourse(course)));
    }

    #[test]
    fn subject_delete_purges_artifact_keys() {
        let subject = Uuid::new_v4();
        let targets = Mutation::SubjectDeleted {
            id: subject,
            term_id: Uuid::new_v4(),
            course_id: Uuid::new_v4(),
        }
        .closure();

        assert!(contains_key(&targets, CacheKey::SyllabusBySubject(subject)));
        assert!(contains_key(
            &targets,
            CacheKey::QuestionPapersBySubject(subject)
        ));
        assert!(contains_key(&targets, CacheKey::NotesBySubject(subject)));
    }

    #[test]
    fn course_delete_reaches_every_descendant_level() {
        let (course, university) = (Uuid::new_v4(), Uuid::new_v4());
        let term = Uuid::new_v4();
        let subject = Uuid::new_v4();

        let targets = Mutation::CourseDeleted {
            id: course,
            university_id: university,
            term_ids: vec![term],
            subject_ids: vec![subject],
        }
        .closure();

        assert!(contains_key(&targets, CacheKey::Course(course)));
        assert!(contains_key(&targets, CacheKey::CoursesByUniversity(university)));
        assert!(contains_key(&targets, CacheKey::University(university)));
        assert!(contains_key(&targets, CacheKey::Term(term)));
        assert!(contains_key(&targets, CacheKey::SubjectsByTerm(term)));
        assert!(contains_key(&targets, CacheKey::Subject(subject)));
        assert!(contains_key(&targets, CacheKey::NotesBySubject(subject)));
    }

    #[test]
    fn university_delete_uses_namespace_patterns() {
        let targets = Mutation::UniversityDeleted {
            id: Uuid::new_v4(),
            course_ids: Vec::new(),
            term_ids: Vec::new(),
            subject_ids: Vec::new(),
        }
        .closure();

        assert!(targets.contains(&InvalidationTarget::Pattern(UNIVERSITIES_PATTERN)));
        assert!(targets.contains(&InvalidationTarget::Pattern(COURSES_PATTERN)));
    }

    #[test]
    fn term_create_touches_course_detail() {
        let course = Uuid::new_v4();
        let targets = Mutation::TermCreated { course_id: course }.closure();
        assert!(contains_key(&targets, CacheKey::TermsByCourse(course)));
        assert!(contains_key(&targets, CacheKey::Course(course)));
    }

    #[tokio::test]
    async fn engine_removes_closure_entries_from_store() {
        let store = Arc::new(MemoryStore::new());
        let config = CacheConfig {
            enabled: true,
            url: None,
            ttl_seconds: 60,
        };
        let engine = InvalidationEngine::new(store.clone(), &config);

        let (subject, term, course) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        for key in [
            CacheKey::Subject(subject),
            CacheKey::SubjectsByTerm(term),
            CacheKey::SubjectsByCourse(course),
            CacheKey::Universities,
        ] {
            store
                .set(&key.render(), "cached".to_string(), Duration::from_secs(60))
                .await
                .expect("seed");
        }

        engine
            .on_mutate(Mutation::SubjectUpdated {
                id: subject,
                term_id: term,
                course_id: course,
            })
            .await;

        assert!(!store.contains(&CacheKey::Subject(subject).render()));
        assert!(!store.contains(&CacheKey::SubjectsByTerm(term).render()));
        assert!(!store.contains(&CacheKey::SubjectsByCourse(course).render()));
        // Unrelated entries survive.
        assert!(store.contains(&CacheKey::Universities.render()));
    }

    #[tokio::test]
    async fn engine_is_idempotent_on_missing_keys() {
        let store = Arc::new(MemoryStore::new());
        let config = CacheConfig {
            enabled: true,
            url: None,
            ttl_seconds: 60,
        };
        let engine = InvalidationEngine::new(store, &config);

        let mutation = Mutation::UniversityUpdated { id: Uuid::new_v4() };
        engine.on_mutate(mutation.clone()).await;
        engine.on_mutate(mutation).await;
    }

    #[tokio::test]
    async fn disabled_engine_leaves_store_untouched() {
        let store = Arc::new(MemoryStore::new());
        let config = CacheConfig {
            enabled: false,
            url: None,
            ttl_seconds: 60,
        };
        let engine = InvalidationEngine::new(store.clone(), &config);

        store
            .set(
                &CacheKey::Universities.render(),
                "cached".to_string(),
                Duration::from_secs(60),
            )
            .await
            .expect("seed");

        engine.on_mutate(Mutation::UniversityCreated).await;
        assert!(store.contains(&CacheKey::Universities.render()));
    }
}
