//! Cache key derivation.
//!
//! Every cache entry name in the system is derived here and nowhere else.
//! The read-through accessor and the invalidation engine both consume
//! [`CacheKey`], which is what keeps the two paths coherent: a key that is
//! populated under one spelling can always be deleted under the same one.

use std::fmt;

use uuid::Uuid;

/// Pattern matching every university-scoped collection entry.
pub const UNIVERSITIES_PATTERN: &str = "universities:*";

/// Pattern matching every course-scoped collection entry.
pub const COURSES_PATTERN: &str = "courses:*";

/// Identifies one cache entry: a single entity by id, or a collection
/// scoped to an ancestor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// All universities with course counts.
    Universities,
    /// One university with its courses.
    University(Uuid),
    /// All courses across universities.
    CoursesAll,
    /// Courses owned by one university.
    CoursesByUniversity(Uuid),
    /// One course with its terms and subjects.
    Course(Uuid),
    /// Terms owned by one course.
    TermsByCourse(Uuid),
    /// One term with its subjects.
    Term(Uuid),
    /// Subjects owned by one term.
    SubjectsByTerm(Uuid),
    /// Flattened subjects across all terms of a course. Kept for the
    /// course-scoped listing the frontend still requests.
    SubjectsByCourse(Uuid),
    /// One subject with lineage and artifacts.
    Subject(Uuid),
    /// Syllabus entries for one subject.
    SyllabusBySubject(Uuid),
    /// Question papers for one subject.
    QuestionPapersBySubject(Uuid),
    /// Notes for one subject.
    NotesBySubject(Uuid),
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Universities => write!(f, "universities:all"),
            CacheKey::University(id) => write!(f, "university:{id}"),
            CacheKey::CoursesAll => write!(f, "courses:all"),
            CacheKey::CoursesByUniversity(id) => write!(f, "courses:university:{id}"),
            CacheKey::Course(id) => write!(f, "course:{id}"),
            CacheKey::TermsByCourse(id) => write!(f, "terms:course:{id}"),
            CacheKey::Term(id) => write!(f, "term:{id}"),
            CacheKey::SubjectsByTerm(id) => write!(f, "subjects:term:{id}"),
            CacheKey::SubjectsByCourse(id) => write!(f, "subjects:course:{id}"),
            CacheKey::Subject(id) => write!(f, "subject:{id}"),
            CacheKey::SyllabusBySubject(id) => write!(f, "syllabus:subject:{id}"),
            CacheKey::QuestionPapersBySubject(id) => write!(f, "question-papers:subject:{id}"),
            CacheKey::NotesBySubject(id) => write!(f, "notes:subject:{id}"),
        }
    }
}

impl CacheKey {
    pub fn render(&self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_id() -> Uuid {
        Uuid::parse_str("0193e5a0-0000-7000-8000-000000000042").expect("literal uuid")
    }

    #[test]
    fn renders_stable_names() {
        let id = fixed_id();
        let cases = [
            (CacheKey::Universities, "universities:all".to_string()),
            (CacheKey::University(id), format!("university:{id}")),
            (CacheKey::CoursesAll, "courses:all".to_string()),
            (
                CacheKey::CoursesByUniversity(id),
                format!("courses:university:{id}"),
            ),
            (CacheKey::Course(id), format!("course:{id}")),
            (CacheKey::TermsByCourse(id), format!("terms:course:{id}")),
            (CacheKey::Term(id), format!("term:{id}")),
            (CacheKey::SubjectsByTerm(id), format!("subjects:term:{id}")),
            (
                CacheKey::SubjectsByCourse(id),
                format!("subjects:course:{id}"),
            ),
            (CacheKey::Subject(id), format!("subject:{id}")),
            (
                CacheKey::SyllabusBySubject(id),
                format!("syllabus:subject:{id}"),
            ),
            (
                CacheKey::QuestionPapersBySubject(id),
                format!("question-papers:subject:{id}"),
            ),
            (CacheKey::NotesBySubject(id), format!("notes:subject:{id}")),
        ];

        for (key, expected) in cases {
            assert_eq!(key.render(), expected);
        }
    }

    #[test]
    fn derivation_is_deterministic() {
        let id = fixed_id();
        assert_eq!(
            CacheKey::SubjectsByTerm(id).render(),
            CacheKey::SubjectsByTerm(id).render()
        );
    }

    #[test]
    fn namespace_patterns_cover_their_keys() {
        let id = fixed_id();
        assert!(CacheKey::Universities.render().starts_with("universities:"));
        assert!(CacheKey::CoursesAll.render().starts_with("courses:"));
        assert!(
            CacheKey::CoursesByUniversity(id)
                .render()
                .starts_with("courses:")
        );
        // The singular keys deliberately live outside the namespace patterns;
        // they are deleted individually by the invalidation closure.
        assert!(!CacheKey::University(id).render().starts_with("universities:"));
        assert!(!CacheKey::Course(id).render().starts_with("courses:"));
    }
}
