pub mod admin;
pub mod courses;
pub mod files;
pub mod health;
pub mod notes;
pub mod question_papers;
pub mod subjects;
pub mod syllabus;
pub mod terms;
pub mod universities;
