//! Application services layer.

pub mod artifacts;
pub mod auth;
pub mod courses;
pub mod error;
pub mod repos;
pub mod subjects;
pub mod terms;
pub mod universities;
