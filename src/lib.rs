//! Ateneo: REST backend for an academic-document repository.
//!
//! Universities contain courses, courses contain terms, terms contain
//! subjects, and subjects hold uploaded PDF artifacts. Reads flow through a
//! cache-coherent read-through layer ([`cache`]); writes run a declarative
//! invalidation closure before the response is returned.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
