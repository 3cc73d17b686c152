use std::sync::Arc;

use crate::application::artifacts::ArtifactsService;
use crate::application::auth::AuthService;
use crate::application::courses::CoursesService;
use crate::application::subjects::SubjectsService;
use crate::application::terms::TermsService;
use crate::application::universities::UniversitiesService;
use crate::infra::db::PostgresRepositories;
use crate::infra::uploads::UploadStorage;

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub universities: Arc<UniversitiesService>,
    pub courses: Arc<CoursesService>,
    pub terms: Arc<TermsService>,
    pub subjects: Arc<SubjectsService>,
    pub artifacts: Arc<ArtifactsService>,
    pub storage: Arc<UploadStorage>,
    pub db: Arc<PostgresRepositories>,
    pub upload_limit_bytes: usize,
    pub allowed_upload_types: Arc<Vec<String>>,
}
