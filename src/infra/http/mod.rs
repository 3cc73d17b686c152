//! HTTP surface: public read routes, admin-gated mutation routes, uploads.

pub mod error;
mod handlers;
mod middleware;
mod multipart;
mod state;

pub use state::AppState;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware as axum_middleware;
use axum::routing::{delete, get, post, put};

/// Assemble the full router.
///
/// Reads are public; every mutating route (and the profile route) sits
/// behind the admin session middleware.
pub fn build_router(state: AppState) -> Router {
    let admin_gate =
        axum_middleware::from_fn_with_state(state.clone(), middleware::admin_auth);

    let public = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/admin/login", post(handlers::admin::login))
        .route("/admin/forgot-password", post(handlers::admin::forgot_password))
        .route("/admin/verify-otp", post(handlers::admin::verify_otp))
        .route("/admin/reset-password", post(handlers::admin::reset_password))
        .route(
            "/admin/send-verification-otp",
            post(handlers::admin::send_verification_otp),
        )
        .route("/universities", get(handlers::universities::list))
        .route("/universities/{id}", get(handlers::universities::get))
        .route("/courses", get(handlers::courses::list))
        .route("/courses/{id}", get(handlers::courses::get))
        .route("/terms", get(handlers::terms::list))
        .route("/terms/{id}", get(handlers::terms::get))
        .route("/subjects", get(handlers::subjects::list))
        .route("/subjects/{id}", get(handlers::subjects::get))
        .route(
            "/syllabus/subject/{subject_id}",
            get(handlers::syllabus::by_subject),
        )
        .route(
            "/question-papers/subject/{subject_id}",
            get(handlers::question_papers::by_subject),
        )
        .route("/question-papers/{id}", get(handlers::question_papers::get))
        .route("/notes/subject/{subject_id}", get(handlers::notes::by_subject))
        .route("/notes/{id}", get(handlers::notes::get))
        .route("/uploads/{*path}", get(handlers::files::download));

    let admin = Router::new()
        .route("/admin/profile", get(handlers::admin::profile))
        .route("/universities", post(handlers::universities::create))
        .route("/universities/{id}", put(handlers::universities::update))
        .route("/universities/{id}", delete(handlers::universities::delete))
        .route("/courses", post(handlers::courses::create))
        .route("/courses/{id}", put(handlers::courses::update))
        .route("/courses/{id}", delete(handlers::courses::delete))
        .route("/terms", post(handlers::terms::create))
        .route("/terms/{id}", put(handlers::terms::update))
        .route("/terms/{id}", delete(handlers::terms::delete))
        .route("/subjects", post(handlers::subjects::create))
        .route("/subjects/{id}", put(handlers::subjects::update))
        .route("/subjects/{id}", delete(handlers::subjects::delete))
        .route("/syllabus", post(handlers::syllabus::upload))
        .route("/syllabus/{id}", delete(handlers::syllabus::delete))
        .route("/question-papers", post(handlers::question_papers::upload))
        .route("/question-papers/{id}", put(handlers::question_papers::update))
        .route(
            "/question-papers/{id}",
            delete(handlers::question_papers::delete),
        )
        .route("/notes", post(handlers::notes::upload))
        .route("/notes/{id}", delete(handlers::notes::delete))
        .route_layer(admin_gate);

    let body_limit = state.upload_limit_bytes;

    public
        .merge(admin)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
