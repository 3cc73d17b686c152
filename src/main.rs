use std::process;
use std::sync::Arc;

use ateneo::{
    application::{
        artifacts::ArtifactsService,
        auth::{AuthOptions, AuthService},
        courses::CoursesService,
        error::AppError,
        repos::{
            AdminsRepo, ArtifactsRepo, CoursesRepo, SubjectsRepo, TermsRepo, UniversitiesRepo,
        },
        subjects::SubjectsService,
        terms::TermsService,
        universities::UniversitiesService,
    },
    cache::{CacheConfig, CacheStore, InvalidationEngine, MemoryStore, ReadThrough, RedisStore},
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, AppState},
        mail::{DisabledMailer, HttpMailer, Mailer},
        telemetry,
        uploads::UploadStorage,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (_cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    telemetry::init(&settings.logging)?;

    let repositories = init_repositories(&settings).await?;
    let state = build_app_state(repositories.clone(), &settings).await?;

    serve(&settings, state).await?;

    repositories.close().await;
    info!("shutdown complete");
    Ok(())
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool =
        PostgresRepositories::connect(database_url, settings.database.max_connections.get())
            .await
            .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

async fn build_cache_store(cache_config: &CacheConfig) -> Arc<dyn CacheStore> {
    match cache_config.url.as_deref() {
        Some(url) if cache_config.enabled => match RedisStore::connect(url).await {
            Ok(store) => {
                info!("cache store connected");
                Arc::new(store)
            }
            Err(error) => {
                // Degraded start: reads fall back to an in-process cache
                // rather than refusing to serve.
                warn!(%error, "redis unreachable at startup, using in-memory cache store");
                Arc::new(MemoryStore::new())
            }
        },
        _ => Arc::new(MemoryStore::new()),
    }
}

async fn build_app_state(
    repositories: Arc<PostgresRepositories>,
    settings: &config::Settings,
) -> Result<AppState, AppError> {
    let universities_repo: Arc<dyn UniversitiesRepo> = repositories.clone();
    let courses_repo: Arc<dyn CoursesRepo> = repositories.clone();
    let terms_repo: Arc<dyn TermsRepo> = repositories.clone();
    let subjects_repo: Arc<dyn SubjectsRepo> = repositories.clone();
    let artifacts_repo: Arc<dyn ArtifactsRepo> = repositories.clone();
    let admins_repo: Arc<dyn AdminsRepo> = repositories.clone();

    let storage = Arc::new(
        UploadStorage::new(settings.uploads.directory.clone())
            .map_err(|err| AppError::from(InfraError::Io(err)))?,
    );

    let cache_config = CacheConfig::from(&settings.cache);
    let store = build_cache_store(&cache_config).await;
    let cache = ReadThrough::new(store.clone(), &cache_config);
    let invalidation = InvalidationEngine::new(store, &cache_config);

    let mailer: Arc<dyn Mailer> = match HttpMailer::from_settings(&settings.mail) {
        Some(mailer) => Arc::new(mailer),
        None => {
            warn!("mail endpoint not configured, one-time codes cannot be delivered");
            Arc::new(DisabledMailer)
        }
    };

    let auth = Arc::new(AuthService::new(
        admins_repo,
        mailer,
        AuthOptions {
            session_ttl: settings.auth.session_ttl,
            otp_length: settings.otp.length.get() as usize,
            otp_expiry: settings.otp.expiry,
        },
    ));

    let universities = Arc::new(UniversitiesService::new(
        universities_repo.clone(),
        storage.clone(),
        cache.clone(),
        invalidation.clone(),
    ));
    let courses = Arc::new(CoursesService::new(
        courses_repo.clone(),
        universities_repo,
        terms_repo.clone(),
        storage.clone(),
        cache.clone(),
        invalidation.clone(),
    ));
    let terms = Arc::new(TermsService::new(
        terms_repo.clone(),
        courses_repo,
        subjects_repo.clone(),
        storage.clone(),
        cache.clone(),
        invalidation.clone(),
    ));
    let subjects = Arc::new(SubjectsService::new(
        subjects_repo.clone(),
        terms_repo,
        artifacts_repo.clone(),
        storage.clone(),
        cache.clone(),
        invalidation.clone(),
    ));
    let artifacts = Arc::new(ArtifactsService::new(
        artifacts_repo,
        subjects_repo,
        storage.clone(),
        cache,
        invalidation,
    ));

    Ok(AppState {
        auth,
        universities,
        courses,
        terms,
        subjects,
        artifacts,
        storage,
        db: repositories,
        upload_limit_bytes: settings.uploads.max_request_bytes.get() as usize,
        allowed_upload_types: Arc::new(settings.uploads.allowed_types.clone()),
    })
}

async fn serve(settings: &config::Settings, state: AppState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(addr = %settings.server.addr, "listening");

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => {
                error!(%error, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}
