use std::{process, sync::Arc};

use apalis::{
    layers::WorkerBuilderExt,
    prelude::{Monitor, WorkerBuilder, WorkerFactoryFn},
};
use apalis_sql::{Config as ApalisSqlConfig, postgres::PostgresStorage};
use roster::{
    application::{
        error::AppError,
        jobs::{JobWorkerContext, JobsTaskQueue, TaskQueue, process_student_created_job},
        repos::{HealthRepo, JobsRepo, StudentsRepo},
        students::StudentService,
    },
    cache::{self, CacheConfig},
    config,
    domain::types::JobType,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, ApiState},
        telemetry,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info};
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
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Worker(_) => run_worker(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;

    let cache_config = CacheConfig::from(&settings.cache);
    let cache_store = cache::connect(&cache_config)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(
        target = "roster::serve",
        backend = cache_config.backend.as_str(),
        ttl_secs = cache_config.ttl.as_secs(),
        strict = cache_config.strict,
        "Cache backend ready"
    );

    let students_repo: Arc<dyn StudentsRepo> = repositories.clone();
    let jobs_repo: Arc<dyn JobsRepo> = repositories.clone();
    let health_repo: Arc<dyn HealthRepo> = repositories.clone();
    let max_attempts = i32::try_from(settings.jobs.max_attempts.get())
        .map_err(|_| AppError::validation("jobs.max_attempts exceeds i32"))?;
    let notifier: Arc<dyn TaskQueue> = Arc::new(JobsTaskQueue::new(jobs_repo, max_attempts));

    let students = Arc::new(StudentService::new(
        students_repo,
        cache_store,
        notifier,
        &cache_config,
    ));
    let api_state = ApiState {
        students,
        db: health_repo,
    };

    let monitor_handle = spawn_job_monitor(repositories, &settings.jobs);

    let result = serve_http(&settings, api_state).await;

    monitor_handle.abort();
    let _ = monitor_handle.await;

    result
}

async fn run_worker(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    info!(
        target = "roster::worker",
        concurrency = settings.jobs.student_created_concurrency.get(),
        "Starting background workers"
    );

    build_monitor(repositories, &settings.jobs)
        .run()
        .await
        .map_err(|err| AppError::unexpected(format!("job monitor stopped: {err}")))
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    init_repositories(&settings).await?;
    info!(target = "roster::migrate", "Migrations applied");
    Ok(())
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or(InfraError::Configuration("database.url"))
        .map_err(AppError::from)?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::Database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::Database(err.to_string())))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

fn build_monitor(repositories: Arc<PostgresRepositories>, jobs: &config::JobsSettings) -> Monitor {
    let student_created_storage = PostgresStorage::new_with_config(
        repositories.pool().clone(),
        ApalisSqlConfig::new(JobType::StudentCreated.as_str()),
    );

    let context = JobWorkerContext {
        processing_delay: jobs.student_created_delay,
    };

    let student_created_worker = WorkerBuilder::new("student-created-worker")
        .concurrency(jobs.student_created_concurrency.get() as usize)
        .data(context)
        .backend(student_created_storage)
        .build_fn(process_student_created_job);

    Monitor::new().register(student_created_worker)
}

fn spawn_job_monitor(
    repositories: Arc<PostgresRepositories>,
    jobs: &config::JobsSettings,
) -> tokio::task::JoinHandle<()> {
    let monitor = build_monitor(repositories, jobs);

    tokio::spawn(async move {
        if let Err(err) = monitor.run().await {
            error!(error = %err, "job monitor stopped");
        }
    })
}

async fn serve_http(settings: &config::Settings, api_state: ApiState) -> Result<(), AppError> {
    let router = http::build_router(api_state);

    let addr = settings.server.addr;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| AppError::from(InfraError::Bind { addr, source }))?;
    info!(
        target = "roster::serve",
        addr = %addr,
        "Listening"
    );

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!(target = "roster::serve", "Shutdown signal received");
}
