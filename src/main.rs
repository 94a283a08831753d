use std::{process, sync::Arc};

use inkpad::{
    application::{
        auth::AuthService,
        comments::CommentService,
        error::AppError,
        feeds::FeedService,
        friends::FriendService,
        metas::{MetaBinder, MetaService},
        site_config::SiteConfigService,
        users::{GrantUserCommand, UserService},
    },
    cache::{CacheConfig, CacheTrigger, QueryCache},
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, ApiState},
        telemetry,
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
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::validation(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::IssueToken(args) => run_issue_token(settings, args).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let cache = CacheTrigger::new(Arc::new(QueryCache::new(&CacheConfig::from(
        &settings.cache,
    ))));
    let state = build_api_state(repositories, cache);
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|source| InfraError::Bind {
            addr: settings.server.addr,
            source,
        })?;
    info!(
        target = "inkpad::serve",
        addr = %settings.server.addr,
        cache_enabled = settings.cache.enabled,
        cache_max_entries = settings.cache.max_entries.get(),
        "Listening"
    );

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    info!(target = "inkpad::serve", "Server stopped");
    Ok(())
}

async fn run_issue_token(
    settings: config::Settings,
    args: config::IssueTokenArgs,
) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let auth = AuthService::new(repositories.clone(), repositories.clone());
    let users = UserService::new(repositories, auth);

    let granted = users
        .grant(GrantUserCommand {
            username: args.username,
            openid: args.openid,
            avatar: args.avatar,
            admin: args.admin,
        })
        .await?;

    println!("{}", granted.token);
    Ok(())
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or(InfraError::Missing("database.url"))?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(InfraError::Connect)?;
    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(InfraError::from)?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

fn build_api_state(repositories: Arc<PostgresRepositories>, cache: CacheTrigger) -> ApiState {
    let auth = AuthService::new(repositories.clone(), repositories.clone());
    let site_config = SiteConfigService::new(repositories.clone(), cache.clone());
    let binder = MetaBinder::new(repositories.clone(), repositories.clone());

    ApiState {
        feeds: Arc::new(FeedService::new(
            repositories.clone(),
            repositories.clone(),
            binder,
            site_config.clone(),
            cache.clone(),
        )),
        metas: Arc::new(MetaService::new(repositories.clone(), cache)),
        comments: Arc::new(CommentService::new(
            repositories.clone(),
            repositories.clone(),
        )),
        friends: Arc::new(FriendService::new(
            repositories.clone(),
            site_config.clone(),
        )),
        site_config: Arc::new(site_config),
        users: Arc::new(UserService::new(repositories.clone(), auth.clone())),
        auth,
        db: repositories,
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(
            target = "inkpad::serve",
            error = %err,
            "Failed to listen for shutdown signal"
        );
        std::future::pending::<()>().await;
    }
    info!(target = "inkpad::serve", "Shutdown signal received");
}
