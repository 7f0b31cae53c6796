use std::{future::IntoFuture, process, sync::Arc};

use tokio::sync::oneshot;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;
use visuopost::{
    application::{
        blog::BlogService,
        comments::CommentService,
        error::AppError,
        newsletter::{NewsletterService, SignupMetadata},
        render::HtmlBodyRenderer,
        session::SessionStore,
    },
    config,
    domain::{error::DomainError, posts},
    infra::{
        error::InfraError,
        http::{self, HttpState},
        images::ImageStorage,
        relay::FormRelayClient,
        store, telemetry,
    },
    presentation::views::LayoutChrome,
};

const IMAGE_ROUTE_PREFIX: &str = "/images";

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
        config::Command::Comments(args) => run_comments(settings, args).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let state = build_http_state(&settings)?;
    serve_http(&settings, state).await
}

fn build_http_state(settings: &config::Settings) -> Result<HttpState, AppError> {
    let repo = store::build_comments_repo(&settings.store)?;

    let newsletter = match SignupMetadata::from_settings(&settings.newsletter) {
        Some(metadata) => {
            let relay = FormRelayClient::new(settings.newsletter.endpoint.clone())?;
            info!(
                target = "visuopost::startup",
                endpoint = %relay.endpoint(),
                "newsletter relay enabled"
            );
            NewsletterService::new(Arc::new(relay), metadata)
        }
        None => {
            warn!(
                target = "visuopost::startup",
                "newsletter.access_key is not set; signups will not be forwarded"
            );
            NewsletterService::disabled()
        }
    };

    let blog = BlogService::new(
        CommentService::new(repo),
        newsletter,
        Arc::new(HtmlBodyRenderer),
        IMAGE_ROUTE_PREFIX,
    );

    Ok(HttpState {
        blog: Arc::new(blog),
        sessions: Arc::new(SessionStore::new(
            posts::all(),
            settings.sessions.max_entries,
        )?),
        images: Arc::new(ImageStorage::new(settings.assets.images_dir.clone())),
        chrome: LayoutChrome::new(&settings.site.title, &settings.site.description),
    })
}

async fn serve_http(settings: &config::Settings, state: HttpState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(
        target = "visuopost::startup",
        addr = %settings.server.addr,
        "listening"
    );

    let (signalled_tx, signalled_rx) = oneshot::channel::<()>();
    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async move {
            wait_for_shutdown_signal().await;
            let _ = signalled_tx.send(());
        })
        .into_future();

    let grace = settings.server.graceful_shutdown;
    tokio::select! {
        result = server => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))?;
        }
        _ = async {
            if signalled_rx.await.is_ok() {
                tokio::time::sleep(grace).await;
            } else {
                std::future::pending::<()>().await;
            }
        } => {
            warn!(
                target = "visuopost::shutdown",
                grace_seconds = grace.as_secs(),
                "graceful shutdown timed out; dropping open connections"
            );
        }
    }

    info!(target = "visuopost::shutdown", "server stopped");
    Ok(())
}

async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(target = "visuopost::shutdown", error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!(target = "visuopost::shutdown", error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!(target = "visuopost::shutdown", "shutdown signal received");
}

async fn run_comments(
    settings: config::Settings,
    args: config::CommentsArgs,
) -> Result<(), AppError> {
    let post = posts::find_by_id(&args.post_id).ok_or(DomainError::not_found("post"))?;

    let repo = store::build_comments_repo(&settings.store)?;
    let comments = CommentService::new(repo)
        .fetch_comments(post.id)
        .await
        .map_err(|err| AppError::from(InfraError::store(err.to_string())))?;

    println!("{} ({})", post.title, post.id);
    if comments.is_empty() {
        println!("No comments yet.");
    }
    for comment in comments {
        println!("[{}] {}: {}", comment.display_date(), comment.name, comment.text);
    }
    Ok(())
}
