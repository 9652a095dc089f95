//! Hearth server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, middleware};
use hearth_api::{
    middleware::{AppState, auth_middleware},
    router as api_router,
};
use hearth_common::{Config, LocalStorage, StorageBackend};
use hearth_core::{
    CommentService, FriendService, HeartService, InvitationService, MailService, PostService,
    UserService,
};
use hearth_db::repositories::{
    CommentRepository, FriendRepository, HeartRepository, InvitationRepository, PostRepository,
    UserRepository,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hearth=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting hearth server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = hearth_db::connect(&config.database).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    hearth_db::migrate(&db).await?;
    info!("Migrations completed");

    // Blob storage for image attachments
    let storage: Arc<dyn StorageBackend> = Arc::new(LocalStorage::new(
        config.storage.base_path.clone(),
        config.storage.base_url.clone(),
    ));

    // Outgoing mail
    let mail_service = MailService::new(&config)?;

    // Initialize repositories
    let db = Arc::new(db);
    let user_repo = UserRepository::new(Arc::clone(&db));
    let friend_repo = FriendRepository::new(Arc::clone(&db));
    let post_repo = PostRepository::new(Arc::clone(&db));
    let comment_repo = CommentRepository::new(Arc::clone(&db));
    let heart_repo = HeartRepository::new(Arc::clone(&db));
    let invitation_repo = InvitationRepository::new(Arc::clone(&db));

    // Initialize services
    let user_service = UserService::new(user_repo.clone());
    let friend_service = FriendService::new(friend_repo, user_repo);
    let post_service = PostService::with_storage(
        post_repo.clone(),
        heart_repo.clone(),
        Arc::clone(&storage),
    );
    let comment_service =
        CommentService::new(comment_repo.clone(), post_repo.clone(), heart_repo.clone());
    let heart_service = HeartService::new(heart_repo, post_repo, comment_repo);
    let invitation_service = InvitationService::with_mail(invitation_repo, mail_service);

    let state = AppState {
        user_service,
        friend_service,
        post_service,
        comment_service,
        heart_service,
        invitation_service,
    };

    // Build the router
    let app = Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start the server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!(%addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}
