use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{DefaultBodyLimit, Request};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{
    Router,
    routing::{delete, get, post},
};

use super::{accounts, campaigns, favorites, news, subscriptions, uploads};
use crate::config::DispatchConfig;
use crate::mail::Mailer;
use crate::store::Store;

pub struct AppState {
    pub store: Arc<dyn Store>,
    pub mailer: Arc<dyn Mailer>,
    pub data_dir: PathBuf,
    pub dispatch: DispatchConfig,
}

impl AppState {
    #[must_use]
    pub fn new(
        store: Arc<dyn Store>,
        mailer: Arc<dyn Mailer>,
        data_dir: PathBuf,
        dispatch: DispatchConfig,
    ) -> Self {
        Self {
            store,
            mailer,
            data_dir,
            dispatch,
        }
    }
}

async fn health() -> &'static str {
    "OK"
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();

    tracing::info!(
        "{} {} {} {}ms",
        method,
        uri.path(),
        status.as_u16(),
        latency.as_millis()
    );

    response
}

fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        // Accounts and sessions
        .route("/register", post(accounts::register))
        .route("/login", post(accounts::login))
        .route("/me", get(accounts::me))
        .route("/logout", post(accounts::logout))
        // Favorites
        .route("/favorites", get(favorites::list_favorites))
        .route("/favorites/{id}", post(favorites::toggle_favorite))
        // Newsletter signup
        .route("/subscribe", post(subscriptions::subscribe))
        // Articles; create and delete gate on the admin extractor
        .route("/news", get(news::list_news))
        .route("/news", post(news::create_news))
        .route("/news/{id}", get(news::get_news))
        .route("/news/{id}", delete(news::delete_news))
        // Images
        .route("/upload-image", post(uploads::upload_image))
}

fn admin_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/news", get(news::list_admin_news))
        .route("/subscribers", get(subscriptions::list_subscribers))
        .route(
            "/subscribers/{id}",
            delete(subscriptions::delete_subscriber),
        )
        .route("/campaigns", post(campaigns::create_campaign))
        .route("/campaigns", get(campaigns::list_campaigns))
        .route("/campaigns/{id}/send", post(campaigns::send_campaign))
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/admin", admin_router())
        .nest("/api", api_router())
        // Multipart image uploads need headroom over the 5 MB payload cap
        .layer(DefaultBodyLimit::max(uploads::MAX_UPLOAD_SIZE + 64 * 1024))
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}
