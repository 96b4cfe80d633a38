//! AgriMart Platform API server
//!
//! Wires the MongoDB-backed repositories, authentication, and the
//! HTTP API together. Configuration comes from environment variables;
//! every knob has a development-friendly default except the JWT
//! secrets, which are required.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

use am_platform::auth;
use am_platform::disease;
use am_platform::message;
use am_platform::order;
use am_platform::product;
use am_platform::user;
use am_platform::{
    ensure_indexes, AppState, Argon2Config, AuthConfig, AuthLayer, AuthService, AuthState,
    BreakdownPolicy, DiseasePredictor, DiseaseRepository, DiseaseState, GoogleOAuthConfig,
    GoogleOAuthService, HttpMediaStore, MediaStore, MessageRepository, MessageState,
    OrderRepository, OrderState, PasswordService, ProductRepository, ProductState,
    UserRepository, UserState,
};

#[derive(OpenApi)]
#[openapi(
    info(title = "AgriMart Platform API", version = "1.0.0"),
    tags(
        (name = "auth", description = "Registration, login, and Google sign-in"),
        (name = "user", description = "User management"),
        (name = "product", description = "Product catalog"),
        (name = "order", description = "Orders and sales analytics"),
        (name = "disease", description = "Plant-disease detection"),
        (name = "message", description = "Contact messages"),
    )
)]
struct ApiDoc;

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_or_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn required_env(key: &str) -> anyhow::Result<String> {
    std::env::var(key).with_context(|| format!("{key} must be set"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    am_common::logging::init_logging("am-server");

    let mongo_url = env_or("AM_MONGO_URL", "mongodb://localhost:27017");
    let mongo_db = env_or("AM_MONGO_DB", "agrimart");
    let http_port: u16 = env_or_parse("AM_HTTP_PORT", 4000);
    let mgmt_port: u16 = env_or_parse("AM_MGMT_PORT", 9090);

    let client = mongodb::Client::with_uri_str(&mongo_url)
        .await
        .context("Failed to connect to MongoDB")?;
    let db = client.database(&mongo_db);
    ensure_indexes(&db).await?;
    tracing::info!(database = %mongo_db, "connected to MongoDB");

    // Services
    let auth_service = Arc::new(AuthService::new(AuthConfig {
        access_secret: required_env("AM_ACCESS_TOKEN_SECRET")?,
        refresh_secret: required_env("AM_REFRESH_TOKEN_SECRET")?,
        issuer: env_or("AM_TOKEN_ISSUER", "agrimart"),
        access_ttl_secs: env_or_parse("AM_ACCESS_TTL_SECS", 15 * 60),
        refresh_ttl_secs: env_or_parse("AM_REFRESH_TTL_SECS", 7 * 24 * 3600),
    }));
    let password_service = Arc::new(PasswordService::new(Argon2Config::default())?);
    let google_service = Arc::new(GoogleOAuthService::new(GoogleOAuthConfig {
        client_id: env_or("GOOGLE_CLIENT_ID", ""),
        client_secret: env_or("GOOGLE_CLIENT_SECRET", ""),
        redirect_uri: env_or(
            "GOOGLE_REDIRECT_URI",
            "http://localhost:4000/user/auth/google/callback",
        ),
        success_url: env_or("AM_OAUTH_SUCCESS_URL", "http://localhost:3000"),
        error_url: env_or("AM_OAUTH_ERROR_URL", "http://localhost:3000/login"),
    }));
    let media: Arc<dyn MediaStore> = Arc::new(HttpMediaStore::new(env_or(
        "AM_MEDIA_URL",
        "http://localhost:5050",
    )));
    let predictor = Arc::new(DiseasePredictor::new(env_or(
        "AM_PREDICTOR_URL",
        "http://localhost:5000",
    )));
    let breakdown_policy =
        BreakdownPolicy::from_env_value(&env_or("AM_DISEASE_BREAKDOWN", "other_bucket"));

    // Repositories
    let users = UserRepository::new(&db);
    let products = ProductRepository::new(&db);
    let orders = OrderRepository::new(&db);
    let diseases = DiseaseRepository::new(&db);
    let messages = MessageRepository::new(&db);

    // Routers; order endpoints live under the product prefix
    let user_routes = OpenApiRouter::new()
        .merge(auth::api::router(AuthState {
            users: users.clone(),
            auth: auth_service.clone(),
            passwords: password_service.clone(),
            google: google_service.clone(),
        }))
        .merge(user::api::router(UserState {
            users: users.clone(),
        }));

    let product_routes = OpenApiRouter::new()
        .merge(product::api::router(ProductState {
            products: products.clone(),
            media,
        }))
        .merge(order::api::router(OrderState {
            orders,
            products,
        }));

    let disease_routes = disease::api::router(DiseaseState {
        diseases,
        predictor,
        breakdown_policy,
    });

    let message_routes = message::api::router(MessageState { messages });

    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .nest("/user", user_routes)
        .nest("/product", product_routes)
        .nest("/disease", disease_routes)
        .nest("/message", message_routes)
        .split_for_parts();

    let app = router
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api))
        .layer(AuthLayer::new(AppState {
            auth_service: auth_service.clone(),
        }))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Health and metrics endpoints on a separate management port
    let prometheus = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;
    let mgmt_app = Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/ready", get(|| async { "OK" }))
        .route(
            "/metrics",
            get(move || async move { prometheus.render() }),
        );
    let mgmt_addr = SocketAddr::from(([0, 0, 0, 0], mgmt_port));
    let mgmt_listener = tokio::net::TcpListener::bind(mgmt_addr)
        .await
        .context("Failed to bind management port")?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(mgmt_listener, mgmt_app).await {
            tracing::error!(error = %e, "management listener failed");
        }
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], http_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind API port")?;
    tracing::info!(%addr, "AgriMart API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
