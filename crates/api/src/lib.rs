pub mod error;
pub mod extractors;
pub mod routes;
pub mod state;

use axum::{
    Router,
    routing::{delete, get, post, put},
};
use state::AppState;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/logout", post(routes::auth::logout))
        .route("/refresh", post(routes::auth::refresh))
        .route("/me", get(routes::auth::me))
        .route("/me", put(routes::auth::update_me))
        .route("/me/password", put(routes::auth::change_password));

    let org_routes = Router::new()
        .route("/", get(routes::org::list))
        .route("/", post(routes::org::create))
        .route("/{org_id}", delete(routes::org::dissolve))
        .route("/{org_id}/switch", post(routes::org::switch_active))
        .route("/{org_id}/leave", post(routes::org::leave))
        .route("/{org_id}/transfer", post(routes::org::transfer_admin))
        .route("/{org_id}/settings", put(routes::org::update_settings))
        .route("/{org_id}/invite-link", get(routes::org::invite_link))
        .route("/{org_id}/members", get(routes::org::members));

    let invite_routes = Router::new().route("/{code}/redeem", post(routes::invite::redeem));

    let presence_routes = Router::new()
        .route("/me", get(routes::presence::me))
        .route("/me", put(routes::presence::set_status))
        .route("/me/custom/{slot}", put(routes::presence::set_custom_slot))
        .route("/team", get(routes::presence::team));

    let notification_routes = Router::new()
        .route("/broadcast", post(routes::notification::broadcast))
        .route("/pending", get(routes::notification::pending))
        .route("/history", get(routes::notification::history))
        .route("/{notification_id}/reply", post(routes::notification::reply))
        .route("/{notification_id}/read", post(routes::notification::mark_read));

    let api = Router::new()
        .nest("/auth", auth_routes)
        .nest("/org", org_routes)
        .nest("/invite", invite_routes)
        .nest("/presence", presence_routes)
        .nest("/notification", notification_routes);

    let health = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api)
        .merge(health)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
