use axum::{middleware, routing::get, Router};
use tower_http::services::ServeFile;

use crate::{
    controller::{auth, guild, user},
    middleware::auth::require_login,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    let guild_routes = Router::new()
        .route("/users", get(guild::list_users))
        .route("/recent-users", get(guild::recent_users))
        .route("/roles", get(guild::list_roles))
        .route("/analytics", get(guild::analytics))
        .route("/stats/total-members", get(guild::total_members))
        .route("/stats/churn-rate", get(guild::churn_rate))
        .route("/stats/best-metric", get(guild::best_metric))
        .route("/stats/most-recent-metric", get(guild::most_recent_metric));

    // The dashboard shell is the only session-gated page; the data routes
    // above do their own session checks and answer JSON errors instead.
    let dashboard = Router::new()
        .route_service("/dashboard", ServeFile::new("web/dist/index.html"))
        .route_layer(middleware::from_fn(require_login));

    Router::new()
        .route("/auth/login", get(auth::login))
        .route("/auth/callback", get(auth::callback))
        .route("/auth/logout", get(auth::logout))
        .route("/user", get(user::get_user))
        .route("/user/guilds", get(user::get_user_guilds))
        .nest("/guilds/{guild}", guild_routes)
        .merge(dashboard)
}
