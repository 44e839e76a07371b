use axum::{Router, routing::get};
use tower_http::services::ServeDir;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

/// Canonical URLs, for redirects and templates.
pub mod paths {
    pub const INDEX: &str = "/rango/";
    pub const ABOUT: &str = "/rango/about/";
    pub const ADD_CATEGORY: &str = "/rango/add_category/";
    pub const REGISTER: &str = "/rango/register/";
    pub const LOGIN: &str = "/rango/login/";
    pub const LOGOUT: &str = "/rango/logout/";
    pub const RESTRICTED: &str = "/rango/restricted/";

    pub fn category(slug: &str) -> String {
        format!("/rango/category/{slug}/")
    }

    pub fn add_page(slug: &str) -> String {
        format!("/rango/category/{slug}/add_page/")
    }

    /// The login page, remembering where to go afterwards.
    pub fn login_with_next(next: &str) -> String {
        match serde_urlencoded::to_string([("next", next)]) {
            Ok(query) => format!("{LOGIN}?{query}"),
            Err(_) => LOGIN.to_string(),
        }
    }
}

pub fn routes(config: &AppConfig) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::rango::index))
        .merge(rango_routes())
        .merge(auth_routes(config))
        .nest_service("/media", ServeDir::new(&config.media.root))
}

fn rango_routes() -> Router<AppState> {
    Router::new()
        .route(paths::INDEX, get(handlers::rango::index))
        .route(paths::ABOUT, get(handlers::rango::about))
        .route(
            paths::ADD_CATEGORY,
            get(handlers::rango::add_category_page).post(handlers::rango::add_category),
        )
        .route(
            "/rango/category/{category_name_slug}/",
            get(handlers::rango::show_category),
        )
        .route(
            "/rango/category/{category_name_slug}/add_page/",
            get(handlers::rango::add_page_page).post(handlers::rango::add_page),
        )
        .route(paths::RESTRICTED, get(handlers::rango::restricted))
}

fn auth_routes(config: &AppConfig) -> Router<AppState> {
    Router::new()
        .route(
            paths::REGISTER,
            get(handlers::auth::register_page)
                .post(handlers::auth::register)
                .layer(handlers::auth::register_body_limit(config)),
        )
        .route(
            paths::LOGIN,
            get(handlers::auth::login_page).post(handlers::auth::login),
        )
        .route(paths::LOGOUT, get(handlers::auth::logout))
}
