use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::CookieJar;

use crate::error::AppError;
use crate::session::Session;
use crate::state::AppState;

/// Loads the session named by the request's session cookie.
///
/// The loaded session is cached in the request extensions so that several
/// extractors in one handler (e.g. `Session` and `CurrentUser`) hit the
/// database once and see the same data.
impl FromRequestParts<AppState> for Session {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(session) = parts.extensions.get::<Session>() {
            return Ok(session.clone());
        }

        let jar = CookieJar::from_headers(&parts.headers);
        let session = match jar.get(&state.config.session.cookie_name) {
            Some(cookie) => Session::load(&state.db, cookie.value()).await?,
            None => Session::new(),
        };

        parts.extensions.insert(session.clone());
        Ok(session)
    }
}
