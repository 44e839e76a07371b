use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::request::Parts,
};
use sea_orm::EntityTrait;

use crate::entity::user;
use crate::error::AppError;
use crate::session::Session;
use crate::state::AppState;

/// The active user bound to the request's session, if any.
///
/// Never rejects for anonymous visitors; use [`AuthUser`] to require a login.
pub struct CurrentUser(pub Option<user::Model>);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state).await?;
        let Some(user_id) = session.user_id() else {
            return Ok(CurrentUser(None));
        };

        let user = user::Entity::find_by_id(user_id)
            .one(&state.db)
            .await?
            .filter(|u| u.is_active);

        Ok(CurrentUser(user))
    }
}

/// A logged-in, active user.
///
/// Add this as a handler parameter to make the route login-only; anonymous
/// visitors are redirected to the login page with `next` pointing back.
pub struct AuthUser(pub user::Model);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        match user {
            Some(user) => Ok(AuthUser(user)),
            None => {
                let uri = parts
                    .extensions
                    .get::<OriginalUri>()
                    .map(|original| &original.0)
                    .unwrap_or(&parts.uri);
                Err(AppError::LoginRequired {
                    next: uri.path().to_string(),
                })
            }
        }
    }
}
