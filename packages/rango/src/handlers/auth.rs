use std::path::Path;

use axum::extract::{DefaultBodyLimit, Multipart, Query, State, multipart::Field};
use axum::response::{Html, IntoResponse, Redirect, Response};
use chrono::Utc;
use sea_orm::*;
use serde::Deserialize;
use tracing::instrument;

use crate::config::AppConfig;
use crate::entity::{user, user_profile};
use crate::error::AppError;
use crate::extractors::auth::{AuthUser, CurrentUser};
use crate::extractors::form::AppForm;
use crate::models::auth::{
    CleanProfile, LoginForm, ProfileForm, UploadedPicture, UserForm, safe_next,
};
use crate::models::shared::FormErrors;
use crate::routes::paths;
use crate::session::{AUTH_USER_KEY, Session};
use crate::state::AppState;
use crate::templates::{base_context, render};
use crate::utils::{hash, media};

/// Room for the text fields on top of the largest accepted picture.
const FORM_FIELDS_ALLOWANCE: usize = 64 * 1024;

pub fn register_body_limit(config: &AppConfig) -> DefaultBodyLimit {
    DefaultBodyLimit::max(config.media.max_upload_bytes + FORM_FIELDS_ALLOWANCE)
}

#[instrument(skip_all)]
pub async fn register_page(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
) -> Result<Html<String>, AppError> {
    render_register(
        &state,
        current.as_ref(),
        &UserForm::default(),
        &ProfileForm::default(),
        &FormErrors::new(),
        false,
    )
}

/// Handle the registration form: create the user and its profile together.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
    mut multipart: Multipart,
) -> Result<Html<String>, AppError> {
    let mut user_form = UserForm::default();
    let mut profile_form = ProfileForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Multipart error: {e}")))?
    {
        match field.name() {
            Some("username") => user_form.username = read_text(field).await?,
            Some("email") => user_form.email = read_text(field).await?,
            Some("password") => user_form.password = read_text(field).await?,
            Some("website") => profile_form.website = read_text(field).await?,
            Some("picture") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read picture: {e}")))?;
                // Browsers send an empty, nameless part when no file was chosen.
                if !filename.is_empty() || !bytes.is_empty() {
                    profile_form.picture = Some(UploadedPicture {
                        filename,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            _ => {} // Ignore unknown fields.
        }
    }

    let mut errors = user_form.validate(&state.db).await?;
    let profile = match profile_form.clean() {
        Ok(profile) => Some(profile),
        Err(profile_errors) => {
            errors.extend(profile_errors);
            None
        }
    };

    let registered = match profile {
        Some(profile) if errors.is_empty() => {
            let media_root = &state.config.media.root;
            match create_account(&state.db, media_root, &user_form, profile).await? {
                Some(created) => {
                    tracing::info!(user_id = created.id, "User registered");
                    true
                }
                None => {
                    errors.add("username", "A user with that username already exists.");
                    false
                }
            }
        }
        _ => false,
    };

    if !registered {
        tracing::warn!(%errors, "Registration form invalid");
    }

    render_register(
        &state,
        current.as_ref(),
        &user_form,
        &profile_form,
        &errors,
        registered,
    )
}

/// Create the user and its profile in one transaction.
///
/// The picture is written only once the user row is in, and removed again
/// if the profile insert or the commit fails. Returns `None` when the
/// username was taken in the meantime.
pub async fn create_account(
    db: &DatabaseConnection,
    media_root: &Path,
    user_form: &UserForm,
    profile: CleanProfile,
) -> Result<Option<user::Model>, AppError> {
    let password = hash::hash_password(&user_form.password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;

    let txn = db.begin().await?;
    let new_user = user::ActiveModel {
        username: Set(user_form.username().to_string()),
        email: Set(user_form.email().to_string()),
        password: Set(password),
        is_active: Set(true),
        date_joined: Set(Utc::now()),
        last_login: Set(None),
        ..Default::default()
    };

    let created = match new_user.insert(&txn).await {
        Ok(created) => created,
        Err(e) => {
            return match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    tracing::debug!("Registration race: unique constraint caught on insert");
                    txn.rollback().await?;
                    Ok(None)
                }
                _ => Err(e.into()),
            };
        }
    };

    let picture = match profile.picture {
        Some((ext, bytes)) => media::store_profile_picture(media_root, ext, &bytes).await?,
        None => String::new(),
    };

    let profile_row = user_profile::ActiveModel {
        user_id: Set(created.id),
        website: Set(profile.website),
        picture: Set(picture.clone()),
        ..Default::default()
    };
    let saved = match profile_row.insert(&txn).await {
        Ok(_) => txn.commit().await,
        Err(e) => Err(e),
    };

    if let Err(e) = saved {
        if !picture.is_empty() {
            media::remove_stored_file(media_root, &picture).await;
        }
        return Err(e.into());
    }

    Ok(Some(created))
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

#[instrument(skip_all)]
pub async fn login_page(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
    Query(query): Query<LoginQuery>,
) -> Result<Html<String>, AppError> {
    let mut context = base_context(&state, current.as_ref());
    context.insert(
        "next",
        query.next.as_deref().and_then(safe_next).unwrap_or_default(),
    );
    render(&state, "login.html", &context)
}

/// Handle the login form.
///
/// Bad credentials and disabled accounts get a plain-text reply and no
/// session; success cycles the session key and redirects.
#[instrument(skip(state, session, form), fields(username = %form.username))]
pub async fn login(
    State(state): State<AppState>,
    mut session: Session,
    AppForm(form): AppForm<LoginForm>,
) -> Result<Response, AppError> {
    let Some(user) = authenticate(&state.db, form.username.trim(), &form.password).await? else {
        tracing::info!("Invalid login details supplied");
        return Err(AppError::InvalidCredentials);
    };

    if !user.is_active {
        tracing::info!(user_id = user.id, "Login attempt on a disabled account");
        return Err(AppError::AccountDisabled);
    }

    login_user(&state.db, &mut session, &user).await?;
    let jar = session.save(&state.db, &state.config.session).await?;

    let target = form.redirect_target().unwrap_or(paths::INDEX).to_string();
    Ok((jar, Redirect::to(&target)).into_response())
}

#[instrument(skip_all, fields(user_id = user.id))]
pub async fn logout(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    mut session: Session,
) -> Result<Response, AppError> {
    session.flush();
    let jar = session.save(&state.db, &state.config.session).await?;
    Ok((jar, Redirect::to(paths::INDEX)).into_response())
}

/// Look up a user by name and check the password.
///
/// Returns the user whether or not the account is active; callers decide
/// what to do with disabled accounts.
pub async fn authenticate<C: ConnectionTrait>(
    db: &C,
    username: &str,
    password: &str,
) -> Result<Option<user::Model>, AppError> {
    if username.is_empty() || password.is_empty() {
        return Ok(None);
    }

    let Some(user) = user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await?
    else {
        return Ok(None);
    };

    let is_valid = hash::verify_password(password, &user.password)
        .map_err(|e| AppError::Internal(format!("Password verify error: {}", e)))?;

    Ok(is_valid.then_some(user))
}

/// Bind `user` to the session and stamp `last_login`.
async fn login_user<C: ConnectionTrait>(
    db: &C,
    session: &mut Session,
    user: &user::Model,
) -> Result<(), DbErr> {
    match session.user_id() {
        // Someone else was logged in on this browser: start from scratch.
        Some(other) if other != user.id => session.flush(),
        _ => session.cycle_key(),
    }
    session.insert(AUTH_USER_KEY, user.id);

    let mut active: user::ActiveModel = user.clone().into();
    active.last_login = Set(Some(Utc::now()));
    active.update(db).await?;

    Ok(())
}

async fn read_text(field: Field<'_>) -> Result<String, AppError> {
    let name = field.name().unwrap_or_default().to_string();
    field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read {name}: {e}")))
}

fn render_register(
    state: &AppState,
    current: Option<&user::Model>,
    user_form: &UserForm,
    profile_form: &ProfileForm,
    errors: &FormErrors,
    registered: bool,
) -> Result<Html<String>, AppError> {
    let mut context = base_context(state, current);
    context.insert("user_form", user_form);
    context.insert("profile_form", profile_form);
    context.insert("errors", errors);
    context.insert("registered", &registered);
    render(state, "register.html", &context)
}
