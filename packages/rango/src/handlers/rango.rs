use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use chrono::Local;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{category, page};
use crate::error::AppError;
use crate::extractors::auth::{AuthUser, CurrentUser};
use crate::extractors::form::AppForm;
use crate::models::category::CategoryForm;
use crate::models::page::PageForm;
use crate::models::shared::FormErrors;
use crate::routes::paths;
use crate::session::Session;
use crate::state::AppState;
use crate::templates::{base_context, render};
use crate::visits;

/// How many categories and pages the index lists.
const TOP_N: u64 = 5;

#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    mut session: Session,
) -> Result<impl IntoResponse, AppError> {
    let categories = category::Entity::find()
        .order_by_desc(category::Column::Likes)
        .order_by_asc(category::Column::Id)
        .limit(TOP_N)
        .all(&state.db)
        .await?;
    let pages = page::Entity::find()
        .order_by_desc(page::Column::Views)
        .order_by_asc(page::Column::Id)
        .limit(TOP_N)
        .all(&state.db)
        .await?;

    let visits = visits::record_visit(&mut session, Local::now().naive_local());

    let mut context = base_context(&state, user.as_ref());
    context.insert("boldmessage", &state.config.site.tagline);
    context.insert("categories", &categories);
    context.insert("pages", &pages);
    context.insert("visits", &visits);
    let html = render(&state, "index.html", &context)?;

    let jar = session.save(&state.db, &state.config.session).await?;
    Ok((jar, html))
}

#[instrument(skip_all)]
pub async fn about(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    mut session: Session,
) -> Result<impl IntoResponse, AppError> {
    let visits = visits::record_visit(&mut session, Local::now().naive_local());

    let mut context = base_context(&state, user.as_ref());
    context.insert("name", &state.config.site.author);
    context.insert("visits", &visits);
    let html = render(&state, "about.html", &context)?;

    let jar = session.save(&state.db, &state.config.session).await?;
    Ok((jar, html))
}

/// Category detail. An unknown slug renders the page with neither a
/// category nor pages rather than a 404.
#[instrument(skip(state, user))]
pub async fn show_category(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(category_name_slug): Path<String>,
) -> Result<Html<String>, AppError> {
    let mut context = base_context(&state, user.as_ref());

    match find_category(&state.db, &category_name_slug).await? {
        Some(category) => {
            let pages = category.find_related(page::Entity).all(&state.db).await?;
            context.insert("pages", &pages);
            context.insert("category", &category);
        }
        None => {
            context.insert("pages", &Option::<Vec<page::Model>>::None);
            context.insert("category", &Option::<category::Model>::None);
        }
    }

    render(&state, "category.html", &context)
}

#[instrument(skip_all, fields(user_id = user.id))]
pub async fn add_category_page(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Html<String>, AppError> {
    render_category_form(&state, &user, &CategoryForm::default(), &FormErrors::new())
}

#[instrument(skip_all, fields(user_id = user.id, name = %form.name))]
pub async fn add_category(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppForm(form): AppForm<CategoryForm>,
) -> Result<Response, AppError> {
    let mut errors = form.validate(&state.db).await?;

    if errors.is_empty() {
        match category::ActiveModel::named(form.name()).insert(&state.db).await {
            Ok(created) => {
                tracing::info!(slug = %created.slug, "Category created");
                return Ok(Redirect::to(paths::INDEX).into_response());
            }
            Err(e) => match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    tracing::debug!("Category race: unique constraint caught on insert");
                    errors.add("name", "Category with this Name already exists.");
                }
                _ => return Err(e.into()),
            },
        }
    }

    tracing::warn!(%errors, "Category form invalid");
    Ok(render_category_form(&state, &user, &form, &errors)?.into_response())
}

#[instrument(skip(state, user), fields(user_id = user.id))]
pub async fn add_page_page(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(category_name_slug): Path<String>,
) -> Result<Response, AppError> {
    let Some(category) = find_category(&state.db, &category_name_slug).await? else {
        return Ok(Redirect::to(paths::INDEX).into_response());
    };

    let html = render_page_form(
        &state,
        &user,
        &category,
        &PageForm::default(),
        &FormErrors::new(),
    )?;
    Ok(html.into_response())
}

#[instrument(skip(state, user, form), fields(user_id = user.id))]
pub async fn add_page(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(category_name_slug): Path<String>,
    AppForm(mut form): AppForm<PageForm>,
) -> Result<Response, AppError> {
    let Some(category) = find_category(&state.db, &category_name_slug).await? else {
        return Ok(Redirect::to(paths::INDEX).into_response());
    };

    match form.clean() {
        Ok(clean) => {
            let new_page = page::ActiveModel {
                category_id: Set(category.id),
                title: Set(clean.title),
                url: Set(clean.url),
                views: Set(0),
                ..Default::default()
            };
            new_page.insert(&state.db).await?;
            Ok(Redirect::to(&paths::category(&category.slug)).into_response())
        }
        Err(errors) => {
            tracing::warn!(%errors, "Page form invalid");
            let html = render_page_form(&state, &user, &category, &form, &errors)?;
            Ok(html.into_response())
        }
    }
}

#[instrument(skip_all, fields(user_id = user.id))]
pub async fn restricted(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Html<String>, AppError> {
    let context = base_context(&state, Some(&user));
    render(&state, "restricted.html", &context)
}

async fn find_category<C: ConnectionTrait>(
    db: &C,
    slug: &str,
) -> Result<Option<category::Model>, DbErr> {
    category::Entity::find()
        .filter(category::Column::Slug.eq(slug))
        .one(db)
        .await
}

fn render_category_form(
    state: &AppState,
    user: &crate::entity::user::Model,
    form: &CategoryForm,
    errors: &FormErrors,
) -> Result<Html<String>, AppError> {
    let mut context = base_context(state, Some(user));
    context.insert("form", form);
    context.insert("errors", errors);
    render(state, "add_category.html", &context)
}

fn render_page_form(
    state: &AppState,
    user: &crate::entity::user::Model,
    category: &category::Model,
    form: &PageForm,
    errors: &FormErrors,
) -> Result<Html<String>, AppError> {
    let mut context = base_context(state, Some(user));
    context.insert("category", category);
    context.insert("form", form);
    context.insert("errors", errors);
    render(state, "add_page.html", &context)
}
