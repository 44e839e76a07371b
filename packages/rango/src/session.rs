//! Server-side session store.
//!
//! The browser only holds an opaque key in a cookie; the data is a JSON
//! object in the `session` table. A [`Session`] is loaded per request by its
//! extractor, mutated by the handler, and written back with [`Session::save`],
//! which yields the cookie jar to attach to the response.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{Duration, Utc};
use rand::distr::{Alphanumeric, SampleString};
use sea_orm::sea_query::OnConflict;
use sea_orm::*;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::config::SessionConfig;
use crate::entity::session;

/// Session key holding the logged-in user's id.
pub const AUTH_USER_KEY: &str = "_auth_user_id";

const SESSION_KEY_LENGTH: usize = 32;

#[derive(Clone, Debug, Default)]
pub struct Session {
    key: Option<String>,
    /// A key that must be deleted on save (after `cycle_key` or `flush`).
    stale_key: Option<String>,
    data: Map<String, Value>,
    modified: bool,
}

impl Session {
    /// An empty session with no key yet; one is assigned on first save.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the session stored under `key`.
    ///
    /// Unknown or expired keys yield an empty session. Corrupt data is
    /// discarded rather than failing the request.
    pub async fn load<C: ConnectionTrait>(db: &C, key: &str) -> Result<Self, DbErr> {
        let Some(row) = session::Entity::find_by_id(key.to_owned()).one(db).await? else {
            return Ok(Self::new());
        };

        if row.expire_date <= Utc::now() {
            return Ok(Self {
                stale_key: Some(row.session_key),
                ..Self::new()
            });
        }

        let data = match serde_json::from_str::<Map<String, Value>>(&row.session_data) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!("Discarding undecodable session data: {}", e);
                Map::new()
            }
        };

        Ok(Self {
            key: Some(row.session_key),
            data,
            ..Self::new()
        })
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        self.data
            .get(name)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.data.get(name).and_then(Value::as_str)
    }

    /// Store a value. Writing the value already stored does not mark the
    /// session as modified.
    pub fn insert(&mut self, name: &str, value: impl Into<Value>) {
        let value = value.into();
        if self.data.get(name) != Some(&value) {
            self.data.insert(name.to_owned(), value);
            self.modified = true;
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let removed = self.data.remove(name);
        if removed.is_some() {
            self.modified = true;
        }
        removed
    }

    /// The id of the logged-in user, if any.
    pub fn user_id(&self) -> Option<i32> {
        self.get(AUTH_USER_KEY)
    }

    /// Keep the data but move it to a fresh key.
    pub fn cycle_key(&mut self) {
        if let Some(old) = self.key.take() {
            self.stale_key = Some(old);
        }
        self.modified = true;
    }

    /// Drop all data and the key.
    pub fn flush(&mut self) {
        self.data.clear();
        self.cycle_key();
    }

    /// Persist the session if it changed and return the cookies to send.
    pub async fn save<C: ConnectionTrait>(
        mut self,
        db: &C,
        config: &SessionConfig,
    ) -> Result<CookieJar, DbErr> {
        let jar = CookieJar::new();
        if !self.modified {
            return Ok(jar);
        }

        if let Some(stale) = self.stale_key.take() {
            session::Entity::delete_by_id(stale).exec(db).await?;
        }

        if self.data.is_empty() {
            if let Some(key) = self.key.take() {
                session::Entity::delete_by_id(key).exec(db).await?;
            }
            let expired = Cookie::build((config.cookie_name.clone(), ""))
                .path("/")
                .max_age(time::Duration::ZERO);
            return Ok(jar.add(expired));
        }

        let key = self.key.take().unwrap_or_else(new_session_key);
        let row = session::ActiveModel {
            session_key: Set(key.clone()),
            session_data: Set(Value::Object(self.data).to_string()),
            expire_date: Set(Utc::now() + Duration::days(config.max_age_days)),
        };

        session::Entity::insert(row)
            .on_conflict(
                OnConflict::column(session::Column::SessionKey)
                    .update_columns([session::Column::SessionData, session::Column::ExpireDate])
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await?;

        let cookie = Cookie::build((config.cookie_name.clone(), key))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(config.secure)
            .max_age(time::Duration::days(config.max_age_days));

        Ok(jar.add(cookie))
    }
}

fn new_session_key() -> String {
    Alphanumeric.sample_string(&mut rand::rng(), SESSION_KEY_LENGTH)
}

/// Delete every expired session row. Returns how many were removed.
pub async fn clear_expired<C: ConnectionTrait>(db: &C) -> Result<u64, DbErr> {
    let result = session::Entity::delete_many()
        .filter(session::Column::ExpireDate.lte(Utc::now()))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}
