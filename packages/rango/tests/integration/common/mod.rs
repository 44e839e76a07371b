use std::net::SocketAddr;
use std::sync::Arc;

use chrono::Utc;
use reqwest::{Client, redirect::Policy};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use tempfile::TempDir;

use rango::config::{
    AppConfig, DatabaseConfig, MediaConfig, SeedConfig, ServerConfig, SessionConfig, SiteConfig,
};
use rango::entity::{category, page, user};
use rango::state::AppState;
use rango::utils::hash::hash_password;

pub mod routes {
    pub use rango::routes::paths::*;
}

/// A running test server backed by its own SQLite file.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub db: DatabaseConnection,
    pub config: AppConfig,
    /// Holds the database file and media root; dropped with the app.
    _dir: TempDir,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// `Location` header, for redirects.
    pub location: Option<String>,
    pub text: String,
}

impl TestResponse {
    async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let location = res
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let text = res.text().await.expect("Failed to read response body");
        Self {
            status,
            location,
            text,
        }
    }

    pub fn assert_redirect(&self, to: &str) {
        assert_eq!(self.status, 303, "Expected redirect, got: {}", self.text);
        assert_eq!(self.location.as_deref(), Some(to));
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_url = format!("sqlite://{}?mode=rwc", dir.path().join("rango.db").display());

        let db = rango::database::init_db(&db_url)
            .await
            .expect("Failed to initialize test database");

        let config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            database: DatabaseConfig { url: db_url },
            session: SessionConfig {
                cookie_name: "sessionid".to_string(),
                max_age_days: 14,
                secure: false,
            },
            media: MediaConfig {
                root: dir.path().join("media"),
                max_upload_bytes: 1024 * 1024,
            },
            site: SiteConfig {
                title: "Rango".to_string(),
                tagline: "Crunchy, creamy, cookie, candy, cupcake!".to_string(),
                author: "kate".to_string(),
            },
            seed: SeedConfig { enabled: false },
        };

        let state = AppState {
            db: db.clone(),
            config: config.clone(),
            templates: Arc::new(rango::templates::load().expect("Failed to load templates")),
        };
        let app = rango::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = Client::builder()
            .cookie_store(true)
            .redirect(Policy::none())
            .build()
            .expect("Failed to build HTTP client");

        Self {
            addr,
            client,
            db,
            config,
            _dir: dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn post_multipart(&self, path: &str, form: reqwest::multipart::Form) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send multipart request");

        TestResponse::from_response(res).await
    }

    /// Submit the registration form with text fields only.
    pub async fn register(&self, username: &str, password: &str) -> TestResponse {
        let form = reqwest::multipart::Form::new()
            .text("username", username.to_string())
            .text("email", format!("{username}@example.com"))
            .text("password", password.to_string())
            .text("website", "");
        self.post_multipart(routes::REGISTER, form).await
    }

    pub async fn login(&self, username: &str, password: &str) -> TestResponse {
        self.post_form(
            routes::LOGIN,
            &[("username", username), ("password", password)],
        )
        .await
    }

    /// Create a user directly in the database.
    pub async fn create_user(&self, username: &str, password: &str, is_active: bool) -> user::Model {
        user::ActiveModel {
            username: Set(username.to_string()),
            email: Set(String::new()),
            password: Set(hash_password(password).unwrap()),
            is_active: Set(is_active),
            date_joined: Set(Utc::now()),
            last_login: Set(None),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .expect("Failed to create user")
    }

    /// Create an active user and log this client in as them.
    pub async fn login_as(&self, username: &str) -> user::Model {
        let user = self.create_user(username, "password", true).await;
        self.login(username, "password")
            .await
            .assert_redirect(routes::INDEX);
        user
    }

    pub async fn create_category(&self, name: &str, views: i32, likes: i32) -> category::Model {
        let mut model = category::ActiveModel::named(name);
        model.views = Set(views);
        model.likes = Set(likes);
        model
            .insert(&self.db)
            .await
            .expect("Failed to create category")
    }

    pub async fn create_page(&self, category_id: i32, title: &str, views: i32) -> page::Model {
        page::ActiveModel {
            category_id: Set(category_id),
            title: Set(title.to_string()),
            url: Set(format!("http://example.com/{}", title.to_lowercase())),
            views: Set(views),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .expect("Failed to create page")
    }
}
