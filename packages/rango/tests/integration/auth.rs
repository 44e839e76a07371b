use sea_orm::{ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter};

use rango::entity::{session, user, user_profile};
use rango::handlers::auth::create_account;
use rango::models::auth::{CleanProfile, UserForm};
use rango::utils::media::PROFILE_IMAGES_DIR;

use crate::common::{TestApp, routes};

/// Number of files under the profile picture directory.
fn stored_pictures(app: &TestApp) -> usize {
    match std::fs::read_dir(app.config.media.root.join(PROFILE_IMAGES_DIR)) {
        Ok(entries) => entries.count(),
        Err(_) => 0,
    }
}

fn png_part() -> reqwest::multipart::Part {
    reqwest::multipart::Part::bytes(vec![0x89, b'P', b'N', b'G'])
        .file_name("me.png")
        .mime_str("image/png")
        .unwrap()
}

mod registration {
    use super::*;

    #[tokio::test]
    async fn register_form_renders() {
        let app = TestApp::spawn().await;

        let res = app.get(routes::REGISTER).await;

        assert_eq!(res.status, 200);
        assert!(res.text.contains("register here!"));
        assert!(res.text.contains("multipart/form-data"));
    }

    #[tokio::test]
    async fn new_user_can_register() {
        let app = TestApp::spawn().await;

        let res = app.register("alice", "securepass").await;

        assert_eq!(res.status, 200);
        assert!(res.text.contains("thank you for registering!"));

        let alice = user::Entity::find()
            .filter(user::Column::Username.eq("alice"))
            .one(&app.db)
            .await
            .unwrap()
            .unwrap();
        assert!(alice.is_active);
        assert_eq!(alice.email, "alice@example.com");
        assert_ne!(alice.password, "securepass");

        let profile = alice
            .find_related(user_profile::Entity)
            .one(&app.db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(profile.website, "");
        assert_eq!(profile.picture, "");
    }

    #[tokio::test]
    async fn registration_stores_website_and_picture() {
        let app = TestApp::spawn().await;
        let form = reqwest::multipart::Form::new()
            .text("username", "alice")
            .text("email", "")
            .text("password", "securepass")
            .text("website", "www.example.com")
            .part("picture", png_part());

        let res = app.post_multipart(routes::REGISTER, form).await;
        assert_eq!(res.status, 200, "Registration failed: {}", res.text);

        let profile = user_profile::Entity::find()
            .one(&app.db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(profile.website, "http://www.example.com");
        assert!(profile.picture.starts_with("profile_images/"));
        assert!(profile.picture.ends_with(".png"));
        assert!(app.config.media.root.join(&profile.picture).is_file());

        let served = app.get(&format!("/media/{}", profile.picture)).await;
        assert_eq!(served.status, 200);
    }

    #[tokio::test]
    async fn non_image_picture_is_rejected() {
        let app = TestApp::spawn().await;
        let picture = reqwest::multipart::Part::bytes(b"hello".to_vec()).file_name("notes.txt");
        let form = reqwest::multipart::Form::new()
            .text("username", "alice")
            .text("password", "securepass")
            .part("picture", picture);

        let res = app.post_multipart(routes::REGISTER, form).await;

        assert_eq!(res.status, 200);
        assert!(res.text.contains("Upload a valid image."));
        assert_eq!(user::Entity::find().count(&app.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn taken_username_is_rejected() {
        let app = TestApp::spawn().await;
        app.create_user("alice", "securepass", true).await;

        let res = app.register("alice", "otherpass").await;

        assert_eq!(res.status, 200);
        assert!(res.text.contains("A user with that username already exists."));
        assert!(!res.text.contains("thank you for registering!"));
        assert_eq!(user::Entity::find().count(&app.db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn rejected_registration_stores_no_picture() {
        let app = TestApp::spawn().await;
        app.create_user("alice", "securepass", true).await;
        let form = reqwest::multipart::Form::new()
            .text("username", "alice")
            .text("password", "otherpass")
            .part("picture", png_part());

        let res = app.post_multipart(routes::REGISTER, form).await;

        assert_eq!(res.status, 200);
        assert!(res.text.contains("A user with that username already exists."));
        assert_eq!(stored_pictures(&app), 0);
    }

    #[tokio::test]
    async fn username_taken_at_insert_time_leaves_no_picture() {
        let app = TestApp::spawn().await;
        // Taken after the form was validated, as by a concurrent registration.
        app.create_user("bob", "securepass", true).await;
        let form = UserForm {
            username: "bob".into(),
            email: String::new(),
            password: "otherpass".into(),
        };
        let profile = CleanProfile {
            website: String::new(),
            picture: Some(("png", vec![0x89, b'P', b'N', b'G'])),
        };

        let created = create_account(&app.db, &app.config.media.root, &form, profile)
            .await
            .unwrap();

        assert!(created.is_none());
        assert_eq!(stored_pictures(&app), 0);
        assert_eq!(user::Entity::find().count(&app.db).await.unwrap(), 1);
        assert_eq!(user_profile::Entity::find().count(&app.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn missing_password_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.register("alice", "").await;

        assert_eq!(res.status, 200);
        assert!(res.text.contains("This field is required."));
        assert_eq!(user::Entity::find().count(&app.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn deleting_a_user_deletes_the_profile() {
        let app = TestApp::spawn().await;
        app.register("alice", "securepass").await;

        let alice = user::Entity::find().one(&app.db).await.unwrap().unwrap();
        alice.delete(&app.db).await.unwrap();

        assert_eq!(user_profile::Entity::find().count(&app.db).await.unwrap(), 0);
    }
}

mod login {
    use super::*;

    #[tokio::test]
    async fn login_form_carries_next() {
        let app = TestApp::spawn().await;

        let res = app.get(&routes::login_with_next(routes::RESTRICTED)).await;

        assert_eq!(res.status, 200);
        assert!(res.text.contains(r#"name="next""#));
        assert!(res.text.contains("restricted"));
    }

    #[tokio::test]
    async fn valid_credentials_log_the_user_in() {
        let app = TestApp::spawn().await;
        app.create_user("alice", "securepass", true).await;

        let res = app.login("alice", "securepass").await;

        res.assert_redirect(routes::INDEX);
        assert_eq!(session::Entity::find().count(&app.db).await.unwrap(), 1);

        let restricted = app.get(routes::RESTRICTED).await;
        assert_eq!(restricted.status, 200);
        assert!(restricted.text.contains("Since you're logged in, you can see this text!"));

        let alice = user::Entity::find().one(&app.db).await.unwrap().unwrap();
        assert!(alice.last_login.is_some());
    }

    #[tokio::test]
    async fn login_follows_a_local_next() {
        let app = TestApp::spawn().await;
        app.create_user("alice", "securepass", true).await;

        let res = app
            .post_form(
                routes::LOGIN,
                &[
                    ("username", "alice"),
                    ("password", "securepass"),
                    ("next", routes::RESTRICTED),
                ],
            )
            .await;

        res.assert_redirect(routes::RESTRICTED);
    }

    #[tokio::test]
    async fn login_ignores_an_external_next() {
        let app = TestApp::spawn().await;
        app.create_user("alice", "securepass", true).await;

        let res = app
            .post_form(
                routes::LOGIN,
                &[
                    ("username", "alice"),
                    ("password", "securepass"),
                    ("next", "https://evil.example.com/"),
                ],
            )
            .await;

        res.assert_redirect(routes::INDEX);
    }

    #[tokio::test]
    async fn wrong_password_is_refused_without_a_session() {
        let app = TestApp::spawn().await;
        app.create_user("alice", "securepass", true).await;

        let res = app.login("alice", "wrongpass").await;

        assert_eq!(res.status, 401);
        assert_eq!(res.text, "Invalid login details supplied.");
        assert_eq!(session::Entity::find().count(&app.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn unknown_user_is_refused() {
        let app = TestApp::spawn().await;

        let res = app.login("nobody", "whatever").await;

        assert_eq!(res.status, 401);
        assert_eq!(res.text, "Invalid login details supplied.");
    }

    #[tokio::test]
    async fn disabled_account_is_refused() {
        let app = TestApp::spawn().await;
        app.create_user("alice", "securepass", false).await;

        let res = app.login("alice", "securepass").await;

        assert_eq!(res.status, 403);
        assert_eq!(res.text, "Your Rango account is disabled.");
        assert_eq!(session::Entity::find().count(&app.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn login_replaces_the_session_key() {
        let app = TestApp::spawn().await;
        app.create_user("alice", "securepass", true).await;
        app.get(routes::ABOUT).await;
        let before = session::Entity::find().one(&app.db).await.unwrap().unwrap();

        app.login("alice", "securepass")
            .await
            .assert_redirect(routes::INDEX);

        let after = session::Entity::find().all(&app.db).await.unwrap();
        assert_eq!(after.len(), 1);
        assert_ne!(after[0].session_key, before.session_key);
        // Visit data survives the key change.
        assert!(after[0].session_data.contains("visits"));
    }
}

mod access {
    use super::*;

    #[tokio::test]
    async fn restricted_page_sends_anonymous_visitors_to_login() {
        let app = TestApp::spawn().await;

        let res = app.get(routes::RESTRICTED).await;

        res.assert_redirect(&routes::login_with_next(routes::RESTRICTED));
    }

    #[tokio::test]
    async fn logout_ends_the_session() {
        let app = TestApp::spawn().await;
        app.login_as("alice").await;

        let res = app.get(routes::LOGOUT).await;
        res.assert_redirect(routes::INDEX);
        assert_eq!(session::Entity::find().count(&app.db).await.unwrap(), 0);

        let restricted = app.get(routes::RESTRICTED).await;
        restricted.assert_redirect(&routes::login_with_next(routes::RESTRICTED));
    }

    #[tokio::test]
    async fn logout_requires_login() {
        let app = TestApp::spawn().await;

        let res = app.get(routes::LOGOUT).await;

        res.assert_redirect(&routes::login_with_next(routes::LOGOUT));
    }

    #[tokio::test]
    async fn disabled_user_loses_access_mid_session() {
        use sea_orm::{ActiveModelTrait, IntoActiveModel, Set};

        let app = TestApp::spawn().await;
        let alice = app.login_as("alice").await;

        let mut active = alice.into_active_model();
        active.is_active = Set(false);
        active.update(&app.db).await.unwrap();

        let res = app.get(routes::RESTRICTED).await;
        res.assert_redirect(&routes::login_with_next(routes::RESTRICTED));
    }
}
