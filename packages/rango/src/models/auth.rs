use sea_orm::*;
use serde::{Deserialize, Serialize};

use super::shared::{FormErrors, REQUIRED};
use crate::entity::user::{self, USERNAME_MAX_LENGTH};
use crate::utils::media::picture_extension;
use crate::utils::url::{ensure_scheme, is_valid_http_url};

const PASSWORD_MAX_LENGTH: usize = 128;
const EMAIL_MAX_LENGTH: usize = 254;

/// Submitted login form.
#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Where to go after logging in; only local paths are honoured.
    #[serde(default)]
    pub next: Option<String>,
}

impl LoginForm {
    pub fn redirect_target(&self) -> Option<&str> {
        self.next.as_deref().and_then(safe_next)
    }
}

/// Accept `next` only if it is a path on this site.
pub fn safe_next(next: &str) -> Option<&str> {
    let next = next.trim();
    let local = next.starts_with('/') && !next.starts_with("//") && !next.contains('\\');
    local.then_some(next)
}

/// Account half of the registration form.
#[derive(Debug, Default, Clone, Serialize)]
pub struct UserForm {
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
}

impl UserForm {
    pub fn username(&self) -> &str {
        self.username.trim()
    }

    pub fn email(&self) -> &str {
        self.email.trim()
    }

    /// Checks that need no database access.
    pub fn check(&self) -> FormErrors {
        let mut errors = FormErrors::new();

        let username = self.username();
        if username.is_empty() {
            errors.add("username", REQUIRED);
        } else if username.chars().count() > USERNAME_MAX_LENGTH {
            errors.add(
                "username",
                format!("Ensure this value has at most {USERNAME_MAX_LENGTH} characters."),
            );
        } else if !username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
        {
            errors.add(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        }

        let email = self.email();
        if !email.is_empty() && !is_plausible_email(email) {
            errors.add("email", "Enter a valid email address.");
        }

        if self.password.is_empty() {
            errors.add("password", REQUIRED);
        } else if self.password.len() > PASSWORD_MAX_LENGTH {
            errors.add(
                "password",
                format!("Ensure this value has at most {PASSWORD_MAX_LENGTH} characters."),
            );
        }

        errors
    }

    /// Full validation, including username uniqueness.
    pub async fn validate<C: ConnectionTrait>(&self, db: &C) -> Result<FormErrors, DbErr> {
        let mut errors = self.check();
        if errors.has("username") {
            return Ok(errors);
        }

        let taken = user::Entity::find()
            .filter(user::Column::Username.eq(self.username()))
            .one(db)
            .await?
            .is_some();
        if taken {
            errors.add("username", "A user with that username already exists.");
        }

        Ok(errors)
    }
}

fn is_plausible_email(email: &str) -> bool {
    if email.len() > EMAIL_MAX_LENGTH || email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.rsplit_once('@') else {
        return false;
    };
    !local.is_empty()
        && !local.contains('@')
        && domain.split('.').count() >= 2
        && domain.split('.').all(|label| !label.is_empty())
}

/// An uploaded file as read from the multipart body.
#[derive(Debug, Clone)]
pub struct UploadedPicture {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Profile half of the registration form.
#[derive(Debug, Default, Clone, Serialize)]
pub struct ProfileForm {
    pub website: String,
    #[serde(skip)]
    pub picture: Option<UploadedPicture>,
}

/// A profile form that passed validation.
#[derive(Debug, Clone)]
pub struct CleanProfile {
    /// Empty when left blank.
    pub website: String,
    /// Normalized image extension and contents.
    pub picture: Option<(&'static str, Vec<u8>)>,
}

impl ProfileForm {
    pub fn clean(&mut self) -> Result<CleanProfile, FormErrors> {
        let mut errors = FormErrors::new();

        self.website = ensure_scheme(&self.website);
        if !self.website.is_empty() && !is_valid_http_url(&self.website) {
            errors.add("website", "Enter a valid URL.");
        }

        let picture = match self.picture.take() {
            None => None,
            Some(upload) if upload.bytes.is_empty() => {
                errors.add("picture", "The submitted file is empty.");
                None
            }
            Some(upload) => match picture_extension(&upload.filename) {
                Some(ext) => Some((ext, upload.bytes)),
                None => {
                    errors.add(
                        "picture",
                        "Upload a valid image. The file you uploaded was either not an image or a corrupted image.",
                    );
                    None
                }
            },
        };

        if errors.is_empty() {
            Ok(CleanProfile {
                website: self.website.clone(),
                picture,
            })
        } else {
            Err(errors)
        }
    }
}
