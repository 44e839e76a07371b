use serde::{Deserialize, Serialize};

use super::shared::{FormErrors, REQUIRED, check_required_text};
use crate::entity::page::TITLE_MAX_LENGTH;
use crate::utils::url::{ensure_scheme, is_valid_http_url};

/// Submitted "add page" form.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct PageForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
}

/// A page form that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanPage {
    pub title: String,
    pub url: String,
}

impl PageForm {
    /// Validate the form. The URL gets `http://` prepended when it has no
    /// scheme; the cleaned value is also written back so a re-rendered form
    /// shows it.
    pub fn clean(&mut self) -> Result<CleanPage, FormErrors> {
        let mut errors = FormErrors::new();
        check_required_text(&mut errors, "title", &self.title, TITLE_MAX_LENGTH);

        self.url = ensure_scheme(&self.url);
        if self.url.is_empty() {
            errors.add("url", REQUIRED);
        } else if !is_valid_http_url(&self.url) {
            errors.add("url", "Enter a valid URL.");
        }

        if errors.is_empty() {
            Ok(CleanPage {
                title: self.title.trim().to_string(),
                url: self.url.clone(),
            })
        } else {
            Err(errors)
        }
    }
}
