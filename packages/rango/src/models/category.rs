use sea_orm::*;
use serde::{Deserialize, Serialize};

use super::shared::{FormErrors, check_required_text};
use crate::entity::category::{self, NAME_MAX_LENGTH};
use crate::utils::slug::slugify;

/// Submitted "add category" form.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct CategoryForm {
    #[serde(default)]
    pub name: String,
}

impl CategoryForm {
    pub fn name(&self) -> &str {
        self.name.trim()
    }

    /// Checks that need no database access.
    pub fn check(&self) -> FormErrors {
        let mut errors = FormErrors::new();
        check_required_text(&mut errors, "name", &self.name, NAME_MAX_LENGTH);
        if !errors.has("name") && slugify(self.name()).is_empty() {
            errors.add("name", "Name must contain at least one letter or digit.");
        }
        errors
    }

    /// Full validation, including the uniqueness of the name and of the slug
    /// derived from it.
    pub async fn validate<C: ConnectionTrait>(&self, db: &C) -> Result<FormErrors, DbErr> {
        let mut errors = self.check();
        if !errors.is_empty() {
            return Ok(errors);
        }

        let name = self.name();
        let clash = category::Entity::find()
            .filter(
                Condition::any()
                    .add(category::Column::Name.eq(name))
                    .add(category::Column::Slug.eq(slugify(name))),
            )
            .one(db)
            .await?;

        if let Some(existing) = clash {
            if existing.name == name {
                errors.add("name", "Category with this Name already exists.");
            } else {
                errors.add(
                    "name",
                    format!("Name is too similar to the existing category '{}'.", existing.name),
                );
            }
        }

        Ok(errors)
    }
}
