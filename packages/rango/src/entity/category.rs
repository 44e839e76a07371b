use sea_orm::{ActiveValue, Set};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::utils::slug::slugify;

pub const NAME_MAX_LENGTH: usize = 128;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "category")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub name: String,
    #[sea_orm(default_value = 0)]
    pub views: i32,
    #[sea_orm(default_value = 0)]
    pub likes: i32,

    /// Always `slugify(name)`; recomputed by `before_save` whenever the
    /// name is set.
    #[sea_orm(unique)]
    pub slug: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::page::Entity")]
    Page,
}

impl Related<super::page::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Page.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if let ActiveValue::Set(name) = &self.name {
            self.slug = Set(slugify(name));
        }
        Ok(self)
    }
}

impl ActiveModel {
    /// A new, unsaved category with zero views and likes.
    pub fn named(name: &str) -> Self {
        let mut model = Self {
            views: Set(0),
            likes: Set(0),
            ..Default::default()
        };
        model.rename(name);
        model
    }

    /// Set the name and recompute the slug from it.
    ///
    /// Bulk inserts (`Entity::insert`) skip `before_save`, so models built
    /// here already carry the right slug.
    pub fn rename(&mut self, name: &str) {
        self.name = Set(name.to_string());
        self.slug = Set(slugify(name));
    }
}
