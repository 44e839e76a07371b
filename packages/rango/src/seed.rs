use sea_orm::sea_query::OnConflict;
use sea_orm::*;
use tracing::info;

use crate::entity::{category, page};

struct SeedCategory {
    name: &'static str,
    views: i32,
    likes: i32,
    pages: &'static [(&'static str, &'static str)],
}

const PYTHON_PAGES: &[(&str, &str)] = &[
    (
        "Official Python Tutorial",
        "http://docs.python.org/3/tutorial/",
    ),
    (
        "How to Think like a Computer Scientist",
        "http://www.greenteapress.com/thinkpython/",
    ),
    (
        "Learn Python in 10 Minutes",
        "http://www.korokithakis.net/tutorials/python/",
    ),
];

const DJANGO_PAGES: &[(&str, &str)] = &[
    (
        "Official Django Tutorial",
        "https://docs.djangoproject.com/en/2.1/intro/tutorial01/",
    ),
    ("Django Rocks", "http://www.djangorocks.com/"),
    ("How to Tango with Django", "http://www.tangowithdjango.com/"),
];

const OTHER_PAGES: &[(&str, &str)] = &[
    ("Bottle", "http://bottlepy.org/docs/dev/"),
    ("Flask", "http://flask.pocoo.org"),
];

/// Sample data inserted on startup when `seed.enabled` is set.
const SEED_CATEGORIES: &[SeedCategory] = &[
    SeedCategory {
        name: "Python",
        views: 128,
        likes: 64,
        pages: PYTHON_PAGES,
    },
    SeedCategory {
        name: "Django",
        views: 64,
        likes: 32,
        pages: DJANGO_PAGES,
    },
    SeedCategory {
        name: "Other Frameworks",
        views: 32,
        likes: 16,
        pages: OTHER_PAGES,
    },
];

/// Populate the sample categories and their pages.
///
/// Safe to run on every start: categories that already exist are left
/// alone, and so are their pages.
pub async fn seed_sample_data(db: &DatabaseConnection) -> Result<(), DbErr> {
    let mut categories_inserted = 0u32;
    let mut pages_inserted = 0u32;

    for seed in SEED_CATEGORIES {
        let mut model = category::ActiveModel::named(seed.name);
        model.views = Set(seed.views);
        model.likes = Set(seed.likes);

        let result = category::Entity::insert(model)
            .on_conflict(
                OnConflict::column(category::Column::Name)
                    .do_nothing()
                    .to_owned(),
            )
            .exec(db)
            .await;

        let category_id = match result {
            Ok(res) => res.last_insert_id,
            Err(DbErr::RecordNotInserted) => continue,
            Err(e) => return Err(e),
        };
        categories_inserted += 1;

        for &(title, url) in seed.pages {
            page::ActiveModel {
                category_id: Set(category_id),
                title: Set(title.to_string()),
                url: Set(url.to_string()),
                views: Set(0),
                ..Default::default()
            }
            .insert(db)
            .await?;
            pages_inserted += 1;
        }
    }

    if categories_inserted > 0 {
        info!(
            "Seeded {} categories with {} pages",
            categories_inserted, pages_inserted
        );
    }

    Ok(())
}
