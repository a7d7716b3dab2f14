use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::{
    db::{Connection, DieselResult},
    schema::categories,
};

#[derive(Clone, Debug, Queryable, Identifiable)]
#[table_name = "categories"]
pub struct Category {
    pub id: i32,
    /// The category's display title
    pub title: String,
    pub description: String,
    /// The pretty url of the category
    pub slug: String,
    /// Whether the category (and with it, its posts) is publicly visible
    pub is_published: bool,
    pub created_at: NaiveDateTime,
}

/// Look up a published category by its slug. An unpublished category is
/// indistinguishable from a missing one.
pub fn published_by_slug(connection: &Connection, slug: &str) -> DieselResult<Option<Category>> {
    use crate::schema::categories::dsl;

    dsl::categories
        .filter(dsl::slug.eq(slug))
        .filter(dsl::is_published.eq(true))
        .first(connection)
        .optional()
}

/// All published categories, for the post form's picker.
pub fn published(connection: &Connection) -> DieselResult<Vec<Category>> {
    use crate::schema::categories::dsl;

    dsl::categories
        .filter(dsl::is_published.eq(true))
        .order(dsl::title.asc())
        .load(connection)
}
