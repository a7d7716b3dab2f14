use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::{
    db::{Connection, DieselResult},
    schema::locations,
};

#[derive(Clone, Debug, Queryable, Identifiable)]
pub struct Location {
    pub id: i32,
    pub name: String,
    pub is_published: bool,
    pub created_at: NaiveDateTime,
}

/// All published locations, for the post form's picker.
pub fn published(connection: &Connection) -> DieselResult<Vec<Location>> {
    use crate::schema::locations::dsl;

    dsl::locations
        .filter(dsl::is_published.eq(true))
        .order(dsl::name.asc())
        .load(connection)
}
