use chrono::NaiveDateTime;
use diesel::prelude::*;

use std::collections::HashMap;

use crate::{
    db::{Connection, DieselResult},
    schema::comments,
};

#[derive(Clone, Debug, Queryable, Identifiable)]
pub struct Comment {
    /// The unique id of this comment
    pub id: i32,
    /// The comment's content
    pub text: String,
    /// The id of the post this comment belongs to
    pub post: i32,
    /// The user who submitted the comment
    pub author: String,
    /// The time of the comment's submission
    pub created_at: NaiveDateTime,
}

#[derive(Clone, Debug, Insertable)]
#[table_name = "comments"]
pub struct NewComment {
    pub text: String,
    pub post: i32,
    pub author: String,
}

/// A post's comments in the order they were written.
pub fn for_post(connection: &Connection, post: i32) -> DieselResult<Vec<Comment>> {
    use crate::schema::comments::dsl;

    dsl::comments
        .filter(dsl::post.eq(post))
        .order(dsl::created_at.asc())
        .load(connection)
}

/// Comment counts for a batch of posts; one query for a whole listing page.
pub fn count_by_post(connection: &Connection, posts: &[i32]) -> DieselResult<HashMap<i32, i64>> {
    use crate::schema::comments::dsl;

    let rows: Vec<i32> = dsl::comments
        .select(dsl::post)
        .filter(dsl::post.eq_any(posts))
        .load(connection)?;

    let mut counts = HashMap::new();
    for post in rows {
        *counts.entry(post).or_insert(0i64) += 1;
    }
    Ok(counts)
}

pub fn get(connection: &Connection, id: i32) -> DieselResult<Option<Comment>> {
    use crate::schema::comments::dsl;

    dsl::comments.find(id).first(connection).optional()
}

pub fn submit(connection: &Connection, comment: &NewComment) -> DieselResult<usize> {
    diesel::insert_into(comments::table)
        .values(comment)
        .execute(connection)
}

pub fn edit(connection: &Connection, id: i32, text: &str) -> DieselResult<usize> {
    use crate::schema::comments::dsl;

    diesel::update(dsl::comments.find(id))
        .set(dsl::text.eq(text))
        .execute(connection)
}

pub fn delete(connection: &Connection, id: i32) -> DieselResult<usize> {
    use crate::schema::comments::dsl;

    diesel::delete(dsl::comments.find(id)).execute(connection)
}
