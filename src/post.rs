//! The post model and the canonical post queries.
//!
//! Every listing and the detail page go through [`PostFilter`]: a filter
//! specification that is built up front and evaluated exactly once, either
//! as a page of [`PostView`] rows or as a row count.
use chrono::{NaiveDateTime, Utc};
use diesel::{pg::Pg, prelude::*};

use std::collections::HashMap;

use crate::{
    category::Category,
    comment,
    config::PAGE_SIZE,
    db::{Connection, DieselResult},
    error::Error,
    location::Location,
    schema::{categories, locations, posts, users},
    user::{Session, User},
};

/// Used when displaying a preview of the post's text in a listing.
const PREVIEW_LEN: usize = 500;

#[derive(Clone, Debug, Queryable, Identifiable)]
pub struct Post {
    /// The post's numeric id
    pub id: i32,
    pub title: String,
    /// The post's body
    pub text: String,
    /// The time of publishing. May lie in the future for scheduled posts.
    pub pub_date: NaiveDateTime,
    /// Username of the post's author
    pub author: String,
    pub location: Option<i32>,
    pub category: Option<i32>,
    /// Path or url of an attached image; the files themselves live outside
    /// this application
    pub image: Option<String>,
    /// Whether the author has published the post
    pub is_published: bool,
    pub created_at: NaiveDateTime,
}

impl Post {
    /// Used when displaying a preview of the post's contents in a list of posts.
    pub fn preview(&self) -> &str {
        let len = self.text.len();
        let end = if len < PREVIEW_LEN {
            len
        } else {
            // Get the last whitespace character before PREVIEW_LEN.
            self.text
                .match_indices(char::is_whitespace)
                .map(|(i, _)| i)
                .take_while(|i| *i < PREVIEW_LEN)
                .last()
                .unwrap_or(len)
        };
        &self.text[..end]
    }
}

#[derive(Insertable)]
#[table_name = "posts"]
pub struct NewPost {
    pub title: String,
    pub text: String,
    pub pub_date: NaiveDateTime,
    pub author: String,
    pub location: Option<i32>,
    pub category: Option<i32>,
    pub image: Option<String>,
    pub is_published: bool,
}

/// An edit to an existing post. The author never changes.
#[derive(AsChangeset)]
#[table_name = "posts"]
#[changeset_options(treat_none_as_null = "true")]
pub struct PostChanges {
    pub title: String,
    pub text: String,
    pub pub_date: NaiveDateTime,
    pub location: Option<i32>,
    pub category: Option<i32>,
    pub image: Option<String>,
    pub is_published: bool,
}

/// A post row joined with its author, category, location and comment count.
#[derive(Clone, Debug)]
pub struct PostView {
    pub post: Post,
    pub author: User,
    pub category: Option<Category>,
    pub location: Option<Location>,
    pub comment_count: i64,
}

impl PostView {
    /// Whether the post is visible to the general public: published, not
    /// future-dated, and in a published category. A post without a category
    /// is never publicly listed.
    pub fn is_public(&self, now: NaiveDateTime) -> bool {
        self.post.is_published
            && self.post.pub_date <= now
            && self.category.as_ref().map_or(false, |c| c.is_published)
    }

    /// Whether the post may be shown to the requesting session. Authors see
    /// their own unpublished and future-dated posts.
    pub fn visible_to(&self, session: Option<&Session>, now: NaiveDateTime) -> bool {
        match session {
            Some(session) if session.user == self.post.author => true,
            _ => self.is_public(now),
        }
    }
}

/// Filter specification for the post queries. `all` and `published` are the
/// two canonical sets; both narrow further by author or category without
/// touching the store until evaluated.
#[derive(Clone, Debug, Default)]
pub struct PostFilter {
    pub published_only: bool,
    pub author: Option<String>,
    pub category: Option<i32>,
}

impl PostFilter {
    /// Every post, visibility unfiltered. For owners looking at their own
    /// content.
    pub fn all() -> Self {
        PostFilter::default()
    }

    /// The public feed: published, not future-dated, in a published category.
    pub fn published() -> Self {
        PostFilter {
            published_only: true,
            ..PostFilter::default()
        }
    }

    pub fn by_author(mut self, author: &str) -> Self {
        self.author = Some(author.to_owned());
        self
    }

    pub fn in_category(mut self, category: i32) -> Self {
        self.category = Some(category);
        self
    }
}

// Applies a PostFilter to a boxed post join. A macro because the row query
// and the count query box to different select clauses.
macro_rules! apply_filter {
    ($query:expr, $filter:expr, $now:expr) => {{
        let mut query = $query;
        if $filter.published_only {
            query = query
                .filter(posts::is_published.eq(true))
                .filter(posts::pub_date.le($now))
                // NULL categories fall out of the join here, so an
                // uncategorized post never makes the published set.
                .filter(categories::is_published.eq(true));
        }
        if let Some(ref author) = $filter.author {
            query = query.filter(posts::author.eq(author.clone()));
        }
        if let Some(category) = $filter.category {
            query = query.filter(posts::category.eq(category));
        }
        query
    }};
}

type PostRow = (Post, User, Option<Category>, Option<Location>);

/// One page of posts matching the filter, newest first.
pub fn page(connection: &Connection, filter: &PostFilter, page: i64) -> DieselResult<Vec<PostView>> {
    let now = Utc::now().naive_utc();
    let query = apply_filter!(
        posts::table
            .inner_join(users::table)
            .left_join(categories::table)
            .left_join(locations::table)
            .order(posts::pub_date.desc())
            .into_boxed::<Pg>(),
        filter,
        now
    );
    let rows: Vec<PostRow> = query
        .limit(PAGE_SIZE)
        .offset((page - 1) * PAGE_SIZE)
        .load(connection)?;
    with_comment_counts(connection, rows)
}

/// Number of posts matching the filter, for the pagination bar.
pub fn count(connection: &Connection, filter: &PostFilter) -> DieselResult<i64> {
    let now = Utc::now().naive_utc();
    let query = apply_filter!(
        posts::table
            .inner_join(users::table)
            .left_join(categories::table)
            .left_join(locations::table)
            .select(diesel::dsl::count_star())
            .into_boxed::<Pg>(),
        filter,
        now
    );
    query.first(connection)
}

/// Fetch a single post through the unfiltered join. Absent posts are a
/// [`Error::NotFound`]; whether the caller may see the post is its own
/// business ([`PostView::visible_to`]).
pub fn get(connection: &Connection, id: i32) -> Result<PostView, failure::Error> {
    let row: Option<PostRow> = posts::table
        .inner_join(users::table)
        .left_join(categories::table)
        .left_join(locations::table)
        .filter(posts::id.eq(id))
        .first(connection)
        .optional()?;
    match row {
        Some(row) => Ok(with_comment_counts(connection, vec![row])?.remove(0)),
        None => Err(Error::NotFound.into()),
    }
}

pub fn submit(connection: &Connection, post: &NewPost) -> DieselResult<usize> {
    diesel::insert_into(posts::table)
        .values(post)
        .execute(connection)
}

pub fn edit(connection: &Connection, id: i32, changes: &PostChanges) -> DieselResult<usize> {
    use crate::schema::posts::dsl;

    diesel::update(dsl::posts.find(id))
        .set(changes)
        .execute(connection)
}

/// Removes the post; its comments go with it, through the schema's cascade.
pub fn delete(connection: &Connection, id: i32) -> DieselResult<usize> {
    use crate::schema::posts::dsl;

    diesel::delete(dsl::posts.find(id)).execute(connection)
}

/// Attach comment counts to a batch of joined rows with a single query over
/// the batch's ids.
fn with_comment_counts(connection: &Connection, rows: Vec<PostRow>) -> DieselResult<Vec<PostView>> {
    let ids: Vec<i32> = rows.iter().map(|(post, ..)| post.id).collect();
    let counts: HashMap<i32, i64> = comment::count_by_post(connection, &ids)?;
    Ok(rows
        .into_iter()
        .map(|(post, author, category, location)| {
            let comment_count = counts.get(&post.id).copied().unwrap_or(0);
            PostView {
                post,
                author,
                category,
                location,
                comment_count,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::{Post, PostView};
    use crate::{category::Category, user, user::Session};

    fn post(author: &str) -> Post {
        let now = Utc::now().naive_utc();
        Post {
            id: 1,
            title: String::from("Test post"),
            text: String::from("A perfectly ordinary test post."),
            pub_date: now - Duration::hours(1),
            author: author.to_owned(),
            location: None,
            category: Some(1),
            image: None,
            is_published: true,
            created_at: now,
        }
    }

    fn category(is_published: bool) -> Category {
        Category {
            id: 1,
            title: String::from("General"),
            description: String::from("Everything else"),
            slug: String::from("general"),
            is_published,
            created_at: Utc::now().naive_utc(),
        }
    }

    fn view(author: &str) -> PostView {
        PostView {
            post: post(author),
            author: user::test_user(author),
            category: Some(category(true)),
            location: None,
            comment_count: 0,
        }
    }

    fn session(user: &str) -> Session {
        Session::new(user)
    }

    #[test]
    fn published_post_is_public() {
        let now = Utc::now().naive_utc();
        assert!(view("amanda").is_public(now));
    }

    #[test]
    fn unpublished_post_is_not_public() {
        let now = Utc::now().naive_utc();
        let mut view = view("amanda");
        view.post.is_published = false;
        assert!(!view.is_public(now));
        // ...but its author still sees it
        assert!(view.visible_to(Some(&session("amanda")), now));
        assert!(!view.visible_to(Some(&session("beatrice")), now));
        assert!(!view.visible_to(None, now));
    }

    #[test]
    fn future_post_is_not_public() {
        let now = Utc::now().naive_utc();
        let mut view = view("amanda");
        view.post.pub_date = now + Duration::days(1);
        assert!(!view.is_public(now));
        assert!(view.visible_to(Some(&session("amanda")), now));
    }

    #[test]
    fn unpublished_category_hides_post() {
        let now = Utc::now().naive_utc();
        let mut view = view("amanda");
        view.category = Some(category(false));
        assert!(!view.is_public(now));
    }

    #[test]
    fn uncategorized_post_is_never_public() {
        let now = Utc::now().naive_utc();
        let mut view = view("amanda");
        view.category = None;
        view.post.category = None;
        assert!(!view.is_public(now));
        assert!(view.visible_to(Some(&session("amanda")), now));
    }

    #[test]
    fn preview_cuts_at_whitespace() {
        let mut post = post("amanda");
        post.text = "word ".repeat(200);
        let preview = post.preview();
        assert!(preview.len() <= 500);
        assert!(preview.ends_with("word"));

        post.text = String::from("short text");
        assert_eq!(post.preview(), "short text");
    }
}
