//! Templates and request handlers for the post pages: listings, detail and
//! the author-only create/edit/delete flows.
use askama::Template;
use chrono::Utc;
use gotham::state::{FromState, State};
use gotham_derive::{StateData, StaticResponseExtender};

use crate::{
    access::{require_auth, require_owner},
    category::{self, Category},
    comment::{self, Comment},
    db::{Connection, DbConnection},
    document::{
        forms::{CommentForm, PostForm},
        DocumentResult, TemplateExt,
    },
    error::Error,
    handler::see_other,
    location::{self, Location},
    page::Page,
    post::{self, PostFilter, PostView},
    user::Session,
};

#[derive(Deserialize, StateData, StaticResponseExtender)]
pub struct PostPath {
    pub id: i32,
}

#[derive(Deserialize, StateData, StaticResponseExtender)]
pub struct CategoryPath {
    pub slug: String,
}

#[derive(Deserialize, StateData, StaticResponseExtender)]
pub struct PageQuery {
    pub page: Option<i64>,
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate<'a> {
    posts: Vec<PostView>,
    page: Page,
    session: Option<&'a Session>,
}

#[derive(Template)]
#[template(path = "category.html")]
struct CategoryTemplate<'a> {
    category: Category,
    posts: Vec<PostView>,
    page: Page,
    session: Option<&'a Session>,
}

#[derive(Template)]
#[template(path = "detail.html")]
struct DetailTemplate<'a> {
    view: PostView,
    comments: Vec<Comment>,
    form: CommentForm,
    errors: Vec<String>,
    session: Option<&'a Session>,
}

#[derive(Template)]
#[template(path = "post_form.html")]
struct PostFormTemplate<'a> {
    /// Id of the post being edited; `None` when creating
    editing: Option<i32>,
    form: PostForm,
    errors: Vec<String>,
    categories: Vec<Category>,
    locations: Vec<Location>,
    session: Option<&'a Session>,
}

#[derive(Template)]
#[template(path = "post_delete.html")]
struct PostDeleteTemplate<'a> {
    view: PostView,
    session: Option<&'a Session>,
}

/// The front page: published posts, newest first.
pub fn index(state: &State) -> DocumentResult {
    let connection = &DbConnection::from_state(state)?;
    let session = Session::try_borrow_from(state);

    let filter = PostFilter::published();
    let page = Page::new(
        PageQuery::borrow_from(state).page,
        post::count(connection, &filter)?,
    );
    let posts = post::page(connection, &filter, page.number)?;

    Ok(IndexTemplate {
        posts,
        page,
        session,
    }
    .to_response(state))
}

/// Published posts within a published category.
pub fn category(state: &State) -> DocumentResult {
    let connection = &DbConnection::from_state(state)?;
    let session = Session::try_borrow_from(state);
    let slug = &CategoryPath::borrow_from(state).slug;

    let category = category::published_by_slug(connection, slug)?.ok_or(Error::NotFound)?;
    let filter = PostFilter::published().in_category(category.id);
    let page = Page::new(
        PageQuery::borrow_from(state).page,
        post::count(connection, &filter)?,
    );
    let posts = post::page(connection, &filter, page.number)?;

    Ok(CategoryTemplate {
        category,
        posts,
        page,
        session,
    }
    .to_response(state))
}

/// A single post with its comments and the comment form. Authors see their
/// own unpublished and future-dated posts; everyone else gets a 404.
pub fn detail(state: &State) -> DocumentResult {
    let connection = &DbConnection::from_state(state)?;
    let session = Session::try_borrow_from(state);
    let id = PostPath::borrow_from(state).id;

    let view = post::get(connection, id)?;
    if !view.visible_to(session, Utc::now().naive_utc()) {
        return Err(Error::NotFound.into());
    }

    render_detail(
        state,
        connection,
        session,
        view,
        CommentForm::default(),
        Vec::new(),
    )
}

/// Renders the detail page. Split out so the comment handlers can redraw it
/// with form errors.
pub(crate) fn render_detail(
    state: &State,
    connection: &Connection,
    session: Option<&Session>,
    view: PostView,
    form: CommentForm,
    errors: Vec<String>,
) -> DocumentResult {
    let comments = comment::for_post(connection, view.post.id)?;
    Ok(DetailTemplate {
        view,
        comments,
        form,
        errors,
        session,
    }
    .to_response(state))
}

fn render_form(
    state: &State,
    connection: &Connection,
    session: &Session,
    editing: Option<i32>,
    form: PostForm,
    errors: Vec<String>,
) -> DocumentResult {
    Ok(PostFormTemplate {
        editing,
        form,
        errors,
        categories: category::published(connection)?,
        locations: location::published(connection)?,
        session: Some(session),
    }
    .to_response(state))
}

/// Form for writing a new post
pub fn create(state: &State) -> DocumentResult {
    let connection = &DbConnection::from_state(state)?;
    let session = require_auth(state)?;

    let form = PostForm::prefilled(Utc::now().naive_utc());
    render_form(state, connection, session, None, form, Vec::new())
}

pub fn create_post(state: &State, body: Vec<u8>) -> DocumentResult {
    let connection = &DbConnection::from_state(state)?;
    let session = require_auth(state)?;

    let form: PostForm = serde_urlencoded::from_bytes(&body)?;
    match form.validate() {
        Ok(valid) => {
            post::submit(connection, &valid.into_new(&session.user))?;
            Ok(see_other(state, format!("/profile/{}", session.user)))
        }
        Err(errors) => render_form(state, connection, session, None, form, errors),
    }
}

/// Form for editing an existing post, owner only
pub fn edit(state: &State) -> DocumentResult {
    let connection = &DbConnection::from_state(state)?;
    let session = require_auth(state)?;
    let id = PostPath::borrow_from(state).id;

    let view = post::get(connection, id)?;
    require_owner(session, &view.post.author, id)?;

    let form = PostForm::from_view(&view);
    render_form(state, connection, session, Some(id), form, Vec::new())
}

pub fn edit_post(state: &State, body: Vec<u8>) -> DocumentResult {
    let connection = &DbConnection::from_state(state)?;
    let session = require_auth(state)?;
    let id = PostPath::borrow_from(state).id;

    let view = post::get(connection, id)?;
    require_owner(session, &view.post.author, id)?;

    let form: PostForm = serde_urlencoded::from_bytes(&body)?;
    match form.validate() {
        Ok(valid) => {
            post::edit(connection, id, &valid.into_changes())?;
            Ok(see_other(state, format!("/posts/{}", id)))
        }
        Err(errors) => render_form(state, connection, session, Some(id), form, errors),
    }
}

/// Deletion confirmation page, owner only
pub fn delete(state: &State) -> DocumentResult {
    let connection = &DbConnection::from_state(state)?;
    let session = require_auth(state)?;
    let id = PostPath::borrow_from(state).id;

    let view = post::get(connection, id)?;
    require_owner(session, &view.post.author, id)?;

    Ok(PostDeleteTemplate {
        view,
        session: Some(session),
    }
    .to_response(state))
}

pub fn delete_post(state: &State, _body: Vec<u8>) -> DocumentResult {
    let connection = &DbConnection::from_state(state)?;
    let session = require_auth(state)?;
    let id = PostPath::borrow_from(state).id;

    let view = post::get(connection, id)?;
    require_owner(session, &view.post.author, id)?;

    post::delete(connection, id)?;
    Ok(see_other(state, format!("/profile/{}", session.user)))
}
