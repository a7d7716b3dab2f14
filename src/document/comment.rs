//! Request handlers for adding, editing and deleting comments.
use askama::Template;
use gotham::state::{FromState, State};
use gotham_derive::{StateData, StaticResponseExtender};

use crate::{
    access::{require_auth, require_owner},
    comment::{self, Comment, NewComment},
    config::Settings,
    db::{Connection, DbConnection},
    document::{
        forms::CommentForm,
        post::{render_detail, PostPath},
        DocumentResult, TemplateExt,
    },
    error::Error,
    handler::see_other,
    mail,
    post,
    user::Session,
};

#[derive(Deserialize, StateData, StaticResponseExtender)]
pub struct CommentPath {
    /// The post the comment belongs to, according to the url
    pub id: i32,
    pub comment_id: i32,
}

#[derive(Template)]
#[template(path = "comment_form.html")]
struct CommentFormTemplate<'a> {
    post: i32,
    comment: Comment,
    form: CommentForm,
    errors: Vec<String>,
    session: Option<&'a Session>,
}

#[derive(Template)]
#[template(path = "comment_delete.html")]
struct CommentDeleteTemplate<'a> {
    post: i32,
    comment: Comment,
    session: Option<&'a Session>,
}

/// Add a comment to a post. When someone comments under another user's post
/// the author gets a best-effort email about it.
pub fn add(state: &State, body: Vec<u8>) -> DocumentResult {
    let connection = &DbConnection::from_state(state)?;
    let session = require_auth(state)?;
    let id = PostPath::borrow_from(state).id;

    let view = post::get(connection, id)?;
    let form: CommentForm = serde_urlencoded::from_bytes(&body)?;
    match form.validate() {
        Ok(text) => {
            comment::submit(
                connection,
                &NewComment {
                    text,
                    post: id,
                    author: session.user.clone(),
                },
            )?;
            if view.post.author != session.user {
                let settings = Settings::borrow_from(state);
                mail::notify_comment(
                    settings,
                    &view.author.email,
                    &session.user,
                    &view.post.title,
                    id,
                );
            }
            Ok(see_other(state, format!("/posts/{}", id)))
        }
        Err(errors) => render_detail(state, connection, Some(session), view, form, errors),
    }
}

/// Loads the comment named by the path. A missing post or comment is a 404;
/// the post id is otherwise only used for the redirect target.
fn lookup(state: &State, connection: &Connection) -> Result<Comment, failure::Error> {
    let path = CommentPath::borrow_from(state);
    post::get(connection, path.id)?;
    comment::get(connection, path.comment_id)?.ok_or_else(|| Error::NotFound.into())
}

/// Form for editing a comment, owner only
pub fn edit(state: &State) -> DocumentResult {
    let connection = &DbConnection::from_state(state)?;
    let session = require_auth(state)?;
    let post = CommentPath::borrow_from(state).id;

    let comment = lookup(state, connection)?;
    require_owner(session, &comment.author, post)?;

    let form = CommentForm {
        text: comment.text.clone(),
    };
    Ok(CommentFormTemplate {
        post,
        comment,
        form,
        errors: Vec::new(),
        session: Some(session),
    }
    .to_response(state))
}

pub fn edit_post(state: &State, body: Vec<u8>) -> DocumentResult {
    let connection = &DbConnection::from_state(state)?;
    let session = require_auth(state)?;
    let post = CommentPath::borrow_from(state).id;

    let comment = lookup(state, connection)?;
    require_owner(session, &comment.author, post)?;

    let form: CommentForm = serde_urlencoded::from_bytes(&body)?;
    match form.validate() {
        Ok(text) => {
            comment::edit(connection, comment.id, &text)?;
            Ok(see_other(state, format!("/posts/{}", post)))
        }
        Err(errors) => Ok(CommentFormTemplate {
            post,
            comment,
            form,
            errors,
            session: Some(session),
        }
        .to_response(state)),
    }
}

/// Deletion confirmation page, owner only
pub fn delete(state: &State) -> DocumentResult {
    let connection = &DbConnection::from_state(state)?;
    let session = require_auth(state)?;
    let post = CommentPath::borrow_from(state).id;

    let comment = lookup(state, connection)?;
    require_owner(session, &comment.author, post)?;

    Ok(CommentDeleteTemplate {
        post,
        comment,
        session: Some(session),
    }
    .to_response(state))
}

pub fn delete_post(state: &State, _body: Vec<u8>) -> DocumentResult {
    let connection = &DbConnection::from_state(state)?;
    let session = require_auth(state)?;
    let post = CommentPath::borrow_from(state).id;

    let comment = lookup(state, connection)?;
    require_owner(session, &comment.author, post)?;

    comment::delete(connection, comment.id)?;
    Ok(see_other(state, format!("/posts/{}", post)))
}
