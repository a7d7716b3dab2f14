//! Shared handler plumbing: request body collection and the central mapping
//! from handler results to responses.
use askama::Template;
use futures::{future, Future, Stream};
use gotham::{
    handler::{HandlerFuture, IntoHandlerError},
    helpers::http::response::create_temporary_redirect as temp_redirect,
    state::{FromState, State},
};
use http::{Response, StatusCode};
use hyper::Body;

use crate::{document::TemplateExt, error::Error, user::Session};

pub mod rss;

#[derive(Template)]
#[template(path = "error.html")]
struct ErrorTemplate<'a> {
    session: Option<&'a Session>,
    error: String,
}

#[derive(Template)]
#[template(path = "not_found.html")]
struct NotFoundTemplate<'a> {
    session: Option<&'a Session>,
}

/// Creates a `HandlerFuture` that collects the request body and runs the given function
pub fn body_handler<F>(mut state: State, op: F) -> Box<HandlerFuture>
where
    F: FnOnce(&State, Vec<u8>) -> Response<Body> + Send + 'static,
{
    let f = Body::take_from(&mut state)
        .concat2()
        .then(|result| match result {
            Ok(body) => {
                let response = op(&state, body.to_vec());
                future::ok((state, response))
            }
            Err(e) => future::err((state, e.into_handler_error())),
        });

    Box::new(f)
}

/// Turns a handler result into its response. The typed errors map to a 404
/// page, a login redirect or a soft redirect to the related post; anything
/// else lands on the error page.
pub fn response(state: &State, result: Result<Response<Body>, failure::Error>) -> Response<Body> {
    let error = match result {
        Ok(response) => return response,
        Err(error) => error,
    };
    match error.downcast_ref::<Error>() {
        Some(error) => match redirect_target(error) {
            Some(location) => see_other(state, location),
            None => not_found(state),
        },
        None => {
            let template = ErrorTemplate {
                session: Session::try_borrow_from(state),
                error: error.to_string(),
            };
            let mut response = template.to_response(state);
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            response
        }
    }
}

/// Where each typed error sends the client; `None` means the 404 page.
fn redirect_target(error: &Error) -> Option<String> {
    match error {
        Error::NotFound => None,
        Error::Unauthorized => Some(String::from("/login")),
        Error::NotOwner { post } => Some(format!("/posts/{}", post)),
    }
}

/// The 404 page used for missing posts, categories, comments and users.
pub fn not_found(state: &State) -> Response<Body> {
    let template = NotFoundTemplate {
        session: Session::try_borrow_from(state),
    };
    let mut response = template.to_response(state);
    *response.status_mut() = StatusCode::NOT_FOUND;
    response
}

/// A SEE OTHER redirect; forces the follow-up request to be a GET.
pub fn see_other<L: AsRef<str>>(state: &State, location: L) -> Response<Body> {
    let mut response = temp_redirect(state, location.as_ref().to_string());
    *response.status_mut() = StatusCode::SEE_OTHER;
    response
}

#[macro_export]
macro_rules! handler {
    ($handler_fn:path) => {
        |state| {
            let r = crate::handler::response(&state, $handler_fn(&state));
            (state, r)
        }
    };
}

#[macro_export]
macro_rules! body_handler {
    ($handler_fn:path) => {
        |state| {
            crate::handler::body_handler(state, |state, post| {
                crate::handler::response(&state, $handler_fn(state, post))
            })
        }
    };
}

#[cfg(test)]
mod tests {
    use super::redirect_target;
    use crate::error::Error;

    #[test]
    fn missing_resources_are_a_404() {
        assert_eq!(redirect_target(&Error::NotFound), None);
    }

    #[test]
    fn protected_actions_send_anonymous_users_to_login() {
        assert_eq!(
            redirect_target(&Error::Unauthorized).as_deref(),
            Some("/login")
        );
    }

    #[test]
    fn ownership_violations_bounce_to_the_post() {
        assert_eq!(
            redirect_target(&Error::NotOwner { post: 17 }).as_deref(),
            Some("/posts/17")
        );
    }
}
