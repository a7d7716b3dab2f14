//! A server-rendered blogging application.
//!
//! It has the following address scheme:
//! * `/` - Published posts, paginated
//! * `/category/:slug` - Published posts in a published category
//! * `/profile/:username` - A user's posts; everything when it's your own
//! * `/profile/edit` - Edit your profile fields
//! * `/profile/delete` - Delete your account
//! * `/posts/:id` - Post detail with comments and a comment form
//! * `/posts/create` - Write a post
//! * `/posts/:id/edit`, `/posts/:id/delete` - Author-only post management
//! * `/posts/:id/comment` - Add a comment
//! * `/posts/:id/edit_comment/:comment_id`, `/posts/:id/delete_comment/:comment_id`
//! * `/login`, `/signup`, `/logout` - Sessions
//! * `/feed.rss` - RSS feed of the published posts

#[macro_use]
extern crate diesel;
#[macro_use]
extern crate diesel_migrations;
#[macro_use]
extern crate serde;

pub mod access;
pub mod category;
pub mod comment;
pub mod config;
pub mod db;
pub mod document;
pub mod error;
pub mod handler;
pub mod location;
pub mod mail;
pub mod page;
pub mod post;
pub mod schema;
pub mod user;

use gotham::{
    middleware::cookie::CookieParser,
    middleware::state::StateMiddleware,
    pipeline::new_pipeline,
    pipeline::single::single_pipeline,
    router::builder::{build_router, DefineSingleRoute, DrawRoutes},
    router::response::extender::ResponseExtender,
    router::Router,
    state::State,
};
use http::status::StatusCode;
use hyper::{Body, Response};

use std::path::Path;

use crate::{config::Settings, db::DbConnection, user::SessionMiddleware};

/// Response extender for 404 errors on unmatched routes
pub struct NotFound;

impl ResponseExtender<Body> for NotFound {
    fn extend(&self, _state: &mut State, res: &mut Response<Body>) {
        let body = res.body_mut();
        *body = "404 Not found".into();
    }
}

/// Builds the request router
fn router(settings: Settings) -> Router {
    // Set up shared state
    let connection = DbConnection::from_url(&settings.database_url);
    let connection_mw = StateMiddleware::new(connection);
    let settings_mw = StateMiddleware::new(settings);
    // Build pipeline
    let (chain, pipelines) = single_pipeline(
        new_pipeline()
            .add(connection_mw)
            .add(settings_mw)
            .add(CookieParser)
            .add(SessionMiddleware)
            .build(),
    );

    build_router(chain, pipelines, |route| {
        use crate::document::comment::CommentPath;
        use crate::document::post::{CategoryPath, PageQuery, PostPath};
        use crate::document::user::UserPath;
        use crate::document::{comment, post, user};

        route
            .get("/")
            .with_query_string_extractor::<PageQuery>()
            .to(handler!(post::index));

        route
            .get("/category/:slug")
            .with_path_extractor::<CategoryPath>()
            .with_query_string_extractor::<PageQuery>()
            .to(handler!(post::category));

        route.get("/profile/edit").to(handler!(user::edit_profile));
        route
            .post("/profile/edit")
            .to(body_handler!(user::edit_profile_post));

        route
            .get("/profile/delete")
            .to(handler!(user::delete_account));
        route
            .post("/profile/delete")
            .to(body_handler!(user::delete_account_post));

        route
            .get("/profile/:username")
            .with_path_extractor::<UserPath>()
            .with_query_string_extractor::<PageQuery>()
            .to(handler!(user::profile));

        route.get("/posts/create").to(handler!(post::create));
        route
            .post("/posts/create")
            .to(body_handler!(post::create_post));

        route
            .get("/posts/:id")
            .with_path_extractor::<PostPath>()
            .to(handler!(post::detail));

        route
            .get("/posts/:id/edit")
            .with_path_extractor::<PostPath>()
            .to(handler!(post::edit));
        route
            .post("/posts/:id/edit")
            .with_path_extractor::<PostPath>()
            .to(body_handler!(post::edit_post));

        route
            .get("/posts/:id/delete")
            .with_path_extractor::<PostPath>()
            .to(handler!(post::delete));
        route
            .post("/posts/:id/delete")
            .with_path_extractor::<PostPath>()
            .to(body_handler!(post::delete_post));

        route
            .post("/posts/:id/comment")
            .with_path_extractor::<PostPath>()
            .to(body_handler!(comment::add));

        route
            .get("/posts/:id/edit_comment/:comment_id")
            .with_path_extractor::<CommentPath>()
            .to(handler!(comment::edit));
        route
            .post("/posts/:id/edit_comment/:comment_id")
            .with_path_extractor::<CommentPath>()
            .to(body_handler!(comment::edit_post));

        route
            .get("/posts/:id/delete_comment/:comment_id")
            .with_path_extractor::<CommentPath>()
            .to(handler!(comment::delete));
        route
            .post("/posts/:id/delete_comment/:comment_id")
            .with_path_extractor::<CommentPath>()
            .to(body_handler!(comment::delete_post));

        route.get("/login").to(handler!(user::login));
        route.post("/login").to(body_handler!(user::login_post));

        route.get("/signup").to(handler!(user::signup));
        route.post("/signup").to(body_handler!(user::signup_post));

        route.get("/logout").to(handler!(user::logout));

        route.get("/feed.rss").to(handler!(handler::rss::rss));

        // Error responders
        route.add_response_extender(StatusCode::NOT_FOUND, NotFound);
    })
}

fn main() -> Result<(), failure::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Read settings
    let path = if Path::new("/etc/blogicum/blogicum.toml").is_file() {
        Path::new("/etc/blogicum/blogicum.toml")
    } else {
        Path::new("blogicum.toml")
    };
    let data = std::fs::read(path)?;
    let settings = Settings::from_slice(&data)?;
    let address = settings.host_address.clone();

    tracing::info!(%address, "starting blogicum");
    gotham::start(address, router(settings));
    Ok(())
}
