//! Handler for serving an rss feed of the published posts
use chrono::{DateTime, NaiveDateTime, Utc};
use gotham::{
    helpers::http::response::create_response,
    state::{FromState, State},
};
use http::StatusCode;
use hyper::{Body, Response};
use rss::{ChannelBuilder, Item, ItemBuilder};

use crate::{
    config::Settings,
    db::DbConnection,
    post::{self, PostFilter, PostView},
};

fn item(site_url: &str, view: &PostView) -> Item {
    let link = format!("{}/posts/{}", site_url.trim_end_matches('/'), view.post.id);
    let guid = rss::GuidBuilder::default()
        .value(link.clone())
        .permalink(true)
        .build()
        .unwrap();

    ItemBuilder::default()
        .title(view.post.title.clone())
        .link(link)
        .guid(guid)
        .pub_date(date_format(view.post.pub_date))
        .description(view.post.text.clone())
        .build()
        .unwrap()
}

/// Encodes a date in [RFC822](https://www.w3.org/Protocols/rfc822/#z28) format.
fn date_format(date: NaiveDateTime) -> String {
    DateTime::<Utc>::from_utc(date, Utc)
        .format("%a, %d %b %Y %H:%M:%S %z")
        .to_string()
}

/// Serves an RSS encoded feed of the latest published posts
pub fn rss(state: &State) -> Result<Response<Body>, failure::Error> {
    let connection = &DbConnection::from_state(state)?;
    let settings = Settings::borrow_from(state);

    let posts = post::page(connection, &PostFilter::published(), 1)?;
    let last_change = posts.get(0).map(|view| date_format(view.post.pub_date));
    let items: Vec<Item> = posts
        .iter()
        .map(|view| item(&settings.site.url, view))
        .collect();

    let mut buf = Vec::new();
    let channel = ChannelBuilder::default()
        .title(settings.site.title.clone())
        .link(settings.site.url.clone())
        .description(env!("CARGO_PKG_DESCRIPTION"))
        .last_build_date(last_change.clone())
        .pub_date(last_change)
        .items(items)
        .build()
        .unwrap();
    channel.pretty_write_to(&mut buf, b' ', 4)?;

    let media_type: mime::Mime = "application/rss+xml".parse().unwrap();
    Ok(create_response(state, StatusCode::OK, media_type, buf))
}
