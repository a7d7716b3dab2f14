//! Outbound mail. The one message this application sends is the new-comment
//! notification to a post's author, and it is fire-and-forget: delivery
//! problems are logged and must never fail the request that triggered them.
use lettre::{
    transport::smtp::authentication::Credentials, Message, SmtpTransport, Transport,
};

use crate::config::Settings;

const COMMENT_SUBJECT: &str = "New comment";

/// Notify a post's author that someone commented on their post. Callers are
/// expected to skip authors commenting under their own posts.
pub fn notify_comment(settings: &Settings, to: &str, commenter: &str, title: &str, post: i32) {
    if let Err(error) = send(settings, to, commenter, title, post) {
        tracing::warn!(%error, post, "comment notification failed");
    }
}

fn send(
    settings: &Settings,
    to: &str,
    commenter: &str,
    title: &str,
    post: i32,
) -> Result<(), failure::Error> {
    let email = Message::builder()
        .from(settings.mail.from.parse()?)
        .to(to.parse()?)
        .subject(COMMENT_SUBJECT)
        .body(comment_body(&settings.site.url, commenter, title, post))?;

    let mut builder =
        SmtpTransport::builder_dangerous(&settings.mail.smtp_host).port(settings.mail.smtp_port);
    if let (Some(username), Some(password)) =
        (&settings.mail.username, &settings.mail.password)
    {
        builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
    }
    builder.build().send(&email)?;
    Ok(())
}

fn comment_body(site_url: &str, commenter: &str, title: &str, post: i32) -> String {
    format!(
        "{} commented on your post \"{}\".\nRead the comment at {}/posts/{}",
        commenter,
        title,
        site_url.trim_end_matches('/'),
        post,
    )
}

#[cfg(test)]
mod tests {
    use super::{comment_body, notify_comment};
    use crate::config::{Cookie, Mail, Settings, Site};

    #[test]
    fn body_links_to_the_post() {
        let body = comment_body("https://blog.example.org/", "beatrice", "Hello", 42);
        assert!(body.starts_with("beatrice commented"));
        assert!(body.contains("\"Hello\""));
        assert!(body.ends_with("https://blog.example.org/posts/42"));
    }

    #[test]
    fn delivery_failure_is_swallowed() {
        // Port 1 refuses the connection; the notification must not care.
        let settings = Settings {
            database_url: String::new(),
            host_address: String::new(),
            cookie: Cookie {
                secure: false,
                domain: None,
            },
            site: Site {
                title: String::from("blogicum"),
                url: String::from("http://localhost"),
            },
            mail: Mail {
                smtp_host: String::from("127.0.0.1"),
                smtp_port: 1,
                username: None,
                password: None,
                from: String::from("blogicum <noreply@localhost>"),
            },
        };
        notify_comment(&settings, "amanda@example.org", "beatrice", "Hello", 1);
    }
}
