use gotham_derive::StateData;

/// Number of posts on a listing page.
pub const PAGE_SIZE: i64 = 10;

/// Application wide settings defined in configuration file.
#[derive(Deserialize, StateData, Clone)]
pub struct Settings {
    /// Postgres database url
    pub database_url: String,
    /// IP address to bind to
    pub host_address: String,
    /// Cookie settings
    pub cookie: Cookie,
    /// Site metadata, used for absolute links in mail and the feed
    pub site: Site,
    /// Outbound mail settings
    pub mail: Mail,
}

impl Settings {
    pub fn from_slice(data: &[u8]) -> Result<Self, toml::de::Error> {
        toml::from_slice(data)
    }
}

/// Cookie related settings
#[derive(Deserialize, Clone)]
pub struct Cookie {
    /// Require HTTPS for cookies
    pub secure: bool,
    /// Restrict cookies to given domain if set
    pub domain: Option<String>,
}

/// Where the site lives, as the outside world sees it.
#[derive(Deserialize, Clone)]
pub struct Site {
    pub title: String,
    /// Base url without a trailing slash, e.g. `https://blog.example.org`
    pub url: String,
}

/// SMTP settings for comment notifications.
#[derive(Deserialize, Clone)]
pub struct Mail {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Sender address
    pub from: String,
}
