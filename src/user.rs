//! Users, sessions and the session middleware.
use bcrypt::BcryptError;
use chrono::{Duration, NaiveDateTime, Utc};
use cookie::CookieJar;
use diesel::prelude::*;
use futures::future;
use gotham::{
    handler::HandlerFuture,
    helpers::http::response::create_response,
    middleware::Middleware,
    state::{FromState, State},
};
use gotham_derive::{NewMiddleware, StateData};
use rand::prelude::*;
use sha2::{Digest, Sha256};

use crate::{
    db::{Connection, DbConnection, DieselResult},
    schema::{sessions, users},
};

const SALT_LEN: usize = 16;
const SESSION_LEN: usize = 24;
/// How long a session stays valid after login.
const SESSION_DAYS: i64 = 30;

#[derive(Clone, Debug, Queryable, Identifiable, Insertable)]
pub struct User {
    /// The unique username/login
    pub id: String,
    /// The hashed password
    hash: String,
    /// The salt for the password
    salt: Vec<u8>,
    /// The user's display name
    pub name: String,
    /// The user's email address
    pub email: String,
    pub created_at: NaiveDateTime,
}

impl User {
    /// Verify the supplied password matches the user's
    pub fn verify(&self, password: &str) -> Result<bool, BcryptError> {
        verify(password, &self.salt, &self.hash)
    }
}

/// A to be created user.
///
/// NOTE: This structure contains the user's unencrypted password, handle it with great care!
#[derive(Clone, Deserialize)]
pub struct NewUser {
    /// The username
    pub id: String,
    /// The user's raw password
    password: String,
    /// The user's display name
    pub name: String,
    /// The user's email address
    pub email: String,
    /// Venus fly trap for spam bots
    #[serde(default)]
    pub phone: String,
}

impl NewUser {
    /// Field errors keeping a registration from going through.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.id.is_empty()
            || !self
                .id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            errors.push(String::from(
                "Username must consist of letters, digits, dashes and underscores",
            ));
        }
        if self.password.len() < 8 {
            errors.push(String::from("Password must be at least 8 characters"));
        }
        if self.name.trim().is_empty() {
            errors.push(String::from("Display name must not be empty"));
        }
        if !self.email.contains('@') {
            errors.push(String::from("Email address does not look valid"));
        }
        errors
    }

    /// Converts the structure into a proper user, generating a salt and hashing the password.
    fn into_user(self) -> Result<User, BcryptError> {
        let salt: Box<[u8]> = Box::new(generate_salt());
        Ok(User {
            id: self.id,
            hash: hash(&self.password, &salt)?,
            salt: salt.into_vec(),
            name: self.name,
            email: self.email,
            created_at: Utc::now().naive_utc(),
        })
    }
}

/// The editable profile fields. Identity itself is immutable.
#[derive(AsChangeset)]
#[table_name = "users"]
pub struct UserProfile {
    pub name: String,
    pub email: String,
}

/// Login credentials
#[derive(Deserialize)]
pub struct Login {
    pub user: String,
    password: String,
}

impl Login {
    /// Create a session if username and password is valid
    pub fn login(&self, connection: &Connection) -> Result<Option<Session>, failure::Error> {
        let user: Option<User> = users::dsl::users
            .find(&self.user)
            .first(connection)
            .optional()?;
        match user {
            Some(ref user) if user.verify(&self.password)? => {
                let session = Session::new(&self.user);
                diesel::insert_into(sessions::table)
                    .values(&session)
                    .execute(connection)?;
                Ok(Some(session))
            }
            _ => Ok(None),
        }
    }
}

impl From<NewUser> for Login {
    fn from(u: NewUser) -> Self {
        Self {
            user: u.id,
            password: u.password,
        }
    }
}

#[derive(Clone, Queryable, Insertable, StateData)]
pub struct Session {
    pub id: String,
    pub user: String,
    pub expires: NaiveDateTime,
}

impl Session {
    /// Generates a new session.
    ///
    /// NB: Must be inserted into the database for the session to be valid.
    pub fn new(user: &str) -> Session {
        // Fill array with random data
        let mut id = [0u8; SESSION_LEN];
        StdRng::from_entropy().fill(&mut id[..]);
        Session {
            id: base64::encode(&id),
            user: user.to_owned(),
            expires: Utc::now().naive_utc() + Duration::days(SESSION_DAYS),
        }
    }

    /// Get the session with the specified id, ignoring expired ones.
    pub fn from_id(id: &str, connection: &Connection) -> DieselResult<Option<Session>> {
        let session: Option<Session> = sessions::dsl::sessions
            .find(id)
            .first(connection)
            .optional()?;
        Ok(session.filter(|session| session.is_valid(Utc::now().naive_utc())))
    }

    pub fn is_valid(&self, now: NaiveDateTime) -> bool {
        self.expires > now
    }
}

/// Resolves the `session` cookie to a [`Session`] in state data, when one
/// exists and has not expired.
#[derive(Clone, NewMiddleware)]
pub struct SessionMiddleware;

impl Middleware for SessionMiddleware {
    fn call<C>(self, mut state: State, chain: C) -> Box<HandlerFuture>
    where
        C: FnOnce(State) -> Box<HandlerFuture>,
    {
        let put_session = |state: &mut State| -> Result<(), failure::Error> {
            let connection = DbConnection::borrow_from(state).lock()?;
            let cookie = CookieJar::borrow_from(state)
                .get("session")
                .map(|cookie| cookie.value());
            if let Some(id) = cookie {
                if let Some(session) = Session::from_id(id, &connection)? {
                    std::mem::drop(connection);
                    state.put(session);
                }
            }
            Ok(())
        };
        match put_session(&mut state) {
            Ok(()) => Box::new(chain(state)),
            Err(e) => {
                let response = create_response(
                    &state,
                    http::StatusCode::INTERNAL_SERVER_ERROR,
                    mime::TEXT_PLAIN,
                    e.to_string(),
                );
                Box::new(future::ok((state, response)))
            }
        }
    }
}

/// Password hashing function. Inspired by [Dropbox's password storage policy][1].
///
/// First the password and salt are combined, then hashed with SHA256 to prevent DoS attacks. The
/// password is then hashed with bcrypt.
///
/// [1]: https://blogs.dropbox.com/tech/2016/09/how-dropbox-securely-stores-your-passwords/
fn hash(key: &str, salt: &[u8]) -> Result<String, BcryptError> {
    // digest the password and salt
    let digest = Sha256::new().chain(key).chain(salt).finalize();
    // Hash the password with bcrypt (base64 encode to avoid zero-bytes).
    let hash = bcrypt::hash(base64::encode(&digest), bcrypt::DEFAULT_COST)?;
    Ok(hash)
}

fn verify(key: &str, salt: &[u8], hash: &str) -> Result<bool, BcryptError> {
    let digest = Sha256::new().chain(key).chain(salt).finalize();
    let matches = bcrypt::verify(&base64::encode(&digest), hash)?;
    Ok(matches)
}

/// Generates a new salt of length `SALT_LEN`
fn generate_salt() -> [u8; SALT_LEN] {
    let mut bytes = [0u8; SALT_LEN];

    StdRng::from_entropy().fill(&mut bytes[..]);

    bytes
}

/// Creates a user
pub fn create(connection: &Connection, user: NewUser) -> Result<usize, failure::Error> {
    let rows = diesel::insert_into(users::table)
        .values(&user.into_user()?)
        .execute(connection)?;
    Ok(rows)
}

pub fn get(connection: &Connection, id: &str) -> DieselResult<Option<User>> {
    use crate::schema::users::dsl;

    dsl::users.find(id).first(connection).optional()
}

pub fn logout(connection: &Connection, session: &str) -> DieselResult<usize> {
    use crate::schema::sessions::dsl;

    diesel::delete(dsl::sessions.find(session)).execute(connection)
}

pub fn edit_profile(
    connection: &Connection,
    id: &str,
    profile: &UserProfile,
) -> DieselResult<usize> {
    use crate::schema::users::dsl;

    diesel::update(dsl::users.find(id))
        .set(profile)
        .execute(connection)
}

/// Deletes the user's account after checking their password. The user's
/// sessions, posts and comments go with it, through the schema's cascades.
/// Returns false when the password doesn't match.
pub fn delete(connection: &Connection, id: &str, password: &str) -> Result<bool, failure::Error> {
    use crate::schema::users::dsl;

    let user: User = dsl::users.find(id).first(connection)?;
    if !user.verify(password)? {
        return Ok(false);
    }

    diesel::delete(dsl::users.find(id)).execute(connection)?;
    Ok(true)
}

#[cfg(test)]
pub(crate) fn test_user(id: &str) -> User {
    User {
        id: id.to_owned(),
        hash: String::new(),
        salt: Vec::new(),
        name: id.to_owned(),
        email: format!("{}@example.org", id),
        created_at: Utc::now().naive_utc(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::{generate_salt, hash, verify, NewUser, Session};

    fn signup(id: &str, password: &str, name: &str, email: &str) -> NewUser {
        NewUser {
            id: id.to_owned(),
            password: password.to_owned(),
            name: name.to_owned(),
            email: email.to_owned(),
            phone: String::new(),
        }
    }

    #[test]
    fn password_roundtrip() {
        let salt = generate_salt();
        let hashed = hash("hunter2hunter2", &salt).unwrap();
        assert!(verify("hunter2hunter2", &salt, &hashed).unwrap());
        assert!(!verify("*******", &salt, &hashed).unwrap());
    }

    #[test]
    fn session_expiry() {
        let now = Utc::now().naive_utc();
        let session = Session::new("amanda");
        assert!(session.is_valid(now));
        assert!(!session.is_valid(now + Duration::days(31)));
    }

    #[test]
    fn signup_validation() {
        assert!(signup("amanda", "correct horse", "Amanda", "a@example.org")
            .validate()
            .is_empty());
        // Spaces in usernames would break profile urls
        assert!(!signup("am anda", "correct horse", "Amanda", "a@example.org")
            .validate()
            .is_empty());
        assert!(!signup("amanda", "short", "Amanda", "a@example.org")
            .validate()
            .is_empty());
        assert!(!signup("amanda", "correct horse", "", "a@example.org")
            .validate()
            .is_empty());
        assert!(!signup("amanda", "correct horse", "Amanda", "example.org")
            .validate()
            .is_empty());
    }
}
