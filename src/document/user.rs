//! Module for login, signup, profiles and account settings
use askama::Template;
use cookie::{Cookie, SameSite};
use gotham::state::{FromState, State};
use gotham_derive::{StateData, StaticResponseExtender};
use http::header;

use crate::{
    access::require_auth,
    config::Settings,
    db::DbConnection,
    document::{forms::ProfileForm, post::PageQuery, DocumentResult, TemplateExt},
    error::Error,
    handler::see_other,
    page::Page,
    post::{self, PostFilter, PostView},
    user::{self, Login, NewUser, Session, User},
};

#[derive(Deserialize, StateData, StaticResponseExtender)]
pub struct UserPath {
    pub username: String,
}

fn session_cookie<'a>(state: &State, id: &str) -> Cookie<'a> {
    let settings = Settings::borrow_from(state);
    let mut cookie = Cookie::build("session", id.to_owned())
        .same_site(SameSite::Strict)
        .http_only(true)
        .path("/")
        .finish();
    if settings.cookie.secure {
        cookie.set_secure(true);
    }
    if let Some(ref domain) = settings.cookie.domain {
        cookie.set_domain(domain.to_owned());
    }
    cookie
}

#[derive(Template)]
#[template(path = "login.html")]
struct LoginTemplate<'a> {
    error: Option<String>,
    session: Option<&'a Session>,
}

/// Login form
pub fn login(state: &State) -> DocumentResult {
    Ok(LoginTemplate {
        error: None,
        session: Session::try_borrow_from(state),
    }
    .to_response(state))
}

/// Login post. Sets the session cookie and goes to the user's profile when
/// the credentials check out; otherwise the form comes back with an error.
pub fn login_post(state: &State, body: Vec<u8>) -> DocumentResult {
    let connection = &DbConnection::from_state(state)?;
    let credentials: Login = serde_urlencoded::from_bytes(&body)?;

    match credentials.login(connection)? {
        Some(session) => {
            let mut response = see_other(state, format!("/profile/{}", session.user));
            let cookie = session_cookie(state, &session.id);
            response
                .headers_mut()
                .append(header::SET_COOKIE, cookie.to_string().parse()?);
            Ok(response)
        }
        None => Ok(LoginTemplate {
            error: Some(String::from("Wrong username or password")),
            session: Session::try_borrow_from(state),
        }
        .to_response(state)),
    }
}

#[derive(Template)]
#[template(path = "signup.html")]
struct SignupTemplate<'a> {
    errors: Vec<String>,
    id: String,
    name: String,
    email: String,
    session: Option<&'a Session>,
}

pub fn signup(state: &State) -> DocumentResult {
    Ok(SignupTemplate {
        errors: Vec::new(),
        id: String::new(),
        name: String::new(),
        email: String::new(),
        session: Session::try_borrow_from(state),
    }
    .to_response(state))
}

pub fn signup_post(state: &State, body: Vec<u8>) -> DocumentResult {
    let new_user: NewUser = serde_urlencoded::from_bytes(&body)?;

    // If the `phone` field is filled out we caught a spammer
    if !new_user.phone.is_empty() {
        tracing::info!(user = %new_user.id, "caught spam signup");
        return Err(failure::err_msg("You're not supposed to fill out this field"));
    }

    let connection = &DbConnection::from_state(state)?;

    let mut errors = new_user.validate();
    if errors.is_empty() && user::get(connection, &new_user.id)?.is_some() {
        errors.push(String::from("That username is taken"));
    }
    if !errors.is_empty() {
        return Ok(SignupTemplate {
            errors,
            id: new_user.id.clone(),
            name: new_user.name.clone(),
            email: new_user.email.clone(),
            session: Session::try_borrow_from(state),
        }
        .to_response(state));
    }

    user::create(connection, new_user.clone())?;
    let credentials: Login = new_user.into();
    let session = credentials
        .login(connection)?
        .ok_or_else(|| failure::err_msg("login after signup failed"))?;

    let mut response = see_other(state, format!("/profile/{}", session.user));
    let cookie = session_cookie(state, &session.id);
    response
        .headers_mut()
        .append(header::SET_COOKIE, cookie.to_string().parse()?);
    Ok(response)
}

pub fn logout(state: &State) -> DocumentResult {
    let connection = &DbConnection::from_state(state)?;

    if let Some(session) = Session::try_borrow_from(state) {
        user::logout(connection, &session.id)?;
    }

    let mut response = see_other(state, "/");
    // Delete session cookie with Max-Age=0
    let cookie = Cookie::build("session", "")
        .path("/")
        .max_age(time::Duration::zero())
        .finish();
    response
        .headers_mut()
        .append(header::SET_COOKIE, cookie.to_string().parse()?);

    Ok(response)
}

#[derive(Template)]
#[template(path = "profile.html")]
struct ProfileTemplate<'a> {
    profile: User,
    /// Whether the profile belongs to the requesting session
    own: bool,
    posts: Vec<PostView>,
    page: Page,
    session: Option<&'a Session>,
}

/// A user's profile with their posts. Visitors get the published subset,
/// the owner sees everything they wrote.
pub fn profile(state: &State) -> DocumentResult {
    let connection = &DbConnection::from_state(state)?;
    let session = Session::try_borrow_from(state);
    let username = &UserPath::borrow_from(state).username;

    let profile = user::get(connection, username)?.ok_or(Error::NotFound)?;
    let own = session.map_or(false, |session| session.user == profile.id);

    let filter = if own {
        PostFilter::all()
    } else {
        PostFilter::published()
    };
    let filter = filter.by_author(&profile.id);
    let page = Page::new(
        PageQuery::borrow_from(state).page,
        post::count(connection, &filter)?,
    );
    let posts = post::page(connection, &filter, page.number)?;

    Ok(ProfileTemplate {
        profile,
        own,
        posts,
        page,
        session,
    }
    .to_response(state))
}

#[derive(Template)]
#[template(path = "profile_form.html")]
struct ProfileFormTemplate<'a> {
    form: ProfileForm,
    errors: Vec<String>,
    session: Option<&'a Session>,
}

/// Form for editing your profile fields
pub fn edit_profile(state: &State) -> DocumentResult {
    let connection = &DbConnection::from_state(state)?;
    let session = require_auth(state)?;

    let user = user::get(connection, &session.user)?.ok_or(Error::NotFound)?;
    Ok(ProfileFormTemplate {
        form: ProfileForm {
            name: user.name,
            email: user.email,
        },
        errors: Vec::new(),
        session: Some(session),
    }
    .to_response(state))
}

pub fn edit_profile_post(state: &State, body: Vec<u8>) -> DocumentResult {
    let connection = &DbConnection::from_state(state)?;
    let session = require_auth(state)?;

    let form: ProfileForm = serde_urlencoded::from_bytes(&body)?;
    match form.validate() {
        Ok(profile) => {
            user::edit_profile(connection, &session.user, &profile)?;
            Ok(see_other(state, format!("/profile/{}", session.user)))
        }
        Err(errors) => Ok(ProfileFormTemplate {
            form,
            errors,
            session: Some(session),
        }
        .to_response(state)),
    }
}

#[derive(Deserialize)]
struct AccountDeletion {
    password: String,
}

#[derive(Template)]
#[template(path = "account_delete.html")]
struct AccountDeleteTemplate<'a> {
    error: Option<String>,
    session: Option<&'a Session>,
}

/// Confirmation page for deleting your account
pub fn delete_account(state: &State) -> DocumentResult {
    let session = require_auth(state)?;
    Ok(AccountDeleteTemplate {
        error: None,
        session: Some(session),
    }
    .to_response(state))
}

/// Deletes the account after a password check. Posts and comments disappear
/// with the user, through the schema's cascades.
pub fn delete_account_post(state: &State, body: Vec<u8>) -> DocumentResult {
    let connection = &DbConnection::from_state(state)?;
    let session = require_auth(state)?;

    let deletion: AccountDeletion = serde_urlencoded::from_bytes(&body)?;
    if !user::delete(connection, &session.user, &deletion.password)? {
        return Ok(AccountDeleteTemplate {
            error: Some(String::from("Wrong password")),
            session: Some(session),
        }
        .to_response(state));
    }

    let mut response = see_other(state, "/");
    let cookie = Cookie::build("session", "")
        .path("/")
        .max_age(time::Duration::zero())
        .finish();
    response
        .headers_mut()
        .append(header::SET_COOKIE, cookie.to_string().parse()?);
    Ok(response)
}
