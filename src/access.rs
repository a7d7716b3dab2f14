//! Guards composed by the request handlers.
//!
//! Each guard returns a plain `Result` the handler chains with `?`; the
//! error side is one of the taxonomy variants in [`crate::error::Error`],
//! which the central response mapping turns into a login redirect or a soft
//! redirect back to the post.
use gotham::state::{FromState, State};

use crate::{error::Error, user::Session};

/// The requesting identity, or the error that sends the client to the login
/// page.
pub fn require_auth(state: &State) -> Result<&Session, failure::Error> {
    Session::try_borrow_from(state).ok_or_else(|| Error::Unauthorized.into())
}

/// Passes when the session owns the resource. Anything else bounces back to
/// the post's detail page rather than an error page.
pub fn require_owner(session: &Session, author: &str, post: i32) -> Result<(), failure::Error> {
    if session.user == author {
        Ok(())
    } else {
        Err(Error::NotOwner { post }.into())
    }
}

#[cfg(test)]
mod tests {
    use super::require_owner;
    use crate::{error::Error, user::Session};

    #[test]
    fn owner_passes() {
        let session = Session::new("amanda");
        assert!(require_owner(&session, "amanda", 7).is_ok());
    }

    #[test]
    fn non_owner_is_bounced_to_the_post() {
        let session = Session::new("beatrice");
        let error = require_owner(&session, "amanda", 7).unwrap_err();
        assert_eq!(
            error.downcast_ref::<Error>(),
            Some(&Error::NotOwner { post: 7 })
        );
    }
}
