//! The request error taxonomy. Every variant corresponds to one response
//! shape, mapped centrally in [`crate::handler::response`].
use failure::Fail;

#[derive(Clone, Debug, PartialEq, Fail)]
pub enum Error {
    /// Missing post, category, comment or user. Ends the request with a 404.
    #[fail(display = "not found")]
    NotFound,
    /// Unauthenticated access to a protected action. Sends the client to the
    /// login page.
    #[fail(display = "login required")]
    Unauthorized,
    /// Authenticated but not the author of the resource. Soft redirect back
    /// to the related post, not an error page.
    #[fail(display = "not the author of this resource")]
    NotOwner { post: i32 },
}
