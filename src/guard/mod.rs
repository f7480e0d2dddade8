//! Route guard: runs before any page is served and decides, from the presence
//! of the auth cookie alone, whether to serve the page, send the client to the
//! login page (remembering where it was going), or send a cookie-bearing client
//! away from the login page.
//!
//! The check is advisory. Cookie presence proves nothing; every protected API
//! call must still be rejected by the backend when the token is invalid.

pub mod decision;
pub mod middleware;
pub mod paths;

pub use decision::{Decision, evaluate};
pub use middleware::route_guard;
