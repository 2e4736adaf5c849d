mod middleware;
mod password;
mod session;

pub use middleware::{AuthSession, CurrentUser, RequireAdmin, RequireAuth};
pub use password::PasswordHasher;
pub use session::{
    SESSION_COOKIE, SessionTokenGenerator, clear_session_cookie, parse_session_token,
    session_cookie, session_token_from_headers,
};
