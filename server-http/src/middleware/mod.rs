pub mod session;

pub use session::{client_ip, session_middleware, session_token, SESSION_COOKIE};
