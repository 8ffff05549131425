pub mod password;
pub mod session;

pub use password::hash_password;
pub use session::{Session, SessionStore};
