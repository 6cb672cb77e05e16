//! Sessions and the GitHub OAuth flow.

pub mod github;
pub mod session;

pub use github::GithubOauth;
pub use session::{GithubUser, MemorySessionStore, Session, SessionStore};
