pub mod archive;
pub mod auth;
pub mod chat;
pub mod config;
pub mod envfile;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod http;
pub mod important;
pub mod store;
pub mod tree;

pub use config::Config;
pub use error::{CodepromptError, Result};
pub use tree::{build_file_structure, TreeNode};
