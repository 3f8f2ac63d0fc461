pub mod config;
pub mod controller;
pub mod db;
pub mod error;
pub mod flow;
pub mod io;
pub mod models;
pub mod password;
pub mod paths;
pub mod schema;

pub use config::Config;
pub use db::Db;
pub use error::{ArchdraftError, Result};
