pub mod config;
pub mod db;
pub mod error;
pub mod io;
pub mod lifecycle;
pub mod memory;
pub mod paths;
pub mod registry;
pub mod saga;
pub mod subdomain;
pub mod tenant;
pub mod types;

pub use error::{Result, StoreError};
