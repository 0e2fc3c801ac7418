pub mod artifact;
pub mod config;
pub mod error;

pub use artifact::*;
pub use config::Config;
pub use error::ErrorKind;
