pub mod data;
pub mod io;
pub mod printing;

pub use data::{Config, ConfigKey, DEFAULT_GREETING};
pub use io::ConfigError;

#[cfg(test)]
pub mod tests;
