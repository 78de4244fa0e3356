pub mod cli;
pub mod load_config;
pub mod mvn;

pub use cli::{run, Cli, Commands};
