pub mod cli;
pub mod http;
pub mod load_config;

pub use cli::{execute, run, Cli, Commands};
pub use http::HttpTransport;
