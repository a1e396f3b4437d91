// oag - Open API Gateway with promotion caching

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod metrics;
pub mod server;
pub mod upstream;
pub mod utils;
