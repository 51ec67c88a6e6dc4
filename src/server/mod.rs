mod catalog_routes;
pub mod config;
mod flash;
mod http_layers;
pub mod pages;
mod responses;
#[allow(clippy::module_inception)]
pub mod server;
pub mod session;
pub mod state;

pub use config::ServerConfig;
pub use http_layers::*;
pub use server::{make_app, run_server};
