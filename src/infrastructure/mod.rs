pub mod config;
pub mod http_client;
pub mod logging;
pub mod output;
pub mod prompt;
pub mod state_store;
