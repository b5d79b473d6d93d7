pub mod mission_api;
pub mod server;
