pub mod config;
pub mod dispatch;
pub mod elevation;
pub mod error;
pub mod util;

pub mod mission;

pub mod web;
