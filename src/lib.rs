pub mod config;
pub mod error;
pub mod fanout;
pub mod identity;
pub mod logging;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
pub mod websocket;
