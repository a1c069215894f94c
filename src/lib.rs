pub mod admission;
pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod ident;
pub mod lifecycle;
pub mod middleware;
pub mod notify;
pub mod ratelimit;
pub mod routes;
pub mod schema;
pub mod state;
pub mod store;
pub mod validate;
