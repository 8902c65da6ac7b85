// Edge Data Latency - Library root for testing

pub mod config;
pub mod dashboard;
pub mod drivers;
pub mod error;
pub mod harness;
pub mod middleware;
pub mod models;
pub mod probe;
pub mod routes;
pub mod server;
