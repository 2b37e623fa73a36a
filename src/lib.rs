pub mod auth;
pub mod chat;
pub mod client;
pub mod config;
pub mod games;
pub mod ledger;
pub mod llm;
pub mod metrics;
pub mod reputation;
pub mod repository;
pub mod routes;
pub mod server;
/// Client-side session state, persisted one key at a time.
pub mod store;
pub mod tutor;
