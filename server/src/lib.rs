//! Backend for evntos: event pages, registrations, QR-coded PDF tickets and
//! door check-in.

pub mod auth;
pub mod catalog;
pub mod config;
pub mod export;
pub mod handlers;
pub mod integrations;
pub mod models;
pub mod routes;
pub mod scan;
pub mod slug;
pub mod state;
pub mod store;
pub mod tickets;
pub mod utils;
