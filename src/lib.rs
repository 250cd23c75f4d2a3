pub mod agent;
pub mod chat_service;
pub mod config;
pub mod error;
pub mod letta;
pub mod models;
pub mod routes;
pub mod state;
