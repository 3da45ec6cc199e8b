pub mod app;
pub mod appointments;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod memory;
pub mod openapi;
pub mod state;
