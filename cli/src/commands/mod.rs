pub mod build;
pub mod config;
pub mod health;
pub mod render;
