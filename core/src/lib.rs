//! Shared core for divbridge: turns chat and tool outputs into DivKit widget trees.

pub mod adapters;
pub mod builders;
pub mod cache;
pub mod config_store;
pub mod divkit;
pub mod error;
pub mod plugins;
pub mod render;
pub mod widget;
