pub mod app;
pub mod command;
pub mod config;
pub mod terminal;
