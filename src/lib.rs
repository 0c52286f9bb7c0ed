pub mod cli;
pub mod commands;
pub mod dispatch;
pub mod models;
pub mod providers;
pub mod server;
pub mod service;
pub mod storage;
pub mod validation;
