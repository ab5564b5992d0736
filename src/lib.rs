pub mod cli;
pub mod config;
pub mod database;
pub mod dispatch;
pub mod error;
pub mod schedule;
pub mod sql;
pub mod storage;
pub mod strategy;
pub mod utils;
