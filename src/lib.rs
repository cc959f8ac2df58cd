//! POLYEDGE — Autonomous Prediction Market Decision Funnel
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod cache;
pub mod config;
pub mod engine;
pub mod forecast;
pub mod platforms;
pub mod screen;
pub mod storage;
pub mod strategy;
pub mod types;
