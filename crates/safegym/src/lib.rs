//! # safegym - Headless runner for safegym tasks

pub mod config;
pub mod headless;

pub use config::GymConfig;
