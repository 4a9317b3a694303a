//! Core domain types and logic.

pub mod price;
pub mod alignment;
pub mod schedule;
pub mod portfolio;
pub mod execution;
pub mod simulation;
pub mod metrics;
pub mod backtest;
pub mod config_validation;
pub mod error;
