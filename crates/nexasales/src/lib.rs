//! Customer segment prioritization built on Economic Value to Customer (EVC).
//!
//! The [`workflows::segmentation`] module holds the calculation and scoring
//! core; [`config`], [`telemetry`], and [`error`] carry the process plumbing
//! shared with the service binary.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
