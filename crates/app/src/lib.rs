//! `signaldesk-app` library crate.
//!
//! Screens, rendering and configuration for the `signaldesk` terminal
//! client. The binary entrypoint lives in `main.rs`.

pub mod app;
pub mod cli;
pub mod config;
pub mod render;
pub mod screens;
