//! SurveyHub - survey distribution backend
//!
//! Survey lifecycle with quota enforcement, trackable redirect links,
//! outcome capture from panel providers, respondent submissions, panel
//! registration with email OTP, and CSV reporting for admins.
//!
//! # Features
//! - **server**: HTTP server mode (default)
//! - **cli**: Admin maintenance subcommands
//!
//! # Architecture
//! - `storage`: SeaORM backend (SQLite / MySQL / PostgreSQL)
//! - `services`: Business rules (quota, clicks, links, submissions, OTP, admins)
//! - `api`: HTTP handlers, JWT and middleware
//! - `interfaces`: CLI commands
//! - `config`: Configuration management
//! - `runtime`: Application lifecycle and execution modes
//! - `system`: Logging

pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod interfaces;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
