//! LinkFlow - WhatsApp lead distribution service
//!
//! This library provides the core functionality for the LinkFlow service:
//! rotating a pool of WhatsApp numbers per campaign group, attributing
//! clicks, and redirecting visitors to wa.me deep links.
//!
//! # Architecture
//! - `rotation`: Number pool abstraction and least-recently-used selection
//! - `analytics`: Click attribution (user-agent parsing, buffered recording)
//! - `storage`: SeaORM backend and data access
//! - `services`: Redirect flow and slug lookup cache
//! - `api`: HTTP handlers and middleware
//! - `config`: Configuration management

pub mod analytics;
pub mod api;
pub mod config;
pub mod errors;
pub mod logging;
pub mod rotation;
pub mod services;
pub mod storage;
pub mod utils;
