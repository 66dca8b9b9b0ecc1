//! Nauta Connect - captive-portal session client for the ETECSA Nauta network
//!
//! This crate authenticates against the ETECSA Nauta captive portal, which
//! gates network access behind browser-style HTML forms and redirects
//! rather than an API. It scrapes the anti-forgery tokens out of the login
//! form, drives the login/logout/query flow, and persists session state so
//! an authenticated session survives process restarts.
//!
//! # Architecture
//!
//! - `portal`: the session core (transport, form scraping, state machine)
//! - `settings`: typed key-value persistence for session state
//! - `config`: configuration file handling (TOML)
//! - `credentials`: OS keychain storage for portal accounts
//! - `notify`: desktop notification interface

pub mod config;
pub mod credentials;
pub mod notify;
pub mod portal;
pub mod settings;

pub use config::Config;
pub use portal::{PortalClient, PortalError, SessionManager, SessionState};
pub use settings::{FileSettings, SettingsStore};
