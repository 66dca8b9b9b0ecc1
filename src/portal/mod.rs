//! ETECSA Nauta captive-portal protocol implementation
//!
//! The portal has no API. It gates network access behind a browser-style
//! HTML login form, answers HTTP 200 for success and failure alike, and
//! communicates outcomes through where it redirects and what it injects
//! into the response markup. This module contains everything that has to
//! understand those quirks:
//!
//! - `http`: cookie-carrying transport that exposes the final resolved URL
//! - `form`: the minimal HTML scraping the portal requires
//! - `state`: durable session fields and their persistence mapping
//! - `session`: the acquire/login/logout/query state machine

pub mod form;
pub mod http;
pub mod session;
pub mod state;

pub use http::{PortalClient, PortalResponse, Transport};
pub use session::{PORTAL_URL, SessionManager};
pub use state::{AuthInfo, SessionState};

use crate::settings::SettingsError;
use thiserror::Error;

/// Portal interaction errors
#[derive(Error, Debug)]
pub enum PortalError {
    #[error("HTTP request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Portal returned HTTP {code}: {reason}")]
    Http { code: u16, reason: String },

    #[error("Invalid portal URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("No element matching `{0}` in portal page")]
    FormNotFound(String),

    #[error("Failed to parse portal markup: {0}")]
    HtmlParse(String),

    #[error("Portal rejected the request: {0}")]
    Rejected(String),

    #[error("Portal rejected the login without an explanation")]
    UnknownLogin,

    #[error("Login response carried no session identifier")]
    MissingSessionId,

    #[error("Quota response is not in HH:MM:SS format: {0:?}")]
    TimeFormat(String),

    #[error("Operation requires an authenticated session")]
    NotConnected,

    #[error("Failed to persist session state: {0}")]
    Persist(#[from] SettingsError),
}
