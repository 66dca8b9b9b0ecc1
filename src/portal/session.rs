//! Portal session state machine
//!
//! Drives the acquire/login/logout/query flow against the Nauta captive
//! portal. Success of a login is decided by the URL the portal redirects
//! to, never by status code, and rejection reasons only exist as
//! `alert(...)` calls inside script the server injects into the response
//! page. Both quirks are contained here; nothing outside this module
//! inspects raw portal responses.
//!
//! State-mutating operations (`acquire`, `login`, `logout`, `reset`) take
//! `&mut self`, so overlapping mutations on one manager are rejected at
//! compile time. Read-only queries take `&self` and may run concurrently
//! with each other.

use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, info};
use url::Url;

use super::PortalError;
use super::form;
use super::http::Transport;
use super::state::{AuthInfo, SessionState};
use crate::settings::SettingsStore;

/// Root page of the captive portal; fixed, never discovered
pub const PORTAL_URL: &str = "https://secure.etecsa.net:8443/";

/// Logout endpoint, relative to the portal root
const LOGOUT_PATH: &str = "LogoutServlet";

/// Quota/credit query endpoint, relative to the portal root
const QUERY_PATH: &str = "EtecsaQueryServlet";

/// `id` of the login form on the portal root page
const LOGIN_FORM_ID: &str = "formulario";

/// Substring of the final resolved URL that marks a successful login;
/// the portal answers HTTP 200 either way
const SUCCESS_MARKER: &str = "online.do";

/// Cell of the query response that carries the account credit
const CREDIT_CELL: &str = "#sessioninfo > tbody:nth-child(1) > tr:nth-child(2) > td:nth-child(2)";

static ATTRIBUTE_UUID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("ATTRIBUTE_UUID=([^&]+)").expect("pattern is valid"));

/// One logical portal session: transport, tokens, identity, persistence
///
/// Generic over [`Transport`] so tests drive the state machine with a
/// scripted fake, and over [`SettingsStore`] so state outlives the
/// process. State is written through the store immediately after every
/// transition that changes `auth`.
pub struct SessionManager<T, S> {
    transport: T,
    portal: Url,
    state: SessionState,
    store: S,
}

impl<T: Transport, S: SettingsStore> SessionManager<T, S> {
    /// Create a manager with a fresh, token-less state
    pub fn new(transport: T, portal: &str, store: S) -> Result<Self, PortalError> {
        Ok(Self {
            transport,
            portal: Url::parse(portal)?,
            state: SessionState::default(),
            store,
        })
    }

    /// Create a manager with state reconstructed from the store
    ///
    /// The loaded state may represent any point of the lifecycle: fresh,
    /// tokens acquired, or connected.
    pub fn from_settings(transport: T, portal: &str, store: S) -> Result<Self, PortalError> {
        let state = SessionState::load(&store)?;
        Ok(Self {
            transport,
            portal: Url::parse(portal)?,
            state,
            store,
        })
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    /// Write the current state through the settings store
    pub fn save(&mut self) -> Result<(), PortalError> {
        Ok(self.state.save(&mut self.store)?)
    }

    /// Drop all session fields and persist the fresh state
    pub fn reset(&mut self) -> Result<(), PortalError> {
        self.state.reset();
        self.save()
    }

    /// Fetch the portal root and scrape the anti-forgery tokens
    ///
    /// Always performs a live GET. Either all three token fields are
    /// replaced together or, on any failure, none of them change.
    pub async fn acquire(&mut self) -> Result<(), PortalError> {
        debug!("Fetching login form from {}", self.portal);
        let response = self.transport.get(self.portal.as_str()).await?;
        let login_form = form::extract_hidden_fields(&response.body, LOGIN_FORM_ID)?;

        let csrfhw = login_form.fields.get("csrfhw").cloned().unwrap_or_default();
        let wlanuserip = login_form
            .fields
            .get("wlanuserip")
            .cloned()
            .unwrap_or_default();

        self.state.csrfhw = csrfhw;
        self.state.wlanuserip = wlanuserip;
        self.state.login_url = login_form.action;
        Ok(())
    }

    /// Authenticate against the portal
    ///
    /// No-op when already connected. Acquires fresh tokens first when the
    /// state has none. On success the server-issued session identifier is
    /// captured and the state transitions to connected; on any failure
    /// `auth` is left exactly as it was.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<(), PortalError> {
        if self.is_connected() {
            debug!("Already connected; login is a no-op");
            return Ok(());
        }

        if !self.state.has_tokens() {
            self.acquire().await?;
        }

        let login_url = self.endpoint(&self.state.login_url)?;
        let mut fields = self.base_form();
        set_field(&mut fields, "username", username.to_string());
        set_field(&mut fields, "password", password.to_string());

        let response = self.transport.post_form(login_url.as_str(), &fields).await?;

        if !response.final_url.contains(SUCCESS_MARKER) {
            return Err(match form::last_script_alert(&response.body) {
                Some(message) => PortalError::Rejected(message),
                None => PortalError::UnknownLogin,
            });
        }

        let attribute_uuid = ATTRIBUTE_UUID_RE
            .captures(&response.body)
            .map(|captures| captures[1].to_string())
            .ok_or(PortalError::MissingSessionId)?;

        info!("Logged in as {}", username);
        self.state.auth = Some(AuthInfo {
            username: username.to_string(),
            attribute_uuid,
        });
        self.save()
    }

    /// Close the authenticated session
    ///
    /// No-op when not connected. A transport failure leaves `auth` in
    /// place: the portal may still consider the session open, and
    /// forgetting the identity would make it impossible to retry.
    pub async fn logout(&mut self) -> Result<(), PortalError> {
        if !self.is_connected() {
            debug!("Not connected; logout is a no-op");
            return Ok(());
        }

        let url = self.endpoint(LOGOUT_PATH)?;
        let fields = self.base_form();
        self.transport.post_form(url.as_str(), &fields).await?;

        info!("Logged out");
        self.state.auth = None;
        self.save()
    }

    /// Seconds of quota left on the connected session
    ///
    /// The portal answers with plain text of the form `HH:MM:SS`. Every
    /// component must be numeric; a reply like `01:XX:03` is rejected
    /// rather than silently read as `01:00:03`.
    pub async fn remaining_time(&self) -> Result<u64, PortalError> {
        if !self.is_connected() {
            return Err(PortalError::NotConnected);
        }

        let url = self.endpoint(QUERY_PATH)?;
        let mut fields = self.base_form();
        set_field(&mut fields, "op", "getLeftTime".to_string());

        let response = self.transport.post_form(url.as_str(), &fields).await?;
        parse_left_time(response.body.trim())
    }

    /// Account credit as the portal displays it, e.g. `"12.50 CUP"`
    ///
    /// Stateless: requires credentials, not an authenticated session, and
    /// does not affect `auth`.
    pub async fn user_credits(
        &self,
        username: &str,
        password: &str,
    ) -> Result<String, PortalError> {
        let url = self.endpoint(QUERY_PATH)?;
        let mut fields = self.base_form();
        set_field(&mut fields, "username", username.to_string());
        set_field(&mut fields, "password", password.to_string());

        let response = self.transport.post_form(url.as_str(), &fields).await?;
        form::table_cell_text(&response.body, CREDIT_CELL)
    }

    /// Token set every portal POST carries; the identity fields ride along
    /// while connected
    fn base_form(&self) -> Vec<(String, String)> {
        let mut fields = vec![
            ("CSRFHW".to_string(), self.state.csrfhw.clone()),
            ("wlanuserip".to_string(), self.state.wlanuserip.clone()),
        ];
        if let Some(auth) = &self.state.auth {
            fields.push(("username".to_string(), auth.username.clone()));
            fields.push(("ATTRIBUTE_UUID".to_string(), auth.attribute_uuid.clone()));
        }
        fields
    }

    /// Resolve a possibly-relative path or form action against the portal
    fn endpoint(&self, path: &str) -> Result<Url, PortalError> {
        Ok(self.portal.join(path)?)
    }
}

/// Replace `key` if the base form already carries it, append otherwise
fn set_field(fields: &mut Vec<(String, String)>, key: &str, value: String) {
    match fields.iter_mut().find(|(k, _)| k == key) {
        Some(slot) => slot.1 = value,
        None => fields.push((key.to_string(), value)),
    }
}

fn parse_left_time(raw: &str) -> Result<u64, PortalError> {
    let parts: Vec<&str> = raw.split(':').collect();
    let [hours, minutes, seconds] = parts[..] else {
        return Err(PortalError::TimeFormat(raw.to_string()));
    };

    let parse = |component: &str| {
        component
            .trim()
            .parse::<u64>()
            .map_err(|_| PortalError::TimeFormat(raw.to_string()))
    };

    Ok(parse(hours)? * 3600 + parse(minutes)? * 60 + parse(seconds)?)
}
