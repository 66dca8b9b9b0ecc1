//! HTML scraping for the portal's pages
//!
//! Only the minimal subset the portal requires: the hidden inputs of one
//! form, its action URL, the `alert(...)` text the server injects into its
//! error pages, and one table cell from the query response. This is not a
//! general DOM layer; nothing outside `portal` should parse markup.

use super::PortalError;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::sync::LazyLock;

static HIDDEN_INPUTS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"input[type="hidden"]"#).expect("selector is valid"));

static SCRIPTS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script").expect("selector is valid"));

static ALERT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"alert\("([^"]*?)"\)"#).expect("pattern is valid"));

/// A scraped login form: its submission URL and hidden fields
#[derive(Debug, Clone)]
pub struct LoginForm {
    /// The form's `action` attribute; may be relative to the page URL
    pub action: String,
    /// Hidden inputs keyed by lower-cased `name`
    pub fields: HashMap<String, String>,
}

/// Locate the form with `form_id` and collect its hidden inputs
///
/// Field names are lower-cased; a missing `value` attribute reads as the
/// empty string. Token presence is not validated here; that is the session
/// manager's concern.
pub fn extract_hidden_fields(html: &str, form_id: &str) -> Result<LoginForm, PortalError> {
    let selector = format!("#{}", form_id);
    let by_id = Selector::parse(&selector)
        .map_err(|e| PortalError::HtmlParse(format!("bad selector `{}`: {}", selector, e)))?;

    let document = Html::parse_document(html);
    let form = document
        .select(&by_id)
        .next()
        .ok_or(PortalError::FormNotFound(selector))?;

    let mut fields = HashMap::new();
    for input in form.select(&HIDDEN_INPUTS) {
        let Some(name) = input.value().attr("name") else {
            continue;
        };
        let value = input.value().attr("value").unwrap_or_default();
        fields.insert(name.to_lowercase(), value.to_string());
    }

    let action = form.value().attr("action").unwrap_or_default().to_string();
    Ok(LoginForm { action, fields })
}

/// Extract the message from the last `<script>` element's `alert("...")`
///
/// The portal reports rejection reasons by injecting a script that alerts
/// in the user's browser; the last script on the page is the one that
/// carries it. Returns `None` when the page has no script or no alert.
pub fn last_script_alert(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let script = document.select(&SCRIPTS).last()?;
    let text: String = script.text().collect();
    ALERT_RE
        .captures(&text)
        .map(|captures| captures[1].to_string())
}

/// Trimmed text of the single element matching `selector`
pub fn table_cell_text(html: &str, selector: &str) -> Result<String, PortalError> {
    let cell_selector = Selector::parse(selector)
        .map_err(|e| PortalError::HtmlParse(format!("bad selector `{}`: {}", selector, e)))?;

    let document = Html::parse_document(html);
    let cell = document
        .select(&cell_selector)
        .next()
        .ok_or_else(|| PortalError::FormNotFound(selector.to_string()))?;

    Ok(cell.text().collect::<String>().trim().to_string())
}
