//! Desktop notification interface
//!
//! The session core never notifies anyone; user-visible messaging belongs
//! to the caller and is routed through this trait so it can be silenced
//! or faked.

use tracing::warn;

pub trait Notifier {
    fn notify(&self, summary: &str, body: &str);
}

/// Native desktop notifications
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    #[cfg(not(windows))]
    fn notify(&self, summary: &str, body: &str) {
        if let Err(e) = notify_rust::Notification::new()
            .summary(summary)
            .body(body)
            .show()
        {
            warn!("Failed to show notification: {}", e);
        }
    }

    #[cfg(windows)]
    fn notify(&self, summary: &str, body: &str) {
        use tauri_winrt_notification::Toast;

        if let Err(e) = Toast::new(Toast::POWERSHELL_APP_ID)
            .title(summary)
            .text1(body)
            .show()
        {
            warn!("Failed to show notification: {}", e);
        }
    }
}

/// Discards every notification; for headless runs and tests
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _summary: &str, _body: &str) {}
}
