//! Application state shared across request handlers

use crate::email::EmailSender;
use crate::store::Datastore;

/// Shared application state: the datastore, the email sender, and the
/// request-independent knobs handlers need. Injected rather than global.
pub struct AppState<D, E> {
    pub store: D,
    pub email_sender: E,
    /// Session lifetime in days
    pub session_ttl_days: i64,
    /// Minutes a login code stays valid
    pub login_code_ttl_minutes: i64,
}

impl<D, E> AppState<D, E>
where
    D: Datastore,
    E: EmailSender,
{
    pub fn new(store: D, email_sender: E) -> Self {
        Self {
            store,
            email_sender,
            session_ttl_days: 30,
            login_code_ttl_minutes: 15,
        }
    }

    pub fn with_session_ttl(mut self, days: i64) -> Self {
        self.session_ttl_days = days;
        self
    }

    pub fn with_login_code_ttl(mut self, minutes: i64) -> Self {
        self.login_code_ttl_minutes = minutes;
        self
    }
}
