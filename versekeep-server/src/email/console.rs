//! Console-based email sender for development

use super::EmailSender;

/// Email sender that logs to console (for development)
pub struct ConsoleEmailSender;

impl ConsoleEmailSender {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConsoleEmailSender {
    fn default() -> Self {
        Self::new()
    }
}

impl EmailSender for ConsoleEmailSender {
    fn send_login_code(&self, email: &str, code: &str) -> Result<(), String> {
        println!();
        println!("========================================");
        println!("  LOGIN CODE FOR: {}", email);
        println!("  CODE: {}", code);
        println!("========================================");
        println!();

        tracing::info!(email = %email, code = %code, "Login code sent");

        Ok(())
    }
}
