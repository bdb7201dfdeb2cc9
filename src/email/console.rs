//! Console-based email sender for development

use super::EmailSender;

/// Email sender that prints to the console (for development)
pub struct ConsoleSender;

impl ConsoleSender {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConsoleSender {
    fn default() -> Self {
        Self::new()
    }
}

impl EmailSender for ConsoleSender {
    fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), String> {
        println!();
        println!("========================================");
        println!("  EMAIL TO: {}", to);
        println!("  SUBJECT: {}", subject);
        println!("----------------------------------------");
        println!("{}", body);
        println!("========================================");
        println!();

        tracing::info!(to = %to, subject = %subject, "Email printed to console");

        Ok(())
    }
}
