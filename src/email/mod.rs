//! Email sending abstractions

pub mod console;
pub mod smtp;

pub use console::ConsoleSender;
pub use smtp::{SmtpConfig, SmtpSender};

/// Trait for outbound email delivery
pub trait EmailSender: Send + Sync {
    /// Send a plain-text email
    fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), String>;
}

/// Allow using Box<dyn EmailSender> as an EmailSender
impl EmailSender for Box<dyn EmailSender> {
    fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), String> {
        (**self).send_email(to, subject, body)
    }
}
