use crate::mailer::SmtpConfig;

/// Settings shared across actions: where outbound mail comes from and the
/// optional SMTP relay. No relay means the logging mailer.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub from_email: String,
    pub smtp: Option<SmtpConfig>,
}

impl GlobalArgs {
    #[must_use]
    pub const fn new(from_email: String) -> Self {
        Self {
            from_email,
            smtp: None,
        }
    }

    pub fn set_smtp(&mut self, smtp: SmtpConfig) {
        self.smtp = Some(smtp);
    }
}
