use std::sync::Arc;

use crate::config::{MailConfig, MailProvider};

/// Outgoing notifications. Sending is fire-and-forget: there is no result to
/// inspect and nothing is retried.
pub trait MailService: Send + Sync {
    fn send(&self, subject: &str, message: &str);
}

/// Writes mails to the log instead of delivering them
#[derive(Debug, Clone)]
pub struct LocalMailService {
    mail_to: String,
    mail_from: String,
}

impl LocalMailService {
    pub fn new(config: &MailConfig) -> Self {
        Self {
            mail_to: config.to_address.clone(),
            mail_from: config.from_address.clone(),
        }
    }
}

impl MailService for LocalMailService {
    fn send(&self, subject: &str, message: &str) {
        log::info!(
            "Mail from {} to {}, with LocalMailService",
            self.mail_from,
            self.mail_to
        );
        log::info!("Subject: {}", subject);
        log::info!("Message: {}", message);
    }
}

#[derive(Debug, Clone)]
pub struct CloudMailService {
    mail_to: String,
    mail_from: String,
}

impl CloudMailService {
    pub fn new(config: &MailConfig) -> Self {
        Self {
            mail_to: config.to_address.clone(),
            mail_from: config.from_address.clone(),
        }
    }
}

impl MailService for CloudMailService {
    // TODO: hand the message to a real delivery provider once one is chosen
    fn send(&self, subject: &str, message: &str) {
        log::info!(
            "Mail from {} to {}, with CloudMailService",
            self.mail_from,
            self.mail_to
        );
        log::info!("Subject: {}", subject);
        log::info!("Message: {}", message);
    }
}

/// Pick the mail service once at start-up
pub fn mail_service_from_config(config: &MailConfig) -> Arc<dyn MailService> {
    match config.provider {
        MailProvider::Local => Arc::new(LocalMailService::new(config)),
        MailProvider::Cloud => Arc::new(CloudMailService::new(config)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_selection() {
        let mut config = MailConfig::default();
        // Both implementations are infallible from the caller's point of view
        mail_service_from_config(&config).send("subject", "local");
        config.provider = MailProvider::Cloud;
        mail_service_from_config(&config).send("subject", "cloud");
    }

    #[test]
    fn test_local_service_reads_addresses_from_config() {
        let config = MailConfig {
            provider: MailProvider::Local,
            to_address: "to@example.com".to_string(),
            from_address: "from@example.com".to_string(),
        };
        let service = LocalMailService::new(&config);
        assert_eq!(service.mail_to, "to@example.com");
        assert_eq!(service.mail_from, "from@example.com");
    }
}
