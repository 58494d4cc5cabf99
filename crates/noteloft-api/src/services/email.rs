//! Email service for the password-reset and email-verification flows.

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;

use noteloft_core::Config;

/// SMTP-backed email sender. `None` when SMTP is not configured; callers
/// degrade to log-only in that case.
#[derive(Clone)]
pub struct EmailService {
    mailer: Arc<AsyncSmtpTransport<Tokio1Executor>>,
    from: String,
    frontend_url: String,
}

impl EmailService {
    /// Create email service from config. Returns `None` if SMTP is not
    /// configured.
    pub fn from_config(config: &Config) -> Option<Self> {
        let host = config.smtp_host.as_deref()?;
        let from = config.smtp_from.as_deref()?.to_string();
        let port = config.smtp_port.unwrap_or(587);
        let frontend_url = config
            .frontend_url
            .clone()
            .unwrap_or_else(|| format!("http://{}", config.base_domain));

        let mailer = if config.smtp_tls {
            let b = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host).ok()?;
            let b = b.port(port);
            let b = if let (Some(u), Some(p)) = (&config.smtp_user, &config.smtp_password) {
                b.credentials(Credentials::new(u.clone(), p.clone()))
            } else {
                b
            };
            tracing::info!(host = %host, port = port, "Email service initialized (SMTP with STARTTLS)");
            b.build()
        } else {
            let b = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host).port(port);
            let b = if let (Some(u), Some(p)) = (&config.smtp_user, &config.smtp_password) {
                b.credentials(Credentials::new(u.clone(), p.clone()))
            } else {
                b
            };
            tracing::info!(host = %host, port = port, "Email service initialized (SMTP)");
            b.build()
        };

        Some(Self {
            mailer: Arc::new(mailer),
            from,
            frontend_url,
        })
    }

    /// Send a plain-text email.
    pub async fn send(&self, to: &str, subject: &str, body_plain: &str) -> Result<(), String> {
        let to_addr: Mailbox = to
            .parse()
            .map_err(|e| format!("Invalid recipient address: {}", e))?;
        let from_addr: Mailbox = self
            .from
            .parse()
            .map_err(|e| format!("Invalid SMTP_FROM: {}", e))?;

        let email = Message::builder()
            .from(from_addr)
            .to(to_addr)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body_plain.to_string())
            .map_err(|e| e.to_string())?;

        self.mailer.send(email).await.map_err(|e| e.to_string())?;
        tracing::info!(subject = %subject, "Email sent");
        Ok(())
    }

    /// Send the password-reset link. The link lands on the tenant's frontend
    /// when the request was tenant-scoped.
    pub async fn send_reset_password_email(
        &self,
        to: &str,
        token: &str,
        tenant_slug: Option<&str>,
    ) -> Result<(), String> {
        let link = self.frontend_link("reset-password", token, tenant_slug);
        let body = format!(
            "Dear user,\n\nTo reset your password, click on this link: {}\n\nIf you did not request a password reset, ignore this email.",
            link
        );
        self.send(to, "Reset password", &body).await
    }

    /// Send the email-verification link.
    pub async fn send_verification_email(
        &self,
        to: &str,
        token: &str,
        tenant_slug: Option<&str>,
    ) -> Result<(), String> {
        let link = self.frontend_link("verify-email", token, tenant_slug);
        let body = format!(
            "Dear user,\n\nTo verify your email, click on this link: {}\n\nIf you did not create an account, ignore this email.",
            link
        );
        self.send(to, "Email Verification", &body).await
    }

    fn frontend_link(&self, path: &str, token: &str, tenant_slug: Option<&str>) -> String {
        match tenant_slug {
            Some(slug) => format!("{}/{}?token={}&tenant={}", self.frontend_url, path, token, slug),
            None => format!("{}/{}?token={}", self.frontend_url, path, token),
        }
    }
}
