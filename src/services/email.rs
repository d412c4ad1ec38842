use anyhow::Context;
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use uuid::Uuid;

use crate::{config::Config, models::relance::DueRelance};

pub struct EmailService {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl EmailService {
    /// Returns None if SMTP is not fully configured.
    pub fn new(config: &Config) -> Option<Self> {
        let host = config.smtp_host.as_deref()?;
        let username = config.smtp_username.clone()?;
        let password = config.smtp_password.clone()?;
        let from_addr = config.smtp_from.as_deref()?;

        let port = config.smtp_port.unwrap_or(587);
        let creds = Credentials::new(username, password);

        let transport = if port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)
                .ok()?
                .port(port)
                .credentials(creds)
                .build()
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .ok()?
                .port(port)
                .credentials(creds)
                .build()
        };

        let from: Mailbox = from_addr.parse().ok()?;

        Some(Self { transport, from })
    }

    // ─── Private helpers ─────────────────────────────────────────────────────

    fn new_message_id(&self) -> String {
        format!("<{}@{}>", Uuid::new_v4(), self.from.email.domain())
    }

    /// Wraps inner HTML content in the layout shared by every outgoing email,
    /// with the company name as header and footer.
    fn wrap_html(company: &str, content: &str) -> String {
        format!(
            r#"<!DOCTYPE html>
<html lang="fr">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width,initial-scale=1">
  <title>{company}</title>
</head>
<body style="margin:0;padding:0;background-color:#f1f5f9;font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',Roboto,Helvetica,Arial,sans-serif">
  <table role="presentation" width="100%" cellpadding="0" cellspacing="0" style="background-color:#f1f5f9;padding:40px 16px">
    <tr>
      <td align="center">
        <table role="presentation" width="100%" cellpadding="0" cellspacing="0" style="max-width:560px">
          <tr>
            <td align="center" style="padding-bottom:28px">
              <p style="margin:0;font-size:20px;font-weight:700;color:#0f172a;text-align:center">{company}</p>
            </td>
          </tr>
          <tr>
            <td style="background:#ffffff;border-radius:12px;padding:40px;box-shadow:0 1px 3px rgba(0,0,0,0.08),0 8px 24px rgba(0,0,0,0.04)">
              {content}
            </td>
          </tr>
          <tr>
            <td align="center" style="padding-top:20px">
              <p style="margin:0;font-size:12px;color:#94a3b8">{company}</p>
            </td>
          </tr>
        </table>
      </td>
    </tr>
  </table>
</body>
</html>"#
        )
    }

    async fn send_email(
        &self,
        from: Mailbox,
        to: Mailbox,
        subject: &str,
        text: &str,
        html: &str,
    ) -> anyhow::Result<()> {
        let email = Message::builder()
            .message_id(Some(self.new_message_id()))
            .from(from)
            .to(to)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html.to_string()),
                    ),
            )
            .context("Failed to build email message")?;

        self.transport
            .send(email)
            .await
            .context("Failed to send email")?;

        Ok(())
    }

    // ─── Public methods ───────────────────────────────────────────────────────

    /// Payment reminder for an unpaid invoice. The tone hardens with the level.
    pub async fn send_relance(&self, to_email: &str, relance: &DueRelance) -> anyhow::Result<()> {
        let company = relance.tenant_nom.as_str();
        let client_name = relance.client_display_name();
        let from = Mailbox::new(Some(company.to_string()), self.from.email.clone());
        let to: Mailbox = match format!("{client_name} <{to_email}>").parse() {
            Ok(mailbox) => mailbox,
            Err(_) => to_email
                .parse()
                .with_context(|| format!("Invalid recipient address: {to_email}"))?,
        };

        let numero = &relance.numero;
        let montant = relance.montant_ttc.round_dp(2);
        let echeance = relance.date_echeance.format("%d/%m/%Y");
        let subject = reminder_subject(relance.niveau, numero);
        let body = reminder_body(relance.niveau);

        let text = format!(
            "Bonjour {client_name},\n\n\
            {body}\n\n\
            Facture : {numero}\n\
            Montant TTC : {montant} €\n\
            Échéance : {echeance}\n\n\
            Si vous avez déjà procédé au règlement, merci de ne pas tenir compte de ce message.\n\n\
            {company}"
        );

        let content = format!(
            r#"<h1 style="margin:0 0 8px 0;font-size:22px;font-weight:700;color:#0f172a">{subject}</h1>
<p style="margin:0 0 24px 0;font-size:15px;color:#64748b;line-height:1.6">Bonjour <strong style="color:#334155">{client_name}</strong>,<br><br>{body}</p>
<table role="presentation" cellpadding="0" cellspacing="0" style="width:100%;margin-bottom:28px;border:1px solid #e2e8f0;border-radius:8px">
  <tr><td style="padding:10px 16px;color:#64748b">Facture</td><td style="padding:10px 16px;font-weight:600;color:#0f172a;text-align:right">{numero}</td></tr>
  <tr><td style="padding:10px 16px;color:#64748b">Montant TTC</td><td style="padding:10px 16px;font-weight:600;color:#0f172a;text-align:right">{montant} €</td></tr>
  <tr><td style="padding:10px 16px;color:#64748b">Échéance</td><td style="padding:10px 16px;font-weight:600;color:#0f172a;text-align:right">{echeance}</td></tr>
</table>
<p style="margin:0;font-size:13px;color:#94a3b8;border-top:1px solid #f1f5f9;padding-top:20px;line-height:1.5">Si vous avez déjà procédé au règlement, merci de ne pas tenir compte de ce message.</p>"#
        );

        let html = Self::wrap_html(company, &content);
        self.send_email(from, to, &subject, &text, &html).await
    }
}

pub fn reminder_subject(niveau: i16, numero: &str) -> String {
    match niveau {
        1 => format!("Rappel : facture {numero} arrivée à échéance"),
        2 => format!("Deuxième relance : facture {numero} impayée"),
        _ => format!("Dernière relance avant recouvrement : facture {numero}"),
    }
}

fn reminder_body(niveau: i16) -> &'static str {
    match niveau {
        1 => "Sauf erreur de notre part, la facture ci-dessous n'a pas encore été réglée. Nous vous remercions de bien vouloir procéder à son paiement.",
        2 => "Malgré notre précédent rappel, la facture ci-dessous reste impayée. Nous vous prions de régulariser la situation dans les meilleurs délais.",
        _ => "La facture ci-dessous demeure impayée malgré nos relances. Sans règlement de votre part sous 8 jours, nous serons contraints d'engager une procédure de recouvrement.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_hardens_with_level() {
        assert!(reminder_subject(1, "FAC-2026-0003-A").starts_with("Rappel"));
        assert!(reminder_subject(2, "FAC-2026-0003-A").starts_with("Deuxième"));
        assert!(reminder_subject(3, "FAC-2026-0003-A").contains("recouvrement"));
    }

    #[tokio::test]
    async fn service_needs_full_smtp_config() {
        let mut config = Config::for_database("postgres://localhost/btp");
        assert!(EmailService::new(&config).is_none());

        config.smtp_host = Some("smtp.example.com".into());
        config.smtp_username = Some("user".into());
        config.smtp_password = Some("secret".into());
        config.smtp_from = Some("Factures <factures@example.com>".into());
        assert!(EmailService::new(&config).is_some());
    }
}
