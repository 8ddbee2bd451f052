use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use std::time;

use crate::domain::subscriber_email::SubscriberEmail;
use crate::reminders::{MessageSink, SinkError};

const REQUEST_TIMEOUT: time::Duration = time::Duration::from_secs(10);

pub struct EmailClient {
    http_client: Client,
    base_url: String,
    sender: SubscriberEmail,
    api_key: Secret<String>,
}

#[derive(serde::Serialize)]
struct SendEmailBody<'a> {
    personalizations: Vec<SendgridPersonalization<'a>>,
    from: SendgridEmail<'a>,
    subject: &'a str,
    content: Vec<SendgridContent<'a>>,
}

#[derive(serde::Serialize)]
struct SendgridEmail<'a> {
    email: &'a str,
}

#[derive(serde::Serialize)]
struct SendgridPersonalization<'a> {
    to: Vec<SendgridEmail<'a>>,
}

#[derive(serde::Serialize)]
struct SendgridContent<'a> {
    #[serde(rename = "type")]
    content_type: &'a str,
    value: &'a str,
}

impl EmailClient {
    pub fn new(
        base_url: String,
        sender: SubscriberEmail,
        api_key: Secret<String>,
        timeout: Option<time::Duration>,
    ) -> Result<EmailClient, reqwest::Error> {
        let http_client = Client::builder()
            .timeout(timeout.unwrap_or(REQUEST_TIMEOUT))
            .build()?;

        Ok(EmailClient {
            http_client,
            base_url,
            sender,
            api_key,
        })
    }

    /// Sends a single plain text email addressed to every recipient at once.
    #[tracing::instrument(
        name = "Sending an email",
        skip(self, recipients, text_content),
        fields(recipients = recipients.len())
    )]
    pub async fn send_email(
        &self,
        recipients: &[SubscriberEmail],
        subject: &str,
        text_content: &str,
    ) -> Result<(), reqwest::Error> {
        let url = format!("{}/mail/send", self.base_url);
        let body = SendEmailBody {
            from: SendgridEmail {
                email: self.sender.as_ref(),
            },
            personalizations: vec![SendgridPersonalization {
                to: recipients
                    .iter()
                    .map(|recipient| SendgridEmail {
                        email: recipient.as_ref(),
                    })
                    .collect(),
            }],
            subject,
            content: vec![SendgridContent {
                content_type: "text/plain",
                value: text_content,
            }],
        };

        self.http_client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .json(&body)
            .send()
            .await?
            .error_for_status()?; // return an error when server response status code is 4xx or 5xx

        Ok(())
    }
}

#[async_trait]
impl MessageSink for EmailClient {
    async fn send(
        &self,
        recipients: &[SubscriberEmail],
        subject: &str,
        body: &str,
    ) -> Result<(), SinkError> {
        if recipients.is_empty() {
            return Err(SinkError::NoRecipients);
        }

        self.send_email(recipients, subject, body).await?;

        tracing::info!("Birthday reminder sent to {} recipients", recipients.len());

        Ok(())
    }
}
