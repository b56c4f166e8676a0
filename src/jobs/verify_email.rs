use anyhow::{anyhow, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};
use url::Url;

use crate::infra::mailer::Mailer;
use crate::infra::queue::{QueueClient, VerifyEmailPayload};

const POLL_WAIT_SECONDS: i32 = 10;
const ERROR_BACKOFF_MS: u64 = 1000;

// Activation tokens are not issued yet, so every link carries these values.
const PLACEHOLDER_EMAIL_ID: &str = "1";
const PLACEHOLDER_SECRET_CODE: &str = "123";

pub const SUBJECT: &str = "Confirm your email";

/// Consumes verification tasks until `shutdown` flips to `true`. Each message
/// is acknowledged as soon as it arrives, so a failed send is not retried.
pub async fn run(
    queue: QueueClient,
    mailer: Arc<dyn Mailer>,
    base_url: String,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    info!(queue = %queue.queue_name(), "verify email consumer started");
    loop {
        if *shutdown.borrow() {
            break;
        }

        let received = tokio::select! {
            _ = shutdown.changed() => break,
            received = queue.receive_verify_email_task(POLL_WAIT_SECONDS) => received,
        };

        match received {
            Ok(Some(task)) => {
                if let Err(err) = queue.delete_message(&task.receipt_handle).await {
                    warn!(error = ?err, "failed to delete queue message");
                }
                let Some(payload) = task.payload else {
                    continue;
                };
                info!(username = %payload.username, "received verify email task");
                if let Err(err) = send_verification(mailer.as_ref(), &base_url, &payload).await {
                    error!(error = ?err, username = %payload.username, "failed to send verification email");
                }
            }
            Ok(None) => {}
            Err(err) => {
                warn!(error = ?err, "queue receive failed, backing off");
                tokio::select! {
                    _ = shutdown.changed() => break,
                    _ = tokio::time::sleep(Duration::from_millis(ERROR_BACKOFF_MS)) => {}
                }
            }
        }
    }

    info!("verify email consumer stopped");
    Ok(())
}

pub async fn send_verification(
    mailer: &dyn Mailer,
    base_url: &str,
    payload: &VerifyEmailPayload,
) -> Result<()> {
    let link = verification_link(base_url)?;
    let html = render_body(&payload.username, &link);
    mailer
        .send_email(SUBJECT, &html, &[payload.email.clone()], &[], &[], &[])
        .await
}

pub fn verification_link(base_url: &str) -> Result<String> {
    let mut url = Url::parse(base_url)?;
    url.path_segments_mut()
        .map_err(|_| anyhow!("base URL cannot carry a path: {}", base_url))?
        .pop_if_empty()
        .extend(["v1", "verify_email"]);
    url.query_pairs_mut()
        .append_pair("email_id", PLACEHOLDER_EMAIL_ID)
        .append_pair("secret_code", PLACEHOLDER_SECRET_CODE);
    Ok(url.to_string())
}

fn render_body(username: &str, link: &str) -> String {
    format!(
        "Hello {},<br/>\
         Thank you for registering with us!<br/>\
         Please <a href=\"{}\">click here</a> to verify your email address.<br/>",
        html_escape::encode_text(username),
        link
    )
}
