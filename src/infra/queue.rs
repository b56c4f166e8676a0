use anyhow::{anyhow, Result};
use aws_config::meta::region::RegionProviderChain;
use aws_config::BehaviorVersion;
use aws_config::Region;
use aws_sdk_sqs::error::SdkError;
use aws_sdk_sqs::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::AppConfig;

/// Body of a verification task: who to greet and where to send the link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyEmailPayload {
    pub username: String,
    pub email: String,
}

#[derive(Clone)]
pub struct QueueClient {
    client: Client,
    queue_name: String,
    queue_url: String,
}

#[derive(Debug)]
pub struct ReceivedTask {
    pub payload: Option<VerifyEmailPayload>,
    pub receipt_handle: String,
}

impl QueueClient {
    pub async fn new(config: &AppConfig) -> Result<Self> {
        let region_provider = RegionProviderChain::first_try(Region::new(config.queue_region.clone()));
        let shared_config = aws_config::defaults(BehaviorVersion::latest())
            .region(region_provider)
            .load()
            .await;

        let mut sqs_builder = aws_sdk_sqs::config::Builder::from(&shared_config)
            .region(shared_config.region().cloned())
            .endpoint_url(config.queue_endpoint.clone());
        if let Some(provider) = shared_config.credentials_provider() {
            sqs_builder = sqs_builder.credentials_provider(provider);
        }
        let client = Client::from_conf(sqs_builder.build());

        let queue_url = match client
            .get_queue_url()
            .queue_name(&config.queue_name)
            .send()
            .await
        {
            Ok(response) => response
                .queue_url()
                .ok_or_else(|| anyhow!("missing queue url"))?
                .to_string(),
            Err(SdkError::ServiceError(service_err))
                if service_err.err().is_queue_does_not_exist() =>
            {
                let created = client
                    .create_queue()
                    .queue_name(&config.queue_name)
                    .send()
                    .await?;
                created
                    .queue_url()
                    .ok_or_else(|| anyhow!("missing queue url"))?
                    .to_string()
            }
            Err(err) => return Err(anyhow!(err)),
        };

        Ok(Self {
            client,
            queue_name: config.queue_name.clone(),
            queue_url,
        })
    }

    pub fn queue_name(&self) -> &str {
        &self.queue_name
    }

    pub async fn send_verify_email_task(&self, payload: &VerifyEmailPayload) -> Result<()> {
        let body = serde_json::to_string(payload)?;
        self.client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(body)
            .send()
            .await?;

        debug!(queue = %self.queue_name, "published verify email task");
        Ok(())
    }

    /// Long-polls for a single message. A message whose body does not decode
    /// is still returned (with `payload: None`) so the caller can ack it.
    pub async fn receive_verify_email_task(&self, wait_time_seconds: i32) -> Result<Option<ReceivedTask>> {
        let response = self
            .client
            .receive_message()
            .queue_url(&self.queue_url)
            .max_number_of_messages(1)
            .wait_time_seconds(wait_time_seconds)
            .send()
            .await?;

        let message = match response.messages().first() {
            Some(message) => message,
            None => return Ok(None),
        };

        let receipt_handle = match message.receipt_handle() {
            Some(handle) => handle.to_string(),
            None => {
                warn!("queue message missing receipt handle");
                return Ok(None);
            }
        };

        let payload = match message.body().map(serde_json::from_str::<VerifyEmailPayload>) {
            Some(Ok(payload)) => Some(payload),
            Some(Err(err)) => {
                warn!(error = ?err, "failed to parse queue message body");
                None
            }
            None => {
                warn!("queue message missing body");
                None
            }
        };

        Ok(Some(ReceivedTask {
            payload,
            receipt_handle,
        }))
    }

    pub async fn delete_message(&self, receipt_handle: &str) -> Result<()> {
        self.client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await?;

        Ok(())
    }
}
