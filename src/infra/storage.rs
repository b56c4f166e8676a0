use anyhow::{anyhow, Result};
use aws_config::meta::region::RegionProviderChain;
use aws_config::BehaviorVersion;
use aws_config::Region;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;
use url::Url;
use uuid::Uuid;

use crate::config::AppConfig;

/// A file received from a multipart upload, buffered in memory.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

#[derive(Debug, Clone)]
pub struct UploadedObject {
    pub public_link: String,
    /// Object key, used to delete the object later.
    pub external_ref: String,
}

#[derive(Clone)]
pub struct ObjectStorage {
    client: Client,
    bucket: String,
    endpoint: String,
    public_endpoint: Option<String>,
}

impl ObjectStorage {
    pub async fn new(config: &AppConfig) -> Result<Self> {
        let region_provider = RegionProviderChain::first_try(Region::new(config.s3_region.clone()));
        let shared_config = aws_config::defaults(BehaviorVersion::latest())
            .region(region_provider)
            .load()
            .await;

        let mut s3_builder = aws_sdk_s3::config::Builder::from(&shared_config)
            .region(shared_config.region().cloned())
            .endpoint_url(config.s3_endpoint.clone())
            .force_path_style(true);
        if let Some(provider) = shared_config.credentials_provider() {
            s3_builder = s3_builder.credentials_provider(provider);
        }
        let client = Client::from_conf(s3_builder.build());

        Ok(Self {
            client,
            bucket: config.s3_bucket.clone(),
            endpoint: config.s3_endpoint.clone(),
            public_endpoint: config.s3_public_endpoint.clone(),
        })
    }

    pub async fn ensure_bucket(&self) -> Result<()> {
        if self.client.head_bucket().bucket(&self.bucket).send().await.is_ok() {
            return Ok(());
        }
        self.client.create_bucket().bucket(&self.bucket).send().await?;
        Ok(())
    }

    /// Uploads an image under `folder/`. The payload must be a recognizable
    /// image; its detected format decides the stored content type.
    pub async fn upload(&self, folder: &str, file: &UploadFile) -> Result<UploadedObject> {
        let format = image::guess_format(&file.data)
            .map_err(|err| anyhow!("unsupported upload: {}", err))?;
        let extension = format.extensions_str().first().copied().unwrap_or("bin");
        let key = object_key(folder, extension);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(format.to_mime_type())
            .body(ByteStream::from(file.data.clone()))
            .send()
            .await?;

        let public_link = public_object_url(
            self.public_endpoint.as_deref().unwrap_or(&self.endpoint),
            &self.bucket,
            &key,
        )?;

        Ok(UploadedObject {
            public_link,
            external_ref: key,
        })
    }

    pub async fn delete(&self, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await?;
        Ok(())
    }
}

fn object_key(folder: &str, extension: &str) -> String {
    let folder = folder.trim_matches('/');
    if folder.is_empty() {
        format!("{}.{}", Uuid::new_v4(), extension)
    } else {
        format!("{}/{}.{}", folder, Uuid::new_v4(), extension)
    }
}

fn public_object_url(endpoint: &str, bucket: &str, key: &str) -> Result<String> {
    let mut url = if endpoint.contains("://") {
        Url::parse(endpoint)?
    } else {
        Url::parse(&format!("http://{}", endpoint))?
    };
    url.path_segments_mut()
        .map_err(|_| anyhow!("endpoint cannot be a base URL"))?
        .pop_if_empty()
        .push(bucket)
        .extend(key.split('/'));
    Ok(url.to_string())
}
