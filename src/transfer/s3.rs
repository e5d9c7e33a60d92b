//! S3 implementation of the [`ObjectStore`] contract.
//!
//! Bags are submitted one at a time, so the async AWS SDK is driven
//! synchronously through an owned runtime rather than threading async
//! through the whole submission path.

use crate::error::{Error, Result};
use crate::transfer::store::{ObjectStore, PartTag, RemoteObject};
use aws_config::meta::region::RegionProviderChain;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use aws_sdk_s3::Client;
use aws_smithy_types::byte_stream::Length;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, SystemTime};
use tokio::runtime::Runtime;

/// Connection settings for S3 and S3-compatible stores
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3StoreConfig {
    /// Bucket receiving submitted bags
    pub bucket: String,

    /// AWS region (credential-chain default when absent)
    #[serde(default)]
    pub region: Option<String>,

    /// Custom endpoint URL for S3-compatible services such as MinIO
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Explicit access key (credential chain when absent)
    #[serde(default)]
    pub access_key: Option<String>,

    /// Explicit secret key
    #[serde(default)]
    pub secret_key: Option<String>,

    /// Session token for temporary credentials
    #[serde(default)]
    pub session_token: Option<String>,

    /// Path-style addressing, required by some S3-compatible services
    #[serde(default)]
    pub force_path_style: bool,

    /// Per-operation timeout
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_timeout_seconds() -> u64 {
    300
}

impl S3StoreConfig {
    pub fn new<S: Into<String>>(bucket: S) -> Self {
        Self {
            bucket: bucket.into(),
            region: None,
            endpoint: None,
            access_key: None,
            secret_key: None,
            session_token: None,
            force_path_style: false,
            timeout_seconds: default_timeout_seconds(),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.bucket.is_empty() {
            return Err(Error::config("S3 bucket name must not be empty"));
        }
        Ok(())
    }
}

/// S3-backed [`ObjectStore`]
pub struct S3Store {
    client: Client,
    bucket: String,
    runtime: Runtime,
}

impl S3Store {
    /// Build the SDK client and connect
    pub fn connect(config: S3StoreConfig) -> Result<Self> {
        config.validate()?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::config(format!("failed to start S3 runtime: {}", e)))?;

        let client = runtime.block_on(Self::build_client(&config));
        Ok(Self {
            client,
            bucket: config.bucket,
            runtime,
        })
    }

    async fn build_client(config: &S3StoreConfig) -> Client {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());

        let region_provider = if let Some(region) = &config.region {
            RegionProviderChain::first_try(Region::new(region.clone()))
        } else {
            RegionProviderChain::default_provider()
        };
        loader = loader.region(region_provider);

        if let (Some(access_key), Some(secret_key)) = (&config.access_key, &config.secret_key) {
            let credentials = Credentials::new(
                access_key,
                secret_key,
                config.session_token.clone(),
                None,
                "bagger-explicit",
            );
            loader = loader.credentials_provider(credentials);
        }

        let shared = loader.load().await;
        let mut builder = aws_sdk_s3::config::Builder::from(&shared);

        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }
        if config.force_path_style {
            builder = builder.force_path_style(true);
        }
        let timeout = aws_sdk_s3::config::timeout::TimeoutConfig::builder()
            .operation_timeout(Duration::from_secs(config.timeout_seconds))
            .build();
        builder = builder.timeout_config(timeout);

        Client::from_conf(builder.build())
    }

    fn transfer_err<E: std::fmt::Display>(context: &str, err: E) -> Error {
        Error::transfer(format!("{}: {}", context, err))
    }
}

impl ObjectStore for S3Store {
    fn find_object(&self, key: &str) -> Result<Option<RemoteObject>> {
        let response = self
            .runtime
            .block_on(
                self.client
                    .list_objects_v2()
                    .bucket(&self.bucket)
                    .prefix(key)
                    .send(),
            )
            .map_err(|e| Self::transfer_err("failed to list objects", e))?;

        for object in response.contents() {
            if object.key() == Some(key) {
                let last_modified = object
                    .last_modified()
                    .and_then(|t| SystemTime::try_from(*t).ok())
                    .map(DateTime::<Utc>::from);
                return Ok(Some(RemoteObject {
                    key: key.to_string(),
                    size: object.size().unwrap_or(0) as u64,
                    last_modified,
                }));
            }
        }
        Ok(None)
    }

    fn delete_object(&self, key: &str) -> Result<()> {
        self.runtime
            .block_on(
                self.client
                    .delete_object()
                    .bucket(&self.bucket)
                    .key(key)
                    .send(),
            )
            .map_err(|e| Self::transfer_err("failed to delete object", e))?;
        Ok(())
    }

    fn put_object(&self, key: &str, file: &Path) -> Result<String> {
        self.runtime.block_on(async {
            let body = ByteStream::from_path(file)
                .await
                .map_err(|e| Self::transfer_err("failed to open upload body", e))?;
            let response = self
                .client
                .put_object()
                .bucket(&self.bucket)
                .key(key)
                .body(body)
                .send()
                .await
                .map_err(|e| Self::transfer_err("failed to put object", e))?;

            // Single-shot ETags are the content MD5, quoted
            response
                .e_tag()
                .map(|t| t.trim_matches('"').to_string())
                .ok_or_else(|| Error::transfer("store returned no content digest"))
        })
    }

    fn initiate_multipart(&self, key: &str) -> Result<String> {
        let response = self
            .runtime
            .block_on(
                self.client
                    .create_multipart_upload()
                    .bucket(&self.bucket)
                    .key(key)
                    .send(),
            )
            .map_err(|e| Self::transfer_err("failed to initiate multipart upload", e))?;

        response
            .upload_id()
            .map(|id| id.to_string())
            .ok_or_else(|| Error::transfer("store returned no multipart upload id"))
    }

    fn upload_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: i32,
        file: &Path,
        offset: u64,
        length: u64,
        _last_part: bool,
    ) -> Result<PartTag> {
        self.runtime.block_on(async {
            // The window is streamed straight from the file; a 5 GiB part
            // never touches the heap in one piece
            let body = ByteStream::read_from()
                .path(file)
                .offset(offset)
                .length(Length::Exact(length))
                .build()
                .await
                .map_err(|e| {
                    Self::transfer_err(&format!("failed to open part {} body", part_number), e)
                })?;

            let response = self
                .client
                .upload_part()
                .bucket(&self.bucket)
                .key(key)
                .upload_id(upload_id)
                .part_number(part_number)
                .body(body)
                .send()
                .await
                .map_err(|e| {
                    Self::transfer_err(&format!("failed to upload part {}", part_number), e)
                })?;

            let etag = response.e_tag().ok_or_else(|| {
                Error::transfer(format!("no tag returned for part {}", part_number))
            })?;
            Ok(PartTag::new(part_number, etag))
        })
    }

    fn complete_multipart(&self, key: &str, upload_id: &str, parts: &[PartTag]) -> Result<()> {
        let completed: Vec<CompletedPart> = parts
            .iter()
            .map(|p| {
                CompletedPart::builder()
                    .part_number(p.part_number)
                    .e_tag(&p.etag)
                    .build()
            })
            .collect();

        self.runtime
            .block_on(
                self.client
                    .complete_multipart_upload()
                    .bucket(&self.bucket)
                    .key(key)
                    .upload_id(upload_id)
                    .multipart_upload(
                        CompletedMultipartUpload::builder()
                            .set_parts(Some(completed))
                            .build(),
                    )
                    .send(),
            )
            .map_err(|e| Self::transfer_err("failed to complete multipart upload", e))?;
        Ok(())
    }

    fn abort_multipart(&self, key: &str, upload_id: &str) -> Result<()> {
        self.runtime
            .block_on(
                self.client
                    .abort_multipart_upload()
                    .bucket(&self.bucket)
                    .key(key)
                    .upload_id(upload_id)
                    .send(),
            )
            .map_err(|e| Self::transfer_err("failed to abort multipart upload", e))?;
        Ok(())
    }
}
