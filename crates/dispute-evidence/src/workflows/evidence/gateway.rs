//! Contract with the remote verification service (extraction, content
//! hashing, legal review routing) and the HTTP client that speaks it.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info};

use super::domain::{EvidenceFile, SlotType, Visibility};
use crate::config::VerificationConfig;

/// Everything the service needs to verify one upload.
#[derive(Debug, Clone)]
pub struct VerificationRequest {
    pub file: EvidenceFile,
    pub document_type: SlotType,
    pub dispute_type: String,
    pub visibility: Visibility,
    pub dispute_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<VerifiedDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extraction: Option<ExtractionReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_addressing: Option<ContentAddressing>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedDocument {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub document_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionReport {
    #[serde(default)]
    pub extracted: bool,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub analysis: Option<ExtractionAnalysis>,
    #[serde(default)]
    pub relevance_check: Option<RelevanceCheck>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionAnalysis {
    #[serde(default)]
    pub suggested_type: Option<String>,
    #[serde(default)]
    pub keywords_found: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelevanceCheck {
    #[serde(default)]
    pub is_relevant: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentAddressing {
    pub hash: String,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Text(value) => Ok(value),
        RawId::Number(value) => Ok(value.to_string()),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("verification request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("verification service returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("verification response was not understood: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Seam between the orchestrator and the verification backend.
#[async_trait]
pub trait VerificationGateway: Send + Sync {
    async fn verify(
        &self,
        request: VerificationRequest,
    ) -> Result<VerificationResponse, GatewayError>;
}

/// Multipart HTTP client for the verification service upload endpoint.
#[derive(Debug, Clone)]
pub struct HttpVerificationClient {
    client: reqwest::Client,
    upload_url: String,
    api_token: Option<String>,
}

impl HttpVerificationClient {
    pub fn new(upload_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            upload_url: upload_url.into(),
            api_token: None,
        }
    }

    pub fn from_config(config: &VerificationConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            upload_url: config.upload_url(),
            api_token: config.api_token.clone(),
        }
    }

    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    pub fn upload_url(&self) -> &str {
        &self.upload_url
    }

    fn build_form(request: VerificationRequest) -> Result<Form, GatewayError> {
        let VerificationRequest {
            file,
            document_type,
            dispute_type,
            visibility,
            dispute_id,
        } = request;

        let content_type = file.content_type.clone().unwrap_or_else(|| {
            mime_guess::from_path(&file.file_name)
                .first_or(mime::APPLICATION_OCTET_STREAM)
                .to_string()
        });
        let part = Part::bytes(file.bytes)
            .file_name(file.file_name)
            .mime_str(&content_type)?;

        let mut form = Form::new()
            .part("file", part)
            .text("documentType", document_type.0)
            .text("disputeType", dispute_type)
            .text("visibility", visibility.label());
        if let Some(dispute_id) = dispute_id {
            form = form.text("disputeId", dispute_id);
        }
        Ok(form)
    }
}

#[async_trait]
impl VerificationGateway for HttpVerificationClient {
    async fn verify(
        &self,
        request: VerificationRequest,
    ) -> Result<VerificationResponse, GatewayError> {
        info!(
            url = %self.upload_url,
            slot = %request.document_type,
            file_name = %request.file.file_name,
            size_bytes = request.file.size_bytes(),
            "sending document to verification service"
        );

        let form = Self::build_form(request)?;
        let mut builder = self.client.post(&self.upload_url).multipart(form);
        if let Some(token) = &self.api_token {
            builder = builder.bearer_auth(token);
        }

        let resp = builder.send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(GatewayError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: VerificationResponse = serde_json::from_str(&body)?;
        debug!(success = parsed.success, "verification response decoded");
        Ok(parsed)
    }
}
