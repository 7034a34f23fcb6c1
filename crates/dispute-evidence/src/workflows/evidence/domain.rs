use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::catalog::{ACCEPTED_EXTENSIONS, ADVISORY_MAX_FILE_BYTES};

/// Checklist slot key, unique within a dispute category (e.g. `land_deed`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotType(pub String);

impl SlotType {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SlotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SlotType {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Record identity. A record starts with a locally generated provisional id and
/// is re-keyed exactly once, when the verification service issues its own id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DocumentId {
    Provisional(String),
    Issued(String),
}

impl DocumentId {
    pub fn as_str(&self) -> &str {
        match self {
            DocumentId::Provisional(value) | DocumentId::Issued(value) => value,
        }
    }

    pub fn is_provisional(&self) -> bool {
        matches!(self, DocumentId::Provisional(_))
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Content-addressed integrity hash returned once the service commits a file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(pub String);

impl ContentHash {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One entry of a category checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSlotSpec {
    pub slot_type: SlotType,
    pub label: String,
    pub required: bool,
}

impl DocumentSlotSpec {
    pub fn new(slot_type: &str, label: &str, required: bool) -> Self {
        Self {
            slot_type: SlotType::new(slot_type),
            label: label.to_string(),
            required,
        }
    }
}

/// Flat extraction status used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ExtractionStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ExtractionStatus::Pending => "pending",
            ExtractionStatus::Processing => "processing",
            ExtractionStatus::Completed => "completed",
            ExtractionStatus::Failed => "failed",
        }
    }
}

/// What the extraction stage learned about the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedInfo {
    pub detected_type: String,
    pub keywords: Vec<String>,
    pub is_relevant: bool,
}

/// Extraction progress. Confidence and extracted info only exist on `Completed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExtractionState {
    Pending,
    Processing,
    Completed { confidence: f64, info: ExtractedInfo },
    Failed,
}

impl ExtractionState {
    pub fn status(&self) -> ExtractionStatus {
        match self {
            ExtractionState::Pending => ExtractionStatus::Pending,
            ExtractionState::Processing => ExtractionStatus::Processing,
            ExtractionState::Completed { .. } => ExtractionStatus::Completed,
            ExtractionState::Failed => ExtractionStatus::Failed,
        }
    }

    pub fn confidence(&self) -> Option<f64> {
        match self {
            ExtractionState::Completed { confidence, .. } => Some(*confidence),
            _ => None,
        }
    }

    pub fn info(&self) -> Option<&ExtractedInfo> {
        match self {
            ExtractionState::Completed { info, .. } => Some(info),
            _ => None,
        }
    }
}

/// Verification progress. Only ever moves forward; `Verified` and `Rejected` are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VerificationStatus {
    Pending,
    ExtractionProcessed,
    LegalReview,
    Verified,
    Rejected,
}

impl VerificationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::ExtractionProcessed => "extraction-processed",
            VerificationStatus::LegalReview => "legal-review",
            VerificationStatus::Verified => "verified",
            VerificationStatus::Rejected => "rejected",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            VerificationStatus::Verified | VerificationStatus::Rejected
        )
    }

    /// `pending → extraction-processed → [legal-review] → verified | rejected`.
    pub fn can_advance_to(self, next: VerificationStatus) -> bool {
        use VerificationStatus::*;

        matches!(
            (self, next),
            (Pending, ExtractionProcessed)
                | (ExtractionProcessed, LegalReview | Verified | Rejected)
                | (LegalReview, Verified | Rejected)
        )
    }
}

/// Sharing scope stamped on a record when it is submitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Visibility {
    Private,
    #[default]
    SharedWithReviewer,
    Public,
}

impl Visibility {
    pub const fn label(self) -> &'static str {
        match self {
            Visibility::Private => "private",
            Visibility::SharedWithReviewer => "shared-with-reviewer",
            Visibility::Public => "public",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown visibility '{0}'")]
pub struct ParseVisibilityError(pub String);

impl FromStr for Visibility {
    type Err = ParseVisibilityError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "private" => Ok(Visibility::Private),
            "shared-with-reviewer" | "shared_with_reviewer" | "shared" => {
                Ok(Visibility::SharedWithReviewer)
            }
            "public" => Ok(Visibility::Public),
            _ => Err(ParseVisibilityError(value.to_string())),
        }
    }
}

/// Dispute the uploads belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisputeContext {
    pub category: String,
    pub dispute_id: Option<String>,
}

impl DisputeContext {
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            dispute_id: None,
        }
    }

    pub fn with_dispute_id(mut self, dispute_id: impl Into<String>) -> Self {
        self.dispute_id = Some(dispute_id.into());
        self
    }
}

/// Raw file selected by the caller for a slot.
#[derive(Clone, PartialEq, Eq)]
pub struct EvidenceFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

impl EvidenceFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn extension(&self) -> Option<String> {
        Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
    }

    /// Picker-level constraints. These are informational; the service decides.
    pub fn advisories(&self) -> Vec<FileAdvisory> {
        let mut notes = Vec::new();
        if self.size_bytes() > ADVISORY_MAX_FILE_BYTES {
            notes.push(FileAdvisory::ExceedsAdvisorySize {
                size_bytes: self.size_bytes(),
                limit_bytes: ADVISORY_MAX_FILE_BYTES,
            });
        }
        let extension = self.extension();
        let accepted = extension
            .as_deref()
            .is_some_and(|ext| ACCEPTED_EXTENSIONS.contains(&ext));
        if !accepted {
            notes.push(FileAdvisory::UnrecognizedExtension { extension });
        }
        notes
    }
}

impl fmt::Debug for EvidenceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvidenceFile")
            .field("file_name", &self.file_name)
            .field("size_bytes", &self.bytes.len())
            .field("content_type", &self.content_type)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileAdvisory {
    ExceedsAdvisorySize { size_bytes: u64, limit_bytes: u64 },
    UnrecognizedExtension { extension: Option<String> },
}

impl fmt::Display for FileAdvisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileAdvisory::ExceedsAdvisorySize {
                size_bytes,
                limit_bytes,
            } => write!(
                f,
                "file is {size_bytes} bytes, above the advisory limit of {limit_bytes}"
            ),
            FileAdvisory::UnrecognizedExtension { extension: Some(ext) } => {
                write!(f, "extension '.{ext}' is not in the accepted list")
            }
            FileAdvisory::UnrecognizedExtension { extension: None } => {
                write!(f, "file has no extension")
            }
        }
    }
}

/// Per-slot document tracked through the verification pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: DocumentId,
    pub file_name: String,
    pub file_size_bytes: u64,
    pub slot_type: SlotType,
    pub extraction: ExtractionState,
    pub content_hash: Option<ContentHash>,
    pub verification_status: VerificationStatus,
    pub visibility: Visibility,
    pub submitted_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl DocumentRecord {
    /// Optimistic record inserted before the remote call is issued.
    pub fn provisional(
        id: DocumentId,
        file: &EvidenceFile,
        slot_type: SlotType,
        visibility: Visibility,
    ) -> Self {
        Self {
            id,
            file_name: file.file_name.clone(),
            file_size_bytes: file.size_bytes(),
            slot_type,
            extraction: ExtractionState::Processing,
            content_hash: None,
            verification_status: VerificationStatus::Pending,
            visibility,
            submitted_at: Utc::now(),
            resolved_at: None,
        }
    }

    /// The failure image of a provisional record: extraction failed, nothing else learned.
    pub fn failed(&self) -> Self {
        Self {
            extraction: ExtractionState::Failed,
            content_hash: None,
            resolved_at: Some(Utc::now()),
            ..self.clone()
        }
    }

    /// Still waiting on the verification service.
    pub fn is_in_flight(&self) -> bool {
        self.id.is_provisional() && self.extraction == ExtractionState::Processing
    }

    /// The service accepted the file and issued its own id.
    pub fn is_committed(&self) -> bool {
        !self.id.is_provisional()
    }

    pub fn extraction_status(&self) -> ExtractionStatus {
        self.extraction.status()
    }

    pub fn extraction_confidence(&self) -> Option<f64> {
        self.extraction.confidence()
    }

    pub fn extracted_info(&self) -> Option<&ExtractedInfo> {
        self.extraction.info()
    }
}
