//! Per-dispute evidence checklist: catalog lookup, optimistic upload
//! orchestration against the verification service, and progress summaries.

pub mod catalog;
pub mod domain;
pub mod gateway;
mod observer;
pub mod registry;
pub mod service;
mod session;
pub mod summary;
mod visibility;

#[cfg(test)]
mod tests;

pub use catalog::{CatalogError, DocumentCatalog, ACCEPTED_EXTENSIONS, ADVISORY_MAX_FILE_BYTES};
pub use domain::{
    ContentHash, DisputeContext, DocumentId, DocumentRecord, DocumentSlotSpec, EvidenceFile,
    ExtractedInfo, ExtractionState, ExtractionStatus, FileAdvisory, ParseVisibilityError,
    SlotType, VerificationStatus, Visibility,
};
pub use gateway::{
    GatewayError, HttpVerificationClient, VerificationGateway, VerificationRequest,
    VerificationResponse,
};
pub use observer::RegistryObserver;
pub use registry::DocumentRegistry;
pub use service::{
    EvidenceIntakeService, PendingUpload, ReviewError, SubmitError, UploadOutcome,
    UploadOutcomeKind,
};
pub use session::DisputeSession;
pub use summary::{slot_views, EvidenceSummary, SlotView};
pub use visibility::VisibilitySelector;
