use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tracing::{debug, info, warn};

use super::domain::{
    ContentHash, DisputeContext, DocumentId, DocumentRecord, EvidenceFile, ExtractedInfo,
    ExtractionState, SlotType, VerificationStatus, Visibility,
};
use super::gateway::{
    ExtractionReport, VerificationGateway, VerificationRequest, VerificationResponse,
};
use super::observer::RegistryObserver;
use super::registry::DocumentRegistry;

static PROVISIONAL_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_provisional_id() -> DocumentId {
    let id = PROVISIONAL_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    DocumentId::Provisional(format!("tmp-{id:06}"))
}

/// Drives each upload through the optimistic provisional record, the remote
/// verification call, and the reconciliation back into the registry.
pub struct EvidenceIntakeService<G: ?Sized> {
    registry: Arc<Mutex<DocumentRegistry>>,
    gateway: Arc<G>,
    observers: Vec<Arc<dyn RegistryObserver>>,
}

/// An upload whose provisional record is in the registry but whose remote
/// call has not been issued yet.
#[derive(Debug)]
pub struct PendingUpload {
    provisional: DocumentRecord,
    request: VerificationRequest,
}

impl PendingUpload {
    pub fn provisional_id(&self) -> &DocumentId {
        &self.provisional.id
    }

    pub fn slot_type(&self) -> &SlotType {
        &self.provisional.slot_type
    }

    pub fn record(&self) -> &DocumentRecord {
        &self.provisional
    }
}

/// How an upload ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcomeKind {
    /// Committed with extraction completed.
    Resolved,
    /// Committed, but the extraction stage failed.
    ExtractionFailed,
    /// The service answered with `success = false` or an unusable success body.
    ServiceRejected,
    /// No interpretable answer (network error, bad status, undecodable body).
    TransportFailed,
    /// The provisional record was removed or superseded while in flight; the
    /// answer was dropped and the registry left alone.
    Discarded,
}

impl UploadOutcomeKind {
    pub const fn label(self) -> &'static str {
        match self {
            UploadOutcomeKind::Resolved => "resolved",
            UploadOutcomeKind::ExtractionFailed => "extraction_failed",
            UploadOutcomeKind::ServiceRejected => "service_rejected",
            UploadOutcomeKind::TransportFailed => "transport_failed",
            UploadOutcomeKind::Discarded => "discarded",
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub record: DocumentRecord,
    pub kind: UploadOutcomeKind,
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("slot '{slot_type}' already has an upload in flight")]
    SlotInFlight { slot_type: SlotType },
}

#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("no document occupies slot '{slot_type}'")]
    EmptySlot { slot_type: SlotType },
    #[error("document in slot '{slot_type}' has not been committed by the verification service")]
    NotCommitted { slot_type: SlotType },
    #[error("document in slot '{slot_type}' cannot move from {from} to {to}")]
    InvalidTransition {
        slot_type: SlotType,
        from: &'static str,
        to: &'static str,
    },
}

impl<G> EvidenceIntakeService<G>
where
    G: VerificationGateway + ?Sized,
{
    pub fn new(gateway: Arc<G>) -> Self {
        Self::with_registry(Arc::new(Mutex::new(DocumentRegistry::new())), gateway)
    }

    pub fn with_registry(registry: Arc<Mutex<DocumentRegistry>>, gateway: Arc<G>) -> Self {
        Self {
            registry,
            gateway,
            observers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, observer: Arc<dyn RegistryObserver>) {
        self.observers.push(observer);
    }

    /// Submit a file for a slot and wait for the verification service to answer.
    pub async fn submit(
        &self,
        file: EvidenceFile,
        slot_type: SlotType,
        visibility: Visibility,
        context: &DisputeContext,
    ) -> Result<UploadOutcome, SubmitError> {
        let pending = self.begin(file, slot_type, visibility, context)?;
        Ok(self.complete(pending).await)
    }

    /// Synchronous half of a submission: puts the provisional record in place
    /// before any network traffic. A slot holding a finished record is
    /// superseded; a slot with an upload still in flight is refused.
    pub fn begin(
        &self,
        file: EvidenceFile,
        slot_type: SlotType,
        visibility: Visibility,
        context: &DisputeContext,
    ) -> Result<PendingUpload, SubmitError> {
        for advisory in file.advisories() {
            warn!(
                slot = %slot_type,
                file_name = %file.file_name,
                %advisory,
                "file is outside the advertised picker constraints"
            );
        }

        let provisional =
            DocumentRecord::provisional(next_provisional_id(), &file, slot_type.clone(), visibility);

        let displaced = {
            let mut registry = self.lock_registry();
            if registry
                .get(&slot_type)
                .is_some_and(DocumentRecord::is_in_flight)
            {
                return Err(SubmitError::SlotInFlight { slot_type });
            }
            registry.upsert(provisional.clone())
        };

        info!(
            slot = %slot_type,
            document_id = %provisional.id,
            file_name = %provisional.file_name,
            visibility = visibility.label(),
            "provisional document recorded"
        );

        if let Some(previous) = displaced {
            info!(
                slot = %slot_type,
                document_id = %previous.id,
                "superseded previous document for slot"
            );
            self.notify();
        }

        let request = VerificationRequest {
            file,
            document_type: slot_type,
            dispute_type: context.category.clone(),
            visibility,
            dispute_id: context.dispute_id.clone(),
        };

        Ok(PendingUpload {
            provisional,
            request,
        })
    }

    /// Remote half of a submission: issues exactly one verification request and
    /// swaps the outcome in for the provisional record.
    pub async fn complete(&self, pending: PendingUpload) -> UploadOutcome {
        let PendingUpload {
            provisional,
            request,
        } = pending;

        let (record, kind) = match self.gateway.verify(request).await {
            Ok(response) => reconcile(&provisional, response),
            Err(err) => {
                warn!(
                    slot = %provisional.slot_type,
                    document_id = %provisional.id,
                    error = %err,
                    "verification request failed"
                );
                (provisional.failed(), UploadOutcomeKind::TransportFailed)
            }
        };

        let applied = self
            .lock_registry()
            .replace_provisional(&provisional.id, record.clone());
        if !applied {
            warn!(
                slot = %provisional.slot_type,
                document_id = %provisional.id,
                "provisional document no longer present; dropping verification result"
            );
            return UploadOutcome {
                record,
                kind: UploadOutcomeKind::Discarded,
            };
        }

        match kind {
            UploadOutcomeKind::Resolved | UploadOutcomeKind::ExtractionFailed => info!(
                slot = %record.slot_type,
                provisional_id = %provisional.id,
                document_id = %record.id,
                extraction = record.extraction_status().label(),
                hash_secured = record.content_hash.is_some(),
                "document committed by verification service"
            ),
            _ => warn!(
                slot = %record.slot_type,
                document_id = %record.id,
                outcome = kind.label(),
                "document upload failed"
            ),
        }

        self.notify();
        UploadOutcome { record, kind }
    }

    pub fn remove_by_slot(&self, slot_type: &SlotType) -> Option<DocumentRecord> {
        let removed = self.lock_registry().remove_by_slot(slot_type)?;
        info!(slot = %slot_type, document_id = %removed.id, "document removed");
        self.notify();
        Some(removed)
    }

    pub fn remove_by_id(&self, id: &DocumentId) -> Option<DocumentRecord> {
        let removed = self.lock_registry().remove_by_id(id)?;
        info!(slot = %removed.slot_type, document_id = %id, "document removed");
        self.notify();
        Some(removed)
    }

    /// Records a legal-review transition reported for a committed document.
    pub fn apply_review(
        &self,
        slot_type: &SlotType,
        status: VerificationStatus,
    ) -> Result<DocumentRecord, ReviewError> {
        let updated = {
            let mut registry = self.lock_registry();
            let current = registry
                .get(slot_type)
                .ok_or_else(|| ReviewError::EmptySlot {
                    slot_type: slot_type.clone(),
                })?;
            if !current.is_committed() {
                return Err(ReviewError::NotCommitted {
                    slot_type: slot_type.clone(),
                });
            }
            if !current.verification_status.can_advance_to(status) {
                return Err(ReviewError::InvalidTransition {
                    slot_type: slot_type.clone(),
                    from: current.verification_status.label(),
                    to: status.label(),
                });
            }

            let updated = DocumentRecord {
                verification_status: status,
                ..current.clone()
            };
            registry.upsert(updated.clone());
            updated
        };

        info!(
            slot = %slot_type,
            document_id = %updated.id,
            status = status.label(),
            "legal review status recorded"
        );
        self.notify();
        Ok(updated)
    }

    pub fn get(&self, slot_type: &SlotType) -> Option<DocumentRecord> {
        self.lock_registry().get(slot_type).cloned()
    }

    /// Every record, in flight or not, in insertion order.
    pub fn snapshot(&self) -> Vec<DocumentRecord> {
        self.lock_registry().list().to_vec()
    }

    /// The records observers are told about.
    pub fn resolved_snapshot(&self) -> Vec<DocumentRecord> {
        self.lock_registry().resolved()
    }

    fn lock_registry(&self) -> MutexGuard<'_, DocumentRegistry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self) {
        if self.observers.is_empty() {
            return;
        }
        let snapshot = self.resolved_snapshot();
        debug!(
            observers = self.observers.len(),
            documents = snapshot.len(),
            "publishing registry snapshot"
        );
        for observer in &self.observers {
            observer.documents_changed(&snapshot);
        }
    }
}

fn reconcile(
    provisional: &DocumentRecord,
    response: VerificationResponse,
) -> (DocumentRecord, UploadOutcomeKind) {
    let VerificationResponse {
        success,
        document,
        extraction,
        content_addressing,
    } = response;

    let document = match document {
        Some(document) if success => document,
        _ => {
            warn!(
                slot = %provisional.slot_type,
                document_id = %provisional.id,
                success,
                "verification service did not commit the document"
            );
            return (provisional.failed(), UploadOutcomeKind::ServiceRejected);
        }
    };

    let extraction = extraction_state(&provisional.slot_type, extraction);
    let kind = match extraction {
        ExtractionState::Completed { .. } => UploadOutcomeKind::Resolved,
        _ => UploadOutcomeKind::ExtractionFailed,
    };
    let content_hash = content_addressing
        .map(|addressing| addressing.hash)
        .filter(|hash| !hash.trim().is_empty())
        .map(ContentHash);

    let record = DocumentRecord {
        id: DocumentId::Issued(document.id),
        file_name: provisional.file_name.clone(),
        file_size_bytes: provisional.file_size_bytes,
        slot_type: provisional.slot_type.clone(),
        extraction,
        content_hash,
        verification_status: VerificationStatus::ExtractionProcessed,
        visibility: provisional.visibility,
        submitted_at: provisional.submitted_at,
        resolved_at: Some(Utc::now()),
    };
    (record, kind)
}

fn extraction_state(slot_type: &SlotType, report: Option<ExtractionReport>) -> ExtractionState {
    let Some(report) = report.filter(|report| report.extracted) else {
        return ExtractionState::Failed;
    };

    let analysis = report.analysis.unwrap_or_default();
    let info = ExtractedInfo {
        detected_type: analysis
            .suggested_type
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| slot_type.to_string()),
        keywords: analysis.keywords_found.unwrap_or_default(),
        is_relevant: report
            .relevance_check
            .and_then(|check| check.is_relevant)
            .unwrap_or(false),
    };

    ExtractionState::Completed {
        confidence: report.confidence.unwrap_or(0.0),
        info,
    }
}
