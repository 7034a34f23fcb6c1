use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::workflows::evidence::catalog::DocumentCatalog;
use crate::workflows::evidence::domain::{
    ContentHash, DisputeContext, DocumentId, DocumentRecord, EvidenceFile, ExtractedInfo,
    ExtractionState, SlotType, VerificationStatus, Visibility,
};
use crate::workflows::evidence::gateway::{
    ContentAddressing, ExtractionAnalysis, ExtractionReport, GatewayError, RelevanceCheck,
    VerificationGateway, VerificationRequest, VerificationResponse, VerifiedDocument,
};
use crate::workflows::evidence::observer::RegistryObserver;
use crate::workflows::evidence::session::DisputeSession;

pub(super) const TWO_MIB: usize = 2 * 1024 * 1024;

pub(super) fn mutual_partition() -> DisputeContext {
    DisputeContext::new("mutual-partition").with_dispute_id("case-2025-0142")
}

pub(super) fn land_deed() -> SlotType {
    SlotType::new("land_deed")
}

pub(super) fn survey_map() -> SlotType {
    SlotType::new("survey_map")
}

pub(super) fn deed_file() -> EvidenceFile {
    EvidenceFile::new("deed.pdf", vec![0x25; TWO_MIB])
}

pub(super) fn small_file(name: &str) -> EvidenceFile {
    EvidenceFile::new(name, b"%PDF-1.7 sample".to_vec())
}

/// The deed scenario: committed, extracted, relevant, hashed.
pub(super) fn deed_success_response() -> VerificationResponse {
    VerificationResponse {
        success: true,
        document: Some(VerifiedDocument {
            id: "d1".to_string(),
            file_name: Some("deed.pdf".to_string()),
            file_size: Some(TWO_MIB as u64),
            document_type: Some("land_deed".to_string()),
        }),
        extraction: Some(ExtractionReport {
            extracted: true,
            confidence: Some(92.5),
            analysis: Some(ExtractionAnalysis {
                suggested_type: Some("land_deed".to_string()),
                keywords_found: Some(vec!["survey".to_string(), "registry".to_string()]),
            }),
            relevance_check: Some(RelevanceCheck {
                is_relevant: Some(true),
            }),
        }),
        content_addressing: Some(ContentAddressing {
            hash: "abc123".to_string(),
        }),
    }
}

pub(super) fn committed_response(id: &str, hash: &str) -> VerificationResponse {
    let mut response = deed_success_response();
    if let Some(document) = response.document.as_mut() {
        document.id = id.to_string();
    }
    response.content_addressing = Some(ContentAddressing {
        hash: hash.to_string(),
    });
    response
}

pub(super) fn extraction_failed_response(id: &str, hash: &str) -> VerificationResponse {
    let mut response = committed_response(id, hash);
    response.extraction = Some(ExtractionReport {
        extracted: false,
        ..ExtractionReport::default()
    });
    response
}

pub(super) fn rejected_response() -> VerificationResponse {
    VerificationResponse {
        success: false,
        ..VerificationResponse::default()
    }
}

/// A committed record built directly, for registry and summary tests.
pub(super) fn committed_record(slot: &str, id: &str, hash: Option<&str>) -> DocumentRecord {
    let file = small_file(&format!("{slot}.pdf"));
    let mut record = DocumentRecord::provisional(
        DocumentId::Provisional(format!("tmp-{slot}")),
        &file,
        SlotType::new(slot),
        Visibility::SharedWithReviewer,
    );
    record.id = DocumentId::Issued(id.to_string());
    record.extraction = ExtractionState::Completed {
        confidence: 80.0,
        info: ExtractedInfo {
            detected_type: slot.to_string(),
            keywords: Vec::new(),
            is_relevant: true,
        },
    };
    record.content_hash = hash.map(|value| ContentHash(value.to_string()));
    record.verification_status = VerificationStatus::ExtractionProcessed;
    record
}

pub(super) fn provisional_record(slot: &str, id: &str) -> DocumentRecord {
    DocumentRecord::provisional(
        DocumentId::Provisional(id.to_string()),
        &small_file(&format!("{slot}.pdf")),
        SlotType::new(slot),
        Visibility::SharedWithReviewer,
    )
}

#[derive(Debug, Clone, Copy)]
pub(super) enum ScriptedFailure {
    Unavailable,
    Garbled,
}

type Scripted = Result<VerificationResponse, ScriptedFailure>;

/// Gateway answering from per-slot scripts, optionally holding a slot's
/// answer until its gate is opened.
#[derive(Default)]
pub(super) struct ScriptedGateway {
    scripts: Mutex<HashMap<SlotType, VecDeque<Scripted>>>,
    gates: Mutex<HashMap<SlotType, Arc<Notify>>>,
    requests: Mutex<Vec<VerificationRequest>>,
}

impl ScriptedGateway {
    pub(super) fn respond(&self, slot: &SlotType, response: VerificationResponse) {
        self.push(slot, Ok(response));
    }

    pub(super) fn fail(&self, slot: &SlotType, failure: ScriptedFailure) {
        self.push(slot, Err(failure));
    }

    /// Holds the slot's answer until the returned handle is notified.
    pub(super) fn gate(&self, slot: &SlotType) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.gates
            .lock()
            .expect("gate mutex poisoned")
            .insert(slot.clone(), notify.clone());
        notify
    }

    pub(super) fn requests(&self) -> Vec<VerificationRequest> {
        self.requests.lock().expect("request mutex poisoned").clone()
    }

    fn push(&self, slot: &SlotType, scripted: Scripted) {
        self.scripts
            .lock()
            .expect("script mutex poisoned")
            .entry(slot.clone())
            .or_default()
            .push_back(scripted);
    }
}

#[async_trait]
impl VerificationGateway for ScriptedGateway {
    async fn verify(
        &self,
        request: VerificationRequest,
    ) -> Result<VerificationResponse, GatewayError> {
        let slot = request.document_type.clone();
        self.requests
            .lock()
            .expect("request mutex poisoned")
            .push(request);

        let gate = self
            .gates
            .lock()
            .expect("gate mutex poisoned")
            .get(&slot)
            .cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let scripted = self
            .scripts
            .lock()
            .expect("script mutex poisoned")
            .get_mut(&slot)
            .and_then(VecDeque::pop_front);

        match scripted {
            Some(Ok(response)) => Ok(response),
            Some(Err(ScriptedFailure::Garbled)) => {
                let err = serde_json::from_str::<VerificationResponse>("<html>502</html>")
                    .expect_err("html is not json");
                Err(GatewayError::Decode(err))
            }
            Some(Err(ScriptedFailure::Unavailable)) | None => Err(GatewayError::Server {
                status: 503,
                body: "verification backend unavailable".to_string(),
            }),
        }
    }
}

#[derive(Default)]
pub(super) struct RecordingObserver {
    snapshots: Mutex<Vec<Vec<DocumentRecord>>>,
}

impl RecordingObserver {
    pub(super) fn snapshots(&self) -> Vec<Vec<DocumentRecord>> {
        self.snapshots
            .lock()
            .expect("observer mutex poisoned")
            .clone()
    }

    pub(super) fn count(&self) -> usize {
        self.snapshots.lock().expect("observer mutex poisoned").len()
    }

    pub(super) fn last(&self) -> Vec<DocumentRecord> {
        self.snapshots().pop().unwrap_or_default()
    }
}

impl RegistryObserver for RecordingObserver {
    fn documents_changed(&self, documents: &[DocumentRecord]) {
        self.snapshots
            .lock()
            .expect("observer mutex poisoned")
            .push(documents.to_vec());
    }
}

pub(super) fn build_session() -> (
    DisputeSession<ScriptedGateway>,
    Arc<ScriptedGateway>,
    Arc<RecordingObserver>,
) {
    let gateway = Arc::new(ScriptedGateway::default());
    let observer = Arc::new(RecordingObserver::default());
    let mut session = DisputeSession::new(
        mutual_partition(),
        &DocumentCatalog::standard(),
        gateway.clone(),
    );
    session.subscribe(observer.clone());
    (session, gateway, observer)
}
