use std::sync::Arc;

use tracing::warn;

use super::catalog::DocumentCatalog;
use super::domain::{
    DisputeContext, DocumentId, DocumentRecord, DocumentSlotSpec, EvidenceFile, SlotType,
    VerificationStatus, Visibility,
};
use super::gateway::VerificationGateway;
use super::observer::RegistryObserver;
use super::service::{
    EvidenceIntakeService, PendingUpload, ReviewError, SubmitError, UploadOutcome,
};
use super::summary::{slot_views, EvidenceSummary, SlotView};
use super::visibility::VisibilitySelector;

/// Evidence intake for a single dispute. Owns its registry; dropping the
/// session discards everything it tracked.
pub struct DisputeSession<G: ?Sized> {
    context: DisputeContext,
    slots: Vec<DocumentSlotSpec>,
    selector: VisibilitySelector,
    service: EvidenceIntakeService<G>,
}

impl<G> DisputeSession<G>
where
    G: VerificationGateway + ?Sized,
{
    pub fn new(context: DisputeContext, catalog: &DocumentCatalog, gateway: Arc<G>) -> Self {
        let slots = catalog.slots_for(&context.category).to_vec();
        if slots.is_empty() {
            warn!(
                category = %context.category,
                "dispute category has no document checklist"
            );
        }

        Self {
            context,
            slots,
            selector: VisibilitySelector::default(),
            service: EvidenceIntakeService::new(gateway),
        }
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.selector.select(visibility);
        self
    }

    pub fn subscribe(&mut self, observer: Arc<dyn RegistryObserver>) {
        self.service.subscribe(observer);
    }

    pub fn context(&self) -> &DisputeContext {
        &self.context
    }

    pub fn slots(&self) -> &[DocumentSlotSpec] {
        &self.slots
    }

    pub fn visibility(&self) -> Visibility {
        self.selector.current()
    }

    /// Applies to uploads submitted from now on.
    pub fn select_visibility(&mut self, visibility: Visibility) {
        self.selector.select(visibility);
    }

    /// Upload under the currently selected visibility and wait for the result.
    pub async fn upload(
        &self,
        file: EvidenceFile,
        slot_type: SlotType,
    ) -> Result<UploadOutcome, SubmitError> {
        let pending = self.begin_upload(file, slot_type)?;
        Ok(self.service.complete(pending).await)
    }

    pub fn begin_upload(
        &self,
        file: EvidenceFile,
        slot_type: SlotType,
    ) -> Result<PendingUpload, SubmitError> {
        if !self.is_checklist_slot(&slot_type) {
            warn!(
                category = %self.context.category,
                slot = %slot_type,
                "uploading to a slot outside the category checklist"
            );
        }
        self.service
            .begin(file, slot_type, self.selector.current(), &self.context)
    }

    pub async fn complete_upload(&self, pending: PendingUpload) -> UploadOutcome {
        self.service.complete(pending).await
    }

    pub fn remove_slot(&self, slot_type: &SlotType) -> Option<DocumentRecord> {
        self.service.remove_by_slot(slot_type)
    }

    pub fn remove_document(&self, id: &DocumentId) -> Option<DocumentRecord> {
        self.service.remove_by_id(id)
    }

    pub fn apply_review(
        &self,
        slot_type: &SlotType,
        status: VerificationStatus,
    ) -> Result<DocumentRecord, ReviewError> {
        self.service.apply_review(slot_type, status)
    }

    pub fn document(&self, slot_type: &SlotType) -> Option<DocumentRecord> {
        self.service.get(slot_type)
    }

    pub fn documents(&self) -> Vec<DocumentRecord> {
        self.service.snapshot()
    }

    pub fn summary(&self) -> EvidenceSummary {
        EvidenceSummary::compute(&self.slots, &self.service.snapshot())
    }

    pub fn slot_views(&self) -> Vec<SlotView> {
        slot_views(&self.slots, &self.service.snapshot())
    }

    fn is_checklist_slot(&self, slot_type: &SlotType) -> bool {
        self.slots.iter().any(|slot| &slot.slot_type == slot_type)
    }
}
