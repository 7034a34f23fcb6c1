use serde::Serialize;

use super::domain::{
    DocumentRecord, DocumentSlotSpec, ExtractionStatus, SlotType, VerificationStatus,
};

/// Progress counters derived from a registry snapshot. Never stored; recompute
/// from the current records whenever they change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EvidenceSummary {
    pub required_count: usize,
    pub uploaded_count: usize,
    pub extraction_completed_count: usize,
    pub pending_legal_review_count: usize,
    pub hash_secured_count: usize,
    pub missing_required: Vec<SlotType>,
}

impl EvidenceSummary {
    pub fn compute(slots: &[DocumentSlotSpec], records: &[DocumentRecord]) -> Self {
        let required_count = slots.iter().filter(|slot| slot.required).count();

        let uploaded_count = records.iter().filter(|record| record.is_committed()).count();
        let extraction_completed_count = records
            .iter()
            .filter(|record| record.extraction_status() == ExtractionStatus::Completed)
            .count();
        let pending_legal_review_count = records
            .iter()
            .filter(|record| record.verification_status == VerificationStatus::ExtractionProcessed)
            .count();
        let hash_secured_count = records
            .iter()
            .filter(|record| record.content_hash.is_some())
            .count();

        let missing_required = slots
            .iter()
            .filter(|slot| slot.required)
            .filter(|slot| {
                !records
                    .iter()
                    .any(|record| record.slot_type == slot.slot_type && record.is_committed())
            })
            .map(|slot| slot.slot_type.clone())
            .collect();

        Self {
            required_count,
            uploaded_count,
            extraction_completed_count,
            pending_legal_review_count,
            hash_secured_count,
            missing_required,
        }
    }

    /// Share of required slots holding a committed document, 0–100.
    pub fn completion_percent(&self) -> u8 {
        if self.required_count == 0 {
            return 100;
        }
        let satisfied = self
            .required_count
            .saturating_sub(self.missing_required.len());
        ((satisfied * 100) / self.required_count) as u8
    }
}

/// A checklist slot paired with whatever currently occupies it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotView {
    pub slot: DocumentSlotSpec,
    pub record: Option<DocumentRecord>,
}

impl SlotView {
    pub fn status_label(&self) -> &'static str {
        match &self.record {
            None => "empty",
            Some(record) if record.is_in_flight() => "uploading",
            Some(record) if !record.is_committed() => "failed",
            Some(record) => record.verification_status.label(),
        }
    }
}

/// One view per checklist slot, in checklist order.
pub fn slot_views(slots: &[DocumentSlotSpec], records: &[DocumentRecord]) -> Vec<SlotView> {
    slots
        .iter()
        .map(|slot| SlotView {
            slot: slot.clone(),
            record: records
                .iter()
                .find(|record| record.slot_type == slot.slot_type)
                .cloned(),
        })
        .collect()
}
