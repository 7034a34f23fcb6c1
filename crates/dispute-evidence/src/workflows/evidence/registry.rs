use super::domain::{DocumentId, DocumentRecord, SlotType};

/// In-memory set of per-slot records for one dispute session.
///
/// Keyed by slot type rather than record id, since the id changes when the
/// verification service issues its own. Records are always replaced whole so a
/// reader never sees a half-applied transition.
#[derive(Debug, Default, Clone)]
pub struct DocumentRegistry {
    records: Vec<DocumentRecord>,
}

impl DocumentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the record, or replaces the one occupying its slot in place.
    /// Returns the record that was displaced, if any.
    pub fn upsert(&mut self, record: DocumentRecord) -> Option<DocumentRecord> {
        match self.position_by_slot(&record.slot_type) {
            Some(index) => Some(std::mem::replace(&mut self.records[index], record)),
            None => {
                self.records.push(record);
                None
            }
        }
    }

    /// Swaps the resolved record in for the provisional one it answers.
    ///
    /// Returns `false` without touching anything when the provisional record
    /// is no longer present (removed or superseded while in flight).
    pub fn replace_provisional(
        &mut self,
        provisional_id: &DocumentId,
        resolved: DocumentRecord,
    ) -> bool {
        let Some(index) = self.position_by_id(provisional_id) else {
            return false;
        };
        if self.records[index].slot_type != resolved.slot_type {
            return false;
        }
        self.records[index] = resolved;
        true
    }

    pub fn remove_by_slot(&mut self, slot_type: &SlotType) -> Option<DocumentRecord> {
        let index = self.position_by_slot(slot_type)?;
        Some(self.records.remove(index))
    }

    pub fn remove_by_id(&mut self, id: &DocumentId) -> Option<DocumentRecord> {
        let index = self.position_by_id(id)?;
        Some(self.records.remove(index))
    }

    pub fn get(&self, slot_type: &SlotType) -> Option<&DocumentRecord> {
        self.records
            .iter()
            .find(|record| &record.slot_type == slot_type)
    }

    pub fn get_by_id(&self, id: &DocumentId) -> Option<&DocumentRecord> {
        self.records.iter().find(|record| &record.id == id)
    }

    /// All records in insertion order.
    pub fn list(&self) -> &[DocumentRecord] {
        &self.records
    }

    /// Records whose remote call has finished, in insertion order.
    pub fn resolved(&self) -> Vec<DocumentRecord> {
        self.records
            .iter()
            .filter(|record| !record.is_in_flight())
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn position_by_slot(&self, slot_type: &SlotType) -> Option<usize> {
        self.records
            .iter()
            .position(|record| &record.slot_type == slot_type)
    }

    fn position_by_id(&self, id: &DocumentId) -> Option<usize> {
        self.records.iter().position(|record| &record.id == id)
    }
}
