use super::domain::DocumentRecord;

/// Receives the resolved records, in insertion order, after every registry
/// change caused by a finished upload, a removal or a review transition.
pub trait RegistryObserver: Send + Sync {
    fn documents_changed(&self, documents: &[DocumentRecord]);
}

impl<F> RegistryObserver for F
where
    F: Fn(&[DocumentRecord]) + Send + Sync,
{
    fn documents_changed(&self, documents: &[DocumentRecord]) {
        self(documents)
    }
}
