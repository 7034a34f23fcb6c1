use super::domain::Visibility;

/// Sharing scope applied to the next uploads. Changing it never touches
/// records that were already submitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VisibilitySelector {
    current: Visibility,
}

impl VisibilitySelector {
    pub fn new(initial: Visibility) -> Self {
        Self { current: initial }
    }

    pub fn current(&self) -> Visibility {
        self.current
    }

    pub fn select(&mut self, visibility: Visibility) {
        self.current = visibility;
    }
}
