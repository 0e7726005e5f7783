/// Ordered item tokens in collection order. Duplicates are allowed; the
/// revision bumps on every mutation so the display can refresh from scratch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Inventory {
    items: Vec<String>,
    revision: u64,
}

impl Inventory {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&mut self, item_id: &str) {
        self.items.push(item_id.to_string());
        self.revision = self.revision.wrapping_add(1);
    }

    /// Removes the first occurrence. A missing item is a no-op.
    pub(crate) fn remove(&mut self, item_id: &str) -> bool {
        let Some(index) = self.items.iter().position(|item| item == item_id) else {
            return false;
        };
        self.items.remove(index);
        self.revision = self.revision.wrapping_add(1);
        true
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, item_id: &str) -> bool {
        self.items.iter().any(|item| item == item_id)
    }

    pub(crate) fn contents(&self) -> &[String] {
        &self.items
    }

    pub(crate) fn revision(&self) -> u64 {
        self.revision
    }
}
