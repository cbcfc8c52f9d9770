//! Selectable field set: server candidates merged with user-entered paths.

/// Field/column selection for the current upload.
///
/// `selected` is kept in the order the paths were checked; everything that
/// reads it for display or submission goes through [`FieldSelection::selected_fields`],
/// which reports it in merged order instead.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldSelection {
    candidates: Vec<String>,
    custom: Vec<String>,
    selected: Vec<String>,
}

impl FieldSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start over for a fresh upload. The first candidate is pre-selected.
    pub fn reset(&mut self, candidates: Vec<String>) {
        self.custom.clear();
        self.selected = candidates.first().cloned().into_iter().collect();
        self.candidates = candidates;
    }

    /// Append a user-entered path and select it. Returns `false` when ignored.
    pub fn add_custom(&mut self, path: &str) -> bool {
        let path = path.trim();
        if path.is_empty() || self.contains(path) {
            return false;
        }
        self.custom.push(path.to_string());
        self.selected.push(path.to_string());
        true
    }

    /// Check or uncheck a path. Paths outside the merged set are ignored.
    pub fn toggle(&mut self, path: &str, checked: bool) -> bool {
        if !self.contains(path) {
            return false;
        }
        let present = self.is_selected(path);
        match (checked, present) {
            (true, false) => self.selected.push(path.to_string()),
            (false, true) => self.selected.retain(|p| p != path),
            _ => return false,
        }
        true
    }

    pub fn select_all(&mut self) {
        self.selected = self.merged_fields();
    }

    pub fn clear_all(&mut self) {
        self.selected.clear();
    }

    /// Candidates in server order, then custom paths in insertion order.
    /// First occurrence wins; blank entries are never offered.
    pub fn merged_fields(&self) -> Vec<String> {
        let mut merged: Vec<String> = Vec::with_capacity(self.candidates.len() + self.custom.len());
        for path in self.candidates.iter().chain(self.custom.iter()) {
            if path.trim().is_empty() || merged.iter().any(|seen| seen == path) {
                continue;
            }
            merged.push(path.clone());
        }
        merged
    }

    /// Checked paths, in merged order.
    pub fn selected_fields(&self) -> Vec<String> {
        self.merged_fields()
            .into_iter()
            .filter(|path| self.is_selected(path))
            .collect()
    }

    pub fn is_selected(&self, path: &str) -> bool {
        self.selected.iter().any(|p| p == path)
    }

    pub fn has_selection(&self) -> bool {
        !self.selected.is_empty()
    }

    pub fn custom(&self) -> &[String] {
        &self.custom
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    fn contains(&self, path: &str) -> bool {
        !path.trim().is_empty()
            && self
                .candidates
                .iter()
                .chain(self.custom.iter())
                .any(|p| p == path)
    }
}
