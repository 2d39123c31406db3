use std::sync::Arc;
use tokio::sync::watch;

/// Canonical filenames the backend accepted in the last successful upload.
///
/// Each `set` swaps the whole list in one step, so readers see either the old
/// or the new list, never a mix.
pub struct DocumentRegistry {
    filenames: watch::Sender<Arc<[String]>>,
}

impl Default for DocumentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentRegistry {
    pub fn new() -> Self {
        let (filenames, _) = watch::channel(Arc::from(Vec::new()));
        Self { filenames }
    }

    pub fn set(&self, filenames: Vec<String>) {
        tracing::info!(count = filenames.len(), "Document registry replaced");
        self.filenames.send_replace(Arc::from(filenames));
    }

    pub fn get(&self) -> Arc<[String]> {
        self.filenames.borrow().clone()
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.filenames.borrow().iter().any(|f| f == filename)
    }

    pub fn is_empty(&self) -> bool {
        self.filenames.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.set(Vec::new());
    }

    /// Watch for replacements, e.g. to refresh a selection list.
    pub fn subscribe(&self) -> watch::Receiver<Arc<[String]>> {
        self.filenames.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn set_replaces_instead_of_merging() {
        let registry = DocumentRegistry::new();
        assert!(registry.is_empty());

        registry.set(names(&["a.pdf", "b.pdf"]));
        registry.set(names(&["c.pdf"]));

        assert_eq!(&*registry.get(), &names(&["c.pdf"])[..]);
        assert!(!registry.contains("a.pdf"));
        assert!(registry.contains("c.pdf"));
    }

    #[test]
    fn earlier_snapshots_are_unaffected_by_replacement() {
        let registry = DocumentRegistry::new();
        registry.set(names(&["a.pdf", "b.pdf"]));
        let snapshot = registry.get();

        registry.set(names(&["c.pdf"]));

        assert_eq!(&*snapshot, &names(&["a.pdf", "b.pdf"])[..]);
    }

    #[tokio::test]
    async fn subscribers_see_replacements() {
        let registry = DocumentRegistry::new();
        let mut rx = registry.subscribe();

        registry.set(names(&["report.pdf"]));

        rx.changed().await.unwrap();
        assert_eq!(&**rx.borrow(), &names(&["report.pdf"])[..]);
    }
}
