use std::collections::HashSet;

use webprobe_core_types::DocumentId;

use crate::record_store::RunGeneration;

/// Per-run mutable state owned by the orchestrator.
#[derive(Debug, Default)]
pub struct ExplorationContext {
    pub visited_elements: HashSet<String>,
    pub visited_urls: HashSet<String>,
    pub last_url: Option<String>,
    pub same_page_count: u32,
    pub step_index: u32,
    pub transient_failures: u32,
    pub document: Option<DocumentId>,
    pub generation: RunGeneration,
}

impl ExplorationContext {
    /// Fresh state for a run that owns `document`.
    pub fn for_run(document: DocumentId, generation: RunGeneration) -> Self {
        Self {
            document: Some(document),
            generation,
            ..Self::default()
        }
    }

    /// Drops all per-run state and returns the document reference.
    pub fn reset(&mut self) -> Option<DocumentId> {
        std::mem::take(self).document
    }

    /// Records `url` and updates the same-page counter. Returns the new
    /// count of consecutive iterations spent on it.
    pub fn observe_url(&mut self, url: String) -> u32 {
        self.visited_urls.insert(url.clone());
        if self.last_url.as_deref() == Some(url.as_str()) {
            self.same_page_count += 1;
        } else {
            self.same_page_count = 0;
            self.last_url = Some(url);
        }
        self.same_page_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_page_counter_resets_on_change() {
        let mut ctx = ExplorationContext::default();
        assert_eq!(ctx.observe_url("https://a.test/".into()), 0);
        assert_eq!(ctx.observe_url("https://a.test/".into()), 1);
        assert_eq!(ctx.observe_url("https://a.test/".into()), 2);
        assert_eq!(ctx.observe_url("https://a.test/b".into()), 0);
        assert_eq!(ctx.visited_urls.len(), 2);
    }

    #[test]
    fn first_visit_is_not_a_repeat() {
        let mut ctx = ExplorationContext::default();
        let limit = crate::ExplorerConfig::default().max_same_page_iterations;
        let counts: Vec<u32> = (0..=limit)
            .map(|_| ctx.observe_url("https://a.test/".into()))
            .collect();
        // limit + 1 extractions on one URL before the counter reaches the limit
        assert_eq!(counts.len() as u32, limit + 1);
        assert_eq!(counts.last().copied(), Some(limit));
        assert!(counts[..limit as usize].iter().all(|count| *count < limit));
    }

    #[test]
    fn reset_hands_back_the_document() {
        let mut ctx = ExplorationContext::for_run(DocumentId::from("doc-1"), 3);
        ctx.visited_elements.insert("button:Go".into());
        assert_eq!(ctx.reset(), Some(DocumentId::from("doc-1")));
        assert!(ctx.visited_elements.is_empty());
        assert_eq!(ctx.generation, 0);
    }
}
