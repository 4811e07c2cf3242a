use std::collections::HashSet;

use swarmdesk_sdk::FileInfo;

/// Files picked in the file list, keyed by feed topic.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    topics: HashSet<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips a file's selection. Returns whether it is now selected.
    pub fn toggle(&mut self, topic: &str) -> bool {
        if self.topics.remove(topic) {
            false
        } else {
            self.topics.insert(topic.to_string());
            true
        }
    }

    pub fn select(&mut self, topic: &str) {
        self.topics.insert(topic.to_string());
    }

    pub fn select_all<'a>(&mut self, files: impl IntoIterator<Item = &'a FileInfo>) {
        self.topics
            .extend(files.into_iter().map(|f| f.topic.clone()));
    }

    pub fn is_selected(&self, topic: &str) -> bool {
        self.topics.contains(topic)
    }

    /// The selected entries of `files`, in list order.
    pub fn selected(&self, files: &[FileInfo]) -> Vec<FileInfo> {
        files
            .iter()
            .filter(|f| self.topics.contains(&f.topic))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    pub fn clear(&mut self) {
        self.topics.clear();
    }
}
