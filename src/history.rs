use chrono::{
    DateTime,
    Utc,
};
use deskfleet_model::Snapshot;
use std::{
    collections::VecDeque,
    sync::Arc,
};

/// A snapshot plus its server-side receipt timestamp.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub snapshot: Arc<Snapshot>,
    pub received_at: DateTime<Utc>,
}

/// Append-only, size-capped snapshot log backing the tabular export.
///
/// Insertion is FIFO-evicting: once the cap is exceeded the oldest entries
/// are silently dropped. Entries are never reordered.
#[derive(Debug)]
pub struct BoundedHistory {
    entries: VecDeque<HistoryEntry>,
    cap: usize,
}

impl BoundedHistory {
    pub fn new(cap: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(cap.min(1024)),
            cap,
        }
    }

    pub fn append(&mut self, entry: HistoryEntry) {
        if self.entries.len() == self.cap {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// All entries, oldest first.
    pub fn all(&self) -> Vec<HistoryEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(host: &str) -> HistoryEntry {
        HistoryEntry {
            snapshot: Arc::new(Snapshot::new(host)),
            received_at: Utc::now(),
        }
    }

    #[test]
    fn never_exceeds_the_cap() {
        let mut history = BoundedHistory::new(5);
        for i in 0..12 {
            history.append(entry(&format!("pc-{i:02}")));
        }

        assert_eq!(history.len(), 5);
        let hosts: Vec<String> = history.all().iter().map(|e| e.snapshot.host.clone()).collect();
        // Exactly the most recent five, oldest first.
        assert_eq!(hosts, vec!["pc-07", "pc-08", "pc-09", "pc-10", "pc-11"]);
    }

    #[test]
    fn keeps_insertion_order_below_the_cap() {
        let mut history = BoundedHistory::new(10);
        history.append(entry("pc-b"));
        history.append(entry("pc-a"));

        let hosts: Vec<String> = history.all().iter().map(|e| e.snapshot.host.clone()).collect();
        assert_eq!(hosts, vec!["pc-b".to_string(), "pc-a".to_string()]);
    }
}
