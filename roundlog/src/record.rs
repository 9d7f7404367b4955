//! The record type held in each store slot.

use serde::{Deserialize, Serialize};

/// One generated entry, stamped with the round and slot it was written to.
///
/// Records are immutable once constructed. The store hands out clones, so a
/// record returned from a query never changes even after its slot is
/// overwritten by a later round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    round: u64,
    slot: usize,
    timestamp: String,
    payload: String,
    resource_url: Option<String>,
}

impl Record {
    pub(crate) fn new(round: u64, slot: usize, entry: Entry) -> Self {
        Self {
            round,
            slot,
            timestamp: entry.timestamp,
            payload: entry.payload,
            resource_url: entry.resource_url,
        }
    }

    /// The round this record was written in (starts at 1).
    pub fn round(&self) -> u64 {
        self.round
    }

    /// The slot this record occupies within its round.
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Formatted wall-clock time of the write.
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Text content.
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Optional attached resource, e.g. an image URL.
    pub fn resource_url(&self) -> Option<&str> {
        self.resource_url.as_deref()
    }
}

/// The caller-supplied part of a record, before the store stamps it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entry {
    /// Formatted wall-clock time.
    pub timestamp: String,
    /// Text content.
    pub payload: String,
    /// Optional attached resource.
    pub resource_url: Option<String>,
}

impl Entry {
    /// Creates an entry from its parts.
    pub fn new(
        payload: impl Into<String>,
        timestamp: impl Into<String>,
        resource_url: Option<String>,
    ) -> Self {
        Self {
            timestamp: timestamp.into(),
            payload: payload.into(),
            resource_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_accessors() {
        let entry = Entry::new("2 + 7", "2024-01-01 00:00:00", Some("http://x/test3.png".into()));
        let record = Record::new(2, 7, entry);

        assert_eq!(record.round(), 2);
        assert_eq!(record.slot(), 7);
        assert_eq!(record.timestamp(), "2024-01-01 00:00:00");
        assert_eq!(record.payload(), "2 + 7");
        assert_eq!(record.resource_url(), Some("http://x/test3.png"));
    }

    #[test]
    fn test_record_without_resource() {
        let record = Record::new(1, 0, Entry::new("1 + 0", "t", None));
        assert_eq!(record.resource_url(), None);
    }
}
