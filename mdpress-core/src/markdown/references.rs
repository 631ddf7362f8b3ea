//! Link and footnote references collected while rendering
//!
//! Entries may be recorded in any order. Numbers are assigned by the position stamped on
//! each entry when its token was met, so numbering always follows reading order.

use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceEntry {
    /// Identity of the referenced target; repeated keys share one number
    pub key: String,
    pub label: String,
    pub target: String,
    pub position: usize,
}

/// An entry together with its assigned footnote number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberedReference<'r> {
    pub number: usize,
    pub entry: &'r ReferenceEntry,
}

#[derive(Debug, Clone, Default)]
pub struct ReferenceList {
    entries: Vec<ReferenceEntry>,
}

impl ReferenceList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: ReferenceEntry) {
        self.entries.push(entry);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries sorted by position
    pub fn ordered(&self) -> Vec<&ReferenceEntry> {
        let mut entries: Vec<&ReferenceEntry> = self.entries.iter().collect();
        entries.sort_by_key(|entry| entry.position);
        entries
    }

    /// One numbered reference per distinct key, numbered from 1 in first-seen order
    pub fn numbered(&self) -> Vec<NumberedReference<'_>> {
        let mut seen = HashMap::new();
        let mut numbered = Vec::new();
        for entry in self.ordered() {
            if seen.contains_key(entry.key.as_str()) {
                continue;
            }
            let number = numbered.len() + 1;
            seen.insert(entry.key.as_str(), number);
            numbered.push(NumberedReference { number, entry });
        }
        numbered
    }

    /// Number for every key, consistent with [`ReferenceList::numbered`]
    pub fn numbers(&self) -> HashMap<String, usize> {
        self.numbered()
            .into_iter()
            .map(|numbered| (numbered.entry.key.clone(), numbered.number))
            .collect()
    }

    /// Every recorded entry with the number of its key, in position order
    pub fn occurrences(&self) -> Vec<(usize, &ReferenceEntry)> {
        let numbers = self.numbers();
        self.ordered()
            .into_iter()
            .filter_map(|entry| numbers.get(&entry.key).map(|n| (*n, entry)))
            .collect()
    }
}
