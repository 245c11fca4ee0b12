//! # log
//!
//! why: manage the ordered log of commands that raft replicates
//! relations: owned by PersistentState (state.rs), rewritten by append.rs, persisted via raft-storage
//! what: LogEntry, Log (0-indexed), LogChange describing what a rewrite did

use crate::error::LogError;
use crate::Term;
use serde::{Deserialize, Serialize};

/// A single entry in the replicated log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// The command to be applied to the state machine (opaque to the core)
    pub command: Vec<u8>,
    /// The term in which the entry was proposed
    pub term: Term,
}

impl LogEntry {
    pub fn new(term: u64, command: Vec<u8>) -> Self {
        Self {
            command,
            term: Term::new(term),
        }
    }
}

/// The effect of a successful rewrite, in the shape storage needs to mirror it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogChange {
    /// entries at and after this index were dropped
    pub truncated_from: Option<u64>,
    /// entries pushed after the truncation point
    pub appended: Vec<LogEntry>,
}

impl LogChange {
    pub fn is_empty(&self) -> bool {
        self.truncated_from.is_none() && self.appended.is_empty()
    }
}

/// Ordered sequence of entries, indexed from 0
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Log {
    entries: Vec<LogEntry>,
}

impl Log {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> u64 {
        self.entries.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.last()
    }

    /// entry at `index`, `None` when out of range
    pub fn get(&self, index: u64) -> Option<&LogEntry> {
        usize::try_from(index).ok().and_then(|i| self.entries.get(i))
    }

    /// index of the last entry, `None` for an empty log
    pub fn last_index(&self) -> Option<u64> {
        self.len().checked_sub(1)
    }

    /// term of the last entry; an empty log counts as term 0
    pub fn last_term(&self) -> Term {
        self.last().map_or(Term::ZERO, |e| e.term)
    }

    pub fn term_at(&self, index: u64) -> Option<Term> {
        self.get(index).map(|e| e.term)
    }

    /// log-matching check for the entry preceding an append
    ///
    /// `None` names the empty prefix and always matches; an index past the end never does
    pub fn matches(&self, prev_index: Option<u64>, prev_term: Term) -> bool {
        match prev_index {
            None => true,
            Some(index) => self.term_at(index) == Some(prev_term),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[LogEntry] {
        &self.entries
    }

    /// entries in `[from, to)`, clamped to the log
    pub fn slice(&self, from: u64, to: u64) -> &[LogEntry] {
        let len = self.entries.len();
        let to = usize::try_from(to).map_or(len, |t| t.min(len));
        let from = usize::try_from(from).map_or(to, |f| f.min(to));
        &self.entries[from..to]
    }

    pub fn push(&mut self, entry: LogEntry) {
        self.entries.push(entry);
    }

    /// Keep `[0, prev_index]`, drop the rest and append `entries`
    ///
    /// the first `committed` entries must survive unchanged; a rewrite that
    /// would replace or drop one of them is refused and the log is left as is
    pub fn rewrite(
        &mut self,
        prev_index: Option<u64>,
        entries: Vec<LogEntry>,
        committed: u64,
    ) -> Result<LogChange, LogError> {
        let keep = prev_index.map_or(0, |i| i + 1).min(self.len());

        for index in keep..committed.min(self.len()) {
            let offset = (index - keep) as usize;
            if entries.get(offset) != self.get(index) {
                return Err(LogError::CommittedTruncation { index, committed });
            }
        }

        let truncated_from = (keep < self.len()).then_some(keep);
        self.entries.truncate(keep as usize);
        self.entries.extend(entries.iter().cloned());

        Ok(LogChange {
            truncated_from,
            appended: entries,
        })
    }
}

impl FromIterator<LogEntry> for Log {
    fn from_iter<I: IntoIterator<Item = LogEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<LogEntry>> for Log {
    fn from(entries: Vec<LogEntry>) -> Self {
        Self { entries }
    }
}
