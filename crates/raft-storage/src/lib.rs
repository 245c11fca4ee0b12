//! # raft-storage
//!
//! why: provide durable persistence for raft state using standard rust fs apis
//! relations: executes the persistence actions emitted by raft-core, used by raft-runtime
//! what: Storage trait, FileStorage implementation, InMemoryStorage for testing

use raft_core::{Action, Log, LogEntry, NodeId, PersistentState, Term};
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// failure to read or write persisted raft state
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// trait for durable storage of raft state
///
/// this abstraction allows the same code to work with:
/// - real filesystem (native)
/// - in-memory (testing)
pub trait Storage {
    /// persist the current term and voted_for
    fn save_term_and_vote(&mut self, term: Term, voted_for: Option<NodeId>) -> Result<()>;

    /// load the persisted term and voted_for
    fn load_term_and_vote(&self) -> Result<(Term, Option<NodeId>)>;

    /// append entries to the end of the log
    fn append_entries(&mut self, entries: &[LogEntry]) -> Result<()>;

    /// load the whole log (for crash recovery)
    fn load_log(&self) -> Result<Log>;

    /// drop every entry at or after `from_index` (for conflict resolution)
    fn truncate_log_from(&mut self, from_index: u64) -> Result<()>;

    /// rebuild the persistent state a restarting node resumes from
    fn load_state(&self) -> Result<PersistentState> {
        let (current_term, voted_for) = self.load_term_and_vote()?;
        Ok(PersistentState {
            current_term,
            voted_for,
            log: self.load_log()?,
        })
    }

    /// carry out a persistence action; returns false for actions that are not storage's concern
    fn apply(&mut self, action: &Action) -> Result<bool> {
        match action {
            Action::SaveTermAndVote { term, voted_for } => self.save_term_and_vote(*term, *voted_for)?,
            Action::TruncateLog { from } => self.truncate_log_from(*from)?,
            Action::AppendLog(entries) => self.append_entries(entries)?,
            _ => return Ok(false),
        }
        Ok(true)
    }
}

// -- file storage implementation --

/// file-based storage implementation using std::fs
///
/// stores raft state in a directory with:
/// - meta.json: term and voted_for
/// - log.json: array of log entries
#[derive(Debug)]
pub struct FileStorage {
    /// directory path for storing state files
    dir: PathBuf,
}

impl FileStorage {
    /// create a new filestorage at the given directory
    /// creates the directory if it doesn't exist
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn meta_path(&self) -> PathBuf {
        self.dir.join("meta.json")
    }

    fn log_path(&self) -> PathBuf {
        self.dir.join("log.json")
    }

    /// atomic write: write to temp file, sync, then rename over the target
    fn write_atomic(&self, target: &Path, contents: &[u8]) -> Result<()> {
        let temp_path = target.with_extension("tmp");
        let mut file = File::create(&temp_path)?;
        file.write_all(contents)?;
        file.sync_all()?;
        fs::rename(&temp_path, target)?;
        Ok(())
    }

    /// `None` when the file was never written
    fn read_to_string(path: &Path) -> Result<Option<String>> {
        let mut file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        Ok(Some(contents))
    }

    fn write_log(&self, log: &Log) -> Result<()> {
        // whole-file rewrite keeps truncation and append equally simple
        let json = serde_json::to_vec_pretty(log)?;
        self.write_atomic(&self.log_path(), &json)?;
        debug!(dir = %self.dir.display(), len = log.len(), "log written");
        Ok(())
    }
}

/// metadata structure for term and vote
#[derive(serde::Serialize, serde::Deserialize, Default)]
struct MetaData {
    term: Term,
    voted_for: Option<NodeId>,
}

impl Storage for FileStorage {
    fn save_term_and_vote(&mut self, term: Term, voted_for: Option<NodeId>) -> Result<()> {
        let json = serde_json::to_vec_pretty(&MetaData { term, voted_for })?;
        self.write_atomic(&self.meta_path(), &json)?;
        debug!(dir = %self.dir.display(), %term, ?voted_for, "term and vote written");
        Ok(())
    }

    fn load_term_and_vote(&self) -> Result<(Term, Option<NodeId>)> {
        let Some(contents) = Self::read_to_string(&self.meta_path())? else {
            return Ok((Term::ZERO, None)); // default for new nodes
        };
        let meta: MetaData = serde_json::from_str(&contents)?;
        Ok((meta.term, meta.voted_for))
    }

    fn append_entries(&mut self, entries: &[LogEntry]) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let mut log = self.load_log()?;
        for entry in entries {
            log.push(entry.clone());
        }
        self.write_log(&log)
    }

    fn load_log(&self) -> Result<Log> {
        match Self::read_to_string(&self.log_path())? {
            Some(contents) => Ok(serde_json::from_str(&contents)?),
            None => Ok(Log::new()),
        }
    }

    fn truncate_log_from(&mut self, from_index: u64) -> Result<()> {
        let log = self.load_log()?;
        if from_index >= log.len() {
            return Ok(());
        }
        let kept: Log = log.slice(0, from_index).iter().cloned().collect();
        self.write_log(&kept)
    }
}

// -- in-memory storage implementation --

/// in-memory storage for testing
///
/// stores all state in memory, no persistence across restarts
#[derive(Debug, Default, Clone)]
pub struct InMemoryStorage {
    term: Term,
    voted_for: Option<NodeId>,
    log: Vec<LogEntry>,
}

impl InMemoryStorage {
    /// create a new in-memory storage
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for InMemoryStorage {
    fn save_term_and_vote(&mut self, term: Term, voted_for: Option<NodeId>) -> Result<()> {
        self.term = term;
        self.voted_for = voted_for;
        Ok(())
    }

    fn load_term_and_vote(&self) -> Result<(Term, Option<NodeId>)> {
        Ok((self.term, self.voted_for))
    }

    fn append_entries(&mut self, entries: &[LogEntry]) -> Result<()> {
        self.log.extend(entries.iter().cloned());
        Ok(())
    }

    fn load_log(&self) -> Result<Log> {
        Ok(self.log.clone().into())
    }

    fn truncate_log_from(&mut self, from_index: u64) -> Result<()> {
        let keep = usize::try_from(from_index).unwrap_or(usize::MAX);
        self.log.truncate(keep);
        Ok(())
    }
}

// lets a runtime pick its backend from configuration at startup
impl<S: Storage + ?Sized> Storage for Box<S> {
    fn save_term_and_vote(&mut self, term: Term, voted_for: Option<NodeId>) -> Result<()> {
        (**self).save_term_and_vote(term, voted_for)
    }

    fn load_term_and_vote(&self) -> Result<(Term, Option<NodeId>)> {
        (**self).load_term_and_vote()
    }

    fn append_entries(&mut self, entries: &[LogEntry]) -> Result<()> {
        (**self).append_entries(entries)
    }

    fn load_log(&self) -> Result<Log> {
        (**self).load_log()
    }

    fn truncate_log_from(&mut self, from_index: u64) -> Result<()> {
        (**self).truncate_log_from(from_index)
    }
}
