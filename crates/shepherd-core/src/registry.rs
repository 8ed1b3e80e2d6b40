//! Registry of live viewer processes.
//!
//! Records are kept in insertion order so the dashboard lists viewers in the
//! order they were opened. One mutex guards the collection; every add,
//! remove, and listing runs entirely under it, and nothing that can block
//! (spawning, killing, rendering) ever happens while it is held.

use crate::error::{Result, ShepherdError};
use crate::launcher::ViewerProcess;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// One supervised viewer process and what it was opened for.
#[derive(Debug)]
pub struct ProcessRecord {
    pub name: String,
    pub path1: String,
    /// Only set for comparison launches.
    pub path2: String,
    pub port: u16,
    pub started_at: DateTime<Utc>,
    process: ViewerProcess,
}

impl ProcessRecord {
    pub fn new(
        name: impl Into<String>,
        path1: impl Into<String>,
        path2: impl Into<String>,
        port: u16,
        process: ViewerProcess,
    ) -> Self {
        Self {
            name: name.into(),
            path1: path1.into(),
            path2: path2.into(),
            port,
            started_at: Utc::now(),
            process,
        }
    }

    /// Copy of the record's metadata, without the process handle.
    pub fn snapshot(&self) -> ProcessSnapshot {
        ProcessSnapshot {
            name: self.name.clone(),
            port: self.port,
            path1: self.path1.clone(),
            path2: self.path2.clone(),
            pid: self.process.pid(),
            started_at: self.started_at,
        }
    }

    fn terminate(mut self) {
        info!(
            "Stopping {} viewer {:?} on port {} (pid {:?})",
            self.process.program(),
            self.name,
            self.port,
            self.process.pid()
        );
        self.process.kill();
    }
}

/// Point-in-time view of a record, as shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessSnapshot {
    pub name: String,
    pub port: u16,
    pub path1: String,
    pub path2: String,
    pub pid: Option<u32>,
    pub started_at: DateTime<Utc>,
}

/// A record the registry refused, handed back so its process can be stopped.
#[derive(Debug)]
pub struct Rejected {
    pub record: ProcessRecord,
    pub error: ShepherdError,
}

/// Concurrent, insertion-ordered collection of live viewer records.
#[derive(Debug, Default)]
pub struct ProcessRegistry {
    records: Mutex<Vec<ProcessRecord>>,
}

impl ProcessRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ProcessRecord>> {
        // Every critical section is a single Vec operation, so the data is
        // consistent even if a holder panicked.
        self.records.lock().unwrap_or_else(|poisoned| {
            warn!("Registry lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Append a record at the tail.
    ///
    /// A record whose port is already live is rejected and returned to the
    /// caller untouched; the registry never holds two records for one port.
    pub fn add(&self, record: ProcessRecord) -> std::result::Result<(), Box<Rejected>> {
        let mut records = self.lock();
        if records.iter().any(|r| r.port == record.port) {
            let port = record.port;
            drop(records);
            warn!("Refusing second viewer for live port {}", port);
            return Err(Box::new(Rejected {
                record,
                error: ShepherdError::PortInUse(port),
            }));
        }
        debug!("Registering viewer {:?} on port {}", record.name, record.port);
        records.push(record);
        Ok(())
    }

    /// Like [`add`](Self::add), but stops the refused record's process.
    pub fn add_or_kill(&self, record: ProcessRecord) -> Result<()> {
        self.add(record).map_err(|rejected| {
            let Rejected { record, error } = *rejected;
            record.terminate();
            error
        })
    }

    /// Remove the record for `port` and kill its process.
    ///
    /// Unknown ports are a silent no-op. Returns whether a record was removed.
    pub fn remove(&self, port: u16) -> bool {
        let removed = {
            let mut records = self.lock();
            records
                .iter()
                .position(|r| r.port == port)
                .map(|index| records.remove(index))
        };

        match removed {
            Some(record) => {
                record.terminate();
                true
            }
            None => {
                debug!("No viewer on port {}, nothing to remove", port);
                false
            }
        }
    }

    /// Ordered snapshot of every live record.
    pub fn list(&self) -> Vec<ProcessSnapshot> {
        self.lock().iter().map(ProcessRecord::snapshot).collect()
    }

    pub fn contains(&self, port: u16) -> bool {
        self.lock().iter().any(|r| r.port == port)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Remove every record and kill its process. Returns how many there were.
    pub fn drain(&self) -> usize {
        let records: Vec<ProcessRecord> = self.lock().drain(..).collect();
        let count = records.len();
        for record in records {
            record.terminate();
        }
        count
    }
}
