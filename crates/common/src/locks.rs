use std::io;
use std::path::Path;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;

pub struct FileLocker {
    locks: DashMap<String, Arc<RwLock<()>>>,
}

impl Default for FileLocker {
    fn default() -> Self {
        Self::new()
    }
}

impl FileLocker {
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    pub fn from_dir(dir: &Path) -> io::Result<Self> {
        let locker = Self::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                let name = entry.file_name().to_string_lossy().into_owned();
                locker.for_file(&name);
            }
        }
        Ok(locker)
    }

    // first reference creates the lock; the entry API keeps racing
    // creators from ending up with two distinct locks for one name
    pub fn for_file(&self, name: &str) -> Arc<RwLock<()>> {
        self.locks.entry(name.to_string()).or_default().clone()
    }

    pub fn known_files(&self) -> usize {
        self.locks.len()
    }
}
