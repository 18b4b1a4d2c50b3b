use std::path::Path;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{error, info, instrument};

use super::{contact_key, Directory, FileStore, PhonebookEngine};
use crate::error::{PhonebookError, Result};

/// The primary struct for working with a contact directory.
///
/// The [`Directory`] is held in memory behind a reader-writer lock and shared by every clone
/// of the store. Each mutation, together with the flush of the full directory to the
/// [`FileStore`], happens while holding the write lock, so the file always reflects a
/// directory state that readers could have observed.
///
/// A failed flush is logged and otherwise ignored: the in-memory directory stays the source of
/// truth and the mutation still succeeds.
#[derive(Debug, Clone)]
pub struct PhonebookStore {
    // the shared, in-memory directory
    directory: Arc<RwLock<Directory>>,

    // where the directory is flushed to
    file: Arc<FileStore>,
}

impl PhonebookStore {
    /// creates a [`PhonebookStore`] by loading the directory file at `path`.
    /// If the file does not exist the store starts out empty.
    ///
    /// # Errors
    /// returns an IO error if the file exists but could not be read
    #[instrument]
    pub fn open(path: &Path) -> Result<PhonebookStore> {
        let file = FileStore::new(path);
        let directory = file.load()?;
        info!(
            "opened phonebook with {} contacts from {:?}",
            directory.len(),
            file.path()
        );

        Ok(PhonebookStore {
            directory: Arc::new(RwLock::new(directory)),
            file: Arc::new(file),
        })
    }

    /// writes the current directory to disk, returning any persistence error to the caller.
    /// Used for the final flush when the server shuts down
    pub fn flush(&self) -> Result<()> {
        let directory = self.read()?;
        self.file.save(&directory)
    }

    /// number of contacts currently in the directory
    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    /// returns true if the directory holds no contacts
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.read()?.is_empty())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Directory>> {
        self.directory.read().map_err(|_| PhonebookError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Directory>> {
        self.directory.write().map_err(|_| PhonebookError::Poisoned)
    }

    // flushes `directory` while the caller still holds the write lock
    fn persist(&self, directory: &Directory) {
        if let Err(e) = self.file.save(directory) {
            error!("{}", e);
        }
    }
}

impl PhonebookEngine for PhonebookStore {
    fn add(&self, first: &str, last: &str, phone: &str) -> Result<String> {
        validate(first, last, phone)?;
        let key = contact_key(first, last);

        let mut directory = self.write()?;
        directory.insert(key.clone(), phone.trim().to_string());
        self.persist(&directory);
        Ok(key)
    }

    fn get(&self, first: &str, last: &str) -> Result<Option<String>> {
        let key = contact_key(first, last);
        Ok(self.read()?.get(&key).map(String::from))
    }

    fn update(&self, first: &str, last: &str, phone: &str) -> Result<(String, String)> {
        validate(first, last, phone)?;
        let key = contact_key(first, last);
        let new = phone.trim().to_string();

        let mut directory = self.write()?;
        let old = match directory.get(&key) {
            Some(old) => old.to_string(),
            None => return Err(PhonebookError::NotFound),
        };
        directory.insert(key, new.clone());
        self.persist(&directory);
        Ok((old, new))
    }

    fn remove(&self, first: &str, last: &str) -> Result<String> {
        let key = contact_key(first, last);

        let mut directory = self.write()?;
        let phone = directory.remove(&key).ok_or(PhonebookError::NotFound)?;
        self.persist(&directory);
        Ok(phone)
    }

    fn list(&self) -> Result<Vec<(String, String)>> {
        Ok(self
            .read()?
            .iter()
            .map(|(key, phone)| (key.to_string(), phone.to_string()))
            .collect())
    }
}

/// name, lastname and phone must all be non-empty after trimming
fn validate(first: &str, last: &str, phone: &str) -> Result<()> {
    if [first, last, phone].iter().any(|field| field.trim().is_empty()) {
        return Err(PhonebookError::Validation);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process_request;
    use std::thread;
    use tempfile::TempDir;

    #[test]
    fn poisoned_lock_becomes_an_error_reply() {
        let dir = TempDir::new().unwrap();
        let store = PhonebookStore::open(&dir.path().join("PhonebookList.txt")).unwrap();
        store.add("John", "Smith", "1").unwrap();

        let holder = store.clone();
        let panicked = thread::spawn(move || {
            let _directory = holder.directory.write().unwrap();
            panic!("writer died while holding the directory lock");
        })
        .join();
        assert!(panicked.is_err());

        assert!(matches!(store.get("John", "Smith"), Err(PhonebookError::Poisoned)));
        for line in ["GET|John|Smith", "ADD|Jane|Doe|2", "REMOVE|John|Smith", "LIST"] {
            assert_eq!(
                process_request(&store, line).to_string(),
                "ERROR: the directory lock is poisoned"
            );
        }
    }

    // a line break in a field survives in memory but is cut at the line break on reload
    #[test]
    fn line_break_in_a_field_is_cut_on_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("PhonebookList.txt");
        let store = PhonebookStore::open(&path).unwrap();
        store.add("John", "Smith", "555\nEve").unwrap();
        assert_eq!(store.get("John", "Smith").unwrap(), Some("555\nEve".to_owned()));

        let reopened = PhonebookStore::open(&path).unwrap();
        assert_eq!(reopened.get("John", "Smith").unwrap(), Some("555".to_owned()));
    }
}
