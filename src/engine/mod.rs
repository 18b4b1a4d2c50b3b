//! This module provides the contact directory storage engine.
//! [`PhonebookStore`] keeps the [`Directory`] in memory and flushes it to a flat text file
//! through a [`FileStore`] after every mutation.
use crate::Result;

/// A trait for the operations the server performs on a contact directory.
///
/// Contacts are identified by their contact key, `first + " " + last`, built from the trimmed
/// first and last names (see [`contact_key`]).
pub trait PhonebookEngine: Clone + Send + 'static {
    /// adds a contact, overwriting the phone of an existing contact with the same key.
    ///
    /// Returns the contact key.
    ///
    /// # Errors
    ///
    /// Returns `PhonebookError::Validation` if any of the fields is empty.
    fn add(&self, first: &str, last: &str, phone: &str) -> Result<String>;

    /// Gets the phone number of a contact
    ///
    /// Returns `None` if the contact does not exist.
    fn get(&self, first: &str, last: &str) -> Result<Option<String>>;

    /// replaces the phone number of an existing contact, returning the `(old, new)` phones
    ///
    /// # Errors
    ///
    /// Returns `PhonebookError::Validation` if any of the fields is empty and
    /// `PhonebookError::NotFound` if the contact does not exist.
    fn update(&self, first: &str, last: &str, phone: &str) -> Result<(String, String)>;

    /// Removes a contact, returning the phone it had
    ///
    /// # Errors
    ///
    /// Returns `PhonebookError::NotFound` if the contact does not exist.
    fn remove(&self, first: &str, last: &str) -> Result<String>;

    /// returns a snapshot of every `(key, phone)` pair in directory order
    fn list(&self) -> Result<Vec<(String, String)>>;
}

/// builds the contact key used to identify a contact
pub fn contact_key(first: &str, last: &str) -> String {
    format!("{} {}", first.trim(), last.trim())
}

mod directory;
mod file;
mod phonebook;

pub use self::directory::Directory;
pub use self::file::FileStore;
pub use self::phonebook::PhonebookStore;
