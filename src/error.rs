use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// type alias for all operations on a [`PhonebookStore`] or the server that could fail with a
/// [`PhonebookError`]
///
/// [`PhonebookStore`]: ./engine/struct.PhonebookStore.html
pub type Result<T> = std::result::Result<T, PhonebookError>;

/// The error variants used throughout the phonebook.
///
/// The `Display` text of the request-level variants (`Validation`, `Format`,
/// `UnknownCommand`) is exactly what the server sends back after the `ERROR: ` prefix.
#[derive(Error, Debug)]
pub enum PhonebookError {
    /// a required field (name, lastname or phone) was empty after trimming
    #[error("Name, lastname and phone cannot be empty")]
    Validation,

    /// a command was received with the wrong number of `|` separated segments.
    /// Holds the shape the command is expected to have
    #[error("Format should be {0}")]
    Format(&'static str),

    /// the command keyword is not one of ADD, GET, UPDATE, REMOVE or LIST
    #[error("Unknown command '{0}'. Use ADD, GET, UPDATE, REMOVE, or LIST")]
    UnknownCommand(String),

    /// the contact key is not in the directory
    #[error("Contact not found")]
    NotFound,

    /// the directory could not be flushed to its backing file
    #[error("could not save the directory to {path:?}: {source}")]
    Persistence {
        /// the file that was being written
        path: PathBuf,
        /// the underlying IO failure
        source: io::Error,
    },

    /// variant for socket and file IO errors
    #[error("{0}")]
    Io(#[from] io::Error),

    /// invalid command line input, such as an address that is not `IP:PORT`
    #[error("{0}")]
    Parsing(String),

    /// a thread panicked while holding the directory lock
    #[error("the directory lock is poisoned")]
    Poisoned,

    /// an error message returned by the server
    #[error("{0}")]
    StringErr(String),
}
