//! Parsing of request lines into [`Request`]s and rendering of [`Response`]s as reply text.

use std::fmt;
use std::str::FromStr;

use crate::error::PhonebookError;

/// the literal character that separates the fields of a request and of a persisted record
pub const SEPARATOR: char = '|';

/// sentinel reply for a contact that does not exist
pub const NOT_FOUND: &str = "NOT_FOUND";

/// sentinel reply for a LIST on an empty directory
pub const EMPTY: &str = "EMPTY";

/// prefix of every error reply
pub const ERROR_PREFIX: &str = "ERROR: ";

const ADD_FORMAT: &str = "ADD|Name|Lastname|Phone";
const GET_FORMAT: &str = "GET|Name|Lastname";
const UPDATE_FORMAT: &str = "UPDATE|Name|Lastname|NewPhone";
const REMOVE_FORMAT: &str = "REMOVE|Name|Lastname";

/// These are the request "commands" that can be made to the phonebook server.
///
/// All field values are trimmed of surrounding whitespace when parsed from a request line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// add (or overwrite) a contact
    Add {
        /// first name
        first: String,
        /// last name
        last: String,
        /// phone number
        phone: String,
    },
    /// get the phone number of a contact
    Get {
        /// first name
        first: String,
        /// last name
        last: String,
    },
    /// replace the phone number of an existing contact
    Update {
        /// first name
        first: String,
        /// last name
        last: String,
        /// the new phone number
        phone: String,
    },
    /// remove a contact
    Remove {
        /// first name
        first: String,
        /// last name
        last: String,
    },
    /// list every contact in directory order
    List,
}

impl FromStr for Request {
    type Err = PhonebookError;

    /// parses one request line of the form `COMMAND|field|field...`
    ///
    /// # Errors
    /// - [`PhonebookError::UnknownCommand`] if the keyword is not recognized
    /// - [`PhonebookError::Format`] if the segment count does not fit the command
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        // split always yields at least one segment, an empty line is an unknown '' command
        let parts: Vec<&str> = line.trim().split(SEPARATOR).collect();
        let command = parts[0].trim().to_uppercase();
        let field = |i: usize| parts[i].trim().to_string();

        match command.as_str() {
            "ADD" if parts.len() == 4 => Ok(Request::Add {
                first: field(1),
                last: field(2),
                phone: field(3),
            }),
            "ADD" => Err(PhonebookError::Format(ADD_FORMAT)),
            "GET" if parts.len() == 3 => Ok(Request::Get {
                first: field(1),
                last: field(2),
            }),
            "GET" => Err(PhonebookError::Format(GET_FORMAT)),
            "UPDATE" if parts.len() == 4 => Ok(Request::Update {
                first: field(1),
                last: field(2),
                phone: field(3),
            }),
            "UPDATE" => Err(PhonebookError::Format(UPDATE_FORMAT)),
            "REMOVE" if parts.len() == 3 => Ok(Request::Remove {
                first: field(1),
                last: field(2),
            }),
            "REMOVE" => Err(PhonebookError::Format(REMOVE_FORMAT)),
            // anything after LIST is ignored
            "LIST" => Ok(Request::List),
            _ => Err(PhonebookError::UnknownCommand(command)),
        }
    }
}

impl fmt::Display for Request {
    /// renders the request in its wire form
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Request::Add { first, last, phone } => write!(f, "ADD|{}|{}|{}", first, last, phone),
            Request::Get { first, last } => write!(f, "GET|{}|{}", first, last),
            Request::Update { first, last, phone } => {
                write!(f, "UPDATE|{}|{}|{}", first, last, phone)
            }
            Request::Remove { first, last } => write!(f, "REMOVE|{}|{}", first, last),
            Request::List => write!(f, "LIST"),
        }
    }
}

/// The response types that can be returned for any phonebook [`Request`].
///
/// There is no status code on the wire, the `Display` impl of a `Response` is the whole reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// a contact was added or overwritten
    Added {
        /// the contact key
        key: String,
        /// the stored phone
        phone: String,
    },
    /// the bare phone number found by a GET
    Phone(String),
    /// a contact's phone was replaced
    Updated {
        /// the contact key
        key: String,
        /// the phone before the update
        old: String,
        /// the phone after the update
        new: String,
    },
    /// a contact was removed
    Removed {
        /// the contact key
        key: String,
        /// the phone the contact had
        phone: String,
    },
    /// `(key, phone)` pairs of a non-empty directory, in directory order
    Listing(Vec<(String, String)>),
    /// the contact does not exist
    NotFound,
    /// LIST on an empty directory
    Empty,
    /// the request could not be serviced. Holds the error description
    Error(String),
}

impl From<PhonebookError> for Response {
    fn from(e: PhonebookError) -> Self {
        match e {
            PhonebookError::NotFound => Response::NotFound,
            e => Response::Error(e.to_string()),
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Added { key, phone } => write!(f, "Added: {} -> {}", key, phone),
            Response::Phone(phone) => write!(f, "{}", phone),
            Response::Updated { key, old, new } => {
                write!(f, "Updated: {} | Old: {} -> New: {}", key, old, new)
            }
            Response::Removed { key, phone } => write!(f, "Deleted: {} ({})", key, phone),
            Response::Listing(entries) => {
                let lines: Vec<String> = entries
                    .iter()
                    .map(|(key, phone)| format!("{}: {}", key, phone))
                    .collect();
                write!(f, "{}", lines.join("\n"))
            }
            Response::NotFound => write!(f, "{}", NOT_FOUND),
            Response::Empty => write!(f, "{}", EMPTY),
            Response::Error(msg) => write!(f, "{}{}", ERROR_PREFIX, msg),
        }
    }
}
