#![deny(missing_docs)]
//! A multithreaded contact directory server that maps full names to phone numbers.
//!
//! This crate provides the [`PhonebookStore`] implementation itself, as well as a
//! [`phonebook-client`] and [`phonebook-server`] executable that can be used to interact with it.
//! Requests and replies are plain text sent over a TCP connection.
//!
//! ## Supported Operations
//! The server supports five commands, each sent as one `|` separated line with a
//! case-insensitive keyword:
//!
//! - `ADD|first|last|phone` adds a contact, overwriting the phone of an existing one
//! - `GET|first|last` returns the bare phone number, or `NOT_FOUND`
//! - `UPDATE|first|last|phone` replaces the phone of an existing contact, or `NOT_FOUND`
//! - `REMOVE|first|last` removes a contact, or `NOT_FOUND`
//! - `LIST` returns one `name: phone` line per contact, or `EMPTY`
//!
//! Malformed requests get a reply starting with `ERROR: `. Field values cannot contain `|`,
//! and must not contain line breaks either: such a value is kept in memory as sent, but the
//! contact file holds one record per line, so after a restart only the part before the first
//! line break survives.
//!
//! See the [`PhonebookEngine`] trait and the [`Request`] and [`Response`] types for more
//! information on the structure of these operations.
//!
//! ## PhonebookStore
//! [`PhonebookStore`] is the implementor of the [`PhonebookEngine`] trait.
//! It is responsible for the following tasks:
//! - keeping the directory in memory, shared by every connection behind a reader-writer lock
//! - loading the directory from its file at start-up
//! - rewriting the whole file after every ADD, UPDATE and REMOVE
//!
//! A contact is identified by its contact key, `first + " " + last`. The file holds one
//! `key|phone` record per line.
//!
//! ## Client / Server
//! [`PhonebookServer`] accepts connections and runs one handler per connection on a
//! [`ThreadPool`]. By default that is the [`NaiveThreadPool`], a new thread for every
//! connection. [`PhonebookClient`] speaks the protocol from the other side.
//!
//! One read is one request: a client sends a command with a single write and waits for the
//! reply before sending the next one.
//!
//! [`phonebook-server`]: ./phonebook-server.rs
//! [`phonebook-client`]: ./phonebook-client.rs

pub use client::PhonebookClient;
pub use command::{Request, Response};
pub use engine::{contact_key, Directory, FileStore, PhonebookEngine, PhonebookStore};
pub use error::{PhonebookError, Result};
pub use server::{dispatch, process_request, PhonebookServer, Shutdown};
pub use thread_pool::{NaiveThreadPool, SharedQueueThreadPool, ThreadPool};

mod client;
pub mod command;
mod engine;
mod error;
mod server;
pub mod thread_pool;
