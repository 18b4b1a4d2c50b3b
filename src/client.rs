use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};

use crate::command::{Request, EMPTY, ERROR_PREFIX, NOT_FOUND};
use crate::{PhonebookError, Result};

// replies are read with a single read, LIST replies can be much longer than a request
const REPLY_BUFFER_SIZE: usize = 64 * 1024;

/// `PhonebookClient` contains the functionality for communication with a [`PhonebookServer`]
///
/// Each request is sent with a single write and its reply is taken from a single read, so a
/// client must wait for a reply before sending the next request.
///
/// [`PhonebookServer`]: ./struct.PhonebookServer.html
pub struct PhonebookClient {
    stream: TcpStream,
}

impl PhonebookClient {
    /// creates a client and establishes a socket connection to the server at the given `addr`
    pub fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let stream = TcpStream::connect(addr)?;
        Ok(PhonebookClient { stream })
    }

    /// sends a raw request line to the server and returns the reply text, unmodified
    ///
    /// # Errors
    /// returns an IO error if the connection failed or the server closed it
    pub fn send(&mut self, request: &str) -> Result<String> {
        self.stream.write_all(request.as_bytes())?;
        self.stream.flush()?;

        let mut buf = vec![0_u8; REPLY_BUFFER_SIZE];
        let len = self.stream.read(&mut buf)?;
        if len == 0 {
            return Err(PhonebookError::StringErr(
                "the server closed the connection".to_string(),
            ));
        }
        Ok(String::from_utf8_lossy(&buf[..len]).into_owned())
    }

    /// adds (or overwrites) a contact, returning the server's confirmation
    pub fn add(&mut self, first: &str, last: &str, phone: &str) -> Result<String> {
        self.request(&Request::Add {
            first: first.to_string(),
            last: last.to_string(),
            phone: phone.to_string(),
        })
    }

    /// gets the phone number of a contact
    /// ## Returns
    /// `Ok<Some<String>>` if the contact was found.
    /// `Ok<None>` if there is no such contact
    pub fn get(&mut self, first: &str, last: &str) -> Result<Option<String>> {
        let reply = self.request(&Request::Get {
            first: first.to_string(),
            last: last.to_string(),
        })?;
        Ok(found(reply))
    }

    /// replaces the phone number of a contact
    /// # Returns
    /// `Ok<Some<String>>` holding the confirmation, `Ok<None>` if there is no such contact
    pub fn update(&mut self, first: &str, last: &str, phone: &str) -> Result<Option<String>> {
        let reply = self.request(&Request::Update {
            first: first.to_string(),
            last: last.to_string(),
            phone: phone.to_string(),
        })?;
        Ok(found(reply))
    }

    /// removes a contact
    /// # Returns
    /// `Ok<Some<String>>` holding the confirmation, `Ok<None>` if there is no such contact
    pub fn remove(&mut self, first: &str, last: &str) -> Result<Option<String>> {
        let reply = self.request(&Request::Remove {
            first: first.to_string(),
            last: last.to_string(),
        })?;
        Ok(found(reply))
    }

    /// lists every contact as `name: phone` lines, empty if the directory is empty
    pub fn list(&mut self) -> Result<Vec<String>> {
        let reply = self.request(&Request::List)?;
        if reply == EMPTY {
            return Ok(vec![]);
        }
        Ok(reply.lines().map(String::from).collect())
    }

    /// sends `request` and turns an `ERROR:` reply into [`PhonebookError::StringErr`]
    fn request(&mut self, request: &Request) -> Result<String> {
        let reply = self.send(&request.to_string())?;
        match reply.strip_prefix(ERROR_PREFIX) {
            Some(msg) => Err(PhonebookError::StringErr(msg.to_string())),
            None => Ok(reply),
        }
    }
}

fn found(reply: String) -> Option<String> {
    if reply == NOT_FOUND {
        None
    } else {
        Some(reply)
    }
}
