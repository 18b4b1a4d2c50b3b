use std::io::{ErrorKind, Read, Write};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::command::{Request, Response};
use crate::thread_pool::ThreadPool;
use crate::{PhonebookEngine, Result};

/// size of the buffer a connection reads a request into. One read is one request
const READ_BUFFER_SIZE: usize = 1024;

/// A TCP socket server implementation over a [`PhonebookEngine`].
/// It accepts connections on a [`SocketAddr`](https://doc.rust-lang.org/std/net/enum.SocketAddr.html)
/// and hands each one to the [`ThreadPool`], where a connection handler reads requests,
/// dispatches them to the engine and writes back the response text.
///
/// Each connection handler receives its own handle (a clone) of the engine.
///
/// # Example
/// Create and run a new server listening on "127.0.0.1:6000" that starts a thread per
/// connection, using a phonebook persisted to "PhonebookList.txt"
/// ```rust,no_run
/// use std::path::Path;
/// use phonebook::{PhonebookServer, PhonebookStore, Shutdown};
/// use phonebook::thread_pool::{NaiveThreadPool, ThreadPool};
/// # fn main() -> phonebook::Result<()> {
/// let engine = PhonebookStore::open(Path::new("PhonebookList.txt"))?;
/// let server = PhonebookServer::new(engine, NaiveThreadPool::new(0)?);
/// server.run("127.0.0.1:6000", Shutdown::new())?;
/// # Ok(())
/// # }
/// ```
pub struct PhonebookServer<E: PhonebookEngine, P: ThreadPool> {
    /// the phonebook engine to use
    engine: E,
    /// the pool that runs the connection handlers
    pool: P,
    /// how long a connection may sit idle before it is closed
    read_timeout: Option<Duration>,
}

impl<E: PhonebookEngine, P: ThreadPool> PhonebookServer<E, P> {
    /// Create a new `PhonebookServer` using the given [`PhonebookEngine`] and [`ThreadPool`]
    /// implementation.
    pub fn new(engine: E, pool: P) -> Self {
        PhonebookServer {
            engine,
            pool,
            read_timeout: None,
        }
    }

    /// closes connections that do not send a request within `timeout`.
    /// Without a timeout a silent client holds its handler forever
    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// binds to `addr` and serves connections until `shutdown` is triggered
    ///
    /// # Errors
    /// returns an IO error if the server could not bind to `addr`
    pub fn run<A: ToSocketAddrs>(self, addr: A, shutdown: Shutdown) -> Result<()> {
        let listener = TcpListener::bind(addr)?;
        self.serve(listener, shutdown)
    }

    /// accepts connections on `listener` until `shutdown` is triggered. Each connection is
    /// serviced on the thread pool and the accept loop immediately continues.
    ///
    /// Connection handlers that are still running when the loop stops are not waited for.
    pub fn serve(self, listener: TcpListener, shutdown: Shutdown) -> Result<()> {
        info!("Listening on {}", listener.local_addr()?);
        for stream in listener.incoming() {
            if shutdown.is_triggered() {
                info!("shutdown requested, no longer accepting connections");
                break;
            }
            match stream {
                Ok(stream) => {
                    let engine = self.engine.clone();
                    let read_timeout = self.read_timeout;
                    self.pool.spawn(move || {
                        if let Err(e) = serve(engine, stream, read_timeout) {
                            error!("Error on serving client: {}", e);
                        }
                    });
                }
                Err(e) => error!("Connection failed: {}", e),
            }
        }
        Ok(())
    }
}

/// A handle that stops a running [`PhonebookServer`] accept loop.
///
/// Cloned handles share the same flag, so one clone can be moved into a signal handler while
/// another is given to [`PhonebookServer::run`].
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    triggered: Arc<AtomicBool>,
}

impl Shutdown {
    /// creates a handle that has not been triggered
    pub fn new() -> Self {
        Shutdown::default()
    }

    /// asks the server listening on `addr` to stop accepting connections.
    ///
    /// The accept loop only sees the flag once `accept` returns, so this also opens (and
    /// immediately drops) a connection to `addr` to wake it up.
    pub fn trigger(&self, mut addr: SocketAddr) {
        self.triggered.store(true, Ordering::SeqCst);
        // a listener bound to 0.0.0.0 or [::] is reachable on loopback
        if addr.ip().is_unspecified() {
            let loopback = match addr {
                SocketAddr::V4(_) => IpAddr::V4(Ipv4Addr::LOCALHOST),
                SocketAddr::V6(_) => IpAddr::V6(Ipv6Addr::LOCALHOST),
            };
            addr.set_ip(loopback);
        }
        if let Err(e) = TcpStream::connect(addr) {
            warn!("could not wake up the listener on {}: {}", addr, e);
        }
    }

    /// returns true once [`trigger`](#method.trigger) has been called
    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }
}

/// The connection handler: reads requests from `tcp`, processes each with the `engine` and
/// writes the response back, until the peer closes the connection.
///
/// Every read is treated as one whole request; clients are expected to send one command per
/// write and to wait for its reply before sending the next.
///
/// # Errors
/// returns the socket error that ended the connection
fn serve<E: PhonebookEngine>(
    engine: E,
    mut tcp: TcpStream,
    read_timeout: Option<Duration>,
) -> Result<()> {
    let peer_addr = tcp.peer_addr()?;
    tcp.set_read_timeout(read_timeout)?;
    info!("Client connected: {}", peer_addr);

    let mut buf = [0_u8; READ_BUFFER_SIZE];
    loop {
        let len = match tcp.read(&mut buf) {
            Ok(0) => break,
            Ok(len) => len,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };

        let response = match std::str::from_utf8(&buf[..len]) {
            Ok(request) => {
                debug!("Receive request from {}: {:?}", peer_addr, request.trim());
                process_request(&engine, request)
            }
            Err(_) => Response::Error("request is not valid UTF-8".to_string()),
        };

        let reply = response.to_string();
        tcp.write_all(reply.as_bytes())?;
        tcp.flush()?;
        debug!("Response sent to {}: {:?}", peer_addr, reply);
    }

    info!("Client disconnected: {}", peer_addr);
    Ok(())
}

/// parses one request line and executes it on `engine`.
///
/// Every failure, from a malformed line to a poisoned directory lock, is turned into a
/// [`Response`], so processing a request never ends the connection.
pub fn process_request<E: PhonebookEngine>(engine: &E, line: &str) -> Response {
    match line.parse::<Request>() {
        Ok(request) => dispatch(engine, request),
        Err(e) => e.into(),
    }
}

/// executes a parsed [`Request`] on `engine` and maps the outcome to its [`Response`]
pub fn dispatch<E: PhonebookEngine>(engine: &E, request: Request) -> Response {
    let outcome = match request {
        Request::Add { first, last, phone } => engine
            .add(&first, &last, &phone)
            .map(|key| Response::Added { key, phone }),
        Request::Get { first, last } => engine.get(&first, &last).map(|phone| match phone {
            Some(phone) => Response::Phone(phone),
            None => Response::NotFound,
        }),
        Request::Update { first, last, phone } => {
            engine
                .update(&first, &last, &phone)
                .map(|(old, new)| Response::Updated {
                    key: crate::engine::contact_key(&first, &last),
                    old,
                    new,
                })
        }
        Request::Remove { first, last } => {
            engine.remove(&first, &last).map(|phone| Response::Removed {
                key: crate::engine::contact_key(&first, &last),
                phone,
            })
        }
        Request::List => engine.list().map(|entries| {
            if entries.is_empty() {
                Response::Empty
            } else {
                Response::Listing(entries)
            }
        }),
    };
    outcome.unwrap_or_else(Response::from)
}
