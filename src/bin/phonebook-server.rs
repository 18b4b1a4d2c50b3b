//! this binary starts the phonebook server
//! to see the list of options, type: `phonebook-server --help`

use std::net::{SocketAddr, TcpListener};
use std::path::PathBuf;
use std::process::exit;
use std::thread;
use std::time::Duration;

use clap::{arg_enum, crate_version, value_t, App, Arg};
use phonebook::{
    NaiveThreadPool, PhonebookError, PhonebookServer, PhonebookStore, Result,
    SharedQueueThreadPool, Shutdown, ThreadPool,
};
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

arg_enum! {
    #[allow(non_camel_case_types)]
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    enum Pool {
        naive,
        shared
    }
}

const DEFAULT_ADDRESS: &str = "127.0.0.1:6000";
const DEFAULT_FILE: &str = "PhonebookList.txt";
const DEFAULT_THREADS: &str = "4";

/// ['Opt'] holds parsed and validated options from the command line
#[derive(Debug)]
struct Opt {
    addr: SocketAddr,
    file: PathBuf,
    pool: Pool,
    threads: u32,
    read_timeout: Option<Duration>,
}

impl Opt {
    /// validates the `addr`, `threads` and `read_timeout` parameters
    /// returns `Ok<Opt>` if everything is valid
    /// # Errors
    /// returns [`PhonebookError::Parsing`] if one of the parameters is invalid
    ///
    fn build(
        addr: &str,
        file: &str,
        pool: Pool,
        threads: &str,
        read_timeout: Option<&str>,
    ) -> Result<Opt> {
        let addr: SocketAddr = addr.parse().map_err(|_| {
            PhonebookError::Parsing(format!("could not parse {} into an IP address and port", addr))
        })?;
        let threads: u32 = threads
            .parse()
            .ok()
            .filter(|&n| n > 0)
            .ok_or_else(|| {
                PhonebookError::Parsing(format!("{} is not a positive thread count", threads))
            })?;
        let read_timeout = read_timeout
            .map(|secs| {
                secs.parse::<u64>()
                    .ok()
                    .filter(|&n| n > 0)
                    .map(Duration::from_secs)
                    .ok_or_else(|| {
                        PhonebookError::Parsing(format!("{} is not a positive number of seconds", secs))
                    })
            })
            .transpose()?;

        Ok(Opt {
            addr,
            file: PathBuf::from(file),
            pool,
            threads,
            read_timeout,
        })
    }
}

fn main() {
    // set up a tracing subscriber to log to STDERR
    subscriber_config();

    // parse command line args
    let matches = App::new("phonebook-server")
        .version(crate_version!())
        .author("strohs <strohs1@gmail.com>")
        .about("a multi-threaded contact directory server")
        .arg(Arg::with_name("addr")
            .long("addr")
            .value_name("IP_ADDR:PORT")
            .help("sets the IP_ADDR:PORT that the server listens on")
            .default_value(DEFAULT_ADDRESS))
        .arg(Arg::with_name("file")
            .long("file")
            .value_name("PATH")
            .help("sets the file the phonebook is loaded from and saved to")
            .default_value(DEFAULT_FILE))
        .arg(Arg::with_name("pool")
            .long("pool")
            .value_name("POOL")
            .help("'naive' starts a thread per connection, 'shared' uses a fixed set of workers")
            .possible_values(&Pool::variants())
            .default_value("naive"))
        .arg(Arg::with_name("threads")
            .long("threads")
            .value_name("N")
            .help("sets the number of workers of the 'shared' pool")
            .default_value(DEFAULT_THREADS))
        .arg(Arg::with_name("read-timeout")
            .long("read-timeout")
            .value_name("SECONDS")
            .help("closes connections that stay idle for this many seconds"))
        .get_matches();

    // validate command line options, store them in Opt
    let pool = value_t!(matches, "pool", Pool).unwrap_or(Pool::naive);
    let opt = match Opt::build(
        matches.value_of("addr").unwrap_or(DEFAULT_ADDRESS),
        matches.value_of("file").unwrap_or(DEFAULT_FILE),
        pool,
        matches.value_of("threads").unwrap_or(DEFAULT_THREADS),
        matches.value_of("read-timeout"),
    ) {
        Ok(opt) => opt,
        Err(err) => {
            eprintln!("{}", err);
            exit(1);
        }
    };

    // start the server
    if let Err(e) = run(opt) {
        error!("{}", e);
        exit(1);
    }
}

fn run(opt: Opt) -> Result<()> {
    info!("phonebook-server {}", env!("CARGO_PKG_VERSION"));
    info!("Phonebook file: {:?}", opt.file);
    info!("Thread pool: {}", opt.pool);

    let engine = PhonebookStore::open(&opt.file)?;
    let listener = TcpListener::bind(opt.addr)?;
    let shutdown = Shutdown::new();
    watch_signals(shutdown.clone(), listener.local_addr()?)?;

    match opt.pool {
        Pool::naive => run_with_pool(
            engine.clone(),
            NaiveThreadPool::new(opt.threads)?,
            listener,
            shutdown,
            opt.read_timeout,
        )?,
        Pool::shared => run_with_pool(
            engine.clone(),
            SharedQueueThreadPool::new(opt.threads)?,
            listener,
            shutdown,
            opt.read_timeout,
        )?,
    }

    engine.flush()?;
    info!("saved {} contacts, server stopped", engine.len()?);
    Ok(())
}

fn run_with_pool<P: ThreadPool>(
    engine: PhonebookStore,
    pool: P,
    listener: TcpListener,
    shutdown: Shutdown,
    read_timeout: Option<Duration>,
) -> Result<()> {
    let server = PhonebookServer::new(engine, pool).with_read_timeout(read_timeout);
    server.serve(listener, shutdown)
}

/// stops the accept loop on `addr` when SIGINT or SIGTERM is received
fn watch_signals(shutdown: Shutdown, addr: SocketAddr) -> Result<()> {
    let mut signals = Signals::new(&[SIGINT, SIGTERM])?;
    thread::Builder::new()
        .name("phonebook-signals".to_string())
        .spawn(move || {
            if let Some(sig) = signals.forever().next() {
                info!("received signal {}, shutting down", sig);
                shutdown.trigger(addr);
            }
        })?;
    Ok(())
}

/// configures a tracing subscriber that will log to STDERR
fn subscriber_config() {
    let subscriber = FmtSubscriber::builder()
        // all spans/events with a level of INFO or higher will be written
        .with_max_level(Level::INFO)
        // log to stderr instead of stdout
        .with_writer(std::io::stderr)
        // completes the builder.
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("setting tracing default subscriber failed");
}
