//! The phonebook-client executable supports the following command line arguments:
//!
//! `phonebook-client add <FIRST> <LAST> <PHONE> [--addr IP-PORT]`
//!
//!     Add a contact, overwriting the phone of an existing contact with the same name.
//!
//! `phonebook-client get <FIRST> <LAST> [--addr IP-PORT]`
//!
//!     Print the phone number of a contact.
//!
//! `phonebook-client update <FIRST> <LAST> <PHONE> [--addr IP-PORT]`
//!
//!     Replace the phone number of an existing contact.
//!
//! `phonebook-client remove <FIRST> <LAST> [--addr IP-PORT]`
//!
//!     Remove a contact.
//!
//! `phonebook-client list [--addr IP-PORT]`
//!
//!     Print every contact.
//!
//! --addr accepts an IP address, either v4 or v6, and a port number, with the format IP:PORT.
//! If --addr is not specified then connect on 127.0.0.1:6000.
//! A contact that does not exist prints "Contact not found" and is treated as an error, as is
//! any `ERROR:` reply from the server.

use std::net::SocketAddr;
use std::process::exit;

use clap::{crate_version, App, AppSettings, Arg, ArgMatches, SubCommand};
use phonebook::{PhonebookClient, PhonebookError, Request, Result};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

const DEFAULT_ADDRESS: &str = "127.0.0.1:6000";

/// ['Opt'] holds parsed and validated options from the command line
#[derive(Debug)]
struct Opt {
    /// the server's ip:port
    addr: SocketAddr,
    req: Request,
}

impl Opt {
    /// validates the `addr` parameter is a valid IP address and PORT
    /// returns `Ok<Opt>` if everything is valid
    /// # Errors
    /// returns [`PhonebookError::Parsing`] if the address is invalid
    ///
    fn build(addr: &str, req: Request) -> Result<Opt> {
        let addr: SocketAddr = addr.parse().map_err(|_| {
            PhonebookError::Parsing(format!("could not parse {} into an IP address and port", addr))
        })?;

        Ok(Opt { addr, req })
    }
}

fn main() {
    // configure a subscriber that will log messages to STDERR
    subscriber_config();

    let matches = App::new("phonebook-client")
        .version(crate_version!())
        .author("strohs <strohs1@gmail.com>")
        .about("a client for the phonebook server")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommands(vec![
            SubCommand::with_name("add")
                .about("Add a contact, overwriting an existing one")
                .args(&name_args())
                .arg(Arg::with_name("PHONE").required(true).index(3))
                .arg(addr_arg()),
            SubCommand::with_name("get")
                .about("Get the phone number of a contact")
                .args(&name_args())
                .arg(addr_arg()),
            SubCommand::with_name("update")
                .about("Replace the phone number of a contact")
                .args(&name_args())
                .arg(Arg::with_name("PHONE").required(true).index(3))
                .arg(addr_arg()),
            SubCommand::with_name("remove")
                .about("Remove a contact")
                .args(&name_args())
                .arg(addr_arg()),
            SubCommand::with_name("list")
                .about("List every contact")
                .arg(addr_arg()),
        ])
        .get_matches();

    // parse commands into an Opt struct, then run the request
    if let Err(e) = parse_options(&matches).and_then(run) {
        eprintln!("{}", e);
        exit(1);
    }
}

/// runs the specified request on a [`PhonebookClient`]
/// `opt` contains the server address and the request to execute
fn run(opt: Opt) -> Result<()> {
    let mut client = PhonebookClient::connect(opt.addr)?;
    match opt.req {
        Request::Add { first, last, phone } => {
            println!("{}", client.add(&first, &last, &phone)?);
        }
        Request::Get { first, last } => {
            let phone = client.get(&first, &last)?.ok_or(PhonebookError::NotFound)?;
            println!("{}", phone);
        }
        Request::Update { first, last, phone } => {
            let reply = client
                .update(&first, &last, &phone)?
                .ok_or(PhonebookError::NotFound)?;
            println!("{}", reply);
        }
        Request::Remove { first, last } => {
            let reply = client.remove(&first, &last)?.ok_or(PhonebookError::NotFound)?;
            println!("{}", reply);
        }
        Request::List => {
            let lines = client.list()?;
            if lines.is_empty() {
                println!("Phonebook is empty");
            }
            for line in lines {
                println!("{}", line);
            }
        }
    }
    Ok(())
}

/// parses the matches from the command line into an [`Opt`] struct
fn parse_options(matches: &ArgMatches) -> Result<Opt> {
    let (req, args) = match matches.subcommand() {
        ("add", Some(args)) => (
            Request::Add {
                first: value(args, "FIRST"),
                last: value(args, "LAST"),
                phone: value(args, "PHONE"),
            },
            args,
        ),
        ("get", Some(args)) => (
            Request::Get {
                first: value(args, "FIRST"),
                last: value(args, "LAST"),
            },
            args,
        ),
        ("update", Some(args)) => (
            Request::Update {
                first: value(args, "FIRST"),
                last: value(args, "LAST"),
                phone: value(args, "PHONE"),
            },
            args,
        ),
        ("remove", Some(args)) => (
            Request::Remove {
                first: value(args, "FIRST"),
                last: value(args, "LAST"),
            },
            args,
        ),
        ("list", Some(args)) => (Request::List, args),
        (cmd, _) => {
            return Err(PhonebookError::Parsing(format!("unknown command: {}", cmd)))
        }
    };
    Opt::build(&value(args, "addr"), req)
}

/// the FIRST and LAST positional arguments shared by every contact subcommand
fn name_args<'a, 'b>() -> Vec<Arg<'a, 'b>> {
    vec![
        Arg::with_name("FIRST").required(true).index(1),
        Arg::with_name("LAST").required(true).index(2),
    ]
}

fn addr_arg<'a, 'b>() -> Arg<'a, 'b> {
    Arg::with_name("addr")
        .long("addr")
        .value_name("IP_ADDR:PORT")
        .help("sets the IP_ADDR:PORT of the server to connect to")
        .default_value(DEFAULT_ADDRESS)
}

fn value(args: &ArgMatches, name: &str) -> String {
    args.value_of(name).map(String::from).unwrap_or_default()
}

/// configures a tracing subscriber that will log to STDERR
fn subscriber_config() {
    let subscriber = FmtSubscriber::builder()
        // only warnings and errors, stdout is reserved for the server's replies
        .with_max_level(Level::WARN)
        // log to stderr instead of stdout
        .with_writer(std::io::stderr)
        // completes the builder.
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("setting tracing default subscriber failed");
}
