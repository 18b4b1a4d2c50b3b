use std::net::{SocketAddr, TcpListener};
use std::process::Command;
use std::thread;

use assert_cmd::prelude::*;
use phonebook::thread_pool::{NaiveThreadPool, ThreadPool};
use phonebook::{PhonebookServer, PhonebookStore, Shutdown};
use predicates::str::{contains, is_empty};
use tempfile::TempDir;

// starts a server on an ephemeral port, it lives until the test process exits
fn start_server(dir: &TempDir) -> SocketAddr {
    let engine = PhonebookStore::open(&dir.path().join("PhonebookList.txt")).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let server = PhonebookServer::new(engine, NaiveThreadPool::new(0).unwrap());
    thread::spawn(move || server.serve(listener, Shutdown::new()));
    addr
}

fn client(args: &[&str], addr: SocketAddr) -> Command {
    let mut cmd = Command::cargo_bin("phonebook-client").unwrap();
    cmd.args(args).args(&["--addr", &addr.to_string()]);
    cmd
}

// `phonebook-client` with no args should exit with a non-zero code.
#[test]
fn client_cli_no_args() {
    Command::cargo_bin("phonebook-client").unwrap().assert().failure();
}

#[test]
fn client_cli_invalid_subcommand() {
    Command::cargo_bin("phonebook-client")
        .unwrap()
        .args(&["delete", "John", "Smith"])
        .assert()
        .failure();
}

#[test]
fn client_cli_invalid_addr() {
    Command::cargo_bin("phonebook-client")
        .unwrap()
        .args(&["list", "--addr", "not-an-address"])
        .assert()
        .failure()
        .stderr(contains("could not parse"));
}

#[test]
fn client_cli_session() {
    let temp_dir = TempDir::new().expect("unable to create temporary working directory");
    let addr = start_server(&temp_dir);

    client(&["list"], addr)
        .assert()
        .success()
        .stdout(contains("Phonebook is empty"));
    client(&["add", "John", "Smith", "555-1234"], addr)
        .assert()
        .success()
        .stdout(contains("John Smith -> 555-1234"));
    client(&["get", "John", "Smith"], addr)
        .assert()
        .success()
        .stdout("555-1234\n");
    client(&["update", "John", "Smith", "555-0000"], addr)
        .assert()
        .success()
        .stdout(contains("Old: 555-1234 -> New: 555-0000"));
    client(&["list"], addr)
        .assert()
        .success()
        .stdout("John Smith: 555-0000\n");
    client(&["remove", "John", "Smith"], addr)
        .assert()
        .success()
        .stdout(contains("John Smith"));
    client(&["get", "John", "Smith"], addr)
        .assert()
        .failure()
        .stdout(is_empty())
        .stderr(contains("Contact not found"));
}

#[test]
fn client_cli_server_error_is_a_failure() {
    let temp_dir = TempDir::new().expect("unable to create temporary working directory");
    let addr = start_server(&temp_dir);

    client(&["add", "John", " ", "555"], addr)
        .assert()
        .failure()
        .stderr(contains("Name, lastname and phone cannot be empty"));
    client(&["update", "No", "Body", "1"], addr)
        .assert()
        .failure()
        .stderr(contains("Contact not found"));
}
