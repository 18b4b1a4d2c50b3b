use std::io::{ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_utils::sync::WaitGroup;
use phonebook::thread_pool::{NaiveThreadPool, SharedQueueThreadPool, ThreadPool};
use phonebook::{
    process_request, PhonebookClient, PhonebookEngine, PhonebookServer, PhonebookStore, Response,
    Result, Shutdown,
};
use tempfile::TempDir;

struct TestServer {
    addr: SocketAddr,
    shutdown: Shutdown,
    handle: JoinHandle<Result<()>>,
    engine: PhonebookStore,
}

impl TestServer {
    fn start<P: ThreadPool + Send + 'static>(dir: &TempDir, pool: P) -> TestServer {
        TestServer::start_with_timeout(dir, pool, Duration::from_secs(5))
    }

    fn start_with_timeout<P: ThreadPool + Send + 'static>(
        dir: &TempDir,
        pool: P,
        read_timeout: Duration,
    ) -> TestServer {
        let engine = PhonebookStore::open(&dir.path().join("PhonebookList.txt")).unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Shutdown::new();

        let server = PhonebookServer::new(engine.clone(), pool)
            .with_read_timeout(Some(read_timeout));
        let server_shutdown = shutdown.clone();
        let handle = thread::spawn(move || server.serve(listener, server_shutdown));
        TestServer {
            addr,
            shutdown,
            handle,
            engine,
        }
    }

    fn stop(self) -> PhonebookStore {
        self.shutdown.trigger(self.addr);
        self.handle.join().unwrap().unwrap();
        self.engine
    }
}

#[test]
fn add_get_remove_session() -> Result<()> {
    let temp_dir = TempDir::new().expect("unable to create temporary working directory");
    let server = TestServer::start(&temp_dir, NaiveThreadPool::new(0)?);
    let mut client = PhonebookClient::connect(server.addr)?;

    let added = client.send("ADD|John|Smith|555-1234")?;
    assert!(added.contains("John Smith"));
    assert!(added.contains("555-1234"));
    assert_eq!(client.send("GET|John|Smith")?, "555-1234");
    assert!(client.send("REMOVE|John|Smith")?.contains("555-1234"));
    assert_eq!(client.send("GET|John|Smith")?, "NOT_FOUND");

    server.stop();
    Ok(())
}

#[test]
fn error_replies_keep_the_connection_open() -> Result<()> {
    let temp_dir = TempDir::new().expect("unable to create temporary working directory");
    let server = TestServer::start(&temp_dir, NaiveThreadPool::new(0)?);
    let mut client = PhonebookClient::connect(server.addr)?;

    assert_eq!(
        client.send("ADD|OnlyName")?,
        "ERROR: Format should be ADD|Name|Lastname|Phone"
    );
    assert_eq!(
        client.send("ADD| |Smith|1")?,
        "ERROR: Name, lastname and phone cannot be empty"
    );
    assert!(client
        .send("DELETE|John|Smith")?
        .starts_with("ERROR: Unknown command 'DELETE'"));
    assert_eq!(client.send("UPDATE|No|Body|1")?, "NOT_FOUND");
    assert_eq!(client.send("REMOVE|No|Body")?, "NOT_FOUND");
    assert_eq!(client.send("list")?, "EMPTY");

    let engine = server.stop();
    assert!(engine.is_empty()?);
    Ok(())
}

#[test]
fn invalid_utf8_gets_an_error_reply() -> Result<()> {
    let temp_dir = TempDir::new().expect("unable to create temporary working directory");
    let server = TestServer::start(&temp_dir, NaiveThreadPool::new(0)?);

    let mut stream = TcpStream::connect(server.addr)?;
    stream.write_all(&[0xff, 0xfe, b'|'])?;
    let mut buf = [0_u8; 256];
    let len = stream.read(&mut buf)?;
    assert_eq!(&buf[..len], b"ERROR: request is not valid UTF-8");

    stream.write_all(b"LIST")?;
    let len = stream.read(&mut buf)?;
    assert_eq!(&buf[..len], b"EMPTY");

    server.stop();
    Ok(())
}

#[test]
fn typed_client_helpers() -> Result<()> {
    let temp_dir = TempDir::new().expect("unable to create temporary working directory");
    let server = TestServer::start(&temp_dir, SharedQueueThreadPool::new(2)?);
    let mut client = PhonebookClient::connect(server.addr)?;

    assert!(client.list()?.is_empty());
    client.add("John", "Smith", "1")?;
    client.add("Jane", "Doe", "2")?;
    assert_eq!(client.get("Jane", "Doe")?, Some("2".to_owned()));
    assert_eq!(client.get("No", "Body")?, None);

    let updated = client.update("Jane", "Doe", "3")?.unwrap();
    assert!(updated.contains("Jane Doe"));
    assert!(updated.contains('2') && updated.contains('3'));
    assert_eq!(client.update("No", "Body", "1")?, None);

    assert_eq!(client.list()?, vec!["John Smith: 1", "Jane Doe: 3"]);
    assert!(client.remove("John", "Smith")?.is_some());
    assert_eq!(client.remove("John", "Smith")?, None);

    assert!(client.add("", "Doe", "1").is_err());

    server.stop();
    Ok(())
}

// N clients adding distinct keys at the same time all persist
#[test]
fn concurrent_clients() -> Result<()> {
    let temp_dir = TempDir::new().expect("unable to create temporary working directory");
    let server = TestServer::start(&temp_dir, NaiveThreadPool::new(0)?);
    let addr = server.addr;

    let wg = WaitGroup::new();
    for t in 0..10 {
        let wg = wg.clone();
        thread::spawn(move || {
            let mut client = PhonebookClient::connect(addr).unwrap();
            for i in 0..10 {
                client
                    .add(&format!("client{}", t), &format!("n{}", i), &i.to_string())
                    .unwrap();
            }
            drop(wg);
        });
    }
    wg.wait();

    let mut client = PhonebookClient::connect(addr)?;
    assert_eq!(client.list()?.len(), 100);
    drop(client);

    server.stop();
    let reopened = PhonebookStore::open(&temp_dir.path().join("PhonebookList.txt"))?;
    assert_eq!(reopened.len()?, 100);
    Ok(())
}

// Restarting the server reloads what the previous one flushed
#[test]
fn restart_reloads_the_directory() -> Result<()> {
    let temp_dir = TempDir::new().expect("unable to create temporary working directory");

    let server = TestServer::start(&temp_dir, NaiveThreadPool::new(0)?);
    let mut client = PhonebookClient::connect(server.addr)?;
    client.add("John", "Smith", "1")?;
    client.add("Jane", "Doe", "2")?;
    client.update("John", "Smith", "11")?;
    drop(client);
    server.stop();

    let server = TestServer::start(&temp_dir, NaiveThreadPool::new(0)?);
    let mut client = PhonebookClient::connect(server.addr)?;
    assert_eq!(client.send("LIST")?, "John Smith: 11\nJane Doe: 2");
    server.stop();
    Ok(())
}

// a client that sends nothing is disconnected once the read timeout expires
#[test]
fn idle_connection_is_closed() -> Result<()> {
    let temp_dir = TempDir::new().expect("unable to create temporary working directory");
    let server = TestServer::start_with_timeout(
        &temp_dir,
        NaiveThreadPool::new(0)?,
        Duration::from_millis(200),
    );

    let mut stream = TcpStream::connect(server.addr)?;
    stream.set_read_timeout(Some(Duration::from_secs(5)))?;
    let started = Instant::now();
    let mut buf = [0_u8; 64];
    match stream.read(&mut buf) {
        Ok(0) => {}
        Ok(len) => panic!("unexpected reply: {:?}", &buf[..len]),
        Err(e) => assert!(
            e.kind() != ErrorKind::WouldBlock && e.kind() != ErrorKind::TimedOut,
            "the server did not close the idle connection"
        ),
    }
    assert!(started.elapsed() < Duration::from_secs(5));

    server.stop();
    Ok(())
}

#[test]
fn shutdown_stops_accepting() -> Result<()> {
    let temp_dir = TempDir::new().expect("unable to create temporary working directory");
    let server = TestServer::start(&temp_dir, NaiveThreadPool::new(0)?);
    let addr = server.addr;
    server.stop();

    // the listener is closed once the accept loop has returned
    assert!(TcpStream::connect(addr).is_err());
    Ok(())
}

#[test]
fn dispatch_without_a_socket() -> Result<()> {
    let temp_dir = TempDir::new().expect("unable to create temporary working directory");
    let engine = PhonebookStore::open(&temp_dir.path().join("PhonebookList.txt"))?;

    assert_eq!(
        process_request(&engine, "add|John|Smith|555"),
        Response::Added {
            key: "John Smith".to_owned(),
            phone: "555".to_owned()
        }
    );
    assert_eq!(
        process_request(&engine, "UPDATE|John|Smith|556").to_string(),
        "Updated: John Smith | Old: 555 -> New: 556"
    );
    assert_eq!(
        process_request(&engine, "REMOVE|John|Smith").to_string(),
        "Deleted: John Smith (556)"
    );
    assert_eq!(process_request(&engine, "LIST"), Response::Empty);
    assert!(engine.list()?.is_empty());
    Ok(())
}
