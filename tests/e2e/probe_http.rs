//! Probing a real HTTP endpoint served from a local listener

use infracheck::probe::{HttpTransport, ThreadSleeper, Transport};
use infracheck::{ProbePolicy, Prober};
use reqwest::Url;
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::helpers::NoSleep;

/// Answers one connection per status in `statuses`, then stops.
fn serve(statuses: Vec<u16>) -> (Url, JoinHandle<usize>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind listener");
    let addr = listener.local_addr().unwrap();
    let handle = thread::spawn(move || {
        let mut served = 0;
        for status in statuses {
            let (stream, _) = listener.accept().expect("Failed to accept");
            respond(stream, status);
            served += 1;
        }
        served
    });
    let url = Url::parse(&format!("http://{addr}/")).unwrap();
    (url, handle)
}

fn respond(mut stream: TcpStream, status: u16) {
    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line).unwrap_or(0) == 0 || line == "\r\n" {
            break;
        }
    }
    let body = "warming up";
    let response = format!(
        "HTTP/1.1 {status} Status\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(response.as_bytes()).unwrap();
    stream.flush().unwrap();
}

/// A URL whose port has nothing listening on it.
fn closed_port_url() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    Url::parse(&format!("http://{addr}/")).unwrap()
}

/// Plain client that ignores any proxy configured in the environment
fn local_transport() -> HttpTransport {
    let client = reqwest::blocking::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap();
    HttpTransport::with_client(client)
}

fn http_prober() -> Prober<HttpTransport, NoSleep> {
    Prober::new(local_transport(), NoSleep::default())
}

#[test]
fn test_default_transport_builds() {
    assert!(HttpTransport::new().is_ok());
}

#[test]
fn test_transport_reports_status_without_tls() {
    let (url, server) = serve(vec![404]);
    let response = local_transport().get(&url).unwrap();

    assert_eq!(response.status, 404);
    assert!(!response.tls);
    assert!(!response.is_secure());
    assert_eq!(server.join().unwrap(), 1);
}

#[test]
fn test_probe_retries_5xx_until_available() {
    let (url, server) = serve(vec![503, 502, 200]);
    let prober = http_prober();
    let policy = ProbePolicy::new(5, Duration::from_secs(30)).unwrap();

    let result = prober.probe(&url, &policy);

    assert!(result.succeeded);
    assert_eq!(result.attempts, 3);
    assert_eq!(result.last_status, Some(200));
    assert_eq!(result.secure_transport, Some(false));
    assert_eq!(server.join().unwrap(), 3);
}

#[test]
fn test_probe_accepts_client_error_as_available() {
    let (url, server) = serve(vec![403]);
    let policy = ProbePolicy::new(3, Duration::ZERO).unwrap();

    let result = http_prober().probe(&url, &policy);

    assert!(result.succeeded);
    assert_eq!(result.attempts, 1);
    assert_eq!(result.last_status, Some(403));
    server.join().unwrap();
}

#[test]
fn test_probe_gives_up_after_budget_of_5xx() {
    let (url, server) = serve(vec![500, 500, 500]);
    let prober = http_prober();
    let policy = ProbePolicy::new(3, Duration::from_millis(5)).unwrap();

    let result = prober.probe(&url, &policy);

    assert!(!result.succeeded);
    assert_eq!(result.attempts, 3);
    assert_eq!(result.last_status, Some(500));
    assert_eq!(result.secure_transport, None);
    assert_eq!(server.join().unwrap(), 3);
}

#[test]
fn test_probe_connection_refused_counts_as_failed_attempt() {
    let url = closed_port_url();
    let sleeper = NoSleep::default();
    let prober = Prober::new(local_transport(), sleeper);
    let policy = ProbePolicy::new(2, Duration::from_millis(10)).unwrap();

    let result = prober.probe(&url, &policy);

    assert!(!result.succeeded);
    assert_eq!(result.attempts, 2);
    assert_eq!(result.last_status, None);
}

#[test]
fn test_real_sleeper_waits_between_attempts() {
    let url = closed_port_url();
    let prober = Prober::new(local_transport(), ThreadSleeper);
    let policy = ProbePolicy::new(3, Duration::from_millis(50)).unwrap();

    let started = std::time::Instant::now();
    let result = prober.probe(&url, &policy);

    assert!(!result.succeeded);
    assert!(started.elapsed() >= Duration::from_millis(100));
}
