//! Shared test utilities.

#![allow(dead_code, unused_imports)]

use cmdrunner::args::parse;
use cmdrunner::runners::RunContext;
use cmdrunner::stage::{DecoderStage, EncoderStage, Registry, RunnerStage};
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// Build a registered encoder from argument text.
pub fn encoder(name: &str, args: &str) -> EncoderStage {
    Registry::global()
        .encoders
        .build(name, args)
        .unwrap_or_else(|e| panic!("Failed to build encoder {name}: {e}"))
}

/// Build a registered decoder from argument text.
pub fn decoder(name: &str, args: &str) -> DecoderStage {
    Registry::global()
        .decoders
        .build(name, args)
        .unwrap_or_else(|e| panic!("Failed to build decoder {name}: {e}"))
}

/// Build a registered runner from argument text.
pub fn runner(name: &str, args: &str) -> RunnerStage {
    Registry::global()
        .runners
        .build(name, args)
        .unwrap_or_else(|e| panic!("Failed to build runner {name}: {e}"))
}

/// Run context with a short poll interval and grace period.
pub fn fast_ctx() -> RunContext {
    RunContext::new(Duration::from_millis(20), Duration::from_millis(200))
}

/// A request captured by [`http_stub`].
#[derive(Debug)]
pub struct CapturedRequest {
    pub head: String,
    pub body: String,
}

/// Serve one HTTP request on a random local port, answering with
/// `response_body`. Returns the base URL and a receiver for the request.
pub fn http_stub(response_body: &'static str) -> (String, mpsc::Receiver<CapturedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind stub listener");
    let url = format!("http://{}/exec", listener.local_addr().unwrap());
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let (stream, _) = listener.accept().expect("Failed to accept");
        let mut reader = BufReader::new(stream.try_clone().unwrap());

        let mut head = String::new();
        let mut content_length = 0usize;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            if line == "\r\n" || line.is_empty() {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                if name.eq_ignore_ascii_case("content-length") {
                    content_length = value.trim().parse().unwrap();
                }
            }
            head.push_str(&line);
        }

        let mut body = vec![0u8; content_length];
        reader.read_exact(&mut body).unwrap();

        let mut stream = stream;
        write!(
            stream,
            "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            response_body.len(),
            response_body
        )
        .unwrap();
        stream.flush().unwrap();

        let _ = tx.send(CapturedRequest {
            head,
            body: String::from_utf8(body).unwrap(),
        });
    });

    (url, rx)
}
