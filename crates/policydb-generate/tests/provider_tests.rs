use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;

use policydb_core::config::{GenerationSettings, ProviderKind};
use policydb_core::traits::TextGenerator;
use policydb_core::Error;
use policydb_generate::Collaborator;

const SYSTEM: &str = "You are a clinical assistant. Use only the provided context.";

/// Serve the given `(status, body)` responses, one connection each, and hand
/// back every raw request received.
fn serve(responses: Vec<(u16, &'static str)>) -> (String, mpsc::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}/v1", listener.local_addr().unwrap());
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for (status, body) in responses {
            let (mut stream, _) = listener.accept().unwrap();
            let request = read_request(&mut stream);
            tx.send(request).unwrap();
            let reason = if status == 200 { "OK" } else { "Error" };
            let reply = format!(
                "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(reply.as_bytes()).unwrap();
        }
    });
    (base, rx)
}

fn read_request(stream: &mut std::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = stream.read(&mut chunk).unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&buf).to_string();
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|l| l.to_ascii_lowercase().strip_prefix("content-length:").map(|v| v.trim().parse::<usize>().unwrap()))
                .unwrap_or(0);
            if buf.len() >= header_end + 4 + content_length {
                return text;
            }
        }
    }
    String::from_utf8_lossy(&buf).to_string()
}

fn settings(provider: ProviderKind, base_url: &str) -> GenerationSettings {
    GenerationSettings {
        provider,
        api_key: "test-key".into(),
        base_url: base_url.into(),
        timeout_secs: 5,
        max_retries: 1,
        retry_backoff_ms: 0,
        ..GenerationSettings::default()
    }
}

#[test]
fn disabled_provider_reports_configuration_error() {
    let c = Collaborator::from_settings(&GenerationSettings::default()).unwrap();
    assert!(!c.is_available());
    assert_eq!(c.provider(), "none");
    assert!(matches!(c.generate("hi", SYSTEM), Err(Error::Configuration(_))));
}

#[test]
fn openai_chat_completion_is_parsed() {
    let (base, requests) = serve(vec![(200, r#"{"choices":[{"message":{"content":"Refunds take 14 days."}}]}"#)]);
    let c = Collaborator::from_settings(&settings(ProviderKind::OpenAi, &base)).unwrap();
    assert_eq!(c.generate("refund timeline?", SYSTEM).unwrap(), "Refunds take 14 days.");

    let raw = requests.recv().unwrap();
    assert!(raw.starts_with("POST /v1/chat/completions"));
    assert!(raw.to_ascii_lowercase().contains("authorization: bearer test-key"));
    assert!(raw.contains("gpt-4o-mini"));
    assert!(raw.contains("You are a clinical assistant."));
}

#[test]
fn anthropic_retries_server_error_then_succeeds() {
    let (base, requests) = serve(vec![
        (503, r#"{"error":"overloaded"}"#),
        (200, r#"{"content":[{"type":"text","text":"Mock compliance report."}]}"#),
    ]);
    let c = Collaborator::from_settings(&settings(ProviderKind::Anthropic, &base)).unwrap();
    assert_eq!(c.generate("review", SYSTEM).unwrap(), "Mock compliance report.");

    let first = requests.recv().unwrap().to_ascii_lowercase();
    assert!(first.starts_with("post /v1/messages"));
    assert!(first.contains("x-api-key: test-key"));
    assert!(first.contains("anthropic-version: 2023-06-01"));
    assert!(first.contains("\"max_tokens\":512"));
    assert!(requests.recv().is_ok(), "second attempt expected");
}

#[test]
fn client_error_is_not_retried() {
    let (base, requests) = serve(vec![(401, r#"{"error":"invalid key"}"#)]);
    let c = Collaborator::from_settings(&settings(ProviderKind::OpenAi, &base)).unwrap();
    let err = c.generate("hi", SYSTEM).unwrap_err();
    assert!(matches!(err, Error::Provider { status: 401, .. }));
    assert!(requests.recv().is_ok());
}

#[test]
fn unreachable_endpoint_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let c = Collaborator::from_settings(&settings(ProviderKind::OpenAi, &format!("http://{addr}/v1"))).unwrap();
    assert!(matches!(c.generate("hi", SYSTEM), Err(Error::Transport(_))));
}

#[test]
fn reply_without_completion_is_provider_error() {
    let (base, requests) = serve(vec![(200, r#"{"choices":[]}"#)]);
    let c = Collaborator::from_settings(&settings(ProviderKind::OpenAi, &base)).unwrap();
    let err = c.generate("hi", SYSTEM).unwrap_err();
    assert!(matches!(&err, Error::Provider { status: 200, body, .. } if body == "empty response"), "got {err:?}");
    assert!(requests.recv().is_ok());

    let (base, _requests) = serve(vec![(200, r#"{"content":[]}"#)]);
    let c = Collaborator::from_settings(&settings(ProviderKind::Anthropic, &base)).unwrap();
    assert!(matches!(c.generate("hi", SYSTEM), Err(Error::Provider { status: 200, .. })));
}
