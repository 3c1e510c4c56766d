//! End-to-end sampler tests against a canned Ollama endpoint

use hud_core::Sampler;
use hud_ollama::{OllamaSampler, OllamaSamplerConfig};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

const VERSION_BODY: &str = r#"{"version":"0.5.7"}"#;

const TAGS_BODY: &str = r#"{
    "models": [
        {"name": "llama3:8b", "size": 6654373888,
         "details": {"family": "llama", "parameter_size": "8.0B", "quantization_level": "Q4_0"}},
        {"name": "phi3:mini", "size": 2300000000,
         "details": {"family": "phi3", "parameter_size": "3.8B", "quantization_level": "Q4_0"}}
    ]
}"#;

const PS_BODY: &str = r#"{
    "models": [
        {"name": "llama3:8b", "model": "llama3:8b", "size": 6654373888,
         "digest": "abc123", "expires_at": "2026-08-06T12:34:56Z",
         "size_vram": 7000000000,
         "details": {"family": "llama", "parameter_size": "8.0B", "quantization_level": "Q4_0"}}
    ]
}"#;

const SHOW_BODY: &str = r#"{
    "model_info": {
        "general.architecture": "llama",
        "llama.block_count": 32,
        "llama.attention.head_count": 32,
        "llama.attention.head_count_kv": 8,
        "llama.embedding_length": 4096,
        "llama.context_length": 8192
    },
    "details": {"family": "llama"},
    "parameters": "num_ctx 4096\nstop \"<|eot_id|>\""
}"#;

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Serve one HTTP/1.1 request with a canned response and close.
async fn handle_connection(mut stream: TcpStream, show_calls: Arc<AtomicUsize>) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];

    let (head, body_start) = loop {
        let n = match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = find_subsequence(&buf, b"\r\n\r\n") {
            break (String::from_utf8_lossy(&buf[..pos]).to_string(), pos + 4);
        }
    };

    let content_length = head
        .lines()
        .find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())
                .flatten()
        })
        .unwrap_or(0);

    while buf.len() < body_start + content_length {
        let n = match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);
    }

    let path = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();

    let (content_type, body) = match path.as_str() {
        "/" => ("text/plain", "Ollama is running".to_string()),
        "/api/version" => ("application/json", VERSION_BODY.to_string()),
        "/api/tags" => ("application/json", TAGS_BODY.to_string()),
        "/api/ps" => ("application/json", PS_BODY.to_string()),
        "/api/show" => {
            show_calls.fetch_add(1, Ordering::SeqCst);
            ("application/json", SHOW_BODY.to_string())
        }
        _ => ("text/plain", "not found".to_string()),
    };

    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        content_type,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

/// Start a canned Ollama endpoint; returns its base URL and the /api/show
/// call counter.
async fn start_fake_ollama() -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let show_calls = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&show_calls);
    tokio::spawn(async move {
        loop {
            let (stream, _) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(_) => break,
            };
            tokio::spawn(handle_connection(stream, Arc::clone(&counter)));
        }
    });

    (format!("http://{}", addr), show_calls)
}

#[tokio::test]
async fn test_poll_joins_catalog_and_architecture_metadata() {
    let (endpoint, _show_calls) = start_fake_ollama().await;

    let config = OllamaSamplerConfig::new()
        .with_endpoint(&endpoint)
        .unwrap()
        .with_request_timeout(Duration::from_secs(2));
    let sampler = OllamaSampler::new(config).unwrap();

    sampler.poll().await;
    let stats = sampler.latest().await.expect("poll should store a snapshot");

    assert!(stats.running);
    assert_eq!(stats.version, "0.5.7");
    assert_eq!(stats.available_models_count, 2);
    assert_eq!(stats.total_disk_usage_bytes, 6_654_373_888 + 2_300_000_000);

    assert_eq!(stats.running_models.len(), 1);
    let model = &stats.running_models[0];
    assert_eq!(model.name, "llama3:8b");
    assert_eq!(model.size_vram_bytes, 7_000_000_000);
    assert_eq!(model.family, "llama");
    assert_eq!(model.quantization, "Q4_0");

    // num_ctx override (4096) beats the architecture ceiling (8192).
    assert_eq!(model.context_window, 4096);
    assert_eq!(model.kv_cache.dtype, "f16");
    assert_eq!(model.kv_cache.bytes_per_token, 131_072);
    assert_eq!(model.kv_cache.max_size_bytes, 536_870_912);
    assert_eq!(model.vram.total_bytes, 7_000_000_000);
    assert_eq!(model.vram.kv_cache_max_bytes, 536_870_912);
    assert_eq!(model.vram.weights_est_bytes, 7_000_000_000 - 536_870_912);
}

#[tokio::test]
async fn test_architecture_metadata_is_fetched_once_per_model() {
    let (endpoint, show_calls) = start_fake_ollama().await;

    let config = OllamaSamplerConfig::new()
        .with_endpoint(&endpoint)
        .unwrap()
        .with_request_timeout(Duration::from_secs(2));
    let sampler = OllamaSampler::new(config).unwrap();

    sampler.poll().await;
    sampler.poll().await;
    sampler.poll().await;

    assert_eq!(show_calls.load(Ordering::SeqCst), 1);
    let stats = sampler.latest().await.unwrap();
    assert_eq!(stats.running_models.len(), 1);
    assert_eq!(stats.running_models[0].kv_cache.bytes_per_token, 131_072);
}
