use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use crate::core::app::{App, SessionConfig};
use crate::core::backend::{Backend, Endpoints};
use crate::core::decoder::ChunkFraming;

pub struct CapturedRequest {
    pub request_line: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

pub fn create_test_app() -> App {
    App::new(
        reqwest::Client::new(),
        Endpoints {
            api_key: Some("test-key".to_string()),
            remote_base_url: "https://api.test.com/v1".to_string(),
            ..Endpoints::default()
        },
        SessionConfig {
            backend: Backend::Local,
            markdown: false,
        },
        ChunkFraming::Buffered,
        "",
    )
}

/// A client that never routes loopback test traffic through a proxy.
pub fn test_client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .build()
        .expect("test client")
}

async fn read_http_request(stream: &mut TcpStream) -> Result<CapturedRequest, String> {
    let mut buffer = Vec::new();
    let mut header_end = None;
    while header_end.is_none() {
        let mut chunk = [0_u8; 1024];
        let read = stream
            .read(&mut chunk)
            .await
            .map_err(|err| err.to_string())?;
        if read == 0 {
            return Err("Unexpected EOF while reading HTTP headers".to_string());
        }
        buffer.extend_from_slice(&chunk[..read]);
        header_end = buffer
            .windows(4)
            .position(|window| window == b"\r\n\r\n")
            .map(|index| index + 4);
    }

    let header_end = header_end.ok_or_else(|| "Missing header terminator".to_string())?;
    let header_text =
        std::str::from_utf8(&buffer[..header_end]).map_err(|err| err.to_string())?;
    let mut lines = header_text.split("\r\n").filter(|line| !line.is_empty());
    let request_line = lines
        .next()
        .ok_or_else(|| "Missing HTTP request line".to_string())?
        .to_string();

    let mut headers = Vec::new();
    let mut content_length = 0_usize;
    for line in lines {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim().to_string();
        if name.eq_ignore_ascii_case("content-length") {
            content_length = value.parse::<usize>().map_err(|err| err.to_string())?;
        }
        headers.push((name.to_string(), value));
    }

    let mut body = buffer[header_end..].to_vec();
    while body.len() < content_length {
        let mut chunk = vec![0_u8; content_length - body.len()];
        let read = stream
            .read(&mut chunk)
            .await
            .map_err(|err| err.to_string())?;
        if read == 0 {
            return Err("Unexpected EOF while reading HTTP body".to_string());
        }
        body.extend_from_slice(&chunk[..read]);
    }
    body.truncate(content_length);

    Ok(CapturedRequest {
        request_line,
        headers,
        body,
    })
}

async fn write_chunk(stream: &mut TcpStream, data: &[u8]) -> std::io::Result<()> {
    stream
        .write_all(format!("{:x}\r\n", data.len()).as_bytes())
        .await?;
    stream.write_all(data).await?;
    stream.write_all(b"\r\n").await?;
    stream.flush().await
}

async fn bind_loopback() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("listener should bind");
    let addr = listener.local_addr().expect("local addr should resolve");
    (listener, format!("http://{addr}"))
}

/// Serve one request, streaming `chunks` with a short pause between them and
/// then closing the connection.
pub async fn spawn_streaming_server(
    content_type: &'static str,
    chunks: Vec<Vec<u8>>,
) -> (String, JoinHandle<CapturedRequest>) {
    let (listener, base_url) = bind_loopback().await;
    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.expect("accept");
        let captured = read_http_request(&mut stream).await.expect("request");
        let head = format!(
            "HTTP/1.1 200 OK\r\ncontent-type: {content_type}\r\n\
             transfer-encoding: chunked\r\nconnection: close\r\n\r\n"
        );
        stream.write_all(head.as_bytes()).await.expect("head");
        for chunk in chunks {
            write_chunk(&mut stream, &chunk).await.expect("chunk");
            tokio::time::sleep(Duration::from_millis(30)).await;
        }
        stream.write_all(b"0\r\n\r\n").await.expect("trailer");
        let _ = stream.shutdown().await;
        captured
    });
    (base_url, handle)
}

/// Serve one request with a non-success status and a fixed body.
pub async fn spawn_error_server(status: u16, body: &'static str) -> (String, JoinHandle<()>) {
    let (listener, base_url) = bind_loopback().await;
    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.expect("accept");
        let _ = read_http_request(&mut stream).await.expect("request");
        let response = format!(
            "HTTP/1.1 {status} Error\r\ncontent-type: application/json\r\n\
             content-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).await.expect("response");
        let _ = stream.shutdown().await;
    });
    (base_url, handle)
}

/// Send `first` and then keep the connection open until the client hangs up.
pub async fn spawn_stalling_server(first: Vec<u8>) -> (String, JoinHandle<()>) {
    let (listener, base_url) = bind_loopback().await;
    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.expect("accept");
        let _ = read_http_request(&mut stream).await.expect("request");
        let head = "HTTP/1.1 200 OK\r\ncontent-type: application/x-ndjson\r\n\
                    transfer-encoding: chunked\r\n\r\n";
        stream.write_all(head.as_bytes()).await.expect("head");
        write_chunk(&mut stream, &first).await.expect("chunk");
        let mut sink = [0_u8; 64];
        let _ = tokio::time::timeout(Duration::from_secs(10), stream.read(&mut sink)).await;
    });
    (base_url, handle)
}
