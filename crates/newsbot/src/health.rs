//! Minimal HTTP health endpoint: `GET /` answers `200 Hello World`, anything else `404`.

use std::{net::SocketAddr, time::Duration};

use tokio::{
    io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader},
    net::{TcpListener, TcpStream},
    time::timeout,
};
use tokio_util::sync::CancellationToken;

/// Upper bound on the request line plus headers.
const MAX_REQUEST_BYTES: u64 = 8 * 1024;
const READ_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn bind(port: u16) -> std::io::Result<TcpListener> {
    let listener = TcpListener::bind(SocketAddr::from(([0, 0, 0, 0], port))).await?;
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "health endpoint listening");
    Ok(listener)
}

/// Accept connections until `cancel` fires.
pub async fn serve(listener: TcpListener, cancel: CancellationToken) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    tokio::spawn(async move {
                        if let Err(e) = respond(stream, READ_TIMEOUT).await {
                            tracing::debug!(%peer, "health request failed: {e}");
                        }
                    });
                }
                Err(e) => tracing::warn!("health accept failed: {e}"),
            },
        }
    }
}

/// Read the request line and drain headers. `None` when the request is cut off by the size cap.
async fn read_request_line<R>(reader: &mut R) -> std::io::Result<Option<String>>
where
    R: AsyncBufReadExt + Unpin,
{
    let mut request_line = String::new();
    reader.read_line(&mut request_line).await?;
    if !request_line.ends_with('\n') {
        return Ok(None);
    }

    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        if line == "\r\n" || line == "\n" {
            return Ok(Some(request_line));
        }
    }
}

async fn respond(stream: TcpStream, read_timeout: Duration) -> std::io::Result<()> {
    let mut reader = BufReader::new(stream.take(MAX_REQUEST_BYTES));
    let request_line = match timeout(read_timeout, read_request_line(&mut reader)).await {
        Ok(res) => res?,
        Err(_) => {
            tracing::debug!("health request timed out");
            None
        }
    };

    let (status, body) = match request_line {
        None => ("400 Bad Request", "Bad Request"),
        Some(line) => {
            let mut parts = line.split_whitespace();
            match (parts.next(), parts.next()) {
                (Some("GET"), Some("/")) => ("200 OK", "Hello World"),
                _ => ("404 Not Found", "Not Found"),
            }
        }
    };
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );

    let mut stream = reader.into_inner().into_inner();
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}
