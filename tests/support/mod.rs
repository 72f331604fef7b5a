//! Black-box client and response checker shared by the integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail, ensure};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

pub const CONTENT_TYPE_HTML: &str = "text/html; charset=utf-8";
pub const CONTENT_TYPE_CSS: &str = "text/css; charset=utf-8";

pub fn testdata(rel: impl AsRef<Path>) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/testdata")
        .join(rel)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedResponse {
    pub status: u16,
    pub reason: String,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl ParsedResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// Parses a status line and header block (without the final blank line).
pub fn parse_head(head: &str) -> anyhow::Result<(u16, String, HashMap<String, String>)> {
    let mut lines = head.split("\r\n");

    let status_line = lines.next().context("empty response")?;
    let mut parts = status_line.splitn(3, ' ');
    let version = parts.next().unwrap_or_default();
    ensure!(version == "HTTP/1.1", "unexpected version {:?}", version);
    let status: u16 = parts
        .next()
        .context("missing status code")?
        .parse()
        .context("invalid status code")?;
    let reason = parts.next().unwrap_or_default().to_string();

    let mut headers = HashMap::new();
    for line in lines.filter(|l| !l.is_empty()) {
        let (k, v) = line
            .split_once(": ")
            .with_context(|| format!("malformed header line {:?}", line))?;
        ensure!(
            headers.insert(k.to_string(), v.to_string()).is_none(),
            "duplicate header {}",
            k
        );
    }

    Ok((status, reason, headers))
}

/// Parses one complete response from the front of `raw`, returning it and
/// the number of bytes it used.
pub fn parse_response(raw: &[u8]) -> anyhow::Result<(ParsedResponse, usize)> {
    let end = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .context("response head is incomplete")?;
    let head = std::str::from_utf8(&raw[..end]).context("response head is not UTF-8")?;
    let (status, reason, headers) = parse_head(head)?;

    let len: usize = match headers.get("Content-Length") {
        Some(v) => v.parse().context("invalid Content-Length")?,
        None => 0,
    };
    let start = end + 4;
    ensure!(raw.len() >= start + len, "response body is truncated");

    let response = ParsedResponse {
        status,
        reason,
        headers,
        body: raw[start..start + len].to_vec(),
    };
    Ok((response, start + len))
}

/// Parses a byte stream made only of back-to-back responses.
pub fn parse_all_responses(mut raw: &[u8]) -> anyhow::Result<Vec<ParsedResponse>> {
    let mut responses = Vec::new();
    while !raw.is_empty() {
        let (response, used) = parse_response(raw)?;
        responses.push(response);
        raw = &raw[used..];
    }
    Ok(responses)
}

pub struct Client {
    reader: BufReader<TcpStream>,
}

impl Client {
    pub async fn dial(addr: SocketAddr) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(addr)
            .await
            .with_context(|| format!("failed to connect to {}", addr))?;
        Ok(Self {
            reader: BufReader::new(stream),
        })
    }

    pub async fn send_raw(&mut self, bytes: &[u8]) -> anyhow::Result<()> {
        self.reader.get_mut().write_all(bytes).await?;
        Ok(())
    }

    pub async fn send_request_from_file(&mut self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let bytes = tokio::fs::read(path.as_ref())
            .await
            .with_context(|| format!("failed to read {}", path.as_ref().display()))?;
        self.send_raw(&bytes).await
    }

    /// Reads exactly one response, leaving the connection usable.
    pub async fn receive_response(&mut self) -> anyhow::Result<ParsedResponse> {
        let mut head = String::new();
        loop {
            let n = self.reader.read_line(&mut head).await?;
            ensure!(n > 0, "connection closed before the response head ended");
            if head.ends_with("\r\n\r\n") {
                break;
            }
        }

        let (status, reason, headers) = parse_head(&head)?;
        let len: usize = match headers.get("Content-Length") {
            Some(v) => v.parse()?,
            None => 0,
        };

        let mut body = vec![0u8; len];
        self.reader.read_exact(&mut body).await?;

        Ok(ParsedResponse {
            status,
            reason,
            headers,
            body,
        })
    }

    /// Copies everything the server sends until it closes into `path`.
    pub async fn receive_response_to_file(&mut self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let mut raw = Vec::new();
        self.reader.read_to_end(&mut raw).await?;
        tokio::fs::write(path, raw).await?;
        Ok(())
    }

    /// Succeeds if the server neither writes nor closes for `wait`.
    pub async fn expect_open_for(&mut self, wait: Duration) -> anyhow::Result<()> {
        let mut byte = [0u8; 1];
        match tokio::time::timeout(wait, self.reader.read(&mut byte)).await {
            Err(_) => Ok(()),
            Ok(Ok(0)) => bail!("server closed the connection"),
            Ok(Ok(_)) => bail!("server sent unexpected bytes"),
            Ok(Err(e)) => Err(e.into()),
        }
    }

    /// Succeeds if the server closes within `within` without sending anything.
    pub async fn expect_eof(&mut self, within: Duration) -> anyhow::Result<()> {
        let mut rest = Vec::new();
        tokio::time::timeout(within, self.reader.read_to_end(&mut rest))
            .await
            .context("connection still open")??;
        ensure!(rest.is_empty(), "server sent {} unexpected bytes", rest.len());
        Ok(())
    }
}

/// Expectations for one captured response.
#[derive(Debug, Clone)]
pub struct ResponseChecker {
    pub status_code: u16,
    /// File whose bytes the body must equal
    pub file_path: Option<PathBuf>,
    pub content_type: Option<String>,
    /// Whether `Connection: close` must be present
    pub close: bool,
}

impl ResponseChecker {
    pub fn check(&self, res: &ParsedResponse) -> anyhow::Result<()> {
        ensure!(
            res.status == self.status_code,
            "status: got {}, want {}",
            res.status,
            self.status_code
        );

        let date = res.header("Date").context("missing Date header")?;
        httpdate::parse_http_date(date).context("Date is not an HTTP date")?;

        ensure!(
            (res.header("Connection") == Some("close")) == self.close,
            "Connection header: got {:?}, want close = {}",
            res.header("Connection"),
            self.close
        );

        if let Some(content_type) = &self.content_type {
            ensure!(
                res.header("Content-Type") == Some(content_type.as_str()),
                "Content-Type: got {:?}, want {:?}",
                res.header("Content-Type"),
                content_type
            );
        }

        if let Some(path) = &self.file_path {
            let want = std::fs::read(path)?;
            ensure!(res.body == want, "body differs from {}", path.display());
            ensure!(
                res.header("Content-Length") == Some(want.len().to_string().as_str()),
                "Content-Length does not match {}",
                path.display()
            );
        }

        Ok(())
    }
}
