use std::collections::HashMap;
use std::io;

use anyhow::Context;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::http::response::{Body, Response};

/// Writes every header as `Name: Value\r\n` in ascending name order,
/// followed by the blank line that ends the head.
pub fn serialize_headers(headers: &HashMap<String, String>, buf: &mut Vec<u8>) {
    let mut sorted: Vec<_> = headers.iter().collect();
    sorted.sort_unstable_by(|a, b| a.0.cmp(b.0));

    for (k, v) in sorted {
        buf.extend_from_slice(k.as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(v.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }

    // Header/body separator
    buf.extend_from_slice(b"\r\n");
}

/// Status line plus sorted headers.
pub fn serialize_head(resp: &Response) -> Vec<u8> {
    let mut buf = Vec::new();

    let status_line = format!(
        "{} {} {}\r\n",
        resp.version,
        resp.status.as_u16(),
        resp.status.reason_phrase()
    );
    buf.extend_from_slice(status_line.as_bytes());

    serialize_headers(&resp.headers, &mut buf);

    buf
}

enum PreparedBody {
    Empty,
    Bytes(Vec<u8>),
    File { file: File, len: u64 },
}

/// A response snapshot ready to go out on the wire.
///
/// The head is serialized and the body file opened up front, so a file
/// that vanished after resolution is reported before a single byte is sent.
pub struct ResponseWriter {
    head: Vec<u8>,
    body: PreparedBody,
}

impl ResponseWriter {
    pub async fn prepare(response: Response) -> io::Result<Self> {
        let head = serialize_head(&response);

        let body = match response.body {
            Body::Empty => PreparedBody::Empty,
            Body::Bytes(bytes) => PreparedBody::Bytes(bytes),
            Body::File { path, len } => PreparedBody::File {
                file: File::open(&path).await?,
                len,
            },
        };

        Ok(Self { head, body })
    }

    pub async fn write_to_stream<W>(&mut self, stream: &mut W) -> anyhow::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        stream
            .write_all(&self.head)
            .await
            .context("failed to write response head")?;

        match &mut self.body {
            PreparedBody::Empty => {}
            PreparedBody::Bytes(bytes) => {
                stream
                    .write_all(bytes)
                    .await
                    .context("failed to write response body")?;
            }
            PreparedBody::File { file, len } => {
                let mut limited = (&mut *file).take(*len);
                let copied = tokio::io::copy(&mut limited, stream)
                    .await
                    .context("failed to stream file body")?;

                if copied < *len {
                    anyhow::bail!("file shrank while streaming: sent {} of {} bytes", copied, len);
                }
            }
        }

        stream.flush().await.context("failed to flush response")?;

        Ok(())
    }
}
