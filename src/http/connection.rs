use std::io;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::Config;
use crate::http::parser::read_request;
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::writer::ResponseWriter;
use crate::static_files::{Resolution, Resolver};

/// Read-only settings shared by every connection.
#[derive(Debug)]
pub struct Settings {
    pub resolver: Resolver,
    /// Bound on the whole request-read phase of each request
    pub idle_timeout: Duration,
    pub allowed_host: Option<String>,
}

impl Settings {
    pub fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            resolver: Resolver::new(&cfg.static_files.root, cfg.static_files.index_file.clone())?,
            idle_timeout: cfg.idle_timeout(),
            allowed_host: cfg.server.allowed_host.clone(),
        })
    }
}

pub struct Connection<S> {
    stream: S,
    buffer: BytesMut,
    state: ConnectionState,
    settings: Arc<Settings>,
}

pub enum ConnectionState {
    AwaitingRequest,
    Parsed(Request),
    Responding(Response, bool), // bool = close after writing?
    Closed,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, settings: Arc<Settings>) -> Self {
        Self {
            stream,
            buffer: BytesMut::with_capacity(4096),
            state: ConnectionState::AwaitingRequest,
            settings,
        }
    }

    /// Serves requests until the client closes, goes idle, sends garbage,
    /// or asks for `Connection: close`.
    pub async fn run(&mut self) {
        loop {
            self.state = match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::AwaitingRequest => self.await_request().await,

                ConnectionState::Parsed(req) => {
                    let (response, close) = self.handle_request(&req).await;
                    ConnectionState::Responding(response, close)
                }

                ConnectionState::Responding(response, close) => {
                    self.respond(response, close).await
                }

                ConnectionState::Closed => break,
            };
        }

        // The peer may already be gone; the socket is released on drop regardless.
        let _ = self.stream.shutdown().await;
    }

    async fn await_request(&mut self) -> ConnectionState {
        let deadline = Instant::now() + self.settings.idle_timeout;

        match read_request(&mut self.stream, &mut self.buffer, deadline).await {
            Ok(req) => {
                debug!(
                    method = req.method.as_str(),
                    url = %req.url,
                    close = req.close,
                    "Request received"
                );
                ConnectionState::Parsed(req)
            }
            Err(e) if e.is_silent() => {
                debug!(reason = %e, "Closing connection");
                ConnectionState::Closed
            }
            Err(e) => {
                warn!(error = %e, "Rejecting malformed request");
                ConnectionState::Responding(Response::bad_request(), true)
            }
        }
    }

    async fn handle_request(&self, req: &Request) -> (Response, bool) {
        if !self.host_allowed(&req.host) {
            warn!(host = %req.host, "Rejecting request for unexpected host");
            // bad_request() carries `Connection: close` itself.
            return (Response::bad_request(), !req.keep_alive());
        }

        let response = match self.settings.resolver.resolve(&req.url).await {
            Resolution::File {
                path,
                len,
                content_type,
            } => Response::file(path, len, content_type),
            Resolution::Forbidden => Response::forbidden(),
            Resolution::NotFound => Response::not_found(),
        };

        (response, !req.keep_alive())
    }

    fn host_allowed(&self, host: &str) -> bool {
        match &self.settings.allowed_host {
            Some(allowed) => strip_port(host).eq_ignore_ascii_case(allowed),
            None => true,
        }
    }

    async fn respond(&mut self, response: Response, close: bool) -> ConnectionState {
        let status = response.status;
        let close = close || response.is_close();

        let writer = match ResponseWriter::prepare(finalize(response, close)).await {
            Ok(writer) => Ok(writer),
            Err(e) => {
                warn!(error = %e, "Resolved file could not be opened");
                let fallback = match e.kind() {
                    io::ErrorKind::PermissionDenied => Response::forbidden(),
                    _ => Response::not_found(),
                };
                ResponseWriter::prepare(finalize(fallback, close)).await
            }
        };
        let Ok(mut writer) = writer else {
            return ConnectionState::Closed;
        };

        if let Err(e) = writer.write_to_stream(&mut self.stream).await {
            debug!(error = %e, "Write failed, closing connection");
            return ConnectionState::Closed;
        }

        debug!(status = status.as_u16(), close, "Response sent");

        if close {
            ConnectionState::Closed
        } else {
            ConnectionState::AwaitingRequest
        }
    }
}

fn finalize(mut response: Response, close: bool) -> Response {
    if close {
        response.set_close();
    }
    response.set_date(SystemTime::now());
    response
}

fn strip_port(host: &str) -> &str {
    match host.rsplit_once(':') {
        Some((name, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => name,
        _ => host,
    }
}
