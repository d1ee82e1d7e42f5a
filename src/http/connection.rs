use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::http::parser::{ParseError, ReadOutcome, read_request};
use crate::http::resolver::{Resolution, Resolver};
use crate::http::response::Response;
use crate::http::writer::ResponseWriter;

/// Default inactivity window while waiting for a request.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(5);

pub struct Connection<S> {
    stream: BufReader<S>,
    resolver: Resolver,
    idle_timeout: Duration,
    state: ConnectionState,
}

pub enum ConnectionState {
    AwaitingRequest,
    Dispatch(ReadOutcome),
    Responded(Response),
    Closed,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, resolver: Resolver) -> Self {
        Self {
            stream: BufReader::new(stream),
            resolver,
            idle_timeout: IDLE_TIMEOUT,
            state: ConnectionState::AwaitingRequest,
        }
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            let state = std::mem::replace(&mut self.state, ConnectionState::Closed);

            self.state = match state {
                ConnectionState::AwaitingRequest => {
                    let deadline = Instant::now() + self.idle_timeout;
                    let outcome = read_request(&mut self.stream, deadline).await;

                    match outcome {
                        ReadOutcome::Failure {
                            error: ParseError::EndOfStream,
                            bytes_seen: false,
                        } => {
                            debug!("client closed connection");
                            ConnectionState::Closed
                        }
                        ReadOutcome::Failure {
                            error: ParseError::TimedOut,
                            bytes_seen: false,
                        } => {
                            debug!("idle timeout");
                            ConnectionState::Closed
                        }
                        outcome => ConnectionState::Dispatch(outcome),
                    }
                }

                ConnectionState::Dispatch(outcome) => {
                    ConnectionState::Responded(self.handle(outcome).await)
                }

                ConnectionState::Responded(response) => {
                    let mut writer = ResponseWriter::new(&response)
                        .await
                        .context("failed to serialize response")?;
                    writer
                        .write_to_stream(self.stream.get_mut())
                        .await
                        .context("failed to write response")?;

                    if response.closes_connection() {
                        ConnectionState::Closed
                    } else {
                        ConnectionState::AwaitingRequest
                    }
                }

                ConnectionState::Closed => {
                    // Peer may already be gone.
                    let _ = self.stream.get_mut().shutdown().await;
                    break;
                }
            };
        }

        Ok(())
    }

    async fn handle(&self, outcome: ReadOutcome) -> Response {
        let request = match outcome {
            ReadOutcome::Success(request) => request,
            ReadOutcome::Failure { error, .. } => {
                warn!(%error, "bad request");
                return Response::bad_request();
            }
        };

        match self.resolver.resolve(&request.url).await {
            Resolution::Found(file) => {
                info!(method = %request.method, url = %request.url, status = 200, "serving file");
                Response::ok(request, file)
            }
            Resolution::NotFound => {
                info!(method = %request.method, url = %request.url, status = 404, "not found");
                Response::not_found(request)
            }
        }
    }
}
