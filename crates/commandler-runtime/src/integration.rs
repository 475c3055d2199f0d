//! Integrations connect a transport to the action pipeline.
//!
//! An [`Integration`] turns whatever its transport delivers into
//! [`Request`](commandler_core::Request)s, feeds them to the
//! [`ActionHandler`] and sends replies back. The runtime cancels the token it
//! passes to [`Integration::run`] on shutdown.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use commandler_core::{PropertyMap, Request};
use commandler_framework::{ActionHandler, BoxError};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// A source of requests and sink of replies.
#[async_trait]
pub trait Integration: Send + Sync + 'static {
    /// Name recorded on every request, available as `${integration}`.
    fn name(&self) -> &str;

    /// Serves requests until the transport ends or `shutdown` is cancelled.
    async fn run(&self, handler: ActionHandler, shutdown: CancellationToken)
    -> Result<(), BoxError>;
}

// =============================================================================
// Console
// =============================================================================

/// Reads one request per stdin line and prints replies to stdout.
///
/// Each request's source carries a `user` property, so default expressions
/// can read `${source.user}`.
#[derive(Debug)]
pub struct ConsoleIntegration {
    user: String,
    next_id: AtomicU64,
}

impl ConsoleIntegration {
    pub const NAME: &'static str = "console";

    pub fn new() -> Self {
        let user = std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "console".to_string());
        Self::with_user(user)
    }

    pub fn with_user(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            next_id: AtomicU64::new(1),
        }
    }

    fn request(&self, line: &str) -> Request {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        Request::new(Self::NAME, id, line)
            .with_source(PropertyMap::new().with("user", self.user.as_str()))
    }

    /// Serves lines from `input`, writing replies to `output`.
    pub async fn serve<R, W>(
        &self,
        handler: &ActionHandler,
        input: R,
        mut output: W,
        shutdown: CancellationToken,
    ) -> Result<(), BoxError>
    where
        R: AsyncBufRead + Unpin + Send,
        W: AsyncWrite + Unpin + Send,
    {
        let mut lines = input.lines();
        loop {
            let line = tokio::select! {
                () = shutdown.cancelled() => {
                    debug!("Console integration cancelled");
                    break;
                }
                line = lines.next_line() => line?,
            };
            let Some(line) = line else {
                info!("Console input closed");
                break;
            };
            if line.trim().is_empty() {
                continue;
            }

            if let Some(reply) = handler.on_action(self.request(&line)).await {
                output.write_all(reply.as_bytes()).await?;
                output.write_all(b"\n").await?;
                output.flush().await?;
            }
        }
        Ok(())
    }
}

impl Default for ConsoleIntegration {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Integration for ConsoleIntegration {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn run(
        &self,
        handler: ActionHandler,
        shutdown: CancellationToken,
    ) -> Result<(), BoxError> {
        let input = BufReader::new(tokio::io::stdin());
        self.serve(&handler, input, tokio::io::stdout(), shutdown)
            .await
    }
}
