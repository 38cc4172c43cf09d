//! Agent server: accept loop, per-connection framing, graceful drain.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::{FutureExt, SinkExt, StreamExt};
use tokio_util::bytes::Bytes;
use tokio_util::codec::{Framed, LengthDelimitedCodec};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use super::endpoint::{BoxedStream, Listener};
use super::types::{RemoteMessage, RpcCall, RpcRequest, RpcResponse, SendMessageResponse};
use crate::agent::Agent;
use crate::error::SwarmError;

const ACCEPT_BACKOFF_FLOOR: Duration = Duration::from_millis(5);
const ACCEPT_BACKOFF_CEILING: Duration = Duration::from_secs(1);

/// Serve `agent` on `listener` until `shutdown` is cancelled.
///
/// On cancellation the accept loop stops, requests already running finish
/// and get their response, idle connections are closed, and the listener
/// is released.
pub async fn serve(
    agent: Arc<dyn Agent>,
    listener: Listener,
    shutdown: CancellationToken,
) -> Result<(), SwarmError> {
    let tracker = TaskTracker::new();
    let mut accept_failures = 0u32;
    info!(agent = agent.name(), endpoint = %agent.endpoint(), "agent server listening");

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    accept_failures = 0;
                    debug!(agent = agent.name(), peer = %peer, "connection accepted");
                    tracker.spawn(handle_connection(
                        Arc::clone(&agent),
                        stream,
                        shutdown.clone(),
                    ));
                }
                Err(e) => {
                    let delay = accept_backoff(accept_failures);
                    accept_failures = accept_failures.saturating_add(1);
                    warn!(
                        agent = agent.name(),
                        error = %e,
                        retry_in_ms = delay.as_millis() as u64,
                        "accept failed"
                    );
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            },
        }
    }

    tracker.close();
    tracker.wait().await;
    drop(listener);
    info!(agent = agent.name(), "agent server stopped");
    Ok(())
}

/// Pause after the `failures`-th consecutive accept error, doubling up to a ceiling.
fn accept_backoff(failures: u32) -> Duration {
    ACCEPT_BACKOFF_FLOOR
        .saturating_mul(1u32 << failures.min(16))
        .min(ACCEPT_BACKOFF_CEILING)
}

async fn handle_connection(agent: Arc<dyn Agent>, stream: BoxedStream, shutdown: CancellationToken) {
    let mut framed = Framed::new(stream, LengthDelimitedCodec::new());

    loop {
        let frame = tokio::select! {
            _ = shutdown.cancelled() => break,
            frame = framed.next() => frame,
        };
        let bytes = match frame {
            Some(Ok(bytes)) => bytes,
            Some(Err(e)) => {
                debug!(agent = agent.name(), error = %e, "connection read failed");
                break;
            }
            None => break,
        };

        let response = match serde_json::from_slice::<RpcRequest>(&bytes) {
            Ok(request) => dispatch(agent.as_ref(), request).await,
            Err(e) => RpcResponse::error("invalid_request", e.to_string()),
        };

        let payload = match serde_json::to_vec(&response) {
            Ok(payload) => payload,
            Err(e) => {
                error!(agent = agent.name(), error = %e, "failed to encode response");
                break;
            }
        };
        if let Err(e) = framed.send(Bytes::from(payload)).await {
            debug!(agent = agent.name(), error = %e, "connection write failed");
            break;
        }
    }
}

/// Run one request with logging and panic isolation.
async fn dispatch(agent: &dyn Agent, request: RpcRequest) -> RpcResponse {
    let started = Instant::now();
    let method = request.call.method();
    let caller = request.caller.unwrap_or_else(|| "-".into());

    let outcome = AssertUnwindSafe(execute(agent, request.call)).catch_unwind().await;
    let response = match outcome {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => {
            warn!(agent = agent.name(), method, error = %e, "request failed");
            RpcResponse::error(error_code(&e), e.to_string())
        }
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            error!(agent = agent.name(), method, panic = %message, "request handler panicked");
            RpcResponse::error("internal", format!("handler panicked: {message}"))
        }
    };

    info!(
        agent = agent.name(),
        method,
        caller = %caller,
        elapsed_ms = started.elapsed().as_millis() as u64,
        ok = !matches!(response, RpcResponse::Error { .. }),
        "handled request"
    );
    response
}

async fn execute(agent: &dyn Agent, call: RpcCall) -> Result<RpcResponse, SwarmError> {
    match call {
        RpcCall::GetAgentCard => Ok(RpcResponse::AgentCard(agent.card())),
        RpcCall::SendMessage { message } => {
            let reply = agent.handle(&message.flattened()).await?;
            Ok(RpcResponse::SendMessage(SendMessageResponse::Msg(
                RemoteMessage::agent_reply(reply),
            )))
        }
    }
}

fn error_code(error: &SwarmError) -> String {
    error.category().to_string()
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".into()
    }
}
