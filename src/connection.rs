//! One client connection, from accept to close.
//!
//! The client sends one query per line; every line gets exactly one reply.
//! A throttled query is answered with an error and the session goes on.
//! Search or render failures are answered and then end the session.

use std::sync::Arc;
use std::time::Instant;

use futures::StreamExt;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::{FramedRead, LinesCodec};
use tracing::{info, warn};

use crate::error::ReplyError;
use crate::render::render_report;
use crate::session::SessionId;
use crate::types::SearchQuery;
use crate::AppState;

const QUIT: &str = "quit";
const BYE: &str = "bye!";
/// Longest request line accepted; a longer one ends the session.
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

pub async fn handle_connection<S>(state: Arc<AppState>, session: SessionId, stream: S)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (reader, mut writer) = tokio::io::split(stream);
    let mut lines = FramedRead::new(reader, LinesCodec::new_with_max_length(MAX_LINE_LENGTH));

    loop {
        let line = match lines.next().await {
            Some(Ok(line)) => line,
            None => break,
            Some(Err(e)) => {
                warn!(session = %session, "read failed: {}", e);
                break;
            }
        };
        info!(session = %session, query = %line, "received request");

        if line.eq_ignore_ascii_case(QUIT) {
            let _ = reply(&mut writer, session, BYE).await;
            break;
        }

        match answer(&state, session, &line).await {
            Ok(report) => {
                info!(session = %session, query = %line, "returned search results");
                if reply(&mut writer, session, &report).await.is_err() {
                    break;
                }
            }
            Err(err) => {
                let sent = reply(&mut writer, session, &format!("error: search query failed: {}", err)).await;
                if err.is_fatal() || sent.is_err() {
                    break;
                }
            }
        }
    }

    let _ = writer.shutdown().await;
    info!(session = %session, "disconnected");
}

async fn answer(state: &AppState, session: SessionId, line: &str) -> Result<String, ReplyError> {
    let query = SearchQuery::parse(line);
    state.limiter.check(session, Instant::now())?;
    let result = state.search.search(&query, state.timeout).await?;
    Ok(render_report(&result)?)
}

async fn reply<W>(writer: &mut W, session: SessionId, message: &str) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let result = async {
        writer.write_all(format!("{}\n", message).as_bytes()).await?;
        writer.flush().await
    }
    .await;
    if let Err(e) = &result {
        warn!(session = %session, "write failed: {}", e);
    }
    result
}
