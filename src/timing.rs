use std::time::Instant;

use anyhow::{Context, Result, ensure};
use tokio_stream::StreamExt;
use tracing::{debug, instrument};

/// The clock stops once this much of the body arrived, or the body ended
pub const FIRST_CHUNK_BYTES: usize = 1024;

/// Seconds rounded to two decimal places
#[must_use]
pub fn round_secs(secs: f64) -> f64 {
    (secs * 100.0).round() / 100.0
}

/// Measures how long `url` takes to deliver the first [`FIRST_CHUNK_BYTES`] of its body
///
/// Bodies shorter than that are timed until they end. Returns
/// [`f64::INFINITY`] when the request fails, times out, answers with a non-2xx
/// status or has an empty body.
#[instrument(skip(client))]
pub async fn measure(client: &reqwest::Client, url: &str) -> f64 {
    let start = Instant::now();

    match read_first_chunk(client, url).await {
        Ok(len) => {
            let elapsed = round_secs(start.elapsed().as_secs_f64());
            debug!("First {len} bytes arrived after {elapsed}s");
            elapsed
        }
        Err(e) => {
            debug!("Load time measurement failed: {e:#}");
            f64::INFINITY
        }
    }
}

async fn read_first_chunk(client: &reqwest::Client, url: &str) -> Result<usize> {
    let res = client
        .get(url)
        .send()
        .await
        .context("Requesting stream")?
        .error_for_status()?;

    let mut stream = res.bytes_stream();
    let mut received = 0;
    while received < FIRST_CHUNK_BYTES {
        let Some(chunk) = stream.next().await else {
            break;
        };
        received += chunk.context("Reading stream")?.len();
    }
    ensure!(received > 0, "Stream ended before any data");

    Ok(received.min(FIRST_CHUNK_BYTES))
}
