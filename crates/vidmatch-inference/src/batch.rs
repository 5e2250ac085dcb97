//! Batch embedding of videos.
//!
//! Batches run strictly one after another; within a batch every embedding
//! request runs concurrently. Videos without an embedding are dropped.

use futures::future::join_all;
use std::time::Instant;
use tracing::{debug, instrument};

use vidmatch_core::{EmbeddedVideo, VideoSummary};

use crate::client::EmbeddingClient;

/// Embed `videos` in batches of `batch_size`, preserving input order.
///
/// A batch is consumed only after all of its requests settle. A batch size
/// of 0 is treated as 1.
#[instrument(skip(client, videos), fields(subsystem = "inference", component = "batch_embedder", op = "embed_all", input_count = videos.len()))]
pub async fn embed_all(
    client: &EmbeddingClient,
    videos: Vec<VideoSummary>,
    batch_size: usize,
) -> Vec<EmbeddedVideo> {
    let start = Instant::now();
    let input_count = videos.len();
    let batch_size = batch_size.max(1);
    let mut results = Vec::with_capacity(input_count);

    let mut remaining = videos.into_iter().peekable();
    while remaining.peek().is_some() {
        let batch: Vec<VideoSummary> = remaining.by_ref().take(batch_size).collect();

        let settled = join_all(batch.into_iter().map(|video| async move {
            client
                .embed(&video.full_text)
                .await
                .map(|embedding| EmbeddedVideo::new(video, embedding))
        }))
        .await;

        results.extend(settled.into_iter().flatten());
    }

    debug!(
        result_count = results.len(),
        dropped_count = input_count - results.len(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Batch embedding complete"
    );
    results
}
