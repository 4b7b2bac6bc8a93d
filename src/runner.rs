//! Bounded-concurrency batch runner
//!
//! The sole admission-control mechanism of the pipeline: it caps how many
//! operations are in flight against the rate-limited embedding service and
//! the vector store, and bounds memory to one batch's results.

use std::fmt::Display;
use std::future::Future;

use futures::future;

/// Process `items` through `op` with at most `max_concurrency` operations in
/// flight at any instant.
///
/// Items are split into consecutive batches of `max_concurrency`; every
/// operation in a batch is launched together and the batch fully settles
/// before the next one starts. A failing item never aborts or delays its
/// siblings: the failure is logged with the item's label and dropped from
/// the result, so the output holds successes only.
///
/// `max_concurrency` of zero is clamped to 1 with a warning. An empty input
/// returns an empty output without launching anything.
pub async fn run_bounded<T, R, E, L, F, Fut>(
    items: Vec<T>,
    max_concurrency: usize,
    label: L,
    op: F,
) -> Vec<R>
where
    L: Fn(&T) -> String,
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<R, E>>,
    E: Display,
{
    if max_concurrency == 0 {
        tracing::warn!("run_bounded called with max_concurrency=0, clamping to 1");
    }
    let max_concurrency = max_concurrency.max(1);

    let mut results = Vec::with_capacity(items.len());
    let mut remaining = items.into_iter();

    loop {
        let batch: Vec<T> = remaining.by_ref().take(max_concurrency).collect();
        if batch.is_empty() {
            break;
        }

        let in_flight: Vec<_> = batch
            .into_iter()
            .map(|item| {
                let item_label = label(&item);
                let fut = op(item);
                async move { (item_label, fut.await) }
            })
            .collect();

        // The whole batch settles before the next batch is admitted.
        for (item_label, outcome) in future::join_all(in_flight).await {
            match outcome {
                Ok(result) => results.push(result),
                Err(err) => {
                    tracing::warn!(item = %item_label, error = %err, "operation failed, dropping item");
                }
            }
        }
    }

    results
}
