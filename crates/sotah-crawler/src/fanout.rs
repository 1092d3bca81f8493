use futures::stream::{self, StreamExt};
use std::future::Future;

/// Generalizes the teacher's worker-pool shape (`input -> W workers ->
/// output`, closing the output once every worker exits) into a single
/// bounded-concurrency combinator, per spec.md Section 9's "Channels and
/// goroutine pools" redesign note. `work` runs with at most `workers`
/// invocations in flight at once; all results are collected before
/// returning (the orchestration layer decides whether to short-circuit).
pub async fn fan_out<In, Out, F, Fut>(workers: usize, inputs: Vec<In>, work: F) -> Vec<Out>
where
    In: Send + 'static,
    Out: Send + 'static,
    F: Fn(In) -> Fut + Send + Sync,
    Fut: Future<Output = Out> + Send,
{
    stream::iter(inputs)
        .map(|item| work(item))
        .buffer_unordered(workers.max(1))
        .collect()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn collects_every_result_regardless_of_completion_order() {
        let inputs = vec![5u32, 1, 3, 2, 4];
        let results = fan_out(2, inputs, |n| async move {
            tokio::time::sleep(std::time::Duration::from_millis((5 - n) as u64)).await;
            n * 2
        })
        .await;
        let mut sorted = results.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![2, 4, 6, 8, 10]);
    }
}
