//! Bounded fan-out of gateway calls

use std::fmt::Display;
use std::future::Future;

use futures::stream::{self, StreamExt};

use crate::error::GatewayError;

/// Runs the tasks of one fetch stage with at most `limit` in flight
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    stage: &'static str,
    limit: usize,
}

impl WorkerPool {
    pub fn new(stage: &'static str, limit: usize) -> Self {
        Self {
            stage,
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Runs `task` once per input and returns the outputs in input order
    ///
    /// Tasks complete in any order; each output is tagged with the index of
    /// its input and sorted back before returning, so `outputs[i]` always
    /// belongs to `inputs[i]`.
    pub async fn run<T, R, F, Fut>(&self, inputs: Vec<T>, task: F) -> Vec<R>
    where
        F: Fn(T) -> Fut,
        Fut: Future<Output = R>,
    {
        let mut tagged: Vec<(usize, R)> = stream::iter(inputs.into_iter().enumerate())
            .map(|(index, input)| {
                let pending = task(input);
                async move { (index, pending.await) }
            })
            .buffer_unordered(self.limit)
            .collect()
            .await;
        tagged.sort_by_key(|(index, _)| *index);
        tagged.into_iter().map(|(_, output)| output).collect()
    }

    /// Like [`WorkerPool::run`] for gateway calls, turning a failed call into `None`
    ///
    /// `describe` names the input in the warning logged for a failed call.
    pub async fn run_degraded<T, R, K, D, F, Fut>(
        &self,
        inputs: Vec<T>,
        describe: D,
        task: F,
    ) -> Vec<Option<R>>
    where
        K: Display,
        D: Fn(&T) -> K,
        F: Fn(T) -> Fut,
        Fut: Future<Output = Result<R, GatewayError>>,
    {
        let stage = self.stage;
        self.run(inputs, |input| {
            let key = describe(&input);
            let pending = task(input);
            async move { degrade(stage, key, pending.await) }
        })
        .await
    }
}

/// Logs a failed task and drops its result
pub fn degrade<T>(stage: &str, key: impl Display, result: Result<T, GatewayError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(
                stage,
                task = %key,
                transient = e.is_transient(),
                error = %e,
                "Fetch task failed, continuing without its result"
            );
            None
        }
    }
}
