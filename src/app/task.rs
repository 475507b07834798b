// SPDX-License-Identifier: GPL-3.0-only

//! Deferred work returned by message handlers
//!
//! A handler never awaits. It mutates the model and returns a [`Task`]
//! describing the asynchronous work whose results come back as messages.

use futures::future::{self, BoxFuture};
use futures::stream::{self, BoxStream};
use futures::{FutureExt, Stream, StreamExt};
use std::future::Future;
use std::time::Duration;

/// A batch of message streams
pub struct Task<M> {
    streams: Vec<BoxStream<'static, M>>,
}

impl<M: Send + 'static> Task<M> {
    pub fn none() -> Self {
        Self {
            streams: Vec::new(),
        }
    }

    /// Deliver a message right away
    pub fn done(message: M) -> Self {
        Self::from_future(future::ready(message).boxed())
    }

    /// Run a future and map its output to a message
    pub fn perform<T, F>(future: F, map: impl FnOnce(T) -> M + Send + 'static) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        Self::from_future(future.map(map).boxed())
    }

    /// Forward every item of a stream as a message
    pub fn run<T, S>(stream: S, map: impl FnMut(T) -> M + Send + 'static) -> Self
    where
        S: Stream<Item = T> + Send + 'static,
    {
        Self {
            streams: vec![stream.map(map).boxed()],
        }
    }

    pub fn batch(tasks: impl IntoIterator<Item = Task<M>>) -> Self {
        Self {
            streams: tasks.into_iter().flat_map(|task| task.streams).collect(),
        }
    }

    pub fn into_streams(self) -> Vec<BoxStream<'static, M>> {
        self.streams
    }

    fn from_future(future: BoxFuture<'static, M>) -> Self {
        Self {
            streams: vec![stream::once(future).boxed()],
        }
    }
}

/// Deliver `message` after `delay`
pub fn delay_task<M: Send + 'static>(delay: Duration, message: M) -> Task<M> {
    Task::perform(
        async move {
            tokio::time::sleep(delay).await;
            message
        },
        |message| message,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_batch_flattens() {
        let task = Task::batch([Task::done(1), Task::none(), Task::run(stream::iter([2, 3]), |n| n * 10)]);
        let mut collected = Vec::new();
        for s in task.into_streams() {
            collected.extend(s.collect::<Vec<_>>().await);
        }
        assert_eq!(collected, vec![1, 20, 30]);
    }

    #[tokio::test]
    async fn test_delay_task() {
        let start = tokio::time::Instant::now();
        let task = delay_task(Duration::from_millis(20), "tick");
        let mut streams = task.into_streams();
        assert_eq!(streams.len(), 1);
        assert_eq!(streams[0].next().await, Some("tick"));
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
