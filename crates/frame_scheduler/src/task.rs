//! Minimal single-threaded task helpers
//!
//! Effect application runs as local futures that may outlive the frame that
//! started them. Nothing here spawns threads: pending work is advanced either
//! by polling once per frame with a no-op waker, or by awaiting it on the
//! caller's executor (usually `pollster::block_on`).

use std::future::{poll_fn, Future};
use std::pin::Pin;
use std::task::{Context, Poll, Waker};

/// Boxed, non-`Send` future
pub type LocalFuture<T> = Pin<Box<dyn Future<Output = T>>>;

/// Await every future concurrently, yielding their outputs in input order
pub fn join_all<T>(futures: Vec<LocalFuture<T>>) -> impl Future<Output = Vec<T>> {
    let mut pending: Vec<Option<LocalFuture<T>>> = futures.into_iter().map(Some).collect();
    let mut outputs: Vec<Option<T>> = pending.iter().map(|_| None).collect();

    poll_fn(move |cx| {
        let mut done = true;
        for (slot, output) in pending.iter_mut().zip(outputs.iter_mut()) {
            if let Some(future) = slot {
                match future.as_mut().poll(cx) {
                    Poll::Ready(value) => {
                        *output = Some(value);
                        *slot = None;
                    }
                    Poll::Pending => done = false,
                }
            }
        }

        if done {
            Poll::Ready(outputs.iter_mut().filter_map(Option::take).collect())
        } else {
            Poll::Pending
        }
    })
}

/// Set of in-flight local tasks
pub struct TaskSet<T> {
    tasks: Vec<LocalFuture<T>>,
}

impl<T> TaskSet<T> {
    /// Create an empty task set
    pub fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    /// Add a task. It is not polled until the next `poll_ready` or `settle`.
    pub fn push(&mut self, task: LocalFuture<T>) {
        self.tasks.push(task);
    }

    /// Number of unfinished tasks
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether every task has finished
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Poll every task once without blocking and return the outputs of the
    /// ones that finished
    pub fn poll_ready(&mut self) -> Vec<T> {
        let mut cx = Context::from_waker(Waker::noop());
        self.poll_with(&mut cx)
    }

    /// Resolve once every task in the set has finished
    pub fn settle(&mut self) -> impl Future<Output = Vec<T>> + '_ {
        let mut finished = Vec::new();
        poll_fn(move |cx| {
            finished.extend(self.poll_with(cx));
            if self.tasks.is_empty() {
                Poll::Ready(std::mem::take(&mut finished))
            } else {
                Poll::Pending
            }
        })
    }

    fn poll_with(&mut self, cx: &mut Context<'_>) -> Vec<T> {
        let mut finished = Vec::new();
        self.tasks.retain_mut(|task| match task.as_mut().poll(cx) {
            Poll::Ready(output) => {
                finished.push(output);
                false
            }
            Poll::Pending => true,
        });
        finished
    }
}

impl<T> Default for TaskSet<T> {
    fn default() -> Self {
        Self::new()
    }
}
