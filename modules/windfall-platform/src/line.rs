//! Endpoint failover.
//!
//! Several platform operations have interchangeable endpoints (the official
//! one, a legacy one, sometimes a third-party mirror). A [`RequestLine`]
//! holds them in preference order, pins whichever one last answered, and
//! rotates through the rest when the pinned one misbehaves.

use std::sync::Mutex;

use futures::future::BoxFuture;

/// What an endpoint reports back: keep this line, or switch to the next one.
/// Both carry a value so an exhausted line can still hand back a degraded
/// result instead of an error.
pub enum LineVerdict<T> {
    Keep(T, String),
    Switch(T, String),
}

type Endpoint<A, T> = Box<dyn Fn(A) -> BoxFuture<'static, LineVerdict<T>> + Send + Sync>;

struct LineState {
    pinned: usize,
    switches: usize,
}

pub struct RequestLine<A, T> {
    name: &'static str,
    endpoints: Vec<Endpoint<A, T>>,
    state: Mutex<LineState>,
}

impl<A: Clone, T> RequestLine<A, T> {
    pub fn new(name: &'static str, endpoints: Vec<Endpoint<A, T>>) -> Self {
        assert!(!endpoints.is_empty(), "a request line needs at least one endpoint");
        Self {
            name,
            endpoints,
            state: Mutex::new(LineState {
                pinned: 0,
                switches: 0,
            }),
        }
    }

    /// Run the operation, rotating endpoints on `Switch` verdicts. The same
    /// argument is re-passed to every endpoint tried. Once every endpoint
    /// has been exhausted the last verdict's value is returned as-is.
    pub async fn run(&self, arg: A) -> T {
        let total = self.endpoints.len();
        loop {
            let current = match self.state.lock() {
                Ok(state) => state.pinned,
                Err(poisoned) => poisoned.into_inner().pinned,
            };
            match (self.endpoints[current])(arg.clone()).await {
                LineVerdict::Keep(value, msg) => {
                    let mut state = match self.state.lock() {
                        Ok(state) => state,
                        Err(poisoned) => poisoned.into_inner(),
                    };
                    state.pinned = current;
                    state.switches = 0;
                    tracing::debug!(line = self.name, %msg, "Line ok");
                    return value;
                }
                LineVerdict::Switch(value, msg) => {
                    let exhausted = {
                        let mut state = match self.state.lock() {
                            Ok(state) => state,
                            Err(poisoned) => poisoned.into_inner(),
                        };
                        state.pinned = (state.pinned + 1) % total;
                        state.switches += 1;
                        state.switches > total
                    };
                    if exhausted {
                        tracing::error!(line = self.name, %msg, "All fallback endpoints failed");
                        return value;
                    }
                    tracing::warn!(
                        line = self.name,
                        %msg,
                        tried = current + 1,
                        total,
                        "Switching endpoint"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_endpoint(
        counter: Arc<AtomicUsize>,
        verdict: fn(u64) -> LineVerdict<i64>,
    ) -> Endpoint<u64, i64> {
        Box::new(move |arg| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move { verdict(arg) }.boxed()
        })
    }

    #[tokio::test]
    async fn pins_the_first_endpoint_that_answers() {
        let calls: Vec<Arc<AtomicUsize>> =
            (0..3).map(|_| Arc::new(AtomicUsize::new(0))).collect();
        let line = RequestLine::new(
            "test",
            vec![
                counting_endpoint(calls[0].clone(), |_| {
                    LineVerdict::Switch(-1, "down".into())
                }),
                counting_endpoint(calls[1].clone(), |_| {
                    LineVerdict::Switch(-1, "down".into())
                }),
                counting_endpoint(calls[2].clone(), |arg| {
                    LineVerdict::Keep(arg as i64 * 2, "ok".into())
                }),
            ],
        );

        assert_eq!(line.run(21).await, 42);
        // a second call goes straight to the pinned endpoint
        assert_eq!(line.run(5).await, 10);
        assert_eq!(calls[0].load(Ordering::SeqCst), 1);
        assert_eq!(calls[1].load(Ordering::SeqCst), 1);
        assert_eq!(calls[2].load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn exhaustion_returns_the_last_value_without_panicking() {
        let calls = Arc::new(AtomicUsize::new(0));
        let line = RequestLine::new(
            "test",
            vec![
                counting_endpoint(calls.clone(), |_| LineVerdict::Switch(-1, "down".into())),
                counting_endpoint(calls.clone(), |_| LineVerdict::Switch(-7, "down".into())),
            ],
        );

        // three attempts wrap back to the first endpoint before giving up
        assert_eq!(line.run(1).await, -1);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn argument_is_repassed_to_every_endpoint_tried() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_a = seen.clone();
        let seen_b = seen.clone();
        let line: RequestLine<u64, i64> = RequestLine::new(
            "test",
            vec![
                Box::new(move |arg| {
                    seen_a.lock().unwrap().push(arg);
                    async move { LineVerdict::Switch(-1, "down".into()) }.boxed()
                }),
                Box::new(move |arg| {
                    seen_b.lock().unwrap().push(arg);
                    async move { LineVerdict::Keep(0, "ok".into()) }.boxed()
                }),
            ],
        );

        line.run(99).await;
        assert_eq!(*seen.lock().unwrap(), vec![99, 99]);
    }
}
