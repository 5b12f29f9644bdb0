//! Search Worker
//!
//! One thread per instance owns the live [`ScriptContext`]. It runs
//! `main()` once, then sleeps on a condition variable until queries are
//! queued and runs `search(query)` for each, newest first.
//!
//! ```text
//! Starting ──main() ok──▶ Idle ◀──────────┐
//!    │                     │ query queued  │ queue empty
//!    │ main() failed       ▼               │
//!    │                  Draining ──────────┘
//!    │                     │ exit flag
//!    ▼                     ▼
//! Terminated ◀──────── Exiting
//! ```
//!
//! The exit flag is only looked at while waiting and between two queries;
//! a script call that has started always runs to completion.

use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::debug;

use super::context::ScriptContext;
use super::error::{SdError, SdResult};
use super::journal::SharedJournal;

/// Lifecycle of the search worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Running `main()`
    Starting,
    /// Waiting for queries
    Idle,
    /// Running queued searches
    Draining,
    /// Leaving the loop after the exit flag was seen
    Exiting,
    /// Thread finished, interpreter released
    Terminated,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Everything guarded by the queue mutex
#[derive(Debug)]
struct QueueState {
    /// Pending queries, served from the back
    queries: Vec<String>,
    exiting: bool,
    state: WorkerState,
}

#[derive(Debug)]
struct Shared {
    queue: Mutex<QueueState>,
    /// Signalled when a query is queued or the exit flag is raised
    wakeup: Condvar,
    /// Signalled when the worker goes idle or terminates
    settled: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn transition(&self, queue: &mut QueueState, next: WorkerState, reason: &str) {
        let prev = queue.state;
        if prev == next {
            return;
        }
        queue.state = next;
        debug!(from = ?prev, to = ?next, reason, "search worker state");

        if matches!(next, WorkerState::Idle | WorkerState::Terminated) {
            self.settled.notify_all();
        }
    }
}

/// Handle to the search worker thread
pub struct SearchWorker {
    shared: Arc<Shared>,
    handle: Option<JoinHandle<()>>,
    journal: SharedJournal,
}

impl SearchWorker {
    /// Move `context` onto a new thread and start it
    pub fn spawn(context: ScriptContext) -> SdResult<Self> {
        let shared = Arc::new(Shared {
            queue: Mutex::new(QueueState {
                queries: Vec::new(),
                exiting: false,
                state: WorkerState::Starting,
            }),
            wakeup: Condvar::new(),
            settled: Condvar::new(),
        });
        let journal = context.journal().clone();

        let name = context
            .script()
            .file_stem()
            .map(|stem| format!("lua-sd-{}", stem.to_string_lossy()))
            .unwrap_or_else(|| "lua-sd".to_string());

        let thread_shared = Arc::clone(&shared);
        let handle = std::thread::Builder::new()
            .name(name)
            .spawn(move || run_search_worker(thread_shared, context))
            .map_err(SdError::WorkerSpawn)?;

        Ok(Self {
            shared,
            handle: Some(handle),
            journal,
        })
    }

    /// Queue a query and wake the worker. Never blocks on script code.
    pub fn enqueue(&self, query: &str) {
        let mut queue = self.shared.lock();
        queue.queries.push(query.to_owned());
        self.shared.wakeup.notify_one();
    }

    pub fn state(&self) -> WorkerState {
        self.shared.lock().state
    }

    /// Number of queries not yet picked up
    pub fn pending(&self) -> usize {
        self.shared.lock().queries.len()
    }

    /// Wait until the queue is empty and the worker idle, or the worker has
    /// terminated. Returns `false` on timeout.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let queue = self.shared.lock();
        let (queue, result) = self
            .shared
            .settled
            .wait_timeout_while(queue, timeout, |q| {
                !(q.state == WorkerState::Terminated
                    || (q.state == WorkerState::Idle && q.queries.is_empty()))
            })
            .unwrap_or_else(PoisonError::into_inner);
        drop(queue);
        !result.timed_out()
    }

    /// Stop the worker: raise the exit flag, wake it, join it. Queries still
    /// queued afterwards are discarded and counted. Idempotent.
    pub fn shutdown(&mut self) -> usize {
        let Some(handle) = self.handle.take() else {
            return 0;
        };

        self.shared.lock().exiting = true;
        self.shared.wakeup.notify_all();

        if handle.join().is_err() {
            self.journal.error("search worker panicked");
        }

        let mut queue = self.shared.lock();
        let dropped = queue.queries.len();
        queue.queries.clear();
        if dropped > 0 {
            self.journal
                .debug(format!("{} pending queries discarded", dropped));
        }
        dropped
    }
}

impl Drop for SearchWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_search_worker(shared: Arc<Shared>, context: ScriptContext) {
    let journal = context.journal().clone();

    if let Err(e) = context.call_entry() {
        journal.error(e.to_string());
        drop(context);
        let mut queue = shared.lock();
        shared.transition(&mut queue, WorkerState::Terminated, "main() failed");
        return;
    }
    journal.debug(format!(
        "LuaSD script loaded: {}",
        context.script().display()
    ));

    let mut queue = shared.lock();
    loop {
        shared.transition(&mut queue, WorkerState::Idle, "waiting for queries");

        while queue.queries.is_empty() && !queue.exiting {
            queue = shared
                .wakeup
                .wait(queue)
                .unwrap_or_else(PoisonError::into_inner);
        }
        if queue.exiting {
            break;
        }

        shared.transition(&mut queue, WorkerState::Draining, "queries queued");
        while !queue.exiting {
            let Some(query) = queue.queries.pop() else {
                break;
            };
            drop(queue);

            if let Err(e) = context.call_search(&query) {
                journal.error(e.to_string());
            }

            queue = shared.lock();
        }

        context.collect_garbage();
    }

    shared.transition(&mut queue, WorkerState::Exiting, "exit requested");
    drop(queue);

    drop(context);
    let mut queue = shared.lock();
    shared.transition(&mut queue, WorkerState::Terminated, "interpreter released");
}
