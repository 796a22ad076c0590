// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! `Hardwood`: the shared worker pool the row-reader driver submits
//! per-column prefetch tasks to (spec.md §5). A thin wrapper over
//! `rayon::ThreadPool` rather than a re-export of it, so callers depend on
//! this crate's own shutdown/ownership semantics instead of rayon's global
//! pool directly.

use crate::errors::{general_err, Result};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

/// Grace period the driver waits for in-flight prefetch tasks to notice a
/// cancellation and return before giving up on a clean shutdown.
const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

static SHARED: OnceLock<Arc<Hardwood>> = OnceLock::new();

/// A named worker pool a `FileReader` either owns outright (created via
/// `open`, torn down when the reader closes) or borrows (created via
/// `open_with_context` and left running after the reader closes, since
/// other readers may still be submitting to it).
pub struct Hardwood {
    pool: ThreadPool,
    shutdown_grace: Duration,
}

impl Hardwood {
    /// The process-default pool, sized to the host's available parallelism
    /// and built once on first use. Multiple readers opened without an
    /// explicit context all land on this same pool, mirroring how rayon's
    /// own global pool is the path of least resistance for callers who
    /// don't care about isolating their pool from anyone else's.
    pub fn shared() -> Arc<Hardwood> {
        SHARED
            .get_or_init(|| Arc::new(Hardwood::with_threads(default_thread_count())))
            .clone()
    }

    /// A dedicated pool sized to `threads`, independent of `shared()`'s
    /// process-default instance. Used when a `ReaderProperties` overrides
    /// the thread count, or a caller wants explicit isolation.
    pub fn with_threads(threads: usize) -> Self {
        let threads = threads.max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("hardwood-{i}"))
            .build()
            .expect("failed to build worker pool");
        Hardwood {
            pool,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
        }
    }

    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    pub fn shutdown_grace(&self) -> Duration {
        self.shutdown_grace
    }

    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Runs `task` on this pool and blocks the calling thread until it
    /// completes, per spec.md §5's "the driver synchronizes by awaiting the
    /// per-column futures before exposing a batch".
    pub fn install<T: Send>(&self, task: impl FnOnce() -> T + Send) -> T {
        self.pool.install(task)
    }

    /// Fires `task` onto the pool without blocking, reporting its result
    /// back over `reply`. Used for the "following batch" half of
    /// double-buffering: the driver kicks this off right after handing the
    /// current batch to the caller, so the next batch is already in flight
    /// by the time it's asked for.
    pub fn spawn_reply<T: Send + 'static>(
        &self,
        reply: std::sync::mpsc::Sender<T>,
        task: impl FnOnce() -> T + Send + 'static,
    ) {
        self.pool.spawn(move || {
            // A disconnected receiver means the driver was closed or
            // dropped before this task finished; dropping the result is
            // the correct response, not an error.
            let _ = reply.send(task());
        });
    }
}

fn default_thread_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Resolves a `ReaderProperties`-configured thread count into a concrete
/// `Hardwood` to run against: an explicit count gets its own dedicated
/// pool, `None` (the default) reuses the shared process-default one.
pub fn resolve(thread_count: Option<usize>) -> Arc<Hardwood> {
    match thread_count {
        Some(n) => Arc::new(Hardwood::with_threads(n)),
        None => Hardwood::shared(),
    }
}

pub fn validate_thread_count(n: usize) -> Result<usize> {
    if n == 0 {
        return Err(general_err!("thread count must be at least 1"));
    }
    Ok(n)
}
