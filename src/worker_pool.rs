//! Generic frame-parallel worker pool: `get_input`/`put_output` with a
//! shared abort flag, reordering out-of-order completions back into
//! frame-number order.
//!
//! Ported from the `QAtomicInt abort` + dual `QMutex` design: the
//! input mutex guards the next-frame cursor, the output mutex guards
//! the completed-item buffer, and workers poll the shared `AtomicBool`
//! to stop promptly once an abort is requested.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crossbeam::channel::{unbounded, Receiver, Sender};

/// Shared pool state, cloneable across worker threads.
pub struct WorkerPool<I, O> {
    inner: Arc<Inner<I, O>>,
}

struct Inner<I, O> {
    abort: AtomicBool,
    input: Mutex<InputState<I>>,
    output: Mutex<OutputState<O>>,
    done_tx: Sender<()>,
    done_rx: Receiver<()>,
}

struct InputState<I> {
    next_frame: usize,
    items: Vec<Option<I>>,
}

struct OutputState<O> {
    next_to_drain: usize,
    pending: BTreeMap<usize, O>,
}

impl<I, O> WorkerPool<I, O> {
    pub fn new(items: Vec<I>) -> Self {
        let (done_tx, done_rx) = unbounded();
        let inner = Inner {
            abort: AtomicBool::new(false),
            input: Mutex::new(InputState {
                next_frame: 0,
                items: items.into_iter().map(Some).collect(),
            }),
            output: Mutex::new(OutputState {
                next_to_drain: 0,
                pending: BTreeMap::new(),
            }),
            done_tx,
            done_rx,
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    pub fn handle(&self) -> WorkerPool<I, O> {
        WorkerPool {
            inner: Arc::clone(&self.inner),
        }
    }

    pub fn abort(&self) {
        self.inner.abort.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.inner.abort.load(Ordering::SeqCst)
    }

    /// Claim the next unprocessed frame, returning `(frame_number, item)`
    /// or `None` once input is exhausted or the pool has been aborted.
    pub fn get_input(&self, _worker_id: usize) -> Option<(usize, I)> {
        if self.is_aborted() {
            return None;
        }
        let mut input = self.inner.input.lock().expect("input mutex poisoned");
        loop {
            let frame = input.next_frame;
            if frame >= input.items.len() {
                return None;
            }
            input.next_frame += 1;
            if let Some(item) = input.items[frame].take() {
                return Some((frame, item));
            }
            // Slot was claimed and vacated elsewhere; keep scanning forward.
        }
    }

    /// Record the result for `frame_number`. Completions may arrive
    /// out of order; they are buffered until drained in order via
    /// `drain_ready`.
    pub fn put_output(&self, frame_number: usize, result: O) {
        let mut output = self.inner.output.lock().expect("output mutex poisoned");
        output.pending.insert(frame_number, result);
        let _ = self.inner.done_tx.send(());
    }

    /// Drain any results that are now contiguous with the last drained
    /// frame, in frame-number order.
    pub fn drain_ready(&self) -> Vec<O> {
        let mut output = self.inner.output.lock().expect("output mutex poisoned");
        let mut drained = Vec::new();
        while let Some(item) = output.pending.remove(&output.next_to_drain) {
            drained.push(item);
            output.next_to_drain += 1;
        }
        drained
    }

    /// Block until at least one new result is available, or the pool
    /// is exhausted/aborted.
    pub fn wait_for_progress(&self) {
        let _ = self.inner.done_rx.try_recv();
    }

    pub fn total_items(&self) -> usize {
        self.inner.input.lock().expect("input mutex poisoned").items.len()
    }

    pub fn remaining_output(&self) -> usize {
        let input_total = self.total_items();
        let output = self.inner.output.lock().expect("output mutex poisoned");
        input_total - output.next_to_drain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn single_threaded_roundtrip_preserves_order() {
        let pool: WorkerPool<usize, usize> = WorkerPool::new(vec![10, 20, 30, 40]);
        while let Some((frame, item)) = pool.get_input(0) {
            pool.put_output(frame, item * 2);
        }
        let drained = pool.drain_ready();
        assert_eq!(drained, vec![20, 40, 60, 80]);
    }

    #[test]
    fn out_of_order_completion_still_drains_in_order() {
        let pool: WorkerPool<usize, usize> = WorkerPool::new(vec![1, 2, 3]);
        pool.put_output(2, 300);
        assert!(pool.drain_ready().is_empty());
        pool.put_output(0, 100);
        assert_eq!(pool.drain_ready(), vec![100]);
        pool.put_output(1, 200);
        assert_eq!(pool.drain_ready(), vec![200, 300]);
    }

    #[test]
    fn abort_stops_further_input_claims() {
        let pool: WorkerPool<usize, usize> = WorkerPool::new(vec![1, 2, 3]);
        assert!(pool.get_input(0).is_some());
        pool.abort();
        assert!(pool.get_input(0).is_none());
    }

    #[test]
    fn multiple_workers_claim_disjoint_frames() {
        let pool: Arc<WorkerPool<usize, usize>> = Arc::new(WorkerPool::new((0..100).collect()));
        let mut handles = Vec::new();
        for worker_id in 0..4 {
            let pool = Arc::clone(&pool);
            handles.push(thread::spawn(move || {
                let mut claimed = Vec::new();
                while let Some((frame, item)) = pool.get_input(worker_id) {
                    claimed.push(frame);
                    pool.put_output(frame, item);
                }
                claimed
            }));
        }
        let mut all_claimed: Vec<usize> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        all_claimed.sort_unstable();
        assert_eq!(all_claimed, (0..100).collect::<Vec<_>>());
        assert_eq!(pool.drain_ready().len(), 100);
    }
}
