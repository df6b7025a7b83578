//! Bounded worker pool over a slice of independent work items.

use std::panic;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

/// Apply `run` to every item using at most `jobs` scoped threads.
///
/// Workers pull the next unclaimed index from a shared counter, so a slow
/// item never holds up the rest of the queue. Results come back in item
/// order regardless of completion order. A panicking worker is re-raised on
/// the calling thread.
pub(super) fn run_all<I, T, F>(items: &[I], jobs: usize, run: F) -> Vec<T>
where
    I: Sync,
    T: Send,
    F: Fn(&I) -> T + Sync,
{
    let next = AtomicUsize::new(0);
    let workers = jobs.clamp(1, items.len().max(1));

    let mut finished: Vec<(usize, T)> = thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                scope.spawn(|| {
                    let mut done = Vec::new();
                    loop {
                        let index = next.fetch_add(1, Ordering::Relaxed);
                        let Some(item) = items.get(index) else { break };
                        done.push((index, run(item)));
                    }
                    done
                })
            })
            .collect();

        let mut all = Vec::with_capacity(items.len());
        for handle in handles {
            match handle.join() {
                Ok(batch) => all.extend(batch),
                Err(payload) => panic::resume_unwind(payload),
            }
        }
        all
    });

    finished.sort_by_key(|(index, _)| *index);
    finished.into_iter().map(|(_, value)| value).collect()
}
