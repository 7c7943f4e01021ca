// src/crawl/queue.rs
// =============================================================================
// This module implements the crawl frontier: the breadth-first queue of
// pages still to visit, plus the set of URLs we've already handled.
//
// How it works:
// 1. push() adds a URL to the back of the queue, unless we've seen it
// 2. pop() takes the oldest URL from the front (FIFO = breadth-first)
// 3. mark_visited() records a URL as handled and tells the caller whether
//    it was new, in one step
//
// Who calls what:
// - The crawl driver is the only caller of pop()
// - Rewriting subtasks call push() and mark_visited() concurrently while a
//   page is being processed
//
// Every operation takes the same lock, so "is it already there? no, then
// add it" can't be split by another subtask doing the same thing.
//
// Rust concepts:
// - Interior mutability: methods take &self but still modify state
// - Mutex: only one caller inside the critical section at a time
// - HashSet: To track visited URLs (O(1) lookup)
// - VecDeque: Double-ended queue for breadth-first crawling
// =============================================================================

use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use url::Url;

// Everything behind the lock
#[derive(Debug, Default)]
struct FrontierState {
    // URLs waiting to be processed, oldest first
    queue: VecDeque<Url>,
    // Same URLs as `queue`, for O(1) "is it pending?" checks
    pending: HashSet<String>,
    // URLs that have been processed (or claimed for download)
    visited: HashSet<String>,
}

// The shared breadth-first frontier
#[derive(Debug, Default)]
pub struct Frontier {
    state: Mutex<FrontierState>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    // Enqueues `url` unless it is already visited or already pending
    //
    // Returns: true if the URL was added
    pub fn push(&self, url: Url) -> bool {
        let mut state = self.state.lock();
        let key = url.as_str();

        if state.visited.contains(key) || state.pending.contains(key) {
            return false;
        }

        state.pending.insert(key.to_string());
        state.queue.push_back(url);
        true
    }

    // Removes the oldest pending URL
    pub fn pop(&self) -> Option<Url> {
        let mut state = self.state.lock();
        let url = state.queue.pop_front()?;
        state.pending.remove(url.as_str());
        Some(url)
    }

    // Records `url` as visited
    //
    // Returns: true if this call is the one that marked it, false if some
    // earlier caller already had. Use the return value to decide who does
    // the work.
    pub fn mark_visited(&self, url: &Url) -> bool {
        self.state.lock().visited.insert(url.as_str().to_string())
    }

    #[cfg(test)]
    pub fn is_visited(&self, url: &Url) -> bool {
        self.state.lock().visited.contains(url.as_str())
    }

    pub fn pending_len(&self) -> usize {
        self.state.lock().queue.len()
    }

    pub fn visited_len(&self) -> usize {
        self.state.lock().visited.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.state.lock().queue.is_empty()
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why does push() take &self and not &mut self?
//    - Several subtasks hold a shared reference to the same Frontier
//    - Rust only allows one &mut at a time, so &mut self would rule that out
//    - The Mutex inside gives us safe mutation through a shared reference
//
// 2. Why parking_lot::Mutex instead of std::sync::Mutex?
//    - lock() returns the guard directly, no Result to unwrap
//    - std's Mutex becomes "poisoned" if a thread panics while holding it;
//      parking_lot's doesn't, so there's nothing to handle
//
// 3. Why keep both `queue` and `pending`?
//    - VecDeque keeps the order (needed for breadth-first)
//    - Checking whether a VecDeque contains something is O(n)
//    - The HashSet answers the same question in O(1)
//
// 4. What does HashSet::insert return?
//    - true if the value wasn't there before
//    - false if it was already present
//    - mark_visited() passes that straight through, which is what makes
//      "check and claim" a single step
// -----------------------------------------------------------------------------
