use std::collections::VecDeque;
use std::time::{Duration, Instant};

// ============================================================================
// HISTORY STATE
// ============================================================================

/// Summary handed to `on_update` observers after every change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HistoryState {
    pub stack_size: usize,
    /// `None` while the stack is empty.
    pub current_index: Option<usize>,
    pub can_undo: bool,
    pub can_redo: bool,
}

/// Identifies one scheduled debounced push, for cancellation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingToken(u64);

struct PendingPush<S> {
    snapshot: S,
    deadline: Instant,
    token: u64,
}

// ============================================================================
// HISTORY MANAGER - bounded linear undo over whole-document snapshots
// ============================================================================

/// Undo/redo stack of snapshots with a cursor. Entries after the cursor are
/// the redo branch and are dropped by the next push.
///
/// The debounced push is cooperative: the owner calls [`poll`](Self::poll)
/// (e.g. once per frame) and the pending snapshot is committed once its quiet
/// period has elapsed.
pub struct HistoryManager<S> {
    stack: VecDeque<S>,
    index: Option<usize>,
    max_size: usize,
    pending: Option<PendingPush<S>>,
    next_token: u64,
    on_update: Option<Box<dyn FnMut(HistoryState)>>,
}

impl<S> Default for HistoryManager<S> {
    fn default() -> Self {
        Self::new(50)
    }
}

impl<S> HistoryManager<S> {
    pub fn new(max_size: usize) -> Self {
        Self {
            stack: VecDeque::new(),
            index: None,
            max_size: max_size.max(1),
            pending: None,
            next_token: 0,
            on_update: None,
        }
    }

    pub fn set_on_update(&mut self, hook: impl FnMut(HistoryState) + 'static) {
        self.on_update = Some(Box::new(hook));
    }

    fn notify(&mut self) {
        let state = self.state();
        if let Some(hook) = self.on_update.as_mut() {
            hook(state);
        }
    }

    /// Commit `snapshot` now. Drops the redo branch and any pending
    /// debounced snapshot, and evicts the oldest entries beyond `max_size`.
    pub fn push_state(&mut self, snapshot: S) {
        self.pending = None;
        self.commit(snapshot);
    }

    fn commit(&mut self, snapshot: S) {
        let keep = self.index.map_or(0, |i| i + 1);
        self.stack.truncate(keep);
        self.stack.push_back(snapshot);
        while self.stack.len() > self.max_size {
            self.stack.pop_front();
        }
        self.index = Some(self.stack.len() - 1);
        self.notify();
    }

    /// Schedule `snapshot` to be committed after `delay` of quiet. Replaces
    /// any snapshot that is still waiting.
    pub fn push_state_debounced(&mut self, snapshot: S, delay: Duration) -> PendingToken {
        self.push_state_debounced_at(snapshot, delay, Instant::now())
    }

    pub fn push_state_debounced_at(&mut self, snapshot: S, delay: Duration, now: Instant) -> PendingToken {
        self.next_token += 1;
        let token = self.next_token;
        self.pending = Some(PendingPush {
            snapshot,
            deadline: now + delay,
            token,
        });
        PendingToken(token)
    }

    /// Commit the pending snapshot if its deadline has passed.
    pub fn poll(&mut self) -> bool {
        self.poll_at(Instant::now())
    }

    pub fn poll_at(&mut self, now: Instant) -> bool {
        match self.pending.take() {
            Some(p) if p.deadline <= now => {
                self.commit(p.snapshot);
                true
            }
            other => {
                self.pending = other;
                false
            }
        }
    }

    /// Commit the pending snapshot immediately, whatever its deadline.
    pub fn flush(&mut self) -> bool {
        match self.pending.take() {
            Some(p) => {
                self.commit(p.snapshot);
                true
            }
            None => false,
        }
    }

    /// Drop the pending snapshot if `token` still names it.
    pub fn cancel(&mut self, token: PendingToken) -> bool {
        if self.pending.as_ref().is_some_and(|p| p.token == token.0) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn can_undo(&self) -> bool {
        self.index.is_some_and(|i| i > 0)
    }

    pub fn can_redo(&self) -> bool {
        self.index.is_some_and(|i| i + 1 < self.stack.len())
    }

    pub fn undo(&mut self) -> Option<&S> {
        if !self.can_undo() {
            return None;
        }
        self.index = self.index.map(|i| i - 1);
        self.notify();
        self.current_state()
    }

    pub fn redo(&mut self) -> Option<&S> {
        if !self.can_redo() {
            return None;
        }
        self.index = self.index.map(|i| i + 1);
        self.notify();
        self.current_state()
    }

    /// Move the cursor to `index`, e.g. from a history list click.
    pub fn jump_to_state(&mut self, index: usize) -> Option<&S> {
        if index >= self.stack.len() {
            return None;
        }
        self.index = Some(index);
        self.notify();
        self.current_state()
    }

    /// Empty the stack. A pending debounced snapshot is discarded, not flushed.
    pub fn clear(&mut self) {
        self.stack.clear();
        self.index = None;
        self.pending = None;
        self.notify();
    }

    pub fn current_state(&self) -> Option<&S> {
        self.stack.get(self.index?)
    }

    pub fn current_index(&self) -> Option<usize> {
        self.index
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &S> {
        self.stack.iter()
    }

    pub fn state(&self) -> HistoryState {
        HistoryState {
            stack_size: self.stack.len(),
            current_index: self.index,
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    const DELAY: Duration = Duration::from_millis(300);

    #[test]
    fn empty_history() {
        let mut h: HistoryManager<u32> = HistoryManager::default();
        assert_eq!(h.current_index(), None);
        assert!(h.undo().is_none());
        assert!(h.redo().is_none());
        assert!(h.jump_to_state(0).is_none());
        assert_eq!(h.max_size(), 50);
    }

    #[test]
    fn undo_redo_are_inverse() {
        let mut h = HistoryManager::new(10);
        h.push_state("A");
        h.push_state("B");
        assert_eq!(h.undo(), Some(&"A"));
        assert_eq!(h.redo(), Some(&"B"));
        assert_eq!(h.redo(), None);
    }

    #[test]
    fn push_after_undo_drops_redo_branch() {
        let mut h = HistoryManager::new(10);
        h.push_state("A");
        h.push_state("B");
        h.undo();
        h.push_state("C");
        assert_eq!(h.entries().copied().collect::<Vec<_>>(), vec!["A", "C"]);
        assert!(!h.can_redo());
        assert_eq!(h.redo(), None);
    }

    #[test]
    fn overflow_evicts_oldest() {
        let mut h = HistoryManager::new(50);
        for i in 0..51 {
            h.push_state(i);
        }
        assert_eq!(h.len(), 50);
        assert_eq!(h.current_index(), Some(49));
        assert_eq!(h.entries().next(), Some(&1));
        assert_eq!(h.current_state(), Some(&50));
    }

    #[test]
    fn jump_is_bounds_checked() {
        let mut h = HistoryManager::new(10);
        for s in ["A", "B", "C"] {
            h.push_state(s);
        }
        assert_eq!(h.jump_to_state(0), Some(&"A"));
        assert!(h.can_redo());
        assert_eq!(h.jump_to_state(3), None);
        assert_eq!(h.current_index(), Some(0));
    }

    #[test]
    fn clear_resets_cursor() {
        let mut h = HistoryManager::new(10);
        h.push_state(1);
        h.clear();
        assert!(h.is_empty());
        assert_eq!(h.current_index(), None);
        assert!(!h.can_undo());
    }

    #[test]
    fn debounce_commits_only_last() {
        let t0 = Instant::now();
        let mut h = HistoryManager::new(10);
        h.push_state_debounced_at(1, DELAY, t0);
        h.push_state_debounced_at(2, DELAY, t0 + Duration::from_millis(100));
        h.push_state_debounced_at(3, DELAY, t0 + Duration::from_millis(200));

        assert!(!h.poll_at(t0 + Duration::from_millis(400)));
        assert!(h.is_empty());
        assert!(h.poll_at(t0 + Duration::from_millis(500)));
        assert_eq!(h.entries().copied().collect::<Vec<_>>(), vec![3]);
        assert!(!h.has_pending());
    }

    #[test]
    fn explicit_push_discards_pending() {
        let t0 = Instant::now();
        let mut h = HistoryManager::new(10);
        h.push_state_debounced_at("stroke", DELAY, t0);
        h.push_state("fill");
        assert!(!h.poll_at(t0 + DELAY * 2));
        assert_eq!(h.entries().copied().collect::<Vec<_>>(), vec!["fill"]);
    }

    #[test]
    fn clear_discards_pending() {
        let t0 = Instant::now();
        let mut h = HistoryManager::new(10);
        h.push_state_debounced_at(1, DELAY, t0);
        h.clear();
        assert!(!h.poll_at(t0 + DELAY));
        assert!(h.is_empty());
    }

    #[test]
    fn stale_token_cannot_cancel() {
        let t0 = Instant::now();
        let mut h = HistoryManager::new(10);
        let first = h.push_state_debounced_at(1, DELAY, t0);
        let second = h.push_state_debounced_at(2, DELAY, t0);
        assert!(!h.cancel(first));
        assert!(h.cancel(second));
        assert!(!h.has_pending());
    }

    #[test]
    fn flush_ignores_deadline() {
        let mut h = HistoryManager::new(10);
        h.push_state_debounced(7, Duration::from_secs(60));
        assert!(h.flush());
        assert_eq!(h.current_state(), Some(&7));
        assert!(!h.flush());
    }

    #[test]
    fn observers_see_every_change() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let mut h = HistoryManager::new(10);
        h.set_on_update(move |s| sink.borrow_mut().push(s));

        h.push_state('a');
        h.push_state('b');
        h.undo();
        h.undo(); // no-op, no event
        h.clear();

        let seen = log.borrow();
        assert_eq!(seen.len(), 4);
        assert_eq!(
            seen[2],
            HistoryState { stack_size: 2, current_index: Some(0), can_undo: false, can_redo: true }
        );
        assert_eq!(seen[3].current_index, None);
    }
}
