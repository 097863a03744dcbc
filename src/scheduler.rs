//! Event scheduler driving every time-based component off a single cycle counter.
//!
//! A fixed-capacity binary min-heap of `(timestamp, EventKind)` pairs, keyed by a stable
//! handle so a component can cancel an event it scheduled earlier without a linear scan.
//! See the [Pan Docs timing overview](https://gbdev.io/pandocs/pixel_fifo.html) for the kind
//! of component this exists to coordinate.
//!
//! Closures can't hold mutable back-references into sibling components under Rust's
//! aliasing rules the way the reference scheduler's `std::function<void(int)>` callbacks do,
//! so events here carry a plain [`EventKind`] tag instead of a callback. [`Scheduler::step`]
//! hands each fired tag (and how late it fired) to a caller-supplied closure, which routes it
//! back into the right component. The emulator's main loop owns that routing.

/// Upper bound on events live at once: PPU mode change, DIV, TIMA, four APU channel
/// generators, and the APU frame sequencer, with headroom for re-scheduling overlap.
pub const MAX_EVENTS: usize = 64;

/// Identifies which component's recurring work a scheduled event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// DIV increments every 256 T-cycles, unconditionally.
    TimerDiv,
    /// TIMA increments at the rate selected by TAC, while the timer is enabled.
    TimerTima,
    /// PPU scanline mode transition (Search -> Transfer -> HBlank -> {Search, VBlank}).
    PpuModeChange,
    /// Frame sequencer step clocking length/envelope/sweep across all four channels.
    ApuFrameSequencer,
    /// One of the four PSG channels advancing its synthesis phase.
    ApuChannel(ChannelId),
}

/// The four PSG channels, in register order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelId {
    Quad1,
    Quad2,
    Wave,
    Noise,
}

/// Opaque handle to a live event, returned by [`Scheduler::add`]. Stable across heap
/// reshuffling; only valid for the scheduler instance that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventHandle(usize);

#[derive(Clone, Copy)]
struct Entry {
    id: usize,
    timestamp: u64,
    kind: EventKind,
}

pub struct Scheduler {
    heap: Vec<Entry>,
    /// `position[id]` is the current index of pool slot `id` within `heap`, when live.
    position: [usize; MAX_EVENTS],
    free: Vec<usize>,
    now: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            heap: Vec::with_capacity(MAX_EVENTS),
            position: [usize::MAX; MAX_EVENTS],
            free: (0..MAX_EVENTS).rev().collect(),
            now: 0,
        }
    }

    pub fn reset(&mut self) {
        self.heap.clear();
        self.position = [usize::MAX; MAX_EVENTS];
        self.free = (0..MAX_EVENTS).rev().collect();
        self.now = 0;
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    /// Timestamp of the next event to fire, or `now` if nothing is scheduled.
    pub fn target(&self) -> u64 {
        self.heap.first().map_or(self.now, |e| e.timestamp)
    }

    pub fn remaining_cycles(&self) -> u64 {
        self.target().saturating_sub(self.now)
    }

    pub fn add_cycles(&mut self, cycles: u64) {
        self.now += cycles;
    }

    /// Schedule `kind` to fire `delay` cycles from now. Panics if more than
    /// [`MAX_EVENTS`] events are live simultaneously — that indicates a bug in a
    /// component's rescheduling logic, not a recoverable runtime condition.
    pub fn add(&mut self, delay: u64, kind: EventKind) -> EventHandle {
        let id = self.free.pop().expect("scheduler: exceeded MAX_EVENTS live events");
        let timestamp = self.now + delay;
        let n = self.heap.len();
        self.heap.push(Entry { id, timestamp, kind });
        self.position[id] = n;
        self.sift_up(n);
        EventHandle(id)
    }

    /// Remove a previously scheduled event. A no-op if it already fired.
    pub fn cancel(&mut self, handle: EventHandle) {
        let pos = self.position[handle.0];
        if pos == usize::MAX {
            return;
        }
        self.remove(pos);
        self.free.push(handle.0);
    }

    /// Pop and return the next due event (`timestamp <= now`), or `None` if the heap is
    /// empty or its root is still in the future. Unlike a closure-based drain, returning
    /// owned data here lets the caller re-enter the *same* scheduler (e.g. to reschedule)
    /// from the dispatch step without fighting the borrow checker over a self-referential
    /// callback.
    pub fn pop_due(&mut self) -> Option<(EventKind, u64)> {
        let top = self.heap.first()?;
        if top.timestamp > self.now {
            return None;
        }
        let Entry { id, timestamp, kind } = *top;
        self.remove(0);
        self.free.push(id);
        Some((kind, self.now - timestamp))
    }

    /// Fire every event whose timestamp is `<= now`, in heap-pop order, passing each to
    /// `on_fire(kind, cycles_late)`. Convenience wrapper over [`Scheduler::pop_due`] for
    /// callers whose closure doesn't need to reschedule on this same scheduler instance.
    pub fn step<F: FnMut(EventKind, u64)>(&mut self, mut on_fire: F) {
        while let Some((kind, late)) = self.pop_due() {
            on_fire(kind, late);
        }
    }

    fn parent(n: usize) -> usize {
        (n - 1) / 2
    }

    fn left(n: usize) -> usize {
        n * 2 + 1
    }

    fn right(n: usize) -> usize {
        n * 2 + 2
    }

    fn swap(&mut self, i: usize, j: usize) {
        self.heap.swap(i, j);
        self.position[self.heap[i].id] = i;
        self.position[self.heap[j].id] = j;
    }

    fn sift_up(&mut self, mut n: usize) {
        while n != 0 {
            let p = Self::parent(n);
            if self.heap[p].timestamp <= self.heap[n].timestamp {
                break;
            }
            self.swap(n, p);
            n = p;
        }
    }

    fn heapify_down(&mut self, mut n: usize) {
        loop {
            let l = Self::left(n);
            let r = Self::right(n);
            let mut smallest = n;
            if l < self.heap.len() && self.heap[l].timestamp < self.heap[smallest].timestamp {
                smallest = l;
            }
            if r < self.heap.len() && self.heap[r].timestamp < self.heap[smallest].timestamp {
                smallest = r;
            }
            if smallest == n {
                break;
            }
            self.swap(n, smallest);
            n = smallest;
        }
    }

    fn remove(&mut self, n: usize) {
        let last = self.heap.len() - 1;
        self.position[self.heap[n].id] = usize::MAX;
        self.swap(n, last);
        self.heap.pop();
        if n < self.heap.len() {
            let p = Self::parent(n);
            if n != 0 && self.heap[p].timestamp > self.heap[n].timestamp {
                self.sift_up(n);
            } else {
                self.heapify_down(n);
            }
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_in_timestamp_order() {
        let mut s = Scheduler::new();
        s.add(10, EventKind::TimerDiv);
        s.add(5, EventKind::TimerTima);
        s.add_cycles(6);
        let mut fired = Vec::new();
        s.step(|kind, late| fired.push((kind, late)));
        assert_eq!(fired, vec![(EventKind::TimerTima, 1)]);

        s.add_cycles(10);
        let mut fired = Vec::new();
        s.step(|kind, late| fired.push((kind, late)));
        assert_eq!(fired, vec![(EventKind::TimerDiv, 0)]);
    }

    #[test]
    fn now_never_decreases() {
        let mut s = Scheduler::new();
        let before = s.now();
        s.add_cycles(3);
        assert!(s.now() >= before);
    }

    #[test]
    fn heap_root_strictly_future_after_step() {
        let mut s = Scheduler::new();
        s.add(4, EventKind::PpuModeChange);
        s.add_cycles(4);
        s.step(|_, _| {});
        assert!(s.heap.is_empty() || s.target() > s.now());
    }

    #[test]
    fn cancel_prevents_firing() {
        let mut s = Scheduler::new();
        let h = s.add(4, EventKind::ApuFrameSequencer);
        s.cancel(h);
        s.add_cycles(100);
        let mut fired = false;
        s.step(|_, _| fired = true);
        assert!(!fired);
    }

    #[test]
    fn reentrant_scheduling_from_callback() {
        let mut s = Scheduler::new();
        s.add(1, EventKind::TimerDiv);
        s.add_cycles(1);
        let mut count = 0;
        s.step(|_, _| count += 1);
        assert_eq!(count, 1);
    }
}
