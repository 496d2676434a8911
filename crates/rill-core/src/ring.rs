//! Wait-free single-producer/single-consumer ring queue.
//!
//! This is one of two modules in the workspace exempted from the
//! workspace-wide `unsafe_code = "deny"` lint (the other is [`crate::arena`]):
//! the producer and the consumer each need exclusive access to disjoint
//! slots of the same backing array through a shared reference, which a
//! safe abstraction would otherwise have to pay for with a lock.
#![allow(unsafe_code)]

use core::cell::UnsafeCell;
use core::mem::MaybeUninit;
use core::sync::atomic::{AtomicUsize, Ordering};

#[cfg(not(feature = "std"))]
use alloc::boxed::Box;
#[cfg(feature = "std")]
use std::boxed::Box;

#[cfg(not(feature = "std"))]
use alloc::sync::Arc;
#[cfg(feature = "std")]
use std::sync::Arc;

/// Bounded wait-free ring between exactly one producer and one consumer.
///
/// Internally stores `N + 1` slots so a full ring can always be
/// distinguished from an empty one without a separate length counter.
/// `SpscRing::split` hands out a [`Producer`]/[`Consumer`] pair; the
/// single-writer/single-reader contract described in the module docs is
/// enforced by there being exactly one of each, not by convention.
pub struct SpscRing<T, const N: usize> {
    slots: Box<[UnsafeCell<MaybeUninit<T>>]>,
    write_idx: AtomicUsize,
    read_idx: AtomicUsize,
}

// SAFETY: access to `slots` is partitioned by construction: only `Producer`
// ever writes slot `write_idx`, only `Consumer` ever reads slot `read_idx`,
// and the release/acquire pair on the opposite index in `try_push`/`try_pop`
// establishes happens-before between a write and the matching read.
unsafe impl<T: Send, const N: usize> Sync for SpscRing<T, N> {}

impl<T, const N: usize> SpscRing<T, N> {
    fn capacity() -> usize {
        N + 1
    }

    /// Builds a ring and splits it into its producer and consumer halves.
    pub fn new() -> (Producer<T, N>, Consumer<T, N>) {
        let slots = (0..Self::capacity())
            .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
            .collect();
        let ring = Arc::new(SpscRing {
            slots,
            write_idx: AtomicUsize::new(0),
            read_idx: AtomicUsize::new(0),
        });
        (
            Producer { ring: ring.clone() },
            Consumer { ring },
        )
    }
}

impl<T, const N: usize> Drop for SpscRing<T, N> {
    fn drop(&mut self) {
        // Drop any element still logically queued between read_idx and
        // write_idx; everything outside that range is uninitialized.
        let w = *self.write_idx.get_mut();
        let mut r = *self.read_idx.get_mut();
        while r != w {
            // SAFETY: slots in `[read_idx, write_idx)` were written by
            // `try_push` and never read, so they hold a live `T`.
            unsafe {
                (*self.slots[r].get()).assume_init_drop();
            }
            r = (r + 1) % Self::capacity();
        }
    }
}

/// The single producer half of a [`SpscRing`].
pub struct Producer<T, const N: usize> {
    ring: Arc<SpscRing<T, N>>,
}

// SAFETY: `Producer` only ever touches the slot at `write_idx`, which no
// `Consumer` reads until the release-store of the new `write_idx` makes it
// visible; moving the producer to another thread is therefore sound.
unsafe impl<T: Send, const N: usize> Send for Producer<T, N> {}

impl<T, const N: usize> Producer<T, N> {
    /// Attempts to push `value`. Returns `false` (and hands `value` back via
    /// drop) if the ring is full.
    ///
    /// Producer-only; calling this from more than one thread concurrently is
    /// a programming error this type does not detect.
    pub fn try_push(&self, value: T) -> bool {
        let ring = &*self.ring;
        let w = ring.write_idx.load(Ordering::Relaxed);
        let r = ring.read_idx.load(Ordering::Acquire);
        let next = (w + 1) % SpscRing::<T, N>::capacity();
        if next == r {
            return false;
        }
        // SAFETY: slot `w` is not readable by the consumer until the
        // release-store below publishes the new `write_idx`, so writing it
        // here does not race `try_pop`.
        unsafe {
            (*ring.slots[w].get()).write(value);
        }
        ring.write_idx.store(next, Ordering::Release);
        true
    }

    /// `true` if the ring currently has no room for another element.
    pub fn is_full(&self) -> bool {
        let ring = &*self.ring;
        let w = ring.write_idx.load(Ordering::Relaxed);
        let r = ring.read_idx.load(Ordering::Acquire);
        (w + 1) % SpscRing::<T, N>::capacity() == r
    }
}

/// The single consumer half of a [`SpscRing`].
pub struct Consumer<T, const N: usize> {
    ring: Arc<SpscRing<T, N>>,
}

// SAFETY: symmetric to `Producer`'s `Send` impl above.
unsafe impl<T: Send, const N: usize> Send for Consumer<T, N> {}

impl<T, const N: usize> Consumer<T, N> {
    /// Attempts to pop the oldest pushed element.
    ///
    /// Consumer-only; calling this from more than one thread concurrently is
    /// a programming error this type does not detect.
    pub fn try_pop(&self) -> Option<T> {
        let ring = &*self.ring;
        let r = ring.read_idx.load(Ordering::Relaxed);
        let w = ring.write_idx.load(Ordering::Acquire);
        if r == w {
            return None;
        }
        // SAFETY: `r != w` (checked above) means slot `r` was published by a
        // `try_push` whose release-store we just observed via the acquire
        // load of `write_idx`, so the element is fully initialized and not
        // concurrently written (the producer will not reuse slot `r` until
        // this function's release-store of `read_idx` below).
        let value = unsafe { (*ring.slots[r].get()).assume_init_read() };
        ring.read_idx
            .store((r + 1) % SpscRing::<T, N>::capacity(), Ordering::Release);
        Some(value)
    }

    /// Drains every currently-available element into `f`, in FIFO order.
    ///
    /// This is the shape the realtime driver uses each block: drain
    /// whatever arrived since the last callback, bounded by whatever was
    /// actually pushed (never an unbounded loop in practice, since the ring
    /// is bounded and nothing refills it concurrently with a single-threaded
    /// drain).
    pub fn drain(&self, mut f: impl FnMut(T)) {
        while let Some(v) = self.try_pop() {
            f(v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_pop_round_trip_in_order() {
        let (p, c) = SpscRing::<u32, 7>::new();
        for i in 0..7u32 {
            assert!(p.try_push(i));
        }
        assert!(!p.try_push(999), "ring of capacity 7 should be full");
        for i in 0..7u32 {
            assert_eq!(c.try_pop(), Some(i));
        }
        assert_eq!(c.try_pop(), None);
    }

    #[test]
    fn wraparound_preserves_order() {
        let (p, c) = SpscRing::<u32, 3>::new();
        for round in 0..5 {
            for i in 0..3u32 {
                assert!(p.try_push(round * 3 + i));
            }
            for i in 0..3u32 {
                assert_eq!(c.try_pop(), Some(round * 3 + i));
            }
        }
    }

    #[test]
    fn drop_runs_destructors_for_queued_elements() {
        use std::sync::Arc as StdArc;
        let counter = StdArc::new(std::sync::atomic::AtomicUsize::new(0));
        struct Dropper(StdArc<std::sync::atomic::AtomicUsize>);
        impl Drop for Dropper {
            fn drop(&mut self) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
        {
            let (p, _c) = SpscRing::<Dropper, 3>::new();
            assert!(p.try_push(Dropper(counter.clone())));
            assert!(p.try_push(Dropper(counter.clone())));
        }
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn concurrent_producer_consumer_preserves_sequence() {
        let (p, c) = SpscRing::<u32, 63>::new();
        let total = 100_000u32;
        let producer = std::thread::spawn(move || {
            let mut i = 0;
            while i < total {
                if p.try_push(i) {
                    i += 1;
                }
            }
        });
        let mut expected = 0u32;
        while expected < total {
            if let Some(v) = c.try_pop() {
                assert_eq!(v, expected);
                expected += 1;
            }
        }
        producer.join().unwrap();
    }
}
