//! The double-buffered chain-swap mechanism: the one piece of a [`crate::Track`]
//! genuinely touched by both the control thread and the audio thread.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicUsize, Ordering};

use rill_core::dsp::DspNode;
use rill_core::{Context, Sample};

use crate::error::EngineError;
use crate::plugin::{Plugin, PluginChain, PluginId, PluginIdAllocator, PluginState};

/// Holds both chain copies and the atomic index of the one the audio thread
/// is currently reading.
///
/// `process` is called exclusively from the audio thread; `add_plugin` and
/// `remove_plugin` are called exclusively from the control thread. Neither
/// side ever mutates the chain the other is touching this block, which is
/// the same single-writer argument used for [`rill_core::ring::SpscRing`]
/// and [`rill_core::param_snapshot::ParamSnapshot`] — carved out of the
/// workspace's default deny-unsafe lint for the same reason those are.
pub struct ChainSlot {
    chains: UnsafeCell<[PluginChain; 2]>,
    active: AtomicUsize,
    ids: UnsafeCell<PluginIdAllocator>,
}

#[allow(unsafe_code)]
unsafe impl Sync for ChainSlot {}

impl Default for ChainSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl ChainSlot {
    /// Creates a slot with two empty, structurally-identical chains.
    pub fn new() -> Self {
        Self {
            chains: UnsafeCell::new([PluginChain::new(), PluginChain::new()]),
            active: AtomicUsize::new(0),
            ids: UnsafeCell::new(PluginIdAllocator::new()),
        }
    }

    /// Audio-thread side: applies the currently-active chain to `out`.
    #[allow(unsafe_code)]
    pub fn process(&self, ctx: &Context, out: &mut [Sample]) {
        let active = self.active.load(Ordering::Acquire);
        // SAFETY: only the audio thread calls `process`, and it only ever
        // touches `chains[active]`; the control thread only ever touches
        // `chains[active ^ 1]` in `add_plugin`/`remove_plugin`, established
        // by the protocol below, so the two never alias a mutable borrow.
        let chain = unsafe { &mut (*self.chains.get())[active] };
        chain.process(ctx, out);
    }

    /// Control-thread side: installs `node` into the inactive chain, swaps
    /// it live, then mirrors the same state into the now-inactive (old
    /// active) chain so both copies stay structurally identical. Both
    /// copies' `Plugin` entries point at the one shared [`PluginState`], so
    /// whichever copy is active after this (or any later) swap carries
    /// forward the same accumulated filter/delay state rather than starting
    /// from a stale clone.
    #[allow(unsafe_code)]
    pub fn add_plugin(&self, node: DspNode) -> Result<PluginId, EngineError> {
        // SAFETY: only the control thread calls this method, serialized
        // with respect to itself by the caller owning `&self` uniquely
        // from the control side (the audio thread never reaches `ids` or
        // mutates a chain through this path).
        let id = unsafe { (*self.ids.get()).alloc() };
        let active = self.active.load(Ordering::Acquire);
        let inactive = active ^ 1;
        let state = PluginState::new(node);

        // SAFETY: see `process` — the audio thread is reading `chains[active]`
        // right now at worst, never `chains[inactive]`.
        unsafe {
            (*self.chains.get())[inactive].push_state(id, state.clone())?;
        }
        self.active.store(inactive, Ordering::Release);
        // The audio thread now reads `inactive` as its active chain from the
        // next block forward; mirror the same (shared) state into the chain
        // it just stopped reading so both copies agree again.
        unsafe {
            (*self.chains.get())[active].push_state(id, state)?;
        }
        Ok(id)
    }

    /// Control-thread side: two-step removal per the design's quiescence
    /// proof — remove from the chain not currently read, swap, then remove
    /// from the other, only then is the node's state truly unreferenced.
    #[allow(unsafe_code)]
    pub fn remove_plugin(&self, id: PluginId) -> Result<(), EngineError> {
        let active = self.active.load(Ordering::Acquire);
        let inactive = active ^ 1;

        // SAFETY: see `add_plugin`.
        unsafe {
            (*self.chains.get())[inactive].remove(id)?;
        }
        self.active.store(inactive, Ordering::Release);
        unsafe {
            (*self.chains.get())[active].remove(id)?;
        }
        Ok(())
    }

    /// Returns the tag (id) sequence of both chains, for the structural
    /// agreement invariant: both must always match.
    #[allow(unsafe_code)]
    pub fn chain_tags(&self) -> [Vec<PluginId>; 2] {
        // SAFETY: read-only snapshot used only by tests/diagnostics, taken
        // with no concurrent writer assumption beyond what every other
        // method here already requires of its caller's thread.
        let chains = unsafe { &*self.chains.get() };
        [chains[0].tags(), chains[1].tags()]
    }

    /// Empties both mirrored chains, freeing every installed plugin.
    ///
    /// Only safe to call when no concurrent `process` is in flight for this
    /// slot (e.g. while the owning track's slot is being freed between
    /// sessions, not mid-stream) — unlike `add_plugin`/`remove_plugin`, this
    /// touches both copies without going through the swap protocol.
    #[allow(unsafe_code)]
    pub fn clear(&self) {
        // SAFETY: caller guarantees no concurrent `process`/`add_plugin`/
        // `remove_plugin` call is in flight, per the doc comment above.
        unsafe {
            for chain in (*self.chains.get()).iter_mut() {
                chain.clear();
            }
        }
    }

    /// Looks up a plugin by id in the currently-active chain (audio thread
    /// use only, e.g. to apply a `Param` op).
    #[allow(unsafe_code)]
    pub fn with_active_plugin_mut<R>(&self, id: PluginId, f: impl FnOnce(&mut Plugin) -> R) -> Option<R> {
        let active = self.active.load(Ordering::Acquire);
        // SAFETY: see `process`.
        let chain = unsafe { &mut (*self.chains.get())[active] };
        chain.get_mut(id).map(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rill_core::dsp::Gain;

    fn ctx() -> Context {
        Context::new(48000.0, 120.0).unwrap()
    }

    #[test]
    fn both_chains_agree_after_add() {
        let slot = ChainSlot::new();
        slot.add_plugin(DspNode::Gain(Gain::new(0.5))).unwrap();
        let [a, b] = slot.chain_tags();
        assert_eq!(a, b);
    }

    #[test]
    fn both_chains_agree_after_remove() {
        let slot = ChainSlot::new();
        let id = slot.add_plugin(DspNode::Gain(Gain::new(0.5))).unwrap();
        slot.remove_plugin(id).unwrap();
        let [a, b] = slot.chain_tags();
        assert_eq!(a, b);
        assert!(a.is_empty());
    }

    #[test]
    fn clear_empties_both_chains() {
        let slot = ChainSlot::new();
        slot.add_plugin(DspNode::Gain(Gain::new(0.5))).unwrap();
        slot.clear();
        let [a, b] = slot.chain_tags();
        assert!(a.is_empty());
        assert!(b.is_empty());
    }

    #[test]
    fn process_applies_the_active_chain() {
        let slot = ChainSlot::new();
        slot.add_plugin(DspNode::Gain(Gain::new(0.25))).unwrap();
        let mut buf = [1.0f32; 4];
        slot.process(&ctx(), &mut buf);
        assert_eq!(buf, [0.25; 4]);
    }

    #[test]
    fn swap_does_not_interrupt_processing_continuity() {
        let slot = ChainSlot::new();
        let mut buf = [1.0f32; 8];
        slot.process(&ctx(), &mut buf);
        assert_eq!(buf, [1.0; 8]);
        slot.add_plugin(DspNode::Gain(Gain::new(0.5))).unwrap();
        let mut buf2 = [1.0f32; 8];
        slot.process(&ctx(), &mut buf2);
        assert_eq!(buf2, [0.5; 8]);
    }

    #[test]
    fn stateful_plugin_state_survives_a_swap() {
        use rill_core::dsp::MoogLpf;

        let slot = ChainSlot::new();
        slot.add_plugin(DspNode::Lpf(MoogLpf::new(48000.0, 500.0, 0.0))).unwrap();

        let mut buf = [1.0f32; 64];
        slot.process(&ctx(), &mut buf);
        let after_first_block = buf[63];
        assert!(after_first_block > 0.0 && after_first_block < 1.0);

        // Installing a second plugin swaps which mirrored chain is active;
        // if the filter's state were a fresh clone rather than shared, this
        // block would retrace the exact same rising curve from v = 0.
        slot.add_plugin(DspNode::Gain(Gain::new(1.0))).unwrap();

        let mut buf2 = [1.0f32; 64];
        slot.process(&ctx(), &mut buf2);
        let after_second_block = buf2[63];
        assert!(after_second_block > after_first_block, "filter state should keep converging across a swap");
    }
}
