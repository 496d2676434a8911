//! A track's effect chain: an ordered, max-8 sequence of tagged DSP nodes.

use std::cell::UnsafeCell;
use std::sync::Arc;

use rill_core::dsp::DspNode;
use rill_core::{Context, Node, Sample};

use crate::error::EngineError;

/// Upper bound on plugins in a single chain.
pub const MAX_PLUGINS: usize = 8;

/// Identifies a plugin instance across a chain's lifetime, stable across
/// add/remove and across the two mirrored chain copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PluginId(u64);

/// The actual DSP state behind a plugin slot, shared by reference between a
/// [`crate::chain_slot::ChainSlot`]'s two mirrored chains so that swapping
/// which copy is active never discards a stateful node's (LPF, Delay)
/// accumulated history — both copies' [`Plugin`] entries for the same id
/// point at the one underlying node.
#[derive(Debug, Clone)]
pub(crate) struct PluginState(Arc<UnsafeCell<DspNode>>);

// SAFETY: a `PluginState` is only ever dereferenced from the audio thread —
// once inside `PluginChain::process`/`reset` for whichever copy `ChainSlot`
// currently reports active, or from `Plugin::node_mut` via
// `ChainSlot::with_active_plugin_mut` (also audio-thread-only, see that
// module). The control thread only ever clones the `Arc` and moves it
// between the two chains' `Vec<Plugin>` structure; it never dereferences
// the cell.
#[allow(unsafe_code)]
unsafe impl Send for PluginState {}
#[allow(unsafe_code)]
unsafe impl Sync for PluginState {}

impl PluginState {
    pub(crate) fn new(node: DspNode) -> Self {
        Self(Arc::new(UnsafeCell::new(node)))
    }

    #[allow(unsafe_code)]
    fn get(&self) -> &DspNode {
        // SAFETY: see the impl block's safety note.
        unsafe { &*self.0.get() }
    }

    #[allow(unsafe_code)]
    fn get_mut(&self) -> &mut DspNode {
        // SAFETY: see the impl block's safety note.
        unsafe { &mut *self.0.get() }
    }
}

/// One slot in a chain: a stable id plus its (possibly shared) tagged DSP
/// state.
#[derive(Debug, Clone)]
pub struct Plugin {
    id: PluginId,
    state: PluginState,
}

impl Plugin {
    /// This plugin's stable id.
    pub fn id(&self) -> PluginId {
        self.id
    }

    /// The DSP node this plugin wraps.
    pub fn node(&self) -> &DspNode {
        self.state.get()
    }

    /// Mutable access to the DSP node, used to apply a `Param` op.
    pub fn node_mut(&mut self) -> &mut DspNode {
        self.state.get_mut()
    }
}

/// An ordered sequence of plugins applied in place to a buffer that already
/// holds the chain's input (the owning track's synth output).
///
/// There is no explicit `input`/`output` pointer per plugin: the chain
/// itself is the thing that owns the "pull the previous stage, then apply
/// this one" step, so each [`DspNode`] only ever sees a buffer it mutates.
/// The linking invariant from the design (`plugins[0].input = chain.input`,
/// `plugins[i].input = plugins[i-1].output`) falls out of processing the
/// vector in order rather than needing to be represented explicitly.
#[derive(Debug, Clone, Default)]
pub struct PluginChain {
    plugins: Vec<Plugin>,
}

impl PluginChain {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self { plugins: Vec::new() }
    }

    /// Number of plugins currently installed.
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// `true` if the chain holds no plugins.
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// The tag sequence of this chain, used to check that two mirrored
    /// chains agree structurally.
    pub fn tags(&self) -> Vec<PluginId> {
        self.plugins.iter().map(Plugin::id).collect()
    }

    /// Appends a fresh `node` under `id`, rejecting if the chain is already
    /// full. The state is unique to this chain; use
    /// [`crate::chain_slot::ChainSlot::add_plugin`] to install a plugin
    /// whose state is shared with the mirrored copy.
    pub fn push(&mut self, id: PluginId, node: DspNode) -> Result<(), EngineError> {
        self.push_state(id, PluginState::new(node))
    }

    /// Appends an existing (possibly shared) state under `id`, rejecting if
    /// the chain is already full.
    pub(crate) fn push_state(&mut self, id: PluginId, state: PluginState) -> Result<(), EngineError> {
        if self.plugins.len() >= MAX_PLUGINS {
            return Err(EngineError::CapacityExceeded("chain already holds MAX_PLUGINS"));
        }
        self.plugins.push(Plugin { id, state });
        Ok(())
    }

    /// Removes the plugin with `id`.
    pub fn remove(&mut self, id: PluginId) -> Result<(), EngineError> {
        let pos = self
            .plugins
            .iter()
            .position(|p| p.id == id)
            .ok_or(EngineError::InvalidArgument("no plugin with that id in this chain"))?;
        self.plugins.remove(pos);
        Ok(())
    }

    /// Finds a plugin by id.
    pub fn get(&self, id: PluginId) -> Option<&Plugin> {
        self.plugins.iter().find(|p| p.id == id)
    }

    /// Mutable access to a plugin by id (used to apply a `Param` op).
    pub fn get_mut(&mut self, id: PluginId) -> Option<&mut Plugin> {
        self.plugins.iter_mut().find(|p| p.id == id)
    }

    /// Applies every installed plugin to `out` in order. `out` must already
    /// hold the chain's input (the track's synth output for the active
    /// block). A closed gate zeroes `out` and the remaining plugins are
    /// skipped, since their input would be all-zero anyway.
    pub fn process(&mut self, ctx: &Context, out: &mut [Sample]) {
        for plugin in self.plugins.iter_mut() {
            let node = plugin.node_mut();
            if !node.wants_upstream() {
                for s in out.iter_mut() {
                    *s = 0.0;
                }
                break;
            }
            node.process(ctx, out);
        }
    }

    /// Resets every plugin's internal state.
    pub fn reset(&mut self) {
        for plugin in self.plugins.iter_mut() {
            plugin.node_mut().reset();
        }
    }

    /// Removes every plugin, leaving the chain empty. Used when a track's
    /// slot is being freed for reuse.
    pub fn clear(&mut self) {
        self.plugins.clear();
    }
}

/// Allocates fresh, process-wide-unique plugin ids without any shared
/// counter: each chain mutation on the control thread calls this once.
#[derive(Debug, Default)]
pub struct PluginIdAllocator {
    next: u64,
}

impl PluginIdAllocator {
    /// Creates an allocator starting at id 0.
    pub fn new() -> Self {
        Self { next: 0 }
    }

    /// Allocates the next id.
    pub fn alloc(&mut self) -> PluginId {
        let id = PluginId(self.next);
        self.next += 1;
        id
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
    fn push_then_process_applies_gain() {
        let mut chain = PluginChain::new();
        let mut ids = PluginIdAllocator::new();
        chain.push(ids.alloc(), DspNode::Gain(Gain::new(0.5))).unwrap();
        let mut buf = [1.0f32; 4];
        chain.process(&ctx(), &mut buf);
        assert_eq!(buf, [0.5; 4]);
    }

    #[test]
    fn push_beyond_capacity_is_rejected() {
        let mut chain = PluginChain::new();
        let mut ids = PluginIdAllocator::new();
        for _ in 0..MAX_PLUGINS {
            chain.push(ids.alloc(), DspNode::Gain(Gain::new(1.0))).unwrap();
        }
        let result = chain.push(ids.alloc(), DspNode::Gain(Gain::new(1.0)));
        assert!(matches!(result, Err(EngineError::CapacityExceeded(_))));
    }

    #[test]
    fn remove_unknown_id_is_invalid_argument() {
        let mut chain = PluginChain::new();
        let result = chain.remove(PluginId(999));
        assert!(matches!(result, Err(EngineError::InvalidArgument(_))));
    }

    #[test]
    fn closed_gate_zeroes_and_skips_remaining_plugins() {
        use rill_core::dsp::Gate;
        let mut chain = PluginChain::new();
        let mut ids = PluginIdAllocator::new();
        chain.push(ids.alloc(), DspNode::Gate(Gate::new(false))).unwrap();
        chain.push(ids.alloc(), DspNode::Gain(Gain::new(2.0))).unwrap();
        let mut buf = [1.0f32; 4];
        chain.process(&ctx(), &mut buf);
        assert_eq!(buf, [0.0; 4]);
    }
}
