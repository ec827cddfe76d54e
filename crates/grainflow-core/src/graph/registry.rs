//! Node kind registry.
//!
//! [`NodeRegistry`] is built once at startup and passed by reference to the
//! compiler and to anything that needs node metadata. Each registered kind has
//! a [`NodeTypeInfo`]: its ports, state size, and a factory that allocates the
//! kind's runtime state with its processing function attached.

use std::collections::HashMap;

use super::node::{ErasedState, NodeDefinition, NodeState, NodeTypeId, ProcessFn, TypedState};
use super::port::{PortDescriptor, PortSet};

/// Category of node kind for organization and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeCategory {
    /// Audio-rate generators (oscillators, samplers).
    Source,
    /// Control-rate modulators (LFOs, envelopes).
    Control,
    /// Arithmetic on port values.
    Math,
    /// Constants, routing, and everything else.
    Utility,
}

impl NodeCategory {
    /// Returns a human-readable name for the category.
    pub const fn name(&self) -> &'static str {
        match self {
            NodeCategory::Source => "Source",
            NodeCategory::Control => "Control",
            NodeCategory::Math => "Math",
            NodeCategory::Utility => "Utility",
        }
    }
}

type StateFactory = Box<dyn Fn() -> Box<dyn ErasedState> + Send + Sync>;

/// Metadata and allocator for one registered node kind.
pub struct NodeTypeInfo {
    /// Stable id of the kind.
    pub type_id: NodeTypeId,
    /// Rust type name of the kind.
    pub type_name: &'static str,
    /// Display name ([`NodeDefinition::NAME`]).
    pub name: &'static str,
    /// Category for listings.
    pub category: NodeCategory,
    /// One-line description.
    pub description: &'static str,
    /// Bytes of runtime state (`size_of::<NodeState<T>>()`).
    pub state_size: usize,
    /// Input port descriptors, in declaration order.
    pub inputs: Vec<PortDescriptor>,
    /// Output port descriptors, in declaration order.
    pub outputs: Vec<PortDescriptor>,
    alloc: StateFactory,
}

impl NodeTypeInfo {
    /// Allocates a fresh, default-initialized runtime state for this kind.
    pub fn alloc_state(&self) -> Box<dyn ErasedState> {
        (self.alloc)()
    }

    /// Index of the input port named `name`.
    pub fn input_index(&self, name: &str) -> Option<usize> {
        self.inputs.iter().position(|p| p.name == name)
    }

    /// Index of the output port named `name`.
    pub fn output_index(&self, name: &str) -> Option<usize> {
        self.outputs.iter().position(|p| p.name == name)
    }
}

impl core::fmt::Debug for NodeTypeInfo {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NodeTypeInfo")
            .field("type_id", &self.type_id)
            .field("name", &self.name)
            .field("category", &self.category)
            .field("state_size", &self.state_size)
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .finish_non_exhaustive()
    }
}

/// Registry of node kinds, keyed by [`NodeTypeId`].
///
/// Registration is single-threaded startup work. Lookups of unregistered
/// kinds through [`node_info`](Self::node_info) are programmer errors and
/// panic; [`try_node_info`](Self::try_node_info) is the non-panicking variant.
#[derive(Default)]
pub struct NodeRegistry {
    entries: Vec<NodeTypeInfo>,
    lookup: HashMap<NodeTypeId, usize>,
}

impl NodeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers node kind `T` with its processing function.
    ///
    /// # Panics
    ///
    /// Panics if `T` is already registered.
    pub fn add_node<T: NodeDefinition>(&mut self, process: ProcessFn<T>) -> NodeTypeId {
        let type_id = NodeTypeId::of::<T>();
        assert!(
            !self.lookup.contains_key(&type_id),
            "node kind {} is already registered",
            core::any::type_name::<T>()
        );

        let info = NodeTypeInfo {
            type_id,
            type_name: core::any::type_name::<T>(),
            name: T::NAME,
            category: T::CATEGORY,
            description: T::DESCRIPTION,
            state_size: core::mem::size_of::<NodeState<T>>(),
            inputs: T::Input::descriptors(),
            outputs: T::Output::descriptors(),
            alloc: Box::new(move || Box::new(TypedState::<T>::new(process))),
        };

        #[cfg(feature = "tracing")]
        tracing::trace!(
            name = info.name,
            id = %type_id,
            state_size = info.state_size,
            "registered node kind"
        );

        self.lookup.insert(type_id, self.entries.len());
        self.entries.push(info);
        type_id
    }

    /// Returns the info for `type_id`.
    ///
    /// # Panics
    ///
    /// Panics if the kind was never registered.
    pub fn node_info(&self, type_id: NodeTypeId) -> &NodeTypeInfo {
        match self.try_node_info(type_id) {
            Some(info) => info,
            None => panic!("node kind {type_id} is not registered"),
        }
    }

    /// Returns the info for `type_id`, if registered.
    pub fn try_node_info(&self, type_id: NodeTypeId) -> Option<&NodeTypeInfo> {
        self.lookup.get(&type_id).map(|&i| &self.entries[i])
    }

    /// Returns the info for node kind `T`.
    ///
    /// # Panics
    ///
    /// Panics if `T` was never registered.
    pub fn info_of<T: NodeDefinition>(&self) -> &NodeTypeInfo {
        self.node_info(NodeTypeId::of::<T>())
    }

    /// Finds a kind by display name (case-insensitive).
    pub fn find_by_name(&self, name: &str) -> Option<&NodeTypeInfo> {
        self.entries
            .iter()
            .find(|info| info.name.eq_ignore_ascii_case(name))
    }

    /// Returns true if `type_id` is registered.
    pub fn contains(&self, type_id: NodeTypeId) -> bool {
        self.lookup.contains_key(&type_id)
    }

    /// All registered kinds, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &NodeTypeInfo> {
        self.entries.iter()
    }

    /// Kinds in `category`, in registration order.
    pub fn in_category(&self, category: NodeCategory) -> impl Iterator<Item = &NodeTypeInfo> {
        self.entries.iter().filter(move |i| i.category == category)
    }

    /// Number of registered kinds.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no kinds are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{AddFloat, ConstantFloat, SineOsc, register_builtin_nodes};

    #[test]
    fn test_register_and_lookup() {
        let mut registry = NodeRegistry::new();
        register_builtin_nodes(&mut registry);
        assert_eq!(registry.len(), 4);

        let add = registry.info_of::<AddFloat>();
        assert_eq!(add.name, "AddFloat");
        assert_eq!(add.category, NodeCategory::Math);
        assert_eq!(add.inputs.len(), 2);
        assert_eq!(add.outputs.len(), 1);
        assert_eq!(add.input_index("b"), Some(1));
        assert_eq!(add.output_index("nope"), None);
    }

    #[test]
    fn test_find_by_name_ignores_case() {
        let mut registry = NodeRegistry::new();
        register_builtin_nodes(&mut registry);
        let info = registry.find_by_name("sineosc").unwrap();
        assert_eq!(info.type_id, NodeTypeId::of::<SineOsc>());
        assert!(registry.find_by_name("Reverb").is_none());
    }

    #[test]
    fn test_alloc_state_matches_kind() {
        let mut registry = NodeRegistry::new();
        register_builtin_nodes(&mut registry);
        let state = registry.info_of::<ConstantFloat>().alloc_state();
        assert_eq!(state.node_type(), NodeTypeId::of::<ConstantFloat>());
        assert_eq!(state.output_count(), 1);
    }

    #[test]
    fn test_try_node_info_unknown() {
        let registry = NodeRegistry::new();
        assert!(registry.try_node_info(NodeTypeId::of::<AddFloat>()).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn test_duplicate_registration_panics() {
        let mut registry = NodeRegistry::new();
        register_builtin_nodes(&mut registry);
        registry.add_node::<AddFloat>(|_| {});
    }

    #[test]
    #[should_panic(expected = "not registered")]
    fn test_unknown_node_info_panics() {
        let registry = NodeRegistry::new();
        let _ = registry.node_info(NodeTypeId::of::<AddFloat>());
    }
}
