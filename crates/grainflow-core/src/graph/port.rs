//! Typed port structs and their reflected field lists.
//!
//! A node kind declares its inputs and outputs as plain structs. The
//! [`node_ports!`](crate::node_ports) macro generates, for such a struct, the
//! ordered [`PortDescriptor`] list and index-based typed access that the
//! compiler uses to wire outputs to inputs without knowing the concrete type.

use core::any::{Any, TypeId};

/// Static description of one named, typed port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortDescriptor {
    /// Field name as declared in the port struct.
    pub name: &'static str,
    /// Runtime type identity of the carried value.
    pub data_type: TypeId,
    /// Human-readable type name, for diagnostics and UIs.
    pub type_name: &'static str,
}

impl PortDescriptor {
    /// Describes a port named `name` carrying values of type `T`.
    pub fn of<T: 'static>(name: &'static str) -> Self {
        Self {
            name,
            data_type: TypeId::of::<T>(),
            type_name: short_type_name(core::any::type_name::<T>()),
        }
    }

    /// Returns true if a value from `self` can be copied into `other`.
    #[inline]
    pub fn is_compatible(&self, other: &PortDescriptor) -> bool {
        self.data_type == other.data_type
    }
}

/// Strips module paths from a type name (`grainflow_core::buffer::StereoBuffer` → `StereoBuffer`).
fn short_type_name(full: &'static str) -> &'static str {
    match full.rfind("::") {
        Some(pos) if !full.contains('<') => &full[pos + 2..],
        _ => full,
    }
}

/// An ordered set of typed ports.
///
/// Implemented by [`node_ports!`](crate::node_ports) for port structs, and by
/// `()` for nodes with no ports on one side.
pub trait PortSet: Default + Clone + Send + 'static {
    /// Number of ports in the set.
    const PORT_COUNT: usize;

    /// Descriptors for every port, in declaration order.
    fn descriptors() -> Vec<PortDescriptor>;

    /// Returns the port at `index` as a type-erased reference.
    fn port(&self, index: usize) -> Option<&dyn Any>;

    /// Copies `value` into the port at `index`.
    ///
    /// Returns false if the index is out of range or the value's type does
    /// not match the port. Copies go through `clone_from`, so heap-backed
    /// ports reuse their existing allocation.
    fn set_port(&mut self, index: usize, value: &dyn Any) -> bool;
}

impl PortSet for () {
    const PORT_COUNT: usize = 0;

    fn descriptors() -> Vec<PortDescriptor> {
        Vec::new()
    }

    fn port(&self, _index: usize) -> Option<&dyn Any> {
        None
    }

    fn set_port(&mut self, _index: usize, _value: &dyn Any) -> bool {
        false
    }
}

/// Declares a port struct and implements [`PortSet`](crate::graph::PortSet) for it.
///
/// Every field carries a default value, used by the generated `Default` impl.
/// Field order is port order.
///
/// # Example
///
/// ```rust
/// use grainflow_core::node_ports;
/// use grainflow_core::graph::PortSet;
///
/// node_ports! {
///     /// Filter inputs.
///     pub struct FilterInput {
///         /// Cutoff in Hz.
///         pub cutoff: f32 = 1000.0,
///         /// Resonance.
///         pub q: f32 = 0.707,
///     }
/// }
///
/// let input = FilterInput::default();
/// assert_eq!(FilterInput::PORT_COUNT, 2);
/// assert_eq!(FilterInput::descriptors()[1].name, "q");
/// assert_eq!(input.port(0).and_then(|p| p.downcast_ref::<f32>()), Some(&1000.0));
/// ```
#[macro_export]
macro_rules! node_ports {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$fmeta:meta])*
                $fvis:vis $field:ident : $ty:ty = $default:expr
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        $vis struct $name {
            $(
                $(#[$fmeta])*
                $fvis $field: $ty,
            )*
        }

        impl ::core::default::Default for $name {
            fn default() -> Self {
                Self {
                    $( $field: $default, )*
                }
            }
        }

        impl $crate::graph::PortSet for $name {
            const PORT_COUNT: usize = <[&str]>::len(&[$(stringify!($field)),*]);

            fn descriptors() -> ::std::vec::Vec<$crate::graph::PortDescriptor> {
                ::std::vec![
                    $( $crate::graph::PortDescriptor::of::<$ty>(stringify!($field)) ),*
                ]
            }

            #[allow(unused_mut, unused_variables, unused_assignments)]
            fn port(&self, index: usize) -> ::core::option::Option<&dyn ::core::any::Any> {
                let mut i = 0usize;
                $(
                    if index == i {
                        return ::core::option::Option::Some(&self.$field);
                    }
                    i += 1;
                )*
                ::core::option::Option::None
            }

            #[allow(unused_mut, unused_variables, unused_assignments)]
            fn set_port(&mut self, index: usize, value: &dyn ::core::any::Any) -> bool {
                let mut i = 0usize;
                $(
                    if index == i {
                        return match value.downcast_ref::<$ty>() {
                            ::core::option::Option::Some(v) => {
                                ::core::clone::Clone::clone_from(&mut self.$field, v);
                                true
                            }
                            ::core::option::Option::None => false,
                        };
                    }
                    i += 1;
                )*
                false
            }
        }
    };
}
