//! The seam between the engine and a generated frontend. The engine
//! never looks inside an AST node, a symbol or a metadata value; it
//! only copies them around, compares them, and hands them back. A
//! frontend describes those types (and the two predicates the engine
//! needs over them) by implementing `Language` on a marker type.

use std::fmt;
use std::hash::Hash;

/// Implemented by a marker type (in practice a zero-sized struct)
/// describing one generated frontend. The `Copy + Eq + Debug` bound
/// on the marker itself costs implementers nothing and lets the
/// engine's handle types derive their impls.
pub trait Language: Copy + Eq + fmt::Debug {
    /// A handle to a client AST node. The engine stores these but
    /// never dereferences them; if the host reparses a unit and
    /// destroys nodes while envs still hold their handles,
    /// `can_reach` must stay well-defined over the stale handles.
    type Node: Copy + PartialEq + fmt::Debug;

    /// An interned identifier. Owned by the host's symbol table (see
    /// the `symbols` module for a ready-made one); the engine only
    /// copies the handle, so equality and hashing must be cheap.
    type Sym: Copy + Eq + Hash + fmt::Debug;

    /// A small value type decorating entries and envs.
    type Metadata: Copy + PartialEq + fmt::Debug;

    /// The null node. Lookups pass this as their `from` element to
    /// disable reachability filtering.
    const NO_NODE: Self::Node;

    /// The identity element of `combine`.
    const EMPTY_METADATA: Self::Metadata;

    /// Merges two metadata values. Must be associative, with
    /// `combine(EMPTY_METADATA, x) == x`. The engine assumes this
    /// but cannot check it on every call; `debug_check_associative`
    /// exists for hosts that want to sample-check their operator.
    fn combine(a: Self::Metadata, b: Self::Metadata) -> Self::Metadata;

    /// Whether a declaration attached to `node` is visible from
    /// `from`. The engine never calls this with `from == NO_NODE`;
    /// it skips the check instead.
    fn can_reach(node: Self::Node, from: Self::Node) -> bool;
}

/// Debug-build sanity check for a host's `combine`: asserts that one
/// concrete triple associates. Call it from tests with a few sampled
/// triples; release builds compile it away.
pub fn debug_check_associative<L: Language>(a: L::Metadata, b: L::Metadata, c: L::Metadata) {
    debug_assert_eq!(
        L::combine(L::combine(a, b), c),
        L::combine(a, L::combine(b, c)),
        "metadata combine is not associative"
    );
}

/// Declares a minimal host language, mostly useful in tests: nodes
/// are `u32` ids with `0` as the null node, metadata is a `u32`
/// bitmask combined with `|`, symbols come from the `symbols`
/// module, and a node can reach any node with an id at least its
/// own (ids play the role of declaration order).
#[macro_export]
macro_rules! simple_language {
    ($name:ident) => {
        #[derive(Clone, Copy, PartialEq, Eq, Debug)]
        pub struct $name;

        impl $crate::Language for $name {
            type Node = u32;
            type Sym = $crate::symbols::SymRef;
            type Metadata = u32;

            const NO_NODE: u32 = 0;
            const EMPTY_METADATA: u32 = 0;

            fn combine(a: u32, b: u32) -> u32 {
                a | b
            }

            fn can_reach(node: u32, from: u32) -> bool {
                node <= from
            }
        }
    };
}
