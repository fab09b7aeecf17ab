//! What a lookup hands back: a node decorated with the metadata and
//! rebindings that were in force along the path that reached it.

use prelude::*;
use std::fmt;

/// A single lookup result. The entity owns one share of its
/// rebindings chain; callers that drop an entity without passing it
/// on must call `release` on it, or the chain leaks.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Entity<L: Language> {
    pub node: L::Node,
    pub info: EntityInfo<L>,
}

/// The decoration part of an `Entity`, also used on its own when
/// rebinding an env to the context some entity was found in.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct EntityInfo<L: Language> {
    pub md: L::Metadata,
    pub rebindings: Option<RebindingsRef<L>>,
}

/// An optional per-entry hook. When an entry carries one, lookup
/// builds the preliminary entity, passes it through the hook, and
/// returns whatever comes back instead. The hook takes over the
/// preliminary entity's rebindings share.
pub type EntityResolver<L> = fn(Entity<L>) -> Result<Entity<L>, ResolveError>;

/// Raised by host resolvers (entry hooks, referenced-env resolvers,
/// dynamic getters) and propagated out of lookup unchanged. The
/// failing node is captured as rendered text so the error type stays
/// independent of any one frontend.
#[derive(Fail, Debug)]
#[fail(display = "resolver failed on {}: {}", node, message)]
pub struct ResolveError {
    pub node: String,
    pub message: String,
}

impl ResolveError {
    pub fn new<N: fmt::Debug>(node: N, message: &str) -> ResolveError {
        ResolveError {
            node: format!("{:?}", node),
            message: message.to_owned(),
        }
    }
}

impl<L: Language> Entity<L> {
    /// An entity with no decoration at all. Resolvers are handed
    /// their subject node in this shape.
    pub fn bare(node: L::Node) -> Entity<L> {
        Entity {
            node,
            info: EntityInfo::identity(),
        }
    }

    /// Gives up this entity's share of its rebindings chain.
    pub fn release(self) {
        let mut chain = self.info.rebindings;
        rebindings::release(&mut chain);
    }
}

impl<L: Language> EntityInfo<L> {
    pub fn identity() -> EntityInfo<L> {
        EntityInfo {
            md: L::EMPTY_METADATA,
            rebindings: None,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.md == L::EMPTY_METADATA && self.rebindings.is_none()
    }
}
