//! Lexical envs and the handles that reach them. An env maps
//! symbols to entries, has an optional parent getter, and may point
//! at further envs two ways: *filtered* references, consulted only
//! when the looking-up node can reach the reference's origin, and
//! *transitive* references, consulted always.
//!
//! Envs live under two regimes. An env owned by an analysis unit is
//! *primary*: its count field holds the `NO_REFCOUNT` sentinel, it
//! owns its symbol map, and it dies only when the unit explicitly
//! destroys it. Everything else (orphans, groups, rebound envs) is
//! refcounted, never owns a symbol map (it aliases a primary's map
//! or has none), and dies when its last share is released.

use prelude::*;
use std::cell::Cell;
use std::collections::HashMap;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::{fmt, mem};

mod derived;
mod lookup;

/// The count value marking a primary env.
pub const NO_REFCOUNT: usize = ::std::usize::MAX;

lazy_static! {
    /// How many env records are currently allocated. Purely a
    /// diagnostic; the leak tests watch it.
    pub static ref LIVE_ENVS: AtomicUsize = { AtomicUsize::new(0) };
}

pub type EnvMap<L> = HashMap<<L as Language>::Sym, Vec<MapNode<L>>>;

/// A raw entry in an env's symbol map. Buckets keep these in
/// insertion order; lookup walks them newest first.
#[derive(Clone, Copy, Debug)]
pub struct MapNode<L: Language> {
    pub(crate) node: L::Node,
    pub(crate) md: L::Metadata,
    pub(crate) resolver: Option<EntityResolver<L>>,
}

/// A filtered reference: an env computed on demand from `from_node`,
/// consulted only when the looking-up node can reach `from_node`.
/// The holding env does not own a share of the referenced env.
#[derive(Clone, Copy)]
pub struct ReferencedEnv<L: Language> {
    pub(crate) from_node: L::Node,
    pub(crate) resolver: EnvResolver<L>,
}

pub struct LexicalEnv<L: Language> {
    pub(crate) parent: Option<EnvGetter<L>>,
    pub(crate) node: L::Node,
    pub(crate) own_map: Option<NonNull<EnvMap<L>>>,
    pub(crate) referenced: Vec<ReferencedEnv<L>>,
    pub(crate) transitive: Vec<EnvRef<L>>,
    pub(crate) default_md: L::Metadata,
    pub(crate) rebindings: Option<RebindingsRef<L>>,
    pub(crate) ref_count: Cell<usize>,
}

/// A `Copy` handle to an env. The distinguished empty env is a
/// variant of the handle rather than an allocated record, so every
/// operation special-cases it once, up front, and the record type
/// never has to.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct EnvRef<L: Language>(EnvPtr<L>);

#[derive(Clone, Copy, PartialEq, Eq)]
enum EnvPtr<L: Language> {
    Empty,
    Live(NonNull<LexicalEnv<L>>),
}

pub(crate) fn wrap<L: Language>(record: LexicalEnv<L>) -> EnvRef<L> {
    LIVE_ENVS.fetch_add(1, Ordering::Relaxed);
    EnvRef(EnvPtr::Live(
        NonNull::new(Box::into_raw(Box::new(record))).unwrap(),
    ))
}

impl<L: Language> LexicalEnv<L> {
    /// Allocates an env. A primary env (`refcounted = false`) owns a
    /// fresh symbol map; a refcounted one starts with no map at all,
    /// since refcounted envs never own one. When `parent` is given,
    /// one share of it is taken.
    pub fn create(
        parent: Option<EnvGetter<L>>,
        node: L::Node,
        refcounted: bool,
        default_md: L::Metadata,
    ) -> EnvRef<L> {
        if let Some(ref getter) = parent {
            getter.inc_ref();
        }
        let own_map = if refcounted {
            None
        } else {
            Some(NonNull::new(Box::into_raw(Box::new(HashMap::new()))).unwrap())
        };
        wrap(LexicalEnv {
            parent,
            node,
            own_map,
            referenced: Vec::new(),
            transitive: Vec::new(),
            default_md,
            rebindings: None,
            ref_count: Cell::new(if refcounted { 1 } else { NO_REFCOUNT }),
        })
    }
}

impl<L: Language> LexicalEnv<L> {
    pub(crate) fn map(&self) -> Option<&EnvMap<L>> {
        match self.own_map {
            Some(ptr) => Some(unsafe { &*ptr.as_ptr() }),
            None => None,
        }
    }
}

impl<L: Language> EnvRef<L> {
    /// The distinguished empty env. Adding to it, destroying it and
    /// counting references to it are all no-ops; looking anything up
    /// in it finds nothing.
    pub const EMPTY: EnvRef<L> = EnvRef(EnvPtr::Empty);

    pub(crate) fn record(&self) -> Option<&LexicalEnv<L>> {
        match self.0 {
            EnvPtr::Empty => None,
            EnvPtr::Live(ptr) => Some(unsafe { &*ptr.as_ptr() }),
        }
    }

    // Handles are `Copy` aliases of one record, so a unique borrow
    // cannot be had through them; mutation must stay inside this
    // module and never overlap a lookup on the same env.
    fn record_mut(&self) -> Option<&mut LexicalEnv<L>> {
        match self.0 {
            EnvPtr::Empty => None,
            EnvPtr::Live(ptr) => Some(unsafe { &mut *ptr.as_ptr() }),
        }
    }

    pub fn is_empty_env(&self) -> bool {
        self.0 == EnvPtr::Empty
    }

    pub fn is_refcounted(&self) -> bool {
        match self.record() {
            Some(env) => env.ref_count.get() != NO_REFCOUNT,
            None => false,
        }
    }

    /// The node this env is attached to, or `NO_NODE` for the empty
    /// env and for derived envs built without one.
    pub fn env_node(&self) -> L::Node {
        match self.record() {
            Some(env) => env.node,
            None => L::NO_NODE,
        }
    }

    /// The current share count, or `NO_REFCOUNT` for primary and
    /// empty envs.
    pub fn ref_count(&self) -> usize {
        match self.record() {
            Some(env) => env.ref_count.get(),
            None => NO_REFCOUNT,
        }
    }

    /// Inserts an entry for `key`. Entries accumulate in insertion
    /// order within their bucket; lookup returns the newest first.
    /// A no-op on the empty env and on any env without a map.
    pub fn add(
        &self,
        key: L::Sym,
        node: L::Node,
        md: L::Metadata,
        resolver: Option<EntityResolver<L>>,
    ) {
        let env = match self.record_mut() {
            Some(env) => env,
            None => return,
        };
        let map = match env.own_map {
            Some(ptr) => unsafe { &mut *ptr.as_ptr() },
            None => return,
        };
        map.entry(key)
            .or_insert_with(Vec::new)
            .push(MapNode { node, md, resolver });
    }

    /// Removes the first entry under `key` whose node is `node`,
    /// leaving the rest of the bucket in order. Removal goes by node
    /// identity rather than position, which costs a scan of the
    /// bucket. A no-op when no such entry exists.
    pub fn remove(&self, key: L::Sym, node: L::Node) {
        let env = match self.record_mut() {
            Some(env) => env,
            None => return,
        };
        let map = match env.own_map {
            Some(ptr) => unsafe { &mut *ptr.as_ptr() },
            None => return,
        };
        if let Some(bucket) = map.get_mut(&key) {
            if let Some(i) = bucket.iter().position(|entry| entry.node == node) {
                bucket.remove(i);
            }
        }
    }

    /// Appends a filtered reference resolving through `resolver`,
    /// consulted during lookup only when the looking-up node can
    /// reach `from_node`. No share of the referenced env is taken.
    pub fn reference(&self, from_node: L::Node, resolver: EnvResolver<L>) {
        if let Some(env) = self.record_mut() {
            env.referenced.push(ReferencedEnv { from_node, resolver });
        }
    }

    /// Appends a transitive reference, taking one share of `target`.
    ///
    /// # Panics
    ///
    /// If this env is primary (or empty): only refcounted envs may
    /// hold transitive references.
    pub fn transitive_reference(&self, target: EnvRef<L>) {
        let env = match self.record_mut() {
            Some(env) => env,
            None => panic!("transitive reference added to the empty env"),
        };
        if env.ref_count.get() == NO_REFCOUNT {
            panic!("transitive reference added to a primary env");
        }
        target.inc_ref();
        env.transitive.push(target);
    }

    /// Takes a share. A no-op on primary and empty envs.
    pub fn inc_ref(&self) {
        if let Some(env) = self.record() {
            let count = env.ref_count.get();
            if count != NO_REFCOUNT {
                env.ref_count.set(count + 1);
            }
        }
    }

    /// Releases a share. When the last share goes, the env is
    /// destroyed and this handle is reset to the empty env. A no-op
    /// on primary and empty envs.
    pub fn dec_ref(&mut self) {
        let dead = {
            let env = match self.record() {
                Some(env) => env,
                None => return,
            };
            let count = env.ref_count.get();
            if count == NO_REFCOUNT {
                return;
            }
            if count == 0 {
                panic!("lexical env reference count underflow");
            }
            env.ref_count.set(count - 1);
            count == 1
        };
        if dead {
            self.destroy();
        }
    }

    /// Frees the env record. Primary envs also free their symbol
    /// map; refcounted envs never own one, so theirs (if any) is
    /// left to the primary it aliases. Both regimes drop their
    /// filtered references, release their transitive shares and
    /// rebindings, and release the parent getter. Destroying the
    /// empty env is a no-op. The handle is reset to the empty env.
    pub fn destroy(&mut self) {
        let ptr = match self.0 {
            EnvPtr::Empty => return,
            EnvPtr::Live(ptr) => ptr,
        };
        unsafe {
            let mut record = Box::from_raw(ptr.as_ptr());
            let count = record.ref_count.get();
            debug_assert!(
                count == 0 || count == NO_REFCOUNT,
                "destroying an env that still has live shares"
            );
            debug!("destroying the env of {:?}", record.node);
            if count == NO_REFCOUNT {
                if let Some(map) = record.own_map.take() {
                    drop(Box::from_raw(map.as_ptr()));
                }
            }
            record.referenced.clear();
            let transitive = mem::replace(&mut record.transitive, Vec::new());
            for mut target in transitive {
                target.dec_ref();
            }
            rebindings::release(&mut record.rebindings);
            if let Some(ref mut parent) = record.parent {
                parent.dec_ref();
            }
        }
        LIVE_ENVS.fetch_sub(1, Ordering::Relaxed);
        *self = EnvRef::EMPTY;
    }
}

impl<L: Language> fmt::Debug for EnvRef<L> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.record() {
            None => write!(f, "[env empty]"),
            Some(env) => write!(f, "[env of {:?}]", env.node),
        }
    }
}
