//! Rebinding chains. A chain is an ordered array of `(old_env ->
//! new_env)` pairs; during lookup, an env about to be searched is
//! swapped for its replacement if some pair targets it, and the
//! *most recent* pair wins. Chains are immutable once built and
//! shared by refcount; every operation here returns a chain the
//! caller owns one share of and must eventually `release`.
//!
//! The empty chain is spelled `None`, not a zero-length allocation.

use prelude::*;
use std::cell::Cell;
use std::ptr::NonNull;
use std::{cmp, fmt, hash};

/// One substitution directive.
#[derive(Clone, Copy, Debug)]
pub struct EnvRebinding<L: Language> {
    pub old_env: EnvGetter<L>,
    pub new_env: EnvGetter<L>,
}

impl<L: Language> EnvRebinding<L> {
    /// The do-nothing rebinding. `append` recognizes it and leaves
    /// the chain alone.
    pub const NONE: EnvRebinding<L> = EnvRebinding {
        old_env: EnvGetter::Fixed {
            env: EnvRef::EMPTY,
            owner: false,
        },
        new_env: EnvGetter::Fixed {
            env: EnvRef::EMPTY,
            owner: false,
        },
    };

    pub fn new(old_env: EnvGetter<L>, new_env: EnvGetter<L>) -> EnvRebinding<L> {
        EnvRebinding { old_env, new_env }
    }

    pub fn is_none(&self) -> bool {
        match (&self.old_env, &self.new_env) {
            (&EnvGetter::Fixed { env: o, .. }, &EnvGetter::Fixed { env: n, .. }) => {
                o == EnvRef::EMPTY && n == EnvRef::EMPTY
            }
            _ => false,
        }
    }
}

/// The heap record behind a chain. Holds one refcount share of each
/// contained getter (released when the record's own count hits
/// zero).
pub struct EnvRebindings<L: Language> {
    ref_count: Cell<usize>,
    bindings: Vec<EnvRebinding<L>>,
}

/// A `Copy` handle to an `EnvRebindings` record. Like any raw
/// handle, equality and hashing go by address. The traits below are
/// implemented by hand because deriving them would also constrain
/// the pointee.
pub struct RebindingsRef<L: Language>(NonNull<EnvRebindings<L>>);

impl<L: Language> cmp::PartialEq for RebindingsRef<L> {
    fn eq(&self, other: &RebindingsRef<L>) -> bool {
        self.0.as_ptr() == other.0.as_ptr()
    }
}

impl<L: Language> cmp::Eq for RebindingsRef<L> {}

impl<L: Language> Clone for RebindingsRef<L> {
    fn clone(&self) -> RebindingsRef<L> {
        *self
    }
}

impl<L: Language> Copy for RebindingsRef<L> {}

impl<L: Language> hash::Hash for RebindingsRef<L> {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        self.0.as_ptr().hash(state);
    }
}

impl<L: Language> fmt::Debug for RebindingsRef<L> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[rebindings size {}]", self.len())
    }
}

impl<L: Language> RebindingsRef<L> {
    fn record(&self) -> &EnvRebindings<L> {
        unsafe { &*self.0.as_ptr() }
    }

    /// The contained pairs, oldest first.
    pub fn bindings(&self) -> &[EnvRebinding<L>] {
        &self.record().bindings
    }

    pub fn len(&self) -> usize {
        self.record().bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        // A live chain is never zero-length; `None` plays that role.
        false
    }

    pub fn ref_count(&self) -> usize {
        self.record().ref_count.get()
    }

    fn inc_ref(&self) {
        let count = self.record().ref_count.get();
        self.record().ref_count.set(count + 1);
    }

    /// Returns true at the refcount-to-zero transition, after the
    /// record and its getter shares have been released.
    fn dec_ref(&self) -> bool {
        let count = self.record().ref_count.get();
        if count == 0 {
            panic!("rebindings chain reference count underflow");
        }
        self.record().ref_count.set(count - 1);
        if count > 1 {
            return false;
        }
        debug!("destroying a rebindings chain of size {}", self.len());
        unsafe {
            let mut record = Box::from_raw(self.0.as_ptr());
            for mut binding in record.bindings.drain(..) {
                binding.old_env.dec_ref();
                binding.new_env.dec_ref();
            }
        }
        true
    }
}

/// Builds a chain from an array of pairs, taking one getter share
/// per contained getter. An empty array is the empty chain, `None`.
pub fn create<L: Language>(bindings: Vec<EnvRebinding<L>>) -> Option<RebindingsRef<L>> {
    if bindings.is_empty() {
        return None;
    }
    for binding in &bindings {
        binding.old_env.inc_ref();
        binding.new_env.inc_ref();
    }
    let record = Box::new(EnvRebindings {
        ref_count: Cell::new(1),
        bindings,
    });
    Some(RebindingsRef(
        NonNull::new(Box::into_raw(record)).unwrap(),
    ))
}

/// A chain one pair longer, with the new pair as the most recent
/// entry. Appending `EnvRebinding::NONE` returns the input chain
/// with a fresh share instead. The input chain keeps its own share
/// either way.
pub fn append<L: Language>(
    chain: Option<RebindingsRef<L>>,
    binding: EnvRebinding<L>,
) -> Option<RebindingsRef<L>> {
    if binding.is_none() {
        return inc(chain);
    }
    let mut slots = match chain {
        Some(c) => c.bindings().to_vec(),
        None => Vec::new(),
    };
    slots.push(binding);
    create(slots)
}

/// Concatenates two chains, left entries first (so the right-hand
/// side is the more recent). When one side is empty the other is
/// returned with a fresh share rather than copied.
pub fn combine<L: Language>(
    left: Option<RebindingsRef<L>>,
    right: Option<RebindingsRef<L>>,
) -> Option<RebindingsRef<L>> {
    match (left, right) {
        (None, None) => None,
        (Some(c), None) | (None, Some(c)) => inc(Some(c)),
        (Some(l), Some(r)) => {
            let mut slots = l.bindings().to_vec();
            slots.extend_from_slice(r.bindings());
            create(slots)
        }
    }
}

/// Structural equivalence: equal sizes and pair-wise equivalent
/// getters. Panics if any compared getter is dynamic, as getter
/// equivalence does.
pub fn is_equivalent<L: Language>(
    left: Option<RebindingsRef<L>>,
    right: Option<RebindingsRef<L>>,
) -> bool {
    match (left, right) {
        (None, None) => true,
        (Some(l), Some(r)) => {
            l.len() == r.len()
                && l.bindings().iter().zip(r.bindings()).all(|(a, b)| {
                    a.old_env.is_equivalent(&b.old_env) && a.new_env.is_equivalent(&b.new_env)
                })
        }
        _ => false,
    }
}

/// Takes an extra share of `chain` and returns it. Convenient when
/// the same chain is about to be stored in two places.
pub fn inc<L: Language>(chain: Option<RebindingsRef<L>>) -> Option<RebindingsRef<L>> {
    if let Some(c) = chain {
        c.inc_ref();
    }
    chain
}

/// Gives up one share of `chain` and nulls the handle. Contained
/// getter shares are released only when the count reaches zero.
pub fn release<L: Language>(chain: &mut Option<RebindingsRef<L>>) {
    if let Some(c) = *chain {
        c.dec_ref();
        *chain = None;
    }
}
