//! Constructors for derived envs: orphans, groups and rebound envs.
//! All of these are refcounted from birth and never own a symbol
//! map; what entries they expose, they expose through an aliased
//! map or through the envs they reference.

use prelude::*;
use std::cell::Cell;
use super::{wrap, LexicalEnv};

impl<L: Language> EnvRef<L> {
    /// A copy of this env with the parent link severed. The symbol
    /// map is aliased, not copied; referenced and transitive envs
    /// are carried over (with a fresh share of each transitive
    /// one), as is the rebindings chain. Orphaning the empty env
    /// yields the empty env.
    pub fn orphan(&self) -> EnvRef<L> {
        let env = match self.record() {
            Some(env) => env,
            None => return EnvRef::EMPTY,
        };
        for target in &env.transitive {
            target.inc_ref();
        }
        wrap(LexicalEnv {
            parent: None,
            node: env.node,
            own_map: env.own_map,
            referenced: env.referenced.clone(),
            transitive: env.transitive.clone(),
            default_md: env.default_md,
            rebindings: rebindings::inc(env.rebindings),
            ref_count: Cell::new(1),
        })
    }

    /// An env that behaves like this one with `(to_rebind ->
    /// rebind_to)` appended to its rebindings, the new directive
    /// being the most recent. The base env is reached through a
    /// transitive reference.
    pub fn rebind(&self, to_rebind: EnvGetter<L>, rebind_to: EnvGetter<L>) -> EnvRef<L> {
        let base_chain = self.record().and_then(|env| env.rebindings);
        let chain = rebindings::append(base_chain, EnvRebinding::new(to_rebind, rebind_to));
        self.rebound_with_chain(chain)
    }

    /// Rebinds this env into the context an entity was found in.
    /// When `info` is the identity there is nothing to do and the
    /// base itself is returned (with a fresh share); otherwise the
    /// base's chain is extended with `info`'s, `info`'s directives
    /// being the more recent.
    pub fn rebind_with_info(&self, info: &EntityInfo<L>) -> EnvRef<L> {
        if info.is_identity() {
            self.inc_ref();
            return *self;
        }
        let base_chain = self.record().and_then(|env| env.rebindings);
        let chain = rebindings::combine(base_chain, info.rebindings);
        self.rebound_with_chain(chain)
    }

    fn rebound_with_chain(&self, chain: Option<RebindingsRef<L>>) -> EnvRef<L> {
        let env = wrap(LexicalEnv {
            parent: None,
            node: L::NO_NODE,
            own_map: None,
            referenced: Vec::new(),
            transitive: Vec::new(),
            default_md: L::EMPTY_METADATA,
            rebindings: chain,
            ref_count: Cell::new(1),
        });
        env.transitive_reference(*self);
        env
    }
}

impl<L: Language> LexicalEnv<L> {
    /// Combines several envs into one. No envs is the empty env;
    /// one env is that env itself (with a fresh share); more become
    /// transitive references of a new env, searched in the order
    /// given.
    pub fn group(envs: &[EnvRef<L>]) -> EnvRef<L> {
        match envs.len() {
            0 => EnvRef::EMPTY,
            1 => {
                let env = envs[0];
                env.inc_ref();
                env
            }
            _ => {
                let group = wrap(LexicalEnv {
                    parent: None,
                    node: L::NO_NODE,
                    own_map: None,
                    referenced: Vec::new(),
                    transitive: Vec::new(),
                    default_md: L::EMPTY_METADATA,
                    rebindings: None,
                    ref_count: Cell::new(1),
                });
                for &env in envs {
                    group.transitive_reference(env);
                }
                group
            }
        }
    }
}
