//! Env getters: handles that resolve to an env on demand. A getter
//! is a two-variant sum, not a trait object - either it wraps an env
//! directly, or it wraps a node plus a function pointer that will
//! compute the env when asked.

use prelude::*;
use std::convert;

/// Computes an env from a node. Used both for dynamic getters and
/// for filtered references; either way the returned env is a fresh
/// owned reference which the engine releases when it is done.
pub type EnvResolver<L> = fn(Entity<L>) -> Result<EnvRef<L>, ResolveError>;

#[derive(Clone, Copy, Debug)]
pub enum EnvGetter<L: Language> {
    /// Wraps a fixed env. `owner` records whether that env is
    /// refcounted; only then do this getter's `inc_ref`/`dec_ref`
    /// touch the count.
    Fixed { env: EnvRef<L>, owner: bool },
    /// Wraps a node and a resolver. The resolver runs on every
    /// `resolve` call; nothing is cached.
    Dynamic {
        node: L::Node,
        resolve: EnvResolver<L>,
    },
}

impl<L: Language> EnvGetter<L> {
    pub fn fixed(env: EnvRef<L>) -> EnvGetter<L> {
        EnvGetter::Fixed {
            env,
            owner: env.is_refcounted(),
        }
    }

    pub fn dynamic(node: L::Node, resolve: EnvResolver<L>) -> EnvGetter<L> {
        EnvGetter::Dynamic { node, resolve }
    }

    /// Resolves to an env. The result is a fresh owned reference:
    /// for a fixed getter the env's refcount is bumped (a no-op on
    /// primary envs), for a dynamic one the resolver already returns
    /// an owned reference.
    pub fn resolve(&self) -> Result<EnvRef<L>, ResolveError> {
        match *self {
            EnvGetter::Fixed { env, .. } => {
                env.inc_ref();
                Ok(env)
            }
            EnvGetter::Dynamic { node, resolve } => resolve(Entity::bare(node)),
        }
    }

    /// Whether two getters denote the same env. Decidable only for
    /// fixed getters; resolving a dynamic getter here would run the
    /// host's resolver behind the caller's back, so a dynamic
    /// operand is a caller bug.
    ///
    /// # Panics
    ///
    /// If either operand is dynamic.
    pub fn is_equivalent(&self, other: &EnvGetter<L>) -> bool {
        match (self, other) {
            (&EnvGetter::Fixed { env: a, .. }, &EnvGetter::Fixed { env: b, .. }) => a == b,
            _ => panic!("attempt to compare dynamic env getters for equivalence"),
        }
    }

    pub fn inc_ref(&self) {
        if let EnvGetter::Fixed { env, owner: true } = *self {
            env.inc_ref();
        }
    }

    pub fn dec_ref(&mut self) {
        if let EnvGetter::Fixed {
            ref mut env,
            owner: true,
        } = *self
        {
            env.dec_ref();
        }
    }
}

impl<L: Language> convert::From<EnvRef<L>> for EnvGetter<L> {
    fn from(env: EnvRef<L>) -> EnvGetter<L> {
        EnvGetter::fixed(env)
    }
}
