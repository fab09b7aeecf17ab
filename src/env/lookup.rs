//! The lookup walk. Results come back in one fixed order: this
//! env's own entries (newest first), then filtered references, then
//! transitive references, then the parent chain. Downstream
//! analyses depend on that order, so it is part of the contract,
//! not an accident of implementation.
//!
//! Termination over cyclic graphs is structural: every inward
//! recursion (into a referenced or transitive env) passes
//! `recursive = false`, which disables the filtered-reference and
//! parent steps on the far side. Only the parent walk keeps
//! `recursive = true`, and parent chains are required to be acyclic.

use prelude::*;
use super::LexicalEnv;

impl<L: Language> EnvRef<L> {
    /// Full recursive lookup with no caller-supplied rebindings.
    /// Pass `from = NO_NODE` to disable reachability filtering.
    pub fn get(&self, key: L::Sym, from: L::Node) -> Result<Vec<Entity<L>>, ResolveError> {
        self.lookup(key, from, true, None)
    }

    /// Like `get`, but keeps only the first result and releases the
    /// shares of the rest.
    pub fn get_first(
        &self,
        key: L::Sym,
        from: L::Node,
    ) -> Result<Option<Entity<L>>, ResolveError> {
        let mut results = self.get(key, from)?;
        if results.is_empty() {
            return Ok(None);
        }
        let first = results.remove(0);
        for entity in results {
            entity.release();
        }
        Ok(Some(first))
    }

    /// The general form. `rebindings` is borrowed: the caller keeps
    /// its share. Each returned entity owns a share of the chain it
    /// was decorated with; on error, nothing is returned and every
    /// transient share is released before the error propagates.
    pub fn lookup(
        &self,
        key: L::Sym,
        from: L::Node,
        recursive: bool,
        rebindings: Option<RebindingsRef<L>>,
    ) -> Result<Vec<Entity<L>>, ResolveError> {
        let env = match self.record() {
            Some(env) => env,
            None => return Ok(Vec::new()),
        };

        // Caller rebindings first, then the env's own.
        let mut current = rebindings::combine(rebindings, env.rebindings);

        // If the most recent rebinding targeting this env says to
        // look elsewhere, follow it, and keep the chain minus that
        // one directive for the rest of the walk.
        let (mut popped, mut target, target_owned) = match self.pop_rebinding(current) {
            Ok(step) => step,
            Err(e) => {
                rebindings::release(&mut current);
                return Err(e);
            }
        };

        let mut results = Vec::new();
        let outcome = self.lookup_into(&mut results, env, target, key, from, recursive, popped);

        if target_owned {
            target.dec_ref();
        }
        rebindings::release(&mut popped);
        rebindings::release(&mut current);

        match outcome {
            Ok(()) => {
                if from != L::NO_NODE {
                    let gathered = results;
                    results = Vec::with_capacity(gathered.len());
                    for entity in gathered {
                        if L::can_reach(entity.node, from) {
                            results.push(entity);
                        } else {
                            entity.release();
                        }
                    }
                }
                Ok(results)
            }
            Err(e) => {
                // Partial results are never returned.
                for entity in results {
                    entity.release();
                }
                Err(e)
            }
        }
    }

    /// Scans `current` newest-to-oldest for a directive whose
    /// `old_env` is this env. On a hit, returns the chain minus that
    /// one slot, the replacement env, and a flag saying the
    /// replacement is an owned reference. Otherwise returns a fresh
    /// share of `current` and this env itself.
    fn pop_rebinding(
        &self,
        current: Option<RebindingsRef<L>>,
    ) -> Result<(Option<RebindingsRef<L>>, EnvRef<L>, bool), ResolveError> {
        if let Some(chain) = current {
            let slots = chain.bindings();
            for i in (0..slots.len()).rev() {
                let mut old = slots[i].old_env.resolve()?;
                let hit = old == *self;
                old.dec_ref();
                if hit {
                    let replacement = slots[i].new_env.resolve()?;
                    let mut remaining = Vec::with_capacity(slots.len() - 1);
                    remaining.extend_from_slice(&slots[..i]);
                    remaining.extend_from_slice(&slots[i + 1..]);
                    return Ok((rebindings::create(remaining), replacement, true));
                }
            }
        }
        Ok((rebindings::inc(current), *self, false))
    }

    /// Steps 4 through 7: own entries out of `target` (the env after
    /// rebinding), then this env's references and parent. Entities
    /// are appended to `out`; the caller releases them on error.
    fn lookup_into(
        &self,
        out: &mut Vec<Entity<L>>,
        env: &LexicalEnv<L>,
        target: EnvRef<L>,
        key: L::Sym,
        from: L::Node,
        recursive: bool,
        popped: Option<RebindingsRef<L>>,
    ) -> Result<(), ResolveError> {
        // Own entries, newest first, decorated with the env's
        // default metadata and the remaining rebindings.
        if let Some(target_env) = target.record() {
            if let Some(map) = target_env.map() {
                if let Some(bucket) = map.get(&key) {
                    for raw in bucket.iter().rev() {
                        let mut entity = Entity {
                            node: raw.node,
                            info: EntityInfo {
                                md: L::combine(raw.md, target_env.default_md),
                                rebindings: rebindings::inc(popped),
                            },
                        };
                        if let Some(resolve) = raw.resolver {
                            match resolve(entity) {
                                Ok(resolved) => entity = resolved,
                                Err(e) => {
                                    entity.release();
                                    return Err(e);
                                }
                            }
                        }
                        out.push(entity);
                    }
                }
            }
        }

        // Filtered references, gated on reachability.
        if recursive {
            for reference in &env.referenced {
                if from != L::NO_NODE && !L::can_reach(reference.from_node, from) {
                    continue;
                }
                let mut child = (reference.resolver)(Entity::bare(reference.from_node))?;
                let sub = child.lookup(key, from, false, popped);
                child.dec_ref();
                out.extend(sub?);
            }
        }

        // Transitive references, never gated.
        for transitive in &env.transitive {
            out.extend(transitive.lookup(key, from, false, popped)?);
        }

        // The parent chain.
        if recursive {
            if let Some(ref parent) = env.parent {
                let mut parent_env = parent.resolve()?;
                let sub = parent_env.lookup(key, from, true, popped);
                parent_env.dec_ref();
                out.extend(sub?);
            }
        }

        Ok(())
    }
}
