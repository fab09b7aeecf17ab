//! The reachability gate and filter. The test language's
//! `can_reach(node, from)` is `node <= from`, so node ids play the
//! role of declaration order: a lookup from `from` sees only
//! declarations at ids up to `from`.

#[macro_use]
extern crate rhea;

use rhea::symbols::make_symbol;
use rhea::{Entity, EnvRef, LexicalEnv, ResolveError};
use std::cell::RefCell;
use std::collections::HashMap;

simple_language!(TestLang);

type Env = EnvRef<TestLang>;

thread_local! {
    static ENVS_BY_NODE: RefCell<HashMap<u32, Env>> = RefCell::new(HashMap::new());
}

fn register(node: u32, env: Env) {
    ENVS_BY_NODE.with(|m| {
        m.borrow_mut().insert(node, env);
    });
}

fn resolve_registered(entity: Entity<TestLang>) -> Result<Env, ResolveError> {
    let found = ENVS_BY_NODE.with(|m| m.borrow().get(&entity.node).cloned());
    match found {
        Some(env) => {
            env.inc_ref();
            Ok(env)
        }
        None => Err(ResolveError::new(entity.node, "no env registered")),
    }
}

fn nodes(entities: &[Entity<TestLang>]) -> Vec<u32> {
    entities.iter().map(|e| e.node).collect()
}

fn release_all(entities: Vec<Entity<TestLang>>) {
    for entity in entities {
        entity.release();
    }
}

/// One env with an own entry at node 1 and a filtered reference
/// whose origin is node 4, leading to an env with an entry at node
/// 3. Returns `(env, referenced)`.
fn gated_pair(key: &str) -> (Env, Env) {
    let sym = make_symbol(key);
    let referenced: Env = LexicalEnv::create(None, 8, false, 0);
    referenced.add(sym, 3, 0, None);
    register(4, referenced);

    let env: Env = LexicalEnv::create(None, 9, false, 0);
    env.add(sym, 1, 0, None);
    env.reference(4, resolve_registered);
    (env, referenced)
}

#[test]
fn unreachable_reference_is_skipped() {
    let sym = make_symbol("z");
    let (mut env, mut referenced) = gated_pair("z");

    // From node 2, the reference's origin (node 4) is out of reach.
    let results = env.get(sym, 2).unwrap();
    assert_eq!(nodes(&results), vec![1]);
    release_all(results);

    env.destroy();
    referenced.destroy();
}

#[test]
fn reachable_reference_is_consulted() {
    let sym = make_symbol("w");
    let (mut env, mut referenced) = gated_pair("w");

    let results = env.get(sym, 7).unwrap();
    assert_eq!(nodes(&results), vec![1, 3]);
    release_all(results);

    env.destroy();
    referenced.destroy();
}

#[test]
fn filtered_results_are_a_subset() {
    let sym = make_symbol("subset");
    let mut env: Env = LexicalEnv::create(None, 9, false, 0);
    for node in &[1, 3, 5, 7] {
        env.add(sym, *node, 0, None);
    }

    let unfiltered = env.get(sym, 0).unwrap();
    let filtered = env.get(sym, 4).unwrap();
    for entity in &filtered {
        assert!(unfiltered.contains(entity));
    }
    assert_eq!(nodes(&filtered), vec![3, 1]);

    // A from-node that reaches everything filters nothing.
    let wide_open = env.get(sym, 1000).unwrap();
    assert_eq!(nodes(&wide_open), nodes(&unfiltered));

    release_all(unfiltered);
    release_all(filtered);
    release_all(wide_open);
    env.destroy();
}
