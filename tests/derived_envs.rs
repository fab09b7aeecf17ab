#[macro_use]
extern crate rhea;

use rhea::symbols::make_symbol;
use rhea::{Entity, EnvGetter, EnvRef, EntityInfo, LexicalEnv, ResolveError};
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

#[test]
fn orphan_severs_the_parent_but_keeps_references() {
    let sym = make_symbol("y");
    let mut parent: Env = LexicalEnv::create(None, 1, false, 0);
    parent.add(sym, 20, 0, None);

    let mut referenced: Env = LexicalEnv::create(None, 8, false, 0);
    referenced.add(sym, 22, 0, None);
    register(4, referenced);

    let mut child: Env = LexicalEnv::create(Some(EnvGetter::fixed(parent)), 2, false, 0);
    child.add(sym, 21, 0, None);
    child.reference(4, resolve_registered);

    let through_child = child.get(sym, 0).unwrap();
    assert_eq!(nodes(&through_child), vec![21, 22, 20]);
    release_all(through_child);

    let mut orphan = child.orphan();
    let through_orphan = orphan.get(sym, 0).unwrap();
    assert_eq!(nodes(&through_orphan), vec![21, 22]);
    release_all(through_orphan);

    // The orphan aliases the child's entries rather than copying
    // them, so later additions show through.
    child.add(sym, 23, 0, None);
    let first = orphan.get_first(sym, 0).unwrap().unwrap();
    assert_eq!(first.node, 23);
    first.release();

    orphan.dec_ref();
    child.destroy();
    referenced.destroy();
    parent.destroy();
}

#[test]
fn group_searches_members_in_order() {
    let sym = make_symbol("k");
    let mut first: Env = LexicalEnv::create(None, 1, false, 0);
    first.add(sym, 30, 0, None);
    let mut second: Env = LexicalEnv::create(None, 2, false, 0);
    second.add(sym, 31, 0, None);

    let mut group = LexicalEnv::group(&[first, second]);
    let results = group.get(sym, 0).unwrap();
    assert_eq!(nodes(&results), vec![30, 31]);
    release_all(results);

    group.dec_ref();
    first.destroy();
    second.destroy();
}

#[test]
fn trivial_groups_short_circuit() {
    let empty_group = LexicalEnv::<TestLang>::group(&[]);
    assert!(empty_group.is_empty_env());

    let mut only: Env = LexicalEnv::create(None, 1, false, 0);
    let singleton = LexicalEnv::group(&[only]);
    assert_eq!(singleton, only);
    only.destroy();
}

#[test]
fn rebound_env_looks_up_through_the_replacement() {
    let sym = make_symbol("instantiated");
    let mut formal: Env = LexicalEnv::create(None, 1, false, 0);
    formal.add(sym, 40, 0, None);
    let mut actual: Env = LexicalEnv::create(None, 2, false, 0);
    actual.add(sym, 41, 0, None);
    let mut bystander: Env = LexicalEnv::create(None, 3, false, 0);

    let mut base = LexicalEnv::group(&[formal, bystander]);
    let mut rebound = base.rebind(EnvGetter::fixed(formal), EnvGetter::fixed(actual));

    let before = base.get(sym, 0).unwrap();
    assert_eq!(nodes(&before), vec![40]);
    release_all(before);

    let after = rebound.get(sym, 0).unwrap();
    assert_eq!(nodes(&after), vec![41]);
    release_all(after);

    rebound.dec_ref();
    base.dec_ref();
    formal.destroy();
    actual.destroy();
    bystander.destroy();
}

#[test]
fn rebinding_with_the_identity_info_is_the_base() {
    let mut only: Env = LexicalEnv::create(None, 1, false, 0);
    let mut base = LexicalEnv::group(&[only, only]);
    assert_eq!(base.ref_count(), 1);

    let mut same = base.rebind_with_info(&EntityInfo::identity());
    assert_eq!(same, base);
    assert_eq!(base.ref_count(), 2);

    same.dec_ref();
    base.dec_ref();
    only.destroy();
}
