#[macro_use]
extern crate rhea;

use rhea::rebindings::{create, release};
use rhea::symbols::make_symbol;
use rhea::{Entity, EnvGetter, EnvRebinding, EnvRef, LexicalEnv, ResolveError};

simple_language!(TestLang);

type Env = EnvRef<TestLang>;

fn always_fails(entity: Entity<TestLang>) -> Result<Env, ResolveError> {
    Err(ResolveError::new(entity.node, "deliberately refused"))
}

fn entry_hook_fails(entity: Entity<TestLang>) -> Result<Entity<TestLang>, ResolveError> {
    Err(ResolveError::new(entity.node, "entry hook refused"))
}

#[test]
fn reference_resolver_errors_propagate() {
    let sym = make_symbol("k");
    let mut env: Env = LexicalEnv::create(None, 1, false, 0);
    env.add(sym, 5, 0, None);
    env.reference(4, always_fails);

    let err = env.get(sym, 0).unwrap_err();
    let rendered = format!("{}", err);
    assert!(rendered.contains("deliberately refused"));
    assert!(rendered.contains("4"));

    env.destroy();
}

#[test]
fn entry_resolver_errors_propagate() {
    let sym = make_symbol("hooked");
    let mut env: Env = LexicalEnv::create(None, 1, false, 0);
    env.add(sym, 6, 0, Some(entry_hook_fails));

    let err = env.get(sym, 0).unwrap_err();
    assert!(format!("{}", err).contains("entry hook refused"));

    env.destroy();
}

#[test]
fn a_failed_lookup_releases_its_transient_shares() {
    let sym = make_symbol("k2");
    let mut env: Env = LexicalEnv::create(None, 1, false, 0);
    env.add(sym, 5, 0, None);
    env.reference(4, always_fails);

    let mut other: Env = LexicalEnv::create(None, 2, false, 0);
    let mut chain = create(vec![EnvRebinding::new(
        EnvGetter::fixed(other),
        EnvGetter::fixed(other),
    )]);
    assert_eq!(chain.unwrap().ref_count(), 1);

    assert!(env.lookup(sym, 0, true, chain).is_err());
    // The walk combined and popped the chain internally; all of
    // those shares must be gone again.
    assert_eq!(chain.unwrap().ref_count(), 1);

    release(&mut chain);
    env.destroy();
    other.destroy();
}

#[test]
fn absence_is_never_an_error() {
    let mut env: Env = LexicalEnv::create(None, 1, false, 0);
    assert!(env.get(make_symbol("nothing"), 0).unwrap().is_empty());
    assert!(
        EnvRef::<TestLang>::EMPTY
            .get(make_symbol("nothing"), 0)
            .unwrap()
            .is_empty()
    );
    env.destroy();
}

#[test]
#[should_panic(expected = "transitive reference added to a primary env")]
fn transitive_reference_on_a_primary_env_is_a_bug() {
    let primary: Env = LexicalEnv::create(None, 1, false, 0);
    let other: Env = LexicalEnv::create(None, 2, false, 0);
    primary.transitive_reference(other);
}

#[test]
#[should_panic(expected = "dynamic env getters")]
fn equivalence_of_dynamic_getters_is_a_bug() {
    let getter = EnvGetter::<TestLang>::dynamic(1, always_fails);
    let fixed = EnvGetter::fixed(EnvRef::EMPTY);
    getter.is_equivalent(&fixed);
}
