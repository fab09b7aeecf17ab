#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;
extern crate failure;
#[macro_use]
extern crate failure_derive;

#[macro_use]
pub mod language;

pub mod entity;
pub mod env;
pub mod getter;
mod prelude;
pub mod printer;
pub mod rebindings;
pub mod symbols;

pub use entity::{Entity, EntityInfo, EntityResolver, ResolveError};
pub use env::{EnvRef, LexicalEnv, NO_REFCOUNT};
pub use getter::{EnvGetter, EnvResolver};
pub use language::Language;
pub use rebindings::{EnvRebinding, RebindingsRef};
