pub(crate) use entity::{Entity, EntityInfo, EntityResolver, ResolveError};
pub(crate) use env::{EnvRef, LexicalEnv, NO_REFCOUNT};
pub(crate) use getter::{EnvGetter, EnvResolver};
pub(crate) use language::Language;
pub(crate) use rebindings;
pub(crate) use rebindings::{EnvRebinding, RebindingsRef};
