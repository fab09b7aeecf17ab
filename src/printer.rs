//! Renders envs and entities for humans. Nothing here is part of
//! lookup; it exists for logs and for reading test failures.

use prelude::*;
use std::fmt::{self, Write};

impl<L: Language> fmt::Display for Entity<L> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[entity {:?} md {:?}]", self.node, self.info.md)
    }
}

/// An indented rendering of `env`: its own entries (newest first,
/// the order lookup would return them in), its references, and its
/// parent chain. Dynamic parents are named but not resolved; a dump
/// should never run host code.
pub fn dump_env<L: Language>(env: EnvRef<L>) -> String {
    let mut out = String::new();
    let _write_res = dump_into(&mut out, env, 0);
    debug_assert!(_write_res.is_ok());
    out
}

fn pad(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

fn dump_into<L: Language>(out: &mut String, env: EnvRef<L>, depth: usize) -> fmt::Result {
    pad(out, depth);
    let record = match env.record() {
        Some(record) => record,
        None => return writeln!(out, "[env empty]"),
    };
    writeln!(
        out,
        "[env of {:?}{}]",
        record.node,
        if env.is_refcounted() {
            " refcounted"
        } else {
            " primary"
        }
    )?;
    if let Some(chain) = record.rebindings {
        pad(out, depth + 1);
        writeln!(out, "rebindings of size {}", chain.len())?;
    }
    if let Some(map) = record.map() {
        for (sym, bucket) in map {
            pad(out, depth + 1);
            write!(out, "{:?}:", sym)?;
            for raw in bucket.iter().rev() {
                write!(out, " {:?}", raw.node)?;
            }
            writeln!(out)?;
        }
    }
    for reference in &record.referenced {
        pad(out, depth + 1);
        writeln!(out, "filtered reference from {:?}", reference.from_node)?;
    }
    for transitive in &record.transitive {
        pad(out, depth + 1);
        writeln!(out, "transitive reference:")?;
        dump_into(out, *transitive, depth + 2)?;
    }
    if let Some(ref parent) = record.parent {
        pad(out, depth + 1);
        match *parent {
            EnvGetter::Fixed { env: parent_env, .. } => {
                writeln!(out, "parent:")?;
                dump_into(out, parent_env, depth + 2)?;
            }
            EnvGetter::Dynamic { node, .. } => {
                writeln!(out, "parent: dynamic, from {:?}", node)?;
            }
        }
    }
    Ok(())
}
