//! Model merger: fold N per-target declaration trees into one, matching
//! nodes by declaration ref (ignoring the target tag).
//!
//! Matched nodes union their target sets and overlay fields; an overlay key
//! claimed by two inputs is a fatal inconsistency (see [`Overlay::union`]).
//! Unmatched nodes pass through unchanged, so "declared only on platform X"
//! falls out of target-set cardinality with no special node kind.

use std::collections::HashMap;

use crate::error::Result;
use crate::ident::DeclarationRef;
use crate::model::{Classlike, Member, ModuleDecl, PackageDecl};

/// Merge per-target module trees into one unified tree.
///
/// Returns `Ok(None)` when no input has any packages: the "nothing to
/// document" short-circuit, which is not an error. Inputs are sorted by
/// their smallest target identity first, so the result does not depend on
/// the order the trees were supplied in.
pub fn merge_modules(inputs: Vec<ModuleDecl>) -> Result<Option<ModuleDecl>> {
    let mut inputs: Vec<ModuleDecl> = inputs.into_iter().filter(|m| !m.is_empty()).collect();
    if inputs.is_empty() {
        return Ok(None);
    }
    inputs.sort_by(|a, b| {
        let ka = (a.targets.iter().min(), &a.name);
        let kb = (b.targets.iter().min(), &b.name);
        ka.cmp(&kb)
    });

    let mut names: Vec<&str> = inputs.iter().map(|m| m.name.as_str()).collect();
    names.sort_unstable();
    names.dedup();
    let merged_name = names.join("|");

    let mut iter = inputs.into_iter();
    let mut merged = iter.next().expect("at least one non-empty input");
    for next in iter {
        merged = merge_module(merged, next)?;
    }
    merged.name = merged_name;
    Ok(Some(merged))
}

fn merge_module(mut left: ModuleDecl, right: ModuleDecl) -> Result<ModuleDecl> {
    let owner = format!("module {}", left.name);
    left.targets.extend(right.targets);
    left.documentation = left.documentation.union(right.documentation, &owner)?;
    left.packages = merge_by_ref(left.packages, right.packages, |p| &p.dri, merge_package)?;
    Ok(left)
}

fn merge_package(mut left: PackageDecl, right: PackageDecl) -> Result<PackageDecl> {
    let owner = left.dri.to_canonical_string();
    left.targets.extend(right.targets);
    left.documentation = left.documentation.union(right.documentation, &owner)?;
    left.classlikes = merge_by_ref(left.classlikes, right.classlikes, |c| &c.dri, merge_classlike)?;
    left.members = merge_by_ref(left.members, right.members, |m| &m.dri, merge_member)?;
    Ok(left)
}

fn merge_classlike(mut left: Classlike, right: Classlike) -> Result<Classlike> {
    let owner = left.dri.to_canonical_string();
    left.targets.extend(right.targets);
    left.documentation = left.documentation.union(right.documentation, &owner)?;
    left.visibility = left.visibility.union(right.visibility, &owner)?;
    left.modifiers = left.modifiers.union(right.modifiers, &owner)?;
    left.nested = merge_by_ref(left.nested, right.nested, |c| &c.dri, merge_classlike)?;
    left.members = merge_by_ref(left.members, right.members, |m| &m.dri, merge_member)?;
    Ok(left)
}

fn merge_member(mut left: Member, right: Member) -> Result<Member> {
    let owner = left.dri.to_canonical_string();
    left.targets.extend(right.targets);
    left.documentation = left.documentation.union(right.documentation, &owner)?;
    left.visibility = left.visibility.union(right.visibility, &owner)?;
    left.decl_type = left.decl_type.union(right.decl_type, &owner)?;
    left.params = merge_by_ref(left.params, right.params, |m| &m.dri, merge_member)?;
    Ok(left)
}

/// Level-by-level child merge: children matching by ref (target tag ignored)
/// are reduced, unmatched children are appended in first-seen order.
fn merge_by_ref<T>(
    left: Vec<T>,
    right: Vec<T>,
    key: impl Fn(&T) -> &DeclarationRef,
    reduce: impl Fn(T, T) -> Result<T>,
) -> Result<Vec<T>> {
    let mut order: Vec<DeclarationRef> = Vec::new();
    let mut slots: HashMap<DeclarationRef, T> = HashMap::new();

    for node in left.into_iter().chain(right) {
        let normalized = key(&node).without_target();
        match slots.remove(&normalized) {
            Some(existing) => {
                slots.insert(normalized, reduce(existing, node)?);
            }
            None => {
                order.push(normalized.clone());
                slots.insert(normalized, node);
            }
        }
    }

    Ok(order
        .into_iter()
        .filter_map(|normalized| slots.remove(&normalized))
        .collect())
}
