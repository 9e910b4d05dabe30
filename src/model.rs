//! The declaration model: one tree per analyzed target before merging, one
//! unified tree afterwards. Anything that can legitimately differ per target
//! is an [`Overlay`] field.
//!
//! Trees arrive as JSON produced by an external translator front-end; this
//! crate never parses source text itself.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::ident::{DeclarationRef, TargetId};

/// Per-target-keyed value bag. Keys are unique; insertion order is
/// irrelevant (a `BTreeMap` keeps iteration deterministic).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Overlay<T> {
    entries: BTreeMap<TargetId, T>,
}

impl<T> Default for Overlay<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Overlay<T> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    pub fn of(target: TargetId, value: T) -> Self {
        let mut overlay = Self::new();
        overlay.entries.insert(target, value);
        overlay
    }

    pub fn insert(&mut self, target: TargetId, value: T) -> Option<T> {
        self.entries.insert(target, value)
    }

    pub fn get(&self, target: &TargetId) -> Option<&T> {
        self.entries.get(target)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TargetId, &T)> {
        self.entries.iter()
    }

    pub fn targets(&self) -> impl Iterator<Item = &TargetId> {
        self.entries.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.values()
    }

    /// Key-wise union. A key present in both sides is an attribution
    /// collision: two inputs both claimed the same target for the same node.
    /// Last-writer-wins is deliberately not an option here.
    pub fn union(mut self, other: Self, owner: &str) -> Result<Self> {
        for (target, value) in other.entries {
            if self.entries.contains_key(&target) {
                return Err(Error::AttributionCollision {
                    dri: owner.to_string(),
                    target: target.to_string(),
                });
            }
            self.entries.insert(target, value);
        }
        Ok(self)
    }

    /// True when all present values compare equal; such overlays render as a
    /// single block instead of a platform-hinted one.
    pub fn is_uniform(&self) -> bool
    where
        T: PartialEq,
    {
        let mut values = self.entries.values();
        match values.next() {
            Some(first) => values.all(|v| v == first),
            None => true,
        }
    }
}

/// Declared visibility; anything not public may be filtered by transforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Internal,
    Protected,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClasslikeKind {
    Class,
    Interface,
    Enum,
    Object,
    Annotation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MemberKind {
    Function,
    Property,
    Parameter,
    TypeParameter,
    EnumEntry,
}

/// Root of one declaration tree: a module as seen by one target before the
/// merge, or by the union of all targets after it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleDecl {
    pub name: String,
    #[serde(default)]
    pub targets: BTreeSet<TargetId>,
    #[serde(default)]
    pub documentation: Overlay<String>,
    #[serde(default)]
    pub packages: Vec<PackageDecl>,
}

impl ModuleDecl {
    /// A module with no packages contributes nothing to the documentation.
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageDecl {
    pub dri: DeclarationRef,
    pub name: String,
    #[serde(default)]
    pub targets: BTreeSet<TargetId>,
    #[serde(default)]
    pub documentation: Overlay<String>,
    #[serde(default)]
    pub classlikes: Vec<Classlike>,
    /// Package-level functions and properties.
    #[serde(default)]
    pub members: Vec<Member>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classlike {
    pub dri: DeclarationRef,
    pub name: String,
    pub kind: ClasslikeKind,
    #[serde(default)]
    pub targets: BTreeSet<TargetId>,
    #[serde(default)]
    pub documentation: Overlay<String>,
    #[serde(default)]
    pub visibility: Overlay<Visibility>,
    #[serde(default)]
    pub modifiers: Overlay<Vec<String>>,
    #[serde(default)]
    pub nested: Vec<Classlike>,
    #[serde(default)]
    pub members: Vec<Member>,
}

impl Classlike {
    /// The container/leaf split the page builder relies on.
    pub fn has_members(&self) -> bool {
        !self.members.is_empty() || !self.nested.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub dri: DeclarationRef,
    pub name: String,
    pub kind: MemberKind,
    #[serde(default)]
    pub targets: BTreeSet<TargetId>,
    #[serde(default)]
    pub documentation: Overlay<String>,
    #[serde(default)]
    pub visibility: Overlay<Visibility>,
    /// Declared type (return type for functions, value type otherwise).
    #[serde(default)]
    pub decl_type: Overlay<String>,
    /// Value and type parameters of a function; empty for everything else.
    #[serde(default)]
    pub params: Vec<Member>,
}
