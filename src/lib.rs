//! unidoc — merge per-platform declaration trees into one documentation
//! model and render it.
//!
//! The library takes one serialized declaration tree per compilation target,
//! merges them into a single tree with per-target attribution, builds a page
//! tree with stable output locations, and renders it to markdown or HTML.
//! Cross-module linking works through `package-list` manifests, the same
//! file other documentation sets publish.

pub mod content;
pub mod error;
pub mod ident;
pub mod location;
pub mod manifest;
pub mod matcher;
pub mod merge;
pub mod model;
pub mod pages;
pub mod pipeline;
pub mod render;
pub mod transform;
