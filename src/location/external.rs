//! External link resolution against already-built documentation sets.
//!
//! A package-list manifest declares which packages a foreign set documents;
//! the format tag picks a variant with its own lookup-key and path
//! construction rules. Resolution results are cached per
//! (manifest, ref) pair: the same ref is commonly referenced many times and
//! the computation is pure, so insert-if-absent is the only locking needed.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::ident::{to_filename_segment, DeclarationRef};
use crate::manifest::{ManifestFormat, PackageList};

/// Resolves refs into one foreign documentation set.
pub struct ExternalLocationProvider {
    root_url: String,
    list: PackageList,
    cache: Mutex<HashMap<DeclarationRef, Option<String>>>,
}

impl ExternalLocationProvider {
    /// Factory: one provider per manifest; the manifest's format tag selects
    /// the lookup-key variant.
    pub fn new(root_url: impl Into<String>, list: PackageList) -> Self {
        let mut root_url = root_url.into();
        if !root_url.ends_with('/') {
            root_url.push('/');
        }
        Self {
            root_url,
            list,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve to an absolute URL, or `None` when the manifest does not
    /// cover the ref's package. Never an error: an unresolved external
    /// reference is reported by the caller, not thrown.
    pub fn resolve(&self, dri: &DeclarationRef) -> Option<String> {
        let normalized = dri.without_target();
        if let Some(cached) = self.cache.lock().expect("cache lock").get(&normalized) {
            return cached.clone();
        }
        let computed = self.compute(&normalized);
        // A concurrent miss may have raced us here; the computation is pure,
        // so whichever insert wins holds the same value.
        self.cache
            .lock()
            .expect("cache lock")
            .entry(normalized)
            .or_insert_with(|| computed.clone());
        computed
    }

    fn compute(&self, dri: &DeclarationRef) -> Option<String> {
        // Direct lookup first: it covers variants whose key format predates
        // the canonical one, and inlined declarations with anchor paths.
        if let Some(path) = self.list.locations.get(&self.lookup_key(dri)) {
            return Some(format!("{}{path}", self.root_url));
        }

        let package = dri.package.as_deref()?;
        if !self.list.packages.contains(package) {
            return None;
        }

        let mut url = self.root_url.clone();
        if let Some(module) = &self.list.module {
            url.push_str(module);
            url.push('/');
        }
        match self.list.format {
            ManifestFormat::HtmlV1 => self.push_escaped_path(&mut url, dri, package),
            ManifestFormat::Javadoc => push_javadoc_path(&mut url, dri, package),
        }
        Some(url)
    }

    /// Current layout: one directory per case-escaped segment, callables as
    /// files of their own.
    fn push_escaped_path(&self, url: &mut String, dri: &DeclarationRef, package: &str) {
        url.push_str(&to_filename_segment(package));
        url.push('/');
        if let Some(class_path) = &dri.class_path {
            for segment in class_path.split('.') {
                url.push_str(&to_filename_segment(segment));
                url.push('/');
            }
        }
        match &dri.callable {
            Some(callable) => url.push_str(&to_filename_segment(&callable.name)),
            None => url.push_str("index"),
        }
        url.push('.');
        url.push_str(&self.list.link_extension);
    }

    fn lookup_key(&self, dri: &DeclarationRef) -> String {
        match self.list.format {
            ManifestFormat::HtmlV1 => dri.to_canonical_string(),
            ManifestFormat::Javadoc => format!(
                "{}.{}",
                dri.package.as_deref().unwrap_or(""),
                dri.class_path.as_deref().unwrap_or("")
            ),
        }
    }
}

/// Legacy layout: package dots become directories, the class path stays one
/// dotted `.html` file (no case escaping), members are anchors on it.
fn push_javadoc_path(url: &mut String, dri: &DeclarationRef, package: &str) {
    for segment in package.split('.') {
        url.push_str(segment);
        url.push('/');
    }
    match &dri.class_path {
        Some(class_path) => url.push_str(class_path),
        None => url.push_str("package-summary"),
    }
    url.push_str(".html");
    if let Some(callable) = &dri.callable {
        url.push('#');
        url.push_str(&callable.name);
    }
}
