//! Stable declaration identity: target identities, declaration references and
//! their canonical string form, and filename-segment escaping.
//!
//! The canonical string produced by [`DeclarationRef::to_canonical_string`] is
//! the external cross-reference key (it appears verbatim in package-list
//! lookup tables), so its grammar is a wire contract: six `/`-separated
//! fields, `package/class-path/callable-name/signature/target/extra`.

use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One analyzed compilation unit: a module name plus a target (platform) name.
///
/// Sorts by module first, then target; that order is the deterministic merge
/// order of the model merger.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TargetId {
    pub module: String,
    pub target: String,
}

impl TargetId {
    pub fn new(module: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            target: target.into(),
        }
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.module, self.target)
    }
}

impl FromStr for TargetId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((module, target)) => Ok(Self::new(module, target)),
            None => Err(format!("target id {s:?} is missing the module/target separator")),
        }
    }
}

impl Serialize for TargetId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TargetId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

/// What a reference points at: the declaration itself, or one of its generic
/// or value parameters by index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum RefTarget {
    #[default]
    Declaration,
    GenericParameter(usize),
    CallableParameter(usize),
}

impl fmt::Display for RefTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Declaration => Ok(()),
            Self::GenericParameter(i) => write!(f, "generic={i}"),
            Self::CallableParameter(i) => write!(f, "param={i}"),
        }
    }
}

impl FromStr for RefTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::Declaration);
        }
        let parse_index = |v: &str| {
            v.parse::<usize>()
                .map_err(|_| format!("bad parameter index in target tag {s:?}"))
        };
        if let Some(v) = s.strip_prefix("generic=") {
            return Ok(Self::GenericParameter(parse_index(v)?));
        }
        if let Some(v) = s.strip_prefix("param=") {
            return Ok(Self::CallableParameter(parse_index(v)?));
        }
        Err(format!("unknown target tag {s:?}"))
    }
}

/// Descriptor of a callable declaration: name, receiver type, parameter type
/// signature and whether the declaration is a property.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Callable {
    pub name: String,
    pub receiver: Option<String>,
    pub params: Vec<String>,
    pub is_property: bool,
}

impl Callable {
    pub fn function(name: impl Into<String>, params: Vec<String>) -> Self {
        Self {
            name: name.into(),
            receiver: None,
            params,
            is_property: false,
        }
    }

    pub fn property(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            receiver: None,
            params: Vec::new(),
            is_property: true,
        }
    }

    /// `receiver#param1#param2…`; the leading `#` is kept even without a
    /// receiver so the field is never confused with a bare type name.
    fn signature(&self) -> String {
        let mut out = self.receiver.clone().unwrap_or_default();
        out.push('#');
        out.push_str(&self.params.join("#"));
        out
    }
}

/// Stable address of a documented declaration.
///
/// Two declarations are the same documentable entity iff their refs are equal
/// ignoring [`DeclarationRef::target`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DeclarationRef {
    pub package: Option<String>,
    /// Dotted path of enclosing class-likes, outermost first.
    pub class_path: Option<String>,
    pub callable: Option<Callable>,
    pub target: RefTarget,
    /// Opaque extra flags, e.g. `enum-entry`.
    pub extra: String,
}

impl DeclarationRef {
    pub fn package(name: impl Into<String>) -> Self {
        Self {
            package: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn classlike(package: impl Into<String>, class_path: impl Into<String>) -> Self {
        Self {
            package: Some(package.into()),
            class_path: Some(class_path.into()),
            ..Default::default()
        }
    }

    pub fn with_callable(mut self, callable: Callable) -> Self {
        self.callable = Some(callable);
        self
    }

    pub fn with_extra(mut self, extra: impl Into<String>) -> Self {
        self.extra = extra.into();
        self
    }

    /// The same ref pointing at the declaration itself. Used to normalize
    /// before equality checks that ignore the target tag.
    pub fn without_target(&self) -> Self {
        let mut normalized = self.clone();
        normalized.target = RefTarget::Declaration;
        normalized
    }

    /// Equality ignoring the target tag: "the same documentable entity".
    pub fn same_entity(&self, other: &Self) -> bool {
        self.package == other.package
            && self.class_path == other.class_path
            && self.callable == other.callable
            && self.extra == other.extra
    }

    /// Canonical wire form. Changing this grammar invalidates every cached
    /// external manifest, see the module docs.
    pub fn to_canonical_string(&self) -> String {
        let (name, signature) = match &self.callable {
            Some(c) => {
                let mut name = c.name.clone();
                if c.is_property {
                    name.push('=');
                }
                (name, c.signature())
            }
            None => (String::new(), String::new()),
        };
        format!(
            "{}/{}/{}/{}/{}/{}",
            self.package.as_deref().unwrap_or(""),
            self.class_path.as_deref().unwrap_or(""),
            name,
            signature,
            self.target,
            self.extra,
        )
    }

    /// Path segments of the entity: package, then each class-path element.
    /// Callable refs add their callable name as the final segment.
    pub fn path_segments(&self) -> Vec<String> {
        let mut segments = Vec::new();
        if let Some(pkg) = &self.package {
            segments.push(pkg.clone());
        }
        if let Some(path) = &self.class_path {
            segments.extend(path.split('.').map(str::to_owned));
        }
        if let Some(c) = &self.callable {
            segments.push(c.name.clone());
        }
        segments
    }
}

impl fmt::Display for DeclarationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_canonical_string())
    }
}

impl FromStr for DeclarationRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split('/').collect();
        let [package, class_path, name, signature, target, extra] = fields[..] else {
            return Err(format!("expected 6 fields in declaration ref {s:?}"));
        };
        let callable = if name.is_empty() {
            None
        } else {
            let (name, is_property) = match name.strip_suffix('=') {
                Some(stripped) => (stripped, true),
                None => (name, false),
            };
            let (receiver, params) = match signature.split_once('#') {
                Some((recv, rest)) => (
                    (!recv.is_empty()).then(|| recv.to_owned()),
                    rest.split('#')
                        .filter(|p| !p.is_empty())
                        .map(str::to_owned)
                        .collect(),
                ),
                None => (None, Vec::new()),
            };
            Some(Callable {
                name: name.to_owned(),
                receiver,
                params,
                is_property,
            })
        };
        Ok(Self {
            package: (!package.is_empty()).then(|| package.to_owned()),
            class_path: (!class_path.is_empty()).then(|| class_path.to_owned()),
            callable,
            target: target.parse()?,
            extra: extra.to_owned(),
        })
    }
}

impl Serialize for DeclarationRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_canonical_string())
    }
}

impl<'de> Deserialize<'de> for DeclarationRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

/// Filenames that would clash with generated pages or that case-insensitive
/// filesystems refuse outright.
const RESERVED_FILENAMES: &[&str] = &["index", "con", "aux", "lst", "prn", "nul", "eof", "inp", "out"];

/// Escape an identifier into a filename segment.
///
/// Every originally-uppercase character becomes `-` plus its lowercase form,
/// so `Foo` and `foo` stay distinct on case-insensitive filesystems. `<` and
/// `>` become `-`. Reserved results are wrapped as `--name--` so they can
/// never collide with a generated `index` page.
pub fn to_filename_segment(name: &str) -> String {
    if name.is_empty() {
        return "--root--".to_string();
    }
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            '<' | '>' => out.push('-'),
            c if c.is_uppercase() => {
                out.push('-');
                out.extend(c.to_lowercase());
            }
            c => out.push(c),
        }
    }
    if RESERVED_FILENAMES.contains(&out.as_str()) {
        format!("--{out}--")
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_segment_escapes_case() {
        assert_eq!(to_filename_segment("Foo"), "-foo");
        assert_eq!(to_filename_segment("foo"), "foo");
        assert_eq!(to_filename_segment("FooBar"), "-foo-bar");
    }

    #[test]
    fn filename_segment_escapes_angle_brackets() {
        assert_eq!(to_filename_segment("<init>"), "-init-");
    }

    #[test]
    fn filename_segment_never_yields_index() {
        assert_eq!(to_filename_segment("index"), "--index--");
        // The escaped form "-index" already differs from the reserved name.
        assert_eq!(to_filename_segment("Index"), "-index");
        for reserved in RESERVED_FILENAMES {
            assert_ne!(to_filename_segment(reserved), *reserved);
        }
    }

    #[test]
    fn filename_segment_of_empty_is_root_sentinel() {
        assert_eq!(to_filename_segment(""), "--root--");
    }

    #[test]
    fn canonical_string_for_package_only() {
        let dri = DeclarationRef::package("org.example");
        assert_eq!(dri.to_canonical_string(), "org.example/////");
    }

    #[test]
    fn canonical_string_for_function() {
        let dri = DeclarationRef::classlike("org.example", "Sample")
            .with_callable(Callable::function("genericFun", vec!["kotlin.String".into()]));
        assert_eq!(
            dri.to_canonical_string(),
            "org.example/Sample/genericFun/#kotlin.String//"
        );
    }

    #[test]
    fn canonical_string_marks_properties() {
        let dri =
            DeclarationRef::classlike("p", "Foo").with_callable(Callable::property("size"));
        assert_eq!(dri.to_canonical_string(), "p/Foo/size=/#//");
    }

    fn roundtrip(dri: &DeclarationRef) -> DeclarationRef {
        dri.to_canonical_string().parse().unwrap()
    }

    #[test]
    fn canonical_string_roundtrips() {
        let refs = [
            DeclarationRef::package("p"),
            DeclarationRef::classlike("p", "Foo.Bar"),
            DeclarationRef::classlike("p", "Foo").with_callable(Callable {
                name: "map".into(),
                receiver: Some("p.Foo".into()),
                params: vec!["kotlin.Int".into(), "kotlin.String".into()],
                is_property: false,
            }),
            DeclarationRef::classlike("p", "Color").with_extra("enum-entry"),
            DeclarationRef::classlike("p", "Foo").with_callable(Callable::property("size")),
        ];
        for dri in &refs {
            assert_eq!(&roundtrip(dri), dri);
        }
    }

    #[test]
    fn canonical_string_roundtrips_up_to_target_normalization() {
        let mut dri = DeclarationRef::classlike("p", "Foo")
            .with_callable(Callable::function("bar", vec![]));
        dri.target = RefTarget::GenericParameter(0);
        assert_eq!(roundtrip(&dri), dri);
        dri.target = RefTarget::CallableParameter(2);
        assert_eq!(roundtrip(&dri), dri);
    }

    #[test]
    fn same_entity_ignores_target() {
        let a = DeclarationRef::classlike("p", "Foo");
        let mut b = a.clone();
        b.target = RefTarget::GenericParameter(1);
        assert_ne!(a, b);
        assert!(a.same_entity(&b));
        assert_eq!(a.without_target(), b.without_target());
    }

    #[test]
    fn target_ids_sort_by_module_then_target() {
        let mut ids = vec![
            TargetId::new("m", "native"),
            TargetId::new("a", "jvm"),
            TargetId::new("m", "jvm"),
        ];
        ids.sort();
        assert_eq!(
            ids,
            vec![
                TargetId::new("a", "jvm"),
                TargetId::new("m", "jvm"),
                TargetId::new("m", "native"),
            ]
        );
    }

    #[test]
    fn bad_ref_strings_are_rejected() {
        assert!("not-a-ref".parse::<DeclarationRef>().is_err());
        assert!("p/Foo/bar/#/bogus-tag/".parse::<DeclarationRef>().is_err());
    }
}
