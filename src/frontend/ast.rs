use std::path::PathBuf;

use crate::diagnostics::Span;
use crate::types::EntryId;

/// Top-level declaration carried by a source document.
#[derive(Debug, Clone)]
pub enum Declaration {
    Parcelable(Parcelable),
    Interface(Interface),
}

impl Declaration {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Declaration::Parcelable(p) => &p.name,
            Declaration::Interface(i) => &i.name,
        }
    }

    #[must_use]
    pub fn package(&self) -> &[String] {
        match self {
            Declaration::Parcelable(p) => &p.package,
            Declaration::Interface(i) => &i.package,
        }
    }

    #[must_use]
    pub fn line(&self) -> usize {
        match self {
            Declaration::Parcelable(p) => p.line,
            Declaration::Interface(i) => i.line,
        }
    }

    #[must_use]
    pub fn qualified_name(&self) -> String {
        qualify(self.package(), self.name())
    }
}

/// Forward declaration of an opaque user type marshalled by hand-written code.
#[derive(Debug, Clone)]
pub struct Parcelable {
    pub name: String,
    pub package: Vec<String>,
    pub line: usize,
    pub span: Option<Span>,
}

impl Parcelable {
    #[must_use]
    pub fn qualified_name(&self) -> String {
        qualify(&self.package, &self.name)
    }
}

/// A remotely callable interface.
#[derive(Debug, Clone)]
pub struct Interface {
    pub name: String,
    pub package: Vec<String>,
    pub line: usize,
    pub span: Option<Span>,
    /// Declared on the interface itself; applies to every method.
    pub oneway: bool,
    pub methods: Vec<Method>,
}

impl Interface {
    #[must_use]
    pub fn qualified_name(&self) -> String {
        qualify(&self.package, &self.name)
    }

    #[must_use]
    pub fn package_string(&self) -> String {
        self.package.join(".")
    }
}

#[derive(Debug, Clone)]
pub struct Method {
    pub name: String,
    pub return_type: TypeRef,
    pub arguments: Vec<Argument>,
    /// Explicit transaction id, when the source assigns one. After id
    /// validation every method carries `Some`.
    pub id: Option<i64>,
    pub oneway: bool,
    pub line: usize,
    pub span: Option<Span>,
}

impl Method {
    /// The assigned transaction id. Only meaningful after id validation.
    #[must_use]
    pub fn assigned_id(&self) -> i64 {
        self.id.unwrap_or(0)
    }
}

/// Reference to a type by (possibly generic) name.
#[derive(Debug, Clone)]
pub struct TypeRef {
    /// Canonical spelling, e.g. `int`, `com.x.Foo`, `List<String>`.
    pub name: String,
    pub is_array: bool,
    pub line: usize,
    pub span: Option<Span>,
    pub resolution: TypeResolution,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeResolution {
    Unresolved,
    Resolved(EntryId),
}

impl TypeRef {
    #[must_use]
    pub fn is_void(&self) -> bool {
        self.name == "void" && !self.is_array
    }

    #[must_use]
    pub fn resolved_entry(&self) -> Option<EntryId> {
        match self.resolution {
            TypeResolution::Resolved(id) => Some(id),
            TypeResolution::Unresolved => None,
        }
    }
}

/// Marshalling direction of an argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
    Inout,
}

impl Direction {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
            Direction::Inout => "inout",
        }
    }

    /// Whether data flows back to the caller.
    #[must_use]
    pub fn is_out(self) -> bool {
        matches!(self, Direction::Out | Direction::Inout)
    }
}

#[derive(Debug, Clone)]
pub struct Argument {
    pub name: String,
    pub ty: TypeRef,
    pub direction: Direction,
    pub line: usize,
    pub span: Option<Span>,
}

/// An `import` clause, recorded in source order.
#[derive(Debug, Clone)]
pub struct Import {
    /// Fully qualified class the clause requests.
    pub needed_class: String,
    /// File the clause was written in.
    pub file_from: PathBuf,
    pub line: usize,
    pub span: Option<Span>,
    /// File that satisfies the import, filled in by the driver.
    pub resolved_path: Option<PathBuf>,
}

fn qualify(package: &[String], name: &str) -> String {
    if package.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", package.join("."), name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualified_names_join_package_and_name() {
        let parcelable = Parcelable {
            name: "Foo".into(),
            package: vec!["com".into(), "x".into()],
            line: 1,
            span: None,
        };
        assert_eq!(parcelable.qualified_name(), "com.x.Foo");

        let bare = Parcelable {
            name: "Foo".into(),
            package: Vec::new(),
            line: 1,
            span: None,
        };
        assert_eq!(bare.qualified_name(), "Foo");
    }

    #[test]
    fn void_recognition_excludes_arrays() {
        let void_ref = TypeRef {
            name: "void".into(),
            is_array: false,
            line: 1,
            span: None,
            resolution: TypeResolution::Unresolved,
        };
        assert!(void_ref.is_void());

        let array_ref = TypeRef {
            is_array: true,
            ..void_ref.clone()
        };
        assert!(!array_ref.is_void());
    }

    #[test]
    fn out_directions_flow_back() {
        assert!(!Direction::In.is_out());
        assert!(Direction::Out.is_out());
        assert!(Direction::Inout.is_out());
    }
}
