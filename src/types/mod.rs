//! The per-compilation type namespace.
//!
//! The registry itself is language-neutral: every entry carries a qualified
//! name, a kind, and a capability mask, and the validator is written against
//! those alone. Each backend supplies a [`Language`] implementation that
//! decorates entries with its own spellings and marshalling tokens.

pub mod cpp;
pub mod java;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::diagnostics::Diagnostic;
use crate::frontend::ast::{Argument, Interface, Parcelable, TypeRef, TypeResolution};

/// Stable handle to a namespace entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EntryId(pub usize);

/// What an entry may be used for. The validator observes only this mask.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capabilities {
    pub can_be_array: bool,
    pub can_be_out_parameter: bool,
    pub can_write_to_parcel: bool,
}

impl Capabilities {
    pub const NONE: Self = Self {
        can_be_array: false,
        can_be_out_parameter: false,
        can_write_to_parcel: false,
    };

    pub const PRIMITIVE: Self = Self {
        can_be_array: true,
        can_be_out_parameter: false,
        can_write_to_parcel: true,
    };

    pub const PARCELABLE: Self = Self {
        can_be_array: true,
        can_be_out_parameter: true,
        can_write_to_parcel: true,
    };

    pub const BINDER: Self = Self {
        can_be_array: false,
        can_be_out_parameter: false,
        can_write_to_parcel: true,
    };

    pub const CONTAINER: Self = Self {
        can_be_array: false,
        can_be_out_parameter: true,
        can_write_to_parcel: true,
    };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeKind {
    Primitive,
    BuiltinClass,
    Parcelable,
    Binder,
    Container,
}

/// Static description of a built-in type.
pub struct BuiltinSpec {
    pub name: &'static str,
    pub kind: TypeKind,
    pub caps: Capabilities,
}

/// The built-in type set registered by `init`.
pub const BUILTINS: &[BuiltinSpec] = &[
    BuiltinSpec {
        name: "void",
        kind: TypeKind::Primitive,
        caps: Capabilities::NONE,
    },
    BuiltinSpec {
        name: "boolean",
        kind: TypeKind::Primitive,
        caps: Capabilities::PRIMITIVE,
    },
    BuiltinSpec {
        name: "byte",
        kind: TypeKind::Primitive,
        caps: Capabilities::PRIMITIVE,
    },
    BuiltinSpec {
        name: "char",
        kind: TypeKind::Primitive,
        caps: Capabilities::PRIMITIVE,
    },
    BuiltinSpec {
        name: "int",
        kind: TypeKind::Primitive,
        caps: Capabilities::PRIMITIVE,
    },
    BuiltinSpec {
        name: "long",
        kind: TypeKind::Primitive,
        caps: Capabilities::PRIMITIVE,
    },
    BuiltinSpec {
        name: "float",
        kind: TypeKind::Primitive,
        caps: Capabilities::PRIMITIVE,
    },
    BuiltinSpec {
        name: "double",
        kind: TypeKind::Primitive,
        caps: Capabilities::PRIMITIVE,
    },
    BuiltinSpec {
        name: "String",
        kind: TypeKind::BuiltinClass,
        caps: Capabilities::PRIMITIVE,
    },
    BuiltinSpec {
        name: "CharSequence",
        kind: TypeKind::BuiltinClass,
        caps: Capabilities {
            can_be_array: false,
            can_be_out_parameter: false,
            can_write_to_parcel: true,
        },
    },
    BuiltinSpec {
        name: "IBinder",
        kind: TypeKind::BuiltinClass,
        caps: Capabilities::BINDER,
    },
    BuiltinSpec {
        name: "List",
        kind: TypeKind::Container,
        caps: Capabilities::CONTAINER,
    },
    BuiltinSpec {
        name: "Map",
        kind: TypeKind::Container,
        caps: Capabilities::CONTAINER,
    },
];

/// One registered type.
#[derive(Debug)]
pub struct TypeEntry<D> {
    pub qualified_name: String,
    /// Trailing name component, used for unqualified lookup.
    pub simple_name: String,
    pub kind: TypeKind,
    pub caps: Capabilities,
    pub decoration: D,
    pub declared_in: Option<PathBuf>,
    pub line: Option<usize>,
}

/// Backend-specific decoration of namespace entries.
pub trait Language {
    type Decoration;

    fn decorate_builtin(spec: &BuiltinSpec) -> Self::Decoration;
    fn decorate_parcelable(decl: &Parcelable) -> Self::Decoration;
    fn decorate_binder(decl: &Interface) -> Self::Decoration;
    fn decorate_list(element: Option<&TypeEntry<Self::Decoration>>) -> Self::Decoration;
    fn decorate_map(value: Option<&TypeEntry<Self::Decoration>>) -> Self::Decoration;
}

/// Append-only registry of known types for one compilation.
pub struct TypeNamespace<L: Language> {
    entries: Vec<TypeEntry<L::Decoration>>,
    by_name: HashMap<String, EntryId>,
    initialized: bool,
}

impl<L: Language> Default for TypeNamespace<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: Language> TypeNamespace<L> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            by_name: HashMap::new(),
            initialized: false,
        }
    }

    /// Register the built-in type set. Idempotent.
    pub fn init(&mut self) {
        if self.initialized {
            return;
        }
        self.initialized = true;
        for spec in BUILTINS {
            let entry = TypeEntry {
                qualified_name: spec.name.to_string(),
                simple_name: spec.name.to_string(),
                kind: spec.kind,
                caps: spec.caps,
                decoration: L::decorate_builtin(spec),
                declared_in: None,
                line: None,
            };
            // Built-in names never collide with each other.
            let _ = self.insert(entry);
        }
    }

    #[must_use]
    pub fn entry(&self, id: EntryId) -> &TypeEntry<L::Decoration> {
        &self.entries[id.0]
    }

    /// Look a name up. Unqualified names match only when exactly one entry
    /// carries that simple name, so lookup stays deterministic regardless of
    /// registration order.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<EntryId> {
        let name = name.trim();
        if let Some(id) = self.by_name.get(name) {
            return Some(*id);
        }
        if name.contains('.') {
            return None;
        }
        let mut matches = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.simple_name == name && entry.qualified_name != name);
        let first = matches.next();
        match (first, matches.next()) {
            (Some((index, _)), None) => Some(EntryId(index)),
            _ => None,
        }
    }

    #[must_use]
    pub fn has_type(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Register a parcelable forward declaration.
    ///
    /// # Errors
    /// Fails when the qualified name is already taken.
    pub fn add_parcelable(
        &mut self,
        decl: &Parcelable,
        file: &Path,
    ) -> Result<EntryId, Diagnostic> {
        let entry = TypeEntry {
            qualified_name: decl.qualified_name(),
            simple_name: decl.name.clone(),
            kind: TypeKind::Parcelable,
            caps: Capabilities::PARCELABLE,
            decoration: L::decorate_parcelable(decl),
            declared_in: Some(file.to_path_buf()),
            line: Some(decl.line),
        };
        self.insert(entry)
    }

    /// Register an interface as a binder type.
    ///
    /// # Errors
    /// Fails when the qualified name is already taken.
    pub fn add_binder(&mut self, decl: &Interface, file: &Path) -> Result<EntryId, Diagnostic> {
        let entry = TypeEntry {
            qualified_name: decl.qualified_name(),
            simple_name: decl.name.clone(),
            kind: TypeKind::Binder,
            caps: Capabilities::BINDER,
            decoration: L::decorate_binder(decl),
            declared_in: Some(file.to_path_buf()),
            line: Some(decl.line),
        };
        self.insert(entry)
    }

    /// Synthesize a generic container instantiation (`List<T>`, `Map<K,V>`)
    /// when `type_name` names one that is not yet registered. Names without
    /// type parameters are left for ordinary lookup.
    ///
    /// # Errors
    /// Fails when the container shape is unsupported or a parameter does not
    /// resolve.
    pub fn maybe_add_container(&mut self, type_name: &str) -> Result<(), Diagnostic> {
        let Some((base, parameters)) = split_generic(type_name) else {
            return Ok(());
        };
        if self.by_name.contains_key(type_name) {
            return Ok(());
        }
        let decoration = match base.as_str() {
            "List" => {
                if parameters.len() != 1 {
                    return Err(Diagnostic::error(
                        format!("List takes exactly one type parameter: {type_name}"),
                        None,
                    ));
                }
                let element = self.find(&parameters[0]).ok_or_else(|| {
                    Diagnostic::error(
                        format!("List of unknown type {}", parameters[0]),
                        None,
                    )
                })?;
                L::decorate_list(Some(self.entry(element)))
            }
            "Map" => {
                if parameters.len() != 2 {
                    return Err(Diagnostic::error(
                        format!("Map takes exactly two type parameters: {type_name}"),
                        None,
                    ));
                }
                if parameters[0] != "String" {
                    return Err(Diagnostic::error(
                        format!("Map key type must be String: {type_name}"),
                        None,
                    ));
                }
                let value = self.find(&parameters[1]).ok_or_else(|| {
                    Diagnostic::error(
                        format!("Map of unknown value type {}", parameters[1]),
                        None,
                    )
                })?;
                L::decorate_map(Some(self.entry(value)))
            }
            _ => {
                return Err(Diagnostic::error(
                    format!("unsupported generic type {type_name}"),
                    None,
                ));
            }
        };
        let entry = TypeEntry {
            qualified_name: type_name.to_string(),
            // Containers are only ever addressed by their full spelling.
            simple_name: type_name.to_string(),
            kind: TypeKind::Container,
            caps: Capabilities::CONTAINER,
            decoration,
            declared_in: None,
            line: None,
        };
        self.insert(entry).map(|_| ())
    }

    /// Enforce the identifier rule on every dotted component. The empty
    /// package is allowed.
    #[must_use]
    pub fn is_valid_package(&self, package: &str) -> bool {
        if package.is_empty() {
            return true;
        }
        package.split('.').all(is_valid_identifier)
    }

    /// Check a return type and record its resolution.
    ///
    /// # Errors
    /// Reports unknown, unmarshallable, or wrongly arrayed return types.
    pub fn is_valid_return_type(
        &self,
        ty: &mut TypeRef,
        _file: &Path,
    ) -> Result<(), Diagnostic> {
        let Some(id) = self.find(&ty.name) else {
            return Err(Diagnostic::error(
                format!("unknown return type {}", ty.name),
                ty.span,
            ));
        };
        let entry = self.entry(id);
        if !ty.is_void() && !entry.caps.can_write_to_parcel {
            return Err(Diagnostic::error(
                format!("return type {} cannot be marshalled", ty.name),
                ty.span,
            ));
        }
        if ty.is_array && !entry.caps.can_be_array {
            return Err(Diagnostic::error(
                format!("return type {} cannot be an array", ty.name),
                ty.span,
            ));
        }
        ty.resolution = TypeResolution::Resolved(id);
        Ok(())
    }

    /// Check an argument (1-indexed) and record its type resolution.
    ///
    /// # Errors
    /// Reports unknown types, unmarshallable types, invalid out parameters,
    /// and invalid arrays.
    pub fn is_valid_arg(
        &self,
        arg: &mut Argument,
        index: usize,
        _file: &Path,
    ) -> Result<(), Diagnostic> {
        let prefix = format!("parameter {} ({})", arg.name, index);
        let Some(id) = self.find(&arg.ty.name) else {
            return Err(Diagnostic::error(
                format!("{prefix}: unknown type {}", arg.ty.name),
                arg.ty.span,
            ));
        };
        let entry = self.entry(id);
        if !entry.caps.can_write_to_parcel {
            return Err(Diagnostic::error(
                format!("{prefix}: {} cannot be marshalled", arg.ty.name),
                arg.ty.span,
            ));
        }
        if arg.direction.is_out() && !entry.caps.can_be_out_parameter {
            return Err(Diagnostic::error(
                format!(
                    "{prefix}: {} cannot be an {} parameter",
                    arg.ty.name,
                    arg.direction.as_str()
                ),
                arg.ty.span,
            ));
        }
        if arg.ty.is_array && !entry.caps.can_be_array {
            return Err(Diagnostic::error(
                format!("{prefix}: {} cannot be an array", arg.ty.name),
                arg.ty.span,
            ));
        }
        arg.ty.resolution = TypeResolution::Resolved(id);
        Ok(())
    }

    fn insert(&mut self, entry: TypeEntry<L::Decoration>) -> Result<EntryId, Diagnostic> {
        if let Some(existing) = self.by_name.get(&entry.qualified_name) {
            let previous = self.entry(*existing);
            let mut diagnostic = Diagnostic::error(
                format!("attempt to redefine type {}", entry.qualified_name),
                None,
            );
            if let Some(path) = previous.declared_in.as_ref() {
                match previous.line {
                    Some(line) => {
                        diagnostic
                            .add_note(format!("previously declared in {}:{line}", path.display()));
                    }
                    None => {
                        diagnostic
                            .add_note(format!("previously declared in {}", path.display()));
                    }
                }
            }
            return Err(diagnostic);
        }
        let id = EntryId(self.entries.len());
        self.by_name.insert(entry.qualified_name.clone(), id);
        self.entries.push(entry);
        Ok(id)
    }
}

fn is_valid_identifier(component: &str) -> bool {
    let mut chars = component.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

/// Split `Base<A,B>` into its base name and top-level parameters. Returns
/// `None` for names without type parameters.
fn split_generic(name: &str) -> Option<(String, Vec<String>)> {
    let open = name.find('<')?;
    if !name.ends_with('>') {
        return None;
    }
    let base = name[..open].to_string();
    let inner = &name[open + 1..name.len() - 1];
    let mut parameters = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (idx, ch) in inner.char_indices() {
        match ch {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parameters.push(inner[start..idx].trim().to_string());
                start = idx + 1;
            }
            _ => {}
        }
    }
    parameters.push(inner[start..].trim().to_string());
    Some((base, parameters))
}
