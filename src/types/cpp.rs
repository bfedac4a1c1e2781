//! C++ decoration of namespace entries, consumed by the C++ generator.

use super::{BuiltinSpec, Language, TypeEntry, TypeNamespace};
use crate::frontend::ast::{Interface, Parcelable};

pub type CppTypeNamespace = TypeNamespace<Cpp>;

pub enum Cpp {}

/// C++ spelling, required header, and parcel methods for one type.
#[derive(Debug, Clone)]
pub struct CppDecoration {
    pub cpp_type: String,
    /// Header that must be included to use this type.
    pub header: Option<String>,
    pub read_method: Option<String>,
    pub write_method: Option<String>,
    pub read_array_method: Option<String>,
    pub write_array_method: Option<String>,
}

impl CppDecoration {
    fn primitive(cpp_type: &str, read: &str, write: &str, header: Option<&str>) -> Self {
        Self {
            cpp_type: cpp_type.to_string(),
            header: header.map(str::to_string),
            read_method: Some(read.to_string()),
            write_method: Some(write.to_string()),
            read_array_method: Some(format!("{read}Vector")),
            write_array_method: Some(format!("{write}Vector")),
        }
    }
}

impl Language for Cpp {
    type Decoration = CppDecoration;

    fn decorate_builtin(spec: &BuiltinSpec) -> CppDecoration {
        match spec.name {
            "void" => CppDecoration {
                cpp_type: "void".to_string(),
                header: None,
                read_method: None,
                write_method: None,
                read_array_method: None,
                write_array_method: None,
            },
            "boolean" => CppDecoration::primitive("bool", "readBool", "writeBool", None),
            "byte" => CppDecoration::primitive("int8_t", "readByte", "writeByte", Some("cstdint")),
            "char" => {
                CppDecoration::primitive("char16_t", "readChar", "writeChar", Some("cstdint"))
            }
            "int" => {
                CppDecoration::primitive("int32_t", "readInt32", "writeInt32", Some("cstdint"))
            }
            "long" => {
                CppDecoration::primitive("int64_t", "readInt64", "writeInt64", Some("cstdint"))
            }
            "float" => CppDecoration::primitive("float", "readFloat", "writeFloat", None),
            "double" => CppDecoration::primitive("double", "readDouble", "writeDouble", None),
            "String" | "CharSequence" => CppDecoration::primitive(
                "android::String16",
                "readString16",
                "writeString16",
                Some("utils/String16.h"),
            ),
            "IBinder" => CppDecoration {
                cpp_type: "android::sp<android::IBinder>".to_string(),
                header: Some("binder/IBinder.h".to_string()),
                read_method: Some("readStrongBinder".to_string()),
                write_method: Some("writeStrongBinder".to_string()),
                read_array_method: None,
                write_array_method: None,
            },
            "List" => CppDecoration {
                cpp_type: "std::vector<android::String16>".to_string(),
                header: Some("vector".to_string()),
                read_method: Some("readString16Vector".to_string()),
                write_method: Some("writeString16Vector".to_string()),
                read_array_method: None,
                write_array_method: None,
            },
            "Map" => CppDecoration {
                cpp_type: "android::binder::Map".to_string(),
                header: Some("binder/Map.h".to_string()),
                read_method: Some("readMap".to_string()),
                write_method: Some("writeMap".to_string()),
                read_array_method: None,
                write_array_method: None,
            },
            other => CppDecoration {
                cpp_type: other.to_string(),
                header: None,
                read_method: None,
                write_method: None,
                read_array_method: None,
                write_array_method: None,
            },
        }
    }

    fn decorate_parcelable(decl: &Parcelable) -> CppDecoration {
        CppDecoration {
            cpp_type: scoped_name(&decl.package, &decl.name),
            header: Some(header_for(&decl.package, &decl.name)),
            read_method: Some("readParcelable".to_string()),
            write_method: Some("writeParcelable".to_string()),
            read_array_method: Some("readParcelableVector".to_string()),
            write_array_method: Some("writeParcelableVector".to_string()),
        }
    }

    fn decorate_binder(decl: &Interface) -> CppDecoration {
        CppDecoration {
            cpp_type: format!("android::sp<{}>", scoped_name(&decl.package, &decl.name)),
            header: Some(header_for(&decl.package, &decl.name)),
            read_method: Some("readStrongBinder".to_string()),
            write_method: Some("writeStrongBinder".to_string()),
            read_array_method: None,
            write_array_method: None,
        }
    }

    fn decorate_list(element: Option<&TypeEntry<CppDecoration>>) -> CppDecoration {
        match element {
            Some(entry) => CppDecoration {
                cpp_type: format!("std::vector<{}>", entry.decoration.cpp_type),
                header: Some("vector".to_string()),
                read_method: entry.decoration.read_array_method.clone(),
                write_method: entry.decoration.write_array_method.clone(),
                read_array_method: None,
                write_array_method: None,
            },
            None => CppDecoration {
                cpp_type: "std::vector<android::String16>".to_string(),
                header: Some("vector".to_string()),
                read_method: Some("readString16Vector".to_string()),
                write_method: Some("writeString16Vector".to_string()),
                read_array_method: None,
                write_array_method: None,
            },
        }
    }

    fn decorate_map(_value: Option<&TypeEntry<CppDecoration>>) -> CppDecoration {
        CppDecoration {
            cpp_type: "android::binder::Map".to_string(),
            header: Some("binder/Map.h".to_string()),
            read_method: Some("readMap".to_string()),
            write_method: Some("writeMap".to_string()),
            read_array_method: None,
            write_array_method: None,
        }
    }
}

fn scoped_name(package: &[String], name: &str) -> String {
    let mut scoped = String::from("::");
    for component in package {
        scoped.push_str(component);
        scoped.push_str("::");
    }
    scoped.push_str(name);
    scoped
}

fn header_for(package: &[String], name: &str) -> String {
    let mut parts: Vec<&str> = package.iter().map(String::as_str).collect();
    parts.push(name);
    format!("{}.h", parts.join("/"))
}
