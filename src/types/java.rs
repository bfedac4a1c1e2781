//! Java decoration of namespace entries, consumed by the Java generator.

use super::{BuiltinSpec, Language, TypeEntry, TypeNamespace};
use crate::frontend::ast::{Interface, Parcelable};

pub type JavaTypeNamespace = TypeNamespace<Java>;

pub enum Java {}

/// Java spelling and parcel marshalling tokens for one type.
#[derive(Debug, Clone)]
pub struct JavaDecoration {
    pub java_type: String,
    /// `android.os.Parcel` method that writes a value of this type.
    pub write_method: Option<String>,
    /// `android.os.Parcel` method that reads a value of this type.
    pub read_method: Option<String>,
    /// `CREATOR` expression for user parcelables.
    pub creator: Option<String>,
    /// Expression wrapping a read binder into this interface's proxy.
    pub as_interface: Option<String>,
}

impl JavaDecoration {
    fn simple(java_type: &str, write: &str, read: &str) -> Self {
        Self {
            java_type: java_type.to_string(),
            write_method: Some(write.to_string()),
            read_method: Some(read.to_string()),
            creator: None,
            as_interface: None,
        }
    }
}

impl Language for Java {
    type Decoration = JavaDecoration;

    fn decorate_builtin(spec: &BuiltinSpec) -> JavaDecoration {
        match spec.name {
            "void" => JavaDecoration {
                java_type: "void".to_string(),
                write_method: None,
                read_method: None,
                creator: None,
                as_interface: None,
            },
            // booleans and chars travel as ints on the wire
            "boolean" => JavaDecoration::simple("boolean", "writeInt", "readInt"),
            "char" => JavaDecoration::simple("char", "writeInt", "readInt"),
            "byte" => JavaDecoration::simple("byte", "writeByte", "readByte"),
            "int" => JavaDecoration::simple("int", "writeInt", "readInt"),
            "long" => JavaDecoration::simple("long", "writeLong", "readLong"),
            "float" => JavaDecoration::simple("float", "writeFloat", "readFloat"),
            "double" => JavaDecoration::simple("double", "writeDouble", "readDouble"),
            "String" => JavaDecoration::simple("java.lang.String", "writeString", "readString"),
            "CharSequence" => JavaDecoration::simple(
                "java.lang.CharSequence",
                "writeCharSequence",
                "readCharSequence",
            ),
            "IBinder" => JavaDecoration::simple(
                "android.os.IBinder",
                "writeStrongBinder",
                "readStrongBinder",
            ),
            "List" => JavaDecoration::simple("java.util.List", "writeList", "readArrayList"),
            "Map" => JavaDecoration::simple("java.util.Map", "writeMap", "readHashMap"),
            other => JavaDecoration {
                java_type: other.to_string(),
                write_method: None,
                read_method: None,
                creator: None,
                as_interface: None,
            },
        }
    }

    fn decorate_parcelable(decl: &Parcelable) -> JavaDecoration {
        let qualified = decl.qualified_name();
        JavaDecoration {
            java_type: qualified.clone(),
            write_method: Some("writeToParcel".to_string()),
            read_method: None,
            creator: Some(format!("{qualified}.CREATOR")),
            as_interface: None,
        }
    }

    fn decorate_binder(decl: &Interface) -> JavaDecoration {
        let qualified = decl.qualified_name();
        JavaDecoration {
            java_type: qualified.clone(),
            write_method: Some("writeStrongBinder".to_string()),
            read_method: Some("readStrongBinder".to_string()),
            creator: None,
            as_interface: Some(format!("{qualified}.Stub.asInterface")),
        }
    }

    fn decorate_list(element: Option<&TypeEntry<JavaDecoration>>) -> JavaDecoration {
        let java_type = match element {
            Some(entry) => format!("java.util.List<{}>", boxed(&entry.decoration.java_type)),
            None => "java.util.List".to_string(),
        };
        JavaDecoration {
            java_type,
            write_method: Some("writeList".to_string()),
            read_method: Some("readArrayList".to_string()),
            creator: None,
            as_interface: None,
        }
    }

    fn decorate_map(value: Option<&TypeEntry<JavaDecoration>>) -> JavaDecoration {
        let java_type = match value {
            Some(entry) => format!(
                "java.util.Map<java.lang.String, {}>",
                boxed(&entry.decoration.java_type)
            ),
            None => "java.util.Map".to_string(),
        };
        JavaDecoration {
            java_type,
            write_method: Some("writeMap".to_string()),
            read_method: Some("readHashMap".to_string()),
            creator: None,
            as_interface: None,
        }
    }
}

/// Generic parameters need the boxed spelling of a primitive.
fn boxed(java_type: &str) -> String {
    match java_type {
        "boolean" => "java.lang.Boolean".to_string(),
        "byte" => "java.lang.Byte".to_string(),
        "char" => "java.lang.Character".to_string(),
        "int" => "java.lang.Integer".to_string(),
        "long" => "java.lang.Long".to_string(),
        "float" => "java.lang.Float".to_string(),
        "double" => "java.lang.Double".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn builtins_map_to_expected_spellings() {
        let mut ns = JavaTypeNamespace::new();
        ns.init();
        let id = ns.find("String").expect("String registered");
        let decoration = &ns.entry(id).decoration;
        assert_eq!(decoration.java_type, "java.lang.String");
        assert_eq!(decoration.write_method.as_deref(), Some("writeString"));
        assert_eq!(decoration.read_method.as_deref(), Some("readString"));
    }

    #[test]
    fn parcelables_get_creator_expressions() {
        let mut ns = JavaTypeNamespace::new();
        ns.init();
        let decl = Parcelable {
            name: "Foo".into(),
            package: vec!["com".into(), "x".into()],
            line: 1,
            span: None,
        };
        let id = ns
            .add_parcelable(&decl, Path::new("com/x/Foo.aidl"))
            .expect("registered");
        let decoration = &ns.entry(id).decoration;
        assert_eq!(decoration.java_type, "com.x.Foo");
        assert_eq!(decoration.creator.as_deref(), Some("com.x.Foo.CREATOR"));
    }

    #[test]
    fn typed_lists_box_their_elements() {
        let mut ns = JavaTypeNamespace::new();
        ns.init();
        ns.maybe_add_container("List<int>").expect("List<int>");
        let id = ns.find("List<int>").expect("registered");
        assert_eq!(
            ns.entry(id).decoration.java_type,
            "java.util.List<java.lang.Integer>"
        );
    }
}
