//! Java generator: one source file holding the interface, a server-side
//! `Stub`, and a client-side `Proxy` that marshal through `android.os.Parcel`.

use std::fmt::Write as _;
use std::path::Path;

use crate::frontend::ast::{Argument, Interface, Method, TypeRef};
use crate::io_delegate::IoDelegate;
use crate::types::java::{JavaDecoration, JavaTypeNamespace};
use crate::types::{TypeEntry, TypeKind};

/// Emit Java source for a validated interface. Returns false when the output
/// cannot be written.
pub fn generate(
    output_file: &Path,
    input_file: &Path,
    interface: &Interface,
    types: &JavaTypeNamespace,
    io: &dyn IoDelegate,
) -> bool {
    let contents = Generator { interface, types }.render(input_file);
    super::write_output(output_file, &contents, io)
}

struct Generator<'a> {
    interface: &'a Interface,
    types: &'a JavaTypeNamespace,
}

impl<'a> Generator<'a> {
    fn render(&self, input_file: &Path) -> String {
        let mut out = super::auto_generated_header(input_file);
        let qualified = self.interface.qualified_name();
        if !self.interface.package.is_empty() {
            let _ = writeln!(out, "package {};", self.interface.package_string());
        }
        let _ = writeln!(
            out,
            "public interface {} extends android.os.IInterface\n{{",
            self.interface.name
        );
        self.render_stub(&mut out, &qualified);
        for method in &self.interface.methods {
            let _ = writeln!(out, "{}", self.render_declaration(method));
        }
        out.push_str("}\n");
        out
    }

    fn render_stub(&self, out: &mut String, qualified: &str) {
        let _ = writeln!(
            out,
            "/** Local-side IPC implementation stub class. */\n\
             public static abstract class Stub extends android.os.Binder implements {qualified}\n\
             {{\n\
             private static final java.lang.String DESCRIPTOR = \"{qualified}\";\n\
             /** Construct the stub at attach it to the interface. */\n\
             public Stub()\n\
             {{\n\
             this.attachInterface(this, DESCRIPTOR);\n\
             }}\n\
             /**\n\
              * Cast an IBinder object into an {qualified} interface,\n\
              * generating a proxy if needed.\n\
              */\n\
             public static {qualified} asInterface(android.os.IBinder obj)\n\
             {{\n\
             if ((obj==null)) {{\n\
             return null;\n\
             }}\n\
             android.os.IInterface iin = obj.queryLocalInterface(DESCRIPTOR);\n\
             if (((iin!=null)&&(iin instanceof {qualified}))) {{\n\
             return (({qualified})iin);\n\
             }}\n\
             return new {qualified}.Stub.Proxy(obj);\n\
             }}\n\
             @Override public android.os.IBinder asBinder()\n\
             {{\n\
             return this;\n\
             }}"
        );

        self.render_on_transact(out);
        self.render_proxy(out, qualified);
        for method in &self.interface.methods {
            let _ = writeln!(
                out,
                "static final int TRANSACTION_{} = (android.os.IBinder.FIRST_CALL_TRANSACTION + {});",
                method.name,
                method.assigned_id()
            );
        }
        out.push_str("}\n");
    }

    fn render_on_transact(&self, out: &mut String) {
        out.push_str(
            "@Override public boolean onTransact(int code, android.os.Parcel data, \
             android.os.Parcel reply, int flags) throws android.os.RemoteException\n{\n\
             switch (code)\n{\n\
             case INTERFACE_TRANSACTION:\n{\n\
             reply.writeString(DESCRIPTOR);\nreturn true;\n}\n",
        );
        for method in &self.interface.methods {
            let _ = writeln!(out, "case TRANSACTION_{}:\n{{", method.name);
            out.push_str("data.enforceInterface(DESCRIPTOR);\n");
            for (index, argument) in method.arguments.iter().enumerate() {
                let java_type = self.java_type(&argument.ty);
                let _ = writeln!(out, "{java_type} _arg{index};");
                if argument.direction.is_out() && !self.is_in_first(argument) {
                    // Purely-out values are constructed server side.
                    let _ = writeln!(out, "_arg{index} = {};", self.default_value(&argument.ty));
                } else {
                    let _ = writeln!(
                        out,
                        "_arg{index} = {};",
                        self.read_expr(&argument.ty, "data")
                    );
                }
            }
            let call_args = (0..method.arguments.len())
                .map(|index| format!("_arg{index}"))
                .collect::<Vec<_>>()
                .join(", ");
            if method.return_type.is_void() {
                let _ = writeln!(out, "this.{}({call_args});", method.name);
            } else {
                let _ = writeln!(
                    out,
                    "{} _result = this.{}({call_args});",
                    self.java_type(&method.return_type),
                    method.name
                );
            }
            let oneway = method.oneway || self.interface.oneway;
            if !oneway {
                out.push_str("reply.writeNoException();\n");
                if !method.return_type.is_void() {
                    let _ = writeln!(
                        out,
                        "{}\n",
                        self.write_stmt(&method.return_type, "_result", "reply")
                    );
                }
                for (index, argument) in method.arguments.iter().enumerate() {
                    if argument.direction.is_out() {
                        let _ = writeln!(
                            out,
                            "{}",
                            self.write_stmt(&argument.ty, &format!("_arg{index}"), "reply")
                        );
                    }
                }
            }
            out.push_str("return true;\n}\n");
        }
        out.push_str("}\nreturn super.onTransact(code, data, reply, flags);\n}\n");
    }

    fn render_proxy(&self, out: &mut String, qualified: &str) {
        let _ = writeln!(
            out,
            "private static class Proxy implements {qualified}\n{{\n\
             private android.os.IBinder mRemote;\n\
             Proxy(android.os.IBinder remote)\n{{\nmRemote = remote;\n}}\n\
             @Override public android.os.IBinder asBinder()\n{{\nreturn mRemote;\n}}\n\
             public java.lang.String getInterfaceDescriptor()\n{{\nreturn DESCRIPTOR;\n}}"
        );
        for method in &self.interface.methods {
            self.render_proxy_method(out, method);
        }
        out.push_str("}\n");
    }

    fn render_proxy_method(&self, out: &mut String, method: &Method) {
        let _ = writeln!(out, "{}", self.render_signature(method, true));
        out.push_str("{\nandroid.os.Parcel _data = android.os.Parcel.obtain();\n");
        let oneway = method.oneway || self.interface.oneway;
        if !oneway {
            out.push_str("android.os.Parcel _reply = android.os.Parcel.obtain();\n");
        }
        let returns_value = !method.return_type.is_void();
        if returns_value {
            let _ = writeln!(out, "{} _result;", self.java_type(&method.return_type));
        }
        out.push_str("try {\n_data.writeInterfaceToken(DESCRIPTOR);\n");
        for argument in &method.arguments {
            if !argument.direction.is_out() || self.is_in_first(argument) {
                let _ = writeln!(
                    out,
                    "{}",
                    self.write_stmt(&argument.ty, &argument.name, "_data")
                );
            }
        }
        if oneway {
            let _ = writeln!(
                out,
                "mRemote.transact(Stub.TRANSACTION_{}, _data, null, \
                 android.os.IBinder.FLAG_ONEWAY);",
                method.name
            );
        } else {
            let _ = writeln!(
                out,
                "mRemote.transact(Stub.TRANSACTION_{}, _data, _reply, 0);",
                method.name
            );
            out.push_str("_reply.readException();\n");
            if returns_value {
                let _ = writeln!(
                    out,
                    "_result = {};",
                    self.read_expr(&method.return_type, "_reply")
                );
            }
            for argument in &method.arguments {
                if argument.direction.is_out() {
                    let _ = writeln!(out, "{}", self.read_back_stmt(argument));
                }
            }
        }
        out.push_str("}\nfinally {\n");
        if !oneway {
            out.push_str("_reply.recycle();\n");
        }
        out.push_str("_data.recycle();\n}\n");
        if returns_value {
            out.push_str("return _result;\n");
        }
        out.push_str("}\n");
    }

    fn render_declaration(&self, method: &Method) -> String {
        format!("{};", self.render_signature(method, false))
    }

    fn render_signature(&self, method: &Method, with_override: bool) -> String {
        let parameters = method
            .arguments
            .iter()
            .map(|argument| {
                format!(
                    "{} {}",
                    self.java_type(&argument.ty),
                    argument.name
                )
            })
            .collect::<Vec<_>>()
            .join(", ");
        let prefix = if with_override { "@Override public" } else { "public" };
        format!(
            "{prefix} {} {}({parameters}) throws android.os.RemoteException",
            self.java_type(&method.return_type),
            method.name
        )
    }

    fn entry(&self, ty: &TypeRef) -> Option<&TypeEntry<JavaDecoration>> {
        ty.resolved_entry().map(|id| self.types.entry(id))
    }

    fn java_type(&self, ty: &TypeRef) -> String {
        let base = match self.entry(ty) {
            Some(entry) => entry.decoration.java_type.clone(),
            None => ty.name.clone(),
        };
        if ty.is_array {
            format!("{base}[]")
        } else {
            base
        }
    }

    /// inout arguments carry a caller-provided value in both directions.
    fn is_in_first(&self, argument: &Argument) -> bool {
        matches!(
            argument.direction,
            crate::frontend::ast::Direction::Inout
        )
    }

    fn write_stmt(&self, ty: &TypeRef, value: &str, parcel: &str) -> String {
        let Some(entry) = self.entry(ty) else {
            return format!("{parcel}.writeValue({value});");
        };
        if ty.is_array {
            return format!("{parcel}.writeValue({value});");
        }
        match entry.kind {
            TypeKind::Parcelable => format!(
                "if (({value}!=null)) {{\n{parcel}.writeInt(1);\n{value}.writeToParcel({parcel}, 0);\n}}\nelse {{\n{parcel}.writeInt(0);\n}}"
            ),
            TypeKind::Binder => format!(
                "{parcel}.writeStrongBinder((((({value}!=null))?({value}.asBinder()):(null))));"
            ),
            _ => match entry.qualified_name.as_str() {
                "boolean" => format!("{parcel}.writeInt((({value})?(1):(0)));"),
                "char" => format!("{parcel}.writeInt(((int){value}));"),
                _ => match entry.decoration.write_method.as_deref() {
                    Some(method) => format!("{parcel}.{method}({value});"),
                    None => format!("{parcel}.writeValue({value});"),
                },
            },
        }
    }

    fn read_expr(&self, ty: &TypeRef, parcel: &str) -> String {
        let Some(entry) = self.entry(ty) else {
            return format!("({}){parcel}.readValue(getClass().getClassLoader())", self.java_type(ty));
        };
        if ty.is_array {
            return format!(
                "({}[]){parcel}.readValue(getClass().getClassLoader())",
                entry.decoration.java_type
            );
        }
        match entry.kind {
            TypeKind::Parcelable => {
                let creator = entry
                    .decoration
                    .creator
                    .clone()
                    .unwrap_or_else(|| format!("{}.CREATOR", entry.decoration.java_type));
                format!(
                    "((0!={parcel}.readInt())?({creator}.createFromParcel({parcel})):(null))"
                )
            }
            TypeKind::Binder => {
                let wrap = entry
                    .decoration
                    .as_interface
                    .clone()
                    .unwrap_or_else(|| format!("{}.Stub.asInterface", entry.decoration.java_type));
                format!("{wrap}({parcel}.readStrongBinder())")
            }
            _ => match entry.qualified_name.as_str() {
                "boolean" => format!("(0!={parcel}.readInt())"),
                "char" => format!("((char){parcel}.readInt())"),
                _ => match entry.decoration.read_method.as_deref() {
                    Some("readArrayList") | Some("readHashMap") => format!(
                        "{parcel}.{}(getClass().getClassLoader())",
                        entry.decoration.read_method.as_deref().unwrap_or_default()
                    ),
                    Some(method) => format!("{parcel}.{method}()"),
                    None => format!(
                        "({}){parcel}.readValue(getClass().getClassLoader())",
                        entry.decoration.java_type
                    ),
                },
            },
        }
    }

    fn read_back_stmt(&self, argument: &Argument) -> String {
        match self.entry(&argument.ty).map(|entry| entry.kind) {
            Some(TypeKind::Parcelable) => format!(
                "if ((0!=_reply.readInt())) {{\n{}.readFromParcel(_reply);\n}}",
                argument.name
            ),
            _ => format!(
                "// {} is refreshed from the reply in caller-owned storage.",
                argument.name
            ),
        }
    }

    fn default_value(&self, ty: &TypeRef) -> String {
        match self.entry(ty).map(|entry| entry.kind) {
            Some(TypeKind::Parcelable) => format!("new {}()", self.java_type(ty)),
            Some(TypeKind::Container) => {
                if ty.name.starts_with("Map") {
                    "new java.util.HashMap()".to_string()
                } else {
                    "new java.util.ArrayList()".to_string()
                }
            }
            _ => "null".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{DiagnosticSink, FileCache};
    use crate::frontend::ast::Declaration;
    use crate::frontend::parser::parse_source;
    use crate::io_delegate::FakeIoDelegate;
    use crate::validate;

    fn validated(source: &str) -> (Interface, JavaTypeNamespace) {
        let mut files = FileCache::default();
        let result = parse_source(Path::new("test.aidl"), source, &mut files);
        let Declaration::Interface(mut interface) = result.document.expect("parsed") else {
            panic!("expected interface");
        };
        let mut types = JavaTypeNamespace::new();
        types.init();
        types
            .add_binder(&interface, Path::new("test.aidl"))
            .expect("registered");
        let mut sink = DiagnosticSink::default();
        assert_eq!(
            validate::check_types(Path::new("test.aidl"), &mut interface, &mut types, &mut sink),
            0
        );
        assert_eq!(
            validate::check_and_assign_method_ids(
                Path::new("test.aidl"),
                &mut interface.methods,
                &mut sink
            ),
            0
        );
        (interface, types)
    }

    fn generate_source(source: &str) -> String {
        let (interface, types) = validated(source);
        let io = FakeIoDelegate::default();
        assert!(generate(
            Path::new("out.java"),
            Path::new("test.aidl"),
            &interface,
            &types,
            &io
        ));
        io.written_contents(Path::new("out.java")).expect("written")
    }

    #[test]
    fn emits_interface_stub_and_proxy() {
        let generated =
            generate_source("package com.x;\ninterface IEcho { String echo(String s); }");
        assert!(generated.contains("package com.x;"));
        assert!(generated.contains("public interface IEcho extends android.os.IInterface"));
        assert!(generated.contains("private static final java.lang.String DESCRIPTOR = \"com.x.IEcho\";"));
        assert!(generated.contains("public static abstract class Stub"));
        assert!(generated.contains("private static class Proxy implements com.x.IEcho"));
        assert!(generated.contains(
            "static final int TRANSACTION_echo = (android.os.IBinder.FIRST_CALL_TRANSACTION + 0);"
        ));
        assert!(generated.contains("_data.writeString(s);"));
        assert!(generated.contains("_result = _reply.readString();"));
    }

    #[test]
    fn oneway_methods_use_flag_and_skip_reply() {
        let generated = generate_source("package com.x;\ninterface IPing { oneway void ping(); }");
        assert!(generated.contains("android.os.IBinder.FLAG_ONEWAY"));
        assert!(generated.contains("mRemote.transact(Stub.TRANSACTION_ping, _data, null,"));
    }

    #[test]
    fn booleans_travel_as_ints() {
        let generated =
            generate_source("package com.x;\ninterface IFlag { void set(boolean enabled); }");
        assert!(generated.contains("_data.writeInt(((enabled)?(1):(0)));"));
    }

    #[test]
    fn explicit_ids_number_the_transactions() {
        let generated =
            generate_source("package com.x;\ninterface IIds { void a() = 5; void b() = 9; }");
        assert!(generated.contains("TRANSACTION_a = (android.os.IBinder.FIRST_CALL_TRANSACTION + 5);"));
        assert!(generated.contains("TRANSACTION_b = (android.os.IBinder.FIRST_CALL_TRANSACTION + 9);"));
    }
}
