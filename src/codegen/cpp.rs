//! C++ generator: one translation unit holding the `Bp` client proxy and the
//! `Bn` server stub for a validated interface.

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::path::Path;

use crate::frontend::ast::{Interface, Method, TypeRef};
use crate::io_delegate::IoDelegate;
use crate::types::cpp::{CppDecoration, CppTypeNamespace};
use crate::types::TypeEntry;

/// Emit C++ source for a validated interface. Returns false when the output
/// cannot be written.
pub fn generate(
    output_file: &Path,
    input_file: &Path,
    interface: &Interface,
    types: &CppTypeNamespace,
    io: &dyn IoDelegate,
) -> bool {
    let contents = Generator { interface, types }.render(input_file);
    super::write_output(output_file, &contents, io)
}

struct Generator<'a> {
    interface: &'a Interface,
    types: &'a CppTypeNamespace,
}

impl<'a> Generator<'a> {
    fn render(&self, input_file: &Path) -> String {
        let mut out = super::auto_generated_header(input_file);
        for header in self.collect_headers() {
            let _ = writeln!(out, "#include <{header}>");
        }
        let _ = writeln!(out, "#include <binder/Parcel.h>");
        out.push('\n');

        for component in &self.interface.package {
            let _ = writeln!(out, "namespace {component} {{");
        }
        out.push('\n');
        self.render_proxy(&mut out);
        self.render_stub(&mut out);
        for component in self.interface.package.iter().rev() {
            let _ = writeln!(out, "}}  // namespace {component}");
        }
        out
    }

    fn collect_headers(&self) -> BTreeSet<String> {
        let mut headers = BTreeSet::new();
        for method in &self.interface.methods {
            if let Some(entry) = self.entry(&method.return_type) {
                if let Some(header) = entry.decoration.header.as_ref() {
                    headers.insert(header.clone());
                }
            }
            for argument in &method.arguments {
                if let Some(entry) = self.entry(&argument.ty) {
                    if let Some(header) = entry.decoration.header.as_ref() {
                        headers.insert(header.clone());
                    }
                }
            }
        }
        headers
    }

    fn render_proxy(&self, out: &mut String) {
        let name = &self.interface.name;
        let _ = writeln!(
            out,
            "class Bp{name} : public android::BpInterface<{name}> {{\n public:\n  \
             explicit Bp{name}(const android::sp<android::IBinder>& impl)\n      \
             : BpInterface<{name}>(impl) {{}}\n"
        );
        for method in &self.interface.methods {
            let _ = writeln!(out, "  {};", self.render_signature(method, None));
        }
        out.push_str("};\n\n");

        for method in &self.interface.methods {
            let _ = writeln!(
                out,
                "{} {{",
                self.render_signature(method, Some(&format!("Bp{name}")))
            );
            out.push_str("  android::Parcel _data;\n  android::Parcel _reply;\n  android::status_t _status;\n");
            out.push_str("  _data.writeInterfaceToken(getInterfaceDescriptor());\n");
            for argument in &method.arguments {
                if !argument.direction.is_out()
                    || argument.direction == crate::frontend::ast::Direction::Inout
                {
                    let _ = writeln!(out, "  {}", self.write_stmt(&argument.ty, &argument.name));
                }
            }
            let oneway = method.oneway || self.interface.oneway;
            if oneway {
                let _ = writeln!(
                    out,
                    "  _status = remote()->transact({}, _data, &_reply, android::IBinder::FLAG_ONEWAY);",
                    transaction_code(method)
                );
            } else {
                let _ = writeln!(
                    out,
                    "  _status = remote()->transact({}, _data, &_reply);",
                    transaction_code(method)
                );
                out.push_str("  if (_status != android::OK) {\n    return _status;\n  }\n");
                if !method.return_type.is_void() {
                    let _ = writeln!(out, "  {}", self.read_stmt(&method.return_type, "_aidl_return"));
                }
                for argument in &method.arguments {
                    if argument.direction.is_out() {
                        let _ = writeln!(out, "  {}", self.read_stmt(&argument.ty, &argument.name));
                    }
                }
            }
            out.push_str("  return _status;\n}\n\n");
        }
    }

    fn render_stub(&self, out: &mut String) {
        let name = &self.interface.name;
        let _ = writeln!(
            out,
            "android::status_t Bn{name}::onTransact(uint32_t code, const android::Parcel& data,\n    \
             android::Parcel* reply, uint32_t flags) {{\n  switch (code) {{"
        );
        for method in &self.interface.methods {
            let _ = writeln!(out, "    case {}: {{", transaction_code(method));
            out.push_str("      if (!data.checkInterface(this)) {\n        return android::BAD_TYPE;\n      }\n");
            for (index, argument) in method.arguments.iter().enumerate() {
                let cpp_type = self.cpp_type(&argument.ty);
                let _ = writeln!(out, "      {cpp_type} _arg{index};");
                if !argument.direction.is_out()
                    || argument.direction == crate::frontend::ast::Direction::Inout
                {
                    let _ = writeln!(
                        out,
                        "      {}",
                        self.read_stmt_into(&argument.ty, &format!("_arg{index}"), "data")
                    );
                }
            }
            let mut call_args: Vec<String> = Vec::new();
            for (index, argument) in method.arguments.iter().enumerate() {
                if argument.direction.is_out() {
                    call_args.push(format!("&_arg{index}"));
                } else {
                    call_args.push(format!("_arg{index}"));
                }
            }
            if !method.return_type.is_void() {
                let _ = writeln!(out, "      {} _return_value;", self.cpp_type(&method.return_type));
                call_args.push("&_return_value".to_string());
            }
            let _ = writeln!(out, "      {}({});", method.name, call_args.join(", "));
            let oneway = method.oneway || self.interface.oneway;
            if !oneway {
                if !method.return_type.is_void() {
                    let _ = writeln!(
                        out,
                        "      {}",
                        self.write_stmt_to(&method.return_type, "_return_value", "(*reply)")
                    );
                }
                for (index, argument) in method.arguments.iter().enumerate() {
                    if argument.direction.is_out() {
                        let _ = writeln!(
                            out,
                            "      {}",
                            self.write_stmt_to(&argument.ty, &format!("_arg{index}"), "(*reply)")
                        );
                    }
                }
            }
            out.push_str("      return android::OK;\n    }\n");
        }
        out.push_str(
            "    default: {\n      return android::BBinder::onTransact(code, data, reply, flags);\n    }\n  }\n}\n",
        );
    }

    fn render_signature(&self, method: &Method, scope: Option<&str>) -> String {
        let mut parameters: Vec<String> = method
            .arguments
            .iter()
            .map(|argument| {
                let cpp_type = self.cpp_type(&argument.ty);
                if argument.direction.is_out() {
                    format!("{cpp_type}* {}", argument.name)
                } else {
                    format!("const {cpp_type}& {}", argument.name)
                }
            })
            .collect();
        if !method.return_type.is_void() {
            parameters.push(format!(
                "{}* _aidl_return",
                self.cpp_type(&method.return_type)
            ));
        }
        let qualifier = match scope {
            Some(scope) => format!("{scope}::"),
            None => String::new(),
        };
        format!(
            "android::status_t {qualifier}{}({})",
            method.name,
            parameters.join(", ")
        )
    }

    fn entry(&self, ty: &TypeRef) -> Option<&TypeEntry<CppDecoration>> {
        ty.resolved_entry().map(|id| self.types.entry(id))
    }

    fn cpp_type(&self, ty: &TypeRef) -> String {
        let base = match self.entry(ty) {
            Some(entry) => entry.decoration.cpp_type.clone(),
            None => ty.name.clone(),
        };
        if ty.is_array {
            format!("std::vector<{base}>")
        } else {
            base
        }
    }

    fn write_stmt(&self, ty: &TypeRef, value: &str) -> String {
        self.write_stmt_to(ty, value, "_data")
    }

    fn write_stmt_to(&self, ty: &TypeRef, value: &str, parcel: &str) -> String {
        let entry = self.entry(ty);
        let method = match entry {
            Some(entry) if ty.is_array => entry.decoration.write_array_method.clone(),
            Some(entry) => entry.decoration.write_method.clone(),
            None => None,
        };
        match method {
            Some(method) => format!("{parcel}.{method}({value});"),
            None => format!("{parcel}.writeParcelable({value});"),
        }
    }

    fn read_stmt(&self, ty: &TypeRef, destination: &str) -> String {
        let entry = self.entry(ty);
        let method = match entry {
            Some(entry) if ty.is_array => entry.decoration.read_array_method.clone(),
            Some(entry) => entry.decoration.read_method.clone(),
            None => None,
        };
        match method {
            Some(method) => format!("*{destination} = _reply.{method}();"),
            None => format!("_reply.readParcelable({destination});"),
        }
    }

    fn read_stmt_into(&self, ty: &TypeRef, destination: &str, parcel: &str) -> String {
        let entry = self.entry(ty);
        let method = match entry {
            Some(entry) if ty.is_array => entry.decoration.read_array_method.clone(),
            Some(entry) => entry.decoration.read_method.clone(),
            None => None,
        };
        match method {
            Some(method) => format!("{destination} = {parcel}.{method}();"),
            None => format!("{parcel}.readParcelable(&{destination});"),
        }
    }
}

fn transaction_code(method: &Method) -> String {
    format!(
        "android::IBinder::FIRST_CALL_TRANSACTION + {}",
        method.assigned_id()
    )
}
