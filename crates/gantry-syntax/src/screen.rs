//! Capability screening over a parsed syntax tree.
//!
//! The screen is data-driven: three fixed name sets, checked during a
//! generic tree walk that only needs to recognize call expressions, import
//! statements, and attribute accesses. Forbidden calls and forbidden-module
//! imports are hard errors; imports outside the allow-list and dunder
//! attribute access are surfaced as warnings so unknown-but-not-dangerous
//! capabilities are neither silently passed nor hard-blocked.

use tree_sitter::Node;

/// Modules of the document host's scripting surface that operations may use.
pub const ALLOWED_MODULES: &[&str] = &[
    "FreeCAD",
    "Part",
    "Arch",
    "Draft",
    "Sketcher",
    "PartDesign",
    "Mesh",
    "MeshPart",
    "Drawing",
    "Spreadsheet",
];

/// Functions that must never be callable from candidate code: dynamic code
/// evaluation and compilation, dynamic module loading, direct file and
/// process I/O, and namespace introspection.
pub const FORBIDDEN_FUNCTIONS: &[&str] = &[
    "eval",
    "exec",
    "compile",
    "__import__",
    "open",
    "input",
    "file",
    "execfile",
    "reload",
    "globals",
    "locals",
    "vars",
    "dir",
    "help",
    "quit",
    "exit",
];

/// Modules that must never be importable from candidate code: operating
/// system access, subprocess spawning, networking, pickle-style
/// serialization, and low-level import machinery.
pub const FORBIDDEN_MODULES: &[&str] = &[
    "os",
    "sys",
    "subprocess",
    "shutil",
    "socket",
    "urllib",
    "pickle",
    "shelve",
    "marshal",
    "imp",
    "importlib",
];

pub fn is_allowed_module(name: &str) -> bool {
    ALLOWED_MODULES.contains(&name)
}

pub fn is_forbidden_module(name: &str) -> bool {
    FORBIDDEN_MODULES.contains(&name)
}

pub fn is_forbidden_function(name: &str) -> bool {
    FORBIDDEN_FUNCTIONS.contains(&name)
}

/// Findings from one screening pass. Errors reject the operation; warnings
/// are logged by the caller and do not block.
#[derive(Debug, Default)]
pub struct ScreenFindings {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ScreenFindings {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Walk the tree rooted at `root` and collect capability findings.
pub fn screen_tree(root: Node<'_>, source: &str) -> ScreenFindings {
    let mut findings = ScreenFindings::default();
    scan(root, source, &mut findings);
    findings
}

fn scan(node: Node<'_>, source: &str, findings: &mut ScreenFindings) {
    match node.kind() {
        "call" => {
            if let Some(name) = call_target(node, source) {
                if is_forbidden_function(name) {
                    findings
                        .errors
                        .push(format!("forbidden function call: {}", name));
                }
            }
        }
        "import_statement" => {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                let module = match child.kind() {
                    "dotted_name" => node_text(child, source),
                    "aliased_import" => child
                        .child_by_field_name("name")
                        .map(|n| node_text(n, source))
                        .unwrap_or_default(),
                    _ => continue,
                };
                check_import(module, findings);
            }
        }
        "import_from_statement" => {
            if let Some(module_node) = node.child_by_field_name("module_name") {
                check_import(node_text(module_node, source), findings);
            }
        }
        "attribute" => {
            if let Some(attr) = attribute_name(node, source) {
                if attr.starts_with("__") && attr.ends_with("__") {
                    findings
                        .warnings
                        .push(format!("access to dunder attribute: {}", attr));
                }
            }
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        scan(child, source, findings);
    }
}

fn check_import(module: &str, findings: &mut ScreenFindings) {
    let root = module.split('.').next().unwrap_or(module);
    if is_forbidden_module(root) {
        findings
            .errors
            .push(format!("forbidden module import: {}", root));
    } else if !is_allowed_module(root) {
        findings
            .warnings
            .push(format!("unrecognized module: {}", root));
    }
}

/// The called name of a call expression: the identifier for `f(...)`, the
/// final attribute for `obj.f(...)`, `None` for anything else
/// (subscripts, lambdas).
pub(crate) fn call_target<'s>(call: Node<'_>, source: &'s str) -> Option<&'s str> {
    let function = call.child_by_field_name("function")?;
    match function.kind() {
        "identifier" => Some(node_text(function, source)),
        "attribute" => attribute_name(function, source),
        _ => None,
    }
}

/// The attribute name of an attribute-access node (`x.name` → "name").
pub(crate) fn attribute_name<'s>(attribute: Node<'_>, source: &'s str) -> Option<&'s str> {
    attribute
        .child_by_field_name("attribute")
        .map(|n| node_text(n, source))
}

pub(crate) fn node_text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    node.utf8_text(source.as_bytes()).unwrap_or_default()
}
