//! Syntax walk shared by the TypeScript and JavaScript extractors

use crate::link::{join_relative, parent_dir};
use crate::outline::*;
use std::collections::{BTreeSet, HashSet};
use tree_sitter::Node;
use trellis_core::NodeKind;

/// Node kinds that open a new function scope.
const FUNCTION_KINDS: &[&str] = &[
    "function_declaration",
    "generator_function_declaration",
    "function_expression",
    "function",
    "generator_function",
    "arrow_function",
    "method_definition",
];

/// Initialiser kinds that make a `const f = ...` declarator a function.
const FUNCTION_VALUE_KINDS: &[&str] = &["arrow_function", "function_expression", "function", "generator_function"];

const BINDING_KINDS: &[&str] = &["identifier", "shorthand_property_identifier_pattern"];

/// Extensions probed when resolving a relative specifier, in priority order.
const MODULE_EXTENSIONS: &[&str] = &["ts", "tsx", "mts", "cts", "js", "jsx", "mjs", "cjs"];

pub(crate) fn outline_program(root: Node, source: &[u8]) -> FileOutline {
    let mut outline = FileOutline::default();

    let mut cursor = root.walk();
    for statement in root.named_children(&mut cursor) {
        top_level(statement, source, &mut outline);
    }

    let mut names = Vec::new();
    let mut scopes = ScopeStack::new();
    collect_calls(root, source, &mut scopes, &mut names);
    outline.resolve_calls(names);
    outline
}

fn top_level(node: Node, source: &[u8], outline: &mut FileOutline) {
    match node.kind() {
        "function_declaration" | "generator_function_declaration" => {
            push_declaration(node, source, NodeKind::Function, outline);
        }
        "class_declaration" | "abstract_class_declaration" => {
            push_declaration(node, source, NodeKind::Class, outline);
        }
        "interface_declaration" => {
            push_declaration(node, source, NodeKind::Interface, outline);
        }
        "type_alias_declaration" => {
            push_declaration(node, source, NodeKind::TypeAlias, outline);
        }
        "lexical_declaration" | "variable_declaration" => {
            let mut cursor = node.walk();
            for declarator in node.named_children(&mut cursor) {
                if declarator.kind() == "variable_declarator" {
                    push_declarator(declarator, source, outline);
                }
            }
        }
        "export_statement" => export_statement(node, source, outline),
        "import_statement" => import_statement(node, source, outline),
        _ => {}
    }
}

fn push_declaration(node: Node, source: &[u8], kind: NodeKind, outline: &mut FileOutline) -> String {
    let name = field_text(node, "name", source).unwrap_or(node.kind()).to_string();
    outline.declarations.push(Declaration {
        name: name.clone(),
        kind,
        range: range_of(node),
    });
    name
}

fn push_declarator(declarator: Node, source: &[u8], outline: &mut FileOutline) {
    let Some(pattern) = declarator.child_by_field_name("name") else {
        return;
    };
    let kind = match declarator.child_by_field_name("value") {
        Some(value) if FUNCTION_VALUE_KINDS.contains(&value.kind()) => NodeKind::Function,
        _ => NodeKind::Variable,
    };

    if pattern.kind() == "identifier" {
        outline.declarations.push(Declaration {
            name: text_of(pattern, source).to_string(),
            kind,
            range: range_of(declarator),
        });
        return;
    }

    // Destructuring: one variable per bound name.
    let mut names = HashSet::new();
    collect_identifiers(pattern, source, BINDING_KINDS, &mut names);
    let mut names: Vec<String> = names.into_iter().collect();
    names.sort();
    for name in names {
        outline.declarations.push(Declaration {
            name,
            kind: NodeKind::Variable,
            range: range_of(declarator),
        });
    }
}

fn is_default_export(node: Node) -> bool {
    let mut cursor = node.walk();
    let is_default = node.children(&mut cursor).any(|c| c.kind() == "default");
    is_default
}

fn export_statement(node: Node, source: &[u8], outline: &mut FileOutline) {
    // `export ... from './x'` is a module dependency without local bindings.
    if let Some(specifier) = node.child_by_field_name("source") {
        outline.imports.push(Import {
            specifier: unquote(text_of(specifier, source)).to_string(),
            bindings: Vec::new(),
            range: range_of(node),
        });
        return;
    }

    let default = is_default_export(node);

    if let Some(declaration) = node.child_by_field_name("declaration") {
        let before = outline.declarations.len();
        top_level(declaration, source, outline);
        if default && outline.declarations.len() > before {
            let name = outline.declarations[before].name.clone();
            outline.aliases.push(("default".to_string(), name));
        }
        return;
    }

    let Some(value) = node.child_by_field_name("value") else {
        return;
    };
    if !default {
        return;
    }
    if value.kind() == "identifier" {
        let name = text_of(value, source).to_string();
        outline.aliases.push(("default".to_string(), name));
        return;
    }

    let kind = if FUNCTION_VALUE_KINDS.contains(&value.kind()) {
        NodeKind::Function
    } else if value.kind() == "class" {
        NodeKind::Class
    } else {
        NodeKind::Variable
    };
    let name = push_declaration(value, source, kind, outline);
    outline.aliases.push(("default".to_string(), name));
}

fn import_statement(node: Node, source: &[u8], outline: &mut FileOutline) {
    let Some(specifier) = node.child_by_field_name("source") else {
        return;
    };
    let mut bindings = Vec::new();

    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() != "import_clause" {
            continue;
        }
        let mut clause_cursor = child.walk();
        for part in child.named_children(&mut clause_cursor) {
            match part.kind() {
                "identifier" => bindings.push(ImportBinding {
                    local: text_of(part, source).to_string(),
                    exported: "default".to_string(),
                }),
                "named_imports" => {
                    let mut spec_cursor = part.walk();
                    for spec in part.named_children(&mut spec_cursor) {
                        if spec.kind() != "import_specifier" {
                            continue;
                        }
                        let Some(exported) = field_text(spec, "name", source) else {
                            continue;
                        };
                        let local = field_text(spec, "alias", source).unwrap_or(exported);
                        bindings.push(ImportBinding {
                            local: local.to_string(),
                            exported: exported.to_string(),
                        });
                    }
                }
                // Namespace imports are only reachable through member calls.
                _ => {}
            }
        }
    }

    outline.imports.push(Import {
        specifier: unquote(text_of(specifier, source)).to_string(),
        bindings,
        range: range_of(node),
    });
}

fn collect_calls(node: Node, source: &[u8], scopes: &mut ScopeStack, names: &mut Vec<String>) {
    let opens_scope = FUNCTION_KINDS.contains(&node.kind());
    if opens_scope {
        scopes.push(function_scope(node, source));
    }

    if node.kind() == "call_expression" {
        if let Some(callee) = node.child_by_field_name("function") {
            if callee.kind() == "identifier" {
                let name = text_of(callee, source);
                if !scopes.shadows(name) {
                    names.push(name.to_string());
                }
            }
        }
    }

    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        collect_calls(child, source, scopes, names);
    }

    if opens_scope {
        scopes.pop();
    }
}

/// Names bound inside a function: its own name (for expressions), parameters,
/// and declarations in its body outside nested functions.
fn function_scope(node: Node, source: &[u8]) -> HashSet<String> {
    let mut names = HashSet::new();

    if node.kind() != "function_declaration" && node.kind() != "method_definition" {
        if let Some(name) = field_text(node, "name", source) {
            names.insert(name.to_string());
        }
    }
    if let Some(params) = node.child_by_field_name("parameters") {
        collect_identifiers(params, source, BINDING_KINDS, &mut names);
    }
    if let Some(param) = node.child_by_field_name("parameter") {
        collect_identifiers(param, source, BINDING_KINDS, &mut names);
    }
    if let Some(body) = node.child_by_field_name("body") {
        declared_names(body, source, &mut names);
    }
    names
}

fn declared_names(node: Node, source: &[u8], names: &mut HashSet<String>) {
    match node.kind() {
        "variable_declarator" => {
            if let Some(pattern) = node.child_by_field_name("name") {
                collect_identifiers(pattern, source, BINDING_KINDS, names);
            }
        }
        "for_in_statement" => {
            if let Some(left) = node.child_by_field_name("left") {
                collect_identifiers(left, source, BINDING_KINDS, names);
            }
        }
        "catch_clause" => {
            if let Some(param) = node.child_by_field_name("parameter") {
                collect_identifiers(param, source, BINDING_KINDS, names);
            }
        }
        "function_declaration" | "generator_function_declaration" | "class_declaration" => {
            if let Some(name) = field_text(node, "name", source) {
                names.insert(name.to_string());
            }
            return;
        }
        kind if FUNCTION_KINDS.contains(&kind) || kind == "class" => return,
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        declared_names(child, source, names);
    }
}

/// Resolve `./x` / `../x` specifiers against the workspace files, probing
/// source extensions and `index` files. Package specifiers never resolve.
pub(crate) fn resolve_relative(from: &str, specifier: &str, files: &BTreeSet<String>) -> Option<String> {
    if !(specifier.starts_with("./") || specifier.starts_with("../")) {
        return None;
    }
    let base = join_relative(parent_dir(from), specifier)?;
    if files.contains(&base) {
        return Some(base);
    }

    // ESM-style `./x.js` written for a `x.ts` source.
    let stem = MODULE_EXTENSIONS
        .iter()
        .find_map(|ext| base.strip_suffix(&format!(".{ext}")).map(str::to_string))
        .unwrap_or_else(|| base.clone());

    MODULE_EXTENSIONS
        .iter()
        .map(|ext| format!("{stem}.{ext}"))
        .chain(MODULE_EXTENSIONS.iter().map(|ext| format!("{base}/index.{ext}")))
        .find(|candidate| files.contains(candidate))
}
