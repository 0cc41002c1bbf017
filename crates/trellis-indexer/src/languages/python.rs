//! Python language extractor using tree-sitter

use crate::error::Result;
use crate::extractor::{LanguageExtractor, Outliner};
use crate::link::{join_relative, link_files, parent_dir};
use crate::outline::*;
use crate::source::SourceFile;
use std::collections::{BTreeSet, HashSet};
use tree_sitter::Node;
use trellis_core::{NodeKind, SymbolGraph};

const SCOPE_KINDS: &[&str] = &["function_definition", "lambda"];

#[derive(Debug, Default, Clone, Copy)]
pub struct PythonExtractor;

impl PythonExtractor {
    pub fn new() -> Self {
        PythonExtractor
    }

    fn top_level(node: Node, source: &[u8], outline: &mut FileOutline) {
        match node.kind() {
            "function_definition" => Self::push(node, node, source, NodeKind::Function, outline),
            "class_definition" => Self::push(node, node, source, NodeKind::Class, outline),
            "decorated_definition" => {
                let Some(definition) = node.child_by_field_name("definition") else {
                    return;
                };
                let kind = if definition.kind() == "class_definition" {
                    NodeKind::Class
                } else {
                    NodeKind::Function
                };
                Self::push(definition, node, source, kind, outline);
            }
            "type_alias_statement" => {
                let Some(left) = node.child_by_field_name("left") else {
                    return;
                };
                // `type Pair[T] = ...` declares `Pair`.
                let text = text_of(left, source);
                let name = text.split('[').next().unwrap_or(text).trim();
                if !name.is_empty() {
                    outline.declarations.push(Declaration {
                        name: name.to_string(),
                        kind: NodeKind::TypeAlias,
                        range: range_of(node),
                    });
                }
            }
            "expression_statement" => {
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    if child.kind() == "assignment" {
                        Self::assignment(child, node, source, outline);
                    }
                }
            }
            "import_statement" => Self::import(node, source, outline),
            "import_from_statement" => Self::import_from(node, source, outline),
            _ => {}
        }
    }

    fn push(definition: Node, outer: Node, source: &[u8], kind: NodeKind, outline: &mut FileOutline) {
        let name = field_text(definition, "name", source).unwrap_or(definition.kind());
        outline.declarations.push(Declaration {
            name: name.to_string(),
            kind,
            range: range_of(outer),
        });
    }

    fn assignment(node: Node, statement: Node, source: &[u8], outline: &mut FileOutline) {
        let Some(left) = node.child_by_field_name("left") else {
            return;
        };
        let right = node.child_by_field_name("right");
        let kind = match right {
            Some(value) if value.kind() == "lambda" => NodeKind::Function,
            _ => NodeKind::Variable,
        };

        let mut names = HashSet::new();
        collect_identifiers(left, source, &["identifier"], &mut names);
        let mut names: Vec<String> = names.into_iter().collect();
        names.sort();
        for name in names {
            outline.declarations.push(Declaration {
                name,
                kind,
                range: range_of(statement),
            });
        }

        // a = b = value
        if let Some(chained) = right.filter(|r| r.kind() == "assignment") {
            Self::assignment(chained, statement, source, outline);
        }
    }

    fn import(node: Node, source: &[u8], outline: &mut FileOutline) {
        // `import a.b` binds a module object; only member calls go through it.
        let mut cursor = node.walk();
        for name in node.children_by_field_name("name", &mut cursor) {
            let module = match name.kind() {
                "aliased_import" => field_text(name, "name", source),
                _ => Some(text_of(name, source)),
            };
            if let Some(module) = module {
                outline.imports.push(Import {
                    specifier: module.to_string(),
                    bindings: Vec::new(),
                    range: range_of(node),
                });
            }
        }
    }

    fn import_from(node: Node, source: &[u8], outline: &mut FileOutline) {
        let Some(module) = field_text(node, "module_name", source) else {
            return;
        };
        let mut bindings = Vec::new();
        let mut cursor = node.walk();
        for name in node.children_by_field_name("name", &mut cursor) {
            match name.kind() {
                "aliased_import" => {
                    if let (Some(exported), Some(local)) =
                        (field_text(name, "name", source), field_text(name, "alias", source))
                    {
                        bindings.push(ImportBinding {
                            local: local.to_string(),
                            exported: exported.to_string(),
                        });
                    }
                }
                _ => {
                    let exported = text_of(name, source);
                    bindings.push(ImportBinding {
                        local: exported.to_string(),
                        exported: exported.to_string(),
                    });
                }
            }
        }
        outline.imports.push(Import {
            specifier: module.to_string(),
            bindings,
            range: range_of(node),
        });
    }

    fn collect_calls(node: Node, source: &[u8], scopes: &mut ScopeStack, names: &mut Vec<String>) {
        let opens_scope = SCOPE_KINDS.contains(&node.kind());
        if opens_scope {
            scopes.push(Self::function_scope(node, source));
        }

        if node.kind() == "call" {
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
            Self::collect_calls(child, source, scopes, names);
        }

        if opens_scope {
            scopes.pop();
        }
    }

    fn function_scope(node: Node, source: &[u8]) -> HashSet<String> {
        let mut names = HashSet::new();
        if let Some(params) = node.child_by_field_name("parameters") {
            let mut cursor = params.walk();
            for param in params.named_children(&mut cursor) {
                Self::parameter_names(param, source, &mut names);
            }
        }
        if let Some(body) = node.child_by_field_name("body") {
            Self::declared_names(body, source, &mut names);
        }
        names
    }

    /// Bound names of one parameter, skipping defaults and annotations.
    fn parameter_names(param: Node, source: &[u8], names: &mut HashSet<String>) {
        match param.kind() {
            "identifier" => {
                names.insert(text_of(param, source).to_string());
            }
            "default_parameter" | "typed_default_parameter" => {
                if let Some(name) = field_text(param, "name", source) {
                    names.insert(name.to_string());
                }
            }
            "typed_parameter" => {
                if let Some(first) = param.named_child(0) {
                    collect_identifiers(first, source, &["identifier"], names);
                }
            }
            "list_splat_pattern" | "dictionary_splat_pattern" | "tuple_pattern" => {
                collect_identifiers(param, source, &["identifier"], names);
            }
            _ => {}
        }
    }

    fn declared_names(node: Node, source: &[u8], names: &mut HashSet<String>) {
        match node.kind() {
            "assignment" | "augmented_assignment" | "for_statement" => {
                if let Some(left) = node.child_by_field_name("left") {
                    collect_identifiers(left, source, &["identifier"], names);
                }
            }
            "named_expression" => {
                if let Some(name) = field_text(node, "name", source) {
                    names.insert(name.to_string());
                }
            }
            "as_pattern" => {
                if let Some(alias) = node.child_by_field_name("alias") {
                    collect_identifiers(alias, source, &["identifier"], names);
                }
            }
            "import_from_statement" => {
                let mut cursor = node.walk();
                for name in node.children_by_field_name("name", &mut cursor) {
                    let local = match name.kind() {
                        "aliased_import" => field_text(name, "alias", source),
                        _ => Some(text_of(name, source)),
                    };
                    if let Some(local) = local {
                        names.insert(local.to_string());
                    }
                }
                return;
            }
            "function_definition" | "class_definition" => {
                if let Some(name) = field_text(node, "name", source) {
                    names.insert(name.to_string());
                }
                return;
            }
            "lambda" => return,
            _ => {}
        }

        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            Self::declared_names(child, source, names);
        }
    }
}

impl Outliner for PythonExtractor {
    fn grammar(&self, _path: &str) -> tree_sitter::Language {
        tree_sitter_python::LANGUAGE.into()
    }

    fn outline(&self, tree: &tree_sitter::Tree, source: &[u8]) -> FileOutline {
        let root = tree.root_node();
        let mut outline = FileOutline::default();

        let mut cursor = root.walk();
        for statement in root.named_children(&mut cursor) {
            Self::top_level(statement, source, &mut outline);
        }

        let mut names = Vec::new();
        Self::collect_calls(root, source, &mut ScopeStack::new(), &mut names);
        outline.resolve_calls(names);
        outline
    }

    /// `.mod` / `..pkg.mod` resolve against the importing file's package,
    /// `pkg.mod` against the workspace root and then `src/`.
    fn resolve_module(&self, from: &str, specifier: &str, files: &BTreeSet<String>) -> Option<String> {
        let dots = specifier.chars().take_while(|c| *c == '.').count();
        let module = specifier[dots..].replace('.', "/");

        let bases: Vec<String> = if dots > 0 {
            let climb = "../".repeat(dots - 1);
            vec![join_relative(parent_dir(from), &climb)?]
        } else {
            vec![String::new(), "src".to_string()]
        };

        for base in bases {
            let Some(stem) = join_relative(&base, &module) else {
                continue;
            };
            let prefix = if stem.is_empty() { String::new() } else { format!("{stem}/") };
            let candidates = [
                format!("{stem}.py"),
                format!("{stem}.pyi"),
                format!("{prefix}__init__.py"),
                format!("{prefix}__init__.pyi"),
            ];
            if let Some(found) = candidates.into_iter().find(|c| !c.starts_with('.') && files.contains(c)) {
                return Some(found);
            }
        }
        None
    }
}

impl LanguageExtractor for PythonExtractor {
    fn name(&self) -> &'static str {
        "python"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["py", "pyi"]
    }

    fn build(&self, files: &[SourceFile]) -> Result<SymbolGraph> {
        link_files(self.name(), self, files)
    }
}
