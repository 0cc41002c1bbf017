//! Rust language extractor using tree-sitter

use crate::error::Result;
use crate::extractor::{LanguageExtractor, Outliner};
use crate::link::{join_relative, link_files, parent_dir};
use crate::outline::*;
use crate::source::SourceFile;
use std::collections::{BTreeSet, HashMap, HashSet};
use tree_sitter::Node;
use trellis_core::{NodeKind, SymbolGraph};

const SCOPE_KINDS: &[&str] = &["function_item", "closure_expression"];
const PATTERN_KINDS: &[&str] = &["identifier", "shorthand_field_identifier"];
const PATH_ROOTS: &[&str] = &["crate", "self", "super"];

#[derive(Debug, Default, Clone, Copy)]
pub struct RustExtractor;

/// One name brought into scope by a `use` tree.
#[derive(Debug, Clone, PartialEq, Eq)]
struct UseEntry {
    path: Vec<String>,
    /// `None` for glob imports.
    local: Option<String>,
}

impl RustExtractor {
    pub fn new() -> Self {
        RustExtractor
    }

    fn item_kind(kind: &str) -> Option<NodeKind> {
        match kind {
            "function_item" => Some(NodeKind::Function),
            "struct_item" | "enum_item" | "union_item" => Some(NodeKind::Class),
            "trait_item" => Some(NodeKind::Interface),
            "type_item" => Some(NodeKind::TypeAlias),
            "const_item" | "static_item" => Some(NodeKind::Variable),
            _ => None,
        }
    }

    fn path_segments(text: &str) -> Vec<String> {
        text.split("::")
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn flatten_use(node: Node, source: &[u8], prefix: &[String], out: &mut Vec<UseEntry>) {
        match node.kind() {
            "identifier" | "crate" | "super" | "metavariable" => {
                let mut path = prefix.to_vec();
                let name = text_of(node, source).to_string();
                path.push(name.clone());
                out.push(UseEntry { path, local: Some(name) });
            }
            // `use a::{self}` binds `a` itself.
            "self" => {
                if prefix.is_empty() {
                    return;
                }
                out.push(UseEntry {
                    path: prefix.to_vec(),
                    local: prefix.last().cloned(),
                });
            }
            "scoped_identifier" => {
                let mut path = prefix.to_vec();
                path.extend(Self::path_segments(text_of(node, source)));
                let local = path.last().cloned();
                out.push(UseEntry { path, local });
            }
            "use_as_clause" => {
                let (Some(path), Some(alias)) = (node.child_by_field_name("path"), field_text(node, "alias", source))
                else {
                    return;
                };
                let mut full = prefix.to_vec();
                full.extend(Self::path_segments(text_of(path, source)));
                out.push(UseEntry {
                    path: full,
                    local: Some(alias.to_string()),
                });
            }
            "use_wildcard" => {
                let mut path = prefix.to_vec();
                let text = text_of(node, source).trim_end_matches('*');
                path.extend(Self::path_segments(text));
                out.push(UseEntry { path, local: None });
            }
            "scoped_use_list" => {
                let mut next = prefix.to_vec();
                if let Some(path) = node.child_by_field_name("path") {
                    next.extend(Self::path_segments(text_of(path, source)));
                }
                if let Some(list) = node.child_by_field_name("list") {
                    Self::flatten_use(list, source, &next, out);
                }
            }
            "use_list" => {
                let mut cursor = node.walk();
                for item in node.named_children(&mut cursor) {
                    Self::flatten_use(item, source, prefix, out);
                }
            }
            _ => {}
        }
    }

    fn use_declaration(node: Node, source: &[u8], outline: &mut FileOutline, bound: &mut HashMap<String, String>) {
        let Some(argument) = node.child_by_field_name("argument") else {
            return;
        };
        let mut entries = Vec::new();
        Self::flatten_use(argument, source, &[], &mut entries);

        for entry in entries {
            let Some((last, parent)) = entry.path.split_last() else {
                continue;
            };
            let import = match &entry.local {
                Some(local) if !parent.is_empty() => {
                    bound.insert(local.clone(), entry.path.join("::"));
                    Import {
                        specifier: parent.join("::"),
                        bindings: vec![ImportBinding {
                            local: local.clone(),
                            exported: last.clone(),
                        }],
                        range: range_of(node),
                    }
                }
                Some(local) => {
                    bound.insert(local.clone(), last.clone());
                    Import {
                        specifier: last.clone(),
                        bindings: Vec::new(),
                        range: range_of(node),
                    }
                }
                None => Import {
                    specifier: entry.path.join("::"),
                    bindings: Vec::new(),
                    range: range_of(node),
                },
            };
            outline.imports.push(import);
        }
    }

    fn collect_calls(
        node: Node,
        source: &[u8],
        scopes: &mut ScopeStack,
        bound: &HashMap<String, String>,
        names: &mut Vec<String>,
        scoped: &mut Vec<CallTarget>,
    ) {
        let opens_scope = SCOPE_KINDS.contains(&node.kind());
        if opens_scope {
            scopes.push(Self::function_scope(node, source));
        }

        if node.kind() == "call_expression" {
            if let Some(mut callee) = node.child_by_field_name("function") {
                if callee.kind() == "generic_function" {
                    if let Some(inner) = callee.child_by_field_name("function") {
                        callee = inner;
                    }
                }
                match callee.kind() {
                    "identifier" => {
                        let name = text_of(callee, source);
                        if !scopes.shadows(name) {
                            names.push(name.to_string());
                        }
                    }
                    "scoped_identifier" => {
                        if let Some(target) = Self::scoped_target(callee, source, bound) {
                            scoped.push(target);
                        }
                    }
                    _ => {}
                }
            }
        }

        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            Self::collect_calls(child, source, scopes, bound, names, scoped);
        }

        if opens_scope {
            scopes.pop();
        }
    }

    /// `crate::a::f()`, `super::f()`, or `m::f()` where `m` was imported.
    fn scoped_target(callee: Node, source: &[u8], bound: &HashMap<String, String>) -> Option<CallTarget> {
        let path = callee.child_by_field_name("path")?;
        let name = field_text(callee, "name", source)?;
        let segments = Self::path_segments(text_of(path, source));
        let (first, rest) = segments.split_first()?;

        let mut module = if PATH_ROOTS.contains(&first.as_str()) {
            first.clone()
        } else {
            bound.get(first)?.clone()
        };
        for segment in rest {
            module.push_str("::");
            module.push_str(segment);
        }
        Some(CallTarget::Imported {
            specifier: module,
            name: name.to_string(),
        })
    }

    fn function_scope(node: Node, source: &[u8]) -> HashSet<String> {
        let mut names = HashSet::new();
        if let Some(params) = node.child_by_field_name("parameters") {
            let mut cursor = params.walk();
            for param in params.named_children(&mut cursor) {
                match param.kind() {
                    "parameter" => {
                        if let Some(pattern) = param.child_by_field_name("pattern") {
                            collect_identifiers(pattern, source, PATTERN_KINDS, &mut names);
                        }
                    }
                    "self_parameter" | "variadic_parameter" | "attribute_item" => {}
                    // Closure parameters are bare patterns.
                    _ => collect_identifiers(param, source, PATTERN_KINDS, &mut names),
                }
            }
        }
        if let Some(body) = node.child_by_field_name("body") {
            Self::declared_names(body, source, &mut names);
        }
        names
    }

    fn declared_names(node: Node, source: &[u8], names: &mut HashSet<String>) {
        match node.kind() {
            "let_declaration" | "for_expression" | "let_condition" => {
                if let Some(pattern) = node.child_by_field_name("pattern") {
                    collect_identifiers(pattern, source, PATTERN_KINDS, names);
                }
            }
            "function_item" => {
                if let Some(name) = field_text(node, "name", source) {
                    names.insert(name.to_string());
                }
                return;
            }
            "closure_expression" => return,
            _ => {}
        }

        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            Self::declared_names(child, source, names);
        }
    }

    /// Directory holding the crate root (`lib.rs` / `main.rs`) for `path`.
    fn crate_root(path: &str) -> String {
        let segments: Vec<&str> = path.split('/').collect();
        match segments[..segments.len().saturating_sub(1)].iter().position(|s| *s == "src") {
            Some(index) => segments[..=index].join("/"),
            None => parent_dir(path).to_string(),
        }
    }

    /// Directory that holds the child modules of the module defined by `path`.
    fn module_dir(path: &str) -> String {
        let name = path.rsplit('/').next().unwrap_or(path);
        if matches!(name, "mod.rs" | "lib.rs" | "main.rs") {
            parent_dir(path).to_string()
        } else {
            path.strip_suffix(".rs").unwrap_or(path).to_string()
        }
    }

    fn module_file(dir: &str, crate_root: &str, files: &BTreeSet<String>) -> Option<String> {
        let candidates = if dir == crate_root {
            let prefix = if dir.is_empty() { String::new() } else { format!("{dir}/") };
            vec![format!("{prefix}lib.rs"), format!("{prefix}main.rs")]
        } else {
            vec![format!("{dir}.rs"), format!("{dir}/mod.rs")]
        };
        candidates.into_iter().find(|c| files.contains(c))
    }
}

impl Outliner for RustExtractor {
    fn grammar(&self, _path: &str) -> tree_sitter::Language {
        tree_sitter_rust::LANGUAGE.into()
    }

    fn outline(&self, tree: &tree_sitter::Tree, source: &[u8]) -> FileOutline {
        let root = tree.root_node();
        let mut outline = FileOutline::default();
        let mut bound = HashMap::new();

        let mut cursor = root.walk();
        for item in root.named_children(&mut cursor) {
            if item.kind() == "use_declaration" {
                Self::use_declaration(item, source, &mut outline, &mut bound);
                continue;
            }
            let Some(kind) = Self::item_kind(item.kind()) else {
                continue;
            };
            let name = field_text(item, "name", source).unwrap_or(item.kind());
            outline.declarations.push(Declaration {
                name: name.to_string(),
                kind,
                range: range_of(item),
            });
        }

        let mut names = Vec::new();
        let mut scoped = Vec::new();
        Self::collect_calls(root, source, &mut ScopeStack::new(), &bound, &mut names, &mut scoped);
        outline.resolve_calls(names);
        for target in scoped {
            if !outline.calls.contains(&target) {
                outline.calls.push(target);
            }
        }
        outline
    }

    fn resolve_module(&self, from: &str, specifier: &str, files: &BTreeSet<String>) -> Option<String> {
        let segments = Self::path_segments(specifier);
        let (first, rest) = segments.split_first()?;
        let crate_root = Self::crate_root(from);
        let self_dir = Self::module_dir(from);

        let mut dir = match first.as_str() {
            "crate" => crate_root.clone(),
            "self" => self_dir,
            "super" => parent_dir(&self_dir).to_string(),
            // Child module declared with `mod name;`.
            child => join_relative(&self_dir, child)?,
        };
        for segment in rest {
            dir = match segment.as_str() {
                "super" => parent_dir(&dir).to_string(),
                "self" => dir,
                name => join_relative(&dir, name)?,
            };
        }
        Self::module_file(&dir, &crate_root, files)
    }
}

impl LanguageExtractor for RustExtractor {
    fn name(&self) -> &'static str {
        "rust"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["rs"]
    }

    fn build(&self, files: &[SourceFile]) -> Result<SymbolGraph> {
        link_files(self.name(), self, files)
    }
}
