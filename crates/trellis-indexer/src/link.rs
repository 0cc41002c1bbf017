//! Turns per-file outlines into one graph fragment with resolved call edges

use crate::error::{ExtractError, Result};
use crate::extractor::Outliner;
use crate::outline::{CallTarget, FileOutline};
use crate::source::SourceFile;
use rayon::prelude::*;
use std::collections::BTreeSet;
use tracing::{debug, warn};
use trellis_core::{EdgeKind, GraphEdge, GraphNode, NodeId, SymbolGraph, SymbolTable};

/// Parse, outline and link `files` with one outliner.
pub fn link_files<O: Outliner>(language: &str, outliner: &O, files: &[SourceFile]) -> Result<SymbolGraph> {
    // A grammar that cannot load fails the whole extractor, not each file.
    let mut probe = tree_sitter::Parser::new();
    for file in files {
        probe.set_language(&outliner.grammar(&file.path))?;
    }

    let outlines: Vec<(&SourceFile, Result<FileOutline>)> = files
        .par_iter()
        .map_init(tree_sitter::Parser::new, |parser, file| (file, outline_file(parser, outliner, file)))
        .collect();

    // Function map keyed by qualified identity (file, name).
    let table = SymbolTable::new();
    outlines.par_iter().for_each(|(file, outline)| {
        let Ok(outline) = outline else { return };
        for decl in &outline.declarations {
            table.insert(&file.path, &decl.name, NodeId::declaration(&file.path, &decl.name), decl.kind);
        }
        for (alias, name) in &outline.aliases {
            if let Some((id, kind)) = table.lookup(&file.path, name) {
                table.insert(&file.path, alias, id, kind);
            }
        }
    });

    let known: BTreeSet<String> = files.iter().map(|f| f.path.clone()).collect();
    let mut graph = SymbolGraph::new();
    let mut unresolved = 0usize;

    for (file, outline) in outlines {
        let outline = match outline {
            Ok(outline) => outline,
            Err(e) => {
                warn!("{}: skipping file: {}", language, e);
                graph.push_diagnostic(e.to_string());
                continue;
            }
        };
        let path = file.path.as_str();

        for decl in &outline.declarations {
            graph.insert_node_if_absent(GraphNode::declaration(path, &decl.name, decl.kind, decl.range));
        }

        for import in &outline.imports {
            graph.insert_node_if_absent(GraphNode::import(path, &import.specifier, Some(import.range)));
            graph.insert_edge(GraphEdge::new(path, import.specifier.as_str(), EdgeKind::Imports));
        }

        for call in &outline.calls {
            let callee = match call {
                CallTarget::Local(name) => table.resolve_function(path, name),
                CallTarget::Imported { specifier, name } => outliner
                    .resolve_module(path, specifier, &known)
                    .and_then(|target| table.resolve_function(&target, name)),
            };
            let Some(callee) = callee else {
                unresolved += 1;
                continue;
            };
            graph.insert_node_if_absent(GraphNode::caller(path));
            graph.insert_edge(GraphEdge::new(NodeId::caller(path), callee, EdgeKind::Calls));
        }
    }

    debug!(
        "{}: {} files, {} symbols, {} nodes, {} edges, {} unresolved calls",
        language,
        files.len(),
        table.len(),
        graph.node_count(),
        graph.edge_count(),
        unresolved
    );
    Ok(graph)
}

fn outline_file<O: Outliner>(parser: &mut tree_sitter::Parser, outliner: &O, file: &SourceFile) -> Result<FileOutline> {
    parser.set_language(&outliner.grammar(&file.path))?;
    let tree = parser
        .parse(&file.text, None)
        .ok_or_else(|| ExtractError::Parse { path: file.path.clone() })?;
    Ok(outliner.outline(&tree, file.text.as_bytes()))
}

/// Join `base` (a directory, `""` for the root) with a relative path,
/// resolving `.` and `..`. Returns `None` when the path climbs above the root.
pub fn join_relative(base: &str, relative: &str) -> Option<String> {
    let mut parts: Vec<&str> = base.split('/').filter(|p| !p.is_empty()).collect();
    for segment in relative.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            other => parts.push(other),
        }
    }
    Some(parts.join("/"))
}

/// Directory part of a workspace-relative path (`""` for root-level files).
pub fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}
