//! Unit tests for trellis-indexer module

use crate::*;
use std::sync::Arc;
use trellis_core::{EdgeKind, NodeKind, SymbolGraph};

fn coordinator(files: &[(&str, &str)]) -> Coordinator {
    let provider = MemorySourceProvider::with_files(files.iter().copied());
    Coordinator::new(Arc::new(provider), ExtractorRegistry::with_defaults())
}

/// Extractor claiming `.broken` files that always fails.
struct FailingExtractor;

impl LanguageExtractor for FailingExtractor {
    fn name(&self) -> &'static str {
        "broken"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["broken"]
    }

    fn build(&self, _files: &[SourceFile]) -> Result<SymbolGraph> {
        Err(ExtractError::Parse { path: "a.broken".to_string() })
    }
}

struct PanickingExtractor;

impl LanguageExtractor for PanickingExtractor {
    fn name(&self) -> &'static str {
        "boom"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["boom"]
    }

    fn build(&self, _files: &[SourceFile]) -> Result<SymbolGraph> {
        panic!("extractor exploded")
    }
}

/// Lists a file it cannot read.
struct GhostProvider;

impl SourceProvider for GhostProvider {
    fn list_files(&self) -> Result<Vec<String>> {
        Ok(vec!["ghost.ts".to_string(), "real.ts".to_string()])
    }

    fn read(&self, path: &str) -> Result<String> {
        match path {
            "real.ts" => Ok("export function real() {}\n".to_string()),
            _ => Err(ExtractError::Io {
                path: path.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            }),
        }
    }
}

#[tokio::test]
async fn test_cross_file_call_resolution() {
    let coordinator = coordinator(&[
        ("src/util.ts", "export function format(v: number) { return `${v}`; }\n"),
        (
            "src/main.ts",
            "import { format } from './util';\nexport function main() { return format(1); }\n",
        ),
    ]);
    let graph = coordinator.build().await.unwrap();

    assert!(graph.contains_node("src/util.ts#format"));
    assert!(graph.contains_node("src/main.ts#main"));
    assert!(graph.contains_node("src/main.ts#import:./util"));
    assert!(graph.contains_node("src/main.ts@caller"));
    assert!(graph.contains_edge("imports:src/main.ts->./util"));
    assert!(graph.contains_edge("calls:src/main.ts@caller->src/util.ts#format"));
    assert!(graph.diagnostics().is_empty());
}

#[tokio::test]
async fn test_unresolved_call_produces_nothing() {
    // A call to a name defined nowhere in the workspace.
    let coordinator = coordinator(&[("src/a.ts", "export function a() { missing(); }\n")]);
    let graph = coordinator.build().await.unwrap();

    assert_eq!(graph.edges_of_kind(EdgeKind::Calls).count(), 0);
    assert!(!graph.contains_node("src/a.ts@caller"));
    assert!(graph.diagnostics().is_empty());
}

#[tokio::test]
async fn test_member_and_shadowed_calls_are_dropped() {
    let coordinator = coordinator(&[(
        "src/a.ts",
        r#"
function helper() {}
const api = { helper };
export function run(helper: () => void) {
    helper();
    api.helper();
}
"#,
    )]);
    let graph = coordinator.build().await.unwrap();
    assert_eq!(graph.edges_of_kind(EdgeKind::Calls).count(), 0);
}

#[tokio::test]
async fn test_package_import_is_kept_but_unresolved() {
    let coordinator = coordinator(&[(
        "src/app.ts",
        "import { render } from 'react-dom';\nexport function boot() { render(); }\n",
    )]);
    let graph = coordinator.build().await.unwrap();

    assert!(graph.contains_edge("imports:src/app.ts->react-dom"));
    assert_eq!(graph.edges_of_kind(EdgeKind::Calls).count(), 0);
}

#[tokio::test]
async fn test_mixed_languages_in_one_build() {
    let coordinator = coordinator(&[
        ("web/index.js", "function start() {}\nstart();\n"),
        ("tools/gen.py", "def gen():\n    pass\n\ngen()\n"),
        ("src/lib.rs", "pub fn init() {}\nfn boot() { init(); }\n"),
        ("README.md", "# not source"),
    ]);
    let graph = coordinator.build().await.unwrap();

    assert!(graph.contains_edge("calls:web/index.js@caller->web/index.js#start"));
    assert!(graph.contains_edge("calls:tools/gen.py@caller->tools/gen.py#gen"));
    assert!(graph.contains_edge("calls:src/lib.rs@caller->src/lib.rs#init"));
    assert!(graph.nodes().all(|n| n.file.as_deref() != Some("README.md")));
}

#[tokio::test]
async fn test_duplicate_declaration_first_wins() {
    let coordinator = coordinator(&[("dup.js", "function f() { return 1; }\nfunction f() { return 2; }\n")]);
    let graph = coordinator.build().await.unwrap();

    let functions: Vec<_> = graph.nodes_of_kind(NodeKind::Function).collect();
    assert_eq!(functions.len(), 1);
    assert_eq!(functions[0].range.map(|r| r.start), Some(0));
}

#[tokio::test]
async fn test_syntax_errors_keep_parsed_declarations() {
    let coordinator = coordinator(&[("src/bad.ts", "export function ok() {}\nfunction broken( {\n")]);
    let graph = coordinator.build().await.unwrap();
    assert!(graph.contains_node("src/bad.ts#ok"));
}

#[tokio::test]
async fn test_empty_workspace() {
    let graph = coordinator(&[]).build().await.unwrap();
    assert!(graph.is_empty());
    assert!(graph.diagnostics().is_empty());
}

#[tokio::test]
async fn test_build_is_deterministic() {
    let files = [
        ("a.ts", "import { b } from './b';\nexport function a() { b(); }\n"),
        ("b.ts", "export function b() {}\n"),
    ];
    let first = coordinator(&files).build().await.unwrap();
    let second = coordinator(&files).build().await.unwrap();
    assert!(first.same_elements(&second));
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[tokio::test]
async fn test_failing_extractor_becomes_diagnostic() {
    let mut registry = ExtractorRegistry::with_defaults();
    registry.register(Arc::new(FailingExtractor));
    let provider = MemorySourceProvider::with_files([("a.broken", "?"), ("ok.ts", "export function ok() {}\n")]);
    let graph = Coordinator::new(Arc::new(provider), registry).build().await.unwrap();

    assert!(graph.contains_node("ok.ts#ok"));
    assert_eq!(
        graph.diagnostics(),
        ["extractor broken failed: parser produced no tree for a.broken"]
    );
}

#[tokio::test]
async fn test_panicking_extractor_becomes_diagnostic() {
    let mut registry = ExtractorRegistry::with_defaults();
    registry.register(Arc::new(PanickingExtractor));
    let provider = MemorySourceProvider::with_files([("x.boom", "!"), ("ok.py", "def ok():\n    pass\n")]);
    let graph = Coordinator::new(Arc::new(provider), registry).build().await.unwrap();

    assert!(graph.contains_node("ok.py#ok"));
    assert_eq!(graph.diagnostics(), ["extractor boom panicked"]);
}

#[tokio::test]
async fn test_unreadable_file_is_skipped() {
    let coordinator = Coordinator::new(Arc::new(GhostProvider), ExtractorRegistry::with_defaults());
    let graph = coordinator.build().await.unwrap();

    assert!(graph.contains_node("real.ts#real"));
    assert_eq!(graph.diagnostics().len(), 1);
    assert!(graph.diagnostics()[0].starts_with("ghost.ts: "));
}

#[tokio::test]
async fn test_for_workspace_walks_filesystem() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let root = temp_dir.path();
    std::fs::create_dir_all(root.join("src")).unwrap();
    std::fs::create_dir_all(root.join("node_modules/dep")).unwrap();
    std::fs::write(root.join("src/a.ts"), "export function a() {}\n").unwrap();
    std::fs::write(root.join("node_modules/dep/index.js"), "function dep() {}\n").unwrap();

    let graph = Coordinator::for_workspace(root).unwrap().build().await.unwrap();
    assert!(graph.contains_node("src/a.ts#a"));
    assert!(!graph.contains_node("node_modules/dep/index.js#dep"));
}

#[tokio::test]
async fn test_missing_workspace_is_an_error() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let coordinator = Coordinator::for_workspace(temp_dir.path().join("gone")).unwrap();
    assert!(coordinator.build().await.is_err());
}
