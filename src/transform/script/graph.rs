//! Relative-import module graph.
//!
//! Each module is parsed once with oxc. Its import/export statements are
//! turned into text edits and an export table that the linker splices into
//! a function-scoped registry. Modules come out in dependency order.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use oxc::allocator::Allocator;
use oxc::ast::ast::{
    Declaration, ExportDefaultDeclarationKind, ImportDeclarationSpecifier, ModuleDeclaration,
    ModuleExportName,
};
use oxc::parser::Parser;
use oxc::span::{GetSpan, SourceType};
use rustc_hash::{FxHashMap, FxHashSet};

use super::ScriptError;
use crate::transform::read_to_string;
use crate::utils::path::{clean, normalize_path, slash_relative};

/// Name of the registry object inside the bundle.
pub const REGISTRY: &str = "__kiln_modules";
/// Name of the per-module export object.
pub const EXPORTS: &str = "__kiln_exports";
/// Binding holding an anonymous default export.
pub const DEFAULT_LOCAL: &str = "__kiln_default";

/// Replace `source[start..end]` with `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

#[derive(Debug)]
pub struct Module {
    pub path: PathBuf,
    /// Registry key, the path relative to the bundle base
    pub key: String,
    pub source: String,
    /// Sorted by `start`, non-overlapping
    pub edits: Vec<Edit>,
    /// `(exported name, JS expression)` in declaration order
    pub exports: Vec<(String, String)>,
    /// Resolved dependencies in import order
    pub deps: Vec<PathBuf>,
}

/// All modules reachable from the entries, dependencies first.
#[derive(Debug)]
pub struct ModuleGraph {
    pub modules: Vec<Module>,
}

impl ModuleGraph {
    /// Parse `entries` and everything they import; keys are relative to `base`.
    pub fn build(entries: &[PathBuf], base: &Path) -> Result<Self, ScriptError> {
        let mut builder = Builder {
            base,
            parsed: FxHashMap::default(),
            visiting: Vec::new(),
            done: FxHashSet::default(),
            order: Vec::new(),
        };
        for entry in entries {
            builder.visit(&normalize_path(entry))?;
        }

        let mut parsed = builder.parsed;
        let modules = builder
            .order
            .iter()
            .filter_map(|path| parsed.remove(path))
            .collect();
        Ok(Self { modules })
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }
}

struct Builder<'b> {
    base: &'b Path,
    parsed: FxHashMap<PathBuf, Module>,
    /// DFS stack, for cycle reporting
    visiting: Vec<PathBuf>,
    done: FxHashSet<PathBuf>,
    order: Vec<PathBuf>,
}

impl Builder<'_> {
    fn visit(&mut self, path: &Path) -> Result<(), ScriptError> {
        if self.done.contains(path) {
            return Ok(());
        }
        if let Some(pos) = self.visiting.iter().position(|p| p == path) {
            let chain: Vec<String> = self.visiting[pos..]
                .iter()
                .map(PathBuf::as_path)
                .chain(std::iter::once(path))
                .map(|p| slash_relative(p, self.base))
                .collect();
            return Err(ScriptError::Cycle(chain.join(" -> ")));
        }

        let module = parse_module(path, self.base)?;
        let deps = module.deps.clone();
        self.parsed.insert(path.to_path_buf(), module);

        self.visiting.push(path.to_path_buf());
        for dep in &deps {
            self.visit(dep)?;
        }
        self.visiting.pop();

        self.done.insert(path.to_path_buf());
        self.order.push(path.to_path_buf());
        Ok(())
    }
}

/// Registry key of `path`.
pub fn key_for(path: &Path, base: &Path) -> String {
    slash_relative(path, base)
}

fn registry_ref(key: &str) -> String {
    format!("{REGISTRY}[{}]", quote(key))
}

fn member(object: &str, name: &str) -> String {
    format!("{object}[{}]", quote(name))
}

/// JSON string literal, valid JS.
pub fn quote(s: &str) -> String {
    serde_json::Value::String(s.to_owned()).to_string()
}

fn export_name(name: &ModuleExportName<'_>) -> String {
    match name {
        ModuleExportName::IdentifierName(ident) => ident.name.to_string(),
        ModuleExportName::IdentifierReference(ident) => ident.name.to_string(),
        ModuleExportName::StringLiteral(lit) => lit.value.to_string(),
    }
}

fn declared_names(decl: &Declaration<'_>) -> Vec<String> {
    match decl {
        Declaration::VariableDeclaration(var) => var
            .declarations
            .iter()
            .flat_map(|d| d.id.get_binding_identifiers())
            .map(|ident| ident.name.to_string())
            .collect(),
        Declaration::FunctionDeclaration(func) => {
            func.id.iter().map(|id| id.name.to_string()).collect()
        }
        Declaration::ClassDeclaration(class) => {
            class.id.iter().map(|id| id.name.to_string()).collect()
        }
        _ => Vec::new(),
    }
}

fn parse_module(path: &Path, base: &Path) -> Result<Module, ScriptError> {
    let source = read_to_string(path)?;
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, &source, SourceType::mjs()).parse();
    if let Some(err) = ret.errors.first() {
        return Err(ScriptError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        });
    }

    let dir = path.parent().unwrap_or(Path::new(""));
    let mut edits = Vec::new();
    let mut exports = Vec::new();
    let mut deps = Vec::new();
    let mut resolve_dep = |request: &str| -> Result<String, ScriptError> {
        let resolved = resolve(dir, request, path)?;
        let key = key_for(&resolved, base);
        deps.push(resolved);
        Ok(registry_ref(&key))
    };

    for stmt in &ret.program.body {
        let Some(module_decl) = stmt.as_module_declaration() else {
            continue;
        };
        match module_decl {
            ModuleDeclaration::ImportDeclaration(import) => {
                let dep = resolve_dep(import.source.value.as_str())?;
                let mut text = String::new();
                for item in import.specifiers.iter().flatten() {
                    let (local, value) = match item {
                        ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => {
                            (s.local.name.to_string(), member(&dep, "default"))
                        }
                        ImportDeclarationSpecifier::ImportNamespaceSpecifier(s) => {
                            (s.local.name.to_string(), dep.clone())
                        }
                        ImportDeclarationSpecifier::ImportSpecifier(s) => {
                            (s.local.name.to_string(), member(&dep, &export_name(&s.imported)))
                        }
                    };
                    if !text.is_empty() {
                        text.push(' ');
                    }
                    text.push_str(&format!("var {local} = {value};"));
                }
                edits.push(edit(import.span.start, import.span.end, text));
            }
            ModuleDeclaration::ExportNamedDeclaration(named) => {
                if let Some(decl) = &named.declaration {
                    // `export const a = 1` keeps the declaration
                    edits.push(edit(named.span.start, decl.span().start, String::new()));
                    exports.extend(declared_names(decl).into_iter().map(|n| (n.clone(), n)));
                } else if let Some(request) = &named.source {
                    let dep = resolve_dep(request.value.as_str())?;
                    edits.push(edit(named.span.start, named.span.end, String::new()));
                    for item in &named.specifiers {
                        let value = member(&dep, &export_name(&item.local));
                        exports.push((export_name(&item.exported), value));
                    }
                } else {
                    edits.push(edit(named.span.start, named.span.end, String::new()));
                    for item in &named.specifiers {
                        exports.push((export_name(&item.exported), export_name(&item.local)));
                    }
                }
            }
            ModuleDeclaration::ExportDefaultDeclaration(default) => {
                let inner = default.declaration.span();
                let named_local = match &default.declaration {
                    ExportDefaultDeclarationKind::FunctionDeclaration(func) => {
                        func.id.as_ref().map(|id| id.name.to_string())
                    }
                    ExportDefaultDeclarationKind::ClassDeclaration(class) => {
                        class.id.as_ref().map(|id| id.name.to_string())
                    }
                    _ => None,
                };
                match named_local {
                    Some(local) => {
                        edits.push(edit(default.span.start, inner.start, String::new()));
                        exports.push(("default".to_owned(), local));
                    }
                    None => {
                        edits.push(edit(
                            default.span.start,
                            inner.start,
                            format!("var {DEFAULT_LOCAL} = "),
                        ));
                        if !source[..default.span.end as usize].ends_with(';') {
                            edits.push(edit(default.span.end, default.span.end, ";".to_owned()));
                        }
                        exports.push(("default".to_owned(), DEFAULT_LOCAL.to_owned()));
                    }
                }
            }
            ModuleDeclaration::ExportAllDeclaration(all) => {
                let dep = resolve_dep(all.source.value.as_str())?;
                match &all.exported {
                    Some(alias) => {
                        edits.push(edit(all.span.start, all.span.end, String::new()));
                        exports.push((export_name(alias), dep));
                    }
                    None => edits.push(edit(
                        all.span.start,
                        all.span.end,
                        format!("__kiln_star({EXPORTS}, {dep});"),
                    )),
                }
            }
            _ => {}
        }
    }

    edits.sort_by_key(|e| e.start);
    Ok(Module {
        path: path.to_path_buf(),
        key: key_for(path, base),
        source: source.clone(),
        edits,
        exports,
        deps,
    })
}

fn edit(start: u32, end: u32, text: String) -> Edit {
    Edit {
        start: start as usize,
        end: end as usize,
        text,
    }
}

/// Resolve a relative specifier with `.js`, `.mjs` and `/index.js` fallbacks.
fn resolve(dir: &Path, request: &str, from: &Path) -> Result<PathBuf, ScriptError> {
    let relative = request == "."
        || request == ".."
        || request.starts_with("./")
        || request.starts_with("../");
    if !relative {
        return Err(ScriptError::BareSpecifier {
            specifier: request.to_owned(),
            from: from.to_path_buf(),
        });
    }

    let target = clean(&dir.join(request));
    let with_suffix = |suffix: &str| {
        let mut s = OsString::from(target.as_os_str());
        s.push(suffix);
        PathBuf::from(s)
    };
    [
        target.clone(),
        with_suffix(".js"),
        with_suffix(".mjs"),
        target.join("index.js"),
    ]
    .into_iter()
    .find(|candidate| candidate.is_file())
    .map(|found| normalize_path(&found))
    .ok_or_else(|| ScriptError::Unresolved {
        specifier: request.to_owned(),
        from: from.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::test_support::write;

    #[test]
    fn test_dependency_order_and_dedup() {
        let dir = tempfile::tempdir().unwrap();
        let root = normalize_path(dir.path());
        write(&root, "js/main.js", "import { add } from './lib/math';\nimport './lib/log.js';\nadd(1, 2);\n");
        write(&root, "js/lib/math.js", "import { log } from './log';\nexport function add(a, b) { log(a); return a + b; }\n");
        write(&root, "js/lib/log.js", "export const log = (x) => x;\n");

        let base = root.join("js");
        let entries = vec![
            base.join("lib/log.js"),
            base.join("lib/math.js"),
            base.join("main.js"),
        ];
        let graph = ModuleGraph::build(&entries, &base).unwrap();
        let keys: Vec<_> = graph.modules.iter().map(|m| m.key.as_str()).collect();
        assert_eq!(keys, vec!["lib/log.js", "lib/math.js", "main.js"]);
    }

    #[test]
    fn test_edits_and_exports() {
        let dir = tempfile::tempdir().unwrap();
        let root = normalize_path(dir.path());
        write(&root, "js/dep.js", "export default 42\n");
        write(
            &root,
            "js/a.js",
            "import d, { x as y } from \"./dep\";\nexport const a = 1, b = 2;\nexport { y as z };\nexport default function main() {}\n",
        );

        let base = root.join("js");
        let graph = ModuleGraph::build(&[base.join("a.js")], &base).unwrap();
        assert_eq!(graph.len(), 2);

        let dep = &graph.modules[0];
        assert_eq!(dep.exports, vec![("default".to_owned(), DEFAULT_LOCAL.to_owned())]);
        assert!(dep.edits.iter().any(|e| e.text == ";"));

        let a = &graph.modules[1];
        assert_eq!(
            a.edits[0].text,
            "var d = __kiln_modules[\"dep.js\"][\"default\"]; var y = __kiln_modules[\"dep.js\"][\"x\"];"
        );
        assert_eq!(
            a.exports,
            vec![
                ("a".to_owned(), "a".to_owned()),
                ("b".to_owned(), "b".to_owned()),
                ("z".to_owned(), "y".to_owned()),
                ("default".to_owned(), "main".to_owned()),
            ]
        );
    }

    #[test]
    fn test_index_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let root = normalize_path(dir.path());
        write(&root, "js/main.js", "import * as ui from './ui';\n");
        write(&root, "js/ui/index.js", "export const button = 1;\n");

        let base = root.join("js");
        let graph = ModuleGraph::build(&[base.join("main.js")], &base).unwrap();
        assert_eq!(graph.modules[0].key, "ui/index.js");
    }

    #[test]
    fn test_bare_specifier_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let root = normalize_path(dir.path());
        write(&root, "js/main.js", "import React from 'react';\n");
        let base = root.join("js");
        let err = ModuleGraph::build(&[base.join("main.js")], &base).unwrap_err();
        assert!(matches!(err, ScriptError::BareSpecifier { .. }));
    }

    #[test]
    fn test_cycle_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let root = normalize_path(dir.path());
        write(&root, "js/a.js", "import './b.js';\n");
        write(&root, "js/b.js", "import './a.js';\n");
        let base = root.join("js");
        let err = ModuleGraph::build(&[base.join("a.js")], &base).unwrap_err();
        assert_eq!(err.to_string(), "import cycle: a.js -> b.js -> a.js");
    }

    #[test]
    fn test_parse_error_names_file() {
        let dir = tempfile::tempdir().unwrap();
        let root = normalize_path(dir.path());
        write(&root, "js/bad.js", "const = ;\n");
        let base = root.join("js");
        let err = ModuleGraph::build(&[base.join("bad.js")], &base).unwrap_err();
        assert!(matches!(err, ScriptError::Parse { ref path, .. } if path.ends_with("bad.js")));
    }
}
