//! Splice a [`ModuleGraph`] into one script.
//!
//! ```js
//! (function () {
//! "use strict";
//! var __kiln_modules = {};
//! // helpers...
//! __kiln_modules["lib/math.js"] = (function () {
//!   var __kiln_exports = {};
//!   __kiln_export(__kiln_exports, { "add": function () { return add; } });
//!   function add(a, b) { return a + b; }
//!   return __kiln_exports;
//! })();
//! // ...one block per module, dependencies first
//! })();
//! ```
//!
//! Exports are getters, so a module's exports read its live bindings.
//! Imports are bound once when the importing module runs.

use super::graph::{EXPORTS, Module, ModuleGraph, REGISTRY, quote};

const HELPERS: &str = r#"function __kiln_export(target, getters) {
  for (var name in getters) {
    Object.defineProperty(target, name, { enumerable: true, get: getters[name] });
  }
}
function __kiln_star(target, source) {
  Object.keys(source).forEach(function (name) {
    if (name !== "default" && !Object.prototype.hasOwnProperty.call(target, name)) {
      Object.defineProperty(target, name, { enumerable: true, get: function () { return source[name]; } });
    }
  });
}
"#;

/// One script evaluating every module of `graph` in order.
pub fn link(graph: &ModuleGraph) -> String {
    let mut out = String::from("(function () {\n\"use strict\";\n");
    out.push_str(&format!("var {REGISTRY} = {{}};\n"));
    out.push_str(HELPERS);
    for module in &graph.modules {
        link_module(&mut out, module);
    }
    out.push_str("})();\n");
    out
}

fn link_module(out: &mut String, module: &Module) {
    out.push_str(&format!(
        "{REGISTRY}[{}] = (function () {{\nvar {EXPORTS} = {{}};\n",
        quote(&module.key)
    ));

    if !module.exports.is_empty() {
        let getters: Vec<String> = module
            .exports
            .iter()
            .map(|(name, expr)| format!("{}: function () {{ return {expr}; }}", quote(name)))
            .collect();
        out.push_str(&format!("__kiln_export({EXPORTS}, {{ {} }});\n", getters.join(", ")));
    }

    out.push_str(&apply_edits(&module.source, module));
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(&format!("return {EXPORTS};\n}})();\n"));
}

fn apply_edits(source: &str, module: &Module) -> String {
    let mut body = String::with_capacity(source.len());
    let mut last = 0;
    for edit in &module.edits {
        body.push_str(&source[last..edit.start]);
        body.push_str(&edit.text);
        last = edit.end;
    }
    body.push_str(&source[last..]);
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::script::graph::Edit;
    use std::path::PathBuf;

    fn module(key: &str, source: &str, edits: Vec<Edit>, exports: &[(&str, &str)]) -> Module {
        Module {
            path: PathBuf::from(key),
            key: key.to_owned(),
            source: source.to_owned(),
            edits,
            exports: exports
                .iter()
                .map(|(n, e)| ((*n).to_owned(), (*e).to_owned()))
                .collect(),
            deps: Vec::new(),
        }
    }

    #[test]
    fn test_link_applies_edits_in_order() {
        let source = "export const a = 1;\nexport { a as b };\n";
        let edits = vec![
            Edit { start: 0, end: 7, text: String::new() },
            Edit { start: 20, end: 38, text: String::new() },
        ];
        let graph = ModuleGraph {
            modules: vec![module("a.js", source, edits, &[("a", "a"), ("b", "a")])],
        };

        let code = link(&graph);
        assert!(code.starts_with("(function () {\n\"use strict\";\nvar __kiln_modules = {};\n"));
        assert!(code.contains(
            "__kiln_modules[\"a.js\"] = (function () {\nvar __kiln_exports = {};\n\
             __kiln_export(__kiln_exports, { \"a\": function () { return a; }, \"b\": function () { return a; } });\n\
             const a = 1;\n\nreturn __kiln_exports;\n})();\n"
        ));
        assert!(code.ends_with("})();\n"));
    }

    #[test]
    fn test_module_without_exports() {
        let graph = ModuleGraph {
            modules: vec![module("main.js", "run()", Vec::new(), &[])],
        };
        let code = link(&graph);
        assert!(!code.contains("__kiln_export(__kiln_exports"));
        assert!(code.contains("run()\nreturn __kiln_exports;"));
    }
}
