//! Runtime for the `babelHelpers.*` calls that lowering leaves behind.
//!
//! The bundle is a single classic script, so helpers cannot be imported.
//! Every helper the lowered code references is defined on a local
//! `babelHelpers` object ahead of the bundle, together with the helpers
//! it depends on.

use std::sync::LazyLock;

use regex::Regex;

use super::ScriptError;

static RE_HELPER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"babelHelpers\.([A-Za-z_$][A-Za-z0-9_$]*)").unwrap());

struct Helper {
    name: &'static str,
    deps: &'static [&'static str],
    body: &'static str,
}

const fn helper(name: &'static str, deps: &'static [&'static str], body: &'static str) -> Helper {
    Helper { name, deps, body }
}

// ES5 only: these run unlowered.
static HELPERS: &[Helper] = &[
    helper(
        "typeof",
        &[],
        r#"babelHelpers.typeof = function (o) {
  return typeof Symbol == "function" && typeof Symbol.iterator == "symbol" ? typeof o : o && typeof Symbol == "function" && o.constructor === Symbol && o !== Symbol.prototype ? "symbol" : typeof o;
};"#,
    ),
    helper(
        "toPrimitive",
        &["typeof"],
        r#"babelHelpers.toPrimitive = function (t, r) {
  if (babelHelpers.typeof(t) != "object" || !t) return t;
  var e = typeof Symbol == "function" ? t[Symbol.toPrimitive] : void 0;
  if (e !== void 0) {
    var i = e.call(t, r || "default");
    if (babelHelpers.typeof(i) != "object") return i;
    throw new TypeError("@@toPrimitive must return a primitive value.");
  }
  return (r === "string" ? String : Number)(t);
};"#,
    ),
    helper(
        "toPropertyKey",
        &["toPrimitive", "typeof"],
        r#"babelHelpers.toPropertyKey = function (t) {
  var i = babelHelpers.toPrimitive(t, "string");
  return babelHelpers.typeof(i) == "symbol" ? i : i + "";
};"#,
    ),
    helper(
        "defineProperty",
        &["toPropertyKey"],
        r#"babelHelpers.defineProperty = function (e, r, t) {
  r = babelHelpers.toPropertyKey(r);
  if (r in e) Object.defineProperty(e, r, { value: t, enumerable: true, configurable: true, writable: true });
  else e[r] = t;
  return e;
};"#,
    ),
    helper(
        "ownKeys",
        &[],
        r#"babelHelpers.ownKeys = function (e, r) {
  var t = Object.keys(e);
  if (Object.getOwnPropertySymbols) {
    var o = Object.getOwnPropertySymbols(e);
    if (r) o = o.filter(function (k) { return Object.getOwnPropertyDescriptor(e, k).enumerable; });
    t.push.apply(t, o);
  }
  return t;
};"#,
    ),
    helper(
        "objectSpread2",
        &["ownKeys", "defineProperty"],
        r#"babelHelpers.objectSpread2 = function (e) {
  for (var i = 1; i < arguments.length; i++) {
    var t = arguments[i] != null ? arguments[i] : {};
    if (i % 2) babelHelpers.ownKeys(Object(t), true).forEach(function (k) { babelHelpers.defineProperty(e, k, t[k]); });
    else if (Object.getOwnPropertyDescriptors) Object.defineProperties(e, Object.getOwnPropertyDescriptors(t));
    else babelHelpers.ownKeys(Object(t)).forEach(function (k) { Object.defineProperty(e, k, Object.getOwnPropertyDescriptor(t, k)); });
  }
  return e;
};"#,
    ),
    helper(
        "extends",
        &[],
        r#"babelHelpers.extends = Object.assign ? Object.assign.bind() : function (n) {
  for (var i = 1; i < arguments.length; i++) {
    var t = arguments[i];
    for (var k in t) if ({}.hasOwnProperty.call(t, k)) n[k] = t[k];
  }
  return n;
};"#,
    ),
    helper(
        "objectWithoutPropertiesLoose",
        &[],
        r#"babelHelpers.objectWithoutPropertiesLoose = function (r, e) {
  if (r == null) return {};
  var t = {};
  for (var n in r) if ({}.hasOwnProperty.call(r, n)) {
    if (e.indexOf(n) !== -1) continue;
    t[n] = r[n];
  }
  return t;
};"#,
    ),
    helper(
        "objectWithoutProperties",
        &["objectWithoutPropertiesLoose"],
        r#"babelHelpers.objectWithoutProperties = function (e, t) {
  if (e == null) return {};
  var o, r, i = babelHelpers.objectWithoutPropertiesLoose(e, t);
  if (Object.getOwnPropertySymbols) {
    var n = Object.getOwnPropertySymbols(e);
    for (r = 0; r < n.length; r++) {
      o = n[r];
      if (t.indexOf(o) === -1 && {}.propertyIsEnumerable.call(e, o)) i[o] = e[o];
    }
  }
  return i;
};"#,
    ),
    helper(
        "objectDestructuringEmpty",
        &[],
        r#"babelHelpers.objectDestructuringEmpty = function (t) {
  if (t == null) throw new TypeError("Cannot destructure " + t);
};"#,
    ),
    helper(
        "asyncGeneratorStep",
        &[],
        r#"babelHelpers.asyncGeneratorStep = function (g, resolve, reject, next, thrw, key, arg) {
  try {
    var info = g[key](arg), value = info.value;
  } catch (err) {
    reject(err);
    return;
  }
  if (info.done) resolve(value);
  else Promise.resolve(value).then(next, thrw);
};"#,
    ),
    helper(
        "asyncToGenerator",
        &["asyncGeneratorStep"],
        r#"babelHelpers.asyncToGenerator = function (fn) {
  return function () {
    var self = this, args = arguments;
    return new Promise(function (resolve, reject) {
      var g = fn.apply(self, args);
      function next(v) { babelHelpers.asyncGeneratorStep(g, resolve, reject, next, thrw, "next", v); }
      function thrw(e) { babelHelpers.asyncGeneratorStep(g, resolve, reject, next, thrw, "throw", e); }
      next(void 0);
    });
  };
};"#,
    ),
    helper(
        "checkPrivateRedeclaration",
        &[],
        r#"babelHelpers.checkPrivateRedeclaration = function (e, t) {
  if (t.has(e)) throw new TypeError("Cannot initialize the same private elements twice on an object");
};"#,
    ),
    helper(
        "classPrivateFieldInitSpec",
        &["checkPrivateRedeclaration"],
        r#"babelHelpers.classPrivateFieldInitSpec = function (e, t, a) {
  babelHelpers.checkPrivateRedeclaration(e, t);
  t.set(e, a);
};"#,
    ),
    helper(
        "classPrivateMethodInitSpec",
        &["checkPrivateRedeclaration"],
        r#"babelHelpers.classPrivateMethodInitSpec = function (e, a) {
  babelHelpers.checkPrivateRedeclaration(e, a);
  a.add(e);
};"#,
    ),
    helper(
        "assertClassBrand",
        &[],
        r#"babelHelpers.assertClassBrand = function (e, t, n) {
  if (typeof e == "function" ? e === t : e.has(t)) return arguments.length < 3 ? t : n;
  throw new TypeError("Private element is not present on this object");
};"#,
    ),
    helper(
        "classPrivateFieldGet2",
        &["assertClassBrand"],
        r#"babelHelpers.classPrivateFieldGet2 = function (s, a) {
  return s.get(babelHelpers.assertClassBrand(s, a));
};"#,
    ),
    helper(
        "classPrivateFieldSet2",
        &["assertClassBrand"],
        r#"babelHelpers.classPrivateFieldSet2 = function (s, a, r) {
  s.set(babelHelpers.assertClassBrand(s, a), r);
  return r;
};"#,
    ),
    helper(
        "toSetter",
        &[],
        r#"babelHelpers.toSetter = function (t, e, n) {
  e || (e = []);
  var r = e.length++;
  return Object.defineProperty({}, "_", { set: function (o) { e[r] = o; t.apply(n, e); } });
};"#,
    ),
    helper(
        "classPrivateFieldLooseKey",
        &[],
        r#"babelHelpers.classPrivateFieldLooseKey = (function () {
  var id = 0;
  return function (e) { return "__private_" + id++ + "_" + e; };
})();"#,
    ),
    helper(
        "classPrivateFieldLooseBase",
        &[],
        r#"babelHelpers.classPrivateFieldLooseBase = function (e, t) {
  if (!{}.hasOwnProperty.call(e, t)) throw new TypeError("attempted to use private field on non-instance");
  return e;
};"#,
    ),
    helper(
        "checkInRHS",
        &["typeof"],
        r#"babelHelpers.checkInRHS = function (e) {
  if (Object(e) !== e) throw new TypeError("right-hand side of 'in' should be an object, got " + (e !== null ? babelHelpers.typeof(e) : "null"));
  return e;
};"#,
    ),
    helper(
        "readOnlyError",
        &[],
        r#"babelHelpers.readOnlyError = function (r) {
  throw new TypeError('"' + r + '" is read-only');
};"#,
    ),
    helper(
        "writeOnlyError",
        &[],
        r#"babelHelpers.writeOnlyError = function (r) {
  throw new TypeError('"' + r + '" is write-only');
};"#,
    ),
    helper(
        "getPrototypeOf",
        &[],
        r#"babelHelpers.getPrototypeOf = function (t) {
  return Object.getPrototypeOf(t);
};"#,
    ),
    helper(
        "superPropBase",
        &["getPrototypeOf"],
        r#"babelHelpers.superPropBase = function (t, o) {
  while (!{}.hasOwnProperty.call(t, o) && (t = babelHelpers.getPrototypeOf(t)) !== null);
  return t;
};"#,
    ),
    helper(
        "get",
        &["superPropBase"],
        r#"babelHelpers.get = function (e, t, r) {
  if (typeof Reflect != "undefined" && Reflect.get) return Reflect.get(e, t, r);
  var p = babelHelpers.superPropBase(e, t);
  if (!p) return;
  var n = Object.getOwnPropertyDescriptor(p, t);
  return n.get ? n.get.call(arguments.length < 3 ? e : r) : n.value;
};"#,
    ),
    helper(
        "superPropGet",
        &["get", "getPrototypeOf"],
        r#"babelHelpers.superPropGet = function (t, o, e, r) {
  var p = babelHelpers.get(babelHelpers.getPrototypeOf(r & 1 ? t.prototype : t), o, e);
  return r & 2 && typeof p == "function" ? function (a) { return p.apply(e, a); } : p;
};"#,
    ),
    helper(
        "set",
        &["superPropBase"],
        r#"babelHelpers.set = function (e, t, r, o, f) {
  var s;
  if (typeof Reflect != "undefined" && Reflect.set) s = Reflect.set(e, t, r, o);
  else {
    var p = babelHelpers.superPropBase(e, t), n = p ? Object.getOwnPropertyDescriptor(p, t) : void 0;
    if (n && n.set) { n.set.call(o, r); s = true; }
    else if (n && !n.writable) s = false;
    else { o[t] = r; s = true; }
  }
  if (!s && f) throw new TypeError("failed to set property");
  return r;
};"#,
    ),
    helper(
        "superPropSet",
        &["set", "getPrototypeOf"],
        r#"babelHelpers.superPropSet = function (t, e, o, r, p, f) {
  return babelHelpers.set(babelHelpers.getPrototypeOf(f ? t.prototype : t), e, o, r, p);
};"#,
    ),
    helper(
        "taggedTemplateLiteral",
        &[],
        r#"babelHelpers.taggedTemplateLiteral = function (e, t) {
  if (!t) t = e.slice(0);
  return Object.freeze(Object.defineProperties(e, { raw: { value: Object.freeze(t) } }));
};"#,
    ),
];

fn find(name: &str) -> Option<usize> {
    HELPERS.iter().position(|h| h.name == name)
}

/// Definitions for every helper `code` references, or `None` if it uses none.
///
/// Fails on helpers with no bundled definition.
pub fn prelude(code: &str) -> Result<Option<String>, ScriptError> {
    let mut needed = vec![false; HELPERS.len()];
    let mut stack = Vec::new();
    let mut missing = Vec::new();

    for name in RE_HELPER.captures_iter(code).filter_map(|c| c.get(1)) {
        let name = name.as_str();
        match find(name) {
            Some(i) => stack.push(i),
            None if !missing.contains(&name) => missing.push(name),
            None => {}
        }
    }
    if !missing.is_empty() {
        let names: Vec<String> = missing.iter().map(|n| format!("`{n}`")).collect();
        return Err(ScriptError::Transform(format!(
            "syntax needs helper {} which has no bundled runtime; raise `scripts.target` to keep it native",
            names.join(", ")
        )));
    }

    while let Some(i) = stack.pop() {
        if std::mem::replace(&mut needed[i], true) {
            continue;
        }
        stack.extend(HELPERS[i].deps.iter().filter_map(|d| find(d)));
    }
    if !needed.contains(&true) {
        return Ok(None);
    }

    let mut out = String::from("var babelHelpers = {};\n");
    for (helper, _) in HELPERS.iter().zip(&needed).filter(|(_, n)| **n) {
        out.push_str(helper.body);
        out.push('\n');
    }
    Ok(Some(out))
}
