//! Module specifier rewriting in JavaScript files.
//!
//! Files are parsed with swc to find every specifier string literal in
//! import declarations, re-exports, `require("x")` calls and `import("x")`
//! calls. Rewrites are spliced into the original text at each literal's
//! span, so everything outside the rewritten literals stays byte-identical.

use super::entries::EntryMap;
use super::specifier::split_package_specifier;
use crate::error::Error;
use std::path::Path;
use swc_common::{sync::Lrc, FileName, SourceMap, Span};
use swc_ecma_ast::{
    CallExpr, Callee, EsVersion, ExportAll, Expr, ImportDecl, Lit, NamedExport, Program, Str,
};
use swc_ecma_parser::{lexer::Lexer, EsSyntax, Parser, StringInput, Syntax};
use swc_ecma_visit::{Visit, VisitWith};

/// Whether a package file is a script whose specifiers are rewritten.
#[must_use]
pub fn is_script_file(rel: &str) -> bool {
    rel.ends_with(".js") || rel.ends_with(".cjs") || rel.ends_with(".mjs")
}

/// How a script file is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptKind {
    /// ES module (`.mjs`).
    Module,
    /// CommonJS script (`.cjs`).
    Script,
    /// Module or script, decided by the parser (`.js`).
    Auto,
}

impl ScriptKind {
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("mjs") => Self::Module,
            Some("cjs") => Self::Script,
            _ => Self::Auto,
        }
    }
}

/// A specifier string literal and where it sits in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecifierLiteral {
    /// Decoded specifier value.
    pub value: String,
    /// Byte range of the literal, quotes included.
    pub start: usize,
    pub end: usize,
}

/// A module reference found in a script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleReference {
    /// `import x from "spec"` or `import "spec"`
    Import(SpecifierLiteral),
    /// `export { x } from "spec"` or `export * from "spec"`
    ReExport(SpecifierLiteral),
    /// `require("spec")`
    Require(SpecifierLiteral),
    /// `import("spec")`
    DynamicImport(SpecifierLiteral),
}

impl ModuleReference {
    #[must_use]
    pub fn literal(&self) -> &SpecifierLiteral {
        match self {
            Self::Import(lit)
            | Self::ReExport(lit)
            | Self::Require(lit)
            | Self::DynamicImport(lit) => lit,
        }
    }
}

/// Collects module references in document order.
struct ReferenceCollector {
    /// Start position of the source file in the source map.
    base: u32,
    /// Bytes stripped from the front of the source before parsing.
    shift: usize,
    references: Vec<ModuleReference>,
}

impl ReferenceCollector {
    fn literal(&self, s: &Str) -> SpecifierLiteral {
        SpecifierLiteral {
            value: s.value.to_string(),
            start: self.offset(s.span, true),
            end: self.offset(s.span, false),
        }
    }

    fn offset(&self, span: Span, start: bool) -> usize {
        let pos = if start { span.lo.0 } else { span.hi.0 };
        pos.saturating_sub(self.base) as usize + self.shift
    }
}

/// First argument of a call, if it is a plain string literal.
fn string_arg(call: &CallExpr) -> Option<&Str> {
    let first = call.args.first()?;
    if first.spread.is_some() {
        return None;
    }
    match &*first.expr {
        Expr::Lit(Lit::Str(s)) => Some(s),
        _ => None,
    }
}

impl Visit for ReferenceCollector {
    fn visit_import_decl(&mut self, n: &ImportDecl) {
        let lit = self.literal(&n.src);
        self.references.push(ModuleReference::Import(lit));
    }

    fn visit_named_export(&mut self, n: &NamedExport) {
        if let Some(src) = &n.src {
            let lit = self.literal(src);
            self.references.push(ModuleReference::ReExport(lit));
        }
    }

    fn visit_export_all(&mut self, n: &ExportAll) {
        let lit = self.literal(&n.src);
        self.references.push(ModuleReference::ReExport(lit));
    }

    fn visit_call_expr(&mut self, n: &CallExpr) {
        match &n.callee {
            Callee::Import(_) => {
                if let Some(s) = string_arg(n) {
                    let lit = self.literal(s);
                    self.references.push(ModuleReference::DynamicImport(lit));
                }
            }
            Callee::Expr(callee) => {
                let is_require = matches!(&**callee, Expr::Ident(id) if &*id.sym == "require");
                if is_require && n.args.len() == 1 {
                    if let Some(s) = string_arg(n) {
                        let lit = self.literal(s);
                        self.references.push(ModuleReference::Require(lit));
                    }
                }
            }
            Callee::Super(_) => {}
        }

        // Calls nest: require(a)(require(b)), foo(import(c))
        n.visit_children_with(self);
    }
}

/// Parse a script and list its module references in document order.
pub fn collect_references(
    path: &Path,
    source: &str,
    kind: ScriptKind,
) -> Result<Vec<ModuleReference>, Error> {
    let parse_error = |message: String| Error::ScriptParse {
        path: path.to_path_buf(),
        message,
    };

    // Offsets index into `source`, so a leading BOM is parsed away and added back
    let (shift, text) = match source.strip_prefix('\u{feff}') {
        Some(rest) => ('\u{feff}'.len_utf8(), rest),
        None => (0, source),
    };

    let cm: Lrc<SourceMap> = Default::default();
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("input.js");
    let fm = cm.new_source_file(
        Lrc::new(FileName::Custom(file_name.to_string())),
        text.to_string(),
    );

    let syntax = Syntax::Es(EsSyntax {
        allow_return_outside_function: kind != ScriptKind::Module,
        import_attributes: true,
        ..Default::default()
    });
    let lexer = Lexer::new(syntax, EsVersion::EsNext, StringInput::from(&*fm), None);
    let mut parser = Parser::new_from(lexer);

    let program = match kind {
        ScriptKind::Module => parser.parse_module().map(Program::Module),
        ScriptKind::Script => parser.parse_script().map(Program::Script),
        ScriptKind::Auto => parser.parse_program(),
    }
    .map_err(|e| parse_error(format!("{:?}", e.kind())))?;

    let errors: Vec<String> = parser
        .take_errors()
        .into_iter()
        .map(|e| format!("{:?}", e.kind()))
        .collect();
    if !errors.is_empty() {
        return Err(parse_error(errors.join(", ")));
    }

    let mut collector = ReferenceCollector {
        base: fm.start_pos.0,
        shift,
        references: Vec::new(),
    };
    program.visit_with(&mut collector);

    let mut references = collector.references;
    references.sort_by_key(|r| r.literal().start);
    Ok(references)
}

/// Specifier after renaming, or `None` if it names no planned package.
fn patched_specifier(spec: &str, entries: &EntryMap) -> Option<String> {
    let (name, suffix) = split_package_specifier(spec)?;
    let entry = entries.get(name)?;
    Some(format!("{}{suffix}", entry.patched_name))
}

/// Quote a specifier with the quote character the literal used.
fn quote(value: &str, quote: char) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push(quote);
    for ch in value.chars() {
        if ch == '\\' || ch == quote {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push(quote);
    out
}

/// Result of rewriting a script that changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptRewrite {
    pub source: String,
    /// Number of specifiers replaced.
    pub rewrites: usize,
}

/// Rewrite the specifiers of a script that name planned packages.
///
/// Returns `None` when no specifier changed.
pub fn rewrite_script_source(
    path: &Path,
    source: &str,
    entries: &EntryMap,
) -> Result<Option<ScriptRewrite>, Error> {
    let references = collect_references(path, source, ScriptKind::from_path(path))?;

    let mut out = String::with_capacity(source.len());
    let mut cursor = 0;
    let mut rewrites = 0;

    for reference in &references {
        let lit = reference.literal();
        let Some(patched) = patched_specifier(&lit.value, entries) else {
            continue;
        };
        let Some(raw) = source.get(lit.start..lit.end) else {
            continue;
        };
        if lit.start < cursor {
            continue;
        }

        let quote_char = raw.chars().next().filter(|c| *c == '\'').unwrap_or('"');
        out.push_str(&source[cursor..lit.start]);
        out.push_str(&quote(&patched, quote_char));
        cursor = lit.end;
        rewrites += 1;
    }

    if rewrites == 0 {
        return Ok(None);
    }

    out.push_str(&source[cursor..]);
    Ok(Some(ScriptRewrite {
        source: out,
        rewrites,
    }))
}

/// Rewrite a script file in place.
///
/// The file is written only if a specifier changed. Returns the number of
/// specifiers replaced.
pub fn patch_script(path: &Path, entries: &EntryMap) -> Result<usize, Error> {
    let source = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;

    match rewrite_script_source(path, &source, entries)? {
        Some(rewrite) => {
            rescope_util::fs::atomic_write(path, rewrite.source.as_bytes())
                .map_err(|e| Error::io(path, e))?;
            Ok(rewrite.rewrites)
        }
        None => Ok(0),
    }
}
