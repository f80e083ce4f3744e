//! A toy compiler with a real language-service shape.
//!
//! "Compilation" strips `: Type` annotations. The checker knows two rules:
//! unbalanced braces are a syntax error, and a string literal assigned to a
//! `number`-annotated binding is a type error reported at the binding name.

use parking_lot::Mutex;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tscache_config::CompilerOptions;
use tscache_diagnostics::{DiagnosticFile, MessageChain, RawDiagnostic, Severity};
use tscache_service::{
    Compiler, EmitOutput, LanguageService, LanguageServiceHost, ModuleResolutionHost, OutputFile,
    ResolvedModule, TranspileOutput, TranspileRequest,
};
use tscache_source::utf16_offset;

/// Code of the unbalanced-brace diagnostic.
pub const UNBALANCED_BRACES: u32 = 1005;
/// Code of the string-to-number diagnostic.
pub const NOT_ASSIGNABLE: u32 = 2322;

/// Invocation counts shared by a [`FakeCompiler`] and its services.
#[derive(Debug, Default)]
pub struct CompilerCounters {
    /// Calls to `transpile_module`.
    pub transpiles: AtomicUsize,
    /// Calls to `emit_output`.
    pub emits: AtomicUsize,
    /// Calls to `semantic_diagnostics`.
    pub checks: AtomicUsize,
    /// Modules resolved through the host, as `(module name, resolved name)`.
    pub resolutions: Mutex<Vec<(String, String)>>,
    /// Number of transform plugins handed to each transpile.
    pub transformer_counts: Mutex<Vec<usize>>,
}

impl CompilerCounters {
    /// Total compiler work performed: transpiles plus emits.
    pub fn compiles(&self) -> usize {
        self.transpiles.load(Ordering::SeqCst) + self.emits.load(Ordering::SeqCst)
    }

    /// Number of semantic checks.
    pub fn checks(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }
}

/// The toy compiler.
#[derive(Debug, Clone, Default)]
pub struct FakeCompiler {
    counters: Arc<CompilerCounters>,
    options_diagnostics: Vec<String>,
    case_sensitive: bool,
    malformed_transpile_map: bool,
}

impl FakeCompiler {
    /// A compiler on a case-sensitive filesystem.
    pub fn new() -> Self {
        Self {
            case_sensitive: true,
            ..Self::default()
        }
    }

    /// Reports `message` as a global compiler-options error on every check.
    pub fn with_options_error(mut self, message: &str) -> Self {
        self.options_diagnostics.push(message.to_string());
        self
    }

    /// Makes `transpile_module` return source map text that is not JSON.
    pub fn with_malformed_transpile_map(mut self) -> Self {
        self.malformed_transpile_map = true;
        self
    }

    /// Pretends the filesystem ignores case.
    pub fn case_insensitive(mut self) -> Self {
        self.case_sensitive = false;
        self
    }

    /// Shared invocation counters.
    pub fn counters(&self) -> Arc<CompilerCounters> {
        Arc::clone(&self.counters)
    }
}

impl Compiler for FakeCompiler {
    fn create_language_service(&self) -> Box<dyn LanguageService> {
        Box::new(FakeService {
            counters: Arc::clone(&self.counters),
            options_diagnostics: self.options_diagnostics.clone(),
        })
    }

    fn transpile_module(&self, request: TranspileRequest<'_>) -> TranspileOutput {
        self.counters.transpiles.fetch_add(1, Ordering::SeqCst);
        self.counters
            .transformer_counts
            .lock()
            .push(request.transformers.before.len() + request.transformers.after.len());
        let source_map_text = if self.malformed_transpile_map {
            Some("{ not json".to_string())
        } else {
            request
                .compiler_options
                .source_map
                .then(|| raw_source_map("module.js", "module.ts"))
        };
        TranspileOutput {
            output_text: strip_types(request.source),
            source_map_text,
        }
    }

    fn resolve_module_name(
        &self,
        module_name: &str,
        containing_file: &str,
        _options: &CompilerOptions,
        host: &dyn ModuleResolutionHost,
    ) -> Option<ResolvedModule> {
        let directory = Path::new(containing_file).parent()?;
        let relative = module_name.strip_prefix("./")?;
        let candidate = directory.join(format!("{relative}.ts"));
        let candidate = candidate.to_string_lossy().into_owned();
        host.file_exists(&candidate).then(|| ResolvedModule {
            resolved_file_name: candidate,
            extension: ".ts".to_string(),
            is_external_library_import: false,
            package_id: None,
        })
    }

    fn default_lib_file_name(&self, _options: &CompilerOptions) -> String {
        "/lib/lib.d.ts".to_string()
    }

    fn use_case_sensitive_file_names(&self) -> bool {
        self.case_sensitive
    }
}

struct FakeService {
    counters: Arc<CompilerCounters>,
    options_diagnostics: Vec<String>,
}

impl FakeService {
    fn source(host: &dyn LanguageServiceHost, file_name: &str) -> Arc<str> {
        host.script_snapshot(file_name).unwrap_or_else(|| Arc::from(""))
    }
}

impl LanguageService for FakeService {
    fn emit_output(&mut self, host: &dyn LanguageServiceHost, file_name: &str) -> EmitOutput {
        self.counters.emits.fetch_add(1, Ordering::SeqCst);
        let source = Self::source(host, file_name);
        let stem = file_name.strip_suffix(".ts").unwrap_or(file_name);
        let js_name = format!("{stem}.js");
        let base = Path::new(&js_name)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        EmitOutput {
            output_files: vec![
                OutputFile {
                    name: format!("{js_name}.map"),
                    text: raw_source_map(&base, "module.ts"),
                },
                OutputFile {
                    name: js_name,
                    text: strip_types(&source),
                },
            ],
            emit_skipped: false,
        }
    }

    fn compiler_options_diagnostics(
        &mut self,
        _host: &dyn LanguageServiceHost,
    ) -> Vec<RawDiagnostic> {
        self.options_diagnostics
            .iter()
            .map(|message| RawDiagnostic::global(5023, Severity::Error, message.as_str()))
            .collect()
    }

    fn syntactic_diagnostics(
        &mut self,
        host: &dyn LanguageServiceHost,
        file_name: &str,
    ) -> Vec<RawDiagnostic> {
        let source = Self::source(host, file_name);
        let mut depth = 0i64;
        let mut diagnostics = Vec::new();
        for (offset, ch) in source.char_indices() {
            match ch {
                '{' => depth += 1,
                '}' if depth == 0 => diagnostics.push(RawDiagnostic::in_file(
                    UNBALANCED_BRACES,
                    Severity::Error,
                    DiagnosticFile::new(file_name, source.clone()),
                    utf16_offset(&source, offset),
                    1,
                    "Declaration or statement expected.",
                )),
                '}' => depth -= 1,
                _ => {}
            }
        }
        if depth > 0 {
            diagnostics.push(RawDiagnostic::in_file(
                UNBALANCED_BRACES,
                Severity::Error,
                DiagnosticFile::new(file_name, source.clone()),
                utf16_offset(&source, source.len()),
                0,
                "'}' expected.",
            ));
        }
        diagnostics
    }

    fn semantic_diagnostics(
        &mut self,
        host: &dyn LanguageServiceHost,
        file_name: &str,
    ) -> Vec<RawDiagnostic> {
        self.counters.checks.fetch_add(1, Ordering::SeqCst);
        let source = Self::source(host, file_name);

        let imports = imported_modules(&source);
        if !imports.is_empty() {
            let resolved = host.resolve_module_names(&imports, file_name);
            self.counters.resolutions.lock().extend(
                imports
                    .iter()
                    .cloned()
                    .zip(resolved.into_iter().map(|m| m.resolved_file_name)),
            );
        }

        string_to_number_bindings(&source)
            .into_iter()
            .map(|(start, length)| {
                RawDiagnostic::in_file(
                    NOT_ASSIGNABLE,
                    Severity::Error,
                    DiagnosticFile::new(file_name, source.clone()),
                    start,
                    length,
                    MessageChain::leaf("Type 'string' is not assignable to type 'number'."),
                )
            })
            .collect()
    }
}

fn raw_source_map(file: &str, source: &str) -> String {
    serde_json::json!({
        "version": 3,
        "file": file,
        "sourceRoot": "",
        "sources": [source],
        "names": [],
        "mappings": "AAAA",
    })
    .to_string()
}

fn is_ident(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '$'
}

/// Removes `: Type` annotations that follow an identifier or `)`.
fn strip_types(source: &str) -> String {
    let chars: Vec<char> = source.chars().collect();
    let mut out = String::with_capacity(source.len());
    let mut i = 0;
    while i < chars.len() {
        let follows_binding = i > 0 && (is_ident(chars[i - 1]) || chars[i - 1] == ')');
        if chars[i] == ':' && follows_binding && chars.get(i + 1) == Some(&' ') {
            let mut j = i + 1;
            while j < chars.len() && chars[j] == ' ' {
                j += 1;
            }
            let type_start = j;
            while j < chars.len() && (is_ident(chars[j]) || matches!(chars[j], '[' | ']' | '<' | '>')) {
                j += 1;
            }
            if j > type_start {
                i = j;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

/// UTF-16 ranges of binding names annotated `number` and initialized with a
/// string literal.
fn string_to_number_bindings(source: &str) -> Vec<(u32, u32)> {
    const PATTERN: &str = ": number = ";
    let mut found = Vec::new();
    for (colon, _) in source.match_indices(PATTERN) {
        let value = &source[colon + PATTERN.len()..];
        if !(value.starts_with('\'') || value.starts_with('"')) {
            continue;
        }
        let name_start = source[..colon]
            .char_indices()
            .rev()
            .take_while(|(_, ch)| is_ident(*ch))
            .last()
            .map(|(idx, _)| idx)
            .unwrap_or(colon);
        let start = utf16_offset(source, name_start);
        found.push((start, utf16_offset(source, colon) - start));
    }
    found
}

/// Module names of `from '<name>'` clauses.
fn imported_modules(source: &str) -> Vec<String> {
    source
        .match_indices("from '")
        .filter_map(|(idx, pat)| {
            let rest = &source[idx + pat.len()..];
            rest.find('\'').map(|end| rest[..end].to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_annotations() {
        assert_eq!(strip_types("const x: number = 1"), "const x = 1\n");
        assert_eq!(
            strip_types("function f(a: string): void {}\n"),
            "function f(a) {}\n"
        );
        assert_eq!(strip_types("const s = 'a:b'"), "const s = 'a:b'\n");
    }

    #[test]
    fn finds_string_assigned_to_number() {
        let source = "let ok: number = 1\nconst x: number = 'oops'";
        assert_eq!(string_to_number_bindings(source), vec![(25, 1)]);
    }

    #[test]
    fn binding_ranges_are_utf16() {
        assert_eq!(
            string_to_number_bindings("/* \u{1F600} */ let n: number = 'x'"),
            vec![(13, 1)]
        );
    }

    #[test]
    fn finds_imports() {
        assert_eq!(
            imported_modules("import { a } from './a'\nimport b from 'lib'\n"),
            vec!["./a".to_string(), "lib".to_string()]
        );
    }
}
