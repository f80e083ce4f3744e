//! Merging lint findings into the language service.

use tscache_diagnostics::RawDiagnostic;

use crate::compiler::{EmitOutput, LanguageService, LanguageServiceHost, LintProvider};

/// A language service whose semantic diagnostics also include lint findings.
///
/// Lint results follow the type errors of the same file.
pub struct LintedService {
    inner: Box<dyn LanguageService>,
    provider: Box<dyn LintProvider>,
}

impl LintedService {
    /// Wraps `inner` with `provider`.
    pub fn new(inner: Box<dyn LanguageService>, provider: Box<dyn LintProvider>) -> Self {
        Self { inner, provider }
    }
}

impl LanguageService for LintedService {
    fn emit_output(&mut self, host: &dyn LanguageServiceHost, file_name: &str) -> EmitOutput {
        self.inner.emit_output(host, file_name)
    }

    fn compiler_options_diagnostics(
        &mut self,
        host: &dyn LanguageServiceHost,
    ) -> Vec<RawDiagnostic> {
        self.inner.compiler_options_diagnostics(host)
    }

    fn syntactic_diagnostics(
        &mut self,
        host: &dyn LanguageServiceHost,
        file_name: &str,
    ) -> Vec<RawDiagnostic> {
        self.inner.syntactic_diagnostics(host, file_name)
    }

    fn semantic_diagnostics(
        &mut self,
        host: &dyn LanguageServiceHost,
        file_name: &str,
    ) -> Vec<RawDiagnostic> {
        let mut diagnostics = self.inner.semantic_diagnostics(host, file_name);
        diagnostics.extend(self.provider.lint(host, file_name));
        diagnostics
    }
}
