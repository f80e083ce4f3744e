//! A lint library with a single rule and a single formatter.

use std::path::Path;

use tscache_common::InternalError;
use tscache_diagnostics::{
    DiagnosticFile, LintFailure, LintFormatter, RawDiagnostic, Severity,
};
use tscache_service::{LanguageServiceHost, LintProvider, Linter, ServiceError};
use tscache_source::utf16_offset;

/// Name of the only rule: flags every `console.` call.
pub const NO_CONSOLE: &str = "no-console";

/// Lints for `console.` calls. The configuration file must exist but its
/// content is ignored.
#[derive(Debug, Default, Clone, Copy)]
pub struct FakeLinter;

impl Linter for FakeLinter {
    fn create_provider(&self, config_path: &Path) -> Result<Box<dyn LintProvider>, ServiceError> {
        if !config_path.is_file() {
            return Err(InternalError::new(format!(
                "cannot load lint configuration {}",
                config_path.display()
            ))
            .into());
        }
        Ok(Box::new(NoConsole))
    }

    fn find_formatter(&self, name: &str) -> Option<Box<dyn LintFormatter>> {
        (name == "prose").then(|| Box::new(ProseFormatter) as Box<dyn LintFormatter>)
    }
}

struct NoConsole;

impl LintProvider for NoConsole {
    fn lint(&mut self, host: &dyn LanguageServiceHost, file_name: &str) -> Vec<RawDiagnostic> {
        let Some(source) = host.script_snapshot(file_name) else {
            return Vec::new();
        };
        source
            .match_indices("console.")
            .map(|(offset, pat)| {
                RawDiagnostic::in_file(
                    0,
                    Severity::Warning,
                    DiagnosticFile::new(file_name, source.clone()),
                    utf16_offset(&source, offset),
                    pat.len() as u32,
                    "Calls to 'console.log' are not allowed.",
                )
                .with_source(NO_CONSOLE)
            })
            .collect()
    }
}

/// Renders `SEVERITY: file:line:character [rule] failure`, ending the output
/// with a blank line the way lint formatters do.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProseFormatter;

impl LintFormatter for ProseFormatter {
    fn format(&self, failures: &[LintFailure]) -> String {
        let mut out = failures
            .iter()
            .map(|f| {
                format!(
                    "{}: {} [{}] {}",
                    f.rule_severity.as_str().to_uppercase(),
                    f.file_name,
                    f.rule_name,
                    f.failure
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        out.push_str("\n\n");
        out
    }
}
