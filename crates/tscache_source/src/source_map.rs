//! Version 3 source maps produced alongside emitted JavaScript.
//!
//! Compilers name the generated map after an internal or default file name.
//! [`fix_source_map`] rebinds `file` and `sources` to the path of the module
//! being compiled so that the host can attribute the mappings correctly.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A structured source map.
///
/// Known v3 fields are typed; anything else the compiler emits is carried
/// through untouched in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMap {
    /// Source map format version (always 3 for compiler output).
    #[serde(default = "default_version")]
    pub version: u32,
    /// The generated file this map belongs to.
    #[serde(default)]
    pub file: String,
    /// Original source files referenced by `mappings`.
    #[serde(default)]
    pub sources: Vec<String>,
    /// Optional prefix applied to every entry of `sources`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_root: Option<String>,
    /// Symbol names referenced by `mappings`.
    #[serde(default)]
    pub names: Vec<String>,
    /// Base64 VLQ encoded mapping segments.
    #[serde(default)]
    pub mappings: String,
    /// Inlined original sources, if the compiler embedded them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources_content: Option<Vec<Option<String>>>,
    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_version() -> u32 {
    3
}

impl Default for SourceMap {
    fn default() -> Self {
        Self {
            version: default_version(),
            file: String::new(),
            sources: Vec::new(),
            source_root: None,
            names: Vec::new(),
            mappings: String::new(),
            sources_content: None,
            extra: Map::new(),
        }
    }
}

impl SourceMap {
    /// Rebinds the map to `file`: both `file` and the single entry of
    /// `sources` become the given path.
    pub fn bind_to(&mut self, file: &str) {
        self.file = file.to_string();
        self.sources = vec![file.to_string()];
    }
}

/// Parses compiler source map text and binds it to `file`.
///
/// Missing text is treated as an empty map (`{}`), which still yields a
/// valid map pointing at `file`.
pub fn fix_source_map(file: &str, source_map_text: Option<&str>) -> Result<SourceMap, serde_json::Error> {
    let text = source_map_text.filter(|t| !t.is_empty()).unwrap_or("{}");
    let mut map: SourceMap = serde_json::from_str(text)?;
    map.bind_to(file);
    Ok(map)
}
