//! Build orchestration: load → validate → construct → measure → render.
//!
//! Loading takes document contents as parameters and returns the constructed
//! tree and manifest set, with no process-wide state, so the whole pipeline
//! can run against in-memory fixtures.

use std::io;
use std::path::{Path, PathBuf};

use serde_yaml::Value;

use crate::error::Result;
use crate::html::DocumentWriter;
use crate::manifest::Manifest;
use crate::render::{measure_depth, FeatureMatrix, DEFAULT_SPECIFICATION_URL};
use crate::validate::validate_structure;

/// Name of the rendered document within the output directory.
pub const OUTPUT_FILE_NAME: &str = "index.html";

const STYLESHEET: &str = "\
body{font-family:sans-serif;margin:1rem}\
table{border-collapse:collapse}\
td{border-right:2px solid #cbd5e1;border-bottom:2px solid #cbd5e1;padding:2px 8px;vertical-align:middle}\
tr.heading td{background:#1d4ed8;color:#fff;font-weight:bold;text-align:center;position:sticky;top:0}\
td.feature{white-space:nowrap;padding-right:12px}\
td.indent{padding:0 12px;border-right:none}\
td.status{text-align:center}\
td.status svg{height:1.2em;width:1.2em}\
td.status-full{background:#4ade80}\
td.status-partial{background:#fbbf24}\
td.status-missing{background:#f87171}\
a.docs-link{background:#1d4ed8;color:#fff;border-radius:4px;padding:1px 6px;text-decoration:none}\
span.tooltip{display:none}\
td.feature:hover span.tooltip{display:block;position:absolute;background:#0f172a;color:#fff;padding:2px 8px;border-radius:4px}";

/// Presentation options for one build run.
pub struct BuildOptions {
    /// Text of the page's `<h1>` and the document title.
    pub title: String,
    /// Base URL that specification points are appended to.
    pub specification_url: String,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            title: "SDK Features".to_string(),
            specification_url: DEFAULT_SPECIFICATION_URL.to_string(),
        }
    }
}

/// The validated inputs of one build run.
pub struct LoadedSources {
    pub canonical: Value,
    /// Manifests in registration order; the label becomes the column header.
    pub manifests: Vec<(String, Manifest)>,
}

/// Parse and validate every source document, then construct the manifest set
/// against the canonical tree.
///
/// Structural validation runs on every document before any data-model
/// construction; manifest construction cross-validates compliance paths.
pub fn load(canonical_source: &str, manifest_sources: &[(String, String)]) -> Result<LoadedSources> {
    let canonical: Value = serde_yaml::from_str(canonical_source)?;
    validate_structure(&canonical)?;

    let mut manifests = Vec::with_capacity(manifest_sources.len());
    for (label, source) in manifest_sources {
        let document: Value = serde_yaml::from_str(source)?;
        validate_structure(&document)?;
        let manifest = Manifest::new(document, &canonical)?;
        tracing::debug!(label, "registered manifest");
        manifests.push((label.clone(), manifest));
    }

    Ok(LoadedSources {
        canonical,
        manifests,
    })
}

/// Measure the tree, then render the full document to the given sink.
pub fn render_html<W: io::Write>(
    sources: &LoadedSources,
    options: &BuildOptions,
    out: W,
) -> Result<()> {
    let matrix = FeatureMatrix::new(
        &sources.canonical,
        &sources.manifests,
        &options.specification_url,
    );

    let maximum_level = matrix.measure_depth()?;
    tracing::info!(levels = maximum_level, "measured feature tree depth");

    let mut writer = DocumentWriter::new(options.title.clone(), out);
    writer.document(STYLESHEET, |content| {
        content.h(1, &options.title)?;
        content.class("matrix");
        content.table(|table| {
            matrix.render_header(table, maximum_level)?;
            matrix.render_rows(table, maximum_level)
        })
    })
}

/// Run the entire validation surface without producing any output.
///
/// Property extraction happens per node during the emission pass, so a
/// validation-only run still has to drive that pass; it goes into a
/// discarding sink. Returns the measured tree depth.
pub fn check(sources: &LoadedSources, options: &BuildOptions) -> Result<usize> {
    let levels = measure_depth(&sources.canonical)?;
    render_html(sources, options, io::sink())?;
    Ok(levels)
}

/// Render into `<directory>/index.html`, creating the directory recursively
/// if absent. Returns the path of the written file.
///
/// The document is rendered fully in memory first; the file only appears
/// once every node has validated, so a failed build never leaves partial
/// output behind.
pub fn write_to_directory(
    sources: &LoadedSources,
    options: &BuildOptions,
    directory: &Path,
) -> Result<PathBuf> {
    let mut rendered = Vec::new();
    render_html(sources, options, &mut rendered)?;

    std::fs::create_dir_all(directory)?;
    let path = directory.join(OUTPUT_FILE_NAME);
    std::fs::write(&path, rendered)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn load_rejects_unsorted_canonical_source() {
        let result = load("zebra:\napple:\n", &[]);
        assert!(matches!(result, Err(Error::KeysNotSorted { .. })));
    }

    #[test]
    fn load_rejects_invalid_manifest_before_construction() {
        let manifests = vec![("java".to_string(), "compliance: nope\n".to_string())];
        assert!(load("apple:\n", &manifests).is_err());
    }

    #[test]
    fn check_catches_property_errors_the_render_pass_would_hit() {
        // loading alone does not extract node properties, so a validation-only
        // run must cover them too
        let sources = load("Feature:\n  .specification: rtn13\n", &[]).unwrap();
        assert!(matches!(
            check(&sources, &BuildOptions::default()),
            Err(Error::MalformedSpecificationPoint { .. })
        ));
    }

    #[test]
    fn check_reports_the_measured_depth() {
        let sources = load("A:\n  B:\n", &[]).unwrap();
        assert_eq!(check(&sources, &BuildOptions::default()).unwrap(), 2);
    }

    #[test]
    fn renders_to_an_in_memory_sink() {
        let sources = load("Feature:\n", &[]).unwrap();
        let mut buffer = Vec::new();
        render_html(&sources, &BuildOptions::default(), &mut buffer).unwrap();
        let output = String::from_utf8(buffer).unwrap();
        assert!(output.contains("<h1>SDK Features</h1>"));
        assert!(output.contains("Feature"));
    }
}
