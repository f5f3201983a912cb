//! Tree-to-table rendering: the core of the build.
//!
//! The table's header and every content cell's column span depend on the
//! *global* maximum nesting depth, which is only knowable after visiting
//! every leaf. Rather than buffering the whole table, the tree is traversed
//! twice (a measurement pass and an emission pass) over one shared
//! path-walking core. Double CPU work for flat memory is the right trade for
//! a build-time generator over a small static tree.

use std::io;

use serde_yaml::Value;

use crate::error::{Error, Result};
use crate::html::TableWriter;
use crate::keys::{compare_keys, is_property_key, node_kind};
use crate::manifest::Manifest;
use crate::properties::{Properties, PropertyContext};

/// Cap on feature-tree nesting, enforced in both passes.
pub const MAX_TREE_DEPTH: usize = 10;

/// Default base URL for specification-point links; the point is appended as
/// the fragment.
pub const DEFAULT_SPECIFICATION_URL: &str =
    "https://docs.ably.com/client-lib-development-guide/features/#";

// from Google Fonts' Icons (originally called 'Close', 'Done' and 'More Horiz').
// https://fonts.google.com/icons
const CROSS_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" height="48" width="48"><path d="M12.45 37.65 10.35 35.55 21.9 24 10.35 12.45 12.45 10.35 24 21.9 35.55 10.35 37.65 12.45 26.1 24 37.65 35.55 35.55 37.65 24 26.1Z"/></svg>"#;
const TICK_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" height="48" width="48"><path d="M18.9 35.7 7.7 24.5 9.85 22.35 18.9 31.4 38.1 12.2 40.25 14.35Z"/></svg>"#;
const PARTIAL_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" height="48" width="48"><path d="M10.4 26.4Q9.4 26.4 8.7 25.7Q8 25 8 24Q8 23 8.7 22.3Q9.4 21.6 10.4 21.6Q11.4 21.6 12.1 22.3Q12.8 23 12.8 24Q12.8 25 12.1 25.7Q11.4 26.4 10.4 26.4ZM24 26.4Q23 26.4 22.3 25.7Q21.6 25 21.6 24Q21.6 23 22.3 22.3Q23 21.6 24 21.6Q25 21.6 25.7 22.3Q26.4 23 26.4 24Q26.4 25 25.7 25.7Q25 26.4 24 26.4ZM37.6 26.4Q36.6 26.4 35.9 25.7Q35.2 25 35.2 24Q35.2 23 35.9 22.3Q36.6 21.6 37.6 21.6Q38.6 21.6 39.3 22.3Q40 23 40 24Q40 25 39.3 25.7Q38.6 26.4 37.6 26.4Z"/></svg>"#;

/// Compliance classification for one feature under one manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Full,
    Partial,
    Missing,
}

impl Status {
    fn css_class(self) -> &'static str {
        match self {
            Self::Full => "status status-full",
            Self::Partial => "status status-partial",
            Self::Missing => "status status-missing",
        }
    }

    fn svg(self) -> &'static str {
        match self {
            Self::Full => TICK_SVG,
            Self::Partial => PARTIAL_SVG,
            Self::Missing => CROSS_SVG,
        }
    }
}

/// Receives traversal events from the shared path walk.
trait RowSink {
    /// Called for each non-dotted key, before recursing into its value.
    fn node(&mut self, parent_path: &[String], key: &str, value: &Value, level: usize)
        -> Result<()>;

    /// Called for each string leaf.
    fn leaf(&mut self, _level: usize, _text: &str) {}
}

/// Measurement pass: counts levels, emits nothing.
struct NullSink;

impl RowSink for NullSink {
    fn node(&mut self, _: &[String], _: &str, _: &Value, _: usize) -> Result<()> {
        Ok(())
    }
}

/// Measure the maximum nesting depth of a feature tree.
///
/// Mapping levels count 1 each, string leaves count 1, null values count 0,
/// and sequences are transparent. Dotted property keys are metadata and do
/// not contribute.
pub fn measure_depth(tree: &Value) -> Result<usize> {
    walk(tree, &mut Vec::new(), &mut NullSink)
}

/// Shared path-walking core for both passes.
///
/// Children of a mapping are visited in comparator order with dotted keys
/// excluded; the sink sees each node before its subtree. Sequences flatten:
/// elements sit at the same path and depth as the sequence itself. Returns
/// the number of levels at and below `node`.
fn walk(node: &Value, path: &mut Vec<String>, sink: &mut dyn RowSink) -> Result<usize> {
    let level = path.len();
    if level > MAX_TREE_DEPTH {
        return Err(Error::DepthExceeded {
            limit: MAX_TREE_DEPTH,
        });
    }

    let mut maximum_depth = 0;
    match node {
        Value::Mapping(map) => {
            let mut entries = Vec::with_capacity(map.len());
            for (key, value) in map {
                let Some(key) = key.as_str() else {
                    return Err(Error::NonStringKey {
                        actual: node_kind(key),
                    });
                };
                if !is_property_key(key) {
                    entries.push((key, value));
                }
            }
            entries.sort_by(|(a, _), (b, _)| compare_keys(a, b));

            for (key, value) in entries {
                sink.node(path, key, value, level)?;

                path.push(key.to_string());
                let depth = walk(value, path, sink)?;
                path.pop();
                maximum_depth = maximum_depth.max(1 + depth);
            }
        }
        Value::Sequence(items) => {
            for item in items {
                maximum_depth = maximum_depth.max(walk(item, path, sink)?);
            }
        }
        Value::String(text) => {
            sink.leaf(level, text);
            maximum_depth = 1;
        }
        Value::Null => {}
        Value::Bool(_) | Value::Number(_) | Value::Tagged(_) => {
            return Err(Error::UnhandledNodeKind {
                actual: node_kind(node),
            });
        }
    }

    Ok(maximum_depth)
}

/// The canonical tree plus its registered manifests, ready to render.
pub struct FeatureMatrix<'a> {
    tree: &'a Value,
    manifests: &'a [(String, Manifest)],
    specification_url: &'a str,
}

impl<'a> FeatureMatrix<'a> {
    pub fn new(
        tree: &'a Value,
        manifests: &'a [(String, Manifest)],
        specification_url: &'a str,
    ) -> Self {
        Self {
            tree,
            manifests,
            specification_url,
        }
    }

    pub fn measure_depth(&self) -> Result<usize> {
        measure_depth(self.tree)
    }

    /// Emit the header row: the feature column spans the full measured tree
    /// depth, followed by one column per registered manifest.
    pub fn render_header<W: io::Write>(
        &self,
        table: &mut TableWriter<'_, W>,
        maximum_level: usize,
    ) -> Result<()> {
        table.class("heading");
        table.row(|row| {
            if maximum_level > 1 {
                row.column_span(maximum_level);
            }
            row.cell(|cell| cell.text("Feature"))?;
            row.cell(|cell| cell.text("Specification"))?;
            row.cell(|cell| cell.text("Synopsis and Links to Conceptual Documentation"))?;
            for (label, _) in self.manifests {
                row.cell(|cell| cell.text(label))?;
            }
            Ok(())
        })
    }

    /// Emit one row per feature node, in traversal order.
    pub fn render_rows<W: io::Write>(
        &self,
        table: &mut TableWriter<'_, W>,
        maximum_level: usize,
    ) -> Result<()> {
        let mut sink = TableSink {
            table,
            maximum_level,
            manifests: self.manifests,
            specification_url: self.specification_url,
        };
        walk(self.tree, &mut Vec::new(), &mut sink)?;
        Ok(())
    }
}

/// Emission pass: writes one table row per visited node.
struct TableSink<'a, 'w, W: io::Write> {
    table: &'a mut TableWriter<'w, W>,
    maximum_level: usize,
    manifests: &'a [(String, Manifest)],
    specification_url: &'a str,
}

impl<W: io::Write> RowSink for TableSink<'_, '_, W> {
    fn node(
        &mut self,
        parent_path: &[String],
        key: &str,
        value: &Value,
        level: usize,
    ) -> Result<()> {
        tracing::debug!("{}{}:", "  ".repeat(level), key);

        let properties = Properties::from_node(value, PropertyContext::Canonical)?;

        let mut feature_path = parent_path.to_vec();
        feature_path.push(key.to_string());

        let maximum_level = self.maximum_level;
        let manifests = self.manifests;
        let specification_url = self.specification_url;

        self.table.class("feature-row");
        self.table.row(|row| {
            // Indent using empty cells.
            for _ in 0..level {
                row.class("indent");
                row.cell(|cell| cell.write_raw("&nbsp;"))?;
            }

            // Feature name, spanning the remaining width after indentation.
            let cell_count = maximum_level - level;
            if cell_count > 1 {
                row.column_span(cell_count);
            }
            row.class("feature");
            row.cell(|cell| {
                if level > 0 {
                    let breadcrumb = format!(
                        "<span class=\"tooltip\"><strong>{}</strong>: {}</span>",
                        html_escape::encode_text(&parent_path.join(": ")),
                        html_escape::encode_text(key),
                    );
                    cell.write_raw(&breadcrumb)?;
                }
                cell.text(key)
            })?;

            // Specification points, as links into the specification document.
            row.class("spec");
            row.cell(|cell| match &properties.specification_points {
                Some(points) => {
                    let links = points
                        .iter()
                        .map(|point| specification_link(specification_url, point.as_str()))
                        .collect::<Vec<_>>()
                        .join(", ");
                    cell.write_raw(&links)
                }
                None => cell.write_raw("&nbsp;"),
            })?;

            // Documentation links and rendered synopsis.
            row.class("docs");
            row.cell(|cell| {
                let mut empty = true;
                if let Some(urls) = &properties.documentation_urls {
                    let links = urls
                        .iter()
                        .map(|url| documentation_link(url.as_str()))
                        .collect::<Vec<_>>()
                        .join(" ");
                    cell.write_raw(&links)?;
                    empty = false;
                }
                if let Some(synopsis) = &properties.synopsis {
                    cell.write_raw(&markdown_to_html(synopsis))?;
                    empty = false;
                }
                if empty {
                    cell.write_raw("&nbsp;")?;
                }
                Ok(())
            })?;

            // One status cell per manifest, in registration order.
            for (_, manifest) in manifests {
                let status = classify(manifest, &feature_path)?;
                row.class(status.css_class());
                row.cell(|cell| cell.write_raw(status.svg()))?;
            }

            Ok(())
        })
    }

    fn leaf(&mut self, level: usize, text: &str) {
        tracing::debug!("{}\"{}\"", "  ".repeat(level), text);
    }
}

/// Classify one feature's compliance under one manifest.
fn classify(manifest: &Manifest, feature_path: &[String]) -> Result<Status> {
    let Some(compliance) = manifest.find(feature_path)? else {
        return Ok(Status::Missing);
    };

    let partial_variants = match &compliance.variants {
        Some(variants) => manifest.is_partial_variants_coverage(variants)?,
        None => false,
    };
    let partial_notes = compliance.notes.is_some();

    if partial_variants || partial_notes {
        Ok(Status::Partial)
    } else {
        Ok(Status::Full)
    }
}

fn specification_link(base: &str, point: &str) -> String {
    format!(
        "<a href=\"{}{}\" target=\"_blank\" rel=\"noopener\">{}</a>",
        html_escape::encode_double_quoted_attribute(base),
        html_escape::encode_double_quoted_attribute(point),
        html_escape::encode_text(point),
    )
}

fn documentation_link(url: &str) -> String {
    format!(
        "<a class=\"docs-link\" href=\"{}\" target=\"_blank\" rel=\"noopener\">docs</a>",
        html_escape::encode_double_quoted_attribute(url),
    )
}

fn markdown_to_html(markdown: &str) -> String {
    let mut html = String::new();
    pulldown_cmark::html::push_html(&mut html, pulldown_cmark::Parser::new(markdown));
    html
}
