//! Build toolchain for an SDK feature compliance matrix.
//!
//! Reads a canonical YAML feature tree plus per-SDK compliance manifests,
//! cross-validates them, and renders a static HTML table with one row per
//! feature node and one status column per SDK.
//!
//! # Pipeline
//!
//! YAML sources → [`validate`] (structural constraints) → [`properties`]
//! (typed metadata per node) → [`manifest`] (cross-validation against the
//! canonical tree) → [`render`] (two-pass tree-to-table) → [`html`] (fluent
//! output sink). [`pipeline`] ties the stages together from document contents
//! to the written file; every detected inconsistency is fatal and aborts the
//! build before any output exists.

pub mod error;
pub mod html;
pub mod keys;
pub mod manifest;
pub mod pipeline;
pub mod properties;
pub mod render;
pub mod validate;

pub use error::{Error, Result};
pub use manifest::Manifest;
pub use pipeline::{check, load, render_html, write_to_directory, BuildOptions, LoadedSources};
pub use properties::{ApiDefinition, Properties, PropertyContext, SpecificationPoint};
pub use render::{measure_depth, FeatureMatrix};
