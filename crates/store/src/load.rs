use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracespec_core::error::{Result, TracespecError};
use tracespec_core::model::span::ObservedTrace;
use tracespec_core::model::spec::TraceSpecification;

use crate::Store;

/// A JSON document on disk: a trace or a specification, alone or in an array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Document {
    Trace(ObservedTrace),
    Spec(TraceSpecification),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum DocumentFile {
    Many(Vec<Document>),
    One(Document),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub files: usize,
    pub traces: usize,
    pub specs: usize,
}

pub fn parse_documents(raw: &str) -> std::result::Result<Vec<Document>, serde_json::Error> {
    serde_json::from_str::<DocumentFile>(raw).map(|file| match file {
        DocumentFile::Many(docs) => docs,
        DocumentFile::One(doc) => vec![doc],
    })
}

pub fn read_documents(path: &Path) -> Result<Vec<Document>> {
    let raw = fs::read_to_string(path)
        .map_err(|e| TracespecError::Io(format!("failed reading {}: {e}", path.display())))?;
    parse_documents(&raw).map_err(|e| {
        TracespecError::Parse(format!(
            "{} is neither a trace nor a specification document: {e}",
            path.display()
        ))
    })
}

impl Store {
    pub fn load_documents(&self, docs: Vec<Document>) -> Result<LoadSummary> {
        let mut summary = LoadSummary::default();
        for doc in docs {
            match doc {
                Document::Trace(trace) => {
                    self.insert_trace(trace)?;
                    summary.traces += 1;
                }
                Document::Spec(spec) => {
                    self.define_spec(spec)?;
                    summary.specs += 1;
                }
            }
        }
        Ok(summary)
    }

    pub fn load_file(&self, path: &Path) -> Result<LoadSummary> {
        let mut summary = self.load_documents(read_documents(path)?)?;
        summary.files = 1;
        Ok(summary)
    }

    /// Loads every `*.json` file directly under `dir`, in path order.
    /// `dir` must exist; glob metacharacters in its name match literally.
    pub fn load_dir(&self, dir: &Path) -> Result<LoadSummary> {
        if !dir.is_dir() {
            return Err(TracespecError::InvalidArgument(format!(
                "not a directory: {}",
                dir.display()
            )));
        }
        let dir_str = dir.to_str().ok_or_else(|| {
            TracespecError::InvalidArgument(format!("non-utf8 directory: {}", dir.display()))
        })?;
        let pattern = Path::new(&glob::Pattern::escape(dir_str)).join("*.json");
        let pattern = pattern.to_str().ok_or_else(|| {
            TracespecError::InvalidArgument(format!("non-utf8 directory: {}", dir.display()))
        })?;

        let mut paths = glob::glob(pattern)
            .map_err(|e| TracespecError::InvalidArgument(format!("bad load pattern {pattern}: {e}")))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| TracespecError::Io(format!("failed listing {}: {e}", dir.display())))?;
        paths.sort();

        let mut summary = LoadSummary::default();
        for path in paths {
            let loaded = self.load_file(&path)?;
            summary.files += loaded.files;
            summary.traces += loaded.traces;
            summary.specs += loaded.specs;
        }

        tracing::info!(
            dir = %dir.display(),
            files = summary.files,
            traces = summary.traces,
            specs = summary.specs,
            "loaded documents"
        );
        Ok(summary)
    }
}
