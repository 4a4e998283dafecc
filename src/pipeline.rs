//! Wiring between the pure image operations and a host build pipeline.
//!
//! The host provides items through a [`ByteSource`] (raw bytes plus the
//! item's extension) and receives results through a [`ResultSink`]. Each item
//! is independent: fetch, pick the first matching rule, apply its [`Step`],
//! hand the bytes to the sink. Items are processed one after another.
//!
//! ## Filesystem adapters
//!
//! [`DirSource`] and [`DirSink`] map item ids to paths relative to a root
//! directory, so `photos/dawn.jpg` under `site/` lands at
//! `dist/photos/dawn.jpg`:
//!
//! ```text
//! site/                         dist/
//! ├── image-steps.toml          ├── photos/
//! ├── photos/                   │   ├── dawn.jpg      # scale-to-fit
//! │   ├── dawn.jpg      ──→     │   └── dusk.jpg      # compress-jpeg
//! │   └── dusk.jpg              └── notes.txt         # copied unchanged
//! └── notes.txt
//! ```
//!
//! ## Failure handling
//!
//! Every imaging failure is tagged with the item id. With `fail_fast` the
//! run stops at the first failure; otherwise the failure is logged, recorded
//! in the [`RunReport`] and the next item is processed.

use crate::config::{CONFIG_FILENAME, ConfigError, PipelineConfig, StepConfig};
use crate::imaging::format::extension_of;
use crate::imaging::{
    EncodedImage, ImageBackend, ImagingError, OutputFormat, Quality, TargetSize,
    ensure_image_fits, recompress_jpeg, resize_image, scale_image_to_fit,
};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Failed to walk source directory: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Source item not found: {0}")]
    SourceNotFound(PathBuf),
    #[error("{second}: output {output} was already written from {first}")]
    OutputCollision {
        output: String,
        first: String,
        second: String,
    },
    #[error("{id}: {source}")]
    Imaging {
        id: String,
        #[source]
        source: ImagingError,
    },
}

/// One input item: its identity, declared extension and encoded bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceItem {
    pub id: String,
    /// Extension with leading dot (`".jpg"`), or empty.
    pub extension: String,
    pub bytes: Vec<u8>,
}

/// Yields the raw bytes of one item by id.
pub trait ByteSource {
    fn fetch(&self, id: &str) -> Result<SourceItem, PipelineError>;
}

/// Accepts the output bytes of one item.
pub trait ResultSink {
    fn accept(&mut self, id: &str, bytes: &[u8]) -> Result<(), PipelineError>;
}

/// Reads items from files under a root directory.
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// All item ids under the root, sorted, `/`-separated, excluding the
    /// config file at the root.
    pub fn list_items(&self) -> Result<Vec<String>, PipelineError> {
        let mut ids = Vec::new();
        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(&self.root)
                .unwrap_or(entry.path());
            if relative == Path::new(CONFIG_FILENAME) {
                continue;
            }
            let id = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            ids.push(id);
        }
        Ok(ids)
    }
}

impl ByteSource for DirSource {
    fn fetch(&self, id: &str) -> Result<SourceItem, PipelineError> {
        let path = self.root.join(id);
        if !path.is_file() {
            return Err(PipelineError::SourceNotFound(path));
        }
        Ok(SourceItem {
            id: id.to_string(),
            extension: extension_of(&path),
            bytes: std::fs::read(&path)?,
        })
    }
}

/// Writes results to files under a root directory, creating parents as needed.
pub struct DirSink {
    root: PathBuf,
}

impl DirSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ResultSink for DirSink {
    fn accept(&mut self, id: &str, bytes: &[u8]) -> Result<(), PipelineError> {
        let path = self.root.join(id);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, bytes)?;
        Ok(())
    }
}

/// A validated transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Resize(TargetSize),
    ScaleToFit(TargetSize),
    EnsureFit(TargetSize),
    CompressJpeg(Quality),
}

impl Step {
    pub fn from_config(config: StepConfig) -> Result<Self, ImagingError> {
        Ok(match config {
            StepConfig::Resize { width, height } => Self::Resize(TargetSize::new(width, height)?),
            StepConfig::ScaleToFit { width, height } => {
                Self::ScaleToFit(TargetSize::new(width, height)?)
            }
            StepConfig::EnsureFit { width, height } => {
                Self::EnsureFit(TargetSize::new(width, height)?)
            }
            StepConfig::CompressJpeg { quality } => Self::CompressJpeg(Quality::new(quality)?),
        })
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resize(s) => write!(f, "resize {}x{}", s.width(), s.height()),
            Self::ScaleToFit(s) => write!(f, "scale-to-fit {}x{}", s.width(), s.height()),
            Self::EnsureFit(s) => write!(f, "ensure-fit {}x{}", s.width(), s.height()),
            Self::CompressJpeg(q) => write!(f, "compress-jpeg q{}", q.value()),
        }
    }
}

/// Apply one step to one item's bytes.
///
/// Geometric steps encode to the format named by `output_extension`.
/// JPEG recompression always writes JPEG, so `output_extension` must name it.
pub fn apply_step(
    backend: &impl ImageBackend,
    step: Step,
    bytes: &[u8],
    output_extension: &str,
) -> Result<EncodedImage, ImagingError> {
    match step {
        Step::Resize(size) => {
            let format = OutputFormat::from_extension(output_extension)?;
            resize_image(backend, bytes, size, format)
        }
        Step::ScaleToFit(bounds) => {
            let format = OutputFormat::from_extension(output_extension)?;
            scale_image_to_fit(backend, bytes, bounds, format)
        }
        Step::EnsureFit(bounds) => {
            let format = OutputFormat::from_extension(output_extension)?;
            ensure_image_fits(backend, bytes, bounds, format)
        }
        Step::CompressJpeg(quality) => {
            recompress_jpeg_to(backend, bytes, quality.value().into(), output_extension)
        }
    }
}

/// [`recompress_jpeg`] for a destination named by `output_extension`.
///
/// Fails before decoding unless the extension is a JPEG one, so JPEG bytes
/// never land under a `.png` name.
pub fn recompress_jpeg_to(
    backend: &impl ImageBackend,
    bytes: &[u8],
    quality: i64,
    output_extension: &str,
) -> Result<EncodedImage, ImagingError> {
    let format = OutputFormat::from_extension(output_extension)?;
    if format != OutputFormat::Jpeg {
        return Err(ImagingError::InvalidParameter {
            name: "output extension",
            reason: format!("JPEG recompression writes JPEG, got {output_extension:?}"),
        });
    }
    recompress_jpeg(backend, bytes, quality)
}

/// What happened to one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Transformed,
    Copied,
    Skipped,
    Failed,
}

/// Per-item entry of a [`RunReport`]; also streamed as a progress event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemReport {
    pub id: String,
    pub status: ItemStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
    pub input_bytes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_bytes: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<(u32, u32)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ItemReport {
    fn new(item: &SourceItem, status: ItemStatus) -> Self {
        Self {
            id: item.id.clone(),
            status,
            output: None,
            step: None,
            input_bytes: item.bytes.len(),
            output_bytes: None,
            dimensions: None,
            error: None,
        }
    }
}

/// Outcome of a whole run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub items: Vec<ItemReport>,
}

impl RunReport {
    pub fn count(&self, status: ItemStatus) -> usize {
        self.items.iter().filter(|i| i.status == status).count()
    }

    /// Write the report as pretty JSON.
    pub fn write_json(&self, path: &Path) -> Result<(), PipelineError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} transformed, {} copied, {} skipped, {} failed",
            self.count(ItemStatus::Transformed),
            self.count(ItemStatus::Copied),
            self.count(ItemStatus::Skipped),
            self.count(ItemStatus::Failed)
        )
    }
}

/// Replace the extension of a `/`-separated id.
fn with_extension(id: &str, extension: &str) -> String {
    let name_start = id.rfind('/').map_or(0, |i| i + 1);
    let stem_end = id[name_start..]
        .rfind('.')
        .filter(|&i| i > 0)
        .map_or(id.len(), |i| name_start + i);
    format!("{}{}", &id[..stem_end], extension)
}

/// Process `ids` in order against `config`'s rules.
///
/// Each finished item is pushed to `events` (if given) as it completes.
pub fn run(
    backend: &impl ImageBackend,
    config: &PipelineConfig,
    source: &impl ByteSource,
    sink: &mut impl ResultSink,
    ids: &[String],
    events: Option<Sender<ItemReport>>,
) -> Result<RunReport, PipelineError> {
    let mut report = RunReport::default();
    let mut written = HashMap::new();

    for id in ids {
        let item = source.fetch(id)?;
        let entry = process_item(backend, config, &item, sink, &mut written)?;
        if let Some(tx) = &events {
            // A dropped receiver only loses progress output
            tx.send(entry.clone()).ok();
        }
        report.items.push(entry);
    }

    Ok(report)
}

/// Record that `item` writes `output_id`.
///
/// Returns a failed entry (or, with `fail_fast`, an error) when an earlier
/// item already wrote the same output, e.g. `a.png` and `a.bmp` both
/// re-targeted to `a.jpg`.
fn claim_output(
    config: &PipelineConfig,
    written: &mut HashMap<String, String>,
    item: &SourceItem,
    output_id: &str,
) -> Result<Option<ItemReport>, PipelineError> {
    let Some(first) = written.get(output_id).cloned() else {
        written.insert(output_id.to_string(), item.id.clone());
        return Ok(None);
    };
    if config.fail_fast {
        return Err(PipelineError::OutputCollision {
            output: output_id.to_string(),
            first,
            second: item.id.clone(),
        });
    }
    log::warn!("{}: output {output_id} already written from {first}", item.id);
    let mut entry = ItemReport::new(item, ItemStatus::Failed);
    entry.error = Some(format!(
        "output-collision: {output_id} already written from {first}"
    ));
    Ok(Some(entry))
}

fn process_item(
    backend: &impl ImageBackend,
    config: &PipelineConfig,
    item: &SourceItem,
    sink: &mut impl ResultSink,
    written: &mut HashMap<String, String>,
) -> Result<ItemReport, PipelineError> {
    let Some(rule) = config.rule_for(&item.id, &item.extension) else {
        if config.copy_unmatched {
            if let Some(failed) = claim_output(config, written, item, &item.id)? {
                return Ok(failed);
            }
            sink.accept(&item.id, &item.bytes)?;
            let mut entry = ItemReport::new(item, ItemStatus::Copied);
            entry.output = Some(item.id.clone());
            entry.output_bytes = Some(item.bytes.len());
            return Ok(entry);
        }
        log::debug!("{}: no matching rule, skipped", item.id);
        return Ok(ItemReport::new(item, ItemStatus::Skipped));
    };

    let output_extension = rule
        .output_extension
        .clone()
        .unwrap_or_else(|| item.extension.clone());

    let result = Step::from_config(rule.step).and_then(|step| {
        apply_step(backend, step, &item.bytes, &output_extension).map(|out| (step, out))
    });

    match result {
        Ok((step, encoded)) => {
            let output_id = match &rule.output_extension {
                Some(ext) => with_extension(&item.id, ext),
                None => item.id.clone(),
            };
            if let Some(failed) = claim_output(config, written, item, &output_id)? {
                return Ok(failed);
            }
            sink.accept(&output_id, &encoded.bytes)?;
            log::debug!(
                "{} -> {} ({step}, {} -> {} bytes)",
                item.id,
                output_id,
                item.bytes.len(),
                encoded.bytes.len()
            );
            let mut entry = ItemReport::new(item, ItemStatus::Transformed);
            entry.output = Some(output_id);
            entry.step = Some(step.to_string());
            entry.output_bytes = Some(encoded.bytes.len());
            entry.dimensions = Some((encoded.dimensions.width, encoded.dimensions.height));
            Ok(entry)
        }
        Err(source) if config.fail_fast => Err(PipelineError::Imaging {
            id: item.id.clone(),
            source,
        }),
        Err(source) => {
            log::warn!("{}: {} ({})", item.id, source, source.kind());
            let mut entry = ItemReport::new(item, ItemStatus::Failed);
            entry.error = Some(format!("{}: {}", source.kind(), source));
            Ok(entry)
        }
    }
}

/// Apply `config` to every file under `source_root`, writing into `output_root`.
pub fn process_directory(
    backend: &impl ImageBackend,
    config: &PipelineConfig,
    source_root: &Path,
    output_root: &Path,
    events: Option<Sender<ItemReport>>,
) -> Result<RunReport, PipelineError> {
    let source = DirSource::new(source_root);
    let ids = source.list_items()?;
    std::fs::create_dir_all(output_root)?;
    let mut sink = DirSink::new(output_root);
    run(backend, config, &source, &mut sink, &ids, events)
}
