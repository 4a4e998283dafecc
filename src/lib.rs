//! # image-steps
//!
//! Stateless image transformation steps for static-site and asset pipelines:
//! fixed-size resizing, aspect-preserving scale-to-fit, and lossy JPEG
//! recompression. Every operation is a pure function from encoded bytes plus
//! parameters to encoded bytes (or a typed error).
//!
//! ```text
//! bytes ──decode──→ raster ──normalize (RGBA8)──→ resample ──encode──→ bytes
//!                                                   ↑                   ↑
//!                                     exact size or fit-in-box    format from extension
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | The transformations: dimension math, format lookup, backend, byte-level operations |
//! | [`pipeline`] | Adapters to a host pipeline: byte source, result sink, rule-driven runs |
//! | [`config`] | `image-steps.toml` loading, merging over defaults, validation |
//! | [`output`] | CLI output formatting for single-file commands and runs |
//!
//! # Design Decisions
//!
//! ## Typed Errors, Never Clamped Inputs
//!
//! Failures fall into distinct classes ([`imaging::ErrorKind`]): undecodable
//! input, an output extension with no encoder, an out-of-range parameter, or
//! an encoder failure. Callers decide whether a failure aborts a build or is
//! reported per item. A quality of 101 is an error, never silently 100.
//!
//! ## Exact Aspect Ratios
//!
//! Scale-to-fit compares `max_w / w` against `max_h / h` by integer
//! cross-multiplication and rounds the free side half-to-even on the exact
//! ratio. No floating point is involved, so results are reproducible across
//! platforms: 800×600 into a 400×400 box is always 400×300.
//!
//! ## Case-Sensitive Extensions
//!
//! `.jpg` selects the JPEG encoder; `.JPG` is unsupported. The mapping is a
//! fixed table, so the set of accepted spellings is explicit.
//!
//! ## No Caching, No Parallelism
//!
//! Each call owns its decoded raster for its own duration and shares nothing.
//! The `run` command processes items one after another; a host wanting
//! parallelism or memoization wraps the pure operations itself.

pub mod config;
pub mod imaging;
pub mod output;
pub mod pipeline;
