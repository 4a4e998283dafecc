//! CLI output formatting.
//!
//! Output is **item-centric**: each processed item gets a header line with
//! its id and what happened, followed by indented context lines (output
//! path, geometry, size change, error).
//!
//! ```text
//! photos/dawn.jpg  scale-to-fit 1200x1200
//!     Output: photos/dawn.jpg (1200x800)
//!     Size: 2.4 MB → 310.2 KB
//! notes.txt  copied
//! photos/broken.jpg  FAILED
//!     Error: decode: Failed to decode image: ...
//!
//! 1 transformed, 1 copied, 0 skipped, 1 failed
//! ```
//!
//! Each `format_*` function returns `Vec<String>` and is pure, for
//! testability; the `print_*` wrappers write to stdout.

use crate::imaging::EncodedImage;
use crate::pipeline::{ItemReport, ItemStatus, RunReport};

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Human-readable byte count (B, KB, MB with one decimal).
pub fn format_bytes(bytes: usize) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    let b = bytes as f64;
    if b >= MB {
        format!("{:.1} MB", b / MB)
    } else if b >= KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{} B", bytes)
    }
}

/// Format one item of a run.
pub fn format_item(item: &ItemReport) -> Vec<String> {
    let mut lines = Vec::new();
    match item.status {
        ItemStatus::Transformed => {
            lines.push(format!(
                "{}  {}",
                item.id,
                item.step.as_deref().unwrap_or("transformed")
            ));
            if let Some(output) = &item.output {
                match item.dimensions {
                    Some((w, h)) => {
                        lines.push(format!("{}Output: {} ({}x{})", indent(1), output, w, h))
                    }
                    None => lines.push(format!("{}Output: {}", indent(1), output)),
                }
            }
            if let Some(out_bytes) = item.output_bytes {
                lines.push(format!(
                    "{}Size: {} → {}",
                    indent(1),
                    format_bytes(item.input_bytes),
                    format_bytes(out_bytes)
                ));
            }
        }
        ItemStatus::Copied => lines.push(format!("{}  copied", item.id)),
        ItemStatus::Skipped => lines.push(format!("{}  skipped (no rule)", item.id)),
        ItemStatus::Failed => {
            lines.push(format!("{}  FAILED", item.id));
            if let Some(error) = &item.error {
                lines.push(format!("{}Error: {}", indent(1), error));
            }
        }
    }
    lines
}

/// Format the end-of-run summary.
pub fn format_run_summary(report: &RunReport) -> Vec<String> {
    vec![String::new(), report.to_string()]
}

pub fn print_item(item: &ItemReport) {
    for line in format_item(item) {
        println!("{}", line);
    }
}

pub fn print_run_summary(report: &RunReport) {
    for line in format_run_summary(report) {
        println!("{}", line);
    }
}

/// Format the result of a single-file command.
pub fn format_single(
    input: &str,
    output: &str,
    input_bytes: usize,
    image: &EncodedImage,
) -> Vec<String> {
    vec![
        format!("{} → {} ({})", input, output, image.format),
        format!(
            "{}{}x{}, {} → {}",
            indent(1),
            image.dimensions.width,
            image.dimensions.height,
            format_bytes(input_bytes),
            format_bytes(image.bytes.len())
        ),
    ]
}

pub fn print_single(input: &str, output: &str, input_bytes: usize, image: &EncodedImage) {
    for line in format_single(input, output, input_bytes, image) {
        println!("{}", line);
    }
}
