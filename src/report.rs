//! Human-readable and JSON renderings of a growth comparison.

use std::fmt;
use std::path::Path;

use crate::error::Result;
use crate::growth::GrowthStatus;
use crate::models::{GrowthComparison, ImageAnalysis};

const RULE_WIDTH: usize = 60;

/// Plain-text summary of `comparison`.
pub fn render_text(comparison: &GrowthComparison) -> String {
    TextReport(comparison).to_string()
}

struct TextReport<'a>(&'a GrowthComparison);

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let GrowthComparison {
            before,
            after,
            growth,
        } = self.0;
        let rule = "-".repeat(RULE_WIDTH);

        writeln!(f, "PLANT GROWTH ANALYSIS")?;
        writeln!(f, "{rule}")?;
        write_image(f, "Before", before)?;
        write_image(f, "After", after)?;
        writeln!(f, "{rule}")?;
        writeln!(f, "Absolute change: {:+.2}%", growth.absolute_growth)?;
        writeln!(f, "Relative change: {}", growth.relative_growth)?;

        match growth.status() {
            GrowthStatus::Positive => {
                writeln!(f, "Growth status:   Positive growth")?;
                if let Some(assessment) = growth.assessment() {
                    writeln!(f, "Assessment:      {}", assessment.description())?;
                }
            }
            GrowthStatus::Negative => {
                writeln!(f, "Growth status:   Negative change")?;
                writeln!(
                    f,
                    "Coverage decreased by {:.2}% from {:.2}% to {:.2}%.",
                    growth.absolute_growth.abs(),
                    growth.before_percentage,
                    growth.after_percentage
                )?;
            }
            GrowthStatus::Stable => {
                writeln!(f, "Growth status:   Stable")?;
                writeln!(f, "No change in plant coverage detected.")?;
            }
        }
        Ok(())
    }
}

fn write_image(f: &mut fmt::Formatter<'_>, title: &str, analysis: &ImageAnalysis) -> fmt::Result {
    let name = analysis
        .source
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| analysis.source.display().to_string());
    writeln!(f, "{title}: {name}")?;
    writeln!(
        f,
        "  Plant coverage: {:.2}% ({} of {} pixels)",
        analysis.coverage.percentage,
        analysis.coverage.foliage_pixel_count,
        analysis.coverage.total_pixel_count
    )?;
    if analysis.panels.is_fallback() {
        writeln!(f, "  Panels: none detected, whole image measured")?;
    }
    Ok(())
}

impl GrowthComparison {
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn export_json(&self, path: &Path) -> Result<()> {
        let json = self.to_json_pretty().map_err(std::io::Error::other)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn export_text(&self, path: &Path) -> Result<()> {
        std::fs::write(path, render_text(self))?;
        Ok(())
    }
}
