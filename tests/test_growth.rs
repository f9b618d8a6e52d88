mod common;

use common::*;
use plant_growth::{GrowthAssessment, GrowthStatus, RelativeGrowth, render_text};

#[test]
fn test_compare_twenty_to_thirty() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let before = save_png(dir.path(), "week1.png", &coverage_image(20));
    let after = save_png(dir.path(), "week2.png", &coverage_image(30));

    let analyzer = analyzer_with(Vec::new(), AnalysisConfig::default());
    let comparison = analyzer.compare_images(&before, &after)?;

    assert_eq!(comparison.before.coverage.percentage, 20.0);
    assert_eq!(comparison.after.coverage.percentage, 30.0);
    assert_eq!(comparison.growth.absolute_growth, 10.0);
    assert_eq!(comparison.growth.relative_growth, RelativeGrowth::Percent(50.0));
    assert_eq!(comparison.growth.status(), GrowthStatus::Positive);
    assert_eq!(comparison.growth.assessment(), Some(GrowthAssessment::Good));
    Ok(())
}

#[test]
fn test_compare_from_bare_soil() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let before = save_png(dir.path(), "seeded.png", &coverage_image(0));
    let after = save_png(dir.path(), "sprouted.png", &coverage_image(10));

    let analyzer = analyzer_with(Vec::new(), AnalysisConfig::default());
    let comparison = analyzer.compare_images(&before, &after)?;

    assert_eq!(comparison.growth.absolute_growth, 10.0);
    assert!(comparison.growth.relative_growth.is_undefined());
    assert!(render_text(&comparison).contains("undefined"));
    Ok(())
}

#[test]
fn test_compare_fails_if_either_image_is_bad() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let before = save_png(dir.path(), "ok.png", &coverage_image(20));
    let after = dir.path().join("bad.png");
    std::fs::write(&after, b"garbage")?;

    let analyzer = analyzer_with(Vec::new(), AnalysisConfig::default());
    let err = analyzer.compare_images(&before, &after).unwrap_err();
    assert!(matches!(err, PlantError::ImageDecode { .. }));
    Ok(())
}

#[test]
fn test_same_file_names_get_distinct_debug_output() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    std::fs::create_dir(dir.path().join("a"))?;
    std::fs::create_dir(dir.path().join("b"))?;
    let before = save_png(&dir.path().join("a"), "plant.png", &coverage_image(20));
    let after = save_png(&dir.path().join("b"), "plant.png", &coverage_image(30));
    let debug_dir = dir.path().join("debug");

    let analyzer = analyzer_with(
        Vec::new(),
        AnalysisConfig {
            debug_dir: Some(debug_dir.clone()),
            ..Default::default()
        },
    );
    analyzer.compare_images(&before, &after)?;

    assert!(debug_dir.join("00_input/before_plant.png").is_file());
    assert!(debug_dir.join("00_input/after_plant.png").is_file());
    assert!(debug_dir.join("detections_before_plant.png").is_file());
    Ok(())
}

#[test]
fn test_exported_json_round_trips_values() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let before = save_png(dir.path(), "week1.png", &coverage_image(40));
    let after = save_png(dir.path(), "week2.png", &coverage_image(30));

    let analyzer = analyzer_with(Vec::new(), AnalysisConfig::default());
    let comparison = analyzer.compare_images(&before, &after)?;
    let json_path = dir.path().join("growth.json");
    comparison.export_json(&json_path)?;

    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&json_path)?)?;
    assert_eq!(json["growth"]["absolute_growth"], -10.0);
    assert_eq!(json["before"]["panels"]["kind"], "whole_image");
    assert_eq!(comparison.growth.assessment(), None);
    Ok(())
}
