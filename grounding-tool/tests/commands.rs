use anyhow::Result;
use bbox::CoordinateSystem;
use grounding_tool::commands;
use label::{load_samples, Sample};
use rendezvous::{FileFlag, GateConfig, Role, WaitOptions};
use std::{fs, path::Path, time::Duration};

const ANNOTATIONS: &str = r#"[
  {
    "image": "a.png",
    "conversations": [
      {"from": "human", "value": "<image>\nLocate the cup."},
      {"from": "gpt", "value": "{\"bbox_2d\": [100, 200, 400, 600], \"label\": \"cup\"}"}
    ]
  },
  {
    "image": "b.png",
    "conversations": [
      {"from": "human", "value": "<image>\nLocate the people."},
      {"from": "gpt", "value": "[{\"point_2d\": [400, 300], \"label\": \"person\"}]"}
    ]
  }
]"#;

/// Writes a PNG signature and IHDR chunk, which is all a header reader needs.
fn write_png_header(path: &Path, width: u32, height: u32) -> Result<()> {
    let mut bytes = vec![0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];
    bytes.extend_from_slice(&13u32.to_be_bytes());
    bytes.extend_from_slice(b"IHDR");
    bytes.extend_from_slice(&width.to_be_bytes());
    bytes.extend_from_slice(&height.to_be_bytes());
    bytes.extend_from_slice(&[8, 2, 0, 0, 0]);
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    fs::write(path, bytes)?;
    Ok(())
}

#[test]
fn normalize_reads_image_sizes() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_png_header(&dir.path().join("a.png"), 1000, 500)?;
    write_png_header(&dir.path().join("b.png"), 800, 600)?;
    let input = dir.path().join("absolute.json");
    let output = dir.path().join("relative.json");
    fs::write(&input, ANNOTATIONS)?;

    let count = commands::normalize(
        &input,
        &output,
        CoordinateSystem::Absolute,
        CoordinateSystem::RelativeThousand,
        dir.path(),
    )?;
    assert_eq!(count, 2);

    let samples: Vec<Sample> = load_samples(&output)?;
    assert_eq!(
        samples[0].conversations[1].value,
        r#"{"bbox_2d":[100,400,400,1000],"label":"cup"}"#
    );
    assert_eq!(
        samples[1].conversations[1].value,
        r#"[{"point_2d":[500,500],"label":"person"}]"#
    );
    Ok(())
}

#[test]
fn normalize_fails_on_missing_image() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("absolute.json");
    fs::write(&input, ANNOTATIONS)?;
    let result = commands::normalize(
        &input,
        &dir.path().join("out.json"),
        CoordinateSystem::Absolute,
        CoordinateSystem::RelativeThousand,
        dir.path(),
    );
    assert!(result.is_err());
    Ok(())
}

#[test]
fn check_counts_regions_and_errors() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("relative.json");
    fs::write(&input, ANNOTATIONS)?;

    let report = commands::check(&input, CoordinateSystem::Absolute)?;
    assert!(report.is_ok());
    assert_eq!((report.samples, report.boxes, report.points), (2, 1, 1));

    // push one coordinate past the relative range
    fs::write(&input, ANNOTATIONS.replace("600]", "1600]"))?;
    let report = commands::check(&input, CoordinateSystem::RelativeThousand)?;
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.mismatched, 1);
    assert_eq!(report.errors[0].0, "a.png");
    Ok(())
}

#[test]
fn rescale_follows_smart_resize() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_png_header(&dir.path().join("a.png"), 1000, 500)?;
    write_png_header(&dir.path().join("b.png"), 800, 600)?;
    let input = dir.path().join("absolute.json");
    let output = dir.path().join("resized.json");
    fs::write(&input, ANNOTATIONS)?;

    commands::rescale(
        &input,
        &output,
        CoordinateSystem::Absolute,
        dir.path(),
        &Default::default(),
    )?;

    // 800x600 becomes 812x588 with the default factor of 28
    let samples: Vec<Sample> = load_samples(&output)?;
    assert_eq!(
        samples[1].conversations[1].value,
        r#"[{"point_2d":[406,294],"label":"person"}]"#
    );
    Ok(())
}

#[test]
fn convert_pointing_saves_skipped_items() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("points.jsonl");
    let output = dir.path().join("qwen.json");
    let malformed = dir.path().join("malformed.json");
    fs::write(
        &input,
        concat!(
            r#"{"id": 0, "image": "a.jpg", "conversations": [{"from": "user", "value": "Point at the <ref>cup</ref>"}, {"from": "assistant", "value": "<point>[[10, 20]]</point>"}]}"#,
            "\n",
            r#"{"id": 1, "image": "b.jpg", "conversations": [{"from": "user", "value": "Point at the <ref>cat</ref>"}, {"from": "assistant", "value": "The cat is absent."}]}"#,
            "\n",
        ),
    )?;

    commands::convert_pointing(&input, &output, Some(&malformed), CoordinateSystem::Absolute)?;

    let samples: Vec<Sample> = load_samples(&output)?;
    assert_eq!(samples.len(), 1);
    assert_eq!(
        samples[0].conversations[1].value,
        r#"[{"point_2d":[10,20],"label":"cup"}]"#
    );
    let skipped: Vec<serde_json::Value> = load_samples(&malformed)?;
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0]["id"], 1);
    Ok(())
}

#[cfg(unix)]
#[test]
fn gate_runs_preparation_command() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let marker = dir.path().join("downloaded");
    let options = WaitOptions::default()
        .poll_interval(Duration::from_millis(5))
        .timeout(Duration::from_secs(5));

    let command = vec!["touch".to_string(), marker.display().to_string()];
    commands::pass_gate(FileFlag::new(dir.path(), "run"), Role::Leader, &options, &command)?;
    assert!(marker.exists());

    // followers see the ready flag immediately
    commands::pass_gate(FileFlag::new(dir.path(), "run"), Role::Follower, &options, &[])?;

    commands::release_gate(FileFlag::new(dir.path(), "run"))?;
    commands::release_gate(FileFlag::new(dir.path(), "run"))?;
    assert!(!FileFlag::new(dir.path(), "run").path().exists());

    let failing = vec!["false".to_string()];
    let result = commands::pass_gate(FileFlag::new(dir.path(), "bad"), Role::Leader, &options, &failing);
    assert!(result.is_err());
    let result = commands::pass_gate(FileFlag::new(dir.path(), "bad"), Role::Follower, &options, &[]);
    assert!(result.is_err());
    Ok(())
}

#[test]
fn gate_requires_shared_flag_dir() -> Result<()> {
    let config = GateConfig::default();
    let err = commands::gate_flag(&config, None, "run").unwrap_err();
    assert!(format!("{:#}", err).contains("--flag-dir"));

    let flag = commands::gate_flag(&config, Some("/shared/flags".into()), "run")?;
    assert_eq!(flag.path(), Path::new("/shared/flags/rendezvous-run.flag"));

    let config = GateConfig {
        flag_dir: Some("/configured".into()),
        ..GateConfig::default()
    };
    let flag = commands::gate_flag(&config, None, "run")?;
    assert_eq!(flag.path(), Path::new("/configured/rendezvous-run.flag"));
    let flag = commands::gate_flag(&config, Some("/override".into()), "run")?;
    assert_eq!(flag.path(), Path::new("/override/rendezvous-run.flag"));
    Ok(())
}

#[test]
fn gate_rank_is_never_guessed() -> Result<()> {
    assert!(commands::resolve_rank(None, None).is_err());
    assert!(commands::resolve_rank(None, Some("node-3")).is_err());
    assert_eq!(commands::resolve_rank(None, Some("3"))?, 3);
    assert_eq!(commands::resolve_rank(Some(0), Some("3"))?, 0);
    assert_eq!(commands::resolve_rank(Some(2), None)?, 2);
    Ok(())
}
