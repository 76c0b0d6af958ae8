use std::fs;

use attention::Precision;
use tempfile::tempdir;
use transformer_blocks::{ConfigError, DemoConfig};

#[test]
fn loads_partial_toml_over_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("demo.toml");
    fs::write(
        &path,
        r#"
seed = 7
d_model = 16
n_heads = 4

[attention]
precision = "inherit"
"#,
    )
    .unwrap();

    let cfg = DemoConfig::from_path(&path).unwrap();
    assert_eq!(cfg.seed, 7);
    assert_eq!(cfg.d_model, 16);
    assert_eq!(cfg.n_heads, 4);
    assert_eq!(cfg.seq_len, DemoConfig::default().seq_len);
    assert_eq!(cfg.attention.precision, Precision::Inherit);
    assert_eq!(cfg.attention.mask_sentinel, -1e9);
}

#[test]
fn loads_json() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("demo.json");
    fs::write(&path, r#"{ "seq_len": 6, "epsilon": 1e-6 }"#).unwrap();

    let cfg = DemoConfig::from_path(&path).unwrap();
    assert_eq!(cfg.seq_len, 6);
    assert_eq!(cfg.epsilon, 1e-6);
}

#[test]
fn rejects_indivisible_heads_after_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("demo.toml");
    fs::write(&path, "d_model = 16\nn_heads = 5\n").unwrap();

    match DemoConfig::from_path(&path) {
        Err(ConfigError::Validation(errors)) => {
            assert!(errors.iter().any(|e| e.contains("divisible by n_heads")));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn rejects_positive_mask_sentinel() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("demo.toml");
    fs::write(&path, "[attention]\nmask_sentinel = 1.0\n").unwrap();
    assert!(matches!(
        DemoConfig::from_path(&path),
        Err(ConfigError::Validation(_))
    ));
}

#[test]
fn unknown_extension_is_a_format_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("demo.yaml");
    fs::write(&path, "seed: 1\n").unwrap();
    assert!(matches!(
        DemoConfig::from_path(&path),
        Err(ConfigError::Format(_))
    ));
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempdir().unwrap();
    assert!(matches!(
        DemoConfig::from_path(dir.path().join("absent.toml")),
        Err(ConfigError::Io(_))
    ));
}
