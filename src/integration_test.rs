use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{ALGORITHMS_CSV, CONSOLE_LOG, CURRENT_OUTPUT_MARKER, DATA_CSV, MODELS_CSV};
use crate::{reset, run_benchmark};

struct Workspace {
    _dir: tempfile::TempDir,
    config: PathBuf,
    output: PathBuf,
}

fn workspace(profile: &str, models: &str) -> Workspace {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config = dir.path().join("config");
    let output = dir.path().join("output");
    let resources = dir.path().join("resources");
    let models_dir = resources.join("models");

    fs::create_dir_all(&config).unwrap();
    fs::create_dir_all(models_dir.join("alpha")).unwrap();
    fs::write(models_dir.join("alpha").join("model.xml"), "A").unwrap();
    fs::write(models_dir.join("beta.txt"), "BB").unwrap();

    fs::write(
        config.join("paths.toml"),
        format!("output = {:?}\nresources = {:?}\n", output, resources),
    )
    .unwrap();
    fs::write(config.join("bench.toml"), profile).unwrap();
    fs::write(config.join("models.txt"), models).unwrap();

    Workspace {
        _dir: dir,
        config,
        output,
    }
}

fn data_dir(output: &Path) -> PathBuf {
    let marker = fs::read_to_string(output.join(CURRENT_OUTPUT_MARKER)).unwrap();
    output.join(marker.trim()).join("data")
}

fn rows(dir: &Path, file: &str) -> Vec<String> {
    fs::read_to_string(dir.join(file))
        .unwrap()
        .lines()
        .skip(1)
        .map(str::to_string)
        .collect()
}

const PROFILE: &str = r#"
timeout_ms = 500
algorithm_iterations = 2

[[algorithms]]
name = "cat"
settings = "plain"
program = "sh"
args = ["-c", "echo value: $(cat {model}) {seed}"]
result_prefix = "value:"

[[algorithms]]
name = "sleeper"
program = "sleep"
args = ["5"]
iterations = 1

[[algorithms]]
name = "noisy"
program = "sh"
args = ["-c", "echo oops >&2"]
"#;

#[tokio::test]
async fn test_full_benchmark() {
    let ws = workspace(
        &format!("seed = 10\n{PROFILE}"),
        "alpha\n# skipped\nbeta\ngamma\n",
    );

    let summary = run_benchmark(&ws.config, Some("bench"))
        .await
        .expect("Benchmark should run");

    // alpha and beta: 2 cat + 1 sleeper + 2 noisy, gamma has no model
    assert_eq!(summary.runs, 10);
    assert_eq!(summary.timeouts, 2);
    assert_eq!(summary.errors, 4);
    assert_eq!(summary.skipped_systems, 1);

    let data = data_dir(&ws.output);
    assert_eq!(
        rows(&data, ALGORITHMS_CSV),
        [
            "1;0;cat;plain",
            "1;1;sleeper;",
            "1;2;noisy;",
            "2;0;cat;plain",
            "2;1;sleeper;",
            "2;2;noisy;",
            "3;0;cat;plain",
            "3;1;sleeper;",
            "3;2;noisy;",
        ]
    );

    let models = rows(&data, MODELS_CSV);
    assert_eq!(models.len(), 2);
    assert!(models[0].starts_with("1;alpha;"));
    assert!(models[0].ends_with("model.xml;1"));
    assert!(models[1].starts_with("2;beta;"));
    assert!(models[1].ends_with("beta.txt;2"));

    let runs = rows(&data, DATA_CSV);
    assert_eq!(runs.len(), 10);
    // system iteration 1 runs with seed + 1
    assert!(runs[0].starts_with("1;0;1;1;true;true;"));
    assert!(runs[0].ends_with(";A 11"));
    assert!(runs[1].starts_with("1;0;1;2;true;true;"));
    assert!(runs[2].starts_with("1;1;1;1;false;true;"));
    assert!(runs[3].starts_with("1;2;1;1;true;false;"));
    assert!(runs[5].ends_with(";BB 11"));

    let log_dir = fs::read_dir(data.parent().unwrap())
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .find(|path| path.file_name().unwrap().to_string_lossy().starts_with("log-"))
        .expect("Log directory should exist");
    let log = fs::read_to_string(log_dir.join(CONSOLE_LOG)).unwrap();
    assert!(log.contains("Process killed after timeout"));
}

#[tokio::test]
async fn test_append_and_reset() {
    let ws = workspace(
        "append = true\n[[algorithms]]\nname = \"true\"\nprogram = \"true\"\n",
        "alpha\n",
    );

    run_benchmark(&ws.config, Some("bench")).await.unwrap();
    let first = data_dir(&ws.output);
    run_benchmark(&ws.config, Some("bench")).await.unwrap();

    assert_eq!(data_dir(&ws.output), first);
    assert_eq!(rows(&first, DATA_CSV).len(), 2);
    assert_eq!(rows(&first, MODELS_CSV).len(), 2);

    reset(&ws.config, Some("bench")).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    run_benchmark(&ws.config, Some("bench")).await.unwrap();

    let second = data_dir(&ws.output);
    assert_ne!(second, first);
    assert_eq!(rows(&second, DATA_CSV).len(), 1);
}

#[tokio::test]
async fn test_nothing_to_do() {
    let ws = workspace(
        "system_iterations = 0\n[[algorithms]]\nname = \"true\"\nprogram = \"true\"\n",
        "alpha\n",
    );

    let summary = run_benchmark(&ws.config, Some("bench")).await.unwrap();

    assert_eq!(summary.runs, 0);
    assert!(rows(&data_dir(&ws.output), DATA_CSV).is_empty());
}

#[tokio::test]
async fn test_missing_models_list() {
    let ws = workspace("", "");
    fs::remove_file(ws.config.join("models.txt")).unwrap();

    let result = run_benchmark(&ws.config, Some("bench")).await;

    assert!(result.is_err());
}
