use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;

const SMALL_SEARCH: &str = "\
// tiny search used by the CLI tests
thruster_type=1
num_individuals=8
survivor_count=2
max_generations=50
change_check=100
time_seed=NONE
best_count=2
write_freq=1
disp_freq=1
rk_tol=1e-8
max_numsteps=300
min_numsteps=50
triptime_min=6307200
triptime_max=12614400
time_res=86400
";

fn write_config(dir: &Path, text: &str) -> String {
    let path = dir.join("search.config");
    fs::write(&path, text).expect("write config");
    path.to_str().expect("utf-8 path").to_string()
}

fn optimize(config: &str, out: &Path) {
    Command::cargo_bin("optimize")
        .expect("optimize bin")
        .args([
            "--config",
            config,
            "--output-dir",
            out.to_str().unwrap(),
            "--seed",
            "5",
            "--max-generations",
            "2",
        ])
        .assert()
        .success();
}

#[test]
fn optimize_writes_every_record() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_config(dir.path(), SMALL_SEARCH);
    let out = dir.path().join("out");
    optimize(&config, &out);

    for name in [
        "orbitalMotion-5.bin",
        "finalOptimization-5.bin",
        "BestInGenerations-5.csv",
        "WorstInGenerations-5.csv",
        "BestThrustGens-5.csv",
        "WorstThrustGens-5.csv",
        "progressiveAnalysis-5.csv",
        "runSummary-5.json",
    ] {
        assert!(out.join(name).exists(), "missing {name}");
    }

    let best = fs::read_to_string(out.join("BestInGenerations-5.csv")).expect("best csv");
    assert!(best.starts_with("Gen #,posDiff,velDiff"));
    // header plus generations 0, 1 and 2
    assert_eq!(best.lines().count(), 4);

    let final_len = fs::metadata(out.join("finalOptimization-5.bin"))
        .expect("final record")
        .len();
    assert_eq!(final_len, 36 * 8);

    let summary = fs::read_to_string(out.join("runSummary-5.json")).expect("summary");
    assert!(summary.contains("\"reason\": \"Exhausted\""));
    assert!(summary.contains("\"seed\": 5"));
}

#[test]
fn trajectory_replays_the_recorded_genome() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_config(dir.path(), SMALL_SEARCH);
    let out = dir.path().join("out");
    optimize(&config, &out);

    let replay = dir.path().join("replay.bin");
    Command::cargo_bin("trajectory")
        .expect("trajectory bin")
        .args([
            "--config",
            &config,
            "--final",
            out.join("finalOptimization-5.bin").to_str().unwrap(),
            "--output",
            replay.to_str().unwrap(),
        ])
        .assert()
        .success();

    let original = fs::read(out.join("orbitalMotion-5.bin")).expect("recorded trajectory");
    let replayed = fs::read(&replay).expect("replayed trajectory");
    assert!(!original.is_empty());
    assert_eq!(original.len() % (11 * 8), 0);
    assert_eq!(original, replayed);
}

#[test]
fn strict_mode_rejects_unknown_keys() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_config(dir.path(), "bogus_key=1\n");
    Command::cargo_bin("optimize")
        .expect("optimize bin")
        .args(["--config", &config, "--strict"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("bogus_key"));
}

#[test]
fn missing_final_record_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_config(dir.path(), SMALL_SEARCH);
    Command::cargo_bin("trajectory")
        .expect("trajectory bin")
        .args([
            "--config",
            &config,
            "--final",
            dir.path().join("absent.bin").to_str().unwrap(),
            "--output",
            dir.path().join("never.bin").to_str().unwrap(),
        ])
        .assert()
        .failure();
}
