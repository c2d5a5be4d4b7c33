use std::fs;
use std::path::Path;
use std::process::{Command, Output};

const RAW_HEADER: &str = "Worker_Thread_Count,branch,Schedule_Queue_Count,Schedule_Queue_Type,\
Model,Number_of_Objects,Events_Processed,Events_Committed,Simulation_Runtime_(secs.),\
Primary_Rollbacks,Secondary_Rollbacks";

/// Two queue counts, two branches, three thread counts, two repetitions each.
fn raw_csv() -> String {
    let mut csv = format!("{RAW_HEADER}\n");
    for queues in [4, 1] {
        for branch in ["main", "dev"] {
            for (threads, runtime) in [(16, 20.0), (2, 80.0), (4, 45.0)] {
                for rep in 0..2 {
                    let runtime = runtime + rep as f64 + queues as f64;
                    csv.push_str(&format!(
                        "{threads},{branch},{queues},splay,smmp,10000,{},{},{runtime},{},{}\n",
                        1_200_000 + rep * 1000,
                        1_000_000,
                        300 + rep,
                        50
                    ));
                }
            }
        }
    }
    csv
}

fn source_dir(root: &Path) -> std::path::PathBuf {
    let dir = root.join("smmp");
    fs::create_dir(&dir).unwrap();
    fs::write(dir.join("scheduleq.csv"), raw_csv()).unwrap();
    fs::write(dir.join("sequential.dat"), "10000 1 120.0\n").unwrap();
    dir
}

fn simstats(config_home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_simstats"))
        .args(args)
        .env("XDG_CONFIG_HOME", config_home)
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to run simstats")
}

#[test]
fn stats_writes_one_row_per_branch_and_thread_count() {
    let root = tempfile::tempdir().unwrap();
    let dir = source_dir(root.path());
    let out = simstats(root.path(), &["stats", dir.to_str().unwrap()]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let summary =
        fs::read_to_string(dir.join("stats/scheduleq/threads_vs_type_key_count_4.csv")).unwrap();
    let mut lines = summary.lines();
    let header: Vec<&str> = lines.next().unwrap().split(',').collect();
    assert_eq!(&header[..3], ["Worker_Thread_Count", "branch", "Schedule_Queue_Count"]);
    assert_eq!(
        &header[3..9],
        [
            "Event_Processing_Rate_(per_sec)_Mean",
            "Event_Processing_Rate_(per_sec)_CI_Lower",
            "Event_Processing_Rate_(per_sec)_CI_Upper",
            "Event_Processing_Rate_(per_sec)_Median",
            "Event_Processing_Rate_(per_sec)_Lower_Quartile",
            "Event_Processing_Rate_(per_sec)_Upper_Quartile",
        ]
    );
    assert_eq!(header.len(), 3 + 4 * 6);

    let keys: Vec<(String, String)> = lines
        .map(|l| {
            let cells: Vec<&str> = l.split(',').collect();
            (cells[1].to_string(), cells[0].to_string())
        })
        .collect();
    let expected = [
        ("dev", "2"),
        ("dev", "4"),
        ("dev", "16"),
        ("main", "2"),
        ("main", "4"),
        ("main", "16"),
    ];
    assert_eq!(keys.len(), expected.len());
    for ((b, t), (eb, et)) in keys.iter().zip(expected) {
        assert_eq!((b.as_str(), t.as_str()), (eb, et));
    }

    assert!(dir.join("stats/scheduleq/threads_vs_count_key_type_splay.csv").is_file());
    let charts = fs::read_dir(dir.join("plots/scheduleq")).unwrap().count();
    assert_eq!(charts, 3 * 4);
}

#[test]
fn stats_splits_summaries_by_filter_value() {
    let root = tempfile::tempdir().unwrap();
    let dir = source_dir(root.path());
    assert!(simstats(root.path(), &["stats", dir.to_str().unwrap()]).status.success());

    for queues in ["1", "4"] {
        let path = dir.join(format!("stats/scheduleq/threads_vs_type_key_count_{queues}.csv"));
        let summary = fs::read_to_string(path).unwrap();
        let rows: Vec<Vec<&str>> = summary
            .lines()
            .skip(1)
            .map(|l| l.split(',').collect())
            .collect();
        assert_eq!(rows.len(), 6);
        assert!(rows.iter().all(|r| r[2] == queues), "{queues}: {rows:?}");
    }

    // Both queue counts land in the single queue-type file, grouped without them.
    let by_type_path = dir.join("stats/scheduleq/threads_vs_count_key_type_splay.csv");
    let by_type = fs::read_to_string(by_type_path).unwrap();
    assert_eq!(by_type.lines().count(), 1 + 6);
    assert_eq!(fs::read_dir(dir.join("stats/scheduleq")).unwrap().count(), 3);
}

#[test]
fn rerun_on_unchanged_input_is_byte_identical() {
    let root = tempfile::tempdir().unwrap();
    let dir = source_dir(root.path());
    let summary = dir.join("stats/scheduleq/threads_vs_count_key_type_splay.csv");

    assert!(simstats(root.path(), &["stats", dir.to_str().unwrap()]).status.success());
    let first = fs::read(&summary).unwrap();
    assert!(simstats(root.path(), &["stats", dir.to_str().unwrap()]).status.success());
    assert_eq!(first, fs::read(&summary).unwrap());
}

#[test]
fn missing_baseline_fails_without_outputs() {
    let root = tempfile::tempdir().unwrap();
    let dir = source_dir(root.path());
    fs::remove_file(dir.join("sequential.dat")).unwrap();

    let out = simstats(root.path(), &["stats", dir.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("Sequential data not available"));
    assert!(!dir.join("stats").exists());
    assert!(!dir.join("plots").exists());
}

#[test]
fn missing_raw_data_is_reported() {
    let root = tempfile::tempdir().unwrap();
    let dir = source_dir(root.path());
    let out = simstats(root.path(), &["stats", dir.to_str().unwrap(), "--raw-name", "ladderq"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("LADDERQ raw data not available"));
}

#[test]
fn json_report_lists_baseline_and_outputs() {
    let root = tempfile::tempdir().unwrap();
    let dir = source_dir(root.path());
    let out = simstats(root.path(), &["--json", "stats", dir.to_str().unwrap()]);
    assert!(out.status.success());
    let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report["command"], "stats");
    assert_eq!(report["baseline"]["object_count"], "10000");
    assert_eq!(report["summaries"].as_array().unwrap().len(), 3);
    assert!(report["skipped"].as_array().unwrap().is_empty());
}

const FLAT_CSV: &str = "branch,Worker_Thread_Count,Simulation_Runtime_(secs.),Events_Processed,\
Model,Average_Memory_Usage_(MB)\n\
main,2,80,1000000,smmp,512\nmain,4,45,1100000,smmp,530\n\
dev,2,82,990000,smmp,505\ndev,4,44,1050000,smmp,540\n";

#[test]
fn plot_writes_charts_next_to_input() {
    let root = tempfile::tempdir().unwrap();
    let file = root.path().join("results.csv");
    fs::write(&file, FLAT_CSV).unwrap();

    let out = simstats(root.path(), &["plot", file.to_str().unwrap()]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let chart = root
        .path()
        .join("output_plots/Thread_count_branch_vs_Simulation_time.svg");
    assert!(chart.is_file());
    assert_eq!(fs::read_dir(root.path().join("output_plots")).unwrap().count(), 3);
}

#[test]
fn unified_overlays_every_matched_source() {
    let root = tempfile::tempdir().unwrap();
    for model in ["phold", "smmp"] {
        let dir = root.path().join("runs").join(model);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("results.csv"), FLAT_CSV.replace(",smmp,", ",x,")).unwrap();
    }
    let pattern = format!("{}/runs/*", root.path().display());

    let out = simstats(root.path(), &["unified", &pattern]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let chart = root
        .path()
        .join("runs/Unified_Average_Memory_Usage_by_Model_and_Branch.svg");
    let svg = fs::read_to_string(chart).unwrap();
    assert!(svg.contains("phold - main"));
    assert!(svg.contains("smmp - dev"));
}

#[test]
fn unified_without_sources_fails() {
    let root = tempfile::tempdir().unwrap();
    let pattern = format!("{}/nothing-*", root.path().display());
    assert_eq!(simstats(root.path(), &["unified", &pattern]).status.code(), Some(1));
}

#[test]
fn usage_errors_exit_one_and_help_exits_zero() {
    let root = tempfile::tempdir().unwrap();
    assert_eq!(simstats(root.path(), &[]).status.code(), Some(1));
    assert_eq!(simstats(root.path(), &["plot"]).status.code(), Some(1));
    assert!(simstats(root.path(), &["--help"]).status.success());
}
