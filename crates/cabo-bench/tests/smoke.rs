use std::fs;

use cabo_bench::config::BenchmarkConfig;
use cabo_bench::runner::DecisionRunner;
use tempfile::tempdir;

const DECISIONS_PER_SCENARIO: usize = 6;

fn load_config(output_dir: &std::path::Path) -> BenchmarkConfig {
    let yaml = format!(
        r#"
run_id: "test_smoke"
scenarios:
  seed: 4242
  count: 2
  players: 3
  hand_size: 4
agents:
  - name: "novice"
    tier: "novice"
    max_iterations: 20
    rollout_depth: 10
  - name: "expert"
    tier: "expert"
    max_iterations: 40
    rollout_depth: 10
outputs:
  jsonl: "{jsonl}"
  summary_md: "{summary}"
metrics:
  latency_budget_ms: 5000
logging:
  enable_structured: false
"#,
        jsonl = output_dir.join("decisions.jsonl").display(),
        summary = output_dir.join("summary.md").display(),
    );

    let mut cfg: BenchmarkConfig = serde_yaml::from_str(&yaml).expect("valid yaml");
    cfg.validate().expect("config validates");
    cfg
}

#[test]
fn smoke_run_writes_one_row_per_decision() {
    let dir = tempdir().expect("temp dir");
    let config = load_config(dir.path());
    let outputs = config.resolved_outputs();

    let runner = DecisionRunner::new(config, outputs).expect("runner created");
    let summary = runner.run().expect("run completes");

    assert_eq!(summary.scenarios, 2);
    assert_eq!(summary.agents, 2);
    assert_eq!(summary.rows_written, 2 * 2 * DECISIONS_PER_SCENARIO);
    assert!(summary.telemetry_path.is_none());

    let jsonl = fs::read_to_string(&summary.jsonl_path).expect("jsonl readable");
    let rows: Vec<serde_json::Value> = jsonl
        .lines()
        .map(|line| serde_json::from_str(line).expect("row decodes to JSON"))
        .collect();
    assert_eq!(rows.len(), summary.rows_written);
    for row in &rows {
        assert_eq!(row["run_id"], "test_smoke");
        // A novice can forget every own card, leaving a declare action nothing to name.
        let may_fail = row["agent"] == "novice" && row["decision"] == "action_targets";
        if !may_fail {
            assert_eq!(row["ok"], true, "decision failed: {row}");
        }
        assert!(row["latency_ms"].as_f64().expect("latency") >= 0.0);
    }
    assert_eq!(rows[0]["agent"], "novice");
    assert_eq!(rows[0]["decision"], "turn_action");
    assert_eq!(rows.last().expect("rows")["agent"], "expert");

    let markdown = fs::read_to_string(&summary.summary_path).expect("summary readable");
    assert!(markdown.contains("| novice | novice | 12 |"));
    assert!(markdown.contains("| expert | expert | 12 | 0 |"));
}

#[test]
fn scenarios_are_stable_across_runs() {
    let first = tempdir().expect("temp dir");
    let second = tempdir().expect("temp dir");

    let strip = |path: &std::path::Path| -> Vec<String> {
        fs::read_to_string(path)
            .expect("jsonl readable")
            .lines()
            .map(|line| {
                let mut value: serde_json::Value = serde_json::from_str(line).expect("json");
                if let Some(obj) = value.as_object_mut() {
                    obj.remove("latency_ms");
                    obj.remove("answer");
                }
                value.to_string()
            })
            .collect()
    };

    let mut paths = Vec::new();
    for dir in [&first, &second] {
        let config = load_config(dir.path());
        let outputs = config.resolved_outputs();
        let summary = DecisionRunner::new(config, outputs)
            .expect("runner")
            .run()
            .expect("run");
        paths.push(summary.jsonl_path);
    }
    assert_eq!(strip(&paths[0]), strip(&paths[1]));
}
