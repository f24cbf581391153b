//! End-to-end build pipeline tests over real directory and zip inputs

mod common;

use common::TestProject;
use zip_meta_map::builder::{build, BuildOptions};
use zip_meta_map::schema::Role;
use zip_meta_map::MetaMapError;

#[test]
fn build_is_deterministic() {
    let project = TestProject::new();
    project.python_project();

    let first = build(project.path(), &BuildOptions::default()).unwrap();
    let second = build(project.path(), &BuildOptions::default()).unwrap();

    assert_eq!(first.index.to_json_pretty(), second.index.to_json_pretty());
    assert_eq!(first.front, second.front);
}

#[test]
fn python_project_classifies_and_ranks() {
    let project = TestProject::new();
    project.python_project();

    let output = build(project.path(), &BuildOptions::default()).unwrap();
    let index = output.index;

    assert_eq!(index.profile, "python_cli");
    assert_eq!(index.format, "zip-meta-map");

    let main = index.file("main.py").unwrap();
    assert_eq!(main.role, Role::Entrypoint);
    assert!(main.confidence >= 0.90);

    let test = index.file("tests/test_core.py").unwrap();
    assert_eq!(test.role, Role::Test);

    assert_eq!(index.start_here.first().map(String::as_str), Some("README.md"));
    assert!(index.start_here.contains(&"main.py".to_string()));

    // Start-here files carry excerpts
    assert!(index.file("README.md").unwrap().excerpt.is_some());
}

#[test]
fn file_entries_are_sorted_by_path() {
    let project = TestProject::new();
    project
        .add_file("zebra.py", "z = 1\n")
        .add_file("alpha.py", "a = 1\n")
        .add_file("mid/beta.py", "b = 1\n");

    let output = build(project.path(), &BuildOptions::default()).unwrap();
    let paths: Vec<&str> = output.index.files.iter().map(|f| f.path.as_str()).collect();
    let mut sorted = paths.clone();
    sorted.sort();
    assert_eq!(paths, sorted);
}

#[test]
fn capabilities_reflect_populated_features() {
    let project = TestProject::new();
    project.python_project();

    let index = build(project.path(), &BuildOptions::default()).unwrap().index;
    let caps = index.capabilities.clone().unwrap_or_default();

    assert_eq!(
        caps.contains(&"excerpts".to_string()),
        index.files.iter().any(|f| f.excerpt.is_some())
    );
    assert_eq!(
        caps.contains(&"chunks".to_string()),
        index.files.iter().any(|f| f.chunks.is_some())
    );
    assert_eq!(caps.contains(&"modules".to_string()), index.modules.is_some());
    assert_eq!(
        caps.contains(&"warnings".to_string()),
        index.warnings.is_some()
    );
}

#[test]
fn large_markdown_gets_chunked() {
    let project = TestProject::new();
    let mut doc = String::from("intro text\n");
    for section in 0..4 {
        doc.push_str(&format!("# Section {section}\n"));
        for line in 0..220 {
            doc.push_str(&format!("filler line {section}-{line} with some padding text\n"));
        }
    }
    assert!(doc.len() >= 32 * 1024);
    project.add_file("GUIDE.md", &doc);

    let index = build(project.path(), &BuildOptions::default()).unwrap().index;
    let chunks = index.file("GUIDE.md").unwrap().chunks.clone().unwrap();
    assert!(chunks.len() >= 4);
    assert!(chunks.iter().any(|c| c.heading.is_some()));

    // Chunks partition the file with no gaps
    assert_eq!(chunks[0].start_line, 1);
    for pair in chunks.windows(2) {
        assert_eq!(pair[1].start_line, pair[0].end_line + 1);
    }
}

#[test]
fn zip_input_matches_directory_semantics() {
    let project = TestProject::new();
    let zip_path = project.write_zip(
        "proj.zip",
        &[
            ("README.md", b"# Zipped\n".as_slice()),
            ("pyproject.toml", b"[project]\n"),
            ("main.py", b"print('hi')\n"),
        ],
    );

    let output = build(&zip_path, &BuildOptions::default()).unwrap();
    assert_eq!(output.project_name, "proj");
    assert_eq!(output.index.profile, "python_cli");
    assert_eq!(output.index.files.len(), 3);
    assert_eq!(output.index.file("main.py").unwrap().role, Role::Entrypoint);
}

#[test]
fn non_zip_file_is_rejected() {
    let project = TestProject::new();
    project.add_file("notes.txt", "hello");

    let err = build(&project.path().join("notes.txt"), &BuildOptions::default()).unwrap_err();
    assert!(matches!(err, MetaMapError::UnsupportedInput { .. }));
}

#[test]
fn missing_input_is_reported() {
    let err = build(
        std::path::Path::new("/nonexistent/place"),
        &BuildOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, MetaMapError::InputNotFound { .. }));
}

#[test]
fn policy_hides_files_and_caps_plans() {
    let project = TestProject::new();
    project.python_project();
    project.add_file(
        "META_ZIP_POLICY.json",
        r#"{
  "ignore_extra": ["src/util.py"],
  "plan_budgets": {"overview": 2048}
}"#,
    );

    let options = BuildOptions {
        policy_path: Some(project.path().join("META_ZIP_POLICY.json")),
        ..Default::default()
    };
    let index = build(project.path(), &options).unwrap().index;

    assert!(index.file("src/util.py").is_none());
    assert!(index.file("src/core.py").is_some());
    assert_eq!(index.plans["overview"].max_total_bytes, Some(2048));
    assert_eq!(index.policy_applied, Some(true));
    assert!(index.ignore.contains(&"src/util.py".to_string()));
}

#[test]
fn malformed_policy_is_a_schema_error() {
    let project = TestProject::new();
    project.python_project();
    project.add_file("META_ZIP_POLICY.json", "{not json");

    let options = BuildOptions {
        policy_path: Some(project.path().join("META_ZIP_POLICY.json")),
        ..Default::default()
    };
    let err = build(project.path(), &options).unwrap_err();
    assert!(matches!(err, MetaMapError::InvalidPolicy { .. }));
}

#[test]
fn output_dir_receives_front_and_index() {
    let project = TestProject::new();
    project.python_project();
    let out_dir = project.path().join("meta");

    let options = BuildOptions {
        output_dir: Some(out_dir.clone()),
        ..Default::default()
    };
    let output = build(project.path(), &options).unwrap();

    let front_disk = std::fs::read_to_string(out_dir.join("META_ZIP_FRONT.md")).unwrap();
    assert_eq!(front_disk, output.front);

    let index_disk = std::fs::read_to_string(out_dir.join("META_ZIP_INDEX.json")).unwrap();
    let parsed: zip_meta_map::Index = serde_json::from_str(&index_disk).unwrap();
    assert_eq!(parsed.files.len(), output.index.files.len());
    assert_eq!(parsed.profile, output.index.profile);
}

#[test]
fn forced_profile_overrides_detection() {
    let project = TestProject::new();
    project.python_project();

    let options = BuildOptions {
        profile: zip_meta_map::profiles::by_name("node_ts_tool"),
        ..Default::default()
    };
    let index = build(project.path(), &options).unwrap().index;
    assert_eq!(index.profile, "node_ts_tool");
}

#[test]
fn node_project_detects_profile_and_classifies() {
    let project = TestProject::new();
    project.node_project();

    let index = build(project.path(), &BuildOptions::default()).unwrap().index;

    assert_eq!(index.profile, "node_ts_tool");
    assert_eq!(index.file("README.md").unwrap().role, Role::Doc);
    assert_eq!(index.file("package.json").unwrap().role, Role::Config);
    assert_eq!(index.file("tsconfig.json").unwrap().role, Role::Config);
    assert_eq!(index.file("src/index.ts").unwrap().role, Role::Entrypoint);

    assert!(index.file("node_modules/left-pad/index.js").is_none());

    assert!(index.start_here.contains(&"README.md".to_string()));
    assert!(index.plans.contains_key("overview"));
    assert!(index.plans.contains_key("debug"));
}

#[test]
fn monorepo_project_indexes_package_trees() {
    let project = TestProject::new();
    project.monorepo_project();

    let index = build(project.path(), &BuildOptions::default()).unwrap().index;

    assert_eq!(index.profile, "monorepo");
    assert!(!index.files.is_empty());
    assert_eq!(index.file("README.md").unwrap().role, Role::Doc);
    assert_eq!(index.file("pnpm-workspace.yaml").unwrap().role, Role::Config);
    assert!(index.file("packages/app/index.ts").is_some());

    // Vendored trees inside packages stay out of the index
    assert!(index.file("packages/app/node_modules/dep/index.js").is_none());

    let modules = index.modules.as_deref().unwrap_or_default();
    assert!(modules.iter().any(|m| m.path.starts_with("packages/")));

    assert!(index.start_here.contains(&"README.md".to_string()));
    assert!(index.plans.contains_key("overview"));
}

#[test]
fn every_profile_produces_a_populated_index() {
    let fixtures: [(&str, fn(&TestProject) -> &TestProject); 3] = [
        ("python_cli", TestProject::python_project),
        ("node_ts_tool", TestProject::node_project),
        ("monorepo", TestProject::monorepo_project),
    ];
    for (expected, populate) in fixtures {
        let project = TestProject::new();
        populate(&project);
        let index = build(project.path(), &BuildOptions::default()).unwrap().index;
        assert_eq!(index.profile, expected);
        assert!(!index.files.is_empty(), "{expected} indexed zero files");
        assert!(!index.start_here.is_empty());
        assert!(!index.plans.is_empty());
    }
}
