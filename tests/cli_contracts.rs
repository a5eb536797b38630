//! Output contracts for the grove CLI: json payload shapes and the
//! human-readable summaries commands print.

mod support;

use grove::tooling::cli::{CliContext, Commands};
use grove::transport::ContentTransport;
use grove::types::FileId;
use std::sync::Arc;
use support::{pdf, video, InMemoryBackend};

fn seed_course(backend: &InMemoryBackend) {
    backend.add_master("master", "Master");
    backend.add_root("course", "Course 101");
    backend.add_folder("week1", "Week 1", "course");
    backend.add_file("week1", video("v1", "Intro"));
    backend.add_file("week1", pdf("p1", "Syllabus"));
}

fn cli(backend: &Arc<InMemoryBackend>) -> CliContext {
    CliContext::with_transport(Arc::clone(backend) as Arc<dyn ContentTransport>)
}

#[tokio::test]
async fn ls_json_contract_has_required_fields() {
    let backend = InMemoryBackend::new();
    seed_course(&backend);
    let cli = cli(&backend);

    let output = cli
        .execute(&Commands::Ls {
            folder: "week1".to_string(),
            format: "json".to_string(),
        })
        .await
        .unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(parsed["id"], "week1");
    assert_eq!(parsed["name"], "Week 1");
    assert_eq!(parsed["fetched"], true);
    let files = parsed["files"].as_array().expect("files array");
    assert_eq!(files.len(), 2);
    assert_eq!(files[0]["id"], "v1");
    assert!(files[0].get("selected").is_some());
    assert!(parsed["subfolders"].as_array().is_some());
}

#[tokio::test]
async fn roots_json_contract_lists_master_first() {
    let backend = InMemoryBackend::new();
    seed_course(&backend);
    let cli = cli(&backend);

    let output = cli
        .execute(&Commands::Roots {
            course_roots: vec!["course".to_string()],
            format: "json".to_string(),
        })
        .await
        .unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    let roots = parsed["roots"].as_array().expect("roots array");
    assert_eq!(roots.len(), 2);
    assert_eq!(roots[0]["id"], "master");
    assert_eq!(roots[1]["id"], "course");
    // course children arrive collapsed, not expanded
    assert_eq!(roots[1]["subfolders"][0]["id"], "week1");
    assert_eq!(roots[1]["subfolders"][0]["fetched"], false);
}

#[tokio::test]
async fn tree_text_output_marks_unfetched_folders() {
    let backend = InMemoryBackend::new();
    seed_course(&backend);
    backend.add_folder("clips", "Clips", "week1");
    let cli = cli(&backend);

    let output = cli
        .execute(&Commands::Tree {
            folder: "course".to_string(),
            depth: Some(1),
            format: "text".to_string(),
        })
        .await
        .unwrap();

    assert!(output.contains("Week 1"));
    assert!(output.contains("Intro"));
    assert!(output.contains("(not fetched)"));
}

#[tokio::test]
async fn mkdir_reports_the_server_issued_id() {
    let backend = InMemoryBackend::new();
    seed_course(&backend);
    let cli = cli(&backend);

    let output = cli
        .execute(&Commands::Mkdir {
            parent: "week1".to_string(),
            name: "Homework".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(output, "Created folder srv-0 under week1");
    assert!(backend.server_has_folder("srv-0"));
}

#[tokio::test]
async fn mv_with_nothing_selected_says_so_without_calls() {
    let backend = InMemoryBackend::new();
    seed_course(&backend);
    let cli = cli(&backend);

    let output = cli
        .execute(&Commands::Mv {
            destination: "week1".to_string(),
            files: vec![],
            folders: vec![],
        })
        .await
        .unwrap();

    assert_eq!(output, "Nothing to move.");
}

#[tokio::test]
async fn mv_reports_moved_counts() {
    let backend = InMemoryBackend::new();
    seed_course(&backend);
    backend.add_folder("week2", "Week 2", "course");
    let cli = cli(&backend);
    cli.execute(&Commands::Ls {
        folder: "week1".to_string(),
        format: "text".to_string(),
    })
    .await
    .unwrap();

    let output = cli
        .execute(&Commands::Mv {
            destination: "week2".to_string(),
            files: vec!["v1".to_string()],
            folders: vec![],
        })
        .await
        .unwrap();

    assert!(output.contains("Moved 1 file(s) and 0 folder(s)."));
    assert_eq!(backend.server_file_ids("week2"), vec![FileId::new("v1")]);
}

#[tokio::test]
async fn rm_with_force_skips_the_prompt() {
    let backend = InMemoryBackend::new();
    seed_course(&backend);
    let cli = cli(&backend);

    let output = cli
        .execute(&Commands::Rm {
            folder: "week1".to_string(),
            force: true,
        })
        .await
        .unwrap();

    assert_eq!(output, "Deleted folder week1");
    assert!(!backend.server_has_folder("week1"));
}

#[tokio::test]
async fn reorder_reports_the_persisted_count() {
    let backend = InMemoryBackend::new();
    seed_course(&backend);
    let cli = cli(&backend);

    let output = cli
        .execute(&Commands::Reorder {
            folder: "week1".to_string(),
            file_ids: vec!["p1".to_string(), "v1".to_string()],
        })
        .await
        .unwrap();

    assert_eq!(output, "Persisted new order of 2 files in week1");
    assert_eq!(
        backend.server_file_ids("week1"),
        vec![FileId::new("p1"), FileId::new("v1")]
    );
}

#[tokio::test]
async fn import_json_contract_reports_the_outcome() {
    let backend = InMemoryBackend::new();
    seed_course(&backend);
    backend.add_folder("media", "Media", "master");
    backend.add_file("media", video("mv1", "Opening"));
    let cli = cli(&backend);

    let output = cli
        .execute(&Commands::Import {
            destination: "week1".to_string(),
            keys: vec!["mv1".to_string()],
            videos_only: true,
            course_roots: vec!["course".to_string()],
            format: "json".to_string(),
        })
        .await
        .unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(parsed["outcome"], "moved");
    assert_eq!(parsed["movedFiles"], 1);
    assert_eq!(parsed["movedFolders"], 0);
    assert!(parsed["fileFailure"].is_null());
    assert!(parsed["folderFailure"].is_null());
}

#[tokio::test]
async fn import_json_contract_flags_an_empty_selection() {
    let backend = InMemoryBackend::new();
    seed_course(&backend);
    let cli = cli(&backend);

    let output = cli
        .execute(&Commands::Import {
            destination: "master".to_string(),
            keys: vec!["p1".to_string()],
            videos_only: true,
            course_roots: vec!["course".to_string()],
            format: "json".to_string(),
        })
        .await
        .unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(parsed["outcome"], "nothingEligible");
}
