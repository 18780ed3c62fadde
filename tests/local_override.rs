#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::wildcard_imports,
    clippy::indexing_slicing
)]
//! Integration tests for `enabled.local.json` handling.

mod common;

use common::TestContextBuilder;
use oh_my_dot::manifest::Strategy;

const BASE: &str = r#"{"features": [
  {"name": "git-prompt", "strategy": "defer"},
  {"name": "core-aliases"}
]}"#;

#[test]
fn trusted_local_override_changes_strategy_and_appends_local_features() {
    let ctx = TestContextBuilder::new()
        .with_manifest("zsh", BASE)
        .with_local_manifest(
            "zsh",
            r#"{"features": [{"name": "scratch"}, {"name": "git-prompt", "strategy": "eager"}]}"#,
        )
        .build();
    let merged = ctx.workspace().load(ctx.shell("zsh")).unwrap();

    let names: Vec<&str> = merged.features.iter().map(|f| f.config.name.as_str()).collect();
    assert_eq!(names, vec!["git-prompt", "core-aliases", "scratch"]);
    let prompt = merged.get("git-prompt").unwrap();
    assert_eq!(prompt.config.effective_strategy(), Strategy::Eager);
    assert!(prompt.local.is_overridden);
    assert!(merged.get("scratch").unwrap().local.is_from_local);

    ctx.workspace().regenerate(ctx.shell("zsh")).unwrap();
    let script = ctx.read("zsh/init.zsh");
    assert!(!script.contains("&!"), "no deferred features remain");
    assert!(script.contains("features/scratch.zsh"));
}

#[test]
fn local_disable_wins_over_base() {
    let ctx = TestContextBuilder::new()
        .with_manifest("bash", BASE)
        .with_local_manifest("bash", r#"{"features": [{"name": "core-aliases", "disabled": true}]}"#)
        .build();
    ctx.workspace().regenerate(ctx.shell("bash")).unwrap();
    let script = ctx.read("bash/init.sh");
    assert!(!script.contains("core-aliases"));
    assert!(script.contains("git-prompt"));
}

#[test]
fn untrusted_local_override_is_ignored_with_warning() {
    let ctx = TestContextBuilder::new()
        .distrusting_local_overrides()
        .with_manifest("bash", BASE)
        .with_local_manifest("bash", r#"{"features": [{"name": "core-aliases", "disabled": true}]}"#)
        .build();
    ctx.workspace().regenerate(ctx.shell("bash")).unwrap();

    assert!(ctx.read("bash/init.sh").contains("core-aliases"));
    let warnings = ctx.log.warnings();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("not a regular file (possibly a symlink)"));
}

#[test]
fn malformed_local_override_is_ignored_with_warning() {
    let ctx = TestContextBuilder::new()
        .with_manifest("bash", BASE)
        .with_local_manifest("bash", "{ not json")
        .build();
    ctx.workspace().regenerate(ctx.shell("bash")).unwrap();
    assert!(ctx.read("bash/init.sh").contains("core-aliases"));
    assert_eq!(ctx.log.warnings().len(), 1);
}

#[test]
fn local_edits_never_touch_tracked_manifest() {
    let ctx = TestContextBuilder::new()
        .with_manifest("bash", BASE)
        .with_local_manifest("bash", r#"{"features": [{"name": "git-prompt", "disabled": true}]}"#)
        .build();
    ctx.workspace().regenerate(ctx.shell("bash")).unwrap();
    assert_eq!(ctx.read("bash/enabled.json"), BASE);
}
