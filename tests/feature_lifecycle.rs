#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::wildcard_imports,
    clippy::indexing_slicing
)]
//! Integration tests for the add / enable / disable / remove pipeline.
//!
//! Every step persists `enabled.json` and regenerates the init script, so
//! the tests assert on both files after each operation.

mod common;

use common::{IntegrationTestContext, TestContextBuilder};
use oh_my_dot::manifest::io::read_manifest;
use oh_my_dot::manifest::{OptionValue, Strategy};
use oh_my_dot::resources::ResourceChange;
use oh_my_dot::workspace::AddRequest;

#[test]
fn add_creates_shell_layout_on_demand() {
    let ctx = IntegrationTestContext::new();
    ctx.workspace()
        .add_feature(ctx.shell("zsh"), &AddRequest::named("git-prompt"))
        .unwrap();

    assert!(ctx.path("lib/helpers.sh").is_file());
    assert!(ctx.path("zsh/features/git-prompt.zsh").is_file());
    assert_eq!(
        ctx.read("zsh/enabled.json"),
        "{\n  \"features\": [\n    {\n      \"name\": \"git-prompt\",\n      \"strategy\": \"defer\",\n      \"options\": {\n        \"style\": \"minimal\"\n      }\n    }\n  ]\n}\n"
    );
    assert_eq!(ctx.workspace().list_shells().unwrap(), vec!["zsh"]);
}

#[test]
fn full_lifecycle_on_bash() {
    let ctx = IntegrationTestContext::new();
    let ws = ctx.workspace();
    let bash = ctx.shell("bash");

    ws.add_feature(bash, &AddRequest::named("kubectl-completion"))
        .unwrap();
    assert!(ctx.read("bash/init.sh").contains("kubectl() {"));

    ws.disable_feature(bash, "kubectl-completion").unwrap();
    assert!(!ctx.read("bash/init.sh").contains("kubectl"));

    ws.enable_feature(bash, "kubectl-completion", Some(Strategy::Eager), &[])
        .unwrap();
    let script = ctx.read("bash/init.sh");
    assert!(script.contains("feature_file=\"$OMD_SHELL_ROOT/features/kubectl-completion.sh\""));
    assert!(!script.contains("kubectl() {"));

    ws.remove_feature(bash, "kubectl-completion").unwrap();
    assert!(!ctx.path("bash/features/kubectl-completion.sh").exists());
    let manifest = read_manifest(&ctx.path("bash/enabled.json")).unwrap();
    assert!(!manifest.has_features());
    assert!(ws.needs_cleanup(bash).unwrap());
    assert_eq!(ws.cleanup_shell(bash).unwrap(), ResourceChange::Applied);
    assert!(ws.list_shells().unwrap().is_empty());
}

#[test]
fn options_are_normalized_before_persisting() {
    let ctx = IntegrationTestContext::new();
    let mut req = AddRequest::named("directory-shortcuts");
    req.options
        .insert("max_depth".to_string(), OptionValue::Text("7".to_string()));
    ctx.workspace().add_feature(ctx.shell("posix"), &req).unwrap();

    let manifest = read_manifest(&ctx.path("posix/enabled.json")).unwrap();
    let feature = manifest.get_feature("directory-shortcuts").unwrap();
    assert_eq!(feature.options["max_depth"], OptionValue::Int(7));
    assert!(
        ctx.read("posix/features/directory-shortcuts.sh")
            .contains("#   max_depth: 7\n")
    );
}

#[test]
fn rejected_add_leaves_repository_untouched() {
    let ctx = IntegrationTestContext::new();
    let mut req = AddRequest::named("directory-shortcuts");
    req.options
        .insert("max_depth".to_string(), OptionValue::Int(99));
    assert!(ctx.workspace().add_feature(ctx.shell("bash"), &req).is_err());
    assert!(!ctx.path("bash").exists());

    let mut req = AddRequest::named("bad name");
    req.strategy = Some(Strategy::Eager);
    assert!(ctx.workspace().add_feature(ctx.shell("bash"), &req).is_err());
    assert!(!ctx.path("bash").exists());
}

#[test]
fn hand_written_feature_file_survives_add() {
    let ctx = TestContextBuilder::new()
        .with_manifest("fish", "{\"features\": []}\n")
        .with_feature_file("fish", "core-aliases.fish", "abbr -a g git\n")
        .build();
    ctx.workspace()
        .add_feature(ctx.shell("fish"), &AddRequest::named("core-aliases"))
        .unwrap();
    assert_eq!(
        ctx.read("fish/features/core-aliases.fish"),
        "abbr -a g git\n"
    );
}

#[test]
fn malformed_manifest_blocks_regeneration() {
    let ctx = TestContextBuilder::new()
        .with_manifest("bash", "{\"features\": [{\"name\": \"x\", \"strategy\": \"lazy\"}]}")
        .build();
    ctx.write("bash/init.sh", "previous\n");
    let err = ctx.workspace().regenerate(ctx.shell("bash")).unwrap_err();
    assert!(format!("{err:#}").contains("lazy"), "{err:#}");
    assert_eq!(ctx.read("bash/init.sh"), "previous\n");
}

#[test]
fn dry_run_reports_without_writing() {
    let ctx = TestContextBuilder::new()
        .with_manifest("bash", "{\"features\": [{\"name\": \"core-aliases\"}]}\n")
        .build();
    let ws = ctx.workspace().with_dry_run(true);
    ws.regenerate(ctx.shell("bash")).unwrap();
    ws.disable_feature(ctx.shell("bash"), "core-aliases").unwrap();

    assert!(!ctx.path("bash/init.sh").exists());
    assert_eq!(
        ctx.read("bash/enabled.json"),
        "{\"features\": [{\"name\": \"core-aliases\"}]}\n"
    );
    assert_eq!(ctx.log.dry_runs().len(), 2);
}
