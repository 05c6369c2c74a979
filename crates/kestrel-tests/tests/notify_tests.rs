//! Commit status reporting through the git host registry.

use kestrel_core::config::{KestrelConfig, NotifyConfig};
use kestrel_core::githost::{CommitState, GitHostRegistry, GitServerKind};
use kestrel_notify::CommitStatusNotifier;
use kestrel_scheduler::ActivationMatcher;
use kestrel_tests::{EventFixture, FakeGitHost, RecipeFixture, TestContext};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn commit_notifier(host: Arc<FakeGitHost>, label: Option<&str>) -> Arc<CommitStatusNotifier> {
    let config = NotifyConfig {
        failed_but_allowed_label: label.map(str::to_string),
        ..NotifyConfig::default()
    };
    Arc::new(CommitStatusNotifier::new(
        GitHostRegistry::new().with(host),
        &config,
    ))
}

#[tokio::test]
async fn test_allowed_failure_labels_pull_request() -> anyhow::Result<()> {
    let host = Arc::new(FakeGitHost::new(GitServerKind::GitHub));
    let ctx = TestContext::with_notifier(commit_notifier(host.clone(), Some("failed but allowed")))?;
    let lint = RecipeFixture::allowed_to_fail("lint");
    let event = ctx
        .create_event_from(EventFixture::pull_request(12), &[lint])
        .await?;

    let job = ctx.job_for(event.id, "lint").await?;
    let transition = ctx.run_job(job.id, &[1]).await?;
    assert!(transition.event.completed);

    assert_eq!(host.labels(), vec![(12, "failed but allowed".to_string())]);
    let statuses = host.statuses();
    assert_eq!(statuses.len(), 1);
    assert_eq!(statuses[0].0, event.head.sha);
    assert_eq!(statuses[0].1.state, CommitState::Pending);
    Ok(())
}

#[tokio::test]
async fn test_push_event_reports_nothing() -> anyhow::Result<()> {
    let host = Arc::new(FakeGitHost::new(GitServerKind::GitHub));
    let ctx = TestContext::with_notifier(commit_notifier(host.clone(), Some("failed but allowed")))?;
    let lint = RecipeFixture::allowed_to_fail("lint");
    let event = ctx.create_event_from(EventFixture::push(), &[lint]).await?;

    let job = ctx.job_for(event.id, "lint").await?;
    ctx.run_job(job.id, &[1]).await?;

    assert!(host.labels().is_empty());
    assert!(host.statuses().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_cancel_reports_error_state() -> anyhow::Result<()> {
    let host = Arc::new(FakeGitHost::new(GitServerKind::GitHub));
    let ctx = TestContext::with_notifier(commit_notifier(host.clone(), None))?;
    let event = ctx.create_event(&[RecipeFixture::simple("build")]).await?;

    ctx.cancellation
        .cancel_event(event.id, "Canceled", Some(&ctx.notify))
        .await?;

    let statuses = host.statuses();
    assert_eq!(statuses.len(), 1);
    assert_eq!(statuses[0].1.state, CommitState::Error);
    assert_eq!(statuses[0].1.context, "build (linux)");
    Ok(())
}

#[tokio::test]
async fn test_unsupported_server_does_not_block() -> anyhow::Result<()> {
    // Only GitLab is registered; the event comes from GitHub.
    let host = Arc::new(FakeGitHost::new(GitServerKind::GitLab));
    let ctx = TestContext::with_notifier(commit_notifier(host.clone(), None))?;
    let event = ctx.create_event(&[RecipeFixture::simple("build")]).await?;

    let outcome = ctx
        .cancellation
        .cancel_event(event.id, "Canceled", Some(&ctx.notify))
        .await?;
    assert_eq!(outcome.canceled.len(), 1);
    assert!(ctx.event(event.id).await?.complete);
    assert!(host.statuses().is_empty());
    Ok(())
}

#[test]
fn test_activation_from_config_file() -> anyhow::Result<()> {
    let config = KestrelConfig::from_yaml_str(
        r#"
activation:
  label_patterns:
    doco: "docs/"
    tutorials: "tutorials/"
  additive_labels: [tutorials]
"#,
    )?;
    let matcher = ActivationMatcher::new(&config.activation)?;

    let docs_only = matcher.match_files(&["docs/a.md", "docs/b.md"]);
    assert_eq!(docs_only.labels, vec!["doco".to_string()]);
    assert!(docs_only.matched_all);

    let mixed = matcher.match_files(&["docs/a.md", "tutorials/b.md"]);
    assert_eq!(mixed.labels, vec!["doco".to_string(), "tutorials".to_string()]);
    assert!(!mixed.matched_all);
    Ok(())
}
