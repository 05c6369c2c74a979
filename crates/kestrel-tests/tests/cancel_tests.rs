//! Event cancellation.

use kestrel_core::status::JobStatus;
use kestrel_tests::{NotifyCall, RecipeFixture, TestContext};
use pretty_assertions::assert_eq;

#[tokio::test]
async fn test_cancel_outstanding_jobs() -> anyhow::Result<()> {
    let ctx = TestContext::new()?;
    let build = RecipeFixture::simple("build");
    let lint = RecipeFixture::simple("lint");
    let test = RecipeFixture::simple("test").depends_on(build.id, true);
    let event = ctx.create_event(&[build, lint, test]).await?;

    let lint_job = ctx.job_for(event.id, "lint").await?;
    ctx.run_job(lint_job.id, &[0, 0]).await?;
    ctx.notifier.clear();

    let outcome = ctx
        .cancellation
        .cancel_event(event.id, "Canceled by maintainer", Some(&ctx.notify))
        .await?;

    let build_job = ctx.job_for(event.id, "build").await?;
    let test_job = ctx.job_for(event.id, "test").await?;
    let mut canceled = outcome.canceled.clone();
    canceled.sort();
    let mut expected = vec![build_job.id, test_job.id];
    expected.sort();
    assert_eq!(canceled, expected);
    assert!(outcome.event_updated);

    for job in [&build_job, &test_job] {
        assert!(job.complete);
        assert_eq!(job.status, JobStatus::Canceled);
        let audit = ctx.store.audit().entries(job.id).await?;
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].message, "Canceled by maintainer");
    }
    let lint_job = ctx.job(lint_job.id).await?;
    assert_eq!(lint_job.status, JobStatus::Success);

    let event = ctx.event(event.id).await?;
    assert!(event.complete);
    assert_eq!(event.status, JobStatus::Canceled);

    let mut notified = ctx.notifier.canceled_jobs();
    notified.sort();
    assert_eq!(notified, expected);
    assert_eq!(ctx.notifier.event_completions(event.id), 1);
    assert!(ctx.notifier.calls().contains(&NotifyCall::JobCanceled {
        job: build_job.id,
        url: format!("https://ci.example.com/job/{}/", build_job.id),
    }));
    Ok(())
}

#[tokio::test]
async fn test_repeat_cancel_is_a_noop() -> anyhow::Result<()> {
    let ctx = TestContext::new()?;
    let event = ctx.create_event(&[RecipeFixture::simple("build")]).await?;

    ctx.cancellation
        .cancel_event(event.id, "Canceled", Some(&ctx.notify))
        .await?;
    let version = ctx.event(event.id).await?.version;
    let calls = ctx.notifier.calls().len();

    let outcome = ctx
        .cancellation
        .cancel_event(event.id, "Canceled", Some(&ctx.notify))
        .await?;
    assert!(outcome.canceled.is_empty());
    assert!(!outcome.event_updated);
    assert_eq!(ctx.event(event.id).await?.version, version);
    assert_eq!(ctx.notifier.calls().len(), calls);
    assert_eq!(ctx.notifier.event_completions(event.id), 1);
    Ok(())
}

#[tokio::test]
async fn test_cancel_finished_event_marks_canceled() -> anyhow::Result<()> {
    let ctx = TestContext::new()?;
    let event = ctx.create_event(&[RecipeFixture::simple("build")]).await?;
    let job = ctx.job_for(event.id, "build").await?;
    ctx.run_job(job.id, &[0, 0]).await?;
    assert_eq!(ctx.event(event.id).await?.status, JobStatus::Success);

    // Complete but not canceled, so the event is still rewritten.
    let outcome = ctx
        .cancellation
        .cancel_event(event.id, "Canceled", Some(&ctx.notify))
        .await?;
    assert!(outcome.canceled.is_empty());
    assert!(outcome.event_updated);
    assert_eq!(ctx.event(event.id).await?.status, JobStatus::Canceled);
    assert_eq!(ctx.notifier.event_completions(event.id), 2);
    Ok(())
}

#[tokio::test]
async fn test_cancel_without_notifier() -> anyhow::Result<()> {
    let ctx = TestContext::new()?;
    let event = ctx.create_event(&[RecipeFixture::simple("build")]).await?;

    let outcome = ctx
        .cancellation
        .cancel_event(event.id, "Canceled", None)
        .await?;
    assert_eq!(outcome.canceled.len(), 1);
    assert!(ctx.notifier.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_cancel_unknown_event() -> anyhow::Result<()> {
    let ctx = TestContext::new()?;
    let err = ctx
        .cancellation
        .cancel_event(kestrel_core::ids::EventId::new(), "Canceled", None)
        .await
        .unwrap_err();
    assert!(matches!(err, kestrel_core::Error::EventNotFound(_)));
    Ok(())
}
