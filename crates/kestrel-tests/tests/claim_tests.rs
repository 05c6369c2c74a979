//! Clients claiming ready jobs.

use futures::future::join_all;
use kestrel_core::Error;
use kestrel_core::client::ClientStatus;
use kestrel_tests::{RecipeFixture, TestContext};
use pretty_assertions::assert_eq;

#[tokio::test]
async fn test_concurrent_clients_claim_once() -> anyhow::Result<()> {
    let ctx = TestContext::new()?;
    let event = ctx.create_event(&[RecipeFixture::simple("build")]).await?;
    let job = ctx.job_for(event.id, "build").await?;

    let mut clients = Vec::new();
    for i in 0..6 {
        clients.push(ctx.register_client(&format!("client-{i}")).await?);
    }

    let jobs = ctx.store.jobs();
    let job_id = job.id;
    let results = join_all(clients.iter().map(|client| {
        let jobs = jobs.clone();
        let client = *client;
        tokio::spawn(async move { jobs.claim(job_id, client).await })
    }))
    .await;

    let mut winners = Vec::new();
    for result in results {
        match result? {
            Ok(claimed) => winners.push(claimed.client),
            Err(e) => assert!(matches!(e, Error::NotClaimable(_))),
        }
    }
    assert_eq!(winners.len(), 1);
    assert_eq!(ctx.job(job.id).await?.client, winners[0]);
    Ok(())
}

#[tokio::test]
async fn test_only_ready_jobs_are_offered() -> anyhow::Result<()> {
    let ctx = TestContext::new()?;
    let build = RecipeFixture::simple("build").with_priority(5);
    let docs = RecipeFixture::simple("docs").with_priority(20);
    let test = RecipeFixture::simple("test").depends_on(build.id, true);
    let event = ctx.create_event(&[build, docs, test]).await?;

    let offered = ctx
        .store
        .jobs()
        .list_claimable(&["linux".to_string()], 10)
        .await?;
    let names: Vec<&str> = offered.iter().map(|j| j.recipe_name.as_str()).collect();
    assert_eq!(names, vec!["docs", "build"]);

    let other_config = ctx
        .store
        .jobs()
        .list_claimable(&["windows".to_string()], 10)
        .await?;
    assert!(other_config.is_empty());

    let test_job = ctx.job_for(event.id, "test").await?;
    let client = ctx.register_client("eager").await?;
    let err = ctx.store.jobs().claim(test_job.id, client).await.unwrap_err();
    assert!(matches!(err, Error::NotClaimable(_)));
    Ok(())
}

#[tokio::test]
async fn test_client_status_updates() -> anyhow::Result<()> {
    let ctx = TestContext::new()?;
    let id = ctx.register_client("runner-1").await?;
    let clients = ctx.store.clients();

    let mut client = clients.get(id).await?.expect("registered client");
    assert_eq!(client.status, ClientStatus::Idle);

    client.seen(ClientStatus::Running, "building job");
    clients.update(&client).await?;

    let stored = clients.get(id).await?.expect("registered client");
    assert_eq!(stored.status, ClientStatus::Running);
    assert_eq!(stored.status_message, "building job");
    assert_eq!(clients.list().await?.len(), 1);
    Ok(())
}
