//! Integration tests for job assignment and the decline cooldown.

mod common;

use chrono::{Duration, Utc};
use voltbot::catalog;

const SERVER: u64 = 9000;
const ALICE: u64 = 1;

#[tokio::test]
async fn set_and_clear_job() {
    let (_dir, ctx) = common::temp_context();

    assert!(ctx.jobs.get_job(SERVER, ALICE).await.is_none());
    ctx.jobs.set_job(SERVER, ALICE, Some("scientist")).await;
    assert_eq!(ctx.jobs.get_job(SERVER, ALICE).await.as_deref(), Some("scientist"));

    // Unconditional overwrite, callers gate via can_apply
    ctx.jobs.set_job(SERVER, ALICE, Some("doctor")).await;
    assert_eq!(ctx.jobs.get_job(SERVER, ALICE).await.as_deref(), Some("doctor"));

    ctx.jobs.set_job(SERVER, ALICE, None).await;
    assert!(ctx.jobs.get_job(SERVER, ALICE).await.is_none());
}

#[tokio::test]
async fn employment_blocks_applications() {
    let (_dir, ctx) = common::temp_context();
    ctx.jobs.set_job(SERVER, ALICE, Some("factory_worker")).await;

    let (ok, reason) = ctx.jobs.can_apply(SERVER, ALICE).await;
    assert!(!ok);
    assert_eq!(
        reason.as_deref(),
        Some("You already have a job. Use /quitjob first.")
    );
}

#[tokio::test]
async fn decline_cooldown_counts_down_and_expires() {
    let (_dir, ctx) = common::temp_context();
    let declined_at = Utc::now();
    ctx.jobs.set_decline_cooldown_at(SERVER, ALICE, declined_at).await;

    let (ok, reason) = ctx
        .jobs
        .can_apply_at(SERVER, ALICE, declined_at + Duration::seconds(150))
        .await;
    assert!(!ok);
    assert_eq!(
        reason.as_deref(),
        Some("You must wait 7m 30s before applying again.")
    );

    let (ok, reason) = ctx
        .jobs
        .can_apply_at(SERVER, ALICE, declined_at + Duration::minutes(11))
        .await;
    assert!(ok);
    assert!(reason.is_none());

    // A successful application clears the lockout early
    ctx.jobs.set_decline_cooldown_at(SERVER, ALICE, declined_at).await;
    ctx.jobs.clear_cooldown(SERVER, ALICE).await;
    let (ok, _) = ctx.jobs.can_apply_at(SERVER, ALICE, declined_at).await;
    assert!(ok);
}

#[tokio::test]
async fn wall_clock_decline_cooldown_blocks_immediately() {
    let (_dir, ctx) = common::temp_context();
    ctx.jobs.set_decline_cooldown(SERVER, ALICE).await;

    let (ok, reason) = ctx.jobs.can_apply(SERVER, ALICE).await;
    assert!(!ok);
    assert!(reason.unwrap().starts_with("You must wait"));
}

#[tokio::test]
async fn payout_polling_stops_when_the_job_changes() {
    // The payout collaborator polls get_job and must stop crediting once the
    // stored key no longer matches the one it started with.
    let (_dir, ctx) = common::temp_context();
    ctx.jobs.set_job(SERVER, ALICE, Some("office_worker")).await;
    let started_with = ctx.jobs.get_job(SERVER, ALICE).await.unwrap();

    // First poll: still employed at the same job, credit one interval
    if ctx.jobs.get_job(SERVER, ALICE).await.as_deref() == Some(started_with.as_str()) {
        let payout = catalog::job(&started_with).unwrap().payout_per_minute;
        ctx.economy.add_wallet(SERVER, ALICE, payout).await;
    }

    ctx.jobs.set_job(SERVER, ALICE, None).await;

    // Second poll: job cleared, no further credit
    if ctx.jobs.get_job(SERVER, ALICE).await.as_deref() == Some(started_with.as_str()) {
        let payout = catalog::job(&started_with).unwrap().payout_per_minute;
        ctx.economy.add_wallet(SERVER, ALICE, payout).await;
    }

    assert_eq!(ctx.economy.get_balances(SERVER, ALICE).await.0, 100);
}
