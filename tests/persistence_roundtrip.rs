//! Save/load round-trips for all four state documents, plus the recovery
//! policy for missing and corrupt files.

mod common;

use chrono::{Duration, Utc};
use rand::rngs::OsRng;
use voltbot::state::guilds::GuildPrivacy;

const SERVER: u64 = 9000;
const ALICE: u64 = 1;
const BOB: u64 = 2;

#[tokio::test]
async fn populated_state_survives_a_reload() {
    let (dir, ctx) = common::temp_context();
    let mut rng = OsRng;

    ctx.economy.add_wallet(SERVER, ALICE, 750).await;
    ctx.economy.add_bank(SERVER, ALICE, 1_250).await;
    ctx.economy.add_item(SERVER, ALICE, "voltfish", 4).await;
    ctx.jobs.set_job(SERVER, ALICE, Some("scientist")).await;
    let declined_at = Utc::now();
    ctx.jobs.set_decline_cooldown_at(SERVER, BOB, declined_at).await;
    let tag = ctx
        .guilds
        .create_guild(
            SERVER,
            ALICE,
            "Persisted",
            "https://example.com/crest.png",
            GuildPrivacy::PasswordLocked,
            Some("hunter2"),
            &mut rng,
        )
        .await
        .unwrap();
    ctx.guilds.join_guild(SERVER, BOB, &tag).await;
    ctx.guilds.set_member_cap(SERVER, ALICE, Some(8)).await;
    ctx.achievements.unlock_achievement(SERVER, ALICE, "guildmaster").await;
    ctx.achievements.unlock_achievement(SERVER, BOB, "guildeer").await;

    ctx.save_all().await.unwrap();

    let reopened = common::reopen(dir.path());
    reopened.economy.load().await.unwrap();
    reopened.jobs.load().await.unwrap();
    reopened.guilds.load().await.unwrap();
    reopened.achievements.load().await.unwrap();

    assert_eq!(reopened.economy.get_balances(SERVER, ALICE).await, (750, 1_250));
    assert_eq!(
        reopened.economy.get_inventory(SERVER, ALICE).await.get("voltfish"),
        Some(&4)
    );
    assert_eq!(
        reopened.jobs.get_job(SERVER, ALICE).await.as_deref(),
        Some("scientist")
    );
    // Cooldown survived with its timestamp: still blocked one minute in
    let (ok, _) = reopened
        .jobs
        .can_apply_at(SERVER, BOB, declined_at + Duration::minutes(1))
        .await;
    assert!(!ok);

    let record = reopened.guilds.get_guild(SERVER, &tag).await.unwrap();
    assert_eq!(record.owner_id, ALICE);
    assert_eq!(record.members, vec![ALICE, BOB]);
    assert_eq!(record.member_cap, Some(8));
    assert_eq!(record.privacy, GuildPrivacy::PasswordLocked);
    assert!(reopened.guilds.check_password(SERVER, &tag, "hunter2").await);
    assert_eq!(
        reopened.guilds.get_user_guild(SERVER, BOB).await.as_deref(),
        Some(tag.as_str())
    );

    assert!(reopened.achievements.has_achievement(SERVER, ALICE, "guildmaster").await);
    assert!(reopened.achievements.has_achievement(SERVER, BOB, "guildeer").await);
}

#[tokio::test]
async fn empty_state_round_trips_too() {
    let (dir, ctx) = common::temp_context();
    ctx.save_all().await.unwrap();

    let reopened = common::reopen(dir.path());
    reopened.economy.load().await.unwrap();
    reopened.guilds.load().await.unwrap();

    assert!(reopened.economy.leaderboard(SERVER, 10).await.is_empty());
    assert!(reopened.guilds.list_guilds(SERVER).await.is_empty());
}

#[tokio::test]
async fn strict_load_reports_missing_files() {
    let (_dir, ctx) = common::temp_context();
    let err = ctx.economy.load().await.unwrap_err();
    assert!(err.is_missing());
}

#[tokio::test]
async fn corrupt_documents_reset_to_empty_under_the_recovery_policy() {
    let (dir, ctx) = common::temp_context();
    ctx.economy.add_wallet(SERVER, ALICE, 500).await;
    ctx.save_all().await.unwrap();

    tokio::fs::write(dir.path().join("economy.json"), "{\"servers\": 12}")
        .await
        .unwrap();

    let reopened = common::reopen(dir.path());
    // Strict load surfaces the malformed kind...
    let err = reopened.economy.load().await.unwrap_err();
    assert!(!err.is_missing());

    // ...while the recovery policy swallows it into empty state
    reopened.economy.load_or_reset().await;
    assert_eq!(reopened.economy.get_balances(SERVER, ALICE).await, (0, 0));
}

#[tokio::test]
async fn load_or_reset_on_a_fresh_dir_is_just_empty() {
    let (dir, ctx) = common::temp_context();
    ctx.load_all().await;
    assert!(ctx.economy.leaderboard(SERVER, 10).await.is_empty());

    // Nothing was created on disk by loading
    assert!(!dir.path().join("economy.json").exists());
}

#[tokio::test]
async fn unknown_inventory_keys_are_dropped_on_load() {
    let (dir, ctx) = common::temp_context();
    ctx.economy.add_item(SERVER, ALICE, "bass", 2).await;
    ctx.save_all().await.unwrap();

    // Hand-edit the document to sneak in a retired item key
    let path = dir.path().join("economy.json");
    let text = tokio::fs::read_to_string(&path).await.unwrap();
    let patched = text.replace("\"bass\"", "\"retired_item\"");
    tokio::fs::write(&path, patched).await.unwrap();

    let reopened = common::reopen(dir.path());
    reopened.economy.load().await.unwrap();
    assert!(reopened.economy.get_inventory(SERVER, ALICE).await.is_empty());
}
