//! Integration tests for the economy manager: balance invariants,
//! deposit/withdraw round-trips, selling, and seizure.

mod common;

use rand::rngs::StdRng;
use rand::SeedableRng;

const SERVER: u64 = 9000;
const ALICE: u64 = 1;
const BOB: u64 = 2;

#[tokio::test]
async fn balances_never_go_negative() {
    let (_dir, ctx) = common::temp_context();

    ctx.economy.add_wallet(SERVER, ALICE, 100).await;
    ctx.economy.deposit(SERVER, ALICE, Some(40)).await;
    ctx.economy.withdraw(SERVER, ALICE, None).await;
    assert!(!ctx.economy.deduct_wallet(SERVER, ALICE, 5_000).await);
    ctx.economy.add_wallet(SERVER, ALICE, -999).await;
    ctx.economy.add_bank(SERVER, ALICE, -999).await;

    let (wallet, bank) = ctx.economy.get_balances(SERVER, ALICE).await;
    assert!(wallet >= 0);
    assert!(bank >= 0);
    assert_eq!(wallet + bank, 100);
}

#[tokio::test]
async fn deposit_withdraw_round_trip_restores_split() {
    let (_dir, ctx) = common::temp_context();
    ctx.economy.add_wallet(SERVER, ALICE, 300).await;
    ctx.economy.add_bank(SERVER, ALICE, 50).await;

    let moved = ctx.economy.deposit(SERVER, ALICE, Some(120)).await;
    assert_eq!(moved, 120);
    let back = ctx.economy.withdraw(SERVER, ALICE, Some(120)).await;
    assert_eq!(back, 120);

    assert_eq!(ctx.economy.get_balances(SERVER, ALICE).await, (300, 50));
}

#[tokio::test]
async fn deduct_wallet_scenario() {
    let (_dir, ctx) = common::temp_context();
    ctx.economy.add_wallet(SERVER, ALICE, 100).await;

    assert!(ctx.economy.deduct_wallet(SERVER, ALICE, 50).await);
    assert_eq!(ctx.economy.get_balances(SERVER, ALICE).await.0, 50);

    assert!(!ctx.economy.deduct_wallet(SERVER, ALICE, 60).await);
    assert_eq!(ctx.economy.get_balances(SERVER, ALICE).await.0, 50);
}

#[tokio::test]
async fn selling_a_missing_nonsellable_item_returns_nothing() {
    let (_dir, ctx) = common::temp_context();
    ctx.economy.add_item(SERVER, ALICE, "bass", 1).await;

    let mut rng = StdRng::seed_from_u64(1);
    let (details, total) = ctx
        .economy
        .sell_items(SERVER, ALICE, Some("lockpick"), None, &mut rng)
        .await;

    assert!(details.is_empty());
    assert_eq!(total, 0);
    assert_eq!(
        ctx.economy.get_inventory(SERVER, ALICE).await.get("bass"),
        Some(&1)
    );
}

#[tokio::test]
async fn selling_three_of_five_bass_prices_each_unit() {
    let (_dir, ctx) = common::temp_context();
    ctx.economy.add_item(SERVER, ALICE, "bass", 5).await;
    let wallet_before = ctx.economy.get_balances(SERVER, ALICE).await.0;

    let mut rng = StdRng::seed_from_u64(42);
    let (details, total) = ctx
        .economy
        .sell_items(SERVER, ALICE, Some("bass"), Some(3), &mut rng)
        .await;

    assert_eq!(details.len(), 1);
    assert_eq!(details[0].key, "bass");
    assert_eq!(details[0].quantity, 3);
    assert!((3 * 18..=3 * 19).contains(&total));
    assert_eq!(
        ctx.economy.get_inventory(SERVER, ALICE).await.get("bass"),
        Some(&2)
    );
    let wallet_after = ctx.economy.get_balances(SERVER, ALICE).await.0;
    assert_eq!(wallet_after - wallet_before, total);
}

#[tokio::test]
async fn sell_everything_skips_gear_and_empties_fish() {
    let (_dir, ctx) = common::temp_context();
    ctx.economy.add_item(SERVER, ALICE, "bass", 2).await;
    ctx.economy.add_item(SERVER, ALICE, "golden_potato", 1).await;
    ctx.economy.add_item(SERVER, ALICE, "gun", 1).await;

    let mut rng = StdRng::seed_from_u64(7);
    let (details, total) = ctx
        .economy
        .sell_items(SERVER, ALICE, None, None, &mut rng)
        .await;

    assert_eq!(details.len(), 2);
    // golden_potato is a fixed 30; bass adds 2 draws in [18, 19]
    assert!((30 + 36..=30 + 38).contains(&total));

    let inventory = ctx.economy.get_inventory(SERVER, ALICE).await;
    assert_eq!(inventory.get("gun"), Some(&1));
    assert!(!inventory.contains_key("bass"));
    assert!(!inventory.contains_key("golden_potato"));
}

#[tokio::test]
async fn same_seed_reproduces_the_same_sale() {
    let (_dir, ctx) = common::temp_context();
    ctx.economy.add_item(SERVER, ALICE, "rainbow_trout", 10).await;
    ctx.economy.add_item(SERVER, BOB, "rainbow_trout", 10).await;

    let mut rng_a = StdRng::seed_from_u64(99);
    let (_, total_a) = ctx
        .economy
        .sell_items(SERVER, ALICE, None, None, &mut rng_a)
        .await;

    let mut rng_b = StdRng::seed_from_u64(99);
    let (_, total_b) = ctx
        .economy
        .sell_items(SERVER, BOB, None, None, &mut rng_b)
        .await;

    assert_eq!(total_a, total_b);
}

#[tokio::test]
async fn seize_returns_everything_and_clears() {
    let (_dir, ctx) = common::temp_context();
    ctx.economy.add_item(SERVER, ALICE, "bass", 3).await;
    ctx.economy.add_item(SERVER, ALICE, "mask", 1).await;

    let seized = ctx.economy.seize_all_items(SERVER, ALICE).await;
    assert_eq!(seized.get("bass"), Some(&3));
    assert_eq!(seized.get("mask"), Some(&1));
    assert!(ctx.economy.get_inventory(SERVER, ALICE).await.is_empty());

    // A second seizure finds nothing
    assert!(ctx.economy.seize_all_items(SERVER, ALICE).await.is_empty());
}

#[tokio::test]
async fn leaderboard_ranks_by_total_descending() {
    let (_dir, ctx) = common::temp_context();
    ctx.economy.add_wallet(SERVER, ALICE, 100).await;
    ctx.economy.add_bank(SERVER, ALICE, 400).await;
    ctx.economy.add_wallet(SERVER, BOB, 300).await;
    ctx.economy.add_wallet(SERVER, 3, 600).await;

    let standings = ctx.economy.leaderboard(SERVER, 2).await;
    assert_eq!(standings.len(), 2);
    assert_eq!(standings[0].user, 3);
    assert_eq!(standings[1].user, ALICE);
    assert_eq!(standings[1].total, 500);
}

#[tokio::test]
async fn balance_and_item_predicates() {
    let (_dir, ctx) = common::temp_context();
    ctx.economy.ensure_account(SERVER, ALICE).await;
    ctx.economy.add_wallet(SERVER, ALICE, 200).await;
    ctx.economy.add_bank(SERVER, ALICE, 300).await;
    ctx.economy.add_item(SERVER, ALICE, "lockpick", 1).await;

    assert_eq!(ctx.economy.total_balance(SERVER, ALICE).await, 500);
    assert!(ctx.economy.has_wallet(SERVER, ALICE, 200).await);
    assert!(!ctx.economy.has_wallet(SERVER, ALICE, 201).await);
    assert!(ctx.economy.has_item(SERVER, ALICE, "lockpick").await);
    assert!(!ctx.economy.has_item(SERVER, ALICE, "gun").await);
}

#[tokio::test]
async fn credits_saturate_instead_of_overflowing() {
    let (_dir, ctx) = common::temp_context();
    ctx.economy.add_wallet(SERVER, ALICE, i64::MAX - 5).await;
    let wallet = ctx.economy.add_wallet(SERVER, ALICE, 1_000).await;
    assert_eq!(wallet, i64::MAX);
}
