//! Static item, job, and achievement registries.
//!
//! These tables are the bot's immutable game data: every key that can appear
//! in an inventory, a job assignment, or an unlock set is declared here, and
//! the managers treat an unknown key as a no-op. Keys are stable strings and
//! are matched exactly.

/// A catalog item. Sellable items carry a per-unit value range that sale
/// pricing draws from; gear sold in the shop carries a fixed purchase price
/// and cannot be sold back.
#[derive(Debug, Clone, Copy)]
pub struct ItemDef {
    pub key: &'static str,
    pub name: &'static str,
    pub sellable: bool,
    /// Inclusive per-unit sale value range. Zero for non-sellable gear.
    pub min_value: i64,
    pub max_value: i64,
    /// Shop purchase price, if the item is purchasable at all.
    pub price: Option<i64>,
}

/// A job a user can hold. Payout is credited per polling interval by the
/// external payout collaborator; `decline_chance` is the probability an
/// application is rejected.
#[derive(Debug, Clone, Copy)]
pub struct JobDef {
    pub key: &'static str,
    pub name: &'static str,
    pub payout_per_minute: i64,
    pub decline_chance: f64,
}

/// A one-time achievement with a wallet reward granted on first unlock.
#[derive(Debug, Clone, Copy)]
pub struct AchievementDef {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub reward: i64,
}

/// Cost (wallet) of founding a player guild. Deducted by the calling layer
/// before `GuildsManager::create_guild`.
pub const GUILD_CREATION_COST: i64 = 12_500;

pub static ITEMS: &[ItemDef] = &[
    ItemDef { key: "golden_potato", name: "Golden Potato", sellable: true, min_value: 30, max_value: 30, price: None },
    ItemDef { key: "rainbow_trout", name: "Rainbow Trout", sellable: true, min_value: 15, max_value: 22, price: None },
    ItemDef { key: "bass", name: "Bass", sellable: true, min_value: 18, max_value: 19, price: None },
    ItemDef { key: "sunfish", name: "Sunfish", sellable: true, min_value: 17, max_value: 20, price: None },
    ItemDef { key: "spearfish", name: "Spearfish", sellable: true, min_value: 25, max_value: 32, price: None },
    ItemDef { key: "voltfish", name: "Voltfish", sellable: true, min_value: 27, max_value: 36, price: None },
    ItemDef { key: "angel_o8", name: "Angel_o8", sellable: true, min_value: 5_000, max_value: 10_000, price: None },
    ItemDef { key: "lockpick", name: "Lockpick", sellable: false, min_value: 0, max_value: 0, price: Some(50) },
    ItemDef { key: "gun", name: "Gun", sellable: false, min_value: 0, max_value: 0, price: Some(150) },
    ItemDef { key: "advanced_lockpick", name: "Advanced Lockpick", sellable: false, min_value: 0, max_value: 0, price: Some(500) },
    ItemDef { key: "hacker_tool", name: "Hacker Tool", sellable: false, min_value: 0, max_value: 0, price: Some(1_200) },
    ItemDef { key: "mask", name: "Mask", sellable: false, min_value: 0, max_value: 0, price: Some(60) },
    ItemDef { key: "license_plate_blocker", name: "License Plate Blocker", sellable: false, min_value: 0, max_value: 0, price: Some(500) },
    ItemDef { key: "admin_itemitemitem", name: "Volts Prize", sellable: false, min_value: 0, max_value: 0, price: Some(9_999_999) },
];

/// Keys purchasable through the shop, in display order. The admin prize is
/// deliberately excluded.
pub static SHOP_ITEMS: &[&str] = &[
    "lockpick",
    "gun",
    "advanced_lockpick",
    "hacker_tool",
    "mask",
    "license_plate_blocker",
];

pub static JOBS: &[JobDef] = &[
    JobDef { key: "factory_worker", name: "Factory Worker", payout_per_minute: 50, decline_chance: 0.05 },
    JobDef { key: "office_worker", name: "Office Worker", payout_per_minute: 100, decline_chance: 0.35 },
    JobDef { key: "scientist", name: "Scientist", payout_per_minute: 250, decline_chance: 0.60 },
    JobDef { key: "doctor", name: "Doctor", payout_per_minute: 500, decline_chance: 0.90 },
];

pub static ACHIEVEMENTS: &[AchievementDef] = &[
    AchievementDef { key: "money_lover", name: "Money Lover", description: "Have 5K Total at some point", reward: 50 },
    AchievementDef { key: "money_fiend", name: "Money Fiend", description: "Have 10K Total at some point", reward: 100 },
    AchievementDef { key: "smooth_criminal", name: "Smooth Criminal", description: "Rob without being caught", reward: 250 },
    AchievementDef { key: "minimum_wage_slave", name: "Minimum Wage Slave", description: "Work a job", reward: 500 },
    AchievementDef { key: "leaderboard", name: "Leaderboard", description: "Reach top 5 on the leaderboard (be in a top 5 guild)", reward: 5_000 },
    AchievementDef { key: "guildmaster", name: "Guildmaster", description: "Create a guild", reward: 2_500 },
    AchievementDef { key: "guildeer", name: "Guildeer", description: "Join a guild", reward: 100 },
    AchievementDef { key: "money_launderer", name: "Money Launderer", description: "Reach 100K total", reward: 2_000 },
    AchievementDef { key: "gifted_by_god", name: "Gifted by God", description: "Reach 1M total", reward: 1_000 },
    AchievementDef { key: "savehacking", name: "Savehacking", description: "Reach 10M Total", reward: 10_000 },
    AchievementDef { key: "volt_prize_receiver", name: "Volt Prize Receiver", description: "Have a \"Volt's Prize\" (admin_itemitemitem) in your inventory.", reward: 100_000 },
];

/// Look up an item by key.
pub fn item(key: &str) -> Option<&'static ItemDef> {
    ITEMS.iter().find(|def| def.key == key)
}

/// Look up a job by key.
pub fn job(key: &str) -> Option<&'static JobDef> {
    JOBS.iter().find(|def| def.key == key)
}

/// Look up an achievement by key.
pub fn achievement(key: &str) -> Option<&'static AchievementDef> {
    ACHIEVEMENTS.iter().find(|def| def.key == key)
}
