//! Test utilities & fixtures.
//! Every test gets its own temp data dir; state files are created on save.

use std::path::Path;

use voltbot::state::BotContext;

/// A context whose four documents live under a fresh temp dir. Keep the
/// `TempDir` alive for the duration of the test.
pub fn temp_context() -> (tempfile::TempDir, BotContext) {
    let dir = tempfile::tempdir().expect("tempdir");
    let ctx = BotContext::new(dir.path());
    (dir, ctx)
}

/// A second context over the same data dir, for save/load round-trips.
#[allow(dead_code)] // Not every integration test file reloads state.
pub fn reopen(data_dir: &Path) -> BotContext {
    BotContext::new(data_dir)
}
