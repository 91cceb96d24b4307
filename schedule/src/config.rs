//! Binder configuration.
//!
//! Typed configuration with a bon builder and an environment fallback.

use bon::bon;

use crate::lane::Lane;

/// Tile size used when nothing else is configured.
pub const DEFAULT_TILE: i64 = 8;

/// How the binder maps a stage's 2-D grid onto blocks and threads.
///
/// The first grid axis ("row") is split into `row_block × row_thread`, the second
/// ("col") into `col_block × col_thread`; both thread lanes have extent `tile`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinderConfig {
    pub tile: i64,
    pub row_block: Lane,
    pub col_block: Lane,
    pub row_thread: Lane,
    pub col_thread: Lane,
}

#[bon]
impl BinderConfig {
    #[builder]
    pub fn new(
        #[builder(default = DEFAULT_TILE)] tile: i64,
        #[builder(default = Lane::BlockY)] row_block: Lane,
        #[builder(default = Lane::BlockX)] col_block: Lane,
        #[builder(default = Lane::ThreadY)] row_thread: Lane,
        #[builder(default = Lane::ThreadX)] col_thread: Lane,
    ) -> Self {
        Self { tile, row_block, col_block, row_thread, col_thread }
    }

    /// Default lanes, tile taken from the environment.
    ///
    /// # Environment Variables
    ///
    /// * `TESSERA_TILE=N` - Thread tile size (positive integer, default 8)
    pub fn from_env() -> Self {
        let tile = std::env::var("TESSERA_TILE")
            .ok()
            .and_then(|value| value.trim().parse::<i64>().ok())
            .filter(|&tile| tile > 0)
            .unwrap_or(DEFAULT_TILE);
        Self::builder().tile(tile).build()
    }
}

impl Default for BinderConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}
