use crate::error::Result;
use crate::languages::LanguageBytes;
use crate::stats::ActivityStats;

/// One non-fork repository with its language breakdown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Repository {
    pub owner: String,
    pub name: String,
    pub stars: u64,
    pub languages: LanguageBytes,
}

/// Everything a run needs from the hosting platform.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawData {
    pub repositories: Vec<Repository>,
    pub activity: ActivityStats,
}

/// Where repository and activity data comes from; the live client or a fixture.
#[allow(async_fn_in_trait)]
pub trait StatsSource {
    async fn fetch(&self, username: &str) -> Result<RawData>;
}
