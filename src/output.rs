use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};

pub const LANGUAGES_CARD: &str = "languages_card.svg";
pub const STATS_CARD: &str = "stats_card.svg";

/// Both cards of a run, fully rendered before anything touches the disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedCards {
    pub languages: String,
    pub stats: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenAssets {
    pub languages: PathBuf,
    pub stats: PathBuf,
}

/// Write both cards into `dir`, replacing whatever a previous run left there.
pub fn write_cards(dir: &Path, cards: &RenderedCards) -> Result<WrittenAssets> {
    fs::create_dir_all(dir).map_err(|source| Error::io(dir, source))?;

    let languages = dir.join(LANGUAGES_CARD);
    let stats = dir.join(STATS_CARD);
    write_file(&languages, &cards.languages)?;
    write_file(&stats, &cards.stats)?;

    Ok(WrittenAssets { languages, stats })
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).map_err(|source| Error::io(path, source))?;
    debug!(path = %path.display(), bytes = contents.len(), "wrote card");
    Ok(())
}
