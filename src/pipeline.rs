//! One run: fetch, aggregate, render, write. Nothing is written unless every
//! earlier stage succeeded.

use tracing::info;

use crate::config::Config;
use crate::error::Result;
use crate::languages::{self, Distribution};
use crate::output::{self, RenderedCards, WrittenAssets};
use crate::source::StatsSource;
use crate::stats::ActivityStats;
use crate::svg;

pub fn render(distribution: &Distribution, activity: &ActivityStats) -> Result<RenderedCards> {
    Ok(RenderedCards {
        languages: svg::render_language_card(distribution)?,
        stats: svg::render_stats_card(activity),
    })
}

pub async fn run<S: StatsSource>(source: &S, config: &Config) -> Result<WrittenAssets> {
    let raw = source.fetch(&config.username).await?;
    info!(
        repositories = raw.repositories.len(),
        username = %config.username,
        "fetched repository data"
    );

    let distribution = languages::aggregate(
        raw.repositories.iter().map(|r| &r.languages),
        config.min_share,
    );
    info!(entries = distribution.entries().len(), "aggregated languages");

    let cards = render(&distribution, &raw.activity)?;
    output::write_cards(&config.output_dir, &cards)
}
