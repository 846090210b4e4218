//! languages.rs
//!
//! Merges per-repository language byte counts into one percentage
//! distribution. Percentages are kept as integer tenths of a percent, which is
//! exactly the precision the card displays, so the legend always adds up to
//! 100.0%.
//!
//! Steps:
//!   • sum bytes per language across repositories
//!   • rank by bytes, ties by name
//!   • fold languages under the minimum share into "Other"
//!   • floor to tenths, push the rounding residual onto the largest entry
//!   • attach a stable display color

use std::collections::BTreeMap;

/// Language name → bytes, as reported for one repository.
pub type LanguageBytes = BTreeMap<String, u64>;

pub const OTHER: &str = "Other";
const OTHER_COLOR: &str = "#8b949e";

/// 100.0% expressed in tenths.
pub const TOTAL_TENTHS: u32 = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageShare {
    pub language: String,
    /// Share in tenths of a percent (`905` is 90.5%).
    pub tenths: u32,
    pub color: String,
}

impl LanguageShare {
    pub fn percentage(&self) -> f64 {
        f64::from(self.tenths) / 10.0
    }

    pub fn is_other(&self) -> bool {
        self.language == OTHER
    }
}

/// Sorted language shares, "Other" last when present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Distribution {
    entries: Vec<LanguageShare>,
}

impl Distribution {
    pub fn entries(&self) -> &[LanguageShare] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_tenths(&self) -> u32 {
        self.entries.iter().map(|e| e.tenths).sum()
    }

    #[cfg(test)]
    pub(crate) fn from_entries(entries: Vec<LanguageShare>) -> Self {
        Self { entries }
    }
}

/// Sum byte counts per language across repositories.
pub fn sum_bytes<'a, I>(repos: I) -> LanguageBytes
where
    I: IntoIterator<Item = &'a LanguageBytes>,
{
    let mut totals = LanguageBytes::new();
    for languages in repos {
        for (language, bytes) in languages {
            let slot = totals.entry(language.clone()).or_insert(0);
            *slot = slot.saturating_add(*bytes);
        }
    }
    totals
}

/// Exact percentage of `bytes` in `total`, used for the threshold test.
fn share(bytes: u128, total: u128) -> f64 {
    100.0 * bytes as f64 / total as f64
}

/// `bytes / total` in tenths of a percent, rounded down.
fn to_tenths(bytes: u128, total: u128) -> u32 {
    (bytes * u128::from(TOTAL_TENTHS) / total) as u32
}

/// Aggregate repositories into a distribution; `min_share` is in percent.
pub fn aggregate<'a, I>(repos: I, min_share: f64) -> Distribution
where
    I: IntoIterator<Item = &'a LanguageBytes>,
{
    let mut ranked: Vec<(String, u64)> = sum_bytes(repos)
        .into_iter()
        .filter(|(_, bytes)| *bytes > 0)
        .collect();

    let total: u128 = ranked.iter().map(|(_, bytes)| u128::from(*bytes)).sum();
    if total == 0 {
        return Distribution::default();
    }

    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let (primary, tail): (Vec<_>, Vec<_>) = ranked
        .into_iter()
        .partition(|(_, bytes)| share(u128::from(*bytes), total) >= min_share);

    let mut entries: Vec<LanguageShare> = primary
        .into_iter()
        .map(|(language, bytes)| LanguageShare {
            tenths: to_tenths(u128::from(bytes), total),
            color: language_color(&language),
            language,
        })
        .collect();

    if !tail.is_empty() {
        let other_bytes: u128 = tail.iter().map(|(_, bytes)| u128::from(*bytes)).sum();
        entries.push(LanguageShare {
            language: OTHER.to_string(),
            tenths: to_tenths(other_bytes, total),
            color: OTHER_COLOR.to_string(),
        });
    }

    absorb_residual(&mut entries);

    Distribution { entries }
}

/// Move the rounding residual onto the largest entry (first one on ties).
///
/// Every entry is floored, so the residual is never negative and the
/// largest entry only grows.
fn absorb_residual(entries: &mut [LanguageShare]) {
    let assigned: u32 = entries.iter().map(|e| e.tenths).sum();
    let residual = TOTAL_TENTHS - assigned;
    if residual == 0 {
        return;
    }

    let largest = (0..entries.len()).fold(0, |best, i| {
        if entries[i].tenths > entries[best].tenths { i } else { best }
    });

    if let Some(entry) = entries.get_mut(largest) {
        entry.tenths += residual;
    }
}

/// Display color for a language: linguist's color when known, a hash-derived one otherwise.
pub fn language_color(language: &str) -> String {
    match known_color(language) {
        Some(color) => color.to_string(),
        None => fallback_color(language),
    }
}

fn known_color(language: &str) -> Option<&'static str> {
    let color = match language {
        "Assembly" => "#6E4C13",
        "Astro" => "#ff5a03",
        "C" => "#555555",
        "C#" => "#178600",
        "C++" => "#f34b7d",
        "CMake" => "#DA3434",
        "CSS" => "#563d7c",
        "Clojure" => "#db5855",
        "Dart" => "#00B4AB",
        "Dockerfile" => "#384d54",
        "Elixir" => "#6e4a7e",
        "Erlang" => "#B83998",
        "F#" => "#b845fc",
        "Go" => "#00ADD8",
        "Groovy" => "#4298b8",
        "HTML" => "#e34c26",
        "Haskell" => "#5e5086",
        "Java" => "#b07219",
        "JavaScript" => "#f1e05a",
        "Julia" => "#a270ba",
        "Jupyter Notebook" => "#DA5B0B",
        "Kotlin" => "#A97BFF",
        "Lua" => "#000080",
        "MATLAB" => "#e16737",
        "Makefile" => "#427819",
        "Nix" => "#7e7eff",
        "Objective-C" => "#438eff",
        "PHP" => "#4F5D95",
        "Perl" => "#0298c3",
        "PowerShell" => "#012456",
        "Python" => "#3572A5",
        "R" => "#198CE7",
        "Ruby" => "#701516",
        "Rust" => "#dea584",
        "SCSS" => "#c6538c",
        "Scala" => "#c22d40",
        "Shell" => "#89e051",
        "Solidity" => "#AA6746",
        "Svelte" => "#ff3e00",
        "Swift" => "#F05138",
        "TeX" => "#3D6117",
        "TypeScript" => "#3178c6",
        "Vim Script" => "#199f4b",
        "Vue" => "#41b883",
        "Zig" => "#ec915c",
        _ => return None,
    };
    Some(color)
}

/// 32-bit FNV-1a over the UTF-8 bytes of `s`.
fn fnv1a(s: &str) -> u32 {
    s.bytes().fold(0x811c_9dc5, |hash, byte| {
        (hash ^ u32::from(byte)).wrapping_mul(0x0100_0193)
    })
}

/// hue = fnv1a(name) mod 360, saturation 65%, lightness 55%.
fn fallback_color(language: &str) -> String {
    let hue = f64::from(fnv1a(language) % 360);
    let (r, g, b) = hsl_to_rgb(hue, 0.65, 0.55);
    format!("#{r:02x}{g:02x}{b:02x}")
}

fn hsl_to_rgb(hue: f64, saturation: f64, lightness: f64) -> (u8, u8, u8) {
    let chroma = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let sector = hue / 60.0;
    let x = chroma * (1.0 - (sector % 2.0 - 1.0).abs());

    let (r, g, b) = match sector as u32 {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };

    let m = lightness - chroma / 2.0;
    let channel = |v: f64| ((v + m) * 255.0).round() as u8;
    (channel(r), channel(g), channel(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn repo(pairs: &[(&str, u64)]) -> LanguageBytes {
        pairs.iter().map(|(l, b)| (l.to_string(), *b)).collect()
    }

    fn summary(distribution: &Distribution) -> Vec<(String, f64)> {
        distribution
            .entries()
            .iter()
            .map(|e| (e.language.clone(), e.percentage()))
            .collect()
    }

    #[test]
    fn no_repositories_gives_empty_distribution() {
        let repos: Vec<LanguageBytes> = Vec::new();
        let distribution = aggregate(&repos, 1.0);
        assert!(distribution.is_empty());
        assert_eq!(distribution.total_tenths(), 0);
    }

    #[test]
    fn zero_bytes_gives_empty_distribution() {
        let repos = vec![repo(&[("Rust", 0)]), repo(&[])];
        assert!(aggregate(&repos, 1.0).is_empty());
    }

    #[test]
    fn single_language_is_whole_bar() {
        let repos = vec![repo(&[("Rust", 1000)])];
        let distribution = aggregate(&repos, 1.0);
        assert_eq!(summary(&distribution), vec![("Rust".to_string(), 100.0)]);
        assert_eq!(distribution.entries()[0].color, "#dea584");
    }

    #[test]
    fn two_languages_above_threshold() {
        let repos = vec![repo(&[("Go", 900)]), repo(&[("Python", 100)])];
        let distribution = aggregate(&repos, 1.0);
        assert_eq!(
            summary(&distribution),
            vec![("Go".to_string(), 90.0), ("Python".to_string(), 10.0)]
        );
    }

    #[test]
    fn long_tail_collapses_into_other() {
        let mut languages = vec![("Dominant".to_string(), 900u64)];
        languages.extend((0..10).map(|i| (format!("Tail{i}"), 10u64)));
        let repos = vec![languages.into_iter().collect::<LanguageBytes>()];

        let distribution = aggregate(&repos, 5.0);
        assert_eq!(
            summary(&distribution),
            vec![("Dominant".to_string(), 90.0), (OTHER.to_string(), 10.0)]
        );
        assert_eq!(distribution.entries()[1].color, OTHER_COLOR);
    }

    #[test]
    fn bytes_are_summed_across_repositories() {
        let repos = vec![
            repo(&[("Rust", 300), ("Shell", 50)]),
            repo(&[("Rust", 300), ("Python", 300)]),
            repo(&[("Shell", 50)]),
        ];
        let distribution = aggregate(&repos, 1.0);
        assert_eq!(
            summary(&distribution),
            vec![
                ("Rust".to_string(), 60.0),
                ("Python".to_string(), 30.0),
                ("Shell".to_string(), 10.0),
            ]
        );
    }

    #[test]
    fn ties_are_broken_by_name() {
        let repos = vec![repo(&[("Zig", 100), ("Ada", 100), ("Lua", 100)])];
        let names: Vec<_> = aggregate(&repos, 1.0)
            .entries()
            .iter()
            .map(|e| e.language.clone())
            .collect();
        assert_eq!(names, ["Ada", "Lua", "Zig"]);
    }

    #[test]
    fn rounding_residual_goes_to_largest_entry() {
        // 1/3 each rounds to 33.3 three times; the first (largest by tie order) takes 33.4.
        let repos = vec![repo(&[("A", 1), ("B", 1), ("C", 1)])];
        let distribution = aggregate(&repos, 1.0);
        let tenths: Vec<_> = distribution.entries().iter().map(|e| e.tenths).collect();
        assert_eq!(tenths, [334, 333, 333]);
    }

    #[test]
    fn near_equal_languages_stay_in_descending_order() {
        let repos = vec![repo(&[("A", 3336), ("B", 3335), ("C", 3329)])];
        let distribution = aggregate(&repos, 1.0);
        assert_eq!(
            summary(&distribution),
            [("A".to_string(), 33.5), ("B".to_string(), 33.3), ("C".to_string(), 33.2)]
        );
    }

    #[test]
    fn many_languages_just_above_threshold_still_sum_to_one_hundred() {
        let mut languages: Vec<(String, u64)> = (0..95).map(|i| (format!("Lang{i:02}"), 105)).collect();
        languages.push(("Tail".to_string(), 25));
        let repos = vec![languages.into_iter().collect::<LanguageBytes>()];

        let distribution = aggregate(&repos, 1.0);
        let entries = distribution.entries();

        assert_eq!(distribution.total_tenths(), TOTAL_TENTHS);
        assert_eq!(entries.len(), 96);
        assert_eq!((entries[0].language.as_str(), entries[0].tenths), ("Lang00", 58));
        assert!(entries[1..95].iter().all(|e| e.tenths == 10));
        assert!(entries[95].is_other());
        assert_eq!(entries[95].tenths, 2);
    }

    #[test]
    fn everything_under_threshold_is_only_other() {
        let repos = vec![repo(&[("A", 10), ("B", 10)])];
        let distribution = aggregate(&repos, 60.0);
        assert_eq!(summary(&distribution), vec![(OTHER.to_string(), 100.0)]);
    }

    #[test]
    fn fallback_color_is_stable_and_well_formed() {
        let first = language_color("Brainfuck++");
        let second = language_color("Brainfuck++");
        assert_eq!(first, second);
        assert_eq!(first.len(), 7);
        assert!(first.starts_with('#'));
        assert!(first[1..].chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(language_color("Brainfuck++"), language_color("Befunge"));
    }

    #[test]
    fn fnv1a_matches_reference_vectors() {
        assert_eq!(fnv1a(""), 0x811c_9dc5);
        assert_eq!(fnv1a("a"), 0xe40c_292c);
    }

    #[test]
    fn hsl_primary_hues() {
        assert_eq!(hsl_to_rgb(0.0, 1.0, 0.5), (255, 0, 0));
        assert_eq!(hsl_to_rgb(120.0, 1.0, 0.5), (0, 255, 0));
        assert_eq!(hsl_to_rgb(240.0, 1.0, 0.5), (0, 0, 255));
    }

    fn repos_strategy() -> impl Strategy<Value = Vec<LanguageBytes>> {
        prop::collection::vec(
            prop::collection::btree_map("[A-F][a-z]{0,2}", 0u64..5_000_000, 0..6),
            0..5,
        )
    }

    proptest! {
        #[test]
        fn displayed_percentages_sum_to_one_hundred(repos in repos_strategy(), min_share in 0.0f64..20.0) {
            let distribution = aggregate(&repos, min_share);
            if !distribution.is_empty() {
                let displayed: f64 = distribution
                    .entries()
                    .iter()
                    .map(|e| format!("{:.1}", e.percentage()).parse::<f64>().unwrap() * 10.0)
                    .map(f64::round)
                    .sum();
                prop_assert_eq!(displayed, 1000.0);
            }
        }

        #[test]
        fn names_unique_and_other_last(repos in repos_strategy(), min_share in 0.0f64..20.0) {
            let distribution = aggregate(&repos, min_share);
            let entries = distribution.entries();
            let mut names: Vec<_> = entries.iter().map(|e| e.language.as_str()).collect();
            names.sort_unstable();
            names.dedup();
            prop_assert_eq!(names.len(), entries.len());
            if let Some(position) = entries.iter().position(LanguageShare::is_other) {
                prop_assert_eq!(position, entries.len() - 1);
            }
        }

        #[test]
        fn sorted_descending_with_other_last(repos in repos_strategy(), min_share in 0.0f64..20.0) {
            let totals = sum_bytes(&repos);
            let distribution = aggregate(&repos, min_share);
            let primary: Vec<_> = distribution.entries().iter().filter(|e| !e.is_other()).collect();

            for pair in primary.windows(2) {
                let (a, b) = (pair[0], pair[1]);
                prop_assert!(a.tenths >= b.tenths, "{} ({}) before {} ({})", a.language, a.tenths, b.language, b.tenths);
                let (bytes_a, bytes_b) = (totals[&a.language], totals[&b.language]);
                prop_assert!(bytes_a > bytes_b || (bytes_a == bytes_b && a.language < b.language));
            }
            if let Some(last) = distribution.entries().last() {
                prop_assert_eq!(last.is_other(), primary.len() < distribution.entries().len());
            }
        }

        #[test]
        fn other_matches_collapsed_bytes(repos in repos_strategy(), min_share in 0.0f64..20.0) {
            let totals = sum_bytes(&repos);
            let total: u128 = totals.values().map(|b| u128::from(*b)).sum();
            let distribution = aggregate(&repos, min_share);
            let entries = distribution.entries();

            let Some(other) = entries.iter().find(|e| e.is_other()) else {
                return Ok(());
            };
            let tail: u128 = totals
                .values()
                .map(|b| u128::from(*b))
                .filter(|b| *b > 0 && share(*b, total) < min_share)
                .sum();
            let expected = to_tenths(tail, total);

            // Other only moves off its floored value when it took the residual as the largest entry.
            if entries.iter().any(|e| !e.is_other() && e.tenths >= expected) {
                prop_assert_eq!(other.tenths, expected);
            } else {
                prop_assert!(other.tenths >= expected && other.tenths < expected + entries.len() as u32);
            }
        }

        #[test]
        fn aggregation_is_idempotent(repos in repos_strategy(), min_share in 0.0f64..20.0) {
            prop_assert_eq!(aggregate(&repos, min_share), aggregate(&repos, min_share));
        }

        #[test]
        fn grouping_follows_threshold(repos in repos_strategy(), min_share in 0.0f64..20.0) {
            let totals = sum_bytes(&repos);
            let total: u128 = totals.values().map(|b| u128::from(*b)).sum();
            let distribution = aggregate(&repos, min_share);

            for (language, bytes) in &totals {
                if *bytes == 0 {
                    continue;
                }
                let standalone = distribution
                    .entries()
                    .iter()
                    .any(|e| !e.is_other() && &e.language == language);
                prop_assert_eq!(standalone, share(u128::from(*bytes), total) >= min_share);
            }
        }
    }
}
