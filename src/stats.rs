use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivityStats {
    pub commits: u64,
    pub pull_requests: u64,
    pub issues: u64,
    pub stars: u64,
    pub repositories_contributed_to: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grade {
    APlus,
    A,
    BPlus,
    B,
    CPlus,
    C,
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::CPlus => "C+",
            Grade::C => "C",
        })
    }
}

/// Weighted contribution of a counter: full weight once `value` reaches `target`.
fn weighted(value: u64, target: f64, weight: f64) -> f64 {
    (value as f64 / target).min(1.0) * weight
}

impl ActivityStats {
    /// Rows in the order the stats card lists them.
    pub fn rows(&self) -> [(&'static str, u64); 5] {
        [
            ("Commits", self.commits),
            ("Pull Requests", self.pull_requests),
            ("Issues", self.issues),
            ("Stars", self.stars),
            ("Contributed To", self.repositories_contributed_to),
        ]
    }

    /// Score out of 100, weighted towards stars and commits.
    pub fn score(&self) -> f64 {
        weighted(self.stars, 50.0, 40.0)
            + weighted(self.commits, 200.0, 25.0)
            + weighted(self.pull_requests, 20.0, 15.0)
            + weighted(self.repositories_contributed_to, 10.0, 15.0)
            + weighted(self.issues, 30.0, 5.0)
    }

    pub fn grade(&self) -> Grade {
        match self.score() {
            s if s >= 90.0 => Grade::APlus,
            s if s >= 80.0 => Grade::A,
            s if s >= 70.0 => Grade::BPlus,
            s if s >= 60.0 => Grade::B,
            s if s >= 50.0 => Grade::CPlus,
            _ => Grade::C,
        }
    }
}
