//! Synthetic weekly stat lines for exercising the pipeline without the provider.

use fantasy_pipeline::{PlayerRecord, StatLine, TEST_DATA_SOURCE};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const TEAMS: [&str; 32] = [
    "BUF", "MIA", "NE", "NYJ", "BAL", "CIN", "CLE", "PIT", "HOU", "IND", "JAX", "TEN", "DEN", "KC",
    "LV", "LAC", "DAL", "NYG", "PHI", "WAS", "CHI", "DET", "GB", "MIN", "ATL", "CAR", "NO", "TB",
    "ARI", "LAR", "SF", "SEA",
];

const QB_NAMES: [&str; 12] = [
    "Josh Allen", "Tua Tagovailoa", "Mac Jones", "Aaron Rodgers", "Lamar Jackson", "Joe Burrow",
    "Deshaun Watson", "Kenny Pickett", "C.J. Stroud", "Anthony Richardson", "Trevor Lawrence",
    "Ryan Tannehill",
];

const RB_NAMES: [&str; 12] = [
    "Josh Jacobs", "Saquon Barkley", "Christian McCaffrey", "Derrick Henry", "Austin Ekeler",
    "Nick Chubb", "Dalvin Cook", "Aaron Jones", "Alvin Kamara", "Jonathan Taylor",
    "Travis Etienne", "Tony Pollard",
];

const WR_NAMES: [&str; 12] = [
    "Tyreek Hill", "Stefon Diggs", "DeAndre Hopkins", "Davante Adams", "Cooper Kupp", "Mike Evans",
    "Chris Godwin", "DK Metcalf", "A.J. Brown", "Ja'Marr Chase", "Justin Jefferson", "CeeDee Lamb",
];

const TE_NAMES: [&str; 8] = [
    "Travis Kelce", "Mark Andrews", "George Kittle", "Darren Waller", "T.J. Hockenson",
    "Kyle Pitts", "Dallas Goedert", "Pat Freiermuth",
];

pub struct FixtureGenerator {
    rng: StdRng,
}

impl FixtureGenerator {
    /// A seeded generator always produces the same players and stats
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    fn count(&mut self, low: u32, high: u32) -> f64 {
        f64::from(self.rng.gen_range(low..=high))
    }

    fn qb_stats(&mut self) -> StatLine {
        StatLine {
            passing_yards: self.count(180, 420),
            passing_tds: self.count(0, 4),
            interceptions: self.count(0, 2),
            rushing_yards: self.count(0, 60),
            rushing_tds: self.count(0, 1),
            ..StatLine::default()
        }
    }

    fn rb_stats(&mut self) -> StatLine {
        StatLine {
            rushing_yards: self.count(30, 180),
            rushing_tds: self.count(0, 3),
            receiving_yards: self.count(10, 80),
            receptions: self.count(2, 8),
            receiving_tds: self.count(0, 1),
            fumbles: self.count(0, 1),
            ..StatLine::default()
        }
    }

    fn wr_stats(&mut self) -> StatLine {
        StatLine {
            receiving_yards: self.count(20, 150),
            receptions: self.count(3, 12),
            receiving_tds: self.count(0, 2),
            rushing_yards: self.count(0, 20),
            rushing_tds: self.count(0, 1),
            fumbles: self.count(0, 1),
            ..StatLine::default()
        }
    }

    fn te_stats(&mut self) -> StatLine {
        StatLine {
            receiving_yards: self.count(15, 120),
            receptions: self.count(2, 10),
            receiving_tds: self.count(0, 2),
            fumbles: self.count(0, 1),
            ..StatLine::default()
        }
    }

    /// QBs, RBs, WRs then TEs, each group spread over a different run of teams.
    /// Scores are left unset so the pipeline computes them.
    pub fn generate(&mut self, week: i32, year: i32) -> Vec<PlayerRecord> {
        let groups: [(&[&str], &str, usize); 4] = [
            (&QB_NAMES, "QB", 0),
            (&RB_NAMES, "RB", 12),
            (&WR_NAMES, "WR", 24),
            (&TE_NAMES, "TE", 0),
        ];

        let mut players = Vec::new();
        for (names, position, team_offset) in groups {
            for (i, name) in names.iter().enumerate() {
                let line = match position {
                    "QB" => self.qb_stats(),
                    "RB" => self.rb_stats(),
                    "WR" => self.wr_stats(),
                    _ => self.te_stats(),
                };

                let team = TEAMS[(i + team_offset) % TEAMS.len()];
                let mut player = PlayerRecord::new(*name, team, position).with_stats(line);
                player.week = Some(week);
                player.year = Some(year);
                player.source_url = Some(TEST_DATA_SOURCE.to_string());
                players.push(player);
            }
        }
        players
    }
}
