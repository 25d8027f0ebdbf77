use crate::{Card, Denial, Suit};
use serde::{Deserialize, Serialize};

/// Table rules and engine knobs the collaborator can configure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rules {
    /// Seated players, 2 to 4
    pub players: u8,
    /// Whether the wildcard may fill one missing rank inside a run
    pub wildcard: bool,
    pub wildcard_card: Card,
    /// Upper bound on hidden draws evaluated per recommendation; `None` evaluates the whole pool
    pub hidden_sample_limit: Option<usize>,
    pub sample_seed: u64,
    pub weights: Weights,
}

impl Default for Rules {
    fn default() -> Self {
        Rules {
            players: 4,
            wildcard: false,
            wildcard_card: Card::new(Suit::Oros, 1),
            hidden_sample_limit: Some(60),
            sample_seed: 0x00C4_1C40,
            weights: Weights::default(),
        }
    }
}

impl Rules {
    pub fn validate(&self) -> Result<(), Denial> {
        if !(2..=4).contains(&self.players) {
            return Err(Denial::InvalidPlayerCount(self.players));
        }
        Ok(())
    }

    /// The wildcard card when the rule is enabled
    pub fn active_wildcard(&self) -> Option<Card> {
        self.wildcard.then_some(self.wildcard_card)
    }
}

/// Heuristic scoring constants. Their relative magnitudes are tuned together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weights {
    /// Per card inside a run or set
    pub grouped: i32,
    /// Per card, for each same-suit neighbouring rank it holds
    pub adjacent: i32,
    /// Per rank held in exactly two suits
    pub pair: i32,
    /// Per card of rank 4, 5 or 6
    pub center: i32,
    /// Subtracted per card with no neighbour and no same-rank partner
    pub isolated: i32,
    /// Per rival table pick one rank away in the discard's suit
    pub connector_heat: i32,
    /// Per rival table pick of the discard's rank
    pub same_rank_heat: i32,
    /// Penalty for shedding the low leftover a six-card closure needs
    pub keep_low_leftover: i32,
    /// Reward for shedding a high card once a low leftover is in place
    pub shed_high_leftover: i32,
    /// Small nudge toward shedding high cards while closure is not shaped yet
    pub shed_nudge: i32,
    /// Reward when the discard leaves the hand ready to close
    pub closure_bonus: i32,
}

impl Default for Weights {
    fn default() -> Self {
        Weights {
            grouped: 1000,
            adjacent: 30,
            pair: 40,
            center: 10,
            isolated: 25,
            connector_heat: 8,
            same_rank_heat: 10,
            keep_low_leftover: 50,
            shed_high_leftover: 20,
            shed_nudge: 10,
            closure_bonus: 300,
        }
    }
}
