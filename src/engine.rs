use crate::evaluator::evaluate;
use crate::optimizer::{DiscardChoice, best_discard};
use crate::{Card, Denial, HAND_SIZE, Rules};
use rand::{SeedableRng, rngs::SmallRng, seq::IndexedRandom};
use serde::Serialize;

/// What the engine can see when asked for advice
#[derive(Debug, Clone, Copy)]
pub struct Situation<'a> {
    pub hand: &'a [Card],
    pub table_card: Option<Card>,
    /// Pool a hidden draw may come from
    pub unseen: &'a [Card],
    /// The next hidden card when a recycled deck makes it certain
    pub known_next_draw: Option<Card>,
    /// Cards rivals took from the table
    pub rival_picks: &'a [Card],
}

/// Outcome of one draw followed by the best discard
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchOutcome {
    pub draw: Card,
    pub discard: Card,
    pub score: i32,
    /// The hand left behind can close (six with a low leftover, or seven)
    pub closes: bool,
}

impl BranchOutcome {
    fn new(draw: Card, choice: DiscardChoice) -> Self {
        BranchOutcome {
            draw,
            discard: choice.discard,
            score: choice.net_score,
            closes: choice.evaluation.close_ready || choice.evaluation.full_meld,
        }
    }
}

/// The draw-hidden branch, averaged over the candidate draws
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HiddenBranch {
    /// Mean score over the evaluated draws; `None` when nothing could be drawn
    pub expected: Option<f64>,
    pub best: Option<BranchOutcome>,
    pub evaluated: usize,
    pub pool: usize,
    /// The evaluated draw was certain rather than sampled
    pub certain: bool,
}

impl HiddenBranch {
    fn expected_or_floor(&self) -> f64 {
        self.expected.unwrap_or(f64::NEG_INFINITY)
    }
}

/// Action the engine recommends
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Advice {
    TakeAndClose { take: Card, discard: Card },
    CloseNow { leftover: Option<Card> },
    TakeFromTable { take: Card, discard: Card },
    DrawHidden { suggested_discard: Option<Card> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub advice: Advice,
    pub headline: String,
    pub notes: Vec<String>,
    pub explanation: Vec<String>,
    pub table: Option<BranchOutcome>,
    pub hidden: HiddenBranch,
}

fn hidden_branch(situation: &Situation<'_>, rules: &Rules) -> HiddenBranch {
    let wildcard = rules.active_wildcard();
    let pool = situation.unseen.len();

    let (draws, certain): (Vec<Card>, bool) = match situation.known_next_draw {
        Some(card) => (vec![card], true),
        None => match rules.hidden_sample_limit {
            Some(limit) if pool > limit => {
                let mut rng = SmallRng::seed_from_u64(rules.sample_seed);
                let sample = situation
                    .unseen
                    .choose_multiple(&mut rng, limit)
                    .copied()
                    .collect();
                (sample, false)
            }
            _ => (situation.unseen.to_vec(), false),
        },
    };

    let mut total = 0i64;
    let mut best: Option<BranchOutcome> = None;
    for &draw in &draws {
        let mut cards = situation.hand.to_vec();
        cards.push(draw);
        let Some(choice) = best_discard(&cards, wildcard, &rules.weights, situation.rival_picks)
        else {
            continue;
        };
        let outcome = BranchOutcome::new(draw, choice);
        total += i64::from(outcome.score);
        if best.as_ref().is_none_or(|b| outcome.score > b.score) {
            best = Some(outcome);
        }
    }

    HiddenBranch {
        expected: (!draws.is_empty()).then(|| total as f64 / draws.len() as f64),
        best,
        evaluated: draws.len(),
        pool,
        certain,
    }
}

/// Compare taking the table card with drawing hidden and pick one.
///
/// Fails with [`Denial::IncompleteHand`] unless the hand holds exactly seven cards.
pub fn recommend(situation: &Situation<'_>, rules: &Rules) -> Result<Recommendation, Denial> {
    if situation.hand.len() != HAND_SIZE {
        return Err(Denial::IncompleteHand(situation.hand.len()));
    }
    let wildcard = rules.active_wildcard();
    let mut explanation = Vec::new();

    let table = situation.table_card.and_then(|take| {
        let mut cards = situation.hand.to_vec();
        cards.push(take);
        best_discard(&cards, wildcard, &rules.weights, situation.rival_picks)
            .map(|choice| BranchOutcome::new(take, choice))
    });
    match &table {
        Some(t) if t.discard == t.draw => explanation.push(format!(
            "Taking the {} only to discard it again gains nothing",
            t.draw.name()
        )),
        Some(t) => explanation.push(format!(
            "Take the {} and discard the {} (score {})",
            t.draw.name(),
            t.discard.name(),
            t.score
        )),
        None => explanation.push("No card on the table.".to_string()),
    }
    // A take whose best discard is the same card leaves the hand unchanged
    let table_move = table.as_ref().filter(|t| t.discard != t.draw);

    let hidden = hidden_branch(situation, rules);
    match (&hidden.expected, &hidden.best) {
        (Some(expected), Some(best)) if hidden.certain => explanation.push(format!(
            "Draw hidden: the next card is the {} (recycled), then discard the {} (score {:.0})",
            best.draw.name(),
            best.discard.name(),
            expected
        )),
        (Some(expected), Some(best)) => explanation.push(format!(
            "Draw hidden: mean score {:.1} over {} of {} unseen cards; best case the {}, then discard the {}",
            expected,
            hidden.evaluated,
            hidden.pool,
            best.draw.name(),
            best.discard.name()
        )),
        _ => explanation.push("Draw hidden: no unseen cards left to estimate.".to_string()),
    }

    let current = evaluate(situation.hand, wildcard, &rules.weights);
    let current_closes = current.close_ready || current.full_meld;

    let (advice, mut headline) = match table_move {
        Some(t) if t.closes => (
            Advice::TakeAndClose {
                take: t.draw,
                discard: t.discard,
            },
            format!(
                "Take the {} to close right away (discard the {}).",
                t.draw.name(),
                t.discard.name()
            ),
        ),
        _ if current_closes => {
            let leftover = current.leftovers.first().copied();
            let text = match leftover {
                Some(card) => format!("Close now: your groups are complete and the {} is left over.", card.name()),
                None => "Close now: every card is grouped.".to_string(),
            };
            (Advice::CloseNow { leftover }, text)
        }
        Some(t) if f64::from(t.score) >= hidden.expected_or_floor() => (
            Advice::TakeFromTable {
                take: t.draw,
                discard: t.discard,
            },
            format!("Take the {} and discard the {}.", t.draw.name(), t.discard.name()),
        ),
        _ => {
            let suggested_discard = hidden.best.as_ref().map(|b| b.discard);
            let text = match suggested_discard {
                Some(card) => format!(
                    "Draw from the hidden pile. Once you see it, consider discarding the {}.",
                    card.name()
                ),
                None => "Draw from the hidden pile and discard your weakest card.".to_string(),
            };
            (Advice::DrawHidden { suggested_discard }, text)
        }
    };

    let mut notes = Vec::new();
    if current.can_close_six {
        notes.push("Conditional closure available after this move.".to_string());
    }
    if current.full_meld {
        notes.push("Maximum meld available.".to_string());
    }
    for note in &notes {
        headline.push(' ');
        headline.push_str(note);
    }

    log::info!("recommendation: {:?}", advice);

    Ok(Recommendation {
        advice,
        headline,
        notes,
        explanation,
        table,
        hidden,
    })
}
