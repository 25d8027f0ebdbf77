use crate::evaluator::{Evaluation, MAX_LEFTOVER_RANK, evaluate};
use crate::{Card, Weights};
use serde::Serialize;

/// The discard picked for a hand and what the remaining cards look like
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscardChoice {
    pub discard: Card,
    /// Heuristic score of the remaining hand after penalties
    pub net_score: i32,
    pub evaluation: Evaluation,
}

/// Penalty for handing `card` to rivals who have been taking its neighbours
/// or its rank from the table
pub fn rival_heat(card: Card, rival_picks: &[Card], weights: &Weights) -> i32 {
    rival_picks
        .iter()
        .map(|pick| {
            let mut heat = 0;
            if pick.suit() == card.suit() && pick.ordinal().abs_diff(card.ordinal()) == 1 {
                heat += weights.connector_heat;
            }
            if pick.rank() == card.rank() {
                heat += weights.same_rank_heat;
            }
            heat
        })
        .sum()
}

/// Penalty steering the discard toward a six-card closure with a low leftover
fn closure_shaping(discard: Card, remaining: &Evaluation, weights: &Weights) -> i32 {
    if !remaining.can_close_six {
        return 0;
    }
    let low = |c: &Card| c.rank() <= MAX_LEFTOVER_RANK;
    let discard_is_low = low(&discard);
    match remaining.leftovers.as_slice() {
        [leftover] if low(leftover) => {
            if discard_is_low {
                weights.keep_low_leftover
            } else {
                -weights.shed_high_leftover
            }
        }
        _ if discard_is_low => weights.shed_nudge,
        _ => -weights.shed_nudge,
    }
}

/// Try every single-card discard from `cards` and keep the best remaining hand.
///
/// Ties go to a card that is loose in the full hand, then to the card worth
/// more points. Returns `None` for an empty hand.
pub fn best_discard(
    cards: &[Card],
    wildcard: Option<Card>,
    weights: &Weights,
    rival_picks: &[Card],
) -> Option<DiscardChoice> {
    let full = evaluate(cards, wildcard, weights);
    let mut best: Option<(DiscardChoice, (bool, u8))> = None;

    for (i, &discard) in cards.iter().enumerate() {
        let mut remaining = cards.to_vec();
        remaining.remove(i);
        let evaluation = evaluate(&remaining, wildcard, weights);

        let mut penalty = closure_shaping(discard, &evaluation, weights);
        if evaluation.close_ready {
            penalty -= weights.closure_bonus;
        }
        penalty += rival_heat(discard, rival_picks, weights);

        let net_score = evaluation.score - penalty;
        let tie_break = (!full.is_grouped(&discard), discard.value());

        let better = match &best {
            None => true,
            Some((current, current_tie)) => {
                net_score > current.net_score
                    || (net_score == current.net_score && tie_break > *current_tie)
            }
        };
        if better {
            best = Some((
                DiscardChoice {
                    discard,
                    net_score,
                    evaluation,
                },
                tie_break,
            ));
        }
    }

    best.map(|(choice, _)| choice)
}
