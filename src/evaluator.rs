use crate::{Card, Suit, Weights};
use serde::Serialize;
use std::collections::BTreeSet;

/// Number of distinct ranks per suit
const ORDINALS: u8 = 10;

/// Grouped cards needed for the early (six-card) closure
pub const SIX_CLOSURE: usize = 6;

/// Grouped cards for a full meld
pub const FULL_MELD: usize = 7;

/// Highest rank the single leftover may have when closing with six grouped cards
pub const MAX_LEFTOVER_RANK: u8 = 3;

/// Type of meld in Chinchón
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MeldType {
    /// Same rank, distinct suits
    Set,
    /// Consecutive ranks, same suit
    Run,
}

/// A group of cards found in a hand
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Meld {
    pub meld_type: MeldType,
    /// Natural cards of the meld, runs in rank order
    pub cards: Vec<Card>,
    /// The card the wildcard stands in for, when it fills a gap in a run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wildcard_for: Option<Card>,
}

impl Meld {
    fn run(suit: Suit, from: u8, to: u8, missing: Option<u8>) -> Self {
        let cards = (from..=to)
            .filter(|&o| Some(o) != missing)
            .map(|o| card_at(suit, o))
            .collect();
        Meld {
            meld_type: MeldType::Run,
            cards,
            wildcard_for: missing.map(|o| card_at(suit, o)),
        }
    }

    fn set(cards: Vec<Card>) -> Self {
        Meld {
            meld_type: MeldType::Set,
            cards,
            wildcard_for: None,
        }
    }

    /// Positions the meld occupies, counting the wildcard slot
    pub fn len(&self) -> usize {
        self.cards.len() + usize::from(self.wildcard_for.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Result of grouping a hand into sets and runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    pub score: i32,
    pub grouped_count: usize,
    /// Every set detected, overlapping or not
    pub sets: Vec<Meld>,
    /// Every run detected, including wildcard candidates
    pub runs: Vec<Meld>,
    /// Melds chosen by the greedy assignment, in assignment order
    pub melds: Vec<Meld>,
    pub leftovers: Vec<Card>,
    /// At least six cards grouped
    pub can_close_six: bool,
    /// All seven cards grouped
    pub full_meld: bool,
    /// Six grouped and a single leftover of rank 3 or lower
    pub close_ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wildcard_used: Option<Card>,
}

impl Evaluation {
    pub fn is_grouped(&self, card: &Card) -> bool {
        !self.leftovers.contains(card)
    }
}

fn card_at(suit: Suit, ordinal: u8) -> Card {
    // Ordinals come from held cards or bounded arithmetic on them
    Card::new(suit, crate::RANKS[ordinal as usize])
}

/// Held rank ordinals per suit, sorted ascending
fn ordinals_by_suit(cards: &[Card]) -> [Vec<u8>; 4] {
    let mut by_suit: [Vec<u8>; 4] = Default::default();
    for card in cards {
        by_suit[card.suit() as usize].push(card.ordinal());
    }
    for ordinals in &mut by_suit {
        ordinals.sort_unstable();
        ordinals.dedup();
    }
    by_suit
}

/// Held cards per rank ordinal
fn cards_by_rank(cards: &[Card]) -> [Vec<Card>; ORDINALS as usize] {
    let mut by_rank: [Vec<Card>; ORDINALS as usize] = Default::default();
    for card in cards {
        by_rank[card.ordinal() as usize].push(*card);
    }
    by_rank
}

/// Maximal runs of consecutive ordinals, length three or more
fn plain_runs(ordinals: &[u8]) -> Vec<(u8, u8)> {
    let mut runs = Vec::new();
    let mut start = 0;
    for i in 1..=ordinals.len() {
        if i == ordinals.len() || ordinals[i] != ordinals[i - 1] + 1 {
            if i - start >= 3 {
                runs.push((ordinals[start], ordinals[i - 1]));
            }
            start = i;
        }
    }
    runs
}

/// Runs completed by exactly one substituted rank: a single internal gap, or a
/// contiguous window extended by one at either end.
fn wildcard_runs(ordinals: &[u8]) -> Vec<(u8, u8, u8)> {
    fn push(runs: &mut Vec<(u8, u8, u8)>, candidate: (u8, u8, u8)) {
        if !runs.contains(&candidate) {
            runs.push(candidate);
        }
    }

    let mut runs = Vec::new();
    for i in 0..ordinals.len() {
        for j in i..ordinals.len() {
            let window = &ordinals[i..=j];
            let (min, max) = (window[0], window[window.len() - 1]);
            let span = (max - min + 1) as usize;

            if span == window.len() + 1 && span >= 3 {
                if let Some(gap) = (min..=max).find(|o| !window.contains(o)) {
                    push(&mut runs, (min, max, gap));
                }
            }

            if window.len() >= 2 && span == window.len() {
                if min > 0 && !ordinals.contains(&(min - 1)) {
                    push(&mut runs, (min - 1, max, min - 1));
                }
                if max + 1 < ORDINALS && !ordinals.contains(&(max + 1)) {
                    push(&mut runs, (min, max + 1, max + 1));
                }
            }
        }
    }
    runs
}

/// Group `cards` (up to eight) into sets and runs and score the result.
///
/// `wildcard` is the wildcard card when the rule is on; it only counts if held.
/// Assignment is greedy: runs then sets, longest first, and the wildcard fills
/// the first wildcard run reached. Later wildcard runs are dropped.
pub fn evaluate(cards: &[Card], wildcard: Option<Card>, weights: &Weights) -> Evaluation {
    let wildcard = wildcard.filter(|w| cards.contains(w));
    let by_suit = ordinals_by_suit(cards);
    let by_rank = cards_by_rank(cards);

    let sets: Vec<Meld> = by_rank
        .iter()
        .filter(|held| held.len() >= 3)
        .map(|held| Meld::set(held.clone()))
        .collect();

    let mut runs = Vec::new();
    for suit in Suit::ALL {
        let ordinals = &by_suit[suit as usize];
        for (from, to) in plain_runs(ordinals) {
            runs.push(Meld::run(suit, from, to, None));
        }
        if wildcard.is_some() {
            for (from, to, gap) in wildcard_runs(ordinals) {
                runs.push(Meld::run(suit, from, to, Some(gap)));
            }
        }
    }

    let mut ordered_runs: Vec<&Meld> = runs.iter().collect();
    ordered_runs.sort_by_key(|m| std::cmp::Reverse(m.len()));
    let mut ordered_sets: Vec<&Meld> = sets.iter().collect();
    ordered_sets.sort_by_key(|m| std::cmp::Reverse(m.len()));

    let mut covered: BTreeSet<Card> = BTreeSet::new();
    let mut wildcard_used: Option<Card> = None;
    let mut melds = Vec::new();

    for meld in ordered_runs.into_iter().chain(ordered_sets) {
        if meld.wildcard_for.is_some() && wildcard_used.is_some() {
            continue;
        }
        let before = covered.len();
        covered.extend(meld.cards.iter().copied());
        if let (Some(slot), Some(wild)) = (meld.wildcard_for, wildcard) {
            covered.insert(wild);
            wildcard_used = Some(slot);
        }
        if covered.len() > before || meld.wildcard_for.is_some() {
            melds.push(meld.clone());
        }
    }

    // An idle wildcard can join any group, so it counts as grouped
    let idle_wildcard = wildcard.filter(|w| !covered.contains(w));
    let grouped_count = covered.len() + usize::from(idle_wildcard.is_some());
    let leftovers: Vec<Card> = cards
        .iter()
        .copied()
        .filter(|c| !covered.contains(c) && Some(*c) != idle_wildcard)
        .collect();

    let can_close_six = grouped_count >= SIX_CLOSURE;
    let full_meld = grouped_count >= FULL_MELD;
    let close_ready =
        can_close_six && leftovers.len() == 1 && leftovers[0].rank() <= MAX_LEFTOVER_RANK;

    let score = score_hand(cards, grouped_count, &by_suit, &by_rank, weights);

    Evaluation {
        score,
        grouped_count,
        sets,
        runs,
        melds,
        leftovers,
        can_close_six,
        full_meld,
        close_ready,
        wildcard_used,
    }
}

fn score_hand(
    cards: &[Card],
    grouped_count: usize,
    by_suit: &[Vec<u8>; 4],
    by_rank: &[Vec<Card>; ORDINALS as usize],
    weights: &Weights,
) -> i32 {
    let has = |suit: &[u8], o: i16| o >= 0 && suit.contains(&(o as u8));

    let mut adjacent = 0;
    let mut isolated = 0;
    for card in cards {
        let suit: &[u8] = &by_suit[card.suit() as usize];
        let o = card.ordinal() as i16;
        let neighbours = i32::from(has(suit, o - 1)) + i32::from(has(suit, o + 1));
        // each side of a pair counts its neighbour
        adjacent += neighbours;
        if neighbours == 0 && by_rank[card.ordinal() as usize].len() == 1 {
            isolated += 1;
        }
    }
    let pairs = by_rank.iter().filter(|held| held.len() == 2).count() as i32;
    let center = cards.iter().filter(|c| (4..=6).contains(&c.rank())).count() as i32;

    grouped_count as i32 * weights.grouped
        + adjacent * weights.adjacent
        + pairs * weights.pair
        + center * weights.center
        - isolated * weights.isolated
}

/// Hand in display order: runs by suit and lowest rank (wildcard in its gap),
/// then sets larger first, then leftovers.
pub fn display_order(cards: &[Card], evaluation: &Evaluation, wildcard: Option<Card>) -> Vec<Card> {
    let mut used: BTreeSet<Card> = BTreeSet::new();
    let mut ordered = Vec::with_capacity(cards.len());
    let mut place = |card: Card, ordered: &mut Vec<Card>| {
        if cards.contains(&card) && used.insert(card) {
            ordered.push(card);
        }
    };

    let mut runs: Vec<&Meld> = evaluation
        .melds
        .iter()
        .filter(|m| m.meld_type == MeldType::Run)
        .collect();
    runs.sort_by_key(|m| {
        let low = m
            .cards
            .iter()
            .chain(m.wildcard_for.iter())
            .map(|c| c.ordinal())
            .min();
        (m.cards.first().map(|c| c.suit()), low)
    });
    for run in runs {
        let mut slots: Vec<(u8, Card)> = run.cards.iter().map(|c| (c.ordinal(), *c)).collect();
        if let (Some(slot), Some(wild)) = (run.wildcard_for, wildcard) {
            slots.push((slot.ordinal(), wild));
        }
        slots.sort_by_key(|(o, _)| *o);
        for (_, card) in slots {
            place(card, &mut ordered);
        }
    }

    let mut sets: Vec<&Meld> = evaluation
        .melds
        .iter()
        .filter(|m| m.meld_type == MeldType::Set)
        .collect();
    sets.sort_by_key(|m| (std::cmp::Reverse(m.len()), m.cards.first().map(|c| c.ordinal())));
    for set in sets {
        for card in &set.cards {
            place(*card, &mut ordered);
        }
    }

    for card in cards {
        place(*card, &mut ordered);
    }
    ordered
}

/// Per-card grouped flag, in hand order
pub fn classify(cards: &[Card], evaluation: &Evaluation) -> Vec<(Card, bool)> {
    cards.iter().map(|c| (*c, evaluation.is_grouped(c))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(code: &str) -> Card {
        Card::from_code(code).unwrap()
    }

    fn hand(codes: &[&str]) -> Vec<Card> {
        codes.iter().map(|s| c(s)).collect()
    }

    fn eval(codes: &[&str], wildcard: bool) -> Evaluation {
        let wild = wildcard.then(|| c("O-1"));
        evaluate(&hand(codes), wild, &Weights::default())
    }

    #[test]
    fn test_set_of_sevens() {
        let ev = eval(&["O-7", "C-7", "E-7", "B-1", "C-3", "E-11", "O-5"], false);
        assert_eq!(ev.sets.len(), 1);
        assert_eq!(ev.sets[0].cards.len(), 3);
        assert!(ev.sets[0].cards.iter().all(|card| card.rank() == 7));
        assert!(ev.grouped_count >= 3);
        assert_eq!(ev.leftovers.len(), 4);
    }

    #[test]
    fn test_plain_runs_break_on_gaps() {
        assert_eq!(plain_runs(&[0, 1, 2, 4, 5]), vec![(0, 2)]);
        assert_eq!(plain_runs(&[0, 1, 3, 4, 5, 6]), vec![(3, 6)]);
        assert!(plain_runs(&[0, 2, 4]).is_empty());
        assert!(plain_runs(&[]).is_empty());
    }

    #[test]
    fn test_run_crosses_from_seven_to_sota() {
        let ev = eval(&["C-6", "C-7", "C-10", "O-2", "E-4", "B-11", "O-12"], false);
        assert_eq!(ev.runs.len(), 1);
        assert_eq!(ev.runs[0].cards, hand(&["C-6", "C-7", "C-10"]));
    }

    #[test]
    fn test_wildcard_fills_gap_in_run() {
        let codes = ["O-1", "O-2", "O-3", "O-5", "C-12", "E-7", "B-10"];
        let ev = eval(&codes, true);
        let wild_run = ev
            .melds
            .iter()
            .find(|m| m.wildcard_for.is_some())
            .expect("wildcard run assigned");
        assert_eq!(wild_run.meld_type, MeldType::Run);
        assert_eq!(wild_run.wildcard_for, Some(c("O-4")));
        assert_eq!(wild_run.len(), 5);
        assert_eq!(wild_run.cards.first(), Some(&c("O-1")));
        assert_eq!(wild_run.cards.last(), Some(&c("O-5")));
        assert_eq!(ev.wildcard_used, Some(c("O-4")));
        assert!(ev.is_grouped(&c("O-5")));
    }

    #[test]
    fn test_without_wildcard_no_gap_filling() {
        let codes = ["O-1", "O-2", "O-3", "O-5", "C-12", "E-7", "B-10"];
        let ev = eval(&codes, false);
        assert!(ev.runs.iter().all(|m| m.wildcard_for.is_none()));
        assert!(ev.runs.iter().all(|m| m.len() <= 3));
        assert_eq!(ev.runs.len(), 1);
        assert!(!ev.is_grouped(&c("O-5")));
        assert_eq!(ev.wildcard_used, None);
    }

    #[test]
    fn test_wildcard_candidates() {
        // single gap and both end extensions of contiguous windows
        let runs = wildcard_runs(&[2, 3]);
        assert!(runs.contains(&(1, 3, 1)));
        assert!(runs.contains(&(2, 4, 4)));
        let runs = wildcard_runs(&[0, 2]);
        assert_eq!(runs, vec![(0, 2, 1)]);
        // no extension below the ace or above the rey
        let runs = wildcard_runs(&[8, 9]);
        assert_eq!(runs, vec![(7, 9, 7)]);
        assert!(wildcard_runs(&[0, 3]).is_empty());
    }

    #[test]
    fn test_wildcard_fills_only_one_run() {
        // two runs each missing one rank; only one may take the wildcard
        let codes = ["O-1", "C-2", "C-4", "E-5", "E-7", "B-11", "O-12"];
        let ev = eval(&codes, true);
        let filled: Vec<_> = ev.melds.iter().filter(|m| m.wildcard_for.is_some()).collect();
        assert_eq!(filled.len(), 1);
        assert_eq!(ev.grouped_count, 3);
    }

    #[test]
    fn test_idle_wildcard_counts_as_grouped() {
        let codes = ["O-1", "C-2", "E-5", "B-7", "C-10", "E-12", "B-3"];
        let ev = eval(&codes, true);
        assert_eq!(ev.grouped_count, 1);
        assert!(!ev.leftovers.contains(&c("O-1")));
        assert_eq!(ev.leftovers.len(), 6);
    }

    #[test]
    fn test_close_ready_with_low_leftover() {
        let codes = ["C-4", "C-5", "C-6", "O-10", "E-10", "B-10", "E-2"];
        let ev = eval(&codes, false);
        assert_eq!(ev.grouped_count, 6);
        assert!(ev.can_close_six);
        assert!(!ev.full_meld);
        assert!(ev.close_ready);
        assert_eq!(ev.leftovers, vec![c("E-2")]);
    }

    #[test]
    fn test_not_close_ready_with_high_leftover() {
        let codes = ["C-4", "C-5", "C-6", "O-10", "E-10", "B-10", "E-7"];
        let ev = eval(&codes, false);
        assert!(ev.can_close_six);
        assert!(!ev.close_ready);
    }

    #[test]
    fn test_full_meld() {
        let codes = ["C-1", "C-2", "C-3", "C-4", "O-11", "E-11", "B-11"];
        let ev = eval(&codes, false);
        assert_eq!(ev.grouped_count, 7);
        assert!(ev.full_meld);
        assert!(ev.leftovers.is_empty());
        assert!(!ev.close_ready);
    }

    #[test]
    fn test_score_terms() {
        let w = Weights::default();
        // isolated only: three lone cards, none central
        let ev = eval(&["O-1", "C-3", "E-12"], false);
        assert_eq!(ev.score, -3 * w.isolated);
        // one adjacent pair, both central: each card sees its neighbour
        let ev = eval(&["O-4", "O-5"], false);
        assert_eq!(ev.score, 2 * w.adjacent + 2 * w.center);
        assert_eq!(ev.score, 80);
        // one same-rank pair: partners are not isolated
        let ev = eval(&["O-2", "C-2"], false);
        assert_eq!(ev.score, w.pair);
        // a run of three: the middle card has two neighbours
        let ev = eval(&["B-1", "B-2", "B-3"], false);
        assert_eq!(ev.score, 3 * w.grouped + 4 * w.adjacent);
    }

    #[test]
    fn test_weights_are_overridable() {
        let weights = Weights {
            grouped: 1,
            ..Weights::default()
        };
        let ev = evaluate(&hand(&["B-1", "B-2", "B-3"]), None, &weights);
        assert_eq!(ev.score, 3 + 4 * weights.adjacent);
    }

    #[test]
    fn test_display_order_runs_sets_leftovers() {
        let cards = hand(&["E-2", "O-10", "C-6", "E-10", "C-4", "B-10", "C-5"]);
        let ev = evaluate(&cards, None, &Weights::default());
        let ordered = display_order(&cards, &ev, None);
        assert_eq!(
            ordered,
            hand(&["C-4", "C-5", "C-6", "O-10", "E-10", "B-10", "E-2"])
        );
    }

    #[test]
    fn test_display_order_places_wildcard_in_gap() {
        let cards = hand(&["C-5", "O-1", "C-3", "C-2", "E-12", "B-7", "O-11"]);
        let wild = Some(c("O-1"));
        let ev = evaluate(&cards, wild, &Weights::default());
        let ordered = display_order(&cards, &ev, wild);
        assert_eq!(ordered.len(), cards.len());
        assert_eq!(&ordered[..4], &hand(&["C-2", "C-3", "O-1", "C-5"])[..]);
    }

    #[test]
    fn test_classify() {
        let cards = hand(&["C-4", "C-5", "C-6", "O-12"]);
        let ev = evaluate(&cards, None, &Weights::default());
        let flags = classify(&cards, &ev);
        assert_eq!(flags.iter().filter(|(_, grouped)| *grouped).count(), 3);
        assert_eq!(flags[3], (c("O-12"), false));
    }
}
