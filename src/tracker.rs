use crate::session::Seat;
use crate::{Card, DECK_SIZE, Denial, HAND_SIZE, Hand, deck};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Milliseconds since the epoch, from the host clock
fn now_ms() -> f64 {
    #[cfg(not(target_arch = "wasm32"))]
    {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs_f64() * 1000.0)
            .unwrap_or(0.0)
    }
    #[cfg(target_arch = "wasm32")]
    {
        js_sys::Date::now()
    }
}

/// Where a rival took a card from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PickSource {
    Table,
    Hidden,
}

/// One entry of a rival's pick log
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pick {
    pub source: PickSource,
    /// Known for table picks and for draws from a recycled deck
    pub card: Option<Card>,
    pub at_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RivalDiscard {
    pub card: Card,
    pub at_ms: f64,
}

/// What is known about one rival seat
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Rival {
    pub picks: Vec<Pick>,
    pub discards: Vec<RivalDiscard>,
    /// Cards the rival holds for certain
    pub known_hand: Vec<Card>,
}

impl Rival {
    /// The card of the last pick when it was a known hidden draw
    fn known_hidden_draw(&self) -> Option<Card> {
        self.picks
            .last()
            .filter(|p| p.source == PickSource::Hidden)
            .and_then(|p| p.card)
    }
}

/// A discard in the global sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DiscardRecord {
    pub card: Card,
    pub by: Seat,
}

/// Discards turned face down once the draw pile ran out, drawn in known order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecycledDeck {
    cards: Vec<Card>,
    cursor: usize,
}

impl RecycledDeck {
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn remaining(&self) -> usize {
        self.cards.len() - self.cursor
    }

    fn peek(&self) -> Option<Card> {
        self.cards.get(self.cursor).copied()
    }

    fn pop(&mut self) -> Option<Card> {
        let card = self.peek()?;
        self.cursor += 1;
        Some(card)
    }
}

/// Observable and inferable state of a round
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KnowledgeTracker {
    seen: BTreeSet<Card>,
    hand: Hand,
    table_card: Option<Card>,
    rivals: BTreeMap<Seat, Rival>,
    discard_sequence: Vec<DiscardRecord>,
    recycled: Option<RecycledDeck>,
    /// Undealt cards left; `None` outside a round
    draw_pile: Option<usize>,
}

fn fresh_rivals() -> BTreeMap<Seat, Rival> {
    Seat::RIVALS.iter().map(|&s| (s, Rival::default())).collect()
}

impl Default for KnowledgeTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl KnowledgeTracker {
    pub fn new() -> Self {
        KnowledgeTracker {
            seen: BTreeSet::new(),
            hand: Hand::new(),
            table_card: None,
            rivals: fresh_rivals(),
            discard_sequence: Vec::new(),
            recycled: None,
            draw_pile: None,
        }
    }

    pub fn hand(&self) -> &Hand {
        &self.hand
    }

    pub fn table_card(&self) -> Option<Card> {
        self.table_card
    }

    pub fn seen(&self) -> &BTreeSet<Card> {
        &self.seen
    }

    pub fn rival(&self, seat: Seat) -> Option<&Rival> {
        self.rivals.get(&seat)
    }

    pub fn discard_sequence(&self) -> &[DiscardRecord] {
        &self.discard_sequence
    }

    pub fn recycled(&self) -> Option<&RecycledDeck> {
        self.recycled.as_ref()
    }

    pub fn draw_pile(&self) -> Option<usize> {
        self.draw_pile
    }

    fn rival_mut(&mut self, seat: Seat) -> Result<&mut Rival, Denial> {
        self.rivals
            .get_mut(&seat)
            .ok_or(Denial::SeatNotActive(seat))
    }

    /// Whether `card` sits in the own hand (other than `skip_slot`), on the
    /// table, in a rival's known cards or in the discard history
    pub fn is_in_use(&self, card: Card, skip_slot: Option<usize>) -> bool {
        self.hand
            .iter()
            .enumerate()
            .any(|(i, c)| *c == card && Some(i) != skip_slot)
            || self.table_card == Some(card)
            || self.rivals.values().any(|r| r.known_hand.contains(&card))
            || self.discard_sequence.iter().any(|d| d.card == card)
    }

    /// Deck cards free to place in hand slot `skip_slot` (or anywhere)
    pub fn hand_choices(&self, skip_slot: Option<usize>) -> Vec<Card> {
        deck()
            .into_iter()
            .filter(|c| !self.is_in_use(*c, skip_slot))
            .collect()
    }

    pub fn set_hand_slot(&mut self, slot: usize, card: Card) -> Result<(), Denial> {
        if slot >= HAND_SIZE {
            return Err(Denial::InvalidSlot(slot));
        }
        if self.is_in_use(card, Some(slot)) {
            return Err(Denial::DuplicateCard(card));
        }
        self.hand.set_slot(slot, card);
        Ok(())
    }

    pub fn clear_hand_slot(&mut self, slot: usize) -> Result<Card, Denial> {
        self.hand.clear_slot(slot).ok_or(Denial::InvalidSlot(slot))
    }

    pub fn clear_hand(&mut self) {
        self.hand.clear();
    }

    pub(crate) fn reorder_hand(&mut self, ordered: Vec<Card>) {
        self.hand.reorder(ordered);
    }

    pub fn set_table_card(&mut self, card: Card) -> Result<(), Denial> {
        if self.table_card != Some(card) && self.is_in_use(card, None) {
            return Err(Denial::DuplicateCard(card));
        }
        self.table_card = Some(card);
        Ok(())
    }

    pub fn clear_table_card(&mut self) {
        self.table_card = None;
    }

    /// The deck minus everything seen, the own hand, the table card and every
    /// card a rival took from the table. Hidden rival draws stay unseen.
    pub fn unseen_cards(&self) -> Vec<Card> {
        let taken: BTreeSet<Card> = self.rival_table_picks().into_iter().collect();
        deck()
            .into_iter()
            .filter(|c| {
                !self.seen.contains(c)
                    && !self.hand.contains(c)
                    && self.table_card != Some(*c)
                    && !taken.contains(c)
            })
            .collect()
    }

    /// Every card a rival has taken from the table this round
    pub fn rival_table_picks(&self) -> Vec<Card> {
        self.rivals
            .values()
            .flat_map(|r| r.picks.iter())
            .filter(|p| p.source == PickSource::Table)
            .filter_map(|p| p.card)
            .collect()
    }

    /// Cards a rival may declare as discarded: a known recycled draw, the
    /// rival's known cards and every unseen card, never the table card
    pub fn rival_discard_candidates(&self, seat: Seat) -> Vec<Card> {
        let Some(rival) = self.rivals.get(&seat) else {
            return Vec::new();
        };
        let mut choices: Vec<Card> = Vec::new();
        let candidates = rival
            .known_hidden_draw()
            .into_iter()
            .chain(rival.known_hand.iter().copied())
            .chain(self.unseen_cards());
        for card in candidates {
            if !choices.contains(&card) && self.table_card != Some(card) {
                choices.push(card);
            }
        }
        choices
    }

    /// Begin tracking a round dealt to `players` seats
    pub fn start_round(&mut self, players: u8) {
        let dealt = HAND_SIZE * players as usize + 1;
        self.draw_pile = Some(DECK_SIZE.saturating_sub(dealt));
        if let Some(card) = self.table_card {
            self.seen.insert(card);
        }
    }

    /// Forget everything learned during the round, keeping the cards on hand
    /// and table
    pub fn end_round(&mut self) {
        self.seen.clear();
        self.rivals = fresh_rivals();
        self.draw_pile = None;
        self.discard_sequence.clear();
        self.recycled = None;
    }

    /// Whether a hidden draw is possible at all
    pub fn can_draw(&self) -> bool {
        self.draw_pile.is_some_and(|n| n > 0)
            || self.recycled.is_some()
            || !self.discard_sequence.is_empty()
    }

    /// Earlier discards that go back into the pile, oldest first. Cards taken
    /// back from the table and still held are left out.
    fn recyclable(&self) -> Vec<Card> {
        let Some((_, earlier)) = self.discard_sequence.split_last() else {
            return Vec::new();
        };
        earlier
            .iter()
            .map(|d| d.card)
            .filter(|c| {
                !self.hand.contains(c) && !self.rivals.values().any(|r| r.known_hand.contains(c))
            })
            .collect()
    }

    /// Turn the discard history into the draw pile: the latest discard stays
    /// face up, the rest are drawn oldest first. No-op without discards.
    pub fn recycle_deck(&mut self) {
        let Some(last) = self.discard_sequence.last().copied() else {
            return;
        };
        let cards = self.recyclable();
        log::debug!(
            "recycling {} discards, {} stays on the table",
            cards.len(),
            last.card
        );
        self.table_card = Some(last.card);
        self.draw_pile = Some(cards.len());
        self.recycled = Some(RecycledDeck { cards, cursor: 0 });
    }

    /// Next card of the recycled deck; `None` once it is exhausted (or never
    /// staged), leaving the caller to name the card
    pub fn next_recycled_card(&mut self) -> Option<Card> {
        self.recycled.as_mut().and_then(RecycledDeck::pop)
    }

    /// Recycle when the pile has run out and nothing is staged yet
    fn restock_if_exhausted(&mut self) {
        if self.draw_pile == Some(0) && self.recycled.is_none() {
            self.recycle_deck();
        }
    }

    /// The card the next hidden draw will produce, when it is certain
    pub fn peek_next_hidden(&self) -> Option<Card> {
        match &self.recycled {
            Some(deck) => deck.peek(),
            None if self.draw_pile == Some(0) => self.recyclable().first().copied(),
            None => None,
        }
    }

    /// Draw from the hidden pile on anyone's behalf
    fn draw_hidden(&mut self) -> Result<Option<Card>, Denial> {
        if !self.can_draw() {
            return Err(Denial::DrawPileEmpty);
        }
        self.restock_if_exhausted();
        let card = self.next_recycled_card();
        if let Some(n) = self.draw_pile.as_mut() {
            *n = n.saturating_sub(1);
        }
        Ok(card)
    }

    pub fn record_rival_take_from_table(&mut self, seat: Seat) -> Result<Card, Denial> {
        let card = self.table_card.ok_or(Denial::MissingTableCard)?;
        let rival = self.rival_mut(seat)?;
        rival.picks.push(Pick {
            source: PickSource::Table,
            card: Some(card),
            at_ms: now_ms(),
        });
        rival.known_hand.push(card);
        self.seen.insert(card);
        self.table_card = None;
        Ok(card)
    }

    /// Log a hidden draw; the card is known only when it came from a recycled deck
    pub fn record_rival_draw_hidden(&mut self, seat: Seat) -> Result<Option<Card>, Denial> {
        self.rival_mut(seat)?;
        let card = self.draw_hidden()?;
        self.rival_mut(seat)?.picks.push(Pick {
            source: PickSource::Hidden,
            card,
            at_ms: now_ms(),
        });
        Ok(card)
    }

    /// Apply a rival's discard. A rival who drew a known card and threw a
    /// different one still holds the drawn card.
    pub fn record_rival_discard(&mut self, seat: Seat, card: Card) -> Result<(), Denial> {
        if !self.rival_discard_candidates(seat).contains(&card) {
            return Err(Denial::UnexpectedCard(card));
        }
        let rival = self.rival_mut(seat)?;
        if let Some(drawn) = rival.known_hidden_draw() {
            if drawn != card && !rival.known_hand.contains(&drawn) {
                rival.known_hand.push(drawn);
            }
        }
        rival.known_hand.retain(|c| *c != card);
        rival.discards.push(RivalDiscard {
            card,
            at_ms: now_ms(),
        });
        self.push_discard(card, seat);
        Ok(())
    }

    fn push_discard(&mut self, card: Card, by: Seat) {
        self.table_card = Some(card);
        self.seen.insert(card);
        self.discard_sequence.push(DiscardRecord { card, by });
    }

    /// Move the table card into the own hand
    pub fn take_table_into_hand(&mut self) -> Result<Card, Denial> {
        let card = self.table_card.take().ok_or(Denial::MissingTableCard)?;
        self.hand.add(card);
        Ok(card)
    }

    /// Own hidden draw: returns the card when the recycled deck makes it
    /// certain (already in hand), `None` when the caller must name it
    pub fn draw_hidden_for_self(&mut self) -> Result<Option<Card>, Denial> {
        let card = self.draw_hidden()?;
        if let Some(card) = card {
            self.hand.add(card);
        }
        Ok(card)
    }

    /// Put a named hidden draw into the own hand; it must be an unseen card
    pub fn add_drawn_card(&mut self, card: Card) -> Result<(), Denial> {
        if !self.unseen_cards().contains(&card) {
            return Err(Denial::UnexpectedCard(card));
        }
        self.hand.add(card);
        Ok(())
    }

    pub fn record_own_discard(&mut self, card: Card) -> Result<(), Denial> {
        if !self.hand.remove(&card) {
            return Err(Denial::CardNotInHand(card));
        }
        self.push_discard(card, Seat::South);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(code: &str) -> Card {
        Card::from_code(code).unwrap()
    }

    fn dealt_tracker() -> KnowledgeTracker {
        let mut tracker = KnowledgeTracker::new();
        for (slot, code) in ["O-1", "O-2", "O-3", "C-4", "C-5", "E-6", "B-7"].iter().enumerate() {
            tracker.set_hand_slot(slot, c(code)).unwrap();
        }
        tracker.set_table_card(c("B-12")).unwrap();
        tracker.start_round(4);
        tracker
    }

    fn assert_partition(tracker: &KnowledgeTracker) {
        let unseen = tracker.unseen_cards();
        let mut accounted: BTreeSet<Card> = tracker.seen().clone();
        accounted.extend(tracker.hand().iter().copied());
        accounted.extend(tracker.table_card());
        accounted.extend(tracker.rival_table_picks());
        for card in &unseen {
            assert!(!accounted.contains(card), "{card} both unseen and accounted");
        }
        assert_eq!(unseen.len() + accounted.len(), DECK_SIZE);
    }

    #[test]
    fn test_duplicate_cards_rejected() {
        let mut tracker = KnowledgeTracker::new();
        tracker.set_hand_slot(0, c("O-5")).unwrap();
        assert_eq!(tracker.set_hand_slot(1, c("O-5")), Err(Denial::DuplicateCard(c("O-5"))));
        // re-setting the same slot is fine
        tracker.set_hand_slot(0, c("O-5")).unwrap();
        assert_eq!(tracker.set_table_card(c("O-5")), Err(Denial::DuplicateCard(c("O-5"))));
        assert_eq!(tracker.set_hand_slot(7, c("O-6")), Err(Denial::InvalidSlot(7)));
        assert!(!tracker.hand_choices(None).contains(&c("O-5")));
        assert!(tracker.hand_choices(Some(0)).contains(&c("O-5")));
    }

    #[test]
    fn test_start_round_counts_draw_pile() {
        let tracker = dealt_tracker();
        assert_eq!(tracker.draw_pile(), Some(40 - 28 - 1));
        assert!(tracker.seen().contains(&c("B-12")));
        assert_eq!(tracker.unseen_cards().len(), 40 - 8);
        assert_partition(&tracker);
    }

    #[test]
    fn test_rival_take_from_table() {
        let mut tracker = dealt_tracker();
        let card = tracker.record_rival_take_from_table(Seat::East).unwrap();
        assert_eq!(card, c("B-12"));
        assert_eq!(tracker.table_card(), None);
        let east = tracker.rival(Seat::East).unwrap();
        assert_eq!(east.known_hand, vec![c("B-12")]);
        assert_eq!(east.picks[0].source, PickSource::Table);
        assert!(!tracker.unseen_cards().contains(&c("B-12")));
        assert_eq!(tracker.rival_table_picks(), vec![c("B-12")]);
        assert_eq!(
            tracker.record_rival_take_from_table(Seat::North),
            Err(Denial::MissingTableCard)
        );
        assert_partition(&tracker);
    }

    #[test]
    fn test_rival_hidden_draw_then_discard() {
        let mut tracker = dealt_tracker();
        assert_eq!(tracker.record_rival_draw_hidden(Seat::North).unwrap(), None);
        assert_eq!(tracker.draw_pile(), Some(10));
        let north = tracker.rival(Seat::North).unwrap();
        assert_eq!(north.picks[0].source, PickSource::Hidden);
        assert_eq!(north.picks[0].card, None);

        tracker.record_rival_discard(Seat::North, c("E-11")).unwrap();
        assert_eq!(tracker.table_card(), Some(c("E-11")));
        assert!(tracker.seen().contains(&c("E-11")));
        assert!(tracker.rival(Seat::North).unwrap().known_hand.is_empty());
        assert_eq!(
            tracker.discard_sequence(),
            &[DiscardRecord { card: c("E-11"), by: Seat::North }]
        );
        assert_partition(&tracker);
    }

    #[test]
    fn test_rival_discard_must_be_candidate() {
        let mut tracker = dealt_tracker();
        tracker.record_rival_draw_hidden(Seat::East).unwrap();
        // own card and table card are impossible
        assert_eq!(
            tracker.record_rival_discard(Seat::East, c("O-1")),
            Err(Denial::UnexpectedCard(c("O-1")))
        );
        assert!(tracker.record_rival_discard(Seat::East, c("B-12")).is_err());
        assert!(!tracker.rival_discard_candidates(Seat::East).contains(&c("B-12")));
    }

    #[test]
    fn test_rival_discarding_known_card_removes_it() {
        let mut tracker = dealt_tracker();
        tracker.record_rival_take_from_table(Seat::East).unwrap();
        assert!(tracker.rival_discard_candidates(Seat::East).contains(&c("B-12")));
        tracker.record_rival_discard(Seat::East, c("B-12")).unwrap();
        assert!(tracker.rival(Seat::East).unwrap().known_hand.is_empty());
        assert_eq!(tracker.table_card(), Some(c("B-12")));
    }

    fn exhaust_pile(tracker: &mut KnowledgeTracker) -> Vec<Card> {
        // rivals draw unknown cards and throw known ones until the pile is empty
        let throws = ["E-1", "E-2", "E-3", "E-4", "E-5", "E-7", "E-10", "E-11", "E-12", "C-1", "C-2"];
        let seats = [Seat::East, Seat::North, Seat::West];
        let mut thrown = Vec::new();
        for (i, code) in throws.iter().enumerate() {
            let seat = seats[i % seats.len()];
            assert_eq!(tracker.record_rival_draw_hidden(seat).unwrap(), None);
            tracker.record_rival_discard(seat, c(code)).unwrap();
            thrown.push(c(code));
        }
        assert_eq!(tracker.draw_pile(), Some(0));
        thrown
    }

    #[test]
    fn test_recycle_deck_replays_discards_in_order() {
        let mut tracker = dealt_tracker();
        let thrown = exhaust_pile(&mut tracker);

        tracker.recycle_deck();
        let (last, earlier) = thrown.split_last().unwrap();
        assert_eq!(tracker.table_card(), Some(*last));
        assert_eq!(tracker.recycled().unwrap().cards(), earlier);
        assert_eq!(tracker.draw_pile(), Some(earlier.len()));

        for expected in earlier {
            assert_eq!(tracker.next_recycled_card(), Some(*expected));
        }
        assert_eq!(tracker.next_recycled_card(), None);
    }

    #[test]
    fn test_recycle_without_discards_is_noop() {
        let mut tracker = dealt_tracker();
        let before = tracker.clone();
        tracker.recycle_deck();
        assert_eq!(tracker, before);
        assert_eq!(tracker.next_recycled_card(), None);
    }

    #[test]
    fn test_hidden_draw_recycles_and_infers_kept_card() {
        let mut tracker = dealt_tracker();
        let thrown = exhaust_pile(&mut tracker);
        assert_eq!(tracker.peek_next_hidden(), Some(thrown[0]));

        // the next hidden draw triggers recycling and is fully known
        let drawn = tracker.record_rival_draw_hidden(Seat::West).unwrap();
        assert_eq!(drawn, Some(thrown[0]));
        assert_eq!(tracker.table_card(), thrown.last().copied());
        assert_eq!(tracker.draw_pile(), Some(thrown.len() - 2));
        let candidates = tracker.rival_discard_candidates(Seat::West);
        assert_eq!(candidates.first(), Some(&thrown[0]));

        // keeps the drawn card, throws an unseen one
        tracker.record_rival_discard(Seat::West, c("B-5")).unwrap();
        assert!(tracker.rival(Seat::West).unwrap().known_hand.contains(&thrown[0]));
    }

    #[test]
    fn test_known_draw_discarded_straight_back() {
        let mut tracker = dealt_tracker();
        let thrown = exhaust_pile(&mut tracker);
        let drawn = tracker.record_rival_draw_hidden(Seat::East).unwrap().unwrap();
        assert_eq!(drawn, thrown[0]);
        tracker.record_rival_discard(Seat::East, drawn).unwrap();
        assert!(tracker.rival(Seat::East).unwrap().known_hand.is_empty());
        assert_eq!(tracker.table_card(), Some(drawn));
    }

    #[test]
    fn test_exhausted_recycled_deck_falls_back_to_manual() {
        let mut tracker = dealt_tracker();
        let thrown = exhaust_pile(&mut tracker);
        for _ in 0..thrown.len() - 1 {
            assert!(tracker.draw_hidden_for_self().unwrap().is_some());
        }
        assert_eq!(tracker.draw_pile(), Some(0));
        assert!(tracker.can_draw());
        assert_eq!(tracker.draw_hidden_for_self().unwrap(), None);
        assert_eq!(tracker.peek_next_hidden(), None);
    }

    #[test]
    fn test_own_draw_and_discard() {
        let mut tracker = dealt_tracker();
        assert_eq!(tracker.draw_hidden_for_self().unwrap(), None);
        assert_eq!(tracker.add_drawn_card(c("O-2")), Err(Denial::UnexpectedCard(c("O-2"))));
        tracker.add_drawn_card(c("O-4")).unwrap();
        assert_eq!(tracker.hand().len(), 8);
        assert_eq!(tracker.record_own_discard(c("C-1")), Err(Denial::CardNotInHand(c("C-1"))));
        tracker.record_own_discard(c("B-7")).unwrap();
        assert_eq!(tracker.table_card(), Some(c("B-7")));
        assert_eq!(tracker.discard_sequence().last().unwrap().by, Seat::South);
        assert_partition(&tracker);
    }

    #[test]
    fn test_recycling_skips_cards_still_held() {
        let mut tracker = dealt_tracker();
        // South takes back the E-1, North takes back the B-7
        tracker.record_rival_draw_hidden(Seat::East).unwrap();
        tracker.record_rival_discard(Seat::East, c("E-1")).unwrap();
        tracker.take_table_into_hand().unwrap();
        tracker.record_own_discard(c("B-7")).unwrap();
        tracker.record_rival_take_from_table(Seat::North).unwrap();
        tracker.record_rival_discard(Seat::North, c("E-2")).unwrap();

        let throws = ["E-3", "E-4", "E-5", "E-7", "E-10", "E-11", "E-12", "C-1", "C-2", "C-3"];
        let seats = [Seat::West, Seat::East, Seat::North];
        for (i, code) in throws.iter().enumerate() {
            let seat = seats[i % seats.len()];
            tracker.record_rival_draw_hidden(seat).unwrap();
            tracker.record_rival_discard(seat, c(code)).unwrap();
        }
        assert_eq!(tracker.draw_pile(), Some(0));
        assert_eq!(tracker.peek_next_hidden(), Some(c("E-2")));

        tracker.recycle_deck();
        let expected: Vec<Card> = ["E-2", "E-3", "E-4", "E-5", "E-7", "E-10", "E-11", "E-12", "C-1", "C-2"]
            .iter()
            .map(|s| c(s))
            .collect();
        assert_eq!(tracker.recycled().unwrap().cards(), expected.as_slice());
        assert_eq!(tracker.table_card(), Some(c("C-3")));
        assert_eq!(tracker.draw_pile(), Some(expected.len()));

        assert_eq!(tracker.draw_hidden_for_self().unwrap(), Some(c("E-2")));
        let held: BTreeSet<Card> = tracker.hand().iter().copied().collect();
        assert_eq!(held.len(), tracker.hand().len());
    }

    #[test]
    fn test_end_round_forgets_round_knowledge() {
        let mut tracker = dealt_tracker();
        tracker.record_rival_take_from_table(Seat::East).unwrap();
        tracker.record_rival_discard(Seat::East, c("E-1")).unwrap();
        assert!(!tracker.unseen_cards().contains(&c("E-1")));

        tracker.end_round();
        assert!(tracker.seen().is_empty());
        assert!(tracker.rival_table_picks().is_empty());
        let east = tracker.rival(Seat::East).unwrap();
        assert!(east.known_hand.is_empty() && east.picks.is_empty() && east.discards.is_empty());
        // hand and table stay for the next deal
        assert_eq!(tracker.hand().len(), 7);
        assert_eq!(tracker.table_card(), Some(c("E-1")));
        assert!(tracker.unseen_cards().contains(&c("B-12")));
        assert_partition(&tracker);
    }

    #[test]
    fn test_take_table_into_hand() {
        let mut tracker = dealt_tracker();
        assert_eq!(tracker.take_table_into_hand().unwrap(), c("B-12"));
        assert!(tracker.hand().contains(&c("B-12")));
        assert_eq!(tracker.take_table_into_hand(), Err(Denial::MissingTableCard));
    }

    #[test]
    fn test_cannot_draw_from_nothing() {
        let mut tracker = KnowledgeTracker::new();
        tracker.start_round(4);
        tracker.draw_pile = Some(0);
        assert!(!tracker.can_draw());
        assert_eq!(tracker.draw_hidden_for_self(), Err(Denial::DrawPileEmpty));
    }
}
