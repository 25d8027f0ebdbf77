use crate::engine::{self, Recommendation, Situation};
use crate::evaluator::{Evaluation, classify, display_order, evaluate};
use crate::optimizer::best_discard;
use crate::tracker::KnowledgeTracker;
use crate::{Card, Denial, HAND_SIZE, Rules};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed table positions; the tracked player sits South
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Seat {
    South,
    East,
    North,
    West,
}

impl Seat {
    pub const ALL: [Seat; 4] = [Seat::South, Seat::East, Seat::North, Seat::West];
    pub const RIVALS: [Seat; 3] = [Seat::East, Seat::North, Seat::West];

    /// Seats in play for a player count, in turn order
    pub fn active(players: u8) -> &'static [Seat] {
        match players {
            2 => &[Seat::South, Seat::North],
            3 => &[Seat::South, Seat::East, Seat::West],
            _ => &Self::ALL,
        }
    }

    pub fn is_active(self, players: u8) -> bool {
        Self::active(players).contains(&self)
    }

    /// The seat that plays after this one
    pub fn next(self, players: u8) -> Seat {
        let seats = Self::active(players);
        match seats.iter().position(|&s| s == self) {
            Some(i) => seats[(i + 1) % seats.len()],
            None => seats[0],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    NotStarted,
    Running,
    Finished,
}

/// How the own discard is chosen after taking or drawing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscardMode {
    /// The optimizer picks the discard
    #[default]
    Auto,
    /// Wait for a `Discard` or `Close` command
    Manual,
}

/// A fact the engine is waiting for before the turn can move on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PendingRequest {
    /// Which card the rival on turn discarded
    RivalDiscard { seat: Seat },
    /// Which card the own hidden draw produced
    DrawnCard { discard: DiscardMode },
    /// Which card to discard from the own eight
    OwnDiscard,
}

impl fmt::Display for PendingRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PendingRequest::RivalDiscard { seat } => write!(f, "discard declaration for {:?}", seat),
            PendingRequest::DrawnCard { .. } => write!(f, "the card you drew"),
            PendingRequest::OwnDiscard => write!(f, "your discard"),
        }
    }
}

/// Commands accepted from the input layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    Configure { rules: Rules },
    SetPlayers { players: u8 },
    SetWildcard { enabled: bool },
    SetHandSlot { slot: usize, card: Card },
    ClearHandSlot { slot: usize },
    ClearHand,
    SetTableCard { card: Card },
    ClearTableCard,
    SetStartSeat { seat: Seat },
    StartRound,
    EndRound,
    Reset,
    RivalTakeFromTable { seat: Seat },
    RivalDrawHidden { seat: Seat },
    RivalDiscard { seat: Seat, card: Card },
    TakeFromTable {
        #[serde(default)]
        discard: DiscardMode,
    },
    DrawHidden {
        #[serde(default)]
        discard: DiscardMode,
    },
    ProvideDrawnCard { card: Card },
    Discard { card: Card },
    Close {
        #[serde(default)]
        discard: Option<Card>,
    },
    Recommend,
}

/// How the round was closed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Closure {
    pub seat: Seat,
    pub grouped: usize,
    pub leftovers: Vec<Card>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discard: Option<Card>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandCard {
    pub card: Card,
    pub grouped: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeatView {
    pub seat: Seat,
    pub active: bool,
    pub on_turn: bool,
    pub known_hand: Vec<Card>,
    /// Rival cards not known, out of seven
    pub hidden_cards: usize,
    pub picks: usize,
    pub discards: usize,
}

/// Immutable view of the session for rendering
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub phase: Phase,
    pub players: u8,
    pub wildcard: bool,
    pub start_seat: Seat,
    pub turn: Option<Seat>,
    pub hand: Vec<HandCard>,
    pub table_card: Option<Card>,
    pub draw_pile: Option<usize>,
    pub recycled_remaining: Option<usize>,
    pub can_draw: bool,
    pub seats: Vec<SeatView>,
    pub pending: Option<PendingRequest>,
    pub recommendation: Option<Recommendation>,
    pub closure: Option<Closure>,
}

/// Result of an accepted command
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome {
    pub snapshot: Snapshot,
    pub pending: Option<PendingRequest>,
}

/// One advisor session: configuration, tracked knowledge and turn state
#[derive(Debug, Clone)]
pub struct Session {
    rules: Rules,
    tracker: KnowledgeTracker,
    phase: Phase,
    start_seat: Seat,
    turn: Option<Seat>,
    pending: Option<PendingRequest>,
    recommendation: Option<Recommendation>,
    closure: Option<Closure>,
}

impl Default for Session {
    fn default() -> Self {
        Self::fresh(Rules::default(), Seat::South)
    }
}

impl Session {
    pub fn new(rules: Rules) -> Result<Self, Denial> {
        rules.validate()?;
        Ok(Self::fresh(rules, Seat::South))
    }

    fn fresh(rules: Rules, start_seat: Seat) -> Self {
        Session {
            rules,
            tracker: KnowledgeTracker::new(),
            phase: Phase::NotStarted,
            start_seat,
            turn: None,
            pending: None,
            recommendation: None,
            closure: None,
        }
    }

    /// Apply one command. A denied command leaves the session unchanged.
    pub fn apply(&mut self, command: Command) -> Result<Outcome, Denial> {
        log::debug!("command {:?}", command);
        let mut next = self.clone();
        match next.dispatch(command) {
            Ok(()) => {
                *self = next;
                Ok(Outcome {
                    snapshot: self.snapshot(),
                    pending: self.pending,
                })
            }
            Err(denial) => {
                log::debug!("denied: {}", denial);
                Err(denial)
            }
        }
    }

    fn dispatch(&mut self, command: Command) -> Result<(), Denial> {
        match command {
            Command::Configure { rules } => {
                self.ensure_not_running()?;
                rules.validate()?;
                self.rules = rules;
                self.fit_start_seat();
            }
            Command::SetPlayers { players } => {
                self.ensure_not_running()?;
                let rules = Rules {
                    players,
                    ..self.rules.clone()
                };
                rules.validate()?;
                self.rules = rules;
                self.fit_start_seat();
            }
            Command::SetWildcard { enabled } => {
                self.rules.wildcard = enabled;
                self.refresh_own_turn();
            }
            Command::SetHandSlot { slot, card } => {
                self.ensure_idle()?;
                self.tracker.set_hand_slot(slot, card)?;
                self.refresh_own_turn();
            }
            Command::ClearHandSlot { slot } => {
                self.ensure_idle()?;
                self.tracker.clear_hand_slot(slot)?;
                self.refresh_own_turn();
            }
            Command::ClearHand => {
                self.ensure_idle()?;
                self.tracker.clear_hand();
                self.refresh_own_turn();
            }
            Command::SetTableCard { card } => {
                self.ensure_not_running()?;
                self.tracker.set_table_card(card)?;
            }
            Command::ClearTableCard => {
                self.ensure_not_running()?;
                self.tracker.clear_table_card();
            }
            Command::SetStartSeat { seat } => {
                self.ensure_not_running()?;
                if !seat.is_active(self.rules.players) {
                    return Err(Denial::SeatNotActive(seat));
                }
                self.start_seat = seat;
            }
            Command::StartRound => self.start_round()?,
            Command::EndRound => {
                if self.phase != Phase::Running {
                    return Err(Denial::RoundNotRunning);
                }
                log::info!("round ended");
                self.tracker.end_round();
                self.leave_round();
            }
            Command::Reset => {
                log::info!("session reset");
                *self = Self::fresh(self.rules.clone(), self.start_seat);
            }
            Command::RivalTakeFromTable { seat } => {
                self.ensure_rival_turn(seat)?;
                let card = self.tracker.record_rival_take_from_table(seat)?;
                log::debug!("{:?} takes {} from the table", seat, card);
                self.pending = Some(PendingRequest::RivalDiscard { seat });
            }
            Command::RivalDrawHidden { seat } => {
                self.ensure_rival_turn(seat)?;
                let card = self.tracker.record_rival_draw_hidden(seat)?;
                log::debug!("{:?} draws hidden (known: {:?})", seat, card);
                self.pending = Some(PendingRequest::RivalDiscard { seat });
            }
            Command::RivalDiscard { seat, card } => {
                if self.pending != Some(PendingRequest::RivalDiscard { seat }) {
                    return Err(Denial::NoPendingRequest);
                }
                self.tracker.record_rival_discard(seat, card)?;
                self.pending = None;
                self.advance();
            }
            Command::TakeFromTable { discard } => {
                self.ensure_turn(Seat::South)?;
                self.tracker.take_table_into_hand()?;
                self.finish_own_move(discard)?;
            }
            Command::DrawHidden { discard } => {
                self.ensure_turn(Seat::South)?;
                match self.tracker.draw_hidden_for_self()? {
                    Some(card) => {
                        log::debug!("drew {} from the recycled deck", card);
                        self.finish_own_move(discard)?;
                    }
                    None => self.pending = Some(PendingRequest::DrawnCard { discard }),
                }
            }
            Command::ProvideDrawnCard { card } => {
                let Some(PendingRequest::DrawnCard { discard }) = self.pending else {
                    return Err(Denial::NoPendingRequest);
                };
                self.tracker.add_drawn_card(card)?;
                self.pending = None;
                self.finish_own_move(discard)?;
            }
            Command::Discard { card } => {
                if self.pending != Some(PendingRequest::OwnDiscard) {
                    return Err(Denial::NoPendingRequest);
                }
                self.tracker.record_own_discard(card)?;
                self.pending = None;
                self.advance();
            }
            Command::Close { discard } => self.close(discard)?,
            Command::Recommend => {
                self.recommendation = Some(self.recommend()?);
            }
        }
        Ok(())
    }

    fn ensure_not_running(&self) -> Result<(), Denial> {
        match self.phase {
            Phase::Running => Err(Denial::RoundAlreadyRunning),
            _ => Ok(()),
        }
    }

    fn ensure_idle(&self) -> Result<(), Denial> {
        match &self.pending {
            Some(pending) => Err(Denial::PendingRequest(pending.to_string())),
            None => Ok(()),
        }
    }

    fn ensure_turn(&self, seat: Seat) -> Result<(), Denial> {
        if self.phase != Phase::Running {
            return Err(Denial::RoundNotRunning);
        }
        self.ensure_idle()?;
        if self.turn != Some(seat) {
            return Err(Denial::NotYourTurn(seat));
        }
        Ok(())
    }

    fn ensure_rival_turn(&self, seat: Seat) -> Result<(), Denial> {
        if seat == Seat::South {
            return Err(Denial::NotYourTurn(seat));
        }
        self.ensure_turn(seat)
    }

    fn fit_start_seat(&mut self) {
        if !self.start_seat.is_active(self.rules.players) {
            self.start_seat = Seat::active(self.rules.players)[0];
        }
    }

    fn start_round(&mut self) -> Result<(), Denial> {
        self.ensure_not_running()?;
        let held = self.tracker.hand().len();
        if held != HAND_SIZE {
            return Err(Denial::IncompleteHand(held));
        }
        if self.tracker.table_card().is_none() {
            return Err(Denial::MissingTableCard);
        }
        if !self.start_seat.is_active(self.rules.players) {
            return Err(Denial::SeatNotActive(self.start_seat));
        }
        self.tracker.start_round(self.rules.players);
        self.phase = Phase::Running;
        self.turn = Some(self.start_seat);
        self.pending = None;
        self.recommendation = None;
        self.closure = None;
        log::info!(
            "round started: {} players, {:?} opens, {:?} cards to draw",
            self.rules.players,
            self.start_seat,
            self.tracker.draw_pile()
        );
        self.refresh_own_turn();
        Ok(())
    }

    fn leave_round(&mut self) {
        self.phase = Phase::Finished;
        self.turn = None;
        self.pending = None;
        self.recommendation = None;
    }

    /// Pass the turn on; arriving at South with a full hand triggers advice
    fn advance(&mut self) {
        let Some(turn) = self.turn else {
            return;
        };
        let next = turn.next(self.rules.players);
        log::debug!("turn passes from {:?} to {:?}", turn, next);
        self.turn = Some(next);
        self.recommendation = None;
        self.refresh_own_turn();
    }

    fn refresh_own_turn(&mut self) {
        if !self.is_on_turn(Seat::South)
            || self.pending.is_some()
            || self.tracker.hand().len() != HAND_SIZE
        {
            return;
        }
        let wildcard = self.rules.active_wildcard();
        let cards = self.tracker.hand().cards().to_vec();
        let evaluation = evaluate(&cards, wildcard, &self.rules.weights);
        self.tracker
            .reorder_hand(display_order(&cards, &evaluation, wildcard));
        self.recommendation = self.recommend().ok();
    }

    /// After the own take or draw: discard now or wait for the player's pick
    fn finish_own_move(&mut self, mode: DiscardMode) -> Result<(), Denial> {
        match mode {
            DiscardMode::Auto => {
                let picks = self.tracker.rival_table_picks();
                let choice = best_discard(
                    self.tracker.hand().cards(),
                    self.rules.active_wildcard(),
                    &self.rules.weights,
                    &picks,
                )
                .ok_or(Denial::IncompleteHand(0))?;
                log::info!("discarding {} (score {})", choice.discard, choice.net_score);
                self.tracker.record_own_discard(choice.discard)?;
                self.advance();
            }
            DiscardMode::Manual => self.pending = Some(PendingRequest::OwnDiscard),
        }
        Ok(())
    }

    fn closes(evaluation: &Evaluation) -> bool {
        evaluation.close_ready || evaluation.full_meld
    }

    /// Close the round from the own turn, either with the current seven cards
    /// or by discarding `discard` from the eight held after a take or draw
    fn close(&mut self, discard: Option<Card>) -> Result<(), Denial> {
        if self.phase != Phase::Running {
            return Err(Denial::RoundNotRunning);
        }
        if self.turn != Some(Seat::South) {
            return Err(Denial::NotYourTurn(Seat::South));
        }
        let wildcard = self.rules.active_wildcard();
        let evaluation = match discard {
            None => {
                self.ensure_idle()?;
                let held = self.tracker.hand().len();
                if held != HAND_SIZE {
                    return Err(Denial::IncompleteHand(held));
                }
                evaluate(self.tracker.hand().cards(), wildcard, &self.rules.weights)
            }
            Some(card) => {
                if self.pending != Some(PendingRequest::OwnDiscard) {
                    return Err(Denial::NoPendingRequest);
                }
                let mut remaining = self.tracker.hand().clone();
                if !remaining.remove(&card) {
                    return Err(Denial::CardNotInHand(card));
                }
                evaluate(remaining.cards(), wildcard, &self.rules.weights)
            }
        };
        if !Self::closes(&evaluation) {
            return Err(Denial::NotClosureReady);
        }
        if let Some(card) = discard {
            self.tracker.record_own_discard(card)?;
        }
        log::info!(
            "round closed with {} grouped, leftovers {:?}",
            evaluation.grouped_count,
            evaluation.leftovers
        );
        self.closure = Some(Closure {
            seat: Seat::South,
            grouped: evaluation.grouped_count,
            leftovers: evaluation.leftovers,
            discard,
        });
        self.tracker.end_round();
        self.leave_round();
        Ok(())
    }

    /// Advice for the current hand and table, computed fresh
    pub fn recommend(&self) -> Result<Recommendation, Denial> {
        let unseen = self.tracker.unseen_cards();
        let picks = self.tracker.rival_table_picks();
        let situation = Situation {
            hand: self.tracker.hand().cards(),
            table_card: self.tracker.table_card(),
            unseen: &unseen,
            known_next_draw: self.tracker.peek_next_hidden(),
            rival_picks: &picks,
        };
        engine::recommend(&situation, &self.rules)
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn tracker(&self) -> &KnowledgeTracker {
        &self.tracker
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn turn(&self) -> Option<Seat> {
        self.turn
    }

    pub fn start_seat(&self) -> Seat {
        self.start_seat
    }

    pub fn pending(&self) -> Option<PendingRequest> {
        self.pending
    }

    /// Advice computed at the start of the own turn or on request
    pub fn recommendation(&self) -> Option<&Recommendation> {
        self.recommendation.as_ref()
    }

    pub fn closure(&self) -> Option<&Closure> {
        self.closure.as_ref()
    }

    pub fn is_on_turn(&self, seat: Seat) -> bool {
        self.phase == Phase::Running && self.turn == Some(seat)
    }

    pub fn draw_pile_count(&self) -> Option<usize> {
        self.tracker.draw_pile()
    }

    /// Choices for "which card did I draw"
    pub fn unseen_candidates(&self) -> Vec<Card> {
        self.tracker.unseen_cards()
    }

    /// Choices for "which card did this rival discard"
    pub fn rival_discard_candidates(&self, seat: Seat) -> Vec<Card> {
        self.tracker.rival_discard_candidates(seat)
    }

    /// Cards that may go into hand slot `slot` (or any free slot)
    pub fn hand_choices(&self, slot: Option<usize>) -> Vec<Card> {
        self.tracker.hand_choices(slot)
    }

    /// Own hand with grouped/ungrouped flags
    pub fn classify_hand(&self) -> Vec<HandCard> {
        let cards = self.tracker.hand().cards();
        let evaluation = evaluate(cards, self.rules.active_wildcard(), &self.rules.weights);
        classify(cards, &evaluation)
            .into_iter()
            .map(|(card, grouped)| HandCard { card, grouped })
            .collect()
    }

    pub fn snapshot(&self) -> Snapshot {
        let seats = Seat::ALL
            .iter()
            .map(|&seat| {
                let active = seat.is_active(self.rules.players);
                let rival = self.tracker.rival(seat);
                let known_hand = rival.map(|r| r.known_hand.clone()).unwrap_or_default();
                let hidden_cards = match rival {
                    Some(_) if active => HAND_SIZE.saturating_sub(known_hand.len()),
                    _ => 0,
                };
                SeatView {
                    seat,
                    active,
                    on_turn: self.is_on_turn(seat),
                    known_hand,
                    hidden_cards,
                    picks: rival.map_or(0, |r| r.picks.len()),
                    discards: rival.map_or(0, |r| r.discards.len()),
                }
            })
            .collect();

        Snapshot {
            phase: self.phase,
            players: self.rules.players,
            wildcard: self.rules.wildcard,
            start_seat: self.start_seat,
            turn: self.turn,
            hand: self.classify_hand(),
            table_card: self.tracker.table_card(),
            draw_pile: self.tracker.draw_pile(),
            recycled_remaining: self.tracker.recycled().map(|r| r.remaining()),
            can_draw: self.phase == Phase::Running && self.tracker.can_draw(),
            seats,
            pending: self.pending,
            recommendation: self.recommendation.clone(),
            closure: self.closure.clone(),
        }
    }
}
