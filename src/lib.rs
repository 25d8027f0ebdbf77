use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod config;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod optimizer;
pub mod session;
pub mod tracker;
#[cfg(target_arch = "wasm32")]
pub mod wasm_api;

pub use config::{Rules, Weights};
pub use error::Denial;

/// Ranks of the 40-card Spanish deck, in play order (8 and 9 are absent).
pub const RANKS: [u8; 10] = [1, 2, 3, 4, 5, 6, 7, 10, 11, 12];

/// Number of cards in the deck.
pub const DECK_SIZE: usize = 40;

/// Cards each player holds between turns.
pub const HAND_SIZE: usize = 7;

/// The four Spanish suits
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Suit {
    Oros,
    Copas,
    Espadas,
    Bastos,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Oros, Suit::Copas, Suit::Espadas, Suit::Bastos];

    fn index(self) -> u8 {
        self as u8
    }

    fn from_index(index: u8) -> Self {
        Self::ALL[(index & 0b11) as usize]
    }

    /// Letter used in card codes
    pub fn letter(self) -> char {
        match self {
            Suit::Oros => 'O',
            Suit::Copas => 'C',
            Suit::Espadas => 'E',
            Suit::Bastos => 'B',
        }
    }

    pub fn from_letter(letter: &str) -> Option<Self> {
        match letter {
            "O" => Some(Suit::Oros),
            "C" => Some(Suit::Copas),
            "E" => Some(Suit::Espadas),
            "B" => Some(Suit::Bastos),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Suit::Oros => "oros",
            Suit::Copas => "copas",
            Suit::Espadas => "espadas",
            Suit::Bastos => "bastos",
        }
    }
}

/// A card represented as a u8.
/// - Bits 0-1: Suit (00 = Oros, 01 = Copas, 10 = Espadas, 11 = Bastos)
/// - Bits 2-5: Rank ordinal (0-9, position of the rank in [`RANKS`])
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Card(u8);

impl Card {
    const SUIT_MASK: u8 = 0b0000_0011;
    const ORDINAL_SHIFT: u8 = 2;

    /// Create a card from a suit and a face rank (1-7, 10-12)
    pub fn new(suit: Suit, rank: u8) -> Self {
        let ordinal = Self::ordinal_of(rank).expect("Rank must be 1-7 or 10-12");
        Self::from_parts(suit, ordinal)
    }

    /// Create a card, rejecting ranks absent from the Spanish deck
    pub fn try_new(suit: Suit, rank: u8) -> Result<Self, Denial> {
        Self::ordinal_of(rank)
            .map(|ordinal| Self::from_parts(suit, ordinal))
            .ok_or_else(|| Denial::InvalidCode(format!("{}-{}", suit.letter(), rank)))
    }

    fn from_parts(suit: Suit, ordinal: u8) -> Self {
        Card((ordinal << Self::ORDINAL_SHIFT) | suit.index())
    }

    fn ordinal_of(rank: u8) -> Option<u8> {
        RANKS.iter().position(|&r| r == rank).map(|p| p as u8)
    }

    /// Card at `index` in 0..40; inverse of [`Card::index`]
    pub fn from_index(index: usize) -> Option<Self> {
        (index < DECK_SIZE).then(|| Card(index as u8))
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }

    pub fn suit(&self) -> Suit {
        Suit::from_index(self.0 & Self::SUIT_MASK)
    }

    /// Face rank (1-7, 10-12)
    pub fn rank(&self) -> u8 {
        RANKS[self.ordinal() as usize]
    }

    /// Position of the rank in the 10-rank sequence; sota follows the 7.
    pub fn ordinal(&self) -> u8 {
        self.0 >> Self::ORDINAL_SHIFT
    }

    /// Points the card counts when left unmelded (figures are worth 10)
    pub fn value(&self) -> u8 {
        match self.rank() {
            r if r >= 10 => 10,
            r => r,
        }
    }

    /// Card code, e.g. "O-5" or "E-10"
    pub fn code(&self) -> String {
        format!("{}-{}", self.suit().letter(), self.rank())
    }

    /// Parse a card code of the form "<suit letter>-<rank>"
    pub fn from_code(code: &str) -> Result<Self, Denial> {
        let (letter, rank) = code
            .split_once('-')
            .ok_or_else(|| Denial::InvalidCode(code.to_string()))?;
        let suit = Suit::from_letter(letter).ok_or_else(|| Denial::InvalidCode(code.to_string()))?;
        let rank: u8 = rank
            .parse()
            .map_err(|_| Denial::InvalidCode(code.to_string()))?;
        Self::try_new(suit, rank)
    }

    /// Spanish name, e.g. "sota de oros"
    pub fn name(&self) -> String {
        let rank = match self.rank() {
            10 => "sota".to_string(),
            11 => "caballo".to_string(),
            12 => "rey".to_string(),
            r => r.to_string(),
        };
        format!("{} de {}", rank, self.suit().name())
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.suit().letter(), self.rank())
    }
}

impl fmt::Debug for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl FromStr for Card {
    type Err = Denial;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Card::from_code(s)
    }
}

impl TryFrom<String> for Card {
    type Error = Denial;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Card::from_code(&value)
    }
}

impl From<Card> for String {
    fn from(card: Card) -> Self {
        card.code()
    }
}

/// The canonical 40-card deck, suit by suit
pub fn deck() -> Vec<Card> {
    Suit::ALL
        .iter()
        .flat_map(|&suit| RANKS.iter().map(move |&rank| Card::new(suit, rank)))
        .collect()
}

/// An ordered hand of distinct cards
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hand(Vec<Card>);

impl Hand {
    /// Create a new empty hand
    pub fn new() -> Self {
        Hand(Vec::new())
    }

    pub fn from_cards(cards: impl IntoIterator<Item = Card>) -> Self {
        Hand(cards.into_iter().collect())
    }

    /// Add a card to the end of the hand
    pub fn add(&mut self, card: Card) {
        self.0.push(card);
    }

    /// Remove a card from the hand
    pub fn remove(&mut self, card: &Card) -> bool {
        match self.0.iter().position(|c| c == card) {
            Some(i) => {
                self.0.remove(i);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, card: &Card) -> bool {
        self.0.contains(card)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn cards(&self) -> &[Card] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Card> {
        self.0.iter()
    }

    /// Replace the card at `slot`, or append when `slot` is past the end
    pub fn set_slot(&mut self, slot: usize, card: Card) {
        match self.0.get_mut(slot) {
            Some(existing) => *existing = card,
            None => self.0.push(card),
        }
    }

    pub fn clear_slot(&mut self, slot: usize) -> Option<Card> {
        (slot < self.0.len()).then(|| self.0.remove(slot))
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub(crate) fn reorder(&mut self, ordered: Vec<Card>) {
        if ordered.len() == self.0.len() && ordered.iter().all(|c| self.0.contains(c)) {
            self.0 = ordered;
        }
    }
}
