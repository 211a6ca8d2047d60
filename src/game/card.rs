//! Cards and the deck builder.
//!
//! A deck is 52 standard cards plus a red and a black joker (value 14).
//! Every rank carries a fixed gameplay action label; two cards match if
//! their values or their actions are equal.

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

pub const DECK_SIZE: usize = 54;
pub const JOKER_VALUE: u8 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Suit {
    Hearts,
    Diamonds,
    Clubs,
    Spades,
    /// Red joker.
    Red,
    /// Black joker.
    Black,
}

impl Suit {
    fn name(self) -> &'static str {
        match self {
            Suit::Hearts => "hearts",
            Suit::Diamonds => "diamonds",
            Suit::Clubs => "clubs",
            Suit::Spades => "spades",
            Suit::Red => "red",
            Suit::Black => "black",
        }
    }
}

/// Gameplay effect attached to each rank. Serialized as the human label
/// the clients display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardAction {
    #[serde(rename = "Ask a Question")]
    AskAQuestion,
    #[serde(rename = "Keep the Card")]
    KeepTheCard,
    #[serde(rename = "Give the Card")]
    GiveTheCard,
    #[serde(rename = "Rock-Paper-Scissors")]
    RockPaperScissors,
    #[serde(rename = "Quick Reflex")]
    QuickReflex,
    #[serde(rename = "Word/Rhyme Challenge")]
    WordRhymeChallenge,
    #[serde(rename = "Category Challenge")]
    CategoryChallenge,
    #[serde(rename = "Skip")]
    Skip,
    #[serde(rename = "Wildcard")]
    Wildcard,
    #[serde(rename = "Silence")]
    Silence,
    #[serde(rename = "Song Chain")]
    SongChain,
    #[serde(rename = "Revert Turn")]
    RevertTurn,
}

impl CardAction {
    /// Static rank-to-action lookup; value 14 (jokers) maps to Revert Turn.
    fn for_value(value: u8) -> Self {
        match value {
            1 => CardAction::AskAQuestion,
            2 => CardAction::KeepTheCard,
            3 => CardAction::GiveTheCard,
            4 => CardAction::RockPaperScissors,
            5..=7 => CardAction::QuickReflex,
            8 => CardAction::WordRhymeChallenge,
            9 => CardAction::CategoryChallenge,
            10 => CardAction::Skip,
            11 => CardAction::Wildcard,
            12 => CardAction::Silence,
            13 => CardAction::SongChain,
            _ => CardAction::RevertTurn,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub value: u8,
    pub display_value: String,
    pub suit: Suit,
    pub action: CardAction,
    pub image: String,
}

impl Card {
    fn standard(value: u8, suit: Suit) -> Self {
        let display = display_value(value);
        Card {
            value,
            display_value: display.to_string(),
            suit,
            action: CardAction::for_value(value),
            image: format!("{}_of_{}.png", display, suit.name()),
        }
    }

    fn joker(suit: Suit) -> Self {
        Card {
            value: JOKER_VALUE,
            display_value: "joker".to_string(),
            suit,
            action: CardAction::RevertTurn,
            image: format!("{}_joker.png", suit.name()),
        }
    }

    pub fn is_joker(&self) -> bool {
        self.value == JOKER_VALUE
    }
}

fn display_value(value: u8) -> String {
    match value {
        1 => "ace".to_string(),
        11 => "jack".to_string(),
        12 => "queen".to_string(),
        13 => "king".to_string(),
        n => n.to_string(),
    }
}

/// Build a full 54-card deck, uniformly shuffled.
pub fn build_deck() -> Vec<Card> {
    let mut deck = Vec::with_capacity(DECK_SIZE);
    for suit in [Suit::Hearts, Suit::Diamonds, Suit::Clubs, Suit::Spades] {
        for value in 1..=13 {
            deck.push(Card::standard(value, suit));
        }
    }
    deck.push(Card::joker(Suit::Red));
    deck.push(Card::joker(Suit::Black));
    deck.shuffle(&mut rand::thread_rng());
    deck
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn deck_has_54_unique_cards() {
        let deck = build_deck();
        assert_eq!(deck.len(), DECK_SIZE);
        let keys: HashSet<(u8, Suit)> = deck.iter().map(|c| (c.value, c.suit)).collect();
        assert_eq!(keys.len(), DECK_SIZE);

        let jokers: Vec<&Card> = deck.iter().filter(|c| c.is_joker()).collect();
        assert_eq!(jokers.len(), 2);
        assert_ne!(jokers[0].suit, jokers[1].suit);
        assert!(deck
            .iter()
            .filter(|c| !c.is_joker())
            .all(|c| (1..=13).contains(&c.value)));
    }

    #[test]
    fn shuffle_is_a_permutation() {
        // Content is deterministic, only order is random: two independent
        // decks must hold the same multiset of cards.
        let mut a: Vec<(u8, Suit)> = build_deck().iter().map(|c| (c.value, c.suit)).collect();
        let mut b: Vec<(u8, Suit)> = build_deck().iter().map(|c| (c.value, c.suit)).collect();
        a.sort();
        b.sort();
        assert_eq!(a, b);
    }

    #[test]
    fn actions_follow_rank_table() {
        let deck = build_deck();
        for card in &deck {
            let expected = match card.value {
                1 => CardAction::AskAQuestion,
                5 | 6 | 7 => CardAction::QuickReflex,
                8 => CardAction::WordRhymeChallenge,
                10 => CardAction::Skip,
                14 => CardAction::RevertTurn,
                _ => continue,
            };
            assert_eq!(card.action, expected);
        }
    }

    #[test]
    fn image_names_follow_asset_convention() {
        let deck = build_deck();
        let ace = deck
            .iter()
            .find(|c| c.value == 1 && c.suit == Suit::Spades)
            .unwrap();
        assert_eq!(ace.image, "ace_of_spades.png");
        let red = deck.iter().find(|c| c.suit == Suit::Red).unwrap();
        assert_eq!(red.image, "red_joker.png");
        assert_eq!(red.display_value, "joker");
    }
}
