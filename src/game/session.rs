//! One room's game state: players, piles, turn rotation, scores.
//!
//! A session owns every card in play. A card lives in exactly one of the
//! draw pile, a player's hand, or the played pile; deals, draws and plays
//! move it between containers, so the total stays at 54.

use std::collections::HashMap;

use rand::seq::SliceRandom;
use serde::Serialize;
use ulid::Ulid;

use super::card::{build_deck, Card};

/// Opaque connection identifier assigned by the transport layer.
pub type PlayerId = Ulid;

pub const INITIAL_HAND_SIZE: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifecycle {
    Waiting,
    Playing,
    Finished,
}

#[derive(Debug)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub is_host: bool,
    hand: Vec<Card>,
}

impl Player {
    pub fn hand(&self) -> &[Card] {
        &self.hand
    }
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameError {
    #[error("game already started")]
    NotJoinable,
    #[error("player already joined")]
    AlreadyJoined,
    #[error("not enough cards to deal")]
    NotEnoughCards,
    #[error("not your turn")]
    NotYourTurn,
    #[error("card is not in your hand")]
    CardNotInHand,
    #[error("card does not match the top card")]
    IllegalCard,
    #[error("unknown player")]
    UnknownPlayer,
}

#[derive(Debug)]
pub struct GameSession {
    /// Join order is turn order and never changes.
    players: Vec<Player>,
    deck: Vec<Card>,
    /// Last element is the face-up top card.
    played: Vec<Card>,
    current_turn: Option<PlayerId>,
    host: PlayerId,
    state: Lifecycle,
    scores: HashMap<PlayerId, u32>,
}

impl GameSession {
    pub fn new(host: PlayerId) -> Self {
        GameSession {
            players: Vec::new(),
            deck: build_deck(),
            played: Vec::new(),
            current_turn: None,
            host,
            state: Lifecycle::Waiting,
            scores: HashMap::new(),
        }
    }

    pub fn state(&self) -> Lifecycle {
        self.state
    }

    pub fn is_host(&self, id: PlayerId) -> bool {
        self.host == id
    }

    pub fn current_turn(&self) -> Option<PlayerId> {
        self.current_turn
    }

    pub fn top_card(&self) -> Option<&Card> {
        self.played.last()
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player_name(&self, id: PlayerId) -> Option<&str> {
        self.players
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.name.as_str())
    }

    pub fn card_count(&self, id: PlayerId) -> Option<usize> {
        self.players
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.hand.len())
    }

    pub fn scores(&self) -> impl Iterator<Item = (PlayerId, u32)> + '_ {
        self.scores.iter().map(|(id, s)| (*id, *s))
    }

    pub fn add_score(&mut self, id: PlayerId, delta: u32) {
        *self.scores.entry(id).or_insert(0) += delta;
    }

    /// Insert a player with an empty hand and a zero score.
    pub fn add_player(&mut self, id: PlayerId, name: String) -> Result<(), GameError> {
        if self.state != Lifecycle::Waiting {
            return Err(GameError::NotJoinable);
        }
        if self.players.iter().any(|p| p.id == id) {
            return Err(GameError::AlreadyJoined);
        }
        let is_host = id == self.host;
        self.players.push(Player {
            id,
            name,
            is_host,
            hand: Vec::new(),
        });
        self.scores.insert(id, 0);
        Ok(())
    }

    /// Deal 7 cards to every player in join order, flip the starting top
    /// card, and hand the turn to the first player.
    pub fn start(&mut self) -> Result<(), GameError> {
        if self.state != Lifecycle::Waiting {
            return Err(GameError::NotJoinable);
        }
        let first = self.players.first().map(|p| p.id).ok_or(GameError::UnknownPlayer)?;
        // 7 per hand plus the face-up starter. Rules out oversized lobbies
        // (54 cards cap the table at 7 players).
        if self.deck.len() < INITIAL_HAND_SIZE * self.players.len() + 1 {
            return Err(GameError::NotEnoughCards);
        }
        for player in &mut self.players {
            player.hand = self.deck.drain(..INITIAL_HAND_SIZE).collect();
        }
        let top = self.deck.pop().ok_or(GameError::NotEnoughCards)?;
        self.played.push(top);
        self.current_turn = Some(first);
        self.state = Lifecycle::Playing;
        Ok(())
    }

    /// Move the top of the draw pile into the player's hand and return a
    /// copy of it. Out-of-turn calls return `None` and change nothing.
    ///
    /// An empty draw pile is replenished by reshuffling every played card
    /// except the current top card. If even that leaves nothing to draw
    /// (all 53 other cards are in hands), the draw yields `None`.
    pub fn draw_card(&mut self, id: PlayerId) -> Option<Card> {
        if self.current_turn != Some(id) {
            return None;
        }
        let idx = self.players.iter().position(|p| p.id == id)?;
        if self.deck.is_empty() && self.played.len() > 1 {
            let top = self.played.pop()?;
            let mut rest = std::mem::take(&mut self.played);
            rest.shuffle(&mut rand::thread_rng());
            self.deck = rest;
            self.played.push(top);
        }
        let card = self.deck.pop()?;
        self.players[idx].hand.push(card.clone());
        Some(card)
    }

    /// Play the first hand card matching `value` against the top card.
    /// On success the card moves onto the played pile and a copy is
    /// returned for broadcasting.
    ///
    /// A play is legal when values or action labels match. Jokers carry
    /// value 14 and the Revert Turn action, so a joker is only playable
    /// on the other joker; there is no unconditional joker rule.
    pub fn play_card(&mut self, id: PlayerId, value: u8) -> Result<Card, GameError> {
        if self.current_turn != Some(id) {
            return Err(GameError::NotYourTurn);
        }
        let player_idx = self
            .players
            .iter()
            .position(|p| p.id == id)
            .ok_or(GameError::UnknownPlayer)?;
        let card_idx = self.players[player_idx]
            .hand
            .iter()
            .position(|c| c.value == value)
            .ok_or(GameError::CardNotInHand)?;

        let top = self.played.last().ok_or(GameError::IllegalCard)?;
        let candidate = &self.players[player_idx].hand[card_idx];
        if candidate.value != top.value && candidate.action != top.action {
            return Err(GameError::IllegalCard);
        }

        let card = self.players[player_idx].hand.remove(card_idx);
        self.played.push(card.clone());
        Ok(card)
    }

    /// Advance the turn to the next player in join order, wrapping.
    pub fn next_turn(&mut self) -> Option<PlayerId> {
        if self.players.is_empty() {
            self.current_turn = None;
            return None;
        }
        let next_idx = self
            .current_turn
            .and_then(|cur| self.players.iter().position(|p| p.id == cur))
            .map(|i| (i + 1) % self.players.len())
            .unwrap_or(0);
        let next = self.players[next_idx].id;
        self.current_turn = Some(next);
        self.current_turn
    }

    pub fn finish(&mut self) {
        self.state = Lifecycle::Finished;
        self.current_turn = None;
    }

    /// Remove a departing player, returning their hand to the bottom of
    /// the draw pile so the card total stays intact. If they held the
    /// turn, it passes on first.
    pub fn remove_player(&mut self, id: PlayerId) {
        if self.current_turn == Some(id) {
            self.next_turn();
            if self.current_turn == Some(id) {
                // They were the only player left.
                self.current_turn = None;
            }
        }
        if let Some(idx) = self.players.iter().position(|p| p.id == id) {
            let mut player = self.players.remove(idx);
            self.deck.append(&mut player.hand);
        }
    }
}

#[cfg(test)]
impl GameSession {
    /// Replace a player's hand with a fixed set of cards.
    pub(crate) fn rig_hand(&mut self, id: PlayerId, cards: Vec<Card>) {
        if let Some(player) = self.players.iter_mut().find(|p| p.id == id) {
            player.hand = cards;
        }
    }

    /// Replace the face-up top card.
    pub(crate) fn rig_top(&mut self, card: Card) {
        if let Some(top) = self.played.last_mut() {
            *top = card;
        }
    }
}
