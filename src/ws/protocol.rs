//! Wire messages.
//!
//! Frames are JSON objects tagged by a camelCase `type` field, with
//! camelCase payload keys, so events read as `createGame`, `gameCreated`,
//! `turnChanged` and so on.

use serde::{Deserialize, Serialize};

use crate::game::card::Card;
use crate::game::session::PlayerId;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientToServer {
    #[serde(rename_all = "camelCase")]
    CreateGame { player_name: String },
    #[serde(rename_all = "camelCase")]
    JoinGame { game_id: String, player_name: String },
    #[serde(rename_all = "camelCase")]
    StartGame { game_id: String },
    #[serde(rename_all = "camelCase")]
    DrawCard { game_id: String },
    #[serde(rename_all = "camelCase")]
    PlayCard { game_id: String, card: Card },
    #[serde(rename_all = "camelCase")]
    QuitGame { game_id: String },
    #[serde(rename_all = "camelCase")]
    ChatMessage { game_id: String, message: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerInfo {
    pub id: PlayerId,
    pub name: String,
    pub is_host: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerToClient {
    #[serde(rename_all = "camelCase")]
    GameCreated { game_id: String, player_id: PlayerId },
    #[serde(rename_all = "camelCase")]
    GameJoined { game_id: String, player_id: PlayerId },
    PlayerList { players: Vec<PlayerInfo> },
    #[serde(rename_all = "camelCase")]
    GameStarted {
        first_player: PlayerId,
        initial_cards: Vec<Card>,
        top_card: Card,
    },
    /// The drawing player gets the full card; everyone else only sees
    /// the new hand count.
    #[serde(rename_all = "camelCase")]
    CardDrawn {
        current_player: PlayerId,
        #[serde(skip_serializing_if = "Option::is_none")]
        card: Option<Card>,
        #[serde(skip_serializing_if = "Option::is_none")]
        opponent_card_count: Option<usize>,
    },
    #[serde(rename_all = "camelCase")]
    CardPlayed {
        card: Card,
        current_player: PlayerId,
        opponent_card_count: usize,
    },
    #[serde(rename_all = "camelCase")]
    TurnChanged { current_player: PlayerId },
    GameOver {
        winner: PlayerId,
        scores: Vec<(PlayerId, u32)>,
    },
    GameEnded { reason: String },
    #[serde(rename_all = "camelCase")]
    PlayerLeft { player_id: PlayerId },
    ChatMessage { sender: String, message: String },
    Error { message: String },
}
