//! Routes inbound events to room/game operations and fans out the results.
//!
//! Handlers are synchronous: a connection's events run to completion one
//! at a time, so each one mutates its room atomically. Validation failures
//! go back to the requesting connection only, as an `error` frame; nothing
//! is broadcast for a rejected request.

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

use crate::game::session::{GameSession, Lifecycle, PlayerId};
use crate::room::manager::RoomRegistry;
use crate::ws::protocol::{ClientToServer, PlayerInfo, ServerToClient};

const NOT_FOUND_OR_STARTED: &str = "Game not found or already started";
const NOT_FOUND: &str = "Game not found";
const HOST_LEFT: &str = "Host left the game";
const HOST_DISCONNECTED: &str = "Host disconnected";

/// Per-connection dispatch state. A connection is in at most one room.
pub struct ConnCtx {
    pub player_id: PlayerId,
    pub tx: UnboundedSender<ServerToClient>,
    pub room_id: Option<String>,
}

impl ConnCtx {
    pub fn new(player_id: PlayerId, tx: UnboundedSender<ServerToClient>) -> Self {
        ConnCtx {
            player_id,
            tx,
            room_id: None,
        }
    }

    pub fn error(&self, message: impl Into<String>) {
        let _ = self.tx.send(ServerToClient::Error {
            message: message.into(),
        });
    }

    fn reply(&self, msg: ServerToClient) {
        let _ = self.tx.send(msg);
    }
}

pub fn dispatch(registry: &RoomRegistry, ctx: &mut ConnCtx, msg: ClientToServer) {
    match msg {
        ClientToServer::CreateGame { player_name } => create_game(registry, ctx, player_name),
        ClientToServer::JoinGame {
            game_id,
            player_name,
        } => join_game(registry, ctx, &game_id, player_name),
        ClientToServer::StartGame { game_id } => start_game(registry, ctx, &game_id),
        ClientToServer::DrawCard { game_id } => draw_card(registry, ctx, &game_id),
        ClientToServer::PlayCard { game_id, card } => {
            play_card(registry, ctx, &game_id, card.value)
        }
        ClientToServer::QuitGame { game_id } => quit_game(registry, ctx, &game_id),
        ClientToServer::ChatMessage { game_id, message } => {
            chat_message(registry, ctx, &game_id, message)
        }
    }
}

/// Forget a tracked room that no longer exists in the registry, e.g.
/// after the host closed it. Members of a dead room are free agents.
fn clear_stale_room(registry: &RoomRegistry, ctx: &mut ConnCtx) {
    if let Some(room_id) = &ctx.room_id {
        if registry.get(room_id).is_none() {
            ctx.room_id = None;
        }
    }
}

fn create_game(registry: &RoomRegistry, ctx: &mut ConnCtx, player_name: String) {
    clear_stale_room(registry, ctx);
    if ctx.room_id.is_some() {
        ctx.error("Already in a game");
        return;
    }
    let mut game = GameSession::new(ctx.player_id);
    if let Err(err) = game.add_player(ctx.player_id, player_name) {
        ctx.error(err.to_string());
        return;
    }
    let room = registry.create(game);
    room.attach(ctx.player_id, ctx.tx.clone());
    ctx.room_id = Some(room.id.clone());
    info!(room_id = %room.id, player_id = %ctx.player_id, "room created");
    ctx.reply(ServerToClient::GameCreated {
        game_id: room.id.clone(),
        player_id: ctx.player_id,
    });
}

fn join_game(registry: &RoomRegistry, ctx: &mut ConnCtx, game_id: &str, player_name: String) {
    clear_stale_room(registry, ctx);
    if ctx.room_id.is_some() {
        ctx.error("Already in a game");
        return;
    }
    let Some(room) = registry.get(game_id) else {
        ctx.error(NOT_FOUND_OR_STARTED);
        return;
    };
    let players = {
        let mut game = room.game();
        if game.state() != Lifecycle::Waiting {
            ctx.error(NOT_FOUND_OR_STARTED);
            return;
        }
        if let Err(err) = game.add_player(ctx.player_id, player_name) {
            ctx.error(err.to_string());
            return;
        }
        player_list(&game)
    };
    room.attach(ctx.player_id, ctx.tx.clone());
    ctx.room_id = Some(room.id.clone());
    info!(room_id = %room.id, player_id = %ctx.player_id, "player joined");
    ctx.reply(ServerToClient::GameJoined {
        game_id: room.id.clone(),
        player_id: ctx.player_id,
    });
    room.broadcast(&ServerToClient::PlayerList { players });
}

fn start_game(registry: &RoomRegistry, ctx: &ConnCtx, game_id: &str) {
    let Some(room) = registry.get(game_id) else {
        ctx.error(NOT_FOUND);
        return;
    };
    let hands = {
        let mut game = room.game();
        if !game.is_host(ctx.player_id) {
            ctx.error("Only the host can start the game");
            return;
        }
        if let Err(err) = game.start() {
            ctx.error(err.to_string());
            return;
        }
        let first_player = game
            .current_turn()
            .unwrap_or(ctx.player_id);
        let top_card = match game.top_card() {
            Some(card) => card.clone(),
            None => return,
        };
        game.players()
            .iter()
            .map(|p| {
                (
                    p.id,
                    ServerToClient::GameStarted {
                        first_player,
                        initial_cards: p.hand().to_vec(),
                        top_card: top_card.clone(),
                    },
                )
            })
            .collect::<Vec<_>>()
    };
    info!(room_id = %room.id, "game started");
    for (player_id, msg) in hands {
        room.send_to(player_id, &msg);
    }
}

fn draw_card(registry: &RoomRegistry, ctx: &ConnCtx, game_id: &str) {
    let Some(room) = registry.get(game_id) else {
        ctx.error(NOT_FOUND);
        return;
    };
    let (card, count, next) = {
        let mut game = room.game();
        if game.state() != Lifecycle::Playing {
            ctx.error("Game is not in progress");
            return;
        }
        if game.current_turn() != Some(ctx.player_id) {
            ctx.error("Not your turn");
            return;
        }
        let Some(card) = game.draw_card(ctx.player_id) else {
            // Every recyclable card is in a hand already.
            ctx.error("No cards left to draw");
            return;
        };
        let count = game.card_count(ctx.player_id).unwrap_or_default();
        let next = game.next_turn();
        (card, count, next)
    };
    debug!(room_id = %room.id, player_id = %ctx.player_id, "card drawn");
    ctx.reply(ServerToClient::CardDrawn {
        current_player: ctx.player_id,
        card: Some(card),
        opponent_card_count: None,
    });
    room.broadcast_except(
        ctx.player_id,
        &ServerToClient::CardDrawn {
            current_player: ctx.player_id,
            card: None,
            opponent_card_count: Some(count),
        },
    );
    if let Some(next) = next {
        room.broadcast(&ServerToClient::TurnChanged {
            current_player: next,
        });
    }
}

fn play_card(registry: &RoomRegistry, ctx: &ConnCtx, game_id: &str, value: u8) {
    let Some(room) = registry.get(game_id) else {
        ctx.error(NOT_FOUND);
        return;
    };
    enum Outcome {
        Won(Vec<(PlayerId, u32)>),
        Next(Option<PlayerId>),
    }
    let (card, count, outcome) = {
        let mut game = room.game();
        if game.state() != Lifecycle::Playing {
            ctx.error("Game is not in progress");
            return;
        }
        let card = match game.play_card(ctx.player_id, value) {
            Ok(card) => card,
            Err(err) => {
                ctx.error(err.to_string());
                return;
            }
        };
        let count = game.card_count(ctx.player_id).unwrap_or_default();
        let outcome = if count == 0 {
            game.add_score(ctx.player_id, 1);
            game.finish();
            Outcome::Won(game.scores().collect())
        } else {
            Outcome::Next(game.next_turn())
        };
        (card, count, outcome)
    };
    debug!(room_id = %room.id, player_id = %ctx.player_id, value, "card played");
    room.broadcast(&ServerToClient::CardPlayed {
        card,
        current_player: ctx.player_id,
        opponent_card_count: count,
    });
    match outcome {
        Outcome::Won(scores) => {
            info!(room_id = %room.id, winner = %ctx.player_id, "game over");
            room.broadcast(&ServerToClient::GameOver {
                winner: ctx.player_id,
                scores,
            });
        }
        Outcome::Next(Some(next)) => {
            room.broadcast(&ServerToClient::TurnChanged {
                current_player: next,
            });
        }
        Outcome::Next(None) => {}
    }
}

fn quit_game(registry: &RoomRegistry, ctx: &mut ConnCtx, game_id: &str) {
    if registry.get(game_id).is_none() {
        // Quitting a room that is already gone still releases the
        // connection from it.
        if ctx.room_id.as_deref() == Some(game_id) {
            ctx.room_id = None;
        }
        ctx.error(NOT_FOUND);
        return;
    }
    leave_room(registry, ctx, game_id, HOST_LEFT);
}

/// Shared teardown for quit and disconnect. Host departure ends the whole
/// room; anyone else just leaves it.
fn leave_room(registry: &RoomRegistry, ctx: &mut ConnCtx, game_id: &str, host_reason: &str) {
    let Some(room) = registry.get(game_id) else {
        return;
    };
    let is_host = room.game().is_host(ctx.player_id);
    if is_host {
        info!(room_id = %room.id, "host left, closing room");
        room.broadcast(&ServerToClient::GameEnded {
            reason: host_reason.to_string(),
        });
        registry.remove(&room.id);
    } else {
        info!(room_id = %room.id, player_id = %ctx.player_id, "player left");
        // If the leaver held the turn, removal passes it on and the room
        // has to hear about the new turn holder.
        let next = {
            let mut game = room.game();
            let held_turn = game.current_turn() == Some(ctx.player_id);
            game.remove_player(ctx.player_id);
            if held_turn {
                game.current_turn()
            } else {
                None
            }
        };
        room.detach(ctx.player_id);
        room.broadcast(&ServerToClient::PlayerLeft {
            player_id: ctx.player_id,
        });
        if let Some(next) = next {
            room.broadcast(&ServerToClient::TurnChanged {
                current_player: next,
            });
        }
    }
    if ctx.room_id.as_deref() == Some(game_id) {
        ctx.room_id = None;
    }
}

fn chat_message(registry: &RoomRegistry, ctx: &ConnCtx, game_id: &str, message: String) {
    let Some(room) = registry.get(game_id) else {
        ctx.error(NOT_FOUND);
        return;
    };
    let sender = match room.game().player_name(ctx.player_id) {
        Some(name) => name.to_string(),
        None => {
            ctx.error("You are not in this game");
            return;
        }
    };
    room.broadcast(&ServerToClient::ChatMessage { sender, message });
}

/// A closed socket is handled like a quit, with a different reason string.
pub fn handle_disconnect(registry: &RoomRegistry, ctx: &mut ConnCtx) {
    if let Some(room_id) = ctx.room_id.clone() {
        leave_room(registry, ctx, &room_id, HOST_DISCONNECTED);
        ctx.room_id = None;
    }
}

fn player_list(game: &GameSession) -> Vec<PlayerInfo> {
    game.players()
        .iter()
        .map(|p| PlayerInfo {
            id: p.id,
            name: p.name.clone(),
            is_host: p.is_host,
        })
        .collect()
}
