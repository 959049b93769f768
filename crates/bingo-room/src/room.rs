//! The room aggregate: every rule of one bingo game in one place.
//!
//! `Room` is plain synchronous state. Each operation validates the request,
//! mutates, and returns the events it wants delivered as an [`Outbox`]. It
//! never touches a channel itself; the actor in `actor.rs` owns delivery.
//! On `Err` nothing has been mutated.

use std::collections::HashSet;

use bingo_protocol::{
    Card, ChatMessage, ClientId, ConnectionId, FREE_SPACE, LeaderboardEntry, Letter, RoomCode,
    ServerEvent,
};
use bingo_session::{IdentityMap, Role, SessionError};
use bingo_timer::unix_millis_after;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::time::Instant;

use crate::card::{distance_to_win, generate_card};
use crate::chat::ChatModerator;
use crate::draw::DrawPool;
use crate::vote::VoteState;
use crate::{RoomConfig, RoomError};

/// Where an outbound event should go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// Every connected participant, host included.
    Room,
    /// The host's current connection.
    Host,
    /// One specific connection.
    Connection(ConnectionId),
}

/// Events produced by one operation, in delivery order.
pub type Outbox = Vec<(Recipient, ServerEvent)>;

/// A player's game state. Identity lives in the [`IdentityMap`].
#[derive(Debug, Clone)]
struct Player {
    client_id: ClientId,
    name: String,
    card: Card,
    marked: HashSet<u32>,
}

impl Player {
    fn distance(&self) -> u8 {
        distance_to_win(&self.card, &self.marked)
    }

    fn marked_sorted(&self) -> Vec<u32> {
        let mut marked: Vec<u32> = self.marked.iter().copied().collect();
        marked.sort_unstable();
        marked
    }
}

/// A snapshot of room metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomInfo {
    pub room_code: RoomCode,
    pub started: bool,
    pub player_count: usize,
    pub called: usize,
    pub winner: Option<String>,
    pub vote_active: bool,
    pub connected: bool,
}

/// One bingo game.
pub struct Room {
    code: RoomCode,
    config: RoomConfig,
    identities: IdentityMap,
    /// In join order. Leaderboard ties keep this order.
    players: Vec<Player>,
    started: bool,
    winner: Option<String>,
    draws: DrawPool,
    vote: VoteState,
    chat: ChatModerator,
    rng: StdRng,
}

impl Room {
    /// Creates a room with `host` bound to `connection`.
    pub fn new(code: RoomCode, config: RoomConfig, host: ClientId, connection: ConnectionId) -> Self {
        Self::with_rng(code, config, host, connection, StdRng::from_rng(&mut rand::rng()))
    }

    /// Like [`Room::new`] with a caller-supplied generator.
    pub fn with_rng(
        code: RoomCode,
        config: RoomConfig,
        host: ClientId,
        connection: ConnectionId,
        rng: StdRng,
    ) -> Self {
        let chat = ChatModerator::new(&config);
        Self {
            code,
            config,
            identities: IdentityMap::new(host, connection),
            players: Vec::new(),
            started: false,
            winner: None,
            draws: DrawPool::new(),
            vote: VoteState::new(),
            chat,
            rng,
        }
    }

    // -- Accessors ---------------------------------------------------------

    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn winner(&self) -> Option<&str> {
        self.winner.as_deref()
    }

    pub fn called_numbers(&self) -> &[u32] {
        self.draws.history()
    }

    pub fn remaining_numbers(&self) -> usize {
        self.draws.remaining()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn vote(&self) -> &VoteState {
        &self.vote
    }

    pub fn chat_history(&self) -> Vec<ChatMessage> {
        self.chat.history()
    }

    /// Whether anyone still has an open connection to this room.
    pub fn any_connected(&self) -> bool {
        self.identities.any_connected()
    }

    pub fn info(&self) -> RoomInfo {
        RoomInfo {
            room_code: self.code.clone(),
            started: self.started,
            player_count: self.players.len(),
            called: self.draws.history().len(),
            winner: self.winner.clone(),
            vote_active: self.vote.is_active(),
            connected: self.identities.any_connected(),
        }
    }

    /// Connections an event for `recipient` should be written to.
    pub fn resolve(&self, recipient: Recipient) -> Vec<ConnectionId> {
        match recipient {
            Recipient::Room => self.identities.audience(),
            Recipient::Host => {
                let host = self.identities.host();
                if host.is_connected() {
                    vec![host.connection]
                } else {
                    Vec::new()
                }
            }
            Recipient::Connection(conn) => vec![conn],
        }
    }

    // -- Joining -----------------------------------------------------------

    /// Joins a new player, or resumes one that already has a card.
    ///
    /// The ban check comes first so a banned client always hears that it
    /// was banned, even after the game started.
    pub fn join(
        &mut self,
        conn: ConnectionId,
        name: &str,
        client_id: &ClientId,
    ) -> Result<Outbox, RoomError> {
        if self.identities.is_banned(client_id) {
            return Err(RoomError::Banned);
        }
        if self.identities.is_player(client_id) {
            self.identities.rebind_player(client_id, conn)?;
            tracing::info!(room = %self.code, client = %client_id, %conn, "player resumed");
            return self.replay_player(conn, client_id);
        }
        if self.started {
            return Err(RoomError::InvalidState("game already started".into()));
        }

        self.identities.bind_player(client_id.clone(), conn)?;
        let name = self.display_name(name);
        let player = Player {
            client_id: client_id.clone(),
            name,
            card: generate_card(&mut self.rng),
            marked: HashSet::from([FREE_SPACE]),
        };
        tracing::info!(
            room = %self.code,
            client = %client_id,
            name = %player.name,
            players = self.players.len() + 1,
            "player joined"
        );

        let joined = ServerEvent::JoinedSuccess {
            room_code: self.code.clone(),
            card: player.card.clone(),
            marked_numbers: player.marked_sorted(),
            chat_history: self.chat.history(),
            called_numbers: self.draws.history().to_vec(),
            started: self.started,
        };
        self.players.push(player);

        Ok(vec![
            (Recipient::Connection(conn), joined),
            (
                Recipient::Room,
                ServerEvent::PlayerCountUpdated {
                    count: self.players.len(),
                },
            ),
        ])
    }

    /// Re-attaches `conn` to an existing host or player identity.
    pub fn reconnect(&mut self, conn: ConnectionId, client_id: &ClientId) -> Result<Outbox, RoomError> {
        if *client_id == self.identities.host().client_id {
            self.identities.rebind_host(client_id, conn)?;
            tracing::info!(room = %self.code, %conn, "host reconnected");
            return Ok(self.replay_host(conn));
        }
        if self.identities.is_banned(client_id) {
            return Err(RoomError::Banned);
        }
        if !self.identities.is_player(client_id) {
            return Err(SessionError::UnknownClient(client_id.clone()).into());
        }
        self.identities.rebind_player(client_id, conn)?;
        tracing::info!(room = %self.code, client = %client_id, %conn, "player reconnected");
        self.replay_player(conn, client_id)
    }

    fn replay_player(&self, conn: ConnectionId, client_id: &ClientId) -> Result<Outbox, RoomError> {
        let player = self.player(client_id)?;
        let mut out = vec![(
            Recipient::Connection(conn),
            ServerEvent::JoinedSuccess {
                room_code: self.code.clone(),
                card: player.card.clone(),
                marked_numbers: player.marked_sorted(),
                chat_history: self.chat.history(),
                called_numbers: self.draws.history().to_vec(),
                started: self.started,
            },
        )];
        self.push_vote_state(&mut out, conn, self.vote.has_voted(client_id));
        if let Some(winner) = &self.winner {
            out.push((
                Recipient::Connection(conn),
                ServerEvent::GameOver {
                    winner: winner.clone(),
                },
            ));
        }
        Ok(out)
    }

    fn replay_host(&self, conn: ConnectionId) -> Outbox {
        let mut out = vec![
            (
                Recipient::Connection(conn),
                ServerEvent::HostRestored {
                    room_code: self.code.clone(),
                    started: self.started,
                    called_numbers: self.draws.history().to_vec(),
                    winner: self.winner.clone(),
                },
            ),
            (Recipient::Connection(conn), self.leaderboard()),
            (
                Recipient::Connection(conn),
                ServerEvent::ChatHistoryReplaced {
                    history: self.chat.history(),
                },
            ),
        ];
        self.push_vote_state(&mut out, conn, false);
        out
    }

    fn push_vote_state(&self, out: &mut Outbox, conn: ConnectionId, has_voted: bool) {
        if self.vote.is_active() {
            out.push((
                Recipient::Connection(conn),
                ServerEvent::VoteStarted {
                    deadline_ms: self.vote.deadline_ms(),
                    has_voted,
                },
            ));
            out.push((
                Recipient::Connection(conn),
                ServerEvent::VoteTallyUpdate {
                    counts: self.vote.tally(),
                },
            ));
        }
    }

    // -- Host actions ------------------------------------------------------

    /// Closes registration and begins play.
    pub fn start_game(&mut self, conn: ConnectionId) -> Result<Outbox, RoomError> {
        self.identities.require_host(conn)?;
        if self.started {
            return Err(RoomError::InvalidState("game already started".into()));
        }
        self.started = true;
        tracing::info!(room = %self.code, players = self.players.len(), "game started");
        Ok(vec![
            (Recipient::Room, ServerEvent::GameStarted),
            (Recipient::Host, self.leaderboard()),
        ])
    }

    /// Draws an unbiased number.
    pub fn draw(&mut self, conn: ConnectionId) -> Result<Outbox, RoomError> {
        self.identities.require_host(conn)?;
        Ok(self.draw_next(None))
    }

    fn draw_next(&mut self, bias: Option<Letter>) -> Outbox {
        if self.winner.is_some() {
            tracing::debug!(room = %self.code, "draw skipped: game over");
            return Vec::new();
        }
        let Some(number) = self.draws.draw(&mut self.rng, bias) else {
            tracing::debug!(room = %self.code, "draw skipped: pool empty");
            return Vec::new();
        };
        tracing::debug!(room = %self.code, number, bias = ?bias, "number drawn");
        vec![
            (
                Recipient::Room,
                ServerEvent::NumberDrawn {
                    number,
                    history: self.draws.history().to_vec(),
                },
            ),
            (Recipient::Host, self.leaderboard()),
        ]
    }

    /// Opens a letter vote. Returns the vote's epoch with the events.
    ///
    /// The caller schedules [`Room::resolve_vote`] with that epoch after
    /// the configured vote duration.
    pub fn start_vote(&mut self, conn: ConnectionId) -> Result<(u64, Outbox), RoomError> {
        self.identities.require_host(conn)?;
        let deadline_ms = unix_millis_after(self.config.vote_duration);
        let epoch = self.vote.start(deadline_ms)?;
        tracing::info!(room = %self.code, epoch, "vote started");
        Ok((
            epoch,
            vec![
                (
                    Recipient::Room,
                    ServerEvent::VoteStarted {
                        deadline_ms,
                        has_voted: false,
                    },
                ),
                (
                    Recipient::Room,
                    ServerEvent::VoteTallyUpdate {
                        counts: self.vote.tally(),
                    },
                ),
            ],
        ))
    }

    /// Closes the vote armed with `epoch` and draws with the winning bias.
    ///
    /// Stale epochs produce no events.
    pub fn resolve_vote(&mut self, epoch: u64) -> Outbox {
        let Some(letter) = self.vote.resolve(epoch) else {
            return Vec::new();
        };
        tracing::info!(room = %self.code, epoch, letter = ?letter, "vote resolved");
        let mut out = vec![(Recipient::Room, ServerEvent::VoteEnded { letter })];
        out.extend(self.draw_next(letter));
        out
    }

    /// Bans a player, purges their chat, and tells them.
    pub fn ban(
        &mut self,
        conn: ConnectionId,
        requester: &ClientId,
        target: &ClientId,
    ) -> Result<Outbox, RoomError> {
        self.identities.require_host(conn)?;
        if *requester != self.identities.host().client_id {
            return Err(SessionError::NotHost.into());
        }
        if *target == self.identities.host().client_id {
            return Err(RoomError::InvalidState("the host cannot ban itself".into()));
        }
        let binding = self.identities.ban(target)?;

        let name = match self.players.iter().position(|p| p.client_id == *target) {
            Some(idx) => self.players.remove(idx).name,
            None => target.to_string(),
        };
        let purged = self.chat.purge(target);
        self.chat
            .post(ChatMessage::system(format!("{name} was banned by the host")), Instant::now());
        tracing::info!(room = %self.code, client = %target, %name, purged, "player banned");

        let mut out = Vec::new();
        if binding.is_connected() {
            out.push((Recipient::Connection(binding.connection), ServerEvent::BannedNotice));
        }
        out.push((
            Recipient::Room,
            ServerEvent::ChatHistoryReplaced {
                history: self.chat.history(),
            },
        ));
        out.push((
            Recipient::Room,
            ServerEvent::PlayerCountUpdated {
                count: self.players.len(),
            },
        ));
        out.push((Recipient::Host, self.leaderboard()));
        Ok(out)
    }

    // -- Player actions ----------------------------------------------------

    /// Records a vote from a player.
    pub fn submit_vote(
        &mut self,
        conn: ConnectionId,
        client_id: &ClientId,
        letter: Letter,
    ) -> Result<Outbox, RoomError> {
        self.require_player(conn, client_id)?;
        let counts = self.vote.submit(client_id, letter)?;
        tracing::debug!(room = %self.code, client = %client_id, %letter, "vote recorded");
        Ok(vec![(Recipient::Room, ServerEvent::VoteTallyUpdate { counts })])
    }

    /// Marks or unmarks a number on the player's card.
    ///
    /// Only called numbers and the free space can be marked. Unmarking
    /// never removes the free space.
    pub fn mark(
        &mut self,
        conn: ConnectionId,
        client_id: &ClientId,
        number: u32,
        is_marking: bool,
    ) -> Result<Outbox, RoomError> {
        self.require_player(conn, client_id)?;
        if is_marking && number != FREE_SPACE && !self.draws.is_called(number) {
            return Err(RoomError::InvalidState(format!("{number} has not been called")));
        }
        let player = self.player_mut(client_id)?;
        if is_marking {
            player.marked.insert(number);
        } else {
            player.marked.remove(&number);
            player.marked.insert(FREE_SPACE);
        }
        Ok(vec![(Recipient::Host, self.leaderboard())])
    }

    /// Checks a bingo claim. The first valid claim wins the game.
    pub fn claim(&mut self, conn: ConnectionId, client_id: &ClientId) -> Result<Outbox, RoomError> {
        self.require_player(conn, client_id)?;
        if self.winner.is_some() {
            return Err(RoomError::GameOver);
        }
        let player = self.player(client_id)?;
        if player.distance() != 0 {
            tracing::debug!(room = %self.code, client = %client_id, "claim rejected");
            return Err(RoomError::InvalidClaim);
        }
        let winner = player.name.clone();
        self.winner = Some(winner.clone());
        tracing::info!(room = %self.code, client = %client_id, %winner, "bingo");
        Ok(vec![(Recipient::Room, ServerEvent::GameOver { winner })])
    }

    /// Posts to the room chat. The host chats with its own client id.
    pub fn chat(
        &mut self,
        conn: ConnectionId,
        client_id: &ClientId,
        text: &str,
        now: Instant,
    ) -> Result<Outbox, RoomError> {
        let role = self.identities.verify(client_id, conn)?;
        self.chat.check_rate(client_id, now)?;
        let text = self.chat.clean(text)?;
        let (sender_label, is_host) = match role {
            Role::Host => ("Host".to_string(), true),
            Role::Player => (self.player(client_id)?.name.clone(), false),
        };
        let message = ChatMessage {
            sender_label,
            text,
            is_host,
            is_system: false,
            client_id: Some(client_id.clone()),
        };
        self.chat.post(message.clone(), now);
        Ok(vec![(Recipient::Room, ServerEvent::ChatMessage { message })])
    }

    // -- Connections -------------------------------------------------------

    /// Marks every identity bound to `conn` as disconnected.
    ///
    /// Players keep their cards and can resume with the same client id.
    pub fn disconnect(&mut self, conn: ConnectionId) -> Vec<ClientId> {
        let affected = self.identities.disconnect(conn);
        for client in &affected {
            tracing::info!(room = %self.code, %client, %conn, "participant disconnected");
        }
        affected
    }

    // -- Leaderboard -------------------------------------------------------

    /// Host view: closest players first, ties in join order.
    pub fn leaderboard(&self) -> ServerEvent {
        let mut ranked: Vec<LeaderboardEntry> = self
            .players
            .iter()
            .map(|p| LeaderboardEntry {
                client_id: p.client_id.clone(),
                name: p.name.clone(),
                to_go: p.distance(),
            })
            .collect();
        ranked.sort_by_key(|e| e.to_go);
        ranked.truncate(self.config.leaderboard_size);
        ServerEvent::HostUpdate {
            top_players: ranked,
            called_numbers: self.draws.history().to_vec(),
        }
    }

    // -- Helpers -----------------------------------------------------------

    fn require_player(&self, conn: ConnectionId, client_id: &ClientId) -> Result<(), RoomError> {
        match self.identities.verify(client_id, conn)? {
            Role::Player => Ok(()),
            Role::Host => Err(SessionError::HostIdentity(client_id.clone()).into()),
        }
    }

    fn player(&self, client_id: &ClientId) -> Result<&Player, RoomError> {
        self.players
            .iter()
            .find(|p| p.client_id == *client_id)
            .ok_or_else(|| SessionError::UnknownClient(client_id.clone()).into())
    }

    fn player_mut(&mut self, client_id: &ClientId) -> Result<&mut Player, RoomError> {
        self.players
            .iter_mut()
            .find(|p| p.client_id == *client_id)
            .ok_or_else(|| SessionError::UnknownClient(client_id.clone()).into())
    }

    fn display_name(&self, raw: &str) -> String {
        let name: String = raw.trim().chars().take(self.config.max_name_len).collect();
        if name.is_empty() {
            format!("Player {}", self.players.len() + 1)
        } else {
            name
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn cid(id: &str) -> ClientId {
        ClientId::parse(id).unwrap()
    }

    fn conn(id: u64) -> ConnectionId {
        ConnectionId::new(id)
    }

    const HOST: u64 = 1;

    fn room() -> Room {
        room_with(RoomConfig::default())
    }

    fn room_with(config: RoomConfig) -> Room {
        Room::with_rng(
            RoomCode::parse("ABCDE").unwrap(),
            config,
            cid("host"),
            conn(HOST),
            StdRng::seed_from_u64(99),
        )
    }

    fn events_for(out: &Outbox, recipient: Recipient) -> Vec<&ServerEvent> {
        out.iter()
            .filter(|(r, _)| *r == recipient)
            .map(|(_, e)| e)
            .collect()
    }

    fn card_of(room: &Room, id: &str) -> Card {
        room.player(&cid(id)).unwrap().card.clone()
    }

    /// Draws until every number on `id`'s top row has been called.
    fn draw_top_row(room: &mut Room, id: &str) -> Vec<u32> {
        let row = card_of(room, id).rows()[0];
        while !row.iter().all(|n| room.draws.is_called(*n)) {
            room.draw(conn(HOST)).unwrap();
        }
        row.to_vec()
    }

    // =====================================================================
    // Join / reconnect
    // =====================================================================

    #[test]
    fn test_join_new_player() {
        let mut r = room();
        let out = r.join(conn(2), "  Ana  ", &cid("p1")).unwrap();

        match events_for(&out, Recipient::Connection(conn(2)))[0] {
            ServerEvent::JoinedSuccess {
                marked_numbers,
                started,
                ..
            } => {
                assert_eq!(marked_numbers, &vec![FREE_SPACE]);
                assert!(!started);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(
            events_for(&out, Recipient::Room),
            vec![&ServerEvent::PlayerCountUpdated { count: 1 }]
        );
        assert_eq!(r.player(&cid("p1")).unwrap().name, "Ana");
    }

    #[test]
    fn test_blank_name_gets_default() {
        let mut r = room();
        r.join(conn(2), "a", &cid("p1")).unwrap();
        r.join(conn(3), "   ", &cid("p2")).unwrap();
        assert_eq!(r.player(&cid("p2")).unwrap().name, "Player 2");
    }

    #[test]
    fn test_long_name_is_cut() {
        let mut r = room();
        r.join(conn(2), &"x".repeat(40), &cid("p1")).unwrap();
        assert_eq!(r.player(&cid("p1")).unwrap().name.chars().count(), 24);
    }

    #[test]
    fn test_rejoin_restores_same_card_without_duplicate() {
        let mut r = room();
        r.join(conn(2), "Ana", &cid("p1")).unwrap();
        let card = card_of(&r, "p1");
        r.start_game(conn(HOST)).unwrap();
        r.disconnect(conn(2));

        let out = r.join(conn(7), "Ignored", &cid("p1")).unwrap();
        assert_eq!(r.player_count(), 1);
        match &out[0] {
            (Recipient::Connection(c), ServerEvent::JoinedSuccess { card: replayed, started, .. }) => {
                assert_eq!(*c, conn(7));
                assert_eq!(*replayed, card);
                assert!(*started);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(!out.iter().any(|(_, e)| matches!(e, ServerEvent::PlayerCountUpdated { .. })));
        assert_eq!(r.player(&cid("p1")).unwrap().name, "Ana");
    }

    #[test]
    fn test_repeated_resume_duplicates_nothing() {
        let mut r = room();
        r.join(conn(2), "Ana", &cid("p1")).unwrap();
        r.chat(conn(2), &cid("p1"), "hi all", Instant::now()).unwrap();
        let card = card_of(&r, "p1");
        let chat_before = r.chat_history();

        r.reconnect(conn(3), &cid("p1")).unwrap();
        r.reconnect(conn(3), &cid("p1")).unwrap();
        r.join(conn(3), "Ana", &cid("p1")).unwrap();

        assert_eq!(r.player_count(), 1);
        assert_eq!(r.chat_history(), chat_before);
        assert_eq!(card_of(&r, "p1"), card);
    }

    #[test]
    fn test_new_player_rejected_after_start() {
        let mut r = room();
        r.start_game(conn(HOST)).unwrap();
        assert!(matches!(
            r.join(conn(2), "Late", &cid("p1")),
            Err(RoomError::InvalidState(_))
        ));
    }

    #[test]
    fn test_banned_check_precedes_started_check() {
        let mut r = room();
        r.join(conn(2), "Ana", &cid("p1")).unwrap();
        r.ban(conn(HOST), &cid("host"), &cid("p1")).unwrap();
        r.start_game(conn(HOST)).unwrap();
        assert!(matches!(r.join(conn(3), "Ana", &cid("p1")), Err(RoomError::Banned)));
        assert!(matches!(r.reconnect(conn(3), &cid("p1")), Err(RoomError::Banned)));
    }

    #[test]
    fn test_host_reconnect_restores_privileges() {
        let mut r = room();
        r.join(conn(2), "Ana", &cid("p1")).unwrap();
        r.disconnect(conn(HOST));
        assert!(r.draw(conn(HOST)).is_err());

        let out = r.reconnect(conn(9), &cid("host")).unwrap();
        assert!(matches!(out[0].1, ServerEvent::HostRestored { .. }));
        assert!(matches!(out[1].1, ServerEvent::HostUpdate { .. }));
        assert!(matches!(out[2].1, ServerEvent::ChatHistoryReplaced { .. }));
        assert!(r.draw(conn(9)).is_ok());
        assert!(matches!(r.draw(conn(HOST)), Err(RoomError::Unauthorized(_))));
    }

    #[test]
    fn test_reconnect_unknown_client() {
        let mut r = room();
        assert!(matches!(r.reconnect(conn(5), &cid("ghost")), Err(RoomError::NotFound(_))));
    }

    #[test]
    fn test_reconnect_replays_vote_state() {
        let mut r = room();
        r.join(conn(2), "Ana", &cid("p1")).unwrap();
        r.start_vote(conn(HOST)).unwrap();
        r.submit_vote(conn(2), &cid("p1"), Letter::G).unwrap();

        let out = r.reconnect(conn(3), &cid("p1")).unwrap();
        assert!(out.iter().any(|(_, e)| matches!(
            e,
            ServerEvent::VoteStarted { has_voted: true, .. }
        )));
    }

    // =====================================================================
    // Host-only actions
    // =====================================================================

    #[test]
    fn test_host_only_actions_reject_players() {
        let mut r = room();
        r.join(conn(2), "Ana", &cid("p1")).unwrap();
        assert!(matches!(r.start_game(conn(2)), Err(RoomError::Unauthorized(_))));
        assert!(matches!(r.draw(conn(2)), Err(RoomError::Unauthorized(_))));
        assert!(matches!(r.start_vote(conn(2)), Err(RoomError::Unauthorized(_))));
        assert!(matches!(
            r.ban(conn(2), &cid("p1"), &cid("p1")),
            Err(RoomError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_start_game_twice() {
        let mut r = room();
        let out = r.start_game(conn(HOST)).unwrap();
        assert_eq!(out[0], (Recipient::Room, ServerEvent::GameStarted));
        assert!(matches!(r.start_game(conn(HOST)), Err(RoomError::InvalidState(_))));
    }

    #[test]
    fn test_draw_broadcasts_full_history() {
        let mut r = room();
        r.draw(conn(HOST)).unwrap();
        let out = r.draw(conn(HOST)).unwrap();
        match &out[0] {
            (Recipient::Room, ServerEvent::NumberDrawn { number, history }) => {
                assert_eq!(history.len(), 2);
                assert_eq!(history.last(), Some(number));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(r.remaining_numbers(), 148);
    }

    #[test]
    fn test_draw_is_noop_after_winner() {
        let mut r = room();
        r.join(conn(2), "Ana", &cid("p1")).unwrap();
        for n in draw_top_row(&mut r, "p1") {
            r.mark(conn(2), &cid("p1"), n, true).unwrap();
        }
        r.claim(conn(2), &cid("p1")).unwrap();
        let called = r.called_numbers().len();
        assert!(r.draw(conn(HOST)).unwrap().is_empty());
        assert_eq!(r.called_numbers().len(), called);
    }

    #[test]
    fn test_host_cannot_ban_itself() {
        let mut r = room();
        assert!(matches!(
            r.ban(conn(HOST), &cid("host"), &cid("host")),
            Err(RoomError::InvalidState(_))
        ));
    }

    #[test]
    fn test_ban_unknown_target() {
        let mut r = room();
        assert!(matches!(
            r.ban(conn(HOST), &cid("host"), &cid("ghost")),
            Err(RoomError::NotFound(_))
        ));
    }

    #[test]
    fn test_ban_purges_chat_and_notifies() {
        let mut r = room();
        r.join(conn(2), "Ana", &cid("p1")).unwrap();
        r.join(conn(3), "Bo", &cid("p2")).unwrap();
        let now = Instant::now();
        r.chat(conn(2), &cid("p1"), "spam", now).unwrap();
        r.chat(conn(3), &cid("p2"), "hello", now).unwrap();

        let out = r.ban(conn(HOST), &cid("host"), &cid("p1")).unwrap();
        assert_eq!(out[0], (Recipient::Connection(conn(2)), ServerEvent::BannedNotice));
        match &out[1].1 {
            ServerEvent::ChatHistoryReplaced { history } => {
                let texts: Vec<&str> = history.iter().map(|m| m.text.as_str()).collect();
                assert_eq!(texts, vec!["hello", "Ana was banned by the host"]);
                assert!(history[1].is_system);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(out[2].1, ServerEvent::PlayerCountUpdated { count: 1 });
        assert!(matches!(out[3], (Recipient::Host, ServerEvent::HostUpdate { .. })));
        assert_eq!(r.player_count(), 1);
    }

    // =====================================================================
    // Marking and claims
    // =====================================================================

    #[test]
    fn test_mark_requires_called_number() {
        let mut r = room();
        r.join(conn(2), "Ana", &cid("p1")).unwrap();
        let n = card_of(&r, "p1").cell(0, 0);
        assert!(matches!(
            r.mark(conn(2), &cid("p1"), n, true),
            Err(RoomError::InvalidState(_))
        ));
        assert!(r.mark(conn(2), &cid("p1"), FREE_SPACE, true).is_ok());
    }

    #[test]
    fn test_unmark_keeps_free_space() {
        let mut r = room();
        r.join(conn(2), "Ana", &cid("p1")).unwrap();
        r.mark(conn(2), &cid("p1"), FREE_SPACE, false).unwrap();
        assert!(r.player(&cid("p1")).unwrap().marked.contains(&FREE_SPACE));
    }

    #[test]
    fn test_mark_from_stale_connection_is_rejected() {
        let mut r = room();
        r.join(conn(2), "Ana", &cid("p1")).unwrap();
        r.reconnect(conn(3), &cid("p1")).unwrap();
        assert!(matches!(
            r.mark(conn(2), &cid("p1"), FREE_SPACE, true),
            Err(RoomError::NotFound(_))
        ));
    }

    #[test]
    fn test_claim_without_line_is_rejected() {
        let mut r = room();
        r.join(conn(2), "Ana", &cid("p1")).unwrap();
        assert!(matches!(r.claim(conn(2), &cid("p1")), Err(RoomError::InvalidClaim)));
        assert_eq!(r.winner(), None);
    }

    #[test]
    fn test_first_valid_claim_wins_once() {
        let mut r = room();
        r.join(conn(2), "Ana", &cid("p1")).unwrap();
        r.join(conn(3), "Bo", &cid("p2")).unwrap();
        for n in draw_top_row(&mut r, "p1") {
            r.mark(conn(2), &cid("p1"), n, true).unwrap();
        }

        let out = r.claim(conn(2), &cid("p1")).unwrap();
        assert_eq!(
            out,
            vec![(
                Recipient::Room,
                ServerEvent::GameOver {
                    winner: "Ana".into()
                }
            )]
        );
        assert!(matches!(r.claim(conn(2), &cid("p1")), Err(RoomError::GameOver)));
        assert!(matches!(r.claim(conn(3), &cid("p2")), Err(RoomError::GameOver)));
        assert_eq!(r.winner(), Some("Ana"));
    }

    #[test]
    fn test_leaderboard_orders_by_distance_then_join_order() {
        let config = RoomConfig {
            leaderboard_size: 3,
            ..RoomConfig::default()
        };
        let mut r = room_with(config);
        r.join(conn(2), "Ana", &cid("p1")).unwrap();
        r.join(conn(3), "Bo", &cid("p2")).unwrap();
        r.join(conn(4), "Cy", &cid("p3")).unwrap();
        r.join(conn(5), "Di", &cid("p4")).unwrap();

        for n in draw_top_row(&mut r, "p3") {
            r.mark(conn(4), &cid("p3"), n, true).unwrap();
        }

        let ServerEvent::HostUpdate {
            top_players,
            called_numbers,
        } = r.leaderboard()
        else {
            panic!("expected host update");
        };
        assert_eq!(called_numbers, r.called_numbers());
        assert_eq!(top_players.len(), 3);
        assert_eq!(top_players[0].name, "Cy");
        assert_eq!(top_players[0].to_go, 0);

        let join_index = |id: &ClientId| r.players.iter().position(|p| p.client_id == *id);
        for pair in top_players.windows(2) {
            assert!(pair[0].to_go <= pair[1].to_go);
            if pair[0].to_go == pair[1].to_go {
                assert!(join_index(&pair[0].client_id) < join_index(&pair[1].client_id));
            }
        }
    }

    #[test]
    fn test_host_cannot_act_as_player() {
        let mut r = room();
        assert!(matches!(
            r.claim(conn(HOST), &cid("host")),
            Err(RoomError::InvalidState(_))
        ));
        assert!(matches!(
            r.join(conn(HOST), "Host", &cid("host")),
            Err(RoomError::InvalidState(_))
        ));
    }

    // =====================================================================
    // Votes
    // =====================================================================

    #[test]
    fn test_vote_cycle_draws_biased_number() {
        let mut r = room();
        r.join(conn(2), "Ana", &cid("p1")).unwrap();
        r.join(conn(3), "Bo", &cid("p2")).unwrap();
        let (epoch, _) = r.start_vote(conn(HOST)).unwrap();
        r.submit_vote(conn(2), &cid("p1"), Letter::O).unwrap();
        r.submit_vote(conn(3), &cid("p2"), Letter::O).unwrap();

        let out = r.resolve_vote(epoch);
        assert_eq!(
            out[0],
            (
                Recipient::Room,
                ServerEvent::VoteEnded {
                    letter: Some(Letter::O)
                }
            )
        );
        match &out[1].1 {
            ServerEvent::NumberDrawn { number, .. } => {
                assert!(Letter::O.range().contains(number));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_zero_vote_resolution_draws_one_number() {
        let mut r = room();
        let (epoch, _) = r.start_vote(conn(HOST)).unwrap();
        let out = r.resolve_vote(epoch);
        assert_eq!(out[0].1, ServerEvent::VoteEnded { letter: None });
        assert_eq!(r.called_numbers().len(), 1);
        assert!(r.resolve_vote(epoch).is_empty());
        assert_eq!(r.called_numbers().len(), 1);
    }

    #[test]
    fn test_vote_deadline_uses_configured_duration() {
        let config = RoomConfig {
            vote_duration: Duration::from_secs(45),
            ..RoomConfig::default()
        };
        let mut r = room_with(config);
        let before = unix_millis_after(Duration::ZERO);
        r.start_vote(conn(HOST)).unwrap();
        assert!(r.vote().deadline_ms() >= before + 44_000);
    }

    // =====================================================================
    // Chat
    // =====================================================================

    #[test]
    fn test_chat_labels_host_and_players() {
        let mut r = room();
        r.join(conn(2), "Ana", &cid("p1")).unwrap();
        let now = Instant::now();
        r.chat(conn(HOST), &cid("host"), "welcome", now).unwrap();
        r.chat(conn(2), &cid("p1"), "thanks", now).unwrap();

        let history = r.chat_history();
        assert_eq!(history[0].sender_label, "Host");
        assert!(history[0].is_host);
        assert_eq!(history[1].sender_label, "Ana");
        assert!(!history[1].is_host);
    }

    #[test]
    fn test_chat_masks_blocked_terms() {
        let config = RoomConfig {
            blocked_terms: vec!["heck".into()],
            ..RoomConfig::default()
        };
        let mut r = room_with(config);
        r.join(conn(2), "Ana", &cid("p1")).unwrap();
        let out = r.chat(conn(2), &cid("p1"), "what the HECK", Instant::now()).unwrap();
        match &out[0].1 {
            ServerEvent::ChatMessage { message } => assert_eq!(message.text, "what the ****"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
