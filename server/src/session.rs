//! A single game between two paired players
//!
//! Each match runs as its own task and owns everything about the game:
//! - The authoritative board and the list of applied moves
//! - The lifecycle state (whose turn it is, or how the game ended)
//! - The outbound queues of both players
//!
//! Connection tasks never touch the board. They forward [`SessionCommand`]s
//! over a channel and the session processes them one at a time, so every
//! move is validated against the position the previous move left behind.

use crate::pairing::{SessionLink, WaitingPlayer};
use log::{debug, info};
use shared::rules::{self, GameStatus};
use shared::{AppliedMove, Board, Color, Move, Outcome, ServerMessage};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Something a seated player asked the session to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Move { color: Color, mv: Move },
    Resign { color: Color },
    Chat { color: Color, text: String },
    /// The player's connection closed or broke the protocol
    Disconnect { color: Color },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawReason {
    FiftyMove,
    InsufficientMaterial,
}

/// Where a match is in its lifecycle
///
/// Every state except `AwaitingMove` is terminal: once reached, further
/// commands are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingMove(Color),
    Checkmate { winner: Color },
    Stalemate,
    Drawn(DrawReason),
    Resigned(Color),
    ForfeitedByDisconnect(Color),
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, SessionState::AwaitingMove(_))
    }

    /// The result as reported to the player of `color`
    ///
    /// `None` while the game is running, and for a player who forfeited by
    /// leaving since nobody is there to read it.
    pub fn outcome_for(self, color: Color) -> Option<Outcome> {
        match self {
            SessionState::AwaitingMove(_) => None,
            SessionState::Checkmate { winner } if winner == color => Some(Outcome::CheckmateWin),
            SessionState::Checkmate { .. } => Some(Outcome::CheckmateLoss),
            SessionState::Stalemate => Some(Outcome::StalemateDraw),
            SessionState::Drawn(DrawReason::FiftyMove) => Some(Outcome::DrawFiftyMove),
            SessionState::Drawn(DrawReason::InsufficientMaterial) => {
                Some(Outcome::DrawInsufficientMaterial)
            }
            SessionState::Resigned(loser) if loser == color => Some(Outcome::ResignLoss),
            SessionState::Resigned(_) => Some(Outcome::ResignWin),
            SessionState::ForfeitedByDisconnect(loser) if loser == color => None,
            SessionState::ForfeitedByDisconnect(_) => Some(Outcome::OpponentDisconnectedWin),
        }
    }
}

/// One side of the board: who sits there and how to reach them
#[derive(Debug)]
pub struct Seat {
    pub name: String,
    pub outbox: mpsc::UnboundedSender<ServerMessage>,
}

pub struct MatchSession {
    id: u64,
    white: Seat,
    black: Seat,
    board: Board,
    history: Vec<AppliedMove>,
    state: SessionState,
    /// A seat whose outbox turned out to be closed while delivering
    dropped: Option<Color>,
}

impl MatchSession {
    pub fn new(id: u64, white: Seat, black: Seat) -> Self {
        Self::with_board(id, white, black, Board::initial_standard())
    }

    /// Starts the match from an arbitrary position instead of the standard one
    pub fn with_board(id: u64, white: Seat, black: Seat, board: Board) -> Self {
        let state = SessionState::AwaitingMove(board.side_to_move);
        Self {
            id,
            white,
            black,
            board,
            history: Vec::new(),
            state,
            dropped: None,
        }
    }

    /// Seats two players who just left the queue and spawns the match task
    ///
    /// The first player plays white. Each player's connection task receives
    /// a [`SessionLink`] through its oneshot. A player whose connection task
    /// is already gone forfeits immediately.
    pub fn start(id: u64, white: WaitingPlayer, black: WaitingPlayer) -> JoinHandle<()> {
        let (commands, receiver) = mpsc::unbounded_channel();

        info!(
            "Match {}: {} (white) vs {} (black)",
            id, white.name, black.name
        );

        let mut session = MatchSession::new(
            id,
            Seat {
                name: white.name,
                outbox: white.outbox,
            },
            Seat {
                name: black.name,
                outbox: black.outbox,
            },
        );
        session.open();

        for (color, link) in [(Color::White, white.link), (Color::Black, black.link)] {
            let handed_over = link
                .send(SessionLink {
                    match_id: id,
                    color,
                    commands: commands.clone(),
                })
                .is_ok();
            if !handed_over {
                session.handle(SessionCommand::Disconnect { color });
            }
        }
        // Only the connection tasks keep the command channel open
        drop(commands);

        tokio::spawn(session.run(receiver))
    }

    /// Announces the pairing and sends both players the starting position
    pub fn open(&mut self) {
        let white_name = self.white.name.clone();
        let black_name = self.black.name.clone();
        self.deliver(
            Color::White,
            ServerMessage::Paired {
                opponent: black_name,
                color: Color::White,
            },
        );
        self.deliver(
            Color::Black,
            ServerMessage::Paired {
                opponent: white_name,
                color: Color::Black,
            },
        );

        let status = rules::game_status(&self.board);
        self.broadcast(self.board_update(None, status));
        self.settle_dropped();
    }

    /// Processes commands until the game ends or both players are gone
    pub async fn run(mut self, mut commands: mpsc::UnboundedReceiver<SessionCommand>) {
        while !self.state.is_terminal() {
            match commands.recv().await {
                Some(command) => self.handle(command),
                None => {
                    debug!("Match {}: every connection went away", self.id);
                    break;
                }
            }
        }

        info!(
            "Match {} finished: {:?} after {} moves",
            self.id,
            self.state,
            self.history.len()
        );
        // Dropping the seats closes both outboxes, which ends the connections
    }

    /// Applies one command to the match
    ///
    /// Commands that arrive after the game ended are ignored.
    pub fn handle(&mut self, command: SessionCommand) {
        if self.state.is_terminal() {
            debug!("Match {}: ignoring {:?} after game end", self.id, command);
            return;
        }

        match command {
            SessionCommand::Move { color, mv } => self.handle_move(color, mv),
            SessionCommand::Resign { color } => {
                info!("[{}] resigned", self.seat(color).name);
                self.finish(SessionState::Resigned(color));
            }
            SessionCommand::Chat { color, text } => {
                let from = self.seat(color).name.clone();
                self.deliver(color.opposite(), ServerMessage::Chat { from, text });
            }
            SessionCommand::Disconnect { color } => {
                info!("[{}] left the game", self.seat(color).name);
                self.finish(SessionState::ForfeitedByDisconnect(color));
            }
        }

        self.settle_dropped();
    }

    fn handle_move(&mut self, color: Color, mv: Move) {
        let applied = match rules::validate(&self.board, &mv, color) {
            Ok(applied) => applied,
            Err(reason) => {
                info!("[{}] {} rejected ({:?})", self.seat(color).name, mv, reason);
                self.deliver(color, ServerMessage::IllegalMove { reason });
                return;
            }
        };

        self.board.apply_move(&applied.mv);
        self.history.push(applied);
        info!("[{}] {} accepted", self.seat(color).name, applied.mv);

        let status = rules::game_status(&self.board);
        self.broadcast(self.board_update(Some(applied), status));

        match status {
            GameStatus::Checkmate => self.finish(SessionState::Checkmate { winner: color }),
            GameStatus::Stalemate => self.finish(SessionState::Stalemate),
            GameStatus::DrawFiftyMove => self.finish(SessionState::Drawn(DrawReason::FiftyMove)),
            GameStatus::DrawInsufficientMaterial => {
                self.finish(SessionState::Drawn(DrawReason::InsufficientMaterial))
            }
            GameStatus::Ongoing | GameStatus::Check => {
                self.state = SessionState::AwaitingMove(self.board.side_to_move);
            }
        }
    }

    fn finish(&mut self, state: SessionState) {
        self.state = state;
        for color in [Color::White, Color::Black] {
            if let Some(outcome) = state.outcome_for(color) {
                self.deliver(color, ServerMessage::GameOver { outcome });
            }
        }
    }

    /// A closed outbox means that player's connection is gone
    fn settle_dropped(&mut self) {
        if let Some(color) = self.dropped.take() {
            if !self.state.is_terminal() {
                info!("[{}] connection lost", self.seat(color).name);
                self.finish(SessionState::ForfeitedByDisconnect(color));
            }
        }
    }

    fn board_update(&self, last_move: Option<AppliedMove>, status: GameStatus) -> ServerMessage {
        ServerMessage::BoardUpdate {
            fen: self.board.to_fen(),
            last_move,
            side_to_move: self.board.side_to_move,
            check: matches!(status, GameStatus::Check | GameStatus::Checkmate),
        }
    }

    fn broadcast(&mut self, message: ServerMessage) {
        self.deliver(Color::White, message.clone());
        self.deliver(Color::Black, message);
    }

    fn deliver(&mut self, color: Color, message: ServerMessage) {
        if self.seat(color).outbox.send(message).is_err() && self.dropped.is_none() {
            self.dropped = Some(color);
        }
    }

    fn seat(&self, color: Color) -> &Seat {
        match color {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn history(&self) -> &[AppliedMove] {
        &self.history
    }
}
