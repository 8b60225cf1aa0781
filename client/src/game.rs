use log::debug;
use shared::{AppliedMove, Board, Color, FenError, Outcome, ServerMessage};

/// Where the client is in the server's lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Connecting,
    Queued(usize),
    Playing,
    Finished(Outcome),
}

/// Local view of the game, rebuilt from server messages
///
/// The client never applies moves itself. Every position shown comes from a
/// `board_update` sent by the server.
#[derive(Debug, Clone)]
pub struct ClientGameState {
    pub phase: Phase,
    pub color: Option<Color>,
    pub opponent: Option<String>,
    pub board: Option<Board>,
    pub last_move: Option<AppliedMove>,
    pub check: bool,
}

impl ClientGameState {
    pub fn new() -> Self {
        Self {
            phase: Phase::Connecting,
            color: None,
            opponent: None,
            board: None,
            last_move: None,
            check: false,
        }
    }

    /// Updates the view and returns a line worth telling the player, if any
    pub fn apply(&mut self, message: ServerMessage) -> Result<Option<String>, FenError> {
        let notice = match message {
            ServerMessage::Welcome => Some("Connected to the chess server".to_string()),
            ServerMessage::Queued { position } => {
                self.phase = Phase::Queued(position);
                Some(format!(
                    "Waiting for an opponent (position {} in queue)",
                    position
                ))
            }
            ServerMessage::Paired { opponent, color } => {
                let notice = format!("Game on! You play {} against {}", color, opponent);
                self.phase = Phase::Playing;
                self.color = Some(color);
                self.opponent = Some(opponent);
                self.board = None;
                self.last_move = None;
                self.check = false;
                Some(notice)
            }
            ServerMessage::BoardUpdate {
                fen,
                last_move,
                side_to_move,
                check,
            } => {
                let board = Board::from_fen(&fen)?;
                if board.side_to_move != side_to_move {
                    debug!("Side to move {} disagrees with FEN {}", side_to_move, fen);
                }
                self.board = Some(board);
                self.last_move = last_move;
                self.check = check;
                None
            }
            ServerMessage::IllegalMove { reason } => Some(format!("Illegal move: {}", reason)),
            ServerMessage::GameOver { outcome } => {
                self.phase = Phase::Finished(outcome);
                Some(format!("Game over: {}", outcome.describe()))
            }
            ServerMessage::Chat { from, text } => Some(format!("<{}> {}", from, text)),
            ServerMessage::Error { message } => Some(format!("Server error: {}", message)),
        };
        Ok(notice)
    }

    pub fn is_playing(&self) -> bool {
        self.phase == Phase::Playing
    }

    pub fn is_my_turn(&self) -> bool {
        match (&self.board, self.color) {
            (Some(board), Some(color)) => self.is_playing() && board.side_to_move == color,
            _ => false,
        }
    }
}

impl Default for ClientGameState {
    fn default() -> Self {
        Self::new()
    }
}
