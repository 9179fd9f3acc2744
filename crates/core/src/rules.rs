//! Seam to the chess rules library.
//!
//! The engine never judges whether a move is the *right* move; it only asks the
//! rules engine whether a move is *legal* and what the board looks like after
//! it. [`ShakmatyRules`] is the production implementation.

use serde::{Deserialize, Serialize};
use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, Chess, EnPassantMode, File, Move, Position, Role, Square};
use thiserror::Error;

pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
pub const EMPTY_FEN: &str = "8/8/8/8/8/8/8/8 w - - 0 1";

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PositionParseError {
    #[error("unreadable position description: {0}")]
    Syntax(String),

    #[error("position is not playable: {0}")]
    Illegal(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IllegalMove {
    #[error("not a square: {0}")]
    BadSquare(String),

    #[error("unknown promotion piece: {0}")]
    BadPromotion(char),

    #[error("current board cannot be read")]
    UnreadableBoard,

    #[error("no piece on {0}")]
    EmptySquare(String),

    #[error("{0} is not a legal move here")]
    NotLegal(String),
}

//
// ─── VALUES ────────────────────────────────────────────────────────────────────
//

/// A board state as the engine sees it: a position description plus whether
/// it is a custom (not necessarily legal) setup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardPosition {
    description: String,
    custom: bool,
}

impl BoardPosition {
    #[must_use]
    pub fn standard(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            custom: false,
        }
    }

    #[must_use]
    pub fn custom(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            custom: true,
        }
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Custom boards skip legality checks; moves only relocate pieces.
    #[must_use]
    pub fn is_custom(&self) -> bool {
        self.custom
    }
}

/// A move as entered by the player: origin, destination, optional promotion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRequest {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub promotion: Option<char>,
}

impl MoveRequest {
    #[must_use]
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            promotion: None,
        }
    }

    #[must_use]
    pub fn with_promotion(mut self, piece: char) -> Self {
        self.promotion = Some(piece);
        self
    }

    /// Parses compact notation such as `e2e4` or `e7e8q`.
    #[must_use]
    pub fn parse(notation: &str) -> Option<Self> {
        let notation = notation.trim();
        if !notation.is_ascii() || !(4..=5).contains(&notation.len()) {
            return None;
        }
        let request = Self::new(&notation[0..2], &notation[2..4]);
        Some(match notation.chars().nth(4) {
            Some(piece) => request.with_promotion(piece),
            None => request,
        })
    }

    /// Compact notation, lowercase, e.g. `e7e8q`.
    #[must_use]
    pub fn notation(&self) -> String {
        let mut out = format!(
            "{}{}",
            self.from.trim().to_ascii_lowercase(),
            self.to.trim().to_ascii_lowercase()
        );
        if let Some(piece) = self.promotion {
            out.push(piece.to_ascii_lowercase());
        }
        out
    }
}

/// Result of applying a move locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayedMove {
    pub notation: String,
    pub position: BoardPosition,
}

//
// ─── TRAIT ─────────────────────────────────────────────────────────────────────
//

/// Synchronous chess rules capability.
pub trait RulesEngine: Send + Sync {
    /// Parse a description into a legal, playable position.
    ///
    /// # Errors
    ///
    /// Returns `PositionParseError` if the description is unreadable or describes
    /// an illegal position.
    fn parse(&self, description: &str) -> Result<BoardPosition, PositionParseError>;

    /// Best-effort reading of a description as a custom setup; `None` if the
    /// text cannot be read at all.
    fn parse_custom(&self, description: &str) -> Option<BoardPosition>;

    /// Apply a legal move.
    ///
    /// # Errors
    ///
    /// Returns `IllegalMove` if the move is not legal on `board`.
    fn play(&self, board: &BoardPosition, request: &MoveRequest) -> Result<PlayedMove, IllegalMove>;

    /// Move a piece without legality checks (custom boards, free lessons).
    ///
    /// # Errors
    ///
    /// Returns `IllegalMove` if the squares are invalid or the origin is empty.
    fn relocate(
        &self,
        board: &BoardPosition,
        request: &MoveRequest,
    ) -> Result<PlayedMove, IllegalMove>;

    fn starting_position(&self) -> BoardPosition {
        BoardPosition::standard(STARTING_FEN)
    }

    fn empty_board(&self) -> BoardPosition {
        BoardPosition::custom(EMPTY_FEN)
    }
}

//
// ─── SHAKMATY ──────────────────────────────────────────────────────────────────
//

/// Standard chess rules backed by `shakmaty`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShakmatyRules;

impl ShakmatyRules {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn parse_square(raw: &str) -> Result<Square, IllegalMove> {
    raw.trim()
        .to_ascii_lowercase()
        .parse::<Square>()
        .map_err(|_| IllegalMove::BadSquare(raw.to_owned()))
}

fn parse_promotion(piece: Option<char>) -> Result<Option<Role>, IllegalMove> {
    piece
        .map(|c| Role::from_char(c.to_ascii_lowercase()).ok_or(IllegalMove::BadPromotion(c)))
        .transpose()
}

/// King destination of a castling move given as king + rook squares.
fn castle_king_target(king: Square, rook: Square) -> Square {
    let file = if rook > king { File::G } else { File::C };
    Square::from_coords(file, king.rank())
}

fn matches_request(m: &Move, from: Square, to: Square, promotion: Option<Role>) -> bool {
    match *m {
        Move::Castle { king, rook } => {
            king == from && (rook == to || castle_king_target(king, rook) == to)
        }
        _ => {
            m.from() == Some(from)
                && m.to() == to
                && match m.promotion() {
                    Some(role) => role == promotion.unwrap_or(Role::Queen),
                    None => promotion.is_none(),
                }
        }
    }
}

fn describe(pos: Chess) -> String {
    Fen::from_setup(pos.into_setup(EnPassantMode::Legal)).to_string()
}

impl RulesEngine for ShakmatyRules {
    fn parse(&self, description: &str) -> Result<BoardPosition, PositionParseError> {
        let fen: Fen = description
            .parse()
            .map_err(|e: shakmaty::fen::ParseFenError| PositionParseError::Syntax(e.to_string()))?;
        let pos: Chess = fen
            .into_position(CastlingMode::Standard)
            .map_err(|e| PositionParseError::Illegal(e.to_string()))?;
        Ok(BoardPosition::standard(describe(pos)))
    }

    fn parse_custom(&self, description: &str) -> Option<BoardPosition> {
        let fen: Fen = description.parse().ok()?;
        Some(BoardPosition::custom(fen.to_string()))
    }

    fn play(&self, board: &BoardPosition, request: &MoveRequest) -> Result<PlayedMove, IllegalMove> {
        let from = parse_square(&request.from)?;
        let to = parse_square(&request.to)?;
        let promotion = parse_promotion(request.promotion)?;

        let fen: Fen = board
            .description()
            .parse()
            .map_err(|_| IllegalMove::UnreadableBoard)?;
        let mut pos: Chess = fen
            .into_position(CastlingMode::Standard)
            .map_err(|_| IllegalMove::UnreadableBoard)?;

        let legal = pos.legal_moves();
        let mv = legal
            .iter()
            .find(|m| matches_request(m, from, to, promotion))
            .cloned()
            .ok_or_else(|| IllegalMove::NotLegal(request.notation()))?;

        let mut notation = format!("{from}{to}");
        if let Some(role) = mv.promotion() {
            notation.push(role.char());
        }

        pos.play_unchecked(&mv);
        Ok(PlayedMove {
            notation,
            position: BoardPosition::standard(describe(pos)),
        })
    }

    fn relocate(
        &self,
        board: &BoardPosition,
        request: &MoveRequest,
    ) -> Result<PlayedMove, IllegalMove> {
        let from = parse_square(&request.from)?;
        let to = parse_square(&request.to)?;

        let fen: Fen = board
            .description()
            .parse()
            .map_err(|_| IllegalMove::UnreadableBoard)?;
        let mut setup = fen.into_setup();
        let piece = setup
            .board
            .remove_piece_at(from)
            .ok_or_else(|| IllegalMove::EmptySquare(from.to_string()))?;
        setup.board.set_piece_at(to, piece);
        setup.turn = !setup.turn;
        setup.ep_square = None;

        Ok(PlayedMove {
            notation: format!("{from}{to}"),
            position: BoardPosition {
                description: Fen::from_setup(setup).to_string(),
                custom: board.is_custom(),
            },
        })
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
