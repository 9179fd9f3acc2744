//! Board Position Loader: turns a stage's position description into a board,
//! never failing.

use crate::rules::{BoardPosition, PositionParseError, RulesEngine};

/// How loud a loader notice should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeSeverity {
    Info,
    Error,
}

/// Classified outcome of a fallback while loading a position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PositionNotice {
    /// The description was not a legal position but the lesson allows that.
    CustomPosition,
    /// The description could not be used; the standard start was loaded.
    FallbackToStart { reason: PositionParseError },
}

impl PositionNotice {
    #[must_use]
    pub fn severity(&self) -> NoticeSeverity {
        match self {
            Self::CustomPosition => NoticeSeverity::Info,
            Self::FallbackToStart { .. } => NoticeSeverity::Error,
        }
    }

    #[must_use]
    pub fn message(&self) -> &'static str {
        match self {
            Self::CustomPosition => "custom position loaded",
            Self::FallbackToStart { .. } => "failed to load position, using starting position",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedPosition {
    pub board: BoardPosition,
    pub notice: Option<PositionNotice>,
}

/// Undo JSON-style escaping of `/` and trim.
#[must_use]
pub fn normalize_description(raw: &str) -> String {
    raw.replace("\\/", "/").trim().to_owned()
}

/// Load a board for a stage.
///
/// An empty description (or `startpos`) means the standard starting position.
/// Unusable descriptions fall back to a custom board when
/// `allow_invalid_position` is set, otherwise to the starting position.
#[must_use]
pub fn load_position(
    rules: &dyn RulesEngine,
    description: &str,
    allow_invalid_position: bool,
) -> LoadedPosition {
    let description = normalize_description(description);
    if description.is_empty() || description.eq_ignore_ascii_case("startpos") {
        return LoadedPosition {
            board: rules.starting_position(),
            notice: None,
        };
    }

    match rules.parse(&description) {
        Ok(board) => LoadedPosition {
            board,
            notice: None,
        },
        Err(_) if allow_invalid_position => LoadedPosition {
            board: rules
                .parse_custom(&description)
                .unwrap_or_else(|| rules.empty_board()),
            notice: Some(PositionNotice::CustomPosition),
        },
        Err(reason) => LoadedPosition {
            board: rules.starting_position(),
            notice: Some(PositionNotice::FallbackToStart { reason }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{EMPTY_FEN, STARTING_FEN, ShakmatyRules};

    const SCHOLARS_MATE_SETUP: &str =
        "r1bqkbnr/pppp1ppp/2n5/4p3/2B1P3/5Q2/PPPP1PPP/RNB1K1NR w KQkq - 4 4";

    #[test]
    fn loads_valid_position_without_notice() {
        let loaded = load_position(&ShakmatyRules, SCHOLARS_MATE_SETUP, false);
        assert_eq!(loaded.board.description(), SCHOLARS_MATE_SETUP);
        assert!(loaded.notice.is_none());
    }

    #[test]
    fn unescapes_path_separators() {
        let escaped = SCHOLARS_MATE_SETUP.replace('/', "\\/");
        let loaded = load_position(&ShakmatyRules, &escaped, false);
        assert_eq!(loaded.board.description(), SCHOLARS_MATE_SETUP);
    }

    #[test]
    fn empty_description_is_starting_position() {
        let loaded = load_position(&ShakmatyRules, "  ", false);
        assert_eq!(loaded.board.description(), STARTING_FEN);
        assert!(loaded.notice.is_none());
    }

    #[test]
    fn invalid_position_falls_back_to_start_with_error_notice() {
        let loaded = load_position(&ShakmatyRules, EMPTY_FEN, false);
        assert_eq!(loaded.board.description(), STARTING_FEN);
        let notice = loaded.notice.unwrap();
        assert_eq!(notice.severity(), NoticeSeverity::Error);
        assert_eq!(
            notice.message(),
            "failed to load position, using starting position"
        );
    }

    #[test]
    fn invalid_position_allowed_keeps_custom_placement() {
        let partial = "8/8/8/8/8/8/8/R7 w - - 0 1";
        let loaded = load_position(&ShakmatyRules, partial, true);
        assert!(loaded.board.is_custom());
        assert_eq!(loaded.board.description(), partial);
        assert_eq!(loaded.notice, Some(PositionNotice::CustomPosition));
        assert_eq!(loaded.notice.unwrap().severity(), NoticeSeverity::Info);
    }

    #[test]
    fn unreadable_description_allowed_gives_empty_board() {
        let loaded = load_position(&ShakmatyRules, "definitely not chess", true);
        assert!(loaded.board.is_custom());
        assert_eq!(loaded.board.description(), EMPTY_FEN);
    }
}
