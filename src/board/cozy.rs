use cozy_chess::{Board as CozyBoard, Color, File, Move, Piece, Square};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PositionError {
    #[error("FEN error: {0}")]
    Fen(String),
    #[error("illegal move: {0}")]
    IllegalMove(String),
}

/// The `Move` token did not match UCI syntax.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("not a UCI move: {0:?}")]
pub struct NotationError(pub String);

/// How a finished game ended, as far as the board alone can tell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Checkmate { winner: Color },
    Stalemate,
    InsufficientMaterial,
    SeventyFiveMoveRule,
    FivefoldRepetition,
}

#[derive(Clone, Debug)]
pub struct Position {
    board: CozyBoard,
    // cozy-chess saturates its own clock at 100 plies; we need 150.
    halfmove_clock: u32,
    keys: Vec<u64>,
}

impl Default for Position {
    fn default() -> Self { Self::startpos() }
}

impl Position {
    pub fn startpos() -> Self {
        Self::from_board(CozyBoard::default())
    }

    pub fn from_fen(fen: &str) -> Result<Self, PositionError> {
        CozyBoard::from_fen(fen, false).map(Self::from_board).map_err(|e| PositionError::Fen(format!("{e:?}")))
    }

    fn from_board(board: CozyBoard) -> Self {
        let halfmove_clock = board.halfmove_clock() as u32;
        let keys = vec![board.hash()];
        Self { board, halfmove_clock, keys }
    }

    pub fn board(&self) -> &CozyBoard { &self.board }

    pub fn fen(&self) -> String { format!("{}", self.board) }

    pub fn side_to_move(&self) -> Color { self.board.side_to_move() }

    pub fn halfmove_clock(&self) -> u32 { self.halfmove_clock }

    pub fn legal_moves(&self) -> Vec<Move> {
        let mut out = Vec::new();
        self.board.generate_moves(|moves| { out.extend(moves); false });
        out
    }

    /// Legal moves as UCI tokens, castling written as the king's two-square step.
    pub fn legal_tokens(&self) -> Vec<String> {
        self.legal_moves().into_iter().map(|m| self.uci_token(m)).collect()
    }

    pub fn uci_token(&self, mv: Move) -> String {
        format!("{}", self.standard_form(mv))
    }

    /// Parses a UCI token into the engine's move type. Only syntax is checked here;
    /// use `is_legal` for the rules.
    pub fn parse_token(&self, token: &str) -> Result<Move, NotationError> {
        let mv: Move = token.parse().map_err(|_| NotationError(token.to_string()))?;
        Ok(self.from_standard(mv))
    }

    pub fn is_legal(&self, mv: Move) -> bool { self.board.is_legal(mv) }

    /// Plays `mv`, which must be legal in the current position.
    pub fn apply(&mut self, mv: Move) -> Result<(), PositionError> {
        if !self.board.is_legal(mv) {
            return Err(PositionError::IllegalMove(self.uci_token(mv)));
        }
        let stm = self.board.side_to_move();
        let resets_clock = self.board.piece_on(mv.from) == Some(Piece::Pawn)
            || self.board.color_on(mv.to) == Some(!stm);
        self.board.play_unchecked(mv);
        if resets_clock { self.halfmove_clock = 0; } else { self.halfmove_clock += 1; }
        self.keys.push(self.board.hash());
        Ok(())
    }

    pub fn make_move_uci(&mut self, mv_uci: &str) -> Result<(), PositionError> {
        let mv = self.parse_token(mv_uci).map_err(|_| PositionError::IllegalMove(mv_uci.to_string()))?;
        self.apply(mv)
    }

    pub fn set_from_start_and_moves(moves: &[String]) -> Result<Self, PositionError> {
        let mut pos = Self::startpos();
        for m in moves { pos.make_move_uci(m)?; }
        Ok(pos)
    }

    fn has_legal_move(&self) -> bool {
        let mut any = false;
        self.board.generate_moves(|moves| { any = !moves.is_empty(); any });
        any
    }

    fn in_check(&self) -> bool { !self.board.checkers().is_empty() }

    pub fn is_checkmate(&self) -> bool { self.in_check() && !self.has_legal_move() }

    pub fn is_stalemate(&self) -> bool { !self.in_check() && !self.has_legal_move() }

    pub fn is_insufficient_material(&self) -> bool {
        self.has_insufficient_material(Color::White) && self.has_insufficient_material(Color::Black)
    }

    /// Whether `color` can no longer deliver mate by any sequence of legal moves.
    pub fn has_insufficient_material(&self, color: Color) -> bool {
        let b = &self.board;
        let ours = b.colors(color);
        let heavy = b.pieces(Piece::Pawn) | b.pieces(Piece::Rook) | b.pieces(Piece::Queen);
        if !(ours & heavy).is_empty() { return false; }
        if !(ours & b.pieces(Piece::Knight)).is_empty() {
            // A lone knight can only mate with help from enemy blockers.
            let theirs = b.colors(!color);
            let blockers = theirs & !b.pieces(Piece::King) & !b.pieces(Piece::Queen);
            return ours.len() <= 2 && blockers.is_empty();
        }
        let bishops = b.pieces(Piece::Bishop);
        if !(ours & bishops).is_empty() {
            let mut dark = false;
            let mut light = false;
            for sq in bishops {
                if is_dark(sq) { dark = true; } else { light = true; }
            }
            return !(dark && light) && b.pieces(Piece::Pawn).is_empty() && b.pieces(Piece::Knight).is_empty();
        }
        true
    }

    pub fn is_seventyfive_moves(&self) -> bool {
        self.halfmove_clock >= 150 && !self.is_checkmate()
    }

    pub fn is_fivefold_repetition(&self) -> bool {
        let Some(&current) = self.keys.last() else { return false };
        self.keys.iter().filter(|&&k| k == current).count() >= 5
    }

    pub fn outcome(&self) -> Option<Outcome> {
        if self.is_checkmate() {
            return Some(Outcome::Checkmate { winner: !self.side_to_move() });
        }
        if self.is_stalemate() { return Some(Outcome::Stalemate); }
        if self.is_insufficient_material() { return Some(Outcome::InsufficientMaterial); }
        if self.is_seventyfive_moves() { return Some(Outcome::SeventyFiveMoveRule); }
        if self.is_fivefold_repetition() { return Some(Outcome::FivefoldRepetition); }
        None
    }

    pub fn is_game_over(&self) -> bool { self.outcome().is_some() }

    /// `mv` with castling rewritten from cozy-chess's king-takes-own-rook form to the
    /// king's destination square. Must be called before `mv` is played.
    pub fn standard_form(&self, mv: Move) -> Move {
        let stm = self.board.side_to_move();
        if self.board.piece_on(mv.from) == Some(Piece::King) && self.board.color_on(mv.to) == Some(stm) {
            let file = if (mv.to.file() as u8) > (mv.from.file() as u8) { File::G } else { File::C };
            return Move { from: mv.from, to: Square::new(file, mv.from.rank()), promotion: None };
        }
        mv
    }

    fn from_standard(&self, mv: Move) -> Move {
        let stm = self.board.side_to_move();
        let own_king = self.board.piece_on(mv.from) == Some(Piece::King) && self.board.color_on(mv.from) == Some(stm);
        let step = mv.to.file() as i32 - mv.from.file() as i32;
        if !own_king || mv.to.rank() != mv.from.rank() || step.abs() != 2 || mv.promotion.is_some() {
            return mv;
        }
        let rook_file = if step > 0 { File::H } else { File::A };
        let castle = Move { from: mv.from, to: Square::new(rook_file, mv.from.rank()), promotion: None };
        if self.board.is_legal(castle) { castle } else { mv }
    }
}

pub(crate) fn is_dark(sq: Square) -> bool {
    (sq.file() as usize + sq.rank() as usize) % 2 == 0
}
