//! Standalone SVG snapshots of a position, drawn from white's side.

use std::fmt::Write;

use cozy_chess::{Color, Move, Piece, Square};

use super::cozy::{is_dark, Position};

pub const DEFAULT_SIZE: u32 = 400;

const LIGHT: &str = "#ffce9e";
const DARK: &str = "#d18b47";
const MARGIN_FILL: &str = "#212121";
const COORD_FILL: &str = "#e5e5e5";
const HIGHLIGHT_FILL: &str = "gray";
const ARROW_STROKE: &str = "#15781b";

fn glyph(piece: Piece, color: Color) -> char {
    match (color, piece) {
        (Color::White, Piece::King) => '\u{2654}',
        (Color::White, Piece::Queen) => '\u{2655}',
        (Color::White, Piece::Rook) => '\u{2656}',
        (Color::White, Piece::Bishop) => '\u{2657}',
        (Color::White, Piece::Knight) => '\u{2658}',
        (Color::White, Piece::Pawn) => '\u{2659}',
        (Color::Black, Piece::King) => '\u{265a}',
        (Color::Black, Piece::Queen) => '\u{265b}',
        (Color::Black, Piece::Rook) => '\u{265c}',
        (Color::Black, Piece::Bishop) => '\u{265d}',
        (Color::Black, Piece::Knight) => '\u{265e}',
        (Color::Black, Piece::Pawn) => '\u{265f}',
    }
}

struct Geometry {
    margin: f32,
    square: f32,
}

impl Geometry {
    fn new(size: u32) -> Self {
        let size = size.max(80) as f32;
        let margin = size / 20.0;
        Self { margin, square: (size - 2.0 * margin) / 8.0 }
    }

    fn origin(&self, sq: Square) -> (f32, f32) {
        let x = self.margin + sq.file() as usize as f32 * self.square;
        let y = self.margin + (7 - sq.rank() as usize) as f32 * self.square;
        (x, y)
    }

    fn center(&self, sq: Square) -> (f32, f32) {
        let (x, y) = self.origin(sq);
        (x + self.square / 2.0, y + self.square / 2.0)
    }
}

/// Renders `pos` as an SVG document `size` pixels wide. When `highlight` is given (a move
/// that was just played, in UCI orientation), its source square is filled and an arrow is
/// drawn to its destination.
pub fn render(pos: &Position, highlight: Option<Move>, size: u32) -> String {
    let g = Geometry::new(size);
    let total = g.margin * 2.0 + g.square * 8.0;
    let mut out = String::with_capacity(16 * 1024);
    // Writing into a String cannot fail.
    let _ = write_document(&mut out, pos, highlight, &g, total);
    out
}

fn write_document(out: &mut String, pos: &Position, highlight: Option<Move>, g: &Geometry, total: f32) -> std::fmt::Result {
    write!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" version="1.2" viewBox="0 0 {total:.1} {total:.1}" width="{total:.0}" height="{total:.0}">"#
    )?;
    write!(
        out,
        r#"<defs><marker id="arrowhead" viewBox="0 0 10 10" refX="5" refY="5" markerWidth="3" markerHeight="3" orient="auto-start-reverse"><path d="M0,0 L10,5 L0,10 z" fill="{ARROW_STROKE}"/></marker></defs>"#
    )?;
    write!(out, r#"<rect x="0" y="0" width="{total:.1}" height="{total:.1}" fill="{MARGIN_FILL}"/>"#)?;

    for sq in Square::ALL {
        let (x, y) = g.origin(sq);
        let fill = if is_dark(sq) { DARK } else { LIGHT };
        write!(out, r#"<rect x="{x:.1}" y="{y:.1}" width="{s:.1}" height="{s:.1}" fill="{fill}"/>"#, s = g.square)?;
        if highlight.map(|m| m.from) == Some(sq) {
            write!(
                out,
                r#"<rect x="{x:.1}" y="{y:.1}" width="{s:.1}" height="{s:.1}" fill="{HIGHLIGHT_FILL}" fill-opacity="0.6"/>"#,
                s = g.square
            )?;
        }
    }

    write_coordinates(out, g, total)?;

    let board = pos.board();
    let font = g.square * 0.8;
    for sq in board.occupied() {
        let (Some(piece), Some(color)) = (board.piece_on(sq), board.color_on(sq)) else { continue };
        let (cx, cy) = g.center(sq);
        write!(
            out,
            r#"<text x="{cx:.1}" y="{cy:.1}" font-size="{font:.1}" text-anchor="middle" dominant-baseline="central" fill="black">{}</text>"#,
            glyph(piece, color)
        )?;
    }

    if let Some(mv) = highlight {
        let (x1, y1) = g.center(mv.from);
        let (x2, y2) = g.center(mv.to);
        write!(
            out,
            r#"<line x1="{x1:.1}" y1="{y1:.1}" x2="{x2:.1}" y2="{y2:.1}" stroke="{ARROW_STROKE}" stroke-width="{w:.1}" stroke-opacity="0.8" stroke-linecap="round" marker-end="url(#arrowhead)"/>"#,
            w = g.square * 0.15
        )?;
    }

    out.push_str("</svg>");
    Ok(())
}

fn write_coordinates(out: &mut String, g: &Geometry, total: f32) -> std::fmt::Result {
    let font = g.margin * 0.8;
    for i in 0..8u8 {
        let file = (b'a' + i) as char;
        let x = g.margin + (i as f32 + 0.5) * g.square;
        for y in [g.margin / 2.0, total - g.margin / 2.0] {
            write!(
                out,
                r#"<text x="{x:.1}" y="{y:.1}" font-size="{font:.1}" text-anchor="middle" dominant-baseline="central" fill="{COORD_FILL}">{file}</text>"#
            )?;
        }
    }
    for i in 0..8u8 {
        let rank = i + 1;
        let y = g.margin + (7 - i) as f32 * g.square + g.square / 2.0;
        for x in [g.margin / 2.0, total - g.margin / 2.0] {
            write!(
                out,
                r#"<text x="{x:.1}" y="{y:.1}" font-size="{font:.1}" text-anchor="middle" dominant-baseline="central" fill="{COORD_FILL}">{rank}</text>"#
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startpos_has_all_pieces_and_no_arrow() {
        let svg = render(&Position::startpos(), None, DEFAULT_SIZE);
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert_eq!(svg.matches("<text").count(), 32 + 32, "32 pieces plus 32 coordinate labels");
        assert!(!svg.contains("<line"));
    }

    #[test]
    fn highlight_fills_source_and_draws_arrow() {
        let mut pos = Position::startpos();
        let mv = pos.parse_token("e2e4").unwrap();
        pos.apply(mv).unwrap();
        let svg = render(&pos, Some(mv), DEFAULT_SIZE);
        assert_eq!(svg.matches(HIGHLIGHT_FILL).count(), 1);
        assert_eq!(svg.matches("<line").count(), 1);
    }

    #[test]
    fn square_geometry_puts_a1_bottom_left() {
        let g = Geometry::new(400);
        let a1 = g.origin(Square::A1);
        let h8 = g.origin(Square::H8);
        assert!(a1.0 < h8.0);
        assert!(a1.1 > h8.1);
    }
}
