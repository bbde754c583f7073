use cozy_chess::Color;

pub const LEGAL_MOVES_LABEL: &str = "Available legal moves are:";

pub fn agent_name(side: Color) -> &'static str {
    match side {
        Color::White => "Agent White",
        Color::Black => "Agent Black",
    }
}

pub fn side_name(side: Color) -> &'static str {
    match side {
        Color::White => "White",
        Color::Black => "Black",
    }
}

/// The per-turn instruction sent to a model. It embeds the position and every legal move
/// and asks for a single UCI move with no commentary.
pub fn build_prompt(agent: &str, fen: &str, legal: &[String]) -> String {
    format!(
        "You are a professional chess player ({agent}).\n\
         The board is currently:\n\
         FEN: {fen}\n\
         {LEGAL_MOVES_LABEL} {}\n\
         Reply with only one move in UCI format (e.g., e2e4). No explanation.\n",
        legal.join(", ")
    )
}

/// First whitespace-delimited word of the reply. Empty when the reply is blank.
pub fn extract_candidate(response: &str) -> &str {
    response.split_whitespace().next().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_lists_position_and_moves() {
        let p = build_prompt("Agent Black", "8/8/8/8/8/8/8/K6k b - - 0 1", &["h1g1".into(), "h1h2".into()]);
        assert!(p.contains("(Agent Black)"));
        assert!(p.contains("FEN: 8/8/8/8/8/8/8/K6k b - - 0 1\n"));
        assert!(p.contains("Available legal moves are: h1g1, h1h2\n"));
        assert!(p.contains("Reply with only one move in UCI format"));
    }

    #[test]
    fn candidate_is_first_word() {
        assert_eq!(extract_candidate("  e2e4 (a solid opening move)\n"), "e2e4");
        assert_eq!(extract_candidate("castle kingside"), "castle");
        assert_eq!(extract_candidate("g1f3"), "g1f3");
        assert_eq!(extract_candidate("   \n"), "");
    }
}
