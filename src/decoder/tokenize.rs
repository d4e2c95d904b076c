//! Field tokenizer

/// Returns true for the packet field separators.
pub fn is_separator(ch: char) -> bool {
    ch == ',' || ch == '|'
}

/// Split a packet on runs of `,` and `|`.
///
/// Behaves like a regex split on `[,|]+`: a run of separators is a single
/// boundary, a leading or trailing run produces one empty token at that end,
/// and empty input produces a single empty token. Never fails.
pub fn tokenize(line: &str) -> Vec<&str> {
    let pieces: Vec<&str> = line.split(is_separator).collect();
    let last = pieces.len() - 1;

    pieces
        .into_iter()
        .enumerate()
        .filter(|(index, piece)| *index == 0 || *index == last || !piece.is_empty())
        .map(|(_, piece)| piece)
        .collect()
}
