//! Model Codec
//!
//! Reads and writes the plain-text model format:
//!
//! ```text
//! bytepair v1
//! <pattern>
//! <special token count>
//! <special token> <id>        (once per special token)
//! <left id> <right id>        (once per merge, in learned order)
//! ```
//!
//! Merge IDs are not written: the k-th merge line (0-based) is ID `256 + k`.
//! Special-token IDs are explicit. The vocabulary is never stored; loading
//! rebuilds it from the merges and special tokens.
//!
//! The `.vocab` listing produced by [`render_vocab`] is for people only and
//! is never read back.

use crate::error::{Result, TokenizerError};
use crate::merge::MergeRule;
use crate::tokenizer::Tokenizer;
use crate::vocab::render_token;
use crate::{Pair, TokenId, BASE_VOCAB_SIZE};
use std::collections::{HashMap, HashSet};
use std::fmt::Write;

/// First line of every model file.
pub const FORMAT_VERSION: &str = "bytepair v1";

/// Render a tokenizer in the model format.
pub fn serialize(tokenizer: &Tokenizer) -> String {
    let mut out = String::new();
    // fmt::Write into a String cannot fail
    let _ = writeln!(out, "{}", FORMAT_VERSION);
    let _ = writeln!(out, "{}", tokenizer.pattern());
    let _ = writeln!(out, "{}", tokenizer.special_tokens().len());
    for (token, id) in tokenizer.special_tokens() {
        let _ = writeln!(out, "{} {}", token, id);
    }
    for rule in tokenizer.merges() {
        let _ = writeln!(out, "{} {}", rule.pair.0, rule.pair.1);
    }
    out
}

/// Parse the model format.
///
/// Any problem fails the whole load with [`TokenizerError::Format`] (or
/// [`TokenizerError::InvalidMerge`] when the merges themselves are
/// inconsistent); no partially built tokenizer is returned.
pub fn deserialize(model: &str) -> Result<Tokenizer> {
    let mut lines = model.lines().enumerate().map(|(i, line)| (i + 1, line));

    match lines.next() {
        Some((_, FORMAT_VERSION)) => {}
        Some((line, other)) => {
            return Err(TokenizerError::format(
                line,
                format!("expected {:?}, found {:?}", FORMAT_VERSION, other),
            ))
        }
        None => return Err(TokenizerError::format(1, "empty model file")),
    }

    let (_, pattern) = lines
        .next()
        .ok_or_else(|| TokenizerError::format(2, "missing pattern line"))?;

    let (count_line, count) = lines
        .next()
        .ok_or_else(|| TokenizerError::format(3, "missing special token count"))?;
    let count: usize = count.trim().parse().map_err(|_| {
        TokenizerError::format(count_line, format!("invalid special token count {:?}", count))
    })?;

    // the count is untrusted, so it only bounds the loop
    let mut special_tokens = Vec::new();
    for expected in 0..count {
        let (line, text) = lines.next().ok_or_else(|| {
            TokenizerError::format(
                count_line + expected + 1,
                format!("expected {} special tokens, found {}", count, expected),
            )
        })?;
        special_tokens.push(parse_special_token(line, text)?);
    }

    let mut rest: Vec<(usize, &str)> = lines.collect();
    while matches!(rest.last(), Some((_, l)) if l.trim().is_empty()) {
        rest.pop();
    }

    let mut merges = Vec::with_capacity(rest.len());
    for (k, (line, text)) in rest.into_iter().enumerate() {
        let (left, right) = parse_merge(line, text)?;
        let id = TokenId::try_from(BASE_VOCAB_SIZE + k)
            .map_err(|_| TokenizerError::format(line, "too many merges"))?;
        merges.push(MergeRule::new(left, right, id));
    }

    check_special_ids(&special_tokens, BASE_VOCAB_SIZE + merges.len(), count_line)?;

    Tokenizer::from_parts(merges, special_tokens, pattern.to_string())
}

fn parse_special_token(line: usize, text: &str) -> Result<(String, TokenId)> {
    // the token may itself contain spaces, the id is after the last one
    let (token, id) = text
        .rsplit_once(' ')
        .ok_or_else(|| TokenizerError::format(line, "expected \"<token> <id>\""))?;
    if token.is_empty() {
        return Err(TokenizerError::format(line, "empty special token"));
    }
    let id = parse_id(line, id)?;
    Ok((token.to_string(), id))
}

fn parse_merge(line: usize, text: &str) -> Result<Pair> {
    let fields: Vec<&str> = text.split_whitespace().collect();
    if fields.len() != 2 {
        return Err(TokenizerError::format(
            line,
            format!("expected 2 fields, found {}", fields.len()),
        ));
    }
    Ok((parse_id(line, fields[0])?, parse_id(line, fields[1])?))
}

fn parse_id(line: usize, field: &str) -> Result<TokenId> {
    field
        .parse()
        .map_err(|_| TokenizerError::format(line, format!("invalid token id {:?}", field)))
}

/// Special tokens must sit above every byte and merge ID and be unique.
fn check_special_ids(
    special_tokens: &[(String, TokenId)],
    first_free: usize,
    count_line: usize,
) -> Result<()> {
    let mut ids = HashSet::new();
    let mut names = HashSet::new();
    for (i, (token, id)) in special_tokens.iter().enumerate() {
        let line = count_line + i + 1;
        if (*id as usize) < first_free {
            return Err(TokenizerError::format(
                line,
                format!("special token {:?} id {} overlaps byte or merge ids", token, id),
            ));
        }
        if !ids.insert(*id) {
            return Err(TokenizerError::format(
                line,
                format!("duplicate special token id {}", id),
            ));
        }
        if !names.insert(token.as_str()) {
            return Err(TokenizerError::format(
                line,
                format!("duplicate special token {:?}", token),
            ));
        }
    }
    Ok(())
}

/// Human-readable vocabulary listing, one entry per line in ID order.
///
/// ```text
/// [a] 97
/// [a][a] -> [aa] 256
/// [<|endoftext|>] 259
/// ```
pub fn render_vocab(tokenizer: &Tokenizer) -> String {
    let children: HashMap<TokenId, Pair> = tokenizer
        .merges()
        .iter()
        .map(|rule| (rule.id, rule.pair))
        .collect();
    let vocab = tokenizer.vocab();
    let render = |id: TokenId| vocab.get(id).map(render_token).unwrap_or_default();

    let mut out = String::new();
    for (id, bytes) in vocab.iter() {
        let value = render_token(bytes);
        let _ = match children.get(&id) {
            Some(&(left, right)) => writeln!(
                out,
                "[{}][{}] -> [{}] {}",
                render(left),
                render(right),
                value,
                id
            ),
            None => writeln!(out, "[{}] {}", value, id),
        };
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trained() -> Tokenizer {
        let mut tokenizer = Tokenizer::new();
        tokenizer.train("aaabdaaabac", 259).unwrap();
        tokenizer
    }

    #[test]
    fn test_serialize_layout() {
        let mut tokenizer = trained();
        tokenizer.set_pattern(r"\w+").unwrap();
        tokenizer.register_special_tokens(&["<|end of text|>"]).unwrap();

        let text = serialize(&tokenizer);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "bytepair v1",
                r"\w+",
                "1",
                "<|end of text|> 259",
                "97 97",
                "97 98",
                "256 257",
            ]
        );
    }

    #[test]
    fn test_deserialize_restores_model() {
        let mut tokenizer = trained();
        tokenizer.register_special_tokens(&["<|end of text|>"]).unwrap();

        let restored = deserialize(&serialize(&tokenizer)).unwrap();
        assert_eq!(restored.merges(), tokenizer.merges());
        assert_eq!(restored.special_tokens(), tokenizer.special_tokens());
        assert_eq!(restored.vocab(), tokenizer.vocab());
        assert_eq!(restored.pattern(), "");
    }

    #[test]
    fn test_deserialize_explicit_special_ids() {
        let model = "bytepair v1\n\n2\n<|endoftext|> 100257\n<|fim|> 100258\n104 105\n";
        let tokenizer = deserialize(model).unwrap();
        assert_eq!(tokenizer.merges(), &[MergeRule::new(104, 105, 256)]);
        assert_eq!(tokenizer.vocab().get(100257), Some(&b"<|endoftext|>"[..]));
        assert_eq!(tokenizer.vocab_size(), 259);
    }

    #[test]
    fn test_deserialize_ignores_trailing_blank_lines() {
        let tokenizer = deserialize("bytepair v1\n\n0\n97 97\n\n\n").unwrap();
        assert_eq!(tokenizer.merges().len(), 1);
    }

    #[test]
    fn test_deserialize_crlf() {
        let tokenizer = deserialize("bytepair v1\r\n\r\n0\r\n97 97\r\n").unwrap();
        assert_eq!(tokenizer.merges().len(), 1);
    }

    fn format_line(model: &str) -> usize {
        match deserialize(model) {
            Err(TokenizerError::Format { line, .. }) => line,
            other => panic!("expected format error, got {:?}", other.map(|t| t.stats())),
        }
    }

    #[test]
    fn test_rejects_wrong_version() {
        assert_eq!(format_line("sentencepiece v3\n\n0\n"), 1);
        assert_eq!(format_line("bytepair v2\n\n0\n"), 1);
        assert_eq!(format_line(""), 1);
    }

    #[test]
    fn test_rejects_missing_header_lines() {
        assert_eq!(format_line("bytepair v1\n"), 2);
        assert_eq!(format_line("bytepair v1\n\n"), 3);
        assert_eq!(format_line("bytepair v1\n\nmany\n"), 3);
    }

    #[test]
    fn test_rejects_bad_special_tokens() {
        // fewer lines than announced
        assert_eq!(format_line("bytepair v1\n\n2\n<a> 300\n"), 5);
        // no id
        assert_eq!(format_line("bytepair v1\n\n1\n<a>\n"), 4);
        // id below the merge range
        assert_eq!(format_line("bytepair v1\n\n1\n<a> 256\n97 97\n"), 4);
        // duplicate id
        assert_eq!(format_line("bytepair v1\n\n2\n<a> 300\n<b> 300\n"), 5);
    }

    #[test]
    fn test_rejects_oversized_special_token_count() {
        assert_eq!(format_line("bytepair v1\n\n18446744073709551615\n"), 4);
        assert_eq!(format_line("bytepair v1\n\n18446744073709551616\n"), 3);
    }

    #[test]
    fn test_rejects_bad_merge_lines() {
        assert_eq!(format_line("bytepair v1\n\n0\n97 97\n97 x\n"), 5);
        assert_eq!(format_line("bytepair v1\n\n0\n97 97 98\n"), 4);
        assert_eq!(format_line("bytepair v1\n\n0\n97\n"), 4);
        assert_eq!(format_line("bytepair v1\n\n0\n97 97\n\n98 98\n"), 5);
        assert_eq!(format_line("bytepair v1\n\n0\n-1 97\n"), 4);
    }

    #[test]
    fn test_rejects_forward_reference() {
        assert!(matches!(
            deserialize("bytepair v1\n\n0\n257 97\n97 97\n"),
            Err(TokenizerError::InvalidMerge { id: 256, .. })
        ));
    }

    #[test]
    fn test_render_vocab() {
        let mut tokenizer = trained();
        tokenizer.register_special_tokens(&["<eos>"]).unwrap();

        let listing = render_vocab(&tokenizer);
        let lines: Vec<&str> = listing.lines().collect();
        assert_eq!(lines.len(), 260);
        assert_eq!(lines[0], "[\\u0000] 0");
        assert_eq!(lines[97], "[a] 97");
        assert_eq!(lines[256], "[a][a] -> [aa] 256");
        assert_eq!(lines[258], "[aa][ab] -> [aaab] 258");
        assert_eq!(lines[259], "[<eos>] 259");
        // lone continuation byte
        assert_eq!(lines[0x80], "[\u{fffd}] 128");
    }
}
