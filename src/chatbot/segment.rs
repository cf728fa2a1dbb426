//! Splits long assistant replies into chunks the transport accepts.

/// Characters that end a sentence and make a good second-choice cut point.
const SENTENCE_TERMINATORS: [char; 3] = ['.', '!', '?'];

/// Byte offset of the `n`-th character, or the end of the string.
fn char_offset(s: &str, n: usize) -> usize {
    s.char_indices().nth(n).map(|(i, _)| i).unwrap_or(s.len())
}

/// Split `text` into chunks of at most `max_len` characters.
///
/// Cuts at the last space before the limit, else right after the last
/// sentence terminator, else hard at the limit. Chunks are trimmed; the final
/// remainder is always emitted, even when short or empty.
pub fn segment(text: &str, max_len: usize) -> Vec<String> {
    let max_len = max_len.max(1);
    let mut chunks = Vec::new();
    let mut rest = text;

    while rest.chars().count() > max_len {
        let limit = char_offset(rest, max_len);
        let window = &rest[..limit];

        let cut = match window.rfind(' ') {
            Some(i) if i > 0 => i,
            _ => match window.rfind(SENTENCE_TERMINATORS) {
                // Terminators are ASCII, so +1 stays on a char boundary.
                Some(i) => i + 1,
                None => limit,
            },
        };

        let chunk = rest[..cut].trim();
        if !chunk.is_empty() {
            chunks.push(chunk.to_string());
        }
        rest = rest[cut..].trim();
    }

    chunks.push(rest.to_string());
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(count: usize) -> String {
        "abcd ".repeat(count)
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        assert_eq!(segment("hola", 1000), vec!["hola"]);
    }

    #[test]
    fn test_empty_text_still_yields_a_chunk() {
        assert_eq!(segment("", 10), vec![""]);
    }

    #[test]
    fn test_cuts_at_last_space() {
        let chunks = segment("uno dos tres cuatro", 9);
        assert_eq!(chunks, vec!["uno dos", "tres", "cuatro"]);
    }

    #[test]
    fn test_falls_back_to_sentence_terminator() {
        let chunks = segment("Hola.Mundo!Fin", 8);
        assert_eq!(chunks, vec!["Hola.", "Mundo!", "Fin"]);
    }

    #[test]
    fn test_hard_cut_without_space_or_terminator() {
        let chunks = segment("abcdefghij", 4);
        assert_eq!(chunks, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_3500_chars_into_four_chunks() {
        let text = words(700);
        assert_eq!(text.chars().count(), 3500);
        let chunks = segment(&text, 1000);
        assert_eq!(chunks.len(), 4);
        assert!(chunks.iter().all(|c| c.chars().count() <= 1000));
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        let text = "ñandú ".repeat(10);
        let chunks = segment(&text, 12);
        assert!(chunks.iter().all(|c| c.chars().count() <= 12));
        assert!(chunks.iter().all(|c| !c.is_empty()));
    }

    #[test]
    fn test_no_chunk_exceeds_limit_and_content_is_preserved() {
        let samples = [
            "Lorem ipsum dolor sit amet, consectetur adipiscing elit. Sed do eiusmod tempor.",
            "sinespaciosperoconpuntos.otrafrase.yotramas.fin",
            "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa",
            "  espacios   al   principio   y   al   final   ",
            "¿Qué cubre la póliza? Hospitalización, cirugía y maternidad. ¡Todo incluido!",
        ];
        for text in samples {
            for max in 1..=20 {
                let chunks = segment(text, max);
                assert!(!chunks.is_empty());
                for c in &chunks {
                    assert!(c.chars().count() <= max, "chunk {c:?} over {max}");
                }
                let rebuilt: String = chunks.concat().split_whitespace().collect();
                let original: String = text.split_whitespace().collect();
                assert_eq!(rebuilt, original, "text {text:?} max {max}");
            }
        }
    }
}
