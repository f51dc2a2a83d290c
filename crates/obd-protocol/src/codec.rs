//! Tokenizing raw ELM327 response text and locating data frames
//!
//! ELM327 replies are line-oriented text in which hex byte tokens sit
//! between command echo, protocol chatter ("SEARCHING..."), stray control
//! characters, and the trailing `>` prompt. Treating every non-hex
//! character as a separator strips all of that in one pass, even when the
//! chatter is glued directly onto the first data byte.

use crate::error::{ProtocolError, ProtocolResult};

/// Line terminator for commands sent to the device
pub const LINE_TERMINATOR: char = '\r';

/// Positive-response marker echoed by the device for service 01 queries
const RESPONSE_MARKER: &str = "41";

/// Render a command as the wire line the device expects
pub fn encode(cmd: &str) -> String {
    format!("{cmd}{LINE_TERMINATOR}")
}

/// Strip control characters and the prompt from a raw response, for
/// diagnostics and passthrough values
pub fn clean(raw: &str) -> String {
    raw.replace(['\r', '\n', '>'], " ").trim().to_string()
}

/// Split raw response text into candidate hex tokens
pub fn tokens(raw: &str) -> Vec<&str> {
    raw.split(|c: char| !c.is_ascii_hexdigit())
        .filter(|token| !token.is_empty())
        .collect()
}

/// Find the data frame for a PID in a token stream.
///
/// Scans adjacent token pairs for the `41` response marker followed by
/// the PID suffix (last two characters of the wire code), e.g. `41 0C`
/// for PID `010C`. Returns the index of the marker token of the leftmost
/// match.
pub fn locate(tokens: &[&str], pid: &str) -> Option<usize> {
    let suffix = pid_suffix(pid);
    tokens
        .windows(2)
        .position(|pair| pair[0] == RESPONSE_MARKER && pair[1].eq_ignore_ascii_case(suffix))
}

/// Parse the hex token at `index + offset` as an 8-bit value
pub fn extract_byte(tokens: &[&str], index: usize, offset: usize) -> ProtocolResult<u8> {
    let token = tokens
        .get(index + offset)
        .ok_or(ProtocolError::MissingByte { offset })?;
    u8::from_str_radix(token, 16).map_err(|_| ProtocolError::InvalidHex {
        token: (*token).to_string(),
    })
}

/// Last two characters of a wire code, the sub-identifier the device echoes
fn pid_suffix(pid: &str) -> &str {
    let split = pid.len().saturating_sub(2);
    pid.get(split..).unwrap_or(pid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_appends_terminator() {
        assert_eq!(encode("010C"), "010C\r");
        assert_eq!(encode("ATZ"), "ATZ\r");
    }

    #[test]
    fn test_clean_strips_prompt_and_control_chars() {
        assert_eq!(clean("41 0D 5A\r\r>"), "41 0D 5A");
        assert_eq!(clean("\r\nNO DATA\r>"), "NO DATA");
        assert_eq!(clean(""), "");
    }

    #[test]
    fn test_tokens_splits_on_whitespace_and_prompt() {
        assert_eq!(tokens("41 0D 5A\r\r>"), ["41", "0D", "5A"]);
    }

    #[test]
    fn test_tokens_empty_input() {
        assert!(tokens("").is_empty());
        assert!(tokens("   \r\n>").is_empty());
    }

    #[test]
    fn test_locate_finds_frame_behind_glued_chatter() {
        let toks = tokens("SEARCHING...41 0C 1A F8 >");
        let index = locate(&toks, "010C").unwrap();
        assert_eq!(&toks[index..index + 4], ["41", "0C", "1A", "F8"]);
    }

    #[test]
    fn test_locate_leftmost_match_wins() {
        // spurious 41 with the wrong suffix before the real frame
        let toks = tokens("41 0B 41 0C 1A F8");
        assert_eq!(locate(&toks, "010C"), Some(2));
    }

    #[test]
    fn test_locate_requires_adjacent_suffix() {
        let toks = tokens("41 0D 5A");
        assert_eq!(locate(&toks, "010C"), None);
    }

    #[test]
    fn test_locate_misses_when_no_marker() {
        assert_eq!(locate(&tokens("NO DATA"), "010C"), None);
        assert_eq!(locate(&tokens(""), "010C"), None);
        assert_eq!(locate(&tokens("?"), "010C"), None);
    }

    #[test]
    fn test_extract_byte_parses_hex() {
        let toks = tokens("41 0C 1A F8");
        assert_eq!(extract_byte(&toks, 0, 2), Ok(0x1A));
        assert_eq!(extract_byte(&toks, 0, 3), Ok(0xF8));
    }

    #[test]
    fn test_extract_byte_missing_token() {
        let toks = tokens("41 0C 1A");
        assert_eq!(
            extract_byte(&toks, 0, 3),
            Err(ProtocolError::MissingByte { offset: 3 })
        );
    }

    #[test]
    fn test_extract_byte_rejects_wide_token() {
        // spaces suppressed on the device: "1AF8" is not a single byte
        let toks = tokens("41 0C 1AF8");
        assert_eq!(
            extract_byte(&toks, 0, 2),
            Err(ProtocolError::InvalidHex {
                token: "1AF8".to_string()
            })
        );
    }
}
