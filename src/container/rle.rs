//! Byte-oriented run-length coding for frame payloads.
//!
//! ```text
//! 1ccccccc b        repeat b  (c + 3) times   (3..=130)
//! 0ccccccc b...     copy the next (c + 1) bytes (1..=128)
//! ```

use crate::error::{CtifError, Result};

const MIN_RUN: usize = 3;
const MAX_RUN: usize = 0x7f + MIN_RUN;
const MAX_LITERAL: usize = 0x80;
const RUN_FLAG: u8 = 0x80;

pub fn encode(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() / 2 + 2);
    let mut literal_start = 0;
    let mut i = 0;

    while i < data.len() {
        let run = data[i..]
            .iter()
            .take(MAX_RUN)
            .take_while(|&&b| b == data[i])
            .count();
        if run >= MIN_RUN {
            push_literals(&mut out, &data[literal_start..i]);
            out.push(RUN_FLAG | (run - MIN_RUN) as u8);
            out.push(data[i]);
            i += run;
            literal_start = i;
        } else {
            i += 1;
        }
    }
    push_literals(&mut out, &data[literal_start..]);
    out
}

fn push_literals(out: &mut Vec<u8>, literals: &[u8]) {
    for chunk in literals.chunks(MAX_LITERAL) {
        out.push((chunk.len() - 1) as u8);
        out.extend_from_slice(chunk);
    }
}

/// Expand `data`, which must decode to exactly `expected_len` bytes.
///
/// Error offsets are relative to the start of `data`.
pub fn decode(data: &[u8], expected_len: usize) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(expected_len);
    let mut pos = 0;

    while pos < data.len() {
        let control = data[pos];
        if control & RUN_FLAG != 0 {
            let run = (control & !RUN_FLAG) as usize + MIN_RUN;
            let &value = data
                .get(pos + 1)
                .ok_or_else(|| CtifError::corrupt(pos, "run missing its value byte"))?;
            out.resize(out.len() + run, value);
            pos += 2;
        } else {
            let len = control as usize + 1;
            let literals = data
                .get(pos + 1..pos + 1 + len)
                .ok_or_else(|| CtifError::corrupt(pos, "literal run past end of payload"))?;
            out.extend_from_slice(literals);
            pos += 1 + len;
        }
        if out.len() > expected_len {
            return Err(CtifError::corrupt(
                pos,
                format!("run-length data expands past {expected_len} bytes"),
            ));
        }
    }

    if out.len() != expected_len {
        return Err(CtifError::corrupt(
            data.len(),
            format!(
                "run-length data expands to {} bytes, expected {expected_len}",
                out.len()
            ),
        ));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_runs_and_literals() {
        let data = [1, 2, 9, 9, 9, 9, 3];
        assert_eq!(encode(&data), vec![0x01, 1, 2, 0x81, 9, 0x00, 3]);
    }

    #[test]
    fn test_short_repeats_stay_literal() {
        let data = [5, 5, 6, 6];
        assert_eq!(encode(&data), vec![0x03, 5, 5, 6, 6]);
    }

    #[test]
    fn test_long_run_splits() {
        let data = vec![0u8; 300];
        // 130 + 130 + 40
        let encoded = encode(&data);
        assert_eq!(encoded, vec![0xff, 0, 0xff, 0, 0x80 | 37, 0]);
        assert_eq!(decode(&encoded, 300).unwrap(), data);
    }

    #[test]
    fn test_long_literal_splits() {
        let data: Vec<u8> = (0..200u32).map(|i| (i % 251) as u8).collect();
        let encoded = encode(&data);
        assert_eq!(encoded[0], 0x7f);
        assert_eq!(encoded[129], 71);
        assert_eq!(encoded.len(), 202);
        assert_eq!(decode(&encoded, 200).unwrap(), data);
    }

    #[test]
    fn test_empty() {
        assert!(encode(&[]).is_empty());
        assert!(decode(&[], 0).unwrap().is_empty());
    }

    #[test]
    fn test_decode_truncated_literal() {
        let result = decode(&[0x03, 1, 2], 4);
        assert!(matches!(result, Err(CtifError::CorruptContainer { offset: 0, .. })));
    }

    #[test]
    fn test_decode_missing_run_value() {
        let result = decode(&[0x00, 7, 0x85], 9);
        assert!(matches!(result, Err(CtifError::CorruptContainer { offset: 2, .. })));
    }

    #[test]
    fn test_decode_length_mismatch() {
        assert!(decode(&[0x80, 1], 4).is_err());
        assert!(decode(&[0x80, 1], 2).is_err());
    }
}
