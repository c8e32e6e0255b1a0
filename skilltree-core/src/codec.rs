//! Tree Codec
//!
//! Shareable text form of an allocated set.
//!
//! # Layout
//!
//! ```text
//! version   u32 big-endian, always 6
//! class     u8, always 0
//! ascend    u8, always 0
//! count     u8, number of skills (low byte)
//! skills    count * u16 big-endian, ascending, start node omitted
//! trailer   two zero bytes
//! ```
//!
//! The bytes are written as base64url (`-` and `_` in place of `+` and `/`).
//! Padding is emitted on encode and optional on decode.
//!
//! The count byte only holds the low eight bits of the skill count; the node
//! section length is what decides how many skills are read.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;

use crate::error::CodecError;
use crate::graph::SkillId;

/// Format version written and accepted by this codec.
pub const TREE_VERSION: u32 = 6;

const HEADER_LEN: usize = 7;
const TRAILER: [u8; 2] = [0, 0];

const ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Encode an allocated set. The start node is dropped and duplicates collapse.
pub fn encode<I>(skills: I, start: SkillId) -> Result<String, CodecError>
where
    I: IntoIterator<Item = SkillId>,
{
    let mut ids = skills
        .into_iter()
        .filter(|&skill| skill != start)
        .map(|skill| u16::try_from(skill.raw()).map_err(|_| CodecError::SkillOutOfRange(skill)))
        .collect::<Result<Vec<u16>, _>>()?;
    ids.sort_unstable();
    ids.dedup();

    let mut bytes = Vec::with_capacity(HEADER_LEN + ids.len() * 2 + TRAILER.len());
    bytes.extend_from_slice(&TREE_VERSION.to_be_bytes());
    bytes.push(0);
    bytes.push(0);
    bytes.push((ids.len() & 0xff) as u8);
    for id in &ids {
        bytes.extend_from_slice(&id.to_be_bytes());
    }
    bytes.extend_from_slice(&TRAILER);

    Ok(ENGINE.encode(bytes))
}

/// Decode an encoded tree into its skill ids, in payload order.
pub fn decode(encoded: &str) -> Result<Vec<SkillId>, CodecError> {
    let bytes = ENGINE.decode(encoded.trim())?;
    let minimum = HEADER_LEN + TRAILER.len();
    if bytes.len() < minimum {
        return Err(CodecError::Truncated {
            expected: minimum,
            actual: bytes.len(),
        });
    }

    let version = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    if version != TREE_VERSION {
        return Err(CodecError::UnsupportedVersion {
            found: version,
            expected: TREE_VERSION,
        });
    }
    if bytes[4] != 0 {
        return Err(CodecError::InvalidClass(bytes[4]));
    }
    if bytes[5] != 0 {
        return Err(CodecError::InvalidAscendancy(bytes[5]));
    }

    let declared = usize::from(bytes[6]);
    let body = &bytes[HEADER_LEN..bytes.len() - TRAILER.len()];
    if body.len() % 2 != 0 {
        return Err(CodecError::TrailingData(format!(
            "node section has odd length {}",
            body.len()
        )));
    }
    let listed = body.len() / 2;
    if listed % 256 != declared {
        if listed < declared {
            return Err(CodecError::Truncated {
                expected: HEADER_LEN + declared * 2 + TRAILER.len(),
                actual: bytes.len(),
            });
        }
        return Err(CodecError::TrailingData(format!(
            "header declares {declared} skills but {listed} are listed"
        )));
    }
    if bytes[bytes.len() - TRAILER.len()..] != TRAILER {
        return Err(CodecError::TrailingData(
            "trailer must be two zero bytes".to_string(),
        ));
    }

    Ok(body
        .chunks_exact(2)
        .map(|pair| SkillId::new(u32::from(u16::from_be_bytes([pair[0], pair[1]]))))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[u32]) -> Vec<SkillId> {
        raw.iter().copied().map(SkillId::new).collect()
    }

    fn raw_payload(bytes: &[u8]) -> String {
        ENGINE.encode(bytes)
    }

    #[test]
    fn encode_layout() {
        let encoded = encode(ids(&[300, 29045, 2]), SkillId::new(29045)).unwrap();
        let bytes = ENGINE.decode(&encoded).unwrap();
        assert_eq!(bytes, vec![0, 0, 0, 6, 0, 0, 2, 0, 2, 1, 44, 0, 0]);
        assert!(!encoded.contains('+') && !encoded.contains('/'));
    }

    #[test]
    fn decode_sorted_payload() {
        let encoded = encode(ids(&[9, 4, 9, 65535]), SkillId::new(1)).unwrap();
        assert_eq!(decode(&encoded).unwrap(), ids(&[4, 9, 65535]));
    }

    #[test]
    fn decode_accepts_missing_padding() {
        let encoded = encode(ids(&[5]), SkillId::new(1)).unwrap();
        let stripped = encoded.trim_end_matches('=');
        assert_eq!(decode(stripped).unwrap(), ids(&[5]));
    }

    #[test]
    fn empty_set_round_trips() {
        let encoded = encode(ids(&[1]), SkillId::new(1)).unwrap();
        assert!(decode(&encoded).unwrap().is_empty());
    }

    #[test]
    fn out_of_range_skill_is_rejected() {
        assert!(matches!(
            encode(ids(&[70_000]), SkillId::new(1)),
            Err(CodecError::SkillOutOfRange(_))
        ));
    }

    #[test]
    fn wrong_version_is_rejected() {
        let payload = raw_payload(&[0, 0, 0, 5, 0, 0, 0, 0, 0]);
        assert!(matches!(
            decode(&payload),
            Err(CodecError::UnsupportedVersion { found: 5, expected: 6 })
        ));
    }

    #[test]
    fn class_and_ascendancy_must_be_zero() {
        let class = raw_payload(&[0, 0, 0, 6, 1, 0, 0, 0, 0]);
        assert!(matches!(decode(&class), Err(CodecError::InvalidClass(1))));
        let ascendancy = raw_payload(&[0, 0, 0, 6, 0, 3, 0, 0, 0]);
        assert!(matches!(
            decode(&ascendancy),
            Err(CodecError::InvalidAscendancy(3))
        ));
    }

    #[test]
    fn truncated_payloads_are_rejected() {
        let short = raw_payload(&[0, 0, 0, 6, 0]);
        assert!(matches!(decode(&short), Err(CodecError::Truncated { .. })));

        let missing_skill = raw_payload(&[0, 0, 0, 6, 0, 0, 2, 0, 7, 0, 0]);
        assert!(matches!(
            decode(&missing_skill),
            Err(CodecError::Truncated { .. })
        ));

        let odd = raw_payload(&[0, 0, 0, 6, 0, 0, 1, 0, 7, 9, 0, 0]);
        assert!(matches!(decode(&odd), Err(CodecError::TrailingData(_))));
    }

    #[test]
    fn garbage_is_not_base64() {
        assert!(matches!(decode("!!!"), Err(CodecError::Base64(_))));
    }

    #[test]
    fn large_sets_wrap_the_count_byte() {
        let skills: Vec<SkillId> = (1..=300).map(SkillId::new).collect();
        let encoded = encode(skills.clone(), SkillId::new(0)).unwrap();
        assert_eq!(decode(&encoded).unwrap(), skills);
    }
}
