//! Legacy text encoding support.
//!
//! The source tables are exported in the Korean Windows code page. The
//! WHATWG label set that `encoding_rs` follows knows that code page as
//! `windows-949`/`euc-kr` but not under its common Microsoft and Python
//! spellings, so those are aliased here.

use encoding_rs::Encoding;

use crate::DatasetError;

/// Spellings not in the WHATWG label set, mapped to a label that is.
const LABEL_ALIASES: &[(&str, &str)] = &[
    ("cp949", "windows-949"),
    ("ms949", "windows-949"),
    ("uhc", "windows-949"),
    ("utf8", "utf-8"),
];

/// Resolves an encoding label (case-insensitive).
///
/// # Errors
///
/// Returns [`DatasetError::UnknownEncoding`] if the label is not known.
pub fn resolve_encoding(label: &str) -> Result<&'static Encoding, DatasetError> {
    let trimmed = label.trim();
    let lowered = trimmed.to_ascii_lowercase();
    let resolved = LABEL_ALIASES
        .iter()
        .find(|(alias, _)| *alias == lowered)
        .map_or(lowered.as_str(), |(_, target)| *target);

    Encoding::for_label(resolved.as_bytes()).ok_or_else(|| DatasetError::UnknownEncoding {
        label: trimmed.to_string(),
    })
}

/// Decodes raw file bytes into text.
///
/// A byte order mark overrides `encoding`. Undecodable sequences are
/// replaced rather than failing the load; the affected cells then fail
/// to parse and their rows are dropped.
#[must_use]
pub fn decode(bytes: &[u8], encoding: &'static Encoding, source: &str) -> String {
    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        log::warn!(
            "{source}: some bytes were not valid {}; replaced with U+FFFD",
            used.name()
        );
    }
    if used != encoding {
        log::debug!("{source}: byte order mark selected {}", used.name());
    }
    text.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_python_style_labels() {
        assert_eq!(resolve_encoding("cp949").unwrap(), encoding_rs::EUC_KR);
        assert_eq!(resolve_encoding("CP949").unwrap(), encoding_rs::EUC_KR);
        assert_eq!(resolve_encoding("windows-949").unwrap(), encoding_rs::EUC_KR);
        assert_eq!(resolve_encoding("utf8").unwrap(), encoding_rs::UTF_8);
    }

    #[test]
    fn rejects_unknown_label() {
        let err = resolve_encoding("klingon").unwrap_err();
        assert!(matches!(err, DatasetError::UnknownEncoding { .. }));
    }

    #[test]
    fn decodes_korean_code_page() {
        let (bytes, _, _) = encoding_rs::EUC_KR.encode("날짜,위도,경도");
        let text = decode(&bytes, encoding_rs::EUC_KR, "test");
        assert_eq!(text, "날짜,위도,경도");
    }

    #[test]
    fn utf8_bom_overrides_configured_encoding() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice("date,도단위".as_bytes());
        let text = decode(&bytes, encoding_rs::EUC_KR, "test");
        assert_eq!(text, "date,도단위");
    }
}
