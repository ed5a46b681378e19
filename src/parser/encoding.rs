//! Encoding registry (§4.2): maps a SAS encoding byte to a named text codec.

use encoding_rs::{Encoding, WINDOWS_1252};

/// Canonical encoding name for a SAS encoding byte. Unrecognized bytes fall
/// back to `WINDOWS-1252`; this table must be bit-exact against the format.
#[must_use]
pub fn lookup_encoding_name(byte: u8) -> &'static str {
    match byte {
        20 => "UTF-8",
        28 => "US-ASCII",
        29 => "ISO-8859-1",
        30 => "ISO-8859-2",
        31 => "ISO-8859-3",
        32 => "ISO-8859-4",
        33 => "ISO-8859-5",
        34 => "ISO-8859-6",
        35 => "ISO-8859-7",
        36 => "ISO-8859-8",
        37 => "ISO-8859-9",
        38 => "ISO-8859-11",
        39 => "ISO-8859-15",
        40 => "ISO-8859-10",
        41 => "CP437",
        42 => "CP850",
        43 => "CP852",
        44 => "CP857",
        45 => "CP858",
        46 => "CP862",
        47 => "CP864",
        48 => "CP865",
        49 => "CP866",
        50 => "CP869",
        51 => "CP874",
        52 => "CP921",
        53 => "CP922",
        54 => "CP1129",
        55 => "CP720",
        56 => "CP737",
        57 => "CP775",
        58 => "CP860",
        59 => "CP863",
        60 => "WINDOWS-1250",
        61 => "WINDOWS-1251",
        62 => "WINDOWS-1252",
        63 => "WINDOWS-1253",
        64 => "WINDOWS-1254",
        65 => "WINDOWS-1255",
        66 => "WINDOWS-1256",
        67 => "WINDOWS-1257",
        68 => "WINDOWS-1258",
        134 => "SHIFT_JIS",
        136 => "CP932",
        137 => "EUC-JP",
        138 => "CP936",
        140 => "GB18030",
        141 => "EUC-TW",
        142 => "CP949",
        143 => "EUC-KR",
        145 => "CP950",
        146 => "BIG5",
        152 => "EUC-TW",
        153 => "ISO-2022-JP",
        154 => "ISO-2022-KR",
        155 => "ISO-2022-CN",
        167 => "ISO-8859-1",
        _ => "WINDOWS-1252",
    }
}

/// Resolves a name to an actual codec object; unresolvable names fall back
/// to `WINDOWS-1252`.
#[must_use]
pub fn resolve_encoding(name: &str) -> &'static Encoding {
    resolve_label(name).unwrap_or(WINDOWS_1252)
}

/// Resolves the codec for a SAS encoding byte directly.
#[must_use]
pub fn resolve_encoding_byte(byte: u8) -> &'static Encoding {
    resolve_encoding(lookup_encoding_name(byte))
}

pub fn trim_trailing(bytes: &[u8]) -> &[u8] {
    match bytes.iter().rposition(|b| *b != 0 && *b != b' ') {
        Some(last) => &bytes[..=last],
        None => &[],
    }
}

fn resolve_label(name: &str) -> Option<&'static Encoding> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return None;
    }

    try_encoding_label(trimmed).or_else(|| {
        let lower = trimmed.to_ascii_lowercase();
        try_encoding_label(&lower)
            .or_else(|| try_encoding_label(&lower.replace('_', "-")))
            .or_else(|| mac_compat_encoding(&lower))
    })
}

fn try_encoding_label(label: &str) -> Option<&'static Encoding> {
    Encoding::for_label(label.as_bytes())
}

fn mac_compat_encoding(lower_label: &str) -> Option<&'static Encoding> {
    match lower_label {
        "macroman" => Encoding::for_label(b"macintosh"),
        "macarabic" => Encoding::for_label(b"x-mac-arabic"),
        "machebrew" => Encoding::for_label(b"x-mac-hebrew"),
        "macgreek" => Encoding::for_label(b"x-mac-greek"),
        "macthai" => Encoding::for_label(b"x-mac-thai"),
        "macturkish" => Encoding::for_label(b"x-mac-turkish"),
        "macukraine" => Encoding::for_label(b"x-mac-ukrainian"),
        "maciceland" => Encoding::for_label(b"x-mac-icelandic"),
        "maccroatian" => Encoding::for_label(b"x-mac-croatian"),
        "maccyrillic" => Encoding::for_label(b"x-mac-cyrillic"),
        "macromania" => Encoding::for_label(b"x-mac-romanian"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrecognized_byte_falls_back_to_windows_1252() {
        assert_eq!(lookup_encoding_name(255), "WINDOWS-1252");
        assert_eq!(resolve_encoding_byte(255), WINDOWS_1252);
    }

    #[test]
    fn utf8_byte_resolves_to_utf8() {
        assert_eq!(lookup_encoding_name(20), "UTF-8");
    }
}
