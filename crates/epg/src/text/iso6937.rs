//! 選択バイトのない文字列に使われるISO/IEC 6937の符号表。

const UNDEFINED: char = char::REPLACEMENT_CHARACTER;

/// 0xA0～0xFFの文字。0xC1～0xCFは[`DIACRITICS`]で扱う。
#[rustfmt::skip]
static UPPER: [char; 0x60] = [
    // 0xA0
    '\u{A0}', '¡', '¢', '£', '€', '¥', UNDEFINED, '§',
    '¤', '‘', '“', '«', '←', '↑', '→', '↓',
    // 0xB0
    '°', '±', '²', '³', '×', 'µ', '¶', '·',
    '÷', '’', '”', '»', '¼', '½', '¾', '¿',
    // 0xC0
    UNDEFINED, UNDEFINED, UNDEFINED, UNDEFINED, UNDEFINED, UNDEFINED, UNDEFINED, UNDEFINED,
    UNDEFINED, UNDEFINED, UNDEFINED, UNDEFINED, UNDEFINED, UNDEFINED, UNDEFINED, UNDEFINED,
    // 0xD0
    '―', '¹', '®', '©', '™', '♪', '¬', '¦',
    UNDEFINED, UNDEFINED, UNDEFINED, UNDEFINED, '⅛', '⅜', '⅝', '⅞',
    // 0xE0
    'Ω', 'Æ', 'Đ', 'ª', 'Ħ', UNDEFINED, 'Ĳ', 'Ŀ',
    'Ł', 'Ø', 'Œ', 'º', 'Þ', 'Ŧ', 'Ŋ', 'ŉ',
    // 0xF0
    'ĸ', 'æ', 'đ', 'ð', 'ħ', 'ı', 'ĳ', 'ŀ',
    'ł', 'ø', 'œ', 'ß', 'þ', 'ŧ', 'ŋ', '\u{AD}',
];

/// ダイアクリティカルマーク。
///
/// 結合文字と、後続の基底文字ごとの合成済み文字の組。
struct Diacritic {
    mark: char,
    bases: &'static str,
    composed: &'static str,
}

/// 0xC1～0xCFのダイアクリティカルマーク。
static DIACRITICS: [Option<Diacritic>; 0x0F] = [
    // 0xC1 grave
    Some(Diacritic {
        mark: '\u{300}',
        bases: "AEIOUaeiou",
        composed: "ÀÈÌÒÙàèìòù",
    }),
    // 0xC2 acute
    Some(Diacritic {
        mark: '\u{301}',
        bases: "ACEILNORSUYZacegilnorsuyz",
        composed: "ÁĆÉÍĹŃÓŔŚÚÝŹáćéģíĺńóŕśúýź",
    }),
    // 0xC3 circumflex
    Some(Diacritic {
        mark: '\u{302}',
        bases: "ACEGHIJOSUWYaceghijosuwy",
        composed: "ÂĈÊĜĤÎĴÔŜÛŴŶâĉêĝĥîĵôŝûŵŷ",
    }),
    // 0xC4 tilde
    Some(Diacritic {
        mark: '\u{303}',
        bases: "AINOUainou",
        composed: "ÃĨÑÕŨãĩñõũ",
    }),
    // 0xC5 macron
    Some(Diacritic {
        mark: '\u{304}',
        bases: "AEIOUaeiou",
        composed: "ĀĒĪŌŪāēīōū",
    }),
    // 0xC6 breve
    Some(Diacritic {
        mark: '\u{306}',
        bases: "AGUagu",
        composed: "ĂĞŬăğŭ",
    }),
    // 0xC7 dot
    Some(Diacritic {
        mark: '\u{307}',
        bases: "CEGIZcegz",
        composed: "ĊĖĠİŻċėġż",
    }),
    // 0xC8 diaeresis
    Some(Diacritic {
        mark: '\u{308}',
        bases: "AEIOUYaeiouy",
        composed: "ÄËÏÖÜŸäëïöüÿ",
    }),
    // 0xC9
    None,
    // 0xCA ring
    Some(Diacritic {
        mark: '\u{30A}',
        bases: "AUau",
        composed: "ÅŮåů",
    }),
    // 0xCB cedilla
    Some(Diacritic {
        mark: '\u{327}',
        bases: "CGKLNRSTcklnrst",
        composed: "ÇĢĶĻŅŖŞŢçķļņŗşţ",
    }),
    // 0xCC
    None,
    // 0xCD double acute
    Some(Diacritic {
        mark: '\u{30B}',
        bases: "OUou",
        composed: "ŐŰőű",
    }),
    // 0xCE ogonek
    Some(Diacritic {
        mark: '\u{328}',
        bases: "AEIUaeiu",
        composed: "ĄĘĮŲąęįų",
    }),
    // 0xCF caron
    Some(Diacritic {
        mark: '\u{30C}',
        bases: "CDELNRSTZcdelnrstz",
        composed: "ČĎĚĽŇŘŠŤŽčďěľňřšťž",
    }),
];

impl Diacritic {
    fn compose(&self, base: char) -> Option<char> {
        let i = self.bases.chars().position(|c| c == base)?;
        self.composed.chars().nth(i)
    }
}

#[inline]
fn single(b: u8) -> char {
    match b {
        0x00..=0x9F => b as char,
        0xC1..=0xCF => DIACRITICS[(b - 0xC1) as usize]
            .as_ref()
            .map_or(UNDEFINED, |d| d.mark),
        _ => UPPER[(b - 0xA0) as usize],
    }
}

/// ISO/IEC 6937の文字列をデコードする。
///
/// ダイアクリティカルマークは後続の文字と合成し、合成済み文字がない場合は結合文字を後置する。
pub fn decode(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len());
    let mut iter = bytes.iter().copied();
    while let Some(b) = iter.next() {
        let Some(diacritic) = (0xC1..=0xCF).contains(&b).then(|| &DIACRITICS[(b - 0xC1) as usize])
        else {
            s.push(single(b));
            continue;
        };

        match (diacritic, iter.next()) {
            (Some(d), Some(base)) => {
                let base = single(base);
                match d.compose(base) {
                    Some(c) => s.push(c),
                    None => {
                        s.push(base);
                        s.push(d.mark);
                    }
                }
            }
            (Some(d), None) => s.push(d.mark),
            (None, base) => {
                s.push(UNDEFINED);
                s.extend(base.map(single));
            }
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables() {
        for d in DIACRITICS.iter().flatten() {
            assert_eq!(d.bases.chars().count(), d.composed.chars().count(), "{:?}", d.mark);
        }
    }

    #[test]
    fn test_decode() {
        assert_eq!(decode(b"Sample Show"), "Sample Show");
        assert_eq!(decode(b"\xC2Esope"), "Ésope");
        assert_eq!(decode(b"Caf\xC2e cr\xC8eme"), "Café crëme");
        assert_eq!(decode(b"\xCFSkoda \xCBcedilla"), "Škoda çedilla");
        assert_eq!(decode(b"\xA3 5 \xB1 \xE9l"), "£ 5 ± Øl");
        assert_eq!(decode(b"\xFB"), "ß");

        // 合成済み文字がなければ結合文字を後置する
        assert_eq!(decode(b"\xC1x"), "x\u{300}");
        // 基底文字のないダイアクリティカルマーク
        assert_eq!(decode(b"end\xC8"), "end\u{308}");
        assert_eq!(decode(b"\xC9a"), "\u{FFFD}a");
    }
}
