//! EN 300 468 Annex Aで規定される文字列表現。

use std::borrow::{Borrow, Cow};
use std::fmt;
use std::ops;

use encoding_rs::Encoding;

mod iso6937;

/// 文字列の先頭で選択される文字符号表。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Codepage {
    /// 選択バイトがなく、既定の符号表（ISO/IEC 6937）を使用する。
    Default,
    /// ISO/IEC 8859の各パート（内包する値はパート番号）。
    Iso8859(u8),
    /// ISO/IEC 10646の基本多言語面（UCS-2）。
    Ucs2,
    /// KSX1001-2004。
    Ksx1001,
    /// GB-2312-1980。
    Gb2312,
    /// ISO/IEC 10646のBig5サブセット。
    Big5,
    /// ISO/IEC 10646のUTF-8符号化。
    Utf8,
    /// `encoding_type_id`で示される符号化（内包する値は`encoding_type_id`）。
    Encoded(u8),
    /// 予約された選択バイト。
    Reserved(u8),
}

impl Codepage {
    /// 1バイト符号化かどうかを返す。
    #[inline]
    pub fn is_single_byte(&self) -> bool {
        matches!(
            self,
            Codepage::Default | Codepage::Iso8859(_) | Codepage::Encoded(_) | Codepage::Reserved(_)
        )
    }

    /// 文字符号表に対応する`encoding_rs`のエンコーディングを返す。
    ///
    /// 一部のISO/IEC 8859は`encoding_rs`にないため、
    /// 英数字の範囲で互換性のあるWindowsコードページで代用する。
    /// ISO/IEC 6937は`encoding_rs`にないため`None`を返す。
    pub fn encoding(&self) -> Option<&'static Encoding> {
        let encoding = match *self {
            Codepage::Default => return None,
            Codepage::Iso8859(2) => encoding_rs::ISO_8859_2,
            Codepage::Iso8859(3) => encoding_rs::ISO_8859_3,
            Codepage::Iso8859(4) => encoding_rs::ISO_8859_4,
            Codepage::Iso8859(5) => encoding_rs::ISO_8859_5,
            Codepage::Iso8859(6) => encoding_rs::ISO_8859_6,
            Codepage::Iso8859(7) => encoding_rs::ISO_8859_7,
            Codepage::Iso8859(8) => encoding_rs::ISO_8859_8,
            Codepage::Iso8859(9) => encoding_rs::WINDOWS_1254,
            Codepage::Iso8859(10) => encoding_rs::ISO_8859_10,
            Codepage::Iso8859(11) => encoding_rs::WINDOWS_874,
            Codepage::Iso8859(13) => encoding_rs::ISO_8859_13,
            Codepage::Iso8859(14) => encoding_rs::ISO_8859_14,
            Codepage::Iso8859(15) => encoding_rs::ISO_8859_15,
            Codepage::Iso8859(16) => encoding_rs::ISO_8859_16,
            Codepage::Ucs2 | Codepage::Big5 => encoding_rs::UTF_16BE,
            Codepage::Ksx1001 => encoding_rs::EUC_KR,
            Codepage::Gb2312 => encoding_rs::GBK,
            Codepage::Utf8 => encoding_rs::UTF_8,
            _ => encoding_rs::WINDOWS_1252,
        };
        Some(encoding)
    }
}

/// 借用されたDVBの文字列を表す型。
///
/// `DvbStr`と[`DvbString`]は、<code>&[str]</code>と[`String`]の関係と相似しており、
/// 前者は借用された参照、後者は所有権を持つ文字列である。
/// 内容は文字符号表の選択バイトを含む未デコードのバイト列である。
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct DvbStr([u8]);

impl DvbStr {
    /// バイト列から`DvbStr`を生成する。
    #[must_use]
    #[inline]
    pub const fn from_bytes(bytes: &[u8]) -> &DvbStr {
        // Safety: `DvbStr`は`[u8]`の透過的なラッパーである
        unsafe { &*(bytes as *const [u8] as *const DvbStr) }
    }

    /// この文字列のバイト長を返す。
    #[must_use]
    #[inline]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// この文字列が空であるかどうかを返す。
    #[must_use]
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 選択バイトを含むバイト列を返す。
    #[must_use]
    #[inline]
    pub const fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// 先頭の選択バイトの長さを返す。
    fn selector_len(&self) -> usize {
        match *self.as_bytes() {
            [] => 0,
            [0x20..=0xFF, ..] => 0,
            [0x10, _, _, ..] => 3,
            [0x1F, _, ..] => 2,
            _ => 1,
        }
    }

    /// 先頭の選択バイトを返す。
    ///
    /// 診断のためのものであり、選択バイトがない場合は空のスライスを返す。
    #[must_use]
    pub fn selector(&self) -> &[u8] {
        &self.0[..self.selector_len()]
    }

    /// 選択バイトを除いた文字列本体を返す。
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.0[self.selector_len()..]
    }

    /// 選択バイトが示す文字符号表を返す。
    pub fn codepage(&self) -> Codepage {
        match *self.selector() {
            [] => Codepage::Default,
            [n @ 0x01..=0x0B] => Codepage::Iso8859(n + 4),
            [0x10, 0x00, n] => Codepage::Iso8859(n),
            [0x11] => Codepage::Ucs2,
            [0x12] => Codepage::Ksx1001,
            [0x13] => Codepage::Gb2312,
            [0x14] => Codepage::Big5,
            [0x15] => Codepage::Utf8,
            [0x1F, id] => Codepage::Encoded(id),
            [n, ..] => Codepage::Reserved(n),
        }
    }

    /// 文字列をデコードする。
    ///
    /// 強調などの制御符号は取り除かれ、改行を示す制御符号は`\n`に変換される。
    /// 変換できない文字は[`U+FFFD REPLACEMENT
    /// CHARACTER`][`char::REPLACEMENT_CHARACTER`]に変換される。
    pub fn decode(&self) -> String {
        let codepage = self.codepage();
        let body = self.body();

        let decoded = if codepage.is_single_byte() {
            // 0x80～0x9Fは制御符号であり、符号表によっては別の文字に割り当てられているため先に除く
            let bytes: Cow<[u8]> = if body.iter().any(|&b| is_control_byte(b)) {
                body.iter()
                    .filter_map(|&b| match b {
                        0x8A => Some(b'\n'),
                        b if is_control_byte(b) => None,
                        b => Some(b),
                    })
                    .collect::<Vec<u8>>()
                    .into()
            } else {
                body.into()
            };
            match codepage.encoding() {
                Some(encoding) => encoding.decode_without_bom_handling(&bytes).0.into_owned(),
                None => iso6937::decode(&bytes),
            }
        } else {
            match codepage.encoding() {
                Some(encoding) => encoding.decode_without_bom_handling(body).0.into_owned(),
                None => iso6937::decode(body),
            }
        };

        if decoded.chars().any(is_control_char) {
            decoded
                .chars()
                .filter_map(|c| match c {
                    '\u{8A}' | '\u{E08A}' => Some('\n'),
                    c if is_control_char(c) => None,
                    c => Some(c),
                })
                .collect()
        } else {
            decoded
        }
    }
}

#[inline]
fn is_control_byte(b: u8) -> bool {
    (b < 0x20 && b != b'\n') || (0x80..=0x9F).contains(&b)
}

#[inline]
fn is_control_char(c: char) -> bool {
    (c < ' ' && c != '\n') || ('\u{80}'..='\u{9F}').contains(&c) || ('\u{E080}'..='\u{E09F}').contains(&c)
}

impl fmt::Debug for DvbStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DvbStr(")?;
        if !self.selector().is_empty() {
            write!(f, "{:?}, ", self.codepage())?;
        }
        fmt::Debug::fmt(&*self.decode(), f)?;
        f.write_str(")")
    }
}

impl fmt::Display for DvbStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.decode())
    }
}

impl AsRef<[u8]> for DvbStr {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl ToOwned for DvbStr {
    type Owned = DvbString;

    #[inline]
    fn to_owned(&self) -> DvbString {
        DvbString(self.0.to_vec())
    }
}

/// 所有権を持つDVBの文字列。
///
/// 複数の記述子に分割して送出される文字列を連結するために使用する。
#[derive(Default, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DvbString(Vec<u8>);

impl DvbString {
    /// 空の`DvbString`を生成する。
    #[inline]
    pub const fn new() -> DvbString {
        DvbString(Vec::new())
    }

    /// 文字列を空にする。
    #[inline]
    pub fn clear(&mut self) {
        self.0.clear()
    }

    /// 分割された文字列の断片を連結する。
    ///
    /// 最初の断片は選択バイトを含めてそのまま格納し、
    /// 2つ目以降の断片は先頭の選択バイトを取り除いてから連結する。
    pub fn push_fragment(&mut self, fragment: &DvbStr) {
        if self.0.is_empty() {
            self.0.extend_from_slice(fragment.as_bytes());
        } else {
            self.0.extend_from_slice(fragment.body());
        }
    }
}

impl ops::Deref for DvbString {
    type Target = DvbStr;

    #[inline]
    fn deref(&self) -> &DvbStr {
        DvbStr::from_bytes(&self.0)
    }
}

impl Borrow<DvbStr> for DvbString {
    #[inline]
    fn borrow(&self) -> &DvbStr {
        self
    }
}

impl fmt::Debug for DvbString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

impl fmt::Display for DvbString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&**self, f)
    }
}

impl From<&DvbStr> for DvbString {
    #[inline]
    fn from(s: &DvbStr) -> DvbString {
        s.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table() {
        let s = DvbStr::from_bytes(b"Sample Show");
        assert_eq!(s.codepage(), Codepage::Default);
        assert!(s.selector().is_empty());
        assert_eq!(s.decode(), "Sample Show");
        assert_eq!(s.to_string(), "Sample Show");

        let s = DvbStr::from_bytes(b"\xC2Esope \x86na\xCFsi\x87");
        assert_eq!(s.codepage(), Codepage::Default);
        assert_eq!(s.decode(), "Ésope naši");
    }

    #[test]
    fn test_control_codes() {
        let s = DvbStr::from_bytes(b"\x86Emphasis\x87 line\x8Anext");
        assert_eq!(s.decode(), "Emphasis line\nnext");
    }

    #[test]
    fn test_iso_8859() {
        // ISO/IEC 8859-5
        let s = DvbStr::from_bytes(b"\x01\xBF\xE0\xD8\xD2\xD5\xE2");
        assert_eq!(s.codepage(), Codepage::Iso8859(5));
        assert_eq!(s.selector(), b"\x01");
        assert_eq!(s.decode(), "Привет");

        // 3バイトの選択によるISO/IEC 8859-9
        let s = DvbStr::from_bytes(b"\x10\x00\x09G\xFCn");
        assert_eq!(s.codepage(), Codepage::Iso8859(9));
        assert_eq!(s.selector(), b"\x10\x00\x09");
        assert_eq!(s.decode(), "Gün");

        // 長さが足りない場合は1バイトの選択として扱う
        let s = DvbStr::from_bytes(b"\x10\x00");
        assert_eq!(s.selector(), b"\x10");
    }

    #[test]
    fn test_multi_byte() {
        let s = DvbStr::from_bytes(b"\x15Caf\xC3\xA9");
        assert_eq!(s.codepage(), Codepage::Utf8);
        assert_eq!(s.decode(), "Café");

        let s = DvbStr::from_bytes(b"\x11\x00A\xE0\x8A\x00B");
        assert_eq!(s.codepage(), Codepage::Ucs2);
        assert_eq!(s.decode(), "A\nB");
    }

    #[test]
    fn test_push_fragment() {
        let mut s = DvbString::new();
        s.push_fragment(DvbStr::from_bytes(b"\x05First "));
        s.push_fragment(DvbStr::from_bytes(b"\x05second"));
        assert_eq!(s.as_bytes(), b"\x05First second");
        assert_eq!(s.codepage(), Codepage::Iso8859(9));
        assert_eq!(s.decode(), "First second");

        s.clear();
        assert!(s.is_empty());
    }
}
