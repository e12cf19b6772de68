//! 言語コードの定義。

use std::fmt;
use std::str::FromStr;

/// ISO 639-2で規定される3文字の言語コード。
///
/// 放送によって大文字と小文字が混在するため、英字は小文字に正規化して保持する。
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Deserialize)]
#[serde(try_from = "String")]
pub struct LangCode(pub [u8; 3]);

impl LangCode {
    /// 英語。
    pub const ENG: LangCode = LangCode(*b"eng");
    /// ドイツ語。
    pub const DEU: LangCode = LangCode(*b"deu");
    /// フランス語。
    pub const FRA: LangCode = LangCode(*b"fra");
    /// イタリア語。
    pub const ITA: LangCode = LangCode(*b"ita");
    /// スペイン語。
    pub const SPA: LangCode = LangCode(*b"spa");
    /// ロシア語。
    pub const RUS: LangCode = LangCode(*b"rus");
    /// ギリシャ語。
    pub const ELL: LangCode = LangCode(*b"ell");
    /// 日本語。
    pub const JPN: LangCode = LangCode(*b"jpn");

    /// 記述子中の3バイトから`LangCode`を生成する。
    #[inline]
    pub fn read(data: &[u8; 3]) -> LangCode {
        LangCode(data.map(|b| b.to_ascii_lowercase()))
    }

    /// 言語コードを文字列として返す。
    ///
    /// ASCII以外のバイトを含む場合は`None`を返す。
    pub fn as_str(&self) -> Option<&str> {
        if self.0.is_ascii() {
            std::str::from_utf8(&self.0).ok()
        } else {
            None
        }
    }
}

impl fmt::Debug for LangCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "LangCode({})", self)
    }
}

impl fmt::Display for LangCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.0.escape_ascii(), f)
    }
}

/// 文字列から[`LangCode`]を生成する際のエラー。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid language code {0:?}")]
pub struct ParseLangCodeError(String);

impl FromStr for LangCode {
    type Err = ParseLangCodeError;

    fn from_str(s: &str) -> Result<LangCode, ParseLangCodeError> {
        match *s.as_bytes() {
            [a, b, c] if s.is_ascii() => Ok(LangCode::read(&[a, b, c])),
            _ => Err(ParseLangCodeError(s.to_owned())),
        }
    }
}

impl TryFrom<String> for LangCode {
    type Error = ParseLangCodeError;

    #[inline]
    fn try_from(value: String) -> Result<LangCode, ParseLangCodeError> {
        value.parse()
    }
}

impl serde::Serialize for LangCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
