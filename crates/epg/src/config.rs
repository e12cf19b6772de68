//! 番組表の組み立てに関する設定。

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::category::{CategoryOverride, CustomCategory};
use crate::entry::ItemKeys;
use crate::heuristics::SeasonEpisodeGrammar;
use crate::lang::LangCode;
use crate::psi::desc::EitVariant;

/// 設定の読み込みで発生するエラー。
#[derive(Debug, Error)]
pub enum ConfigError {
    /// ファイルを読み込めなかった。
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// TOMLとして解釈できなかった。
    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),

    /// 値が不正。
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// 番組記述の組み立て方。
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptionMode {
    /// 短形式イベント記述子の記述のみを使用する。
    ShortOnly,
    /// 拡張形式イベント記述子の記述から副題を分割する。
    SplitExtended,
    /// 番組名の続きを補った上で副題を分割する。
    #[default]
    Combined,
}

/// 収集する期間。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DateWindow {
    /// 開始日。
    pub start: chrono::NaiveDate,
    /// 終了日（この日を含まない）。
    pub end: chrono::NaiveDate,
}

impl DateWindow {
    /// `date`が期間内かどうか。
    #[inline]
    pub fn contains(&self, date: chrono::NaiveDate) -> bool {
        self.start <= date && date < self.end
    }
}

/// 診断用の出力。
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TraceOptions {
    /// 番組名を記録する。
    pub titles: bool,
    /// 番組記述を記録する。
    pub descriptions: bool,
    /// 番組とジャンルの相互参照を記録する。
    pub categories: bool,
}

/// 番組表の組み立てに関する設定。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Options {
    /// 優先する言語。
    pub input_language: Option<LangCode>,
    /// 優先する言語がない場合に使用する言語。
    pub default_language: LangCode,
    /// 国コード（ISO 3166-1 alpha-3）。
    pub country: Option<String>,
    /// 記述子の解釈。
    pub variant: EitVariant,
    /// 番組記述の組み立て方。
    pub description: DescriptionMode,

    /// カテゴリが決まらない場合に番組記述をカテゴリとする。
    pub use_description_as_category: bool,
    /// 副題がない場合に番組記述を副題とする。
    pub use_description_as_subtitle: bool,
    /// シーズン番号やエピソード番号の表記を取り除かない。
    pub keep_season_episode_text: bool,
    /// サービス識別のみで局を探す。
    pub sid_match_only: bool,
    /// 局が見つからない場合に作成する。
    pub create_missing_channels: bool,
    /// シーズン番号とエピソード番号を番組記述の末尾に付加する。
    pub append_season_episode: bool,
    /// 語句によるカテゴリをジャンルより優先する。
    pub prefer_custom_category: bool,
    /// 開始時刻と継続時間を分単位に丸める。
    pub round_times: bool,

    /// 開始日に加える日数。
    pub day_offset: i64,
    /// 現地時間のUTCからのずれ（分）。`None`の場合は実行環境のタイムゾーンを使う。
    pub utc_offset_minutes: Option<i32>,
    /// 収集する期間。
    pub window: Option<DateWindow>,
    /// 診断用の出力。
    pub trace: TraceOptions,

    /// 拡張形式イベント記述子の項目名。
    pub item_keys: ItemKeys,
    /// 語句によるカテゴリ。
    pub custom_categories: Vec<CustomCategory>,
    /// ジャンルとカテゴリ名の対応表の上書き。
    pub content_categories: Vec<CategoryOverride>,
}

impl Default for Options {
    fn default() -> Options {
        Options {
            input_language: None,
            default_language: LangCode::ENG,
            country: None,
            variant: EitVariant::default(),
            description: DescriptionMode::default(),
            use_description_as_category: false,
            use_description_as_subtitle: false,
            keep_season_episode_text: false,
            sid_match_only: false,
            create_missing_channels: false,
            append_season_episode: false,
            prefer_custom_category: false,
            round_times: true,
            day_offset: 0,
            utc_offset_minutes: None,
            window: None,
            trace: TraceOptions::default(),
            item_keys: ItemKeys::default(),
            custom_categories: Vec::new(),
            content_categories: Vec::new(),
        }
    }
}

impl Options {
    /// UTCからのずれとして許容する最大値（分）。
    pub const MAX_UTC_OFFSET_MINUTES: i32 = 24 * 60 - 1;

    /// TOML形式の文字列から設定を読み込む。
    pub fn from_toml_str(s: &str) -> Result<Options, ConfigError> {
        let options: Options = toml::from_str(s)?;
        options.validate()?;
        Ok(options)
    }

    /// TOML形式のファイルから設定を読み込む。
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Options, ConfigError> {
        let s = std::fs::read_to_string(path)?;
        Options::from_toml_str(&s)
    }

    /// 値の整合性を検証する。
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(window) = &self.window {
            if window.start >= window.end {
                return Err(ConfigError::Invalid(format!(
                    "window start {} is not before end {}",
                    window.start, window.end,
                )));
            }
        }

        if let Some(offset) = self.utc_offset_minutes {
            if offset.abs() > Self::MAX_UTC_OFFSET_MINUTES {
                return Err(ConfigError::Invalid(format!("utc offset {} is out of range", offset)));
            }
        }

        if let Some(country) = &self.country {
            if country.len() != 3 || !country.is_ascii() {
                return Err(ConfigError::Invalid(format!("invalid country code {:?}", country)));
            }
        }

        Ok(())
    }

    /// 国コードに対応するシーズン番号とエピソード番号の表記法。
    #[inline]
    pub fn grammar(&self) -> SeasonEpisodeGrammar {
        SeasonEpisodeGrammar::for_country(self.country.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_default() {
        let options = Options::from_toml_str("").unwrap();
        assert_eq!(options, Options::default());
        assert_eq!(options.default_language, LangCode::ENG);
        assert!(options.round_times);
        assert_eq!(options.description, DescriptionMode::Combined);
        assert_eq!(options.grammar(), SeasonEpisodeGrammar::Bracket);
    }

    #[test]
    fn test_from_toml_str() {
        let options = Options::from_toml_str(
            r#"
            input_language = "FRA"
            country = "AUS"
            variant = "bell_tv"
            description = "split_extended"
            prefer_custom_category = true
            round_times = false
            day_offset = -1
            utc_offset_minutes = 600
            window = { start = "2024-01-01", end = "2024-01-08" }

            [trace]
            titles = true

            [item_keys]
            director = ["REGIE"]

            [[custom_categories]]
            label = "Cricket"
            patterns = ["cricket", "test match"]

            [[content_categories]]
            content_type = 1
            subtype = 0
            label = "Movie"
            "#,
        )
        .unwrap();

        assert_eq!(options.input_language, Some(LangCode::FRA));
        assert_eq!(options.grammar(), SeasonEpisodeGrammar::Australia);
        assert_eq!(options.variant, EitVariant::BellTv);
        assert_eq!(options.description, DescriptionMode::SplitExtended);
        assert!(options.prefer_custom_category);
        assert!(!options.round_times);
        assert_eq!(options.day_offset, -1);
        assert_eq!(options.utc_offset_minutes, Some(600));
        let window = options.window.unwrap();
        assert!(window.contains(chrono::NaiveDate::from_ymd_opt(2024, 1, 7).unwrap()));
        assert!(!window.contains(chrono::NaiveDate::from_ymd_opt(2024, 1, 8).unwrap()));
        assert!(options.trace.titles);
        assert!(!options.trace.descriptions);
        assert!(options.item_keys.director().contains(&"REGIE"));
        assert!(options.item_keys.director().contains(&"DIRECTOR"));
        assert_eq!(options.custom_categories[0].label, "Cricket");
        assert_eq!(options.content_categories[0].label, "Movie");
    }

    #[test]
    fn test_invalid() {
        assert_matches!(
            Options::from_toml_str(r#"input_language = "en""#),
            Err(ConfigError::Toml(_))
        );
        assert_matches!(
            Options::from_toml_str(r#"window = { start = "2024-01-08", end = "2024-01-01" }"#),
            Err(ConfigError::Invalid(_))
        );
        assert_matches!(
            Options::from_toml_str("utc_offset_minutes = 1440"),
            Err(ConfigError::Invalid(_))
        );
        assert_matches!(
            Options::from_toml_str(r#"country = "AU""#),
            Err(ConfigError::Invalid(_))
        );
    }
}
