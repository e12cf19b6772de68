//! EITのイベント1件を番組情報として組み立てる。

use std::sync::LazyLock;

use fxhash::FxHashMap;
use regex::Regex;
use thiserror::Error;

use crate::config::Options;
use crate::lang::LangCode;
use crate::psi::desc::{
    BellRatingDescriptor, ContentGenre, DescriptorError, EventDescriptor, ExtendedEventDescriptor,
    ParentalRating, ShortEventDescriptor, StreamKind,
};
use crate::psi::table::{EitEvent, EventId, RunningStatus};
use crate::text::{Codepage, DvbStr, DvbString};
use crate::time::TimeError;

/// イベントの組み立てで発生するエラー。
///
/// イベントの長さ自体が不正な場合は[`EitError`](crate::psi::table::EitError)として
/// イベントを読み取る時点で検出される。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntryError {
    /// 記述子ループ内の記述子が壊れている。
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    /// 開始時間や継続時間が不正である。
    #[error("invalid field: {0}")]
    InvalidField(#[from] TimeError),
}

/// 拡張形式イベント記述子の項目名。
///
/// 組み込みの項目名に加え、設定で与えられた項目名も大文字小文字を区別せず照合する。
#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(default)]
pub struct ItemKeys {
    /// 監督。
    pub director: Vec<String>,
    /// 出演者。
    pub cast: Vec<String>,
    /// 脚本。
    pub writer: Vec<String>,
    /// 制作年。
    pub year: Vec<String>,
    /// 星による評価。
    pub star_rating: Vec<String>,
    /// `シーズン:エピソード`形式の番号。
    pub season_episode: Vec<String>,
    /// エピソード番号のみ。
    pub episode: Vec<String>,
    /// 制作国。
    pub country: Vec<String>,
}

impl ItemKeys {
    /// 組み込みの監督の項目名。
    pub const DIRECTOR: &'static [&'static str] =
        &["DIRECTOR", "DIRECTORS", "DIR", "ΣΚΗΝΟΘΕΣΙΑ", "РЕЖИССЕР"];
    /// 組み込みの出演者の項目名。
    pub const CAST: &'static [&'static str] = &["ACTORS", "ACTOR", "CAST", "ΗΘΟΠΟΙΟΙ", "В РОЛЯХ"];
    /// 組み込みの脚本の項目名。
    pub const WRITER: &'static [&'static str] = &["WRITER", "WRITERS", "SCREENPLAY"];
    /// 組み込みの制作年の項目名。
    pub const YEAR: &'static [&'static str] = &["YEAR", "PRODUCTION YEAR"];
    /// 組み込みの星による評価の項目名。
    pub const STAR_RATING: &'static [&'static str] = &["STAR", "STARS", "STAR RATING"];
    /// 組み込みの`シーズン:エピソード`の項目名。
    pub const SEASON_EPISODE: &'static [&'static str] = &["TEP"];
    /// 組み込みのエピソード番号の項目名。
    pub const EPISODE: &'static [&'static str] = &["EPISODENO"];
    /// 組み込みの制作国の項目名。
    pub const COUNTRY: &'static [&'static str] = &["COUNTRY"];

    fn merge<'a>(builtin: &'a [&'static str], extra: &'a [String]) -> Vec<&'a str> {
        builtin
            .iter()
            .copied()
            .chain(extra.iter().map(String::as_str))
            .collect()
    }

    /// 監督の項目名。
    pub fn director(&self) -> Vec<&str> {
        Self::merge(Self::DIRECTOR, &self.director)
    }

    /// 出演者の項目名。
    pub fn cast(&self) -> Vec<&str> {
        Self::merge(Self::CAST, &self.cast)
    }

    /// 脚本の項目名。
    pub fn writer(&self) -> Vec<&str> {
        Self::merge(Self::WRITER, &self.writer)
    }

    /// 制作年の項目名。
    pub fn year(&self) -> Vec<&str> {
        Self::merge(Self::YEAR, &self.year)
    }

    /// 星による評価の項目名。
    pub fn star_rating(&self) -> Vec<&str> {
        Self::merge(Self::STAR_RATING, &self.star_rating)
    }

    /// `シーズン:エピソード`の項目名。
    pub fn season_episode(&self) -> Vec<&str> {
        Self::merge(Self::SEASON_EPISODE, &self.season_episode)
    }

    /// エピソード番号の項目名。
    pub fn episode(&self) -> Vec<&str> {
        Self::merge(Self::EPISODE, &self.episode)
    }

    /// 制作国の項目名。
    pub fn country(&self) -> Vec<&str> {
        Self::merge(Self::COUNTRY, &self.country)
    }
}

/// 項目名が`keys`のいずれかと大文字小文字を区別せず一致する最初の項目記述を返す。
///
/// 値は前後の空白を取り除いて返し、空の場合は見つからなかったものとする。
pub fn find_item<I, S>(items: I, keys: &[&str]) -> Option<String>
where
    I: IntoIterator<Item = (S, S)>,
    S: AsRef<str>,
{
    items.into_iter().find_map(|(desc, value)| {
        let desc = desc.as_ref().trim().to_lowercase();
        if !keys.iter().any(|key| key.to_lowercase() == desc) {
            return None;
        }

        let value = value.as_ref().trim();
        (!value.is_empty()).then(|| value.to_owned())
    })
}

/// カンマ区切りの値を分割する。
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

fn parse_number(s: &str) -> Option<u32> {
    let s = s.trim();
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// `シーズン:エピソード`形式の値を読み取る。
pub fn parse_season_episode(value: &str) -> Option<(u32, u32)> {
    let (season, episode) = value.split_once(':')?;
    Some((parse_number(season)?, parse_number(episode)?))
}

/// エピソード番号のみの値を読み取る。
///
/// `Ep 12`のように前置された形式と、`Title|12`のように区切られた形式を受け付ける。
pub fn parse_episode_only(value: &str) -> Option<u32> {
    if let Some((_, episode)) = value.rsplit_once('|') {
        return parse_number(episode);
    }

    let value = value.trim_start();
    let rest = value
        .get(..2)
        .filter(|p| p.eq_ignore_ascii_case("ep"))
        .map(|_| &value[2..])?;
    parse_number(rest)
}

static SEASON_SUFFIX_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" \(S(?P<season>[0-9]+)\)").unwrap());

/// 番組名の中の` (S<数字>)`を探し、シーズン番号と該当する範囲を返す。
pub fn find_season_suffix(name: &str) -> Option<(u32, std::ops::Range<usize>)> {
    SEASON_SUFFIX_REGEX.captures_iter(name).find_map(|caps| {
        let season = caps.name("season")?.as_str().parse().ok()?;
        Some((season, caps.get_match().range()))
    })
}

/// 記述子や文字列の使用状況の統計。
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DecodeStats {
    /// 記述子のタグごとの出現回数。
    pub descriptor_tags: FxHashMap<u8, u64>,
    /// 解釈しなかった記述子の数。
    pub unknown_descriptors: u64,
    /// 読み取りに失敗した記述子の数。
    pub failed_descriptors: u64,
    /// 言語コードごとの出現回数。
    pub languages: FxHashMap<LangCode, u64>,
    /// 文字符号表ごとの出現回数。
    pub codepages: FxHashMap<Codepage, u64>,
}

impl DecodeStats {
    fn count_text(&mut self, lang_code: LangCode, text: &DvbStr) {
        *self.languages.entry(lang_code).or_default() += 1;
        if !text.is_empty() {
            *self.codepages.entry(text.codepage()).or_default() += 1;
        }
    }
}

/// 言語ごとに送出される記述子のうち、どれを採用するかを決める。
#[derive(Debug, Default)]
struct LanguageSlot {
    committed: Option<LangCode>,
}

impl LanguageSlot {
    /// `lang_code`の記述子で値を上書きするかどうかを返し、上書きする場合はその言語を記録する。
    fn accept(&mut self, lang_code: LangCode, preferred: Option<LangCode>, default: LangCode) -> bool {
        let accept = match (self.committed, preferred) {
            (None, _) => true,
            (Some(_), None) => true,
            (Some(committed), Some(preferred)) if committed == preferred => false,
            (Some(_), Some(preferred)) => lang_code == preferred || lang_code == default,
        };
        if accept {
            self.committed = Some(lang_code);
        }
        accept
    }
}

/// 複数の記述子から組み立てられた番組情報。
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EventEntry {
    /// イベント識別。
    pub event_id: EventId,
    /// 開始時間（UTC）。未定義の場合は`None`。
    pub start_time: Option<chrono::NaiveDateTime>,
    /// 継続時間（単位は秒）。
    pub duration: u32,
    /// 進行状態。
    pub running_status: RunningStatus,
    /// スクランブル。
    pub scrambled: bool,
    /// 番組名。
    pub event_name: Option<String>,
    /// 番組記述。
    pub short_description: Option<String>,
    /// 拡張記述。
    pub extended_description: Option<String>,
    /// 番組名と番組記述の言語。
    pub lang_code: Option<LangCode>,
    /// 番組名にHD表記があった。
    pub high_definition: bool,
    /// 映像のコンポーネント種別。
    pub video_type: Option<u8>,
    /// 音声のコンポーネント種別。
    pub audio_type: Option<u8>,
    /// 字幕のコンポーネント種別。
    pub subtitle_type: Option<u8>,
    /// ジャンル。
    pub genre: Option<ContentGenre>,
    /// 視聴年齢制限。
    pub parental_rating: Option<ParentalRating>,
    /// Bell TVの番組評価。
    pub bell_rating: Option<BellRatingDescriptor>,
    /// 出演者。
    pub cast: Vec<String>,
    /// 監督。
    pub directors: Vec<String>,
    /// 脚本。
    pub writers: Vec<String>,
    /// 制作年。
    pub year: Option<u16>,
    /// 星による評価。
    pub star_rating: Option<String>,
    /// 制作国。
    pub country: Option<String>,
    /// シリーズまたはエピソードのCRID。
    pub crid: Option<String>,
    /// シーズン番号。
    pub season_number: Option<u32>,
    /// エピソード番号。
    pub episode_number: Option<u32>,
    /// 初回放送日。
    pub original_air_date: Option<chrono::NaiveDate>,
    /// 拡張形式イベント記述子の項目。
    pub items: Vec<(String, String)>,
}

impl EventEntry {
    /// `event`の固定長部分と記述子ループを読み取り、番組情報を組み立てる。
    ///
    /// 記述子の長さが記述子ループに収まっていれば、内容が壊れていても読み飛ばして続行する。
    pub fn decode(
        event: &EitEvent,
        options: &Options,
        stats: &mut DecodeStats,
    ) -> Result<EventEntry, EntryError> {
        let start_time = event
            .start_time()?
            .map(|dt| dt.to_naive())
            .transpose()?;
        // 開始時間が未定義なら継続時間は使われない
        let duration = match start_time {
            Some(_) => event.duration()?,
            None => event.duration().unwrap_or_default(),
        };

        let mut builder = EntryBuilder::new(options);
        builder.entry.event_id = event.event_id;
        builder.entry.start_time = start_time;
        builder.entry.duration = duration;
        builder.entry.running_status = event.running_status;
        builder.entry.scrambled = event.free_ca_mode;

        for raw in &event.descriptors {
            let raw = raw.inspect_err(|_| log::debug!("invalid EitEvent::descriptors"))?;
            *stats.descriptor_tags.entry(raw.tag).or_default() += 1;

            match EventDescriptor::read(raw, options.variant) {
                Ok(EventDescriptor::Unknown(raw)) => {
                    log::debug!("unknown descriptor 0x{:02X}", raw.tag);
                    stats.unknown_descriptors += 1;
                }
                Ok(desc) => builder.apply(desc, stats),
                Err(e) => {
                    log::debug!("skipping descriptor: {}", e);
                    stats.failed_descriptors += 1;
                }
            }
        }

        Ok(builder.finish())
    }
}

/// 記述子ループの間だけ存在する番組情報の組み立て途中の状態。
struct EntryBuilder<'o> {
    options: &'o Options,
    entry: EventEntry,
    short_slot: LanguageSlot,
    extended_slot: LanguageSlot,
    // 現在連結中の拡張記述の言語
    extended_lang: Option<LangCode>,
    extended_open: bool,
    extended_text: DvbString,
}

impl<'o> EntryBuilder<'o> {
    fn new(options: &'o Options) -> EntryBuilder<'o> {
        EntryBuilder {
            options,
            entry: EventEntry::default(),
            short_slot: LanguageSlot::default(),
            extended_slot: LanguageSlot::default(),
            extended_lang: None,
            extended_open: false,
            extended_text: DvbString::new(),
        }
    }

    fn apply(&mut self, desc: EventDescriptor, stats: &mut DecodeStats) {
        match desc {
            EventDescriptor::ShortEvent(desc) => self.apply_short_event(desc, stats),
            EventDescriptor::ExtendedEvent(desc) => self.apply_extended_event(desc, stats),
            EventDescriptor::Component(desc) => {
                let slot = match desc.kind() {
                    StreamKind::Video => &mut self.entry.video_type,
                    StreamKind::Audio => &mut self.entry.audio_type,
                    StreamKind::Subtitle => &mut self.entry.subtitle_type,
                    StreamKind::Other => return,
                };
                slot.get_or_insert(desc.component_type);
            }
            EventDescriptor::Content(desc) => {
                if self.entry.genre.is_none() {
                    self.entry.genre = desc.items.first().copied();
                }
            }
            EventDescriptor::ParentalRating(desc) => {
                if self.entry.parental_rating.is_none() {
                    self.entry.parental_rating = desc.first().copied();
                }
            }
            EventDescriptor::ContentIdentifier(desc) => {
                if self.entry.crid.is_none() {
                    self.entry.crid = desc.link();
                }
            }
            EventDescriptor::BellRating(desc) => {
                if self.entry.star_rating.is_none() && desc.star_rating != 0 {
                    let stars = desc.star_rating / 2;
                    self.entry.star_rating = Some(if desc.star_rating % 2 == 0 {
                        format!("{}", stars)
                    } else {
                        format!("{}.5", stars)
                    });
                }
                self.entry.bell_rating.get_or_insert(desc);
            }
            EventDescriptor::BellSeries(desc) => {
                if desc.series_number != 0 {
                    self.entry.season_number.get_or_insert(desc.series_number as u32);
                }
                if desc.episode_number != 0 {
                    self.entry.episode_number.get_or_insert(desc.episode_number as u32);
                }
                if let Some(date) = desc.original_air_date.and_then(|d| d.to_naive().ok()) {
                    self.entry.original_air_date.get_or_insert(date);
                }
            }
            EventDescriptor::Unknown(_) => {}
        }
    }

    fn apply_short_event(&mut self, desc: ShortEventDescriptor, stats: &mut DecodeStats) {
        stats.count_text(desc.lang_code, desc.event_name);

        let options = self.options;
        if !self.short_slot.accept(desc.lang_code, options.input_language, options.default_language) {
            return;
        }

        self.entry.event_name = non_empty(desc.event_name.decode());
        self.entry.short_description = non_empty(desc.text.decode());
        self.entry.lang_code = Some(desc.lang_code);
        self.entry.high_definition |= desc.high_definition;
    }

    fn apply_extended_event(&mut self, desc: ExtendedEventDescriptor, stats: &mut DecodeStats) {
        stats.count_text(desc.lang_code, desc.text);

        if desc.descriptor_number == 0 || self.extended_slot.committed.is_none() {
            let options = self.options;
            let accepted = self.extended_slot.accept(
                desc.lang_code,
                options.input_language,
                options.default_language,
            );
            // 採用しない記述子の続きも採用しない
            self.extended_open = accepted;
            if !accepted {
                return;
            }

            self.extended_lang = Some(desc.lang_code);
            self.extended_text.clear();
            self.entry.items.clear();
        } else if !self.extended_open || self.extended_lang != Some(desc.lang_code) {
            return;
        }

        self.extended_text.push_fragment(desc.text);
        for item in &desc.items {
            let value = item.item.decode();
            let description = item.item_description.decode();
            match self.entry.items.last_mut() {
                // 項目名が空の場合は直前の項目の続き
                Some((_, prev)) if description.trim().is_empty() => prev.push_str(&value),
                _ => self.entry.items.push((description, value)),
            }
        }
    }

    fn finish(mut self) -> EventEntry {
        if !self.extended_text.is_empty() {
            self.entry.extended_description = non_empty(self.extended_text.decode());
        }

        let keys = &self.options.item_keys;
        let items = &self.entry.items;
        let find = |keys: Vec<&str>| find_item(items.iter().map(|(d, v)| (d, v)), &keys);

        let directors = find(keys.director()).map(|v| split_list(&v));
        let cast = find(keys.cast()).map(|v| split_list(&v));
        let writers = find(keys.writer()).map(|v| split_list(&v));
        let year = find(keys.year()).and_then(|v| v.get(..4).and_then(|y| y.parse().ok()));
        let star_rating = find(keys.star_rating());
        let country = find(keys.country());
        let season_episode = find(keys.season_episode()).and_then(|v| parse_season_episode(&v));
        let episode = find(keys.episode()).and_then(|v| parse_episode_only(&v));

        let entry = &mut self.entry;
        entry.directors = directors.unwrap_or_default();
        entry.cast = cast.unwrap_or_default();
        entry.writers = writers.unwrap_or_default();
        entry.year = year;
        if star_rating.is_some() {
            entry.star_rating = star_rating;
        }
        entry.country = country;
        if let Some((season, episode)) = season_episode {
            entry.season_number = Some(season);
            entry.episode_number = Some(episode);
        } else if let Some(episode) = episode {
            entry.episode_number.get_or_insert(episode);
        }

        if let Some(name) = entry.event_name.as_mut() {
            if let Some((season, range)) = find_season_suffix(name) {
                entry.season_number.get_or_insert(season);
                if !self.options.keep_season_episode_text {
                    name.replace_range(range, "");
                }
            }
        }

        self.entry
    }
}

fn non_empty(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == s.len() {
        Some(s)
    } else {
        Some(trimmed.to_owned())
    }
}
