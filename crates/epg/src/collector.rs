//! EITのセクションから番組表を組み立てる。

use chrono::{NaiveDateTime, TimeZone, Timelike};
use thiserror::Error;

use crate::category::{find_custom, CategoryEntry, CategoryKey, CategoryTable, CategoryXref};
use crate::config::{DescriptionMode, Options};
use crate::entry::{DecodeStats, EventEntry};
use crate::heuristics;
use crate::psi::table::{Eit, EitError, EitHeader};
use crate::psi::{PsiError, PsiSection};
use crate::rating;
use crate::schedule::{ScheduleEntry, SectionKey, Station, StationStore};

/// セクションの処理で発生するエラー。
///
/// いずれもセクション単位で完結し、後続のセクションの処理には影響しない。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SectionError {
    /// セクションとして不正。
    #[error("PSI error: {0}")]
    Psi(#[from] PsiError),

    /// EITのテーブルIDではない。
    #[error("table id 0x{0:02X} is not an EIT")]
    NotEit(u8),

    /// セクションシンタクスがない。
    #[error("EIT section has no section syntax")]
    MissingSyntax,

    /// データが足りない。
    #[error("EIT needs {expected} bytes but only {actual} remain")]
    ShortBuffer {
        /// 必要なバイト数。
        expected: usize,
        /// 実際のバイト数。
        actual: usize,
    },
}

impl From<EitError> for SectionError {
    fn from(e: EitError) -> SectionError {
        match e {
            EitError::NotEit(table_id) => SectionError::NotEit(table_id),
            EitError::MissingSyntax => SectionError::MissingSyntax,
            EitError::ShortBuffer { expected, actual } => {
                SectionError::ShortBuffer { expected, actual }
            }
        }
    }
}

/// セクション1つを処理した結果の集計。
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SectionReport {
    /// 局が見つからず、セクションを破棄した。
    pub discarded: bool,
    /// 処理済みのセクションだった。
    pub duplicate: bool,
    /// 途中でイベントを読み取れなくなり、残りのイベントを破棄した。
    pub truncated: bool,
    /// 局に渡した番組の数。
    pub emitted: usize,
    /// 開始時間や番組名がなく、登録しなかったイベントの数。
    pub skipped: usize,
    /// 収集する期間外のため登録しなかったイベントの数。
    pub filtered: usize,
    /// 読み取りに失敗したイベントの数。
    pub failed: usize,
}

/// EITのセクションを順に受け取り、番組表を組み立てて局に渡す。
///
/// ジャンルの使用回数や診断用の記録は`Collector`ごとに保持する。
#[derive(Debug)]
pub struct Collector {
    options: Options,
    categories: CategoryTable,
    stats: DecodeStats,
    xref: CategoryXref,
    title_log: Vec<String>,
    description_log: Vec<String>,
}

impl Collector {
    /// `options`に従う`Collector`を生成する。
    pub fn new(options: Options) -> Collector {
        let categories = CategoryTable::with_overrides(&options.content_categories);
        Collector {
            options,
            categories,
            stats: DecodeStats::default(),
            xref: CategoryXref::default(),
            title_log: Vec::new(),
            description_log: Vec::new(),
        }
    }

    /// 設定を返す。
    #[inline]
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// ジャンルの対応表と使用回数を返す。
    #[inline]
    pub fn categories(&self) -> &CategoryTable {
        &self.categories
    }

    /// 記述子や言語の使用回数を返す。
    #[inline]
    pub fn stats(&self) -> &DecodeStats {
        &self.stats
    }

    /// 番組とジャンルの相互参照を返す。
    #[inline]
    pub fn xref(&self) -> &CategoryXref {
        &self.xref
    }

    /// 番組名の記録を返す。
    #[inline]
    pub fn title_log(&self) -> &[String] {
        &self.title_log
    }

    /// 番組記述の記録を返す。
    #[inline]
    pub fn description_log(&self) -> &[String] {
        &self.description_log
    }

    /// CRC付きのセクションを処理する。
    pub fn process<S: StationStore>(
        &mut self,
        section: &[u8],
        store: &mut S,
    ) -> Result<SectionReport, SectionError> {
        let (psi, _) = PsiSection::parse(section)?;
        self.process_psi(&psi, store)
    }

    /// パース済みのセクションを処理する。
    ///
    /// 局が見つからない場合や処理済みのセクションはエラーとせず、
    /// [`SectionReport`]にその旨を記録して返す。
    pub fn process_psi<S: StationStore>(
        &mut self,
        psi: &PsiSection,
        store: &mut S,
    ) -> Result<SectionReport, SectionError> {
        let eit = Eit::read(psi)?;
        let header = &eit.header;
        let mut report = SectionReport::default();

        let Some(station) = resolve_station(&self.options, store, header) else {
            log::trace!(
                "no station for {}:{}:{}",
                header.original_network_id,
                header.transport_stream_id,
                header.service_id,
            );
            report.discarded = true;
            return Ok(report);
        };

        let key = SectionKey::from(header);
        if !station.is_new_section(&key) {
            report.duplicate = true;
            return Ok(report);
        }

        for event in eit.events {
            let event = match event {
                Ok(event) => event,
                Err(e) => {
                    log::warn!("{} EIT error: service {}", e, header.service_id);
                    station.unset_section(&key);
                    report.truncated = true;
                    break;
                }
            };

            let entry = match EventEntry::decode(&event, &self.options, &mut self.stats) {
                Ok(entry) => entry,
                Err(e) => {
                    log::debug!("{} EIT error: event {}", e, event.event_id);
                    report.failed += 1;
                    continue;
                }
            };

            match self.build(header, entry) {
                Built::Entry(entry) => {
                    station.append(entry);
                    report.emitted += 1;
                }
                Built::Skipped => report.skipped += 1,
                Built::Filtered => report.filtered += 1,
            }
        }

        Ok(report)
    }

    fn build(&mut self, header: &EitHeader, entry: EventEntry) -> Built {
        let Some(utc) = entry.start_time else {
            return Built::Skipped;
        };
        let Some(mut title) = entry.event_name.clone() else {
            log::debug!("event {} has no name", entry.event_id);
            return Built::Skipped;
        };

        let Some(start) = self.local_start(utc) else {
            log::debug!("invalid EventEntry::start_time");
            return Built::Skipped;
        };
        let date = start.date();
        if let Some(window) = &self.options.window {
            if !window.contains(date) {
                return Built::Filtered;
            }
        }
        let duration = if self.options.round_times {
            (entry.duration + 30) / 60 * 60
        } else {
            entry.duration
        };

        let (mut description, mut subtitle) = self.split_description(&mut title, &entry);
        if self.options.use_description_as_subtitle && subtitle.is_none() {
            subtitle.clone_from(&description);
        }

        let (season_number, episode_number) =
            self.resolve_season_episode(&entry, &mut description, &mut subtitle);
        if self.options.append_season_episode {
            if let Some(suffix) = self.options.grammar().format(season_number, episode_number) {
                description = Some(match description {
                    Some(d) => format!("{} {}", d, suffix),
                    None => suffix,
                });
            }
        }

        let category = self.resolve_category(header, &entry, &title, description.as_deref(), start);

        let (parental_rating, advisories) = match &entry.bell_rating {
            Some(bell) => (
                rating::bell_rating_label(bell).map(str::to_owned),
                rating::bell_advisories(bell),
            ),
            None => {
                let country = self.options.country.as_deref();
                let label = entry
                    .parental_rating
                    .and_then(|r| rating::parental_rating_label(country, &r));
                (label, Vec::new())
            }
        };

        let audio = match entry.audio_type {
            Some(3) => Some("stereo"),
            Some(5) => Some("dolby digital"),
            _ => None,
        };
        let high_definition = entry.high_definition || entry.video_type.is_some_and(|t| t > 9);

        if self.options.trace.titles {
            self.title_log.push(format!("{} {} {}", header.service_id, start, title));
        }
        if self.options.trace.descriptions {
            if let Some(d) = &description {
                self.description_log.push(format!("{} {} {}", header.service_id, start, d));
            }
        }

        Built::Entry(ScheduleEntry {
            original_network_id: header.original_network_id,
            transport_stream_id: header.transport_stream_id,
            service_id: header.service_id,
            event_id: entry.event_id,
            title,
            description,
            subtitle,
            category,
            parental_rating,
            advisories,
            star_rating: entry.star_rating,
            cast: entry.cast,
            directors: entry.directors,
            writers: entry.writers,
            year: entry.year,
            country: entry.country,
            season_number,
            episode_number,
            original_air_date: entry.original_air_date,
            crid: entry.crid,
            language: entry.lang_code,
            date,
            start,
            duration,
            audio,
            high_definition,
            subtitles: entry.subtitle_type.is_some(),
            scrambled: entry.scrambled,
        })
    }

    /// UTCの開始時刻を現地時間に変換し、日数の補正と丸めを行う。
    fn local_start(&self, utc: NaiveDateTime) -> Option<NaiveDateTime> {
        let local = match self.options.utc_offset_minutes {
            Some(minutes) => {
                utc.checked_add_signed(chrono::Duration::minutes(minutes as i64))?
            }
            None => chrono::Local.from_utc_datetime(&utc).naive_local(),
        };
        let local = local.checked_add_signed(chrono::Duration::days(self.options.day_offset))?;

        if !self.options.round_times {
            return Some(local);
        }
        let second = local.second();
        let truncated = local.checked_sub_signed(chrono::Duration::seconds(second as i64))?;
        if second >= 30 {
            truncated.checked_add_signed(chrono::Duration::minutes(1))
        } else {
            Some(truncated)
        }
    }

    /// 設定に従って番組記述と副題を組み立てる。
    fn split_description(
        &self,
        title: &mut String,
        entry: &EventEntry,
    ) -> (Option<String>, Option<String>) {
        match self.options.description {
            DescriptionMode::ShortOnly => (entry.short_description.clone(), None),
            DescriptionMode::SplitExtended => {
                let subtitle = entry
                    .extended_description
                    .as_deref()
                    .and_then(heuristics::split_subtitle)
                    .map(|(subtitle, _)| subtitle);
                (entry.short_description.clone(), subtitle)
            }
            DescriptionMode::Combined => {
                let Some(mut text) = entry
                    .short_description
                    .clone()
                    .or_else(|| entry.extended_description.clone())
                else {
                    return (None, None);
                };

                if let Some((joined, rest)) = heuristics::join_title_continuation(title, &text) {
                    *title = joined;
                    text = rest;
                }
                match heuristics::split_subtitle(&text) {
                    Some((subtitle, rest)) => (non_empty(rest), Some(subtitle)),
                    None => (non_empty(text), None),
                }
            }
        }
    }

    /// 国ごとの表記で番組記述や副題からシーズン番号とエピソード番号を探し、
    /// 見つからなければイベントの値を使う。
    fn resolve_season_episode(
        &self,
        entry: &EventEntry,
        description: &mut Option<String>,
        subtitle: &mut Option<String>,
    ) -> (Option<u32>, Option<u32>) {
        let grammar = self.options.grammar();
        for text in [description, subtitle] {
            let Some(s) = text.as_deref() else {
                continue;
            };
            let Some(found) = grammar.scan(s) else {
                continue;
            };
            if !self.options.keep_season_episode_text {
                *text = non_empty(found.strip_from(s));
            }
            return (
                found.season.or(entry.season_number),
                found.episode.or(entry.episode_number),
            );
        }

        (entry.season_number, entry.episode_number)
    }

    /// ジャンルや語句からカテゴリを決める。
    fn resolve_category(
        &mut self,
        header: &EitHeader,
        entry: &EventEntry,
        title: &str,
        description: Option<&str>,
        start: NaiveDateTime,
    ) -> Option<String> {
        if let (Some(genre), true) = (&entry.genre, self.options.trace.categories) {
            self.xref.insert(
                CategoryKey {
                    original_network_id: header.original_network_id,
                    transport_stream_id: header.transport_stream_id,
                    service_id: header.service_id,
                    start_time: start,
                },
                CategoryEntry {
                    event_name: title.to_owned(),
                    content_type: genre.content_nibble_level_1,
                    subtype: genre.content_nibble_level_2,
                },
            );
        }

        let customs = &self.options.custom_categories;
        let custom = || {
            find_custom(customs, title)
                .or_else(|| description.and_then(|d| find_custom(customs, d)))
                .map(str::to_owned)
        };

        if self.options.prefer_custom_category {
            if let Some(label) = custom() {
                return Some(label);
            }
        }

        if let Some(genre) = &entry.genre {
            let found = self.categories.record_usage(
                genre.content_nibble_level_1,
                genre.content_nibble_level_2,
                Some(title),
            );
            if let Some(category) = found {
                return Some(category.label.clone());
            }
        }

        if !self.options.prefer_custom_category {
            if let Some(label) = custom() {
                return Some(label);
            }
        }

        if self.options.use_description_as_category {
            return entry.short_description.clone();
        }
        None
    }
}

enum Built {
    Entry(ScheduleEntry),
    Skipped,
    Filtered,
}

/// 設定に従ってセクションの局を探し、必要であれば作成する。
fn resolve_station<'s, S: StationStore>(
    options: &Options,
    store: &'s mut S,
    header: &EitHeader,
) -> Option<&'s mut S::Station> {
    let onid = header.original_network_id;
    let tsid = header.transport_stream_id;
    let sid = header.service_id;

    let found = if options.sid_match_only {
        store.find_by_service(sid).is_some()
    } else {
        store.find(onid, tsid, sid).is_some()
    };

    match (found, options.sid_match_only) {
        (true, true) => store.find_by_service(sid),
        (true, false) => store.find(onid, tsid, sid),
        (false, _) if options.create_missing_channels => Some(store.create(onid, tsid, sid)),
        (false, _) => None,
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
