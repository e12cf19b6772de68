//! 組み立てた番組表の受け渡し先。

use indexmap::IndexMap;
use serde::Serialize;

use crate::lang::LangCode;
use crate::psi::table::{EitHeader, EventId, NetworkId, ServiceId, TransportStreamId};
use crate::psi::{PsiSectionSyntax, Repository};

/// 局に登録される番組表の1項目。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleEntry {
    /// オリジナルネットワーク識別。
    pub original_network_id: NetworkId,
    /// トランスポートストリーム識別。
    pub transport_stream_id: TransportStreamId,
    /// サービス識別。
    pub service_id: ServiceId,
    /// イベント識別。
    pub event_id: EventId,

    /// 番組名。
    pub title: String,
    /// 番組記述。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// 副題。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    /// ジャンルの表示名。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// 視聴年齢制限の表示名。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parental_rating: Option<String>,
    /// 内容に関する注意事項。
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub advisories: Vec<&'static str>,
    /// 星による評価。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub star_rating: Option<String>,

    /// 出演者。
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cast: Vec<String>,
    /// 監督。
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub directors: Vec<String>,
    /// 脚本。
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub writers: Vec<String>,
    /// 制作年。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<u16>,
    /// 制作国。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    /// シーズン番号。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season_number: Option<u32>,
    /// エピソード番号。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode_number: Option<u32>,
    /// 初回放送日。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_air_date: Option<chrono::NaiveDate>,
    /// シリーズまたはエピソードのCRID。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crid: Option<String>,

    /// 番組名の言語。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<LangCode>,
    /// 開始日（現地時間）。
    pub date: chrono::NaiveDate,
    /// 開始時刻（現地時間）。
    pub start: chrono::NaiveDateTime,
    /// 継続時間（秒）。
    pub duration: u32,

    /// 音声の種類の表示名。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<&'static str>,
    /// HD映像かどうか。
    pub high_definition: bool,
    /// 字幕があるかどうか。
    pub subtitles: bool,
    /// スクランブルされているかどうか。
    pub scrambled: bool,
}

/// 局ごとの再送判定に用いるセクションの識別情報。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SectionKey {
    /// テーブル識別。
    pub table_id: u8,
    /// バージョン番号。
    pub version_number: u8,
    /// セクション番号。
    pub section_number: u8,
    /// 最終セクション番号。
    pub last_section_number: u8,
    /// セグメント最終セクション番号。
    pub segment_last_section_number: u8,
    /// 最終テーブル識別。
    pub last_table_id: u8,
}

impl From<&EitHeader> for SectionKey {
    fn from(header: &EitHeader) -> SectionKey {
        SectionKey {
            table_id: header.table_id,
            version_number: header.version_number,
            section_number: header.section_number,
            last_section_number: header.last_section_number,
            segment_last_section_number: header.segment_last_section_number,
            last_table_id: header.last_table_id,
        }
    }
}

/// 番組表を受け取る局。
pub trait Station {
    /// `key`のセクションが未処理かどうかを返し、処理済みとして記録する。
    fn is_new_section(&mut self, key: &SectionKey) -> bool;

    /// `key`のセクションを未処理に戻す。
    ///
    /// 途中で処理を打ち切ったセクションを再送時に改めて処理するために呼ばれる。
    fn unset_section(&mut self, key: &SectionKey) {
        let _ = key;
    }

    /// 番組表に項目を追加する。
    fn append(&mut self, entry: ScheduleEntry);
}

/// 局の一覧。
pub trait StationStore {
    /// 局の型。
    type Station: Station;

    /// ネットワーク、トランスポートストリーム、サービスの組で局を探す。
    fn find(
        &mut self,
        original_network_id: NetworkId,
        transport_stream_id: TransportStreamId,
        service_id: ServiceId,
    ) -> Option<&mut Self::Station>;

    /// サービス識別のみで局を探す。
    fn find_by_service(&mut self, service_id: ServiceId) -> Option<&mut Self::Station>;

    /// 局を作成する。
    fn create(
        &mut self,
        original_network_id: NetworkId,
        transport_stream_id: TransportStreamId,
        service_id: ServiceId,
    ) -> &mut Self::Station;
}

/// メモリ上に番組表を保持する局。
#[derive(Debug, Default)]
pub struct MemoryStation {
    /// 局名。
    pub name: Option<String>,
    /// 受け取った番組表。
    pub entries: Vec<ScheduleEntry>,
    repo: Repository,
}

impl MemoryStation {
    /// 空の局を生成する。
    #[inline]
    pub fn new() -> MemoryStation {
        MemoryStation::default()
    }

    /// 処理済みセクションの記録を消去する。
    pub fn reset_sections(&mut self) {
        self.repo.clear();
    }
}

impl Station for MemoryStation {
    fn is_new_section(&mut self, key: &SectionKey) -> bool {
        let syntax = PsiSectionSyntax {
            table_id_extension: 0,
            version_number: key.version_number,
            current_next_indicator: true,
            section_number: key.section_number,
            last_section_number: key.last_section_number,
        };
        self.repo.check(key.table_id, 0, &syntax)
    }

    fn unset_section(&mut self, key: &SectionKey) {
        self.repo.unset(key.table_id, 0, key.section_number);
    }

    #[inline]
    fn append(&mut self, entry: ScheduleEntry) {
        self.entries.push(entry);
    }
}

/// [`MemoryStation`]を登録順に保持する局の一覧。
#[derive(Debug, Default)]
pub struct MemoryStore {
    stations: IndexMap<(NetworkId, TransportStreamId, ServiceId), MemoryStation>,
}

impl MemoryStore {
    /// 空の一覧を生成する。
    #[inline]
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }

    /// 局の数を返す。
    #[inline]
    pub fn len(&self) -> usize {
        self.stations.len()
    }

    /// 局がなければ`true`を返す。
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// 局を登録順に走査する。
    pub fn iter(
        &self,
    ) -> impl Iterator<Item = (&(NetworkId, TransportStreamId, ServiceId), &MemoryStation)> {
        self.stations.iter()
    }

    /// 全局の番組表を登録順に走査する。
    pub fn entries(&self) -> impl Iterator<Item = &ScheduleEntry> {
        self.stations.values().flat_map(|s| s.entries.iter())
    }
}

impl StationStore for MemoryStore {
    type Station = MemoryStation;

    fn find(
        &mut self,
        original_network_id: NetworkId,
        transport_stream_id: TransportStreamId,
        service_id: ServiceId,
    ) -> Option<&mut MemoryStation> {
        self.stations
            .get_mut(&(original_network_id, transport_stream_id, service_id))
    }

    fn find_by_service(&mut self, service_id: ServiceId) -> Option<&mut MemoryStation> {
        self.stations
            .iter_mut()
            .find(|((_, _, sid), _)| *sid == service_id)
            .map(|(_, station)| station)
    }

    fn create(
        &mut self,
        original_network_id: NetworkId,
        transport_stream_id: TransportStreamId,
        service_id: ServiceId,
    ) -> &mut MemoryStation {
        self.stations
            .entry((original_network_id, transport_stream_id, service_id))
            .or_default()
    }
}
