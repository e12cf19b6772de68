//! EN 300 468で規定されるEITと関連する型の定義。

use std::fmt;
use std::ops::RangeInclusive;

use thiserror::Error;

use crate::psi::desc::DescriptorBlock;
use crate::psi::PsiSection;
use crate::time::{self, DateTime, TimeError};
use crate::utils::BytesExt;

/// オリジナルネットワーク識別。
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct NetworkId(pub u16);

impl_id!(NetworkId);

/// トランスポートストリーム識別。
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct TransportStreamId(pub u16);

impl_id!(TransportStreamId);

/// サービス識別。
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ServiceId(pub u16);

impl_id!(ServiceId);

/// イベント識別。
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct EventId(pub u16);

impl_id!(EventId);

/// 進行状態。
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunningStatus {
    /// 未定義。
    #[default]
    Undefined,
    /// 非実行中。
    NotRunning,
    /// 数秒以内に開始（例：映像記録用）。
    StartsSoon,
    /// 停止中。
    Pausing,
    /// 実行中。
    Running,
    /// サービスが休止中。
    ServiceOffAir,
    /// 予約。
    Reserved,
}

impl From<u8> for RunningStatus {
    #[inline]
    fn from(value: u8) -> RunningStatus {
        match value {
            0 => RunningStatus::Undefined,
            1 => RunningStatus::NotRunning,
            2 => RunningStatus::StartsSoon,
            3 => RunningStatus::Pausing,
            4 => RunningStatus::Running,
            5 => RunningStatus::ServiceOffAir,
            _ => RunningStatus::Reserved,
        }
    }
}

/// EITの読み取りで発生するエラー。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EitError {
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

/// EITの種類。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EitKind {
    /// 自TSにおけるイベント［現在／次］。
    ActualPf,
    /// 他TSにおけるイベント［現在／次］。
    OtherPf,
    /// 自TSにおけるイベント［スケジュール］。
    ActualSchedule,
    /// 他TSにおけるイベント［スケジュール］。
    OtherSchedule,
}

impl EitKind {
    /// 自TSにおけるイベント［現在／次］を格納するEITのテーブルID。
    pub const TABLE_ID_PF_ACTUAL: u8 = 0x4E;
    /// 他TSにおけるイベント［現在／次］を格納するEITのテーブルID。
    pub const TABLE_ID_PF_OTHER: u8 = 0x4F;
    /// 自TSにおけるイベント［スケジュール］を格納するEITのテーブルID。
    pub const TABLE_ID_SCHEDULE_ACTUAL: RangeInclusive<u8> = 0x50..=0x5F;
    /// 他TSにおけるイベント［スケジュール］を格納するEITのテーブルID。
    pub const TABLE_ID_SCHEDULE_OTHER: RangeInclusive<u8> = 0x60..=0x6F;

    /// テーブルIDからEITの種類を返す。
    ///
    /// EITのテーブルIDでなければ`None`を返す。
    pub fn from_table_id(table_id: u8) -> Option<EitKind> {
        match table_id {
            Self::TABLE_ID_PF_ACTUAL => Some(EitKind::ActualPf),
            Self::TABLE_ID_PF_OTHER => Some(EitKind::OtherPf),
            0x50..=0x5F => Some(EitKind::ActualSchedule),
            0x60..=0x6F => Some(EitKind::OtherSchedule),
            _ => None,
        }
    }
}

/// EITのセクションに共通するヘッダ。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EitHeader {
    /// テーブル識別。
    pub table_id: u8,
    /// サービス識別。
    pub service_id: ServiceId,
    /// バージョン番号。
    pub version_number: u8,
    /// カレントネクスト指示。
    pub current_next_indicator: bool,
    /// セクション番号。
    pub section_number: u8,
    /// 最終セクション番号。
    pub last_section_number: u8,
    /// トランスポートストリーム識別。
    pub transport_stream_id: TransportStreamId,
    /// オリジナルネットワーク識別。
    pub original_network_id: NetworkId,
    /// セグメント最終セクション番号。
    pub segment_last_section_number: u8,
    /// 最終テーブル識別。
    pub last_table_id: u8,
}

/// 各サービスに含まれるイベント。
///
/// 開始時間と継続時間は未検証のまま保持し、取り出す際に検証する。
#[derive(Debug, PartialEq, Eq)]
pub struct EitEvent<'a> {
    /// イベント識別。
    pub event_id: EventId,
    /// 開始時間（MJDとBCD）。
    pub start_time: [u8; 5],
    /// 継続時間（BCD）。
    pub duration: [u8; 3],
    /// 進行状態。
    pub running_status: RunningStatus,
    /// スクランブル。
    pub free_ca_mode: bool,
    /// 記述子の塊。
    pub descriptors: DescriptorBlock<'a>,
}

impl<'a> EitEvent<'a> {
    /// 記述子ループより前の固定長部分の長さ。
    pub const HEADER_LEN: usize = 12;

    /// `data`の先頭からイベントを1つ読み取り、後続データと共に返す。
    pub fn read(data: &'a [u8]) -> Result<(EitEvent<'a>, &'a [u8]), EitError> {
        if data.len() < Self::HEADER_LEN {
            log::debug!("invalid EitEvent");
            return Err(EitError::ShortBuffer {
                expected: Self::HEADER_LEN,
                actual: data.len(),
            });
        }

        let event_id = EventId(data[0..=1].read_be_16());
        let start_time = [data[2], data[3], data[4], data[5], data[6]];
        let duration = [data[7], data[8], data[9]];
        let running_status = ((data[10] & 0b11100000) >> 5).into();
        let free_ca_mode = data[10] & 0b00010000 != 0;
        let Some((descriptors, rem)) = DescriptorBlock::read(&data[10..]) else {
            log::debug!("invalid EitEvent::descriptors");
            let length = data[10..=11].read_be_16() & 0b0000_1111_1111_1111;
            return Err(EitError::ShortBuffer {
                expected: Self::HEADER_LEN + length as usize,
                actual: data.len(),
            });
        };

        let event = EitEvent {
            event_id,
            start_time,
            duration,
            running_status,
            free_ca_mode,
            descriptors,
        };
        Ok((event, rem))
    }

    /// 開始時間を返す。
    ///
    /// 未定義の場合は`Ok(None)`を返す。
    #[inline]
    pub fn start_time(&self) -> Result<Option<DateTime>, TimeError> {
        DateTime::read(&self.start_time)
    }

    /// 継続時間を秒単位で返す。
    #[inline]
    pub fn duration(&self) -> Result<u32, TimeError> {
        time::read_bcd_duration(&self.duration)
    }
}

/// EITに含まれるイベントのイテレーター。
///
/// 記述子ループ長がセクションを超えるイベントではエラーを1度だけ返し、以降は何も返さない。
#[derive(Clone)]
pub struct EitEventIter<'a>(&'a [u8]);

impl<'a> Iterator for EitEventIter<'a> {
    type Item = Result<EitEvent<'a>, EitError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.0.is_empty() {
            return None;
        }

        match EitEvent::read(self.0) {
            Ok((event, rem)) => {
                self.0 = rem;
                Some(Ok(event))
            }
            Err(e) => {
                self.0 = &[];
                Some(Err(e))
            }
        }
    }
}

impl<'a> std::iter::FusedIterator for EitEventIter<'a> {}

impl<'a> fmt::Debug for EitEventIter<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EitEventIter({} bytes)", self.0.len())
    }
}

/// EIT（Event Information Table）。
#[derive(Debug)]
pub struct Eit<'a> {
    /// ヘッダ。
    pub header: EitHeader,
    /// イベントのイテレーター。
    pub events: EitEventIter<'a>,
}

impl<'a> Eit<'a> {
    /// `psi`から`Eit`を読み取る。
    ///
    /// イベントは読み取らず、`events`を走査して初めて読み取る。
    pub fn read(psi: &PsiSection<'a>) -> Result<Eit<'a>, EitError> {
        if EitKind::from_table_id(psi.table_id).is_none() {
            log::debug!("invalid Eit");
            return Err(EitError::NotEit(psi.table_id));
        }
        let Some(syntax) = psi.syntax.as_ref() else {
            log::debug!("invalid Eit::syntax");
            return Err(EitError::MissingSyntax);
        };

        let data = psi.data;
        if data.len() < 6 {
            log::debug!("invalid Eit");
            return Err(EitError::ShortBuffer {
                expected: 6,
                actual: data.len(),
            });
        }

        let header = EitHeader {
            table_id: psi.table_id,
            service_id: ServiceId(syntax.table_id_extension),
            version_number: syntax.version_number,
            current_next_indicator: syntax.current_next_indicator,
            section_number: syntax.section_number,
            last_section_number: syntax.last_section_number,
            transport_stream_id: TransportStreamId(data[0..=1].read_be_16()),
            original_network_id: NetworkId(data[2..=3].read_be_16()),
            segment_last_section_number: data[4],
            last_table_id: data[5],
        };

        Ok(Eit {
            header,
            events: EitEventIter(&data[6..]),
        })
    }
}
