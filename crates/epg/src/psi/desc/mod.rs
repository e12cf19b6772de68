//! 記述子の定義。

mod base;
mod bell;
mod dvb;

pub use base::*;
pub use bell::*;
pub use dvb::*;

/// EITを送出する放送事業者の種別。
///
/// ユーザ定義領域のタグを持つ記述子の解釈と、番組名の扱いを切り替える。
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EitVariant {
    /// EN 300 468に従う標準のEIT。
    #[default]
    Standard,
    /// Bell TVのEIT。
    BellTv,
}

/// EITのイベントに含まれる記述子。
#[derive(Debug, PartialEq, Eq)]
pub enum EventDescriptor<'a> {
    /// 短形式イベント記述子。
    ShortEvent(ShortEventDescriptor<'a>),
    /// 拡張形式イベント記述子。
    ExtendedEvent(ExtendedEventDescriptor<'a>),
    /// コンポーネント記述子。
    Component(ComponentDescriptor<'a>),
    /// コンテント記述子。
    Content(ContentDescriptor),
    /// パレンタルレート記述子。
    ParentalRating(ParentalRatingDescriptor),
    /// コンテント識別記述子。
    ContentIdentifier(ContentIdentifierDescriptor<'a>),
    /// Bell TVの番組評価記述子。
    BellRating(BellRatingDescriptor),
    /// Bell TVのシリーズ記述子。
    BellSeries(BellSeriesDescriptor),
    /// 解釈しない記述子。
    Unknown(RawDescriptor<'a>),
}

impl<'a> EventDescriptor<'a> {
    /// タグに応じて`raw`の内容を読み取る。
    ///
    /// 未知のタグは[`EventDescriptor::Unknown`]となり、エラーにはならない。
    pub fn read(
        raw: RawDescriptor<'a>,
        variant: EitVariant,
    ) -> Result<EventDescriptor<'a>, DescriptorError> {
        let desc = match (raw.tag, variant) {
            (ShortEventDescriptor::TAG, EitVariant::Standard) => {
                EventDescriptor::ShortEvent(ShortEventDescriptor::read(raw.data)?)
            }
            (ShortEventDescriptor::TAG, EitVariant::BellTv) => {
                EventDescriptor::ShortEvent(ShortEventDescriptor::read(raw.data)?.strip_hd_prefix())
            }
            (ExtendedEventDescriptor::TAG, _) => {
                EventDescriptor::ExtendedEvent(ExtendedEventDescriptor::read(raw.data)?)
            }
            (ComponentDescriptor::TAG, _) => {
                EventDescriptor::Component(ComponentDescriptor::read(raw.data)?)
            }
            (ContentDescriptor::TAG, _) => {
                EventDescriptor::Content(ContentDescriptor::read(raw.data)?)
            }
            (ParentalRatingDescriptor::TAG, _) => {
                EventDescriptor::ParentalRating(ParentalRatingDescriptor::read(raw.data)?)
            }
            (ContentIdentifierDescriptor::TAG, _) => {
                EventDescriptor::ContentIdentifier(ContentIdentifierDescriptor::read(raw.data)?)
            }
            (BellRatingDescriptor::TAG, EitVariant::BellTv) => {
                EventDescriptor::BellRating(BellRatingDescriptor::read(raw.data)?)
            }
            (BellSeriesDescriptor::TAG, EitVariant::BellTv) => {
                EventDescriptor::BellSeries(BellSeriesDescriptor::read(raw.data)?)
            }
            _ => EventDescriptor::Unknown(raw),
        };
        Ok(desc)
    }

    /// `buf`の先頭から記述子を1つ読み取り、後続データと共に返す。
    ///
    /// 宣言された長さに`buf`が満たない場合は[`DescriptorError::ShortBuffer`]を返す。
    pub fn from_bytes(
        buf: &'a [u8],
        variant: EitVariant,
    ) -> Result<(EventDescriptor<'a>, &'a [u8]), DescriptorError> {
        let (raw, tail) = RawDescriptor::read(buf)?;
        Ok((EventDescriptor::read(raw, variant)?, tail))
    }

    /// 記述子のタグ。
    pub fn tag(&self) -> u8 {
        match self {
            EventDescriptor::ShortEvent(_) => ShortEventDescriptor::TAG,
            EventDescriptor::ExtendedEvent(_) => ExtendedEventDescriptor::TAG,
            EventDescriptor::Component(_) => ComponentDescriptor::TAG,
            EventDescriptor::Content(_) => ContentDescriptor::TAG,
            EventDescriptor::ParentalRating(_) => ParentalRatingDescriptor::TAG,
            EventDescriptor::ContentIdentifier(_) => ContentIdentifierDescriptor::TAG,
            EventDescriptor::BellRating(_) => BellRatingDescriptor::TAG,
            EventDescriptor::BellSeries(_) => BellSeriesDescriptor::TAG,
            EventDescriptor::Unknown(raw) => raw.tag,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use hex_literal::hex;

    // 各記述子の正常なバイト列
    const FIXTURES: &[&[u8]] = &[
        &hex!("4D 0D 656E67 04 4E657773 04 54657874"),
        &hex!("4E 10 00 656E67 06 03 414243 01 58 04 54657874"),
        &hex!("50 06 01 0B 01 656E67"),
        &hex!("54 02 10 00"),
        &hex!("55 04 415553 09"),
        &hex!("76 07 04 05 2F31323334"),
        &hex!("F0 03 04 07 A0"),
        &hex!("F1 06 0001 0002 B0A2"),
    ];

    #[test]
    fn test_dispatch() {
        let kinds: Vec<_> = FIXTURES
            .iter()
            .map(|buf| EventDescriptor::from_bytes(buf, EitVariant::BellTv).unwrap())
            .map(|(desc, tail)| {
                assert!(tail.is_empty());
                desc.tag()
            })
            .collect();
        assert_eq!(kinds, [0x4D, 0x4E, 0x50, 0x54, 0x55, 0x76, 0xF0, 0xF1]);

        // 標準のEITではユーザ定義のタグを解釈しない
        let (desc, _) = EventDescriptor::from_bytes(FIXTURES[6], EitVariant::Standard).unwrap();
        assert_matches!(desc, EventDescriptor::Unknown(RawDescriptor { tag: 0xF0, .. }));

        let (desc, tail) = EventDescriptor::from_bytes(&hex!("83 01 00 4D"), EitVariant::Standard).unwrap();
        assert_matches!(desc, EventDescriptor::Unknown(RawDescriptor { tag: 0x83, data: [0x00] }));
        assert_eq!(tail, &[0x4D]);
    }

    #[test]
    fn test_truncated() {
        for buf in FIXTURES {
            for len in 0..buf.len() {
                assert_matches!(
                    EventDescriptor::from_bytes(&buf[..len], EitVariant::BellTv),
                    Err(DescriptorError::ShortBuffer { .. }),
                    "{buf:02X?} truncated to {len}"
                );
            }
        }
    }

    #[test]
    fn test_bell_short_event() {
        let buf = hex!("4D 0C 656E67 07 48442D4E657773 00");
        let (desc, _) = EventDescriptor::from_bytes(&buf, EitVariant::BellTv).unwrap();
        assert_matches!(desc, EventDescriptor::ShortEvent(ShortEventDescriptor { high_definition: true, .. }));

        let (desc, _) = EventDescriptor::from_bytes(&buf, EitVariant::Standard).unwrap();
        assert_matches!(desc, EventDescriptor::ShortEvent(ShortEventDescriptor { high_definition: false, .. }));
    }
}
