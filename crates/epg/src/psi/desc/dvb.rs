//! EN 300 468で規定される記述子の定義。

use smallvec::SmallVec;

use crate::lang::LangCode;
use crate::text::DvbStr;
use crate::utils::BytesExt;

use super::base::{ensure_len, split_len, Descriptor, DescriptorError};

/// 短形式イベント記述子。
#[derive(Debug, PartialEq, Eq)]
pub struct ShortEventDescriptor<'a> {
    /// 言語コード。
    pub lang_code: LangCode,
    /// 番組名。
    pub event_name: &'a DvbStr,
    /// 番組記述。
    pub text: &'a DvbStr,
    /// 番組名に付加されていたHD表記を取り除いたかどうか。
    ///
    /// Bell TVの番組名でのみ`true`になり得る。
    pub high_definition: bool,
}

impl<'a> ShortEventDescriptor<'a> {
    /// Bell TVにおいて番組名の先頭に付けられるHD表記。
    pub const HD_PREFIXES: [&'static [u8]; 2] = [b"HD - ", b"HD-"];

    /// 番組名からHD表記を取り除き、取り除いたかどうかを`high_definition`に設定する。
    ///
    /// 文字符号表の選択バイトを持つ番組名は変更しない。
    pub fn strip_hd_prefix(mut self) -> ShortEventDescriptor<'a> {
        let name = self.event_name.as_bytes();
        if !self.event_name.selector().is_empty() {
            return self;
        }

        if let Some(rest) = Self::HD_PREFIXES
            .iter()
            .find_map(|prefix| name.strip_prefix(*prefix))
        {
            self.event_name = DvbStr::from_bytes(rest);
            self.high_definition = true;
        }
        self
    }
}

impl<'a> Descriptor<'a> for ShortEventDescriptor<'a> {
    const TAG: u8 = 0x4D;

    fn read(data: &'a [u8]) -> Result<ShortEventDescriptor<'a>, DescriptorError> {
        ensure_len(Self::TAG, data, 4).inspect_err(|_| {
            log::debug!("invalid ShortEventDescriptor");
        })?;

        let lang_code = LangCode::read(&[data[0], data[1], data[2]]);
        let event_name_length = data[3];
        let (event_name, data) = split_len(Self::TAG, &data[4..], event_name_length as usize)
            .inspect_err(|_| log::debug!("invalid ShortEventDescriptor::event_name"))?;
        let [text_length, ref text @ ..] = *data else {
            log::debug!("invalid ShortEventDescriptor::text_length");
            return Err(DescriptorError::ShortBuffer {
                tag: Self::TAG,
                expected: 1,
                actual: 0,
            });
        };
        let (text, _) = split_len(Self::TAG, text, text_length as usize)
            .inspect_err(|_| log::debug!("invalid ShortEventDescriptor::text"))?;

        Ok(ShortEventDescriptor {
            lang_code,
            event_name: DvbStr::from_bytes(event_name),
            text: DvbStr::from_bytes(text),
            high_definition: false,
        })
    }
}

/// 拡張形式イベント記述子における項目。
#[derive(Debug, PartialEq, Eq)]
pub struct ExtendedEventItem<'a> {
    /// 項目名。
    pub item_description: &'a DvbStr,
    /// 項目記述。
    pub item: &'a DvbStr,
}

/// 拡張形式イベント記述子。
#[derive(Debug, PartialEq, Eq)]
pub struct ExtendedEventDescriptor<'a> {
    /// 記述子番号（4ビット）。
    pub descriptor_number: u8,
    /// 最終記述子番号（4ビット）。
    pub last_descriptor_number: u8,
    /// 言語コード。
    pub lang_code: LangCode,
    /// 項目を格納する配列。
    pub items: Vec<ExtendedEventItem<'a>>,
    /// 拡張記述。
    pub text: &'a DvbStr,
}

impl<'a> ExtendedEventDescriptor<'a> {
    /// 項目名が`keys`のいずれかと大文字小文字を区別せず一致する最初の項目記述を返す。
    ///
    /// 値は前後の空白を取り除いて返す。
    pub fn find_item(&self, keys: &[&str]) -> Option<String> {
        crate::entry::find_item(
            self.items
                .iter()
                .map(|item| (item.item_description.decode(), item.item.decode())),
            keys,
        )
    }
}

impl<'a> Descriptor<'a> for ExtendedEventDescriptor<'a> {
    const TAG: u8 = 0x4E;

    fn read(data: &'a [u8]) -> Result<ExtendedEventDescriptor<'a>, DescriptorError> {
        ensure_len(Self::TAG, data, 5).inspect_err(|_| {
            log::debug!("invalid ExtendedEventDescriptor");
        })?;

        let descriptor_number = (data[0] & 0b11110000) >> 4;
        let last_descriptor_number = data[0] & 0b00001111;
        let lang_code = LangCode::read(&[data[1], data[2], data[3]]);
        let length_of_items = data[4];
        let (mut items_data, rem) = split_len(Self::TAG, &data[5..], length_of_items as usize)
            .inspect_err(|_| log::debug!("invalid ExtendedEventDescriptor::length_of_items"))?;

        let mut items = Vec::new();
        while !items_data.is_empty() {
            let (item_description, rem) =
                split_len(Self::TAG, &items_data[1..], items_data[0] as usize).inspect_err(
                    |_| log::debug!("invalid ExtendedEventDescriptor::item_description"),
                )?;
            let [item_length, ref rem @ ..] = *rem else {
                log::debug!("invalid ExtendedEventDescriptor::item_length");
                return Err(DescriptorError::ShortBuffer {
                    tag: Self::TAG,
                    expected: 1,
                    actual: 0,
                });
            };
            let (item, rem) = split_len(Self::TAG, rem, item_length as usize)
                .inspect_err(|_| log::debug!("invalid ExtendedEventDescriptor::item"))?;

            items.push(ExtendedEventItem {
                item_description: DvbStr::from_bytes(item_description),
                item: DvbStr::from_bytes(item),
            });
            items_data = rem;
        }

        let [text_length, ref text @ ..] = *rem else {
            log::debug!("invalid ExtendedEventDescriptor::text_length");
            return Err(DescriptorError::ShortBuffer {
                tag: Self::TAG,
                expected: 1,
                actual: 0,
            });
        };
        let (text, _) = split_len(Self::TAG, text, text_length as usize)
            .inspect_err(|_| log::debug!("invalid ExtendedEventDescriptor::text"))?;

        Ok(ExtendedEventDescriptor {
            descriptor_number,
            last_descriptor_number,
            lang_code,
            items,
            text: DvbStr::from_bytes(text),
        })
    }
}

/// コンポーネントの種類。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    /// 映像。
    Video,
    /// 音声。
    Audio,
    /// 字幕。
    Subtitle,
    /// その他。
    Other,
}

/// コンポーネント記述子。
#[derive(Debug, PartialEq, Eq)]
pub struct ComponentDescriptor<'a> {
    /// コンポーネント内容の拡張（4ビット）。
    pub stream_content_ext: u8,
    /// コンポーネント内容（4ビット）。
    pub stream_content: u8,
    /// コンポーネント種別。
    pub component_type: u8,
    /// コンポーネントタグ。
    pub component_tag: u8,
    /// 言語コード。
    pub lang_code: LangCode,
    /// コンポーネント記述。
    pub text: &'a DvbStr,
}

impl<'a> ComponentDescriptor<'a> {
    /// コンポーネント内容からストリームの種類を返す。
    pub fn kind(&self) -> StreamKind {
        match self.stream_content {
            0x01 | 0x05 | 0x09 => StreamKind::Video,
            0x02 | 0x04 | 0x06 | 0x07 => StreamKind::Audio,
            0x03 => StreamKind::Subtitle,
            _ => StreamKind::Other,
        }
    }
}

impl<'a> Descriptor<'a> for ComponentDescriptor<'a> {
    const TAG: u8 = 0x50;

    fn read(data: &'a [u8]) -> Result<ComponentDescriptor<'a>, DescriptorError> {
        ensure_len(Self::TAG, data, 6).inspect_err(|_| {
            log::debug!("invalid ComponentDescriptor");
        })?;

        let stream_content_ext = (data[0] & 0b11110000) >> 4;
        let stream_content = data[0] & 0b00001111;
        let component_type = data[1];
        let component_tag = data[2];
        let lang_code = LangCode::read(&[data[3], data[4], data[5]]);
        let text = DvbStr::from_bytes(&data[6..]);

        Ok(ComponentDescriptor {
            stream_content_ext,
            stream_content,
            component_type,
            component_tag,
            lang_code,
            text,
        })
    }
}

/// コンテント記述子におけるジャンル。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentGenre {
    /// ジャンル1（4ビット）。
    pub content_nibble_level_1: u8,
    /// ジャンル2（4ビット）。
    pub content_nibble_level_2: u8,
    /// ユーザジャンル（8ビット）。
    pub user_byte: u8,
}

/// コンテント記述子。
#[derive(Debug, PartialEq, Eq)]
pub struct ContentDescriptor {
    /// ジャンルの配列。
    pub items: SmallVec<[ContentGenre; 4]>,
}

impl<'a> Descriptor<'a> for ContentDescriptor {
    const TAG: u8 = 0x54;

    fn read(data: &'a [u8]) -> Result<ContentDescriptor, DescriptorError> {
        if data.len() < 2 {
            log::debug!("invalid ContentDescriptor");
            return Err(DescriptorError::Invalid {
                tag: Self::TAG,
                reason: "no content entry",
            });
        }

        let items = data
            .chunks_exact(2)
            .map(|chunk| ContentGenre {
                content_nibble_level_1: (chunk[0] & 0b11110000) >> 4,
                content_nibble_level_2: chunk[0] & 0b00001111,
                user_byte: chunk[1],
            })
            .collect();

        Ok(ContentDescriptor { items })
    }
}

/// 視聴年齢制限。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParentalRating {
    /// 国コード。
    pub country_code: [u8; 3],
    /// 視聴制限（0x01～0x0F：最少年齢－3）。
    pub rating: u8,
}

impl ParentalRating {
    /// 最少年齢を返す。
    ///
    /// 年齢が規定されていない場合は`None`を返す。
    pub fn min_age(&self) -> Option<u8> {
        match self.rating {
            0x01..=0x0F => Some(self.rating + 3),
            _ => None,
        }
    }
}

/// パレンタルレート記述子。
#[derive(Debug, PartialEq, Eq)]
pub struct ParentalRatingDescriptor {
    /// 視聴年齢制限の配列。
    pub ratings: SmallVec<[ParentalRating; 2]>,
}

impl ParentalRatingDescriptor {
    /// 最初の視聴年齢制限を返す。
    #[inline]
    pub fn first(&self) -> Option<&ParentalRating> {
        self.ratings.first()
    }
}

impl<'a> Descriptor<'a> for ParentalRatingDescriptor {
    const TAG: u8 = 0x55;

    fn read(data: &'a [u8]) -> Result<ParentalRatingDescriptor, DescriptorError> {
        if data.len() % 4 != 0 {
            log::debug!("invalid ParentalRatingDescriptor");
        }

        let ratings = data
            .chunks_exact(4)
            .map(|chunk| ParentalRating {
                country_code: [chunk[0], chunk[1], chunk[2]],
                rating: chunk[3],
            })
            .collect();

        Ok(ParentalRatingDescriptor { ratings })
    }
}

/// CRIDの所在。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CridLocation<'a> {
    /// 記述子内に格納されたCRID。
    Inline(&'a DvbStr),
    /// CITに格納されたCRIDへの参照。
    Reference(u16),
}

/// コンテント識別記述子における1件のCRID。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crid<'a> {
    /// CRIDの種類（6ビット）。
    pub crid_type: u8,
    /// CRIDの所在。
    pub location: CridLocation<'a>,
}

impl<'a> Crid<'a> {
    /// エピソードを示すCRIDかどうか。
    #[inline]
    pub fn is_episode(&self) -> bool {
        matches!(self.crid_type, 0x01 | 0x31)
    }

    /// シリーズを示すCRIDかどうか。
    #[inline]
    pub fn is_series(&self) -> bool {
        matches!(self.crid_type, 0x02 | 0x32)
    }

    /// 記述子内に格納されたCRIDを文字列として返す。
    pub fn value(&self) -> Option<String> {
        match self.location {
            CridLocation::Inline(s) => Some(s.decode()),
            CridLocation::Reference(_) => None,
        }
    }
}

/// コンテント識別記述子。
#[derive(Debug, PartialEq, Eq)]
pub struct ContentIdentifierDescriptor<'a> {
    /// CRIDの配列。
    pub crids: SmallVec<[Crid<'a>; 2]>,
}

impl<'a> ContentIdentifierDescriptor<'a> {
    /// シリーズのCRIDを返す。
    pub fn series_link(&self) -> Option<String> {
        self.crids.iter().filter(|c| c.is_series()).find_map(Crid::value)
    }

    /// エピソードのCRIDを返す。
    pub fn episode_link(&self) -> Option<String> {
        self.crids.iter().filter(|c| c.is_episode()).find_map(Crid::value)
    }

    /// シリーズのCRIDがあればそれを、なければエピソードのCRIDを返す。
    #[inline]
    pub fn link(&self) -> Option<String> {
        self.series_link().or_else(|| self.episode_link())
    }
}

impl<'a> Descriptor<'a> for ContentIdentifierDescriptor<'a> {
    const TAG: u8 = 0x76;

    fn read(mut data: &'a [u8]) -> Result<ContentIdentifierDescriptor<'a>, DescriptorError> {
        let mut crids = SmallVec::new();
        while let [head, ref rem @ ..] = *data {
            let crid_type = (head & 0b11111100) >> 2;
            let location = match head & 0b00000011 {
                0 => {
                    let [crid_length, ref rem @ ..] = *rem else {
                        log::debug!("invalid ContentIdentifierDescriptor::crid_length");
                        return Err(DescriptorError::ShortBuffer {
                            tag: Self::TAG,
                            expected: 1,
                            actual: 0,
                        });
                    };
                    let (crid, rem) = split_len(Self::TAG, rem, crid_length as usize)
                        .inspect_err(|_| log::debug!("invalid ContentIdentifierDescriptor::crid"))?;
                    data = rem;
                    CridLocation::Inline(DvbStr::from_bytes(crid))
                }
                1 => {
                    let (crid_ref, rem) = split_len(Self::TAG, rem, 2).inspect_err(|_| {
                        log::debug!("invalid ContentIdentifierDescriptor::crid_ref")
                    })?;
                    data = rem;
                    CridLocation::Reference(crid_ref.read_be_16())
                }
                _ => {
                    log::debug!("invalid ContentIdentifierDescriptor::crid_location");
                    return Err(DescriptorError::Invalid {
                        tag: Self::TAG,
                        reason: "reserved crid_location",
                    });
                }
            };

            crids.push(Crid {
                crid_type,
                location,
            });
        }

        Ok(ContentIdentifierDescriptor { crids })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use hex_literal::hex;

    #[test]
    fn test_short_event() {
        let data = hex!("656E67 0B 53616D706C652053686F77 04 54657874");
        let desc = ShortEventDescriptor::read(&data).unwrap();
        assert_eq!(desc.lang_code, LangCode::ENG);
        assert_eq!(desc.event_name.decode(), "Sample Show");
        assert_eq!(desc.text.decode(), "Text");
        assert!(!desc.high_definition);

        // 番組記述の長さが足りない
        assert_matches!(
            ShortEventDescriptor::read(&data[..data.len() - 1]),
            Err(DescriptorError::ShortBuffer { tag: 0x4D, .. })
        );
        assert_matches!(
            ShortEventDescriptor::read(&data[..2]),
            Err(DescriptorError::ShortBuffer { tag: 0x4D, .. })
        );
    }

    #[test]
    fn test_strip_hd_prefix() {
        let data = hex!("656E67 09 4844202D204E657773 00");
        let desc = ShortEventDescriptor::read(&data).unwrap().strip_hd_prefix();
        assert_eq!(desc.event_name.decode(), "News");
        assert!(desc.high_definition);

        let data = hex!("656E67 07 48442D4E657773 00");
        let desc = ShortEventDescriptor::read(&data).unwrap().strip_hd_prefix();
        assert_eq!(desc.event_name.decode(), "News");
        assert!(desc.high_definition);

        let data = hex!("656E67 04 4E657773 00");
        let desc = ShortEventDescriptor::read(&data).unwrap().strip_hd_prefix();
        assert_eq!(desc.event_name.decode(), "News");
        assert!(!desc.high_definition);
    }

    #[test]
    fn test_extended_event() {
        let data = hex!(
            "12 656E67"
            "14" // length_of_items
            "08 4449524543544F52" "08 412E204469726563" // DIRECTOR => "A. Direc"
            "00" "00"
            "05 48656C6C6F"
        );
        let desc = ExtendedEventDescriptor::read(&data).unwrap();
        assert_eq!(desc.descriptor_number, 1);
        assert_eq!(desc.last_descriptor_number, 2);
        assert_eq!(desc.lang_code, LangCode::ENG);
        assert_eq!(desc.items.len(), 2);
        assert_eq!(desc.items[0].item_description.decode(), "DIRECTOR");
        assert_eq!(desc.items[1].item_description.decode(), "");
        assert_eq!(desc.text.decode(), "Hello");
        assert_eq!(desc.find_item(&["director"]), Some("A. Direc".to_owned()));
        assert_eq!(desc.find_item(&["YEAR"]), None);

        assert_matches!(
            ExtendedEventDescriptor::read(&data[..12]),
            Err(DescriptorError::ShortBuffer { tag: 0x4E, .. })
        );
    }

    #[test]
    fn test_component() {
        let data = hex!("02 03 10 656E67 53746572656F");
        let desc = ComponentDescriptor::read(&data).unwrap();
        assert_eq!(desc.stream_content, 2);
        assert_eq!(desc.component_type, 3);
        assert_eq!(desc.component_tag, 0x10);
        assert_eq!(desc.kind(), StreamKind::Audio);
        assert_eq!(desc.text.decode(), "Stereo");

        assert_matches!(
            ComponentDescriptor::read(&data[..5]),
            Err(DescriptorError::ShortBuffer { tag: 0x50, expected: 6, actual: 5 })
        );
    }

    #[test]
    fn test_content() {
        let desc = ContentDescriptor::read(&hex!("10 00 43 05")).unwrap();
        assert_eq!(desc.items.len(), 2);
        assert_eq!(desc.items[0].content_nibble_level_1, 1);
        assert_eq!(desc.items[0].content_nibble_level_2, 0);
        assert_eq!(desc.items[1].content_nibble_level_1, 4);
        assert_eq!(desc.items[1].content_nibble_level_2, 3);
        assert_eq!(desc.items[1].user_byte, 5);

        assert_matches!(
            ContentDescriptor::read(&[]),
            Err(DescriptorError::Invalid { tag: 0x54, .. })
        );
    }

    #[test]
    fn test_parental_rating() {
        let desc = ParentalRatingDescriptor::read(&hex!("415553 09 465241 0C")).unwrap();
        assert_eq!(desc.ratings.len(), 2);
        let first = desc.first().unwrap();
        assert_eq!(&first.country_code, b"AUS");
        assert_eq!(first.min_age(), Some(12));

        let desc = ParentalRatingDescriptor::read(&[]).unwrap();
        assert_eq!(desc.first(), None);
    }

    #[test]
    fn test_content_identifier() {
        let data = hex!(
            "04 05 2F31323334" // 1: エピソード, inline "/1234"
            "08 04 2F616263" // 2: シリーズ, inline "/abc"
            "0D 0102" // 3: 参照
        );
        let desc = ContentIdentifierDescriptor::read(&data).unwrap();
        assert_eq!(desc.crids.len(), 3);
        assert_eq!(desc.episode_link(), Some("/1234".to_owned()));
        assert_eq!(desc.series_link(), Some("/abc".to_owned()));
        assert_eq!(desc.link(), Some("/abc".to_owned()));
        assert_eq!(desc.crids[2].location, CridLocation::Reference(0x0102));

        let desc = ContentIdentifierDescriptor::read(&data[..7]).unwrap();
        assert_eq!(desc.link(), Some("/1234".to_owned()));

        assert_matches!(
            ContentIdentifierDescriptor::read(&data[..5]),
            Err(DescriptorError::ShortBuffer { tag: 0x76, .. })
        );
        assert_matches!(
            ContentIdentifierDescriptor::read(&[0x06]),
            Err(DescriptorError::Invalid { tag: 0x76, .. })
        );
    }
}
