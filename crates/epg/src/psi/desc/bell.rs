//! Bell TVが独自に定義する記述子。
//!
//! いずれもユーザ定義領域のタグを使用するため、
//! [`EitVariant::BellTv`](super::EitVariant::BellTv)として読み取る場合にのみ解釈される。

use crate::time::MjdDate;
use crate::utils::BytesExt;

use super::base::{ensure_len, Descriptor, DescriptorError};

/// Bell TVの番組評価記述子。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BellRatingDescriptor {
    /// カナダの視聴年齢制限（0～6）。
    pub parental_rating: u8,
    /// 星による評価（0.5刻みの値の2倍）。
    pub star_rating: u8,
    /// 性的な内容を含む。
    pub sexual_content: bool,
    /// 強い言葉を含む。
    pub strong_language: bool,
    /// 暴力的な内容を含む。
    pub violence: bool,
    /// 裸体を含む。
    pub nudity: bool,
}

impl<'a> Descriptor<'a> for BellRatingDescriptor {
    const TAG: u8 = 0xF0;

    fn read(data: &'a [u8]) -> Result<BellRatingDescriptor, DescriptorError> {
        ensure_len(Self::TAG, data, 3).inspect_err(|_| {
            log::debug!("invalid BellRatingDescriptor");
        })?;

        let parental_rating = data[0];
        let star_rating = data[1];
        let sexual_content = data[2] & 0b10000000 != 0;
        let strong_language = data[2] & 0b01000000 != 0;
        let violence = data[2] & 0b00100000 != 0;
        let nudity = data[2] & 0b00010000 != 0;

        Ok(BellRatingDescriptor {
            parental_rating,
            star_rating,
            sexual_content,
            strong_language,
            violence,
            nudity,
        })
    }
}

/// Bell TVのシリーズ記述子。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BellSeriesDescriptor {
    /// シリーズ番号。
    pub series_number: u16,
    /// エピソード番号。
    pub episode_number: u16,
    /// 初回放送日。
    pub original_air_date: Option<MjdDate>,
}

impl BellSeriesDescriptor {
    /// 初回放送日が未定義であることを示す値。
    pub const NO_DATE: u16 = 0xFFFF;
}

impl<'a> Descriptor<'a> for BellSeriesDescriptor {
    const TAG: u8 = 0xF1;

    fn read(data: &'a [u8]) -> Result<BellSeriesDescriptor, DescriptorError> {
        ensure_len(Self::TAG, data, 6).inspect_err(|_| {
            log::debug!("invalid BellSeriesDescriptor");
        })?;

        let series_number = data[0..=1].read_be_16();
        let episode_number = data[2..=3].read_be_16();
        let original_air_date = match data[4..=5].read_be_16() {
            0 | Self::NO_DATE => None,
            mjd => Some(MjdDate::from_mjd(mjd)),
        };

        Ok(BellSeriesDescriptor {
            series_number,
            episode_number,
            original_air_date,
        })
    }
}
