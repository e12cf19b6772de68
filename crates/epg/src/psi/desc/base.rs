//! 記述子に関する基礎の型。

use std::fmt;

use thiserror::Error;

use crate::utils::BytesExt;

/// 記述子の読み取りで発生するエラー。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptorError {
    /// 宣言された長さに対してデータが足りない。
    #[error("descriptor 0x{tag:02X} needs {expected} bytes but only {actual} remain")]
    ShortBuffer {
        /// 記述子のタグ。
        tag: u8,
        /// 必要なバイト数。
        expected: usize,
        /// 実際のバイト数。
        actual: usize,
    },

    /// 長さは足りているが内容が不正である。
    #[error("descriptor 0x{tag:02X} is invalid: {reason}")]
    Invalid {
        /// 記述子のタグ。
        tag: u8,
        /// 不正である理由。
        reason: &'static str,
    },
}

impl DescriptorError {
    /// エラーが発生した記述子のタグ。
    #[inline]
    pub fn tag(&self) -> u8 {
        match *self {
            DescriptorError::ShortBuffer { tag, .. } => tag,
            DescriptorError::Invalid { tag, .. } => tag,
        }
    }
}

/// `data`が`len`バイト以上あることを確認する。
pub(crate) fn ensure_len(tag: u8, data: &[u8], len: usize) -> Result<(), DescriptorError> {
    if data.len() < len {
        Err(DescriptorError::ShortBuffer {
            tag,
            expected: len,
            actual: data.len(),
        })
    } else {
        Ok(())
    }
}

/// `data`を先頭`len`バイトと残りに分割する。
pub(crate) fn split_len(
    tag: u8,
    data: &[u8],
    len: usize,
) -> Result<(&[u8], &[u8]), DescriptorError> {
    data.split_at_checked(len)
        .ok_or(DescriptorError::ShortBuffer {
            tag,
            expected: len,
            actual: data.len(),
        })
}

/// 記述子を表すトレイト。
pub trait Descriptor<'a>: Sized {
    /// この記述子のタグ。
    const TAG: u8;

    /// `data`から記述子を読み取る。
    ///
    /// `data`には`descriptor_tag`と`descriptor_length`は含まない。
    fn read(data: &'a [u8]) -> Result<Self, DescriptorError>;
}

/// パース前の記述子。
#[derive(Clone, PartialEq, Eq)]
pub struct RawDescriptor<'a> {
    /// 記述子のタグ。
    pub tag: u8,

    /// 記述子の内容。
    pub data: &'a [u8],
}

impl<'a> RawDescriptor<'a> {
    /// `descriptor_tag`と`descriptor_length`の長さ。
    pub const MIN_LEN: usize = 2;

    /// `buf`の先頭から記述子を1つ読み取り、後続データと共に返す。
    ///
    /// 宣言された長さに`buf`が満たない場合は[`DescriptorError::ShortBuffer`]を返す。
    pub fn read(buf: &'a [u8]) -> Result<(RawDescriptor<'a>, &'a [u8]), DescriptorError> {
        let [tag, length, ref rem @ ..] = *buf else {
            return Err(DescriptorError::ShortBuffer {
                tag: buf.first().copied().unwrap_or(0),
                expected: Self::MIN_LEN,
                actual: buf.len(),
            });
        };
        let Some((data, tail)) = rem.split_at_checked(length as usize) else {
            return Err(DescriptorError::ShortBuffer {
                tag,
                expected: Self::MIN_LEN + length as usize,
                actual: buf.len(),
            });
        };

        Ok((RawDescriptor { tag, data }, tail))
    }
}

impl<'a> fmt::Debug for RawDescriptor<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        struct PrintBytes<'a>(&'a [u8]);
        impl<'a> fmt::Debug for PrintBytes<'a> {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{} bytes", self.0.len())
            }
        }

        f.debug_struct("RawDescriptor")
            .field("tag", &crate::utils::UpperHex(self.tag))
            .field("data", &PrintBytes(self.data))
            .finish()
    }
}

/// 複数の記述子からなる記述子群。
#[derive(Clone, PartialEq, Eq)]
pub struct DescriptorBlock<'a>(&'a [u8]);

impl<'a> DescriptorBlock<'a> {
    /// `data`をそのまま記述子群として扱う。
    #[inline]
    pub fn new(data: &'a [u8]) -> DescriptorBlock<'a> {
        DescriptorBlock(data)
    }

    /// `data`から12ビットの長さに続く記述子群を読み取り後続データと共に返す。
    ///
    /// 記述子の内容はパースせず、`iter`メソッドで初めて分割する。
    ///
    /// データ長が不足している場合は`None`を返す。
    pub fn read(data: &'a [u8]) -> Option<(DescriptorBlock<'a>, &'a [u8])> {
        if data.len() < 2 {
            return None;
        }

        let length = data[0..=1].read_be_16() & 0b0000_1111_1111_1111;
        let (block, rem) = data[2..].split_at_checked(length as usize)?;
        Some((DescriptorBlock(block), rem))
    }

    /// 内包する記述子群のイテレーターを返す。
    #[inline]
    pub fn iter(&self) -> DescriptorIter<'a> {
        DescriptorIter(self.0)
    }
}

impl<'a> fmt::Debug for DescriptorBlock<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("DescriptorBlock(")?;
        f.debug_list().entries(self).finish()?;
        f.write_str(")")
    }
}

impl<'a> IntoIterator for &DescriptorBlock<'a> {
    type Item = Result<RawDescriptor<'a>, DescriptorError>;
    type IntoIter = DescriptorIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// [`DescriptorBlock`]のイテレーター。
///
/// 記述子の長さが残りのデータを超えている場合はエラーを1度だけ返し、以降は何も返さない。
#[derive(Clone)]
pub struct DescriptorIter<'a>(&'a [u8]);

impl<'a> Iterator for DescriptorIter<'a> {
    type Item = Result<RawDescriptor<'a>, DescriptorError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.0.is_empty() {
            return None;
        }

        match RawDescriptor::read(self.0) {
            Ok((desc, tail)) => {
                self.0 = tail;
                Some(Ok(desc))
            }
            Err(e) => {
                self.0 = &[];
                Some(Err(e))
            }
        }
    }
}

impl<'a> std::iter::FusedIterator for DescriptorIter<'a> {}

impl<'a> fmt::Debug for DescriptorIter<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DescriptorIter(")?;
        f.debug_list().entries(self.clone()).finish()?;
        f.write_str(")")
    }
}
