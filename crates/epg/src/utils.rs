use std::fmt;

/// バイト列から数値を読み取るための拡張トレイト。
pub trait BytesExt {
    /// 先頭2バイトをビッグエンディアンの16ビット符号無し整数として読み取る。
    ///
    /// 事前に長さが2以上あると分かるようなコードであれば最適化が期待できる。
    fn read_be_16(&self) -> u16;

    /// 先頭4バイトをビッグエンディアンの32ビット符号無し整数として読み取る。
    fn read_be_32(&self) -> u32;
}

impl BytesExt for [u8] {
    #[inline]
    fn read_be_16(&self) -> u16 {
        u16::from_be_bytes([self[0], self[1]])
    }

    #[inline]
    fn read_be_32(&self) -> u32 {
        u32::from_be_bytes([self[0], self[1], self[2], self[3]])
    }
}

/// 2桁のBCDを読み取る。
///
/// いずれかのニブルが9を超える場合は`None`を返す。
#[inline]
pub fn try_read_bcd_digit(v: u8) -> Option<u8> {
    let (h, l) = (v >> 4, v & 0x0F);
    (h <= 9 && l <= 9).then_some(h * 10 + l)
}

/// `{:?}`で`0x`付きの大文字16進数として出力する。
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct UpperHex<T>(pub T);

impl<T: fmt::UpperHex> fmt::Debug for UpperHex<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{:02X}", self.0)
    }
}

/// 単一フィールドのタプル構造体について、`Display`等の書式化を内部の値に委譲する。
macro_rules! delegate_fmt {
    ($name:ident) => {
        impl std::fmt::Display for $name {
            #[inline]
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                std::fmt::Display::fmt(&self.0, f)
            }
        }

        impl std::fmt::LowerHex for $name {
            #[inline]
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                std::fmt::LowerHex::fmt(&self.0, f)
            }
        }

        impl std::fmt::UpperHex for $name {
            #[inline]
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                std::fmt::UpperHex::fmt(&self.0, f)
            }
        }
    };
}

// マクロはpub useできない
pub(crate) use delegate_fmt;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_be_u16() {
        assert_eq!(b"\x12\x34\x56\x78"[..].read_be_16(), 0x1234);
    }

    #[test]
    fn test_read_be_u32() {
        assert_eq!(b"\x12\x34\x56\x78\x9A\xBC\xDE"[..].read_be_32(), 0x12345678);
    }

    #[test]
    fn test_read_bcd() {
        assert_eq!(try_read_bcd_digit(0x00), Some(0));
        assert_eq!(try_read_bcd_digit(0x59), Some(59));
        assert_eq!(try_read_bcd_digit(0x23), Some(23));
        assert_eq!(try_read_bcd_digit(0x1A), None);
        assert_eq!(try_read_bcd_digit(0xF0), None);
    }

    #[test]
    fn test_upper_hex() {
        assert_eq!(format!("{:?}", UpperHex(0x4Du8)), "0x4D");
        assert_eq!(format!("{:?}", UpperHex(0x5u8)), "0x05");
    }
}
