//! セクションの誤り検出に使われるCRC。

const fn make_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = (i as u32) << 24;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x8000_0000 != 0 {
                (crc << 1) ^ 0x04C1_1DB7
            } else {
                crc << 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

static TABLE: [u32; 256] = make_table();

/// `data`のCRC-32/MPEG-2を計算する。
pub fn calc32(data: &[u8]) -> u32 {
    data.iter().fold(0xFFFF_FFFF, |crc, &b| {
        (crc << 8) ^ TABLE[(((crc >> 24) as u8) ^ b) as usize]
    })
}

/// 末尾にCRC_32を含む`data`が正しいかどうかを返す。
#[inline]
pub fn is_valid32(data: &[u8]) -> bool {
    calc32(data) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calc32() {
        assert_eq!(calc32(b"123456789"), 0x0376_E6E7);
        assert_eq!(calc32(b""), 0xFFFF_FFFF);
    }

    #[test]
    fn test_is_valid32() {
        let mut data = b"\x4E\xF0\x11".to_vec();
        let crc = calc32(&data);
        data.extend_from_slice(&crc.to_be_bytes());
        assert!(is_valid32(&data));

        data[0] ^= 1;
        assert!(!is_valid32(&data));
    }
}
