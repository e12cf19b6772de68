//! MPEG2-TSにおける日付時刻。

use std::fmt::{self, Write};

use thiserror::Error;

use crate::utils::{try_read_bcd_digit, BytesExt};

/// 日付時刻を読み取る際に発生するエラー。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TimeError {
    /// BCDのいずれかの桁が9を超えている。
    #[error("invalid BCD digit")]
    InvalidBcd,

    /// 日付や時刻として成立しない値である。
    #[error("date or time out of range")]
    OutOfRange,
}

fn write_hundreds<W: Write>(w: &mut W, n: u8) -> fmt::Result {
    let h = b'0' + n / 10;
    let l = b'0' + n % 10;
    w.write_char(h as char)?;
    w.write_char(l as char)
}

/// 修正ユリウス日。
#[derive(Clone, PartialEq, Eq)]
pub struct MjdDate {
    /// 西暦年。
    pub year: i32,
    /// 月（1月＝1、12月＝12）。
    pub month: u8,
    /// 日（1～31）。
    pub day: u8,
    /// 曜日（月曜日＝1、日曜日＝7）。
    pub day_of_week: u8,
}

impl MjdDate {
    /// `data`から`MjdDate`を読み取る。
    #[inline]
    pub fn read(data: &[u8; 2]) -> MjdDate {
        MjdDate::from_mjd(data.read_be_16())
    }

    /// 1858年11月17日からの日数`mjd`を年月日に変換する。
    ///
    /// EN 300 468 Annex Cの換算式に従う。
    pub fn from_mjd(mjd: u16) -> MjdDate {
        let days = mjd as f64;
        let yd = ((days - 15078.2) / 365.25).floor();
        let md = ((days - 14956.1 - (yd * 365.25).floor()) / 30.6001).floor();
        let day = days - 14956. - (yd * 365.25).floor() - (md * 30.6001).floor();
        let k = if md == 14. || md == 15. { 1. } else { 0. };
        let year = yd + k;
        let month = md - 1. - k * 12.;

        MjdDate {
            year: 1900 + year as i32,
            month: month as u8,
            day: day as u8,
            day_of_week: ((mjd as u32 + 2) % 7 + 1) as u8,
        }
    }

    /// 年月日を修正ユリウス日に変換する。
    ///
    /// 16ビットで表現できない日付の場合は`None`を返す。
    pub fn to_mjd(year: i32, month: u8, day: u8) -> Option<u16> {
        let l = if month <= 2 { 1. } else { 0. };
        let y = (year - 1900) as f64;
        let m = month as f64;
        let mjd = 14956. + day as f64 + ((y - l) * 365.25).floor() + ((m + 1. + l * 12.) * 30.6001).floor();
        if (0. ..=u16::MAX as f64).contains(&mjd) {
            Some(mjd as u16)
        } else {
            None
        }
    }

    /// `chrono`の日付に変換する。
    pub fn to_naive(&self) -> Result<chrono::NaiveDate, TimeError> {
        chrono::NaiveDate::from_ymd_opt(self.year, self.month as u32, self.day as u32)
            .ok_or(TimeError::OutOfRange)
    }
}

impl fmt::Debug for MjdDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}", self.year)?;

        f.write_char('-')?;
        write_hundreds(f, self.month)?;

        f.write_char('-')?;
        write_hundreds(f, self.day)
    }
}

impl fmt::Display for MjdDate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// 修正ユリウス日と協定世界時からなる日付時刻。
#[derive(Clone, PartialEq, Eq)]
pub struct DateTime {
    /// 修正ユリウス日。
    pub date: MjdDate,
    /// 時（0～23）。
    pub hour: u8,
    /// 分（0～59）。
    pub minute: u8,
    /// 秒（0～59）。
    pub second: u8,
}

impl DateTime {
    /// 開始時刻が未定義であることを示す値。
    pub const UNDEFINED: [u8; 5] = [0xFF; 5];

    /// `data`から`DateTime`を読み取る。
    ///
    /// 全てのビットが1の場合は未定義の時刻として`Ok(None)`を返す。
    pub fn read(data: &[u8; 5]) -> Result<Option<DateTime>, TimeError> {
        if *data == Self::UNDEFINED {
            return Ok(None);
        }

        let date = MjdDate::read(&[data[0], data[1]]);
        let hour = try_read_bcd_digit(data[2]).ok_or(TimeError::InvalidBcd)?;
        let minute = try_read_bcd_digit(data[3]).ok_or(TimeError::InvalidBcd)?;
        let second = try_read_bcd_digit(data[4]).ok_or(TimeError::InvalidBcd)?;
        if hour > 23 || minute > 59 || second > 59 {
            return Err(TimeError::OutOfRange);
        }

        let dt = DateTime {
            date,
            hour,
            minute,
            second,
        };
        dt.to_naive()?;
        Ok(Some(dt))
    }

    /// `chrono`の日付時刻に変換する。
    pub fn to_naive(&self) -> Result<chrono::NaiveDateTime, TimeError> {
        let date = self.date.to_naive()?;
        date.and_hms_opt(self.hour as u32, self.minute as u32, self.second as u32)
            .ok_or(TimeError::OutOfRange)
    }
}

impl fmt::Debug for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.date.fmt(f)?;
        f.write_char(' ')?;

        write_hundreds(f, self.hour)?;
        f.write_char(':')?;
        write_hundreds(f, self.minute)?;
        f.write_char(':')?;
        write_hundreds(f, self.second)
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// BCDで表された継続時間（時分秒）を秒数として読み取る。
pub fn read_bcd_duration(data: &[u8; 3]) -> Result<u32, TimeError> {
    let hour = try_read_bcd_digit(data[0]).ok_or(TimeError::InvalidBcd)?;
    let minute = try_read_bcd_digit(data[1]).ok_or(TimeError::InvalidBcd)?;
    let second = try_read_bcd_digit(data[2]).ok_or(TimeError::InvalidBcd)?;
    if minute > 59 || second > 59 {
        return Err(TimeError::OutOfRange);
    }

    Ok(hour as u32 * 3600 + minute as u32 * 60 + second as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_time() {
        // MJD = 45218, HMS = 12:34:56
        let date = MjdDate::read(&[0xB0, 0xA2]);
        assert_eq!(date.year, 1982);
        assert_eq!(date.month, 9);
        assert_eq!(date.day, 6);
        assert_eq!(date.day_of_week, 1);
        assert_eq!(date.to_string(), "1982-09-06");

        let dt = DateTime::read(&[0xB0, 0xA2, 0x12, 0x34, 0x56]).unwrap().unwrap();
        assert_eq!(dt.date.year, 1982);
        assert_eq!(dt.date.month, 9);
        assert_eq!(dt.date.day, 6);
        assert_eq!(dt.hour, 12);
        assert_eq!(dt.minute, 34);
        assert_eq!(dt.second, 56);
        assert_eq!(dt.to_string(), "1982-09-06 12:34:56");
        assert_eq!(
            dt.to_naive().unwrap(),
            chrono::NaiveDate::from_ymd_opt(1982, 9, 6)
                .unwrap()
                .and_hms_opt(12, 34, 56)
                .unwrap(),
        );
    }

    #[test]
    fn test_january_and_february() {
        // 月の補正が必要になる1月と2月
        let mjd = MjdDate::to_mjd(2024, 1, 31).unwrap();
        let date = MjdDate::from_mjd(mjd);
        assert_eq!((date.year, date.month, date.day), (2024, 1, 31));

        let mjd = MjdDate::to_mjd(2024, 2, 29).unwrap();
        let date = MjdDate::from_mjd(mjd);
        assert_eq!((date.year, date.month, date.day), (2024, 2, 29));
    }

    #[test]
    fn test_mjd_round_trip() {
        for mjd in 15079..=u16::MAX {
            let date = MjdDate::from_mjd(mjd);
            assert!(date.to_naive().is_ok(), "{mjd} => {date}");
            assert_eq!(MjdDate::to_mjd(date.year, date.month, date.day), Some(mjd));
        }
    }

    #[test]
    fn test_undefined() {
        assert_eq!(DateTime::read(&[0xFF; 5]), Ok(None));
        // 時刻部分のみが未定義であれば不正な値
        assert_eq!(
            DateTime::read(&[0xB0, 0xA2, 0xFF, 0xFF, 0xFF]),
            Err(TimeError::InvalidBcd),
        );
    }

    #[test]
    fn test_out_of_range() {
        assert_eq!(
            DateTime::read(&[0xB0, 0xA2, 0x24, 0x00, 0x00]),
            Err(TimeError::OutOfRange),
        );
        assert_eq!(
            DateTime::read(&[0xB0, 0xA2, 0x12, 0x60, 0x00]),
            Err(TimeError::OutOfRange),
        );
    }

    #[test]
    fn test_duration() {
        assert_eq!(read_bcd_duration(&[0x01, 0x30, 0x00]), Ok(5400));
        assert_eq!(read_bcd_duration(&[0x00, 0x00, 0x45]), Ok(45));
        assert_eq!(read_bcd_duration(&[0x00, 0x75, 0x00]), Err(TimeError::OutOfRange));
        assert_eq!(read_bcd_duration(&[0xFF, 0xFF, 0xFF]), Err(TimeError::InvalidBcd));
    }
}
