//! PSI/SI用のモジュール。

pub mod desc;
pub mod table;

use fxhash::FxHashMap;
use thiserror::Error;

use crate::utils::BytesExt;

/// [`PsiSection::parse`]で発生するエラー。
///
/// セクション長が確定したあとで発生するエラーにはセクション長が付随する。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PsiError {
    /// PSIセクションの長さが足りない。
    #[error("insufficient length of a PSI section")]
    InsufficientLength,

    /// PSIの終端に到達した。
    #[error("reached to end of PSI sections")]
    EndOfPsi,

    /// PSIセクションに最低限必要なバイト数がなく、壊れたセクションである。
    ///
    /// 内包する`usize`にはPSIのセクション長が入る。
    #[error("corrupt section")]
    Corrupted(usize),

    /// PSIセクションのCRC32が一致しない。
    ///
    /// 内包する`usize`にはPSIのセクション長が入る。
    #[error("crc32 error")]
    Crc32(usize),
}

/// PSIのセクション。
///
/// 取得層から渡される生のセクションであり、デコード中に変更されることはない。
#[derive(Debug)]
pub struct PsiSection<'a> {
    /// テーブル識別。
    pub table_id: u8,
    /// セクションシンタクス。
    pub syntax: Option<PsiSectionSyntax>,
    /// セクションシンタクスに続くデータ（CRCを含まない）。
    pub data: &'a [u8],
    /// CRC。
    pub crc32: u32,
}

impl<'a> PsiSection<'a> {
    /// PSIセクションをパースし、[`PsiSection`]とセクション長を返す。
    ///
    /// CRCが一致しないセクションは[`PsiError::Crc32`]となる。
    #[inline]
    pub fn parse(buf: &'a [u8]) -> Result<(PsiSection<'a>, usize), PsiError> {
        Self::parse_inner(buf, true)
    }

    /// CRCを検査せずにPSIセクションをパースし、[`PsiSection`]とセクション長を返す。
    ///
    /// 取得層で既にCRCを検査している場合に使用する。
    #[inline]
    pub fn parse_unchecked(buf: &'a [u8]) -> Result<(PsiSection<'a>, usize), PsiError> {
        Self::parse_inner(buf, false)
    }

    fn parse_inner(buf: &'a [u8], check_crc: bool) -> Result<(PsiSection<'a>, usize), PsiError> {
        if buf.len() < 3 {
            return Err(PsiError::InsufficientLength);
        }

        let table_id = buf[0];
        if table_id == 0xFF {
            return Err(PsiError::EndOfPsi);
        }
        let section_syntax_indicator = buf[1] & 0b10000000 != 0;
        let section_length = buf[1..=2].read_be_16() & 0b0000_1111_1111_1111;

        let Some(psi) = buf.get(..3 + section_length as usize) else {
            return Err(PsiError::InsufficientLength);
        };

        if psi.len() < 3 + 4 {
            return Err(PsiError::Corrupted(psi.len()));
        }
        if check_crc && !crate::crc::is_valid32(psi) {
            return Err(PsiError::Crc32(psi.len()));
        }

        let (syntax, data) = if section_syntax_indicator {
            if psi.len() < 3 + 5 + 4 {
                return Err(PsiError::Corrupted(psi.len()));
            }

            let table_id_extension = psi[3..=4].read_be_16();
            let version_number = (psi[5] & 0b00111110) >> 1;
            let current_next_indicator = psi[5] & 0b00000001 != 0;
            let section_number = psi[6];
            let last_section_number = psi[7];

            let ss = PsiSectionSyntax {
                table_id_extension,
                version_number,
                current_next_indicator,
                section_number,
                last_section_number,
            };
            (Some(ss), &psi[8..psi.len() - 4])
        } else {
            (None, &psi[3..psi.len() - 4])
        };

        let crc32 = psi[psi.len() - 4..].read_be_32();

        Ok((
            PsiSection {
                table_id,
                syntax,
                data,
                crc32,
            },
            psi.len(),
        ))
    }
}

/// PSIセクションのシンタクス。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PsiSectionSyntax {
    /// テーブル識別拡張。
    pub table_id_extension: u16,
    /// バージョン番号（5ビット）。
    pub version_number: u8,
    /// カレントネクスト指示。
    pub current_next_indicator: bool,
    /// セクション番号。
    pub section_number: u8,
    /// 最終セクション番号。
    pub last_section_number: u8,
}

/// PSIテーブルのバージョン管理。
///
/// サブテーブルごとにセクション番号とバージョン番号の組を記録し、
/// 繰り返し送出される同一のセクションを検出する。
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Repository {
    // サブテーブルごとの、セクション番号と対応するバージョン番号の配列。
    subtable_versions: FxHashMap<(u8, u16), Vec<u8>>,
}

impl Repository {
    /// バージョン管理のための`Repository`を生成する。
    #[inline]
    pub fn new() -> Repository {
        Repository::default()
    }

    /// `table_id`と`table_id_extension`で示されるサブテーブルのセクションが
    /// 未受信または更新されたものかどうかを返し、そのバージョンを記録する。
    ///
    /// 同一バージョンのセクションを既に受信している場合は`false`を返す。
    /// セクション番号が最終セクション番号を超える不正なセクションも`false`を返す。
    pub fn check(
        &mut self,
        table_id: u8,
        table_id_extension: u16,
        syntax: &PsiSectionSyntax,
    ) -> bool {
        let len = syntax.last_section_number as usize + 1;
        let idx = syntax.section_number as usize;
        if idx >= len {
            return false;
        }

        let versions = self
            .subtable_versions
            .entry((table_id, table_id_extension))
            .or_insert_with(Default::default);

        if versions.len() != len {
            // バージョン番号は5ビットであるため0x20以上は無効値
            versions.resize(len, 0xFF);
        }

        if versions[idx] == syntax.version_number {
            return false;
        }
        versions[idx] = syntax.version_number;

        true
    }

    /// 指定されたサブテーブルのセクションを未受信とする。
    ///
    /// 受信したセクションを処理できなかった場合に、再送時に改めて処理できるようにする。
    pub fn unset(&mut self, table_id: u8, table_id_extension: u16, section_number: u8) {
        let Some(versions) = self
            .subtable_versions
            .get_mut(&(table_id, table_id_extension))
        else {
            return;
        };

        if let Some(version) = versions.get_mut(section_number as usize) {
            // バージョン番号は5ビットであるため0x20以上は無効値
            *version = 0xFF;
        }
    }

    /// `Repository`の内容を消去して初期化する。
    #[inline]
    pub fn clear(&mut self) {
        self.subtable_versions.clear();
    }
}
