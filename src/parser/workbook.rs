//! Workbook Module
//!
//! 取り込み対象のワークブック。パッケージから読み出したワークシートと
//! 共有文字列テーブルを保持し、行・候補レコードのイテレータを提供します。

use crate::decoder::CellDecoder;
use crate::error::IngestError;
use crate::mapper::RowMapper;
use crate::parser::{PackageParts, SharedStringTable, SheetRows};
use crate::security::SecurityConfig;
use crate::types::MovieRecord;

/// 開かれたワークブック（先頭ワークシートのみ）
///
/// `open`の時点でZIPアーカイブは解放済みで、以降はメモリ上の
/// ワークシートXMLと共有文字列テーブルだけを保持します。
///
/// # 使用例
///
/// ```rust,no_run
/// use sheetstage::Workbook;
///
/// # fn main() -> Result<(), sheetstage::IngestError> {
/// let bytes = std::fs::read("movies.xlsx")?;
/// let workbook = Workbook::open(&bytes)?;
/// for candidate in workbook.movie_candidates() {
///     let movie = candidate?;
///     println!("{} -> {}", movie.id, movie.movie_id);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Workbook {
    sheet_name: String,
    sheet_path: String,
    sheet_xml: Vec<u8>,
    shared_strings: Option<SharedStringTable>,
}

impl Workbook {
    /// デフォルトのセキュリティ設定でワークブックを開く
    ///
    /// # 戻り値
    ///
    /// * `Ok(Workbook)` - パッケージとワークシートの読み込みに成功した場合
    /// * `Err(IngestError::MalformedDocument)` - パッケージ構造が不正な場合
    /// * `Err(IngestError::SecurityViolation)` - セキュリティ制限に違反した場合
    pub fn open(bytes: &[u8]) -> Result<Self, IngestError> {
        Self::open_with(bytes, &SecurityConfig::default())
    }

    pub(crate) fn open_with(bytes: &[u8], security: &SecurityConfig) -> Result<Self, IngestError> {
        let parts = PackageParts::load(bytes, security)?;

        let shared_strings = parts
            .shared_strings_xml
            .as_deref()
            .map(SharedStringTable::from_xml)
            .transpose()?;

        if let Some(table) = &shared_strings {
            log::debug!("Loaded {} shared strings", table.len());
        }

        Ok(Self {
            sheet_name: parts.sheet_name,
            sheet_path: parts.sheet_path,
            sheet_xml: parts.sheet_xml,
            shared_strings,
        })
    }

    /// 取り込み対象シートの名前
    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    /// 取り込み対象シートのパート名（例: "xl/worksheets/sheet1.xml"）
    pub fn sheet_path(&self) -> &str {
        &self.sheet_path
    }

    /// ヘッダー行以外の行を物理順に返すイテレータ
    pub(crate) fn rows(&self) -> SheetRows<'_> {
        SheetRows::new(&self.sheet_xml)
    }

    pub(crate) fn decoder(&self) -> CellDecoder<'_> {
        CellDecoder::new(self.shared_strings.as_ref())
    }

    /// 各行を`MovieRecord`の候補に変換するイテレータ
    ///
    /// 候補は保持条件（`id`が空白でなく`movie_id > 0`）を検証していません。
    /// 検証とバッチの組み立ては`assemble`が行います。
    /// 構造的なエラーが発生した場合は`Err`を1回返して終了します。
    pub fn movie_candidates(
        &self,
    ) -> impl Iterator<Item = Result<MovieRecord, IngestError>> + '_ {
        let mapper = RowMapper::movies();
        let decoder = self.decoder();
        self.rows().map(move |row| {
            row.and_then(|row| {
                log::trace!("Mapping row {:?} ({} cells)", row.index, row.cells.len());
                mapper.map_row(&row.cells, &decoder)
            })
        })
    }
}
