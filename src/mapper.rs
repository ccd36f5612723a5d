//! Row Mapper Module
//!
//! 列ラベルからフィールドへの固定マッピングで、1行分のセルを`MovieRecord`に変換します。
//! 列の位置は契約で固定されており、ヘッダー行からの推論は行いません。

use std::collections::HashMap;

use crate::decoder::CellDecoder;
use crate::error::IngestError;
use crate::types::{MovieRecord, RawCell};

/// フィールドへの値の設定関数
type FieldSetter = fn(&mut MovieRecord, String);

/// 映画シートの列定義（列ラベル -> 設定関数）
const MOVIE_COLUMNS: [(&str, FieldSetter); 6] = [
    ("A", set_id),
    ("B", set_movie_id),
    ("C", set_title),
    ("D", set_rating),
    ("E", set_review),
    ("F", set_year),
];

fn set_id(record: &mut MovieRecord, value: String) {
    record.id = value;
}

fn set_movie_id(record: &mut MovieRecord, value: String) {
    if let Some(movie_id) = parse_positive(&value) {
        record.movie_id = movie_id;
    }
}

fn set_title(record: &mut MovieRecord, value: String) {
    record.title = Some(value);
}

fn set_rating(record: &mut MovieRecord, value: String) {
    record.rating = Some(value);
}

fn set_review(record: &mut MovieRecord, value: String) {
    record.review = Some(value);
}

fn set_year(record: &mut MovieRecord, value: String) {
    if let Some(year) = parse_positive(&value) {
        record.year = Some(year);
    }
}

/// 整数として解釈でき、かつ0より大きい場合のみ値を返す
///
/// 解釈できない値はエラーにせず、フィールドをデフォルトのまま残します。
fn parse_positive(value: &str) -> Option<i32> {
    value.trim().parse::<i32>().ok().filter(|n| *n > 0)
}

/// 行マッパー
///
/// 列ラベルをキーにした設定関数のテーブルで各セルを振り分けます。
/// 未知の列ラベル（"G"や"AA"など）とセル参照を持たないセルは無視します。
/// フィールド間の検証は行いません（`assembler`の責務）。
#[derive(Debug, Clone)]
pub(crate) struct RowMapper {
    setters: HashMap<&'static str, FieldSetter>,
}

impl RowMapper {
    /// 映画シート（A〜F列）用のマッパーを作成
    pub fn movies() -> Self {
        Self {
            setters: MOVIE_COLUMNS.into_iter().collect(),
        }
    }

    /// 1行分のセルから候補レコードを作成
    ///
    /// セルの訪問順は列順と一致しなくても構いません。
    /// 値を持たないセルは該当フィールドを未設定のまま残します。
    ///
    /// # 戻り値
    ///
    /// * `Ok(MovieRecord)` - 候補レコード（保持条件は未検証）
    /// * `Err(IngestError::MalformedDocument)` - セルのデコードで構造的なエラーが発生した場合
    pub fn map_row(
        &self,
        cells: &[RawCell],
        decoder: &CellDecoder<'_>,
    ) -> Result<MovieRecord, IngestError> {
        let mut record = MovieRecord::default();

        for cell in cells {
            let Some(setter) = cell.column_label().and_then(|label| self.setters.get(label)) else {
                continue;
            };
            if let Some(value) = decoder.decode(cell)? {
                setter(&mut record, value);
            }
        }

        Ok(record)
    }
}
