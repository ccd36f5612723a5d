//! Cell Decoder Module
//!
//! 生セル（`RawCell`）を、共有文字列を解決済みのリテラル文字列に変換します。

use crate::error::IngestError;
use crate::parser::SharedStringTable;
use crate::types::{CellKind, RawCell};

/// セルデコーダー
///
/// 副作用を持たない純粋な変換です。ワークブックの共有文字列テーブルを借用します。
#[derive(Debug, Clone, Copy)]
pub(crate) struct CellDecoder<'a> {
    shared_strings: Option<&'a SharedStringTable>,
}

impl<'a> CellDecoder<'a> {
    pub fn new(shared_strings: Option<&'a SharedStringTable>) -> Self {
        Self { shared_strings }
    }

    /// セルの値を文字列として取得
    ///
    /// # 戻り値
    ///
    /// * `Ok(Some(String))` - 値を持つセル
    /// * `Ok(None)` - 値を持たないセル、または数値として解釈できない共有文字列参照
    ///   （欠損値として扱い、エラーにしない）
    /// * `Err(IngestError::MalformedDocument)` - 共有文字列インデックスが範囲外、
    ///   または共有文字列パートがないのに参照された場合
    pub fn decode(&self, cell: &RawCell) -> Result<Option<String>, IngestError> {
        match cell.kind {
            CellKind::SharedString => {
                let Some(raw) = cell.raw.as_deref() else {
                    return Ok(None);
                };
                let Ok(index) = raw.trim().parse::<usize>() else {
                    return Ok(None);
                };
                let table = self.shared_strings.ok_or_else(|| {
                    IngestError::MalformedDocument(format!(
                        "Cell {} references shared string {} but the package has no shared string part",
                        cell.reference.as_deref().unwrap_or("?"),
                        index
                    ))
                })?;
                Ok(Some(table.resolve(index)?.to_string()))
            }
            CellKind::InlineString | CellKind::Literal => Ok(cell.raw.clone()),
        }
    }
}
