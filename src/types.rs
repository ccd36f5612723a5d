//! Types Module
//!
//! クレート全体で使用する共通データ型を定義するモジュール。

use serde::{Deserialize, Serialize};

/// ワークシートの1行から組み立てられる映画レコード
///
/// ドキュメントストアには`id`をキーとして、このままJSONで書き込まれます。
/// フィールド名は`id`, `movieId`, `title`, `rating`, `review`, `year`です。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieRecord {
    /// 外部から与えられる識別子（必須、空白不可）
    pub id: String,

    /// 映画ID（必須、0より大きい）
    #[serde(default)]
    pub movie_id: i32,

    /// タイトル
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// 評価
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<String>,

    /// レビュー本文
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review: Option<String>,

    /// 公開年（解析でき、かつ0より大きい場合のみ）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
}

impl MovieRecord {
    /// バッチに残す条件を満たすかを判定
    ///
    /// `id`が空白でなく、かつ`movie_id > 0`の場合のみ`true`。
    /// 他のフィールドは判定に影響しません。
    pub fn is_retainable(&self) -> bool {
        !self.id.trim().is_empty() && self.movie_id > 0
    }
}

/// セルの値の種類（`<c t="...">`属性）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CellKind {
    /// `t="s"`: 値は共有文字列テーブルのインデックス
    SharedString,
    /// `t="inlineStr"`: 値は`<is>`要素内のテキスト
    InlineString,
    /// 数値・真偽値・数式文字列など、`<v>`の内容をそのまま使うセル
    Literal,
}

impl CellKind {
    pub fn from_type_attr(t: &[u8]) -> Self {
        match t {
            b"s" => CellKind::SharedString,
            b"inlineStr" => CellKind::InlineString,
            _ => CellKind::Literal,
        }
    }
}

/// ワークシートXMLから読み取った、解決前のセル
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawCell {
    /// セル参照（例: "B2"）。省略されたセルは`None`
    pub reference: Option<String>,
    /// 値の種類
    pub kind: CellKind,
    /// 生テキスト（`<v>`または`<is>`の内容）。値を持たないセルは`None`
    pub raw: Option<String>,
}

impl RawCell {
    pub fn new(reference: Option<&str>, kind: CellKind, raw: Option<&str>) -> Self {
        Self {
            reference: reference.map(str::to_string),
            kind,
            raw: raw.map(str::to_string),
        }
    }

    /// 列ラベル（セル参照の先頭の英字部分、例: "B2" -> "B", "AA10" -> "AA"）
    pub fn column_label(&self) -> Option<&str> {
        let reference = self.reference.as_deref()?;
        let end = reference
            .find(|ch: char| !ch.is_ascii_alphabetic())
            .unwrap_or(reference.len());
        if end == 0 {
            None
        } else {
            Some(&reference[..end])
        }
    }
}

/// ワークシートの1行分（ヘッダー行以外）
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SheetRow {
    /// `<row r="...">`で宣言された行番号（1始まり）。省略時は`None`
    pub index: Option<u32>,
    /// 行に含まれるセル（物理的な出現順）
    pub cells: Vec<RawCell>,
}
