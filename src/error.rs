//! Error Types Module
//!
//! クレート全体で使用する構造化エラー型を定義するモジュール。
//! `thiserror`を使用して、エラーの自動変換とメッセージフォーマットを実現する。

use thiserror::Error;

/// sheetstageクレート全体で使用するエラー型
///
/// ワークブックの読み込み、行の変換、ストアへの書き込み中に発生する
/// すべてのエラーを統一的に扱います。
///
/// # エラーの種類
///
/// - `MalformedDocument`: パッケージ構造が壊れている（致命的、部分バッチなし）
/// - `SecurityViolation`: サイズ・エントリ数などのセキュリティ制限違反
/// - `NotFound` / `EmptyBlob`: Blobストアからの取得失敗
/// - `Config`: 設定の検証に失敗したエラー
/// - `Upsert`: ドキュメントストアへの書き込み失敗
///
/// 数値列（movieId, year）の変換失敗はエラーとして扱いません。
/// 該当フィールドがデフォルト値のまま残るだけです。
///
/// # 使用例
///
/// ```rust,no_run
/// use sheetstage::{parse_movies, IngestError};
///
/// fn load(bytes: &[u8]) -> Result<usize, IngestError> {
///     let movies = parse_movies(bytes)?;
///     Ok(movies.len())
/// }
/// ```
#[derive(Error, Debug)]
pub enum IngestError {
    /// I/O操作中に発生したエラー
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSONシリアライズのエラー
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// スプレッドシートパッケージの構造が不正
    ///
    /// ZIPとして開けない、`xl/workbook.xml`やワークシートが存在しない、
    /// XMLが壊れている、共有文字列インデックスが範囲外、などの場合に発生します。
    /// 解析中に発生した場合、それまでに受理したレコードは破棄されます。
    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    /// セキュリティ制限に違反したエラー
    ///
    /// ZIP bomb、パストラバーサル、入力サイズ上限などの制限に違反した場合に発生します。
    #[error("Security violation: {0}")]
    SecurityViolation(String),

    /// コンテナまたはBlobが存在しない
    #[error("Blob '{blob}' not found in container '{container}'")]
    NotFound {
        /// コンテナ名
        container: String,
        /// Blob名
        blob: String,
    },

    /// Blobは存在するが0バイトだった
    #[error("Blob '{blob}' in container '{container}' returned 0 bytes")]
    EmptyBlob {
        /// コンテナ名
        container: String,
        /// Blob名
        blob: String,
    },

    /// 設定の検証に失敗したエラー
    ///
    /// `IngestBuilder::build()`での検証失敗、環境変数の欠落、
    /// URLからBlob名を特定できない場合などに発生します。
    #[error("Configuration error: {0}")]
    Config(String),

    /// ドキュメントストアへの書き込みに失敗したエラー
    #[error("Upsert failed: {0}")]
    Upsert(String),
}

impl IngestError {
    /// パッケージ構造の破損を表すエラーかどうか
    pub fn is_malformed(&self) -> bool {
        matches!(self, IngestError::MalformedDocument(_))
    }
}

impl From<zip::result::ZipError> for IngestError {
    fn from(e: zip::result::ZipError) -> Self {
        IngestError::MalformedDocument(format!("invalid spreadsheet package: {}", e))
    }
}

impl From<std::str::Utf8Error> for IngestError {
    fn from(e: std::str::Utf8Error) -> Self {
        IngestError::MalformedDocument(format!("UTF-8 conversion error: {}", e))
    }
}

impl From<quick_xml::Error> for IngestError {
    fn from(e: quick_xml::Error) -> Self {
        IngestError::MalformedDocument(format!("XML parse error: {}", e))
    }
}

impl From<quick_xml::events::attributes::AttrError> for IngestError {
    fn from(e: quick_xml::events::attributes::AttrError) -> Self {
        IngestError::MalformedDocument(format!("XML attribute error: {}", e))
    }
}
