//! Public API Types
//!
//! 公開APIで使用する列挙型と結果型を定義するモジュール。

use crate::assembler::BatchStats;
use crate::error::IngestError;

/// 取り込むBlobの指定方法
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BlobLocator {
    /// アップロード用コンテナ内のBlob名
    ///
    /// 例: `BlobLocator::Name("movies.xlsx".to_string())`
    Name(String),

    /// BlobのURL
    ///
    /// Blob名はURL中の最初の`/{コンテナ名}/`以降の部分です。
    /// クエリ文字列（SASトークンなど）とフラグメントは除外されます。
    ///
    /// 例: `https://account.blob.core.windows.net/uploads/2024/movies.xlsx`
    /// → `2024/movies.xlsx`
    Url(String),
}

impl BlobLocator {
    /// Blob名を取得する
    ///
    /// # 引数
    ///
    /// * `container` - アップロード用コンテナ名（URLからの切り出しに使用）
    ///
    /// # 戻り値
    ///
    /// * `Ok(String)` - Blob名
    /// * `Err(IngestError::Config)` - URLにコンテナが含まれない、またはBlob名が空の場合
    pub fn blob_name(&self, container: &str) -> Result<String, IngestError> {
        let name = match self {
            BlobLocator::Name(name) => name.as_str(),
            BlobLocator::Url(url) => {
                let path = url.split(['?', '#']).next().unwrap_or_default();
                let marker = format!("/{}/", container);
                let start = path.find(&marker).ok_or_else(|| {
                    IngestError::Config(format!(
                        "URL '{}' does not reference container '{}'",
                        url, container
                    ))
                })?;
                &path[start + marker.len()..]
            }
        };

        if name.trim().is_empty() {
            return Err(IngestError::Config(format!(
                "Indeterminate blob name in {:?}",
                self
            )));
        }
        Ok(name.to_string())
    }
}

/// 1つのBlobの取り込み結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOutcome {
    /// 取り込んだBlob名
    pub blob: String,
    /// 行の集計
    pub stats: BatchStats,
    /// すべてのレコードの書き込みに成功したか
    pub upserted_all: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_name_from_name() {
        let locator = BlobLocator::Name("movies.xlsx".to_string());
        assert_eq!(locator.blob_name("uploads").unwrap(), "movies.xlsx");
    }

    #[test]
    fn test_blob_name_from_url() {
        let locator = BlobLocator::Url(
            "https://acct.blob.core.windows.net/uploads/2024/movies.xlsx?sv=2022&sig=abc"
                .to_string(),
        );
        assert_eq!(locator.blob_name("uploads").unwrap(), "2024/movies.xlsx");
    }

    #[test]
    fn test_blob_name_url_without_container() {
        let locator = BlobLocator::Url("https://acct.blob.core.windows.net/other/a.xlsx".to_string());
        assert!(matches!(
            locator.blob_name("uploads"),
            Err(IngestError::Config(_))
        ));
    }

    #[test]
    fn test_blob_name_ignores_container_in_query() {
        let locator =
            BlobLocator::Url("https://h/other/a.xlsx?x=/uploads/b".to_string());
        assert!(matches!(
            locator.blob_name("uploads"),
            Err(IngestError::Config(_))
        ));

        let locator = BlobLocator::Url("https://h/uploads/a.xlsx#/uploads/b".to_string());
        assert_eq!(locator.blob_name("uploads").unwrap(), "a.xlsx");
    }

    #[test]
    fn test_blob_name_blank() {
        let locator = BlobLocator::Url("https://acct.blob.core.windows.net/uploads/".to_string());
        assert!(matches!(
            locator.blob_name("uploads"),
            Err(IngestError::Config(_))
        ));
        let locator = BlobLocator::Name("  ".to_string());
        assert!(locator.blob_name("uploads").is_err());
    }
}
