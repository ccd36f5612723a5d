//! Builder Module
//!
//! Fluent Builder APIを提供し、`Ingestor`インスタンスを段階的に構築する。

use rayon::prelude::*;

use crate::api::{BlobLocator, IngestOutcome};
use crate::assembler::{self, BatchStats};
use crate::error::IngestError;
use crate::parser::Workbook;
use crate::security::SecurityConfig;
use crate::store::{upsert_batch, BlobStore, DocumentStore};
use crate::types::MovieRecord;

/// アップロード用コンテナ名の環境変数
pub const ENV_UPLOADS_CONTAINER: &str = "uploadsStorageContainer";
/// ドキュメントストアのデータベース名の環境変数
pub const ENV_DATABASE: &str = "CosmosMoviesDatabaseName";
/// 映画ドキュメントのコンテナ名の環境変数
pub const ENV_MOVIES_CONTAINER: &str = "cosmosMoviesToWatchContainer";

/// 取り込み処理の設定を保持する内部構造体
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct IngestConfig {
    /// アップロードされたXLSXを格納するBlobコンテナ
    pub uploads_container: String,

    /// 書き込み先のデータベース
    pub database: String,

    /// 書き込み先のコンテナ
    pub movies_container: String,

    /// パッケージ読み込み時のセキュリティ制限
    pub security: SecurityConfig,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            uploads_container: "uploads".to_string(),
            database: "MoviesDB".to_string(),
            movies_container: "WatchedMovies".to_string(),
            security: SecurityConfig::default(),
        }
    }
}

impl IngestConfig {
    /// 環境変数から設定を読み込む
    fn from_env() -> Result<Self, IngestError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 任意の参照関数から設定を読み込む
    ///
    /// 3つの環境変数（`uploadsStorageContainer`, `CosmosMoviesDatabaseName`,
    /// `cosmosMoviesToWatchContainer`）はすべて必須です。
    fn from_lookup<F>(lookup: F) -> Result<Self, IngestError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| {
                    IngestError::Config(format!("Environment variable '{}' is not set", key))
                })
        };

        Ok(Self {
            uploads_container: require(ENV_UPLOADS_CONTAINER)?,
            database: require(ENV_DATABASE)?,
            movies_container: require(ENV_MOVIES_CONTAINER)?,
            security: SecurityConfig::default(),
        })
    }
}

/// Fluent Builder APIを提供する構造体
///
/// # 使用例
///
/// ```rust,no_run
/// use sheetstage::IngestBuilder;
///
/// # fn main() -> Result<(), sheetstage::IngestError> {
/// let ingestor = IngestBuilder::new()
///     .with_uploads_container("uploads")
///     .with_database("MoviesDB")
///     .with_movies_container("MoviesToWatch")
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct IngestBuilder {
    config: IngestConfig,
}

impl Default for IngestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl IngestBuilder {
    /// デフォルト設定を持つビルダーインスタンスを生成する
    ///
    /// # デフォルト設定
    ///
    /// - アップロード用コンテナ: `uploads`
    /// - データベース: `MoviesDB`
    /// - 映画コンテナ: `WatchedMovies`
    /// - 入力ファイルの上限: 2GB、単一パートの上限: 100MB
    pub fn new() -> Self {
        Self {
            config: IngestConfig::default(),
        }
    }

    /// 環境変数から設定を読み込んだビルダーを生成する
    ///
    /// # 戻り値
    ///
    /// * `Err(IngestError::Config)` - 必須の環境変数が未設定または空の場合
    pub fn from_env() -> Result<Self, IngestError> {
        Ok(Self {
            config: IngestConfig::from_env()?,
        })
    }

    /// 任意の参照関数（テストやシークレットストア用）から設定を読み込む
    pub fn from_lookup<F>(lookup: F) -> Result<Self, IngestError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            config: IngestConfig::from_lookup(lookup)?,
        })
    }

    pub fn with_uploads_container(mut self, container: impl Into<String>) -> Self {
        self.config.uploads_container = container.into();
        self
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.config.database = database.into();
        self
    }

    pub fn with_movies_container(mut self, container: impl Into<String>) -> Self {
        self.config.movies_container = container.into();
        self
    }

    /// 入力ファイルの最大サイズ（バイト）を指定する
    pub fn with_max_input_size(mut self, bytes: u64) -> Self {
        self.config.security.max_input_file_size = bytes;
        self
    }

    /// パッケージ内の単一パートの最大サイズ（バイト）を指定する
    pub fn with_max_part_size(mut self, bytes: u64) -> Self {
        self.config.security.max_file_size = bytes;
        self
    }

    /// 設定を検証し、`Ingestor`インスタンスを生成する
    ///
    /// # 戻り値
    ///
    /// * `Err(IngestError::Config)` - コンテナ名・データベース名が空、
    ///   またはセキュリティ制限に0が指定された場合
    pub fn build(self) -> Result<Ingestor, IngestError> {
        let names = [
            ("uploads container", &self.config.uploads_container),
            ("database", &self.config.database),
            ("movies container", &self.config.movies_container),
        ];
        for (label, value) in names {
            if value.trim().is_empty() {
                return Err(IngestError::Config(format!("{} must not be blank", label)));
            }
        }

        self.config.security.validate()?;

        Ok(Ingestor {
            config: self.config,
        })
    }
}

/// 取り込み処理のファサード
///
/// XLSXのバイト列を`MovieRecord`のバッチに変換し、
/// Blobストアからの取得とドキュメントストアへの書き込みを仲介します。
/// 内部に可変状態を持たないため、複数スレッドから共有できます。
#[derive(Debug, Clone)]
pub struct Ingestor {
    config: IngestConfig,
}

impl Ingestor {
    pub fn uploads_container(&self) -> &str {
        &self.config.uploads_container
    }

    pub fn database(&self) -> &str {
        &self.config.database
    }

    pub fn movies_container(&self) -> &str {
        &self.config.movies_container
    }

    /// XLSXのバイト列を映画レコードのバッチに変換
    ///
    /// # 戻り値
    ///
    /// * `Ok(Vec<MovieRecord>)` - 走査順に並んだ受理済みレコード（空の場合もある）
    /// * `Err(IngestError)` - パッケージが不正な場合。部分的なバッチは返しません
    pub fn parse(&self, bytes: &[u8]) -> Result<Vec<MovieRecord>, IngestError> {
        self.parse_with_stats(bytes).map(|(records, _)| records)
    }

    /// `parse`と同じ処理を行い、行の集計も返す
    pub fn parse_with_stats(
        &self,
        bytes: &[u8],
    ) -> Result<(Vec<MovieRecord>, BatchStats), IngestError> {
        let workbook = Workbook::open_with(bytes, &self.config.security)?;
        assembler::assemble_with_stats(workbook.movie_candidates())
    }

    /// 複数のXLSXを並列に変換する
    ///
    /// 各ドキュメントは独立した逐次パイプラインで処理されます。
    /// 結果は入力と同じ順序で返します。
    pub fn parse_many<B>(&self, inputs: &[B]) -> Vec<Result<Vec<MovieRecord>, IngestError>>
    where
        B: AsRef<[u8]> + Sync,
    {
        inputs
            .par_iter()
            .map(|bytes| self.parse(bytes.as_ref()))
            .collect()
    }

    /// Blobを取得して変換し、ドキュメントストアに書き込む
    ///
    /// # 処理フロー
    ///
    /// 1. ロケーターからBlob名を決定
    /// 2. Blobストアから取得（0バイトの場合は`EmptyBlob`）
    /// 3. バッチに変換
    /// 4. バッチ全体をドキュメントストアに書き込む
    ///
    /// 書き込みの一部失敗はエラーにせず、`IngestOutcome::upserted_all`が`false`になります。
    pub fn ingest<S, D>(
        &self,
        blobs: &S,
        documents: &D,
        locator: &BlobLocator,
    ) -> Result<IngestOutcome, IngestError>
    where
        S: BlobStore + ?Sized,
        D: DocumentStore + ?Sized,
    {
        let container = &self.config.uploads_container;
        let blob = locator.blob_name(container)?;
        log::info!("Processing file {} from container {}", blob, container);

        let bytes = blobs.get_blob(container, &blob)?;
        if bytes.is_empty() {
            return Err(IngestError::EmptyBlob {
                container: container.clone(),
                blob,
            });
        }

        let (records, stats) = self.parse_with_stats(&bytes)?;
        log::info!(
            "Parsed {} movies from {} ({} rows rejected)",
            stats.accepted,
            blob,
            stats.rejected
        );

        let upserted_all = upsert_batch(
            documents,
            &self.config.database,
            &self.config.movies_container,
            &records,
        );
        if upserted_all {
            log::info!(
                "All movies upserted into {}.{}",
                self.config.database,
                self.config.movies_container
            );
        } else {
            log::warn!("Not all movies from {} could be pushed into the database", blob);
        }

        Ok(IngestOutcome {
            blob,
            stats,
            upserted_all,
        })
    }

    /// 複数のBlobを並列に取り込む
    ///
    /// 結果は`locators`と同じ順序で返します。1つのBlobの失敗は他に影響しません。
    pub fn ingest_many<S, D>(
        &self,
        blobs: &S,
        documents: &D,
        locators: &[BlobLocator],
    ) -> Vec<Result<IngestOutcome, IngestError>>
    where
        S: BlobStore + Sync + ?Sized,
        D: DocumentStore + Sync + ?Sized,
    {
        locators
            .par_iter()
            .map(|locator| self.ingest(blobs, documents, locator))
            .collect()
    }
}

/// デフォルト設定でXLSXのバイト列を映画レコードのバッチに変換する
///
/// # 使用例
///
/// ```rust,no_run
/// # fn main() -> Result<(), sheetstage::IngestError> {
/// let bytes = std::fs::read("movies.xlsx")?;
/// let movies = sheetstage::parse_movies(&bytes)?;
/// println!("{} movies", movies.len());
/// # Ok(())
/// # }
/// ```
pub fn parse_movies(bytes: &[u8]) -> Result<Vec<MovieRecord>, IngestError> {
    let workbook = Workbook::open(bytes)?;
    assembler::assemble(workbook.movie_candidates())
}

/// `parse_movies`と同じ処理を行い、行の集計も返す
pub fn parse_movies_with_stats(
    bytes: &[u8],
) -> Result<(Vec<MovieRecord>, BatchStats), IngestError> {
    let workbook = Workbook::open(bytes)?;
    assembler::assemble_with_stats(workbook.movie_candidates())
}
