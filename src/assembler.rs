//! Batch Assembler Module
//!
//! 候補レコードを保持条件で選別し、行の走査順を保ったバッチを組み立てます。

use crate::error::IngestError;
use crate::types::MovieRecord;

/// バッチ組み立ての集計
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    /// 走査したヘッダー以外の行数
    pub rows_seen: usize,
    /// バッチに残った行数
    pub accepted: usize,
    /// 保持条件を満たさず破棄された行数
    pub rejected: usize,
}

/// 候補レコードからバッチを組み立てる
///
/// 重複排除は行いません（同じ`id`の行が複数あれば、すべてバッチに残ります）。
/// 受理された行がなくてもエラーにはせず、空のバッチを返します。
///
/// # 戻り値
///
/// * `Ok(Vec<MovieRecord>)` - 走査順に並んだ受理済みレコード
/// * `Err(IngestError)` - 候補にエラーが含まれていた場合。受理済みのレコードは破棄されます
pub(crate) fn assemble<I>(candidates: I) -> Result<Vec<MovieRecord>, IngestError>
where
    I: IntoIterator<Item = Result<MovieRecord, IngestError>>,
{
    assemble_with_stats(candidates).map(|(records, _)| records)
}

/// `assemble`と同じ処理を行い、集計も返す
pub(crate) fn assemble_with_stats<I>(
    candidates: I,
) -> Result<(Vec<MovieRecord>, BatchStats), IngestError>
where
    I: IntoIterator<Item = Result<MovieRecord, IngestError>>,
{
    let mut records = Vec::new();
    let mut stats = BatchStats::default();

    for candidate in candidates {
        let record = candidate?;
        stats.rows_seen += 1;

        if record.is_retainable() {
            log::debug!(
                "Adding {} to list of movies",
                record.title.as_deref().unwrap_or(&record.id)
            );
            stats.accepted += 1;
            records.push(record);
        } else {
            log::debug!(
                "Skipping row: id={:?}, movieId={}",
                record.id,
                record.movie_id
            );
            stats.rejected += 1;
        }
    }

    Ok((records, stats))
}
