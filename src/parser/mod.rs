//! Parser Module
//!
//! quick-xmlとzipによるXLSXパッケージの解析。
//! 先頭ワークシートの行を、共有文字列を解決可能な生セルとして取り出します。

mod package;
mod shared_strings;
mod sheet;
mod workbook;

pub(crate) use package::PackageParts;
pub(crate) use shared_strings::SharedStringTable;
pub(crate) use sheet::SheetRows;
pub use workbook::Workbook;
