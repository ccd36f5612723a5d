//! Shared String Table
//!
//! `xl/sharedStrings.xml`を解析し、インデックスで参照される文字列テーブルを構築します。

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::IngestError;

/// 共有文字列テーブル
///
/// ドキュメントごとに1回だけ構築され、以降は読み取り専用です。
/// `Workbook`と同じ寿命で破棄されます。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SharedStringTable {
    strings: Vec<String>,
}

impl SharedStringTable {
    /// 文字列のリストから直接テーブルを作成
    #[cfg(test)]
    pub fn from_strings<I, S>(strings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            strings: strings.into_iter().map(Into::into).collect(),
        }
    }

    /// `<sst>`要素を解析してテーブルを構築
    ///
    /// 各`<si>`要素が1エントリになります。エントリの値は`<si>`配下の
    /// `<t>`要素（リッチテキストの`<r><t>`を含む）の連結で、
    /// ふりがな（`<rPh>`）のテキストは含めません。
    ///
    /// # 引数
    ///
    /// * `xml` - sharedStrings.xmlの内容
    ///
    /// # 戻り値
    ///
    /// * `Ok(SharedStringTable)` - 解析に成功した場合
    /// * `Err(IngestError::MalformedDocument)` - XMLが壊れている場合
    pub fn from_xml(xml: &[u8]) -> Result<Self, IngestError> {
        let mut reader = Reader::from_reader(xml);
        // <t xml:space="preserve">の前後の空白を保持するため、トリムしない
        reader.trim_text(false);

        let mut buf = Vec::new();
        let mut strings = Vec::new();
        let mut in_si = false;
        let mut in_t = false;
        let mut phonetic_depth = 0usize;
        let mut current = String::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => match e.local_name().as_ref() {
                    b"si" => {
                        in_si = true;
                        current.clear();
                    }
                    b"rPh" if in_si => phonetic_depth += 1,
                    b"t" if in_si && phonetic_depth == 0 => in_t = true,
                    _ => {}
                },
                Event::Empty(e) => {
                    // <si/> は空文字列のエントリ
                    if e.local_name().as_ref() == b"si" && !in_si {
                        strings.push(String::new());
                    }
                }
                Event::Text(e) if in_t => {
                    current.push_str(&e.unescape()?);
                }
                Event::CData(e) if in_t => {
                    current.push_str(std::str::from_utf8(&e.into_inner())?);
                }
                Event::End(e) => match e.local_name().as_ref() {
                    b"si" if in_si => {
                        strings.push(std::mem::take(&mut current));
                        in_si = false;
                        in_t = false;
                        phonetic_depth = 0;
                    }
                    b"rPh" => phonetic_depth = phonetic_depth.saturating_sub(1),
                    b"t" => in_t = false,
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(Self { strings })
    }

    /// インデックスから文字列を取得
    ///
    /// # 戻り値
    ///
    /// * `Ok(&str)` - インデックスがテーブルの範囲内の場合
    /// * `Err(IngestError::MalformedDocument)` - 範囲外の場合（構造的な破損として扱う）
    pub fn resolve(&self, index: usize) -> Result<&str, IngestError> {
        self.strings.get(index).map(String::as_str).ok_or_else(|| {
            IngestError::MalformedDocument(format!(
                "Shared string index {} is out of range (table size: {})",
                index,
                self.strings.len()
            ))
        })
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}
