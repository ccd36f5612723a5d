//! Sheet Row Iterator
//!
//! ワークシートXMLの`<row>`要素を物理的な格納順に1行ずつ読み出すイテレータ。
//! 行番号`r="1"`の行はヘッダーとしてスキップします。

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::IngestError;
use crate::types::{CellKind, RawCell, SheetRow};

/// ヘッダー行の行番号（1始まり）
const HEADER_ROW_INDEX: u32 = 1;

/// ワークシートの行を遅延的に読み出すイテレータ
///
/// 行は宣言された行番号ではなく、XML内の出現順に返されます。
/// 一度消費したイテレータは巻き戻せません。最初のエラーの後は`None`を返し続けます。
pub(crate) struct SheetRows<'a> {
    reader: Reader<&'a [u8]>,
    finished: bool,
}

impl<'a> SheetRows<'a> {
    pub fn new(sheet_xml: &'a [u8]) -> Self {
        let mut reader = Reader::from_reader(sheet_xml);
        reader.trim_text(false);
        Self {
            reader,
            finished: false,
        }
    }

    /// 次の非ヘッダー行を読む。シート末尾なら`Ok(None)`
    fn next_row(&mut self) -> Result<Option<SheetRow>, IngestError> {
        loop {
            match self.reader.read_event()? {
                Event::Start(e) if e.local_name().as_ref() == b"row" => {
                    let index = row_index(&e)?;
                    let cells = read_row_cells(&mut self.reader)?;
                    if index == Some(HEADER_ROW_INDEX) {
                        continue;
                    }
                    return Ok(Some(SheetRow { index, cells }));
                }
                Event::Empty(e) if e.local_name().as_ref() == b"row" => {
                    let index = row_index(&e)?;
                    if index == Some(HEADER_ROW_INDEX) {
                        continue;
                    }
                    return Ok(Some(SheetRow {
                        index,
                        cells: Vec::new(),
                    }));
                }
                Event::Eof => return Ok(None),
                _ => {}
            }
        }
    }
}

impl Iterator for SheetRows<'_> {
    type Item = Result<SheetRow, IngestError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_row() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

impl std::iter::FusedIterator for SheetRows<'_> {}

/// `<row r="...">`の行番号を取得（省略時は`None`）
fn row_index(row: &BytesStart<'_>) -> Result<Option<u32>, IngestError> {
    for attr in row.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == b"r" {
            let value = std::str::from_utf8(&attr.value)?;
            let index = value.trim().parse::<u32>().map_err(|_| {
                IngestError::MalformedDocument(format!("Invalid row index: '{}'", value))
            })?;
            return Ok(Some(index));
        }
    }
    Ok(None)
}

/// `</row>`までのセルを読む
fn read_row_cells(reader: &mut Reader<&[u8]>) -> Result<Vec<RawCell>, IngestError> {
    let mut cells = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == b"c" => {
                let (reference, kind) = cell_attributes(&e)?;
                let raw = read_cell_value(reader, kind)?;
                cells.push(RawCell {
                    reference,
                    kind,
                    raw,
                });
            }
            Event::Empty(e) if e.local_name().as_ref() == b"c" => {
                // <c r="C2" s="1"/> 値を持たないセル
                let (reference, kind) = cell_attributes(&e)?;
                cells.push(RawCell {
                    reference,
                    kind,
                    raw: None,
                });
            }
            Event::End(e) if e.local_name().as_ref() == b"row" => break,
            Event::Eof => {
                return Err(IngestError::MalformedDocument(
                    "Unexpected end of worksheet inside <row>".to_string(),
                ))
            }
            _ => {}
        }
    }

    Ok(cells)
}

/// `<c>`要素の`r`属性と`t`属性を取得
fn cell_attributes(cell: &BytesStart<'_>) -> Result<(Option<String>, CellKind), IngestError> {
    let mut reference = None;
    let mut kind = CellKind::Literal;

    for attr in cell.attributes() {
        let attr = attr?;
        match attr.key.as_ref() {
            b"r" => reference = Some(std::str::from_utf8(&attr.value)?.to_string()),
            b"t" => kind = CellKind::from_type_attr(&attr.value),
            _ => {}
        }
    }

    Ok((reference, kind))
}

/// `</c>`までを読み、セルの生テキストを取得
///
/// 通常のセルは`<v>`の内容、インライン文字列は`<is>`配下の`<t>`の連結を返します。
/// `<f>`（数式）の内容は無視します。
fn read_cell_value(
    reader: &mut Reader<&[u8]>,
    kind: CellKind,
) -> Result<Option<String>, IngestError> {
    let mut value: Option<String> = None;
    let mut inline: Option<String> = None;
    let mut in_v = false;
    let mut in_is = false;
    let mut in_t = false;
    let mut phonetic_depth = 0usize;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"v" => {
                    in_v = true;
                    value.get_or_insert_with(String::new);
                }
                b"is" => {
                    in_is = true;
                    inline.get_or_insert_with(String::new);
                }
                b"rPh" if in_is => phonetic_depth += 1,
                b"t" if in_is && phonetic_depth == 0 => in_t = true,
                _ => {}
            },
            Event::Text(e) => {
                if in_v {
                    value.get_or_insert_with(String::new).push_str(&e.unescape()?);
                } else if in_t {
                    inline.get_or_insert_with(String::new).push_str(&e.unescape()?);
                }
            }
            Event::CData(e) => {
                let text = e.into_inner();
                let text = std::str::from_utf8(&text)?;
                if in_v {
                    value.get_or_insert_with(String::new).push_str(text);
                } else if in_t {
                    inline.get_or_insert_with(String::new).push_str(text);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"v" => in_v = false,
                b"t" => in_t = false,
                b"rPh" => phonetic_depth = phonetic_depth.saturating_sub(1),
                b"is" => in_is = false,
                b"c" => break,
                _ => {}
            },
            Event::Eof => {
                return Err(IngestError::MalformedDocument(
                    "Unexpected end of worksheet inside <c>".to_string(),
                ))
            }
            _ => {}
        }
    }

    Ok(match kind {
        CellKind::InlineString => inline.or(value),
        CellKind::SharedString | CellKind::Literal => value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(rows: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <sheetData>{}</sheetData>
</worksheet>"#,
            rows
        )
    }

    fn collect(xml: &str) -> Vec<SheetRow> {
        SheetRows::new(xml.as_bytes())
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn test_header_row_is_skipped() {
        let xml = sheet(
            r#"<row r="1"><c r="A1" t="s"><v>0</v></c></row>
               <row r="2"><c r="A2"><v>7</v></c></row>"#,
        );
        let rows = collect(&xml);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].index, Some(2));
        assert_eq!(
            rows[0].cells,
            vec![RawCell::new(Some("A2"), CellKind::Literal, Some("7"))]
        );
    }

    #[test]
    fn test_physical_order_is_preserved() {
        let xml = sheet(
            r#"<row r="5"><c r="A5"><v>5</v></c></row>
               <row r="1"><c r="A1"><v>1</v></c></row>
               <row r="3"><c r="A3"><v>3</v></c></row>
               <row><c r="A9"><v>9</v></c></row>"#,
        );
        let indices: Vec<_> = collect(&xml).iter().map(|row| row.index).collect();
        assert_eq!(indices, vec![Some(5), Some(3), None]);
    }

    #[test]
    fn test_cell_kinds_and_values() {
        let xml = sheet(
            r#"<row r="2">
                 <c r="A2" t="s"><v>3</v></c>
                 <c r="B2" s="1"/>
                 <c r="C2" t="inlineStr"><is><r><t>Inline</t></r><r><t xml:space="preserve"> text</t></r></is></c>
                 <c r="D2" t="str"><f>CONCAT("a","b")</f><v>ab</v></c>
                 <c r="E2"><v>1999</v></c>
               </row>"#,
        );
        let rows = collect(&xml);
        let cells = &rows[0].cells;
        assert_eq!(cells.len(), 5);
        assert_eq!(cells[0], RawCell::new(Some("A2"), CellKind::SharedString, Some("3")));
        assert_eq!(cells[1], RawCell::new(Some("B2"), CellKind::Literal, None));
        assert_eq!(
            cells[2],
            RawCell::new(Some("C2"), CellKind::InlineString, Some("Inline text"))
        );
        assert_eq!(cells[3], RawCell::new(Some("D2"), CellKind::Literal, Some("ab")));
        assert_eq!(cells[4], RawCell::new(Some("E2"), CellKind::Literal, Some("1999")));
    }

    #[test]
    fn test_empty_row_element() {
        let xml = sheet(r#"<row r="1"/><row r="2" spans="1:6"/>"#);
        let rows = collect(&xml);
        assert_eq!(rows.len(), 1);
        assert!(rows[0].cells.is_empty());
    }

    #[test]
    fn test_invalid_row_index_is_malformed_and_fused() {
        let xml = sheet(
            r#"<row r="2"><c r="A2"><v>1</v></c></row>
               <row r="two"><c r="A3"><v>2</v></c></row>
               <row r="4"><c r="A4"><v>3</v></c></row>"#,
        );
        let mut rows = SheetRows::new(xml.as_bytes());
        assert!(rows.next().unwrap().is_ok());
        assert!(rows.next().unwrap().unwrap_err().is_malformed());
        assert!(rows.next().is_none());
    }

    #[test]
    fn test_truncated_sheet_is_malformed() {
        let xml = r#"<worksheet><sheetData><row r="2"><c r="A2"><v>1</v>"#;
        let result: Result<Vec<_>, _> = SheetRows::new(xml.as_bytes()).collect();
        assert!(result.unwrap_err().is_malformed());
    }
}
