//! Package Reader
//!
//! XLSXファイル（ZIPアーカイブ）を開き、取り込みに必要なパートだけを
//! メモリに読み込みます。アーカイブ自体は`PackageParts::load`の終了時に
//! 解放されます（エラー経路を含む）。

use std::io::{Cursor, Read, Seek};

use quick_xml::events::Event;
use quick_xml::Reader;
use zip::result::ZipError;
use zip::ZipArchive;

use crate::error::IngestError;
use crate::security::{validate_zip_path, SecurityConfig};

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
const DEFAULT_SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";

/// リレーションシップ（`<Relationship>`要素）
#[derive(Debug, Clone, PartialEq, Eq)]
struct Relationship {
    id: String,
    rel_type: String,
    target: String,
}

/// パッケージから読み出したパート
#[derive(Debug, Clone)]
pub(crate) struct PackageParts {
    /// 先頭シートの名前（workbook.xmlの最初の`<sheet>`）
    pub sheet_name: String,
    /// 先頭シートのパート名（例: "xl/worksheets/sheet1.xml"）
    pub sheet_path: String,
    /// 先頭シートのXML
    pub sheet_xml: Vec<u8>,
    /// 共有文字列パートのXML（存在しない場合は`None`）
    pub shared_strings_xml: Option<Vec<u8>>,
}

impl PackageParts {
    /// パッケージを開き、先頭ワークシートと共有文字列パートを読み込む
    ///
    /// # 引数
    ///
    /// * `bytes` - XLSXファイル全体のバイト列
    /// * `security` - セキュリティ制限
    ///
    /// # 戻り値
    ///
    /// * `Ok(PackageParts)` - 必要なパートの読み込みに成功した場合
    /// * `Err(IngestError::MalformedDocument)` - ZIPとして不正、またはworkbook・ワークシートが欠落している場合
    /// * `Err(IngestError::SecurityViolation)` - セキュリティ制限に違反した場合
    pub fn load(bytes: &[u8], security: &SecurityConfig) -> Result<Self, IngestError> {
        security.check_input_size(bytes.len())?;

        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        check_archive(&mut archive, security)?;

        // 1. xl/workbook.xml から先頭シートを取得
        let workbook_xml = read_part(&mut archive, WORKBOOK_PART, security)?.ok_or_else(|| {
            IngestError::MalformedDocument(format!("Missing workbook part '{}'", WORKBOOK_PART))
        })?;
        let (sheet_name, sheet_rid) = first_sheet(&workbook_xml)?;

        // 2. リレーションシップからワークシートのパート名を解決
        let rels_xml = read_part(&mut archive, WORKBOOK_RELS_PART, security)?.ok_or_else(|| {
            IngestError::MalformedDocument(format!(
                "Missing workbook relationships part '{}'",
                WORKBOOK_RELS_PART
            ))
        })?;
        let relationships = parse_relationships(&rels_xml)?;

        let sheet_rel = relationships
            .iter()
            .find(|rel| rel.id == sheet_rid)
            .ok_or_else(|| {
                IngestError::MalformedDocument(format!(
                    "Relationship '{}' for sheet '{}' not found",
                    sheet_rid, sheet_name
                ))
            })?;
        let sheet_path = resolve_target("xl", &sheet_rel.target);

        let sheet_xml = read_part(&mut archive, &sheet_path, security)?.ok_or_else(|| {
            IngestError::MalformedDocument(format!("Missing worksheet part '{}'", sheet_path))
        })?;

        // 3. 共有文字列パート（任意）
        let shared_strings_path = relationships
            .iter()
            .find(|rel| rel.rel_type.ends_with("/sharedStrings"))
            .map(|rel| resolve_target("xl", &rel.target))
            .unwrap_or_else(|| DEFAULT_SHARED_STRINGS_PART.to_string());
        let shared_strings_xml = read_part(&mut archive, &shared_strings_path, security)?;

        log::debug!(
            "Loaded sheet '{}' from '{}' (shared strings: {})",
            sheet_name,
            sheet_path,
            shared_strings_xml.is_some()
        );

        Ok(Self {
            sheet_name,
            sheet_path,
            sheet_xml,
            shared_strings_xml,
        })
    }
}

/// エントリ数・パス・展開後サイズを検証
fn check_archive<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    security: &SecurityConfig,
) -> Result<(), IngestError> {
    if archive.len() > security.max_file_count {
        return Err(IngestError::SecurityViolation(format!(
            "ZIP archive contains too many files: {} (max: {})",
            archive.len(),
            security.max_file_count
        )));
    }

    let mut total_decompressed_size = 0u64;
    for i in 0..archive.len() {
        let file = archive.by_index(i)?;
        let file_name = file.name();

        validate_zip_path(file_name)
            .map_err(|e| IngestError::SecurityViolation(format!("Invalid ZIP path: {}", e)))?;

        let file_size = file.size();
        if file_size > security.max_file_size {
            return Err(IngestError::SecurityViolation(format!(
                "File '{}' exceeds maximum size: {} bytes (max: {} bytes)",
                file_name, file_size, security.max_file_size
            )));
        }

        total_decompressed_size = total_decompressed_size
            .checked_add(file_size)
            .ok_or_else(|| {
                IngestError::SecurityViolation(
                    "Total decompressed size calculation overflow".to_string(),
                )
            })?;
        if total_decompressed_size > security.max_decompressed_size {
            return Err(IngestError::SecurityViolation(format!(
                "Total decompressed size exceeds maximum: {} bytes (max: {} bytes)",
                total_decompressed_size, security.max_decompressed_size
            )));
        }
    }

    Ok(())
}

/// パートを読み込む。存在しない場合は`Ok(None)`
fn read_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
    security: &SecurityConfig,
) -> Result<Option<Vec<u8>>, IngestError> {
    let file = match archive.by_name(name) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    // ヘッダーのサイズ申告を信用せず、上限+1バイトまでしか読まない
    let mut content = Vec::new();
    file.take(security.max_file_size.saturating_add(1))
        .read_to_end(&mut content)?;
    if content.len() as u64 > security.max_file_size {
        return Err(IngestError::SecurityViolation(format!(
            "File '{}' exceeds maximum size (max: {} bytes)",
            name, security.max_file_size
        )));
    }

    Ok(Some(content))
}

/// workbook.xmlの最初の`<sheet>`から(シート名, r:id)を取得
fn first_sheet(workbook_xml: &[u8]) -> Result<(String, String), IngestError> {
    let mut reader = Reader::from_reader(workbook_xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                let mut name = None;
                let mut rid = None;
                for attr in e.attributes() {
                    let attr = attr?;
                    // r:id は名前空間プレフィックス付きなので、ローカル名で判定する
                    match attr.key.local_name().as_ref() {
                        b"name" => name = Some(attr.unescape_value()?.into_owned()),
                        b"id" => rid = Some(attr.unescape_value()?.into_owned()),
                        _ => {}
                    }
                }
                return match (name, rid) {
                    (Some(name), Some(rid)) => Ok((name, rid)),
                    _ => Err(IngestError::MalformedDocument(
                        "First <sheet> element lacks name or r:id".to_string(),
                    )),
                };
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Err(IngestError::MalformedDocument(
        "Workbook contains no worksheet".to_string(),
    ))
}

/// リレーションシップファイルを解析
fn parse_relationships(rels_xml: &[u8]) -> Result<Vec<Relationship>, IngestError> {
    let mut reader = Reader::from_reader(rels_xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut relationships = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                let mut id = None;
                let mut rel_type = String::new();
                let mut target = None;

                for attr in e.attributes() {
                    let attr = attr?;
                    match attr.key.as_ref() {
                        b"Id" => id = Some(attr.unescape_value()?.into_owned()),
                        b"Type" => rel_type = attr.unescape_value()?.into_owned(),
                        b"Target" => target = Some(attr.unescape_value()?.into_owned()),
                        _ => {}
                    }
                }

                // IDまたはターゲットが欠落しているリレーションシップはスキップ
                if let (Some(id), Some(target)) = (id, target) {
                    relationships.push(Relationship {
                        id,
                        rel_type,
                        target,
                    });
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(relationships)
}

/// リレーションシップのターゲットをパート名に解決
///
/// 例: ("xl", "worksheets/sheet1.xml") -> "xl/worksheets/sheet1.xml"、
/// ("xl", "/xl/worksheets/sheet1.xml") -> "xl/worksheets/sheet1.xml"
fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}
