//! 辞書ファイルの読み込み
//!
//! このモジュールは、辞書メタデータ（JSON）と地名語データ（CSV）の
//! 読み込みを提供します。CSVは見出し行でカラム名を宣言し、複数値の
//! カラムは `/` 区切り、コード体系カラムは `体系:値` の組で表現
//! されます。

use std::fs;
use std::path::Path;

use crate::dictionary::Dictionary;
use crate::errors::{ChimeiError, Result};
use crate::geoword::Geoword;

/// 複数値として解釈するカラム名
const LIST_COLUMNS: &[&str] = &["prefix", "suffix", "prefix_kana", "suffix_kana", "hypernym"];

/// 辞書メタデータをJSONファイルから読み込みます。
///
/// # エラー
///
/// ファイルが読めない場合、JSONとして解釈できない場合、必須項目が
/// 欠けている場合にエラーを返します。
pub(crate) fn load_dictionary_json(path: &Path) -> Result<Dictionary> {
    let text = fs::read_to_string(path)?;
    let dictionary = Dictionary::from_json(&text)?;
    if !dictionary.is_valid() {
        return Err(ChimeiError::format(format!(
            "Dictionary metadata is not valid: {}",
            path.display()
        )));
    }
    Ok(dictionary)
}

/// 地名語データをCSVファイルから読み込みます。
///
/// 1行目を見出し行として各カラムを地名語の項目に写します。
/// `geonlp_id` を持たない行では `geolod_id` を昇格させ、それもない
/// 場合は `_{辞書ID}_{エントリID}` を合成します。必須項目の欠けた行は
/// 警告を出して読み飛ばします。
///
/// # 引数
///
/// * `path` - CSVファイルのパス
/// * `dictionary_id` - 所属させる辞書の内部ID
pub(crate) fn read_geoword_csv(path: &Path, dictionary_id: i64) -> Result<Vec<Geoword>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut geowords = Vec::new();
    for (lineno, record) in reader.records().enumerate() {
        let record = record?;
        let geoword = geoword_from_record(&headers, &record, dictionary_id);
        if geoword.is_valid() {
            geowords.push(geoword);
        } else {
            log::warn!(
                "Skipped an invalid geoword row {} in {}",
                lineno + 2,
                path.display()
            );
        }
    }
    Ok(geowords)
}

/// CSVの1行を地名語エントリに変換します。
fn geoword_from_record(
    headers: &[String],
    record: &csv::StringRecord,
    dictionary_id: i64,
) -> Geoword {
    let mut geoword = Geoword::new();
    for (field, value) in headers.iter().zip(record.iter()) {
        let value = value.trim_end();
        if value.is_empty() {
            continue;
        }
        if LIST_COLUMNS.contains(&field.as_str()) {
            geoword.set_delimited_list(field, value);
        } else if field == "code" {
            geoword.set_delimited_map(field, value);
        } else {
            geoword.set_string(field, value);
        }
    }
    geoword.set_dictionary_id(dictionary_id);

    if geoword.geonlp_id().is_empty() {
        let entry_id = geoword.entry_id();
        if !entry_id.is_empty() {
            geoword.set_geonlp_id(format!("_{}_{}", dictionary_id, entry_id));
        }
    } else if !geoword.has_key("geonlp_id") {
        // geolod_id を geonlp_id に乗せ換える
        let id = geoword.geonlp_id();
        geoword.set_geonlp_id(id);
        geoword.remove_key("geolod_id");
    }
    geoword
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_read_geoword_csv() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = write_file(
            dir.path(),
            "words.csv",
            "geonlp_id,entry_id,body,suffix,body_kana,suffix_kana,ne_class,latitude,longitude\n\
             aBcDe1,13103,東京,,トウキョウ,,市区町村,35.68,139.76\n\
             fGhIj2,07201,福島,県/,フクシマ,ケン/,都道府県,37.75,140.46\n",
        );
        let geowords = read_geoword_csv(&csv_path, 5).unwrap();
        assert_eq!(geowords.len(), 2);
        assert_eq!(geowords[0].geonlp_id(), "aBcDe1");
        assert_eq!(geowords[0].dictionary_id(), 5);
        assert_eq!(geowords[1].suffix(), vec!["県".to_string()]);
        assert_eq!(geowords[1].typical_name(), "福島県");
    }

    #[test]
    fn test_geolod_id_promotion_and_synthesis() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = write_file(
            dir.path(),
            "words.csv",
            "geolod_id,entry_id,body,ne_class\n\
             xYz123,1,大阪,市区町村\n\
             ,2,京都,市区町村\n",
        );
        let geowords = read_geoword_csv(&csv_path, 7).unwrap();
        assert_eq!(geowords.len(), 2);
        assert_eq!(geowords[0].geonlp_id(), "xYz123");
        assert!(!geowords[0].has_key("geolod_id"));
        assert_eq!(geowords[1].geonlp_id(), "_7_2");
    }

    #[test]
    fn test_quoted_fields_and_embedded_newline() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = write_file(
            dir.path(),
            "words.csv",
            "geonlp_id,entry_id,body,ne_class,note\n\
             aBcDe1,1,東京,市区町村,\"a, b\nc\"\n",
        );
        let geowords = read_geoword_csv(&csv_path, 1).unwrap();
        assert_eq!(geowords.len(), 1);
    }

    #[test]
    fn test_invalid_rows_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = write_file(
            dir.path(),
            "words.csv",
            "geonlp_id,entry_id,body,ne_class\n\
             aBcDe1,1,,市区町村\n\
             fGhIj2,2,奈良,\n",
        );
        let geowords = read_geoword_csv(&csv_path, 1).unwrap();
        assert!(geowords.is_empty());
    }

    #[test]
    fn test_load_dictionary_json() {
        let dir = tempfile::tempdir().unwrap();
        let json_path = write_file(
            dir.path(),
            "dict.json",
            r#"{
                "identifier": ["geonlp:japan_city"],
                "name": "日本の市区町村",
                "distribution": [{"contentUrl": "https://example.org/japan_city.csv"}]
            }"#,
        );
        let dictionary = load_dictionary_json(&json_path).unwrap();
        assert_eq!(dictionary.identifier(), Some("geonlp:japan_city".to_string()));

        let broken = write_file(dir.path(), "broken.json", r#"{"name": "x"}"#);
        assert!(load_dictionary_json(&broken).is_err());
    }
}
