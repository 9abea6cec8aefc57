//! ガゼッティア（地名語辞書）メタデータの定義
//!
//! このモジュールは、一括で登録・削除される地名語の集合である辞書の
//! メタデータを表現する型を提供します。地名語と同様にJSONオブジェクトの
//! ラッパーであり、未知の項目は失われずに保持されます。

use serde_json::{Map, Value};

use crate::errors::{ChimeiError, Result};

/// 辞書識別子の接頭辞
const IDENTIFIER_PREFIX: &str = "geonlp:";

/// 辞書メタデータ
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dictionary {
    fields: Map<String, Value>,
}

impl Dictionary {
    /// 空の辞書メタデータを生成します。
    pub fn new() -> Self {
        Self::default()
    }

    /// JSONテキストから辞書メタデータを復元します。
    ///
    /// # エラー
    ///
    /// JSONオブジェクトとして解釈できない場合にエラーを返します。
    pub fn from_json(text: &str) -> Result<Self> {
        match serde_json::from_str(text)? {
            Value::Object(fields) => Ok(Self { fields }),
            _ => Err(ChimeiError::format("A dictionary must be a JSON object.")),
        }
    }

    /// JSONテキストを返します。
    pub fn to_json(&self) -> String {
        Value::Object(self.fields.clone()).to_string()
    }

    fn string_of(&self, key: &str) -> String {
        match self.fields.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        }
    }

    /// 辞書識別子を返します。
    ///
    /// `identifier` 項目の配列から `geonlp:` で始まる要素を探します。
    /// 項目が単一の文字列の場合も受け付けます。
    pub fn identifier(&self) -> Option<String> {
        match self.fields.get("identifier") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str())
                .find(|s| s.starts_with(IDENTIFIER_PREFIX))
                .map(str::to_string),
            Some(Value::String(s)) if s.starts_with(IDENTIFIER_PREFIX) => Some(s.clone()),
            _ => None,
        }
    }

    /// 辞書名を返します。
    pub fn name(&self) -> String {
        self.string_of("name")
    }

    /// キーワードのリストを返します。
    pub fn keywords(&self) -> Vec<String> {
        match self.fields.get("keywords") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str())
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// 辞書の説明を返します。
    pub fn description(&self) -> String {
        self.string_of("description")
    }

    /// 辞書のURLを返します。
    pub fn url(&self) -> String {
        self.string_of("url")
    }

    /// 地名語CSVの置かれている場所を返します。
    ///
    /// `distribution` 配列の要素から最初の `contentUrl` を探します。
    pub fn content_url(&self) -> Option<String> {
        match self.fields.get("distribution") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.get("contentUrl"))
                .filter_map(|v| v.as_str())
                .next()
                .map(str::to_string),
            _ => None,
        }
    }

    /// 修正日時を返します。
    pub fn date_modified(&self) -> String {
        self.string_of("dateModified")
    }

    /// 登録されている地名語の件数表記を返します。
    pub fn size(&self) -> String {
        self.string_of("size")
    }

    /// 必須項目が揃っているかどうかを返します。
    ///
    /// 識別子、辞書名、CSVの場所のすべてが必要です。
    pub fn is_valid(&self) -> bool {
        self.identifier().is_some() && !self.name().is_empty() && self.content_url().is_some()
    }
}
