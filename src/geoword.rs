//! 地名語エントリの定義
//!
//! このモジュールは、ガゼッティアの1エントリである地名語を表現する型を
//! 提供します。地名語の正準表現はJSONオブジェクトであり、定義済みの
//! 項目には型付きのアクセサを用意しつつ、未知の項目も失われずに
//! 保持されます（ラウンドトリップ可能）。

use serde_json::{Map, Value};

use crate::errors::{ChimeiError, Result};
use crate::normalizer::standardize;

/// 地名語候補の表層形の最大長（バイト）
pub const MAX_GEOWORD_LENGTH: usize = 192;

/// 地名語エントリ
///
/// JSONオブジェクトのラッパーとして実装されており、定義済み項目は
/// 型付きアクセサを通して読み書きします。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Geoword {
    fields: Map<String, Value>,
}

impl Geoword {
    /// 空の地名語エントリを生成します。
    pub fn new() -> Self {
        Self::default()
    }

    /// JSONテキストから地名語エントリを復元します。
    ///
    /// # エラー
    ///
    /// JSONオブジェクトとして解釈できない場合にエラーを返します。
    pub fn from_json(text: &str) -> Result<Self> {
        match serde_json::from_str(text)? {
            Value::Object(fields) => Ok(Self { fields }),
            _ => Err(ChimeiError::format("A geoword must be a JSON object.")),
        }
    }

    /// JSONテキストを返します。
    pub fn to_json(&self) -> String {
        Value::Object(self.fields.clone()).to_string()
    }

    /// 指定したキーが存在するかどうかを返します。
    pub fn has_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// 指定したキーの値を除去します。
    pub fn remove_key(&mut self, key: &str) {
        self.fields.remove(key);
    }

    /// 文字列値を設定します。
    pub fn set_string<S>(&mut self, key: &str, value: S)
    where
        S: Into<String>,
    {
        self.fields.insert(key.to_string(), Value::String(value.into()));
    }

    /// 整数値を設定します。
    pub fn set_int(&mut self, key: &str, value: i64) {
        self.fields.insert(key.to_string(), Value::from(value));
    }

    /// `/` 区切りの文字列を配列値として設定します。
    pub fn set_delimited_list(&mut self, key: &str, value: &str) {
        let list: Vec<Value> = value
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| Value::String(s.to_string()))
            .collect();
        self.fields.insert(key.to_string(), Value::Array(list));
    }

    /// `/` 区切りの `体系:値` の列をオブジェクト値として設定します。
    pub fn set_delimited_map(&mut self, key: &str, value: &str) {
        let mut map = Map::new();
        for pair in value.split('/').filter(|s| !s.is_empty()) {
            if let Some((scheme, code)) = pair.split_once(':') {
                map.insert(scheme.to_string(), Value::String(code.to_string()));
            }
        }
        self.fields.insert(key.to_string(), Value::Object(map));
    }

    /// 文字列値を取得します。数値の場合は10進表記に変換します。
    fn string_of(&self, key: &str) -> String {
        match self.fields.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        }
    }

    /// 整数値を取得します。文字列の場合は10進として解釈します。
    fn int_of(&self, key: &str) -> i64 {
        match self.fields.get(key) {
            Some(Value::Number(n)) => n.as_i64().unwrap_or(0),
            Some(Value::String(s)) => s.parse().unwrap_or(0),
            _ => 0,
        }
    }

    /// 文字列配列値を取得します。
    fn list_of(&self, key: &str) -> Vec<String> {
        match self.fields.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str())
                .map(str::to_string)
                .collect(),
            Some(Value::String(s)) if !s.is_empty() => vec![s.clone()],
            _ => Vec::new(),
        }
    }

    /// 地名語IDを返します。
    ///
    /// `geonlp_id` が空の場合は `geolod_id` を返します。
    pub fn geonlp_id(&self) -> String {
        let id = self.string_of("geonlp_id");
        if id.is_empty() {
            self.string_of("geolod_id")
        } else {
            id
        }
    }

    /// 地名語IDを設定します。
    pub fn set_geonlp_id<S>(&mut self, id: S)
    where
        S: Into<String>,
    {
        self.set_string("geonlp_id", id);
    }

    /// 辞書内エントリIDを返します。
    pub fn entry_id(&self) -> String {
        self.string_of("entry_id")
    }

    /// 所属する辞書の内部IDを返します。
    pub fn dictionary_id(&self) -> i64 {
        self.int_of("dictionary_id")
    }

    /// 所属する辞書の内部IDを設定します。
    pub fn set_dictionary_id(&mut self, id: i64) {
        self.set_int("dictionary_id", id);
    }

    /// 語幹の表記を返します。
    pub fn body(&self) -> String {
        self.string_of("body")
    }

    /// 接頭辞の候補を返します。
    pub fn prefix(&self) -> Vec<String> {
        self.list_of("prefix")
    }

    /// 接尾辞の候補を返します。
    pub fn suffix(&self) -> Vec<String> {
        self.list_of("suffix")
    }

    /// 語幹のカナを返します。
    pub fn body_kana(&self) -> String {
        self.string_of("body_kana")
    }

    /// 接頭辞のカナ候補を返します。`prefix` と同じ並びです。
    pub fn prefix_kana(&self) -> Vec<String> {
        self.list_of("prefix_kana")
    }

    /// 接尾辞のカナ候補を返します。`suffix` と同じ並びです。
    pub fn suffix_kana(&self) -> Vec<String> {
        self.list_of("suffix_kana")
    }

    /// 固有名クラスを返します。
    pub fn ne_class(&self) -> String {
        self.string_of("ne_class")
    }

    /// 上位語のリストを返します。
    pub fn hypernym(&self) -> Vec<String> {
        self.list_of("hypernym")
    }

    /// 優先度スコアを返します。
    pub fn priority_score(&self) -> i64 {
        self.int_of("priority_score")
    }

    /// 緯度の文字列表現を返します。
    pub fn latitude(&self) -> String {
        self.string_of("latitude")
    }

    /// 経度の文字列表現を返します。
    pub fn longitude(&self) -> String {
        self.string_of("longitude")
    }

    /// 住所表記を返します。
    pub fn address(&self) -> String {
        self.string_of("address")
    }

    /// コード体系と値のマップを返します。
    pub fn code(&self) -> Map<String, Value> {
        match self.fields.get("code") {
            Some(Value::Object(map)) => map.clone(),
            _ => Map::new(),
        }
    }

    /// 有効期間の開始を返します。
    pub fn valid_from(&self) -> String {
        self.string_of("valid_from")
    }

    /// 有効期間の終了を返します。
    pub fn valid_to(&self) -> String {
        self.string_of("valid_to")
    }

    /// 代表表記を生成します。
    ///
    /// 先頭の接頭辞 + 語幹 + 先頭の接尾辞を連結したものです。
    pub fn typical_name(&self) -> String {
        let mut name = String::new();
        if let Some(prefix) = self.prefix().first() {
            name.push_str(prefix);
        }
        name.push_str(&self.body());
        if let Some(suffix) = self.suffix().first() {
            name.push_str(suffix);
        }
        name
    }

    /// 代表読みを生成します。
    pub fn typical_kana(&self) -> String {
        let mut kana = String::new();
        if let Some(prefix) = self.prefix_kana().first() {
            kana.push_str(prefix);
        }
        kana.push_str(&self.body_kana());
        if let Some(suffix) = self.suffix_kana().first() {
            kana.push_str(suffix);
        }
        kana
    }

    /// 必須項目が揃っているかどうかを返します。
    ///
    /// 地名語ID、辞書ID、語幹、固有名クラスのすべてが必要です。
    pub fn is_valid(&self) -> bool {
        !self.geonlp_id().is_empty()
            && self.dictionary_id() != 0
            && !self.body().is_empty()
            && !self.ne_class().is_empty()
    }

    /// 経緯度を実数値として返します。
    ///
    /// # 戻り値
    ///
    /// `(緯度, 経度)`。空欄または範囲外の場合は `None` を返します。
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        let lat: f64 = self.latitude().parse().ok()?;
        let lon: f64 = self.longitude().parse().ok()?;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return None;
        }
        Some((lat, lon))
    }

    /// 指定した表記を生成する接頭辞・接尾辞の番号を探します。
    ///
    /// 比較は標準化後の表記で行います。リストが空の場合は空文字列を
    /// 仮定し、その位置は `None` で表します。
    fn prefix_suffix_index(&self, surface: &str) -> Option<(Option<usize>, Option<usize>)> {
        let prefixes = self.prefix();
        let suffixes = self.suffix();
        let prefix_omitted = prefixes.is_empty();
        let suffix_omitted = suffixes.is_empty();
        let prefixes = if prefix_omitted { vec![String::new()] } else { prefixes };
        let suffixes = if suffix_omitted { vec![String::new()] } else { suffixes };

        let body = self.body();
        let target = standardize(surface);
        for (pi, prefix) in prefixes.iter().enumerate() {
            for (si, suffix) in suffixes.iter().enumerate() {
                let candidate = standardize(&format!("{}{}{}", prefix, body, suffix));
                if candidate == target {
                    let pi = if prefix_omitted { None } else { Some(pi) };
                    let si = if suffix_omitted { None } else { Some(si) };
                    return Some((pi, si));
                }
            }
        }
        None
    }

    /// 指定した表記に一致する接頭辞と接尾辞を返します。
    ///
    /// # 戻り値
    ///
    /// `(接頭辞, 接尾辞)`。一致する組み合わせがなければ `None` を
    /// 返します。
    pub fn parts_for_surface(&self, surface: &str) -> Option<(String, String)> {
        let (pi, si) = self.prefix_suffix_index(surface)?;
        let prefix = pi.map(|i| self.prefix()[i].clone()).unwrap_or_default();
        let suffix = si.map(|i| self.suffix()[i].clone()).unwrap_or_default();
        Some((prefix, suffix))
    }

    /// 指定した表記に一致するカナ接頭辞とカナ接尾辞を返します。
    pub fn kana_parts_for_surface(&self, surface: &str) -> Option<(String, String)> {
        let (pi, si) = self.prefix_suffix_index(surface)?;
        let prefix_kana = self.prefix_kana();
        let suffix_kana = self.suffix_kana();
        let prefix = pi
            .and_then(|i| prefix_kana.get(i).cloned())
            .unwrap_or_default();
        let suffix = si
            .and_then(|i| suffix_kana.get(i).cloned())
            .unwrap_or_default();
        Some((prefix, suffix))
    }

    /// GeoJSONの `Feature` オブジェクト表現を返します。
    ///
    /// 経緯度が不正な場合、`coordinates` は空の配列になります。
    /// `name` と `kana` が未設定の場合は代表表記・代表読みを補います。
    pub fn to_geojson(&self) -> Value {
        let coordinates = match self.coordinates() {
            Some((lat, lon)) => vec![Value::from(lon), Value::from(lat)],
            None => Vec::new(),
        };
        let mut properties = self.fields.clone();
        if self.string_of("name").is_empty() {
            properties.insert("name".to_string(), Value::String(self.typical_name()));
        }
        if self.string_of("kana").is_empty() {
            properties.insert("kana".to_string(), Value::String(self.typical_kana()));
        }
        serde_json::json!({
            "type": "Feature",
            "geometry": {
                "type": "Point",
                "coordinates": coordinates,
            },
            "properties": properties,
        })
    }
}
