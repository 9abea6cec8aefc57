//! 地名語ストア
//!
//! このモジュールは、地名語と辞書メタデータの永続ストアを提供します。
//! ストアは2つのSQLiteデータベース（地名語・辞書を持つ `geodic` と、
//! 派生インデックスである `wordlist`）を排他的に所有し、点検索と
//! 一括更新を提供します。複数行の書き込みはすべて1トランザクションで
//! 行われます。地名語の読み出しには上限付きキャッシュが入ります。

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use hashbrown::HashMap;
use rusqlite::{params, Connection, OptionalExtension};
use tempfile::NamedTempFile;

use crate::dictionary::Dictionary;
use crate::errors::{ChimeiError, Result};
use crate::geoword::Geoword;
use crate::importer;
use crate::index::Trie;
use crate::normalizer::standardize;
use crate::wordlist::WordlistEntry;

/// 地名語キャッシュの上限。超過時には全体を破棄する
const GEOWORD_CACHE_SIZE: usize = 1000;

/// 語索引の構築中に使う見出し語バケット
#[derive(Debug, Default, Clone)]
struct WordlistBucket {
    idlist: String,
    surface: String,
    yomi: String,
}

impl WordlistBucket {
    /// 地名語IDと代表表記をバケットに追記します。
    fn push_id(&mut self, geonlp_id: &str, typical_name: &str) {
        if !self.idlist.is_empty() {
            self.idlist.push('/');
        }
        self.idlist.push_str(geonlp_id);
        self.idlist.push(':');
        self.idlist.push_str(typical_name);
    }
}

/// 地名語と辞書の永続ストア
pub struct GazetteerStore {
    geodic: Connection,
    wordlist: Connection,
    trie_path: PathBuf,
    cache: RefCell<HashMap<String, Geoword>>,
}

impl GazetteerStore {
    /// ストアを開きます。テーブルが存在しない場合は作成します。
    ///
    /// # 引数
    ///
    /// * `geodic_path` - 地名語・辞書データベースのパス
    /// * `wordlist_path` - 語索引データベースのパス
    /// * `trie_path` - トライファイルのパス
    pub fn open<P1, P2, P3>(geodic_path: P1, wordlist_path: P2, trie_path: P3) -> Result<Self>
    where
        P1: AsRef<Path>,
        P2: AsRef<Path>,
        P3: AsRef<Path>,
    {
        let geodic = Connection::open(geodic_path)?;
        let wordlist = Connection::open(wordlist_path)?;
        let store = Self {
            geodic,
            wordlist,
            trie_path: trie_path.as_ref().to_path_buf(),
            cache: RefCell::new(HashMap::new()),
        };
        store.create_tables()?;
        Ok(store)
    }

    /// テーブルが存在しなければ作成します。
    fn create_tables(&self) -> Result<()> {
        self.geodic.execute_batch(
            "CREATE TABLE IF NOT EXISTS geoword(
                geonlp_id TEXT PRIMARY KEY,
                dictionary_id INTEGER,
                entry_id TEXT,
                json TEXT
            );
            CREATE TABLE IF NOT EXISTS dictionary(
                id INTEGER PRIMARY KEY,
                identifier TEXT UNIQUE,
                json TEXT
            );",
        )?;
        self.wordlist.execute_batch(
            "CREATE TABLE IF NOT EXISTS wordlist(
                id INTEGER PRIMARY KEY,
                key TEXT,
                surface TEXT,
                idlist TEXT,
                yomi TEXT
            );",
        )?;
        Ok(())
    }

    /// トライファイルのパスを返します。
    #[inline(always)]
    pub fn trie_path(&self) -> &Path {
        &self.trie_path
    }

    /// 地名語IDで地名語エントリを検索します。
    ///
    /// 結果は上限付きキャッシュに載ります。キャッシュの有無は観測可能な
    /// 挙動に影響しません。
    ///
    /// # 戻り値
    ///
    /// 見つからない場合は `None`
    pub fn find_geoword_by_id(&self, geonlp_id: &str) -> Result<Option<Geoword>> {
        if let Some(geoword) = self.cache.borrow().get(geonlp_id) {
            return Ok(Some(geoword.clone()));
        }
        let json: Option<String> = self
            .geodic
            .query_row(
                "SELECT json FROM geoword WHERE geonlp_id = ?1",
                params![geonlp_id],
                |row| row.get(0),
            )
            .optional()?;
        let Some(json) = json else {
            return Ok(None);
        };
        let geoword = Geoword::from_json(&json)?;
        if !geoword.is_valid() {
            return Ok(None);
        }
        let mut cache = self.cache.borrow_mut();
        if cache.len() >= GEOWORD_CACHE_SIZE {
            cache.clear();
        }
        cache.insert(geonlp_id.to_string(), geoword.clone());
        Ok(Some(geoword))
    }

    /// 辞書IDとエントリIDの組で地名語エントリを検索します。
    pub fn find_geoword_by_dictionary_and_entry(
        &self,
        dictionary_id: i64,
        entry_id: &str,
    ) -> Result<Option<Geoword>> {
        let json: Option<String> = self
            .geodic
            .query_row(
                "SELECT json FROM geoword WHERE dictionary_id = ?1 AND entry_id = ?2",
                params![dictionary_id, entry_id],
                |row| row.get(0),
            )
            .optional()?;
        match json {
            Some(json) => {
                let geoword = Geoword::from_json(&json)?;
                Ok(geoword.is_valid().then_some(geoword))
            }
            None => Ok(None),
        }
    }

    /// 表記に一致する地名語エントリの一覧を検索します。
    ///
    /// 語索引を利用するため、`geoword` テーブルに変更があった場合は
    /// 先に [`update_wordlists`](Self::update_wordlists) を実行しておく
    /// 必要があります。
    pub fn find_geowords_by_surface(&self, surface: &str) -> Result<Vec<Geoword>> {
        match self.find_wordlist_by_key(surface)? {
            Some(entry) => self.get_geowords_from_wordlist(&entry, 0),
            None => Ok(Vec::new()),
        }
    }

    /// 見出し語IDで語索引エントリを検索します。
    pub fn find_wordlist_by_id(&self, id: u32) -> Result<Option<WordlistEntry>> {
        self.wordlist
            .query_row(
                "SELECT id, key, surface, idlist, yomi FROM wordlist WHERE id = ?1",
                params![id],
                row_to_wordlist,
            )
            .optional()
            .map_err(Into::into)
    }

    /// 標準化した表記で語索引エントリを検索します。
    pub fn find_wordlist_by_key(&self, surface: &str) -> Result<Option<WordlistEntry>> {
        let key = standardize(surface);
        self.wordlist
            .query_row(
                "SELECT id, key, surface, idlist, yomi FROM wordlist WHERE key = ?1",
                params![key],
                row_to_wordlist,
            )
            .optional()
            .map_err(Into::into)
    }

    /// 読みで語索引エントリを検索します。
    pub fn find_wordlist_by_yomi(&self, yomi: &str) -> Result<Option<WordlistEntry>> {
        self.wordlist
            .query_row(
                "SELECT id, key, surface, idlist, yomi FROM wordlist WHERE yomi = ?1 LIMIT 1",
                params![yomi],
                row_to_wordlist,
            )
            .optional()
            .map_err(Into::into)
    }

    /// 辞書一覧を取得します。
    ///
    /// # 戻り値
    ///
    /// 内部IDをキー、辞書メタデータを値とするマップ
    pub fn get_dictionary_list(&self) -> Result<HashMap<i64, Dictionary>> {
        let mut stmt = self.geodic.prepare("SELECT id, json FROM dictionary")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut dictionaries = HashMap::new();
        for row in rows {
            let (id, json) = row?;
            dictionaries.insert(id, Dictionary::from_json(&json)?);
        }
        Ok(dictionaries)
    }

    /// 識別子で辞書メタデータを検索します。
    pub fn get_dictionary(&self, identifier: &str) -> Result<Option<Dictionary>> {
        let json: Option<String> = self
            .geodic
            .query_row(
                "SELECT json FROM dictionary WHERE identifier = ?1",
                params![identifier],
                |row| row.get(0),
            )
            .optional()?;
        match json {
            Some(json) => Ok(Some(Dictionary::from_json(&json)?)),
            None => Ok(None),
        }
    }

    /// 内部IDで辞書メタデータを検索します。
    pub fn get_dictionary_by_id(&self, id: i64) -> Result<Option<Dictionary>> {
        let json: Option<String> = self
            .geodic
            .query_row(
                "SELECT json FROM dictionary WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        match json {
            Some(json) => Ok(Some(Dictionary::from_json(&json)?)),
            None => Ok(None),
        }
    }

    /// 識別子に対応する辞書の内部IDを返します。
    pub fn get_dictionary_internal_id(&self, identifier: &str) -> Result<Option<i64>> {
        self.geodic
            .query_row(
                "SELECT id FROM dictionary WHERE identifier = ?1",
                params![identifier],
                |row| row.get(0),
            )
            .optional()
            .map_err(Into::into)
    }

    /// 地名語を一括で登録します。
    ///
    /// 既存の同一IDの行は置き換えられます。全行が1トランザクションで
    /// 書き込まれます。
    pub fn set_geowords(&self, geowords: &[Geoword]) -> Result<()> {
        let tx = self.geodic.unchecked_transaction()?;
        {
            let mut stmt =
                tx.prepare("INSERT OR REPLACE INTO geoword VALUES (?1, ?2, ?3, ?4)")?;
            for geoword in geowords {
                stmt.execute(params![
                    geoword.geonlp_id(),
                    geoword.dictionary_id(),
                    geoword.entry_id(),
                    geoword.to_json(),
                ])?;
            }
        }
        tx.commit()?;
        self.cache.borrow_mut().clear();
        Ok(())
    }

    /// 辞書メタデータを一括で登録します。
    ///
    /// 既存の同一識別子の行は内容のみ更新され、内部IDは保存されます。
    pub fn set_dictionaries(&self, dictionaries: &[Dictionary]) -> Result<()> {
        let tx = self.geodic.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO dictionary (identifier, json) VALUES (?1, ?2)
                 ON CONFLICT(identifier) DO UPDATE SET json = excluded.json",
            )?;
            for dictionary in dictionaries {
                let identifier = dictionary.identifier().ok_or_else(|| {
                    ChimeiError::format("The dictionary has no geonlp: identifier.")
                })?;
                stmt.execute(params![identifier, dictionary.to_json()])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// 地名語テーブルをクリアします。
    pub fn clear_geowords(&self) -> Result<()> {
        self.geodic.execute("DELETE FROM geoword", [])?;
        self.cache.borrow_mut().clear();
        Ok(())
    }

    /// 辞書テーブルをクリアします。
    pub fn clear_dictionaries(&self) -> Result<()> {
        self.geodic.execute("DELETE FROM dictionary", [])?;
        Ok(())
    }

    /// 語索引テーブルをクリアします。
    pub fn clear_wordlists(&self) -> Result<()> {
        self.wordlist.execute("DELETE FROM wordlist", [])?;
        Ok(())
    }

    /// 語索引エントリに含まれる地名語を取得します。
    ///
    /// # 引数
    ///
    /// * `entry` - IDリストを含む語索引エントリ
    /// * `limit` - 取得する件数の上限。`0` の場合は全件
    pub fn get_geowords_from_wordlist(
        &self,
        entry: &WordlistEntry,
        limit: usize,
    ) -> Result<Vec<Geoword>> {
        let mut geowords = Vec::new();
        for (geonlp_id, _) in entry.parse_idlist() {
            if let Some(geoword) = self.find_geoword_by_id(&geonlp_id)? {
                geowords.push(geoword);
            }
            if limit > 0 && geowords.len() >= limit {
                break;
            }
        }
        Ok(geowords)
    }

    /// 辞書をファイルからデータベースに追加します。
    ///
    /// メタデータ（JSON）と地名語（CSV）を読み込み、1トランザクションで
    /// 登録します。CSVから1件も有効な地名語が得られない場合は登録全体を
    /// 取り消してエラーを返します。
    ///
    /// # 戻り値
    ///
    /// 登録した地名語の件数
    pub fn add_dictionary<P1, P2>(&self, json_path: P1, csv_path: P2) -> Result<usize>
    where
        P1: AsRef<Path>,
        P2: AsRef<Path>,
    {
        let dictionary = importer::load_dictionary_json(json_path.as_ref())?;
        let identifier = dictionary
            .identifier()
            .ok_or_else(|| ChimeiError::format("The dictionary has no geonlp: identifier."))?;

        let tx = self.geodic.unchecked_transaction()?;
        let count = {
            tx.execute(
                "INSERT INTO dictionary (identifier, json) VALUES (?1, ?2)
                 ON CONFLICT(identifier) DO UPDATE SET json = excluded.json",
                params![identifier, dictionary.to_json()],
            )?;
            let dictionary_id: i64 = tx.query_row(
                "SELECT id FROM dictionary WHERE identifier = ?1",
                params![identifier],
                |row| row.get(0),
            )?;

            let geowords = importer::read_geoword_csv(csv_path.as_ref(), dictionary_id)?;
            if geowords.is_empty() {
                // 登録を取り消す
                drop(tx);
                return Err(ChimeiError::format(
                    "No geoword stored. Check the csv file format.",
                ));
            }
            let mut stmt =
                tx.prepare("INSERT OR REPLACE INTO geoword VALUES (?1, ?2, ?3, ?4)")?;
            for geoword in &geowords {
                stmt.execute(params![
                    geoword.geonlp_id(),
                    geoword.dictionary_id(),
                    geoword.entry_id(),
                    geoword.to_json(),
                ])?;
            }
            geowords.len()
        };
        tx.commit()?;
        self.cache.borrow_mut().clear();
        Ok(count)
    }

    /// 辞書と所属する地名語を削除します。
    ///
    /// 1トランザクションで地名語と辞書行の両方を削除します。
    ///
    /// # エラー
    ///
    /// 識別子に対応する辞書が存在しない場合にエラーを返します。
    pub fn remove_dictionary(&self, identifier: &str) -> Result<()> {
        let dictionary_id = self.get_dictionary_internal_id(identifier)?.ok_or_else(|| {
            ChimeiError::request_format(format!(
                "The dictionary is not found in the database: {}",
                identifier
            ))
        })?;
        let tx = self.geodic.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM geoword WHERE dictionary_id = ?1",
            params![dictionary_id],
        )?;
        tx.execute("DELETE FROM dictionary WHERE id = ?1", params![dictionary_id])?;
        tx.commit()?;
        self.cache.borrow_mut().clear();
        Ok(())
    }

    /// 語索引（テーブルとトライ）を地名語テーブルから再構築します。
    ///
    /// 地名語ごとに接頭辞×接尾辞の全表記と読みを展開し、標準化表記を
    /// キーとするバケットに地名語IDを集めます。キーをバイト昇順に整列
    /// して連番を振り、トライと語索引テーブルを対として更新します。
    /// テーブルは一時テーブル経由で、トライは一時ファイル経由で
    /// アトミックに差し替えられ、途中で失敗した場合は以前の対が
    /// 残ります。
    ///
    /// # 戻り値
    ///
    /// 更新後の語索引エントリの列
    pub fn update_wordlists(&self) -> Result<Vec<WordlistEntry>> {
        let mut buckets: HashMap<String, WordlistBucket> = HashMap::new();

        let mut stmt = self.geodic.prepare("SELECT json FROM geoword")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        for json in rows {
            let geoword = Geoword::from_json(&json?)?;
            if !geoword.is_valid() {
                log::debug!("Skipped an invalid geoword entry: {}", geoword.geonlp_id());
                continue;
            }
            expand_geoword(&geoword, &mut buckets);
        }
        drop(stmt);

        // トライはキーの文字コード昇順を要求する
        let mut keys: Vec<String> = buckets.keys().cloned().collect();
        keys.sort_unstable();

        let mut entries = Vec::with_capacity(keys.len());
        let mut records = Vec::with_capacity(keys.len());
        for (seq_id, key) in keys.iter().enumerate() {
            let bucket = &buckets[key];
            let id = u32::try_from(seq_id)
                .map_err(|_| ChimeiError::trie_build("Too many wordlist entries."))?;
            records.push((key.clone(), id));
            entries.push(WordlistEntry {
                id,
                key: key.clone(),
                surface: bucket.surface.clone(),
                idlist: bucket.idlist.clone(),
                yomi: bucket.yomi.clone(),
            });
        }

        // 先にトライを一時ファイルへ書き出しておき、テーブルの差し替えが
        // 成功した後でアトミックに昇格する
        let staged_trie = if records.is_empty() {
            None
        } else {
            let trie = Trie::from_records(&records)?;
            let dir = self.trie_path.parent().ok_or_else(|| {
                ChimeiError::trie_build(format!("Invalid trie path: {}", self.trie_path.display()))
            })?;
            let tmp = NamedTempFile::new_in(dir)?;
            fs::write(tmp.path(), trie.to_bytes())?;
            Some(tmp)
        };

        let tx = self.wordlist.unchecked_transaction()?;
        {
            tx.execute("DROP TABLE IF EXISTS wordlist_tmp", [])?;
            tx.execute(
                "CREATE TABLE wordlist_tmp(
                    id INTEGER PRIMARY KEY,
                    key TEXT,
                    surface TEXT,
                    idlist TEXT,
                    yomi TEXT
                )",
                [],
            )?;
            let mut stmt =
                tx.prepare("INSERT INTO wordlist_tmp VALUES (?1, ?2, ?3, ?4, ?5)")?;
            for entry in &entries {
                stmt.execute(params![
                    entry.id,
                    entry.key,
                    entry.surface,
                    entry.idlist,
                    entry.yomi,
                ])?;
            }
            drop(stmt);
            tx.execute("DROP TABLE wordlist", [])?;
            tx.execute("ALTER TABLE wordlist_tmp RENAME TO wordlist", [])?;
        }
        tx.commit()?;

        match staged_trie {
            Some(tmp) => {
                tmp.persist(&self.trie_path)?;
            }
            None => {
                // 登録語が存在しない場合、古いトライは無効なので取り除く
                if self.trie_path.exists() {
                    fs::remove_file(&self.trie_path)?;
                }
            }
        }

        self.cache.borrow_mut().clear();
        log::debug!("Rebuilt the word index with {} entries.", entries.len());
        Ok(entries)
    }
}

/// 地名語の全表記・全読みを展開してバケットに登録します。
fn expand_geoword(geoword: &Geoword, buckets: &mut HashMap<String, WordlistBucket>) {
    let geonlp_id = geoword.geonlp_id();
    let typical_name = geoword.typical_name();
    let body = geoword.body();
    let body_kana = geoword.body_kana();

    let prefixes = non_empty_or_blank(geoword.prefix());
    let suffixes = non_empty_or_blank(geoword.suffix());
    let prefixes_kana = geoword.prefix_kana();
    let suffixes_kana = geoword.suffix_kana();

    for (pi, prefix) in prefixes.iter().enumerate() {
        for (si, suffix) in suffixes.iter().enumerate() {
            let surface = format!("{}{}{}", prefix, body, suffix);
            let yomi = if body_kana.is_empty() {
                String::new()
            } else {
                format!(
                    "{}{}{}",
                    prefixes_kana.get(pi).map(String::as_str).unwrap_or(""),
                    body_kana,
                    suffixes_kana.get(si).map(String::as_str).unwrap_or(""),
                )
            };

            let key = standardize(&surface);
            let bucket = buckets.entry(key).or_insert_with(|| WordlistBucket {
                surface: surface.clone(),
                yomi: yomi.clone(),
                ..WordlistBucket::default()
            });
            bucket.push_id(&geonlp_id, &typical_name);

            if !yomi.is_empty() {
                let bucket = buckets.entry(yomi.clone()).or_insert_with(|| WordlistBucket {
                    surface: surface.clone(),
                    yomi: yomi.clone(),
                    ..WordlistBucket::default()
                });
                bucket.push_id(&geonlp_id, &typical_name);
            }
        }
    }
}

/// 空のリストを空文字列1要素に置き換えます。
fn non_empty_or_blank(list: Vec<String>) -> Vec<String> {
    if list.is_empty() {
        vec![String::new()]
    } else {
        list
    }
}

/// SQLite行を語索引エントリに変換します。
fn row_to_wordlist(row: &rusqlite::Row) -> rusqlite::Result<WordlistEntry> {
    Ok(WordlistEntry {
        id: row.get(0)?,
        key: row.get(1)?,
        surface: row.get(2)?,
        idlist: row.get(3)?,
        yomi: row.get(4)?,
    })
}
