//! 語索引トライ
//!
//! このモジュールは、標準化表記から語索引エントリIDへの写像を保持する
//! ダブル配列トライの薄いラッパーを提供します。トライは単一のバイナリ
//! ファイルとして永続化され、更新時には一時ファイルに書き出してから
//! アトミックに差し替えます。

use std::fs;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::errors::{ChimeiError, Result};

/// トライ検索の一致結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrieMatch {
    /// 一致した語索引エントリID
    pub value: u32,

    /// 一致した先頭部分のバイト数
    pub match_bytes: usize,
}

/// 標準化表記をキーとするダブル配列トライ
pub struct Trie {
    da: crawdad::Trie,
    num_keys: usize,
}

impl Trie {
    /// キーとエントリIDの組からトライを構築します。
    ///
    /// # 引数
    ///
    /// * `records` - 構築元の組。キーはバイト昇順に整列済みで
    ///   重複しないこと
    ///
    /// # エラー
    ///
    /// 構築に失敗した場合に [`ChimeiError::TrieBuild`] を返します。
    pub fn from_records(records: &[(String, u32)]) -> Result<Self> {
        let da = crawdad::Trie::from_records(records.iter().map(|(k, v)| (k, *v)))
            .map_err(|e| ChimeiError::trie_build(e.to_string()))?;
        Ok(Self {
            da,
            num_keys: records.len(),
        })
    }

    /// ファイルからトライを読み込みます。
    ///
    /// # エラー
    ///
    /// ファイルが読めない場合にエラーを返します。
    pub fn load<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let bytes = fs::read(path)?;
        if bytes.is_empty() {
            return Err(ChimeiError::IndexMissing);
        }
        if bytes.len() < 8 {
            return Err(ChimeiError::trie_build("Truncated trie file."));
        }
        let (len_bytes, rest) = bytes.split_at(8);
        let num_keys = u64::from_le_bytes(len_bytes.try_into().unwrap()) as usize;
        let (da, _) = crawdad::Trie::deserialize_from_slice(rest);
        Ok(Self { da, num_keys })
    }

    /// トライを一時ファイルに書き出し、アトミックに差し替えます。
    ///
    /// 一時ファイルは対象ファイルと同じディレクトリに作られるため、
    /// 差し替えはファイルシステム上のリネームで完結します。失敗した
    /// 場合、既存のファイルはそのまま残ります。
    ///
    /// # 引数
    ///
    /// * `path` - 書き出し先のパス
    pub fn save_atomic<P>(&self, path: P) -> Result<()>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let dir = path.parent().ok_or_else(|| {
            ChimeiError::trie_build(format!("Invalid trie path: {}", path.display()))
        })?;
        let bytes = self.to_bytes();
        let tmp = NamedTempFile::with_prefix_in(".drt", dir)?;
        fs::write(tmp.path(), &bytes)?;
        tmp.persist(path)?;
        Ok(())
    }

    /// トライのバイト列表現を返します。
    pub(crate) fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = (self.num_keys as u64).to_le_bytes().to_vec();
        bytes.extend(self.da.serialize_to_vec());
        bytes
    }

    /// 入力の先頭部分に一致するすべてのキーを検索します。
    ///
    /// # 引数
    ///
    /// * `input` - 標準化済みの検索文字列
    ///
    /// # 戻り値
    ///
    /// 一致したエントリIDと一致バイト数の列。一致が長い順とは限りません。
    pub fn common_prefix_matches(&self, input: &str) -> Vec<TrieMatch> {
        let chars: Vec<char> = input.chars().collect();
        // 文字位置からバイト位置への変換表
        let mut byte_offsets: Vec<usize> = input.char_indices().map(|(i, _)| i).collect();
        byte_offsets.push(input.len());
        self.da
            .common_prefix_search(chars.iter().cloned())
            .map(|(value, end_char)| TrieMatch {
                value,
                match_bytes: byte_offsets[end_char],
            })
            .collect()
    }

    /// 入力全体に一致するキーを検索します。
    pub fn exact_match(&self, input: &str) -> Option<u32> {
        self.da.exact_match(input.chars())
    }

    /// 登録されているキーの数を返します。
    #[inline(always)]
    pub fn num_keys(&self) -> usize {
        self.num_keys
    }
}
