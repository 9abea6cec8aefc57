//! 語索引エントリの定義
//!
//! 一つの標準化表記に対応する地名語IDリストのエントリです。
//! 同じ表記を持つ地名語が複数あり得るため、エントリは地名語IDではなく
//! 連番で識別され、この連番がトライの値域になります。

use std::fmt;

/// 語索引のエントリ
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordlistEntry {
    /// 見出し語ID（連番、トライの値）
    pub id: u32,

    /// 標準化された表記
    pub key: String,

    /// 見出し語の代表表記
    pub surface: String,

    /// 地名語IDリスト。`geonlp_id:代表表記/geonlp_id:代表表記/...` 形式
    pub idlist: String,

    /// 読み
    pub yomi: String,
}

impl WordlistEntry {
    /// 有効なエントリかどうかを返します。
    #[inline(always)]
    pub fn is_valid(&self) -> bool {
        !self.surface.is_empty()
    }

    /// 地名語IDリストを `(geonlp_id, 代表表記)` の列に分解します。
    pub fn parse_idlist(&self) -> Vec<(String, String)> {
        self.idlist
            .split('/')
            .filter(|item| !item.is_empty())
            .filter_map(|item| {
                item.split_once(':')
                    .map(|(id, name)| (id.to_string(), name.to_string()))
            })
            .collect()
    }
}

impl fmt::Display for WordlistEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}",
            self.id, self.key, self.surface, self.idlist, self.yomi
        )
    }
}
