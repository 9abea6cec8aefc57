//! 地名語の解決
//!
//! このモジュールは、役割フラグ付きの形態素トークン列から地名語候補の
//! 区間を取り出し、トライと地名語ストアに対する前方最長一致で地名語を
//! 確定して、トークン列を書き換える状態機械を提供します。
//!
//! 候補区間は「先頭になり得るトークン＋部分になり得るトークンの連続」
//! として貪欲に取り、トライの一致長まで右端から縮めながら照合します。
//! 縮めすぎた位置に地名接尾辞があれば接尾辞付きの形を試し、確定した
//! 地名語のIDリストには利用中の辞書・クラスに属する候補だけを残します。

use crate::classifier::{Annotation, PosRules};
use crate::errors::{ChimeiError, Result};
use crate::geoword::MAX_GEOWORD_LENGTH;
use crate::index::{Trie, TrieMatch};
use crate::normalizer::standardize;
use crate::service::ActiveFilters;
use crate::store::GazetteerStore;
use crate::token::Token;

/// 一語の地名語が地名修飾語として振る舞う場合のタグ
const PLACE_MODIFIER_TAG: &str = "名詞-固有名詞-地名修飾語";

/// 役割フラグ付きトークン
#[derive(Debug, Clone)]
pub(crate) struct Annotated {
    pub(crate) token: Token,
    pub(crate) ann: Annotation,
}

/// 候補区間の解決結果
struct Resolution {
    /// 確定した地名語トークン列（接尾辞トークンを含むことがある）
    tokens: Vec<Token>,

    /// 区間の直後を指すインデックス
    next: usize,
}

/// 地名語の解決器
///
/// 1回の解析の間だけ生きる借用の束です。
pub(crate) struct Resolver<'a> {
    rules: &'a PosRules,
    store: &'a GazetteerStore,
    trie: Option<&'a Trie>,
    filters: &'a ActiveFilters,
}

impl<'a> Resolver<'a> {
    pub(crate) fn new(
        rules: &'a PosRules,
        store: &'a GazetteerStore,
        trie: Option<&'a Trie>,
        filters: &'a ActiveFilters,
    ) -> Self {
        Self {
            rules,
            store,
            trie,
            filters,
        }
    }

    /// 形態素トークン列を地名語辞書を参照して変換します。
    ///
    /// # 引数
    ///
    /// * `tokens` - 形態素解析の結果トークン列
    ///
    /// # 戻り値
    ///
    /// 地名語トークンを含む変換後のトークン列
    pub(crate) fn convert(&self, mut tokens: Vec<Token>) -> Result<Vec<Token>> {
        let annotations = self.rules.annotate(&mut tokens);
        let mut stream: Vec<Annotated> = tokens
            .into_iter()
            .zip(annotations)
            .map(|(token, ann)| Annotated { token, ann })
            .collect();

        let mut out: Vec<Token> = Vec::with_capacity(stream.len());
        let mut last_is_antileader = false;
        let mut have_last = false;
        let mut i = 0;

        while i < stream.len() {
            let Some((start, end)) = find_candidate(&stream, i) else {
                for item in &stream[i..] {
                    out.push(item.token.clone());
                }
                break;
            };

            // 候補にならないトークンはそのまま出力する
            for item in &stream[i..start] {
                out.push(item.token.clone());
                last_is_antileader = item.ann.antileader;
                have_last = true;
            }

            // 直前に出力した語が地名に先行しない語の場合、候補を破棄する
            if have_last && last_is_antileader {
                out.push(stream[start].token.clone());
                last_is_antileader = stream[start].ann.antileader;
                i = start + 1;
                continue;
            }

            match self.resolve_span(&stream, start, end)? {
                Some(Resolution {
                    tokens: mut resolved,
                    next,
                }) => {
                    if resolved.len() > 1
                        && resolved.last().is_some_and(Token::is_place_suffix)
                    {
                        // 複数語の解決結果が地名接尾辞で終わる場合、接尾辞は
                        // 次の地名の先頭になり得るので入力列に戻す
                        if let Some(suffix_token) = resolved.pop() {
                            let ann = Annotation {
                                head: true,
                                ..Annotation::default()
                            };
                            stream.insert(
                                next,
                                Annotated {
                                    token: suffix_token,
                                    ann,
                                },
                            );
                        }
                    }
                    // 地名語の前には地名修飾語はこない
                    if let Some(prev) = out.last_mut() {
                        if prev.conjugated_form == PLACE_MODIFIER_TAG {
                            prev.conjugated_form.clear();
                        }
                    }
                    out.extend(resolved);
                    have_last = false;
                    last_is_antileader = false;
                    i = next;
                }
                None => {
                    // 地名語が得られなかったので先頭の1語を出力して進む
                    out.push(stream[start].token.clone());
                    last_is_antileader = stream[start].ann.antileader;
                    have_last = true;
                    i = start + 1;
                }
            }
        }
        Ok(out)
    }

    /// 候補区間から前方最長一致で地名語を確定します。
    ///
    /// トライの一致長に合わせて区間を右端から縮めます。縮める途中で
    /// 一致長を下回った場合、そこが地名接尾辞であれば1語戻して
    /// 接尾辞付きの形を試し、そうでなければ短くなった表記で候補を
    /// 取り直します。
    fn resolve_span(
        &self,
        stream: &[Annotated],
        s: usize,
        e: usize,
    ) -> Result<Option<Resolution>> {
        let full_key = join_surfaces(stream, s, e);
        let Some(mut lpair) = self.longest_match(&full_key, true)? else {
            return Ok(None);
        };
        let mut end = e;
        let mut next = e + 1;

        loop {
            let mut surface = join_surfaces(stream, s, end);
            let mut standardized = standardize(&surface);

            if standardized.len() > lpair.match_bytes {
                // この長さを持つ候補は存在しないので右端から縮める
                let mut len = standardized.len();
                while len > lpair.match_bytes {
                    if s == end {
                        return Ok(None);
                    }
                    end -= 1;
                    surface = join_surfaces(stream, s, end);
                    standardized = standardize(&surface);
                    len = standardized.len();
                    if len < lpair.match_bytes {
                        next = end + 1;
                        if stream[next].ann.suffix.is_some() {
                            // 削りすぎたが接尾辞の可能性があるので1語戻す
                            end += 1;
                        } else {
                            surface = join_surfaces(stream, s, end);
                            match self.longest_match(&surface, true)? {
                                Some(shorter) => lpair = shorter,
                                // これより短い地名語は存在しない
                                None => return Ok(None),
                            }
                        }
                    }
                }
                next = end + 1;
                surface = join_surfaces(stream, s, end);
            }

            if s == end && !stream[s].ann.single {
                // 一語では地名語にならない単語は除外する
                return Ok(None);
            }

            if standardized.len() == lpair.match_bytes {
                let mut alternative = "*".to_string();
                if s == end {
                    alternative = self
                        .rules
                        .alternative_value(&stream[s].token)
                        .unwrap_or_default();
                    if !alternative.contains("人名")
                        && next < stream.len()
                        && stream[next].ann.stop
                    {
                        // 地名語に続かない語が続く場合は地名修飾語として扱う
                        alternative = PLACE_MODIFIER_TAG.to_string();
                    }
                    if alternative.is_empty() {
                        alternative = "*".to_string();
                    }
                }
                let Some(mut node) = self.place_name_token(lpair.value, &alternative)? else {
                    return Ok(None);
                };
                node.surface = surface;
                return Ok(Some(Resolution {
                    tokens: vec![node],
                    next,
                }));
            }

            if s == end {
                return Ok(None);
            }

            if let Some(suffix) = stream[end].ann.suffix.clone() {
                let Some(without_len) = surface.len().checked_sub(suffix.surface.len()) else {
                    return Ok(None);
                };
                if without_len == 0 {
                    return Ok(None);
                }
                if without_len == lpair.match_bytes {
                    let Some(node) = self.place_name_token(lpair.value, "*")? else {
                        return Ok(None);
                    };
                    let suffix_token = Token::place_suffix(
                        &suffix.surface,
                        &suffix.yomi,
                        &suffix.pronunciation,
                    );
                    return Ok(Some(Resolution {
                        tokens: vec![node, suffix_token],
                        next,
                    }));
                }
            }

            // トライ候補の方が短いので、元の表記全体から候補を取り直す
            match self.longest_match(&full_key, true)? {
                Some(full) => lpair = full,
                None => return Ok(None),
            }
            end -= 1;
            next -= 1;
        }
    }

    /// 与えられた文字列に前方最長一致する語索引エントリを探します。
    ///
    /// 一致候補のうち、利用中の辞書・クラスに属する地名語を1つ以上
    /// 含む最長のものを返します。
    ///
    /// # 引数
    ///
    /// * `key` - 先頭が地名の可能性のある検索対象文字列
    /// * `surface_only` - `true` の場合、読みしか一致しない地名語は
    ///   含めない
    pub(crate) fn longest_match(
        &self,
        key: &str,
        surface_only: bool,
    ) -> Result<Option<TrieMatch>> {
        let trie = self.trie.ok_or(ChimeiError::IndexMissing)?;
        let standardized = standardize(key);
        let mut best: Option<TrieMatch> = None;
        for m in trie.common_prefix_matches(&standardized) {
            if best.is_some_and(|b| b.match_bytes >= m.match_bytes) {
                continue;
            }
            let matched = &standardized[..m.match_bytes];
            let Some(entry) = self.store.find_wordlist_by_id(m.value)? else {
                continue;
            };
            for geoword in self.store.get_geowords_from_wordlist(&entry, 0)? {
                if surface_only && geoword.parts_for_surface(matched).is_none() {
                    continue;
                }
                if self.filters.accepts(&geoword) {
                    best = Some(m);
                    break;
                }
            }
        }
        Ok(best)
    }

    /// 語索引エントリIDから地名語トークンを生成します。
    ///
    /// 利用中の辞書・クラスに属し、かつ表記が一致する地名語に限定した
    /// IDリストを品詞細分類3に設定します。
    ///
    /// # 戻り値
    ///
    /// 限定後のIDリストが空の場合は `None`
    fn place_name_token(&self, id: u32, alternative: &str) -> Result<Option<Token>> {
        let entry = self.store.find_wordlist_by_id(id)?.ok_or_else(|| {
            ChimeiError::format(format!("No entry in wordlist with id={}", id))
        })?;

        let mut idlist = String::new();
        for geoword in self.store.get_geowords_from_wordlist(&entry, 0)? {
            if !self.filters.accepts(&geoword) {
                continue;
            }
            if geoword.parts_for_surface(&entry.surface).is_none() {
                continue;
            }
            if !idlist.is_empty() {
                idlist.push('/');
            }
            idlist.push_str(&geoword.geonlp_id());
            idlist.push(':');
            idlist.push_str(&geoword.typical_name());
        }
        if idlist.is_empty() {
            return Ok(None);
        }
        let mut token = Token::place_name(&entry.surface, &entry.yomi, alternative);
        token.subclass3 = idlist;
        Ok(Some(token))
    }
}

/// 地名語候補の区間を探します。
///
/// `from` から走査し、先頭になり得るトークン（または接頭辞＋先頭の組）を
/// 起点に、部分になり得るトークンの連続を貪欲に取ります。累積表層形が
/// 最大長を超えたところで延長を打ち切ります。
///
/// # 戻り値
///
/// `(区間の先頭, 区間の末尾)`。候補が存在しない場合は `None`
fn find_candidate(stream: &[Annotated], from: usize) -> Option<(usize, usize)> {
    let mut i = from;
    let (start, head) = loop {
        if i >= stream.len() {
            return None;
        }
        if stream[i].ann.head {
            break (i, i);
        }
        // 接頭辞の分岐は将来のプロファイル拡張でのみ到達する
        if stream[i].ann.prefix && i + 1 < stream.len() && stream[i + 1].ann.head {
            break (i, i + 1);
        }
        i += 1;
    };

    let mut end = head;
    let mut len = stream[head].token.surface.len();
    let mut k = head + 1;
    while k < stream.len() && stream[k].ann.body {
        end = k;
        len += stream[k].token.surface.len();
        if len > MAX_GEOWORD_LENGTH {
            break;
        }
        k += 1;
    }
    Some((start, end))
}

/// 区間の表層形を連結した文字列を返します。
fn join_surfaces(stream: &[Annotated], s: usize, e: usize) -> String {
    stream[s..=e]
        .iter()
        .map(|item| item.token.surface.as_str())
        .collect()
}
