//! Trigram chain model.
//!
//! Learns whitespace-tokenized text into forward/backward trigram
//! transition tables and replies by random-walking outward from a
//! context containing a keyword of the query. Tokens are indexed by
//! their normalized form, so "Cheese", "cheese?" and "chéése" all pivot
//! on the same entry.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use rand::seq::SliceRandom;

use super::Model;
use crate::text::{Normalizer, Stem};

type TokenId = u32;

/// Sentence boundary pseudo-token.
const BOUNDARY: TokenId = 0;

/// Walk cap per direction, in tokens. Keeps replies sentence-sized even
/// on degenerate corpora full of cycles.
const MAX_WALK: usize = 64;

#[derive(Default)]
struct State {
    /// id -> surface form; index 0 is the boundary placeholder.
    tokens: Vec<String>,
    ids: HashMap<String, TokenId>,
    /// normalized form -> token ids sharing it.
    by_form: HashMap<String, Vec<TokenId>>,
    /// (a, b) -> successors c seen in windows (a, b, c).
    fwd: HashMap<(TokenId, TokenId), Vec<TokenId>>,
    /// (b, c) -> predecessors a seen in windows (a, b, c).
    rev: HashMap<(TokenId, TokenId), Vec<TokenId>>,
    /// token -> contexts (a, token) it is the head of.
    pivots: HashMap<TokenId, Vec<(TokenId, TokenId)>>,
    /// Every context, for keyword-less fallback picks.
    contexts: Vec<(TokenId, TokenId)>,
}

impl State {
    fn new() -> Self {
        Self {
            tokens: vec![String::new()],
            ..Self::default()
        }
    }

    fn intern(&mut self, word: &str, form: String) -> TokenId {
        if let Some(&id) = self.ids.get(word) {
            return id;
        }
        let id = self.tokens.len() as TokenId;
        self.tokens.push(word.to_string());
        self.ids.insert(word.to_string(), id);
        if !form.is_empty() {
            self.by_form.entry(form).or_default().push(id);
        }
        id
    }
}

/// A normalizer-keyed trigram chain. Internally synchronized.
pub struct Chain<S> {
    norm: Normalizer<S>,
    state: RwLock<State>,
}

impl<S: Stem> Chain<S> {
    pub fn new(norm: Normalizer<S>) -> Self {
        Self {
            norm,
            state: RwLock::new(State::new()),
        }
    }

    fn learn_sync(&self, text: &str) {
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.is_empty() {
            return;
        }

        let mut state = self.state.write();
        let mut ids = Vec::with_capacity(words.len() + 2);
        ids.push(BOUNDARY);
        for word in &words {
            let id = match state.ids.get(*word).copied() {
                Some(id) => id,
                None => {
                    let form = self.norm.normalize(word);
                    state.intern(word, form)
                }
            };
            ids.push(id);
        }
        ids.push(BOUNDARY);

        for window in ids.windows(3) {
            let (a, b, c) = (window[0], window[1], window[2]);
            state.fwd.entry((a, b)).or_default().push(c);
            state.rev.entry((b, c)).or_default().push(a);
            state.pivots.entry(b).or_default().push((a, b));
            state.contexts.push((a, b));
        }
    }

    fn reply_sync(&self, text: &str) -> String {
        let state = self.state.read();
        if state.contexts.is_empty() {
            return String::new();
        }
        let mut rng = rand::thread_rng();

        let mut keywords: Vec<TokenId> = Vec::new();
        for word in text.split_whitespace() {
            let form = self.norm.normalize(word);
            if form.is_empty() {
                continue;
            }
            if let Some(ids) = state.by_form.get(&form) {
                keywords.extend(ids);
            }
        }

        let pivot = keywords
            .choose(&mut rng)
            .and_then(|k| state.pivots.get(k))
            .and_then(|contexts| contexts.choose(&mut rng))
            .or_else(|| state.contexts.choose(&mut rng))
            .copied();
        let Some((a, b)) = pivot else {
            return String::new();
        };

        let mut out: Vec<TokenId> = [a, b].into_iter().filter(|&t| t != BOUNDARY).collect();

        // Forward walk to the sentence end.
        let (mut x, mut y) = (a, b);
        for _ in 0..MAX_WALK {
            let Some(&next) = state.fwd.get(&(x, y)).and_then(|c| c.choose(&mut rng)) else {
                break;
            };
            if next == BOUNDARY {
                break;
            }
            out.push(next);
            (x, y) = (y, next);
        }

        // Backward walk to the sentence start.
        let (mut x, mut y) = (a, b);
        for _ in 0..MAX_WALK {
            let Some(&prev) = state.rev.get(&(x, y)).and_then(|c| c.choose(&mut rng)) else {
                break;
            };
            if prev == BOUNDARY {
                break;
            }
            out.insert(0, prev);
            (x, y) = (prev, x);
        }

        out.iter()
            .map(|&t| state.tokens[t as usize].as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[async_trait]
impl<S: Stem + 'static> Model for Chain<S> {
    async fn learn(&self, text: &str) {
        self.learn_sync(text);
    }

    async fn reply(&self, text: &str) -> String {
        self.reply_sync(text)
    }

    /// Balance an unpaired double quote left behind by a truncated walk.
    fn repair(&self, text: String) -> String {
        let mut text = text;
        if text.matches('"').count() % 2 == 1 {
            if text.ends_with('"') {
                text.insert(0, '"');
            } else {
                text.push('"');
            }
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::{Identity, SquishMode};

    fn chain() -> Chain<Identity> {
        Chain::new(Normalizer::new(Identity).with_squish(SquishMode::Off))
    }

    #[tokio::test]
    async fn single_sentence_reproduces_exactly() {
        let chain = chain();
        chain.learn("hello world again").await;
        assert_eq!(chain.reply("hello").await, "hello world again");
        assert_eq!(chain.reply("world").await, "hello world again");
        assert_eq!(chain.reply("again").await, "hello world again");
    }

    #[tokio::test]
    async fn empty_model_replies_empty() {
        let chain = chain();
        assert_eq!(chain.reply("anything").await, "");
    }

    #[tokio::test]
    async fn learning_nothing_changes_nothing() {
        let chain = chain();
        chain.learn("").await;
        chain.learn("   ").await;
        assert_eq!(chain.reply("x").await, "");
    }

    #[tokio::test]
    async fn keyword_matches_through_normalization() {
        let chain = chain();
        chain.learn("I like Cheese a lot").await;
        let reply = chain.reply("CHEESE!!!").await;
        assert!(reply.contains("Cheese"), "got: {reply}");
    }

    #[tokio::test]
    async fn unknown_keywords_still_reply_from_fallback() {
        let chain = chain();
        chain.learn("something was said here").await;
        let reply = chain.reply("zyzzyva").await;
        assert!(!reply.is_empty());
    }

    #[tokio::test]
    async fn replies_are_bounded() {
        let chain = chain();
        // A tight cycle the walk could loop in forever.
        chain.learn("a b a b a b a b").await;
        let reply = chain.reply("a").await;
        assert!(reply.split_whitespace().count() <= 2 * MAX_WALK + 2);
    }

    #[test]
    fn repair_balances_quotes() {
        let chain = chain();
        assert_eq!(chain.repair(r#""hello"#.to_string()), r#""hello""#);
        assert_eq!(chain.repair(r#"hello""#.to_string()), r#""hello""#);
        assert_eq!(chain.repair(r#""fine""#.to_string()), r#""fine""#);
        assert_eq!(chain.repair("plain".to_string()), "plain");
    }
}
