use std::collections::HashMap;

use crate::markup;
use crate::model::Chat;

/// Most frequent word in the visible text of `content`, lowercased.
/// Ties go to the word that appears first. Words are runs of alphabetic characters.
pub fn most_common_word(content: &str) -> Option<String> {
    let text = markup::visible_text(content).to_lowercase();

    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (position, word) in text
        .split(|c: char| !c.is_alphabetic())
        .filter(|w| !w.is_empty())
        .enumerate()
    {
        counts.entry(word).or_insert((0, position)).0 += 1;
    }

    counts
        .into_iter()
        .max_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
            count_a.cmp(count_b).then(first_b.cmp(first_a))
        })
        .map(|(word, _)| word.to_string())
}

/// Token usage summary shown in status bars
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenTotals {
    pub chat: u64,
    pub session: u64,
}

pub fn token_totals<'a>(active: Option<&Chat>, all: impl IntoIterator<Item = &'a Chat>) -> TokenTotals {
    TokenTotals {
        chat: active.map(Chat::tokens_used).unwrap_or(0),
        session: all.into_iter().map(Chat::tokens_used).sum(),
    }
}
