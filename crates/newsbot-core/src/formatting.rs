//! Plain-text rendering of article digests.

use crate::news::Article;

/// Render one article as `title\n\ndescription\n\nurl\n\n`.
pub fn render_article(article: &Article) -> String {
    format!(
        "{}\n\n{}\n\n{}\n\n",
        non_blank(article.title.as_deref()).unwrap_or("No title"),
        non_blank(article.description.as_deref()).unwrap_or("No description"),
        non_blank(article.url.as_deref()).unwrap_or(""),
    )
}

/// Group articles into message blocks of at most `group_size` articles each.
///
/// A block closes after every `group_size`-th article and at the last article, so
/// 7 articles with `group_size = 3` give blocks of 3, 3 and 1. No articles, no blocks.
pub fn format_articles(articles: &[Article], group_size: usize) -> Vec<String> {
    articles
        .chunks(group_size.max(1))
        .map(|group| group.iter().map(render_article).collect::<String>())
        .collect()
}

/// Split `text` into pieces of at most `limit` bytes.
///
/// Cuts prefer the last line break inside the window and never split a UTF-8 character.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    if text.len() <= limit {
        return vec![text.to_string()];
    }

    let mut out = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        if rest.len() <= limit {
            out.push(rest.to_string());
            break;
        }
        let (window, _) = split_utf8_prefix(rest, limit);
        let cut = match window.rfind('\n') {
            Some(i) if i > 0 => i + 1,
            _ => window.len(),
        };
        out.push(rest[..cut].to_string());
        rest = &rest[cut..];
    }
    out
}

/// Format and then enforce the transport's message length limit on every block.
pub fn format_digest(articles: &[Article], group_size: usize, max_len: usize) -> Vec<String> {
    format_articles(articles, group_size)
        .into_iter()
        .flat_map(|block| split_message(&block, max_len))
        .collect()
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.filter(|v| !v.trim().is_empty())
}

fn split_utf8_prefix(s: &str, max_bytes: usize) -> (&str, &str) {
    if s.len() <= max_bytes {
        return (s, "");
    }
    let mut idx = 0usize;
    for (i, _) in s.char_indices() {
        if i > max_bytes {
            break;
        }
        idx = i;
    }
    if idx == 0 {
        // A single character wider than the limit; emit it whole rather than loop forever.
        let next = s.char_indices().nth(1).map(|(i, _)| i).unwrap_or(s.len());
        return (&s[..next], &s[next..]);
    }
    (&s[..idx], &s[idx..])
}
