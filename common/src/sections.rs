//! 防除提案テキストの見出し分割
//!
//! AIが返す自由文から既知の見出しを探して節に分ける。
//! 見出しはプロンプトで要求しているだけで保証はないため、
//! 見つからなければ全体を1つの節として返す。

use lazy_static::lazy_static;
use regex::Regex;

/// 認識する見出し
pub const SECTION_HEADINGS: &[&str] = &[
    "Fungicide Recommendations",
    "Organic Alternatives",
    "Prevention Tips",
];

lazy_static! {
    // "## **Organic Alternatives:**" のようなMarkdown装飾も許容
    static ref HEADING_RE: Regex = Regex::new(
        r"(?:#+[ \t]*)?\*{0,2}(Fungicide Recommendations|Organic Alternatives|Prevention Tips)\*{0,2}[ \t]*:[ \t]*\*{0,2}"
    )
    .unwrap();
}

/// 防除提案の1節
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecommendationSection {
    /// 見出し（コロンなし）。見出しの前の文や見出しなしの全文は `None`
    pub title: Option<String>,
    pub body: String,
}

impl RecommendationSection {
    fn untitled(body: &str) -> Self {
        Self {
            title: None,
            body: body.to_string(),
        }
    }
}

/// 防除提案テキストを見出しごとに分割
pub fn split_recommendations(text: &str) -> Vec<RecommendationSection> {
    let headings: Vec<_> = HEADING_RE.captures_iter(text).collect();

    if headings.is_empty() {
        let body = text.trim();
        if body.is_empty() {
            return Vec::new();
        }
        return vec![RecommendationSection::untitled(body)];
    }

    let mut sections = Vec::with_capacity(headings.len() + 1);

    let first_start = headings[0].get(0).map(|m| m.start()).unwrap_or(0);
    let preamble = text[..first_start].trim();
    if !preamble.is_empty() {
        sections.push(RecommendationSection::untitled(preamble));
    }

    for (i, caps) in headings.iter().enumerate() {
        let (Some(whole), Some(label)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let end = headings
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map(|m| m.start())
            .unwrap_or(text.len());

        sections.push(RecommendationSection {
            title: Some(label.as_str().to_string()),
            body: text[whole.end()..end].trim().to_string(),
        });
    }

    sections
}
