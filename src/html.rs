//! Collapses HTML tags and entities to single placeholder characters so that
//! diffing marked-up text can't tear a tag apart mid-edit. Callers collapse
//! before submitting to a tracker and expand whatever they read back out.
//!
//! This doesn't try to handle unclosed or overlapping tags.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TAG_OR_ENTITY: Regex = Regex::new(r"<[^>]*>|&[^;]+;").unwrap();
}

/// Placeholders are drawn from the Hangul syllables block, well away from
/// anything that turns up in western markup.
const PLACEHOLDER_BASE: u32 = 0xAC00;

/// Per-instance tag collapsing state. The same tag always collapses to the
/// same placeholder within one instance's lifetime, and [`expand`] reverses
/// every substitution that instance has issued. Instances share nothing, so
/// unrelated collapsing passes can't interfere with each other.
///
/// [`expand`]: CollapseHtml::expand
#[derive(Debug)]
pub struct CollapseHtml {
    tags: HashMap<String, char>,
    chars: HashMap<char, String>,
    next_code: u32,
}

impl Default for CollapseHtml {
    fn default() -> Self {
        Self::new()
    }
}

impl CollapseHtml {
    pub fn new() -> Self {
        CollapseHtml {
            tags: HashMap::new(),
            chars: HashMap::new(),
            next_code: PLACEHOLDER_BASE,
        }
    }

    /// Replace every `<...>` tag and `&...;` entity with its placeholder.
    pub fn collapse(&mut self, html: &str) -> String {
        TAG_OR_ENTITY
            .replace_all(html, |caps: &regex::Captures<'_>| {
                self.placeholder(&caps[0]).to_string()
            })
            .into_owned()
    }

    /// Reinstate every tag this instance has collapsed.
    pub fn expand(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for c in text.chars() {
            match self.chars.get(&c) {
                Some(tag) => out.push_str(tag),
                None => out.push(c),
            }
        }
        out
    }

    fn placeholder(&mut self, tag: &str) -> char {
        if let Some(&c) = self.tags.get(tag) {
            return c;
        }
        let c = loop {
            let code = self.next_code;
            self.next_code += 1;
            // Skip over anything unassignable (surrogate range).
            if let Some(c) = char::from_u32(code) {
                break c;
            }
        };
        self.tags.insert(tag.to_owned(), c);
        self.chars.insert(c, tag.to_owned());
        c
    }
}
