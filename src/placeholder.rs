//! Placeholder IR: documents as literal HTML interleaved with tokens.
//!
//! The extractor turns each marker element into a [`Token`] instead of
//! writing placeholder text into the HTML and searching for it later. The
//! compiler then resolves tokens positionally: every embed site is its own
//! segment, so two sites that embed the same file with different replacement
//! values each get their own content.
//!
//! A token's [`Display`](fmt::Display) form (`{ham:page}`, `{ham:css}`,
//! `{ham:js}`, `{embed:<src>}`) is what [`Fragment::render`] writes for a
//! token that was never resolved.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Where a layout receives the page content.
    Page,
    /// Where `<link rel="stylesheet">` tags go.
    Css,
    /// Where `<script>` tags go.
    Js,
    /// A partial to splice in, with its raw replacement directive.
    Partial { src: String, replace: Option<String> },
}

impl Token {
    pub fn partial(src: impl Into<String>, replace: Option<String>) -> Self {
        Self::Partial {
            src: src.into(),
            replace,
        }
    }

    /// Slots are filled by the layout merge; partials by embedding.
    pub fn is_slot(&self) -> bool {
        !matches!(self, Self::Partial { .. })
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Page => f.write_str("{ham:page}"),
            Self::Css => f.write_str("{ham:css}"),
            Self::Js => f.write_str("{ham:js}"),
            Self::Partial { src, .. } => write!(f, "{{embed:{}}}", src),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Html(String),
    Token(Token),
}

/// An ordered run of segments. Adjacent HTML segments are always merged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    segments: Vec<Segment>,
}

impl From<&str> for Fragment {
    fn from(html: &str) -> Self {
        let mut fragment = Self::default();
        fragment.push_html(html);
        fragment
    }
}

impl From<String> for Fragment {
    fn from(html: String) -> Self {
        let mut fragment = Self::default();
        if !html.is_empty() {
            fragment.segments.push(Segment::Html(html));
        }
        fragment
    }
}

impl Fragment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_html(&mut self, html: &str) {
        if html.is_empty() {
            return;
        }
        match self.segments.last_mut() {
            Some(Segment::Html(last)) => last.push_str(html),
            _ => self.segments.push(Segment::Html(html.to_string())),
        }
    }

    pub fn push_token(&mut self, token: Token) {
        self.segments.push(Segment::Token(token));
    }

    /// Append every segment of `other`, merging at the seam.
    pub fn extend(&mut self, other: Fragment) {
        for segment in other.segments {
            self.push(segment);
        }
    }

    fn push(&mut self, segment: Segment) {
        match segment {
            Segment::Html(html) => self.push_html(&html),
            Segment::Token(token) => self.push_token(token),
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Token(t) => Some(t),
            Segment::Html(_) => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Serialize to a string; unresolved tokens are written in their text form.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Html(html) => out.push_str(html),
                Segment::Token(token) => out.push_str(&token.to_string()),
            }
        }
        out
    }

    /// Remove `prefix` if the fragment starts with it as literal HTML.
    pub fn strip_prefix(&mut self, prefix: &str) -> bool {
        let Some(Segment::Html(first)) = self.segments.first_mut() else {
            return false;
        };
        if !first.starts_with(prefix) {
            return false;
        }
        first.drain(..prefix.len());
        if first.is_empty() {
            self.segments.remove(0);
        }
        true
    }

    /// Remove `suffix` if the fragment ends with it as literal HTML.
    pub fn strip_suffix(&mut self, suffix: &str) -> bool {
        let Some(Segment::Html(last)) = self.segments.last_mut() else {
            return false;
        };
        if !last.ends_with(suffix) {
            return false;
        }
        last.truncate(last.len() - suffix.len());
        if last.is_empty() {
            self.segments.pop();
        }
        true
    }

    /// Replace the first occurrence of `target` with `with`.
    ///
    /// Returns `false` (and leaves the fragment untouched) if `target` does
    /// not occur.
    pub fn replace_first(&mut self, target: &Token, with: Fragment) -> bool {
        let Some(pos) = self
            .segments
            .iter()
            .position(|s| matches!(s, Segment::Token(t) if t == target))
        else {
            return false;
        };
        let tail = self.segments.split_off(pos + 1);
        self.segments.pop();
        self.extend(with);
        for segment in tail {
            self.push(segment);
        }
        true
    }

    /// Walk the tokens in order and let `resolve` decide each one.
    ///
    /// `Ok(Some(fragment))` splices the fragment in place of the token,
    /// `Ok(None)` keeps the token, and an error aborts the walk.
    pub fn substitute<E>(
        self,
        mut resolve: impl FnMut(&Token) -> Result<Option<Fragment>, E>,
    ) -> Result<Fragment, E> {
        let mut out = Fragment::new();
        for segment in self.segments {
            match segment {
                Segment::Html(html) => out.push_html(&html),
                Segment::Token(token) => match resolve(&token)? {
                    Some(fragment) => out.extend(fragment),
                    None => out.push_token(token),
                },
            }
        }
        Ok(out)
    }

    /// Remove every slot token and return the ones removed.
    pub fn drop_slots(&mut self) -> Vec<Token> {
        let mut dropped = Vec::new();
        let mut kept = Fragment::new();
        for segment in std::mem::take(&mut self.segments) {
            match segment {
                Segment::Token(token) if token.is_slot() => dropped.push(token),
                other => kept.push(other),
            }
        }
        *self = kept;
        dropped
    }
}
