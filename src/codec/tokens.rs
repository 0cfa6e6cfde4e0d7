//! Tokenizer that keeps delimiters as tokens.
//!
//! Splitting `a//b` on `/` yields `a`, `/`, `/`, `b`. Keeping each delimiter
//! as its own token is what lets the positional decoders tell an empty field
//! (a delimiter where a value was expected) from the end of input.

/// Iterator over the tokens of `input`, delimiters included.
#[derive(Debug, Clone)]
pub struct DelimTokens<'a> {
    rest: &'a str,
    delim: char,
}

impl<'a> DelimTokens<'a> {
    pub fn new(input: &'a str, delim: char) -> Self {
        Self { rest: input, delim }
    }

    /// Whether `token` is a delimiter token.
    pub fn is_delim(&self, token: &str) -> bool {
        let mut chars = token.chars();
        chars.next() == Some(self.delim) && chars.next().is_none()
    }

    /// Consume the next token if it is a delimiter.
    pub fn skip_delim(&mut self) -> bool {
        if self.rest.starts_with(self.delim) {
            self.rest = &self.rest[self.delim.len_utf8()..];
            true
        } else {
            false
        }
    }

    /// Next value token. Returns `Some(None)` for an empty field (a delimiter
    /// was found where a value was expected) and `None` at end of input.
    ///
    /// A value token consumes one trailing delimiter if present, so the next
    /// call starts at the following field either way.
    pub fn next_field(&mut self) -> Option<Option<&'a str>> {
        let token = self.next()?;
        if self.is_delim(token) {
            return Some(None);
        }
        self.skip_delim();
        Some(Some(token))
    }
}

impl<'a> Iterator for DelimTokens<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.rest.is_empty() {
            return None;
        }
        let end = match self.rest.find(self.delim) {
            Some(0) => self.delim.len_utf8(),
            Some(i) => i,
            None => self.rest.len(),
        };
        let (token, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(token)
    }
}
