/// Iterator over the fields of a delimited line, **without merging** adjacent separators.
///
/// Unlike `split_whitespace`-style splitting, two consecutive separators produce an
/// empty token: catalog dumps leave genuinely empty fields between delimiters and the
/// column positions must not shift.
///
/// Only tokens **terminated** by a separator are yielded. Whatever follows the last
/// separator (often a newline, or nothing for `|`-terminated lines) is available from
/// [`NonMergingTokens::remainder`] once the iterator is exhausted.
#[derive(Debug, Clone)]
pub struct NonMergingTokens<'a, 's> {
    rest: &'a [u8],
    separator: &'s [u8],
}

impl<'a, 's> NonMergingTokens<'a, 's> {
    pub fn new(line: &'a [u8], separator: &'s [u8]) -> Self {
        NonMergingTokens {
            rest: line,
            separator,
        }
    }

    /// The bytes that have not been returned as a token yet.
    pub fn remainder(&self) -> &'a [u8] {
        self.rest
    }
}

impl<'a> Iterator for NonMergingTokens<'a, '_> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        if self.separator.is_empty() {
            return None;
        }
        let at = self
            .rest
            .windows(self.separator.len())
            .position(|w| w == self.separator)?;
        let token = &self.rest[..at];
        self.rest = &self.rest[at + self.separator.len()..];
        Some(token)
    }
}

/// Split `line` on every occurrence of `separator`, keeping empty fields.
///
/// See [`NonMergingTokens`].
pub fn tokenize_non_merging<'a, 's>(
    line: &'a [u8],
    separator: &'s [u8],
) -> NonMergingTokens<'a, 's> {
    NonMergingTokens::new(line, separator)
}
