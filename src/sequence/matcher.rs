use memchr::memmem;

/// Search state for one needle fed chunk by chunk.
///
/// `matched` is how many leading needle bytes the tail of the previous chunk
/// already matched. A failed continuation falls back to the longest border of
/// that prefix before giving up on it, so matches straddling any number of
/// chunks are never missed.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PartialMatch<'n> {
    needle: &'n [u8],
    matched: usize,
}

impl<'n> PartialMatch<'n> {
    pub(crate) fn new(needle: &'n [u8]) -> Self {
        PartialMatch { needle, matched: 0 }
    }

    #[cfg(test)]
    pub(crate) fn matched(&self) -> usize {
        self.matched
    }

    /// Feeds the next chunk. Returns the offset in `haystack` right after the
    /// first completed match.
    pub(crate) fn feed(&mut self, haystack: &[u8]) -> Option<usize> {
        let needle = self.needle;
        if needle.is_empty() {
            return Some(0);
        }

        let mut idx = 0;
        while self.matched > 0 {
            let b = *haystack.get(idx)?;
            if needle[self.matched] == b {
                self.matched += 1;
                idx += 1;
                if self.matched == needle.len() {
                    self.matched = 0;
                    return Some(idx);
                }
            } else {
                self.matched = border(&needle[..self.matched]);
            }
        }

        let rest = &haystack[idx..];
        if let Some(found) = memmem::find(rest, needle) {
            return Some(idx + found + needle.len());
        }

        self.matched = suffix_prefix(rest, needle);
        None
    }
}

// The longest proper prefix of `prefix` that is also its suffix.
fn border(prefix: &[u8]) -> usize {
    (1..prefix.len())
        .rev()
        .find(|&len| prefix[..len] == prefix[prefix.len() - len..])
        .unwrap_or(0)
}

// The longest tail of `haystack` that is a proper prefix of `needle`.
fn suffix_prefix(haystack: &[u8], needle: &[u8]) -> usize {
    let max = haystack.len().min(needle.len() - 1);
    (1..=max)
        .rev()
        .find(|&len| haystack.ends_with(&needle[..len]))
        .unwrap_or(0)
}
