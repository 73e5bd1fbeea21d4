/// Keys are compared byte-wise, which matches code point order for UTF-8 text.
pub type Key = Vec<u8>;

/// First byte of the key, used to narrow the boundary search.
/// An empty key has none.
#[inline]
pub fn first_unit(key: &[u8]) -> Option<u8> {
    key.first().copied()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub key: Key,
    pub value: Vec<u8>,
}

impl Record {
    pub fn new(key: impl Into<Key>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Splits a text line at its first tab into key and value.
/// A line with no tab is all key.
pub fn parse_record(line: &[u8]) -> Record {
    match line.iter().position(|b| *b == b'\t') {
        Some(tab) => Record::new(&line[..tab], &line[tab + 1..]),
        None => Record::new(line, Vec::new()),
    }
}
