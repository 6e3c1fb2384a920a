use serde::{Deserialize, Serialize};

/// Half-open byte range `[start, end)` into a message's canonical content
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start: start.min(end),
            end: start.max(end),
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Check if this range contains the given offset
    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end
    }

    /// True when `other` lies entirely inside this range
    pub fn encloses(&self, other: &TextRange) -> bool {
        other.start >= self.start && other.end <= self.end
    }

    pub fn overlaps(&self, other: &TextRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// The same span counted in UTF-16 code units, as browsers index strings.
    /// `None` if either end is not a char boundary of `text`.
    pub fn to_utf16(&self, text: &str) -> Option<TextRange> {
        Some(TextRange::new(
            utf16_index(text, self.start)?,
            utf16_index(text, self.end)?,
        ))
    }

    /// Byte span of a UTF-16 span. `None` if an end splits a surrogate pair
    /// or lies past the text.
    pub fn from_utf16(range: TextRange, text: &str) -> Option<TextRange> {
        Some(TextRange::new(
            byte_offset(text, range.start)?,
            byte_offset(text, range.end)?,
        ))
    }
}

fn utf16_index(text: &str, offset: usize) -> Option<usize> {
    text.get(..offset).map(|prefix| prefix.encode_utf16().count())
}

fn byte_offset(text: &str, index: usize) -> Option<usize> {
    let mut units = 0;
    for (offset, c) in text.char_indices() {
        if units >= index {
            return (units == index).then_some(offset);
        }
        units += c.len_utf16();
    }
    (units == index).then_some(text.len())
}
