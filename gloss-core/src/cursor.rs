/// Cursor over the visible text of a message.
///
/// Columns are byte offsets within the line and always sit on a character
/// boundary, so `cursor_to_offset` yields offsets a `MarkupView` accepts.
#[derive(Debug, Clone)]
pub struct CursorState {
    pub row: usize,
    pub col: usize,
    /// Byte offset of each line start
    line_starts: Vec<usize>,
    lines: Vec<String>,
}

impl CursorState {
    pub fn new() -> Self {
        Self {
            row: 0,
            col: 0,
            line_starts: vec![0],
            lines: Vec::new(),
        }
    }

    /// Load text and compute line offsets. The cursor returns to the top.
    pub fn set_content(&mut self, text: &str) {
        self.lines = text.split('\n').map(String::from).collect();
        self.line_starts.clear();
        self.line_starts.push(0);
        for (i, c) in text.char_indices() {
            if c == '\n' {
                self.line_starts.push(i + 1);
            }
        }
        self.row = 0;
        self.col = 0;
    }

    pub fn cursor(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    /// Text offset of the current position
    pub fn offset(&self) -> usize {
        self.cursor_to_offset(self.row, self.col)
    }

    /// Convert (row, col) to a text offset, clamped to the text
    pub fn cursor_to_offset(&self, row: usize, col: usize) -> usize {
        match (self.line_starts.get(row), self.lines.get(row)) {
            (Some(&start), Some(line)) => start + col.min(line.len()),
            _ => self.len(),
        }
    }

    pub fn offset_to_cursor(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.len());
        let row = self
            .line_starts
            .iter()
            .rposition(|&start| start <= offset)
            .unwrap_or(0);
        let col = offset - self.line_starts[row];
        let col = self
            .lines
            .get(row)
            .map(|line| floor_boundary(line, col))
            .unwrap_or(0);
        (row, col)
    }

    pub fn set_cursor_offset(&mut self, offset: usize) {
        let (row, col) = self.offset_to_cursor(offset);
        self.row = row;
        self.col = col;
    }

    /// Length of the loaded text in bytes
    pub fn len(&self) -> usize {
        match (self.line_starts.last(), self.lines.last()) {
            (Some(&start), Some(line)) => start + line.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn current_line(&self) -> Option<&str> {
        self.lines.get(self.row).map(|s| s.as_str())
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(|s| s.as_str())
    }

    /// Byte offset where line `index` starts
    pub fn line_start(&self, index: usize) -> Option<usize> {
        self.line_starts.get(index).copied()
    }

    fn line_len(&self, row: usize) -> usize {
        self.lines.get(row).map(String::len).unwrap_or(0)
    }

    fn clamp_col(&mut self) {
        self.col = self
            .lines
            .get(self.row)
            .map(|line| floor_boundary(line, self.col))
            .unwrap_or(0);
    }

    pub fn move_up(&mut self) {
        if self.row > 0 {
            self.row -= 1;
            self.clamp_col();
        }
    }

    pub fn move_down(&mut self) {
        if self.row + 1 < self.lines.len() {
            self.row += 1;
            self.clamp_col();
        }
    }

    pub fn move_left(&mut self) {
        if self.col > 0 {
            let line = self.current_line().unwrap_or_default();
            self.col = line
                .get(..self.col)
                .unwrap_or_default()
                .char_indices()
                .next_back()
                .map(|(i, _)| i)
                .unwrap_or(0);
        } else if self.row > 0 {
            self.row -= 1;
            self.col = self.line_len(self.row);
        }
    }

    pub fn move_right(&mut self) {
        let line = self.current_line().unwrap_or_default();
        if let Some(c) = line.get(self.col..).and_then(|rest| rest.chars().next()) {
            self.col += c.len_utf8();
        } else if self.row + 1 < self.lines.len() {
            self.row += 1;
            self.col = 0;
        }
    }

    pub fn move_to_start(&mut self) {
        self.col = 0;
    }

    pub fn move_to_end(&mut self) {
        self.col = self.line_len(self.row);
    }

    pub fn move_to_top(&mut self) {
        self.row = 0;
        self.col = 0;
    }

    pub fn move_to_bottom(&mut self) {
        if !self.lines.is_empty() {
            self.row = self.lines.len() - 1;
            self.col = 0;
        }
    }

    pub fn move_word_forward(&mut self) {
        let Some(line) = self.lines.get(self.row) else {
            return;
        };
        let rest = line.get(self.col..).unwrap_or_default();
        let word_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let after = &rest[word_end..];
        let next_word = after
            .find(|c: char| !c.is_whitespace())
            .map(|i| word_end + i);

        match next_word {
            Some(i) => self.col += i,
            None if self.row + 1 < self.lines.len() => {
                self.row += 1;
                self.col = 0;
            }
            None => self.col = line.len(),
        }
    }

    pub fn move_word_back(&mut self) {
        if self.col == 0 {
            if self.row > 0 {
                self.row -= 1;
                self.col = self.line_len(self.row);
            }
            return;
        }

        let Some(line) = self.lines.get(self.row) else {
            return;
        };
        let before = line.get(..self.col).unwrap_or_default().trim_end();
        self.col = before
            .rfind(char::is_whitespace)
            .map(|i| i + before[i..].chars().next().map(char::len_utf8).unwrap_or(1))
            .unwrap_or(0);
    }
}

impl Default for CursorState {
    fn default() -> Self {
        Self::new()
    }
}

/// Largest char boundary of `line` at or below `col`
fn floor_boundary(line: &str, col: usize) -> usize {
    let mut col = col.min(line.len());
    while !line.is_char_boundary(col) {
        col -= 1;
    }
    col
}
