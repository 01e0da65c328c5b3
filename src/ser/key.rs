/// Builds bracketed keys (`parent[child][grandchild]`) one segment at a
/// time.
///
/// The first segment is written bare, every further segment is wrapped in
/// brackets. Segments are stored raw; percent-encoding happens when the
/// finished key is written out.
#[derive(Debug, Default)]
pub(crate) struct KeyPath {
    buf: String,
    marks: Vec<usize>,
}

impl KeyPath {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no segment has been pushed.
    pub fn is_root(&self) -> bool {
        self.marks.is_empty()
    }

    pub fn push(&mut self, segment: &str) {
        self.marks.push(self.buf.len());
        if self.marks.len() == 1 {
            self.buf.push_str(segment);
        } else {
            self.buf.reserve(segment.len() + 2);
            self.buf.push('[');
            self.buf.push_str(segment);
            self.buf.push(']');
        }
    }

    /// Removes the most recently pushed segment. Returns `false` if there
    /// was nothing to remove.
    pub fn pop(&mut self) -> bool {
        match self.marks.pop() {
            Some(mark) => {
                self.buf.truncate(mark);
                true
            }
            None => false,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }

    /// The most recently pushed segment, without its brackets.
    pub fn last_segment(&self) -> &str {
        match self.marks.last() {
            Some(&mark) if self.marks.len() > 1 => &self.buf[mark + 1..self.buf.len() - 1],
            Some(&mark) => &self.buf[mark..],
            None => "",
        }
    }
}
