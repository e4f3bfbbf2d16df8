use super::text::{blank_line_re, sentence_gap_re, CharText};
use super::{ChunkConfig, ChunkSink};

pub(super) fn chunk(config: &ChunkConfig, doc: &CharText<'_>, sink: &mut ChunkSink<'_, '_>) {
    let size = config.chunk_size();
    for (start, end) in sections(doc) {
        let Some((start, end)) = doc.trim(start, end) else { continue };
        if end - start <= size {
            sink.emit(start, end);
            continue;
        }

        let mut buffer = Buffer::new(size);
        for (line_start, line_end) in doc.lines(start, end) {
            let Some((ls, le)) = doc.trim(line_start, line_end) else { continue };
            if le - ls <= size {
                buffer.push(ls, le, sink);
                continue;
            }
            buffer.flush(sink);
            for (ss, se) in sentences(doc, ls, le) {
                if se - ss <= size {
                    buffer.push(ss, se, sink);
                } else {
                    buffer.flush(sink);
                    hard_split(size, ss, se, sink);
                }
            }
        }
        buffer.flush(sink);
    }
}

/// Running span of adjacent pieces that still fits in `size` chars.
struct Buffer {
    size: usize,
    span: Option<(usize, usize)>,
}

impl Buffer {
    fn new(size: usize) -> Self {
        Self { size, span: None }
    }

    fn push(&mut self, start: usize, end: usize, sink: &mut ChunkSink<'_, '_>) {
        self.span = match self.span {
            Some((buf_start, _)) if end - buf_start <= self.size => Some((buf_start, end)),
            Some(_) => {
                self.flush(sink);
                Some((start, end))
            }
            None => Some((start, end)),
        };
    }

    fn flush(&mut self, sink: &mut ChunkSink<'_, '_>) {
        if let Some((start, end)) = self.span.take() {
            sink.emit(start, end);
        }
    }
}

/// Spans between blank lines.
fn sections(doc: &CharText<'_>) -> Vec<(usize, usize)> {
    let text = doc.slice(0, doc.len());
    let mut spans = Vec::new();
    let mut start = 0;
    for m in blank_line_re().find_iter(text) {
        spans.push((start, doc.char_index(m.start())));
        start = doc.char_index(m.end());
    }
    spans.push((start, doc.len()));
    spans
}

/// Sentence spans of `[start, end)`; a sentence ends at terminal punctuation
/// followed by whitespace, and the whitespace belongs to neither side.
fn sentences(doc: &CharText<'_>, start: usize, end: usize) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut sentence_start = start;
    for gap_end in doc.match_ends(sentence_gap_re(), start, end) {
        // walk back over the whitespace to the punctuation mark
        let mut punct_end = gap_end;
        while punct_end > sentence_start && doc.char_at(punct_end - 1).is_whitespace() {
            punct_end -= 1;
        }
        spans.push((sentence_start, punct_end));
        sentence_start = gap_end;
    }
    if sentence_start < end {
        spans.push((sentence_start, end));
    }
    spans
}

/// Last resort: fixed `size`-char pieces with no regard for word boundaries.
fn hard_split(size: usize, start: usize, end: usize, sink: &mut ChunkSink<'_, '_>) {
    let mut pos = start;
    while pos < end {
        let piece_end = (pos + size).min(end);
        sink.emit(pos, piece_end);
        pos = piece_end;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sections_split_on_blank_lines_with_spaces() {
        let doc = CharText::new("one\n  \ntwo\n\n\nthree");
        let spans: Vec<&str> = sections(&doc).into_iter().map(|(s, e)| doc.slice(s, e)).collect();
        assert_eq!(spans, vec!["one", "two", "three"]);
    }

    #[test]
    fn sentences_keep_punctuation() {
        let doc = CharText::new("Art. one applies!  Then two? Tail");
        let spans: Vec<&str> = sentences(&doc, 0, doc.len()).into_iter().map(|(s, e)| doc.slice(s, e)).collect();
        assert_eq!(spans, vec!["Art.", "one applies!", "Then two?", "Tail"]);
    }
}
