use super::text::{sentence_end_re, CharText};
use super::{ChunkConfig, ChunkSink};

pub(super) fn chunk(config: &ChunkConfig, doc: &CharText<'_>, sink: &mut ChunkSink<'_, '_>) {
    let len = doc.len();
    let mut pos = 0usize;

    while pos < len {
        let limit = (pos + config.chunk_size()).min(len);
        let mut end = limit;
        // false when `end` is a raw size cut that may fall mid-line
        let mut on_boundary = limit == len;

        if limit < len {
            let sentence = if config.respect_sentences() { find_sentence_boundary(config, doc, pos, limit) } else { None };
            let newline = if config.split_on_newline() { find_newline_boundary(config, doc, pos, limit) } else { None };
            if let Some(boundary) = sentence.or(newline) {
                end = boundary;
                on_boundary = true;
            }
        }

        let mut resume_at = None;
        if config.split_on_newline() && end < len {
            let mut lines = doc.lines(pos, end);
            if lines.len() > 1 {
                let (last_start, last_end) = lines.pop().unwrap_or((pos, end));
                for (s, e) in lines {
                    sink.emit(s, e);
                }
                if on_boundary {
                    sink.emit(last_start, last_end);
                } else {
                    // partial trailing line joins the next window
                    resume_at = Some(last_start);
                }
            } else {
                sink.emit(pos, end);
            }
        } else {
            sink.emit(pos, end);
        }

        if end >= len {
            break;
        }
        pos = match resume_at {
            Some(p) => p,
            None => {
                let mut next = end.saturating_sub(config.chunk_overlap());
                if config.split_on_newline() {
                    // overlap never reaches back across a line break
                    if let Some(nl) = (next..=end).rev().find(|&i| doc.char_at(i) == '\n') {
                        next = nl + 1;
                    }
                }
                if next <= pos { end } else { next }
            }
        };
    }
}

/// Last sentence end in `[start, limit)` that keeps at least `min_chunk_size` chars.
fn find_sentence_boundary(config: &ChunkConfig, doc: &CharText<'_>, start: usize, limit: usize) -> Option<usize> {
    doc.match_ends(sentence_end_re(), start, limit)
        .into_iter()
        .filter(|&b| b - start >= config.min_chunk_size())
        .last()
}

/// Nearest newline before `limit`, scanning backwards, that keeps at least
/// `min_chunk_size` chars. The newline itself is left for the next window.
fn find_newline_boundary(config: &ChunkConfig, doc: &CharText<'_>, start: usize, limit: usize) -> Option<usize> {
    let floor = start + config.min_chunk_size();
    (floor..limit).rev().find(|&i| doc.char_at(i) == '\n')
}
