/// Produces a word-level diff of two texts.
///
/// Removed runs are rendered as `[-text-]` and inserted runs as `{+text+}`.
/// Texts are split into runs of word characters, runs of whitespace and
/// single punctuation characters.
pub fn word_diff(before: &str, after: &str) -> String {
    let a = tokenize(before);
    let b = tokenize(after);

    // lcs[i][j] is the length of the longest common subsequence of a[i..] and b[j..].
    let mut lcs = vec![vec![0usize; b.len() + 1]; a.len() + 1];
    for i in (0..a.len()).rev() {
        for j in (0..b.len()).rev() {
            lcs[i][j] = if a[i] == b[j] {
                lcs[i + 1][j + 1] + 1
            } else {
                lcs[i + 1][j].max(lcs[i][j + 1])
            };
        }
    }

    let mut out = String::new();
    let mut removed = String::new();
    let mut inserted = String::new();
    let (mut i, mut j) = (0, 0);
    while i < a.len() || j < b.len() {
        if i < a.len() && j < b.len() && a[i] == b[j] {
            flush(&mut out, &mut removed, &mut inserted);
            out.push_str(a[i]);
            i += 1;
            j += 1;
        } else if j == b.len() || (i < a.len() && lcs[i + 1][j] >= lcs[i][j + 1]) {
            removed.push_str(a[i]);
            i += 1;
        } else {
            inserted.push_str(b[j]);
            j += 1;
        }
    }
    flush(&mut out, &mut removed, &mut inserted);
    out
}

fn flush(out: &mut String, removed: &mut String, inserted: &mut String) {
    if !removed.is_empty() {
        out.push_str("[-");
        out.push_str(removed);
        out.push_str("-]");
        removed.clear();
    }
    if !inserted.is_empty() {
        out.push_str("{+");
        out.push_str(inserted);
        out.push_str("+}");
        inserted.clear();
    }
}

#[derive(PartialEq)]
enum Class {
    Word,
    Space,
    Other,
}

fn classify(c: char) -> Class {
    if c.is_alphanumeric() || c == '_' {
        Class::Word
    } else if c.is_whitespace() {
        Class::Space
    } else {
        Class::Other
    }
}

fn tokenize(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut current: Option<Class> = None;
    for (index, c) in text.char_indices() {
        let class = classify(c);
        let continues = match &current {
            Some(Class::Other) | None => false,
            Some(prev) => *prev == class,
        };
        if !continues {
            if index > start {
                tokens.push(&text[start..index]);
            }
            start = index;
        }
        current = Some(class);
    }
    if start < text.len() {
        tokens.push(&text[start..]);
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_texts_have_no_markers() {
        assert_eq!(word_diff("EvtA { value: 1 }", "EvtA { value: 1 }"), "EvtA { value: 1 }");
    }

    #[test]
    fn changed_words_are_marked() {
        assert_eq!(
            word_diff("EvtA { value: 1 }", "EvtA { value: 2 }"),
            "EvtA { value: [-1-]{+2+} }"
        );
    }

    #[test]
    fn pointer_wrappers_show_as_removed() {
        assert_eq!(
            word_diff("Box::new(EvtA { value: 1 })", "EvtA { value: 1 }"),
            "[-Box::new(-]EvtA { value: 1 }[-)-]"
        );
    }

    #[test]
    fn tokenizer_splits_words_spaces_and_punctuation() {
        assert_eq!(tokenize("a_b  c::d"), vec!["a_b", "  ", "c", ":", ":", "d"]);
    }
}
