//! Source preprocessing that runs before the grammar.

/// Removes trailing `#` comments from every line.
///
/// Quote state is tracked per line, so a `#` inside a string literal is kept.
/// Line structure is preserved exactly: the output has the same number of
/// lines and every retained character keeps its line and column, which keeps
/// parse error locations pointing at the text the user wrote.
pub fn strip_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    for line in source.split_inclusive('\n') {
        let (body, terminator) = split_terminator(line);
        out.push_str(strip_line(body));
        out.push_str(terminator);
    }
    out
}

fn split_terminator(line: &str) -> (&str, &str) {
    if let Some(body) = line.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = line.strip_suffix('\n') {
        (body, "\n")
    } else {
        (line, "")
    }
}

fn strip_line(line: &str) -> &str {
    let mut in_string = false;
    for (idx, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..idx],
            _ => {}
        }
    }
    line
}
