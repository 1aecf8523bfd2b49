//! Minimal RFC 4180 CSV reading and writing for the archive snapshot.
//! One record per line; quoted fields may contain commas and escaped quotes.

/// Parse a CSV line into fields, handling quoted fields.
pub fn parse_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            if ch == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(ch);
            }
        } else if ch == '"' {
            in_quotes = true;
        } else if ch == ',' {
            fields.push(current.clone());
            current.clear();
        } else {
            current.push(ch);
        }
    }
    fields.push(current);
    fields
}

/// Quote a field when it contains a delimiter, quote, or line break.
pub fn quote(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        let escaped = s.replace('"', "\"\"");
        format!("\"{escaped}\"")
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_fields() {
        assert_eq!(parse_line("a,b,c"), vec!["a", "b", "c"]);
        assert_eq!(parse_line("a,,c"), vec!["a", "", "c"]);
    }

    #[test]
    fn quoted_fields_keep_commas_and_quotes() {
        assert_eq!(
            parse_line(r#""Fall Cycle, Finals","say ""go""",3"#),
            vec!["Fall Cycle, Finals", r#"say "go""#, "3"]
        );
    }

    #[test]
    fn quote_round_trips() {
        for s in ["plain", "has,comma", "has \"quote\"", ""] {
            let line = format!("{},x", quote(s));
            assert_eq!(parse_line(&line), vec![s.to_string(), "x".to_string()]);
        }
    }
}
