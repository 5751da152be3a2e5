use difference::{Changeset, Difference};

/// Normalize program output for comparison: `\r\n` becomes `\n`, trailing
/// whitespace is dropped from every line, and trailing blank lines go away.
pub fn normalize_output(text: &str) -> String {
    let text = text.replace("\r\n", "\n");
    let mut lines: Vec<&str> = text.lines().map(str::trim_end).collect();
    while lines.last().map_or(false, |l| l.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}

/// Compare normalized outputs. Returns `None` when they match, or a line
/// diff otherwise: lines only in `expected` start with `- `, lines only in
/// `actual` with `+ `.
pub fn compare_output(actual: &str, expected: &str) -> Option<String> {
    let actual = normalize_output(actual);
    let expected = normalize_output(expected);
    if actual == expected {
        return None;
    }
    Some(diff(&expected, &actual).1)
}

/// Generate a diff String of two Strings.
pub fn diff<'a>(orig: &'a str, edit: &'a str) -> (bool, String) {
    let changeset = Changeset::new(orig, edit, "\n");
    let mut change_string = String::new();
    let mut different = false;

    let mut add_diff_ln = |ic: char, s: &str| {
        // An empty chunk still stands for one (empty) line
        if s.is_empty() {
            change_string.push(ic);
            change_string.push_str(" \n");
        }
        for l in s.lines() {
            change_string.push(ic);
            change_string.push(' ');
            change_string.push_str(l);
            change_string.push('\n');
        }
    };

    for diff in changeset.diffs {
        match diff {
            Difference::Same(s) => add_diff_ln(' ', &s),
            Difference::Add(s) => {
                add_diff_ln('+', &s);
                different = true;
            }
            Difference::Rem(s) => {
                add_diff_ln('-', &s);
                different = true
            }
        }
    }

    (different, change_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_diff() {
        let (different, d) = diff("Hello,\nthis cruel\nworld!", "Hello,\nworld!\nHi!");
        assert!(different);
        assert_eq!(d, "  Hello,\n- this cruel\n  world!\n+ Hi!\n");
    }

    #[test]
    fn trailing_whitespace_is_ignored() {
        assert_eq!(compare_output("5  \r\n\n\n", "5"), None);
        assert_eq!(compare_output("1\n2 \n", "1\n2"), None);
    }

    #[test]
    fn leading_whitespace_still_matters() {
        assert_eq!(compare_output(" 5", "5"), Some("- 5\n+  5\n".into()));
    }

    #[test]
    fn mismatch_carries_diff() {
        let d = compare_output("1\n3\n", "1\n2\n").unwrap();
        assert_eq!(d, "  1\n- 2\n+ 3\n");
    }
}
