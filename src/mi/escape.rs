/// Decode c-string escapes of a stream record for display.
///
/// Known escapes: `\n`, `\r`, `\t`, `\v`, `\"`, `\'`, `\\` and octal `\NNN`.
/// Unknown escapes are kept verbatim.
pub fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut bytes: Vec<u8> = vec![];
    let mut chars = raw.chars().peekable();

    macro_rules! flush_bytes {
        () => {
            if !bytes.is_empty() {
                out.push_str(&String::from_utf8_lossy(&bytes));
                bytes.clear();
            }
        };
    }

    while let Some(c) = chars.next() {
        if c != '\\' {
            flush_bytes!();
            out.push(c);
            continue;
        }

        match chars.peek().copied() {
            Some(d @ '0'..='7') => {
                // octal escapes encode raw bytes, multibyte chars span several of them
                let mut code = 0u32;
                let mut len = 0;
                let mut next = Some(d);
                while let Some(digit @ '0'..='7') = next {
                    if len == 3 {
                        break;
                    }
                    code = code * 8 + digit.to_digit(8).unwrap_or_default();
                    len += 1;
                    chars.next();
                    next = chars.peek().copied();
                }
                bytes.push((code & 0xff) as u8);
                continue;
            }
            _ => flush_bytes!(),
        }

        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('v') => out.push('\u{0b}'),
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    flush_bytes!();

    out
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_unescape() {
        struct TestCase {
            raw: &'static str,
            expected: &'static str,
        }
        let cases = vec![
            TestCase {
                raw: r"Starting program\n",
                expected: "Starting program\n",
            },
            TestCase {
                raw: r#"say \"hi\"\t\\"#,
                expected: "say \"hi\"\t\\",
            },
            TestCase {
                raw: r"\r\v\'",
                expected: "\r\u{0b}'",
            },
            TestCase {
                raw: r"\q stays",
                expected: r"\q stays",
            },
            TestCase {
                raw: r"\303\251t\303\251",
                expected: "été",
            },
            TestCase {
                raw: r"\101\102C",
                expected: "ABC",
            },
            TestCase {
                raw: "trailing\\",
                expected: "trailing\\",
            },
        ];

        for tc in cases {
            assert_eq!(unescape(tc.raw), tc.expected);
        }
    }
}
