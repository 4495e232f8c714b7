use crate::varobj::handle::DisplayFormat;

/// Bring a raw backend value into display form.
///
/// Quotes and backslashes are unescaped, hex digits of a `0x` value are upper
/// cased up to the first space (a trailing annotation like `<main+4>` is kept),
/// binary values get a `0b` prefix.
pub fn normalize(raw: &str, format: DisplayFormat) -> String {
    let mut value = unescape_quotes(raw);

    if let Some(rest) = value.strip_prefix("0x") {
        let (digits, annotation) = rest.split_at(rest.find(' ').unwrap_or(rest.len()));
        value = format!("0x{}{annotation}", digits.to_uppercase());
    }

    if format == DisplayFormat::Binary && !value.is_empty() {
        value.insert_str(0, "0b");
    }

    value
}

fn unescape_quotes(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(q @ ('"' | '\'' | '\\')) => out.push(q),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Placeholder for an aggregate without a value, like `[16]` for `char [16]`.
pub fn array_placeholder(type_name: &str) -> Option<&str> {
    type_name.find('[').map(|idx| &type_name[idx..])
}

/// Display value of a handle of `type_name`. An empty array value becomes its
/// placeholder whatever the format is.
pub fn display_value(raw: &str, format: DisplayFormat, type_name: &str) -> String {
    if raw.is_empty() {
        if let Some(placeholder) = array_placeholder(type_name) {
            return placeholder.to_string();
        }
    }
    normalize(raw, format)
}
