/// Whitelist filter for CSV header labels.
///
/// Keeps ASCII letters and digits, hyphen, space, forward slash and
/// the German umlauts/sharp-s; every other character is dropped. This
/// is a plain character filter, not an encoder: no escaping and no
/// whitespace normalization happen here.
pub fn sanitize_label(raw: &str) -> String {
    raw.chars().filter(|&c| is_allowed(c)).collect()
}

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(c, '-' | ' ' | '/')
        || matches!(c, 'ö' | 'ä' | 'ü' | 'Ö' | 'Ä' | 'Ü' | 'ß')
}
