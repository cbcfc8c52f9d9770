const MAX_NAME_CHARS: usize = 120;

/// Windows-safe name for a downloaded export: the server-suggested name when
/// usable, otherwise `{job_id}.export`.
pub fn export_filename(suggested: Option<&str>, job_id: &str) -> String {
    suggested
        .map(sanitize_name)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| {
            let fallback = sanitize_name(job_id);
            if fallback.is_empty() {
                "export".to_string()
            } else {
                format!("{fallback}.export")
            }
        })
}

/// File name from a `Content-Disposition` header value. `filename*` (RFC 5987)
/// takes precedence over plain `filename`.
pub fn content_disposition_filename(header: &str) -> Option<String> {
    let mut plain = None;
    for param in header.split(';').map(str::trim) {
        let Some((key, value)) = param.split_once('=') else {
            continue;
        };
        match key.trim().to_ascii_lowercase().as_str() {
            "filename*" => {
                let encoded = value.trim().trim_matches('"');
                let encoded = encoded.split_once("''").map_or(encoded, |(_, rest)| rest);
                if let Some(decoded) = percent_decode(encoded) {
                    return Some(decoded);
                }
            }
            "filename" => plain = Some(value.trim().trim_matches('"').to_string()),
            _ => {}
        }
    }
    plain.filter(|name| !name.is_empty())
}

fn percent_decode(input: &str) -> Option<String> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = input.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

fn sanitize_name(input: &str) -> String {
    let cleaned: String = input
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim_matches(&['_', ' ', '.'][..]);

    // Collapse multiple underscores
    let mut compacted = String::with_capacity(cleaned.len());
    let mut prev_underscore = false;
    for c in cleaned.chars() {
        if c == '_' {
            if !prev_underscore {
                compacted.push(c);
            }
            prev_underscore = true;
        } else {
            compacted.push(c);
            prev_underscore = false;
        }
    }

    let mut final_name: String = compacted.chars().take(MAX_NAME_CHARS).collect();
    let stem_len = final_name.find('.').unwrap_or(final_name.len());
    if is_reserved_windows_name(&final_name[..stem_len]) {
        final_name.insert(stem_len, '_');
    }
    final_name
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::{content_disposition_filename, export_filename};

    #[test]
    fn plain_filename_is_extracted() {
        assert_eq!(
            content_disposition_filename("attachment; filename=\"out_zh.csv\""),
            Some("out_zh.csv".to_string())
        );
        assert_eq!(
            content_disposition_filename("attachment; filename=out.jsonl"),
            Some("out.jsonl".to_string())
        );
    }

    #[test]
    fn encoded_filename_wins() {
        let header = "attachment; filename=\"fallback.csv\"; filename*=utf-8''%E6%95%B0%E6%8D%AE.csv";
        assert_eq!(
            content_disposition_filename(header),
            Some("数据.csv".to_string())
        );
    }

    #[test]
    fn missing_filename_yields_none() {
        assert_eq!(content_disposition_filename("attachment"), None);
        assert_eq!(content_disposition_filename("attachment; filename=\"\""), None);
    }

    #[test]
    fn unsafe_names_are_sanitized() {
        assert_eq!(export_filename(Some("../../etc/passwd"), "J1"), "etc_passwd");
        assert_eq!(export_filename(Some("a:b?.csv"), "J1"), "a_b_.csv");
        assert_eq!(export_filename(Some("CON.csv"), "J1"), "CON_.csv");
    }

    #[test]
    fn fallback_uses_job_id() {
        assert_eq!(export_filename(None, "J1"), "J1.export");
        assert_eq!(export_filename(Some("..."), "J1"), "J1.export");
    }

    #[test]
    fn long_multibyte_names_are_truncated_on_char_boundary() {
        let long = "数".repeat(300);
        let name = export_filename(Some(&long), "J1");
        assert_eq!(name.chars().count(), 120);
    }
}
