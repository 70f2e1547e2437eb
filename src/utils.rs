use axum::http::HeaderValue;
use color_eyre::Result;

use crate::names;

pub fn cookie(name: &str, value: &str, secure: bool) -> Result<HeaderValue> {
    let secure_attr = if secure { "; Secure" } else { "" };
    let raw = format!(
        "{name}={value}; HttpOnly; Max-Age={}; Path=/; SameSite=Strict{secure_attr}",
        names::SESSION_MAX_AGE_SECONDS
    );
    Ok(HeaderValue::from_str(&raw)?)
}

pub fn clear_cookie(name: &str, secure: bool) -> Result<HeaderValue> {
    let secure_attr = if secure { "; Secure" } else { "" };
    let raw = format!("{name}=; HttpOnly; Max-Age=0; Path=/; SameSite=Strict{secure_attr}");
    Ok(HeaderValue::from_str(&raw)?)
}

/// Render rows as CSV. Fields containing commas, quotes or newlines are
/// quoted with doubled inner quotes.
pub fn render_csv(header: &[&str], rows: &[Vec<String>]) -> String {
    let mut out = String::new();
    push_csv_row(&mut out, header.iter().copied());
    for row in rows {
        push_csv_row(&mut out, row.iter().map(String::as_str));
    }
    out
}

fn push_csv_row<'a>(out: &mut String, fields: impl Iterator<Item = &'a str>) {
    let mut first = true;
    for field in fields {
        if !first {
            out.push(',');
        }
        first = false;

        if field.contains([',', '"', '\n', '\r']) {
            out.push('"');
            out.push_str(&field.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(field);
        }
    }
    out.push_str("\r\n");
}
