//! Cookie header parsing and `Set-Cookie` serialization.

/// Extract the value stored under `name` from a raw `Cookie` header.
///
/// Entries are split on `;` and then on the first `=`. Names are compared
/// after trimming; when a name repeats, the last entry wins.
pub fn read_cookie(header: Option<&str>, name: &str) -> Option<String> {
    let header = header?;
    let mut found = None;

    for entry in header.split(';') {
        let (key, value) = match entry.split_once('=') {
            Some(pair) => pair,
            None => (entry, ""),
        };
        if key.trim() == name {
            found = Some(value.trim().to_string());
        }
    }

    found
}

/// Serialize a `Set-Cookie` value with the fixed assignment attributes.
///
/// The value is written verbatim: a value containing `;` or `=` will not
/// round-trip through [`read_cookie`].
pub fn write_cookie(name: &str, value: &str, ttl_secs: u64) -> String {
    format!("{name}={value}; Max-Age={ttl_secs}; Path=/; SameSite=Lax; HttpOnly")
}
