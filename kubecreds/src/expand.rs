//! `$VAR` / `${VAR}` expansion for path arguments.
//!
//! Unset variables expand to the empty string. A `$` that is not followed by
//! a name stays as-is, and a malformed `${...` reference is dropped.

use std::env;

/// Expands variables from the process environment.
pub fn expand_env(s: &str) -> String {
    expand_with(s, |name| env::var(name).ok())
}

/// Expands variables using `lookup`.
pub fn expand_with<F>(s: &str, mut lookup: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    let mut out = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(at) = rest.find('$') {
        out.push_str(&rest[..at]);
        let after = &rest[at + 1..];
        match shell_name(after) {
            Name::Var(name, width) => {
                out.push_str(&lookup(name).unwrap_or_default());
                rest = &after[width..];
            }
            Name::Invalid(width) => rest = &after[width..],
            Name::None => {
                out.push('$');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

enum Name<'a> {
    Var(&'a str, usize),
    /// Bad syntax; skip this many bytes.
    Invalid(usize),
    None,
}

fn is_special(b: u8) -> bool {
    matches!(b, b'*' | b'#' | b'$' | b'@' | b'!' | b'?' | b'-') || b.is_ascii_digit()
}

fn is_name_byte(b: u8) -> bool {
    b == b'_' || b.is_ascii_alphanumeric()
}

fn shell_name(s: &str) -> Name<'_> {
    let bytes = s.as_bytes();
    match bytes.first().copied() {
        None => Name::None,
        Some(b'{') => {
            if bytes.len() > 2 && is_special(bytes[1]) && bytes[2] == b'}' {
                return Name::Var(&s[1..2], 3);
            }
            match s.find('}') {
                Some(1) => Name::Invalid(2),
                Some(end) => Name::Var(&s[1..end], end + 1),
                None => Name::Invalid(1),
            }
        }
        Some(b) if is_special(b) => Name::Var(&s[..1], 1),
        Some(_) => {
            let len = bytes.iter().take_while(|b| is_name_byte(**b)).count();
            if len == 0 {
                Name::None
            } else {
                Name::Var(&s[..len], len)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand(s: &str) -> String {
        expand_with(s, |name| match name {
            "HOME" => Some("/home/op".to_string()),
            "DIR" => Some("certs".to_string()),
            "1" => Some("first".to_string()),
            _ => None,
        })
    }

    #[test]
    fn expands_plain_and_braced() {
        assert_eq!(expand("$HOME/.kube/config"), "/home/op/.kube/config");
        assert_eq!(expand("${DIR}_old/ca.crt"), "certs_old/ca.crt");
        assert_eq!(expand("./$DIR/$DIR.pem"), "./certs/certs.pem");
    }

    #[test]
    fn unset_is_empty() {
        assert_eq!(expand("$NOPE/ca.crt"), "/ca.crt");
        assert_eq!(expand("${NOPE}"), "");
    }

    #[test]
    fn leaves_literal_dollars() {
        assert_eq!(expand("./ca.crt"), "./ca.crt");
        assert_eq!(expand("cost$"), "cost$");
        assert_eq!(expand("a$/b"), "a$/b");
        assert_eq!(expand(""), "");
    }

    #[test]
    fn special_names() {
        assert_eq!(expand("$1x"), "firstx");
        assert_eq!(expand("${1}"), "first");
    }

    #[test]
    fn drops_bad_syntax() {
        assert_eq!(expand("a${}b"), "ab");
        assert_eq!(expand("a${HOME"), "aHOME");
    }

    #[test]
    fn reads_process_environment() {
        let path = std::env::var("PATH").unwrap_or_default();
        assert_eq!(expand_env("${PATH}"), path);
    }
}
