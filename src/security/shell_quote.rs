//! Shell Quoter - POSIX shell quoting for arbitrary strings
//!
//! Every output of [`quote`] is read by a POSIX shell (bash included) as one
//! word whose value is exactly the input. No expansion of any kind applies:
//! no parameters, no command substitution, no globbing, no tilde, no word
//! splitting.
//!
//! Strategy: words made only of an allowlisted alphabet pass through
//! unchanged. Everything else is wrapped in single quotes, inside which the
//! shell interprets nothing, and each embedded `'` becomes `'\''` (close the
//! quote, emit an escaped quote, reopen).
//!
//! # Example
//!
//! ```
//! use repo_guard::security::shell_quote::{quote, quote_join};
//!
//! assert_eq!(quote("main"), "main");
//! assert_eq!(quote("it's $HOME"), r#"'it'\''s $HOME'"#);
//! assert_eq!(quote(""), "''");
//! assert_eq!(quote_join(["git", "commit", "-m", "fix: a b"]), "git commit -m 'fix: a b'");
//! ```

use std::borrow::Cow;

/// Characters that never carry meaning to a POSIX shell inside an unquoted
/// word. `=` and `~` are excluded: a leading `NAME=` is an assignment and a
/// leading `~` is tilde-expanded.
fn is_safe_unquoted(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '@' | '%' | '+' | ',' | '.' | '/' | ':' | '-')
}

/// Quote `value` as a single shell word.
///
/// Total over all strings. A NUL byte is carried through literally; shells
/// cannot pass NUL inside an argument, so callers should not expect it to
/// survive execution.
pub fn quote(value: &str) -> Cow<'_, str> {
    if !value.is_empty() && value.chars().all(is_safe_unquoted) {
        return Cow::Borrowed(value);
    }

    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        if c == '\'' {
            quoted.push_str(r"'\''");
        } else {
            quoted.push(c);
        }
    }
    quoted.push('\'');
    Cow::Owned(quoted)
}

/// Quote each argument and join them with single spaces.
pub fn quote_join<I, S>(args: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    args.into_iter()
        .map(|arg| quote(arg.as_ref()).into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_safe_words_pass_through() {
        assert_eq!(quote("simple"), "simple");
        assert_eq!(quote("refs/heads/main"), "refs/heads/main");
        assert_eq!(quote("v1.2.3-rc+build"), "v1.2.3-rc+build");
        assert_eq!(quote("user@host:path"), "user@host:path");
        assert!(matches!(quote("plain"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_empty_string_is_one_empty_word() {
        assert_eq!(quote(""), "''");
    }

    #[test]
    fn test_metacharacters_are_single_quoted() {
        assert_eq!(quote("a b"), "'a b'");
        assert_eq!(quote("$(rm -rf /)"), "'$(rm -rf /)'");
        assert_eq!(quote("`id`"), "'`id`'");
        assert_eq!(quote("*.rs"), "'*.rs'");
        assert_eq!(quote("a\\b"), "'a\\b'");
        assert_eq!(quote("line1\nline2"), "'line1\nline2'");
        assert_eq!(quote("\"dq\""), "'\"dq\"'");
    }

    #[test]
    fn test_assignment_and_tilde_are_quoted() {
        assert_eq!(quote("FOO=bar"), "'FOO=bar'");
        assert_eq!(quote("~root"), "'~root'");
    }

    #[test]
    fn test_embedded_single_quotes() {
        assert_eq!(quote("it's"), r"'it'\''s'");
        assert_eq!(quote("'"), r"''\'''");
    }

    #[test]
    fn test_quote_join() {
        assert_eq!(
            quote_join(["git", "log", "--format=%H %s"]),
            "git log '--format=%H %s'"
        );
        assert_eq!(quote_join(Vec::<String>::new()), "");
        assert_eq!(quote_join(["", "x"]), "'' x");
    }

    #[test]
    fn test_quote_join_splits_back_into_argv() {
        let argv = ["git", "commit", "-m", "it's $HOME", "", "~", "a\nb", "FOO=bar"];
        let line = quote_join(argv);
        assert_eq!(shell_words::split(&line).unwrap(), argv);
    }

    #[cfg(unix)]
    fn echo_through_shell(value: &str) -> Vec<u8> {
        let script = format!("printf '%s' {}", quote(value));
        let output = std::process::Command::new("sh")
            .arg("-c")
            .arg(script)
            .output()
            .unwrap();
        assert!(output.status.success());
        output.stdout
    }

    #[cfg(unix)]
    #[test]
    fn test_round_trip_hostile_inputs() {
        let inputs = [
            "",
            " ",
            "it's",
            "\"double\"",
            "$HOME",
            "${PATH}",
            "$(touch /tmp/pwned)",
            "`touch /tmp/pwned`",
            "a;b|c&d",
            "*",
            "?",
            "[a-z]",
            "~",
            "line1\nline2",
            "tab\there",
            "back\\slash",
            "!event",
            "FOO=bar",
            "-n",
        ];
        for input in inputs {
            assert_eq!(echo_through_shell(input), input.as_bytes(), "input {input:?}");
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_round_trip_counts_as_one_word() {
        let script = format!("set -- {}; printf '%s' \"$#\"", quote_join(["a b", "", "*"]));
        let output = std::process::Command::new("sh")
            .arg("-c")
            .arg(script)
            .output()
            .unwrap();
        assert_eq!(output.stdout, b"3");
    }

    #[cfg(unix)]
    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_round_trip_through_sh(s in any::<String>().prop_filter("no NUL", |s| !s.contains('\0'))) {
            prop_assert_eq!(echo_through_shell(&s), s.as_bytes().to_vec());
        }
    }

    proptest! {
        #[test]
        fn prop_quote_join_splits_back_into_argv(
            argv in prop::collection::vec(any::<String>(), 0..8)
        ) {
            let line = quote_join(&argv);
            prop_assert_eq!(shell_words::split(&line).unwrap(), argv);
        }

        #[test]
        fn prop_output_is_verbatim_or_fully_wrapped(s in any::<String>()) {
            let q = quote(&s);
            if q != s.as_str() {
                prop_assert!(q.len() >= 2);
                prop_assert!(q.starts_with('\'') && q.ends_with('\''));
            } else {
                prop_assert!(!s.is_empty() && s.chars().all(is_safe_unquoted));
            }
        }
    }
}
