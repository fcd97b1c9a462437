//! Archive path policy.
//!
//! Every entry name is checked here before it is written to, or accepted
//! from, an archive. Rules, in order:
//! - no `..` anywhere in the name
//! - no leading `/`
//! - none of `< > : " | ? *`
//! - at most [`MAX_PATH_CHARS`] characters

use crate::error::PathError;

/// Longest entry name accepted, in characters.
pub const MAX_PATH_CHARS: usize = 260;

/// Characters that are never allowed in an entry name.
pub const RESERVED_CHARS: &[char] = &['<', '>', ':', '"', '|', '?', '*'];

/// Validate an archive-relative path.
pub fn validate(path: &str) -> Result<(), PathError> {
    if path.contains("..") {
        return Err(PathError::Traversal {
            path: path.to_string(),
        });
    }

    if path.starts_with('/') {
        return Err(PathError::Absolute {
            path: path.to_string(),
        });
    }

    if let Some(character) = path.chars().find(|c| RESERVED_CHARS.contains(c)) {
        return Err(PathError::InvalidCharacter {
            path: path.to_string(),
            character,
        });
    }

    let length = path.chars().count();
    if length > MAX_PATH_CHARS {
        return Err(PathError::TooLong {
            path: path.to_string(),
            length,
            max: MAX_PATH_CHARS,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn accepts_well_known_entries() {
        for p in [
            "manifest.json",
            "content/index.html",
            "assets/images/logo.png",
            "wasm/chart.wasm",
            "signatures/manifest.sig",
        ] {
            assert!(validate(p).is_ok(), "{p} should be accepted");
        }
    }

    #[test]
    fn rejects_traversal() {
        assert!(matches!(
            validate("../escape.txt"),
            Err(PathError::Traversal { .. })
        ));
        assert!(matches!(
            validate("content/../../etc/passwd"),
            Err(PathError::Traversal { .. })
        ));
    }

    #[test]
    fn rejects_absolute() {
        let err = validate("/etc/passwd").unwrap_err();
        assert!(matches!(err, PathError::Absolute { .. }));
        assert_eq!(err.path(), "/etc/passwd");
    }

    #[test]
    fn rejects_windows_drive_via_colon() {
        assert!(matches!(
            validate("C:\\Windows\\system32"),
            Err(PathError::InvalidCharacter { character: ':', .. })
        ));
    }

    #[test]
    fn length_boundary() {
        let ok = "a".repeat(MAX_PATH_CHARS);
        assert!(validate(&ok).is_ok());
        let long = "a".repeat(MAX_PATH_CHARS + 1);
        assert!(matches!(
            validate(&long),
            Err(PathError::TooLong { length: 261, .. })
        ));
    }

    #[test]
    fn error_message_names_path() {
        let err = validate("content/a?b.html").unwrap_err();
        assert!(err.to_string().contains("content/a?b.html"));
    }

    proptest! {
        #[test]
        fn any_dotdot_is_rejected(prefix in "[a-z/]{0,20}", suffix in "[a-z/]{0,20}") {
            let path = format!("{prefix}..{suffix}");
            prop_assert!(validate(&path).is_err());
        }

        #[test]
        fn any_reserved_char_is_rejected(
            prefix in "[a-z]{0,20}",
            idx in 0usize..RESERVED_CHARS.len(),
            suffix in "[a-z]{0,20}",
        ) {
            let path = format!("{prefix}{}{suffix}", RESERVED_CHARS[idx]);
            prop_assert!(validate(&path).is_err());
        }

        #[test]
        fn leading_slash_is_rejected(rest in "[a-z/]{0,40}") {
            let path = format!("/{rest}");
            prop_assert!(validate(&path).is_err());
        }

        #[test]
        fn clean_relative_paths_are_accepted(path in "[a-zA-Z0-9_][a-zA-Z0-9_/ -]{0,200}") {
            prop_assume!(!path.contains(".."));
            prop_assert!(validate(&path).is_ok());
        }
    }
}
