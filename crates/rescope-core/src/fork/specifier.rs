//! Package-name boundaries inside module specifiers.

/// Split a bare module specifier into its package name and sub-path suffix.
///
/// `@foo/bar/lib/x` splits into `("@foo/bar", "/lib/x")` and `lodash/merge`
/// into `("lodash", "/merge")`. Relative, absolute, subpath-import (`#x`) and
/// URL-style (`node:fs`, `https://...`) specifiers name no package and
/// return `None`, as does a scope with no package segment.
#[must_use]
pub fn split_package_specifier(spec: &str) -> Option<(&str, &str)> {
    if spec.is_empty() || spec.starts_with(['.', '/', '#']) {
        return None;
    }

    let end = if spec.starts_with('@') {
        let scope_end = spec.find('/')?;
        if scope_end == 1 {
            return None;
        }
        let rest = &spec[scope_end + 1..];
        let name_len = rest.find('/').unwrap_or(rest.len());
        if name_len == 0 {
            return None;
        }
        scope_end + 1 + name_len
    } else {
        spec.find('/').unwrap_or(spec.len())
    };

    let name = &spec[..end];
    if name.contains([':', '\\']) {
        return None;
    }

    Some((name, &spec[end..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scoped() {
        assert_eq!(
            split_package_specifier("@foo/bar/lib/x"),
            Some(("@foo/bar", "/lib/x"))
        );
        assert_eq!(split_package_specifier("@foo/bar"), Some(("@foo/bar", "")));
        assert_eq!(split_package_specifier("@foo/bar/"), Some(("@foo/bar", "/")));
    }

    #[test]
    fn test_unscoped() {
        assert_eq!(
            split_package_specifier("lodash/merge"),
            Some(("lodash", "/merge"))
        );
        assert_eq!(split_package_specifier("left-pad"), Some(("left-pad", "")));
        assert_eq!(
            split_package_specifier("lodash.merge/index.js"),
            Some(("lodash.merge", "/index.js"))
        );
    }

    #[test]
    fn test_not_a_package() {
        for spec in [
            "",
            "./util",
            "../lib/x",
            "/abs/path",
            "#internal",
            "@",
            "@foo",
            "@/bar",
            "@foo/",
            "node:fs",
            "https://esm.sh/react",
        ] {
            assert_eq!(split_package_specifier(spec), None, "{spec}");
        }
    }
}
