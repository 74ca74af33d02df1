use crate::config::PathMapping;

/// Translate a folder path as the source sees it into a local path.
///
/// Rules are tried in order and the first one whose `from` is a prefix of
/// `path` wins. Backslashes are normalized to forward slashes whether or not
/// a rule matched.
pub fn apply(rules: &[PathMapping], path: &str) -> String {
    if rules.is_empty() {
        return normalize(path);
    }

    match rules.iter().find(|rule| path.starts_with(&rule.from)) {
        Some(rule) => normalize(&format!("{}{}", rule.to, &path[rule.from.len()..])),
        None => normalize(path),
    }
}

fn normalize(path: &str) -> String {
    path.replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(from: &str, to: &str) -> PathMapping {
        PathMapping {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    #[test]
    fn test_prefix_replaced() {
        let rules = [rule("/media/", "/data/")];
        assert_eq!(apply(&rules, "/media/Show/S01"), "/data/Show/S01");
    }

    #[test]
    fn test_unmatched_is_normalized() {
        let rules = [rule("/media/", "/data/")];
        assert_eq!(apply(&rules, "C:\\other\\X"), "C:/other/X");
    }

    #[test]
    fn test_first_match_wins() {
        let rules = [rule("/a/", "/x/"), rule("/a/b/", "/y/")];
        assert_eq!(apply(&rules, "/a/b/c"), "/x/b/c");
    }

    #[test]
    fn test_no_rules() {
        assert_eq!(apply(&[], "D:\\Movies\\Heat"), "D:/Movies/Heat");
        assert_eq!(apply(&[], "/movies/Heat"), "/movies/Heat");
    }

    #[test]
    fn test_windows_source_to_unix() {
        let rules = [rule("D:\\Movies\\", "/movies/")];
        assert_eq!(apply(&rules, "D:\\Movies\\Heat (1995)"), "/movies/Heat (1995)");
    }

    #[test]
    fn test_only_prefix_replaced() {
        let rules = [rule("/m/", "/data/")];
        assert_eq!(apply(&rules, "/m/x/m/y"), "/data/x/m/y");
    }
}
