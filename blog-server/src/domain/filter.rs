use crate::domain::post::Post;

/// Conjunction of optional constraints on a post listing.
///
/// `None` means "no constraint on this field". The `search` term matches when it
/// appears, ignoring case, in the title or in the content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostFilter {
    pub status: Option<String>,
    pub author: Option<String>,
    pub search: Option<String>,
}

impl PostFilter {
    /// Builds a filter from raw request parameters. Blank values count as absent.
    pub fn resolve(status: Option<&str>, author: Option<&str>, search: Option<&str>) -> Self {
        Self {
            status: present(status),
            author: present(author),
            search: present(search),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.author.is_none() && self.search.is_none()
    }

    pub fn matches(&self, post: &Post) -> bool {
        if let Some(status) = &self.status {
            if post.status.as_str() != status {
                return false;
            }
        }
        if let Some(author) = &self.author {
            if &post.author != author {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            let in_title = post.title.to_lowercase().contains(&needle);
            let in_content = post.content.to_lowercase().contains(&needle);
            if !in_title && !in_content {
                return false;
            }
        }
        true
    }

    /// `search` as an `ILIKE` pattern with wildcard characters escaped.
    pub fn search_pattern(&self) -> Option<String> {
        self.search.as_ref().map(|term| {
            let mut escaped = String::with_capacity(term.len() + 2);
            escaped.push('%');
            for ch in term.chars() {
                if matches!(ch, '%' | '_' | '\\') {
                    escaped.push('\\');
                }
                escaped.push(ch);
            }
            escaped.push('%');
            escaped
        })
    }
}

fn present(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::post::PostStatus;
    use chrono::Utc;

    fn post(title: &str, content: &str, author: &str, status: PostStatus) -> Post {
        let now = Utc::now();
        Post {
            id: 1,
            title: title.into(),
            content: content.into(),
            author: author.into(),
            status,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn blank_parameters_are_ignored() {
        let filter = PostFilter::resolve(Some(""), Some("  "), None);
        assert!(filter.is_empty());
        assert!(filter.matches(&post("a", "b", "c", PostStatus::Draft)));
    }

    #[test]
    fn status_is_exact() {
        let filter = PostFilter::resolve(Some("published"), None, None);
        assert!(filter.matches(&post("a", "b", "c", PostStatus::Published)));
        assert!(!filter.matches(&post("a", "b", "c", PostStatus::Draft)));
    }

    #[test]
    fn unknown_status_matches_nothing() {
        let filter = PostFilter::resolve(Some("archived"), None, None);
        assert!(!filter.matches(&post("a", "b", "c", PostStatus::Draft)));
        assert!(!filter.matches(&post("a", "b", "c", PostStatus::Published)));
    }

    #[test]
    fn search_checks_title_or_content_ignoring_case() {
        let filter = PostFilter::resolve(None, None, Some("FOO"));
        assert!(filter.matches(&post("a foo title", "x", "c", PostStatus::Draft)));
        assert!(filter.matches(&post("x", "Food for thought", "c", PostStatus::Draft)));
        assert!(!filter.matches(&post("bar", "baz", "foo", PostStatus::Draft)));
    }

    #[test]
    fn constraints_are_conjunctive() {
        let filter = PostFilter::resolve(Some("published"), Some("Taro"), Some("rust"));
        assert!(filter.matches(&post("Rust tips", "x", "Taro", PostStatus::Published)));
        assert!(!filter.matches(&post("Rust tips", "x", "Hanako", PostStatus::Published)));
        assert!(!filter.matches(&post("Rust tips", "x", "Taro", PostStatus::Draft)));
        assert!(!filter.matches(&post("Go tips", "x", "Taro", PostStatus::Published)));
    }

    #[test]
    fn search_pattern_escapes_wildcards() {
        let filter = PostFilter::resolve(None, None, Some("100%_done"));
        assert_eq!(filter.search_pattern().unwrap(), "%100\\%\\_done%");
    }
}
