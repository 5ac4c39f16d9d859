use std::fmt;

/// Anchor comment left where a directive used to be
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Marker {
    Condition(String),
    Loop(String),
}

impl Marker {
    /// Parse the text of a comment node; surrounding whitespace is ignored
    pub fn parse(comment: &str) -> Option<Self> {
        let text = comment.trim();
        if let Some(name) = text.strip_prefix("if:") {
            return (!name.is_empty()).then(|| Marker::Condition(name.to_string()));
        }
        if let Some(name) = text.strip_prefix("loop:") {
            return (!name.is_empty()).then(|| Marker::Loop(name.to_string()));
        }
        None
    }

    pub fn name(&self) -> &str {
        match self {
            Marker::Condition(name) | Marker::Loop(name) => name,
        }
    }

    /// Same kind of marker with a different record name
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        match self {
            Marker::Condition(_) => Marker::Condition(name.into()),
            Marker::Loop(_) => Marker::Loop(name.into()),
        }
    }

    /// Markup for the comment node
    pub fn to_comment(&self) -> String {
        format!("<!-- {} -->", self)
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Marker::Condition(name) => write!(f, "if:{}", name),
            Marker::Loop(name) => write!(f, "loop:{}", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_markers() {
        assert_eq!(Marker::parse(" if:abc_if_0 "), Some(Marker::Condition("abc_if_0".to_string())));
        assert_eq!(Marker::parse("loop:abc_loop_1"), Some(Marker::Loop("abc_loop_1".to_string())));
        assert_eq!(Marker::parse("if:"), None);
        assert_eq!(Marker::parse(" just a comment "), None);
    }

    #[test]
    fn test_marker_comment_roundtrip() {
        let marker = Marker::Loop("x_loop_0".to_string());
        assert_eq!(marker.to_comment(), "<!-- loop:x_loop_0 -->");
        assert_eq!(marker.renamed("x_loop_0@[1]").to_string(), "loop:x_loop_0@[1]");
    }
}
