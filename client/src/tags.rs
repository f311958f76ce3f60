//! Expressive cue markers.
//!
//! Cues are written inline as `<tag>` and interpreted by the synthesis
//! engine; nothing here checks what a tag means.

/// Cues offered by default. Any other tag name is accepted as well.
pub const DEFAULT_TAGS: [&str; 5] = ["laugh", "cry", "whisper", "gasp", "sigh"];

/// Append ` <tag> ` to the end of `text`.
pub fn insert_tag(text: &str, tag: &str) -> String {
    let mut out = String::with_capacity(text.len() + tag.len() + 4);
    out.push_str(text);
    out.push_str(" <");
    out.push_str(tag);
    out.push_str("> ");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_marker_with_surrounding_spaces() {
        assert_eq!(insert_tag("Hello", "laugh"), "Hello <laugh> ");
        assert_eq!(insert_tag("", "sigh"), " <sigh> ");
    }

    #[test]
    fn every_call_appends_another_instance() {
        let once = insert_tag("Oh", "gasp");
        let twice = insert_tag(&once, "gasp");
        assert_eq!(twice, "Oh <gasp>  <gasp> ");
    }

    #[test]
    fn accepts_tags_outside_the_defaults() {
        assert!(!DEFAULT_TAGS.contains(&"chuckle"));
        assert_eq!(insert_tag("a", "chuckle"), "a <chuckle> ");
    }
}
