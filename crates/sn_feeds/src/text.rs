use scraper::Html;

/// Removes markup, decodes entities and collapses runs of whitespace.
pub fn clean_text(raw: &str) -> String {
    if !raw.contains('<') && !raw.contains('&') {
        return collapse_whitespace(raw);
    }
    let fragment = Html::parse_fragment(raw);
    let text: String = fragment.root_element().text().collect();
    collapse_whitespace(&text)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_tags_and_entities() {
        let raw = "<p>Critical <b>RCE</b> in&nbsp;Exchange &amp; Outlook</p>\n<br/>  patch now";
        assert_eq!(clean_text(raw), "Critical RCE in Exchange & Outlook patch now");
    }

    #[test]
    fn test_plain_text_is_only_collapsed() {
        assert_eq!(clean_text("  two\n\tlines  "), "two lines");
        assert_eq!(clean_text(""), "");
    }

    #[test]
    fn test_korean_text_survives() {
        assert_eq!(clean_text("<div>랜섬웨어 <i>공격</i></div>"), "랜섬웨어 공격");
    }
}
