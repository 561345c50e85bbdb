/// True iff any keyword occurs, case-insensitively, as a substring of the
/// title and summary. Pure containment: a short keyword such as `APT` also
/// matches inside `chapter`. Keywords are used as written, surrounding
/// spaces included; blank ones are ignored.
pub fn is_relevant<S: AsRef<str>>(title: &str, summary: &str, keywords: &[S]) -> bool {
    let text = format!("{} {}", title, summary).to_lowercase();
    keywords
        .iter()
        .map(|k| k.as_ref())
        .filter(|k| !k.trim().is_empty())
        .any(|k| text.contains(&k.to_lowercase()))
}
