use std::collections::HashSet;

/// Checks that a fragment names an anchor on the target page
///
/// The comparison is exact and case-sensitive, after percent-decoding the
/// fragment. Returns the failure message when the anchor is missing.
///
/// # Examples
///
/// ```
/// use std::collections::HashSet;
/// use ripple_check::policy::check_fragment;
///
/// let ids: HashSet<String> = ["intro".to_string()].into_iter().collect();
/// assert!(check_fragment("intro", &ids).is_none());
/// assert_eq!(
///     check_fragment("outro", &ids).unwrap(),
///     "Fragment identifier '#outro' not found on page"
/// );
/// ```
pub fn check_fragment(fragment: &str, anchors: &HashSet<String>) -> Option<String> {
    if fragment.is_empty() || anchors.contains(fragment) {
        return None;
    }

    let decoded = urlencoding::decode(fragment)
        .map(|d| d.into_owned())
        .unwrap_or_else(|_| fragment.to_string());

    if anchors.contains(&decoded) {
        return None;
    }

    Some(format!(
        "Fragment identifier '#{}' not found on page",
        decoded
    ))
}
