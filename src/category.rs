//! Language-independent category keys
//!
//! Task categories are typed by the user in whatever language the UI is set
//! to ("Work", "Kerja", "仕事"). Filtering compares normalised keys so a task
//! created in one language still shows up under the same category in another.

/// Key for personal tasks
pub const PERSONAL: &str = "personal";

/// Key for work tasks
pub const WORK: &str = "work";

/// Localised label fragments and the key they map to, scanned in order
const LABEL_KEYS: &[(&str, &str)] = &[
    // English
    ("personal", PERSONAL),
    ("work", WORK),
    // Indonesian
    ("pribadi", PERSONAL),
    ("kerja", WORK),
    // Japanese
    ("個人", PERSONAL),
    ("仕事", WORK),
];

/// Normalise a category label to its language-independent key
///
/// The label is trimmed and lowercased, then matched against the known
/// localised labels by substring. Unknown labels fall back to their trimmed
/// lowercase form, so two unknown labels still compare equal to each other.
///
/// Returns `None` for an absent or blank label.
///
/// # Examples
///
/// ```
/// use aspri::category::normalize_category;
///
/// assert_eq!(normalize_category(Some("  Kerja ")), Some("work".to_string()));
/// assert_eq!(normalize_category(Some("Hobby")), Some("hobby".to_string()));
/// assert_eq!(normalize_category(None), None);
/// ```
pub fn normalize_category(label: Option<&str>) -> Option<String> {
    let lowered = label?.trim().to_lowercase();
    if lowered.is_empty() {
        return None;
    }

    let key = LABEL_KEYS
        .iter()
        .find(|(fragment, _)| lowered.contains(fragment))
        .map(|(_, key)| (*key).to_string())
        .unwrap_or(lowered);

    Some(key)
}

/// Category key for a label, or an empty string when there is none
///
/// # Examples
///
/// ```
/// use aspri::category::category_key;
///
/// assert_eq!(category_key("Work"), category_key("仕事"));
/// assert_eq!(category_key(""), "");
/// ```
pub fn category_key(label: &str) -> String {
    normalize_category(Some(label)).unwrap_or_default()
}

/// Whether a task's category belongs under a filter category
///
/// Either side being absent or blank never matches, so tasks without a
/// category are excluded from every concrete category filter.
pub fn category_matches(task_category: Option<&str>, filter_category: Option<&str>) -> bool {
    match (
        normalize_category(task_category),
        normalize_category(filter_category),
    ) {
        (Some(task_key), Some(filter_key)) => task_key == filter_key,
        _ => false,
    }
}
