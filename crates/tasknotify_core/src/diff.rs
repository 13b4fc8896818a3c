use crate::structure::TemplateFieldSet;

/// Returns the fields of `current` that were added or changed relative to
/// `previous`. An empty `previous` means everything in `current` is new.
/// Fields removed between the two revisions are not reported.
pub fn diff_fields(previous: &TemplateFieldSet, current: &TemplateFieldSet) -> TemplateFieldSet {
    if previous.is_empty() {
        return current.clone();
    }

    let mut diff = current.clone();
    for (key, old_value) in previous {
        if let Some(new_value) = current.get(key)
            && values_equal(old_value, new_value)
        {
            diff.remove(key);
        }
    }
    diff
}

/// Exact text equality, loosened only for numeric-looking values, which
/// compare by value ("07" and "7" are the same assignment).
fn values_equal(left: &str, right: &str) -> bool {
    if left == right {
        return true;
    }
    if let (Ok(left), Ok(right)) = (left.trim().parse::<f64>(), right.trim().parse::<f64>()) {
        return left == right;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::diff_fields;
    use crate::structure::TemplateFieldSet;

    fn fields(pairs: &[(&str, &str)]) -> TemplateFieldSet {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn empty_previous_returns_current_whole() {
        let current = fields(&[("assignees", "alice"), ("status", "open")]);
        assert_eq!(diff_fields(&TemplateFieldSet::new(), &current), current);
    }

    #[test]
    fn identical_mappings_diff_to_empty() {
        let mapping = fields(&[("assignees", "alice"), ("status", "open")]);
        assert!(diff_fields(&mapping, &mapping).is_empty());
    }

    #[test]
    fn only_changed_and_added_keys_survive() {
        let previous = fields(&[("assignees", "alice"), ("status", "open"), ("due", "friday")]);
        let current = fields(&[
            ("assignees", "alice,bob"),
            ("status", "open"),
            ("priority", "high"),
        ]);
        let diff = diff_fields(&previous, &current);
        assert_eq!(
            diff,
            fields(&[("assignees", "alice,bob"), ("priority", "high")])
        );
    }

    #[test]
    fn removed_keys_are_not_reported() {
        let previous = fields(&[("assignees", "alice"), ("due", "friday")]);
        let current = fields(&[("assignees", "alice")]);
        assert!(diff_fields(&previous, &current).is_empty());
    }

    #[test]
    fn diff_values_come_from_current() {
        let previous = fields(&[("status", "open")]);
        let current = fields(&[("status", "closed")]);
        let diff = diff_fields(&previous, &current);
        assert_eq!(diff.get("status").map(String::as_str), Some("closed"));
    }

    #[test]
    fn numeric_values_compare_by_value() {
        let previous = fields(&[("priority", "07"), ("due", " 7 ")]);
        let current = fields(&[("priority", "7"), ("due", "7")]);
        assert!(diff_fields(&previous, &current).is_empty());
    }

    #[test]
    fn whitespace_change_in_text_counts_as_a_change() {
        let previous = fields(&[("status", " open ")]);
        let current = fields(&[("status", "open")]);
        let diff = diff_fields(&previous, &current);
        assert_eq!(diff.get("status").map(String::as_str), Some("open"));
    }
}
