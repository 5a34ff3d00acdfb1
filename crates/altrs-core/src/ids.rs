// Altrs Item Identifiers
// Shared id type and the sentinel ids used for wildcards and navigation

/// Identifier of a profile item (mode, app, page, source, region, rule)
pub type ItemId = i64;

/// Wildcard: a state field holding this id matches any concrete value
pub const DEFAULT_ID: ItemId = -1;

/// No item
pub const NONE_ID: ItemId = 0;

/// Navigate to the previous item (wraps around)
pub const PREVIOUS_ID: ItemId = -2;

/// Navigate to the next item (wraps around)
pub const NEXT_ID: ItemId = -3;

/// Navigate back to the item that was current before the last change
pub const LAST_USED_ID: ItemId = -4;

/// Returns true for ids that name a real item rather than a sentinel
pub fn is_concrete(id: ItemId) -> bool {
    id > 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinels_are_not_concrete() {
        for id in [DEFAULT_ID, NONE_ID, PREVIOUS_ID, NEXT_ID, LAST_USED_ID] {
            assert!(!is_concrete(id));
        }
        assert!(is_concrete(1));
    }
}
