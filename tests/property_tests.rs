//! Property-based tests for rust_log_dispatcher using proptest

use proptest::prelude::*;
use rust_log_dispatcher::prelude::*;

fn any_level() -> impl Strategy<Value = Level> {
    (0u8..8).prop_map(|ordinal| Level::from_ordinal(ordinal).unwrap())
}

// ============================================================================
// Level Tests
// ============================================================================

proptest! {
    /// An entry passes a threshold exactly when its ordinal is not above it
    #[test]
    fn test_filter_matches_ordinals(level in any_level(), max in any_level()) {
        prop_assert_eq!(level.passes(max), level.ordinal() <= max.ordinal());
    }

    /// Level names parse back in any letter case
    #[test]
    fn test_level_name_roundtrip(level in any_level(), upper in any::<bool>()) {
        let name = if upper {
            level.to_str().to_uppercase()
        } else {
            level.to_str().to_lowercase()
        };
        prop_assert_eq!(name.parse::<Level>().unwrap(), level);
    }

    /// Ordering agrees with the ordinal
    #[test]
    fn test_level_ordering(a in any_level(), b in any_level()) {
        prop_assert_eq!(a <= b, a.ordinal() <= b.ordinal());
        prop_assert_eq!(a.cmp(&b), a.ordinal().cmp(&b.ordinal()));
    }

    /// Configuration accepts both the ordinal and the name
    #[test]
    fn test_level_deserializes_from_ordinal_and_name(level in any_level()) {
        let from_ordinal: Level = serde_json::from_str(&level.ordinal().to_string()).unwrap();
        let from_name: Level = serde_json::from_str(&format!("\"{}\"", level)).unwrap();
        prop_assert_eq!(from_ordinal, level);
        prop_assert_eq!(from_name, level);
    }

    #[test]
    fn test_invalid_ordinal_rejected(ordinal in 8u64..1000) {
        prop_assert!(serde_json::from_str::<Level>(&ordinal.to_string()).is_err());
    }
}

// ============================================================================
// Entry Tests
// ============================================================================

proptest! {
    /// No control characters that could forge extra log lines survive
    #[test]
    fn test_message_sanitization(message in ".*") {
        let entry = Entry::new(Level::Info, "app", message.as_str());
        prop_assert!(!entry.message.contains('\n'));
        prop_assert!(!entry.message.contains('\r'));
        prop_assert!(!entry.message.contains('\t'));
    }

    /// Messages without control characters are kept verbatim
    #[test]
    fn test_plain_messages_untouched(message in "[a-zA-Z0-9 .,:;!?-]*") {
        let entry = Entry::new(Level::Notice, "app", message.as_str());
        prop_assert_eq!(entry.message, message);
    }

    /// The default formatter always carries level, category and message
    #[test]
    fn test_default_formatter_layout(
        level in any_level(),
        category in "[a-z][a-z0-9_.]{0,15}",
        message in "[a-zA-Z0-9 ]{0,40}",
    ) {
        let logger = Logger::new().get_logger(category.as_str());
        let entry = Entry::new(level, category.as_str(), message.as_str());
        let formatted = (default_formatter())(&logger, &entry);
        let expected_suffix = format!(" [{}][{}] {}", level, category, message);
        prop_assert!(formatted.ends_with(&expected_suffix));
    }
}

// ============================================================================
// Filter Tests
// ============================================================================

proptest! {
    /// A trailing `*` matches every category sharing the prefix
    #[test]
    fn test_category_prefix_pattern(prefix in "[a-z]{1,8}", rest in "[a-z.]{0,8}") {
        let filter = Filter::default().with_categories([format!("{}*", prefix)]);
        let entry = Entry::new(Level::Info, format!("{}{}", prefix, rest), "m");
        prop_assert!(filter.allows(&entry));
    }

    /// Without a wildcard only the exact category matches
    #[test]
    fn test_category_exact_pattern(name in "[a-z]{1,8}", suffix in "[a-z]{1,4}") {
        let filter = Filter::default().with_categories([name.clone()]);
        prop_assert!(filter.allows(&Entry::new(Level::Info, name.as_str(), "m")));
        let longer = format!("{}{}", name, suffix);
        prop_assert!(!filter.allows(&Entry::new(Level::Info, longer, "m")));
    }
}

// ============================================================================
// Dispatch Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// The delivered sequence is exactly the filtered input sequence
    #[test]
    fn test_delivery_is_filtered_input(
        max in any_level(),
        calls in prop::collection::vec((any_level(), "[a-z]{1,6}"), 0..40),
    ) {
        let memory = MemoryTarget::new();
        let entries = memory.entries_handle();
        let logger = Logger::builder()
            .max_level(max)
            .buffer_size(4)
            .target(memory)
            .build();
        logger.open().unwrap();

        for (level, message) in &calls {
            logger.log(*level, message);
        }
        logger.close();

        let expected: Vec<(Level, String)> = calls
            .iter()
            .filter(|(level, _)| level.ordinal() <= max.ordinal())
            .cloned()
            .collect();
        let delivered: Vec<(Level, String)> = entries
            .lock()
            .iter()
            .map(|e| (e.level, e.message.clone()))
            .collect();
        prop_assert_eq!(delivered, expected);
    }
}
