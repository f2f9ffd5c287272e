use dualcom::core::codec::{
    decode_for_display, decode_hex_string, encode_as_hex_string, Codec, DECODE_ERROR_MARKER,
};
use dualcom::core::history::HistoryRing;
use dualcom::core::macros::MacroTable;
use dualcom::domain::config::MacroSlot;
use dualcom::domain::error::EncodingError;
use proptest::prelude::*;

proptest! {
    #[test]
    fn hex_rendering_parses_back(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
        let text = encode_as_hex_string(&bytes);
        prop_assert_eq!(decode_hex_string(&text).unwrap(), bytes);
    }

    #[test]
    fn hex_text_renders_back_normalized(
        pairs in proptest::collection::vec("[0-9a-fA-F]{2}", 0..32),
        spaced in any::<bool>(),
    ) {
        let text = pairs.join(if spaced { " " } else { "" });
        let rendered = encode_as_hex_string(&decode_hex_string(&text).unwrap());
        prop_assert_eq!(rendered, pairs.join(" ").to_uppercase());
    }

    #[test]
    fn odd_digit_count_is_rejected(digits in "[0-9a-fA-F]{1,31}") {
        prop_assume!(digits.len() % 2 == 1);
        let result = decode_hex_string(&digits);
        prop_assert!(matches!(result, Err(EncodingError::OddHexLength(n)) if n == digits.len()));
    }

    #[test]
    fn display_decoding_never_fails(bytes in proptest::collection::vec(any::<u8>(), 1..64)) {
        for codec in Codec::ALL {
            let text = decode_for_display(&bytes, false, codec.name());
            prop_assert!(!text.is_empty());
        }
        let text = decode_for_display(&bytes, false, "no-such-codec");
        prop_assert!(text.contains(DECODE_ERROR_MARKER));
    }

    #[test]
    fn utf8_text_survives_encode_decode(text in "\\PC{0,40}") {
        let bytes = Codec::Utf8.encode(&text);
        let (decoded, had_errors) = Codec::Utf8.decode(&bytes);
        prop_assert!(!had_errors);
        prop_assert_eq!(decoded, text);
    }

    #[test]
    fn history_is_bounded_and_unique(
        entries in proptest::collection::vec("[a-d]{1,2}", 0..60),
        capacity in 1usize..25,
    ) {
        let mut ring = HistoryRing::with_capacity(capacity);
        for entry in &entries {
            ring.record(entry.clone());
        }

        let list = ring.as_ordered_list();
        prop_assert!(list.len() <= capacity);
        let mut unique = list.clone();
        unique.sort();
        unique.dedup();
        prop_assert_eq!(unique.len(), list.len());
        if let Some(last) = entries.last() {
            prop_assert_eq!(&list[0], last);
        }
    }

    #[test]
    fn delete_keeps_table_size_and_order(
        contents in proptest::collection::vec("[A-Z]{1,6}", 1..40),
        pick in any::<prop::sample::Index>(),
    ) {
        let slots: Vec<MacroSlot> = contents
            .iter()
            .map(|c| MacroSlot::new("", c.clone(), false))
            .collect();
        let mut table = MacroTable::from_slots(slots, 40);
        let index = pick.index(contents.len());

        table.delete(index).unwrap();
        prop_assert_eq!(table.len(), 40);
        prop_assert!(table.slots()[39].is_unused());

        let mut expected = contents.clone();
        expected.remove(index);
        let remaining: Vec<String> = table
            .slots()
            .iter()
            .take(expected.len())
            .map(|s| s.content.clone())
            .collect();
        prop_assert_eq!(remaining, expected);
    }
}
