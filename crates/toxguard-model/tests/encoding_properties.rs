mod support;

use proptest::prelude::*;
use std::str::FromStr;
use tokenizers::Tokenizer;
use toxguard_model::TextEncoder;

fn encoder() -> TextEncoder {
    TextEncoder::new(Tokenizer::from_str(support::TOKENIZER).unwrap(), 128).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn encodings_always_have_fixed_length(texts in prop::collection::vec(".{0,600}", 1..6)) {
        let encoder = encoder();
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let batch = encoder.encode_batch(&refs).unwrap();

        prop_assert_eq!(batch.batch_size, texts.len());
        prop_assert_eq!(batch.seq_len, 128);
        prop_assert_eq!(batch.input_ids.len(), texts.len() * 128);
        prop_assert_eq!(batch.attention_mask.len(), texts.len() * 128);
        for row in 0..batch.batch_size {
            prop_assert_eq!(batch.row_ids(row).len(), 128);
            prop_assert!(batch.row_mask(row).iter().all(|&m| m <= 1));
        }
    }

    #[test]
    fn long_inputs_fill_the_mask(words in 200usize..400) {
        let text = "you are great ".repeat(words);
        let batch = encoder().encode_batch(&[text.as_str()]).unwrap();
        prop_assert!(batch.row_mask(0).iter().all(|&m| m == 1));
    }
}
