//! End-to-end tests over the public API: training, persistence and the
//! properties every trained tokenizer must hold.

use bytepair::{Tokenizer, TokenizerError, TrainConfig};
use proptest::prelude::*;
use std::fs;

const CORPUS: &str = "\
The spice must flow. The spice extends life. The spice expands consciousness.
He who controls the spice controls the universe.
Fear is the mind-killer. Fear is the little-death that brings total obliteration.
Ünïcödé tèxt, 日本語のテキスト, emoji 🦀🦀 and tabs\tand\tmore tabs.
";

fn trained(vocab_size: usize) -> Tokenizer {
    let mut tokenizer = Tokenizer::new();
    tokenizer.train(CORPUS, vocab_size).unwrap();
    tokenizer
}

#[test]
fn test_vocab_is_consistent_with_merges() {
    let tokenizer = trained(400);
    let vocab = tokenizer.vocab();

    for id in 0..256u32 {
        assert_eq!(vocab.get(id), Some(&[id as u8][..]));
    }
    for rule in tokenizer.merges() {
        let mut expected = vocab.get(rule.pair.0).unwrap().to_vec();
        expected.extend_from_slice(vocab.get(rule.pair.1).unwrap());
        assert_eq!(vocab.get(rule.id).unwrap(), expected.as_slice());
    }
    assert_eq!(tokenizer.vocab_size(), 256 + tokenizer.merges().len());
}

#[test]
fn test_encode_reproduces_training_tokens() {
    let tokenizer = trained(300);
    let ids = tokenizer.encode(CORPUS);

    assert!(ids.len() < CORPUS.len());
    assert!(ids.iter().all(|&id| tokenizer.vocab().contains(id)));
    assert_eq!(tokenizer.decode(&ids).unwrap(), CORPUS);
}

#[test]
fn test_more_merges_compress_better() {
    let small = trained(280).encode(CORPUS).len();
    let large = trained(400).encode(CORPUS).len();
    assert!(large < small);
}

#[test]
fn test_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let mut tokenizer = trained(350);
    tokenizer.set_pattern(r"'s|'t|\p{L}+|\p{N}+").unwrap();
    tokenizer
        .register_special_tokens(&["<|endoftext|>", "<|im start|>"])
        .unwrap();

    let model_path = tokenizer.save(dir.path().join("dune")).unwrap();
    assert_eq!(model_path, dir.path().join("dune.model"));
    assert!(dir.path().join("dune.vocab").exists());

    let restored = Tokenizer::load(&model_path).unwrap();
    assert_eq!(restored.merges(), tokenizer.merges());
    assert_eq!(restored.special_tokens(), tokenizer.special_tokens());
    assert_eq!(restored.pattern(), tokenizer.pattern());
    assert_eq!(restored.vocab(), tokenizer.vocab());

    for line in CORPUS.lines() {
        let ids = tokenizer.encode(line);
        assert_eq!(restored.encode(line), ids);
        assert_eq!(restored.decode(&ids).unwrap(), line);
    }
    let eot = restored.special_token_id("<|endoftext|>").unwrap();
    assert_eq!(restored.decode(&[eot]).unwrap(), "<|endoftext|>");
}

#[test]
fn test_vocab_listing_has_one_line_per_entry() {
    let dir = tempfile::tempdir().unwrap();
    let tokenizer = trained(300);
    tokenizer.save(dir.path().join("tok")).unwrap();

    let listing = fs::read_to_string(dir.path().join("tok.vocab")).unwrap();
    assert_eq!(listing.lines().count(), 300);
    assert!(listing.lines().nth(256).unwrap().contains(" -> "));
}

#[test]
fn test_load_rejects_wrong_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("old.model");
    fs::write(&path, "sentencepiece v3\n\n0\n97 97\n").unwrap();

    assert!(matches!(
        Tokenizer::load(&path),
        Err(TokenizerError::Format { line: 1, .. })
    ));
}

#[test]
fn test_load_rejects_non_integer_merge() {
    let mut model = trained(270).to_model_string();
    model.push_str("101 e\n");

    assert!(matches!(
        Tokenizer::from_model_str(&model),
        Err(TokenizerError::Format { .. })
    ));
}

#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        Tokenizer::load(dir.path().join("nope.model")),
        Err(TokenizerError::Io(_))
    ));
}

#[test]
fn test_shared_across_threads() {
    let tokenizer = trained(320);
    let lines: Vec<&str> = CORPUS.lines().collect();

    let shared = &tokenizer;
    let results: Vec<Vec<u32>> = std::thread::scope(|scope| {
        let handles: Vec<_> = lines
            .iter()
            .map(|&line| scope.spawn(move || shared.encode(line)))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for (line, ids) in lines.iter().zip(&results) {
        assert_eq!(&tokenizer.encode(line), ids);
    }
    assert_eq!(tokenizer.encode_batch(&lines), results);
}

#[test]
fn test_progress_reports_every_merge() {
    let mut tokenizer = Tokenizer::new();
    let mut last = 0;
    tokenizer
        .train_with_config(CORPUS, &TrainConfig::new(300).with_log_interval(0), |p| {
            assert_eq!(p.merge_index, last);
            assert!(p.count >= 1);
            last += 1;
        })
        .unwrap();
    assert_eq!(last, 44);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_training_is_deterministic(text in "[abc ]{0,60}", extra in 0usize..24) {
        let size = 256 + extra;
        let mut first = Tokenizer::new();
        let mut second = Tokenizer::new();

        match (first.train(&text, size), second.train(&text, size)) {
            (Ok(()), Ok(())) => {
                prop_assert_eq!(first.merges(), second.merges());
                prop_assert_eq!(first.vocab(), second.vocab());
            }
            (Err(a), Err(b)) => prop_assert_eq!(a.to_string(), b.to_string()),
            _ => prop_assert!(false, "runs disagreed on {:?}", text),
        }
    }

    #[test]
    fn prop_failed_training_never_exceeds_text(text in "[ab]{0,12}", extra in 0usize..24) {
        let mut tokenizer = Tokenizer::new();
        match tokenizer.train(&text, 256 + extra) {
            Ok(()) => prop_assert_eq!(tokenizer.vocab_size(), 256 + extra),
            Err(TokenizerError::EmptyVocabulary { requested, reached }) => {
                prop_assert_eq!(requested, 256 + extra);
                prop_assert!(reached < requested);
                // nothing learned on failure
                prop_assert!(tokenizer.merges().is_empty());
            }
            Err(other) => prop_assert!(false, "unexpected error {}", other),
        }
    }

    #[test]
    fn prop_roundtrip_any_string(text in any::<String>()) {
        let tokenizer = trained(330);
        let ids = tokenizer.encode(&text);

        prop_assert!(ids.len() <= text.len());
        prop_assert_eq!(ids.is_empty(), text.is_empty());
        prop_assert_eq!(tokenizer.decode(&ids).unwrap(), text);
    }

    #[test]
    fn prop_roundtrip_any_bytes(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
        let tokenizer = trained(330);
        let ids = tokenizer.encode_bytes(&bytes);
        prop_assert_eq!(tokenizer.decode_bytes(&ids).unwrap(), bytes);
    }

    #[test]
    fn prop_persistence_preserves_encoding(text in "\\PC{0,40}") {
        let tokenizer = trained(300);
        let restored = Tokenizer::from_model_str(&tokenizer.to_model_string()).unwrap();
        prop_assert_eq!(restored.encode(&text), tokenizer.encode(&text));
    }
}
