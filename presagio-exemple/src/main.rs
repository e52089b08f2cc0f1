use presagio_core::model::ngram_table::NgramTable;
use presagio_core::model::suggester::{BackoffSuggester, SuggestOptions};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // Load the table from a listing (or the path given as first argument).
    // A .bin snapshot is written next to it and used on the next run
    let path = std::env::args().nth(1).unwrap_or_else(|| "./data/ngrams.tsv".to_owned());
    let table = NgramTable::open(&path)?;
    println!("Loaded {} contexts from {}", table.len(), path);

    // The order-1 fallback can be replaced, here with the five-word variant
    let table = table.with_unigrams(
        ["the", "to", "a", "i", "you"].iter().map(|w| w.to_string()).collect(),
    );

    // Three suggestions by default, best first
    let suggester = BackoffSuggester::new(table, SuggestOptions::default());

    let phrases = [
        "I want to",
        "So, I'm going to",
        "It was one of the",
        "Thank you",
        "zzz qqq",
        "",
    ];
    for phrase in phrases {
        println!("{:?} -> {:?}", phrase, suggester.suggest_default(phrase)?);
    }

    // An explicit count overrides the default one
    println!("{:?} -> {:?}", "I want to", suggester.suggest("I want to", 5)?);

    // Zero is allowed and always empty
    println!("{:?} -> {:?}", "I want to", suggester.suggest("I want to", 0)?);

    // Reversed output (best last)
    let reversed = BackoffSuggester::new(
        NgramTable::open(&path)?,
        SuggestOptions { max_results: 3, reverse: true },
    );
    println!("{:?} -> {:?} (reversed)", "I want to", reversed.suggest_default("I want to")?);

    Ok(())
}
