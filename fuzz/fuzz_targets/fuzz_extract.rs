#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(prompt) = std::str::from_utf8(data) else {
        return;
    };

    let _ = er_core::normalize_text(prompt);
    let _ = er_core::slugify(prompt, "x");
    let _ = er_core::to_snake_case(prompt);
    let _ = er_core::word_forms(&er_core::normalize_token(prompt));

    let intents = er_intent::extract_intents(prompt);
    for table in &intents.tables {
        assert!(!table.table.trim().is_empty());
    }
    for relation in &intents.relations {
        assert!(!relation.source.is_empty() && !relation.target.is_empty());
    }
    let _ = serde_json::to_string(&intents);
});
