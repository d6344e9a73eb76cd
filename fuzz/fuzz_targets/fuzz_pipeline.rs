#![no_main]

use er_core::EngineConfig;
use er_engine::Pipeline;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(prompt) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(pipeline) = Pipeline::new(EngineConfig::default()) else {
        return;
    };

    // A fresh run, then the same prompt applied to its own output.
    let Ok(Some(first)) = pipeline.generate(prompt, None) else {
        return;
    };
    assert!(first.graph.validate().is_ok());

    if let Ok(Some(second)) = pipeline.generate(prompt, Some(&first.graph)) {
        assert!(second.graph.validate().is_ok());
        assert!(second.graph.nodes.len() >= first.graph.nodes.len());
        let _ = serde_json::to_string(&second);
    }
});
