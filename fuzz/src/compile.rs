#![no_main]

use libfuzzer_sys::fuzz_target;
use ssviewer::{Config, Engine, MemoryLoader};

fuzz_target!(|data: &str| {
    let config = Config::new("/fuzz", "fuzz").unwrap();
    let engine = Engine::with_loader(config, MemoryLoader::new());
    let _ = engine.compile_str("fuzz", data, true);
});
