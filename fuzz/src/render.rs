#![no_main]

use std::collections::BTreeMap;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use serde::Serialize;
use ssviewer::{Config, Engine, MemoryLoader};

#[derive(Debug, Serialize, Arbitrary)]
#[serde(untagged)]
enum Value {
    None,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

fuzz_target!(|data: (&str, Vec<(&str, &str)>, Option<&str>, Value)| {
    let (main, includes, layout, value) = data;
    let mut loader = MemoryLoader::new().with("Page", main);
    for (name, source) in includes {
        loader.insert(format!("Includes/{name}"), source);
    }
    let templates: &[&str] = match layout {
        Some(layout) => {
            loader.insert("Layout/Page", layout);
            &["Page", "Page"]
        }
        None => &["Page"],
    };

    let config = Config::new("/fuzz", "fuzz").unwrap();
    let mut engine = Engine::with_loader(config, loader);
    engine.set_max_include_depth(8);

    let ctx = match ssviewer::to_value(&value) {
        Ok(ctx) => ctx,
        Err(_) => return,
    };
    let _ = engine.render(templates, ctx);
});
