mod helpers;

use std::fs;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use pretty_assertions::assert_eq;

use ssviewer::{
    value, Config, DefaultRequirements, Engine, ErrorKind, MemoryLoader, Placement, Requirements,
};

use crate::helpers::{Buffer, SlowLoader};

fn engine(loader: MemoryLoader) -> Engine {
    let config = Config::new("/var/www", "simple").unwrap();
    Engine::with_loader(config, loader)
}

#[test]
fn engine_debug() {
    let s = format!("{:?}", engine(MemoryLoader::new()));
    assert!(s.starts_with("Engine {"), "{s}");
}

#[test]
fn engine_send_and_sync() {
    let engine = Arc::new(engine(MemoryLoader::new().with("Page", "$Title")));
    let handles: Vec<_> = (0..4_i64)
        .map(|i| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || engine.render(&["Page"], value! { Title: i }).unwrap())
        })
        .collect();
    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), i.to_string());
    }
    assert_eq!(engine.cached_templates(), 1);
}

#[test]
fn engine_concurrent_first_compile_is_shared() {
    let loader = SlowLoader::new(
        MemoryLoader::new().with("Page", "<h1>$Title</h1>"),
        Duration::from_millis(20),
    );
    let config = Config::new("/var/www", "simple").unwrap();
    let engine = Arc::new(Engine::with_loader(config, loader));
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let engine = Arc::clone(&engine);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                engine.compile("Page", true).unwrap()
            })
        })
        .collect();
    let compiled: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    for template in &compiled[1..] {
        assert!(Arc::ptr_eq(&compiled[0], template));
    }
    assert_eq!(engine.cached_templates(), 1);
    assert!(Arc::ptr_eq(&compiled[0], &engine.compile("Page", true).unwrap()));
}

#[test]
fn engine_compile_is_cached() {
    let engine = engine(MemoryLoader::new().with("Page", "x"));
    let a = engine.compile("Page", true).unwrap();
    let b = engine.compile("Page", true).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(a.name(), "Page");
    assert_eq!(engine.cached_templates(), 1);

    engine.clear_cache();
    assert_eq!(engine.cached_templates(), 0);
    let c = engine.compile("Page", true).unwrap();
    assert!(!Arc::ptr_eq(&a, &c));
}

#[test]
fn engine_compile_str_is_not_cached() {
    let engine = engine(MemoryLoader::new().with("Includes/Footer", "f"));
    engine.compile_str("adhoc", "<% include Footer %>", true).unwrap();
    assert_eq!(engine.cached_templates(), 1);
}

#[test]
fn engine_render_not_found() {
    let err = engine(MemoryLoader::new()).render(&["Page"], value! {}).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    assert_eq!(err.to_string(), "template `Page` not found");
}

#[test]
fn engine_render_no_templates() {
    let result = engine(MemoryLoader::new()).render(&[], value! {}).unwrap();
    assert_eq!(result, "");
}

#[test]
fn engine_render_include() {
    let loader = MemoryLoader::new()
        .with("Page", "<% include Header %>|$Title|<% include Footer %>")
        .with("Includes/Header", "<header><% include Logo %></header>")
        .with("Includes/Logo", "[$SiteName]")
        .with("Includes/Footer", "<footer>$SiteName</footer>");
    let result = engine(loader)
        .render(&["Page"], value! { Title: "Home", SiteName: "Example" })
        .unwrap();
    assert_eq!(
        result,
        "<header>[Example]</header>|Home|<footer>Example</footer>"
    );
}

#[test]
fn engine_render_include_uses_current_scope() {
    let loader = MemoryLoader::new()
        .with("Page", "<% loop $Children %><% include Item %><% end_loop %>")
        .with("Includes/Item", "<li>$Title</li>");
    let result = engine(loader)
        .render(&["Page"], value! { Children: [{ Title: "a" }, { Title: "b" }] })
        .unwrap();
    assert_eq!(result, "<li>a</li><li>b</li>");
}

#[test]
fn engine_render_include_is_shared() {
    let loader = MemoryLoader::new()
        .with("A", "<% include Footer %>")
        .with("B", "<% include Footer %>")
        .with("Includes/Footer", "f");
    let engine = engine(loader);
    engine.compile("A", true).unwrap();
    engine.compile("B", true).unwrap();
    assert_eq!(engine.cached_templates(), 3);
}

#[test]
fn engine_render_err_include_depth() {
    let loader = MemoryLoader::new()
        .with("Page", "<% include Loop %>")
        .with("Includes/Loop", "x<% include Loop %>");
    let mut engine = engine(loader);
    engine.set_max_include_depth(4);
    let err = engine.render(&["Page"], value! {}).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Compile);
    assert!(
        err.to_string().ends_with("reached maximum include depth (4)"),
        "{err}"
    );
}

#[test]
fn engine_render_err_in_include_has_include_location() {
    let loader = MemoryLoader::new()
        .with("Page", "line one\n<% include Broken %>")
        .with("Includes/Broken", "\n\n<% if %>");
    let err = engine(loader).render(&["Page"], value! {}).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Compile);
    let location = err.location().unwrap();
    assert_eq!((location.file(), location.line()), ("Page", 2));

    let inner = std::error::Error::source(&err)
        .and_then(|e| e.downcast_ref::<ssviewer::Error>())
        .unwrap();
    assert_eq!(inner.kind(), ErrorKind::Parse);
    let location = inner.location().unwrap();
    assert_eq!((location.file(), location.line()), ("Includes/Broken", 3));
}

#[test]
fn engine_render_layout() {
    let loader = MemoryLoader::new()
        .with(
            "Page",
            "<html><head></head><body>$Layout<% require javascript('page.js') %></body></html>",
        )
        .with(
            "Layout/Page",
            r#"<main>$Title<% require css("layout.css") %></main>"#,
        );
    let result = engine(loader)
        .render(&["Page", "Page"], value! { Title: "Home" })
        .unwrap();
    assert_eq!(
        result,
        concat!(
            "<html><head>",
            r#"<link rel="stylesheet" type="text/css" href="layout.css" />"#,
            "</head><body><main>Home</main>",
            r#"<script type="text/javascript" src="page.js"></script>"#,
            "</body></html>",
        )
    );
}

#[test]
fn engine_render_layout_in_expression() {
    let loader = MemoryLoader::new()
        .with("Page", "<% if $Layout %>[$Layout]<% else %>none<% end_if %>")
        .with("Layout/Full", "full")
        .with("Layout/Empty", "");
    let engine = engine(loader);
    let result = engine.render(&["Page", "Full"], value! {}).unwrap();
    assert_eq!(result, "[full]");
    let result = engine.render(&["Page", "Empty"], value! {}).unwrap();
    assert_eq!(result, "none");
}

#[test]
fn engine_render_with_custom_requirements() {
    let loader = MemoryLoader::new().with(
        "Page",
        "<html><head></head><body><% require javascript('app.js') %></body></html>",
    );
    let mut requirements = DefaultRequirements::new();
    requirements.add_custom_css("p { color: red }", "red");
    requirements.add_custom_css("p { color: blue }", "red");
    requirements.add_custom_javascript("init()", Placement::Head, "");
    let result = engine(loader)
        .render_with(&["Page"], value! {}, &mut requirements)
        .unwrap();
    assert_eq!(
        result,
        concat!(
            "<html><head>",
            "<style>p { color: red }</style>",
            r#"<script type="text/javascript">init()</script>"#,
            "</head><body>",
            r#"<script type="text/javascript" src="app.js"></script>"#,
            "</body></html>",
        )
    );
}

#[test]
fn engine_render_to_writer() {
    let engine = engine(MemoryLoader::new().with("Page", "Hello $Name"));
    let mut buf = Buffer::unbounded();
    engine
        .render_to_writer(
            &mut buf,
            &["Page"],
            value! { Name: "World" },
            &mut DefaultRequirements::new(),
        )
        .unwrap();
    assert_eq!(buf.contents(), "Hello World");
}

#[test]
fn engine_render_to_writer_err_short_write() {
    let engine = engine(MemoryLoader::new().with("Page", "Hello $Name"));
    let mut buf = Buffer::with_capacity(3);
    let err = engine
        .render_to_writer(
            &mut buf,
            &["Page"],
            value! { Name: "World" },
            &mut DefaultRequirements::new(),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    assert_eq!(buf.contents(), "Hel");
}

#[test]
fn engine_render_to_writer_err_render_writes_nothing() {
    let loader = MemoryLoader::new().with("Page", "before<% loop $Title %>x<% end_loop %>");
    let engine = engine(loader);
    let mut buf = Buffer::unbounded();
    let err = engine
        .render_to_writer(
            &mut buf,
            &["Page"],
            value! { Title: "Home" },
            &mut DefaultRequirements::new(),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EvalType);
    assert_eq!(buf.writes(), 0);
}

#[test]
fn engine_file_loader() {
    let root = std::env::temp_dir().join(format!("ssviewer-engine-{}", std::process::id()));
    let dir = root.join("themes/simple/templates");
    fs::create_dir_all(dir.join("Includes")).unwrap();
    fs::create_dir_all(dir.join("Layout")).unwrap();
    fs::write(dir.join("Page.ss"), "<body>$Layout</body>").unwrap();
    fs::write(dir.join("Layout/Page.ss"), "<% include Nav %>$Title").unwrap();
    fs::write(dir.join("Includes/Nav.ss"), "<nav></nav>").unwrap();

    let config = Config::new(root.to_str().unwrap(), "simple").unwrap();
    let engine = Engine::new(config);
    let result = engine.render(&["Page", "Page"], value! { Title: "Home" });
    fs::remove_dir_all(&root).unwrap();

    assert_eq!(result.unwrap(), "<body><nav></nav>Home</body>");
}
