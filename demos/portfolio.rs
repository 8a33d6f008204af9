//! Portfolio Demo - A full page driven by the in-memory host
//!
//! Builds a small portfolio page, mounts every behavior on it and walks
//! through a visit: load, scroll down through the sections, open the menu,
//! switch theme, submit the contact form.
//!
//! Run with: cargo run --example portfolio
//! Set RUST_LOG=spark_folio=debug for component logs.

use std::rc::Rc;

use spark_folio::{
    mount, Document, FolioConfig, ManualScheduler, ManualViewport, MemoryPage, MemoryStore,
    PageEvent, PageHost, Window,
};
use tracing_subscriber::EnvFilter;

fn build_page() -> Rc<MemoryPage> {
    let page = Rc::new(MemoryPage::new(800.0));
    page.element("html");
    page.element("body");
    page.element("loadingOverlay");
    page.element("navbar").at(0.0, 70.0);
    page.element("menuToggle");
    page.element("navLinks");
    page.element("themeToggle");
    page.element("themeIcon");
    page.element("backToTop");

    for (i, section) in ["home", "about", "projects", "contact"].into_iter().enumerate() {
        page.element(section).at(i as f32 * 900.0, 900.0).class("reveal");
        page.element(format!("link-{section}"))
            .class("nav-link")
            .attr("href", &format!("#{section}"));
    }
    page.element("typed").at(300.0, 40.0);
    page.element("projects-count")
        .at(1900.0, 40.0)
        .class("reveal")
        .class("counter")
        .attr("data-target", "24");

    page.element("contactForm").at(2900.0, 400.0);
    page.element("name").attr("value", "Ada");
    page.element("email").attr("value", "ada@example.com");
    page.element("message").attr("value", "Loved the projects section!");
    page
}

fn main() -> spark_folio::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== spark-folio Portfolio Demo ===\n");

    let page = build_page();
    let clock = Rc::new(ManualScheduler::new());
    let viewport = Rc::new(ManualViewport::new());
    let host = PageHost {
        document: page.clone(),
        window: page.clone(),
        scheduler: clock.clone(),
        viewport: Some(viewport.clone()),
        store: Rc::new(MemoryStore::new()),
    };

    let handle = mount(host, &FolioConfig::default())?;
    handle.dispatch(PageEvent::Loaded);
    viewport.scan(&*page, &*page);

    // Typewriter and loading overlay run on the virtual clock
    for _ in 0..6 {
        clock.advance(250);
        println!(
            "t={:>5}ms  typed={:?}",
            clock.now(),
            handle.typewriter().map(|t| t.text()).unwrap_or_default()
        );
    }
    println!("loading overlay: {:?}\n", handle.loading().map(|l| l.stage()));

    for y in [600.0, 1500.0, 2400.0] {
        page.set_scroll_y(y);
        handle.dispatch(PageEvent::Scrolled);
        viewport.scan(&*page, &*page);
        clock.advance(300);
        println!(
            "scroll={:>6}  active={:?}  revealed={}  chrome={:?}",
            y,
            handle.sections().active().map(|s| s.to_string()),
            handle.reveal().revealed_count(),
            handle.chrome()
        );
    }

    clock.advance(3000);
    println!("\nprojects counter: {:?}", page.text(&"projects-count".into()));

    handle.dispatch(PageEvent::Click("menuToggle".into()));
    println!("menu open: {:?}", handle.navigation().map(|n| n.is_menu_open()));
    handle.dispatch(PageEvent::Click("link-about".into()));
    println!("after link click, scroll_y={} menu open: {:?}", page.scroll_y(), handle.navigation().map(|n| n.is_menu_open()));

    handle.dispatch(PageEvent::Click("themeToggle".into()));
    println!("theme: {:?}", handle.theme().map(|t| t.mode()));

    handle.dispatch(PageEvent::Submit("contactForm".into()));
    println!("alerts: {:?}", page.alerts());

    handle.unmount();
    println!("\nunmounted, timers pending: {}", clock.pending());
    Ok(())
}
