//! Dropdown Demo
//!
//! A dropdown menu that closes when the user clicks anywhere outside it,
//! except on the toolbar that toggles it.
//!
//! Features demonstrated:
//! - `ClickOutside` component with an owned `OutsideBinding`
//! - Exclusion selectors and multiple trigger events loaded from TOML
//! - Attach/detach following the dropdown's open state
//!
//! Run with: RUST_LOG=clickaway=trace cargo run -p clickaway --example dropdown

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use clickaway::prelude::*;

const CONFIG: &str = r##"
triggerEvents = "click, keydown"
exclude = "#toolbar"
"##;

struct Dropdown {
    name: &'static str,
    open: Cell<bool>,
    binding: RefCell<Option<OutsideBinding<Dropdown>>>,
}

impl Dropdown {
    fn new(
        registry: &Rc<OutsideRegistry>,
        element: NodeId,
        config: OutsideConfig,
        name: &'static str,
    ) -> Rc<Self> {
        Rc::new_cyclic(|weak: &Weak<Dropdown>| Dropdown {
            name,
            open: Cell::new(false),
            binding: RefCell::new(Some(OutsideBinding::from_weak(
                registry,
                weak.clone(),
                element,
                config,
            ))),
        })
    }

    fn show(&self) {
        self.open.set(true);
        if let Some(binding) = self.binding.borrow().as_ref() {
            binding.attach();
        }
        tracing::info!(menu = self.name, "opened");
    }

    fn hide(&self) {
        self.open.set(false);
        if let Some(binding) = self.binding.borrow().as_ref() {
            binding.detach();
        }
        tracing::info!(menu = self.name, "closed");
    }
}

impl ClickOutside for Dropdown {
    fn on_click_outside(&self, event: &Event) {
        tracing::info!(
            menu = self.name,
            event_type = %event.event_type,
            "outside event, closing"
        );
        self.hide();
    }
}

struct Page {
    toolbar: NodeId,
    menu: NodeId,
    item: NodeId,
    content: NodeId,
}

fn build_page(host: &Host) -> clickaway::Result<Page> {
    let mut doc = host.document_mut();
    let root = doc.root();

    let toolbar = doc.append_element(root, "div")?;
    doc.set_id(toolbar, "toolbar")?;
    let menu = doc.append_element(root, "ul")?;
    doc.add_class(menu, "dropdown")?;
    let item = doc.append_element(menu, "li")?;
    let content = doc.append_element(root, "main")?;

    Ok(Page {
        toolbar,
        menu,
        item,
        content,
    })
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let host = Host::new();
    let page = build_page(&host)?;
    let config = OutsideConfig::from_toml_str(CONFIG).map_err(clickaway::ClickawayError::from)?;

    let registry = Rc::new(OutsideRegistry::new(host.clone()));
    let dropdown = Dropdown::new(&registry, page.menu, config, "file");

    dropdown.show();

    // Clicks inside the menu or on the toolbar keep it open
    host.click(page.item);
    host.click(page.toolbar);
    assert!(dropdown.open.get());

    // A keydown on the page content closes it
    host.dispatch(&Event::new(event_types::KEY_DOWN, page.content));
    assert!(!dropdown.open.get());

    // Closed dropdowns have no listeners left behind
    tracing::info!(
        listeners = host.events().listener_count(),
        stats = ?registry.stats(),
        "after close"
    );

    dropdown.show();
    dropdown.show();
    host.click(page.content);
    assert!(!dropdown.open.get());

    Ok(())
}
