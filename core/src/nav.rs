//! Persistent header: mobile menu and the listing-type submenu.
//!
//! # Design
//! The two toggles are independent. The submenu closes when a click lands
//! outside it; the shell learns about clicks by subscribing to a
//! [`ClickBus`] on mount and dropping the [`Subscription`] on unmount, which
//! removes the listener.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::pages::Route;

/// Element id of the submenu container.
pub const SUBMENU_ELEMENT: &str = "listing-submenu";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavLink {
    pub label: &'static str,
    pub route: Route,
}

pub const NAV_LINKS: [NavLink; 6] = [
    NavLink { label: "TRANG CHỦ", route: Route::Home },
    NavLink { label: "GIỚI THIỆU", route: Route::About },
    NavLink { label: "MUA SẮM", route: Route::Shop },
    NavLink { label: "HÌNH ẢNH", route: Route::Gallery },
    NavLink { label: "FEEDBACK", route: Route::Feedback },
    NavLink { label: "TIN TỨC", route: Route::News },
];

pub const LISTING_OPTIONS: [NavLink; 2] = [
    NavLink { label: "Xe Điện", route: Route::NewVehicle },
    NavLink { label: "Pin", route: Route::NewBattery },
];

/// Where a click landed, as the chain of element ids from the root down to
/// the target.
#[derive(Debug, Clone, Default)]
pub struct ClickTarget {
    path: Vec<String>,
}

impl ClickTarget {
    pub fn new<I, S>(path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            path: path.into_iter().map(Into::into).collect(),
        }
    }

    /// True when the target is `element` or one of its descendants.
    pub fn is_inside(&self, element: &str) -> bool {
        self.path.iter().any(|id| id == element)
    }
}

type Listener = Rc<RefCell<dyn FnMut(&ClickTarget)>>;
type Listeners = RefCell<Vec<(u64, Listener)>>;

/// Document-level click dispatch.
///
/// Listeners may subscribe or drop their own [`Subscription`] while a click
/// is being dispatched. A listener added during dispatch first sees the next
/// click; one removed during dispatch is not called again.
#[derive(Default)]
pub struct ClickBus {
    listeners: Rc<Listeners>,
    next_id: Cell<u64>,
}

impl ClickBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: impl FnMut(&ClickTarget) + 'static) -> Subscription {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let listener: Listener = Rc::new(RefCell::new(listener));
        self.listeners.borrow_mut().push((id, listener));
        Subscription {
            id,
            listeners: Rc::downgrade(&self.listeners),
        }
    }

    pub fn dispatch(&self, target: &ClickTarget) {
        let snapshot: Vec<(u64, Listener)> = self.listeners.borrow().clone();
        for (id, listener) in snapshot {
            if !self.listeners.borrow().iter().any(|(live, _)| *live == id) {
                continue;
            }
            // A listener that dispatches from inside itself is skipped.
            if let Ok(mut listener) = listener.try_borrow_mut() {
                (*listener)(target);
            }
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}

/// Removes its listener from the bus when dropped.
pub struct Subscription {
    id: u64,
    listeners: Weak<Listeners>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.borrow_mut().retain(|(id, _)| *id != self.id);
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct MenuState {
    menu_open: bool,
    submenu_open: bool,
}

#[derive(Default)]
pub struct NavShell {
    state: Rc<Cell<MenuState>>,
    subscription: Option<Subscription>,
}

impl NavShell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the outside-click listener. Mounting twice is a no-op.
    pub fn mount(&mut self, bus: &ClickBus) {
        if self.subscription.is_some() {
            return;
        }
        let state = Rc::clone(&self.state);
        self.subscription = Some(bus.subscribe(move |target| {
            if !target.is_inside(SUBMENU_ELEMENT) {
                let mut s = state.get();
                s.submenu_open = false;
                state.set(s);
            }
        }));
    }

    pub fn unmount(&mut self) {
        self.subscription = None;
    }

    pub fn is_mounted(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn menu_open(&self) -> bool {
        self.state.get().menu_open
    }

    pub fn submenu_open(&self) -> bool {
        self.state.get().submenu_open
    }

    pub fn toggle_menu(&mut self) {
        self.update(|s| s.menu_open = !s.menu_open);
    }

    pub fn toggle_submenu(&mut self) {
        self.update(|s| s.submenu_open = !s.submenu_open);
    }

    /// Follows a nav link or submenu item; both menus close.
    pub fn select(&mut self, link: &NavLink) -> Route {
        self.update(|s| *s = MenuState::default());
        link.route
    }

    fn update(&mut self, f: impl FnOnce(&mut MenuState)) {
        let mut s = self.state.get();
        f(&mut s);
        self.state.set(s);
    }
}
