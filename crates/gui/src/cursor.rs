//! Pointer cursor showing the hovered part and its color.
//!
//! Icon generation is pure: the same part and color always give the same
//! SVG. Installing the icon is the only side effect, and the controller
//! scopes it: the cursor in place before a hover starts is put back when
//! the hover ends, or when the controller itself is dropped.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use base64::Engine as _;
use shared::{Color, PartId};

use crate::state::customization::{CustomizationStore, StoreChange};
use crate::state::observers::Subscription;
use crate::viewport::hit_test::{HitTestRouter, HoverIntent};

/// Cursor icons are square, this many pixels wide
pub const CURSOR_SIZE: u32 = 64;

const RING: &str = r##"<path fill="rgba(255, 255, 255, 0.5)" d="M29.5 54C43.031 54 54 43.031 54 29.5S43.031 5 29.5 5 5 15.969 5 29.5 15.969 54 29.5 54z" stroke="#000"/>"##;
const ARROW: &str = r##"<path d="M2 2l11 2.947L4.947 13 2 2z" fill="#000"/>"##;
const SHADOW_FILTER: &str = r##"<filter id="shadow" x="6" y="8" width="47" height="47" filterUnits="userSpaceOnUse" color-interpolation-filters="sRGB"><feFlood flood-opacity="0" result="bg"/><feColorMatrix in="SourceAlpha" values="0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 127 0"/><feOffset dy="2"/><feGaussianBlur stdDeviation="3"/><feColorMatrix values="0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0.15 0"/><feBlend in2="bg" result="dropShadow"/><feBlend in="SourceGraphic" in2="dropShadow" result="shape"/></filter>"##;

/// SVG cursor icon with its click point
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CursorImage {
    pub svg: String,
    /// Click point in icon pixels (the arrow tip)
    pub hotspot: (u32, u32),
}

impl CursorImage {
    fn new(svg: String) -> Self {
        Self {
            svg,
            hotspot: (2, 2),
        }
    }

    /// `data:image/svg+xml;base64,...`
    pub fn data_uri(&self) -> String {
        format!(
            "data:image/svg+xml;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(self.svg.as_bytes())
        )
    }

    /// Value for a CSS `cursor` property
    pub fn css_value(&self) -> String {
        format!(
            "url('{}') {} {}, auto",
            self.data_uri(),
            self.hotspot.0,
            self.hotspot.1
        )
    }
}

/// Ring filled with `color` and labelled with the part name
pub fn hover_cursor(part: &PartId, color: &Color) -> CursorImage {
    let svg = format!(
        concat!(
            r#"<svg width="{size}" height="{size}" fill="none" xmlns="http://www.w3.org/2000/svg">"#,
            r#"<g clip-path="url(#clip)">{ring}"#,
            r#"<g filter="url(#shadow)"><path d="M29.5 47C39.165 47 47 39.165 47 29.5S39.165 12 29.5 12 12 19.835 12 29.5 19.835 47 29.5 47z" fill="{color}"/></g>"#,
            r#"{arrow}"#,
            r#"<text fill="{label}" font-family="Inter var, sans-serif" font-size="10" letter-spacing="-.01em"><tspan x="35" y="63">{name}</tspan></text>"#,
            r#"</g><defs><clipPath id="clip"><path fill="{clip}" d="M0 0h64v64H0z"/></clipPath>{filter}</defs></svg>"#,
        ),
        size = CURSOR_SIZE,
        ring = RING,
        color = color,
        arrow = ARROW,
        label = "#000",
        name = xml_escape(part.as_str()),
        clip = "#fff",
        filter = SHADOW_FILTER,
    );
    CursorImage::new(svg)
}

/// Ring and arrow only, shown when nothing is hovered
pub fn neutral_cursor() -> CursorImage {
    CursorImage::new(format!(
        r#"<svg width="{size}" height="{size}" fill="none" xmlns="http://www.w3.org/2000/svg">{RING}{ARROW}</svg>"#,
        size = CURSOR_SIZE,
    ))
}

fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum CursorStyle {
    /// Whatever the platform shows by default
    #[default]
    Default,
    Image(CursorImage),
}

/// Where cursor styles are installed
pub trait CursorHost {
    fn current(&self) -> CursorStyle;
    fn apply(&mut self, style: CursorStyle);
}

/// Host that only remembers what was applied
#[derive(Debug, Default)]
pub struct RecordingCursorHost {
    current: CursorStyle,
    pub history: Vec<CursorStyle>,
}

impl RecordingCursorHost {
    pub fn with_initial(style: CursorStyle) -> Self {
        Self {
            current: style,
            history: Vec::new(),
        }
    }
}

impl CursorHost for RecordingCursorHost {
    fn current(&self) -> CursorStyle {
        self.current.clone()
    }

    fn apply(&mut self, style: CursorStyle) {
        self.history.push(style.clone());
        self.current = style;
    }
}

struct Feedback<H> {
    host: H,
    hovered: Option<PartId>,
    /// Cursor to put back when the hover ends
    saved: Option<CursorStyle>,
}

impl<H: CursorHost> Feedback<H> {
    fn on_hover(&mut self, intent: &HoverIntent) {
        match intent {
            HoverIntent::Hovered { part, color } => {
                if self.saved.is_none() {
                    self.saved = Some(self.host.current());
                }
                self.hovered = Some(part.clone());
                self.host.apply(CursorStyle::Image(hover_cursor(part, color)));
            }
            HoverIntent::Cleared => self.release(),
        }
    }

    fn on_store(&mut self, change: &StoreChange) {
        if let StoreChange::ColorChanged { part, color } = change {
            if self.hovered.as_ref() == Some(part) {
                tracing::debug!("Hovered part '{part}' recolored, refreshing cursor");
                self.host.apply(CursorStyle::Image(hover_cursor(part, color)));
            }
        }
    }

    fn release(&mut self) {
        self.hovered = None;
        if let Some(previous) = self.saved.take() {
            self.host.apply(previous);
        }
    }
}

/// Keeps the host cursor in sync with hover and color changes
pub struct CursorFeedbackController<H: CursorHost + 'static> {
    feedback: Rc<RefCell<Feedback<H>>>,
    subscriptions: Vec<Subscription>,
}

impl<H: CursorHost + 'static> CursorFeedbackController<H> {
    pub fn new(host: H, router: &HitTestRouter, store: &CustomizationStore) -> Self {
        let feedback = Rc::new(RefCell::new(Feedback {
            host,
            hovered: None,
            saved: None,
        }));

        let weak: Weak<RefCell<Feedback<H>>> = Rc::downgrade(&feedback);
        let on_hover = router.on_hover(move |intent| {
            if let Some(feedback) = weak.upgrade() {
                feedback.borrow_mut().on_hover(intent);
            }
        });

        let weak = Rc::downgrade(&feedback);
        let on_store = store.subscribe(move |change| {
            if let Some(feedback) = weak.upgrade() {
                feedback.borrow_mut().on_store(change);
            }
        });

        Self {
            feedback,
            subscriptions: vec![on_hover, on_store],
        }
    }

    /// Part the cursor currently depicts
    pub fn hovered(&self) -> Option<PartId> {
        self.feedback.borrow().hovered.clone()
    }

    pub fn with_host<R>(&self, f: impl FnOnce(&H) -> R) -> R {
        f(&self.feedback.borrow().host)
    }
}

impl<H: CursorHost + 'static> Drop for CursorFeedbackController<H> {
    fn drop(&mut self) {
        for sub in &self.subscriptions {
            sub.unsubscribe();
        }
        if let Ok(mut feedback) = self.feedback.try_borrow_mut() {
            feedback.release();
        }
    }
}
