//! Host page abstraction
//!
//! The widget never touches a real DOM directly. Everything it needs from the
//! page goes through [`Surface`]; [`Document`] is the in-memory page used by
//! the console host and by tests.

use crate::escape::escape_html;
use crate::view::MessageNode;
use crate::widget::{
    Binding, Skeleton, ERROR_BANNER_ID, INPUT_ID, MESSAGES_ID, PENDING_ID, SEND_BUTTON_ID,
    TRIGGER_ID, WINDOW_ID,
};
use std::fmt::Write;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Operations the widget performs on its host page
pub trait Surface: Send {
    /// Whether an element with this id exists on the page
    fn has_element(&self, id: &str) -> bool;

    /// Inject the widget structure
    fn inject(&mut self, skeleton: &Skeleton);

    /// Wire a UI trigger to the widget
    fn bind(&mut self, binding: Binding);

    fn set_window_open(&mut self, open: bool);

    fn focus(&mut self, id: &str);

    fn set_input_value(&mut self, value: &str);

    fn set_pending_visible(&mut self, visible: bool);

    /// Show `Some(text)` in the error banner or hide it with `None`
    fn set_error_banner(&mut self, text: Option<&str>);

    fn append_message(&mut self, node: MessageNode);

    /// Largest scroll offset of the message container
    fn max_scroll_offset(&self) -> u32;

    fn set_scroll_offset(&mut self, offset: u32);
}

// ============================================================================
// Shared surfaces
// ============================================================================

fn lock<S>(surface: &Mutex<S>) -> MutexGuard<'_, S> {
    surface.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<S: Surface> Surface for Arc<Mutex<S>> {
    fn has_element(&self, id: &str) -> bool {
        lock(self).has_element(id)
    }

    fn inject(&mut self, skeleton: &Skeleton) {
        lock(self).inject(skeleton);
    }

    fn bind(&mut self, binding: Binding) {
        lock(self).bind(binding);
    }

    fn set_window_open(&mut self, open: bool) {
        lock(self).set_window_open(open);
    }

    fn focus(&mut self, id: &str) {
        lock(self).focus(id);
    }

    fn set_input_value(&mut self, value: &str) {
        lock(self).set_input_value(value);
    }

    fn set_pending_visible(&mut self, visible: bool) {
        lock(self).set_pending_visible(visible);
    }

    fn set_error_banner(&mut self, text: Option<&str>) {
        lock(self).set_error_banner(text);
    }

    fn append_message(&mut self, node: MessageNode) {
        lock(self).append_message(node);
    }

    fn max_scroll_offset(&self) -> u32 {
        lock(self).max_scroll_offset()
    }

    fn set_scroll_offset(&mut self, offset: u32) {
        lock(self).set_scroll_offset(offset);
    }
}

// ============================================================================
// In-memory document
// ============================================================================

/// Rendered height of one conversation entry, in pixels
pub const MESSAGE_ROW_HEIGHT: u32 = 48;

const DEFAULT_VIEWPORT_HEIGHT: u32 = 400;

/// One injected copy of the widget
#[derive(Debug, Clone)]
struct WidgetDom {
    skeleton: Skeleton,
    open: bool,
    input: String,
    pending: bool,
    banner: Option<String>,
    messages: Vec<MessageNode>,
    scroll_offset: u32,
}

impl WidgetDom {
    fn new(skeleton: &Skeleton) -> Self {
        Self {
            skeleton: skeleton.clone(),
            open: false,
            input: String::new(),
            pending: false,
            banner: None,
            messages: Vec::new(),
            scroll_offset: 0,
        }
    }

    fn row_count(&self) -> u32 {
        let greeting = u32::from(!self.skeleton.greeting.is_empty());
        u32::try_from(self.messages.len())
            .unwrap_or(u32::MAX)
            .saturating_add(greeting)
    }
}

/// In-memory host page
#[derive(Debug, Clone)]
pub struct Document {
    /// Ids of elements that belong to the host page itself
    host_elements: Vec<String>,
    widgets: Vec<WidgetDom>,
    bindings: Vec<Binding>,
    focused: Option<String>,
    viewport_height: u32,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            host_elements: Vec::new(),
            widgets: Vec::new(),
            bindings: Vec::new(),
            focused: None,
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
        }
    }

    /// Add a pre-existing element to the page, e.g. markup left by an earlier navigation
    #[must_use]
    pub fn with_element(mut self, id: impl Into<String>) -> Self {
        self.host_elements.push(id.into());
        self
    }

    #[must_use]
    pub fn with_viewport_height(mut self, height: u32) -> Self {
        self.viewport_height = height;
        self
    }

    /// Number of elements carrying `id`
    pub fn element_count(&self, id: &str) -> usize {
        let host = self.host_elements.iter().filter(|e| *e == id).count();
        let widget = if is_widget_element(id) {
            self.widgets.len()
        } else {
            0
        };
        host + widget
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn focused(&self) -> Option<&str> {
        self.focused.as_deref()
    }

    pub fn is_window_open(&self) -> bool {
        self.widget().is_some_and(|w| w.open)
    }

    pub fn input_value(&self) -> &str {
        self.widget().map_or("", |w| w.input.as_str())
    }

    pub fn is_pending_visible(&self) -> bool {
        self.widget().is_some_and(|w| w.pending)
    }

    pub fn error_banner(&self) -> Option<&str> {
        self.widget().and_then(|w| w.banner.as_deref())
    }

    pub fn messages(&self) -> &[MessageNode] {
        self.widget()
            .map(|w| w.messages.as_slice())
            .unwrap_or_default()
    }

    pub fn scroll_offset(&self) -> u32 {
        self.widget().map_or(0, |w| w.scroll_offset)
    }

    /// Render every injected widget as HTML
    pub fn to_html(&self) -> String {
        let mut html = String::new();
        for widget in &self.widgets {
            render_widget(&mut html, widget);
        }
        html
    }

    fn widget(&self) -> Option<&WidgetDom> {
        self.widgets.first()
    }

    fn widget_mut(&mut self) -> Option<&mut WidgetDom> {
        let widget = self.widgets.first_mut();
        if widget.is_none() {
            tracing::debug!("Surface operation before the widget was injected");
        }
        widget
    }
}

fn is_widget_element(id: &str) -> bool {
    [
        TRIGGER_ID,
        WINDOW_ID,
        MESSAGES_ID,
        INPUT_ID,
        SEND_BUTTON_ID,
        PENDING_ID,
        ERROR_BANNER_ID,
    ]
    .contains(&id)
}

impl Surface for Document {
    fn has_element(&self, id: &str) -> bool {
        self.element_count(id) > 0
    }

    fn inject(&mut self, skeleton: &Skeleton) {
        self.widgets.push(WidgetDom::new(skeleton));
    }

    fn bind(&mut self, binding: Binding) {
        self.bindings.push(binding);
    }

    fn set_window_open(&mut self, open: bool) {
        if let Some(widget) = self.widget_mut() {
            widget.open = open;
        }
    }

    fn focus(&mut self, id: &str) {
        self.focused = Some(id.to_string());
    }

    fn set_input_value(&mut self, value: &str) {
        if let Some(widget) = self.widget_mut() {
            widget.input = value.to_string();
        }
    }

    fn set_pending_visible(&mut self, visible: bool) {
        if let Some(widget) = self.widget_mut() {
            widget.pending = visible;
        }
    }

    fn set_error_banner(&mut self, text: Option<&str>) {
        if let Some(widget) = self.widget_mut() {
            widget.banner = text.map(str::to_string);
        }
    }

    fn append_message(&mut self, node: MessageNode) {
        if let Some(widget) = self.widget_mut() {
            widget.messages.push(node);
        }
    }

    fn max_scroll_offset(&self) -> u32 {
        self.widget().map_or(0, |w| {
            w.row_count()
                .saturating_mul(MESSAGE_ROW_HEIGHT)
                .saturating_sub(self.viewport_height)
        })
    }

    fn set_scroll_offset(&mut self, offset: u32) {
        let max = self.max_scroll_offset();
        if let Some(widget) = self.widget_mut() {
            widget.scroll_offset = offset.min(max);
        }
    }
}

// ============================================================================
// HTML rendering
// ============================================================================

fn display(visible: bool) -> &'static str {
    if visible {
        ""
    } else {
        " style=\"display: none;\""
    }
}

fn render_widget(html: &mut String, widget: &WidgetDom) {
    let skeleton = &widget.skeleton;
    // Writing into a String cannot fail
    let _ = write!(
        html,
        "<div id=\"{TRIGGER_ID}\" title=\"{}\"></div>\n\
         <div id=\"{WINDOW_ID}\"{}>\n\
         <div class=\"nexchat-header\"><span>{}</span>\
         <button class=\"nexchat-close-btn\" title=\"Close Chat\">&times;</button></div>\n\
         <div id=\"{MESSAGES_ID}\">\n",
        escape_html(&skeleton.trigger_tooltip),
        if widget.open { " class=\"open\"" } else { "" },
        escape_html(&skeleton.title),
    );

    if !skeleton.greeting.is_empty() {
        let _ = writeln!(
            html,
            "<div class=\"nexchat-message bot\">{}</div>",
            escape_html(&skeleton.greeting)
        );
    }

    for node in &widget.messages {
        let error = if node.is_error { " error" } else { "" };
        let _ = writeln!(
            html,
            "<div id=\"msg-{}\" class=\"nexchat-message {}{error}\">{}<span class=\"timestamp\">{}</span></div>",
            node.id,
            node.sender.css_class(),
            node.body_html,
            node.timestamp,
        );
    }

    let _ = write!(
        html,
        "</div>\n\
         <div id=\"{PENDING_ID}\"{}>{}</div>\n\
         <div id=\"{ERROR_BANNER_ID}\"{}>{}</div>\n\
         <div class=\"nexchat-input-area\">\
         <input type=\"text\" id=\"{INPUT_ID}\" placeholder=\"{}\" value=\"{}\">\
         <button id=\"{SEND_BUTTON_ID}\">Send</button></div>\n\
         </div>\n",
        display(widget.pending),
        escape_html(&skeleton.pending_label),
        display(widget.banner.is_some()),
        escape_html(widget.banner.as_deref().unwrap_or_default()),
        escape_html(&skeleton.placeholder),
        escape_html(&widget.input),
    );
}
