//! Filled and outlined text fields.
//!
//! ## Usage
//!
//! Collect a single line of text. The field owns optional leading and
//! trailing icons, a hint that floats above the input on focus, a helper
//! line and a character counter. It enters the error state when the text is
//! longer than `max_text_length` or when a `required` field is empty; in
//! that state the hint, helper, trailing icon, counter and active line use
//! the error role while the leading icon stays neutral.

use std::rc::Rc;

use derive_setters::Setters;
use mdkit_ui::{
    Canvas, CanvasLayer, Color, Dp, Instruction, Property, PxPosition, PxRect, PxSize, Signal,
    TouchEvent, TouchPhase, TouchResponse, Widget, WidgetFeature, Window,
};
use tracing::debug;

use crate::{
    behaviors::themable::ThemedColor,
    context::BuildContext,
    font_styles::FontRole,
    label::{Icon, IconArgs, Label, LabelArgs, LabelCore, content_slot},
    role::Role,
    shape::Shape,
    surface::{Surface, SurfaceArgs, on_geometry, propagate_disabled},
    theme::MaterialShapes,
};

/// Container style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextFieldMode {
    /// Tinted container with an active line at the bottom.
    #[default]
    Filled,
    /// Transparent container with an outline.
    Outlined,
}

/// When the helper line is visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HelperTextMode {
    /// Always.
    Persistent,
    /// While the field has focus.
    #[default]
    OnFocus,
    /// While the field is in the error state.
    OnError,
}

/// Text field tokens.
pub struct TextFieldDefaults;

impl TextFieldDefaults {
    /// Default width.
    pub const WIDTH: Dp = Dp(280.0);
    /// Container height.
    pub const HEIGHT: Dp = Dp(56.0);
    /// Horizontal content padding.
    pub const PADDING: Dp = Dp(16.0);
    /// Inset of leading and trailing icons.
    pub const ICON_PADDING: Dp = Dp(12.0);
    /// Gap between an icon and the text.
    pub const ICON_SPACING: Dp = Dp(16.0);
    /// Gap between the container and the helper line.
    pub const SUPPORTING_GAP: Dp = Dp(4.0);
    /// Resting line width.
    pub const LINE_WIDTH: Dp = Dp(1.0);
    /// Focused line width.
    pub const FOCUSED_LINE_WIDTH: Dp = Dp(2.0);
}

/// Kind of the leading icon.
pub const LEADING_ICON: &str = "TextFieldLeadingIcon";
/// Kind of the trailing icon.
pub const TRAILING_ICON: &str = "TextFieldTrailingIcon";
/// Kind of the hint.
pub const HINT_TEXT: &str = "TextFieldHintText";
/// Kind of the helper line.
pub const HELPER_TEXT: &str = "TextFieldHelperText";
/// Kind of the character counter.
pub const MAX_LENGTH_TEXT: &str = "TextFieldMaxLengthText";

/// Arguments for [`TextField::new`].
#[derive(Debug, Clone, PartialEq, Default, Setters)]
#[setters(into)]
pub struct TextFieldArgs {
    /// Container style.
    pub mode: TextFieldMode,
    /// Initial text.
    pub text: String,
    /// Hint shown inside or above the field.
    #[setters(strip_option)]
    pub hint_text: Option<String>,
    /// Helper line below the field.
    #[setters(strip_option)]
    pub helper_text: Option<String>,
    /// Helper visibility.
    pub helper_text_mode: HelperTextMode,
    /// Leading icon name.
    #[setters(strip_option)]
    pub leading_icon: Option<String>,
    /// Trailing icon name.
    #[setters(strip_option)]
    pub trailing_icon: Option<String>,
    /// Longest valid text, in characters; adds a counter.
    #[setters(strip_option)]
    pub max_text_length: Option<usize>,
    /// Empty text is an error.
    pub required: bool,
    /// Initial disabled state.
    pub disabled: bool,
}

/// Whether `text` violates the length or presence constraint.
pub fn is_invalid(text: &str, max_text_length: Option<usize>, required: bool) -> bool {
    let too_long = max_text_length.is_some_and(|max| text.chars().count() > max);
    too_long || (required && text.is_empty())
}

/// Input feature of a text field.
pub struct TextFieldState {
    /// Current text.
    pub text: Property<String>,
    /// Container style.
    pub mode: TextFieldMode,
    /// Helper visibility.
    pub helper_text_mode: Property<HelperTextMode>,
    /// Longest valid text.
    pub max_text_length: Property<Option<usize>>,
    /// Empty text is an error.
    pub required: Property<bool>,
    /// Error reported by the owner; replaces the helper text while set.
    pub error_message: Property<Option<String>>,
    /// Whether the field is in the error state; derived.
    pub error: Property<bool>,
    /// Whether the hint sits above the input; derived.
    pub hint_floating: Property<bool>,
    /// Color of the input text.
    pub text_color: Rc<ThemedColor>,
    /// Color of the active line or outline.
    pub line_color: Rc<ThemedColor>,
    /// Fired with the text when input is confirmed.
    pub on_text_validate: Signal<String>,
    /// Container features.
    pub surface: Surface,
    helper_text: String,
    window: Option<Window>,
}

impl std::fmt::Debug for TextFieldState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextFieldState")
            .field("text", &self.text.get())
            .field("mode", &self.mode)
            .field("error", &self.error.get())
            .finish_non_exhaustive()
    }
}

impl TextFieldState {
    fn input_rect(&self, widget: &Widget) -> PxRect {
        let rect = widget.rect();
        let (start, end) = text_span(widget);
        PxRect::new(start, rect.y, (end - start).max(0.0), rect.height)
    }
}

impl WidgetFeature for TextFieldState {
    fn name(&self) -> &'static str {
        "text_field"
    }

    fn draw(&self, widget: &Widget, canvas: &mut Canvas) {
        let rect = widget.rect();
        if self.mode == TextFieldMode::Filled {
            let width = if widget.focus.get() {
                TextFieldDefaults::FOCUSED_LINE_WIDTH
            } else {
                TextFieldDefaults::LINE_WIDTH
            }
            .to_pixels_f32();
            canvas.push(CanvasLayer::Main, Instruction::Color(self.line_color.get()));
            canvas.push(
                CanvasLayer::Main,
                Instruction::Rectangle(PxRect::new(rect.x, rect.y, rect.width, width)),
            );
        }
        let chars = self.text.with(|t| t.chars().count()) as f32;
        if chars > 0.0 {
            let input = self.input_rect(widget);
            let line = 24.0f32.min(input.height);
            let width = (chars * 16.0 * 0.55).min(input.width);
            canvas.push(CanvasLayer::Main, Instruction::Color(self.text_color.get()));
            canvas.push(
                CanvasLayer::Main,
                Instruction::Rectangle(PxRect::new(
                    input.x,
                    input.center().y - line / 2.0,
                    width,
                    line,
                )),
            );
        }
    }

    fn on_touch(&self, widget: &Widget, touch: &TouchEvent) -> TouchResponse {
        if touch.phase != TouchPhase::Down || widget.is_effectively_disabled() {
            return TouchResponse::Ignored;
        }
        match &self.window {
            Some(window) => window.request_focus(widget),
            None => {
                widget.focus.set(true);
            }
        }
        TouchResponse::Consumed
    }
}

fn slot(widget: &Widget, kind: &str) -> Option<Widget> {
    widget.children().into_iter().find(|c| c.kind() == kind)
}

fn text_span(widget: &Widget) -> (f32, f32) {
    let rect = widget.rect();
    let padding = TextFieldDefaults::PADDING.to_pixels_f32();
    let icon_padding = TextFieldDefaults::ICON_PADDING.to_pixels_f32();
    let icon_spacing = TextFieldDefaults::ICON_SPACING.to_pixels_f32();
    let start = slot(widget, LEADING_ICON).map_or(rect.x + padding, |icon| {
        rect.x + icon_padding + icon.size.get().width + icon_spacing
    });
    let end = slot(widget, TRAILING_ICON).map_or(rect.right() - padding, |icon| {
        rect.right() - icon_padding - icon.size.get().width - icon_spacing
    });
    (start, end)
}

fn layout(widget: &Widget) {
    let Some(state) = widget.feature::<TextFieldState>() else {
        return;
    };
    let rect = widget.rect();
    let mid = rect.center().y;
    let padding = TextFieldDefaults::PADDING.to_pixels_f32();
    let icon_padding = TextFieldDefaults::ICON_PADDING.to_pixels_f32();
    let gap = TextFieldDefaults::SUPPORTING_GAP.to_pixels_f32();
    let (start, _) = text_span(widget);
    for child in widget.children() {
        let size = child.size.get();
        let pos = match child.kind() {
            LEADING_ICON => PxPosition::new(rect.x + icon_padding, mid - size.height / 2.0),
            TRAILING_ICON => PxPosition::new(
                rect.right() - icon_padding - size.width,
                mid - size.height / 2.0,
            ),
            HINT_TEXT if state.hint_floating.get() => match state.mode {
                TextFieldMode::Outlined => {
                    PxPosition::new(rect.x + padding, rect.top() - size.height / 2.0)
                }
                TextFieldMode::Filled => PxPosition::new(start, rect.top() - 8.0 - size.height),
            },
            HINT_TEXT => PxPosition::new(start, mid - size.height / 2.0),
            HELPER_TEXT => PxPosition::new(rect.x + padding, rect.y - gap - size.height),
            MAX_LENGTH_TEXT => PxPosition::new(
                rect.right() - padding - size.width,
                rect.y - gap - size.height,
            ),
            _ => continue,
        };
        child.pos.set(pos);
    }
}

fn set_slot_role(widget: &Widget, kind: &str, role: Role) {
    if let Some(child) = slot(widget, kind)
        && let Some(color) = content_slot(&child)
    {
        color.set_role(role);
    }
}

fn refresh(widget: &Widget) {
    let Some(state) = widget.feature::<TextFieldState>() else {
        return;
    };
    let message = state.error_message.get();
    let error = message.is_some()
        || state.text.with(|text| {
            is_invalid(text, state.max_text_length.get(), state.required.get())
        });
    if state.error.set(error) {
        debug!(error, "text field error state changed");
    }
    let focused = widget.focus.get();
    let has_text = state.text.with(|t| !t.is_empty());
    state.hint_floating.set(focused || has_text);

    let neutral = Role::OnSurfaceVariant;
    let (hint, helper, trailing, counter, line) = if error {
        (Role::Error, Role::Error, Role::Error, Role::Error, Role::Error)
    } else {
        let line = match (focused, state.mode) {
            (true, _) => Role::Primary,
            (false, TextFieldMode::Outlined) => Role::Outline,
            (false, TextFieldMode::Filled) => Role::OnSurfaceVariant,
        };
        let hint = if focused { Role::Primary } else { neutral };
        (hint, neutral, neutral, neutral, line)
    };
    set_slot_role(widget, HINT_TEXT, hint);
    set_slot_role(widget, HELPER_TEXT, helper);
    set_slot_role(widget, TRAILING_ICON, trailing);
    set_slot_role(widget, MAX_LENGTH_TEXT, counter);
    set_slot_role(widget, LEADING_ICON, neutral);
    state.line_color.set_role(line);

    let background = &state.surface.background;
    if state.mode == TextFieldMode::Outlined {
        background.line_color.set_role(line);
        let width = if focused || error {
            TextFieldDefaults::FOCUSED_LINE_WIDTH
        } else {
            TextFieldDefaults::LINE_WIDTH
        };
        background.line_width.set(width.to_pixels_f32());
    }

    if let Some(hint) = slot(widget, HINT_TEXT).and_then(|w| Label::core_of(&w)) {
        let role = if state.hint_floating.get() {
            FontRole::Small
        } else {
            FontRole::Large
        };
        hint.role.set(role);
    }
    if let Some(helper) = slot(widget, HELPER_TEXT) {
        if let Some(core) = Label::core_of(&helper) {
            core.text
                .set(message.unwrap_or_else(|| state.helper_text.clone()));
        }
        let visible = match state.helper_text_mode.get() {
            HelperTextMode::Persistent => true,
            HelperTextMode::OnFocus => focused,
            HelperTextMode::OnError => error,
        };
        helper.opacity.set(if visible { 1.0 } else { 0.0 });
    }
    if let Some(counter) = slot(widget, MAX_LENGTH_TEXT).and_then(|w| Label::core_of(&w)) {
        let len = state.text.with(|t| t.chars().count());
        let max = state.max_text_length.get().unwrap_or_default();
        counter.text.set(format!("{len}/{max}"));
    }
    layout(widget);
}

/// A single-line text input.
#[derive(Clone)]
pub struct TextField {
    widget: Widget,
    /// Input state and container features.
    pub state: Rc<TextFieldState>,
}

widget_wrapper!(TextField);

impl TextField {
    /// Creates a text field.
    pub fn new(ctx: &BuildContext, args: TextFieldArgs) -> Self {
        let widget = Widget::new("TextField");
        let surface_args = match args.mode {
            TextFieldMode::Filled => SurfaceArgs::new(Role::SurfaceContainerHighest).shape(
                Shape::corners(
                    MaterialShapes::EXTRA_SMALL,
                    MaterialShapes::EXTRA_SMALL,
                    Dp::ZERO,
                    Dp::ZERO,
                ),
            ),
            TextFieldMode::Outlined => SurfaceArgs::new(Role::Transparent)
                .shape(Shape::rounded(MaterialShapes::EXTRA_SMALL))
                .outline((Role::Outline, TextFieldDefaults::LINE_WIDTH)),
        };
        let surface = Surface::attach(&widget, ctx, surface_args);
        let text_color = surface.themable.color_slot("text_color", Role::OnSurface, None);
        let line_color = surface.themable.color_slot("line_color", Role::OnSurfaceVariant, None);
        let state = Rc::new(TextFieldState {
            text: Property::new("text", args.text),
            mode: args.mode,
            helper_text_mode: Property::new("helper_text_mode", args.helper_text_mode),
            max_text_length: Property::new("max_text_length", args.max_text_length),
            required: Property::new("required", args.required),
            error_message: Property::new("error_message", None),
            error: Property::new("error", false),
            hint_floating: Property::new("hint_floating", false),
            text_color,
            line_color,
            on_text_validate: Signal::new(),
            surface,
            helper_text: args.helper_text.clone().unwrap_or_default(),
            window: ctx.window.clone(),
        });
        widget.attach_feature(state.clone());

        let mut children: Vec<Widget> = Vec::new();
        if let Some(icon) = args.leading_icon {
            children.push(Icon::with_kind(ctx, LEADING_ICON, IconArgs::new(icon)).into());
        }
        if let Some(icon) = args.trailing_icon {
            children.push(Icon::with_kind(ctx, TRAILING_ICON, IconArgs::new(icon)).into());
        }
        if let Some(hint) = args.hint_text {
            children.push(
                Label::with_kind(
                    ctx,
                    HINT_TEXT,
                    LabelArgs::new(hint).text_color(Role::OnSurfaceVariant),
                )
                    .into(),
            );
        }
        if let Some(helper) = args.helper_text {
            children.push(
                Label::with_kind(
                    ctx,
                    HELPER_TEXT,
                    LabelArgs::new(helper)
                        .role(FontRole::Small)
                        .text_color(Role::OnSurfaceVariant),
                )
                .into(),
            );
        }
        if state.max_text_length.get().is_some() {
            children.push(
                Label::with_kind(
                    ctx,
                    MAX_LENGTH_TEXT,
                    LabelArgs::new("")
                        .role(FontRole::Small)
                        .text_color(Role::OnSurfaceVariant),
                )
                .into(),
            );
        }
        for child in &children {
            widget.add_widget(child);
            let target = widget.downgrade();
            child.size.bind(move |_| {
                if let Some(widget) = target.upgrade() {
                    layout(&widget);
                }
            });
        }
        widget.size.set(PxSize::from_dp(
            TextFieldDefaults::WIDTH,
            TextFieldDefaults::HEIGHT,
        ));
        on_geometry(&widget, layout);
        propagate_disabled(&widget);

        let target = widget.downgrade();
        let refresh_on = move || {
            let target = target.clone();
            move || {
                if let Some(widget) = target.upgrade() {
                    refresh(&widget);
                }
            }
        };
        let r = refresh_on();
        state.text.bind(move |_| r());
        let r = refresh_on();
        state.max_text_length.bind(move |_| r());
        let r = refresh_on();
        state.required.bind(move |_| r());
        let r = refresh_on();
        state.helper_text_mode.bind(move |_| r());
        let r = refresh_on();
        state.error_message.bind(move |_| r());
        let r = refresh_on();
        widget.focus.bind(move |_| r());
        refresh(&widget);
        widget.disabled.set(args.disabled);
        Self { widget, state }
    }

    /// Current text.
    pub fn text(&self) -> String {
        self.state.text.get()
    }

    /// Replaces the text.
    pub fn set_text(&self, text: impl Into<String>) {
        self.state.text.set(text.into());
    }

    /// Appends typed text; ignored while disabled.
    pub fn insert_text(&self, text: &str) {
        if self.is_effectively_disabled() {
            return;
        }
        self.state.text.update(|t| t.push_str(text));
    }

    /// Removes the last character.
    pub fn do_backspace(&self) {
        self.state.text.update(|t| {
            t.pop();
        });
    }

    /// Confirms the input and emits `on_text_validate`.
    pub fn validate(&self) {
        let text = self.text();
        self.state.on_text_validate.emit(&text);
    }

    /// Gives the field keyboard focus.
    pub fn focus(&self) {
        match &self.state.window {
            Some(window) => window.request_focus(&self.widget),
            None => {
                self.widget.focus.set(true);
            }
        }
    }

    /// Puts the field in the error state with `message` on the helper line,
    /// or clears a previously reported error.
    pub fn set_error_message(&self, message: Option<String>) {
        self.state.error_message.set(message);
    }

    /// Whether the field is in the error state.
    pub fn is_error(&self) -> bool {
        self.state.error.get()
    }

    /// Slot child of `kind`.
    pub fn slot(&self, kind: &str) -> Option<Widget> {
        slot(&self.widget, kind)
    }

    /// Effective content color of the slot of `kind`.
    pub fn slot_color(&self, kind: &str) -> Option<Color> {
        self.slot(kind)
            .and_then(|w| content_slot(&w))
            .map(|c| c.get())
    }

    /// Effective line color (active indicator or outline).
    pub fn line_color(&self) -> Color {
        match self.state.mode {
            TextFieldMode::Filled => self.state.line_color.get(),
            TextFieldMode::Outlined => self.state.surface.background.line_color.get(),
        }
    }

    /// Label core of the hint, if any.
    pub fn hint(&self) -> Option<Rc<LabelCore>> {
        self.slot(HINT_TEXT).and_then(|w| Label::core_of(&w))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_and_presence_rules() {
        assert!(is_invalid("Text", Some(3), false));
        assert!(!is_invalid("Tex", Some(3), false));
        assert!(is_invalid("", None, true));
        assert!(!is_invalid("", None, false));
        assert!(!is_invalid("héé", Some(3), false));
    }

    #[test]
    fn hint_floats_and_line_takes_focus_color() {
        let ctx = BuildContext::new();
        let field = TextField::new(&ctx, TextFieldArgs::default().hint_text("Name"));
        let hint = field.hint().unwrap();
        assert!(!field.state.hint_floating.get());
        assert_eq!(hint.role.get(), FontRole::Large);
        let resting_y = field.slot(HINT_TEXT).unwrap().pos.get().y;

        field.focus();
        assert!(field.state.hint_floating.get());
        assert_eq!(hint.role.get(), FontRole::Small);
        assert!(field.slot(HINT_TEXT).unwrap().pos.get().y > resting_y);
        assert_eq!(field.line_color(), ctx.theme.color(Role::Primary));
        assert_eq!(field.slot_color(HINT_TEXT), Some(ctx.theme.color(Role::Primary)));
    }

    #[test]
    fn helper_modes_control_visibility() {
        let ctx = BuildContext::new();
        let field = TextField::new(
            &ctx,
            TextFieldArgs::default()
                .helper_text("Required")
                .helper_text_mode(HelperTextMode::OnError)
                .required(true)
                .text("x"),
        );
        let helper = field.slot(HELPER_TEXT).unwrap();
        assert_eq!(helper.opacity.get(), 0.0);
        field.do_backspace();
        assert!(field.is_error());
        assert_eq!(helper.opacity.get(), 1.0);

        field.state.helper_text_mode.set(HelperTextMode::Persistent);
        field.insert_text("ok");
        assert!(!field.is_error());
        assert_eq!(helper.opacity.get(), 1.0);
    }

    #[test]
    fn counter_tracks_length() {
        let ctx = BuildContext::new();
        let field = TextField::new(&ctx, TextFieldArgs::default().max_text_length(5usize));
        let counter = Label::core_of(&field.slot(MAX_LENGTH_TEXT).unwrap()).unwrap();
        assert_eq!(counter.text.get(), "0/5");
        field.set_text("abc");
        assert_eq!(counter.text.get(), "3/5");
        let c = field.slot(MAX_LENGTH_TEXT).unwrap();
        assert_eq!(c.rect().right(), field.rect().right() - 16.0);
        assert!(c.rect().top() <= field.pos.get().y);
    }

    #[test]
    fn error_message_replaces_helper_until_cleared() {
        let ctx = BuildContext::new();
        let field = TextField::new(&ctx, TextFieldArgs::default().helper_text("Optional"));
        let helper = Label::core_of(&field.slot(HELPER_TEXT).unwrap()).unwrap();

        field.set_error_message(Some("Taken".into()));
        assert!(field.is_error());
        assert_eq!(helper.text.get(), "Taken");
        assert_eq!(field.slot_color(HELPER_TEXT), Some(ctx.theme.color(Role::Error)));

        field.set_error_message(None);
        assert!(!field.is_error());
        assert_eq!(helper.text.get(), "Optional");
    }

    #[test]
    fn disabled_field_ignores_input() {
        let ctx = BuildContext::new();
        let field = TextField::new(&ctx, TextFieldArgs::default().disabled(true));
        field.insert_text("abc");
        assert_eq!(field.text(), "");
    }
}
