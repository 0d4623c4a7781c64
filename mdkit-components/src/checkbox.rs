//! Checkboxes and radio buttons.
//!
//! ## Usage
//!
//! Toggle an option on or off. Checkboxes added to one [`RadioGroup`] behave
//! as radio buttons: activating one deactivates the others.

use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use derive_setters::Setters;
use mdkit_ui::{Color, Dp, Property, PxPosition, PxSize, Signal, Widget, WidgetFeature};
use smallvec::SmallVec;
use tracing::debug;

use crate::{
    behaviors::themable::ThemedColor,
    context::BuildContext,
    font_styles::FontRole,
    label::{Icon, IconArgs, tint_content},
    role::Role,
    shape::Shape,
    surface::{Interaction, Surface, SurfaceArgs, on_geometry, propagate_disabled, tap_target},
};

/// Checkbox tokens.
pub struct CheckboxDefaults;

impl CheckboxDefaults {
    /// Visual container edge; the widget itself reaches the tap target.
    pub const CONTAINER_SIZE: Dp = Dp(40.0);
    /// Glyph of an active checkbox.
    pub const CHECKBOX_ACTIVE: &'static str = "checkbox-marked";
    /// Glyph of an inactive checkbox.
    pub const CHECKBOX_INACTIVE: &'static str = "checkbox-blank-outline";
    /// Glyph of an active radio button.
    pub const RADIO_ACTIVE: &'static str = "radiobox-marked";
    /// Glyph of an inactive radio button.
    pub const RADIO_INACTIVE: &'static str = "radiobox-blank";
}

/// Arguments for [`Checkbox::new`].
#[derive(Debug, Clone, PartialEq, Default, Setters)]
pub struct CheckboxArgs {
    /// Initial state.
    pub active: bool,
    /// Draw as a radio button.
    pub radio: bool,
    /// Explicit color of the active glyph.
    #[setters(strip_option)]
    pub color_active: Option<Color>,
    /// Explicit color of the inactive glyph.
    #[setters(strip_option)]
    pub color_inactive: Option<Color>,
    /// Initial disabled state.
    pub disabled: bool,
}

/// State shared by a checkbox and its observers.
#[derive(Debug)]
pub struct CheckboxState {
    /// Whether the box is checked.
    pub active: Property<bool>,
    /// Glyph color slot; follows `Primary` when active.
    pub content_color: Rc<ThemedColor>,
    /// Container features.
    pub surface: Surface,
    /// Interactive features.
    pub interaction: Interaction,
    radio: bool,
    color_active: Option<Color>,
    color_inactive: Option<Color>,
    group: RefCell<Option<Weak<GroupInner>>>,
}

impl WidgetFeature for CheckboxState {
    fn name(&self) -> &'static str {
        "checkbox"
    }
}

impl CheckboxState {
    fn glyph(&self, active: bool) -> &'static str {
        match (self.radio, active) {
            (false, true) => CheckboxDefaults::CHECKBOX_ACTIVE,
            (false, false) => CheckboxDefaults::CHECKBOX_INACTIVE,
            (true, true) => CheckboxDefaults::RADIO_ACTIVE,
            (true, false) => CheckboxDefaults::RADIO_INACTIVE,
        }
    }

    fn apply_active(&self, active: bool) {
        let custom = if active {
            self.color_active
        } else {
            self.color_inactive
        };
        match custom {
            Some(color) => self.content_color.set_custom(color),
            None if active => self.content_color.set_role(Role::Primary),
            None => self.content_color.set_role(Role::OnSurfaceVariant),
        }
        let layer = if active {
            Role::Primary
        } else {
            Role::OnSurface
        };
        self.interaction.state_layer.layer_color.set_role(layer);
        self.interaction.ripple.ripple_color.set_role(layer);
    }
}

fn center_glyph(widget: &Widget) {
    let c = widget.center();
    for child in widget.children() {
        let size = child.size.get();
        child
            .pos
            .set(PxPosition::new(c.x - size.width / 2.0, c.y - size.height / 2.0));
    }
}

/// A two-state selection control.
#[derive(Clone)]
pub struct Checkbox {
    widget: Widget,
    /// Glyph child.
    pub icon: Icon,
    /// State and interaction features.
    pub state: Rc<CheckboxState>,
}

widget_wrapper!(Checkbox);

impl Checkbox {
    /// Creates a checkbox.
    pub fn new(ctx: &BuildContext, args: CheckboxArgs) -> Self {
        Self::with_kind(ctx, "Checkbox", args)
    }

    /// Creates a checkbox reporting `kind`, for typed child slots.
    pub fn with_kind(ctx: &BuildContext, kind: &'static str, args: CheckboxArgs) -> Self {
        let widget = Widget::new(kind);
        let surface = Surface::attach(
            &widget,
            ctx,
            SurfaceArgs::new(Role::Transparent).shape(Shape::Ellipse),
        );
        let content_color = surface.themable.color_slot(
            "content_color",
            Role::OnSurfaceVariant,
            None,
        );
        let interaction =
            Interaction::attach_circular(&widget, ctx, &surface.themable, Role::OnSurface);
        let state = Rc::new(CheckboxState {
            active: Property::new("active", args.active),
            content_color,
            surface,
            interaction,
            radio: args.radio,
            color_active: args.color_active,
            color_inactive: args.color_inactive,
            group: RefCell::new(None),
        });
        widget.attach_feature(state.clone());
        state.apply_active(args.active);

        let icon = Icon::new(
            ctx,
            IconArgs::new(state.glyph(args.active)).role(FontRole::Small),
        );
        widget.add_widget(&icon);
        tint_content(&icon, &state.content_color);
        widget.size.set(tap_target(PxSize::square_dp(
            CheckboxDefaults::CONTAINER_SIZE,
        )));
        on_geometry(&widget, center_glyph);
        center_glyph(&widget);

        let weak = Rc::downgrade(&state);
        let target = icon.downgrade();
        state.active.bind(move |active| {
            let Some(state) = weak.upgrade() else {
                return;
            };
            state.apply_active(*active);
            if let Some(icon) = target.upgrade().and_then(Icon::from_widget) {
                icon.core.icon.set(state.glyph(*active).to_string());
                tint_content(&icon, &state.content_color);
            }
            if *active {
                let group = state.group.borrow().as_ref().and_then(Weak::upgrade);
                if let Some(group) = group {
                    group.deactivate_others(&state);
                }
            }
        });
        let target = icon.downgrade();
        let weak = Rc::downgrade(&state);
        state.content_color.binding.bind(move |_| {
            if let (Some(icon), Some(state)) = (target.upgrade(), weak.upgrade()) {
                tint_content(&icon, &state.content_color);
            }
        });
        let weak = Rc::downgrade(&state);
        let target = widget.downgrade();
        state.interaction.clickable.on_release.connect(move |_| {
            if let (Some(state), Some(widget)) = (weak.upgrade(), target.upgrade())
                && !widget.is_effectively_disabled()
            {
                state.toggle();
            }
        });
        propagate_disabled(&widget);
        widget.disabled.set(args.disabled);
        Self {
            widget,
            icon,
            state,
        }
    }

    /// Whether the box is checked.
    pub fn is_active(&self) -> bool {
        self.state.active.get()
    }

    /// Name of the glyph currently shown.
    pub fn glyph_name(&self) -> String {
        self.icon.core.icon.get()
    }

    /// Effective glyph color.
    pub fn color(&self) -> Color {
        self.icon.icon_color()
    }

    /// Fired when a press is released over the box.
    pub fn on_release(&self) -> &Signal<()> {
        &self.state.interaction.clickable.on_release
    }
}

impl CheckboxState {
    fn toggle(&self) {
        let active = self.active.get();
        if active && self.radio {
            let group = self.group.borrow().as_ref().and_then(Weak::upgrade);
            if group.is_some_and(|g| !g.allow_no_selection) {
                return;
            }
        }
        self.active.set(!active);
    }
}

#[derive(Debug)]
struct GroupInner {
    name: String,
    allow_no_selection: bool,
    members: RefCell<SmallVec<[Weak<CheckboxState>; 4]>>,
}

impl GroupInner {
    fn deactivate_others(&self, winner: &Rc<CheckboxState>) {
        let members: Vec<Rc<CheckboxState>> = self
            .members
            .borrow()
            .iter()
            .filter_map(Weak::upgrade)
            .collect();
        for member in members {
            if !Rc::ptr_eq(&member, winner) {
                member.active.set(false);
            }
        }
        debug!(group = %self.name, "radio selection changed");
    }
}

/// A set of mutually exclusive checkboxes.
#[derive(Debug, Clone)]
pub struct RadioGroup {
    inner: Rc<GroupInner>,
}

impl RadioGroup {
    /// Creates an empty group. Tapping the active member clears the group
    /// when `allow_no_selection` is set.
    pub fn new(name: impl Into<String>, allow_no_selection: bool) -> Self {
        Self {
            inner: Rc::new(GroupInner {
                name: name.into(),
                allow_no_selection,
                members: RefCell::new(SmallVec::new()),
            }),
        }
    }

    /// Adds `checkbox` to the group. Only the first active member stays
    /// active.
    pub fn add(&self, checkbox: &Checkbox) {
        *checkbox.state.group.borrow_mut() = Some(Rc::downgrade(&self.inner));
        self.inner
            .members
            .borrow_mut()
            .push(Rc::downgrade(&checkbox.state));
        if checkbox.is_active() && self.active_count() > 1 {
            checkbox.state.active.set(false);
        }
    }

    fn active_count(&self) -> usize {
        self.inner
            .members
            .borrow()
            .iter()
            .filter_map(Weak::upgrade)
            .filter(|m| m.active.get())
            .count()
    }

    /// Index of the active member, in insertion order.
    pub fn selected(&self) -> Option<usize> {
        self.inner
            .members
            .borrow()
            .iter()
            .position(|m| m.upgrade().is_some_and(|m| m.active.get()))
    }

    /// Group name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }
}

#[cfg(test)]
mod tests {
    use mdkit_ui::{TouchEvent, TouchPhase, Window};

    use super::*;

    fn tap(window: &Window, at: PxPosition) {
        let down = TouchEvent::new(1, at, TouchPhase::Down, 0.0);
        window.dispatch_touch(&down);
        window.dispatch_touch(&down.with(TouchPhase::Up, at, 0.05));
    }

    #[test]
    fn tap_toggles_glyph_and_color() {
        let ctx = BuildContext::new();
        let window = Window::new(PxSize::new(200.0, 200.0));
        let checkbox = Checkbox::new(&ctx, CheckboxArgs::default());
        window.add_widget(&checkbox);
        assert_eq!(checkbox.glyph_name(), "checkbox-blank-outline");
        assert_eq!(checkbox.color(), ctx.theme.color(Role::OnSurfaceVariant));

        tap(&window, PxPosition::new(24.0, 24.0));
        assert!(checkbox.is_active());
        assert_eq!(checkbox.glyph_name(), "checkbox-marked");
        assert_eq!(checkbox.color(), ctx.theme.color(Role::Primary));
        assert_eq!(checkbox.size.get(), PxSize::new(48.0, 48.0));
    }

    #[test]
    fn disabled_checkbox_ignores_taps() {
        let ctx = BuildContext::new();
        let window = Window::new(PxSize::new(200.0, 200.0));
        let checkbox = Checkbox::new(&ctx, CheckboxArgs::default().disabled(true));
        window.add_widget(&checkbox);
        tap(&window, PxPosition::new(24.0, 24.0));
        assert!(!checkbox.is_active());
        let enabled = ctx.theme.color(Role::OnSurfaceVariant);
        assert!((checkbox.color().a - enabled.a * 0.38).abs() < 1e-4);
    }

    #[test]
    fn radio_group_is_exclusive() {
        let ctx = BuildContext::new();
        let group = RadioGroup::new("size", false);
        let boxes: Vec<Checkbox> = (0..3)
            .map(|_| Checkbox::new(&ctx, CheckboxArgs::default().radio(true)))
            .collect();
        for b in &boxes {
            group.add(b);
        }
        assert_eq!(group.selected(), None);
        boxes[0].state.active.set(true);
        boxes[2].state.active.set(true);
        assert_eq!(group.selected(), Some(2));
        assert!(!boxes[0].is_active());
        assert_eq!(boxes[2].glyph_name(), "radiobox-marked");

        boxes[2].state.toggle();
        assert!(boxes[2].is_active());
    }
}
