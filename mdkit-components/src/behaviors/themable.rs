//! Role-bound color slots and the per-widget theme subscription.
//!
//! A [`ThemedColor`] is one color slot of a widget (`md_bg_color`,
//! `text_color`, ...). Its [`ColorBinding`] either names a [`Role`], in which
//! case the value follows the theme, or is `Custom`, in which case the
//! explicit value is authoritative and theme changes leave it alone.
//!
//! Every themed widget carries one [`Themable`] feature. It owns the single
//! theme subscription of the widget and refreshes all slots on a recompute or
//! a disabled-state change; destroying the widget releases the subscription.

use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::{Rc, Weak},
    str::FromStr,
};

use mdkit_ui::{Color, Property, Widget, WidgetFeature};
use tracing::warn;

use crate::{
    error::{ThemeError, ThemeResult},
    role::Role,
    theme::{ColorsSubscription, ThemeManager},
};

/// What a color slot reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorBinding {
    /// Follow a theme role.
    Role(Role),
    /// Use the explicit value of the slot.
    Custom,
}

impl From<Role> for ColorBinding {
    fn from(role: Role) -> Self {
        ColorBinding::Role(role)
    }
}

impl fmt::Display for ColorBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorBinding::Role(role) => role.fmt(f),
            ColorBinding::Custom => f.write_str("Custom"),
        }
    }
}

impl FromStr for ColorBinding {
    type Err = ThemeError;

    fn from_str(s: &str) -> ThemeResult<Self> {
        if s.trim().eq_ignore_ascii_case("custom") {
            Ok(ColorBinding::Custom)
        } else {
            Ok(ColorBinding::Role(s.parse()?))
        }
    }
}

/// One role-bound color slot.
///
/// `color` always holds the effective value, including the disabled
/// variant while the owning widget is disabled. Write explicit colors through
/// [`ThemedColor::set_custom`]; writing `color` directly is overwritten on
/// the next refresh.
pub struct ThemedColor {
    name: &'static str,
    /// Role the slot follows, or `Custom`.
    pub binding: Property<ColorBinding>,
    /// Effective color.
    pub color: Property<Color>,
    /// Explicit color used while disabled; `None` dims the enabled color by
    /// the theme's disabled opacity.
    pub disabled_color: Property<Option<Color>>,
    theme: Rc<ThemeManager>,
    custom: Cell<Option<Color>>,
    last_base: Cell<Color>,
    disabled: Cell<bool>,
    warned: Rc<Cell<bool>>,
}

impl fmt::Debug for ThemedColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThemedColor")
            .field("name", &self.name)
            .field("binding", &self.binding.get())
            .field("color", &self.color.get())
            .finish()
    }
}

impl ThemedColor {
    fn new(
        name: &'static str,
        theme: Rc<ThemeManager>,
        binding: ColorBinding,
        custom: Option<Color>,
        warned: Rc<Cell<bool>>,
    ) -> Rc<Self> {
        let slot = Rc::new(Self {
            name,
            binding: Property::new(name, binding),
            color: Property::new(name, Color::TRANSPARENT),
            disabled_color: Property::new(name, None),
            theme,
            custom: Cell::new(custom),
            last_base: Cell::new(Color::TRANSPARENT),
            disabled: Cell::new(false),
            warned,
        });

        let weak = Rc::downgrade(&slot);
        slot.binding.bind(move |binding| {
            if let Some(slot) = weak.upgrade() {
                // Switching to Custom without a value freezes the last color.
                if *binding == ColorBinding::Custom && slot.custom.get().is_none() {
                    slot.custom.set(Some(slot.last_base.get()));
                }
                slot.refresh();
            }
        });
        let weak = Rc::downgrade(&slot);
        slot.disabled_color.bind(move |_| {
            if let Some(slot) = weak.upgrade() {
                slot.refresh();
            }
        });
        slot.refresh();
        slot
    }

    /// Slot name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Current effective color.
    pub fn get(&self) -> Color {
        self.color.get()
    }

    /// Binds the slot to `role`.
    pub fn set_role(&self, role: Role) {
        self.binding.set(ColorBinding::Role(role));
    }

    /// Stores an explicit color and switches the slot to `Custom`.
    pub fn set_custom(&self, color: Color) {
        self.custom.set(Some(color));
        if !self.binding.set(ColorBinding::Custom) {
            self.refresh();
        }
    }

    /// The color the slot shows while enabled.
    pub fn enabled_color(&self) -> Color {
        match self.binding.get() {
            ColorBinding::Role(role) => self.theme.color(role),
            ColorBinding::Custom => self.custom.get().unwrap_or_else(|| {
                if !self.warned.replace(true) {
                    warn!(slot = self.name, "custom color without a value, using transparent");
                }
                Color::TRANSPARENT
            }),
        }
    }

    fn set_disabled(&self, disabled: bool) {
        self.disabled.set(disabled);
        self.refresh();
    }

    /// Re-reads the theme.
    pub fn refresh(&self) {
        let base = self.enabled_color();
        self.last_base.set(base);
        let effective = if self.disabled.get() {
            self.disabled_color
                .get()
                .unwrap_or_else(|| self.theme.disabled(base))
        } else {
            base
        };
        self.color.set(effective);
    }
}

/// Theme subscription of one widget.
pub struct Themable {
    theme: Rc<ThemeManager>,
    slots: RefCell<Vec<Rc<ThemedColor>>>,
    hooks: RefCell<Vec<Rc<dyn Fn()>>>,
    warned: Rc<Cell<bool>>,
    disabled: Cell<bool>,
    subscription: Cell<Option<ColorsSubscription>>,
}

impl fmt::Debug for Themable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Themable")
            .field("slots", &self.slots.borrow().len())
            .field("subscribed", &self.subscription.get().is_some())
            .finish()
    }
}

impl Themable {
    /// Returns the widget's theme subscription, attaching it on first use.
    pub fn of(widget: &Widget, theme: &Rc<ThemeManager>) -> Rc<Themable> {
        if let Some(existing) = widget.feature::<Themable>() {
            return existing;
        }
        let themable = Rc::new(Themable {
            theme: theme.clone(),
            slots: RefCell::new(Vec::new()),
            hooks: RefCell::new(Vec::new()),
            warned: Rc::new(Cell::new(false)),
            disabled: Cell::new(widget.disabled.get()),
            subscription: Cell::new(None),
        });

        let weak = Rc::downgrade(&themable);
        let colors = theme.on_colors(move |_| refresh_weak(&weak));
        themable.subscription.set(Some(colors));

        let weak = Rc::downgrade(&themable);
        widget.disabled.bind(move |disabled| {
            if let Some(themable) = weak.upgrade() {
                themable.apply_disabled(*disabled);
            }
        });

        widget.attach_feature(themable.clone());
        themable
    }

    /// Theme this widget follows.
    pub fn theme(&self) -> &Rc<ThemeManager> {
        &self.theme
    }

    /// Creates a slot refreshed with the widget.
    pub fn color_slot(
        &self,
        name: &'static str,
        binding: impl Into<ColorBinding>,
        custom: Option<Color>,
    ) -> Rc<ThemedColor> {
        let slot = ThemedColor::new(
            name,
            self.theme.clone(),
            binding.into(),
            custom,
            self.warned.clone(),
        );
        if self.disabled.get() {
            slot.set_disabled(true);
        }
        self.slots.borrow_mut().push(slot.clone());
        slot
    }

    /// Slot by name.
    pub fn slot(&self, name: &str) -> Option<Rc<ThemedColor>> {
        self.slots.borrow().iter().find(|s| s.name == name).cloned()
    }

    /// Registers a callback run after every refresh.
    pub fn on_refresh(&self, hook: impl Fn() + 'static) {
        self.hooks.borrow_mut().push(Rc::new(hook));
    }

    fn apply_disabled(&self, disabled: bool) {
        self.disabled.set(disabled);
        for slot in self.slots.borrow().clone() {
            slot.set_disabled(disabled);
        }
        self.run_hooks();
    }

    /// Refreshes every slot, then runs the hooks.
    pub fn refresh(&self) {
        for slot in self.slots.borrow().clone() {
            slot.refresh();
        }
        self.run_hooks();
    }

    fn run_hooks(&self) {
        let hooks = self.hooks.borrow().clone();
        for hook in hooks {
            hook();
        }
    }

    /// Whether the theme subscription is still live.
    pub fn is_subscribed(&self) -> bool {
        self.subscription.get().is_some()
    }
}

fn refresh_weak(weak: &Weak<Themable>) {
    if let Some(themable) = weak.upgrade() {
        themable.refresh();
    }
}

impl WidgetFeature for Themable {
    fn name(&self) -> &'static str {
        "themable"
    }

    fn on_destroy(&self, _widget: &Widget) {
        if let Some(colors) = self.subscription.take() {
            self.theme.unbind_colors(colors);
        }
        self.hooks.borrow_mut().clear();
        self.slots.borrow_mut().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{color_definitions::Palette, theme::ThemeStyle};

    #[test]
    fn role_slot_follows_the_theme() {
        let theme = ThemeManager::new();
        let widget = Widget::new("Box");
        let themable = Themable::of(&widget, &theme);
        let bg = themable.color_slot("md_bg_color", Role::Primary, None);
        assert_eq!(bg.get(), theme.color(Role::Primary));
        theme.primary_palette.set(Palette::Red);
        assert_eq!(bg.get(), theme.color(Role::Primary));
    }

    #[test]
    fn custom_freezes_the_current_color() {
        let theme = ThemeManager::new();
        let widget = Widget::new("Box");
        let themable = Themable::of(&widget, &theme);
        let bg = themable.color_slot("md_bg_color", Role::Surface, None);
        let frozen = bg.get();
        bg.binding.set(ColorBinding::Custom);
        theme.theme_style.set(ThemeStyle::Dark);
        assert_eq!(bg.get(), frozen);
        bg.set_custom(Color::WHITE);
        assert_eq!(bg.get(), Color::WHITE);
    }

    #[test]
    fn custom_without_value_is_transparent() {
        let theme = ThemeManager::new();
        let widget = Widget::new("Box");
        let themable = Themable::of(&widget, &theme);
        let slot = themable.color_slot("line_color", ColorBinding::Custom, None);
        assert_eq!(slot.get(), Color::TRANSPARENT);
    }

    #[test]
    fn disabled_dims_or_uses_override() {
        let theme = ThemeManager::new();
        let widget = Widget::new("Box");
        let themable = Themable::of(&widget, &theme);
        let bg = themable.color_slot("md_bg_color", Role::Primary, None);
        let enabled = bg.get();
        widget.disabled.set(true);
        assert!((bg.get().a - enabled.a * 0.38).abs() < 1e-6);
        bg.disabled_color.set(Some(Color::BLACK));
        assert_eq!(bg.get(), Color::BLACK);
        widget.disabled.set(false);
        assert_eq!(bg.get(), enabled);
    }

    #[test]
    fn destroy_releases_the_subscription() {
        let theme = ThemeManager::new();
        let before = theme.get_property_observers("colors");
        let widget = Widget::new("Box");
        let themable = Themable::of(&widget, &theme);
        assert_eq!(theme.get_property_observers("colors"), before.map(|n| n + 1));
        widget.destroy();
        assert!(!themable.is_subscribed());
        assert_eq!(theme.get_property_observers("colors"), before);
    }

    #[test]
    fn one_refresh_per_recompute() {
        let theme = ThemeManager::new();
        let widget = Widget::new("Box");
        let themable = Themable::of(&widget, &theme);
        let bg = themable.color_slot("md_bg_color", Role::Surface, None);
        let refreshes = Rc::new(Cell::new(0));
        let r = refreshes.clone();
        themable.on_refresh(move || r.set(r.get() + 1));

        theme.switch_theme();
        assert_eq!(refreshes.get(), 1);
        assert_eq!(bg.get(), theme.color(Role::Surface));

        theme.batch(|t| {
            t.theme_style.set(ThemeStyle::Light);
            t.primary_palette.set(Palette::Teal);
        });
        assert_eq!(refreshes.get(), 2);
        assert_eq!(bg.get(), theme.color(Role::Surface));
    }

    #[test]
    fn binding_parses_from_names() {
        assert_eq!(
            "Primary".parse::<ColorBinding>().unwrap(),
            ColorBinding::Role(Role::Primary)
        );
        assert_eq!("Custom".parse::<ColorBinding>().unwrap(), ColorBinding::Custom);
        assert!("Nope".parse::<ColorBinding>().is_err());
    }
}
