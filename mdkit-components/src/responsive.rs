//! Window-size classes and a layout that swaps views between them.
//!
//! Widths are classified in dp: below `tablet_width` is [`DeviceType::Mobile`],
//! below `desktop_width` is [`DeviceType::Tablet`], anything wider is
//! [`DeviceType::Desktop`]. A [`ResponsiveLayout`] holds one view per class
//! and shows the one matching the window. Hidden views are detached, never
//! destroyed, so their state survives a round trip.

use std::{cell::RefCell, path::Path, rc::Rc};

use mdkit_ui::{Dp, ObserverId, Property, PxSize, Signal, Widget, WidgetFeature, Window};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    context::BuildContext,
    error::{ThemeError, ThemeResult},
    surface::on_geometry,
};

/// Size class of the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DeviceType {
    /// Narrow windows.
    #[default]
    Mobile,
    /// Medium windows.
    Tablet,
    /// Wide windows.
    Desktop,
}

impl DeviceType {
    fn index(self) -> usize {
        self as usize
    }

    /// Classes to show, best match first, when a view is missing.
    fn fallbacks(self) -> [DeviceType; 3] {
        match self {
            DeviceType::Mobile => [DeviceType::Mobile, DeviceType::Tablet, DeviceType::Desktop],
            DeviceType::Tablet => [DeviceType::Tablet, DeviceType::Mobile, DeviceType::Desktop],
            DeviceType::Desktop => [DeviceType::Desktop, DeviceType::Tablet, DeviceType::Mobile],
        }
    }
}

/// Classification thresholds, loadable from TOML.
///
/// ```
/// use mdkit_components::responsive::{DeviceType, ResponsiveConfig};
///
/// let config = ResponsiveConfig::from_toml_str("tablet_width = 720.0").unwrap();
/// assert_eq!(config.desktop_width, 1024.0);
/// assert_eq!(config.classify_dp(700.0), DeviceType::Mobile);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResponsiveConfig {
    /// Smallest tablet width in dp.
    pub tablet_width: f64,
    /// Smallest desktop width in dp.
    pub desktop_width: f64,
}

impl Default for ResponsiveConfig {
    fn default() -> Self {
        Self {
            tablet_width: 600.0,
            desktop_width: 1024.0,
        }
    }
}

impl ResponsiveConfig {
    /// Parses a TOML document.
    pub fn from_toml_str(source: &str) -> ThemeResult<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Reads and parses a TOML file.
    pub fn load(path: &Path) -> ThemeResult<Self> {
        let source = std::fs::read_to_string(path).map_err(|source| ThemeError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Class of a width given in dp.
    pub fn classify_dp(&self, width: f64) -> DeviceType {
        if width < self.tablet_width {
            DeviceType::Mobile
        } else if width < self.desktop_width {
            DeviceType::Tablet
        } else {
            DeviceType::Desktop
        }
    }

    /// Class of a width given in pixels.
    pub fn classify(&self, width: f32) -> DeviceType {
        self.classify_dp(Dp::from_pixels_f32(width).0)
    }
}

/// Old and new class of a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceTypeChange {
    /// Class before the resize.
    pub old: DeviceType,
    /// Class after the resize.
    pub new: DeviceType,
}

/// State of a [`ResponsiveLayout`].
pub struct ResponsiveState {
    /// Thresholds in use.
    pub config: ResponsiveConfig,
    /// Current class.
    pub device_type: Property<DeviceType>,
    /// Fired when the class changes.
    pub on_device_type_changed: Signal<DeviceTypeChange>,
    views: RefCell<[Option<Widget>; 3]>,
    window: RefCell<Option<(Window, ObserverId)>>,
}

impl std::fmt::Debug for ResponsiveState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponsiveState")
            .field("config", &self.config)
            .field("device_type", &self.device_type.get())
            .finish_non_exhaustive()
    }
}

impl WidgetFeature for ResponsiveState {
    fn name(&self) -> &'static str {
        "responsive"
    }

    fn on_destroy(&self, _widget: &Widget) {
        if let Some((window, id)) = self.window.borrow_mut().take() {
            window.size().unbind(id);
        }
        // Hidden views are owned here only.
        for view in self.views.borrow().iter().flatten() {
            if view.parent().is_none() {
                view.destroy();
            }
        }
    }
}

impl ResponsiveState {
    fn view_for(&self, device: DeviceType) -> Option<Widget> {
        let views = self.views.borrow();
        device
            .fallbacks()
            .into_iter()
            .find_map(|d| views[d.index()].clone())
    }
}

/// Views for each class. Missing views fall back to the closest class.
#[derive(Debug, Clone, Default)]
pub struct ResponsiveViews {
    /// View for narrow windows.
    pub mobile: Option<Widget>,
    /// View for medium windows.
    pub tablet: Option<Widget>,
    /// View for wide windows.
    pub desktop: Option<Widget>,
}

/// Shows the view matching the window size.
#[derive(Clone)]
pub struct ResponsiveLayout {
    widget: Widget,
    /// Class tracking and views.
    pub state: Rc<ResponsiveState>,
}

widget_wrapper!(ResponsiveLayout);

fn fill(widget: &Widget) {
    let rect = widget.rect();
    for child in widget.children() {
        child.pos.set(rect.position());
        child.size.set(rect.size());
    }
}

impl ResponsiveLayout {
    /// Creates the layout. With a window in `ctx` it covers the window and
    /// follows its size; without one it follows its own width.
    pub fn new(ctx: &BuildContext, config: ResponsiveConfig, views: ResponsiveViews) -> Self {
        let widget = Widget::new("ResponsiveLayout");
        let state = Rc::new(ResponsiveState {
            config,
            device_type: Property::new("device_type", DeviceType::Mobile),
            on_device_type_changed: Signal::new(),
            views: RefCell::new([views.mobile, views.tablet, views.desktop]),
            window: RefCell::new(None),
        });
        widget.attach_feature(state.clone());
        on_geometry(&widget, fill);

        let layout = Self { widget, state };
        if let Some(window) = &ctx.window {
            layout.size.set(window.size().get());
            let target = layout.widget.downgrade();
            let id = window.size().bind(move |size| {
                if let Some(widget) = target.upgrade() {
                    widget.size.set(*size);
                }
            });
            *layout.state.window.borrow_mut() = Some((window.clone(), id));
        }
        let target = layout.widget.downgrade();
        layout.size.bind(move |size| {
            if let Some(widget) = target.upgrade()
                && let Some(layout) = ResponsiveLayout::from_widget(widget)
            {
                layout.update(*size);
            }
        });
        let device = config.classify(layout.size.get().width);
        layout.state.device_type.set(device);
        layout.show(device);
        layout
    }

    /// Layout handle for a widget built by [`ResponsiveLayout::new`].
    pub fn from_widget(widget: Widget) -> Option<Self> {
        let state = widget.feature::<ResponsiveState>()?;
        Some(Self { widget, state })
    }

    /// Reclassifies for `size` and swaps the view when the class changed.
    pub fn update(&self, size: PxSize) {
        let old = self.state.device_type.get();
        let new = self.state.config.classify(size.width);
        if old == new {
            return;
        }
        debug!(?old, ?new, width = size.width, "device type changed");
        self.state.device_type.set(new);
        self.show(new);
        self.state
            .on_device_type_changed
            .emit(&DeviceTypeChange { old, new });
    }

    fn show(&self, device: DeviceType) {
        let wanted = self.state.view_for(device);
        for child in self.children() {
            if Some(&child) != wanted.as_ref() {
                self.remove_widget(&child);
            }
        }
        if let Some(view) = wanted
            && view.parent().is_none()
        {
            self.add_widget(&view);
            fill(&self.widget);
        }
    }

    /// Current class.
    pub fn device_type(&self) -> DeviceType {
        self.state.device_type.get()
    }

    /// The view registered for `device`, shown or not.
    pub fn view(&self, device: DeviceType) -> Option<Widget> {
        self.state.views.borrow()[device.index()].clone()
    }

    /// Replaces the view for `device`; takes effect right away when that
    /// class is showing.
    pub fn set_view(&self, device: DeviceType, view: Option<Widget>) {
        self.state.views.borrow_mut()[device.index()] = view;
        self.show(self.device_type());
    }

    /// Fired when the class changes.
    pub fn on_device_type_changed(&self) -> &Signal<DeviceTypeChange> {
        &self.state.on_device_type_changed
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    fn views() -> ResponsiveViews {
        ResponsiveViews {
            mobile: Some(Widget::new("Mobile")),
            tablet: Some(Widget::new("Tablet")),
            desktop: Some(Widget::new("Desktop")),
        }
    }

    #[test]
    fn thresholds_are_exclusive_upper_bounds() {
        let config = ResponsiveConfig::default();
        assert_eq!(config.classify_dp(599.9), DeviceType::Mobile);
        assert_eq!(config.classify_dp(600.0), DeviceType::Tablet);
        assert_eq!(config.classify_dp(1023.0), DeviceType::Tablet);
        assert_eq!(config.classify_dp(1024.0), DeviceType::Desktop);
        assert!(ResponsiveConfig::from_toml_str("phone_width = 1").is_err());
    }

    #[test]
    fn window_resize_swaps_views_without_destroying() {
        let window = Window::new(PxSize::new(400.0, 800.0));
        let ctx = BuildContext::new().with_window(window.clone());
        let layout = ResponsiveLayout::new(&ctx, ResponsiveConfig::default(), views());
        assert_eq!(layout.device_type(), DeviceType::Mobile);
        let mobile = layout.view(DeviceType::Mobile).expect("mobile view");
        assert_eq!(layout.children(), vec![mobile.clone()]);

        let changes = Rc::new(Cell::new(0));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let (c, s) = (changes.clone(), seen.clone());
        layout.on_device_type_changed().connect(move |change| {
            c.set(c.get() + 1);
            s.borrow_mut().push((change.old, change.new));
        });

        window.size().set(PxSize::new(1280.0, 800.0));
        assert_eq!(layout.device_type(), DeviceType::Desktop);
        assert_eq!(
            *seen.borrow(),
            vec![(DeviceType::Mobile, DeviceType::Desktop)]
        );
        assert!(!mobile.is_destroyed());
        assert!(mobile.parent().is_none());
        let desktop = layout.view(DeviceType::Desktop).expect("desktop view");
        assert_eq!(desktop.size.get(), PxSize::new(1280.0, 800.0));

        window.size().set(PxSize::new(1300.0, 800.0));
        assert_eq!(changes.get(), 1);
    }

    #[test]
    fn missing_view_falls_back_to_the_closest_class() {
        let ctx = BuildContext::new();
        let only_mobile = ResponsiveViews {
            mobile: Some(Widget::new("Mobile")),
            ..ResponsiveViews::default()
        };
        let layout = ResponsiveLayout::new(&ctx, ResponsiveConfig::default(), only_mobile);
        layout.size.set(PxSize::new(800.0, 600.0));
        assert_eq!(layout.device_type(), DeviceType::Tablet);
        assert_eq!(layout.children()[0].kind(), "Mobile");
        layout.set_view(DeviceType::Tablet, Some(Widget::new("Tablet")));
        assert_eq!(layout.children()[0].kind(), "Tablet");
    }
}
