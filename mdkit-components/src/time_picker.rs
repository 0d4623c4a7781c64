//! Time pickers: a clock dial in a vertical or horizontal dialog, or two
//! text fields for typed input.
//!
//! The dial selects hours or minutes depending on the active selector. In
//! 24-hour mode the inner ring of the dial holds the afternoon hours. Times
//! outside `min_time..=max_time` are refused.

use std::{
    cell::Cell,
    f32::consts::PI,
    rc::{Rc, Weak},
};

use chrono::{NaiveTime, Timelike};
use derive_setters::Setters;
use mdkit_ui::{
    Canvas, CanvasLayer, Dp, Instruction, Property, PxPosition, PxRect, PxSize, Signal,
    TouchEvent, TouchPhase, TouchResponse, Widget, WidgetFeature,
};
use smallvec::smallvec;
use tracing::{debug, trace};

use crate::{
    behaviors::themable::{Themable, ThemedColor},
    button::{Button, ButtonArgs, ButtonStyle},
    context::BuildContext,
    dialog::{
        Dialog, DialogArgs, WeakDialog, dialog_buttons, dialog_content, dialog_supporting_text,
    },
    error::CompositionError,
    font_styles::FontRole,
    label::{Label, LabelArgs, content_slot},
    layout::{Arrangement, CrossAxisAlignment, column_extent, place_column, place_row, row_extent},
    role::Role,
    shape::Shape,
    surface::{Clickable, on_geometry},
    text_field::{HelperTextMode, TextField, TextFieldArgs, TextFieldMode},
};

/// Time picker tokens.
pub struct TimePickerDefaults;

impl TimePickerDefaults {
    /// Width of the vertical and input variants.
    pub const WIDTH: Dp = Dp(328.0);
    /// Width of the horizontal variant.
    pub const HORIZONTAL_WIDTH: Dp = Dp(528.0);
    /// Dial diameter.
    pub const DIAL_SIZE: Dp = Dp(256.0);
    /// Diameter of the selection knob at the end of the hand.
    pub const KNOB_SIZE: Dp = Dp(48.0);
    /// Hand thickness.
    pub const HAND_WIDTH: Dp = Dp(2.0);
    /// Fraction of the dial radius below which the inner ring starts.
    pub const INNER_RING: f32 = 0.6;
    /// Gap between the display and the dial.
    pub const SPACING: Dp = Dp(24.0);
    /// Supporting text of the dial variants.
    pub const DIAL_TITLE: &'static str = "Select time";
    /// Supporting text of the input variant.
    pub const INPUT_TITLE: &'static str = "Enter time";
    /// Error for typed text that is not a valid time.
    pub const INVALID_TIME: &'static str = "Invalid time";
    /// Error for a time outside the allowed range.
    pub const OUT_OF_RANGE: &'static str = "Time out of range";
    /// Confirm button text.
    pub const OK_TEXT: &'static str = "OK";
    /// Dismiss button text.
    pub const CANCEL_TEXT: &'static str = "Cancel";
}

/// Kind of the hour label.
pub const HOUR_LABEL: &str = "TimePickerHour";
/// Kind of the minute label.
pub const MINUTE_LABEL: &str = "TimePickerMinute";
/// Kind of the period label.
pub const AM_PM_LABEL: &str = "TimePickerAmPm";
/// Kind of the dial.
pub const DIAL: &str = "TimePickerDial";

/// Presentation of the picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimePickerKind {
    /// Display above the dial.
    #[default]
    DialVertical,
    /// Display beside the dial.
    DialHorizontal,
    /// Two text fields.
    Input,
}

/// Which part of the time the dial edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeSelector {
    /// Hours.
    #[default]
    Hour,
    /// Minutes.
    Minute,
}

/// Half of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmPm {
    /// Before noon.
    Am,
    /// Noon and after.
    Pm,
}

impl AmPm {
    /// Period of `hour` in 0..24.
    pub fn of(hour: u32) -> Self {
        if hour < 12 { Self::Am } else { Self::Pm }
    }

    /// Display text.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Am => "AM",
            Self::Pm => "PM",
        }
    }
}

/// Arguments for [`TimePicker::new`].
#[derive(Debug, Clone, PartialEq, Default, Setters)]
pub struct TimePickerArgs {
    /// Presentation.
    pub kind: TimePickerKind,
    /// Initial time; midnight when `None`.
    #[setters(strip_option)]
    pub time: Option<NaiveTime>,
    /// 24-hour clock instead of 12 hours with a period.
    pub is_24h: bool,
    /// Earliest selectable time.
    #[setters(strip_option)]
    pub min_time: Option<NaiveTime>,
    /// Latest selectable time.
    #[setters(strip_option)]
    pub max_time: Option<NaiveTime>,
}

/// Clockwise angle in degrees from twelve o'clock of `pos` around `center`.
pub fn clock_angle(center: PxPosition, pos: PxPosition) -> f32 {
    let degrees = (pos.x - center.x).atan2(pos.y - center.y).to_degrees();
    degrees.rem_euclid(360.0)
}

/// Selected time and editing state of a time picker.
pub struct TimePickerState {
    /// Presentation.
    pub kind: TimePickerKind,
    /// 24-hour clock.
    pub is_24h: bool,
    /// Selected time, seconds always zero.
    pub time: Property<NaiveTime>,
    /// Part edited by the dial.
    pub selector: Property<TimeSelector>,
    /// Whether the text fields are shown instead of the dial.
    pub editing: Property<bool>,
    /// Earliest selectable time.
    pub min_time: Property<Option<NaiveTime>>,
    /// Latest selectable time.
    pub max_time: Property<Option<NaiveTime>>,
    /// Problem with the typed time, if any.
    pub error: Property<Option<String>>,
    /// Fired with the time when confirmed.
    pub on_ok: Signal<NaiveTime>,
    /// Fired when dismissed through the cancel button.
    pub on_cancel: Signal<()>,
    /// Fired with the new editing flag.
    pub on_edit: Signal<bool>,
    /// Fired when the period changes.
    pub on_am_pm: Signal<AmPm>,
    /// Fired when the dial switches to hours.
    pub on_selector_hour: Signal<()>,
    /// Fired when the dial switches to minutes.
    pub on_selector_minute: Signal<()>,
    parts: Parts,
}

struct Parts {
    hour: Label,
    minute: Label,
    am_pm: Option<Label>,
    hour_field: TextField,
    minute_field: TextField,
    body: Widget,
    display: Widget,
    input: Widget,
    dial: Option<Widget>,
}

impl std::fmt::Debug for TimePickerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimePickerState")
            .field("kind", &self.kind)
            .field("time", &self.time.get())
            .field("selector", &self.selector.get())
            .finish_non_exhaustive()
    }
}

impl WidgetFeature for TimePickerState {
    fn name(&self) -> &'static str {
        "time_picker"
    }
}

impl TimePickerState {
    /// Whether `time` lies inside the allowed range.
    pub fn is_time_enabled(&self, time: NaiveTime) -> bool {
        self.min_time.get().is_none_or(|min| time >= min)
            && self.max_time.get().is_none_or(|max| time <= max)
    }

    fn set_time(&self, time: NaiveTime) -> bool {
        if !self.is_time_enabled(time) {
            debug!(%time, "time outside the allowed range");
            return false;
        }
        let before = AmPm::of(self.time.get().hour());
        self.time.set(time);
        let after = AmPm::of(time.hour());
        if before != after {
            self.on_am_pm.emit(&after);
        }
        true
    }

    fn display_hour(&self) -> u32 {
        let hour = self.time.get().hour();
        match (self.is_24h, hour % 12) {
            (true, _) => hour,
            (false, 0) => 12,
            (false, h) => h,
        }
    }

    fn refresh(&self) {
        let time = self.time.get();
        self.parts.hour.set_text(format!("{:02}", self.display_hour()));
        self.parts.minute.set_text(format!("{:02}", time.minute()));
        if let Some(label) = &self.parts.am_pm {
            label.set_text(AmPm::of(time.hour()).as_str());
        }
        let (hour_role, minute_role) = match self.selector.get() {
            TimeSelector::Hour => (Role::Primary, Role::OnSurface),
            TimeSelector::Minute => (Role::OnSurface, Role::Primary),
        };
        for (label, role) in [(&self.parts.hour, hour_role), (&self.parts.minute, minute_role)] {
            if let Some(color) = content_slot(label) {
                color.set_role(role);
            }
        }
    }

    /// Parses the typed hour and minute into a time in the current period.
    fn parse_input(&self, hour: &str, minute: &str) -> Result<NaiveTime, &'static str> {
        let hour: u32 = hour.trim().parse().map_err(|_| TimePickerDefaults::INVALID_TIME)?;
        let minute: u32 = minute.trim().parse().map_err(|_| TimePickerDefaults::INVALID_TIME)?;
        let hour = match (self.is_24h, hour) {
            (true, h) if h < 24 => h,
            (false, h @ 1..=12) => {
                let pm = AmPm::of(self.time.get().hour()) == AmPm::Pm;
                h % 12 + if pm { 12 } else { 0 }
            }
            _ => return Err(TimePickerDefaults::INVALID_TIME),
        };
        let time =
            NaiveTime::from_hms_opt(hour, minute, 0).ok_or(TimePickerDefaults::INVALID_TIME)?;
        if self.is_time_enabled(time) {
            Ok(time)
        } else {
            Err(TimePickerDefaults::OUT_OF_RANGE)
        }
    }

    fn show_parts(&self) {
        let parts = &self.parts;
        parts.body.clear_widgets();
        if self.editing.get() {
            parts.body.add_widget(&parts.input);
        } else {
            parts.body.add_widget(&parts.display);
            if let Some(dial) = &parts.dial {
                parts.body.add_widget(dial);
            }
        }
        fit_body(&parts.body, self.kind);
    }
}

fn body_arrangement() -> Arrangement {
    Arrangement::spaced(TimePickerDefaults::SPACING).cross(CrossAxisAlignment::Center)
}

fn time_row(kind: &'static str, children: Vec<Widget>) -> Widget {
    let row = Widget::new(kind);
    for child in &children {
        row.add_widget(child);
    }
    let arrangement = Arrangement::spaced(Dp(4.0)).cross(CrossAxisAlignment::Center);
    row.size.set(row_extent(&row.children(), &arrangement));
    on_geometry(&row, move |r| place_row(r.rect(), &r.children(), &arrangement));
    row
}

fn fit_body(body: &Widget, kind: TimePickerKind) {
    let arrangement = body_arrangement();
    let size = match kind {
        TimePickerKind::DialHorizontal => row_extent(&body.children(), &arrangement),
        TimePickerKind::DialVertical | TimePickerKind::Input => {
            column_extent(&body.children(), &arrangement)
        }
    };
    body.size.set(size);
    if let Some(content) = body.parent() {
        let outer = Arrangement::spaced(Dp(8.0)).cross(CrossAxisAlignment::Start);
        content.size.set(column_extent(&content.children(), &outer));
    }
}

/// Clock face with a hand pointing at the selected hour or minute.
struct DialState {
    picker: Weak<TimePickerState>,
    face: Rc<ThemedColor>,
    hand: Rc<ThemedColor>,
    touch: Cell<Option<u64>>,
}

impl DialState {
    fn select_at(&self, widget: &Widget, pos: PxPosition) {
        let Some(picker) = self.picker.upgrade() else {
            return;
        };
        let rect = widget.rect();
        let center = rect.center();
        let radius = rect.width.min(rect.height) / 2.0;
        let distance = (pos.x - center.x).hypot(pos.y - center.y);
        let inner = distance < radius * TimePickerDefaults::INNER_RING;
        select_at_angle(&picker, clock_angle(center, pos), inner);
    }
}

impl WidgetFeature for DialState {
    fn name(&self) -> &'static str {
        "time_picker_dial"
    }

    fn draw(&self, widget: &Widget, canvas: &mut Canvas) {
        let Some(picker) = self.picker.upgrade() else {
            return;
        };
        let rect = widget.rect();
        let center = rect.center();
        canvas.push(CanvasLayer::Main, Instruction::Color(self.face.get()));
        canvas.push(CanvasLayer::Main, Shape::Ellipse.fill(rect));

        let inner = picker.is_24h
            && picker.selector.get() == TimeSelector::Hour
            && picker.time.get().hour() >= 12;
        let knob = TimePickerDefaults::KNOB_SIZE.to_pixels_f32();
        let mut reach = rect.width.min(rect.height) / 2.0 - knob / 2.0;
        if inner {
            reach *= TimePickerDefaults::INNER_RING;
        }
        let radians = dial_angle(&picker) * PI / 180.0;
        let tip = PxPosition::new(
            center.x + reach * radians.sin(),
            center.y + reach * radians.cos(),
        );
        canvas.push(CanvasLayer::Main, Instruction::Color(self.hand.get()));
        canvas.push(
            CanvasLayer::Main,
            Instruction::Line {
                points: smallvec![center, tip],
                width: TimePickerDefaults::HAND_WIDTH.to_pixels_f32(),
                close: false,
            },
        );
        canvas.push(
            CanvasLayer::Main,
            Shape::Ellipse.fill(PxRect::new(tip.x - knob / 2.0, tip.y - knob / 2.0, knob, knob)),
        );
    }

    fn on_touch(&self, widget: &Widget, touch: &TouchEvent) -> TouchResponse {
        match touch.phase {
            TouchPhase::Down => {
                if widget.is_effectively_disabled() || self.touch.get().is_some() {
                    return TouchResponse::Ignored;
                }
                self.touch.set(Some(touch.id));
                self.select_at(widget, touch.pos);
                TouchResponse::Grab
            }
            TouchPhase::Move if self.touch.get() == Some(touch.id) => {
                self.select_at(widget, touch.pos);
                TouchResponse::Consumed
            }
            TouchPhase::Up if self.touch.get() == Some(touch.id) => {
                self.touch.set(None);
                self.select_at(widget, touch.pos);
                if let Some(picker) = self.picker.upgrade()
                    && picker.selector.get() == TimeSelector::Hour
                {
                    set_selector(&picker, TimeSelector::Minute);
                }
                TouchResponse::Consumed
            }
            TouchPhase::Cancel if self.touch.get() == Some(touch.id) => {
                self.touch.set(None);
                TouchResponse::Consumed
            }
            _ => TouchResponse::Ignored,
        }
    }
}

fn dial_angle(state: &TimePickerState) -> f32 {
    let time = state.time.get();
    match state.selector.get() {
        TimeSelector::Hour => (time.hour() % 12) as f32 * 30.0,
        TimeSelector::Minute => time.minute() as f32 * 6.0,
    }
}

fn select_at_angle(state: &TimePickerState, angle: f32, inner: bool) -> bool {
    let time = state.time.get();
    let step = angle.rem_euclid(360.0);
    let next = match state.selector.get() {
        TimeSelector::Hour => {
            let position = (step / 30.0).round() as u32 % 12;
            let hour = match (state.is_24h, inner) {
                (true, true) => position + 12,
                (true, false) => position,
                (false, _) if AmPm::of(time.hour()) == AmPm::Pm => position + 12,
                (false, _) => position,
            };
            time.with_hour(hour)
        }
        TimeSelector::Minute => time.with_minute((step / 6.0).round() as u32 % 60),
    };
    trace!(angle, ?next, "dial selection");
    next.is_some_and(|t| t == time || state.set_time(t))
}

fn set_selector(state: &TimePickerState, selector: TimeSelector) {
    if state.selector.set(selector) {
        match selector {
            TimeSelector::Hour => state.on_selector_hour.emit(&()),
            TimeSelector::Minute => state.on_selector_minute.emit(&()),
        }
    }
}

/// A time picker dialog.
#[derive(Clone)]
pub struct TimePicker {
    widget: Widget,
    /// The hosting dialog.
    pub dialog: Dialog,
    /// Time and editing state.
    pub state: Rc<TimePickerState>,
}

widget_wrapper!(TimePicker);

impl TimePicker {
    /// Creates a closed picker.
    pub fn new(ctx: &BuildContext, args: TimePickerArgs) -> Result<Self, CompositionError> {
        let time = args.time.unwrap_or(NaiveTime::MIN);
        let time = NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(NaiveTime::MIN);
        let display_label = |kind: &'static str| {
            Label::with_kind(
                ctx,
                kind,
                LabelArgs::new("")
                    .font_style("Display")
                    .role(FontRole::Medium)
                    .text_color(Role::OnSurface),
            )
        };
        let hour = display_label(HOUR_LABEL);
        let minute = display_label(MINUTE_LABEL);
        let separator = Label::new(
            ctx,
            LabelArgs::new(":")
                .font_style("Display")
                .role(FontRole::Medium),
        );
        let am_pm = (!args.is_24h).then(|| {
            Label::with_kind(
                ctx,
                AM_PM_LABEL,
                LabelArgs::new("")
                    .font_style("Title")
                    .role(FontRole::Medium)
                    .text_color(Role::OnSurfaceVariant),
            )
        });
        let mut display_children: Vec<Widget> =
            vec![hour.clone().into(), separator.into(), minute.clone().into()];
        if let Some(label) = &am_pm {
            display_children.push(label.clone().into());
        }
        let display = time_row("TimePickerDisplay", display_children);

        let field = |hint: &str| {
            let field = TextField::new(
                ctx,
                TextFieldArgs::default()
                    .mode(TextFieldMode::Outlined)
                    .hint_text(hint)
                    .helper_text(TimePickerDefaults::INVALID_TIME)
                    .helper_text_mode(HelperTextMode::OnError)
                    .max_text_length(2usize),
            );
            field.size.set(PxSize::from_dp(Dp(96.0), Dp(72.0)));
            field
        };
        let hour_field = field("Hour");
        let minute_field = field("Minute");
        let input = time_row(
            "TimePickerInput",
            vec![hour_field.clone().into(), minute_field.clone().into()],
        );

        let dial = (args.kind != TimePickerKind::Input).then(|| {
            let dial = Widget::new(DIAL);
            dial.size.set(PxSize::from_dp(
                TimePickerDefaults::DIAL_SIZE,
                TimePickerDefaults::DIAL_SIZE,
            ));
            dial
        });
        let body = Widget::new("TimePickerBody");
        let kind = args.kind;
        on_geometry(&body, move |b| {
            let arrangement = body_arrangement();
            match kind {
                TimePickerKind::DialHorizontal => place_row(b.rect(), &b.children(), &arrangement),
                TimePickerKind::DialVertical | TimePickerKind::Input => {
                    place_column(b.rect(), &b.children(), &arrangement)
                }
            }
        });

        let title = match args.kind {
            TimePickerKind::Input => TimePickerDefaults::INPUT_TITLE,
            TimePickerKind::DialVertical | TimePickerKind::DialHorizontal => {
                TimePickerDefaults::DIAL_TITLE
            }
        };
        let cancel = Button::new(
            ctx,
            ButtonArgs::new(ButtonStyle::Text).text(TimePickerDefaults::CANCEL_TEXT),
        );
        let ok = Button::new(
            ctx,
            ButtonArgs::new(ButtonStyle::Text).text(TimePickerDefaults::OK_TEXT),
        );
        let width = match args.kind {
            TimePickerKind::DialHorizontal => TimePickerDefaults::HORIZONTAL_WIDTH,
            TimePickerKind::DialVertical | TimePickerKind::Input => TimePickerDefaults::WIDTH,
        };
        let dialog = Dialog::compose(
            ctx,
            DialogArgs::default().width(width),
            [
                dialog_supporting_text(ctx, title).into(),
                dialog_content([body.clone()]),
                dialog_buttons([cancel.clone(), ok.clone()]),
            ],
        )?;

        let state = Rc::new(TimePickerState {
            kind: args.kind,
            is_24h: args.is_24h,
            time: Property::new("time", time),
            selector: Property::new("selector", TimeSelector::Hour),
            editing: Property::new("editing", args.kind == TimePickerKind::Input),
            min_time: Property::new("min_time", args.min_time),
            max_time: Property::new("max_time", args.max_time),
            error: Property::new("error", None),
            on_ok: Signal::new(),
            on_cancel: Signal::new(),
            on_edit: Signal::new(),
            on_am_pm: Signal::new(),
            on_selector_hour: Signal::new(),
            on_selector_minute: Signal::new(),
            parts: Parts {
                hour,
                minute,
                am_pm,
                hour_field,
                minute_field,
                body,
                display,
                input,
                dial,
            },
        });
        if let Some(dial) = &state.parts.dial {
            let themable = Themable::of(dial, &ctx.theme);
            dial.attach_feature(Rc::new(DialState {
                picker: Rc::downgrade(&state),
                face: themable.color_slot("face_color", Role::SurfaceContainerHighest, None),
                hand: themable.color_slot("hand_color", Role::Primary, None),
                touch: Cell::new(None),
            }));
        }
        let widget = Widget::from(&dialog);
        widget.attach_feature(state.clone());
        let picker = Self {
            widget,
            dialog,
            state,
        };
        picker.connect(&ok, &cancel);
        picker.state.show_parts();
        picker.state.refresh();
        Ok(picker)
    }

    fn connect(&self, ok: &Button, cancel: &Button) {
        let weak = Rc::downgrade(&self.state);
        self.state.time.bind(move |_| {
            if let Some(state) = weak.upgrade() {
                state.refresh();
            }
        });
        let weak = Rc::downgrade(&self.state);
        self.state.selector.bind(move |_| {
            if let Some(state) = weak.upgrade() {
                state.refresh();
            }
        });
        let weak = Rc::downgrade(&self.state);
        self.state.error.bind(move |error| {
            if let Some(state) = weak.upgrade() {
                for field in [&state.parts.hour_field, &state.parts.minute_field] {
                    field.set_error_message(error.clone());
                }
            }
        });
        for (label, selector) in [
            (&self.state.parts.hour, TimeSelector::Hour),
            (&self.state.parts.minute, TimeSelector::Minute),
        ] {
            let weak = Rc::downgrade(&self.state);
            Clickable::attach(label).on_release.connect(move |_| {
                if let Some(state) = weak.upgrade() {
                    set_selector(&state, selector);
                }
            });
        }
        if let Some(label) = &self.state.parts.am_pm {
            let handle = self.downgrade();
            Clickable::attach(label).on_release.connect(move |_| {
                if let Some(picker) = handle.upgrade() {
                    let next = match picker.am_pm() {
                        AmPm::Am => AmPm::Pm,
                        AmPm::Pm => AmPm::Am,
                    };
                    picker.set_am_pm(next);
                }
            });
        }
        let handle = self.downgrade();
        ok.on_release().connect(move |_| {
            if let Some(picker) = handle.upgrade() {
                picker.ok();
            }
        });
        let handle = self.downgrade();
        cancel.on_release().connect(move |_| {
            if let Some(picker) = handle.upgrade() {
                picker.cancel();
            }
        });
    }

    /// Shows the picker on the window of the build context.
    pub fn open(&self) {
        self.dialog.open();
    }

    /// Closes the picker without firing `on_ok` or `on_cancel`.
    pub fn dismiss(&self) {
        self.dialog.dismiss();
    }

    /// Whether the picker is shown.
    pub fn is_open(&self) -> bool {
        self.dialog.state.is_open.get()
    }

    /// Selected time.
    pub fn time(&self) -> NaiveTime {
        self.state.time.get()
    }

    /// Selects `time`, dropping seconds. Refused outside the allowed range.
    pub fn set_time(&self, time: NaiveTime) -> bool {
        NaiveTime::from_hms_opt(time.hour(), time.minute(), 0)
            .is_some_and(|time| self.state.set_time(time))
    }

    /// Sets the hour, 0..24.
    pub fn set_hour(&self, hour: u32) -> bool {
        self.time().with_hour(hour).is_some_and(|t| self.state.set_time(t))
    }

    /// Sets the minute, 0..60.
    pub fn set_minute(&self, minute: u32) -> bool {
        self.time().with_minute(minute).is_some_and(|t| self.state.set_time(t))
    }

    /// Current period.
    pub fn am_pm(&self) -> AmPm {
        AmPm::of(self.time().hour())
    }

    /// Moves the time into `period`, keeping the hour on the clock face.
    pub fn set_am_pm(&self, period: AmPm) -> bool {
        let hour = self.time().hour() % 12;
        let hour = match period {
            AmPm::Am => hour,
            AmPm::Pm => hour + 12,
        };
        self.set_hour(hour)
    }

    /// Hour as shown: 1..=12, or 0..24 on a 24-hour clock.
    pub fn display_hour(&self) -> u32 {
        self.state.display_hour()
    }

    /// The time formatted for the clock in use.
    pub fn time_text(&self) -> String {
        let minute = self.time().minute();
        if self.state.is_24h {
            format!("{:02}:{minute:02}", self.display_hour())
        } else {
            format!("{:02}:{minute:02} {}", self.display_hour(), self.am_pm().as_str())
        }
    }

    /// Switches the dial between hours and minutes.
    pub fn set_selector(&self, selector: TimeSelector) {
        set_selector(&self.state, selector);
    }

    /// Angle of the dial hand in degrees, clockwise from twelve o'clock.
    pub fn dial_angle(&self) -> f32 {
        dial_angle(&self.state)
    }

    /// Selects the hour or minute the dial shows at `angle`. On a 24-hour
    /// clock `inner` picks an hour from the inner ring.
    pub fn select_at_angle(&self, angle: f32, inner: bool) -> bool {
        select_at_angle(&self.state, angle, inner)
    }

    /// Swaps between the dial and the text fields. The input variant has no
    /// dial to return to.
    pub fn toggle_edit(&self) {
        let state = &self.state;
        if state.editing.get() && state.parts.dial.is_none() {
            return;
        }
        let editing = !state.editing.get();
        if editing {
            state.parts.hour_field.set_text(format!("{:02}", state.display_hour()));
            state.parts.minute_field.set_text(format!("{:02}", self.time().minute()));
        } else {
            state.error.set(None);
        }
        state.editing.set(editing);
        state.show_parts();
        debug!(editing, "time picker edit mode");
        state.on_edit.emit(&editing);
    }

    /// Applies typed hour and minute text. On failure the fields show the
    /// error and the selected time is kept.
    pub fn set_input(&self, hour: &str, minute: &str) -> bool {
        let state = &self.state;
        state.parts.hour_field.set_text(hour);
        state.parts.minute_field.set_text(minute);
        self.apply_input()
    }

    fn apply_input(&self) -> bool {
        let state = &self.state;
        let hour = state.parts.hour_field.text();
        let minute = state.parts.minute_field.text();
        match state.parse_input(&hour, &minute) {
            Ok(time) => {
                state.error.set(None);
                state.set_time(time)
            }
            Err(message) => {
                state.error.set(Some(message.to_owned()));
                false
            }
        }
    }

    /// Confirms the time. While editing, the typed text is applied first
    /// and an invalid entry keeps the picker open.
    pub fn ok(&self) -> bool {
        if self.state.editing.get() && !self.apply_input() {
            return false;
        }
        let time = self.time();
        debug!(%time, "time picker confirmed");
        self.state.on_ok.emit(&time);
        self.dismiss();
        true
    }

    /// Closes the picker and fires `on_cancel`.
    pub fn cancel(&self) {
        self.state.on_cancel.emit(&());
        self.dismiss();
    }

    fn downgrade(&self) -> WeakTimePicker {
        WeakTimePicker {
            dialog: self.dialog.downgrade(),
            state: Rc::downgrade(&self.state),
        }
    }
}

struct WeakTimePicker {
    dialog: WeakDialog,
    state: Weak<TimePickerState>,
}

impl WeakTimePicker {
    fn upgrade(&self) -> Option<TimePicker> {
        let dialog = self.dialog.upgrade()?;
        Some(TimePicker {
            widget: Widget::from(&dialog),
            dialog,
            state: self.state.upgrade()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use mdkit_ui::Window;

    use super::*;

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).expect("valid time")
    }

    #[test]
    fn twelve_hour_clock_shows_period() {
        let ctx = BuildContext::new();
        let picker =
            TimePicker::new(&ctx, TimePickerArgs::default().time(at(19, 5))).expect("picker");
        assert_eq!(picker.display_hour(), 7);
        assert_eq!(picker.time_text(), "07:05 PM");
        assert_eq!(picker.state.parts.hour.text(), "07");
        assert_eq!(picker.state.parts.am_pm.as_ref().map(|l| l.text()).as_deref(), Some("PM"));

        let periods = Rc::new(RefCell::new(Vec::new()));
        let p = periods.clone();
        picker.state.on_am_pm.connect(move |period| p.borrow_mut().push(*period));
        assert!(picker.set_am_pm(AmPm::Am));
        assert_eq!(picker.time(), at(7, 5));
        assert_eq!(*periods.borrow(), [AmPm::Am]);

        assert!(picker.set_hour(0));
        assert_eq!(picker.time_text(), "12:05 AM");

        let clock = TimePicker::new(&ctx, TimePickerArgs::default().time(at(19, 5)).is_24h(true))
            .expect("picker");
        assert_eq!(clock.time_text(), "19:05");
        assert!(clock.state.parts.am_pm.is_none());
    }

    #[test]
    fn dial_selects_hours_then_minutes() {
        let ctx = BuildContext::new();
        let picker =
            TimePicker::new(&ctx, TimePickerArgs::default().time(at(14, 0))).expect("picker");
        assert_eq!(picker.dial_angle(), 60.0);
        assert!(picker.select_at_angle(92.0, false));
        assert_eq!(picker.time(), at(15, 0));

        let minutes = Rc::new(Cell::new(0));
        let m = minutes.clone();
        picker.state.on_selector_minute.connect(move |_| m.set(m.get() + 1));
        picker.set_selector(TimeSelector::Minute);
        picker.set_selector(TimeSelector::Minute);
        assert_eq!(minutes.get(), 1);
        assert!(picker.select_at_angle(271.0, false));
        assert_eq!(picker.time(), at(15, 45));
        assert_eq!(picker.dial_angle(), 270.0);

        let clock = TimePicker::new(&ctx, TimePickerArgs::default().is_24h(true)).expect("picker");
        assert!(clock.select_at_angle(0.0, true));
        assert_eq!(clock.time(), at(12, 0));
        assert!(clock.select_at_angle(90.0, false));
        assert_eq!(clock.time(), at(3, 0));

        let center = PxPosition::new(0.0, 0.0);
        let near =
            |pos: PxPosition, expected: f32| (clock_angle(center, pos) - expected).abs() < 1e-3;
        assert!(near(PxPosition::new(0.0, 10.0), 0.0));
        assert!(near(PxPosition::new(10.0, 0.0), 90.0));
        assert!(near(PxPosition::new(-10.0, 0.0), 270.0));
    }

    #[test]
    fn bounds_refuse_times_outside_the_range() {
        let ctx = BuildContext::new();
        let picker = TimePicker::new(
            &ctx,
            TimePickerArgs::default()
                .time(at(9, 30))
                .min_time(at(9, 0))
                .max_time(at(17, 0)),
        )
        .expect("picker");
        assert!(!picker.set_hour(8));
        assert!(!picker.set_am_pm(AmPm::Pm));
        assert!(picker.set_hour(16));
        assert!(!picker.set_hour(18));
        assert_eq!(picker.time(), at(16, 30));
    }

    #[test]
    fn typed_input_is_validated_before_confirming() {
        let window = Window::new(PxSize::new(600.0, 800.0));
        let ctx = BuildContext::new().with_window(window);
        let picker = TimePicker::new(
            &ctx,
            TimePickerArgs::default().kind(TimePickerKind::Input).time(at(8, 0)),
        )
        .expect("picker");
        let confirmed = Rc::new(Cell::new(None));
        let c = confirmed.clone();
        picker.state.on_ok.connect(move |time| c.set(Some(*time)));
        picker.open();

        assert!(!picker.set_input("13", "00"));
        assert_eq!(picker.state.error.get().as_deref(), Some(TimePickerDefaults::INVALID_TIME));
        assert!(picker.state.parts.hour_field.is_error());
        assert!(!picker.ok());
        assert!(picker.is_open());

        assert!(picker.set_input("9", "45"));
        assert!(!picker.state.parts.minute_field.is_error());
        assert!(picker.ok());
        assert_eq!(confirmed.get(), Some(at(9, 45)));
        assert!(!picker.is_open());
    }

    #[test]
    fn toggling_edit_swaps_the_dial_for_fields() {
        let ctx = BuildContext::new();
        let picker =
            TimePicker::new(&ctx, TimePickerArgs::default().time(at(10, 20))).expect("picker");
        let body = picker.state.parts.body.clone();
        assert_eq!(body.child_count(), 2);
        assert!(body.children().iter().any(|c| c.kind() == DIAL));

        let edits = Rc::new(RefCell::new(Vec::new()));
        let e = edits.clone();
        picker.state.on_edit.connect(move |editing| e.borrow_mut().push(*editing));
        picker.toggle_edit();
        assert_eq!(body.child_count(), 1);
        assert_eq!(picker.state.parts.hour_field.text(), "10");
        assert_eq!(picker.state.parts.minute_field.text(), "20");
        picker.toggle_edit();
        assert_eq!(body.child_count(), 2);
        assert_eq!(*edits.borrow(), [true, false]);

        let input = TimePicker::new(&ctx, TimePickerArgs::default().kind(TimePickerKind::Input))
            .expect("picker");
        input.toggle_edit();
        assert!(input.state.editing.get());
    }
}
