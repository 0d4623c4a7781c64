//! Date pickers: modal, docked and text-input variants on top of a dialog.
//!
//! ## Usage
//!
//! Build a [`DatePicker`] with [`DatePickerArgs`], connect `on_ok` and
//! `on_cancel`, then `open` it. Days outside `min_date..=max_date` cannot be
//! selected, today is flagged in [`DatePicker::month_days`] when
//! `mark_today` is set, and the input variant parses what the user typed with
//! `date_format`, reporting problems through the field's error state.

use std::rc::{Rc, Weak};

use chrono::{Datelike, Local, Months, NaiveDate};
use derive_setters::Setters;
use mdkit_ui::{Dp, Property, Signal, Widget, WidgetFeature};
use tracing::{debug, warn};

use crate::{
    button::{Button, ButtonArgs, ButtonStyle},
    context::BuildContext,
    dialog::{
        Dialog, DialogArgs, WeakDialog, dialog_buttons, dialog_content, dialog_headline,
        dialog_supporting_text,
    },
    error::CompositionError,
    font_styles::FontRole,
    label::{Label, LabelArgs},
    role::Role,
    shape::Shape,
    text_field::{HELPER_TEXT, HelperTextMode, TextField, TextFieldArgs, TextFieldMode},
    theme::MaterialShapes,
};

/// Date picker tokens.
pub struct DatePickerDefaults;

impl DatePickerDefaults {
    /// Width of the modal and input variants.
    pub const MODAL_WIDTH: Dp = Dp(328.0);
    /// Width of the docked variant.
    pub const DOCKED_WIDTH: Dp = Dp(360.0);
    /// Text above the headline.
    pub const SUPPORTING_TEXT: &'static str = "Select date";
    /// Input format, in `strftime` notation.
    pub const DATE_FORMAT: &'static str = "%m/%d/%Y";
    /// Hint of the input field.
    pub const INPUT_HINT: &'static str = "mm/dd/yyyy";
    /// Error for text that does not parse.
    pub const INVALID_FORMAT: &'static str = "Invalid date format";
    /// Error for a date outside the allowed range.
    pub const OUT_OF_RANGE: &'static str = "Date out of range";
    /// Confirm button text.
    pub const OK_TEXT: &'static str = "OK";
    /// Dismiss button text.
    pub const CANCEL_TEXT: &'static str = "Cancel";
}

/// Kind of the month label.
pub const MONTH_LABEL: &str = "DatePickerMonthLabel";

/// Presentation of the picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DatePickerKind {
    /// Full dialog with a headline.
    #[default]
    Modal,
    /// Compact popup without a headline.
    Docked,
    /// Dialog with a text field instead of the calendar.
    Input,
}

/// How many days a selection holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateSelectionMode {
    /// One day.
    #[default]
    Single,
    /// A start and an end day.
    Range,
}

/// Arguments for [`DatePicker::new`].
#[derive(Debug, Clone, PartialEq, Setters)]
pub struct DatePickerArgs {
    /// Presentation.
    pub kind: DatePickerKind,
    /// Single day or range.
    pub mode: DateSelectionMode,
    /// Initially selected day.
    #[setters(strip_option)]
    pub date: Option<NaiveDate>,
    /// Earliest selectable day.
    #[setters(strip_option)]
    pub min_date: Option<NaiveDate>,
    /// Latest selectable day.
    #[setters(strip_option)]
    pub max_date: Option<NaiveDate>,
    /// Flag today in the month view.
    pub mark_today: bool,
    /// Today's date; the local date when `None`.
    #[setters(strip_option)]
    pub today: Option<NaiveDate>,
    /// Text above the headline.
    #[setters(into)]
    pub supporting_text: String,
    /// Input format of the input variant.
    #[setters(into)]
    pub date_format: String,
    /// Close on a scrim tap.
    pub auto_dismiss: bool,
}

impl Default for DatePickerArgs {
    fn default() -> Self {
        Self {
            kind: DatePickerKind::Modal,
            mode: DateSelectionMode::Single,
            date: None,
            min_date: None,
            max_date: None,
            mark_today: true,
            today: None,
            supporting_text: DatePickerDefaults::SUPPORTING_TEXT.to_owned(),
            date_format: DatePickerDefaults::DATE_FORMAT.to_owned(),
            auto_dismiss: true,
        }
    }
}

/// One day of the shown month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayCell {
    /// The day.
    pub date: NaiveDate,
    /// Today, with `mark_today` set.
    pub is_today: bool,
    /// Part of the selection.
    pub is_selected: bool,
    /// Strictly between the ends of a range selection.
    pub in_range: bool,
    /// Inside `min_date..=max_date`.
    pub enabled: bool,
}

/// Number of days in `month` of `year`.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.checked_add_months(Months::new(1)))
        .and_then(|next| next.pred_opt())
        .map_or(0, |last| last.day())
}

/// Selection and month state of a date picker.
pub struct DatePickerState {
    /// Presentation.
    pub kind: DatePickerKind,
    /// Single day or range.
    pub mode: DateSelectionMode,
    /// Shown `(year, month)`.
    pub month: Property<(i32, u32)>,
    /// Selected days: one, or start and end of a range.
    pub selection: Property<Vec<NaiveDate>>,
    /// Earliest selectable day.
    pub min_date: Property<Option<NaiveDate>>,
    /// Latest selectable day.
    pub max_date: Property<Option<NaiveDate>>,
    /// Flag today in the month view.
    pub mark_today: Property<bool>,
    /// Problem with the typed date, if any.
    pub error: Property<Option<String>>,
    /// Fired with the selection when confirmed.
    pub on_ok: Signal<Vec<NaiveDate>>,
    /// Fired when dismissed through the cancel button.
    pub on_cancel: Signal<()>,
    /// Fired with every day picked.
    pub on_select_day: Signal<NaiveDate>,
    /// Fired with the month when it changes.
    pub on_select_month: Signal<u32>,
    /// Fired with the year when it changes.
    pub on_select_year: Signal<i32>,
    today: NaiveDate,
    date_format: String,
    headline: Option<Label>,
    month_label: Option<Label>,
    field: Option<TextField>,
}

impl std::fmt::Debug for DatePickerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatePickerState")
            .field("kind", &self.kind)
            .field("month", &self.month.get())
            .field("selection", &self.selection.get())
            .finish_non_exhaustive()
    }
}

impl WidgetFeature for DatePickerState {
    fn name(&self) -> &'static str {
        "date_picker"
    }
}

impl DatePickerState {
    /// Whether `date` lies inside the allowed range.
    pub fn is_date_enabled(&self, date: NaiveDate) -> bool {
        self.min_date.get().is_none_or(|min| date >= min)
            && self.max_date.get().is_none_or(|max| date <= max)
    }

    fn month_allowed(&self, year: i32, month: u32) -> bool {
        let key = (year, month);
        self.min_date
            .get()
            .is_none_or(|min| key >= (min.year(), min.month()))
            && self
                .max_date
                .get()
                .is_none_or(|max| key <= (max.year(), max.month()))
    }

    fn headline_text(&self) -> String {
        let selection = self.selection.get();
        match selection.as_slice() {
            [] => self.today.format("%a, %b %-d").to_string(),
            [day] if self.mode == DateSelectionMode::Single => day.format("%a, %b %-d").to_string(),
            [start] => format!("{} - End date", start.format("%b %-d")),
            [start, end, ..] => format!("{} - {}", start.format("%b %-d"), end.format("%b %-d")),
        }
    }

    fn refresh(&self) {
        if let Some(headline) = &self.headline {
            headline.set_text(self.headline_text());
        }
        if let Some(label) = &self.month_label {
            let (year, month) = self.month.get();
            if let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) {
                label.set_text(first.format("%B %Y").to_string());
            }
        }
    }

    fn parse_input(&self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            self.error.set(None);
            self.selection.set(Vec::new());
            return;
        }
        match NaiveDate::parse_from_str(text, &self.date_format) {
            Ok(date) if self.is_date_enabled(date) => {
                self.error.set(None);
                self.selection.set(vec![date]);
                self.month.set((date.year(), date.month()));
            }
            Ok(_) => {
                self.error
                    .set(Some(DatePickerDefaults::OUT_OF_RANGE.to_owned()));
            }
            Err(err) => {
                debug!(%err, text, "date input does not parse");
                self.error
                    .set(Some(DatePickerDefaults::INVALID_FORMAT.to_owned()));
            }
        }
    }
}

/// A date picker dialog.
#[derive(Clone)]
pub struct DatePicker {
    widget: Widget,
    /// The hosting dialog.
    pub dialog: Dialog,
    /// Selection and month state.
    pub state: Rc<DatePickerState>,
}

widget_wrapper!(DatePicker);

impl DatePicker {
    /// Creates a closed picker.
    pub fn new(ctx: &BuildContext, args: DatePickerArgs) -> Result<Self, CompositionError> {
        let today = args.today.unwrap_or_else(|| Local::now().date_naive());
        let shown = args.date.unwrap_or(today);
        let mut children: Vec<Widget> = Vec::new();

        let headline = (args.kind != DatePickerKind::Docked).then(|| {
            children.push(dialog_supporting_text(ctx, args.supporting_text.clone()).into());
            let headline = dialog_headline(ctx, "");
            children.push(headline.clone().into());
            headline
        });
        let (month_label, field) = match args.kind {
            DatePickerKind::Input => {
                let field = TextField::new(
                    ctx,
                    TextFieldArgs::default()
                        .mode(TextFieldMode::Outlined)
                        .hint_text(DatePickerDefaults::INPUT_HINT)
                        .helper_text(DatePickerDefaults::INVALID_FORMAT)
                        .helper_text_mode(HelperTextMode::OnError),
                );
                if let Some(date) = args.date {
                    field.set_text(date.format(&args.date_format).to_string());
                }
                children.push(dialog_content([field.clone()]));
                (None, Some(field))
            }
            DatePickerKind::Modal | DatePickerKind::Docked => {
                let label = Label::with_kind(
                    ctx,
                    MONTH_LABEL,
                    LabelArgs::new("")
                        .font_style("Label")
                        .role(FontRole::Large)
                        .text_color(Role::OnSurfaceVariant),
                );
                children.push(dialog_content([label.clone()]));
                (Some(label), None)
            }
        };
        let cancel = Button::new(
            ctx,
            ButtonArgs::new(ButtonStyle::Text).text(DatePickerDefaults::CANCEL_TEXT),
        );
        let ok = Button::new(
            ctx,
            ButtonArgs::new(ButtonStyle::Text).text(DatePickerDefaults::OK_TEXT),
        );
        children.push(dialog_buttons([cancel.clone(), ok.clone()]));

        let width = match args.kind {
            DatePickerKind::Docked => DatePickerDefaults::DOCKED_WIDTH,
            DatePickerKind::Modal | DatePickerKind::Input => DatePickerDefaults::MODAL_WIDTH,
        };
        let dialog = Dialog::compose(
            ctx,
            DialogArgs::default()
                .auto_dismiss(args.auto_dismiss)
                .width(width),
            children,
        )?;
        if args.kind == DatePickerKind::Docked {
            dialog
                .state
                .surface
                .background
                .shape
                .set(Shape::rounded(MaterialShapes::LARGE));
        }

        let state = Rc::new(DatePickerState {
            kind: args.kind,
            mode: args.mode,
            month: Property::new("month", (shown.year(), shown.month())),
            selection: Property::new("selection", args.date.into_iter().collect()),
            min_date: Property::new("min_date", args.min_date),
            max_date: Property::new("max_date", args.max_date),
            mark_today: Property::new("mark_today", args.mark_today),
            error: Property::new("error", None),
            on_ok: Signal::new(),
            on_cancel: Signal::new(),
            on_select_day: Signal::new(),
            on_select_month: Signal::new(),
            on_select_year: Signal::new(),
            today,
            date_format: args.date_format,
            headline,
            month_label,
            field,
        });
        let widget = Widget::from(&dialog);
        widget.attach_feature(state.clone());
        let picker = Self {
            widget,
            dialog,
            state,
        };
        picker.connect(&ok, &cancel);
        picker.state.refresh();
        Ok(picker)
    }

    fn connect(&self, ok: &Button, cancel: &Button) {
        let weak = Rc::downgrade(&self.state);
        self.state.selection.bind(move |_| {
            if let Some(state) = weak.upgrade() {
                state.refresh();
            }
        });
        let weak = Rc::downgrade(&self.state);
        self.state.month.bind(move |_| {
            if let Some(state) = weak.upgrade() {
                state.refresh();
            }
        });
        if let Some(field) = &self.state.field {
            let weak = Rc::downgrade(&self.state);
            field.state.text.bind(move |text| {
                if let Some(state) = weak.upgrade() {
                    state.parse_input(text);
                    if let Some(field) = &state.field {
                        field.set_error_message(state.error.get());
                    }
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

    /// Picks `date`. Days outside the allowed range are refused.
    pub fn select_day(&self, date: NaiveDate) -> bool {
        if !self.state.is_date_enabled(date) {
            warn!(%date, "day outside the allowed range");
            return false;
        }
        let selection = self.state.selection.get();
        let next = match (self.state.mode, selection.as_slice()) {
            (DateSelectionMode::Range, [start]) if date >= *start => vec![*start, date],
            _ => vec![date],
        };
        self.state.selection.set(next);
        if let Some(field) = &self.state.field {
            field.set_text(date.format(&self.state.date_format).to_string());
        }
        self.state.on_select_day.emit(&date);
        true
    }

    /// Shows `month` of `year` when any of it is selectable.
    pub fn set_month(&self, year: i32, month: u32) -> bool {
        if !(1..=12).contains(&month) || !self.state.month_allowed(year, month) {
            return false;
        }
        let (old_year, old_month) = self.state.month.get();
        self.state.month.set((year, month));
        if old_month != month {
            self.state.on_select_month.emit(&month);
        }
        if old_year != year {
            self.state.on_select_year.emit(&year);
        }
        true
    }

    /// Shows the following month.
    pub fn next_month(&self) -> bool {
        let (year, month) = self.state.month.get();
        match month {
            12 => self.set_month(year + 1, 1),
            _ => self.set_month(year, month + 1),
        }
    }

    /// Shows the previous month.
    pub fn previous_month(&self) -> bool {
        let (year, month) = self.state.month.get();
        match month {
            1 => self.set_month(year - 1, 12),
            _ => self.set_month(year, month - 1),
        }
    }

    /// Shows the current month of `year`, moved into the allowed range.
    pub fn select_year(&self, year: i32) -> bool {
        let (_, mut month) = self.state.month.get();
        if let Some(min) = self.state.min_date.get()
            && min.year() == year
        {
            month = month.max(min.month());
        }
        if let Some(max) = self.state.max_date.get()
            && max.year() == year
        {
            month = month.min(max.month());
        }
        self.set_month(year, month)
    }

    /// Shows the shown month of `year`, or the nearest allowed month.
    pub fn select_year(&self, year: i32) -> bool {
        let (_, month) = self.state.month.get();
        (1..=12)
            .map(|offset: u32| {
                let below = month.checked_sub(offset - 1).filter(|m| *m >= 1);
                let above = Some(month + offset - 1).filter(|m| *m <= 12);
                (below, above)
            })
            .flat_map(|(below, above)| [below, above])
            .flatten()
            .any(|candidate| self.set_month(year, candidate))
    }

    /// Days of the shown month with their flags.
    pub fn month_days(&self) -> Vec<DayCell> {
        let (year, month) = self.state.month.get();
        let selection = self.state.selection.get();
        let mark_today = self.state.mark_today.get();
        let range = match (self.state.mode, selection.as_slice()) {
            (DateSelectionMode::Range, [start, end, ..]) => Some((*start, *end)),
            _ => None,
        };
        (1..=days_in_month(year, month))
            .filter_map(|day| NaiveDate::from_ymd_opt(year, month, day))
            .map(|date| DayCell {
                date,
                is_today: mark_today && date == self.state.today,
                is_selected: selection.contains(&date),
                in_range: range.is_some_and(|(start, end)| start < date && date < end),
                enabled: self.state.is_date_enabled(date),
            })
            .collect()
    }

    /// Selected days.
    pub fn get_date(&self) -> Vec<NaiveDate> {
        self.state.selection.get()
    }

    /// Text of the headline; empty for the docked variant.
    pub fn headline(&self) -> String {
        self.state
            .headline
            .as_ref()
            .map(|label| label.text())
            .unwrap_or_default()
    }

    /// Confirms the selection. Refused while the typed date has an error.
    pub fn ok(&self) -> bool {
        if let Some(error) = self.state.error.get() {
            debug!(%error, "date picker cannot confirm");
            return false;
        }
        let selection = self.get_date();
        debug!(?selection, "date picker confirmed");
        self.state.on_ok.emit(&selection);
        self.dismiss();
        true
    }

    /// Closes the picker and fires `on_cancel`.
    pub fn cancel(&self) {
        self.state.on_cancel.emit(&());
        self.dismiss();
    }

    fn downgrade(&self) -> WeakDatePicker {
        WeakDatePicker {
            dialog: self.dialog.downgrade(),
            state: Rc::downgrade(&self.state),
        }
    }
}

struct WeakDatePicker {
    dialog: WeakDialog,
    state: Weak<DatePickerState>,
}

impl WeakDatePicker {
    fn upgrade(&self) -> Option<DatePicker> {
        let dialog = self.dialog.upgrade()?;
        Some(DatePicker {
            widget: Widget::from(&dialog),
            dialog,
            state: self.state.upgrade()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use mdkit_ui::{PxSize, Window};

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn args() -> DatePickerArgs {
        DatePickerArgs::default()
            .today(date(2024, 8, 17))
            .min_date(date(2024, 8, 5))
            .max_date(date(2024, 10, 20))
    }

    #[test]
    fn month_view_marks_today_and_respects_the_range() {
        let ctx = BuildContext::new();
        let picker = DatePicker::new(&ctx, args()).expect("picker");
        let days = picker.month_days();
        assert_eq!(days.len(), 31);
        assert!(days[16].is_today);
        assert_eq!(days.iter().filter(|d| d.is_today).count(), 1);
        assert!(!days[3].enabled && days[4].enabled);
        assert!(!picker.select_day(date(2024, 8, 1)));
        assert!(picker.select_day(date(2024, 8, 20)));
        assert_eq!(picker.headline(), "Tue, Aug 20");

        assert!(!picker.previous_month());
        assert!(picker.next_month() && picker.next_month());
        assert!(!picker.next_month());
        assert_eq!(picker.state.month.get(), (2024, 10));
        assert!(picker.select_year(2024));
        assert!(!picker.select_year(2025));

        let unmarked = DatePicker::new(&ctx, args().mark_today(false)).expect("picker");
        assert!(unmarked.month_days().iter().all(|d| !d.is_today));
    }

    #[test]
    fn ok_and_cancel_report_and_close() {
        let window = Window::new(PxSize::new(400.0, 800.0));
        let ctx = BuildContext::new().with_window(window.clone());
        let picker = DatePicker::new(&ctx, args().date(date(2024, 9, 1))).expect("picker");
        let confirmed = Rc::new(RefCell::new(Vec::new()));
        let c = confirmed.clone();
        picker.state.on_ok.connect(move |dates| c.borrow_mut().extend(dates.iter().copied()));
        let cancelled = Rc::new(std::cell::Cell::new(false));
        let k = cancelled.clone();
        picker.state.on_cancel.connect(move |_| k.set(true));

        picker.open();
        assert!(picker.is_open());
        assert!(picker.select_day(date(2024, 9, 3)));
        let buttons = picker.dialog.slot(crate::dialog::BUTTONS).expect("buttons");
        let ok = Button::from_widget(buttons.children()[1].clone()).expect("ok button");
        ok.click();
        assert_eq!(*confirmed.borrow(), [date(2024, 9, 3)]);
        assert!(!picker.is_open());

        picker.open();
        picker.cancel();
        assert!(cancelled.get());
        assert!(!picker.is_open());
    }

    #[test]
    fn range_mode_orders_its_ends() {
        let ctx = BuildContext::new();
        let picker =
            DatePicker::new(&ctx, args().mode(DateSelectionMode::Range)).expect("picker");
        picker.select_day(date(2024, 8, 12));
        assert_eq!(picker.headline(), "Aug 12 - End date");
        picker.select_day(date(2024, 8, 10));
        picker.select_day(date(2024, 8, 14));
        assert_eq!(picker.get_date(), [date(2024, 8, 10), date(2024, 8, 14)]);
        let days = picker.month_days();
        assert!(days[10].in_range && days[12].in_range && !days[13].in_range);
        assert!(days[13].is_selected);
    }

    #[test]
    fn input_variant_validates_typed_dates() {
        let ctx = BuildContext::new();
        let picker =
            DatePicker::new(&ctx, args().kind(DatePickerKind::Input)).expect("picker");
        let field = picker.state.field.clone().expect("input field");
        field.set_text("13/45/2024");
        assert_eq!(
            picker.state.error.get().as_deref(),
            Some(DatePickerDefaults::INVALID_FORMAT)
        );
        assert!(field.is_error());
        assert!(!picker.ok());

        field.set_text("12/01/2024");
        assert_eq!(
            picker.state.error.get().as_deref(),
            Some(DatePickerDefaults::OUT_OF_RANGE)
        );
        field.set_text("09/15/2024");
        assert_eq!(picker.state.error.get(), None);
        assert!(!field.is_error());
        assert_eq!(picker.get_date(), [date(2024, 9, 15)]);
        assert_eq!(picker.state.month.get(), (2024, 9));
    }

    #[test]
    fn docked_variant_has_no_headline() {
        let ctx = BuildContext::new();
        let picker =
            DatePicker::new(&ctx, args().kind(DatePickerKind::Docked)).expect("picker");
        assert_eq!(picker.headline(), "");
        assert!(picker.dialog.slot(crate::dialog::HEADLINE).is_none());
        let width = DatePickerDefaults::DOCKED_WIDTH.to_pixels_f32();
        assert_eq!(picker.size.get().width, width);
        assert_eq!(days_in_month(2024, 2), 29);
    }
}
