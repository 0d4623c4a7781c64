//! End-to-end scenarios across theme, widgets and overlays.

use mdkit_components::{
    button::{Button, ButtonArgs, ButtonStyle},
    children,
    color_definitions::{Hue, Palette, lookup},
    context::BuildContext,
    dynamic_scheme::derive_static,
    hero::{HeroFrom, HeroTo, HeroTransition},
    label::{Icon, IconArgs},
    role::Role,
    snackbar::{
        ACTION_BUTTON, CLOSE_BUTTON, SPACER, Snackbar, SnackbarArgs, snackbar_action,
        snackbar_buttons, snackbar_close, snackbar_text,
    },
    text_field::{
        HELPER_TEXT, LEADING_ICON, MAX_LENGTH_TEXT, TRAILING_ICON, TextField, TextFieldArgs,
        TextFieldMode,
    },
    theme::{ThemeManager, ThemeStyle},
};
use mdkit_ui::{
    Clock, Color, Dp, Easing, PxPosition, PxRect, PxSize, Screen, ScreenManager, Transition,
    TransitionKind, Widget, Window,
};

fn close(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-3
}

#[test]
fn theme_toggle_updates_surface_background() {
    let ctx = BuildContext::new();
    let button = Button::new(
        &ctx,
        ButtonArgs::new(ButtonStyle::Filled).theme_bg_color(Role::Surface),
    );
    let light = derive_static(Palette::Blue, false, 0.38).unwrap();
    let dark = derive_static(Palette::Blue, true, 0.38).unwrap();
    assert_eq!(button.md_bg_color(), light.get(Role::Surface));

    ctx.theme.switch_theme();
    assert_eq!(ctx.theme.theme_style.get(), ThemeStyle::Dark);
    assert_eq!(button.md_bg_color(), dark.get(Role::Surface));
}

#[test]
fn disabled_button_keeps_rgb_and_scales_alpha() {
    let theme = ThemeManager::with_settings(ThemeStyle::Light, Palette::Red, false);
    let ctx = BuildContext::with_theme(theme);
    let button = Button::new(&ctx, ButtonArgs::new(ButtonStyle::Filled).text("Send"));
    let bg = button.md_bg_color();
    let text = button.text_color();
    assert_eq!(bg, lookup(Palette::Red, Hue::H500).unwrap());
    assert_eq!(text, ctx.theme.color(Role::OnPrimary));

    button.disabled.set(true);
    for (enabled, disabled) in [(bg, button.md_bg_color()), (text, button.text_color())] {
        assert_eq!((disabled.r, disabled.g, disabled.b), (enabled.r, enabled.g, enabled.b));
        assert!(close(disabled.a, enabled.a * 0.38));
    }

    button.disabled.set(false);
    assert_eq!(button.md_bg_color(), bg);
}

#[test]
fn red_dynamic_button_matches_the_material_tones() {
    let theme = ThemeManager::with_settings(ThemeStyle::Light, Palette::Red, true);
    let ctx = BuildContext::with_theme(theme);
    let button = Button::new(&ctx, ButtonArgs::new(ButtonStyle::Elevated).text("Send"));
    let near = |c: Color, rgb: (f32, f32, f32)| {
        let tolerance = 1.5 / 255.0;
        (c.r - rgb.0).abs() < tolerance
            && (c.g - rgb.1).abs() < tolerance
            && (c.b - rgb.2).abs() < tolerance
            && c.a == 1.0
    };
    let bg = button.md_bg_color();
    let text = button.text_color();
    assert!(near(bg, (1.0, 0.941, 0.933)), "{bg:?}");
    assert!(near(text, (0.565, 0.294, 0.251)), "{text:?}");

    button.disabled.set(true);
    for (enabled, disabled) in [(bg, button.md_bg_color()), (text, button.text_color())] {
        assert_eq!((disabled.r, disabled.g, disabled.b), (enabled.r, enabled.g, enabled.b));
        assert!(close(disabled.a, 0.38));
    }
}

#[test]
fn text_field_over_length_shows_error_roles() {
    let ctx = BuildContext::new();
    let field = TextField::new(
        &ctx,
        TextFieldArgs::default()
            .mode(TextFieldMode::Outlined)
            .max_text_length(3usize)
            .leading_icon("account")
            .trailing_icon("alert-circle")
            .helper_text("Too long"),
    );
    field.set_text("Text");
    field.focus();

    let error = ctx.theme.color(Role::Error);
    assert!(field.is_error());
    for kind in [HELPER_TEXT, TRAILING_ICON, MAX_LENGTH_TEXT] {
        assert_eq!(field.slot_color(kind), Some(error), "{kind}");
    }
    assert_eq!(
        field.slot_color(LEADING_ICON),
        Some(ctx.theme.color(Role::OnSurfaceVariant))
    );
    assert_eq!(field.line_color(), error);
}

#[test]
fn icon_badge_is_sixteen_dp_square() {
    let ctx = BuildContext::new();
    let icon = Icon::new(&ctx, IconArgs::new("bell").badge_icon("numeric-10"));
    let badge = icon.badge().expect("badge");
    let side = Dp(16.0).to_pixels_f32();
    assert_eq!(badge.size.get(), PxSize::new(side, side));
    assert!(close(badge.rect().area(), side * side));

    icon.core.badge_icon.set(Some(String::new()));
    let dot = Dp(6.0).to_pixels_f32();
    let badge = icon.badge().expect("dot badge");
    assert_eq!(badge.size.get(), PxSize::new(dot, dot));
}

#[test]
fn snackbar_buttons_sit_bottom_right_after_a_spacer() {
    let window = Window::new(PxSize::new(1000.0, 800.0));
    let ctx = BuildContext::new().with_window(window.clone());
    let bar = Snackbar::compose(
        &ctx,
        SnackbarArgs::default(),
        children![
            snackbar_text(&ctx, "Message sent"),
            snackbar_buttons(children![snackbar_action(&ctx, "Undo"), snackbar_close(&ctx)])
                .unwrap(),
        ],
    )
    .unwrap();
    bar.open();
    assert!(window.contains(&bar));

    let container = bar.button_container().expect("button row");
    let row = container.children();
    let kinds: Vec<&str> = row.iter().map(|c| c.kind()).collect();
    assert_eq!(kinds, [SPACER, ACTION_BUTTON, CLOSE_BUTTON]);

    let spacing = Dp(8.0).to_pixels_f32();
    let (spacer, action, close_button) = (row[0].rect(), row[1].rect(), row[2].rect());
    assert!(close(action.x - spacer.right(), spacing));
    assert!(close(close_button.x - action.right(), spacing));

    let inset = Dp(8.0).to_pixels_f32();
    let frame = bar.rect();
    assert!(close(close_button.right(), frame.right() - inset));
    assert!(close(container.rect().y, frame.y + inset));
    assert!(frame.center().y < 400.0);
}

#[test]
fn hero_interpolates_between_screens() {
    let clock = Clock::new();
    let manager = ScreenManager::new(&clock);
    manager.widget().size.set(PxSize::new(400.0, 800.0));
    manager.set_transition(Transition {
        kind: TransitionKind::Shared,
        duration: 0.5,
        easing: Easing::Linear,
        ..Transition::default()
    });
    let a = Screen::new("a");
    let b = Screen::new("b");
    let image = Widget::new("Image");
    image.size.set(PxSize::new(80.0, 60.0));
    let from = HeroFrom::new("h", image.clone());
    from.pos.set(PxPosition::new(10.0, 30.0));
    a.add_widget(&from);
    let to = HeroTo::new("h", PxSize::new(240.0, 180.0));
    to.pos.set(PxPosition::new(90.0, 300.0));
    b.add_widget(&to);
    manager.add_screen(a).unwrap();
    manager.add_screen(b).unwrap();

    let heroes = HeroTransition::install(&manager);
    heroes.current_heroes.set(vec!["h".into()]);
    manager.switch_to("b").unwrap();

    let origin = PxRect::new(10.0, 30.0, 80.0, 60.0);
    let target = PxRect::new(90.0, 300.0, 240.0, 180.0);
    assert_eq!(heroes.hero_rect("h"), Some(origin));
    for step in 1..5 {
        clock.advance(0.1, 0.05);
        let t = step as f32 / 5.0;
        let expected = origin.lerp(&target, t);
        let rect = heroes.hero_rect("h").expect("in flight");
        assert!(close(rect.x, expected.x) && close(rect.y, expected.y), "t = {t}");
        assert!(close(rect.width, expected.width), "t = {t}");
    }
    clock.advance(0.2, 0.05);
    assert!(!heroes.is_flying());
    assert_eq!(image.rect(), target);
}
