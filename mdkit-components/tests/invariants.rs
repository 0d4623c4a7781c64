//! Properties that must hold for every widget and every theme mutation.

use std::{cell::RefCell, rc::Rc};

use mdkit_components::{
    behaviors::{AnimatorArgs, AttentionKind, ColorBinding, MagicBehavior},
    button::{Button, ButtonArgs, ButtonStyle},
    color_definitions::{Hue, Palette, lookup},
    context::BuildContext,
    dynamic_scheme::derive_static,
    font_styles::{FontRole, FontSpec},
    role::Role,
    theme::{ThemeManager, ThemeStyle},
};
use mdkit_ui::{PxPosition, PxSize, TouchEvent, TouchPhase, Widget};

#[test]
fn observers_see_whole_snapshots_only() {
    let theme = ThemeManager::new();
    let seen = Rc::new(RefCell::new(Vec::new()));
    for _ in 0..3 {
        let weak = Rc::downgrade(&theme);
        let seen = seen.clone();
        theme.primary_palette.bind(move |_| {
            if let Some(theme) = weak.upgrade() {
                seen.borrow_mut().push(theme.colors());
            }
        });
    }
    let seen_colors = seen.clone();
    theme.on_colors(move |scheme| seen_colors.borrow_mut().push(scheme.clone()));

    let before = theme.colors();
    theme.batch(|t| {
        t.primary_palette.set(Palette::Teal);
        t.theme_style.set(ThemeStyle::Dark);
    });
    theme.primary_palette.set(Palette::Amber);

    let teal_dark = derive_static(Palette::Teal, true, 0.38).unwrap();
    let amber_dark = derive_static(Palette::Amber, true, 0.38).unwrap();
    let seen = seen.borrow();
    assert!(seen.iter().any(|scheme| **scheme == amber_dark));
    for scheme in seen.iter() {
        assert!(**scheme == *before || **scheme == teal_dark || **scheme == amber_dark);
    }
    assert_eq!(*theme.colors(), amber_dark);
}

#[test]
fn disabled_alpha_is_scaled_for_every_filled_style() {
    let ctx = BuildContext::new();
    for style in [ButtonStyle::Elevated, ButtonStyle::Filled, ButtonStyle::Tonal] {
        let button = Button::new(&ctx, ButtonArgs::new(style).text("Go"));
        let enabled = button.md_bg_color();
        button.disabled.set(true);
        let disabled = button.md_bg_color();
        assert!((disabled.a - enabled.a * 0.38).abs() < 1e-4, "{style:?}");
        assert_eq!((disabled.r, disabled.g, disabled.b), (enabled.r, enabled.g, enabled.b));
    }
}

#[test]
fn role_binding_follows_the_palette_and_custom_freezes() {
    let ctx = BuildContext::new();
    let bound = Button::new(
        &ctx,
        ButtonArgs::new(ButtonStyle::Filled).theme_bg_color(Role::Primary),
    );
    let frozen = Button::new(
        &ctx,
        ButtonArgs::new(ButtonStyle::Filled).theme_bg_color(Role::Primary),
    );
    let kept = frozen.md_bg_color();
    frozen
        .state
        .surface
        .background
        .md_bg_color
        .binding
        .set(ColorBinding::Custom);

    ctx.theme.primary_palette.set(Palette::Green);
    assert_eq!(bound.md_bg_color(), lookup(Palette::Green, Hue::H500).unwrap());
    assert_eq!(frozen.md_bg_color(), kept);
}

#[test]
fn ripple_pixels_stay_inside_the_shape() {
    let ctx = BuildContext::new();
    let button = Button::new(&ctx, ButtonArgs::new(ButtonStyle::Filled).text("Ripple"));
    button.size.set(PxSize::new(160.0, 48.0));
    let ripple = button.state.interaction.ripple.clone();

    for (i, press) in [PxPosition::new(24.0, 24.0), button.center(), PxPosition::new(136.0, 30.0)]
        .into_iter()
        .enumerate()
    {
        let touch = TouchEvent::new(i as u64 + 1, press, TouchPhase::Down, 0.0);
        button.deliver_touch(&touch);
        ctx.clock.advance(1.0, 1.0 / 30.0);
        let (shape, rect) = ripple.clip(&button);
        let mut painted = 0;
        for x in (-8..=168).step_by(4) {
            for y in (-8..=56).step_by(4) {
                let point = PxPosition::new(x as f32, y as f32);
                if ripple.covers(&button, point) {
                    painted += 1;
                    assert!(shape.contains(&rect, point), "{point:?}");
                }
            }
        }
        assert!(painted > 0);
        assert!(!ripple.covers(&button, PxPosition::new(1.0, 1.0)));
        button.deliver_touch(&touch.with(TouchPhase::Up, press, 1.0));
        ctx.clock.advance(1.0, 1.0 / 30.0);
    }
}

#[test]
fn attention_animators_restore_real_widgets() {
    let ctx = BuildContext::new();
    let button = Button::new(&ctx, ButtonArgs::new(ButtonStyle::Tonal).text("Look"));
    let magic = MagicBehavior::attach(&button, &ctx.clock);
    let snapshot = |w: &Widget| {
        (
            w.opacity.get().to_bits(),
            w.size.get(),
            w.pos_hint.get(),
            w.angle.get().to_bits(),
        )
    };
    let before = snapshot(&button);
    for kind in AttentionKind::catalog() {
        magic.start(AnimatorArgs::new(kind));
        ctx.clock.advance(0.17, 1.0 / 60.0);
        magic.stop();
        assert_eq!(snapshot(&button), before, "{}", kind.name());
    }
}

#[test]
fn destroyed_widgets_release_theme_observers() {
    let ctx = BuildContext::new();
    let fields = ["theme_style", "colors"];
    let before: Vec<_> = fields
        .iter()
        .map(|f| ctx.theme.get_property_observers(f))
        .collect();
    let buttons: Vec<Button> = (0..25)
        .map(|i| Button::new(&ctx, ButtonArgs::new(ButtonStyle::Filled).text(format!("#{i}"))))
        .collect();
    assert!(ctx.theme.get_property_observers("colors") > before[1]);
    for button in &buttons {
        button.destroy();
    }
    let after: Vec<_> = fields
        .iter()
        .map(|f| ctx.theme.get_property_observers(f))
        .collect();
    assert_eq!(after, before);
}

#[test]
fn registered_font_styles_resolve_to_the_latest_spec() {
    let theme = ThemeManager::new();
    let roles = [FontRole::Large, FontRole::Medium, FontRole::Small];
    for style in ["Display", "Headline", "Title", "Body", "Label"] {
        for role in roles {
            assert!(theme.resolve_font_style(style, role).is_ok(), "{style} {role:?}");
        }
    }
    let first = FontSpec::new("Inter", 20.0, 28.0);
    let second = FontSpec::new("Inter", 22.0, 30.0);
    theme.register_font_style("Caption", FontRole::Small, first.clone());
    assert_eq!(theme.resolve_font_style("Caption", FontRole::Small).unwrap(), first);
    theme.register_font_style("Caption", FontRole::Small, second.clone());
    assert_eq!(theme.resolve_font_style("Caption", FontRole::Small).unwrap(), second);
    theme.register_font_style("Body", FontRole::Large, second.clone());
    assert_eq!(theme.resolve_font_style("Body", FontRole::Large).unwrap(), second);
    assert!(theme.resolve_font_style("Caption", FontRole::Large).is_err());
}
