use eframe::egui;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ThemeMode {
    Light,
    Dark,
}

impl From<egui::Theme> for ThemeMode {
    fn from(theme: egui::Theme) -> Self {
        match theme {
            egui::Theme::Dark => ThemeMode::Dark,
            egui::Theme::Light => ThemeMode::Light,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemePreference { #[default] System, Light, Dark }

impl ThemePreference {
    /// Concrete mode for this preference; `System` follows whatever egui reports.
    pub fn resolve(self, system: egui::Theme) -> ThemeMode {
        match self {
            ThemePreference::System => system.into(),
            ThemePreference::Light => ThemeMode::Light,
            ThemePreference::Dark => ThemeMode::Dark,
        }
    }
}

pub struct ColorPalette;

impl ColorPalette {
    pub const BLUE_400: egui::Color32 = egui::Color32::from_rgb(96, 165, 250);
    pub const BLUE_500: egui::Color32 = egui::Color32::from_rgb(59, 130, 246);
    pub const BLUE_600: egui::Color32 = egui::Color32::from_rgb(37, 99, 235);

    pub const SLATE_100: egui::Color32 = egui::Color32::from_rgb(241, 245, 249);
    pub const SLATE_200: egui::Color32 = egui::Color32::from_rgb(226, 232, 240);
    pub const SLATE_300: egui::Color32 = egui::Color32::from_rgb(203, 213, 225);

    pub const GRAY_50: egui::Color32 = egui::Color32::from_rgb(249, 250, 251);
    pub const GRAY_100: egui::Color32 = egui::Color32::from_rgb(243, 244, 246);
    pub const GRAY_200: egui::Color32 = egui::Color32::from_rgb(229, 231, 235);
    pub const GRAY_300: egui::Color32 = egui::Color32::from_rgb(209, 213, 219);
    pub const GRAY_400: egui::Color32 = egui::Color32::from_rgb(156, 163, 175);
    pub const GRAY_500: egui::Color32 = egui::Color32::from_rgb(107, 114, 128);
    pub const GRAY_700: egui::Color32 = egui::Color32::from_rgb(55, 65, 81);
    pub const GRAY_800: egui::Color32 = egui::Color32::from_rgb(31, 41, 55);
    pub const GRAY_900: egui::Color32 = egui::Color32::from_rgb(17, 24, 39);

    pub const ZINC_200: egui::Color32 = egui::Color32::from_rgb(228, 228, 231);
    pub const ZINC_400: egui::Color32 = egui::Color32::from_rgb(161, 161, 170);
    pub const ZINC_500: egui::Color32 = egui::Color32::from_rgb(113, 113, 122);
    pub const ZINC_600: egui::Color32 = egui::Color32::from_rgb(82, 82, 91);
    pub const ZINC_700: egui::Color32 = egui::Color32::from_rgb(63, 63, 70);
    pub const ZINC_800: egui::Color32 = egui::Color32::from_rgb(39, 39, 42);
    pub const ZINC_900: egui::Color32 = egui::Color32::from_rgb(24, 24, 27);

    pub const GREEN_600: egui::Color32 = egui::Color32::from_rgb(22, 163, 74);

    pub const RED_500: egui::Color32 = egui::Color32::from_rgb(239, 68, 68);
    pub const RED_600: egui::Color32 = egui::Color32::from_rgb(220, 38, 38);
}

pub fn apply_theme(ctx: &egui::Context, theme: ThemeMode) {
    let mut style = (*ctx.style()).clone();

    for w in [
        &mut style.visuals.widgets.noninteractive,
        &mut style.visuals.widgets.inactive,
        &mut style.visuals.widgets.hovered,
        &mut style.visuals.widgets.active,
    ] {
        w.corner_radius = egui::CornerRadius::same(4);
    }

    style.spacing.item_spacing = egui::vec2(6.0, 6.0);
    style.spacing.button_padding = egui::vec2(10.0, 4.0);
    style.spacing.window_margin = egui::Margin::same(10);

    match theme {
        ThemeMode::Dark => apply_dark_theme(&mut style),
        ThemeMode::Light => apply_light_theme(&mut style),
    }

    ctx.set_style(style);
}

fn apply_dark_theme(style: &mut egui::Style) {
    let v: &mut egui::Visuals = &mut style.visuals;
    v.dark_mode = true;

    v.panel_fill = ColorPalette::ZINC_900;
    v.window_fill = ColorPalette::ZINC_900;
    v.faint_bg_color = ColorPalette::ZINC_800;
    // canvas surround, kept darker so the white canvas stands out
    v.extreme_bg_color = egui::Color32::from_rgb(12, 12, 15);

    v.widgets.noninteractive.bg_fill = ColorPalette::ZINC_800;
    v.widgets.noninteractive.bg_stroke = egui::Stroke::new(1.0, ColorPalette::ZINC_700);
    v.widgets.inactive.bg_fill = egui::Color32::from_rgb(30, 30, 35);
    v.widgets.inactive.weak_bg_fill = ColorPalette::ZINC_800;
    v.widgets.inactive.bg_stroke = egui::Stroke::new(1.0, ColorPalette::ZINC_600);
    v.widgets.hovered.bg_fill = egui::Color32::from_rgb(40, 40, 48);
    v.widgets.hovered.weak_bg_fill = egui::Color32::from_rgb(35, 35, 42);
    v.widgets.hovered.bg_stroke = egui::Stroke::new(1.0, ColorPalette::ZINC_500);
    v.widgets.active.bg_fill = egui::Color32::from_rgb(50, 50, 60);
    v.widgets.active.bg_stroke = egui::Stroke::new(1.0, ColorPalette::ZINC_400);

    v.widgets.noninteractive.fg_stroke = egui::Stroke::new(1.0, ColorPalette::SLATE_300);
    v.widgets.inactive.fg_stroke = egui::Stroke::new(1.0, ColorPalette::SLATE_200);
    v.widgets.hovered.fg_stroke = egui::Stroke::new(1.0, ColorPalette::SLATE_100);
    v.widgets.active.fg_stroke = egui::Stroke::new(1.0, egui::Color32::WHITE);

    v.selection.bg_fill = egui::Color32::from_rgba_premultiplied(60, 120, 240, 100);
    v.hyperlink_color = ColorPalette::BLUE_400;
}

fn apply_light_theme(style: &mut egui::Style) {
    let v: &mut egui::Visuals = &mut style.visuals;
    v.dark_mode = false;

    v.panel_fill = ColorPalette::GRAY_50;
    v.window_fill = ColorPalette::GRAY_50;
    v.faint_bg_color = ColorPalette::GRAY_100;
    v.extreme_bg_color = ColorPalette::GRAY_200;

    v.widgets.noninteractive.bg_fill = egui::Color32::WHITE;
    v.widgets.noninteractive.bg_stroke = egui::Stroke::new(1.0, ColorPalette::GRAY_300);
    v.widgets.inactive.bg_fill = ColorPalette::GRAY_50;
    v.widgets.inactive.weak_bg_fill = ColorPalette::GRAY_100;
    v.widgets.inactive.bg_stroke = egui::Stroke::new(1.0, ColorPalette::GRAY_300);
    v.widgets.hovered.bg_fill = ColorPalette::GRAY_100;
    v.widgets.hovered.weak_bg_fill = ColorPalette::GRAY_200;
    v.widgets.hovered.bg_stroke = egui::Stroke::new(1.0, ColorPalette::GRAY_400);
    v.widgets.active.bg_fill = ColorPalette::GRAY_200;
    v.widgets.active.bg_stroke = egui::Stroke::new(1.0, ColorPalette::GRAY_500);

    v.widgets.noninteractive.fg_stroke = egui::Stroke::new(1.0, ColorPalette::GRAY_700);
    v.widgets.inactive.fg_stroke = egui::Stroke::new(1.0, ColorPalette::GRAY_800);
    v.widgets.hovered.fg_stroke = egui::Stroke::new(1.0, ColorPalette::GRAY_900);
    v.widgets.active.fg_stroke = egui::Stroke::new(1.0, egui::Color32::BLACK);

    v.selection.bg_fill = egui::Color32::from_rgba_premultiplied(60, 120, 240, 80);
    v.hyperlink_color = ColorPalette::BLUE_600;
}
