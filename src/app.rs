use eframe::egui;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use crate::error::{EditorError, Result};
use crate::modules::compositor::{EditorConfig, SnapPolicy, Workspace, MAX_CANVAS_SIDE};
use crate::modules::image_export::DEFAULT_JPEG_QUALITY;
use crate::modules::{MenuAction, MenuItem};
use crate::style::{self, ColorPalette, ThemeMode, ThemePreference};

/// User preferences. Editor contents are never written to disk.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppSettings {
    pub theme_preference: ThemePreference,
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub guide_offset: i32,
    pub snap_tolerance: i32,
    pub bg_threshold: u8,
    pub memory_limit: usize,
    pub history_limit: usize,
    pub jpeg_quality: u8,
    pub snap_policy: SnapPolicy,
}

impl Default for AppSettings {
    fn default() -> Self {
        let editor: EditorConfig = EditorConfig::default();
        Self {
            theme_preference: ThemePreference::System,
            canvas_width: editor.canvas_width,
            canvas_height: editor.canvas_height,
            guide_offset: editor.guide_offset,
            snap_tolerance: editor.snap_tolerance,
            bg_threshold: editor.bg_threshold,
            memory_limit: editor.memory_limit,
            history_limit: editor.history_limit,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            snap_policy: editor.snap_policy,
        }
    }
}

impl AppSettings {
    fn load() -> Self { Self::load_from(&Self::get_config_path()) }

    /// Falls back to defaults when the file is missing or unreadable.
    pub fn load_from(path: &Path) -> Self {
        let contents: String = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str(&contents) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("ignoring malformed settings file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    fn save(&self) {
        let path: PathBuf = Self::get_config_path();
        if let Err(e) = self.save_to(&path) { log::warn!("{e}"); }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let io_err = |source: std::io::Error| EditorError::Io { path: path.to_path_buf(), source };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json: String = serde_json::to_string_pretty(self).map_err(|e| io_err(std::io::Error::other(e)))?;
        fs::write(path, json).map_err(io_err)
    }

    fn get_config_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("chat_compositor");
        path.push("settings.json");
        path
    }

    pub fn editor_config(&self) -> EditorConfig {
        EditorConfig {
            canvas_width: self.canvas_width.clamp(1, MAX_CANVAS_SIDE),
            canvas_height: self.canvas_height.clamp(1, MAX_CANVAS_SIDE),
            guide_offset: self.guide_offset,
            snap_tolerance: self.snap_tolerance.max(1),
            bg_threshold: self.bg_threshold,
            memory_limit: self.memory_limit.max(1),
            history_limit: self.history_limit.max(1),
            snap_policy: self.snap_policy,
        }
    }
}

pub struct CompositorApp {
    workspace: Workspace,
    settings: AppSettings,
    theme_mode: ThemeMode,
    show_settings: bool,
}

impl CompositorApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let settings: AppSettings = AppSettings::load();
        let theme_mode: ThemeMode = settings.theme_preference.resolve(cc.egui_ctx.theme());
        style::apply_theme(&cc.egui_ctx, theme_mode);
        log::info!("starting with a {}x{} canvas", settings.canvas_width, settings.canvas_height);

        Self {
            workspace: Workspace::new(settings.editor_config(), settings.jpeg_quality),
            settings,
            theme_mode,
            show_settings: false,
        }
    }

    fn set_theme(&mut self, ctx: &egui::Context, pref: ThemePreference) {
        self.settings.theme_preference = pref;
        self.theme_mode = pref.resolve(ctx.theme());
        style::apply_theme(ctx, self.theme_mode);
        self.settings.save();
    }

    fn settings_changed(&mut self) {
        self.workspace.apply_settings(&self.settings.editor_config(), self.settings.jpeg_quality);
        self.settings.save();
    }

    fn menu_items(&mut self, ui: &mut egui::Ui, items: &[(MenuItem, MenuAction)]) {
        for (item, action) in items {
            if ui.add_enabled(item.enabled, egui::Button::new(item.display())).clicked() {
                self.workspace.handle_menu_action(*action);
                ui.close();
            }
        }
    }

    fn top_bar(&mut self, ctx: &egui::Context) {
        let contributions = self.workspace.get_menu_contributions();

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.add_space(4.0);
            egui::MenuBar::new().ui(ui, |ui| {
                ui.menu_button("File", |ui| {
                    self.menu_items(ui, &contributions.file_items);
                    ui.separator();
                    if ui.button("Settings...").clicked() {
                        self.show_settings = true;
                        ui.close();
                    }
                    if ui.button("Exit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                        ui.close();
                    }
                });
                ui.menu_button("Edit", |ui| self.menu_items(ui, &contributions.edit_items));
                ui.menu_button("View", |ui| {
                    self.menu_items(ui, &contributions.view_items);
                    ui.separator();
                    ui.label("Theme:");
                    let current: ThemePreference = self.settings.theme_preference;
                    for (pref, label) in [(ThemePreference::System, "System"), (ThemePreference::Light, "Light"), (ThemePreference::Dark, "Dark")] {
                        if ui.selectable_label(current == pref, label).clicked() {
                            self.set_theme(ctx, pref);
                            ui.close();
                        }
                    }
                });
                ui.menu_button("Canvas", |ui| self.menu_items(ui, &contributions.canvas_items));
            });
            ui.add_space(4.0);
        });
    }

    fn status_bar(&self, ctx: &egui::Context) {
        let muted: egui::Color32 = if matches!(self.theme_mode, ThemeMode::Dark) { ColorPalette::ZINC_400 } else { ColorPalette::GRAY_500 };
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.label(egui::RichText::new(self.workspace.title()).size(12.0).color(muted));
        });
    }

    fn render_settings_modal(&mut self, ctx: &egui::Context) {
        if !self.show_settings { return; }
        let overlay = egui::Color32::from_rgba_premultiplied(0, 0, 0, 160);
        egui::Area::new(egui::Id::new("settings_overlay"))
            .fixed_pos(egui::pos2(0.0, 0.0))
            .order(egui::Order::Foreground)
            .interactable(false)
            .show(ctx, |ui| {
                ui.painter().rect_filled(ctx.content_rect(), 0.0, overlay);
            });

        let (bg, border, muted, text) = if matches!(self.theme_mode, ThemeMode::Dark) {
            (egui::Color32::from_rgb(22, 22, 27), ColorPalette::ZINC_700, ColorPalette::ZINC_500, ColorPalette::SLATE_200)
        } else {
            (egui::Color32::WHITE, ColorPalette::GRAY_200, ColorPalette::GRAY_400, ColorPalette::GRAY_700)
        };

        let mut theme_clicked: Option<ThemePreference> = None;
        let mut changed: bool = false;
        let mut open: bool = self.show_settings;
        let s: &mut AppSettings = &mut self.settings;

        egui::Window::new("Settings")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .min_width(400.0)
            .frame(egui::Frame::new().fill(bg).stroke(egui::Stroke::new(1.0, border)).corner_radius(10.0).inner_margin(28.0))
            .open(&mut open)
            .order(egui::Order::Tooltip)
            .show(ctx, |ui| {
                ui.label(egui::RichText::new("APPEARANCE").size(11.0).color(muted));
                ui.add_space(10.0);
                ui.horizontal(|ui| {
                    ui.label(egui::RichText::new("Theme").size(14.0).color(text));
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        for (pref, label) in [(ThemePreference::Dark, "Dark"), (ThemePreference::Light, "Light"), (ThemePreference::System, "System")] {
                            if ui.selectable_label(s.theme_preference == pref, label).clicked() { theme_clicked = Some(pref); }
                        }
                    });
                });

                ui.add_space(16.0);
                ui.label(egui::RichText::new("EDITING").size(11.0).color(muted));
                ui.add_space(10.0);
                changed |= settings_row(ui, text, "Guide offset", |ui: &mut egui::Ui| ui.add(egui::DragValue::new(&mut s.guide_offset).range(0..=500).suffix(" px")).changed());
                changed |= settings_row(ui, text, "Snap tolerance", |ui: &mut egui::Ui| ui.add(egui::DragValue::new(&mut s.snap_tolerance).range(1..=100).suffix(" px")).changed());
                changed |= settings_row(ui, text, "Background removal threshold", |ui: &mut egui::Ui| ui.add(egui::DragValue::new(&mut s.bg_threshold).range(0..=255)).changed());
                changed |= settings_row(ui, text, "JPEG quality", |ui: &mut egui::Ui| ui.add(egui::DragValue::new(&mut s.jpeg_quality).range(1..=100)).changed());
                changed |= settings_row(ui, text, "Magnet", |ui: &mut egui::Ui| {
                    let mut picked: bool = false;
                    egui::ComboBox::from_id_salt("snap_policy")
                        .selected_text(s.snap_policy.label())
                        .show_ui(ui, |ui| {
                            for policy in SnapPolicy::all() {
                                picked |= ui.selectable_value(&mut s.snap_policy, policy, policy.label()).changed();
                            }
                        });
                    picked
                });

                ui.add_space(16.0);
                ui.label(egui::RichText::new("NEW SESSIONS").size(11.0).color(muted));
                ui.add_space(10.0);
                changed |= settings_row(ui, text, "Canvas width", |ui: &mut egui::Ui| ui.add(egui::DragValue::new(&mut s.canvas_width).range(1..=MAX_CANVAS_SIDE).suffix(" px")).changed());
                changed |= settings_row(ui, text, "Canvas height", |ui: &mut egui::Ui| ui.add(egui::DragValue::new(&mut s.canvas_height).range(1..=MAX_CANVAS_SIDE).suffix(" px")).changed());
                changed |= settings_row(ui, text, "Memory slots", |ui: &mut egui::Ui| ui.add(egui::DragValue::new(&mut s.memory_limit).range(1..=20)).changed());
                changed |= settings_row(ui, text, "Undo steps", |ui: &mut egui::Ui| ui.add(egui::DragValue::new(&mut s.history_limit).range(1..=100)).changed());
                ui.add_space(6.0);
                ui.label(egui::RichText::new("Canvas size and limits apply after a restart.").size(11.0).color(muted));
            });

        self.show_settings = open;
        if let Some(pref) = theme_clicked { self.set_theme(ctx, pref); }
        if changed { self.settings_changed(); }
    }
}

fn settings_row(ui: &mut egui::Ui, text: egui::Color32, label: &str, add: impl FnOnce(&mut egui::Ui) -> bool) -> bool {
    ui.horizontal(|ui| {
        ui.label(egui::RichText::new(label).size(14.0).color(text));
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), add).inner
    }).inner
}

impl eframe::App for CompositorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if matches!(self.settings.theme_preference, ThemePreference::System) {
            let system_theme: ThemeMode = ctx.theme().into();
            if self.theme_mode != system_theme {
                self.theme_mode = system_theme;
                style::apply_theme(ctx, self.theme_mode);
            }
        }

        self.render_settings_modal(ctx);
        self.top_bar(ctx);
        self.status_bar(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            self.workspace.ui(ui, ctx);
        });
    }
}
