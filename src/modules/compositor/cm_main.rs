use eframe::egui;
use image::RgbImage;
use std::path::{Path, PathBuf};
use crate::error::EditorError;
use crate::modules::image_export::{export_image, ExportFormat};
use crate::modules::{MenuAction, MenuContribution, MenuItem};
use crate::style::ThemeMode;
use super::cm_helpers::to_color_image;
use super::cm_state::{EditorCommand, EditorConfig, EditorState, Outcome};
use super::cm_tools;

const IMAGE_FILTER: &[&str] = &["png", "jpg", "jpeg", "bmp"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum SelectionKind { Crop, Delete }

/// Rubber band rectangle in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Selection { pub kind: SelectionKind, pub start: (i32, i32), pub end: (i32, i32) }

#[derive(Debug, Clone, PartialEq)]
pub(super) enum Dialog {
    None,
    CanvasSize { width: String, height: String },
    BatchExport { count: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum NoticeLevel { Info, Error }

#[derive(Debug, Clone, PartialEq)]
pub(super) struct Notice { pub level: NoticeLevel, pub title: String, pub message: String }

impl Notice {
    pub(super) fn info(title: &str, message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, title: title.to_string(), message: message.into() }
    }
}

impl From<&EditorError> for Notice {
    fn from(err: &EditorError) -> Self {
        let (level, title) = match err {
            EditorError::SelectionTooSmall => (NoticeLevel::Info, "Crop"),
            EditorError::MemoryFull { .. } | EditorError::MemoryEmpty => (NoticeLevel::Info, "Memory"),
            EditorError::InvalidCanvasSize { .. } => (NoticeLevel::Error, "Canvas size"),
            _ => (NoticeLevel::Error, "Error"),
        };
        Self { level, title: title.to_string(), message: err.to_string() }
    }
}

pub struct Workspace {
    pub(super) state: EditorState,
    pub(super) bg_texture: Option<egui::TextureHandle>,
    pub(super) bg_texture_rev: u64,
    pub(super) chat_texture: Option<egui::TextureHandle>,
    pub(super) chat_texture_rev: u64,
    pub(super) selection: Option<Selection>,
    pub(super) dialog: Dialog,
    pub(super) notice: Option<Notice>,
    pub(super) jpeg_quality: u8,
}

impl Workspace {
    pub fn new(config: EditorConfig, jpeg_quality: u8) -> Self {
        Self {
            state: EditorState::new(config),
            bg_texture: None, bg_texture_rev: 0,
            chat_texture: None, chat_texture_rev: 0,
            selection: None,
            dialog: Dialog::None,
            notice: None,
            jpeg_quality,
        }
    }

    pub fn title(&self) -> String {
        let (w, h) = self.state.canvas_size();
        format!("{}x{}  |  In memory: {}/{}", w, h, self.state.memory.len(), self.state.memory.limit())
    }

    /// Picks up edited preferences. Canvas size and capacities only apply to the next session.
    pub fn apply_settings(&mut self, config: &EditorConfig, jpeg_quality: u8) {
        self.state.config.guide_offset = config.guide_offset;
        self.state.config.snap_tolerance = config.snap_tolerance;
        self.state.config.bg_threshold = config.bg_threshold;
        self.state.config.snap_policy = config.snap_policy;
        self.jpeg_quality = jpeg_quality;
    }

    pub(super) fn run(&mut self, cmd: EditorCommand) -> Option<Outcome> {
        match self.state.execute(cmd) {
            Ok(outcome) => Some(outcome),
            Err(err) => { self.report(&err); None }
        }
    }

    pub(super) fn report(&mut self, err: &EditorError) {
        if err.is_informational() { log::info!("{err}"); } else { log::error!("{err}"); }
        self.notice = Some(Notice::from(err));
    }

    pub(super) fn ensure_textures(&mut self, ctx: &egui::Context) {
        if self.bg_texture_rev != self.state.bg_revision() {
            self.bg_texture = self.state.canvas.background.as_ref().map(|bg| {
                ctx.load_texture("compositor_bg", to_color_image(bg.image()), egui::TextureOptions::NEAREST)
            });
            self.bg_texture_rev = self.state.bg_revision();
        }
        if self.chat_texture_rev != self.state.chat_revision() {
            self.chat_texture = self.state.canvas.chat.as_ref().map(|chat| {
                ctx.load_texture("compositor_chat", to_color_image(chat), egui::TextureOptions::NEAREST)
            });
            self.chat_texture_rev = self.state.chat_revision();
        }
    }

    pub(super) fn undo(&mut self) {
        self.selection = None;
        self.run(EditorCommand::Undo);
    }

    pub(super) fn redo(&mut self) {
        self.selection = None;
        self.run(EditorCommand::Redo);
    }

    pub(super) fn handle_keyboard(&mut self, ctx: &egui::Context) {
        if self.dialog != Dialog::None || self.notice.is_some() { return; }
        let (mut undo, mut redo, mut cancel) = (false, false, false);
        ctx.input_mut(|i| {
            // shift variant first, plain Ctrl+Z would match it too
            if i.consume_key(egui::Modifiers::CTRL | egui::Modifiers::SHIFT, egui::Key::Z) { redo = true; }
            if i.consume_key(egui::Modifiers::CTRL, egui::Key::Z) { undo = true; }
            if i.consume_key(egui::Modifiers::CTRL, egui::Key::Y) { redo = true; }
            if i.consume_key(egui::Modifiers::NONE, egui::Key::Escape) { cancel = true; }
        });
        if undo { self.undo(); }
        if redo { self.redo(); }
        if cancel { self.selection = None; }
    }

    fn pick_image(title: &str) -> Option<PathBuf> {
        rfd::FileDialog::new()
            .set_title(title)
            .add_filter("Images", IMAGE_FILTER)
            .add_filter("All Files", &["*"])
            .pick_file()
    }

    fn pick_save_path(prefix: &str) -> Option<PathBuf> {
        let stamp: String = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
        let name: String = format!("{}_{}.{}", prefix, stamp, ExportFormat::Jpeg.extension());
        rfd::FileDialog::new()
            .set_file_name(name)
            .add_filter("JPEG", &["jpg", "jpeg"])
            .add_filter("PNG", &["png"])
            .add_filter("BMP", &["bmp"])
            .save_file()
    }

    pub(super) fn load_background(&mut self) {
        let Some(path) = Self::pick_image("Load background") else { return };
        match cm_tools::decode_background(&path) {
            Ok(img) => {
                log::info!("loaded background {} ({}x{})", path.display(), img.width(), img.height());
                self.run(EditorCommand::LoadBackground(img));
            }
            Err(err) => self.report(&err),
        }
    }

    pub(super) fn load_chat(&mut self) {
        let Some(path) = Self::pick_image("Load chat") else { return };
        match cm_tools::decode_chat(&path) {
            Ok(img) => {
                log::info!("loaded chat {} ({}x{})", path.display(), img.width(), img.height());
                self.selection = None;
                self.run(EditorCommand::LoadChat(img));
            }
            Err(err) => self.report(&err),
        }
    }

    fn write(&mut self, img: &RgbImage, path: &Path) -> bool {
        match export_image(img, path, ExportFormat::from_path(path), self.jpeg_quality) {
            Ok(()) => true,
            Err(err) => { self.report(&err); false }
        }
    }

    pub(super) fn save_image(&mut self) {
        let Some(path) = Self::pick_save_path("chat") else { return };
        let img: RgbImage = self.state.composite();
        if !self.write(&img, &path) { return; }
        self.selection = None;
        self.run(EditorCommand::FinishExport);
        self.notice = Some(Notice::info("Saved", format!("Image saved to {}", path.display())));
    }

    pub(super) fn store_in_memory(&mut self) {
        let Some(Outcome::MemoryStored { count, limit, full }) = self.run(EditorCommand::StoreInMemory) else { return };
        self.selection = None;
        self.notice = Some(Notice::info("Memory", format!("Canvas stored in memory ({count}/{limit})")));
        if full { self.dialog = Dialog::BatchExport { count }; }
    }

    pub(super) fn open_batch_export(&mut self) {
        if self.state.memory.is_empty() {
            self.report(&EditorError::MemoryEmpty);
            return;
        }
        self.dialog = Dialog::BatchExport { count: self.state.memory.len() };
    }

    pub(super) fn confirm_batch_export(&mut self, count: usize) {
        self.dialog = Dialog::None;
        let sheet: RgbImage = match self.state.stacked_memory(count) {
            Ok(sheet) => sheet,
            Err(err) => { self.report(&err); return; }
        };
        let Some(path) = Self::pick_save_path("stack") else { return };
        if !self.write(&sheet, &path) { return; }
        self.selection = None;
        self.run(EditorCommand::FinishBatchExport);
        self.notice = Some(Notice::info("Saved", format!("{count} images stacked and saved to {}", path.display())));
    }

    pub(super) fn open_canvas_size(&mut self) {
        let (w, h) = self.state.canvas_size();
        self.dialog = Dialog::CanvasSize { width: w.to_string(), height: h.to_string() };
    }

    pub(super) fn confirm_canvas_size(&mut self, width: String, height: String) {
        self.dialog = Dialog::None;
        self.run(EditorCommand::ResizeCanvas { width, height });
    }

    pub fn get_menu_contributions(&self) -> MenuContribution {
        let has_chat: bool = self.state.canvas.chat.is_some();
        let has_memory: bool = !self.state.memory.is_empty();
        let guides_label: &str = if self.state.guides_visible() { "Hide Guides" } else { "Show Guides" };
        let magnet_label: &str = if self.state.is_magnetic_enabled() { "Disable Magnet" } else { "Enable Magnet" };
        MenuContribution {
            file_items: vec![
                (MenuItem::new("Load Background...", None, true), MenuAction::LoadBackground),
                (MenuItem::new("Load Chat...", None, true), MenuAction::LoadChat),
                (MenuItem::new("Save Image...", None, true), MenuAction::Save),
                (MenuItem::new("Store in Memory", None, !self.state.memory.is_full()), MenuAction::StoreInMemory),
                (MenuItem::new("Stack and Save...", None, has_memory), MenuAction::BatchExport),
            ],
            edit_items: vec![
                (MenuItem::new("Undo", Some("Ctrl+Z"), self.state.can_undo()), MenuAction::Undo),
                (MenuItem::new("Redo", Some("Ctrl+Y"), self.state.can_redo()), MenuAction::Redo),
                (MenuItem::new("Add Outline", None, has_chat), MenuAction::Outline),
            ],
            view_items: vec![
                (MenuItem::new(guides_label, None, true), MenuAction::ToggleGuides),
                (MenuItem::new(magnet_label, None, self.state.magnet_available()), MenuAction::ToggleMagnetic),
            ],
            canvas_items: vec![
                (MenuItem::new("Canvas Size...", None, true), MenuAction::CanvasSize),
                (MenuItem::new("Clear Canvas", None, true), MenuAction::ClearCanvas),
            ],
        }
    }

    pub fn handle_menu_action(&mut self, action: MenuAction) -> bool {
        match action {
            MenuAction::LoadBackground => self.load_background(),
            MenuAction::LoadChat => self.load_chat(),
            MenuAction::Save => self.save_image(),
            MenuAction::StoreInMemory => self.store_in_memory(),
            MenuAction::BatchExport => self.open_batch_export(),
            MenuAction::Undo => self.undo(),
            MenuAction::Redo => self.redo(),
            MenuAction::Outline => { self.run(EditorCommand::Outline); }
            MenuAction::ClearCanvas => { self.selection = None; self.run(EditorCommand::ClearCanvas); }
            MenuAction::CanvasSize => self.open_canvas_size(),
            MenuAction::ToggleGuides => { self.run(EditorCommand::ToggleGuides); }
            MenuAction::ToggleMagnetic => { self.run(EditorCommand::ToggleMagnetic); }
            MenuAction::None => return false,
        }
        true
    }

    pub fn ui(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let theme: ThemeMode = if ui.visuals().dark_mode { ThemeMode::Dark } else { ThemeMode::Light };
        self.handle_keyboard(ctx);
        self.ensure_textures(ctx);

        self.render_toolbar(ui, theme);
        ui.add_space(4.0);
        self.render_canvas(ui, ctx);

        self.render_modals(ctx, theme);
    }

    /// A notice sits above any pending dialog. The dialog only starts taking
    /// input on the frame after the notice is gone.
    pub(super) fn render_modals(&mut self, ctx: &egui::Context, theme: ThemeMode) {
        if self.notice.is_some() {
            self.render_notice(ctx, theme);
        } else {
            self.render_dialog(ctx, theme);
        }
    }
}
