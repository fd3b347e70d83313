use eframe::egui;
use crate::style::{ColorPalette, ThemeMode};
use super::cm_helpers::{canvas_to_screen, layer_rect, screen_to_canvas, SelectionRect};
use super::cm_main::{Dialog, NoticeLevel, Selection, SelectionKind, Workspace};
use super::cm_state::{DragTarget, EditorCommand, MAX_SCALE, MIN_SCALE};

const FULL_UV: egui::Rect = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));

impl Workspace {
    pub(super) fn render_toolbar(&mut self, ui: &mut egui::Ui, theme: ThemeMode) {
        let (bg, border, label_col) = if matches!(theme, ThemeMode::Dark) {
            (ColorPalette::ZINC_800, ColorPalette::ZINC_700, ColorPalette::ZINC_400)
        } else {
            (ColorPalette::GRAY_50, ColorPalette::GRAY_300, ColorPalette::ZINC_600)
        };
        let has_chat: bool = self.state.canvas.chat.is_some();
        let has_memory: bool = !self.state.memory.is_empty();

        egui::Frame::new()
            .fill(bg).stroke(egui::Stroke::new(1.0, border))
            .corner_radius(6.0)
            .inner_margin(egui::Margin { left: 8, right: 8, top: 4, bottom: 4 })
            .show(ui, |ui: &mut egui::Ui| {
                ui.horizontal_wrapped(|ui: &mut egui::Ui| {
                    if self.tool_btn(ui, "Load Background", true, false, "Loads the background image", theme) { self.load_background(); }
                    if self.tool_btn(ui, "Load Chat", true, false, "Loads the chat image", theme) { self.load_chat(); }
                    if self.tool_btn(ui, "Add Outline", has_chat, false, "Adds an outline to the chat image", theme) {
                        self.run(EditorCommand::Outline);
                    }
                    ui.separator();
                    if self.tool_btn(ui, "Save", true, false, "Saves the canvas as an image", theme) { self.save_image(); }
                    if self.tool_btn(ui, "Store in Memory", true, false, "Stores the current canvas in memory", theme) { self.store_in_memory(); }
                    if self.tool_btn(ui, "Stack and Save", has_memory, false, "Stacks the images in memory and saves them", theme) {
                        self.open_batch_export();
                    }
                    ui.separator();
                    if self.tool_btn(ui, "Canvas Size", true, false, "Changes the canvas size", theme) { self.open_canvas_size(); }
                    let guides_on: bool = self.state.guides_visible();
                    if self.tool_btn(ui, "Guides", true, guides_on, "Shows or hides the guide lines", theme) {
                        self.run(EditorCommand::ToggleGuides);
                    }
                    let magnet_on: bool = self.state.is_magnetic_enabled();
                    let magnet_label: &str = if magnet_on { "Disable Magnet" } else { "Enable Magnet" };
                    if self.tool_btn(ui, magnet_label, self.state.magnet_available(), magnet_on, "Turns snapping to the guides on or off", theme) {
                        self.run(EditorCommand::ToggleMagnetic);
                    }
                    ui.separator();

                    ui.label(egui::RichText::new("Scale:").size(12.0).color(label_col));
                    let mut scale: f32 = self.state.background_scale();
                    let slider: egui::Response = ui.add(egui::Slider::new(&mut scale, MIN_SCALE..=MAX_SCALE).step_by(0.1).fixed_decimals(1));
                    // history only records the value the slider settles on
                    let commit: bool = slider.drag_stopped() || (slider.changed() && !slider.dragged());
                    if slider.changed() || commit {
                        self.run(EditorCommand::Rescale { factor: scale, commit });
                    }
                    ui.separator();
                    let memory_text: String = format!("In memory: {}/{}", self.state.memory.len(), self.state.memory.limit());
                    ui.label(egui::RichText::new(memory_text).size(12.0).color(label_col));
                });
            });
    }

    fn tool_btn(&self, ui: &mut egui::Ui, label: &str, enabled: bool, active: bool, tooltip: &str, theme: ThemeMode) -> bool {
        let (bg, hover, txt) = if active {
            (ColorPalette::BLUE_600, ColorPalette::BLUE_500, egui::Color32::WHITE)
        } else if matches!(theme, ThemeMode::Dark) {
            (ColorPalette::ZINC_700, ColorPalette::ZINC_600, ColorPalette::ZINC_200)
        } else {
            (ColorPalette::GRAY_200, ColorPalette::GRAY_300, ColorPalette::GRAY_800)
        };

        let response: egui::Response = ui.scope(|ui: &mut egui::Ui| {
            let s: &mut egui::Style = ui.style_mut();
            s.visuals.widgets.inactive.weak_bg_fill = bg;
            s.visuals.widgets.inactive.bg_stroke = egui::Stroke::NONE;
            s.visuals.widgets.hovered.weak_bg_fill = hover;
            s.visuals.widgets.hovered.bg_stroke = egui::Stroke::NONE;
            s.visuals.widgets.active.weak_bg_fill = hover;
            let btn = egui::Button::new(egui::RichText::new(label).size(12.0).color(txt)).min_size(egui::vec2(0.0, 24.0));
            ui.add_enabled(enabled, btn).on_hover_text(tooltip)
        }).inner;
        response.clicked()
    }

    pub(super) fn render_canvas(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let (w, h) = self.state.canvas_size();
        egui::ScrollArea::both()
            .auto_shrink([false, false])
            .show(ui, |ui: &mut egui::Ui| {
                let (rect, response) = ui.allocate_exact_size(egui::vec2(w as f32, h as f32), egui::Sense::click_and_drag());
                let origin: egui::Pos2 = rect.min;
                self.handle_canvas_input(ctx, &response, origin);

                let painter: egui::Painter = ui.painter_at(rect);
                painter.rect_filled(rect, 0.0, egui::Color32::WHITE);

                if let (Some(tex), Some(bg)) = (&self.bg_texture, &self.state.canvas.background) {
                    let r: egui::Rect = layer_rect(self.state.canvas.bg_pos, bg.image(), origin);
                    painter.image(tex.id(), r, FULL_UV, egui::Color32::WHITE);
                    painter.rect_stroke(r, 0.0, egui::Stroke::new(1.0, ColorPalette::BLUE_600), egui::StrokeKind::Inside);
                }
                if let (Some(tex), Some(chat)) = (&self.chat_texture, &self.state.canvas.chat) {
                    let r: egui::Rect = layer_rect(self.state.canvas.chat_pos, chat, origin);
                    painter.image(tex.id(), r, FULL_UV, egui::Color32::WHITE);
                    painter.rect_stroke(r, 0.0, egui::Stroke::new(1.0, ColorPalette::GREEN_600), egui::StrokeKind::Inside);
                }

                if self.state.guides_visible() {
                    let g: f32 = self.state.config.guide_offset as f32;
                    let stroke = egui::Stroke::new(1.0, ColorPalette::RED_500);
                    let lines: [[egui::Pos2; 2]; 3] = [
                        [origin + egui::vec2(g, 0.0), origin + egui::vec2(g, h as f32)],
                        [origin + egui::vec2(0.0, g), origin + egui::vec2(w as f32, g)],
                        [origin + egui::vec2(0.0, h as f32 - g), origin + egui::vec2(w as f32, h as f32 - g)],
                    ];
                    for line in lines {
                        painter.extend(egui::Shape::dashed_line(&line, stroke, 4.0, 4.0));
                    }
                }

                if let Some(sel) = self.selection {
                    let r: egui::Rect = egui::Rect::from_two_pos(canvas_to_screen(sel.start, origin), canvas_to_screen(sel.end, origin));
                    painter.rect_stroke(r, 0.0, egui::Stroke::new(1.0, ColorPalette::RED_600), egui::StrokeKind::Outside);
                    let rect_px: SelectionRect = SelectionRect::from_corners(sel.start, sel.end);
                    let label: String = format!("{} x {}", rect_px.width(), rect_px.height());
                    let text_pos: egui::Pos2 = egui::pos2(r.min.x + 4.0, (r.min.y - 16.0).max(origin.y + 2.0));
                    painter.text(text_pos + egui::vec2(1.0, 1.0), egui::Align2::LEFT_TOP, &label, egui::FontId::proportional(12.0), egui::Color32::from_black_alpha(160));
                    painter.text(text_pos, egui::Align2::LEFT_TOP, &label, egui::FontId::proportional(12.0), ColorPalette::RED_600);
                }

                ui.painter().rect_stroke(rect, 0.0, egui::Stroke::new(1.0, egui::Color32::BLACK), egui::StrokeKind::Outside);

                if self.state.dragging().is_some() || self.selection.is_some() { ctx.set_cursor_icon(egui::CursorIcon::Crosshair); }
            });
    }

    /// Primary drags the background, secondary drags the chat, middle draws a crop box.
    /// With a delete selection armed (S), the primary button sizes it instead.
    fn handle_canvas_input(&mut self, ctx: &egui::Context, response: &egui::Response, origin: egui::Pos2) {
        let modal: bool = self.dialog != Dialog::None || self.notice.is_some();
        if modal { return; }
        let has_chat: bool = self.state.canvas.chat.is_some();

        if response.hovered() && has_chat && self.selection.is_none() {
            if let Some(hover) = response.hover_pos() {
                if ctx.input_mut(|i| i.consume_key(egui::Modifiers::NONE, egui::Key::S)) {
                    let p: (i32, i32) = screen_to_canvas(hover, origin);
                    self.selection = Some(Selection { kind: SelectionKind::Delete, start: p, end: p });
                }
            }
        }

        let Some(pointer) = response.interact_pointer_pos().or(response.hover_pos()) else { return };
        let p: (i32, i32) = screen_to_canvas(pointer, origin);
        let deleting: bool = matches!(self.selection, Some(Selection { kind: SelectionKind::Delete, .. }));

        if response.drag_started_by(egui::PointerButton::Primary) && !deleting {
            self.run(EditorCommand::BeginDrag { target: DragTarget::Background, pointer: p });
        }
        if response.drag_started_by(egui::PointerButton::Secondary) {
            self.run(EditorCommand::BeginDrag { target: DragTarget::Chat, pointer: p });
        }
        if response.drag_started_by(egui::PointerButton::Middle) && has_chat && !deleting {
            self.selection = Some(Selection { kind: SelectionKind::Crop, start: p, end: p });
        }

        if response.dragged() {
            if let Some(sel) = self.selection.as_mut() {
                let sizing: bool = match sel.kind {
                    SelectionKind::Delete => response.dragged_by(egui::PointerButton::Primary),
                    SelectionKind::Crop => response.dragged_by(egui::PointerButton::Middle),
                };
                if sizing { sel.end = p; }
            }
            if self.state.dragging().is_some() {
                self.run(EditorCommand::DragTo { pointer: p });
            }
        }

        if response.drag_stopped() && self.state.dragging().is_some() {
            self.run(EditorCommand::EndDrag);
        }

        let release_delete: bool = response.drag_stopped_by(egui::PointerButton::Primary) || response.clicked();
        if deleting && release_delete {
            if let Some(sel) = self.selection.take() {
                let end: (i32, i32) = if response.clicked() { p } else { sel.end };
                self.run(EditorCommand::DeleteRegion(SelectionRect::from_corners(sel.start, end)));
            }
        }
        if response.drag_stopped_by(egui::PointerButton::Middle) {
            if let Some(sel) = self.selection.take_if(|s| s.kind == SelectionKind::Crop) {
                self.run(EditorCommand::Crop(SelectionRect::from_corners(sel.start, sel.end)));
            }
        }
    }

    fn modal_frame(theme: ThemeMode) -> egui::Frame {
        let (bg, border) = if matches!(theme, ThemeMode::Dark) {
            (egui::Color32::from_rgb(22, 22, 27), ColorPalette::ZINC_700)
        } else {
            (egui::Color32::WHITE, ColorPalette::GRAY_200)
        };
        egui::Frame::new().fill(bg).stroke(egui::Stroke::new(1.0, border)).corner_radius(10.0).inner_margin(20.0)
    }

    fn dim_background(ctx: &egui::Context, id: &str) {
        let overlay = egui::Color32::from_rgba_premultiplied(0, 0, 0, 160);
        egui::Area::new(egui::Id::new(id))
            .fixed_pos(egui::pos2(0.0, 0.0))
            .order(egui::Order::Foreground)
            .interactable(false)
            .show(ctx, |ui| {
                ui.painter().rect_filled(ctx.content_rect(), 0.0, overlay);
            });
    }

    pub(super) fn render_notice(&mut self, ctx: &egui::Context, theme: ThemeMode) {
        let Some(notice) = self.notice.clone() else { return };
        Self::dim_background(ctx, "compositor_notice_overlay");
        let title_col: egui::Color32 = match notice.level {
            NoticeLevel::Info => ColorPalette::BLUE_500,
            NoticeLevel::Error => ColorPalette::RED_500,
        };
        let mut close: bool = false;
        egui::Window::new(egui::RichText::new(&notice.title).color(title_col))
            .id(egui::Id::new("compositor_notice"))
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .min_width(320.0)
            .frame(Self::modal_frame(theme))
            .order(egui::Order::Tooltip)
            .show(ctx, |ui| {
                ui.label(&notice.message);
                ui.add_space(12.0);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("OK").clicked() { close = true; }
                });
            });
        let key_close: bool = ctx.input_mut(|i| {
            i.consume_key(egui::Modifiers::NONE, egui::Key::Enter) | i.consume_key(egui::Modifiers::NONE, egui::Key::Escape)
        });
        if close || key_close {
            self.notice = None;
        }
    }

    pub(super) fn render_dialog(&mut self, ctx: &egui::Context, theme: ThemeMode) {
        if self.dialog == Dialog::None { return; }
        Self::dim_background(ctx, "compositor_dialog_overlay");

        let title: &str = match self.dialog {
            Dialog::CanvasSize { .. } => "Canvas Size",
            Dialog::BatchExport { .. } => "Stack and Save",
            Dialog::None => "",
        };
        let available: usize = self.state.memory.len().max(1);
        let (mut ok, mut cancel) = (false, false);

        egui::Window::new(title)
            .id(egui::Id::new("compositor_dialog"))
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .min_width(320.0)
            .frame(Self::modal_frame(theme))
            .order(egui::Order::Tooltip)
            .show(ctx, |ui| {
                match &mut self.dialog {
                    Dialog::CanvasSize { width, height } => {
                        egui::Grid::new("canvas_size_grid").num_columns(2).spacing([12.0, 8.0]).show(ui, |ui| {
                            ui.label("Width:");
                            ui.add(egui::TextEdit::singleline(width).desired_width(120.0));
                            ui.end_row();
                            ui.label("Height:");
                            ui.add(egui::TextEdit::singleline(height).desired_width(120.0));
                            ui.end_row();
                        });
                    }
                    Dialog::BatchExport { count } => {
                        ui.label("How many images should be stacked?");
                        ui.add(egui::Slider::new(count, 1..=available));
                    }
                    Dialog::None => {}
                }
                ui.add_space(12.0);
                ui.horizontal(|ui| {
                    if ui.button("OK").clicked() { ok = true; }
                    if ui.button("Cancel").clicked() { cancel = true; }
                });
            });

        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) { cancel = true; }
        if ctx.input(|i| i.key_pressed(egui::Key::Enter)) { ok = true; }
        if cancel {
            self.dialog = Dialog::None;
            return;
        }
        if !ok { return; }
        match std::mem::replace(&mut self.dialog, Dialog::None) {
            Dialog::CanvasSize { width, height } => self.confirm_canvas_size(width, height),
            Dialog::BatchExport { count } => self.confirm_batch_export(count),
            Dialog::None => {}
        }
    }
}
