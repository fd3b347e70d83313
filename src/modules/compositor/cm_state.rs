use image::{RgbImage, RgbaImage};
use crate::error::{EditorError, Result};
use super::cm_helpers::SelectionRect;
use super::cm_history::{History, HistoryEntry, DEFAULT_HISTORY_LIMIT};
use super::cm_memory::{MemoryBuffer, DEFAULT_MEMORY_LIMIT};
use super::cm_snap::{alpha_bbox, snap_position, SnapGuides, SnapPolicy};
use super::cm_tools;

pub const MIN_SCALE: f32 = 0.1;
pub const MAX_SCALE: f32 = 5.0;
pub const MAX_CANVAS_SIDE: u32 = 10_000;

/// Background raster together with the resampled copy that is actually drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundLayer {
    source: RgbaImage,
    scale: f32,
    scaled: RgbaImage,
}

impl BackgroundLayer {
    pub fn new(source: RgbaImage, scale: f32) -> Self {
        let scale: f32 = scale.clamp(MIN_SCALE, MAX_SCALE);
        let scaled: RgbaImage = cm_tools::rescale(&source, scale);
        Self { source, scale, scaled }
    }

    pub fn set_scale(&mut self, scale: f32) {
        let scale: f32 = scale.clamp(MIN_SCALE, MAX_SCALE);
        if (scale - self.scale).abs() < f32::EPSILON { return; }
        self.scale = scale;
        self.scaled = cm_tools::rescale(&self.source, scale);
    }

    pub fn image(&self) -> &RgbaImage { &self.scaled }
    pub fn scale(&self) -> f32 { self.scale }
}

/// Everything on the canvas that undo restores.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanvasState {
    pub background: Option<BackgroundLayer>,
    pub bg_pos: (i32, i32),
    pub chat: Option<RgbaImage>,
    pub chat_pos: (i32, i32),
    pub cropped: bool,
    pub outlined: bool,
    pub magnetic_override: bool,
}

impl CanvasState {
    /// Drops both layers and all flags. Positions stay where they were.
    pub fn reset(&mut self) {
        self.background = None;
        self.chat = None;
        self.cropped = false;
        self.outlined = false;
        self.magnetic_override = false;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditorConfig {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub guide_offset: i32,
    pub snap_tolerance: i32,
    pub bg_threshold: u8,
    pub memory_limit: usize,
    pub history_limit: usize,
    pub snap_policy: SnapPolicy,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            canvas_width: 650,
            canvas_height: 650,
            guide_offset: 10,
            snap_tolerance: 10,
            bg_threshold: 50,
            memory_limit: DEFAULT_MEMORY_LIMIT,
            history_limit: DEFAULT_HISTORY_LIMIT,
            snap_policy: SnapPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragTarget { Background, Chat }

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DragState {
    target: DragTarget,
    grab: (i32, i32),
    start: (i32, i32),
}

/// Every state change the workspace can ask for. Pointer positions are canvas pixels.
#[derive(Debug, Clone)]
pub enum EditorCommand {
    LoadBackground(RgbaImage),
    LoadChat(RgbaImage),
    BeginDrag { target: DragTarget, pointer: (i32, i32) },
    DragTo { pointer: (i32, i32) },
    EndDrag,
    Crop(SelectionRect),
    Outline,
    DeleteRegion(SelectionRect),
    Rescale { factor: f32, commit: bool },
    StoreInMemory,
    FinishExport,
    FinishBatchExport,
    ClearCanvas,
    ResizeCanvas { width: String, height: String },
    ToggleGuides,
    ToggleMagnetic,
    Undo,
    Redo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Unchanged,
    Changed,
    MemoryStored { count: usize, limit: usize, full: bool },
}

pub struct EditorState {
    pub config: EditorConfig,
    pub canvas: CanvasState,
    pub memory: MemoryBuffer,
    history: History,
    canvas_size: (u32, u32),
    guides_visible: bool,
    background_scale: f32,
    drag: Option<DragState>,
    bg_revision: u64,
    chat_revision: u64,
}

impl EditorState {
    pub fn new(config: EditorConfig) -> Self {
        let canvas: CanvasState = CanvasState::default();
        let memory: MemoryBuffer = MemoryBuffer::new(config.memory_limit);
        let seed = HistoryEntry { canvas: canvas.clone(), memory: memory.clone() };
        Self {
            canvas_size: (config.canvas_width.max(1), config.canvas_height.max(1)),
            history: History::new(seed, config.history_limit),
            config,
            canvas,
            memory,
            guides_visible: true,
            background_scale: 1.0,
            drag: None,
            bg_revision: 0,
            chat_revision: 0,
        }
    }

    pub fn canvas_size(&self) -> (u32, u32) { self.canvas_size }
    pub fn guides_visible(&self) -> bool { self.guides_visible }
    pub fn background_scale(&self) -> f32 { self.background_scale }
    pub fn bg_revision(&self) -> u64 { self.bg_revision }
    pub fn chat_revision(&self) -> u64 { self.chat_revision }
    pub fn dragging(&self) -> Option<DragTarget> { self.drag.map(|d| d.target) }
    pub fn can_undo(&self) -> bool { self.history.can_undo() }
    pub fn can_redo(&self) -> bool { self.history.can_redo() }
    pub fn history_len(&self) -> usize { self.history.len() }

    pub fn guides(&self) -> SnapGuides {
        SnapGuides { offset: self.config.guide_offset, tolerance: self.config.snap_tolerance }
    }

    pub fn is_magnetic_enabled(&self) -> bool {
        let c = &self.canvas;
        self.config.snap_policy.is_active(c.cropped, c.outlined, c.magnetic_override)
    }

    /// The magnet toggle can only be used once the chat is cropped and outlined.
    pub fn magnet_available(&self) -> bool { self.canvas.cropped && self.canvas.outlined }

    pub fn composite(&self) -> RgbImage {
        cm_tools::composite(&self.canvas, self.canvas_size.0, self.canvas_size.1)
    }

    pub fn stacked_memory(&self, count: usize) -> Result<RgbImage> {
        self.memory.stack(count, self.canvas_size.0, self.canvas_size.1)
    }

    /// Applies one command. Anything that changes the canvas or memory ends with a history push.
    pub fn execute(&mut self, cmd: EditorCommand) -> Result<Outcome> {
        match cmd {
            EditorCommand::LoadBackground(img) => {
                self.canvas.background = Some(BackgroundLayer::new(img, self.background_scale));
                self.bg_revision += 1;
                self.commit();
            }
            EditorCommand::LoadChat(img) => {
                self.canvas.chat = Some(cm_tools::remove_background(&img, self.config.bg_threshold));
                self.canvas.chat_pos = (0, 0);
                self.chat_revision += 1;
                self.commit();
            }
            EditorCommand::BeginDrag { target, pointer } => {
                let origin: (i32, i32) = match target {
                    DragTarget::Background if self.canvas.background.is_some() => self.canvas.bg_pos,
                    DragTarget::Chat if self.canvas.chat.is_some() => self.canvas.chat_pos,
                    _ => return Ok(Outcome::Unchanged),
                };
                self.drag = Some(DragState { target, grab: (pointer.0 - origin.0, pointer.1 - origin.1), start: origin });
                return Ok(Outcome::Unchanged);
            }
            EditorCommand::DragTo { pointer } => return Ok(self.drag_to(pointer)),
            EditorCommand::EndDrag => {
                let Some(drag) = self.drag.take() else { return Ok(Outcome::Unchanged) };
                let now: (i32, i32) = match drag.target {
                    DragTarget::Background => self.canvas.bg_pos,
                    DragTarget::Chat => self.canvas.chat_pos,
                };
                if now == drag.start { return Ok(Outcome::Unchanged); }
                self.commit();
            }
            EditorCommand::Crop(rect) => {
                let chat: &RgbaImage = self.canvas.chat.as_ref().ok_or(EditorError::NoChatImage)?;
                let cropped: RgbaImage = cm_tools::crop_region(chat, self.canvas.chat_pos, rect)?;
                self.canvas.chat = Some(cropped);
                self.canvas.cropped = true;
                self.chat_revision += 1;
                self.commit();
            }
            EditorCommand::Outline => {
                let chat: &RgbaImage = self.canvas.chat.as_ref().ok_or(EditorError::NoChatImage)?;
                self.canvas.chat = Some(cm_tools::add_outline(chat));
                self.canvas.outlined = true;
                self.chat_revision += 1;
                self.commit();
            }
            EditorCommand::DeleteRegion(rect) => {
                let pos: (i32, i32) = self.canvas.chat_pos;
                let chat: &mut RgbaImage = self.canvas.chat.as_mut().ok_or(EditorError::NoChatImage)?;
                if !cm_tools::clear_region(chat, pos, rect) { return Ok(Outcome::Unchanged); }
                self.chat_revision += 1;
                self.commit();
            }
            EditorCommand::Rescale { factor, commit } => {
                self.background_scale = factor.clamp(MIN_SCALE, MAX_SCALE);
                let Some(bg) = self.canvas.background.as_mut() else { return Ok(Outcome::Unchanged) };
                bg.set_scale(self.background_scale);
                self.bg_revision += 1;
                if !commit { return Ok(Outcome::Changed); }
                self.commit();
            }
            EditorCommand::StoreInMemory => {
                let snapshot: RgbImage = self.composite();
                let count: usize = self.memory.push(snapshot)?;
                self.clear_layers();
                self.commit();
                let limit: usize = self.memory.limit();
                log::info!("stored canvas in memory ({count}/{limit})");
                return Ok(Outcome::MemoryStored { count, limit, full: count >= limit });
            }
            EditorCommand::FinishExport => {
                self.clear_layers();
                self.commit();
            }
            EditorCommand::FinishBatchExport => {
                self.memory.clear();
                self.clear_layers();
                self.commit();
            }
            EditorCommand::ClearCanvas => {
                self.clear_layers();
                self.commit();
            }
            EditorCommand::ResizeCanvas { width, height } => {
                let parsed = (width.trim().parse::<u32>(), height.trim().parse::<u32>());
                let (Ok(w), Ok(h)) = parsed else {
                    return Err(EditorError::InvalidCanvasSize { width, height });
                };
                if !(1..=MAX_CANVAS_SIDE).contains(&w) || !(1..=MAX_CANVAS_SIDE).contains(&h) {
                    return Err(EditorError::InvalidCanvasSize { width, height });
                }
                self.canvas_size = (w, h);
                log::info!("canvas resized to {w}x{h}");
                self.commit();
            }
            EditorCommand::ToggleGuides => {
                self.guides_visible = !self.guides_visible;
                self.commit();
            }
            EditorCommand::ToggleMagnetic => {
                self.canvas.magnetic_override = !self.canvas.magnetic_override;
                self.commit();
            }
            EditorCommand::Undo => {
                let Some(entry) = self.history.undo() else { return Ok(Outcome::Unchanged) };
                let entry: HistoryEntry = entry.clone();
                self.restore(entry);
            }
            EditorCommand::Redo => {
                let Some(entry) = self.history.redo() else { return Ok(Outcome::Unchanged) };
                let entry: HistoryEntry = entry.clone();
                self.restore(entry);
            }
        }
        Ok(Outcome::Changed)
    }

    fn drag_to(&mut self, pointer: (i32, i32)) -> Outcome {
        let Some(drag) = self.drag else { return Outcome::Unchanged };
        let pos: (i32, i32) = (pointer.0 - drag.grab.0, pointer.1 - drag.grab.1);
        match drag.target {
            DragTarget::Background => self.canvas.bg_pos = pos,
            DragTarget::Chat => {
                let bbox = match &self.canvas.chat {
                    Some(chat) if self.is_magnetic_enabled() => alpha_bbox(chat),
                    _ => None,
                };
                self.canvas.chat_pos = match bbox {
                    Some(bbox) => snap_position(pos, bbox, self.canvas_size.1, self.guides()),
                    None => pos,
                };
            }
        }
        Outcome::Changed
    }

    fn clear_layers(&mut self) {
        self.canvas.reset();
        self.drag = None;
        self.bg_revision += 1;
        self.chat_revision += 1;
    }

    fn commit(&mut self) {
        self.history.push(HistoryEntry { canvas: self.canvas.clone(), memory: self.memory.clone() });
    }

    fn restore(&mut self, entry: HistoryEntry) {
        self.canvas = entry.canvas;
        self.memory = entry.memory;
        if let Some(bg) = &self.canvas.background { self.background_scale = bg.scale(); }
        self.drag = None;
        self.bg_revision += 1;
        self.chat_revision += 1;
    }
}

impl Default for EditorState {
    fn default() -> Self { Self::new(EditorConfig::default()) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(w: u32, h: u32, px: [u8; 4]) -> RgbaImage { RgbaImage::from_pixel(w, h, Rgba(px)) }

    fn small_state() -> EditorState {
        EditorState::new(EditorConfig { canvas_width: 40, canvas_height: 30, ..EditorConfig::default() })
    }

    fn drag(state: &mut EditorState, target: DragTarget, from: (i32, i32), to: (i32, i32)) {
        state.execute(EditorCommand::BeginDrag { target, pointer: from }).unwrap();
        state.execute(EditorCommand::DragTo { pointer: to }).unwrap();
        state.execute(EditorCommand::EndDrag).unwrap();
    }

    #[test]
    fn history_is_seeded_with_empty_state() {
        let mut state = EditorState::default();
        assert_eq!(state.history_len(), 1);
        assert_eq!(state.execute(EditorCommand::Undo).unwrap(), Outcome::Unchanged);
        assert_eq!(state.execute(EditorCommand::Redo).unwrap(), Outcome::Unchanged);
    }

    #[test]
    fn loading_chat_strips_dark_pixels_and_resets_position() {
        let mut state = small_state();
        state.canvas.chat_pos = (7, 7);
        let mut img = solid(2, 1, [10, 10, 10, 255]);
        img.put_pixel(1, 0, Rgba([200, 10, 10, 255]));
        state.execute(EditorCommand::LoadChat(img)).unwrap();
        let chat = state.canvas.chat.as_ref().unwrap();
        assert_eq!(chat.get_pixel(0, 0), &Rgba([0, 0, 0, 0]));
        assert_eq!(chat.get_pixel(1, 0), &Rgba([200, 10, 10, 255]));
        assert_eq!(state.canvas.chat_pos, (0, 0));
    }

    #[test]
    fn drag_keeps_grab_offset_and_commits_once() {
        let mut state = small_state();
        state.execute(EditorCommand::LoadBackground(solid(5, 5, [1, 2, 3, 255]))).unwrap();
        let before = state.history_len();
        drag(&mut state, DragTarget::Background, (2, 2), (12, 7));
        assert_eq!(state.canvas.bg_pos, (10, 5));
        assert_eq!(state.history_len(), before + 1);
        // a click without motion is not a move
        drag(&mut state, DragTarget::Background, (12, 7), (12, 7));
        assert_eq!(state.history_len(), before + 1);
    }

    #[test]
    fn drag_without_layer_is_ignored() {
        let mut state = small_state();
        drag(&mut state, DragTarget::Chat, (0, 0), (10, 10));
        assert_eq!(state.canvas.chat_pos, (0, 0));
        assert_eq!(state.dragging(), None);
    }

    #[test]
    fn crop_outside_chat_leaves_it_unchanged() {
        let mut state = small_state();
        state.execute(EditorCommand::LoadChat(solid(10, 10, [255, 255, 255, 255]))).unwrap();
        let before = state.canvas.clone();
        let len = state.history_len();
        let rect = SelectionRect::from_corners((300, 300), (400, 400));
        assert!(matches!(state.execute(EditorCommand::Crop(rect)), Err(EditorError::SelectionTooSmall)));
        assert_eq!(state.canvas, before);
        assert!(!state.canvas.cropped);
        assert_eq!(state.history_len(), len);
    }

    #[test]
    fn crop_keeps_chat_position() {
        let mut state = small_state();
        state.execute(EditorCommand::LoadChat(solid(10, 10, [255, 255, 255, 255]))).unwrap();
        drag(&mut state, DragTarget::Chat, (0, 0), (5, 5));
        let rect = SelectionRect::from_corners((7, 7), (12, 10));
        state.execute(EditorCommand::Crop(rect)).unwrap();
        assert_eq!(state.canvas.chat.as_ref().unwrap().dimensions(), (5, 3));
        assert_eq!(state.canvas.chat_pos, (5, 5));
        assert!(state.canvas.cropped);
    }

    #[test]
    fn chat_commands_need_a_chat() {
        let mut state = small_state();
        assert!(matches!(state.execute(EditorCommand::Outline), Err(EditorError::NoChatImage)));
        let rect = SelectionRect::from_corners((0, 0), (3, 3));
        assert!(matches!(state.execute(EditorCommand::DeleteRegion(rect)), Err(EditorError::NoChatImage)));
    }

    #[test]
    fn undo_walks_back_through_every_snapshot() {
        let mut state = small_state();
        state.execute(EditorCommand::LoadChat(solid(8, 8, [255, 255, 255, 255]))).unwrap();
        let mut snapshots = vec![state.canvas.clone()];
        for i in 1..=5 {
            drag(&mut state, DragTarget::Chat, (0, 0), (i, i));
            snapshots.push(state.canvas.clone());
        }
        let (x, y) = state.canvas.chat_pos;
        state.execute(EditorCommand::DeleteRegion(SelectionRect::from_corners((x + 1, y + 1), (x + 3, y + 3)))).unwrap();
        snapshots.push(state.canvas.clone());

        for expected in snapshots.iter().rev().skip(1) {
            state.execute(EditorCommand::Undo).unwrap();
            assert_eq!(&state.canvas, expected);
        }
        state.execute(EditorCommand::Undo).unwrap();
        assert_eq!(state.canvas, CanvasState::default());
        assert_eq!(state.execute(EditorCommand::Undo).unwrap(), Outcome::Unchanged);
    }

    #[test]
    fn new_action_after_undo_discards_redo() {
        let mut state = small_state();
        state.execute(EditorCommand::LoadChat(solid(4, 4, [255, 255, 255, 255]))).unwrap();
        state.execute(EditorCommand::Outline).unwrap();
        state.execute(EditorCommand::Undo).unwrap();
        assert!(state.can_redo());
        state.execute(EditorCommand::ToggleMagnetic).unwrap();
        assert!(!state.can_redo());
        assert!(!state.canvas.outlined);
    }

    #[test]
    fn history_is_capped() {
        let mut state = small_state();
        state.execute(EditorCommand::LoadChat(solid(4, 4, [255, 255, 255, 255]))).unwrap();
        for i in 1..=10 { drag(&mut state, DragTarget::Chat, (0, 0), (i, 0)); }
        assert_eq!(state.history_len(), 10);
        while state.can_undo() { state.execute(EditorCommand::Undo).unwrap(); }
        // the seed and the load have been evicted
        assert_eq!(state.canvas.chat_pos, (1, 0));
    }

    #[test]
    fn restored_state_does_not_alias_history() {
        let mut state = small_state();
        state.execute(EditorCommand::LoadChat(solid(4, 4, [255, 255, 255, 255]))).unwrap();
        state.execute(EditorCommand::Outline).unwrap();
        state.execute(EditorCommand::Undo).unwrap();
        let restored = state.canvas.clone();
        state.canvas.chat.as_mut().unwrap().put_pixel(0, 0, Rgba([1, 1, 1, 1]));
        state.execute(EditorCommand::Redo).unwrap();
        state.execute(EditorCommand::Undo).unwrap();
        assert_eq!(state.canvas, restored);
    }

    #[test]
    fn memory_fills_then_batch_export_clears_it() {
        let mut state = small_state();
        for i in 1..=5 {
            state.execute(EditorCommand::LoadBackground(solid(40, 30, [i * 40, 0, 0, 255]))).unwrap();
            let outcome = state.execute(EditorCommand::StoreInMemory).unwrap();
            assert_eq!(outcome, Outcome::MemoryStored { count: i as usize, limit: 5, full: i == 5 });
            assert!(state.canvas.background.is_none());
        }
        assert!(matches!(state.execute(EditorCommand::StoreInMemory), Err(EditorError::MemoryFull { limit: 5 })));

        let sheet = state.stacked_memory(3).unwrap();
        assert_eq!(sheet.dimensions(), (40, 90));
        assert_eq!(sheet.get_pixel(0, 65).0, [120, 0, 0]);

        state.execute(EditorCommand::FinishBatchExport).unwrap();
        assert!(state.memory.is_empty());
        // memory is part of the snapshot
        state.execute(EditorCommand::Undo).unwrap();
        assert_eq!(state.memory.len(), 5);
    }

    #[test]
    fn reset_keeps_positions() {
        let mut state = small_state();
        state.execute(EditorCommand::LoadChat(solid(4, 4, [255, 255, 255, 255]))).unwrap();
        drag(&mut state, DragTarget::Chat, (0, 0), (3, 4));
        state.execute(EditorCommand::ToggleMagnetic).unwrap();
        state.execute(EditorCommand::ClearCanvas).unwrap();
        assert!(state.canvas.chat.is_none());
        assert!(!state.canvas.magnetic_override);
        assert_eq!(state.canvas.chat_pos, (3, 4));
    }

    #[test]
    fn invalid_canvas_size_is_rejected() {
        let mut state = small_state();
        for (w, h) in [("0", "10"), ("abc", "10"), ("10", "-4"), ("", ""), ("10", "10001"), ("4294967295", "10")] {
            let cmd = EditorCommand::ResizeCanvas { width: w.into(), height: h.into() };
            assert!(matches!(state.execute(cmd), Err(EditorError::InvalidCanvasSize { .. })));
        }
        assert_eq!(state.canvas_size(), (40, 30));
        state.execute(EditorCommand::ResizeCanvas { width: " 800".into(), height: "600".into() }).unwrap();
        assert_eq!(state.canvas_size(), (800, 600));
        assert_eq!(state.composite().dimensions(), (800, 600));
    }

    #[test]
    fn snapping_follows_flags() {
        let mut state = EditorState::default();
        let mut chat = solid(20, 20, [0, 0, 0, 0]);
        for x in 2..18 { for y in 2..18 { chat.put_pixel(x, y, Rgba([255, 255, 255, 255])); } }
        state.canvas.chat = Some(chat);
        drag(&mut state, DragTarget::Chat, (0, 0), (15, 14));
        assert_eq!(state.canvas.chat_pos, (15, 14));

        state.canvas.cropped = true;
        state.canvas.outlined = true;
        // pointer motion lands at (16, 14), close enough to both guides
        drag(&mut state, DragTarget::Chat, (0, 0), (1, 0));
        assert_eq!(state.canvas.chat_pos, (8, 8));

        state.config.snap_policy = SnapPolicy::OverrideDisables;
        state.canvas.magnetic_override = true;
        drag(&mut state, DragTarget::Chat, (0, 0), (7, 6));
        assert_eq!(state.canvas.chat_pos, (15, 14));
    }

    #[test]
    fn rescale_applies_to_background_and_export() {
        let mut state = small_state();
        state.execute(EditorCommand::LoadBackground(solid(10, 10, [0, 0, 255, 255]))).unwrap();
        let len = state.history_len();
        state.execute(EditorCommand::Rescale { factor: 2.0, commit: false }).unwrap();
        assert_eq!(state.history_len(), len);
        state.execute(EditorCommand::Rescale { factor: 2.0, commit: true }).unwrap();
        assert_eq!(state.history_len(), len + 1);
        assert_eq!(state.canvas.background.as_ref().unwrap().image().dimensions(), (20, 20));
        assert_eq!(state.composite().get_pixel(15, 15).0, [0, 0, 255]);
        state.execute(EditorCommand::Undo).unwrap();
        assert!((state.background_scale() - 1.0).abs() < f32::EPSILON);
    }
}
