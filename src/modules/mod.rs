pub mod compositor;
pub mod image_export;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    None,
    LoadBackground,
    LoadChat,
    Save,
    StoreInMemory,
    BatchExport,
    Undo,
    Redo,
    Outline,
    ClearCanvas,
    CanvasSize,
    ToggleGuides,
    ToggleMagnetic,
}

#[derive(Debug, Clone)]
pub struct MenuItem {
    pub label: String,
    pub shortcut: Option<String>,
    pub enabled: bool,
}

impl MenuItem {
    pub fn new(label: &str, shortcut: Option<&str>, enabled: bool) -> Self {
        Self { label: label.to_string(), shortcut: shortcut.map(str::to_string), enabled }
    }

    /// Label as shown in a menu, with the shortcut in parentheses.
    pub fn display(&self) -> String {
        match &self.shortcut {
            Some(shortcut) => format!("{} ({})", self.label, shortcut),
            None => self.label.clone(),
        }
    }
}

/// Items the workspace adds to each top-level menu.
#[derive(Debug, Clone, Default)]
pub struct MenuContribution {
    pub file_items: Vec<(MenuItem, MenuAction)>,
    pub edit_items: Vec<(MenuItem, MenuAction)>,
    pub view_items: Vec<(MenuItem, MenuAction)>,
    pub canvas_items: Vec<(MenuItem, MenuAction)>,
}
