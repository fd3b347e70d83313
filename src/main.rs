#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app;
mod error;
mod modules;
mod style;

use eframe::egui;

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 820.0])
            .with_min_inner_size([640.0, 480.0])
            .with_title("Chat Compositor"),
        ..Default::default()
    };
    eframe::run_native(
        "Chat Compositor",
        options,
        Box::new(|cc| Ok(Box::new(app::CompositorApp::new(cc)))),
    )
}
