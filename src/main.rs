use clap::Parser;
use eframe::egui;

use paintlite::app::PaintLiteApp;
use paintlite::cli::{self, CliArgs};
use paintlite::logger;
use paintlite::settings::EditorSettings;

fn main() -> Result<(), eframe::Error> {
    // -- CLI / headless mode ---------------------------------------------
    if CliArgs::is_cli_mode() {
        let args = CliArgs::parse();
        let settings = args.settings();
        logger::init(settings.log_level);
        let code = cli::run(args, &settings);
        std::process::exit(if code == std::process::ExitCode::SUCCESS { 0 } else { 1 });
    }

    // -- GUI mode -----------------------------------------------------
    let settings = EditorSettings::load();
    if let Some(path) = logger::init(settings.log_level) {
        log::info!("Logging to {}", path.display());
    }
    log::info!("Brush: {:?}", settings.brush);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1024.0, 720.0])
            .with_title("PaintLite"),
        ..Default::default()
    };

    eframe::run_native(
        "PaintLite",
        options,
        Box::new(move |cc| Box::new(PaintLiteApp::new(cc, settings))),
    )
}
