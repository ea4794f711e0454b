mod app;
mod ui;
mod viewport;

// Re-export library modules so that `crate::state`, `crate::capture`, etc.
// resolve to the lib crate types everywhere in the binary.
pub use customizer_lib::capture;
pub use customizer_lib::cursor;
pub use customizer_lib::state;

use app::CustomizerApp;

type StartupError = Box<dyn std::error::Error + Send + Sync>;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "customizer_gui=info,customizer_lib=info".into()),
        )
        .init();

    // Parse --model <path> argument
    let model = parse_model_arg().unwrap_or_default();

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Customizer")
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([360.0, 400.0]),
        ..Default::default()
    };

    if let Err(e) = eframe::run_native(
        "customizer-gui",
        native_options,
        Box::new(
            move |cc: &eframe::CreationContext<'_>| -> Result<Box<dyn eframe::App>, StartupError> {
                let app = CustomizerApp::new(cc, model)?;
                Ok(Box::new(app))
            },
        ),
    ) {
        tracing::error!("Failed to start application: {e}");
    }
}

fn parse_model_arg() -> Option<shared::ModelDescription> {
    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;
    while i < args.len() {
        if args[i] == "--model" && i + 1 < args.len() {
            let path = &args[i + 1];
            match std::fs::read_to_string(path) {
                Ok(json) => match shared::ModelDescription::from_json(&json) {
                    Ok(model) => {
                        tracing::info!("Loaded model from {path} ({} parts)", model.parts.len());
                        return Some(model);
                    }
                    Err(e) => {
                        tracing::error!("Failed to parse model JSON from {path}: {e}");
                    }
                },
                Err(e) => {
                    tracing::error!("Failed to read model file {path}: {e}");
                }
            }
            break;
        }
        i += 1;
    }
    None
}
