use gtk4::prelude::*;
use gtk4::Application;

use crate::config::{AssetPaths, DisplayConfig, SensorConfig};
use crate::ui::KioskWindow;

const APP_ID: &str = "com.shelfvid.Display";

/// Command-line flag that opens the GTK inspector.
pub const DEV_FLAG: &str = "--dev";

pub struct ShelfvidApp {
    app: Application,
    dev: bool,
}

impl ShelfvidApp {
    pub fn new(dev: bool) -> Self {
        let app = Application::builder()
            .application_id(APP_ID)
            .flags(gio::ApplicationFlags::NON_UNIQUE)
            .build();

        app.connect_activate(move |app| Self::on_activate(app, dev));

        Self { app, dev }
    }

    /// Run with `args`, minus the flags this binary handles itself.
    pub fn run_with_args(&self, args: &[String]) -> i32 {
        let gtk_args = strip_dev_flag(args);
        if self.dev {
            tracing::info!("dev mode: GTK inspector enabled");
        }
        self.app.run_with_args(&gtk_args).into()
    }

    fn on_activate(app: &Application, dev: bool) {
        let config = DisplayConfig::default();
        let assets = AssetPaths::discover();
        let sensor = SensorConfig::from_env();
        tracing::info!("media dir: {}", assets.media_dir.display());

        let window = KioskWindow::new(app, &config, &assets, &sensor);
        window.present();
        if dev {
            gtk4::Window::set_interactive_debugging(true);
        }
        // Keep the window alive by storing it on the Application.
        unsafe {
            app.set_data("kiosk-window", window);
        }
    }
}

pub fn has_dev_flag(args: &[String]) -> bool {
    args.iter().skip(1).any(|a| a == DEV_FLAG)
}

fn strip_dev_flag(args: &[String]) -> Vec<String> {
    args.iter()
        .enumerate()
        .filter(|(i, a)| *i == 0 || a.as_str() != DEV_FLAG)
        .map(|(_, a)| a.clone())
        .collect()
}
