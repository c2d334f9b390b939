mod app;
mod assets;
mod config;
mod layout;
mod logging;
mod models;
mod overlay;
mod playback;
mod sensor;
mod ui;
mod video;

use app::{has_dev_flag, ShelfvidApp};

fn main() {
    // Prefer C numeric locale up-front; GTK may later adjust locale again.
    std::env::set_var("LC_NUMERIC", "C");
    unsafe {
        libc::setlocale(libc::LC_NUMERIC, b"C\0".as_ptr().cast());
    }

    if let Err(e) = logging::init() {
        eprintln!("logging unavailable: {:#}", e);
    }

    let args: Vec<String> = std::env::args().collect();
    let app = ShelfvidApp::new(has_dev_flag(&args));
    std::process::exit(app.run_with_args(&args));
}
