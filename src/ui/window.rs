// Kiosk window for shelfvid
// Undecorated fullscreen ApplicationWindow holding the row grid: price tags
// underneath, one mpv surface per row on top.

use gdk4::Display;
use gtk4::prelude::*;
use gtk4::{
    Align, Application, ApplicationWindow, ContentFit, CssProvider, Fixed, Picture,
    STYLE_PROVIDER_PRIORITY_APPLICATION,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::keybindings::Keybindings;
use crate::assets::{read_dimensions, resolve_video_file};
use crate::config::{AssetPaths, DisplayConfig, SensorConfig};
use crate::layout::Container;
use crate::models::{ContainerSize, PriceTagLayout};
use crate::overlay::build_price_tag_layout;
use crate::playback::{RowPlayback, TriggerOptions};
use crate::sensor::{open_sensor_source, SensorCommand};
use crate::video::{MpvSurfaceFactory, SurfaceEvent, VideoPool};

const TEMPLATE_VIDEO_ID: &str = "stableVideo";

const KIOSK_CSS: &str = r#"
window.kiosk,
window.kiosk > * {
    background-color: #000000;
}

.row-grid {
    background-color: transparent;
}

.price-tag {
    background-color: transparent;
}
"#;

fn load_css() {
    let provider = CssProvider::new();
    provider.load_from_string(KIOSK_CSS);

    if let Some(display) = Display::default() {
        gtk4::style_context_add_provider_for_display(
            &display,
            &provider,
            STYLE_PROVIDER_PRIORITY_APPLICATION,
        );
    }
}

/// Measures the row grid the videos are placed in.
pub struct FixedContainer {
    fixed: Fixed,
    window: ApplicationWindow,
    nominal_width: f64,
    nominal_height: f64,
}

impl Container for FixedContainer {
    fn measure(&self) -> Option<ContainerSize> {
        self.fixed.root()?;
        Some(ContainerSize::resolve(
            self.fixed.width() as f64,
            self.fixed.height() as f64,
            self.window.width() as f64,
            self.nominal_width,
            self.nominal_height,
        ))
    }
}

type DisplayPlayback = RowPlayback<MpvSurfaceFactory, FixedContainer>;

/// The display window
pub struct KioskWindow {
    window: ApplicationWindow,
    display: Fixed,
    playback: Rc<RefCell<DisplayPlayback>>,
    keybindings: Keybindings,
    last_size: Cell<(i32, i32, i32)>,
}

impl KioskWindow {
    pub fn new(
        app: &Application,
        config: &DisplayConfig,
        assets: &AssetPaths,
        sensor: &SensorConfig,
    ) -> Rc<Self> {
        load_css();

        let window = ApplicationWindow::builder()
            .application(app)
            .title("shelfvid")
            .decorated(false)
            .default_width(config.display_width_px as i32)
            .default_height(config.grid_height_px() as i32)
            .build();
        window.add_css_class("kiosk");

        let display = Fixed::new();
        display.add_css_class("row-grid");
        display.set_size_request(
            config.display_width_px as i32,
            config.grid_height_px() as i32,
        );
        display.set_halign(Align::Start);
        display.set_valign(Align::Start);
        window.set_child(Some(&display));

        let tags = build_price_tag_layout(config, assets);
        add_price_tags(&display, &tags, config.row_height_px);

        let (event_tx, event_rx) = async_channel::unbounded::<SurfaceEvent>();
        let factory = MpvSurfaceFactory::new(&display, event_tx);
        let template = factory.create_template(TEMPLATE_VIDEO_ID, resolve_video_file(assets));
        let mut pool = VideoPool::new(factory);
        pool.initialize_template(template);

        let container = FixedContainer {
            fixed: display.clone(),
            window: window.clone(),
            nominal_width: config.display_width_px,
            nominal_height: config.grid_height_px(),
        };
        let playback = Rc::new(RefCell::new(RowPlayback::new(config, pool, container)));

        let keybindings = Keybindings::new(config.row_count);
        keybindings.attach(&window);

        let kiosk = Rc::new(Self {
            window,
            display,
            playback,
            keybindings,
            last_size: Cell::new((0, 0, 0)),
        });

        kiosk.setup_keybinding_callbacks();
        kiosk.setup_surface_events(event_rx);
        kiosk.setup_sensor_bridge(sensor);
        kiosk.setup_resize_observer();

        kiosk.window.fullscreen();
        kiosk
    }

    fn setup_keybinding_callbacks(&self) {
        let playback = Rc::downgrade(&self.playback);
        self.keybindings.connect_row_triggered(move |row| {
            if let Some(playback) = playback.upgrade() {
                playback.borrow_mut().trigger(row, TriggerOptions::default());
            }
        });
    }

    /// Deliver metadata and end-of-media notifications on the main loop.
    fn setup_surface_events(&self, receiver: async_channel::Receiver<SurfaceEvent>) {
        let playback = Rc::downgrade(&self.playback);
        glib::spawn_future_local(async move {
            while let Ok(event) = receiver.recv().await {
                if let Some(playback) = playback.upgrade() {
                    playback.borrow_mut().handle_event(event);
                } else {
                    break;
                }
            }
        });
    }

    fn setup_sensor_bridge(&self, sensor: &SensorConfig) {
        let source = open_sensor_source(sensor);
        tracing::info!("sensor source: {}", source.describe());

        let (tx, rx) = flume::unbounded::<SensorCommand>();
        if let Err(e) = source.start(tx) {
            tracing::warn!("sensor bridge inactive: {:#}", e);
            return;
        }

        let playback = Rc::downgrade(&self.playback);
        glib::spawn_future_local(async move {
            // Ends once the reader thread drops its sender.
            while let Ok(command) = rx.recv_async().await {
                let Some(playback) = playback.upgrade() else {
                    break;
                };
                if command == SensorCommand::Detected {
                    tracing::info!("serial: SENSOR_DETECTED");
                    playback.borrow_mut().sensor_restart();
                }
            }
            tracing::info!("sensor bridge closed");
        });
    }

    fn setup_resize_observer(self: &Rc<Self>) {
        let weak_self = Rc::downgrade(self);
        self.display.add_tick_callback(move |_widget, _clock| {
            let Some(kiosk) = weak_self.upgrade() else {
                return glib::ControlFlow::Break;
            };
            let size = (
                kiosk.display.width(),
                kiosk.display.height(),
                kiosk.window.width(),
            );
            if size != kiosk.last_size.get() {
                kiosk.last_size.set(size);
                tracing::debug!("display resized to {}x{}", size.0, size.1);
                kiosk.playback.borrow_mut().recalculate_placements();
            }
            glib::ControlFlow::Continue
        });
    }

    /// Present the window
    pub fn present(&self) {
        self.window.present();
    }
}

fn add_price_tags(display: &Fixed, tags: &PriceTagLayout, row_height: f64) {
    for (row, tag) in tags.iter() {
        let picture = Picture::for_filename(&tag.source);
        picture.add_css_class("price-tag");
        picture.set_content_fit(ContentFit::Contain);
        picture.set_can_target(false);
        picture.set_can_focus(false);

        let width = match read_dimensions(&tag.source) {
            Ok((w, h)) if w > 0 && h > 0 => (row_height * w as f64 / h as f64).round() as i32,
            Ok(_) => -1,
            Err(e) => {
                tracing::warn!("{:#}", e);
                -1
            }
        };
        picture.set_size_request(width, row_height as i32);
        display.put(&picture, tag.x, row as f64 * row_height);
    }
    tracing::debug!("placed {} price tags", tags.len());
}
