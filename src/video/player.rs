//! Row video surface backed by libmpv embedded in GTK4.
//!
//! Each surface owns its own mpv instance rendering through the OpenGL
//! render API into a `GLArea` placed in the display's `Fixed` container.
//! mpv is created when the `GLArea` is realized; commands issued before that
//! are remembered and applied on initialization.

use std::cell::{Cell, RefCell};
use std::ffi::c_void;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use anyhow::bail;
use async_channel::Sender;
use glib::clone;
use gtk4::gdk;
use gtk4::prelude::*;
use gtk4::{glib, Fixed, GLArea};
use libmpv2::render::{OpenGLInitParams, RenderContext, RenderParam, RenderParamApiType};
use libmpv2::Mpv;
use once_cell::sync::OnceCell;

use super::surface::{PlaybackError, SurfaceEvent, SurfaceEventKind, SurfaceFactory, VideoSurface};
use crate::layout::TransitionTiming;
use crate::models::Placement;
use crate::ui::animator::WidgetAnimator;

/// Property poll interval; also paces frame redraws.
const POLL_INTERVAL: Duration = Duration::from_millis(16);

static EPOXY_INITIALIZED: OnceCell<()> = OnceCell::new();

fn ensure_epoxy_initialized() {
    EPOXY_INITIALIZED.get_or_init(|| {
        // GTK4 already links epoxy, so its symbols resolve from the process.
        epoxy::load_with(|s| unsafe {
            let handle = libc::dlopen(std::ptr::null(), libc::RTLD_NOW | libc::RTLD_GLOBAL);
            if handle.is_null() {
                return std::ptr::null();
            }
            let sym = match std::ffi::CString::new(s) {
                Ok(name) => libc::dlsym(handle, name.as_ptr()),
                Err(_) => std::ptr::null_mut(),
            };
            libc::dlclose(handle);
            sym
        });
    });
}

struct GlContext;

const GL_FRAMEBUFFER_BINDING: u32 = 0x8CA6;

fn current_framebuffer() -> i32 {
    let ptr = epoxy::get_proc_addr("glGetIntegerv");
    if ptr.is_null() {
        return 0;
    }
    let get_integerv: extern "system" fn(u32, *mut i32) = unsafe { std::mem::transmute(ptr) };
    let mut fbo = 0;
    get_integerv(GL_FRAMEBUFFER_BINDING, &mut fbo);
    fbo
}

#[derive(Default)]
struct PlayerState {
    mpv: Option<Mpv>,
    render_ctx: Option<RenderContext>,
    source: Option<PathBuf>,
    muted: bool,
    looping: bool,
    /// Playback requested before mpv existed.
    want_play: bool,
    init_failed: bool,
    dimensions: (u32, u32),
    metadata_reported: bool,
    eof_reported: bool,
    cycle: u64,
}

impl PlayerState {
    fn apply_flags(&self) {
        if let Some(ref mpv) = self.mpv {
            let _ = mpv.set_property("mute", self.muted);
            let _ = mpv.set_property("loop-file", if self.looping { "inf" } else { "no" });
        }
    }

    fn load_source(&mut self, start_paused: bool) -> Result<(), PlaybackError> {
        let Some(ref mpv) = self.mpv else {
            return Err(PlaybackError::Unavailable);
        };
        let Some(path) = self.source.as_ref().and_then(|p| p.to_str()) else {
            return Err(PlaybackError::NoSource);
        };

        let _ = mpv.set_property("pause", start_paused);
        mpv.command("loadfile", &[path, "replace"])
            .map_err(|e| PlaybackError::Rejected(e.to_string()))?;
        self.metadata_reported = false;
        Ok(())
    }
}

/// One row's video element.
pub struct MpvSurface {
    id: String,
    row: usize,
    source: Option<PathBuf>,
    gl_area: GLArea,
    state: Rc<RefCell<PlayerState>>,
    initialized: Rc<Cell<bool>>,
    animator: WidgetAnimator,
    poll_timer: Rc<RefCell<Option<glib::SourceId>>>,
    events: Sender<SurfaceEvent>,
}

impl MpvSurface {
    /// Create a hidden surface inside `fixed`.
    pub fn new(
        fixed: &Fixed,
        id: &str,
        row: usize,
        source: Option<PathBuf>,
        events: Sender<SurfaceEvent>,
    ) -> Self {
        let gl_area = GLArea::new();
        gl_area.set_widget_name(id);
        gl_area.set_auto_render(false);
        gl_area.set_has_depth_buffer(false);
        gl_area.set_has_stencil_buffer(false);
        gl_area.set_allowed_apis(gdk::GLAPI::GL | gdk::GLAPI::GLES);
        gl_area.set_can_target(false);
        gl_area.set_can_focus(false);
        gl_area.set_visible(false);
        fixed.put(&gl_area, 0.0, 0.0);

        let state = Rc::new(RefCell::new(PlayerState {
            source: source.clone(),
            ..PlayerState::default()
        }));

        let surface = Self {
            id: id.to_string(),
            row,
            source,
            animator: WidgetAnimator::new(fixed, &gl_area),
            gl_area,
            state,
            initialized: Rc::new(Cell::new(false)),
            poll_timer: Rc::new(RefCell::new(None)),
            events,
        };

        surface.setup_gl_callbacks();
        surface.start_poll_timer();
        surface
    }

    fn setup_gl_callbacks(&self) {
        let state = self.state.clone();
        let initialized = self.initialized.clone();
        let id = self.id.clone();

        self.gl_area.connect_realize(clone!(
            #[strong]
            state,
            #[strong]
            initialized,
            move |gl_area| {
                gl_area.make_current();
                if let Some(err) = gl_area.error() {
                    tracing::error!("GLArea error on realize for {}: {}", id, err);
                    state.borrow_mut().init_failed = true;
                    return;
                }
                if initialized.get() {
                    return;
                }

                ensure_epoxy_initialized();

                match Self::init_mpv() {
                    Ok((mpv, render_ctx)) => {
                        let mut state = state.borrow_mut();
                        state.mpv = Some(mpv);
                        state.render_ctx = Some(render_ctx);
                        state.init_failed = false;
                        initialized.set(true);
                        state.apply_flags();

                        if state.source.is_some() {
                            let start_paused = !state.want_play;
                            if let Err(e) = state.load_source(start_paused) {
                                tracing::warn!("queued load failed for {}: {}", id, e);
                            }
                        }
                        state.want_play = false;
                        tracing::debug!("mpv initialized for {}", id);
                    }
                    Err(e) => {
                        state.borrow_mut().init_failed = true;
                        tracing::error!("Failed to initialize mpv for {}: {}", id, e);
                    }
                }
            }
        ));

        self.gl_area.connect_unrealize(clone!(
            #[strong]
            state,
            #[strong]
            initialized,
            move |gl_area| {
                gl_area.make_current();
                let mut state = state.borrow_mut();
                // Render context must go before the mpv handle it borrows.
                state.render_ctx = None;
                state.mpv = None;
                initialized.set(false);
            }
        ));

        self.gl_area.connect_render(clone!(
            #[strong]
            state,
            move |gl_area, _gl_context| {
                let state = state.borrow();
                if let Some(ref render_ctx) = state.render_ctx {
                    let scale = gl_area.scale_factor();
                    let width = gl_area.width() * scale;
                    let height = gl_area.height() * scale;

                    // GTK renders the GLArea into its own framebuffer.
                    let fbo = current_framebuffer();
                    if let Err(e) = render_ctx.render::<GlContext>(fbo, width, height, true) {
                        tracing::error!("mpv render error: {}", e);
                    }
                }
                glib::Propagation::Stop
            }
        ));

        self.gl_area
            .connect_resize(|gl_area, _width, _height| gl_area.queue_render());
    }

    fn init_mpv() -> Result<(Mpv, RenderContext), libmpv2::Error> {
        // GTK may reset the locale after startup; libmpv needs LC_NUMERIC=C.
        let locale_set = unsafe { libc::setlocale(libc::LC_NUMERIC, b"C\0".as_ptr().cast()) };
        if locale_set.is_null() {
            tracing::warn!("Failed to set LC_NUMERIC=C before mpv init");
        }

        let mut mpv = Mpv::with_initializer(|init| {
            init.set_option("hwdec", "auto-safe")?;
            init.set_option("vo", "libmpv")?;
            init.set_option("ao", "pipewire,pulse,alsa")?;
            // Hold the last frame at the end so eof-reached can be observed.
            init.set_option("keep-open", "yes")?;
            init.set_option("pause", "yes")?;
            init.set_option("osd-level", 0i64)?;
            init.set_option("terminal", false)?;
            init.set_option("input-default-bindings", false)?;
            init.set_option("msg-level", "all=warn")?;
            Ok(())
        })?;

        fn get_proc_address(_ctx: &GlContext, name: &str) -> *mut c_void {
            epoxy::get_proc_addr(name) as *mut c_void
        }

        let render_params = vec![
            RenderParam::ApiType(RenderParamApiType::OpenGl),
            RenderParam::InitParams(OpenGLInitParams {
                get_proc_address,
                ctx: GlContext,
            }),
        ];

        // SAFETY: mpv is exclusively owned here and outlives the context,
        // which PlayerState drops first.
        let render_ctx =
            unsafe { RenderContext::new(mpv.ctx.as_mut(), render_params.into_iter())? };

        Ok((mpv, render_ctx))
    }

    /// Poll decoded size and end-of-file, and keep frames flowing.
    fn start_poll_timer(&self) {
        let state = self.state.clone();
        let gl_area = self.gl_area.clone();
        let events = self.events.clone();
        let row = self.row;

        let source_id = glib::timeout_add_local(POLL_INTERVAL, move || {
            let mut state = state.borrow_mut();
            let Some(ref mpv) = state.mpv else {
                return glib::ControlFlow::Continue;
            };

            let width: i64 = mpv.get_property("dwidth").unwrap_or(0);
            let height: i64 = mpv.get_property("dheight").unwrap_or(0);
            let eof: bool = mpv.get_property("eof-reached").unwrap_or(false);

            if width > 0 && height > 0 {
                state.dimensions = (width as u32, height as u32);
                if !state.metadata_reported {
                    state.metadata_reported = true;
                    let _ = events.try_send(SurfaceEvent::new(
                        row,
                        state.cycle,
                        SurfaceEventKind::MetadataReady,
                    ));
                }
            }

            // Edge-triggered: a rewind only re-arms once mpv leaves EOF.
            if eof && !state.eof_reported {
                state.eof_reported = true;
                let _ =
                    events.try_send(SurfaceEvent::new(row, state.cycle, SurfaceEventKind::Ended));
            } else if !eof {
                state.eof_reported = false;
            }

            drop(state);
            if gl_area.is_visible() {
                gl_area.queue_render();
            }
            glib::ControlFlow::Continue
        });

        *self.poll_timer.borrow_mut() = Some(source_id);
    }

    fn stop_poll_timer(&self) {
        if let Some(source_id) = self.poll_timer.borrow_mut().take() {
            source_id.remove();
        }
    }
}

impl VideoSurface for MpvSurface {
    fn id(&self) -> &str {
        &self.id
    }

    fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    fn video_dimensions(&self) -> (u32, u32) {
        self.state.borrow().dimensions
    }

    fn cycle(&self) -> u64 {
        self.state.borrow().cycle
    }

    fn set_muted(&mut self, muted: bool) {
        let mut state = self.state.borrow_mut();
        state.muted = muted;
        state.apply_flags();
    }

    fn set_looping(&mut self, looping: bool) {
        let mut state = self.state.borrow_mut();
        state.looping = looping;
        state.apply_flags();
    }

    fn pause(&mut self) {
        let mut state = self.state.borrow_mut();
        state.want_play = false;
        if let Some(ref mpv) = state.mpv {
            let _ = mpv.set_property("pause", true);
        }
    }

    fn rewind(&mut self) {
        let mut state = self.state.borrow_mut();
        state.cycle += 1;
        if let Some(ref mpv) = state.mpv {
            let _ = mpv.command("seek", &["0", "absolute", "exact"]);
        }
    }

    fn reload(&mut self) -> Result<(), PlaybackError> {
        let mut state = self.state.borrow_mut();
        if state.source.is_none() {
            return Err(PlaybackError::NoSource);
        }
        if !self.initialized.get() {
            // Loaded on realize.
            return if state.init_failed {
                Err(PlaybackError::Unavailable)
            } else {
                Ok(())
            };
        }
        state.load_source(true)
    }

    fn play(&mut self) -> Result<(), PlaybackError> {
        let mut state = self.state.borrow_mut();
        if state.source.is_none() {
            return Err(PlaybackError::NoSource);
        }
        if state.init_failed {
            return Err(PlaybackError::Unavailable);
        }
        if !self.initialized.get() {
            state.want_play = true;
            return Ok(());
        }
        let Some(ref mpv) = state.mpv else {
            return Err(PlaybackError::Unavailable);
        };
        mpv.set_property("pause", false)
            .map_err(|e| PlaybackError::Rejected(e.to_string()))?;
        drop(state);
        self.gl_area.queue_render();
        Ok(())
    }

    fn place(&mut self, placement: &Placement, timing: TransitionTiming) {
        self.animator.place(placement.rect(), timing);
    }

    fn commit_layout(&mut self) {
        self.animator.commit();
    }

    fn hide(&mut self) {
        self.animator.hide();
    }
}

impl Drop for MpvSurface {
    fn drop(&mut self) {
        self.stop_poll_timer();
    }
}

/// Creates row surfaces in the display container.
pub struct MpvSurfaceFactory {
    fixed: Fixed,
    events: Sender<SurfaceEvent>,
}

impl MpvSurfaceFactory {
    pub fn new(fixed: &Fixed, events: Sender<SurfaceEvent>) -> Self {
        Self {
            fixed: fixed.clone(),
            events,
        }
    }

    /// The template surface for row 0.
    pub fn create_template(&self, id: &str, source: Option<PathBuf>) -> MpvSurface {
        MpvSurface::new(&self.fixed, id, 0, source, self.events.clone())
    }
}

impl SurfaceFactory for MpvSurfaceFactory {
    type Surface = MpvSurface;

    fn clone_from_template(
        &self,
        template: &MpvSurface,
        row: usize,
        id: &str,
    ) -> anyhow::Result<MpvSurface> {
        if self.fixed.root().is_none() {
            bail!("display container is not attached to a window");
        }

        let (muted, looping) = {
            let state = template.state.borrow();
            (state.muted, state.looping)
        };
        let mut surface = MpvSurface::new(
            &self.fixed,
            id,
            row,
            template.source.clone(),
            self.events.clone(),
        );
        surface.set_muted(muted);
        surface.set_looping(looping);
        Ok(surface)
    }
}
