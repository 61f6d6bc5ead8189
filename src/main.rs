//! Music Runner entry point
//!
//! Web: canvas game loop, DOM HUD, Web Audio playback and recording export.
//! Native: a headless autopilot run that writes the session recording to disk.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{
        CanvasRenderingContext2d, HtmlAnchorElement, HtmlCanvasElement, HtmlImageElement,
        KeyboardEvent, PointerEvent,
    };

    use music_runner::Settings;
    use music_runner::assets::{AssetId, AssetRegistry};
    use music_runner::audio::web::{AudioManager, IntervalClock};
    use music_runner::consts::*;
    use music_runner::platform::{InputEvent, StartButton, map_key, map_pointer, prevents_default};
    use music_runner::recording::AudioArtifact;
    use music_runner::sequencer::Lane;
    use music_runner::session::{HudSnapshot, Session};
    use music_runner::sim::{GameEvent, GamePhase, Viewport};
    use music_runner::tuning::Tuning;

    const FONT: &str = "'Press Start 2P', monospace";

    /// Game instance holding all state
    struct Game {
        session: Session,
        settings: Settings,
        audio: Option<AudioManager>,
        canvas: HtmlCanvasElement,
        ctx: CanvasRenderingContext2d,
        assets: Rc<RefCell<AssetRegistry>>,
        images: HashMap<AssetId, HtmlImageElement>,
        last_time: f64,
        hidden: bool,
        assets_reported: bool,
    }

    impl Game {
        fn new(seed: u64, canvas: HtmlCanvasElement, ctx: CanvasRenderingContext2d) -> Self {
            let settings = Settings::load();
            let mut session = Session::new(
                seed,
                Tuning::default(),
                Viewport::default(),
                Box::new(IntervalClock::new()),
            );
            session.set_autopilot(settings.autopilot);
            Self {
                session,
                settings,
                audio: None,
                canvas,
                ctx,
                assets: Rc::new(RefCell::new(AssetRegistry::new())),
                images: HashMap::new(),
                last_time: 0.0,
                hidden: false,
                assets_reported: false,
            }
        }

        /// Audio needs a user gesture; created on the start press
        fn ensure_audio(&mut self) {
            if self.audio.is_none() {
                match AudioManager::new(self.settings.effective_volume()) {
                    Ok(audio) => self.audio = Some(audio),
                    Err(e) => log::warn!("Audio unavailable, playing silent: {}", e),
                }
            }
            if let Some(audio) = &self.audio {
                audio.resume();
            }
        }

        fn apply_volume(&mut self) {
            let volume = if self.hidden {
                self.settings.volume_when_hidden()
            } else {
                self.settings.effective_volume()
            };
            if let Some(audio) = &mut self.audio {
                audio.set_volume(volume);
            }
        }

        fn handle_input(&mut self, event: InputEvent) {
            match event {
                InputEvent::Start => {
                    self.ensure_audio();
                    self.session.press(event);
                }
                InputEvent::Jump => self.session.press(event),
                InputEvent::Export => self.export(),
                InputEvent::ToggleFullscreen => toggle_fullscreen(&self.canvas),
                InputEvent::ToggleMute => {
                    self.settings.toggle_mute();
                    self.settings.save();
                    self.apply_volume();
                }
            }
        }

        fn export(&self) {
            match self.session.export() {
                Some(artifact) => {
                    if let Err(e) = download(artifact) {
                        log::warn!("Export failed: {:?}", e);
                    }
                }
                None => log::info!("Export ignored: {}", self.session.recording_status().prompt()),
            }
        }

        /// Match the canvas to its element and the viewport to its aspect
        fn resize(&mut self) {
            let Some(window) = web_sys::window() else { return };
            let client_w = self.canvas.client_width().max(1);
            let client_h = self.canvas.client_height().max(1);
            let dpr = window.device_pixel_ratio();
            self.canvas.set_width((client_w as f64 * dpr) as u32);
            self.canvas.set_height((client_h as f64 * dpr) as u32);
            self.session.resize(client_w as f32 / client_h as f32);
        }

        /// Log once every image has loaded or fallen back
        fn report_assets(&mut self) {
            if self.assets_reported {
                return;
            }
            let registry = self.assets.borrow();
            if registry.all_settled() {
                log::info!("Assets settled, {} drawn as placeholders", registry.failed_count());
                drop(registry);
                self.assets_reported = true;
            }
        }

        /// Canvas-pixel position to logical units
        fn to_logical(&self, x: f64, y: f64) -> (f32, f32) {
            let scale = self.canvas.client_height().max(1) as f64 / BASE_H as f64;
            ((x / scale) as f32, (y / scale) as f32)
        }

        fn update(&mut self, dt: f32) {
            let audio_now = self.audio.as_ref().map(AudioManager::now);
            let out = self.session.frame(dt, audio_now);

            if let Some(audio) = &self.audio {
                for trigger in &out.triggers {
                    audio.play(trigger);
                }
            }
            for event in &out.events {
                match event {
                    GameEvent::ZoneEntered { zone } => log::debug!("Zone {}", zone + 1),
                    GameEvent::Ended { reason } => log::info!("Game over: {}", reason.title()),
                    _ => {}
                }
            }
        }

        fn draw_image_or(&self, id: AssetId, x: f64, y: f64, w: f64, h: f64) {
            let ready = self.assets.borrow().is_ready(id);
            match self.images.get(&id) {
                Some(img) if ready => {
                    let _ = self.ctx.draw_image_with_html_image_element_and_dw_and_dh(img, x, y, w, h);
                }
                _ => {
                    self.ctx.set_fill_style_str(id.placeholder_color());
                    self.ctx.fill_rect(x, y, w, h);
                }
            }
        }

        /// Horizontally tiled layer scrolled at `parallax` of the camera
        fn draw_parallax(&self, id: AssetId, y: f64, h: f64, parallax: f64, width: f64) {
            let dims = self.assets.borrow().slot(id).and_then(|s| s.dimensions());
            let tile_w = match dims {
                Some((w, ih)) => (w as f64 * h / ih as f64).max(1.0),
                None => width,
            };
            let camera = self.session.state.camera_x as f64;
            let scroll = (camera * parallax).rem_euclid(tile_w);
            let mut x = -scroll;
            while x < width {
                self.draw_image_or(id, x, y, tile_w + 1.0, h);
                x += tile_w;
            }
        }

        fn render(&self) {
            let ctx = &self.ctx;
            let state = &self.session.state;
            let width = state.viewport.width as f64;
            let height = BASE_H as f64;
            let scale = self.canvas.height() as f64 / height;
            let camera = state.camera_x as f64;

            let _ = ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
            ctx.clear_rect(0.0, 0.0, self.canvas.width() as f64, self.canvas.height() as f64);
            let _ = ctx.set_transform(scale, 0.0, 0.0, scale, 0.0, 0.0);
            ctx.set_image_smoothing_enabled(false);

            self.draw_parallax(AssetId::Layer1, 0.0, height, 0.03, width);
            self.draw_parallax(AssetId::Layer23, 40.0, 110.0, 0.08, width);
            self.draw_parallax(AssetId::Mountains, 70.0, 90.0, 0.2, width);
            self.draw_parallax(AssetId::Layer5, 110.0, 60.0, 0.45, width);
            self.draw_parallax(AssetId::Ground, GROUND_Y as f64 - 40.0, GROUND_HEIGHT as f64 + 50.0, 1.0, width);

            // Dashes and note bursts
            for dash in &state.dashes {
                ctx.set_global_alpha((dash.life / DASH_LIFE).clamp(0.0, 1.0) as f64);
                ctx.set_fill_style_str("#ffffff");
                ctx.fill_rect(dash.pos.x as f64 - camera, dash.pos.y as f64, dash.size.x as f64, dash.size.y as f64);
            }
            for burst in &state.note_bursts {
                let a = (burst.life / NOTE_LIFE).clamp(0.0, 1.0);
                ctx.set_global_alpha((a * a) as f64);
                ctx.save();
                let _ = ctx.translate(burst.pos.x as f64 - camera, burst.pos.y as f64);
                let _ = ctx.rotate(burst.tilt as f64);
                ctx.set_fill_style_str("#ffd54a");
                ctx.set_font(&format!("12px {FONT}"));
                let _ = ctx.fill_text("\u{266A}", 0.0, 0.0);
                ctx.restore();
            }
            ctx.set_global_alpha(1.0);

            for obstacle in &state.obstacles {
                let x = obstacle.x as f64 - camera;
                if x + (obstacle.width as f64) * 2.0 < 0.0 || x > width {
                    continue;
                }
                let (w, h) = (obstacle.width as f64 * 2.0, obstacle.height as f64 * 2.0);
                self.draw_image_or(
                    AssetId::Enemy(obstacle.variant),
                    x,
                    obstacle.y as f64 - (h - obstacle.height as f64),
                    w,
                    h,
                );
            }

            let player = &state.player;
            let sprite = if player.on_ground {
                AssetId::Run(((state.elapsed * 10.0) as usize % 3) as u8)
            } else {
                AssetId::Jump
            };
            let (dw, dh) = (player.width as f64 * 2.0, player.height as f64 * 2.0);
            self.draw_image_or(
                sprite,
                player.screen_x as f64 - (dw - player.width as f64) / 2.0,
                player.y as f64 - (dh - player.height as f64),
                dw,
                dh,
            );

            match state.phase {
                GamePhase::Idle => self.render_start_screen(width, height),
                GamePhase::Ended => self.render_end_screen(width, height),
                GamePhase::Playing => {}
            }
        }

        fn render_start_screen(&self, width: f64, height: f64) {
            let ctx = &self.ctx;
            ctx.set_fill_style_str("rgba(0,0,0,0.35)");
            ctx.fill_rect(0.0, 0.0, width, height);

            let logo_ready = self.assets.borrow().is_ready(AssetId::Logo);
            ctx.set_text_align("center");
            if logo_ready {
                self.draw_image_or(AssetId::Logo, width / 2.0 - 90.0, 20.0, 180.0, 70.0);
            } else {
                ctx.set_fill_style_str("#ffffff");
                ctx.set_font(&format!("14px {FONT}"));
                let _ = ctx.fill_text("MUSIC RUNNER", width / 2.0, 60.0);
            }

            let button = StartButton::centered(width as f32, height as f32);
            self.draw_image_or(
                AssetId::Scroll,
                button.x as f64,
                button.y as f64,
                button.width as f64,
                button.height as f64,
            );
            ctx.set_fill_style_str("#6b4a2b");
            ctx.set_font(&format!("10px {FONT}"));
            let _ = ctx.fill_text(
                "START",
                (button.x + button.width / 2.0) as f64,
                (button.y + button.height / 2.0 + 4.0) as f64,
            );
            ctx.set_fill_style_str("#ffffff");
            ctx.set_font(&format!("6px {FONT}"));
            let hint_y = (button.y + button.height) as f64 + 10.0;
            let _ = ctx.fill_text("PRESS ENTER / SPACE", width / 2.0, hint_y);
            if self.settings.show_fullscreen_hint {
                let _ = ctx.fill_text("F FOR FULLSCREEN", width / 2.0, hint_y + 10.0);
            }
        }

        fn render_end_screen(&self, width: f64, height: f64) {
            let ctx = &self.ctx;
            let Some(end) = self.session.hud().end else { return };
            ctx.set_fill_style_str(&format!("rgba(0,0,0,{:.3})", 0.7 * end.fade));
            ctx.fill_rect(0.0, 0.0, width, height);

            ctx.set_global_alpha(end.fade as f64);
            ctx.set_text_align("center");
            ctx.set_fill_style_str("#ffffff");
            ctx.set_font(&format!("12px {FONT}"));
            let _ = ctx.fill_text(end.title, width / 2.0, height / 2.0 - 6.0);
            ctx.set_font(&format!("8px {FONT}"));
            let _ = ctx.fill_text(end.prompt, width / 2.0, height / 2.0 + 14.0);
            ctx.set_global_alpha(1.0);
        }

        /// Update HUD elements in DOM
        fn update_hud(&self) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };
            let hud = self.session.hud();

            let set = |selector: &str, text: &str| {
                if let Some(el) = document.query_selector(selector).ok().flatten() {
                    el.set_text_content(Some(text));
                }
            };
            set("#hud-time .hud-value", &format!("{:02}", hud.time_left));
            set("#hud-zone .hud-value", &format!("{}/{}", hud.zone, hud.zone_count));
            set("#hud-step .hud-value", &format!("{}/{}", hud.step, hud.steps));

            if let Some(el) = document.get_element_by_id("hud-strip") {
                if self.settings.show_step_strip {
                    let _ = el.set_attribute("class", "");
                    el.set_text_content(Some(&strip_text(&hud)));
                } else {
                    let _ = el.set_attribute("class", "hidden");
                }
            }

            if let Some(el) = document.get_element_by_id("hud") {
                let class = if self.session.state.phase == GamePhase::Playing {
                    ""
                } else {
                    "hidden"
                };
                let _ = el.set_attribute("class", class);
            }
        }
    }

    /// One text row per lane, high lane first; the playhead column is bracketed
    fn strip_text(hud: &HudSnapshot) -> String {
        let mut rows = Vec::with_capacity(Lane::ALL.len());
        for lane in Lane::ALL.iter().rev() {
            let row: String = (0..hud.steps)
                .map(|step| {
                    let filled = hud.pattern[step][lane.index()].is_some();
                    match (step + 1 == hud.step, filled) {
                        (true, true) => "[#]",
                        (true, false) => "[.]",
                        (false, true) => " # ",
                        (false, false) => " . ",
                    }
                })
                .collect();
            rows.push(row);
        }
        rows.join("\n")
    }

    fn toggle_fullscreen(canvas: &HtmlCanvasElement) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        if document.fullscreen_element().is_some() {
            document.exit_fullscreen();
        } else if let Err(e) = canvas.request_fullscreen() {
            log::warn!("Fullscreen request failed: {:?}", e);
        }
    }

    /// Offer the artifact as a file download
    fn download(artifact: &AudioArtifact) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;

        let parts = js_sys::Array::new();
        parts.push(&js_sys::Uint8Array::from(artifact.bytes()));
        let options = web_sys::BlobPropertyBag::new();
        options.set_type(artifact.mime());
        let blob = web_sys::Blob::new_with_u8_array_sequence_and_options(&parts, &options)?;
        let url = web_sys::Url::create_object_url_with_blob(&blob)?;

        let anchor: HtmlAnchorElement = document.create_element("a")?.dyn_into()?;
        anchor.set_href(&url);
        anchor.set_download(artifact.file_name());
        anchor.click();
        web_sys::Url::revoke_object_url(&url)?;

        log::info!("Exported {} ({} bytes)", artifact.file_name(), artifact.bytes().len());
        Ok(())
    }

    /// Request every pending image; failures retry with the next candidate
    fn load_assets(game: &Rc<RefCell<Game>>) {
        let pending: Vec<(AssetId, &'static str)> = game.borrow().assets.borrow().pending().collect();
        for (id, source) in pending {
            let img = match HtmlImageElement::new() {
                Ok(img) => img,
                Err(e) => {
                    log::warn!("Could not create image for {:?}: {:?}", id, e);
                    if let Some(slot) = game.borrow().assets.borrow_mut().slot_mut(id) {
                        while slot.failed().is_some() {}
                    }
                    continue;
                }
            };

            let registry = game.borrow().assets.clone();
            {
                let registry = registry.clone();
                let img_clone = img.clone();
                let onload = Closure::<dyn FnMut()>::new(move || {
                    let mut registry = registry.borrow_mut();
                    if let Some(slot) = registry.slot_mut(id) {
                        if let Some(next) = slot.loaded(img_clone.natural_width(), img_clone.natural_height()) {
                            img_clone.set_src(next);
                        }
                    }
                });
                img.set_onload(Some(onload.as_ref().unchecked_ref()));
                onload.forget();
            }
            {
                let img_clone = img.clone();
                let onerror = Closure::<dyn FnMut()>::new(move || {
                    let mut registry = registry.borrow_mut();
                    if let Some(next) = registry.slot_mut(id).and_then(|slot| slot.failed()) {
                        img_clone.set_src(next);
                    }
                });
                img.set_onerror(Some(onerror.as_ref().unchecked_ref()));
                onerror.forget();
            }

            img.set_src(source);
            game.borrow_mut().images.insert(id, img);
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Music Runner starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")
            .ok()
            .flatten()
            .expect("no 2d context")
            .dyn_into()
            .expect("not a 2d context");

        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(Game::new(seed, canvas.clone(), ctx)));
        game.borrow_mut().resize();
        log::info!("Game initialized with seed: {}", seed);

        load_assets(&game);
        setup_input_handlers(&canvas, game.clone());
        setup_visibility(game.clone());

        request_animation_frame(game);
        log::info!("Music Runner running!");
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let window = web_sys::window().expect("no window");

        // Keyboard
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let code = event.code();
                if prevents_default(&code) {
                    event.prevent_default();
                }
                let mut g = game.borrow_mut();
                if let Some(input) = map_key(&code, event.repeat(), g.session.state.phase) {
                    g.handle_input(input);
                }
            });
            let _ = window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Pointer: start button on the start screen, jump while playing
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                let mut g = game.borrow_mut();
                let (x, y) = g.to_logical(event.offset_x() as f64, event.offset_y() as f64);
                let button = StartButton::centered(g.session.state.viewport.width, BASE_H);
                if let Some(input) = map_pointer(x, y, &button, g.session.state.phase) {
                    event.prevent_default();
                    g.handle_input(input);
                }
            });
            let _ = canvas.add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Resize
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                game.borrow_mut().resize();
            });
            let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_visibility(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else { return };
        let Some(document) = window.document() else { return };

        let document_clone = document.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let mut g = game.borrow_mut();
            g.hidden = document_clone.visibility_state() == web_sys::VisibilityState::Hidden;
            g.apply_volume();
        });
        let _ = document.add_event_listener_with_callback("visibilitychange", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else { return };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        let pending = {
            let mut g = game.borrow_mut();
            let dt = if g.last_time > 0.0 {
                ((time - g.last_time) / 1000.0) as f32
            } else {
                0.0
            };
            g.last_time = time;

            g.update(dt);
            g.render();
            g.update_hud();
            g.report_assets();
            g.session.take_pending_capture()
        };

        // Deferred until this frame returns; the offline render itself runs
        // to completion on the main thread
        if let Some(capture) = pending {
            let game = game.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let result = capture.finalize();
                game.borrow_mut().session.complete_finalization(result);
            });
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = headless::run(std::env::args().skip(1)) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// One autopilot session at 60 fps with a fixed-step clock
#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::error::Error;
    use std::path::PathBuf;

    use music_runner::Tuning;
    use music_runner::platform::InputEvent;
    use music_runner::recording::EXPORT_FILE_NAME;
    use music_runner::sequencer::FixedStepClock;
    use music_runner::session::Session;
    use music_runner::sim::{GameEvent, Viewport};

    const FRAME_DT: f32 = 1.0 / 60.0;

    /// Arguments: `[seed] [output.wav] [tuning.json]`
    pub fn run(mut args: impl Iterator<Item = String>) -> Result<(), Box<dyn Error>> {
        let seed: u64 = match args.next() {
            Some(s) => s.parse()?,
            None => 1,
        };
        let output = PathBuf::from(args.next().unwrap_or_else(|| EXPORT_FILE_NAME.to_string()));
        let tuning = match args.next() {
            Some(path) => Tuning::from_json(&std::fs::read_to_string(path)?)?,
            None => Tuning::default(),
        };

        log::info!("Music Runner (headless) seed {}", seed);
        let mut session = Session::new(seed, tuning, Viewport::default(), Box::new(FixedStepClock::new()));
        session.set_autopilot(true);
        session.press(InputEvent::Start);

        let mut clock = 0.0f64;
        let mut notes = 0usize;
        while !session.state.is_over() {
            clock += FRAME_DT as f64;
            let out = session.frame(FRAME_DT, Some(clock));
            notes += out
                .events
                .iter()
                .filter(|e| matches!(e, GameEvent::NoteWritten { .. }))
                .count();
        }
        log::info!(
            "Run ended after {:.1}s: {} notes written, {} cells filled",
            session.state.elapsed,
            notes,
            session.state.grid.filled_cells()
        );

        session.finalize_now()?;
        match session.export() {
            Some(artifact) => {
                std::fs::write(&output, artifact.bytes())?;
                log::info!(
                    "Wrote {} ({:.1}s, {} notes played)",
                    output.display(),
                    artifact.duration(),
                    artifact.note_count()
                );
            }
            None => log::warn!("{}", session.recording_status().prompt()),
        }
        Ok(())
    }
}
