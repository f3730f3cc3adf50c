use console_error_panic_hook::set_once;
use futures_util::future::join;
use gloo_net::http::Request;
use std::cell::RefCell;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

use foundation::time::Time;
use formats::{MapConfig, load_regions};
use runtime::TimerToken;
use scene::SelectionEvent;

pub mod camera;
pub mod session;
mod wgpu;

use camera::MapView;
use session::ViewerSession;
use wgpu::{
    FrameUniforms, WgpuContext, init_wgpu_from_canvas_id, render_scene, resize_wgpu,
    surface_size, upload_mesh, upload_wireframe,
};

#[derive(Debug)]
pub struct ViewerState {
    pub config: MapConfig,
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub wgpu: Option<WgpuContext>,
    pub view: MapView,
    pub session: Option<ViewerSession>,
    pub on_selection_change: Option<js_sys::Function>,
    /// `setTimeout` handle of the pending auto-advance callback.
    pub timer_handle: Option<i32>,
}

thread_local! {
    static STATE: RefCell<ViewerState> = RefCell::new(ViewerState {
        config: MapConfig::default(),
        canvas_width: 1280.0,
        canvas_height: 720.0,
        wgpu: None,
        view: MapView::from(MapConfig::default().view),
        session: None,
        on_selection_change: None,
        timer_handle: None,
    });
}

fn console_log(msg: &str) {
    web_sys::console::log_1(&JsValue::from_str(msg));
}

/// Milliseconds on the same clock as `requestAnimationFrame` timestamps.
fn clock_ms() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    set_once();
    Ok(())
}

#[wasm_bindgen]
pub fn init_wgpu(canvas_id: String) {
    spawn_local(async move {
        if let Err(err) = init_wgpu_inner(&canvas_id).await {
            console_log(&format!("wgpu init error: {:?}", err));
        }
    });
}

/// Replaces the map configuration. Takes effect on the next `load_data`;
/// the camera jumps to the configured view straight away.
#[wasm_bindgen]
pub fn set_config_json(json: &str) -> Result<(), JsValue> {
    let config = MapConfig::from_json_str(json).map_err(|e| JsValue::from_str(&e.to_string()))?;
    STATE.with(|state| {
        let mut s = state.borrow_mut();
        s.view = MapView::from(config.view);
        s.config = config;
    });
    render_now();
    Ok(())
}

#[wasm_bindgen]
pub fn get_config_json() -> Result<String, JsValue> {
    STATE.with(|state| state.borrow().config.to_json_string_pretty())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

#[wasm_bindgen]
pub fn set_canvas_sizes(width: f64, height: f64) {
    STATE.with(|state| {
        let mut s = state.borrow_mut();
        s.canvas_width = width;
        s.canvas_height = height;
        if let Some(ctx) = &mut s.wgpu {
            resize_wgpu(ctx, width as u32, height as u32);
        }
    });
}

/// Fetches the boundaries and the demand table concurrently, joins them and
/// starts the scenario cycle.
#[wasm_bindgen]
pub fn load_data() {
    spawn_local(async move {
        if let Err(err) = load_data_inner().await {
            console_log(&format!("Failed to load data: {}", err.as_string().unwrap_or_default()));
        }
    });
}

#[wasm_bindgen]
pub fn is_loaded() -> bool {
    STATE.with(|state| state.borrow().session.is_some())
}

/// Slider marks as JSON: `[{"value": 0, "label": "Core"}, ...]`.
#[wasm_bindgen]
pub fn get_scenario_marks() -> Result<String, JsValue> {
    let marks = STATE.with(|state| {
        state
            .borrow()
            .session
            .as_ref()
            .map(|s| s.scenario_marks())
            .unwrap_or_default()
    });
    serde_json::to_string(&marks).map_err(|e| JsValue::from_str(&e.to_string()))
}

#[wasm_bindgen]
pub fn get_selected_index() -> Option<u32> {
    STATE.with(|state| {
        state
            .borrow()
            .session
            .as_ref()
            .and_then(|s| s.selection().selected_index())
            .map(|i| i as u32)
    })
}

#[wasm_bindgen]
pub fn get_selected_scenario() -> Option<String> {
    STATE.with(|state| {
        state
            .borrow()
            .session
            .as_ref()
            .and_then(|s| s.selection().selected_name().map(str::to_string))
    })
}

/// Manual selection from the slider or dropdown. Turns auto-advance off.
#[wasm_bindgen]
pub fn set_scenario_index(index: u32) -> bool {
    let now = clock_ms();
    let accepted = STATE.with(|state| {
        let mut s = state.borrow_mut();
        let accepted = s
            .session
            .as_mut()
            .is_some_and(|session| session.select_index(Time::from_millis(now), index as usize));
        if accepted {
            cancel_timer(&mut s);
        }
        accepted
    });
    flush_events();
    render_now();
    accepted
}

#[wasm_bindgen]
pub fn get_auto_advance() -> bool {
    STATE.with(|state| {
        let s = state.borrow();
        match &s.session {
            Some(session) => session.selection().auto_advance(),
            None => s.config.playback.auto_advance,
        }
    })
}

#[wasm_bindgen]
pub fn set_auto_advance(enabled: bool) {
    let now = clock_ms();
    STATE.with(|state| {
        let mut s = state.borrow_mut();
        s.config.playback.auto_advance = enabled;
        if let Some(session) = s.session.as_mut() {
            session.set_auto_advance(Time::from_millis(now), enabled);
        }
        if !enabled {
            cancel_timer(&mut s);
        }
    });
    flush_events();
    render_now();
}

/// Registers `callback(index)` to run whenever the selected scenario changes.
#[wasm_bindgen]
pub fn set_on_selection_change(callback: js_sys::Function) {
    STATE.with(|state| state.borrow_mut().on_selection_change = Some(callback));
}

/// Draws one frame. Call from `requestAnimationFrame` with its timestamp.
#[wasm_bindgen]
pub fn render_frame(now_ms: f64) {
    render_at(now_ms);
}

/// Highlights the region under canvas pixel `(x, y)` and returns its
/// tooltip HTML, or `undefined` over empty ground.
#[wasm_bindgen]
pub fn pick_tooltip(x_px: f64, y_px: f64) -> Option<String> {
    let now = Time::from_millis(clock_ms());
    STATE.with(|state| {
        let mut guard = state.borrow_mut();
        let s = &mut *guard;
        let session = s.session.as_mut()?;
        let camera = s
            .view
            .camera(s.canvas_width, s.canvas_height, session.mesh_origin());
        let ray = camera.ray(x_px, y_px, s.canvas_width, s.canvas_height);
        let region = session.pick(now, ray);
        session.set_hovered(region);
        region
            .and_then(|r| session.tooltip(r))
            .map(|t| t.html)
    })
}

#[wasm_bindgen]
pub fn clear_hover() {
    STATE.with(|state| {
        if let Some(session) = state.borrow_mut().session.as_mut() {
            session.set_hovered(None);
        }
    });
}

#[wasm_bindgen]
pub fn camera_reset() -> Result<(), JsValue> {
    STATE.with(|state| {
        let mut s = state.borrow_mut();
        s.view = MapView::from(s.config.view);
    });
    render_now();
    Ok(())
}

/// Rotate and tilt the map.
///
/// Intended usage: call with pointer delta in pixels.
#[wasm_bindgen]
pub fn camera_orbit(delta_x_px: f64, delta_y_px: f64) -> Result<(), JsValue> {
    STATE.with(|state| state.borrow_mut().view.orbit(delta_x_px, delta_y_px));
    render_now();
    Ok(())
}

/// Drag the map.
///
/// Intended usage: call with pointer delta in pixels.
#[wasm_bindgen]
pub fn camera_pan(delta_x_px: f64, delta_y_px: f64) -> Result<(), JsValue> {
    STATE.with(|state| state.borrow_mut().view.pan(delta_x_px, delta_y_px));
    render_now();
    Ok(())
}

/// Zoom in/out, capped at the configured maximum zoom.
///
/// Intended usage: call with wheel deltaY.
#[wasm_bindgen]
pub fn camera_zoom(wheel_delta_y: f64) -> Result<(), JsValue> {
    STATE.with(|state| state.borrow_mut().view.zoom_by(wheel_delta_y));
    render_now();
    Ok(())
}

async fn init_wgpu_inner(canvas_id: &str) -> Result<(), JsValue> {
    let ctx = init_wgpu_from_canvas_id(canvas_id).await?;

    STATE.with(|state| {
        let mut s = state.borrow_mut();
        let (width, height) = surface_size(&ctx);
        s.canvas_width = width as f64;
        s.canvas_height = height as f64;
        s.wgpu = Some(ctx);
    });

    render_now();
    Ok(())
}

async fn load_data_inner() -> Result<(), JsValue> {
    let config = STATE.with(|state| state.borrow().config.clone());
    let (boundaries, table) = join(
        fetch_text(&config.source.boundary_url),
        fetch_text(&config.source.table_url),
    )
    .await;
    let (boundaries, table) = (boundaries?, table?);

    let loaded = load_regions(&boundaries, &table, &config.source)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    let r = &loaded.report;
    console_log(&format!(
        "loaded {} regions, {} scenarios ({} matched, {} without data, {} skipped, {} unused rows, {} bad cells)",
        loaded.regions.len(),
        loaded.regions.scenarios().len(),
        r.matched,
        r.unmatched,
        r.skipped,
        r.unused_rows,
        r.bad_cells,
    ));

    let now = clock_ms();
    STATE.with(|state| {
        let mut s = state.borrow_mut();
        cancel_timer(&mut s);
        s.session = Some(ViewerSession::new(&config, loaded, Time::from_millis(now)));
    });
    flush_events();
    render_now();
    Ok(())
}

async fn fetch_text(url: &str) -> Result<String, JsValue> {
    let resp = Request::get(url)
        .send()
        .await
        .map_err(|e| JsValue::from_str(&format!("{url}: {e}")))?;
    if !resp.ok() {
        return Err(JsValue::from_str(&format!("{url}: HTTP {}", resp.status())));
    }
    resp.text()
        .await
        .map_err(|e| JsValue::from_str(&format!("{url}: {e}")))
}

fn render_now() {
    render_at(clock_ms());
}

/// Draws at `now_ms` then re-arms auto-advance if it is idle.
fn render_at(now_ms: f64) {
    let armed = STATE.with(|state| {
        let mut guard = state.borrow_mut();
        let s = &mut *guard;
        let session = s.session.as_mut()?;
        let now = Time::from_millis(now_ms);

        if let Some(ctx) = s.wgpu.as_mut() {
            if let Some(geometry) = session.take_geometry(now) {
                upload_mesh(ctx, &geometry.mesh);
                upload_wireframe(ctx, geometry.wireframe.as_deref().unwrap_or(&[]));
            }
            let camera = s
                .view
                .camera(s.canvas_width, s.canvas_height, session.mesh_origin());
            let uniforms =
                FrameUniforms::new(camera.view_proj, session.lighting(), session.style().line_color);
            if let Err(err) = render_scene(ctx, &uniforms) {
                console_log(&format!("render error: {:?}", err));
            }
        }

        let token = session.after_render(now)?;
        Some((token, session.selection().interval_s() * 1000.0))
    });

    if let Some((token, delay_ms)) = armed {
        schedule_auto_advance(token, delay_ms);
    }
}

fn schedule_auto_advance(token: TimerToken, delay_ms: f64) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let raw = token.raw();
    let callback = Closure::once_into_js(move || on_auto_advance(raw));
    match window.set_timeout_with_callback_and_timeout_and_arguments_0(
        callback.unchecked_ref(),
        delay_ms.round() as i32,
    ) {
        Ok(handle) => STATE.with(|state| state.borrow_mut().timer_handle = Some(handle)),
        Err(err) => console_log(&format!("setTimeout failed: {:?}", err)),
    }
}

fn cancel_timer(s: &mut ViewerState) {
    let Some(handle) = s.timer_handle.take() else {
        return;
    };
    if let Some(window) = web_sys::window() {
        window.clear_timeout_with_handle(handle);
    }
}

fn on_auto_advance(raw: u64) {
    let now = clock_ms();
    let moved = STATE.with(|state| {
        let mut s = state.borrow_mut();
        s.timer_handle = None;
        s.session
            .as_mut()
            .is_some_and(|session| session.on_timer(Time::from_millis(now), TimerToken::from_raw(raw)))
    });
    if moved {
        flush_events();
        render_at(now);
    }
}

/// Logs selection events and forwards scenario changes to the page.
fn flush_events() {
    let (events, callback) = STATE.with(|state| {
        let mut s = state.borrow_mut();
        let events = s
            .session
            .as_mut()
            .map(|session| session.drain_events())
            .unwrap_or_default();
        (events, s.on_selection_change.clone())
    });

    for stamped in events {
        match stamped.event {
            SelectionEvent::Selected { index, name, cause } => {
                console_log(&format!("scenario {name} ({cause:?})"));
                let Some(cb) = &callback else {
                    continue;
                };
                if let Err(err) = cb.call1(&JsValue::NULL, &JsValue::from(index as u32)) {
                    console_log(&format!("selection callback failed: {:?}", err));
                }
            }
            SelectionEvent::AutoAdvanceChanged(enabled) => {
                console_log(&format!("auto-advance {}", if enabled { "on" } else { "off" }));
            }
        }
    }
}
