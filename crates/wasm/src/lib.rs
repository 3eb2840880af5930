//! `wasm-bindgen` bridge: mounts the engine on a `<canvas>` laid over a
//! video, drives it from `requestAnimationFrame` and forwards pointer events.

mod canvas;
mod host;

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use danmaku_core::{Engine, EngineConfig, Host, OverlayId, OverlaySpec};
use serde::Serialize;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent};

use crate::canvas::{CanvasMeasure, CanvasRenderer};
use crate::host::{DateClock, HtmlAudio, NavigatorClipboard};

/// Panel actions raised during a click, delivered to JS once the engine
/// borrow is released so handlers may call back into the engine.
enum Pending {
    Like(OverlayId),
    Report(OverlayId),
}

struct Handlers<F = js_sys::Function> {
    on_like: Option<F>,
    on_report: Option<F>,
}

impl<F> Default for Handlers<F> {
    fn default() -> Self {
        Self {
            on_like: None,
            on_report: None,
        }
    }
}

/// Call the handler registered for each action. The handler is cloned out
/// first so it may replace the handlers while it runs.
fn deliver<F: Clone>(
    handlers: &RefCell<Handlers<F>>,
    pending: Vec<Pending>,
    mut call: impl FnMut(&F, &OverlayId),
) {
    for action in pending {
        let (handler, id) = {
            let handlers = handlers.borrow();
            match action {
                Pending::Like(id) => (handlers.on_like.clone(), id),
                Pending::Report(id) => (handlers.on_report.clone(), id),
            }
        };
        if let Some(handler) = handler {
            call(&handler, &id);
        }
    }
}

struct Shared {
    engine: RefCell<Engine>,
    canvas: HtmlCanvasElement,
    renderer: CanvasRenderer,
    pending: Rc<RefCell<Vec<Pending>>>,
    handlers: RefCell<Handlers>,
    tick: RefCell<Option<Closure<dyn FnMut()>>>,
    request_id: Cell<Option<i32>>,
}

impl Shared {
    fn schedule(&self) {
        if self.request_id.get().is_some() {
            return;
        }
        let Some(window) = web_sys::window() else {
            return;
        };
        let tick = self.tick.borrow();
        let Some(callback) = tick.as_ref() else {
            return;
        };
        match window.request_animation_frame(callback.as_ref().unchecked_ref()) {
            Ok(id) => self.request_id.set(Some(id)),
            Err(err) => {
                web_sys::console::error_2(&"danmaku: requestAnimationFrame failed".into(), &err);
            }
        }
    }

    fn cancel(&self) {
        if let (Some(id), Some(window)) = (self.request_id.take(), web_sys::window())
            && let Err(err) = window.cancel_animation_frame(id)
        {
            web_sys::console::warn_2(&"danmaku: cancelAnimationFrame failed".into(), &err);
        }
    }

    fn on_frame(&self) {
        self.request_id.set(None);
        let out = self.engine.borrow_mut().frame();
        self.renderer.draw(&out.commands);
        self.set_cursor(out.cursor.as_css());
        if out.reschedule {
            self.schedule();
        }
    }

    fn set_cursor(&self, css: &str) {
        if let Err(err) = self.canvas.style().set_property("cursor", css) {
            web_sys::console::warn_2(&"danmaku: cursor update failed".into(), &err);
        }
    }

    fn deliver_pending(&self) {
        let pending: Vec<Pending> = self.pending.borrow_mut().drain(..).collect();
        deliver(&self.handlers, pending, |handler, id| {
            if let Err(err) = handler.call1(&JsValue::NULL, &JsValue::from_str(&id.0)) {
                web_sys::console::error_2(&"danmaku: action handler threw".into(), &err);
            }
        });
    }
}

type Listener = (&'static str, Closure<dyn FnMut(MouseEvent)>);

/// The engine bound to one canvas.
#[wasm_bindgen]
pub struct DanmakuEngine {
    shared: Rc<Shared>,
    listeners: Vec<Listener>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OverlaySnapshot<'a> {
    key: u64,
    text: &'a str,
    lane: usize,
    x: f64,
    width: f64,
    like_count: u32,
    frozen: bool,
}

#[wasm_bindgen]
impl DanmakuEngine {
    /// Mount on `canvas`. `config_json` overrides any [`EngineConfig`] fields.
    #[wasm_bindgen(constructor)]
    pub fn new(
        canvas: HtmlCanvasElement,
        config_json: Option<String>,
    ) -> Result<DanmakuEngine, JsError> {
        console_error_panic_hook::set_once();

        let config = match config_json {
            Some(json) => EngineConfig::from_json(json.as_bytes())
                .map_err(|e| JsError::new(&e.to_string()))?,
            None => EngineConfig::default(),
        };
        let ctx = canvas
            .get_context("2d")
            .map_err(|_| JsError::new("failed to get a 2d context"))?
            .ok_or_else(|| JsError::new("canvas has no 2d context"))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| JsError::new("2d context has an unexpected type"))?;

        let pending = Rc::new(RefCell::new(Vec::new()));
        let host = Host::new(DateClock)
            .with_measure(CanvasMeasure::new(ctx.clone(), &config.font_family, config.bold))
            .with_audio(HtmlAudio)
            .with_clipboard(NavigatorClipboard);
        let renderer = CanvasRenderer::new(ctx, &config.font_family);

        let mut engine = Engine::new(config, host);
        let likes = Rc::clone(&pending);
        let reports = Rc::clone(&pending);
        engine.set_callbacks(
            Box::new(move |id: &OverlayId| likes.borrow_mut().push(Pending::Like(id.clone()))),
            Box::new(move |id: &OverlayId| reports.borrow_mut().push(Pending::Report(id.clone()))),
        );

        let shared = Rc::new(Shared {
            engine: RefCell::new(engine),
            canvas,
            renderer,
            pending,
            handlers: RefCell::new(Handlers::default()),
            tick: RefCell::new(None),
            request_id: Cell::new(None),
        });

        let weak = Rc::downgrade(&shared);
        *shared.tick.borrow_mut() = Some(Closure::new(move || {
            if let Some(shared) = weak.upgrade() {
                shared.on_frame();
            }
        }));

        let listeners = attach_listeners(&shared)?;
        Ok(DanmakuEngine { shared, listeners })
    }

    /// Size the canvas backing store and rebuild lanes for `width` x `height`
    /// CSS pixels.
    pub fn init(&self, width: f64, height: f64) {
        let dpr = web_sys::window().map_or(1.0, |w| w.device_pixel_ratio());
        let canvas = &self.shared.canvas;
        canvas.set_width((width * dpr).round() as u32);
        canvas.set_height((height * dpr).round() as u32);
        self.shared.renderer.set_scale(dpr);

        let mut engine = self.shared.engine.borrow_mut();
        engine.set_dpr(dpr);
        engine.init(width, height);
    }

    pub fn start(&self) {
        self.shared.engine.borrow_mut().start();
        self.shared.schedule();
    }

    pub fn stop(&self) {
        self.shared.engine.borrow_mut().stop();
        self.shared.cancel();
    }

    pub fn pause(&self) {
        self.shared.engine.borrow_mut().pause();
    }

    pub fn resume(&self) {
        self.shared.engine.borrow_mut().resume();
    }

    pub fn clear(&self) {
        let mut engine = self.shared.engine.borrow_mut();
        engine.clear();
        self.shared.renderer.draw(&engine.render());
    }

    /// Emit a plain text overlay, as the send box does.
    pub fn add(&self, text: String, color: Option<String>) -> f64 {
        let mut spec = OverlaySpec::new(text);
        if let Some(color) = color {
            spec = spec.color(color);
        }
        self.shared.engine.borrow_mut().add(spec).0 as f64
    }

    /// Emit an overlay from a stored record (`{text, color, type, likes,
    /// isVoice, audioUrl, _id}`) serialized as JSON.
    #[wasm_bindgen(js_name = addRecord)]
    pub fn add_record(&self, json: &str) -> Result<f64, JsError> {
        let spec: OverlaySpec =
            serde_json::from_str(json).map_err(|e| JsError::new(&e.to_string()))?;
        Ok(self.shared.engine.borrow_mut().add(spec).0 as f64)
    }

    #[wasm_bindgen(js_name = updateLikes)]
    pub fn update_likes(&self, id: &str, like_count: u32) -> usize {
        self.shared
            .engine
            .borrow_mut()
            .update_likes(&OverlayId::from(id), like_count)
    }

    /// Handlers receive the record id of the overlay whose panel was used.
    #[wasm_bindgen(js_name = setCallbacks)]
    pub fn set_callbacks(&self, on_like: js_sys::Function, on_report: js_sys::Function) {
        *self.shared.handlers.borrow_mut() = Handlers {
            on_like: Some(on_like),
            on_report: Some(on_report),
        };
    }

    /// Live overlays as JSON, for devtools and tests.
    pub fn snapshot(&self) -> Result<String, JsError> {
        let engine = self.shared.engine.borrow();
        let overlays: Vec<OverlaySnapshot<'_>> = engine
            .overlays()
            .iter()
            .map(|o| OverlaySnapshot {
                key: o.key.0,
                text: &o.text,
                lane: o.lane,
                x: o.x,
                width: o.width,
                like_count: o.like_count,
                frozen: o.frozen,
            })
            .collect();
        serde_json::to_string(&overlays).map_err(|e| JsError::new(&e.to_string()))
    }
}

impl Drop for DanmakuEngine {
    fn drop(&mut self) {
        self.shared.engine.borrow_mut().stop();
        self.shared.cancel();
        for (event, listener) in &self.listeners {
            if let Err(err) = self
                .shared
                .canvas
                .remove_event_listener_with_callback(event, listener.as_ref().unchecked_ref())
            {
                web_sys::console::warn_2(&"danmaku: failed to detach listener".into(), &err);
            }
        }
    }
}

fn attach_listeners(shared: &Rc<Shared>) -> Result<Vec<Listener>, JsError> {
    let handlers: [(&'static str, fn(&Shared, &MouseEvent)); 3] = [
        ("mousemove", |shared, event| {
            let cursor = {
                let mut engine = shared.engine.borrow_mut();
                engine.pointer_move(f64::from(event.offset_x()), f64::from(event.offset_y()));
                engine.cursor()
            };
            shared.set_cursor(cursor.as_css());
        }),
        ("mouseleave", |shared, _| {
            shared.engine.borrow_mut().pointer_leave();
            shared.set_cursor("default");
        }),
        ("click", |shared, event| {
            shared
                .engine
                .borrow_mut()
                .click(f64::from(event.offset_x()), f64::from(event.offset_y()));
            shared.deliver_pending();
        }),
    ];

    let mut listeners = Vec::with_capacity(handlers.len());
    for (event, handler) in handlers {
        let weak: Weak<Shared> = Rc::downgrade(shared);
        let closure = Closure::<dyn FnMut(MouseEvent)>::new(move |e: MouseEvent| {
            if let Some(shared) = weak.upgrade() {
                handler(&shared, &e);
            }
        });
        shared
            .canvas
            .add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
            .map_err(|_| JsError::new(&format!("failed to listen for {event}")))?;
        listeners.push((event, closure));
    }
    Ok(listeners)
}
