// Re-export all public modules so they can be used from main.rs
pub mod config;
pub mod error;
pub mod logging;

// MVC Architecture
pub mod controller;
pub mod model;
pub mod view;

#[cfg(target_arch = "wasm32")]
use std::cell::RefCell;
#[cfg(target_arch = "wasm32")]
use std::rc::Rc;

#[cfg(target_arch = "wasm32")]
use tracing::{error, info, warn};
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::closure::Closure;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::{prelude::wasm_bindgen, JsCast, JsValue};
#[cfg(target_arch = "wasm32")]
use web_sys::{
    Document, Element, Event, EventTarget, HtmlCanvasElement, KeyboardEvent, MouseEvent, TouchEvent,
    Window,
};

#[cfg(target_arch = "wasm32")]
use config::RoomConfig;
#[cfg(target_arch = "wasm32")]
use controller::{CameraMode, DeviceProfile, FrameLoopContext, InputEvent};
#[cfg(target_arch = "wasm32")]
use error::RoomError;
#[cfg(target_arch = "wasm32")]
use model::asset::FetchLoader;
#[cfg(target_arch = "wasm32")]
use model::RoomLayout;
#[cfg(target_arch = "wasm32")]
use view::FrameSnapshot;

#[cfg(target_arch = "wasm32")]
type SharedContext = Rc<RefCell<FrameLoopContext>>;

#[cfg(target_arch = "wasm32")]
thread_local! {
    static CONTEXT: RefCell<Option<SharedContext>> = const { RefCell::new(None) };
    static RENDER_CALLBACK: RefCell<Option<js_sys::Function>> = const { RefCell::new(None) };
}

/// Register a JS function called once per frame with the frame snapshot.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(js_name = setRenderCallback)]
pub fn set_render_callback(callback: js_sys::Function) {
    RENDER_CALLBACK.with(|cell| *cell.borrow_mut() = Some(callback));
}

/// Touch devices have no pointer lock; the page switches modes explicitly.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(js_name = enterGameMode)]
pub fn enter_game_mode() -> Result<(), JsValue> {
    current_context()?.borrow_mut().enter_game_mode();
    Ok(())
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(js_name = exitGameMode)]
pub fn exit_game_mode() -> Result<(), JsValue> {
    current_context()?.borrow_mut().exit_game_mode();
    Ok(())
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(js_name = togglePower)]
pub fn toggle_power(name: &str) -> Result<bool, JsValue> {
    let powered = current_context()?.borrow_mut().registry.toggle_power(name)?;
    Ok(powered)
}

#[cfg(target_arch = "wasm32")]
fn current_context() -> Result<SharedContext, RoomError> {
    CONTEXT
        .with(|cell| cell.borrow().clone())
        .ok_or_else(|| RoomError::Js("scene not started".into()))
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    logging::init();

    let window = web_sys::window().ok_or_else(|| js_error("no global `window`"))?;
    let document = window.document().ok_or_else(|| js_error("no document on window"))?;
    let (width, height) = viewport_size(&window);
    let canvas = init_canvas(&document, width, height)?;

    let profile = if window.navigator().max_touch_points() > 0 {
        DeviceProfile::Touch
    } else {
        DeviceProfile::Pointer
    };

    let config = RoomConfig::default();
    let layout = RoomLayout::default_room(&config.fixtures);
    let mut loader = FetchLoader::new(window.clone());
    let ctx = FrameLoopContext::from_layout(config, &layout, &mut loader, profile, width, height)?;
    let ctx: SharedContext = Rc::new(RefCell::new(ctx));
    CONTEXT.with(|cell| *cell.borrow_mut() = Some(ctx.clone()));

    setup_input_listeners(&window, &document, &canvas, ctx.clone())?;

    let clock = window.clone();
    AnimationLoop::new(window, move || {
        let now = clock.performance().map(|p| p.now()).unwrap_or(0.0);
        // The context borrow ends before JS sees the snapshot.
        let snapshot = {
            let mut ctx = ctx.borrow_mut();
            ctx.tick(now);
            ctx.snapshot()
        };
        publish(&snapshot);
    })
    .start()?;

    info!(?profile, width, height, "room running");
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn publish(snapshot: &FrameSnapshot) {
    let Some(callback) = RENDER_CALLBACK.with(|cell| cell.borrow().clone()) else {
        return;
    };
    match serde_wasm_bindgen::to_value(snapshot) {
        Ok(value) => {
            if let Err(err) = callback.call1(&JsValue::NULL, &value) {
                warn!(?err, "render callback threw");
            }
        }
        Err(err) => warn!(%err, "snapshot serialization failed"),
    }
}

/// Setup all input event listeners, translated into `InputEvent`s
#[cfg(target_arch = "wasm32")]
fn setup_input_listeners(
    window: &Window,
    document: &Document,
    canvas: &HtmlCanvasElement,
    ctx: SharedContext,
) -> Result<(), JsValue> {
    // Keyboard down
    {
        let ctx = ctx.clone();
        let document_for_exit = document.clone();
        listen(document, "keydown", move |e: KeyboardEvent| {
            let code = e.code();
            let mut ctx = ctx.borrow_mut();
            if ctx.input_processor.is_escape(&code) {
                document_for_exit.exit_pointer_lock();
            }
            // Prevent default for navigation keys
            if ctx.input_processor.is_movement_code(&code) {
                e.prevent_default();
            }
            ctx.handle_event(&InputEvent::KeyDown(code));
        })?;
    }

    // Keyboard up
    {
        let ctx = ctx.clone();
        listen(document, "keyup", move |e: KeyboardEvent| {
            ctx.borrow_mut().handle_event(&InputEvent::KeyUp(e.code()));
        })?;
    }

    // Focus loss - release all keys
    {
        let ctx = ctx.clone();
        listen(window, "blur", move |_: Event| {
            ctx.borrow_mut().handle_event(&InputEvent::FocusLost);
        })?;
    }

    // Visibility change - release all keys
    {
        let ctx = ctx.clone();
        let doc = document.clone();
        listen(document, "visibilitychange", move |_: Event| {
            let visible = !doc.hidden();
            ctx.borrow_mut().handle_event(&InputEvent::VisibilityChanged { visible });
        })?;
    }

    // Pointer lock change
    {
        let ctx = ctx.clone();
        let doc = document.clone();
        let canvas_lock: Element = canvas.clone().into();
        listen(document, "pointerlockchange", move |_: Event| {
            let locked = doc.pointer_lock_element().as_ref() == Some(&canvas_lock);
            let mut ctx = ctx.borrow_mut();
            ctx.handle_event(&InputEvent::PointerLockChanged { locked });
            // Page styling keys off body[data-mode].
            if let Some(body) = doc.body() {
                if let Err(err) = body.dataset().set("mode", ctx.mode().as_str()) {
                    warn!(?err, "failed to publish camera mode on body");
                }
            }
        })?;
    }

    // Mouse move
    {
        let ctx = ctx.clone();
        listen(document, "mousemove", move |e: MouseEvent| {
            let mut ctx = ctx.borrow_mut();
            if ctx.input_state.pointer_locked {
                let dx = e.movement_x() as f32;
                let dy = e.movement_y() as f32;
                ctx.handle_event(&InputEvent::PointerMove { dx, dy });
            }
        })?;
    }

    // Click: capture the pointer in website mode, pick through the crosshair in game mode
    {
        let ctx = ctx.clone();
        let canvas_click = canvas.clone();
        listen(canvas, "click", move |e: MouseEvent| {
            let mut ctx = ctx.borrow_mut();
            if ctx.camera_controller.profile() == DeviceProfile::Touch {
                return;
            }
            if ctx.mode() == CameraMode::Website {
                canvas_click.request_pointer_lock();
                return;
            }
            let click = InputEvent::Click {
                x: e.client_x() as f32,
                y: e.client_y() as f32,
            };
            if let Some(hit) = ctx.handle_event(&click) {
                info!(entity = %hit.name, powered = hit.powered, "clicked");
            }
        })?;
    }

    // Touch: the first finger steers, later ones look around, a short tap picks
    for kind in ["touchstart", "touchmove", "touchend", "touchcancel"] {
        let ctx = ctx.clone();
        listen(canvas, kind, move |e: TouchEvent| {
            e.prevent_default();
            let mut ctx = ctx.borrow_mut();
            if kind == "touchstart" {
                ctx.enter_game_mode();
            }
            let touches = e.changed_touches();
            for i in 0..touches.length() {
                let Some(touch) = touches.get(i) else {
                    continue;
                };
                let (id, x, y) = (touch.identifier(), touch.client_x() as f32, touch.client_y() as f32);
                let event = match kind {
                    "touchstart" => InputEvent::TouchStart { id, x, y },
                    "touchmove" => InputEvent::TouchMove { id, x, y },
                    _ => InputEvent::TouchEnd { id },
                };
                if let Some(hit) = ctx.handle_event(&event) {
                    info!(entity = %hit.name, powered = hit.powered, "tapped");
                }
            }
        })?;
    }

    // Resize
    {
        let ctx = ctx.clone();
        let window_for_size = window.clone();
        let canvas_resize = canvas.clone();
        listen(window, "resize", move |_: Event| {
            let (width, height) = viewport_size(&window_for_size);
            canvas_resize.set_width(width);
            canvas_resize.set_height(height);
            ctx.borrow_mut().handle_event(&InputEvent::Resize { width, height });
        })?;
    }

    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn listen<E>(target: &EventTarget, kind: &str, mut handler: impl FnMut(E) + 'static) -> Result<(), JsValue>
where
    E: JsCast + 'static,
{
    let closure = Closure::wrap(Box::new(move |event: Event| {
        if let Ok(event) = event.dyn_into::<E>() {
            handler(event);
        }
    }) as Box<dyn FnMut(Event)>);
    target.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn viewport_size(window: &Window) -> (u32, u32) {
    let dimension = |value: Result<JsValue, JsValue>, fallback: f64| {
        value.ok().and_then(|v| v.as_f64()).unwrap_or(fallback) as u32
    };
    (
        dimension(window.inner_width(), 800.0),
        dimension(window.inner_height(), 600.0),
    )
}

/// Reuse the page's `#three-canvas` when present, otherwise create one.
#[cfg(target_arch = "wasm32")]
fn init_canvas(document: &Document, width: u32, height: u32) -> Result<HtmlCanvasElement, JsValue> {
    let canvas = match document.query_selector("#three-canvas")? {
        Some(el) => el
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| js_error("#three-canvas is not a canvas"))?,
        None => {
            let body = document.body().ok_or_else(|| js_error("no body on document"))?;
            let canvas = document
                .create_element("canvas")?
                .dyn_into::<HtmlCanvasElement>()
                .map_err(|_| js_error("failed to create canvas"))?;
            body.append_child(&canvas)?;
            canvas
        }
    };
    canvas.set_width(width);
    canvas.set_height(height);
    Ok(canvas)
}

#[cfg(target_arch = "wasm32")]
fn js_error<E: Into<String>>(msg: E) -> JsValue {
    RoomError::Js(msg.into()).into()
}

/// `requestAnimationFrame` loop that reschedules itself after every frame.
#[cfg(target_arch = "wasm32")]
struct AnimationLoop {
    frame: Rc<RefCell<Box<dyn FnMut()>>>,
    window: Window,
}

#[cfg(target_arch = "wasm32")]
impl AnimationLoop {
    fn new(window: Window, f: impl FnMut() + 'static) -> Self {
        Self {
            frame: Rc::new(RefCell::new(Box::new(f))),
            window,
        }
    }

    fn start(self) -> Result<(), JsValue> {
        let frame = self.frame.clone();
        let window = self.window.clone();

        let callback = Rc::new(RefCell::new(None::<Closure<dyn FnMut()>>));
        let callback_clone = callback.clone();

        *callback.borrow_mut() = Some(Closure::wrap(Box::new(move || {
            frame.borrow_mut().as_mut()();

            // Recursively schedule next frame
            if let Some(next) = callback_clone.borrow().as_ref() {
                if let Err(err) = window.request_animation_frame(next.as_ref().unchecked_ref()) {
                    error!(?err, "requestAnimationFrame failed, frame loop stopped");
                }
            }
        }) as Box<dyn FnMut()>));

        if let Some(first) = callback.borrow().as_ref() {
            self.window.request_animation_frame(first.as_ref().unchecked_ref())?;
        }

        // Leak the closure to keep it alive
        std::mem::forget(callback);
        Ok(())
    }
}
