use folio_protocol::{CaptureCallback, CaptureError, CaptureRequest, Capturer};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

/// Captures the page through a function supplied by the page script,
/// called as `capture({ width, height, pixelRatio })` and expected to
/// resolve to a data URL (e.g. `html-to-image`'s `toPng` bound to the
/// document element).
pub struct JsCapturer {
    capture: js_sys::Function,
}

impl JsCapturer {
    pub fn new(capture: js_sys::Function) -> Self {
        Self { capture }
    }
}

fn describe(err: &JsValue) -> String {
    err.as_string()
        .or_else(|| err.dyn_ref::<js_sys::Error>().map(|e| String::from(e.message())))
        .unwrap_or_else(|| format!("{err:?}"))
}

/// Resolves on the next animation frame, so style changes made before the
/// capture are painted first.
async fn next_frame() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let mut scheduled = Ok(0);
    let promise = js_sys::Promise::new(&mut |resolve, _reject| {
        scheduled = window.request_animation_frame(&resolve);
    });
    scheduled?;
    JsFuture::from(promise).await?;
    Ok(())
}

async fn run(capture: js_sys::Function, request: CaptureRequest) -> Result<String, CaptureError> {
    let rejected = |err: JsValue| CaptureError::Rejected(describe(&err));
    next_frame().await.map_err(rejected)?;

    let options = serde_json::to_string(&request)
        .map_err(|e| CaptureError::Rejected(e.to_string()))?;
    let options = js_sys::JSON::parse(&options).map_err(rejected)?;
    let result = capture.call1(&JsValue::NULL, &options).map_err(rejected)?;
    let value = JsFuture::from(js_sys::Promise::resolve(&result))
        .await
        .map_err(rejected)?;
    value.as_string().ok_or(CaptureError::Empty)
}

impl Capturer for JsCapturer {
    fn capture(&self, request: CaptureRequest, done: CaptureCallback) {
        let capture = self.capture.clone();
        wasm_bindgen_futures::spawn_local(async move {
            done(run(capture, request).await);
        });
    }
}
