#![forbid(unsafe_code)]

use std::fmt::Display;
use std::rc::Rc;

use espejo_core::generators::SymbolRng;
use espejo_runtime::app::EspejoApp;
use espejo_runtime::persistence::ProgressStore;
use espejo_web::console_layer::{ConsoleLayer, LogSink};
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;
use wasm_bindgen::prelude::*;
use web_sys::console;

use crate::config::FrontendConfig;
use crate::shell::{SharedShell, Shell, load_assets};
use crate::storage::LocalStorageBackend;
use crate::sun::RendererError;
use crate::sun_stage::{self, MountError};

/// Diario Espejo page controller.
///
/// ```js
/// const app = new DiarioEspejoWeb();
/// await app.init(JSON.stringify({ log_level: "debug" }));
/// // ...
/// app.destroy();
/// ```
#[wasm_bindgen]
pub struct DiarioEspejoWeb {
    shell: Option<SharedShell>,
}

#[wasm_bindgen]
impl DiarioEspejoWeb {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self { shell: None }
    }

    /// Bind to the current document and start the app.
    ///
    /// `options` is an optional JSON object string (see `FrontendConfig`).
    /// Rejects on invalid options or a second call. A browser without
    /// WebGPU still gets a working app with an empty landing scene.
    pub async fn init(&mut self, options: Option<String>) -> Result<(), JsValue> {
        if self.shell.is_some() {
            return Err(js_error("already initialized"));
        }
        let config = FrontendConfig::from_json(options.as_deref()).map_err(js_error)?;
        install_logging(config.env_filter().map_err(js_error)?);

        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| js_error("no document"))?;
        let seed = config.symbol_seed.unwrap_or_else(clock_seed);
        let app = EspejoApp::new(
            ProgressStore::new(LocalStorageBackend::new()),
            SymbolRng::new(seed),
        );

        let shell = Shell::new(app, document.clone());
        Shell::start(&shell).map_err(js_error)?;
        load_assets(&shell, &config);
        self.shell = Some(Rc::clone(&shell));

        match sun_stage::mount(&document).await {
            Ok(sun) => shell.borrow_mut().set_sun(sun),
            Err(MountError::Gpu(RendererError::NoAdapter)) => {
                tracing::warn!("no WebGPU adapter, landing scene left blank");
            }
            Err(err) => tracing::warn!(error = %err, "landing scene unavailable"),
        }
        Ok(())
    }

    /// Explicit teardown for JS callers: detaches listeners, stops both
    /// redraw loops and releases the camera.
    pub fn destroy(&mut self) {
        if let Some(shell) = self.shell.take() {
            shell.borrow_mut().teardown();
        }
    }
}

fn js_error(err: impl Display) -> JsValue {
    js_sys::Error::new(&err.to_string()).into()
}

fn clock_seed() -> u64 {
    web_time::SystemTime::now()
        .duration_since(web_time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}

/// Routes formatted log lines to the devtools console.
struct BrowserConsoleSink;

impl LogSink for BrowserConsoleSink {
    fn write(&self, level: Level, line: &str) {
        let line = JsValue::from_str(line);
        match level {
            Level::ERROR => console::error_1(&line),
            Level::WARN => console::warn_1(&line),
            Level::INFO => console::info_1(&line),
            _ => console::debug_1(&line),
        }
    }
}

fn install_logging(filter: EnvFilter) {
    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(ConsoleLayer::new(BrowserConsoleSink))
        .try_init();
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
