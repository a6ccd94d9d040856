//! Demo actions served by the `demux` binary.
//!
//! - `System.ping`    → `"pong"`
//! - `System.version` → crate version
//! - `System.actions` → registered action paths
//! - `Math.add`       → typed handler, `{a, b}` → `a + b`
//! - `Debug.echo`     → the item without `action`
//! - `Debug.fail`     → fails with `args.error` verbatim
//! - `Debug.sleep`    → waits `args.ms` milliseconds

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use demux_core::{
    Action, ActionError, ActionInput, Demux, DemuxBuilder, Handler, handler_fn, sync_fn,
};
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Debug, Deserialize)]
pub struct Add {
    pub a: f64,
    pub b: f64,
}

impl Action for Add {
    const PATH: &'static str = "Math.add";
    type Output = f64;
}

pub struct AddHandler;

#[async_trait]
impl Handler<Add> for AddHandler {
    async fn handle(&self, args: Add) -> Result<f64, ActionError> {
        Ok(args.a + args.b)
    }
}

#[derive(Debug, Deserialize)]
struct SleepArgs {
    ms: u64,
}

const MAX_SLEEP_MS: u64 = 60_000;

/// Register the demo actions on `builder`. Paths are written with `sep`.
pub fn install(builder: DemuxBuilder, sep: &str) -> Result<DemuxBuilder, demux_core::BuildError> {
    let path = |segments: &[&str]| segments.join(sep);

    builder
        .register(
            &path(&["System", "ping"]),
            sync_fn(|_: ActionInput| Ok::<_, ActionError>("pong")),
        )?
        .register(
            &path(&["System", "version"]),
            sync_fn(|_: ActionInput| Ok::<_, ActionError>(demux_core::VERSION)),
        )?
        .register_action::<Add, _>(AddHandler)?
        .register(
            &path(&["Debug", "echo"]),
            sync_fn(|input: ActionInput| Ok::<_, ActionError>(input.into_value())),
        )?
        .register(
            &path(&["Debug", "fail"]),
            sync_fn(|input: ActionInput| {
                let error = input
                    .args()
                    .get("error")
                    .cloned()
                    .unwrap_or_else(|| json!("failed on purpose"));
                Err::<Value, _>(ActionError::structured(error))
            }),
        )?
        .register(
            &path(&["Debug", "sleep"]),
            handler_fn(|input: ActionInput| async move {
                let args: SleepArgs = input.decode_args()?;
                if args.ms > MAX_SLEEP_MS {
                    return Err(ActionError::new(format!(
                        "ms must be at most {MAX_SLEEP_MS}"
                    )));
                }
                tokio::time::sleep(Duration::from_millis(args.ms)).await;
                Ok::<_, ActionError>(args.ms)
            }),
        )
}

/// `System.actions` needs the finished instance, so it is added live.
pub fn install_introspection(demux: &Arc<Demux>) -> Result<(), demux_core::RegistryError> {
    let weak = Arc::downgrade(demux);
    let path = ["System", "actions"].join(&demux.config().separator);
    demux.add_action(
        &path,
        sync_fn(move |_: ActionInput| {
            weak.upgrade()
                .map(|demux| demux.registry().paths())
                .ok_or_else(|| ActionError::new("server is shutting down"))
        }),
    )
}
