//! One full processing run over a configuration document

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::join_all;
use serde_json::Value;
use thiserror::Error;
use tracing::info;

use vigil_actions::{ActionRegistry, DispatchError};
use vigil_config::{ConfigDocument, ConfigError};
use vigil_core::{
    history_snapshot, resolve_cwd, timestamp, CheckResult, ItemDoc, MailTransport, ProcessExecutor,
};
use vigil_template::{FnProvider, PlaceholderError, ProviderContext, ProviderRegistry};
use vigil_trigger::TriggerProcessor;

pub type RunResult<T> = Result<T, RunError>;

/// A failure that aborts one document's run before its state is saved.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("cannot resolve configuration path '{path}': {source}")]
    Path {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// The external capabilities a run is wired to.
pub struct Collaborators {
    pub executor: Arc<dyn ProcessExecutor>,
    pub mailer: Arc<dyn MailTransport>,
}

/// Load one configuration document, poll its items, process its triggers and
/// save the updated document back.
///
/// The save happens only when every trigger cycle completed; an escalated
/// dispatch failure leaves the file exactly as it was loaded.
pub async fn run_document(path: &Path, collab: &Collaborators) -> RunResult<()> {
    let path = absolutize(path)?;
    let config_dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let mut config = ConfigDocument::load(&path)?;
    info!(
        path = %path.display(),
        items = config.items.len(),
        triggers = config.triggers.len(),
        "processing configuration"
    );

    poll_items(&mut config.items, &config_dir, collab.executor.as_ref()).await;
    let items = history_snapshot(&config.items);

    let providers = Arc::new(ProviderRegistry::standard());
    let filename = path.display().to_string();
    providers.register(
        "config.filename",
        Arc::new(FnProvider(
            move |_: Option<&str>, _: &ProviderContext<'_>| -> Result<Value, PlaceholderError> {
                Ok(Value::String(filename.clone()))
            },
        )),
    );
    let registry = Arc::new(ActionRegistry::standard(
        collab.mailer.clone(),
        collab.executor.clone(),
        config_dir,
    ));
    let processor = TriggerProcessor::new(providers, registry);

    let cycles = config
        .triggers
        .iter_mut()
        .map(|trigger| processor.process(trigger, &items));
    for outcome in join_all(cycles).await {
        outcome?;
    }

    config.save(&path)?;
    Ok(())
}

/// Poll every item that has a command and record the results, newest first.
async fn poll_items(items: &mut [ItemDoc], config_dir: &Path, executor: &dyn ProcessExecutor) {
    let polls = items.iter().enumerate().filter_map(|(index, item)| {
        let argv = item.cmd.as_ref()?.to_argv();
        let cwd = item.cwd.as_deref().map(|dir| resolve_cwd(config_dir, dir));
        Some(async move {
            let result = match executor.run(&argv, cwd.as_deref()).await {
                Ok(result) => result.with_derived_value(),
                Err(err) => CheckResult::failed(timestamp(), &err),
            };
            (index, result)
        })
    });
    for (index, result) in join_all(polls).await {
        items[index].record(result);
    }
}

fn absolutize(path: &Path) -> RunResult<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|source| RunError::Path {
        path: path.display().to_string(),
        source,
    })?;
    Ok(cwd.join(path))
}
