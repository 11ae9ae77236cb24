//! Worker command - drive the offline cache lifecycle

use crate::cli::args::{ClientAction, OutputFormat, WorkerAction, WorkerArgs};
use crate::config::{Config, StatePaths};
use crate::error::{B64Error, B64Result};
use crate::net::{Destination, HttpNetwork, Network, OfflineNetwork, Request};
use crate::ui::{self, TaskSpinner, UiContext};
use crate::worker::{Activation, CacheManifest, Registration, UpdateOutcome, WorkerRecord};
use console::style;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tracing::debug;
use url::Url;

/// Execute the worker command
pub async fn execute(args: WorkerArgs, config: &Config, paths: &StatePaths) -> B64Result<()> {
    let offline = matches!(args.action, WorkerAction::Fetch { offline: true, .. });
    let network = build_network(config, offline)?;
    let mut registration =
        Registration::load(paths, network, config.cache.quota_bytes()).await?;

    let result = match args.action {
        WorkerAction::Update => update(&mut registration, config).await,
        WorkerAction::Activate => activate(&mut registration).await,
        WorkerAction::Fetch {
            url,
            method,
            document,
            output,
            ..
        } => {
            let mut request = Request::parse(method, &url)?;
            if document {
                request = request.with_destination(Destination::Document);
            }
            fetch(&registration, request, output.as_deref()).await
        }
        WorkerAction::Message { payload } => message(&mut registration, &payload).await,
        WorkerAction::Client { action } => client(&mut registration, config, action).await,
        WorkerAction::Status { format } => {
            status(&registration, format)?;
            return Ok(());
        }
    };

    // Lifecycle progress is kept even when the command itself failed
    registration.save().await?;
    result
}

fn build_network(config: &Config, offline: bool) -> B64Result<Arc<dyn Network>> {
    if offline {
        return Ok(Arc::new(OfflineNetwork));
    }
    let origin = Url::parse(&config.app.origin).map_err(|e| B64Error::InvalidUrl {
        url: config.app.origin.clone(),
        reason: e.to_string(),
    })?;
    let timeout = Duration::from_secs(config.network.timeout_secs);
    Ok(Arc::new(HttpNetwork::new(origin.origin(), timeout)))
}

async fn update(registration: &mut Registration, config: &Config) -> B64Result<()> {
    let ctx = UiContext::detect();
    let manifest = CacheManifest::from_config(config)?;

    let mut spinner = TaskSpinner::new(&ctx);
    spinner.start(&format!(
        "Installing {} ({} resources)",
        manifest.cache_name_string(),
        manifest.static_resources.len()
    ));

    match registration.update(manifest).await? {
        UpdateOutcome::UpToDate { cache_name } => {
            spinner.stop(&format!("{} is already active", cache_name));
        }
        UpdateOutcome::InstallFailed { cache_name, error } => {
            spinner.stop_error(&format!("Install of {} failed", cache_name));
            return Err(error);
        }
        UpdateOutcome::Waiting { cache_name } => {
            spinner.stop_warn(&format!("{} installed and waiting", cache_name));
            ui::remark(
                &ctx,
                "Close the open clients or run: b64shell worker message '{\"type\":\"SKIP_WAITING\"}'",
            );
        }
        UpdateOutcome::Activated(activation) => {
            spinner.stop(&format!("Activated {}", activation.cache_name));
            report_activation(&ctx, &activation);
        }
    }
    Ok(())
}

async fn activate(registration: &mut Registration) -> B64Result<()> {
    let ctx = UiContext::detect();
    let activation = registration.activate_waiting().await?;
    ui::step_ok(&ctx, &format!("Activated {}", activation.cache_name));
    report_activation(&ctx, &activation);
    Ok(())
}

fn report_activation(ctx: &UiContext, activation: &Activation) {
    for name in &activation.deleted {
        ui::remark(ctx, &format!("Deleted old cache {}", name));
    }
    if activation.controlled > 0 {
        ui::remark(
            ctx,
            &format!("Controlling {} client(s)", activation.controlled),
        );
    }
}

async fn fetch(
    registration: &Registration,
    request: Request,
    output: Option<&Path>,
) -> B64Result<()> {
    let ctx = UiContext::detect();
    let url = request.url.to_string();
    let (response, source) = registration.fetch(request).await?;
    debug!("{} answered from {}", url, source);

    ui::step_info(
        &ctx,
        &format!(
            "{} {} from {} ({} bytes)",
            response.status,
            response.status_text,
            source,
            response.body.len()
        ),
    );

    match output {
        Some(path) => {
            fs::write(path, &response.body)
                .await
                .map_err(|e| B64Error::io(format!("writing {}", path.display()), e))?;
            ui::step_ok_detail(&ctx, "Body written", &path.display().to_string());
        }
        None => match response.text() {
            Some(text) => println!("{}", text),
            None => ui::remark(&ctx, "Binary body; use --output to save it"),
        },
    }
    Ok(())
}

async fn message(registration: &mut Registration, payload: &str) -> B64Result<()> {
    let ctx = UiContext::detect();
    match registration.post_message(payload).await? {
        Some(activation) => {
            ui::step_ok(
                &ctx,
                &format!("Skipped waiting; activated {}", activation.cache_name),
            );
            report_activation(&ctx, &activation);
        }
        None => ui::step_info(&ctx, "Message delivered"),
    }
    Ok(())
}

async fn client(
    registration: &mut Registration,
    config: &Config,
    action: ClientAction,
) -> B64Result<()> {
    let ctx = UiContext::detect();
    match action {
        ClientAction::Open { url } => {
            let url = url.unwrap_or_else(|| config.app.origin.clone());
            let client = registration.open_client(&url)?;
            let controller = client
                .controller
                .and_then(|id| worker_name(registration, id))
                .unwrap_or_else(|| "uncontrolled".to_string());
            ui::step_ok_detail(&ctx, &format!("Opened client {}", client.id), &controller);
        }
        ClientAction::Close { id } => {
            let activation = registration.close_client(id).await?;
            ui::step_ok(&ctx, &format!("Closed client {}", id));
            if let Some(activation) = activation {
                ui::step_ok(&ctx, &format!("Activated {}", activation.cache_name));
                report_activation(&ctx, &activation);
            }
        }
    }
    Ok(())
}

fn worker_name(registration: &Registration, id: uuid::Uuid) -> Option<String> {
    registration
        .active()
        .filter(|w| w.id == id)
        .map(WorkerRecord::cache_name)
}

#[derive(Serialize)]
struct StatusJson<'a> {
    active: Option<WorkerJson>,
    waiting: Option<WorkerJson>,
    clients: &'a [crate::worker::ClientRecord],
}

#[derive(Serialize)]
struct WorkerJson {
    id: String,
    cache_name: String,
    state: String,
    since: String,
}

impl From<&WorkerRecord> for WorkerJson {
    fn from(worker: &WorkerRecord) -> Self {
        Self {
            id: worker.id.to_string(),
            cache_name: worker.cache_name(),
            state: worker.state.to_string(),
            since: worker.state_changed_at.to_rfc3339(),
        }
    }
}

fn status(registration: &Registration, format: OutputFormat) -> B64Result<()> {
    match format {
        OutputFormat::Json => {
            let json = StatusJson {
                active: registration.active().map(WorkerJson::from),
                waiting: registration.waiting().map(WorkerJson::from),
                clients: registration.clients(),
            };
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Plain => {
            for worker in registration.active().into_iter().chain(registration.waiting()) {
                println!("{} {}", worker.cache_name(), worker.state);
            }
        }
        OutputFormat::Table => print_status_table(registration),
    }
    Ok(())
}

fn print_status_table(registration: &Registration) {
    let ctx = UiContext::detect();
    ui::intro(&ctx, "Offline cache worker");

    let describe = |worker: Option<&WorkerRecord>| match worker {
        Some(w) => format!(
            "{} ({}, since {})",
            w.cache_name(),
            w.state,
            w.state_changed_at.format("%Y-%m-%d %H:%M")
        ),
        None => style("none").dim().to_string(),
    };
    ui::key_value(&ctx, "Active", &describe(registration.active()));
    ui::key_value(&ctx, "Waiting", &describe(registration.waiting()));

    let clients = registration.clients();
    if clients.is_empty() {
        ui::key_value(&ctx, "Clients", "none");
        return;
    }

    println!();
    println!(
        "{:<38} {:<12} {:<30}",
        style("CLIENT").bold(),
        style("CONTROLLED").bold(),
        style("URL").bold()
    );
    println!("{}", "-".repeat(80));
    for client in clients {
        let controlled = match client.controller {
            Some(id) if registration.active().is_some_and(|w| w.id == id) => {
                style("active").green()
            }
            Some(_) => style("old").yellow(),
            None => style("no").dim(),
        };
        println!("{:<38} {:<12} {:<30}", client.id, controlled, client.url);
    }
}
