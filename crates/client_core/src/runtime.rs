//! Runs a [`ListController`] on one task: parameter changes arrive as
//! commands, fetches run as child tasks, and their outcomes are fed back
//! through [`ListController::complete`].

use std::{collections::HashMap, sync::Arc, time::Duration};

use shared::protocol::{CharacterPage, SortOption, StatusFilter};
use tokio::{
    sync::{
        mpsc::{self, error::TrySendError},
        watch,
    },
    task::{self, JoinHandle, JoinSet},
};
use tracing::{debug, error, info};

use crate::{
    client::CollectionSource,
    controller::{FetchRequest, ListController, Snapshot},
    error::{NetworkError, RuntimeClosed},
};

const DEFAULT_COMMAND_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerCommand {
    SetSortOption(SortOption),
    SetStatusFilter(StatusFilter),
    SetPage(u32),
    Reload,
    Shutdown,
}

impl ControllerCommand {
    fn name(&self) -> &'static str {
        match self {
            Self::SetSortOption(_) => "set_sort_option",
            Self::SetStatusFilter(_) => "set_status_filter",
            Self::SetPage(_) => "set_page",
            Self::Reload => "reload",
            Self::Shutdown => "shutdown",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RuntimeOptions {
    /// Upper bound on a whole fetch, eager traversals included. Expiry is
    /// reported as [`NetworkError::Timeout`].
    pub fetch_timeout: Option<Duration>,
    pub command_capacity: usize,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            fetch_timeout: None,
            command_capacity: DEFAULT_COMMAND_CAPACITY,
        }
    }
}

/// Renderer-side access to a running controller.
#[derive(Clone)]
pub struct ControllerHandle {
    commands: mpsc::Sender<ControllerCommand>,
    snapshots: watch::Receiver<Snapshot>,
}

impl ControllerHandle {
    pub async fn set_sort_option(&self, sort: SortOption) -> Result<(), RuntimeClosed> {
        self.send(ControllerCommand::SetSortOption(sort)).await
    }

    pub async fn set_status_filter(&self, filter: StatusFilter) -> Result<(), RuntimeClosed> {
        self.send(ControllerCommand::SetStatusFilter(filter)).await
    }

    pub async fn set_page(&self, page: u32) -> Result<(), RuntimeClosed> {
        self.send(ControllerCommand::SetPage(page)).await
    }

    pub async fn reload(&self) -> Result<(), RuntimeClosed> {
        self.send(ControllerCommand::Reload).await
    }

    pub async fn shutdown(&self) -> Result<(), RuntimeClosed> {
        self.send(ControllerCommand::Shutdown).await
    }

    pub async fn send(&self, command: ControllerCommand) -> Result<(), RuntimeClosed> {
        self.commands.send(command).await.map_err(|_| RuntimeClosed)
    }

    /// Non-blocking dispatch for callers that must not wait on the queue.
    /// On failure `status` receives a message fit for the user.
    pub fn try_dispatch(&self, command: ControllerCommand, status: &mut String) -> bool {
        let name = command.name();
        match self.commands.try_send(command) {
            Ok(()) => {
                debug!(command = name, "queued controller command");
                true
            }
            Err(TrySendError::Full(_)) => {
                *status = "Controller command queue is full; please retry".to_string();
                false
            }
            Err(TrySendError::Closed(_)) => {
                *status = "List controller has stopped; restart the browser".to_string();
                false
            }
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        self.snapshots.borrow().clone()
    }

    pub fn snapshots(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.clone()
    }

    /// Waits until a published snapshot satisfies `ready`, checking the
    /// current one first.
    pub async fn wait_for(
        &self,
        ready: impl FnMut(&Snapshot) -> bool,
    ) -> Result<Snapshot, RuntimeClosed> {
        let mut snapshots = self.snapshots.clone();
        let snapshot = snapshots.wait_for(ready).await.map_err(|_| RuntimeClosed)?;
        Ok(snapshot.clone())
    }
}

/// Activates `controller` and runs it on a new task until shutdown or until
/// every handle is dropped. The task hands the controller back when it ends.
pub fn spawn_controller(
    controller: ListController,
    source: Arc<dyn CollectionSource>,
    options: RuntimeOptions,
) -> (ControllerHandle, JoinHandle<ListController>) {
    let (commands_tx, commands_rx) = mpsc::channel(options.command_capacity.max(1));
    let handle = ControllerHandle {
        commands: commands_tx,
        snapshots: controller.subscribe(),
    };
    let task = tokio::spawn(run(controller, source, options, commands_rx));
    (handle, task)
}

type FetchOutcome = Result<CharacterPage, NetworkError>;

/// In-flight fetches, keyed by task so a panicked task can still be matched
/// to the request it was serving.
#[derive(Default)]
struct Inflight {
    tasks: JoinSet<FetchOutcome>,
    seqs: HashMap<task::Id, u64>,
}

async fn run(
    mut controller: ListController,
    source: Arc<dyn CollectionSource>,
    options: RuntimeOptions,
    mut commands: mpsc::Receiver<ControllerCommand>,
) -> ListController {
    let mut inflight = Inflight::default();
    let request = controller.activate();
    start_fetch(&mut inflight, &source, options.fetch_timeout, request);

    loop {
        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else {
                    debug!("all controller handles dropped");
                    break;
                };
                debug!(command = command.name(), "applying controller command");
                let request = match command {
                    ControllerCommand::SetSortOption(sort) => {
                        controller.set_sort_option(sort);
                        None
                    }
                    ControllerCommand::SetStatusFilter(filter) => {
                        controller.set_status_filter(filter)
                    }
                    ControllerCommand::SetPage(page) => controller.set_page(page),
                    ControllerCommand::Reload => Some(controller.reload()),
                    ControllerCommand::Shutdown => break,
                };
                if let Some(request) = request {
                    start_fetch(&mut inflight, &source, options.fetch_timeout, request);
                }
            }
            Some(joined) = inflight.tasks.join_next_with_id(), if !inflight.tasks.is_empty() => {
                let (id, result) = match joined {
                    Ok((id, result)) => (id, result),
                    Err(err) => {
                        error!(error = %err, "fetch task ended abnormally");
                        (err.id(), Err(NetworkError::TaskFailed(err.to_string())))
                    }
                };
                if let Some(seq) = inflight.seqs.remove(&id) {
                    controller.complete(seq, result);
                }
            }
        }
    }

    // Results for in-flight fetches have nowhere to go any more.
    inflight.tasks.shutdown().await;
    info!("list controller runtime stopped");
    controller
}

fn start_fetch(
    inflight: &mut Inflight,
    source: &Arc<dyn CollectionSource>,
    timeout: Option<Duration>,
    request: FetchRequest,
) {
    let source = Arc::clone(source);
    let task = inflight.tasks.spawn(async move {
        match timeout {
            Some(limit) => tokio::time::timeout(limit, source.fetch(request.query))
                .await
                .unwrap_or_else(|_| Err(NetworkError::Timeout(limit))),
            None => source.fetch(request.query).await,
        }
    });
    inflight.seqs.insert(task.id(), request.seq);
}

#[cfg(test)]
#[path = "tests/runtime_tests.rs"]
mod tests;
