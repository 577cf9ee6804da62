//! Command-queue actor tying the document store and session together.
//!
//! All user intents and all I/O completions funnel through one mpsc channel
//! and are drained by a single task that owns the store and the session, so
//! no two core mutations ever interleave. `rename`, `delete`, and `save` are
//! awaited inline while draining: a second operation on the same document
//! queues behind the first instead of racing it.
//!
//! The exception is the body read behind `open`, which runs as its own task
//! so the tab can open immediately and fill in when the read lands. Its
//! completion re-enters the queue as a `ReadDone` command
//! tagged with the document's generation, and the store drops completions
//! whose tag no longer matches — a deleted or renamed document cannot be
//! resurrected by a stale read.
//!
//! After every command the actor re-derives the view model and publishes it
//! on a watch channel. Failures that arrive outside any pending intent (the
//! purge after a failed read) are published as [`Notice`]s on a broadcast
//! channel.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::{debug, info};

use quill_api::DocumentId;

use crate::config::WorkspaceConfig;
use crate::error::{FsError, IndexError, StoreError};
use crate::gateway::{FilesystemGateway, MetadataIndex};
use crate::session::SessionState;
use crate::store::{DocumentStore, OpenRequest, ReadCompletion};
use crate::view::{derive_view, ViewModel};

/// Out-of-band report for the presentation layer, shown as a blocking notice.
#[derive(Debug, Clone)]
pub enum Notice {
    /// A document's backing file was missing or unreadable; the document has
    /// been purged from the store, the index, and the tab strip.
    DocumentMissing { id: DocumentId, title: String },
}

enum Command {
    Create {
        reply: oneshot::Sender<DocumentId>,
    },
    Open {
        id: DocumentId,
        reply: oneshot::Sender<Result<(), StoreError>>,
    },
    Focus {
        id: DocumentId,
        reply: oneshot::Sender<Result<(), StoreError>>,
    },
    Close {
        id: DocumentId,
        reply: oneshot::Sender<()>,
    },
    Edit {
        id: DocumentId,
        body: String,
        reply: oneshot::Sender<Result<(), StoreError>>,
    },
    Rename {
        id: DocumentId,
        new_title: String,
        reply: oneshot::Sender<Result<(), StoreError>>,
    },
    Delete {
        id: DocumentId,
        reply: oneshot::Sender<Result<(), StoreError>>,
    },
    Save {
        id: DocumentId,
        reply: oneshot::Sender<Result<(), StoreError>>,
    },
    SetFilter {
        keyword: String,
        reply: oneshot::Sender<()>,
    },
    ReadDone {
        id: DocumentId,
        generation: u64,
        outcome: Result<String, FsError>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Clonable handle to a running workspace actor; one async method per intent.
#[derive(Clone)]
pub struct WorkspaceHandle {
    tx: mpsc::Sender<Command>,
    view_rx: watch::Receiver<ViewModel>,
    notice_tx: broadcast::Sender<Notice>,
}

impl WorkspaceHandle {
    /// Load the index, spawn the actor task, and return a handle to it.
    pub async fn spawn(
        config: WorkspaceConfig,
        fs: Arc<dyn FilesystemGateway>,
        index: Arc<dyn MetadataIndex>,
    ) -> Result<Self, IndexError> {
        let store = DocumentStore::load(&config, fs, index).await?;
        let session = SessionState::new();

        let (tx, rx) = mpsc::channel(64);
        let (view_tx, view_rx) = watch::channel(derive_view(&store, &session));
        let (notice_tx, _) = broadcast::channel(16);

        let actor = WorkspaceActor {
            store,
            session,
            pending_reads: HashMap::new(),
            tx: tx.clone(),
            view_tx,
            notice_tx: notice_tx.clone(),
        };
        tokio::spawn(actor.run(rx));
        info!("workspace started");

        Ok(Self {
            tx,
            view_rx,
            notice_tx,
        })
    }

    pub async fn create(&self) -> Result<DocumentId, StoreError> {
        self.request(|reply| Command::Create { reply }).await
    }

    pub async fn open(&self, id: &str) -> Result<(), StoreError> {
        self.request(|reply| Command::Open {
            id: id.to_string(),
            reply,
        })
        .await?
    }

    pub async fn focus(&self, id: &str) -> Result<(), StoreError> {
        self.request(|reply| Command::Focus {
            id: id.to_string(),
            reply,
        })
        .await?
    }

    pub async fn close(&self, id: &str) -> Result<(), StoreError> {
        self.request(|reply| Command::Close {
            id: id.to_string(),
            reply,
        })
        .await
    }

    pub async fn edit(&self, id: &str, body: impl Into<String>) -> Result<(), StoreError> {
        self.request(|reply| Command::Edit {
            id: id.to_string(),
            body: body.into(),
            reply,
        })
        .await?
    }

    pub async fn rename(&self, id: &str, new_title: &str) -> Result<(), StoreError> {
        self.request(|reply| Command::Rename {
            id: id.to_string(),
            new_title: new_title.to_string(),
            reply,
        })
        .await?
    }

    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.request(|reply| Command::Delete {
            id: id.to_string(),
            reply,
        })
        .await?
    }

    pub async fn save(&self, id: &str) -> Result<(), StoreError> {
        self.request(|reply| Command::Save {
            id: id.to_string(),
            reply,
        })
        .await?
    }

    pub async fn set_filter(&self, keyword: &str) -> Result<(), StoreError> {
        self.request(|reply| Command::SetFilter {
            keyword: keyword.to_string(),
            reply,
        })
        .await
    }

    /// Current view model.
    pub fn view(&self) -> ViewModel {
        self.view_rx.borrow().clone()
    }

    /// Watch receiver that yields a fresh view model after every change.
    pub fn subscribe(&self) -> watch::Receiver<ViewModel> {
        self.view_rx.clone()
    }

    /// Receiver for out-of-band notices.
    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.notice_tx.subscribe()
    }

    /// Stop the actor after it has drained everything queued ahead.
    pub async fn shutdown(&self) -> Result<(), StoreError> {
        self.request(|reply| Command::Shutdown { reply }).await
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, StoreError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(command(reply_tx))
            .await
            .map_err(|_| StoreError::Closed)?;
        reply_rx.await.map_err(|_| StoreError::Closed)
    }
}

struct WorkspaceActor {
    store: DocumentStore,
    session: SessionState,
    /// Generation of the in-flight read per document id, so a second open of
    /// the same document does not spawn a duplicate read.
    pending_reads: HashMap<DocumentId, u64>,
    tx: mpsc::Sender<Command>,
    view_tx: watch::Sender<ViewModel>,
    notice_tx: broadcast::Sender<Notice>,
}

impl WorkspaceActor {
    async fn run(mut self, mut rx: mpsc::Receiver<Command>) {
        while let Some(command) = rx.recv().await {
            if self.handle(command).await {
                break;
            }
        }
        info!("workspace stopped");
    }

    /// Process one command; returns true on shutdown.
    async fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::Create { reply } => {
                let id = self.store.create();
                self.respond(reply, id);
            }
            Command::Open { id, reply } => {
                let result = self.handle_open(id);
                self.respond(reply, result);
            }
            Command::Focus { id, reply } => {
                let result = if self.session.focus_tab(&id) {
                    Ok(())
                } else {
                    Err(StoreError::NotFound(id))
                };
                self.respond(reply, result);
            }
            Command::Close { id, reply } => {
                self.session.close_tab(&id);
                self.respond(reply, ());
            }
            Command::Edit { id, body, reply } => {
                let result = self.store.edit(&id, body);
                if result.is_ok() {
                    self.session.mark_dirty(&id);
                }
                self.respond(reply, result);
            }
            Command::Rename {
                id,
                new_title,
                reply,
            } => {
                let result = self.store.rename(&id, &new_title).await;
                self.respond(reply, result);
            }
            Command::Delete { id, reply } => {
                let result = self.store.delete(&id).await;
                if result.is_ok() {
                    self.session.close_tab(&id);
                    self.session.clear_dirty(&id);
                }
                self.respond(reply, result);
            }
            Command::Save { id, reply } => {
                let result = self.store.save(&id).await;
                if result.is_ok() {
                    self.session.clear_dirty(&id);
                }
                self.respond(reply, result);
            }
            Command::SetFilter { keyword, reply } => {
                self.session.set_filter(keyword);
                self.respond(reply, ());
            }
            Command::ReadDone {
                id,
                generation,
                outcome,
            } => {
                if self.pending_reads.get(&id) == Some(&generation) {
                    self.pending_reads.remove(&id);
                }
                match self.store.finish_open(&id, generation, outcome).await {
                    ReadCompletion::Applied | ReadCompletion::Stale => {}
                    ReadCompletion::Purged { title } => {
                        self.session.close_tab(&id);
                        self.session.clear_dirty(&id);
                        let _ = self.notice_tx.send(Notice::DocumentMissing { id, title });
                    }
                }
                self.publish_view();
            }
            Command::Shutdown { reply } => {
                self.respond(reply, ());
                return true;
            }
        }
        false
    }

    fn publish_view(&self) {
        self.view_tx
            .send_replace(derive_view(&self.store, &self.session));
    }

    /// Publish the post-command view before releasing the caller, so a
    /// `view()` read right after an awaited intent always sees its effect.
    fn respond<T>(&self, reply: oneshot::Sender<T>, value: T) {
        self.publish_view();
        let _ = reply.send(value);
    }

    /// Open a tab, spawning a body read if the document is unloaded.
    ///
    /// The tab opens immediately; the body arrives later as a `ReadDone`
    /// queued behind whatever else is in flight.
    fn handle_open(&mut self, id: DocumentId) -> Result<(), StoreError> {
        match self.store.begin_open(&id)? {
            OpenRequest::AlreadyLoaded => {
                self.session.open_tab(&id);
                Ok(())
            }
            OpenRequest::Read { path, generation } => {
                self.session.open_tab(&id);
                if self.pending_reads.get(&id) == Some(&generation) {
                    debug!(%id, "read already in flight");
                    return Ok(());
                }
                self.pending_reads.insert(id.clone(), generation);

                let fs = self.store.filesystem();
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let outcome = fs.read(&path).await;
                    let _ = tx
                        .send(Command::ReadDone {
                            id,
                            generation,
                            outcome,
                        })
                        .await;
                });
                Ok(())
            }
        }
    }
}
