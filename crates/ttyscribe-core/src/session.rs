//! Interactive capture session: PTY child + terminal model + capture engine.
//!
//! One worker task owns the terminal model (and, through the damage
//! subscription, the capture engine); the PTY reader thread only moves
//! bytes. Feed and resize are serialized by a single channel, so damage
//! dispatch and event emission are totally ordered. Consumers drain the
//! bounded transcript queue at their own pace.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use tokio::sync::{mpsc, watch, Mutex};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::capture::{CaptureConfig, CaptureEngine, DefaultChurnFilter};
use crate::events::TranscriptEvent;
use crate::pty::{PtyProcess, PtyProcessConfig};
use crate::queue::TranscriptQueue;
use crate::term::{
    AlacrittyModel, DamageEvent, DamageListener, ScrollbackView, TerminalModel, TerminalSnapshot,
};

/// Session options
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Command and arguments to run under the PTY
    pub command: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: Option<HashMap<String, String>>,
    pub cols: u16,
    pub rows: u16,
    /// Scrollback lines retained by the terminal model
    pub max_history: usize,
    pub capture: CaptureConfig,
    /// Transcript queue bound; oldest events drop past this
    pub queue_capacity: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            command: Vec::new(),
            cwd: None,
            env: None,
            cols: 120,
            rows: 30,
            max_history: 50_000,
            capture: CaptureConfig::default(),
            queue_capacity: 8192,
        }
    }
}

/// Damage listener gluing the capture engine to the transcript queue.
pub struct CapturePump {
    engine: CaptureEngine,
    queue: Arc<TranscriptQueue>,
}

impl CapturePump {
    pub fn new(engine: CaptureEngine, queue: Arc<TranscriptQueue>) -> Self {
        Self { engine, queue }
    }
}

impl DamageListener for CapturePump {
    fn on_damage(
        &mut self,
        view: &dyn ScrollbackView,
        snapshot: &TerminalSnapshot,
        damage: &DamageEvent,
    ) -> Result<()> {
        for event in self.engine.on_damage(view, snapshot, damage)? {
            self.queue.push(event);
        }
        Ok(())
    }
}

enum WorkerMsg {
    Bytes(Vec<u8>),
    Resize { cols: u16, rows: u16 },
    /// Sent by the reader once the PTY stream ends; no more bytes can
    /// follow, so the worker may stop and close the queue.
    Shutdown,
}

/// A running capture session.
pub struct Session {
    id: String,
    pty: PtyProcess,
    writer: Arc<Mutex<Option<Box<dyn Write + Send>>>>,
    worker_tx: mpsc::UnboundedSender<WorkerMsg>,
    events: Arc<TranscriptQueue>,
    running: Arc<AtomicBool>,
    exit_rx: watch::Receiver<Option<i32>>,
}

impl Session {
    /// Spawn the child under a PTY and start the capture pipeline. Must be
    /// called within a tokio runtime.
    pub fn spawn(options: SessionOptions) -> Result<Self> {
        let id = format!(
            "scribe-{}-{}",
            Utc::now().timestamp_millis(),
            &Uuid::new_v4().to_string()[..8]
        );

        let pty_config = PtyProcessConfig {
            command: options.command.clone(),
            cwd: options.cwd.clone(),
            env: options.env.clone(),
            cols: options.cols,
            rows: options.rows,
        };
        let mut pty = PtyProcess::spawn(&pty_config)?;
        let reader = pty.take_reader()?;
        let writer = pty.take_writer()?;
        let mut child = pty
            .take_child()
            .context("child handle already taken")?;

        let events = Arc::new(TranscriptQueue::new(options.queue_capacity));
        let engine = CaptureEngine::new(options.capture.clone(), Box::new(DefaultChurnFilter));

        let mut model = AlacrittyModel::new(options.cols, options.rows, options.max_history)?;
        model.subscribe(Box::new(CapturePump::new(engine, Arc::clone(&events))));

        let (worker_tx, worker_rx) = mpsc::unbounded_channel();
        tokio::spawn(worker_loop(model, worker_rx, Arc::clone(&events)));

        let running = Arc::new(AtomicBool::new(true));
        {
            let tx = worker_tx.clone();
            let running = Arc::clone(&running);
            let session_id = id.clone();
            tokio::task::spawn_blocking(move || read_loop(reader, tx, running, session_id));
        }

        let (exit_tx, exit_rx) = watch::channel(None);
        {
            let running = Arc::clone(&running);
            let session_id = id.clone();
            tokio::spawn(async move {
                let status = tokio::task::spawn_blocking(move || child.wait())
                    .await
                    .ok()
                    .and_then(|r| r.ok());
                let code = status.map(|s| s.exit_code() as i32).unwrap_or(-1);
                running.store(false, Ordering::SeqCst);
                let _ = exit_tx.send(Some(code));
                info!(session = %session_id, code, "pty child exited");
            });
        }

        info!(session = %id, pid = pty.pid(), "capture session started");

        Ok(Self {
            id,
            pty,
            writer: Arc::new(Mutex::new(Some(writer))),
            worker_tx,
            events,
            running,
            exit_rx,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Shared handle to the transcript queue.
    pub fn events(&self) -> Arc<TranscriptQueue> {
        Arc::clone(&self.events)
    }

    /// Wait for the next transcript event. `None` once the session is done
    /// and the backlog is drained.
    pub async fn next_event(&self) -> Option<TranscriptEvent> {
        self.events.recv().await
    }

    /// Take the next transcript event without waiting.
    pub fn try_next_event(&self) -> Option<TranscriptEvent> {
        self.events.try_recv()
    }

    /// Events lost to queue overflow so far.
    pub fn dropped_events(&self) -> u64 {
        self.events.dropped()
    }

    /// Send a prompt to the child, optionally terminated with a newline.
    pub async fn send_prompt(&self, prompt: &str, append_newline: bool) -> Result<()> {
        let mut text = String::with_capacity(prompt.len() + 1);
        text.push_str(prompt);
        if append_newline {
            text.push('\n');
        }
        self.write_bytes(text.as_bytes()).await
    }

    /// Send raw text to the child's input.
    pub async fn send_text(&self, text: &str) -> Result<()> {
        self.write_bytes(text.as_bytes()).await
    }

    /// Send the ESC key.
    pub async fn send_escape(&self) -> Result<()> {
        self.write_bytes(&[0x1b]).await
    }

    /// Resize both the PTY and the terminal model. The ioctl happens
    /// immediately; the model reflow is serialized behind pending feeds.
    pub fn resize(&self, cols: u16, rows: u16) -> Result<()> {
        self.pty.resize(cols, rows)?;
        self.worker_tx
            .send(WorkerMsg::Resize { cols, rows })
            .map_err(|_| anyhow!("terminal worker stopped"))?;
        Ok(())
    }

    /// Wait for the child to exit and return its exit code.
    pub async fn wait_for_exit(&self) -> i32 {
        let mut rx = self.exit_rx.clone();
        loop {
            if let Some(code) = *rx.borrow() {
                return code;
            }
            if rx.changed().await.is_err() {
                return -1;
            }
        }
    }

    /// Forcibly terminate the child and stop the pipeline.
    pub async fn kill(&mut self) -> Result<()> {
        self.running.store(false, Ordering::SeqCst);
        *self.writer.lock().await = None;
        self.pty.kill()?;
        info!(session = %self.id, "capture session killed");
        Ok(())
    }

    async fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        if !self.is_running() {
            return Err(anyhow!("session not running"));
        }
        let mut guard = self.writer.lock().await;
        match guard.as_mut() {
            Some(writer) => {
                writer.write_all(bytes)?;
                writer.flush()?;
                debug!(session = %self.id, len = bytes.len(), "wrote to pty");
                Ok(())
            }
            None => Err(anyhow!("pty writer not available")),
        }
    }
}

/// Worker loop: applies feeds and resizes in arrival order. Damage dispatch
/// (and capture) runs synchronously inside `feed`, so per-invocation event
/// runs are contiguous in the queue.
async fn worker_loop(
    mut model: AlacrittyModel,
    mut rx: mpsc::UnboundedReceiver<WorkerMsg>,
    events: Arc<TranscriptQueue>,
) {
    while let Some(msg) = rx.recv().await {
        match msg {
            WorkerMsg::Bytes(data) => model.feed(&data),
            WorkerMsg::Resize { cols, rows } => {
                if let Err(err) = model.resize(cols, rows) {
                    warn!(error = %err, "terminal resize rejected");
                }
            }
            WorkerMsg::Shutdown => break,
        }
    }
    events.close();
    debug!("terminal worker stopped");
}

/// Blocking PTY read loop. Ends on EOF, read error, or session shutdown.
fn read_loop(
    mut reader: Box<dyn Read + Send>,
    tx: mpsc::UnboundedSender<WorkerMsg>,
    running: Arc<AtomicBool>,
    session_id: String,
) {
    let mut buf = [0u8; 8192];
    while running.load(Ordering::SeqCst) {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                if tx.send(WorkerMsg::Bytes(buf[..n].to_vec())).is_err() {
                    break;
                }
            }
            Err(err) => {
                // EIO is the normal "child closed the slave side" signal
                debug!(session = %session_id, error = %err, "pty read ended");
                break;
            }
        }
    }
    let _ = tx.send(WorkerMsg::Shutdown);
    debug!(session = %session_id, "pty read loop stopped");
}
