use crate::pipeline::Pipeline;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use wakecast_audio::{AudioSource, CloseHandle};
use wakecast_broadcast::{ConnectionAcceptor, EventBroadcaster, SubscriberRegistry};
use wakecast_core::{AppConfig, AsrError, AudioError, BroadcastError, TriggerGate, WakeDetector};
use wakecast_engine::{EngineConfig, EngineRegistry, RecognizerAdapter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Idle,
    Loading,
    Listening,
    ShuttingDown,
    Stopped,
}

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("model path not found: {}", .0.display())]
    ModelNotFound(PathBuf),

    #[error(transparent)]
    Engine(#[from] AsrError),

    #[error(transparent)]
    Broadcast(#[from] BroadcastError),

    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error("failed to spawn capture thread: {0}")]
    Spawn(std::io::Error),

    #[error("model load task failed: {0}")]
    LoadTask(tokio::task::JoinError),

    #[error("capture thread exited without reporting")]
    WorkerLost,
}

impl SupervisorError {
    /// Process exit status for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            SupervisorError::ModelNotFound(_) | SupervisorError::Engine(AsrError::ModelNotFound(_)) => 1,
            _ => 2,
        }
    }
}

/// Owns startup order, the steady state and shutdown of the service.
pub struct Supervisor {
    config: AppConfig,
    engines: EngineRegistry,
    subscribers: Arc<SubscriberRegistry>,
    state: watch::Sender<SupervisorState>,
}

impl Supervisor {
    pub fn new(config: AppConfig, engines: EngineRegistry) -> Self {
        let (state, _) = watch::channel(SupervisorState::Idle);
        Self {
            config,
            engines,
            subscribers: Arc::new(SubscriberRegistry::new()),
            state,
        }
    }

    pub fn state(&self) -> SupervisorState {
        *self.state.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<SupervisorState> {
        self.state.subscribe()
    }

    pub fn subscribers(&self) -> Arc<SubscriberRegistry> {
        Arc::clone(&self.subscribers)
    }

    fn transition(&self, next: SupervisorState) {
        let prev = self.state.send_replace(next);
        tracing::debug!(?prev, ?next, "supervisor state change");
    }

    /// Run until `shutdown` resolves or the capture stream fails.
    ///
    /// `open_source` runs on the dedicated capture thread; the source it
    /// returns never leaves that thread.
    pub async fn run<S, F, Sd>(&self, open_source: F, shutdown: Sd) -> Result<(), SupervisorError>
    where
        S: AudioSource + 'static,
        F: FnOnce(u32, u32) -> Result<S, AudioError> + Send + 'static,
        Sd: Future<Output = ()>,
    {
        let result = self.run_inner(open_source, shutdown).await;
        self.transition(SupervisorState::Stopped);
        result
    }

    async fn run_inner<S, F, Sd>(&self, open_source: F, shutdown: Sd) -> Result<(), SupervisorError>
    where
        S: AudioSource + 'static,
        F: FnOnce(u32, u32) -> Result<S, AudioError> + Send + 'static,
        Sd: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        self.transition(SupervisorState::Loading);
        let adapter = tokio::select! {
            biased;
            _ = &mut shutdown => {
                self.interrupted("loading the model");
                return Ok(());
            }
            loaded = self.load_recognizer() => loaded?,
        };

        let bind_addr = self.config.server.bind_addr();
        let mut acceptor = tokio::select! {
            biased;
            _ = &mut shutdown => {
                self.interrupted("binding the server");
                return Ok(());
            }
            bound = ConnectionAcceptor::serve(&bind_addr, self.subscribers()) => bound?,
        };

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let dispatcher = EventBroadcaster::new(self.subscribers()).start(event_rx);

        let pipeline = Pipeline::new(
            adapter,
            WakeDetector::new(self.config.wake.phrase.clone()),
            TriggerGate::new(self.config.wake.dedupe_per_utterance),
            event_tx,
        );

        let sample_rate = self.config.audio.sample_rate;
        let block_size = self.config.audio.block_size;
        let (ready_tx, mut ready_rx) = oneshot::channel();
        let (done_tx, mut done_rx) = oneshot::channel();
        let worker = std::thread::Builder::new()
            .name("capture".into())
            .spawn(move || {
                capture_worker(open_source, sample_rate, block_size, pipeline, ready_tx, done_tx)
            })
            .map_err(SupervisorError::Spawn)?;

        let ready = tokio::select! {
            biased;
            _ = &mut shutdown => None,
            ready = &mut ready_rx => Some(ready),
        };
        let close = match ready {
            Some(Ok(Ok(close))) => close,
            Some(Ok(Err(e))) => {
                acceptor.shutdown().await;
                return Err(e.into());
            }
            Some(Err(_)) => {
                acceptor.shutdown().await;
                return Err(SupervisorError::WorkerLost);
            }
            None => {
                self.transition(SupervisorState::ShuttingDown);
                // With the receiver gone the worker drops the source as soon
                // as the open returns.
                drop(ready_rx);
                acceptor.shutdown().await;
                join_worker(worker).await;
                let _ = dispatcher.await;
                tracing::info!("shutdown requested while opening the capture device");
                return Ok(());
            }
        };

        self.transition(SupervisorState::Listening);
        tracing::info!(phrase = %self.config.wake.phrase, "listening for wake phrase");

        let capture_result = tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("shutting down");
                self.transition(SupervisorState::ShuttingDown);
                close.close();
                (&mut done_rx).await
            }
            result = &mut done_rx => {
                self.transition(SupervisorState::ShuttingDown);
                result
            }
        };

        acceptor.shutdown().await;
        join_worker(worker).await;
        // The pipeline owned the last event sender, so the dispatcher drains
        // what is queued and exits.
        let _ = dispatcher.await;

        match capture_result {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                tracing::error!("capture stream failed: {e}");
                Err(e.into())
            }
            Err(_) => Err(SupervisorError::WorkerLost),
        }
    }

    fn interrupted(&self, stage: &str) {
        tracing::info!("shutdown requested while {stage}");
        self.transition(SupervisorState::ShuttingDown);
    }

    /// Check the model path, then build the engine on the blocking pool since
    /// model loads can take seconds.
    async fn load_recognizer(&self) -> Result<RecognizerAdapter, SupervisorError> {
        let model_path = self.config.asr.model_path.clone();
        if !model_path.exists() {
            return Err(SupervisorError::ModelNotFound(model_path));
        }

        let name = self.config.asr.engine.clone();
        tracing::info!(engine = %name, model_path = %model_path.display(), "loading model");
        let engines = self.engines.clone();
        let engine_config = EngineConfig {
            model_path,
            sample_rate: self.config.audio.sample_rate,
        };
        let engine = tokio::task::spawn_blocking(move || {
            engines.create(&name, &engine_config).inspect_err(|e| {
                if matches!(e, AsrError::EngineNotFound(_)) {
                    tracing::error!(
                        available = ?engines.list_engines(),
                        "unknown ASR engine (the vosk engine is only built with the `vosk` feature)"
                    );
                }
            })
        })
        .await
        .map_err(SupervisorError::LoadTask)??;
        Ok(RecognizerAdapter::new(engine))
    }
}

async fn join_worker(worker: std::thread::JoinHandle<()>) {
    if !matches!(tokio::task::spawn_blocking(move || worker.join()).await, Ok(Ok(()))) {
        tracing::warn!("capture thread panicked");
    }
}

fn capture_worker<S, F>(
    open_source: F,
    sample_rate: u32,
    block_size: u32,
    mut pipeline: Pipeline,
    ready: oneshot::Sender<Result<CloseHandle, AudioError>>,
    done: oneshot::Sender<Result<(), AudioError>>,
) where
    S: AudioSource + 'static,
    F: FnOnce(u32, u32) -> Result<S, AudioError>,
{
    let mut source = match open_source(sample_rate, block_size) {
        Ok(source) => source,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };
    if ready.send(Ok(source.close_handle())).is_err() {
        return;
    }

    let result = source.run(&mut |block| {
        pipeline.process_block(&block);
    });
    // Release the device before reporting back.
    drop(source);
    let _ = done.send(result);
}
