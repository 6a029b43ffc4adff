//! Background loading of the preferred speech engine
//!
//! The preferred engine may take a while to come up (or never come up), so
//! it is loaded on its own thread while the tutor starts. Until it is
//! ready, and for the rest of the session if loading failed, requests go to
//! the platform engine.

use crate::speech::synth::SpeechProvider;
use crate::Result;
use log::{debug, info, warn};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::thread;
use std::time::Duration;

type Loaded = Result<Box<dyn SpeechProvider>>;

/// State of the preferred engine
pub enum PremiumSlot {
    /// Not configured
    Disabled,
    /// Load still running
    Loading(Receiver<Loaded>),
    Ready(Box<dyn SpeechProvider>),
    /// Load failed; stays failed for the session
    Failed,
}

impl PremiumSlot {
    /// Start loading on a background thread
    pub fn spawn<F>(load: F) -> Self
    where
        F: FnOnce() -> Loaded + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = tx.send(load());
        });
        PremiumSlot::Loading(rx)
    }

    pub fn ready(provider: Box<dyn SpeechProvider>) -> Self {
        PremiumSlot::Ready(provider)
    }

    /// The engine, if it has finished loading
    ///
    /// Never blocks: a load still in progress counts as unavailable.
    pub fn get(&mut self) -> Option<&mut Box<dyn SpeechProvider>> {
        let polled = match self {
            PremiumSlot::Loading(rx) => match rx.try_recv() {
                Ok(loaded) => Some(Some(loaded)),
                Err(TryRecvError::Disconnected) => Some(None),
                Err(TryRecvError::Empty) => None,
            },
            _ => None,
        };
        if let Some(outcome) = polled {
            self.settle(outcome);
        }

        match self {
            PremiumSlot::Ready(provider) => Some(provider),
            _ => None,
        }
    }

    /// Block up to `timeout` for a load still in progress
    ///
    /// Returns whether the engine is ready afterwards.
    pub fn wait_loaded(&mut self, timeout: Duration) -> bool {
        let polled = match self {
            PremiumSlot::Loading(rx) => match rx.recv_timeout(timeout) {
                Ok(loaded) => Some(Some(loaded)),
                Err(RecvTimeoutError::Disconnected) => Some(None),
                Err(RecvTimeoutError::Timeout) => {
                    debug!("Speech engine still loading after {:?}", timeout);
                    None
                }
            },
            _ => None,
        };
        if let Some(outcome) = polled {
            self.settle(outcome);
        }

        matches!(self, PremiumSlot::Ready(_))
    }

    /// Record the loader's answer; `None` means the loader thread died
    fn settle(&mut self, outcome: Option<Loaded>) {
        match outcome {
            Some(Ok(provider)) => {
                info!("Preferred speech engine {} loaded", provider.name());
                *self = PremiumSlot::Ready(provider);
            }
            Some(Err(e)) => {
                warn!("{}; using platform speech for this session", e);
                *self = PremiumSlot::Failed;
            }
            None => {
                warn!("Speech engine loader exited without a result");
                *self = PremiumSlot::Failed;
            }
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, PremiumSlot::Loading(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, PremiumSlot::Failed)
    }
}
