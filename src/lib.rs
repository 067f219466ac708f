//! Streaming intrusion and anomaly detection over a sampled activity signal.
//!
//! A [`DetectionLoop`] samples a [`SignalSource`] on a fixed tick, classifies
//! samples above the activity threshold into [`Intrusion`]s and runs a
//! mean + 2σ outlier test over the activity window. Results are reported to a
//! [`Presenter`].

pub mod algo;
pub mod classifier;
pub mod config;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod shell;
pub mod simulation;

pub use algo::{ActivityWindow, ScanFinding, SigmaDetector, WindowStats};
pub use classifier::{Classifier, Intrusion, IntrusionKind};
pub use config::{DetectorConfig, WindowPolicy};
pub use engine::{DetectionLoop, RunState};
pub use error::{IdsError, Result};
pub use shell::{ChannelPresenter, Dashboard, Presenter, ShellMessage};
pub use simulation::{SignalSource, UniformActivity};
