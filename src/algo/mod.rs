pub mod sigma_window;

pub use sigma_window::{ActivityWindow, ScanFinding, SigmaDetector, WindowStats};
