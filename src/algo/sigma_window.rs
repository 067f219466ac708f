use crate::config::WindowPolicy;
use std::collections::VecDeque;

/// Ordered samples the anomaly test runs over.
#[derive(Debug, Clone)]
pub struct ActivityWindow {
    samples: VecDeque<u8>,
    window_size: usize,
    policy: WindowPolicy,
}

impl ActivityWindow {
    pub fn new(window_size: usize, policy: WindowPolicy) -> Self {
        Self {
            samples: VecDeque::with_capacity(window_size),
            window_size: window_size.max(1),
            policy,
        }
    }

    pub fn push(&mut self, sample: u8) {
        self.samples.push_back(sample);
        if self.policy == WindowPolicy::Sliding {
            while self.samples.len() > self.window_size {
                self.samples.pop_front();
            }
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.samples.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.samples.iter().copied().collect()
    }
}

/// Population statistics of one scan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowStats {
    pub count: usize,
    pub mean: f64,
    pub variance: f64,
    pub std_dev: f64,
    pub threshold: f64,
}

/// A sample that exceeded the scan threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanFinding {
    /// Position within the window at scan time.
    pub index: usize,
    pub value: u8,
    pub threshold: f64,
}

impl ScanFinding {
    pub fn log_line(&self) -> String {
        format!(
            "Anomaly detected: Network activity level {} exceeds threshold.",
            self.value
        )
    }
}

/// Mean + k·sigma outlier test over the activity window.
pub struct SigmaDetector {
    window: ActivityWindow,
    sigma_multiplier: f64,
}

impl SigmaDetector {
    pub fn new(window_size: usize, policy: WindowPolicy, sigma_multiplier: f64) -> Self {
        Self {
            window: ActivityWindow::new(window_size, policy),
            sigma_multiplier,
        }
    }

    pub fn record(&mut self, sample: u8) {
        self.window.push(sample);
    }

    /// The first scan happens once the window holds `window_size` samples.
    pub fn is_ready(&self) -> bool {
        self.window.len() >= self.window.window_size()
    }

    pub fn window(&self) -> &ActivityWindow {
        &self.window
    }

    /// `None` on an empty window.
    pub fn stats(&self) -> Option<WindowStats> {
        let n = self.window.len();
        if n == 0 {
            return None;
        }

        let (sum, sum_sq) = self.window.iter().fold((0u64, 0u64), |(s, sq), x| {
            let x = x as u64;
            (s + x, sq + x * x)
        });

        let mean = sum as f64 / n as f64;
        // Population variance; rounding can leave a tiny negative on flat windows.
        let variance = (sum_sq as f64 / n as f64 - mean * mean).max(0.0);
        let std_dev = variance.sqrt();

        Some(WindowStats {
            count: n,
            mean,
            variance,
            std_dev,
            threshold: mean + self.sigma_multiplier * std_dev,
        })
    }

    /// Every retained sample strictly above the threshold, in window order.
    /// Read-only: the window is not resized.
    pub fn scan(&self) -> Vec<ScanFinding> {
        let Some(stats) = self.stats() else {
            return Vec::new();
        };

        self.window
            .iter()
            .enumerate()
            .filter(|(_, x)| *x as f64 > stats.threshold)
            .map(|(index, value)| ScanFinding {
                index,
                value,
                threshold: stats.threshold,
            })
            .collect()
    }
}
