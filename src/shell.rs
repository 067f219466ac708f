//! Presentation shell collaborators.
//!
//! The detection loop never touches a UI directly. It reports through a
//! [`Presenter`]: text lines for the log, intrusions for the event history
//! and raw samples for the activity chart. Two implementations live here:
//!
//! - [`Dashboard`]: lock-guarded in-memory store, readable from any thread.
//! - [`ChannelPresenter`]: hands every call to the foreground as a
//!   [`ShellMessage`] over a crossbeam channel.

use crate::classifier::Intrusion;
use crossbeam_channel::{Receiver, Sender, unbounded};
use parking_lot::Mutex;

pub const HISTORY_HEADER: &str = "Attack History:";

/// Left/right/top/bottom margin of the chart area, in pixels.
pub const CHART_MARGIN: i32 = 50;

pub trait Presenter: Send + Sync {
    fn log(&self, line: &str);
    fn record_event(&self, intrusion: &Intrusion);
    fn record_sample(&self, value: u8);
}

// --- Message hand-off ---

#[derive(Debug, Clone, PartialEq)]
pub enum ShellMessage {
    Log(String),
    Event(Intrusion),
    Sample(u8),
}

pub struct ChannelPresenter {
    tx: Sender<ShellMessage>,
}

impl ChannelPresenter {
    pub fn new() -> (Self, Receiver<ShellMessage>) {
        let (tx, rx) = unbounded();
        (Self { tx }, rx)
    }
}

impl Presenter for ChannelPresenter {
    // A dropped receiver means the shell is gone; nothing left to report to.
    fn log(&self, line: &str) {
        let _ = self.tx.send(ShellMessage::Log(line.to_string()));
    }

    fn record_event(&self, intrusion: &Intrusion) {
        let _ = self.tx.send(ShellMessage::Event(intrusion.clone()));
    }

    fn record_sample(&self, value: u8) {
        let _ = self.tx.send(ShellMessage::Sample(value));
    }
}

// --- In-memory dashboard ---

#[derive(Default)]
struct DashboardState {
    log: Vec<String>,
    history: Vec<Intrusion>,
    samples: Vec<u8>,
}

/// Log pane, attack history and chart series of the monitor.
#[derive(Default)]
pub struct Dashboard {
    state: Mutex<DashboardState>,
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replay a message received from a [`ChannelPresenter`].
    pub fn apply(&self, message: ShellMessage) {
        match message {
            ShellMessage::Log(line) => self.log(&line),
            ShellMessage::Event(intrusion) => self.state.lock().history.push(intrusion),
            ShellMessage::Sample(value) => self.record_sample(value),
        }
    }

    pub fn log_lines(&self) -> Vec<String> {
        self.state.lock().log.clone()
    }

    pub fn history(&self) -> Vec<Intrusion> {
        self.state.lock().history.clone()
    }

    /// One line per recorded intrusion, in detection order.
    pub fn history_lines(&self) -> Vec<String> {
        self.state.lock().history.iter().map(Intrusion::history_line).collect()
    }

    /// Append the attack history to the log pane and return what was appended.
    pub fn display_history(&self) -> Vec<String> {
        let mut state = self.state.lock();
        let mut dump = Vec::with_capacity(state.history.len() + 1);
        dump.push(HISTORY_HEADER.to_string());
        dump.extend(state.history.iter().map(Intrusion::history_line));
        state.log.extend(dump.iter().cloned());
        dump
    }

    pub fn history_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.state.lock().history)
    }

    pub fn samples(&self) -> Vec<u8> {
        self.state.lock().samples.clone()
    }

    /// Pixel positions of the plotted series for a `width` x `height` panel.
    /// x spreads sample indices over the area between the margins; y is the raw
    /// value measured up from the bottom margin.
    pub fn chart_points(&self, width: i32, height: i32) -> Vec<(i32, i32)> {
        chart_points(&self.state.lock().samples, width, height)
    }
}

impl Presenter for Dashboard {
    fn log(&self, line: &str) {
        self.state.lock().log.push(line.to_string());
    }

    fn record_event(&self, intrusion: &Intrusion) {
        self.state.lock().history.push(intrusion.clone());
    }

    fn record_sample(&self, value: u8) {
        self.state.lock().samples.push(value);
    }
}

pub fn chart_points(samples: &[u8], width: i32, height: i32) -> Vec<(i32, i32)> {
    let usable = i128::from(width.saturating_sub(2 * CHART_MARGIN));
    let baseline = height.saturating_sub(CHART_MARGIN);
    // Widened so long growing series cannot overflow the index product.
    let steps = samples.len().saturating_sub(1).max(1) as i128;

    samples
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let offset = i as i128 * usable / steps;
            let x = i32::try_from(i128::from(CHART_MARGIN) + offset)
                .unwrap_or(if offset < 0 { i32::MIN } else { i32::MAX });
            (x, baseline.saturating_sub(i32::from(*v)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::IntrusionKind;
    use chrono::Local;

    fn intrusion(kind: IntrusionKind) -> Intrusion {
        Intrusion::new(kind, Local::now())
    }

    #[test]
    fn test_history_dump_has_one_line_per_detection() {
        let dashboard = Dashboard::new();
        let kinds = [
            IntrusionKind::DDoS,
            IntrusionKind::MalwareInfection,
            IntrusionKind::BruteForce,
        ];
        for kind in kinds {
            dashboard.record_event(&intrusion(kind));
        }

        let lines = dashboard.history_lines();
        assert_eq!(lines.len(), 3);
        for (line, kind) in lines.iter().zip(kinds) {
            assert!(line.starts_with(&format!("Type: {}, Severity: {}", kind, kind.severity())));
        }
    }

    #[test]
    fn test_display_history_appends_header_and_lines_to_log() {
        let dashboard = Dashboard::new();
        dashboard.log("INTRUDER DETECTION SYSTEM STARTED");
        dashboard.record_event(&intrusion(IntrusionKind::BruteForce));

        let dump = dashboard.display_history();
        assert_eq!(dump.len(), 2);
        assert_eq!(dump[0], HISTORY_HEADER);

        let log = dashboard.log_lines();
        assert_eq!(log.len(), 3);
        assert_eq!(log[1], HISTORY_HEADER);
        assert_eq!(
            log[2],
            "Type: Brute Force Attack, Severity: 2, Remedy: Block the source IP address and implement account lockout policies."
        );
    }

    #[test]
    fn test_empty_history_dump_is_just_the_header() {
        let dashboard = Dashboard::new();
        assert!(dashboard.history_lines().is_empty());
        assert_eq!(dashboard.display_history(), vec![HISTORY_HEADER.to_string()]);
    }

    #[test]
    fn test_channel_messages_arrive_in_order() {
        let (presenter, rx) = ChannelPresenter::new();
        presenter.log("Current Traffic: 88");
        presenter.record_sample(88);
        presenter.record_event(&intrusion(IntrusionKind::DDoS));

        let dashboard = Dashboard::new();
        let received: Vec<ShellMessage> = rx.try_iter().collect();
        assert_eq!(received.len(), 3);
        assert_eq!(received[0], ShellMessage::Log("Current Traffic: 88".into()));
        assert_eq!(received[1], ShellMessage::Sample(88));

        for msg in received {
            dashboard.apply(msg);
        }
        assert_eq!(dashboard.samples(), vec![88]);
        assert_eq!(dashboard.history().len(), 1);
        assert_eq!(dashboard.log_lines(), vec!["Current Traffic: 88".to_string()]);
    }

    #[test]
    fn test_send_after_receiver_dropped_is_silent() {
        let (presenter, rx) = ChannelPresenter::new();
        drop(rx);
        presenter.log("nobody listening");
        presenter.record_sample(1);
    }

    #[test]
    fn test_chart_points_mapping() {
        let points = chart_points(&[0, 50, 99], 500, 300);
        assert_eq!(points, vec![(50, 250), (250, 200), (450, 151)]);
    }

    #[test]
    fn test_chart_points_single_sample() {
        assert_eq!(chart_points(&[10], 500, 300), vec![(50, 240)]);
        assert!(chart_points(&[], 500, 300).is_empty());
    }

    #[test]
    fn test_chart_points_long_series_does_not_overflow() {
        let samples = vec![99u8; 3_000_000];
        let points = chart_points(&samples, 800, 300);
        assert_eq!(points.len(), samples.len());
        assert_eq!(points[0], (50, 151));
        assert_eq!(points[samples.len() - 1], (750, 151));
        assert!(points.windows(2).all(|w| w[0].0 <= w[1].0));
    }

    #[test]
    fn test_history_json() {
        let dashboard = Dashboard::new();
        dashboard.record_event(&intrusion(IntrusionKind::MalwareInfection));
        let raw = dashboard.history_json().unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json.as_array().unwrap().len(), 1);
        assert_eq!(json[0]["kind"], "Malware Infection");
    }
}
