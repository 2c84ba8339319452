// services/guard-dash/src/state.rs
//
// Dashboard state owned by the controller

use chrono::{DateTime, Local};
use std::collections::{HashSet, VecDeque};

use guardkit::ImageRecord;

const ACTIVITY_LOG_CAPACITY: usize = 100;

#[derive(Debug, Clone)]
pub struct DashboardState {
    // Connectivity
    pub connected: bool,
    pub loading: bool,
    pub demo_mode: bool,

    // Device
    pub door_locked: bool,
    /// Command sent over the push channel, waiting for a door-status push
    pub pending_door: Option<bool>,

    // Captures, in producer order
    pub images: VecDeque<ImageRecord>,

    // Gallery UI state
    pub selected: usize,
    pub expanded: Option<String>,
    pub unavailable: HashSet<String>,

    // Activity log
    pub activity_log: Vec<LogEntry>,
    /// Last user-facing notice (download refusals, command failures)
    pub notice: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub level: String,  // INFO, WARN, ERROR
    pub message: String,
}

impl DashboardState {
    pub fn new(demo_mode: bool) -> Self {
        Self {
            connected: true,
            loading: false,
            demo_mode,
            door_locked: true,
            pending_door: None,
            images: VecDeque::new(),
            selected: 0,
            expanded: None,
            unavailable: HashSet::new(),
            activity_log: Vec::new(),
            notice: None,
        }
    }

    pub fn add_log(&mut self, level: &str, message: &str) {
        self.activity_log.push(LogEntry {
            timestamp: Local::now(),
            level: level.to_string(),
            message: message.to_string(),
        });

        if self.activity_log.len() > ACTIVITY_LOG_CAPACITY {
            self.activity_log.remove(0);
        }
    }

    pub fn set_notice(&mut self, level: &str, message: &str) {
        self.add_log(level, message);
        self.notice = Some(message.to_string());
    }

    /// Bulk replacement from a fetch; server order is kept as-is.
    pub fn replace_images(&mut self, images: Vec<ImageRecord>) {
        self.images = images.into();
        self.unavailable.retain(|id| self.images.iter().any(|img| &img.id == id));
        if let Some(id) = &self.expanded {
            if !self.images.iter().any(|img| &img.id == id) {
                self.expanded = None;
            }
        }
        self.clamp_selection();
    }

    /// Newest-first insertion for pushed captures, evicting the oldest beyond `capacity`.
    pub fn push_image(&mut self, image: ImageRecord, capacity: usize) {
        self.images.push_front(image);
        if self.selected > 0 {
            // keep the cursor on the same card
            self.selected += 1;
        }
        while self.images.len() > capacity.max(1) {
            if let Some(evicted) = self.images.pop_back() {
                self.unavailable.remove(&evicted.id);
                if self.expanded.as_deref() == Some(evicted.id.as_str()) {
                    self.expanded = None;
                }
            }
        }
        self.clamp_selection();
    }

    /// Expand `id`, or collapse it if it is already the expanded card.
    pub fn toggle_expanded(&mut self, id: &str) {
        if self.expanded.as_deref() == Some(id) {
            self.expanded = None;
        } else {
            self.expanded = Some(id.to_string());
        }
    }

    pub fn collapse(&mut self) {
        self.expanded = None;
    }

    pub fn expanded_image(&self) -> Option<&ImageRecord> {
        let id = self.expanded.as_deref()?;
        self.images.iter().find(|img| img.id == id)
    }

    pub fn selected_image(&self) -> Option<&ImageRecord> {
        self.images.get(self.selected)
    }

    pub fn select_prev(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
        }
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.images.len() {
            self.selected += 1;
        }
    }

    fn clamp_selection(&mut self) {
        if self.images.is_empty() {
            self.selected = 0;
        } else if self.selected >= self.images.len() {
            self.selected = self.images.len() - 1;
        }
    }

    pub fn image_count_label(&self) -> String {
        let n = self.images.len();
        format!("{} {}", n, if n == 1 { "image" } else { "images" })
    }
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> ImageRecord {
        ImageRecord {
            id: id.to_string(),
            image_data: format!("http://door.local/uploads/{}.jpg", id),
            timestamp: "2024-05-01T10:00:00Z".to_string(),
            name: None,
        }
    }

    #[test]
    fn test_expand_same_id_collapses() {
        let mut state = DashboardState::default();
        state.toggle_expanded("2");
        assert_eq!(state.expanded.as_deref(), Some("2"));
        state.toggle_expanded("2");
        assert_eq!(state.expanded, None);
    }

    #[test]
    fn test_expand_other_id_switches() {
        let mut state = DashboardState::default();
        state.toggle_expanded("2");
        state.toggle_expanded("3");
        assert_eq!(state.expanded.as_deref(), Some("3"));
    }

    #[test]
    fn test_push_prepends_and_evicts_oldest() {
        let mut state = DashboardState::default();
        for id in ["a", "b", "c", "d"] {
            state.push_image(record(id), 3);
        }
        let ids: Vec<&str> = state.images.iter().map(|img| img.id.as_str()).collect();
        assert_eq!(ids, vec!["d", "c", "b"]);
    }

    #[test]
    fn test_eviction_collapses_expanded() {
        let mut state = DashboardState::default();
        state.push_image(record("a"), 2);
        state.toggle_expanded("a");
        state.push_image(record("b"), 2);
        assert_eq!(state.expanded.as_deref(), Some("a"));
        state.push_image(record("c"), 2);
        assert_eq!(state.expanded, None);
    }

    #[test]
    fn test_replace_keeps_server_order_and_clamps_selection() {
        let mut state = DashboardState::default();
        state.replace_images(vec![record("x"), record("y"), record("z")]);
        state.selected = 2;
        state.replace_images(vec![record("q")]);
        assert_eq!(state.images[0].id, "q");
        assert_eq!(state.selected, 0);
    }

    #[test]
    fn test_activity_log_bounded() {
        let mut state = DashboardState::default();
        for i in 0..150 {
            state.add_log("INFO", &format!("event {}", i));
        }
        assert_eq!(state.activity_log.len(), 100);
        assert_eq!(state.activity_log[0].message, "event 50");
    }

    #[test]
    fn test_count_label() {
        let mut state = DashboardState::default();
        state.replace_images(vec![record("a")]);
        assert_eq!(state.image_count_label(), "1 image");
        state.replace_images(vec![record("a"), record("b")]);
        assert_eq!(state.image_count_label(), "2 images");
    }
}
