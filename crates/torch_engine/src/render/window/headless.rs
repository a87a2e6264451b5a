//! Window without an OS surface
//!
//! Events are scripted ahead of time, one batch per poll, which makes the main
//! loop reproducible in tests.

use std::any::Any;
use std::collections::VecDeque;

use crate::core::config::WindowSettings;
use crate::render::window::{WindowEvent, WindowResult, WindowSurface};

/// Scripted window
#[derive(Debug, Clone)]
pub struct HeadlessWindow {
    title: String,
    width: u32,
    height: u32,
    close_requested: bool,
    batches: VecDeque<Vec<WindowEvent>>,
    close_after: Option<u64>,
    presents: u64,
    polls: u64,
}

impl HeadlessWindow {
    /// Headless window with the given title and size
    pub fn new(title: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            title: title.into(),
            width,
            height,
            close_requested: false,
            batches: VecDeque::new(),
            close_after: None,
            presents: 0,
            polls: 0,
        }
    }

    /// Headless window matching the configured window
    pub fn from_settings(settings: &WindowSettings) -> Self {
        Self::new(settings.title.clone(), settings.width, settings.height)
    }

    /// Request close once `presents` frames were presented
    pub fn with_close_after(mut self, presents: u64) -> Self {
        self.close_after = Some(presents);
        self
    }

    /// Queue a batch of events, returned together by one future poll
    pub fn queue_events(&mut self, events: impl IntoIterator<Item = WindowEvent>) {
        self.batches.push_back(events.into_iter().collect());
    }

    /// Number of presented frames
    pub fn presents(&self) -> u64 {
        self.presents
    }

    /// Number of polls so far
    pub fn polls(&self) -> u64 {
        self.polls
    }
}

impl WindowSurface for HeadlessWindow {
    fn is_close_requested(&self) -> bool {
        self.close_requested
    }

    fn request_close(&mut self) {
        self.close_requested = true;
    }

    fn poll_events(&mut self) -> Vec<WindowEvent> {
        self.polls += 1;
        let events = self.batches.pop_front().unwrap_or_default();
        for event in &events {
            match *event {
                WindowEvent::CloseRequested => self.close_requested = true,
                WindowEvent::Resized { width, height } => {
                    self.width = width;
                    self.height = height;
                }
                _ => {}
            }
        }
        events
    }

    fn present(&mut self) -> WindowResult<()> {
        self.presents += 1;
        if self.close_after.is_some_and(|limit| self.presents >= limit) {
            self.close_requested = true;
        }
        Ok(())
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batches_are_polled_in_order() {
        let mut window = HeadlessWindow::new("Test", 640, 480);
        window.queue_events([WindowEvent::Char('a')]);
        window.queue_events([WindowEvent::Resized { width: 800, height: 600 }, WindowEvent::Char('b')]);

        assert_eq!(window.poll_events(), vec![WindowEvent::Char('a')]);
        assert_eq!(window.poll_events().len(), 2);
        assert_eq!(window.size(), (800, 600));
        assert!(window.poll_events().is_empty());
        assert_eq!(window.polls(), 3);
    }

    #[test]
    fn test_close_request_sources() {
        let mut window = HeadlessWindow::new("Test", 1, 1).with_close_after(2);
        window.present().unwrap();
        assert!(!window.is_close_requested());
        window.present().unwrap();
        assert!(window.is_close_requested());

        let mut window = HeadlessWindow::new("Test", 1, 1);
        window.queue_events([WindowEvent::CloseRequested]);
        window.poll_events();
        assert!(window.is_close_requested());
    }
}
