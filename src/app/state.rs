//! Viewer state - pure data structure with no I/O logic

use serde_json::Value;

use crate::messages::render::{LoadStatus, RenderState};
use crate::models::{FetchState, ResourceRequest};

/// What the viewer shows besides the fetch state itself
#[derive(Debug, Clone, Default)]
pub struct ViewerState {
    pub request: ResourceRequest,
    pub scroll: u16,
    pub show_help: bool,
    pub is_favorite: bool,
    pub notice: Option<String>,
    /// Pretty-printed body, rebuilt only when the data changes
    body: String,
    rendered_data: Option<Value>,
}

impl ViewerState {
    pub fn new(request: ResourceRequest, is_favorite: bool) -> Self {
        ViewerState {
            request,
            is_favorite,
            ..Default::default()
        }
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        let max = u16::try_from(self.body.lines().count().saturating_sub(1)).unwrap_or(u16::MAX);
        self.scroll = self.scroll.saturating_add(1).min(max);
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn close_help(&mut self) {
        self.show_help = false;
    }

    pub fn set_notice(&mut self, notice: impl Into<String>) {
        self.notice = Some(notice.into());
    }

    /// Pick up a new fetch state
    pub fn apply(&mut self, fetch: &FetchState<Value>) {
        if fetch.data != self.rendered_data {
            self.body = match &fetch.data {
                Some(data) => serde_json::to_string_pretty(data).unwrap_or_else(|_| data.to_string()),
                None => String::new(),
            };
            self.rendered_data = fetch.data.clone();
            self.scroll = 0;
        }
    }

    /// Convert state to RenderState for UI
    pub fn to_render_state(&self, fetch: &FetchState<Value>) -> RenderState {
        let status = match (fetch.loading, &fetch.error, &fetch.data) {
            (true, _, None) => LoadStatus::Loading,
            (true, _, Some(_)) => LoadStatus::Refreshing,
            (false, Some(_), _) => LoadStatus::Failed,
            (false, None, _) => LoadStatus::Ready,
        };

        RenderState {
            url: self.request.url.clone(),
            refresh_key: self.request.refresh_key,
            is_favorite: self.is_favorite,
            status,
            error: fetch.error.as_ref().map(ToString::to_string),
            body: self.body.clone(),
            updated_at: fetch
                .updated_at
                .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
            scroll: self.scroll,
            show_help: self.show_help,
            notice: self.notice.clone(),
        }
    }
}
