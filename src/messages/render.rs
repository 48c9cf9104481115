//! Render state - data structure sent from App layer to UI for rendering

/// Where the subscribed resource stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadStatus {
    #[default]
    Loading,
    /// Loading again with a previous result still shown
    Refreshing,
    Ready,
    Failed,
}

impl LoadStatus {
    pub fn label(&self) -> &'static str {
        match self {
            LoadStatus::Loading => "Loading",
            LoadStatus::Refreshing => "Refreshing",
            LoadStatus::Ready => "Ready",
            LoadStatus::Failed => "Error",
        }
    }
}

/// Complete state needed by the UI to render
#[derive(Debug, Clone, Default)]
pub struct RenderState {
    // Request
    pub url: String,
    pub refresh_key: u64,
    pub is_favorite: bool,

    // Fetch state
    pub status: LoadStatus,
    pub error: Option<String>,
    /// Pretty-printed data of the last good fetch
    pub body: String,
    pub updated_at: Option<String>,

    // UI state
    pub scroll: u16,
    pub show_help: bool,
    pub notice: Option<String>,
}
