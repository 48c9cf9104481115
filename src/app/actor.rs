//! App actor - message loop processing UI events and fetch state changes

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;

use crate::app::state::ViewerState;
use crate::constants::FAVORITE_URLS_KEY;
use crate::loader::Subscription;
use crate::messages::{RenderState, UiEvent};
use crate::models::ResourceRequest;
use crate::storage::{Favorites, KeyValueStore};

/// App actor that owns the viewer's subscription
pub struct AppActor {
    state: ViewerState,
    subscription: Subscription<Value>,
    store: Arc<dyn KeyValueStore>,
    render_tx: mpsc::UnboundedSender<RenderState>,
}

impl AppActor {
    pub fn new(
        request: ResourceRequest,
        subscription: Subscription<Value>,
        store: Arc<dyn KeyValueStore>,
        render_tx: mpsc::UnboundedSender<RenderState>,
    ) -> Self {
        let is_favorite = Favorites::with_key(store.as_ref(), FAVORITE_URLS_KEY)
            .contains(&request.url)
            .unwrap_or(false);

        AppActor {
            state: ViewerState::new(request, is_favorite),
            subscription,
            store,
            render_tx,
        }
    }

    /// Run the actor message loop until quit or the UI goes away
    pub async fn run(mut self, mut ui_rx: mpsc::UnboundedReceiver<UiEvent>) {
        let fetch = self.subscription.subscribe(self.state.request.clone());
        self.state.apply(&fetch);
        self.render();

        loop {
            tokio::select! {
                event = ui_rx.recv() => {
                    match event {
                        Some(UiEvent::Quit) | None => break,
                        Some(event) => self.handle_ui_event(event),
                    }
                    self.render();
                }
                fetch = self.subscription.changed() => {
                    self.state.apply(&fetch);
                    self.render();
                }
            }
        }
    }

    fn render(&self) {
        let fetch = self.subscription.state();
        let _ = self.render_tx.send(self.state.to_render_state(&fetch));
    }

    fn handle_ui_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::Refresh => {
                self.subscription.refresh();
                if let Some(request) = self.subscription.request() {
                    self.state.request = request.clone();
                }
                self.state.notice = None;
            }
            UiEvent::ToggleFavorite => self.toggle_favorite(),
            UiEvent::ScrollUp => self.state.scroll_up(),
            UiEvent::ScrollDown => self.state.scroll_down(),
            UiEvent::ToggleHelp => self.state.toggle_help(),
            UiEvent::CloseHelp => self.state.close_help(),
            UiEvent::Quit => {}
        }
    }

    fn toggle_favorite(&mut self) {
        let favorites = Favorites::with_key(self.store.as_ref(), FAVORITE_URLS_KEY);
        match favorites.toggle(self.state.request.url.clone()) {
            Ok(now_favorite) => {
                self.state.is_favorite = now_favorite;
                self.state.set_notice(if now_favorite {
                    "Added to favorites"
                } else {
                    "Removed from favorites"
                });
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to update favorites");
                self.state.set_notice(format!("Could not save favorite: {}", e));
            }
        }
    }
}
