//! The star map context: scene, pointer, tooltip, chat and in-flight
//! requests, owned by one value and driven from the frame loop.

use std::sync::{Arc, MutexGuard};

use log::{info, warn};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::client::chat::{ChatClient, ChatSession, Transcript};
use crate::client::stars::StarClient;
use crate::client::transport::Transport;
use crate::client::ClientError;
use crate::config::MapConfig;
use crate::data::{PlanetRecord, StarPayload};
use crate::hover::detector::{Hover, HoverDetector, PointerState, Tooltip};
use crate::scene::scene::{Renderer, StarScene};
use crate::tasks::{RequestPurpose, TaskRegistry, Ticket};

/// A message for the user, shown as an alert by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Input was rejected before any request was made.
    Validation(String),
    /// A request failed.
    Error(String),
}

enum AppEvent {
    Stars {
        ticket: Ticket<RequestPurpose>,
        result: Result<StarPayload, ClientError>,
    },
    ChatSettled(Result<String, ClientError>),
}

pub struct StarMapApp<R: Renderer, T> {
    scene: StarScene<R>,
    stars: Arc<StarClient<T>>,
    chat: Arc<ChatSession<T>>,
    detector: HoverDetector,
    pointer: PointerState,
    hover: Option<Hover>,
    tooltip: Tooltip,
    planets: Vec<PlanetRecord>,
    tasks: TaskRegistry<RequestPurpose>,
    chats_in_flight: usize,
    events_tx: UnboundedSender<AppEvent>,
    events_rx: UnboundedReceiver<AppEvent>,
    notices: Vec<Notice>,
}

impl<R, T> StarMapApp<R, T>
where
    R: Renderer,
    T: Transport + Clone + 'static,
{
    pub fn new(renderer: R, transport: T, config: &MapConfig, width: u32, height: u32) -> Self {
        let scene = StarScene::new(renderer, &config.camera, config.star_radius, width, height);
        let stars = StarClient::new(
            transport.clone(),
            config.backend_url.clone(),
            config.decode.clone(),
        );
        let chat = ChatSession::new(ChatClient::new(transport, config.backend_url.clone()));
        let (events_tx, events_rx) = unbounded_channel();
        StarMapApp {
            scene,
            stars: Arc::new(stars),
            chat: Arc::new(chat),
            detector: HoverDetector,
            pointer: PointerState::default(),
            hover: None,
            tooltip: Tooltip::default(),
            planets: Vec::new(),
            tasks: TaskRegistry::new(),
            chats_in_flight: 0,
            events_tx,
            events_rx,
            notices: Vec::new(),
        }
    }

    pub fn scene(&self) -> &StarScene<R> {
        &self.scene
    }

    pub fn tooltip(&self) -> &Tooltip {
        &self.tooltip
    }

    pub fn hover(&self) -> Option<&Hover> {
        self.hover.as_ref()
    }

    pub fn planets(&self) -> &[PlanetRecord] {
        &self.planets
    }

    pub fn transcript(&self) -> MutexGuard<'_, Transcript> {
        self.chat.transcript()
    }

    /// Drains pending user-facing notices.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Whether a star fetch or chat message is still awaiting its result.
    pub fn is_busy(&self) -> bool {
        self.tasks.in_flight(RequestPurpose::StarFetch) || self.chats_in_flight > 0
    }

    pub fn on_pointer_move(&mut self, client_x: f64, client_y: f64) {
        let (width, height) = self.scene.viewport();
        self.pointer = PointerState::from_client(client_x, client_y, width, height);
    }

    pub fn on_resize(&mut self, width: u32, height: u32) {
        self.scene.resize(width, height);
    }

    /// Starts fetching the stars around `planet_name`, superseding any fetch
    /// still in flight. Blank names produce a validation notice instead.
    pub fn request_stars(&mut self, planet_name: &str) -> Option<Ticket<RequestPurpose>> {
        let planet = planet_name.trim().to_string();
        if planet.is_empty() {
            self.notices
                .push(Notice::Validation("Please enter a planet name!".to_string()));
            return None;
        }
        let client = Arc::clone(&self.stars);
        let events = self.events_tx.clone();
        let ticket = self.tasks.spawn(RequestPurpose::StarFetch, move |ticket| async move {
            let result = client.fetch_payload(&planet).await;
            // the receiver lives as long as the app; a send error means teardown
            let _ = events.send(AppEvent::Stars { ticket, result });
        });
        Some(ticket)
    }

    /// Records the user's line immediately and relays the message in the
    /// background. Messages never supersede each other. Returns whether a
    /// request was issued.
    pub fn send_chat(&mut self, text: &str) -> bool {
        let message = match self.chat.record_user_line(text) {
            Ok(message) => message,
            Err(_) => {
                self.notices
                    .push(Notice::Validation("Please enter a message!".to_string()));
                return false;
            }
        };
        let chat = Arc::clone(&self.chat);
        let events = self.events_tx.clone();
        self.chats_in_flight += 1;
        self.tasks.track(RequestPurpose::Chat, async move {
            let result = chat.relay(&message).await;
            let _ = events.send(AppEvent::ChatSettled(result));
        });
        true
    }

    /// Abandons every outstanding star fetch and chat message. Results
    /// already queued for the next tick are dropped as well.
    pub fn shutdown(&mut self) {
        self.tasks.cancel_all();
        self.chats_in_flight = 0;
        while self.events_rx.try_recv().is_ok() {}
    }

    /// One frame: apply finished requests, render, then update hover state.
    pub fn tick(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply(event);
        }
        self.scene.render();
        self.hover = self.detector.detect(&self.scene, self.pointer);
        self.tooltip
            .update(self.hover.as_ref(), self.pointer, self.scene.viewport());
    }

    fn apply(&mut self, event: AppEvent) {
        match event {
            AppEvent::Stars { ticket, result } => {
                if !self.tasks.settle(&ticket) {
                    warn!("discarding stale star fetch (generation {})", ticket.generation);
                    return;
                }
                match result {
                    // the old star set is only replaced once the new one is valid
                    Ok(payload) => {
                        self.scene.replace_stars(&payload.stars);
                        self.planets = payload.planets;
                        info!("rendering {} stars", self.scene.len());
                    }
                    Err(e) => self
                        .notices
                        .push(Notice::Error(format!("Error fetching star data: {e}"))),
                }
            }
            AppEvent::ChatSettled(result) => {
                self.chats_in_flight = self.chats_in_flight.saturating_sub(1);
                if let Err(e) = result {
                    self.notices.push(Notice::Error(format!(
                        "Error communicating with chatbot: {e}"
                    )));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::stars::tests::CannedTransport;
    use crate::client::transport::HttpReply;
    use crate::scene::scene::HeadlessRenderer;
    use serde_json::Value;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    const THREE_STARS: &str = r#"{"stars":[
        {"source_id":"1","ra":0.0,"dec":0.0,"magnitude":5.0},
        {"source_id":"2","ra":90.0,"dec":0.0,"magnitude":0.0},
        {"ra":180.0,"dec":45.0}
    ]}"#;

    fn app<T: Transport + Clone + 'static>(transport: T) -> StarMapApp<HeadlessRenderer, T> {
        StarMapApp::new(HeadlessRenderer::default(), transport, &MapConfig::default(), 800, 600)
    }

    async fn run_until_idle<T: Transport + Clone + 'static>(app: &mut StarMapApp<HeadlessRenderer, T>) {
        for _ in 0..200 {
            app.tick();
            if !app.is_busy() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("requests did not settle");
    }

    #[tokio::test]
    async fn successful_fetch_renders_every_star() {
        let mut app = app(CannedTransport::ok(THREE_STARS));
        app.request_stars("Mars").unwrap();
        run_until_idle(&mut app).await;

        let stars = app.scene().stars();
        assert_eq!(stars.len(), 3);
        assert_eq!(stars[0].position, [1.0, 0.0, 0.0]);
        assert_eq!(stars[2].label, "ID: Unknown, Mag: 100");
        assert!(app.take_notices().is_empty());
    }

    #[tokio::test]
    async fn blank_planet_is_rejected_without_a_request() {
        let transport = CannedTransport::ok(THREE_STARS);
        let mut app = app(transport.clone());
        assert!(app.request_stars("  ").is_none());
        assert_eq!(
            app.take_notices(),
            vec![Notice::Validation("Please enter a planet name!".into())]
        );
        run_until_idle(&mut app).await;
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_star_list_fails_and_leaves_scene_empty() {
        let mut app = app(CannedTransport::ok(r#"{"stars":[]}"#));
        app.request_stars("Mars").unwrap();
        run_until_idle(&mut app).await;
        assert!(app.scene().is_empty());
        let notices = app.take_notices();
        assert!(matches!(notices.as_slice(), [Notice::Error(msg)] if msg.contains("no stars")));
    }

    /// Answers per planet name, optionally after a delay.
    #[derive(Clone, Default)]
    struct RoutedTransport {
        routes: Arc<HashMap<String, (u64, u16, String)>>,
    }

    impl RoutedTransport {
        fn new(routes: &[(&str, u64, u16, &str)]) -> Self {
            RoutedTransport {
                routes: Arc::new(
                    routes
                        .iter()
                        .map(|(path, delay, status, body)| {
                            (path.to_string(), (*delay, *status, body.to_string()))
                        })
                        .collect(),
                ),
            }
        }
    }

    impl Transport for RoutedTransport {
        async fn get(&self, url: &str) -> Result<HttpReply, ClientError> {
            let path = url.rsplit('/').next().unwrap_or_default().to_string();
            let Some((delay, status, body)) = self.routes.get(&path).cloned() else {
                return Err(ClientError::Status { status: 404, reason: "Not Found".into() });
            };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok(HttpReply { status, status_text: "routed".into(), body })
        }

        async fn post_json(&self, _url: &str, _body: &Value) -> Result<HttpReply, ClientError> {
            Err(ClientError::Status { status: 405, reason: "Method Not Allowed".into() })
        }
    }

    #[tokio::test]
    async fn failed_fetch_keeps_previous_stars() {
        let transport = RoutedTransport::new(&[
            ("Mars", 0, 200, THREE_STARS),
            ("Pluto", 0, 500, "{}"),
        ]);
        let mut app = app(transport);
        app.request_stars("Mars").unwrap();
        run_until_idle(&mut app).await;
        assert_eq!(app.scene().len(), 3);

        app.request_stars("Pluto").unwrap();
        run_until_idle(&mut app).await;
        assert_eq!(app.scene().len(), 3);
        assert_eq!(app.take_notices().len(), 1);
    }

    #[tokio::test]
    async fn later_request_supersedes_slow_earlier_one() {
        let one_star = r#"{"stars":[{"source_id":"v","ra":10.0,"dec":10.0,"magnitude":6.0}]}"#;
        let transport = RoutedTransport::new(&[
            ("Mars", 150, 200, THREE_STARS),
            ("Venus", 0, 200, one_star),
        ]);
        let mut app = app(transport);
        app.request_stars("Mars").unwrap();
        app.request_stars("Venus").unwrap();
        run_until_idle(&mut app).await;
        tokio::time::sleep(Duration::from_millis(300)).await;
        app.tick();

        assert_eq!(app.scene().len(), 1);
        assert_eq!(app.scene().stars()[0].label, "ID: v, Mag: 6");
    }

    #[tokio::test]
    async fn stale_results_are_discarded_even_if_delivered() {
        let mut app = app(CannedTransport::ok(THREE_STARS));
        let stale = app.request_stars("Mars").unwrap();
        let current = app.request_stars("Mars").unwrap();
        assert_ne!(stale, current);

        let payload = crate::data::decode_star_payload(THREE_STARS, &Default::default()).unwrap();
        app.events_tx
            .send(AppEvent::Stars { ticket: stale, result: Ok(payload) })
            .ok();
        app.tick();
        // the superseded payload did not land and the current request is untouched
        assert!(app.scene().is_empty());
        assert!(app.tasks.is_current(&current));
        run_until_idle(&mut app).await;
        assert_eq!(app.scene().len(), 3);
    }

    #[tokio::test]
    async fn hover_drives_tooltip() {
        let mut app = app_with_star_at([20.0, -10.0, 0.0], "ID: 42, Mag: 7");
        let ndc = app.scene().camera().project(glam::Vec3::new(20.0, -10.0, 0.0)).unwrap();
        let x = (f64::from(ndc.x) + 1.0) * 800.0 / 2.0;
        let y = (1.0 - f64::from(ndc.y)) * 600.0 / 2.0;
        app.on_pointer_move(x, y);
        app.tick();
        assert!(app.tooltip().visible);
        assert_eq!(app.tooltip().text, "Star: ID: 42, Mag: 7");
        assert_eq!(app.hover().map(|h| h.index), Some(0));

        app.on_pointer_move(5.0, 5.0);
        app.tick();
        assert!(!app.tooltip().visible);
        assert!(app.hover().is_none());
    }

    fn app_with_star_at(position: [f32; 3], label: &str) -> StarMapApp<HeadlessRenderer, CannedTransport> {
        let mut app = app(CannedTransport::default());
        app.scene.add_star(position, label);
        app
    }

    #[tokio::test]
    async fn resize_reaches_camera_and_renderer() {
        let mut app = app(CannedTransport::default());
        app.on_resize(1200, 400);
        app.tick();
        assert_eq!(app.scene().camera().aspect, 3.0);
        assert_eq!(app.scene().renderer().size, (1200, 400));
        assert_eq!(app.scene().renderer().frames, 1);
    }

    #[tokio::test]
    async fn chat_line_is_visible_before_reply_and_after_failure() {
        let mut app = app(CannedTransport::with_status(500, "{}"));
        assert!(app.send_chat("hi"));
        assert_eq!(app.transcript().lines(), ["You: hi"]);
        run_until_idle(&mut app).await;
        assert_eq!(app.transcript().lines(), ["You: hi"]);
        assert!(matches!(app.take_notices().as_slice(), [Notice::Error(_)]));
    }

    /// Holds every chat reply back until the gate opens.
    #[derive(Clone, Default)]
    struct GatedChat {
        gate: Arc<tokio::sync::Notify>,
        answered: Arc<AtomicBool>,
    }

    impl Transport for GatedChat {
        async fn get(&self, _url: &str) -> Result<HttpReply, ClientError> {
            Err(ClientError::Status { status: 404, reason: "Not Found".into() })
        }

        async fn post_json(&self, _url: &str, _body: &Value) -> Result<HttpReply, ClientError> {
            self.gate.notified().await;
            self.answered.store(true, Ordering::SeqCst);
            Ok(HttpReply { status: 200, status_text: "OK".into(), body: r#"{"reply":"late"}"#.into() })
        }
    }

    #[tokio::test]
    async fn dropping_the_app_aborts_chat_in_flight() {
        let transport = GatedChat::default();
        let mut app = app(transport.clone());
        assert!(app.send_chat("hi"));
        // let the request reach the gate
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(app.is_busy());

        drop(app);
        transport.gate.notify_waiters();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!transport.answered.load(Ordering::SeqCst));
        assert_eq!(Arc::strong_count(&transport.gate), 1);
    }

    #[tokio::test]
    async fn shutdown_abandons_star_fetch_and_chat() {
        let transport = GatedChat::default();
        let mut app = app(transport.clone());
        app.request_stars("Mars").unwrap();
        assert!(app.send_chat("hi"));
        tokio::time::sleep(Duration::from_millis(10)).await;
        app.shutdown();
        assert!(!app.is_busy());

        transport.gate.notify_waiters();
        tokio::time::sleep(Duration::from_millis(50)).await;
        app.tick();
        assert!(!transport.answered.load(Ordering::SeqCst));
        assert_eq!(app.transcript().lines(), ["You: hi"]);
        assert!(app.take_notices().is_empty());
    }

    #[tokio::test]
    async fn chat_reply_is_appended() {
        let mut app = app(CannedTransport::ok(r#"{"reply":"Kepler-22 b orbits a G-type star."}"#));
        assert!(!app.send_chat(""));
        assert!(app.send_chat("tell me about Kepler-22 b"));
        run_until_idle(&mut app).await;
        assert_eq!(
            app.transcript().lines(),
            [
                "You: tell me about Kepler-22 b",
                "Chatbot: Kepler-22 b orbits a G-type star."
            ]
        );
        assert_eq!(
            app.take_notices(),
            vec![Notice::Validation("Please enter a message!".into())]
        );
    }
}
