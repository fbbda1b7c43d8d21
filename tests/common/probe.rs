//! Socket probes
//!
//! A probe stands in for a WebSocket client: it is admitted through the
//! registry with a real token and reads frames straight from the
//! connection's outbound queue.

use std::time::Duration;

use collabhub::backend::realtime::ConnectionId;
use collabhub::shared::{ClientCommand, Identity, ServerEvent, SocketFrame};
use tokio::sync::mpsc;
use tokio::time::timeout;

use super::fixtures::{mint_token, TestApp};

const WAIT: Duration = Duration::from_millis(500);

pub struct SocketProbe {
    pub id: ConnectionId,
    pub identity: Identity,
    rx: mpsc::Receiver<SocketFrame>,
}

impl SocketProbe {
    /// Connect as `identity` and consume the `connected` acknowledgement
    pub async fn connect(app: &TestApp, identity: &Identity) -> Self {
        let (tx, mut rx) = mpsc::channel(64);
        let connection = app
            .state
            .registry
            .admit(&mint_token(identity), tx)
            .await
            .unwrap();

        let ack = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
        assert!(ack.is(ServerEvent::Connected), "expected connected, got {:?}", ack);

        Self {
            id: connection.id,
            identity: connection.identity,
            rx,
        }
    }

    /// Send a raw text frame through the dispatcher
    pub async fn send_text(&self, app: &TestApp, text: &str) {
        app.state.dispatcher.handle_text(self.id, text).await;
    }

    /// Send a command through the dispatcher
    pub async fn send(&self, app: &TestApp, command: ClientCommand) {
        let text = serde_json::to_string(&command).unwrap();
        self.send_text(app, &text).await;
    }

    /// Next frame, failing the test after a short wait
    pub async fn next_frame(&mut self) -> SocketFrame {
        timeout(WAIT, self.rx.recv())
            .await
            .expect("timed out waiting for a frame")
            .expect("connection queue closed")
    }

    /// Read frames until one with `event` arrives
    pub async fn expect_event(&mut self, event: ServerEvent) -> SocketFrame {
        loop {
            let frame = self.next_frame().await;
            if frame.is(event) {
                return frame;
            }
        }
    }

    /// Frames already queued, without waiting
    pub fn drain(&mut self) -> Vec<SocketFrame> {
        let mut frames = Vec::new();
        while let Ok(frame) = self.rx.try_recv() {
            frames.push(frame);
        }
        frames
    }

    /// Assert nothing is queued
    pub fn assert_silent(&mut self) {
        let frames = self.drain();
        assert!(frames.is_empty(), "expected no frames, got {:?}", frames);
    }
}
