// SPDX-License-Identifier: GPL-3.0-only

//! Message loop
//!
//! Every task a handler returns is driven on the tokio runtime; its messages
//! are funneled through one channel and applied to the model in arrival
//! order. Messages from a single task keep their relative order.

use crate::app::state::{AppModel, Message};
use crate::app::task::Task;
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

pub struct Runtime {
    model: AppModel,
    sender: mpsc::UnboundedSender<Message>,
    receiver: mpsc::UnboundedReceiver<Message>,
}

impl Runtime {
    /// Must be created inside a tokio runtime
    pub fn new(model: AppModel) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            model,
            sender,
            receiver,
        }
    }

    pub fn model(&self) -> &AppModel {
        &self.model
    }

    /// Apply a message now and start the work it returns
    pub fn dispatch(&mut self, message: Message) {
        debug!(?message, "Dispatch");
        let task = self.model.update(message);
        self.spawn(task);
    }

    fn spawn(&self, task: Task<Message>) {
        for mut stream in task.into_streams() {
            let sender = self.sender.clone();
            tokio::spawn(async move {
                while let Some(message) = stream.next().await {
                    if sender.send(message).is_err() {
                        break;
                    }
                }
            });
        }
    }

    /// Apply every message that is already queued
    pub fn drain(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(message) = self.receiver.try_recv() {
            self.dispatch(message);
            applied += 1;
        }
        applied
    }

    /// Process messages until `condition` holds or `timeout` elapses
    ///
    /// Returns whether the condition was met.
    pub async fn run_until(
        &mut self,
        condition: impl Fn(&AppModel) -> bool,
        timeout: Duration,
    ) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if condition(&self.model) {
                return true;
            }
            match tokio::time::timeout_at(deadline, self.receiver.recv()).await {
                Ok(Some(message)) => self.dispatch(message),
                Ok(None) | Err(_) => return condition(&self.model),
            }
        }
    }

    /// Shut the model down and hand it back
    pub fn into_model(mut self) -> AppModel {
        self.model.shutdown();
        self.model
    }
}
