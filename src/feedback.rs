use serde_json::{json, Value};
use std::sync::mpsc::Sender;

/// One message posted to the caller-owned feedback queue during an
/// execution. Exactly three are emitted per run: a processing
/// announcement, the preview image path, and the final results payload.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedbackMessage {
    Processing {
        script_name: String,
        filename: String,
    },
    Preview {
        script_name: String,
        image_file_name: String,
    },
    Results {
        script_name: String,
        signal: Value,
    },
}

impl FeedbackMessage {
    /// The list-encoded, tag-first wire form consumed by the external UI.
    pub fn to_payload(&self) -> Value {
        match self {
            Self::Processing {
                script_name,
                filename,
            } => json!([script_name, format!("Processing: {}", filename)]),
            Self::Preview {
                script_name,
                image_file_name,
            } => json!([script_name, "preview", image_file_name]),
            Self::Results {
                script_name,
                signal,
            } => json!([script_name, "results", signal]),
        }
    }
}

/// A thread-safe FIFO sink owned by the caller. The workflow only ever
/// appends; it never blocks on or reads from the queue.
pub trait FeedbackSink {
    fn post(&self, message: FeedbackMessage);
}

impl FeedbackSink for Sender<FeedbackMessage> {
    fn post(&self, message: FeedbackMessage) {
        // a receiver that has gone away cannot fail the workflow
        let _ = self.send(message);
    }
}
