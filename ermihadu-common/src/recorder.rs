//! Audio recording state machine
//!
//! The microphone lives in the browser: the page acquires it, streams
//! encoded chunks here while recording, and releases it after `stop`.
//! This side enforces that only one recording is active and assembles
//! the chunks into a single clip.

use thiserror::Error;

use crate::draft::AudioClip;

/// Mime type used when the client does not state one
pub const DEFAULT_AUDIO_MIME: &str = "audio/webm";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecorderError {
    #[error("A recording is already in progress")]
    AlreadyRecording,

    #[error("No recording in progress")]
    NotRecording,
}

#[derive(Debug, Clone, Default, PartialEq)]
enum RecorderState {
    #[default]
    Idle,
    Recording {
        mime_type: String,
        chunks: Vec<Vec<u8>>,
    },
}

/// Buffers one recording at a time
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioRecorder {
    state: RecorderState,
}

impl AudioRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.state, RecorderState::Recording { .. })
    }

    /// Begin buffering; rejected without side effects while recording
    pub fn start(&mut self, mime_type: Option<&str>) -> Result<(), RecorderError> {
        if self.is_recording() {
            return Err(RecorderError::AlreadyRecording);
        }

        let mime_type = mime_type
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_AUDIO_MIME)
            .to_string();

        tracing::debug!(mime_type = %mime_type, "Recording started");
        self.state = RecorderState::Recording {
            mime_type,
            chunks: Vec::new(),
        };
        Ok(())
    }

    /// Buffer one encoded chunk
    pub fn push_chunk(&mut self, chunk: Vec<u8>) -> Result<(), RecorderError> {
        match &mut self.state {
            RecorderState::Recording { chunks, .. } => {
                if !chunk.is_empty() {
                    chunks.push(chunk);
                }
                Ok(())
            }
            RecorderState::Idle => Err(RecorderError::NotRecording),
        }
    }

    /// Finish the recording and concatenate the chunks
    ///
    /// Stopping while idle is a no-op. A recording with no data yields `None`.
    pub fn stop(&mut self) -> Option<AudioClip> {
        match std::mem::take(&mut self.state) {
            RecorderState::Idle => None,
            RecorderState::Recording { mime_type, chunks } => {
                let bytes = chunks.concat();
                tracing::debug!(bytes = bytes.len(), "Recording stopped");
                (!bytes.is_empty()).then_some(AudioClip { mime_type, bytes })
            }
        }
    }

    /// Drop any recording in progress (e.g. microphone permission denied)
    pub fn abort(&mut self) {
        self.state = RecorderState::Idle;
    }
}
