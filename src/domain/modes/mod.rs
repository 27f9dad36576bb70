//! Conversation modes module.
//!
//! Classification of a message into mode segments, one prompt builder per
//! mode, and composition of per-segment replies.

mod classifier;
mod composition;
mod handler;

pub use classifier::{
    primary_mode, split_sentences, ModeClassification, ModeClassifier, ModeSegment,
    RuleBasedModeClassifier,
};
pub use composition::{compose_response, SegmentOutput, TransitionConfig, TransitionStyle};
pub use handler::{ConsultHandler, MetaHandler, ModeHandler, SmalltalkHandler, SystemPromptBuilder};
