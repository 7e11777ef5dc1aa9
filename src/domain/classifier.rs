// src/domain/classifier.rs

use crate::domain::lead::{DealType, LeadDraft, MessageMetadata};

/// Tuning for the deal classifier.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Confidence a signal must strictly exceed to produce a draft when no
    /// explicit closure flag is present.
    pub confidence_threshold: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.75,
        }
    }
}

/// Decide whether conversation metadata amounts to a lead.
///
/// Precedence, checked in order:
/// 1. An explicit `dealClosure: true` always yields a draft. A missing deal
///    type defaults to `viewing`, the weakest commitment.
/// 2. Otherwise a confidence strictly above the threshold yields a draft,
///    but only if a deal type is present and the confidence is within
///    [0, 1]. Out-of-range confidences fail closed so upstream classifier
///    bugs surface instead of being clamped away.
/// 3. Anything else returns `None` — no lead for ambiguous signals.
///
/// Pure function: no I/O, deterministic for identical input. A `None`
/// result is a valid rejection, not an error.
pub fn classify(cfg: &ClassifierConfig, metadata: Option<&MessageMetadata>) -> Option<LeadDraft> {
    let meta = metadata?;

    if meta.deal_closure == Some(true) {
        return Some(LeadDraft {
            deal_type: meta.deal_type.unwrap_or(DealType::Viewing),
            explicit_closure: true,
            confidence: meta.confidence,
        });
    }

    let confidence = meta.confidence?;
    if !(0.0..=1.0).contains(&confidence) {
        return None;
    }
    if confidence <= cfg.confidence_threshold {
        return None;
    }

    let deal_type = meta.deal_type?;
    Some(LeadDraft {
        deal_type,
        explicit_closure: false,
        confidence: Some(confidence),
    })
}

/// Scan a conversation newest-first for the first message carrying a
/// classifiable signal.
pub fn classify_conversation(
    cfg: &ClassifierConfig,
    messages: &[crate::domain::lead::ChatMessage],
) -> Option<LeadDraft> {
    messages
        .iter()
        .rev()
        .find_map(|m| classify(cfg, m.metadata.as_ref()))
}
