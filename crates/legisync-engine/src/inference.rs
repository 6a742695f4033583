//! Relationship inference for hearings lacking a committee assignment.
//!
//! Three signals produce per-committee candidates: committee codes in the
//! remote payload (authoritative, short-circuits everything else), proximity
//! of neighboring assigned hearings in event-id space, and curated keyword
//! matches against the hearing title. Proximity and keyword scores merge
//! into a weighted sum; the single best candidate is accepted only above the
//! configured threshold. Inference is stateless and best-effort, never
//! ground truth.

use std::collections::BTreeMap;

use tracing::debug;

use legisync_core::config::InferenceConfig;
use legisync_core::keywords::KeywordTable;
use legisync_core::model::{Chamber, Committee, Hearing, Relationship, RelationshipSource};

/// Outcome of inference for one hearing.
#[derive(Debug, Clone, PartialEq)]
pub enum InferenceDecision {
    Accepted(Relationship),
    /// Best combined score fell at or below the threshold; the hearing is
    /// reported as unassigned, not treated as an error.
    Unassigned { best_score: f64 },
}

#[derive(Debug, Default, Clone, Copy)]
struct SignalScores {
    proximity: f64,
    keyword: f64,
}

/// Computes candidate committee links for unassigned hearings.
///
/// Holds only borrowed, read-only inputs; safe to share across concurrent
/// inference calls.
pub struct RelationshipInferencer<'a> {
    config: &'a InferenceConfig,
    keywords: &'a KeywordTable,
    chamber_by_code: BTreeMap<&'a str, Chamber>,
}

impl<'a> RelationshipInferencer<'a> {
    pub fn new(
        config: &'a InferenceConfig,
        keywords: &'a KeywordTable,
        committees: &'a [Committee],
    ) -> Self {
        let chamber_by_code = committees
            .iter()
            .map(|c| (c.system_code.as_str(), c.chamber))
            .collect();
        Self {
            config,
            keywords,
            chamber_by_code,
        }
    }

    /// Infer a committee for one hearing given its assigned neighbors
    /// (pairs of event id and committee code within the proximity radius).
    pub fn infer(&self, hearing: &Hearing, neighbors: &[(i64, String)]) -> InferenceDecision {
        // Payload committee codes are authoritative: accept immediately,
        // no scoring. The smallest code keeps the choice deterministic
        // when several are present.
        if let Some(code) = hearing.api_committee_codes.iter().min() {
            return InferenceDecision::Accepted(Relationship::from_api(hearing.event_id, code));
        }

        let mut scores: BTreeMap<&str, SignalScores> = BTreeMap::new();

        for (neighbor_id, code) in neighbors {
            let Some((&code, _)) = self.chamber_by_code.get_key_value(code.as_str()) else {
                continue;
            };
            let distance = (neighbor_id - hearing.event_id).abs();
            if distance == 0 || distance > self.config.proximity_radius {
                continue;
            }
            let raw = (1.0 - distance as f64 / self.config.proximity_radius as f64)
                .clamp(0.0, 1.0);
            let entry = scores.entry(code).or_default();
            // Multiple neighbors voting for one committee: keep the best.
            entry.proximity = entry.proximity.max(raw);
        }

        if let Some(title) = hearing.title.as_deref() {
            let title = title.to_lowercase();
            for (code, terms) in self.keywords.iter() {
                let Some((&code, _)) = self.chamber_by_code.get_key_value(code) else {
                    continue;
                };
                let matched = terms.iter().filter(|t| title.contains(t.as_str())).count();
                if matched > 0 {
                    let raw = (matched as f64 / terms.len() as f64).min(1.0);
                    scores.entry(code).or_default().keyword = raw;
                }
            }
        }

        let mut candidates: Vec<(&str, SignalScores, f64)> = scores
            .into_iter()
            .map(|(code, s)| {
                let combined = self.config.proximity_weight * s.proximity
                    + self.config.keyword_weight * s.keyword;
                (code, s, combined)
            })
            .collect();

        // Deterministic resolution: combined score, then chamber match with
        // the hearing, then lexicographically smaller system code.
        candidates.sort_by(|a, b| {
            b.2.partial_cmp(&a.2)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| {
                    let a_match = self.chamber_by_code.get(a.0) == Some(&hearing.chamber);
                    let b_match = self.chamber_by_code.get(b.0) == Some(&hearing.chamber);
                    b_match.cmp(&a_match)
                })
                .then_with(|| a.0.cmp(b.0))
        });

        let Some(&(code, signals, combined)) = candidates.first() else {
            return InferenceDecision::Unassigned { best_score: 0.0 };
        };

        if combined <= self.config.threshold {
            debug!(
                hearing_id = hearing.event_id,
                best = code,
                score = combined,
                "below acceptance threshold, leaving unassigned"
            );
            return InferenceDecision::Unassigned {
                best_score: combined,
            };
        }

        // Tag with whichever signal contributed more weight; equal
        // contributions fall to proximity.
        let source = if self.config.keyword_weight * signals.keyword
            > self.config.proximity_weight * signals.proximity
        {
            RelationshipSource::Keyword
        } else {
            RelationshipSource::Proximity
        };

        InferenceDecision::Accepted(Relationship {
            hearing_id: hearing.event_id,
            committee_code: code.to_string(),
            confidence: combined,
            source,
        })
    }
}
