use std::sync::Arc;

use crate::recognition::domain::feature_extractor::FeatureExtractor;
use crate::recognition::domain::identity::TrackIdentity;
use crate::recognition::reference_store::ReferenceStore;
use crate::recognition::similarity::cosine_similarity;
use crate::shared::bbox::BoundingBox;
use crate::shared::frame::Frame;

/// Resolves a face region to a confirmed identity or a fresh unknown.
///
/// Each resolve acquires one snapshot up front and scans it completely;
/// a reload swapping the store mid-scan cannot mix old and new entries.
pub struct IdentityResolver {
    extractor: Box<dyn FeatureExtractor>,
    store: Arc<ReferenceStore>,
    match_threshold: f64,
    next_ephemeral: u64,
}

impl IdentityResolver {
    pub fn new(
        extractor: Box<dyn FeatureExtractor>,
        store: Arc<ReferenceStore>,
        match_threshold: f64,
    ) -> Self {
        Self {
            extractor,
            store,
            match_threshold,
            next_ephemeral: 0,
        }
    }

    /// Embeds the face under `bbox` and scans the current reference
    /// snapshot for the best match.
    ///
    /// Extraction failure propagates; the caller drops the detection for
    /// this cycle without creating a track.
    pub fn resolve(
        &mut self,
        frame: &Frame,
        bbox: &BoundingBox,
    ) -> Result<TrackIdentity, Box<dyn std::error::Error>> {
        let snapshot = self.store.current();
        let embedding = self.extractor.align_and_extract(frame, bbox)?;

        let mut best_score = f64::MIN;
        let mut best = None;
        for identity in &snapshot.identities {
            let score = cosine_similarity(&embedding, &identity.embedding);
            if score > best_score {
                best_score = score;
                best = Some(identity);
            }
        }

        match best {
            Some(identity) if best_score >= self.match_threshold => {
                Ok(TrackIdentity::Confirmed {
                    person_key: identity.person_key,
                    display_code: identity.display_code.clone(),
                    score: best_score,
                })
            }
            _ => Ok(TrackIdentity::Unknown {
                ephemeral: self.mint_ephemeral(),
            }),
        }
    }

    fn mint_ephemeral(&mut self) -> u64 {
        let id = self.next_ephemeral;
        self.next_ephemeral += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognition::domain::identity::Identity;
    use crate::recognition::domain::reference_source::ReferenceSource;

    struct FixedSource(Vec<Identity>);

    impl ReferenceSource for FixedSource {
        fn load(&mut self) -> Result<Vec<Identity>, Box<dyn std::error::Error>> {
            Ok(self.0.clone())
        }
    }

    /// Extractor returning a canned embedding regardless of pixels.
    struct FixedExtractor(Vec<f32>);

    impl FeatureExtractor for FixedExtractor {
        fn align_and_extract(
            &self,
            _frame: &Frame,
            _bbox: &BoundingBox,
        ) -> Result<Vec<f32>, Box<dyn std::error::Error>> {
            Ok(self.0.clone())
        }
    }

    struct FailingExtractor;

    impl FeatureExtractor for FailingExtractor {
        fn align_and_extract(
            &self,
            _frame: &Frame,
            _bbox: &BoundingBox,
        ) -> Result<Vec<f32>, Box<dyn std::error::Error>> {
            Err("unreadable crop".into())
        }
    }

    fn store_with(identities: Vec<Identity>) -> Arc<ReferenceStore> {
        Arc::new(ReferenceStore::open(Box::new(FixedSource(identities))).unwrap())
    }

    fn identity(person_key: u64, embedding: Vec<f32>) -> Identity {
        Identity {
            person_key,
            display_code: format!("EMP{person_key:03}"),
            embedding,
        }
    }

    fn frame() -> Frame {
        Frame::new(vec![0u8; 32 * 32 * 3], 32, 32, 0)
    }

    fn bbox() -> BoundingBox {
        BoundingBox::new(4, 4, 16, 16)
    }

    #[test]
    fn test_confirms_best_match_above_threshold() {
        let store = store_with(vec![
            identity(1, vec![0.0, 1.0]),
            identity(2, vec![1.0, 0.0]),
        ]);
        let mut resolver =
            IdentityResolver::new(Box::new(FixedExtractor(vec![0.9, 0.1])), store, 0.5);

        match resolver.resolve(&frame(), &bbox()).unwrap() {
            TrackIdentity::Confirmed {
                person_key,
                display_code,
                score,
            } => {
                assert_eq!(person_key, 2);
                assert_eq!(display_code, "EMP002");
                assert!(score > 0.5);
            }
            other => panic!("expected confirmed, got {other:?}"),
        }
    }

    #[test]
    fn test_below_threshold_is_unknown() {
        let store = store_with(vec![identity(1, vec![0.0, 1.0])]);
        let mut resolver =
            IdentityResolver::new(Box::new(FixedExtractor(vec![1.0, 0.0])), store, 0.5);

        match resolver.resolve(&frame(), &bbox()).unwrap() {
            TrackIdentity::Unknown { .. } => {}
            other => panic!("expected unknown, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_reference_set_is_unknown() {
        let store = store_with(Vec::new());
        let mut resolver =
            IdentityResolver::new(Box::new(FixedExtractor(vec![1.0, 0.0])), store, 0.5);

        match resolver.resolve(&frame(), &bbox()).unwrap() {
            TrackIdentity::Unknown { .. } => {}
            other => panic!("expected unknown, got {other:?}"),
        }
    }

    #[test]
    fn test_ephemeral_keys_are_unique_per_instance() {
        let store = store_with(Vec::new());
        let mut resolver =
            IdentityResolver::new(Box::new(FixedExtractor(vec![1.0, 0.0])), store, 0.5);

        let a = resolver.resolve(&frame(), &bbox()).unwrap();
        let b = resolver.resolve(&frame(), &bbox()).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_extraction_failure_propagates() {
        let store = store_with(vec![identity(1, vec![0.0, 1.0])]);
        let mut resolver = IdentityResolver::new(Box::new(FailingExtractor), store, 0.5);
        assert!(resolver.resolve(&frame(), &bbox()).is_err());
    }

    #[test]
    fn test_score_at_exact_threshold_confirms() {
        let store = store_with(vec![identity(1, vec![1.0, 0.0])]);
        let mut resolver =
            IdentityResolver::new(Box::new(FixedExtractor(vec![1.0, 0.0])), store, 1.0);

        assert!(resolver.resolve(&frame(), &bbox()).unwrap().is_confirmed());
    }

    #[test]
    fn test_scan_count_tracks_reloaded_snapshot() {
        // After a reload with K entries, the next resolve scans exactly K:
        // verified indirectly by the match moving to the new best entry.
        struct GrowingSource {
            calls: usize,
        }
        impl ReferenceSource for GrowingSource {
            fn load(&mut self) -> Result<Vec<Identity>, Box<dyn std::error::Error>> {
                self.calls += 1;
                let mut ids = vec![Identity {
                    person_key: 1,
                    display_code: "EMP001".into(),
                    embedding: vec![0.0, 1.0],
                }];
                if self.calls > 1 {
                    ids.push(Identity {
                        person_key: 2,
                        display_code: "EMP002".into(),
                        embedding: vec![1.0, 0.0],
                    });
                }
                Ok(ids)
            }
        }

        let store =
            Arc::new(ReferenceStore::open(Box::new(GrowingSource { calls: 0 })).unwrap());
        let mut resolver = IdentityResolver::new(
            Box::new(FixedExtractor(vec![1.0, 0.0])),
            store.clone(),
            0.5,
        );

        // Before the reload, person 2 does not exist: unknown.
        assert!(!resolver.resolve(&frame(), &bbox()).unwrap().is_confirmed());

        store.reload().unwrap();
        match resolver.resolve(&frame(), &bbox()).unwrap() {
            TrackIdentity::Confirmed { person_key, .. } => assert_eq!(person_key, 2),
            other => panic!("expected confirmed after reload, got {other:?}"),
        }
    }
}
