//! Japanese morphological segmentation capability.
//!
//! Wraps lindera (IPADIC) behind a small trait so the keyword and sentiment
//! paths share one analyzer instance. The capability is probed once at
//! startup; when it is unavailable (feature compiled out or dictionary
//! construction fails) callers run on their simple fallback paths for the
//! lifetime of the process.

use std::sync::Arc;

/// One segmented unit: surface form plus its part-of-speech tag
/// (the first IPADIC detail field, e.g. 名詞 / 助詞 / 記号).
#[derive(Debug, Clone)]
pub struct Morpheme {
    pub surface: String,
    pub pos: String,
}

/// Error from a single segmentation call. Callers treat this as a one-shot
/// degradation to their fallback path, never as a propagated failure.
#[derive(Debug, thiserror::Error)]
#[error("morphological analysis failed: {0}")]
pub struct SegmentError(pub String);

/// Shared, read-only segmenter. Implementations must be safe for concurrent
/// use from the keyword and sentiment paths of a single request.
pub trait Segmenter: Send + Sync {
    fn segment(&self, text: &str) -> Result<Vec<Morpheme>, SegmentError>;
}

#[cfg(feature = "morphology")]
mod backend {
    use super::{Morpheme, SegmentError, Segmenter};
    use lindera::dictionary::{load_dictionary_from_kind, DictionaryKind};
    use lindera::mode::Mode;
    use lindera::segmenter::Segmenter as LinderaSegmenter;
    use lindera::tokenizer::Tokenizer;

    /// lindera-backed segmenter with the embedded IPADIC dictionary.
    pub struct MorphologicalSegmenter {
        tokenizer: Tokenizer,
    }

    impl MorphologicalSegmenter {
        pub fn new() -> Result<Self, SegmentError> {
            let dictionary = load_dictionary_from_kind(DictionaryKind::IPADIC)
                .map_err(|e| SegmentError(e.to_string()))?;
            let segmenter = LinderaSegmenter::new(Mode::Normal, dictionary, None);
            Ok(Self {
                tokenizer: Tokenizer::new(segmenter),
            })
        }
    }

    impl Segmenter for MorphologicalSegmenter {
        fn segment(&self, text: &str) -> Result<Vec<Morpheme>, SegmentError> {
            let mut tokens = self
                .tokenizer
                .tokenize(text)
                .map_err(|e| SegmentError(e.to_string()))?;

            let morphemes = tokens
                .iter_mut()
                .map(|token| {
                    let pos = token.details().first().unwrap_or(&"UNK").to_string();
                    Morpheme {
                        surface: token.text.to_string(),
                        pos,
                    }
                })
                .collect();

            Ok(morphemes)
        }
    }
}

/// Probe the morphological capability once at process start.
///
/// Returns `None` when the capability is missing; that is a permanent
/// degradation, logged here as a single warning.
pub fn init_segmenter() -> Option<Arc<dyn Segmenter>> {
    #[cfg(feature = "morphology")]
    {
        match backend::MorphologicalSegmenter::new() {
            Ok(segmenter) => {
                tracing::info!("initialized lindera morphological segmenter (IPADIC)");
                Some(Arc::new(segmenter))
            }
            Err(e) => {
                tracing::warn!("lindera initialization failed, using simple word splitting: {e}");
                None
            }
        }
    }
    #[cfg(not(feature = "morphology"))]
    {
        tracing::warn!("morphology feature disabled, using simple word splitting");
        None
    }
}

#[cfg(all(test, feature = "morphology"))]
mod tests {
    use super::*;

    #[test]
    fn segments_surface_and_pos() {
        let segmenter = backend::MorphologicalSegmenter::new().unwrap();
        let morphemes = segmenter.segment("動画が面白い").unwrap();

        let surfaces: Vec<&str> = morphemes.iter().map(|m| m.surface.as_str()).collect();
        assert!(surfaces.contains(&"動画"));
        assert!(surfaces.contains(&"面白い"));

        let particle = morphemes.iter().find(|m| m.surface == "が").unwrap();
        assert_eq!(particle.pos, "助詞");
    }

    #[test]
    fn empty_input_yields_no_morphemes() {
        let segmenter = backend::MorphologicalSegmenter::new().unwrap();
        assert!(segmenter.segment("").unwrap().is_empty());
    }
}
