//! Synthesis orchestration: concurrent per-chunk calls with order-preserving
//! reassembly.
//!
//! Chunk requests fan out to the speech provider behind a semaphore-bounded
//! pool; results land in a slot buffer indexed by chunk position, so
//! completion order never affects output order. A chunk failure exhausts its
//! retry budget before failing the run, and in-flight siblings are allowed
//! to drain.

use crate::error::{ConvertError, Result};
use crate::text::TextChunk;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::{Duration, sleep};
use tts_client::{SpeechError, SpeechProvider, SpeechRequest, VoiceSettings};

/// Synthesis attempts per chunk before the run fails.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

const RETRY_BASE_DELAY_MS: u64 = 500;

/// Audio for one chunk, exactly as returned by the synthesis service.
#[derive(Debug)]
pub struct SynthesizedAudio {
    pub chunk: TextChunk,
    pub audio: Vec<u8>,
}

/// Bounded worker pool driving the speech provider.
pub struct SynthesisPool {
    provider: Arc<dyn SpeechProvider>,
    settings: VoiceSettings,
    concurrency: usize,
    max_attempts: u32,
}

impl SynthesisPool {
    pub fn new(
        provider: Arc<dyn SpeechProvider>,
        settings: VoiceSettings,
        concurrency: usize,
    ) -> Self {
        Self {
            provider,
            settings,
            concurrency: concurrency.max(1),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Override the per-chunk retry budget.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Synthesize one chapter's chunks, returning audio in chunk order.
    ///
    /// All chunks must succeed; otherwise the earliest failing chunk is
    /// reported and no audio is returned for the chapter.
    pub async fn synthesize_chapter(&self, chunks: &[TextChunk]) -> Result<Vec<SynthesizedAudio>> {
        if chunks.is_empty() {
            return Ok(Vec::new());
        }
        let chapter = chunks[0].chapter_ordinal;

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for (slot, chunk) in chunks.iter().cloned().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let provider = Arc::clone(&self.provider);
            let request = self.settings.request_for(&chunk.text);
            let max_attempts = self.max_attempts;

            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("semaphore is never closed");
                let result = synthesize_with_retry(provider.as_ref(), request, max_attempts).await;
                (slot, chunk, result)
            });
        }

        let mut slots: Vec<Option<SynthesizedAudio>> = Vec::new();
        slots.resize_with(chunks.len(), || None);
        let mut failure: Option<(usize, SpeechError)> = None;

        // Drain every task even after a failure; siblings already in flight
        // finish, but their output is discarded with the chapter.
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((slot, chunk, Ok(audio))) => {
                    slots[slot] = Some(SynthesizedAudio { chunk, audio });
                }
                Ok((slot, _, Err(err))) => {
                    if failure.as_ref().map(|(s, _)| slot < *s).unwrap_or(true) {
                        failure = Some((slot, err));
                    }
                }
                Err(join_err) => {
                    if failure.is_none() {
                        failure = Some((
                            0,
                            SpeechError::ProviderUnavailable(format!(
                                "synthesis task failed: {join_err}"
                            )),
                        ));
                    }
                }
            }
        }

        if let Some((chunk, source)) = failure {
            return Err(ConvertError::Synthesis {
                chapter,
                chunk,
                source,
            });
        }

        Ok(slots
            .into_iter()
            .map(|slot| slot.expect("every chunk slot is filled on success"))
            .collect())
    }
}

async fn synthesize_with_retry(
    provider: &dyn SpeechProvider,
    request: SpeechRequest,
    max_attempts: u32,
) -> std::result::Result<Vec<u8>, SpeechError> {
    let mut last_error = None;

    for attempt in 0..max_attempts {
        match provider.synthesize(request.clone()).await {
            Ok(audio) => return Ok(audio),
            Err(err) => {
                if attempt + 1 < max_attempts {
                    let delay = retry_delay(&err, attempt);
                    eprintln!(
                        "Synthesis failed (attempt {}/{}), retrying in {:.1}s: {}",
                        attempt + 1,
                        max_attempts,
                        delay.as_secs_f64(),
                        err
                    );
                    sleep(delay).await;
                }
                last_error = Some(err);
            }
        }
    }

    Err(last_error
        .unwrap_or_else(|| SpeechError::ProviderUnavailable("no synthesis attempts made".into())))
}

/// Exponential backoff, except a rate-limit response with a Retry-After
/// hint waits exactly that long.
fn retry_delay(err: &SpeechError, attempt: u32) -> Duration {
    match err {
        SpeechError::RateLimited {
            retry_after: Some(seconds),
        } => Duration::from_secs(*seconds),
        _ => Duration::from_millis(RETRY_BASE_DELAY_MS << attempt),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tts_client::MockSynthesizer;

    fn settings() -> VoiceSettings {
        VoiceSettings::new("xx-XX-MockNeural", "+0", "+0").unwrap()
    }

    fn chunks_for(chapter: u32, texts: &[&str]) -> Vec<TextChunk> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| TextChunk::new(chapter, i, t.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_preserves_chunk_order() {
        let provider = Arc::new(MockSynthesizer::always_succeeds(b"mp3"));
        let pool = SynthesisPool::new(provider, settings(), 4);
        let chunks = chunks_for(1, &["a", "b", "c", "d", "e", "f", "g", "h"]);

        let synthesized = pool.synthesize_chapter(&chunks).await.unwrap();

        assert_eq!(synthesized.len(), 8);
        for (i, item) in synthesized.iter().enumerate() {
            assert_eq!(item.chunk.sequence_index, i);
            assert_eq!(item.audio, b"mp3");
        }
    }

    #[tokio::test]
    async fn test_empty_chapter_synthesizes_nothing() {
        let provider = Arc::new(MockSynthesizer::always_succeeds(b"mp3"));
        let pool = SynthesisPool::new(Arc::clone(&provider) as Arc<dyn SpeechProvider>, settings(), 4);

        let synthesized = pool.synthesize_chapter(&[]).await.unwrap();
        assert!(synthesized.is_empty());
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_then_succeeds() {
        let provider = Arc::new(MockSynthesizer::fails_then_succeeds(
            2,
            SpeechError::ServerOverloaded {
                message: "overloaded".to_string(),
            },
            b"ok",
        ));
        let pool =
            SynthesisPool::new(Arc::clone(&provider) as Arc<dyn SpeechProvider>, settings(), 1);
        let chunks = chunks_for(1, &["only chunk"]);

        let synthesized = pool.synthesize_chapter(&chunks).await.unwrap();

        assert_eq!(synthesized[0].audio, b"ok");
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_exhausted_retries_name_chapter_and_chunk() {
        let provider = Arc::new(MockSynthesizer::always_fails(SpeechError::ApiError {
            message: "boom".to_string(),
            status_code: Some(500),
        }));
        let pool =
            SynthesisPool::new(Arc::clone(&provider) as Arc<dyn SpeechProvider>, settings(), 2)
                .with_max_attempts(1);
        let chunks = chunks_for(7, &["first", "second"]);

        let err = pool.synthesize_chapter(&chunks).await.unwrap_err();

        match err {
            ConvertError::Synthesis {
                chapter,
                chunk,
                source,
            } => {
                assert_eq!(chapter, 7);
                assert_eq!(chunk, 0);
                assert!(matches!(source, SpeechError::ApiError { .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // Every chunk was attempted; nothing was silently dropped
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn test_failure_budget_counts_attempts() {
        let provider = Arc::new(MockSynthesizer::always_fails(
            SpeechError::ProviderUnavailable("down".to_string()),
        ));
        let pool =
            SynthesisPool::new(Arc::clone(&provider) as Arc<dyn SpeechProvider>, settings(), 1)
                .with_max_attempts(1);
        let chunks = chunks_for(1, &["one"]);

        assert!(pool.synthesize_chapter(&chunks).await.is_err());
        assert_eq!(provider.call_count(), 1);
    }

    #[test]
    fn test_retry_delay_honors_rate_limit_hint() {
        let hinted = SpeechError::RateLimited {
            retry_after: Some(7),
        };
        assert_eq!(retry_delay(&hinted, 0), Duration::from_secs(7));

        let plain = SpeechError::ProviderUnavailable("down".to_string());
        assert_eq!(retry_delay(&plain, 0), Duration::from_millis(500));
        assert_eq!(retry_delay(&plain, 2), Duration::from_millis(2000));
    }
}
