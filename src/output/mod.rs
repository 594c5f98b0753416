//! Bounded output pipeline
//!
//! Two bounded channels carry extracted artifacts to external consumers.
//! Producers never block: when a queue is full the record is dropped and a
//! warning is logged, trading completeness for crawler liveness. The core
//! never reads from its own queues.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use url::Url;

/// Extracted body text of one page
#[derive(Debug, Clone)]
pub struct TextRecord {
    pub url: Url,
    pub text: String,
    pub depth: u32,
}

/// One fetched image, re-encoded as JPEG
#[derive(Debug, Clone)]
pub struct ImageRecord {
    pub url: Url,
    pub bytes: Vec<u8>,
    pub depth: u32,
}

/// Consumer half of the pipeline
pub struct OutputStreams {
    pub text: mpsc::Receiver<TextRecord>,
    pub images: mpsc::Receiver<ImageRecord>,
}

/// Producer half of the pipeline, held by the frontier
#[derive(Clone)]
pub struct OutputPipeline {
    text_tx: mpsc::Sender<TextRecord>,
    image_tx: mpsc::Sender<ImageRecord>,
}

impl OutputPipeline {
    /// Creates both queues with the given capacities
    pub fn bounded(text_capacity: usize, image_capacity: usize) -> (Self, OutputStreams) {
        let (text_tx, text_rx) = mpsc::channel(text_capacity.max(1));
        let (image_tx, image_rx) = mpsc::channel(image_capacity.max(1));

        (
            Self { text_tx, image_tx },
            OutputStreams {
                text: text_rx,
                images: image_rx,
            },
        )
    }

    /// Non-blocking enqueue; returns whether the record was accepted
    pub fn publish_text(&self, record: TextRecord) -> bool {
        match self.text_tx.try_send(record) {
            Ok(()) => true,
            Err(TrySendError::Full(dropped)) => {
                tracing::warn!("text queue full, dropping record for {}", dropped.url);
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    /// Non-blocking enqueue; returns whether the record was accepted
    pub fn publish_image(&self, record: ImageRecord) -> bool {
        match self.image_tx.try_send(record) {
            Ok(()) => true,
            Err(TrySendError::Full(dropped)) => {
                tracing::warn!("image queue full, dropping record for {}", dropped.url);
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_record(path: &str) -> TextRecord {
        TextRecord {
            url: Url::parse(&format!("https://example.com{}", path)).unwrap(),
            text: "words".to_string(),
            depth: 0,
        }
    }

    #[test]
    fn test_records_flow_through() {
        let (pipeline, mut streams) = OutputPipeline::bounded(4, 4);

        assert!(pipeline.publish_text(text_record("/a")));
        assert!(pipeline.publish_text(text_record("/b")));

        assert_eq!(streams.text.try_recv().unwrap().url.path(), "/a");
        assert_eq!(streams.text.try_recv().unwrap().url.path(), "/b");
    }

    #[test]
    fn test_full_queue_drops_without_blocking() {
        let (pipeline, mut streams) = OutputPipeline::bounded(2, 2);

        assert!(pipeline.publish_text(text_record("/1")));
        assert!(pipeline.publish_text(text_record("/2")));
        // Capacity exhausted: these are dropped, the call returns immediately
        assert!(!pipeline.publish_text(text_record("/3")));
        assert!(!pipeline.publish_text(text_record("/4")));

        assert_eq!(streams.text.try_recv().unwrap().url.path(), "/1");
        assert_eq!(streams.text.try_recv().unwrap().url.path(), "/2");
        assert!(streams.text.try_recv().is_err());
    }

    #[test]
    fn test_draining_frees_capacity() {
        let (pipeline, mut streams) = OutputPipeline::bounded(1, 1);

        assert!(pipeline.publish_text(text_record("/1")));
        assert!(!pipeline.publish_text(text_record("/2")));

        streams.text.try_recv().unwrap();
        assert!(pipeline.publish_text(text_record("/3")));
    }

    #[test]
    fn test_closed_consumer_is_silent() {
        let (pipeline, streams) = OutputPipeline::bounded(2, 2);
        drop(streams);

        assert!(!pipeline.publish_text(text_record("/a")));
        assert!(!pipeline.publish_image(ImageRecord {
            url: Url::parse("https://example.com/pic.jpg").unwrap(),
            bytes: vec![0xff],
            depth: 1,
        }));
    }

    #[test]
    fn test_zero_capacity_clamped() {
        // A zero-sized tokio channel would panic; the pipeline clamps to 1.
        let (pipeline, mut streams) = OutputPipeline::bounded(0, 0);
        assert!(pipeline.publish_text(text_record("/only")));
        assert!(streams.text.try_recv().is_ok());
    }

    #[test]
    fn test_image_queue_independent_of_text_queue() {
        let (pipeline, mut streams) = OutputPipeline::bounded(1, 1);

        assert!(pipeline.publish_text(text_record("/t")));
        // Text queue is full; image queue still accepts
        assert!(pipeline.publish_image(ImageRecord {
            url: Url::parse("https://example.com/pic.jpg").unwrap(),
            bytes: vec![1, 2, 3],
            depth: 2,
        }));

        let img = streams.images.try_recv().unwrap();
        assert_eq!(img.depth, 2);
        assert_eq!(img.bytes, vec![1, 2, 3]);
    }
}
