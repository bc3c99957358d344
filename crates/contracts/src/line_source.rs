//! LineSource trait - engine input interface
//!
//! Defines the abstract interface for anything that feeds lines to the tee engine.

use bytes::Bytes;

/// Sequential line input
///
/// Implementations hand out one complete line per call, in input order.
#[trait_variant::make(LineSource: Send)]
pub trait LocalLineSource {
    /// Wait for the next line
    ///
    /// Returns the line without its trailing separator, or `None` once the
    /// input is exhausted. A line is never split across calls.
    ///
    /// # Errors
    /// Returns the underlying read error
    async fn next_line(&mut self) -> std::io::Result<Option<Bytes>>;
}

#[cfg(test)]
mod tests {
    use super::LineSource;
    use bytes::Bytes;
    use std::collections::VecDeque;

    struct QueueSource(VecDeque<&'static str>);

    impl LineSource for QueueSource {
        async fn next_line(&mut self) -> std::io::Result<Option<Bytes>> {
            Ok(self.0.pop_front().map(|s| Bytes::from_static(s.as_bytes())))
        }
    }

    #[tokio::test]
    async fn test_queue_source_drains_in_order() {
        let mut source = QueueSource(VecDeque::from(["a", "b"]));
        assert_eq!(source.next_line().await.unwrap().unwrap(), "a");
        assert_eq!(source.next_line().await.unwrap().unwrap(), "b");
        assert!(source.next_line().await.unwrap().is_none());
    }
}
