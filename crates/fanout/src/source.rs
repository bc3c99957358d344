//! Line sources over async readers

use bytes::Bytes;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};

use contracts::LineSource;

/// Reads `\n`-terminated lines from any buffered reader
///
/// A trailing `\r` is dropped along with the separator. A final line without
/// a separator is still produced.
#[derive(Debug)]
pub struct ReaderLineSource<R> {
    reader: R,
}

/// Line source over the process's standard input
pub type StdinLineSource = ReaderLineSource<BufReader<Stdin>>;

impl<R> ReaderLineSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl StdinLineSource {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R> LineSource for ReaderLineSource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn next_line(&mut self) -> std::io::Result<Option<Bytes>> {
        let mut line = Vec::new();
        if self.reader.read_until(b'\n', &mut line).await? == 0 {
            return Ok(None);
        }

        if line.last() == Some(&b'\n') {
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
        }
        Ok(Some(Bytes::from(line)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn collect(input: &'static [u8]) -> Vec<Bytes> {
        let mut source = ReaderLineSource::new(input);
        let mut lines = Vec::new();
        while let Some(line) = source.next_line().await.unwrap() {
            lines.push(line);
        }
        lines
    }

    #[tokio::test]
    async fn test_lines_without_separator() {
        assert_eq!(collect(b"a\nb\n").await, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_final_line_without_newline() {
        assert_eq!(collect(b"first\nlast").await, vec!["first", "last"]);
    }

    #[tokio::test]
    async fn test_crlf_stripped() {
        assert_eq!(collect(b"dos\r\nunix\n").await, vec!["dos", "unix"]);
    }

    #[tokio::test]
    async fn test_empty_lines_preserved() {
        assert_eq!(collect(b"\n\nx\n").await, vec!["", "", "x"]);
    }

    #[tokio::test]
    async fn test_empty_input() {
        assert!(collect(b"").await.is_empty());
    }

    #[tokio::test]
    async fn test_non_utf8_bytes_pass_through() {
        let lines = collect(b"\xff\xfe\n").await;
        assert_eq!(lines, vec![Bytes::from_static(b"\xff\xfe")]);
    }
}
