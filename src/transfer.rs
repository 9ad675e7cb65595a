use std::{
    fs::File,
    io::{self, Read, Write},
    path::{Path, PathBuf},
};

pub const CONTENT_DISPOSITION: &str = "Content-Disposition";

/// Destination of a download, shaped like an HTTP response: headers are set
/// first, then the body is written.
pub trait ResponseSink: Write {
    fn add_header(&mut self, name: &str, value: &str);
}

/// Records headers and forwards the body to any writer.
pub struct WriterSink<W> {
    headers: Vec<(String, String)>,
    inner: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(inner: W) -> Self {
        Self {
            headers: Vec::new(),
            inner,
        }
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for WriterSink<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<W: Write> ResponseSink for WriterSink<W> {
    fn add_header(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_string(), value.to_string()));
    }
}

/// An inbound file upload, e.g. one part of a multipart form.
pub trait MultipartFile {
    fn original_filename(&self) -> &str;

    fn content_type(&self) -> Option<&str>;

    fn open(&self) -> io::Result<Box<dyn Read + '_>>;
}

/// A file on local disk presented as an upload.
pub struct LocalFile {
    path: PathBuf,
    filename: String,
    content_type: Option<String>,
}

impl LocalFile {
    /// The content type is guessed from the file extension.
    pub fn new(path: &Path) -> Self {
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        let content_type = mime_guess::from_path(path)
            .first()
            .map(|mime| mime.essence_str().to_string());

        Self {
            path: path.to_path_buf(),
            filename,
            content_type,
        }
    }

    pub fn with_content_type(mut self, content_type: Option<String>) -> Self {
        if content_type.is_some() {
            self.content_type = content_type;
        }
        self
    }
}

impl MultipartFile for LocalFile {
    fn original_filename(&self) -> &str {
        &self.filename
    }

    fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    fn open(&self) -> io::Result<Box<dyn Read + '_>> {
        Ok(Box::new(File::open(&self.path)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_sink() {
        let mut sink = WriterSink::new(Vec::new());
        sink.add_header(CONTENT_DISPOSITION, "attachment;fileName=a.txt");
        sink.write_all(b"hello").unwrap();

        assert_eq!(
            sink.header("content-disposition"),
            Some("attachment;fileName=a.txt")
        );
        assert_eq!(sink.headers().len(), 1);
        assert_eq!(sink.into_inner(), b"hello".to_vec());
    }

    #[test]
    fn test_local_file_content_type() {
        let cases = vec![
            ("photo.jpg", Some("image/jpeg")),
            ("notes.txt", Some("text/plain")),
            ("blob", None),
        ];

        for (name, expected) in cases {
            let file = LocalFile::new(Path::new(name));
            assert_eq!(file.original_filename(), name, "failed for case: {}", name);
            assert_eq!(file.content_type(), expected, "failed for case: {}", name);
        }
    }

    #[test]
    fn test_local_file_override_content_type() {
        let file = LocalFile::new(Path::new("photo.jpg"))
            .with_content_type(Some("application/octet-stream".to_string()));
        assert_eq!(file.content_type(), Some("application/octet-stream"));

        let file = LocalFile::new(Path::new("photo.jpg")).with_content_type(None);
        assert_eq!(file.content_type(), Some("image/jpeg"));
    }

    #[test]
    fn test_local_file_open_missing() {
        let file = LocalFile::new(Path::new("/nonexistent/objectkit/upload.bin"));
        assert!(file.open().is_err());
    }
}
