//! Upload input validation and MIME type resolution

use crate::{ClientError, Result};
use bytes::Bytes;
use std::fmt;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

/// Smallest accepted upload (1 KB)
pub const MIN_FILE_SIZE: usize = 1024;

/// Largest accepted upload (100 MB)
pub const MAX_FILE_SIZE: usize = 104_857_600;

/// Accepted path extensions
const EXTENSION_TYPES: &[(&str, &str)] = &[
    ("mp4", "video/mp4"),
    ("mpeg", "video/mpeg"),
    ("webm", "video/webm"),
    ("flv", "video/x-flv"),
    ("m4v", "video/x-m4v"),
    ("jpeg", "image/jpeg"),
    ("jpg", "image/jpeg"),
    ("png", "image/png"),
    ("apng", "image/apng"),
    ("tiff", "image/tiff"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("bmp", "image/bmp"),
    ("svg", "image/svg+xml"),
    ("ico", "image/vnd.microsoft.icon"),
    ("cur", "image/x-icon"),
    ("heic", "image/heic"),
    ("heif", "image/heif"),
    ("mp3", "audio/mpeg"),
    ("wav", "audio/wav"),
    ("ogg", "audio/ogg"),
    ("opus", "audio/opus"),
    ("aac", "audio/aac"),
    ("txt", "text/plain"),
    ("html", "text/html"),
    ("css", "text/css"),
    ("csv", "text/csv"),
    ("x-sql", "application/x-sql"),
    ("xml", "application/xml"),
    ("sql", "application/x-sql"),
    ("sqlite3", "application/x-sqlite3"),
    ("pdf", "application/pdf"),
    ("json", "application/json"),
    ("js", "application/javascript"),
    ("p12", "application/x-pkcs12"),
];

/// Magic-byte prefixes, checked in order
const SIGNATURES: &[(&[u8], &str)] = &[
    (b"\x89PNG\r\n\x1a\n", "image/png"),
    (b"\xff\xd8\xff", "image/jpeg"),
    (b"GIF87a", "image/gif"),
    (b"GIF89a", "image/gif"),
    (b"%PDF-", "application/pdf"),
    (b"BM", "image/bmp"),
    (b"II*\x00", "image/tiff"),
    (b"MM\x00*", "image/tiff"),
    (b"\x00\x00\x01\x00", "image/x-icon"),
    (b"\x1a\x45\xdf\xa3", "video/webm"),
    (b"ID3", "audio/mpeg"),
    (b"OggS", "audio/ogg"),
    (b"SQLite format 3\x00", "application/x-sqlite3"),
];

/// A readable, seekable byte stream
pub trait ByteStream: Read + Seek + Send {}

impl<T: Read + Seek + Send> ByteStream for T {}

/// Where upload bytes come from
pub enum FileSource {
    /// A file on disk
    Path(PathBuf),
    /// Bytes already in memory
    Bytes(Bytes),
    /// A stream, read from its current position to the end
    Stream(Box<dyn ByteStream>),
}

impl FileSource {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    pub fn bytes(data: impl Into<Bytes>) -> Self {
        Self::Bytes(data.into())
    }

    pub fn stream(stream: impl ByteStream + 'static) -> Self {
        Self::Stream(Box::new(stream))
    }
}

impl fmt::Debug for FileSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Self::Bytes(data) => f.debug_tuple("Bytes").field(&data.len()).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

impl From<PathBuf> for FileSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for FileSource {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<Bytes> for FileSource {
    fn from(data: Bytes) -> Self {
        Self::Bytes(data)
    }
}

impl From<Vec<u8>> for FileSource {
    fn from(data: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(data))
    }
}

/// Validated upload content with its MIME type
#[derive(Clone, Debug)]
pub struct FileInput {
    data: Bytes,
    mimetype: String,
    file_name: Option<String>,
}

impl FileInput {
    /// Read and validate `source`.
    ///
    /// An explicit `mime` always wins. Otherwise a path source is typed by
    /// its extension, and anything else by its leading bytes.
    pub fn new(source: FileSource, mime: Option<&str>) -> Result<Self> {
        let (data, file_name, extension_type) = match source {
            FileSource::Path(path) => {
                let on_disk = std::fs::metadata(&path)?.len();
                if on_disk > MAX_FILE_SIZE as u64 {
                    return Err(ClientError::FileTooLarge {
                        size: usize::try_from(on_disk).unwrap_or(usize::MAX),
                    });
                }
                let data = Bytes::from(std::fs::read(&path)?);
                let extension_type = match mime {
                    Some(_) => None,
                    None => Some(extension_mimetype(&path)?),
                };
                let file_name = path.file_name().map(|n| n.to_string_lossy().into_owned());
                (data, file_name, extension_type)
            }
            FileSource::Bytes(data) => (data, None, None),
            FileSource::Stream(mut stream) => (read_stream(stream.as_mut())?, None, None),
        };

        validate_size(data.len())?;

        let mimetype = match (mime, extension_type) {
            (Some(explicit), _) => explicit.to_string(),
            (None, Some(from_extension)) => from_extension.to_string(),
            (None, None) => sniff_mimetype(&data)
                .ok_or(ClientError::UndeterminedMimeType)?
                .to_string(),
        };

        Ok(Self {
            data,
            mimetype,
            file_name,
        })
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn mimetype(&self) -> &str {
        &self.mimetype
    }

    /// File name of a path source
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_parts(self) -> (Bytes, String, Option<String>) {
        (self.data, self.mimetype, self.file_name)
    }
}

fn read_stream(stream: &mut dyn ByteStream) -> Result<Bytes> {
    if let Err(e) = stream.stream_position() {
        return Err(ClientError::InvalidInput(format!(
            "file stream must be seekable and readable: {}",
            e
        )));
    }
    let mut buf = Vec::new();
    stream
        .read_to_end(&mut buf)
        .map_err(|e| ClientError::InvalidInput(format!("file stream could not be read: {}", e)))?;
    Ok(Bytes::from(buf))
}

fn validate_size(size: usize) -> Result<()> {
    if size > MAX_FILE_SIZE {
        return Err(ClientError::FileTooLarge { size });
    }
    if size < MIN_FILE_SIZE {
        return Err(ClientError::FileTooSmall { size });
    }
    Ok(())
}

/// MIME type for a path's extension (case-insensitive)
pub fn extension_mimetype(path: &Path) -> Result<&'static str> {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    EXTENSION_TYPES
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, mime)| *mime)
        .ok_or(ClientError::InvalidFileType { extension })
}

/// MIME type from the first matching magic-byte prefix
pub fn sniff_mimetype(data: &[u8]) -> Option<&'static str> {
    SIGNATURES
        .iter()
        .find(|(prefix, _)| data.starts_with(prefix))
        .map(|(_, mime)| *mime)
}
