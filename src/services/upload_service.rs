// Upload de fichiers (contenus et produits) vers le disque local
//
// Le fichier est lu en mémoire avec une limite de taille, son type MIME est
// vérifié contre une liste blanche, et rien n'est écrit sur le disque tant que
// ces deux contrôles n'ont pas réussi.

use std::collections::HashMap;
use std::fmt::Display;
use std::path::{Path, PathBuf};

use actix_multipart::Multipart;
use actix_web::web::Bytes;
use futures::{Stream, StreamExt};
use uuid::Uuid;

use crate::error::AppError;

/// Taille max d'un champ texte du formulaire
const MAX_TEXT_FIELD_BYTES: usize = 64 * 1024;

const MEDIA_MIME_TYPES: &[&str] = &[
    "video/mp4",
    "video/webm",
    "video/quicktime",
    "audio/mpeg",
    "audio/wav",
    "audio/ogg",
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "application/pdf",
];

const ARCHIVE_MIME_TYPES: &[&str] = &[
    "application/zip",
    "application/x-zip-compressed",
    "application/epub+zip",
    "application/octet-stream",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Content,
    Product,
}

impl UploadKind {
    fn dir_name(&self) -> &'static str {
        match self {
            UploadKind::Content => "content",
            UploadKind::Product => "products",
        }
    }

    pub fn accepts(&self, mime: &str) -> bool {
        let mime = mime.to_ascii_lowercase();
        match self {
            UploadKind::Content => MEDIA_MIME_TYPES.contains(&mime.as_str()),
            UploadKind::Product => {
                MEDIA_MIME_TYPES.contains(&mime.as_str())
                    || ARCHIVE_MIME_TYPES.contains(&mime.as_str())
            }
        }
    }
}

/// Fichier reçu, validé, encore en mémoire
#[derive(Debug)]
pub struct UploadedFile {
    pub original_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Champs texte + fichier d'un formulaire multipart
#[derive(Debug, Default)]
pub struct UploadForm {
    pub fields: HashMap<String, String>,
    pub file: Option<UploadedFile>,
}

impl UploadForm {
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn required_text(&self, name: &str) -> Result<&str, AppError> {
        self.text(name)
            .ok_or_else(|| AppError::bad_request(format!("Missing field: {}", name)))
    }
}

/// Fichier écrit sur le disque
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub path: PathBuf,
    pub size: i64,
}

pub fn check_mime(kind: UploadKind, mime: Option<&str>) -> Result<String, AppError> {
    let mime =
        mime.ok_or_else(|| AppError::UnsupportedMediaType("missing content type".to_string()))?;
    if !kind.accepts(mime) {
        return Err(AppError::UnsupportedMediaType(mime.to_string()));
    }
    Ok(mime.to_ascii_lowercase())
}

/// Lit un flux de chunks en refusant tout dépassement de `limit`
pub async fn read_limited<S, E>(stream: &mut S, limit: usize) -> Result<Vec<u8>, AppError>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Display,
{
    let mut buf = Vec::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| AppError::bad_request(format!("Upload interrupted: {}", e)))?;
        if buf.len() + chunk.len() > limit {
            return Err(AppError::PayloadTooLarge { limit });
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf)
}

/// Lit tout le formulaire. Le champ fichier doit s'appeler "file".
pub async fn read_multipart(
    mut payload: Multipart,
    kind: UploadKind,
    max_bytes: usize,
) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();

    while let Some(item) = payload.next().await {
        let mut field =
            item.map_err(|e| AppError::bad_request(format!("Invalid multipart body: {}", e)))?;

        let name = field.name().unwrap_or_default().to_string();

        if name == "file" {
            if form.file.is_some() {
                return Err(AppError::bad_request("Only one file can be uploaded"));
            }

            let original_name = field
                .content_disposition()
                .and_then(|cd| cd.get_filename())
                .map(sanitize_filename)
                .unwrap_or_else(|| "upload".to_string());

            let content_type = field.content_type().map(|m| m.essence_str().to_string());
            let mime_type = check_mime(kind, content_type.as_deref())?;

            let bytes = match read_limited(&mut field, max_bytes).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!(file = %original_name, error = %e, "upload rejected");
                    return Err(e);
                }
            };

            if bytes.is_empty() {
                return Err(AppError::bad_request("Uploaded file is empty"));
            }

            form.file = Some(UploadedFile {
                original_name,
                mime_type,
                bytes,
            });
        } else {
            let raw = read_limited(&mut field, MAX_TEXT_FIELD_BYTES).await?;
            let value = String::from_utf8(raw)
                .map_err(|_| AppError::bad_request(format!("Field {} is not valid UTF-8", name)))?;
            form.fields.insert(name, value);
        }
    }

    Ok(form)
}

/// Écrit le fichier sous <upload_dir>/<kind>/<uuid>.<ext>
pub async fn store_file(
    upload_dir: &Path,
    kind: UploadKind,
    file: &UploadedFile,
) -> Result<StoredFile, AppError> {
    let dir = upload_dir.join(kind.dir_name());
    tokio::fs::create_dir_all(&dir).await?;

    let file_name = match extension_of(&file.original_name) {
        Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
        None => Uuid::new_v4().to_string(),
    };
    let path = dir.join(file_name);

    tokio::fs::write(&path, &file.bytes).await?;

    tracing::info!(path = %path.display(), size = file.bytes.len(), "file stored");

    Ok(StoredFile {
        path,
        size: file.bytes.len() as i64,
    })
}

/// Suppression best effort (rollback d'un upload, suppression de contenu)
pub async fn remove_file(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        tracing::warn!(path = %path.display(), error = %e, "failed to remove file");
    }
}

// Garde seulement les caractères sûrs du nom d'origine
fn sanitize_filename(filename: &str) -> String {
    let cleaned: String = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '.' || *c == '_' || *c == '-')
        .collect();
    let cleaned = cleaned.trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

fn extension_of(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || ext.len() > 10 {
        return None;
    }
    if !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn chunks(
        parts: &[&'static [u8]],
    ) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Unpin {
        stream::iter(
            parts
                .iter()
                .map(|p| Ok(Bytes::from_static(*p)))
                .collect::<Vec<_>>(),
        )
    }

    #[tokio::test]
    async fn test_read_limited_within_limit() {
        let mut s = chunks(&[b"abc", b"def"]);
        let bytes = read_limited(&mut s, 6).await.unwrap();
        assert_eq!(bytes, b"abcdef");
    }

    #[tokio::test]
    async fn test_read_limited_rejects_oversize() {
        let mut s = chunks(&[b"abcd", b"efgh"]);
        let result = read_limited(&mut s, 6).await;
        assert!(matches!(result, Err(AppError::PayloadTooLarge { limit: 6 })));
    }

    #[test]
    fn test_check_mime() {
        assert_eq!(check_mime(UploadKind::Content, Some("video/MP4")).unwrap(), "video/mp4");
        assert!(matches!(
            check_mime(UploadKind::Content, Some("application/zip")),
            Err(AppError::UnsupportedMediaType(_))
        ));
        assert!(check_mime(UploadKind::Product, Some("application/zip")).is_ok());
        assert!(check_mime(UploadKind::Product, None).is_err());
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("my video (1).mp4"), "myvideo1.mp4");
        assert_eq!(sanitize_filename("C:\\Users\\x\\song.mp3"), "song.mp3");
        assert_eq!(sanitize_filename("..."), "upload");
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("clip.MP4").as_deref(), Some("mp4"));
        assert_eq!(extension_of("archive.tar.gz").as_deref(), Some("gz"));
        assert_eq!(extension_of("noext"), None);
        assert_eq!(extension_of(".hidden"), None);
    }

    #[tokio::test]
    async fn test_store_and_remove_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = UploadedFile {
            original_name: "cover.png".to_string(),
            mime_type: "image/png".to_string(),
            bytes: vec![1, 2, 3],
        };

        let stored = store_file(dir.path(), UploadKind::Content, &file).await.unwrap();
        assert_eq!(stored.size, 3);
        assert!(stored.path.starts_with(dir.path().join("content")));
        assert_eq!(stored.path.extension().unwrap(), "png");
        assert_eq!(tokio::fs::read(&stored.path).await.unwrap(), vec![1, 2, 3]);

        remove_file(&stored.path).await;
        assert!(!stored.path.exists());
    }
}
