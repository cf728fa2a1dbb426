//! Document repository: folder resolution and the HTTP catalog client.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::chatbot::gateways::DocumentCatalog;

/// Longest label kept when naming a sent file.
const FILENAME_LABEL_CHARS: usize = 22;

/// A non-empty folder listing with entries resolved to absolute URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    /// URL of the folder, with a trailing slash.
    pub base_path: String,
    /// `label → url`
    pub entries: BTreeMap<String, String>,
}

impl Listing {
    /// `(label, url)` when the folder holds exactly one file.
    pub fn single_document(&self, extensions: &[String]) -> Option<(&str, &str)> {
        if self.entries.len() != 1 {
            return None;
        }
        let (label, url) = self.entries.iter().next()?;
        is_document(url, extensions).then_some((label.as_str(), url.as_str()))
    }

    pub fn labels(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

/// URL of `folder` under the repository root, with a trailing slash.
pub fn folder_url(root: &str, folder: &str) -> String {
    format!("{}/{}/", root.trim_end_matches('/'), folder.trim_matches('/'))
}

/// Folder path the catalog expects for a folder URL.
pub fn catalog_folder(root: &str, url: &str) -> String {
    url.strip_prefix(root.trim_end_matches('/'))
        .unwrap_or(url)
        .trim_matches('/')
        .to_string()
}

/// Whether `path` names a file with one of `extensions` (case-insensitive).
pub fn is_document(path: &str, extensions: &[String]) -> bool {
    path.rsplit('/')
        .next()
        .and_then(|name| name.rsplit_once('.'))
        .is_some_and(|(_, ext)| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}

fn join_entry(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        path.to_string()
    } else {
        format!("{base}{}", path.trim_start_matches('/'))
    }
}

/// File name to present for a document picked by `label`.
///
/// Labels that already carry an extension are used as is; otherwise the label
/// is shortened and given the extension of the URL.
pub fn document_filename(label: &str, url: &str) -> String {
    let label = label.trim();
    if label.rsplit_once('.').is_some_and(|(stem, ext)| !stem.is_empty() && !ext.is_empty() && !ext.contains(' ')) {
        return label.to_string();
    }
    let ext = url
        .rsplit('/')
        .next()
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext)
        .unwrap_or("pdf");
    let stem: String = label.chars().take(FILENAME_LABEL_CHARS).collect();
    format!("{}.{ext}", stem.trim_end())
}

/// List `folder`. `None` when the catalog failed or the folder is empty.
pub async fn open_folder(catalog: &dyn DocumentCatalog, root: &str, folder: &str) -> Option<Listing> {
    let files = catalog.list_files(folder).await?;
    if files.is_empty() {
        debug!("Folder {folder:?} is empty");
        return None;
    }

    let base_path = folder_url(root, folder);
    let entries = files
        .into_iter()
        .map(|(label, path)| {
            let url = join_entry(&base_path, &path);
            (label, url)
        })
        .collect();
    Some(Listing { base_path, entries })
}

/// Listing shapes the file service returns.
#[derive(Deserialize)]
#[serde(untagged)]
enum FolderReply {
    Map(BTreeMap<String, String>),
    Names(Vec<String>),
    Wrapped { files: Vec<String> },
}

impl FolderReply {
    fn into_entries(self) -> BTreeMap<String, String> {
        match self {
            FolderReply::Map(map) => map,
            FolderReply::Names(names) | FolderReply::Wrapped { files: names } => {
                names.into_iter().map(|name| (name.clone(), name)).collect()
            }
        }
    }
}

/// Catalog backed by the file-listing HTTP service.
pub struct HttpDocumentCatalog {
    client: reqwest::Client,
    list_url: String,
}

impl HttpDocumentCatalog {
    pub fn new(list_url: String, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, list_url })
    }
}

#[async_trait]
impl DocumentCatalog for HttpDocumentCatalog {
    async fn list_files(&self, folder: &str) -> Option<BTreeMap<String, String>> {
        let response = match self
            .client
            .get(&self.list_url)
            .query(&[("folder", folder)])
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!("Listing {folder:?} failed: {e}");
                return None;
            }
        };

        if !response.status().is_success() {
            warn!("Listing {folder:?} returned {}", response.status());
            return None;
        }

        match response.json::<FolderReply>().await {
            Ok(reply) => Some(reply.into_entries()),
            Err(e) => {
                warn!("Listing {folder:?} unreadable: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Option<BTreeMap<String, String>>);

    #[async_trait]
    impl DocumentCatalog for Fixed {
        async fn list_files(&self, _folder: &str) -> Option<BTreeMap<String, String>> {
            self.0.clone()
        }
    }

    fn pdf() -> Vec<String> {
        vec!["pdf".to_string()]
    }

    fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_folder_url_and_back() {
        let url = folder_url("https://docs.example.com/repo/", "/riesgos/aranceles/");
        assert_eq!(url, "https://docs.example.com/repo/riesgos/aranceles/");
        assert_eq!(
            catalog_folder("https://docs.example.com/repo", &url),
            "riesgos/aranceles"
        );
    }

    #[test]
    fn test_is_document() {
        assert!(is_document("a/b/Tarifas.PDF", &pdf()));
        assert!(!is_document("a/b/tarifas", &pdf()));
        assert!(!is_document("a/b/tarifas.docx", &pdf()));
        assert!(is_document("x.docx", &["pdf".to_string(), "docx".to_string()]));
    }

    #[test]
    fn test_document_filename() {
        assert_eq!(document_filename("Tarifas 2024.pdf", "https://x/t.pdf"), "Tarifas 2024.pdf");
        assert_eq!(
            document_filename("Requisitos para cotizar colectivos", "https://x/r.pdf"),
            "Requisitos para cotiza.pdf"
        );
        assert_eq!(document_filename("Aranceles", "https://x/folder/"), "Aranceles.pdf");
        assert_eq!(document_filename("Tramitar Recl.", "https://x/t.pdf"), "Tramitar Recl..pdf");
    }

    #[tokio::test]
    async fn test_open_folder_resolves_urls() {
        let catalog = Fixed(Some(map(&[
            ("Tarifas.pdf", "Tarifas.pdf"),
            ("2023", "2023/"),
            ("Externo", "https://cdn.example.com/e.pdf"),
        ])));
        let listing = open_folder(&catalog, "https://d.example.com", "riesgos/aranceles")
            .await
            .unwrap();
        assert_eq!(listing.base_path, "https://d.example.com/riesgos/aranceles/");
        assert_eq!(
            listing.entries["Tarifas.pdf"],
            "https://d.example.com/riesgos/aranceles/Tarifas.pdf"
        );
        assert_eq!(listing.entries["2023"], "https://d.example.com/riesgos/aranceles/2023/");
        assert_eq!(listing.entries["Externo"], "https://cdn.example.com/e.pdf");
        assert!(listing.single_document(&pdf()).is_none());
    }

    #[tokio::test]
    async fn test_open_folder_empty_or_failed() {
        assert!(open_folder(&Fixed(None), "r", "a").await.is_none());
        assert!(open_folder(&Fixed(Some(BTreeMap::new())), "r", "a").await.is_none());
    }

    #[tokio::test]
    async fn test_single_document_needs_extension() {
        let one_file = Fixed(Some(map(&[("Contacto", "contacto.pdf")])));
        let listing = open_folder(&one_file, "r", "administracion/contacto").await.unwrap();
        assert_eq!(
            listing.single_document(&pdf()),
            Some(("Contacto", "r/administracion/contacto/contacto.pdf"))
        );

        let one_folder = Fixed(Some(map(&[("2024", "2024/")])));
        let listing = open_folder(&one_folder, "r", "a").await.unwrap();
        assert!(listing.single_document(&pdf()).is_none());
    }

    #[test]
    fn test_folder_reply_shapes() {
        let names: FolderReply = serde_json::from_str(r#"["a.pdf", "b"]"#).unwrap();
        assert_eq!(names.into_entries(), map(&[("a.pdf", "a.pdf"), ("b", "b")]));

        let wrapped: FolderReply = serde_json::from_str(r#"{"files": ["a.pdf"]}"#).unwrap();
        assert_eq!(wrapped.into_entries(), map(&[("a.pdf", "a.pdf")]));

        let labeled: FolderReply = serde_json::from_str(r#"{"Tarifas": "t/tarifas.pdf"}"#).unwrap();
        assert_eq!(labeled.into_entries(), map(&[("Tarifas", "t/tarifas.pdf")]));
    }
}
