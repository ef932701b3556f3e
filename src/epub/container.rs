//! EPUB container: the zip archive and its entry list.
//!
//! The whole archive is read into memory. Entries keep their original order
//! and bytes; only entries explicitly replaced are written differently.

use std::fs::File;
use std::io::{Read, Seek, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::document::parser;
use crate::epub::package::{CSS_MEDIA_TYPE, ManifestItem, Package, mark_ncx_identifier};
use crate::epub::stylesheet::{STYLESHEET_HREF, STYLESHEET_ID, Stylesheet};
use crate::error::{BionicError, Result};

pub const MIMETYPE_PATH: &str = "mimetype";
pub const CONTAINER_PATH: &str = "META-INF/container.xml";
pub const EPUB_MIMETYPE: &str = "application/epub+zip";

const PACKAGE_MEDIA_TYPE: &str = "application/oebps-package+xml";

/// One archive entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub data: Vec<u8>,
}

/// A content document in reading order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpineDocument {
    /// Manifest id.
    pub id: String,
    /// Archive entry name.
    pub path: String,
}

/// An EPUB book held in memory.
#[derive(Debug, Clone)]
pub struct EpubBook {
    entries: Vec<Entry>,
    package_path: String,
    package: Package,
}

impl EpubBook {
    /// Read an EPUB file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            BionicError::input(format!("cannot open EPUB {}: {e}", path.display()))
        })?;
        let book = Self::from_reader(file)?;
        log::info!(
            "Opened {} ({} entries, {} spine documents)",
            path.display(),
            book.entries.len(),
            book.spine_documents().len()
        );
        Ok(book)
    }

    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;
        let mut entries = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            entries.push(Entry {
                name: file.name().to_string(),
                data,
            });
        }
        Self::from_entries(entries)
    }

    /// Build a book from entries, locating the package through
    /// `META-INF/container.xml`.
    pub fn from_entries(entries: Vec<Entry>) -> Result<Self> {
        let container = entries
            .iter()
            .find(|e| e.name == CONTAINER_PATH)
            .ok_or_else(|| BionicError::package(format!("missing {CONTAINER_PATH}")))?;
        let package_path = package_path(&container.data)?;

        let package_entry = entries
            .iter()
            .find(|e| e.name == package_path)
            .ok_or_else(|| {
                BionicError::package(format!("package document {package_path} is missing"))
            })?;
        let package = Package::parse(&package_entry.data)?;

        Ok(EpubBook {
            entries,
            package_path,
            package,
        })
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn entry(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.data.as_slice())
    }

    /// Replace an entry's bytes, or add the entry at the end.
    pub fn set_entry<S: Into<String>>(&mut self, name: S, data: Vec<u8>) {
        let name = name.into();
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => entry.data = data,
            None => self.entries.push(Entry { name, data }),
        }
    }

    /// Archive path of the package document.
    pub fn package_path(&self) -> &str {
        &self.package_path
    }

    pub fn package(&self) -> &Package {
        &self.package
    }

    pub fn package_mut(&mut self) -> &mut Package {
        &mut self.package
    }

    /// Archive entry name for a package-relative href.
    pub fn resolve(&self, href: &str) -> String {
        let base = self
            .package_path
            .rsplit_once('/')
            .map(|(dir, _)| dir)
            .unwrap_or("");
        resolve_path(base, href)
    }

    /// Content documents in spine order.
    pub fn spine_documents(&self) -> Vec<SpineDocument> {
        self.package
            .spine_items()
            .into_iter()
            .filter(|item| item.is_content_document())
            .map(|item| SpineDocument {
                id: item.id.clone(),
                path: self.resolve(&item.href),
            })
            .collect()
    }

    /// Store the stylesheet and list it in the manifest.
    ///
    /// Returns the archive path of the stylesheet.
    pub fn add_stylesheet(&mut self, stylesheet: &Stylesheet) -> Result<String> {
        self.package.add_item(ManifestItem::new(
            STYLESHEET_ID,
            STYLESHEET_HREF,
            CSS_MEDIA_TYPE,
        ))?;
        let path = self.resolve(STYLESHEET_HREF);
        self.set_entry(path.as_str(), stylesheet.as_bytes().to_vec());
        Ok(path)
    }

    /// Mark the title and unique identifier as processed.
    ///
    /// The NCX `dtb:uid`, when present, follows the new identifier.
    pub fn mark_processed(&mut self, title_suffix: &str, identifier_suffix: &str) -> Result<()> {
        self.package.mark_title(title_suffix)?;
        let Some(identifier) = self.package.mark_identifier(identifier_suffix)? else {
            return Ok(());
        };

        let Some(ncx) = self.package.ncx_item() else {
            return Ok(());
        };
        let ncx_path = self.resolve(&ncx.href);
        let Some(data) = self.entry(&ncx_path) else {
            log::warn!("NCX {ncx_path} is listed in the manifest but missing");
            return Ok(());
        };
        if let Some(updated) = mark_ncx_identifier(data, &identifier)? {
            self.set_entry(ncx_path, updated);
        }
        Ok(())
    }

    /// Write the book to `path`.
    ///
    /// The archive is built in a temporary file next to `path` and moved into
    /// place only once complete.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };

        let mut temp_file = NamedTempFile::new_in(dir)?;
        self.write_to(temp_file.as_file_mut())?;
        temp_file.persist(path)?;

        log::info!("Saved {}", path.display());
        Ok(())
    }

    /// Write the archive: `mimetype` first and stored, everything else
    /// deflated, in original order.
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<()> {
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        let deflated =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        let mut zip = ZipWriter::new(writer);

        zip.start_file(MIMETYPE_PATH, stored)?;
        match self.entry(MIMETYPE_PATH) {
            Some(data) => zip.write_all(data)?,
            None => zip.write_all(EPUB_MIMETYPE.as_bytes())?,
        }

        let package = self.package.to_bytes();
        for entry in &self.entries {
            if entry.name == MIMETYPE_PATH {
                continue;
            }
            zip.start_file(entry.name.as_str(), deflated)?;
            if entry.name == self.package_path {
                zip.write_all(&package)?;
            } else {
                zip.write_all(&entry.data)?;
            }
        }

        zip.finish()?;
        Ok(())
    }
}

/// Package path named by the first suitable `<rootfile>`.
fn package_path(container: &[u8]) -> Result<String> {
    let document = parser::parse_bytes(container)?;
    let rootfiles = document.find_elements("rootfile");

    rootfiles
        .iter()
        .find(|id| document.attribute(**id, "media-type") == Some(PACKAGE_MEDIA_TYPE))
        .or_else(|| rootfiles.first())
        .and_then(|id| document.attribute(*id, "full-path"))
        .map(|path| path.trim_start_matches('/').to_string())
        .ok_or_else(|| BionicError::package(format!("{CONTAINER_PATH} names no package document")))
}

/// Resolve `href` against the directory `base`, both `/`-separated.
///
/// Fragments are dropped and `.`/`..` segments collapsed.
pub fn resolve_path(base: &str, href: &str) -> String {
    let href = href.split('#').next().unwrap_or_default();
    let mut parts: Vec<&str> = if href.starts_with('/') {
        Vec::new()
    } else {
        base.split('/').filter(|p| !p.is_empty()).collect()
    };
    for part in href.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            part => parts.push(part),
        }
    }
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::epub::fixtures::{CHAPTER, sample_epub};

    fn sample_book() -> EpubBook {
        EpubBook::from_reader(Cursor::new(sample_epub())).unwrap()
    }

    #[test]
    fn test_open_locates_package() {
        let book = sample_book();
        assert_eq!(book.package_path(), "OEBPS/content.opf");
        assert_eq!(
            book.spine_documents(),
            vec![SpineDocument {
                id: "c1".to_string(),
                path: "OEBPS/text/c1.xhtml".to_string(),
            }]
        );
        assert_eq!(book.entry("OEBPS/text/c1.xhtml"), Some(CHAPTER.as_bytes()));
    }

    #[test]
    fn test_missing_container() {
        let err = EpubBook::from_entries(vec![Entry {
            name: MIMETYPE_PATH.to_string(),
            data: EPUB_MIMETYPE.as_bytes().to_vec(),
        }])
        .unwrap_err();
        assert!(matches!(err, BionicError::Package(_)));
    }

    #[test]
    fn test_write_mimetype_first_and_stored() {
        let mut book = sample_book();
        book.add_stylesheet(&Stylesheet::default()).unwrap();

        let mut buffer = Cursor::new(Vec::new());
        book.write_to(&mut buffer).unwrap();

        let mut archive = ZipArchive::new(Cursor::new(buffer.into_inner())).unwrap();
        {
            let first = archive.by_index(0).unwrap();
            assert_eq!(first.name(), MIMETYPE_PATH);
            assert_eq!(first.compression(), CompressionMethod::Stored);
        }
        let mut css = String::new();
        archive
            .by_name("OEBPS/style/bionic-styles.css")
            .unwrap()
            .read_to_string(&mut css)
            .unwrap();
        assert!(css.contains(".svo-subject"));

        let mut cover = Vec::new();
        archive
            .by_name("OEBPS/images/cover.png")
            .unwrap()
            .read_to_end(&mut cover)
            .unwrap();
        assert_eq!(cover, book.entry("OEBPS/images/cover.png").unwrap());
    }

    #[test]
    fn test_mark_processed_updates_ncx() {
        let mut book = sample_book();
        book.mark_processed(" (Bionic)", "-bionic").unwrap();

        assert_eq!(book.package().title().as_deref(), Some("示例书 (Bionic)"));
        let ncx = String::from_utf8(book.entry("OEBPS/toc.ncx").unwrap().to_vec()).unwrap();
        assert!(ncx.contains("content=\"urn:uuid:sample-bionic\""));
    }

    #[test]
    fn test_save_is_atomic_target() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.epub");
        sample_book().save(&target).unwrap();

        let reopened = EpubBook::open(&target).unwrap();
        assert_eq!(reopened.spine_documents().len(), 1);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_resolve_path() {
        assert_eq!(resolve_path("OEBPS", "text/c1.xhtml"), "OEBPS/text/c1.xhtml");
        assert_eq!(resolve_path("OEBPS/text", "../style/a.css#x"), "OEBPS/style/a.css");
        assert_eq!(resolve_path("", "./c1.xhtml"), "c1.xhtml");
    }
}
