//! Package stores: byte streams addressed by part name
//!
//! Part names are archive paths without a leading slash
//! (`xl/worksheets/sheet1.xml`). The reader and writer only ever talk to a
//! [`PackageStore`]; whether the parts live in a zip archive or in memory is
//! the store's business.

use std::collections::BTreeMap;
use std::io::{Read, Seek, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::XlsxResult;

/// Source and sink of package parts
pub trait PackageStore {
    /// Bytes of a part, `None` if the package has no such part
    fn read_part(&mut self, name: &str) -> XlsxResult<Option<Vec<u8>>>;

    /// Add or replace a part
    fn write_part(&mut self, name: &str, bytes: Vec<u8>) -> XlsxResult<()>;

    /// Names of every part, sorted
    fn part_names(&self) -> Vec<String>;

    /// Whether a part exists
    fn has_part(&self, name: &str) -> bool {
        self.part_names().iter().any(|n| n == name)
    }
}

fn normalize(name: &str) -> &str {
    name.strip_prefix('/').unwrap_or(name)
}

/// Parts held in memory
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryPackage {
    parts: BTreeMap<String, Vec<u8>>,
}

impl MemoryPackage {
    /// Create an empty package
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every part of a zip archive
    pub fn from_zip<R: Read + Seek>(reader: R) -> XlsxResult<Self> {
        let mut archive = ZipArchive::new(reader)?;
        let mut parts = BTreeMap::new();
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let mut bytes = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut bytes)?;
            parts.insert(file.name().to_string(), bytes);
        }
        Ok(Self { parts })
    }

    /// Borrow a part without copying
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts.get(normalize(name)).map(Vec::as_slice)
    }

    /// Number of parts
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Check if the package has no parts
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Write all parts as a zip archive
    ///
    /// `[Content_Types].xml` goes first, which some consumers expect.
    pub fn write_zip<W: Write + Seek>(
        &self,
        writer: W,
        compression: CompressionMethod,
    ) -> XlsxResult<W> {
        let mut zip = ZipWriter::new(writer);
        let options = SimpleFileOptions::default().compression_method(compression);

        let content_types = self.parts.get_key_value(CONTENT_TYPES);
        let rest = self.parts.iter().filter(|(name, _)| *name != CONTENT_TYPES);
        for (name, bytes) in content_types.into_iter().chain(rest) {
            zip.start_file(name.as_str(), options)?;
            zip.write_all(bytes)?;
        }

        Ok(zip.finish()?)
    }
}

const CONTENT_TYPES: &str = "[Content_Types].xml";

impl PackageStore for MemoryPackage {
    fn read_part(&mut self, name: &str) -> XlsxResult<Option<Vec<u8>>> {
        Ok(self.parts.get(normalize(name)).cloned())
    }

    fn write_part(&mut self, name: &str, bytes: Vec<u8>) -> XlsxResult<()> {
        self.parts.insert(normalize(name).to_string(), bytes);
        Ok(())
    }

    fn part_names(&self) -> Vec<String> {
        self.parts.keys().cloned().collect()
    }

    fn has_part(&self, name: &str) -> bool {
        self.parts.contains_key(normalize(name))
    }
}

/// Zip archive opened for reading
///
/// Parts are decompressed on demand. Writes are staged in memory and shadow
/// the archive; [`ZipPackage::finish`] writes the merged package out.
pub struct ZipPackage<R> {
    archive: ZipArchive<R>,
    staged: BTreeMap<String, Vec<u8>>,
}

impl<R: Read + Seek> ZipPackage<R> {
    /// Open an archive
    pub fn open(reader: R) -> XlsxResult<Self> {
        Ok(Self {
            archive: ZipArchive::new(reader)?,
            staged: BTreeMap::new(),
        })
    }

    /// Copy the archive plus staged writes into a [`MemoryPackage`]
    pub fn into_memory(mut self) -> XlsxResult<MemoryPackage> {
        let mut package = MemoryPackage::new();
        for name in self.part_names() {
            if let Some(bytes) = self.read_part(&name)? {
                package.write_part(&name, bytes)?;
            }
        }
        Ok(package)
    }

    /// Write the archive, with staged parts replacing the originals
    pub fn finish<W: Write + Seek>(
        self,
        writer: W,
        compression: CompressionMethod,
    ) -> XlsxResult<W> {
        self.into_memory()?.write_zip(writer, compression)
    }
}

impl<R: Read + Seek> PackageStore for ZipPackage<R> {
    fn read_part(&mut self, name: &str) -> XlsxResult<Option<Vec<u8>>> {
        let name = normalize(name);
        if let Some(bytes) = self.staged.get(name) {
            return Ok(Some(bytes.clone()));
        }
        let mut file = match self.archive.by_name(name) {
            Ok(file) => file,
            Err(zip::result::ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut bytes = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut bytes)?;
        Ok(Some(bytes))
    }

    fn write_part(&mut self, name: &str, bytes: Vec<u8>) -> XlsxResult<()> {
        self.staged.insert(normalize(name).to_string(), bytes);
        Ok(())
    }

    fn part_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .archive
            .file_names()
            .filter(|n| !n.ends_with('/'))
            .map(str::to_string)
            .chain(self.staged.keys().cloned())
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn sample() -> MemoryPackage {
        let mut package = MemoryPackage::new();
        package.write_part("/xl/workbook.xml", b"<workbook/>".to_vec()).unwrap();
        package.write_part(CONTENT_TYPES, b"<Types/>".to_vec()).unwrap();
        package
    }

    #[test]
    fn test_memory_package() {
        let mut package = sample();
        assert_eq!(package.len(), 2);
        assert!(package.has_part("xl/workbook.xml"));
        assert_eq!(package.part("/xl/workbook.xml"), Some(&b"<workbook/>"[..]));
        assert_eq!(package.read_part("xl/missing.xml").unwrap(), None);
        assert_eq!(
            package.part_names(),
            vec![CONTENT_TYPES.to_string(), "xl/workbook.xml".to_string()]
        );
    }

    #[test]
    fn test_zip_roundtrip_with_staged_write() {
        let bytes = sample()
            .write_zip(Cursor::new(Vec::new()), CompressionMethod::Deflated)
            .unwrap()
            .into_inner();

        let mut zip = ZipPackage::open(Cursor::new(bytes)).unwrap();
        assert_eq!(
            zip.read_part("xl/workbook.xml").unwrap(),
            Some(b"<workbook/>".to_vec())
        );
        assert_eq!(zip.read_part("xl/styles.xml").unwrap(), None);

        zip.write_part("xl/workbook.xml", b"<workbook x=\"1\"/>".to_vec())
            .unwrap();
        zip.write_part("xl/styles.xml", b"<styleSheet/>".to_vec())
            .unwrap();
        assert_eq!(zip.part_names().len(), 3);

        let out = zip
            .finish(Cursor::new(Vec::new()), CompressionMethod::Stored)
            .unwrap()
            .into_inner();
        let reloaded = MemoryPackage::from_zip(Cursor::new(out)).unwrap();
        assert_eq!(
            reloaded.part("xl/workbook.xml"),
            Some(&b"<workbook x=\"1\"/>"[..])
        );
        assert!(reloaded.has_part("xl/styles.xml"));
    }
}
