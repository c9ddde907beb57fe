//! Packaging template folders into downloadable archives

use crate::config::{TemplateConfig, TemplatesConfig};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Name of the index written next to the archives
pub const INDEX_FILE: &str = "templates-index.json";

/// Catalog entry plus where its archive lives
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackagedTemplate {
    #[serde(flatten)]
    pub template: TemplateConfig,
    pub zip_file: String,
    pub download_url: String,
}

/// Contents of `templates-index.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplatesIndex {
    pub version: String,
    /// Unix timestamp in seconds
    pub packaged_at: u64,
    pub templates: Vec<PackagedTemplate>,
}

/// Outcome of a packaging run
#[derive(Debug, Clone, Default)]
pub struct PackageSummary {
    /// (template path, archive size in bytes)
    pub packaged: Vec<(String, usize)>,
    /// Catalog entries without a template folder
    pub skipped: Vec<String>,
    pub index_path: PathBuf,
}

fn is_packaging_artifact(name: &str) -> bool {
    name.ends_with(".zip") || name == INDEX_FILE
}

/// Zip the contents of one template folder; entry names are relative to it
pub fn build_template_zip(template_dir: &Path) -> Result<Vec<u8>> {
    let mut zip_buffer = Vec::new();
    {
        let mut zip = ZipWriter::new(Cursor::new(&mut zip_buffer));
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        let walker = WalkDir::new(template_dir)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_packaging_artifact(&e.file_name().to_string_lossy()));

        for entry in walker {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = match entry.path().strip_prefix(template_dir) {
                Ok(rel) => rel,
                Err(_) => continue,
            };
            let name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            zip.start_file(name, options)?;
            zip.write_all(&std::fs::read(entry.path())?)?;
        }

        zip.finish()?;
    }
    Ok(zip_buffer)
}

/// Build `<path>.zip` for every catalog entry found under `templates_dir` and
/// write the index describing them
///
/// Existing archives are removed first so stale templates do not linger.
pub fn package_templates(templates_dir: &Path, templates: &TemplatesConfig) -> Result<PackageSummary> {
    std::fs::create_dir_all(templates_dir)?;

    for entry in std::fs::read_dir(templates_dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "zip") {
            debug!("Removing old archive {}", path.display());
            std::fs::remove_file(&path)?;
        }
    }

    let mut summary = PackageSummary::default();
    let mut index_entries = Vec::new();

    for template in &templates.templates {
        let template_dir = templates_dir.join(&template.path);
        if !template_dir.is_dir() {
            warn!("Template directory not found, skipping: {}", template_dir.display());
            summary.skipped.push(template.path.clone());
            continue;
        }

        let zip_bytes = build_template_zip(&template_dir)?;
        let zip_file = format!("{}.zip", template.path);
        std::fs::write(templates_dir.join(&zip_file), &zip_bytes)?;
        debug!("Packaged {} ({} bytes)", zip_file, zip_bytes.len());

        summary.packaged.push((template.path.clone(), zip_bytes.len()));
        index_entries.push(PackagedTemplate {
            template: template.clone(),
            download_url: format!("templates/{}", zip_file),
            zip_file,
        });
    }

    let index = TemplatesIndex {
        version: templates.version.clone(),
        packaged_at: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default(),
        templates: index_entries,
    };

    summary.index_path = templates_dir.join(INDEX_FILE);
    std::fs::write(&summary.index_path, serde_json::to_string_pretty(&index)?)?;
    Ok(summary)
}
