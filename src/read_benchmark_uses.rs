use crate::core::benchmark_matcher::UseMapping;
use anyhow::Context;
use std::io::{BufRead, BufReader, Read, Seek, Write};
use tracing::debug;
use zip::ZipArchive;

const CATEGORY_FILE_EXTENSION: &str = ".txt";

/// Reads an archive holding one newline-delimited text file per benchmark category, where each
/// line of a file is a building use belonging to that category.
pub fn benchmark_uses_from_archive(archive: impl Read + Seek) -> anyhow::Result<UseMapping> {
    let mut archive = ZipArchive::new(archive).context("Could not open benchmark uses archive")?;
    let mut mapping = UseMapping::default();

    for i in 0..archive.len() {
        let entry = archive.by_index(i)?;
        if entry.is_dir() {
            continue;
        }
        let category = category_from_entry_name(entry.name());
        let entry_name = entry.name().to_string();

        for line in BufReader::new(entry).lines() {
            let line =
                line.with_context(|| format!("Could not read line of archive entry {entry_name}"))?;
            let building_use = line.trim_end();
            if building_use.is_empty() {
                continue;
            }
            if let Some(previous) = mapping.insert(building_use, &category) {
                debug!("Use '{building_use}' moved from benchmark '{previous}' to '{category}'");
            }
        }
    }

    Ok(mapping)
}

fn category_from_entry_name(name: &str) -> String {
    let file_name = name.rsplit('/').next().unwrap_or(name);
    file_name
        .strip_suffix(CATEGORY_FILE_EXTENSION)
        .unwrap_or(file_name)
        .to_string()
}

pub fn benchmark_uses_from_json(json: impl Read) -> anyhow::Result<UseMapping> {
    serde_json::from_reader(BufReader::new(json)).context("Could not parse benchmark uses JSON")
}

pub fn write_benchmark_uses_json(mapping: &UseMapping, writer: impl Write) -> anyhow::Result<()> {
    serde_json::to_writer(writer, mapping)?;
    Ok(())
}
